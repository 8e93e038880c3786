use std::path::Path;

use trackcode_media::FfmpegEncoder;
use trackcode_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("configuration invalid: {}", e))?;

    println!(
        "worker-selfcheck: starting with work_dir={} api={}",
        config.work_dir.display(),
        config.api_base_url
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_encoder(&config).await?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;

    let probe = tempfile::tempfile_in(path)
        .map_err(|e| anyhow::anyhow!("work dir {} not writable: {}", path.display(), e))?;
    drop(probe);
    Ok(())
}

async fn ensure_encoder(config: &WorkerConfig) -> anyhow::Result<()> {
    FfmpegEncoder::new(&config.encoder_path, config.encode_timeout)
        .verify()
        .await
        .map_err(|e| anyhow::anyhow!("encoder not available: {}", e))
}
