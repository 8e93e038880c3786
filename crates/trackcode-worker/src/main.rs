//! Audio transcoding worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};

use trackcode_media::FfmpegEncoder;
use trackcode_worker::logging::init_tracing;
use trackcode_worker::metrics::init_metrics;
use trackcode_worker::shutdown::shutdown_signal;
use trackcode_worker::{Worker, WorkerConfig};

#[tokio::main]
async fn main() {
    // Presigned storage URLs are HTTPS
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting trackcode-worker");

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        match init_metrics(port) {
            Ok(()) => info!(port, "Prometheus metrics listener started"),
            Err(e) => warn!("Metrics disabled, failed to start exporter: {}", e),
        }
    }

    let encoder = FfmpegEncoder::new(&config.encoder_path, config.encode_timeout);
    if let Err(e) = encoder.verify().await {
        error!("Encoder unavailable: {}", e);
        std::process::exit(1);
    }

    let mut worker = match Worker::new(config, Arc::new(encoder)) {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to create worker: {}", e);
            std::process::exit(1);
        }
    };

    worker.run_until(shutdown_signal()).await;

    info!("Worker shutdown complete");
}
