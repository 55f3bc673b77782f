//! Bucket provisioner -- multi-backend object-storage provisioning driver.
//!
//! Startup loads the configuration, connects every backend and freezes the
//! registry before the listener opens.  SIGTERM/SIGINT stop accepting
//! connections; in-flight requests get `server.shutdown_timeout` seconds
//! before the process exits regardless.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bucket_provisioner::config::{load_config, LoggingConfig};
use bucket_provisioner::provisioner::Provisioner;
use bucket_provisioner::registry::build_registry;

/// Command-line arguments for the provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "bucket-provisioner",
    version,
    about = "Multi-backend object storage bucket provisioning driver"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "/cosi/config.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.logging);
    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics && bucket_provisioner::metrics::init_metrics().is_some() {
        bucket_provisioner::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let registry = build_registry(&config).await?;
    info!("{} backend(s) registered", registry.len());

    let provisioner = Provisioner::new(config.server.driver_name.clone(), Arc::new(registry));
    // Fail fast on an unnamed driver rather than on the first GetInfo.
    provisioner.get_info()?;

    let grace = Duration::from_secs(config.server.shutdown_timeout);
    let state = Arc::new(bucket_provisioner::AppState {
        config,
        provisioner,
    });
    let app = bucket_provisioner::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Bucket provisioner listening on {}", bind_addr);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(());
    });

    tokio::select! {
        res = server.into_future() => res?,
        _ = async {
            let _ = stop_rx.await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("In-flight requests still running after {:?}, exiting", grace);
        }
    }

    info!("Bucket provisioner shut down");

    Ok(())
}

/// Install the global tracing subscriber.  `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
