/// Blobber - HTTP blob storage service
///
/// A small CRUD API over remote object storage (S3, GCS, Azure Blob,
/// Alicloud OSS), guarded by a shared API token.

mod api;
mod blob_store;
mod config;
mod context;
mod error;
mod metrics;
mod secret_store;
mod server;

use config::{LogFormat, LoggingConfig, ServerConfig};
use context::AppContext;
use error::BlobberResult;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> BlobberResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.logging);

    // Print banner
    print_banner();

    info!(
        provider = %config.backend.provider(),
        address = %config.bind_address(),
        "Starting Blobber"
    );

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level when set
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("blobber={0},tower_http={0}", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

fn print_banner() {
    println!(
        r#"
    ____  __      __    __
   / __ )/ /___  / /_  / /_  ___  _____
  / __  / / __ \/ __ \/ __ \/ _ \/ ___/
 / /_/ / / /_/ / /_/ / /_/ /  __/ /
/_____/_/\____/_.___/_.___/\___/_/

        HTTP blob storage service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
