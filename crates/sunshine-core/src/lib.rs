pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{Config, FaceConfig, SyncConfig, ValidationResult};
pub use error::{AppError, ConfigError, ResourceError, SyncError};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging; a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("Sunshine Wear core initialized");
    Ok(())
}
