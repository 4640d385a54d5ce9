use anyhow::Result;
use std::sync::Arc;

use crate::Config;

/// Application state and lifecycle manager for the watch face harness
pub struct App {
    config: Arc<Config>,
    started: bool,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Create an application instance around an already loaded configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            started: false,
        }
    }

    /// Mark the application as started
    pub fn initialize(&mut self) -> Result<()> {
        if self.started {
            tracing::debug!("Application already initialized");
            return Ok(());
        }

        tracing::info!(
            weather_path = %self.config.sync.weather_path,
            update_ms = self.config.face.interactive_update_ms,
            "Initializing watch face"
        );
        self.started = true;
        Ok(())
    }

    /// Shut the application down. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }

        tracing::info!("Shutting down watch face");
        self.started = false;
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the configuration
    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}
