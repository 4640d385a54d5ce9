//! Centralized error types for the Sunshine Wear watch face.
//!
//! This module provides a typed error hierarchy that:
//! - Separates transport, configuration and resource failures
//! - Provides short messages suitable for a watch-sized status line
//! - Preserves full error context for debugging/logging
//!
//! None of these errors ever reach the rendered frame. Every failure
//! degrades to "show the clock only".

use std::time::Duration;

use thiserror::Error;

/// Top-level application error type.
///
/// All errors in the harness should be convertible to this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a short message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Sync(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Resource(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed.",
            AppError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Errors raised while talking to the companion sync channel.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Connection to sync channel timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Connection to sync channel failed: {0}")]
    ConnectFailed(String),

    #[error("Malformed payload at {path}: {reason}")]
    MalformedPayload { path: String, reason: String },

    #[error("Sync channel closed")]
    ChannelClosed,
}

impl SyncError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::ConnectTimeout(_) => "Phone not reachable. Weather will update later.",
            SyncError::ConnectFailed(_) => "Phone connection failed. Weather will update later.",
            SyncError::MalformedPayload { .. } => "Received unreadable weather data.",
            SyncError::ChannelClosed => "Phone connection closed.",
        }
    }

    /// Whether the next delivered batch may succeed where this one failed.
    ///
    /// The listener never retries inside a batch; this only classifies
    /// failures for logging.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectTimeout(_) | SyncError::ConnectFailed(_)
        )
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Bitmap and icon resource errors.
///
/// The draw step assumes every condition background is present, so these
/// are fatal at startup.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Missing background for icon: {0}")]
    MissingIcon(String),

    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),
}

impl ResourceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ResourceError::MissingIcon(_) => "Watch face resources are incomplete.",
            ResourceError::InvalidBitmap(_) => "Watch face resources are corrupted.",
        }
    }
}
