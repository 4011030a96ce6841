//! # Config Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Config Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │      File       │  │   Environment   │  │      Limits             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Io             │  │  InvalidValue   │  │  InvalidLimits          │ │
//! │  │  Parse          │  │                 │  │  (base or per city)     │ │
//! │  │  Serialize      │  │                 │  │                         │ │
//! │  │  NoConfigPath   │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use courier_core::ValidationError;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written.
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// Limits break their invariants.
    #[error("Invalid delivery limits for {scope}: {source}")]
    InvalidLimits {
        /// `base` or `city '<name>'`.
        scope: String,
        #[source]
        source: ValidationError,
    },

    /// No explicit path and no platform config directory.
    #[error("No config path available")]
    NoConfigPath,
}
