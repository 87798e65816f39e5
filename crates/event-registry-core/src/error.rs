//! Error handling for event-registry
//!
//! Provides error types for each layer of the crate:
//! - Registry errors (target classification and lookup)
//! - Hub errors (subscription and dispatch)
//! - Config errors (loading and validating hub configuration)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Registry error type
///
/// Raised by registration when a target cannot be classified, and by the
/// installed capabilities when they are used on a target that was never
/// registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Value is neither a blueprint, an instance, nor a collection of those
    #[error("Invalid registration target of type {type_name}")]
    InvalidTarget {
        /// Rust type name of the rejected value.
        type_name: &'static str,
    },

    /// Capability used on a target with no surface installed
    #[error("{type_name} is not registered with any hub")]
    NotRegistered {
        /// Rust type name of the unregistered target.
        type_name: &'static str,
    },
}

/// Hub error type
///
/// Represents failures raised by a hub while subscribing or dispatching.
#[derive(Error, Debug)]
pub enum HubError {
    /// A listener failed while handling an event
    #[error("Listener for '{event}' failed: {source}")]
    Listener {
        /// The event being dispatched.
        event: String,
        /// The listener's error.
        #[source]
        source: anyhow::Error,
    },
}

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Config I/O error for {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file extension is not supported
    #[error("Config file must be .json or .toml: {path}")]
    UnsupportedFormat {
        /// Path of the config file.
        path: String,
    },

    /// Config content could not be parsed or serialized
    #[error("Invalid config: {reason}")]
    Parse {
        /// The reason parsing failed.
        reason: String,
    },

    /// Config values are out of range
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// The reason the value is invalid.
        reason: String,
    },
}

/// Main error type for event-registry
///
/// A unified error type that can represent any error from all layers.
/// Hub errors pass through unchanged as the `Hub` variant.
#[derive(Error, Debug)]
pub enum Error {
    /// Registry error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Hub error
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Config error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Check if this is an invalid target error
    pub fn is_invalid_target(&self) -> bool {
        matches!(self, Error::Registry(RegistryError::InvalidTarget { .. }))
    }

    /// Check if this is a hub error
    pub fn is_hub_error(&self) -> bool {
        matches!(self, Error::Hub(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
