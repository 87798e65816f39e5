//! # event-registry
//!
//! Attach event capabilities to arbitrary objects and blueprints so that all
//! of them share one event hub:
//! - `register` a blueprint, an object, or a collection of them
//! - registered targets gain `on`, `bind` and `emit`
//! - listeners run with the registered object as their scope
//!
//! ## Architecture
//!
//! 1. **event-registry-core** - Hub contract, `EventHub`, registrar
//! 2. **event-registry** - Logging setup and the demo binary

pub use event_registry_core::{error, hub, registrar};

pub use event_registry_core::{
    augment, AnyTarget, Blueprint, CapabilitySlot, ConfigError, Emission, Error, EventHub,
    Evented, Hub, HubConfig, HubError, IntoAnyTarget, Listener, Object, Prototype, Registrable,
    Registry, RegistryError, Result, Scope, SubscriptionId, Surface, Target,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
