//! # event-registry core
//!
//! Event hub and target registration.
//! Objects and blueprints registered against a hub gain `on`, `bind` and
//! `emit`, which forward to that hub while listeners run with the
//! registered object as their scope.

pub mod error;
pub mod hub;
pub mod registrar;

pub use error::{ConfigError, Error, HubError, RegistryError, Result};

pub use hub::{Emission, EventHub, Hub, HubConfig, Listener, Scope, SubscriptionId};

pub use registrar::{
    augment, AnyTarget, Blueprint, CapabilitySlot, EmitFn, Evented, IntoAnyTarget, Object, OnFn,
    Prototype, Registrable, Registry, Surface, Target,
};
