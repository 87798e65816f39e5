//! # Registrar Module
//!
//! Attaches the `{on, bind, emit}` capabilities to blueprints, objects, or
//! collections of them, so that all of them delegate to one hub.
//!
//! ## Overview
//!
//! - [`Registry`] wraps a hub and exposes `register`
//! - Each registration builds a fresh [`Surface`] closed over that hub
//! - Blueprints receive the surface on their shared [`Prototype`]; objects
//!   receive it in their own slot
//! - Registering again replaces the surface; the most recent registration wins
//!
//! ## Usage
//!
//! ```rust,ignore
//! use event_registry_core::{Blueprint, EventHub, Evented, Registry};
//!
//! struct Person { name: String }
//!
//! let registry = Registry::new(EventHub::new());
//! let people = Blueprint::<Person>::new();
//! registry.register(&people);
//!
//! let me = people.construct(Person { name: "Steven".into() });
//! me.on("greet", |this, _args| {
//!     // `this` is `me` unless an explicit scope was given
//!     Ok(())
//! })?;
//! me.emit("greet", &[])?;
//! ```

mod object;
mod surface;
mod target;

pub use object::*;
pub use surface::*;
pub use target::*;

use std::ops::Deref;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::hub::Hub;

/// A hub augmented with target registration
pub struct Registry<H: Hub> {
    hub: Arc<H>,
}

impl<H: Hub> Registry<H> {
    /// Augment a hub
    pub fn new(hub: H) -> Self {
        Self::from_shared(Arc::new(hub))
    }

    /// Augment a hub that is already shared
    pub fn from_shared(hub: Arc<H>) -> Self {
        Self { hub }
    }

    /// The underlying hub
    pub fn hub(&self) -> &Arc<H> {
        &self.hub
    }

    /// Register a blueprint, an object, or a collection of them
    ///
    /// Every non-collection target receives its own fresh surface.
    pub fn register(&self, target: impl Into<Target>) {
        self.install(&target.into());
    }

    /// Register a single blueprint or object
    pub fn register_one(&self, target: impl Into<Target>) {
        self.register(target);
    }

    /// Register every target of an iterator
    pub fn register_many<I, T>(&self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        self.install(&Target::many(targets));
    }

    /// Register a value whose type is only known at runtime
    ///
    /// Fails with [`RegistryError::InvalidTarget`] naming the rejected type,
    /// in which case nothing is installed.
    pub fn register_any<V: IntoAnyTarget>(&self, value: V) -> Result<(), RegistryError> {
        let target = Target::classify(value).inspect_err(|err| {
            tracing::warn!("Registration rejected: {}", err);
        })?;
        tracing::trace!(kind = target.label(), targets = target.len(), "Classified target");
        self.install(&target);
        Ok(())
    }

    fn install(&self, target: &Target) {
        match target {
            Target::Blueprint(prototype) => {
                let replaced = prototype
                    .slot()
                    .install(Surface::bound_to(Arc::clone(&self.hub)));
                tracing::debug!(
                    subject = prototype.name(),
                    replaced = replaced.is_some(),
                    "Registered blueprint"
                );
            }
            Target::Instance(object) => {
                let replaced = object
                    .capability_slot()
                    .install(Surface::bound_to(Arc::clone(&self.hub)));
                tracing::debug!(
                    subject = object.type_label(),
                    replaced = replaced.is_some(),
                    "Registered object"
                );
            }
            Target::Collection(items) => {
                for item in items.iter().rev() {
                    self.install(item);
                }
            }
        }
    }
}

impl<H: Hub> Clone for Registry<H> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<H: Hub> Deref for Registry<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.hub
    }
}

impl<H: Hub + std::fmt::Debug> std::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("hub", &self.hub).finish()
    }
}

/// Augment a hub with registration
pub fn augment<H: Hub>(hub: H) -> Registry<H> {
    Registry::new(hub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{EventHub, Scope};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Person {
        name: &'static str,
    }

    #[test]
    fn test_register_blueprint_installs_on_prototype() {
        let registry = Registry::new(EventHub::new());
        let people = Blueprint::<Person>::new();
        let before = people.construct(Person { name: "early" });

        registry.register(&people);

        assert!(people.is_registered());
        let after = people.construct(Person { name: "late" });
        assert!(before.resolve_surface().is_some());
        assert!(after.resolve_surface().is_some());
        assert!(!after.capability_slot().is_installed());
    }

    #[test]
    fn test_default_scope_is_the_instance() {
        let registry = Registry::new(EventHub::new());
        let people = Blueprint::<Person>::new();
        registry.register(&people);

        let a = people.construct(Person { name: "a" });
        let b = people.construct(Person { name: "b" });
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        a.on("hello", move |this, _| {
            let person = this.downcast::<Object<Person>>().expect("person scope");
            s.lock().unwrap().push(person.name);
            Ok(())
        })
        .unwrap();

        assert_eq!(b.emit("hello", &[]).unwrap(), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
        assert_eq!(registry.listener_count("hello"), 1);
    }

    #[test]
    fn test_each_target_gets_fresh_surface() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        let b = Object::new(Person { name: "b" });

        registry.register_many([&a, &b]);

        let sa = a.resolve_surface().unwrap();
        let sb = b.resolve_surface().unwrap();
        assert!(!sa.ptr_eq(&sb));
    }

    #[test]
    fn test_register_any_rejects_and_installs_nothing() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        let erased: Arc<dyn Registrable> = a.clone();

        let err = registry
            .register_any(vec![AnyTarget::new(erased), AnyTarget::new(42u8)])
            .unwrap_err();

        assert_eq!(err, RegistryError::InvalidTarget { type_name: "u8" });
        assert!(!a.capability_slot().is_installed());
    }

    #[test]
    fn test_register_any_accepts_erased_object() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        let erased: Arc<dyn Registrable> = a.clone();

        registry.register_any(erased).unwrap();
        assert!(a.capability_slot().is_installed());
    }

    #[test]
    fn test_register_any_accepts_typed_targets() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        let people = Blueprint::<Person>::new();

        registry.register_any(a.clone()).unwrap();
        registry.register_any(people.clone()).unwrap();

        assert!(a.capability_slot().is_installed());
        assert!(people.is_registered());
        assert!(people.construct(Person { name: "b" }).emit("noop", &[]).is_ok());
    }

    #[test]
    fn test_register_any_accepts_boxed_collection() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        let erased: Arc<dyn Registrable> = a.clone();
        let items: Vec<Box<dyn std::any::Any + Send + Sync>> = vec![Box::new(erased)];

        registry.register_any(items).unwrap();
        assert!(a.capability_slot().is_installed());
    }

    #[test]
    fn test_hub_level_emit_reaches_target_listeners() {
        let registry = Registry::new(EventHub::new());
        let a = Object::new(Person { name: "a" });
        registry.register_one(&a);

        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        a.bind("ping", move |this: &Scope, _: &[Value]| {
            assert!(this.is::<Object<Person>>());
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        registry.emit("ping", &[]).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
