//! Registrable objects and blueprints
//!
//! An [`Object`] wraps a value together with its own capability slot. A
//! [`Blueprint`] plays the role of a constructor: every object it constructs
//! shares the blueprint's [`Prototype`], so registering the blueprint equips
//! all of its objects at once. An object's own slot shadows its prototype's.
//!
//! Types that want to carry the capability without the wrapper can embed a
//! [`CapabilitySlot`] and implement [`Registrable`] themselves.

use serde_json::Value;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use super::surface::{CapabilitySlot, Surface};
use crate::error::{RegistryError, Result};
use crate::hub::{Listener, Scope, SubscriptionId};

/// A value that can receive a delegate surface
pub trait Registrable: Send + Sync + 'static {
    /// The object's own slot
    fn capability_slot(&self) -> &CapabilitySlot;

    /// The shared prototype consulted when the own slot is empty
    fn prototype(&self) -> Option<&Prototype> {
        None
    }

    /// Name used in logs and errors
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The surface in effect: own slot first, then prototype
    fn resolve_surface(&self) -> Option<Surface> {
        self.capability_slot()
            .surface()
            .or_else(|| self.prototype().and_then(|proto| proto.slot().surface()))
    }
}

/// Shared member table of a blueprint
#[derive(Debug)]
pub struct Prototype {
    name: &'static str,
    slot: CapabilitySlot,
}

impl Prototype {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: CapabilitySlot::new(),
        }
    }

    /// Name of the blueprint this prototype belongs to
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The shared slot
    pub fn slot(&self) -> &CapabilitySlot {
        &self.slot
    }
}

/// A value plus the slots needed to carry event capabilities
pub struct Object<T> {
    value: T,
    slot: CapabilitySlot,
    prototype: Option<Arc<Prototype>>,
}

impl<T: Send + Sync + 'static> Object<T> {
    /// Wrap a standalone value
    pub fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            value,
            slot: CapabilitySlot::new(),
            prototype: None,
        })
    }

    /// The wrapped value
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Object<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Send + Sync + 'static> Registrable for Object<T> {
    fn capability_slot(&self) -> &CapabilitySlot {
        &self.slot
    }

    fn prototype(&self) -> Option<&Prototype> {
        self.prototype.as_deref()
    }

    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Object<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("value", &self.value)
            .field("registered", &self.slot.is_installed())
            .field("prototype", &self.prototype.as_ref().map(|p| p.name))
            .finish()
    }
}

/// Constructor for objects sharing one prototype
pub struct Blueprint<T> {
    prototype: Arc<Prototype>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Blueprint<T> {
    /// Create a blueprint with an empty prototype
    pub fn new() -> Self {
        Self {
            prototype: Arc::new(Prototype::new(std::any::type_name::<T>())),
            _marker: PhantomData,
        }
    }

    /// Construct an object linked to this blueprint's prototype
    pub fn construct(&self, value: T) -> Arc<Object<T>> {
        Arc::new(Object {
            value,
            slot: CapabilitySlot::new(),
            prototype: Some(Arc::clone(&self.prototype)),
        })
    }

    /// The shared prototype
    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.prototype
    }

    /// Check whether the prototype carries a surface
    pub fn is_registered(&self) -> bool {
        self.prototype.slot.is_installed()
    }
}

impl<T: Send + Sync + 'static> Default for Blueprint<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Blueprint<T> {
    fn clone(&self) -> Self {
        Self {
            prototype: Arc::clone(&self.prototype),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Blueprint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.prototype.name)
            .field("registered", &self.prototype.slot.is_installed())
            .finish()
    }
}

/// The `{on, bind, emit}` capability interface
///
/// Calls go through the surface installed by the most recent registration.
/// Without an explicit scope, listeners run with the receiver as scope.
pub trait Evented {
    /// The surface in effect for this receiver
    fn surface(&self) -> std::result::Result<Surface, RegistryError>;

    /// The receiver as a scope value
    ///
    /// Hubs hold this scope for as long as the listener stays subscribed,
    /// so it must not keep the receiver alive.
    fn receiver(&self) -> Scope;

    /// Subscribe with every argument spelled out
    fn on_with(
        &self,
        event: &str,
        listener: Listener,
        scope: Option<Scope>,
        once: bool,
    ) -> Result<SubscriptionId> {
        let surface = self.surface()?;
        Ok((surface.on())(&self.receiver(), event, listener, scope, once)?)
    }

    /// Same as [`Evented::on_with`], through the `bind` alias
    fn bind_with(
        &self,
        event: &str,
        listener: Listener,
        scope: Option<Scope>,
        once: bool,
    ) -> Result<SubscriptionId> {
        let surface = self.surface()?;
        Ok((surface.bind())(&self.receiver(), event, listener, scope, once)?)
    }

    /// Subscribe a closure with the receiver as scope
    fn on<F>(&self, event: &str, listener: F) -> Result<SubscriptionId>
    where
        Self: Sized,
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_with(event, Listener::new(listener), None, false)
    }

    /// Alias of [`Evented::on`]
    fn bind<F>(&self, event: &str, listener: F) -> Result<SubscriptionId>
    where
        Self: Sized,
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bind_with(event, Listener::new(listener), None, false)
    }

    /// Subscribe a closure removed by the hub after its first invocation
    fn once<F>(&self, event: &str, listener: F) -> Result<SubscriptionId>
    where
        Self: Sized,
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_with(event, Listener::new(listener), None, true)
    }

    /// Forward an emission to the hub
    fn emit(&self, event: &str, args: &[Value]) -> Result<usize> {
        let surface = self.surface()?;
        Ok((surface.emit())(event, args)?)
    }
}

impl<R: Registrable> Evented for Arc<R> {
    fn surface(&self) -> std::result::Result<Surface, RegistryError> {
        self.resolve_surface()
            .ok_or_else(|| RegistryError::NotRegistered {
                type_name: self.type_label(),
            })
    }

    fn receiver(&self) -> Scope {
        Scope::weak(self)
    }
}
