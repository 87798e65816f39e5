//! # Hub Module
//!
//! The event-distribution side of the registry: the [`Hub`] contract that
//! registered targets forward to, the listener/scope types that travel
//! through it, and [`EventHub`], the in-process implementation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use event_registry_core::hub::{EventHub, Hub, Listener, Scope};
//! use serde_json::json;
//!
//! let hub = EventHub::new();
//! hub.subscribe(
//!     "greet",
//!     Listener::new(|_scope, args| {
//!         println!("greeted with {:?}", args);
//!         Ok(())
//!     }),
//!     Scope::detached(),
//!     false,
//! )?;
//!
//! hub.emit("greet", &[json!("hello")])?;
//! ```

mod bus;
mod config;

pub use bus::*;
pub use config::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::error::HubError;

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// The execution context a listener runs against.
///
/// A type-erased shared reference. When a listener is attached through a
/// registered target without an explicit scope, the scope is a weak handle
/// to that target: the hub never keeps a target alive, and listeners whose
/// target was dropped are skipped and pruned.
#[derive(Clone)]
pub struct Scope(ScopeRef);

#[derive(Clone)]
enum ScopeRef {
    Strong(Arc<dyn Any + Send + Sync>),
    Weak(Weak<dyn Any + Send + Sync>),
}

impl Scope {
    /// Wrap an owned value as a scope
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(ScopeRef::Strong(Arc::new(value)))
    }

    /// Use an existing shared value as a scope, keeping its identity
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(ScopeRef::Strong(value))
    }

    /// Refer to a shared value without keeping it alive
    pub fn weak<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(value) as Weak<T>;
        Self(ScopeRef::Weak(weak))
    }

    /// Scope for listeners attached directly on a hub
    pub fn detached() -> Self {
        Self::new(())
    }

    /// A strong scope to the same value, or `None` if a weak scope's value
    /// has been dropped
    pub fn upgrade(&self) -> Option<Scope> {
        match &self.0 {
            ScopeRef::Strong(_) => Some(self.clone()),
            ScopeRef::Weak(weak) => weak.upgrade().map(|value| Self(ScopeRef::Strong(value))),
        }
    }

    /// Check whether the scope value still exists
    pub fn is_live(&self) -> bool {
        match &self.0 {
            ScopeRef::Strong(_) => true,
            ScopeRef::Weak(weak) => weak.strong_count() > 0,
        }
    }

    /// Check whether this scope does not own its value
    pub fn is_weak(&self) -> bool {
        matches!(self.0, ScopeRef::Weak(_))
    }

    /// Typed shared handle to the scope value, if it is a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value()?.downcast::<T>().ok()
    }

    /// Typed reference to the scope value, if it is a `T`
    ///
    /// Always `None` for a weak scope; listeners are invoked with strong
    /// scopes, so this works inside a listener.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.0 {
            ScopeRef::Strong(value) => value.downcast_ref::<T>(),
            ScopeRef::Weak(_) => None,
        }
    }

    /// Check whether the scope value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value().is_some_and(|value| value.is::<T>())
    }

    /// Identity comparison: both scopes refer to the same value
    pub fn same(&self, other: &Scope) -> bool {
        std::ptr::addr_eq(self.as_ptr(), other.as_ptr())
    }

    /// Identity comparison against a shared value
    pub fn points_to<T: ?Sized>(&self, value: &Arc<T>) -> bool {
        std::ptr::addr_eq(self.as_ptr(), Arc::as_ptr(value))
    }

    fn value(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match &self.0 {
            ScopeRef::Strong(value) => Some(Arc::clone(value)),
            ScopeRef::Weak(weak) => weak.upgrade(),
        }
    }

    fn as_ptr(&self) -> *const () {
        match &self.0 {
            ScopeRef::Strong(value) => Arc::as_ptr(value).cast::<()>(),
            ScopeRef::Weak(weak) => weak.as_ptr().cast::<()>(),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("ptr", &self.as_ptr())
            .field("weak", &self.is_weak())
            .finish()
    }
}

type ListenerFn = dyn Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync;

/// A callable subscribed to an event.
///
/// Cloning shares the same underlying function.
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    /// Create a listener from a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the listener
    pub fn call(&self, scope: &Scope, args: &[Value]) -> anyhow::Result<()> {
        (self.0)(scope, args)
    }

    /// Check whether two listeners share the same function
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// A single emitted event as seen by history and async observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    /// Event name.
    pub event: String,
    /// Arguments passed to listeners.
    pub args: Vec<Value>,
}

/// The capability contract a hub offers to registered targets.
///
/// Implementations own all subscriber bookkeeping. Registered targets only
/// ever call these two methods, and errors are handed back to the caller
/// untouched.
pub trait Hub: Send + Sync + 'static {
    /// Add a listener for `event`, invoked with `scope`.
    ///
    /// When `once` is true the hub removes the listener after its first
    /// invocation.
    fn subscribe(
        &self,
        event: &str,
        listener: Listener,
        scope: Scope,
        once: bool,
    ) -> Result<SubscriptionId, HubError>;

    /// Deliver `args` to every listener of `event`.
    ///
    /// Returns the number of listeners invoked.
    fn emit(&self, event: &str, args: &[Value]) -> Result<usize, HubError>;
}
