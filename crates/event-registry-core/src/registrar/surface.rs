//! Delegate surface
//!
//! The three capabilities installed on a registered target, each a closure
//! over the hub of the registration that produced it.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

use crate::error::HubError;
use crate::hub::{Hub, Listener, Scope, SubscriptionId};

/// `on`/`bind` capability: `(receiver, event, listener, scope, once)`
pub type OnFn = Arc<
    dyn Fn(&Scope, &str, Listener, Option<Scope>, bool) -> Result<SubscriptionId, HubError>
        + Send
        + Sync,
>;

/// `emit` capability: `(event, args)`
pub type EmitFn = Arc<dyn Fn(&str, &[Value]) -> Result<usize, HubError> + Send + Sync>;

/// The `{on, bind, emit}` capabilities bound to one hub
#[derive(Clone)]
pub struct Surface {
    on: OnFn,
    bind: OnFn,
    emit: EmitFn,
    hub: &'static str,
}

impl Surface {
    /// Build a fresh surface forwarding to `hub`
    ///
    /// `on` subscribes with the explicit scope when one is given, otherwise
    /// with the receiver it was invoked on. `bind` is the same closure.
    pub fn bound_to<H: Hub>(hub: Arc<H>) -> Self {
        let on: OnFn = {
            let hub = Arc::clone(&hub);
            Arc::new(
                move |receiver: &Scope,
                      event: &str,
                      listener: Listener,
                      scope: Option<Scope>,
                      once: bool| {
                    let scope = scope.unwrap_or_else(|| receiver.clone());
                    hub.subscribe(event, listener, scope, once)
                },
            )
        };

        let emit: EmitFn = Arc::new(move |event: &str, args: &[Value]| hub.emit(event, args));

        Self {
            bind: Arc::clone(&on),
            on,
            emit,
            hub: std::any::type_name::<H>(),
        }
    }

    /// The `on` capability
    pub fn on(&self) -> &OnFn {
        &self.on
    }

    /// The `bind` capability, an alias of `on`
    pub fn bind(&self) -> &OnFn {
        &self.bind
    }

    /// The `emit` capability
    pub fn emit(&self) -> &EmitFn {
        &self.emit
    }

    /// Check whether `other` was produced by the same registration
    pub fn ptr_eq(&self, other: &Surface) -> bool {
        Arc::ptr_eq(&self.on, &other.on) && Arc::ptr_eq(&self.emit, &other.emit)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface").field("hub", &self.hub).finish()
    }
}

/// Holder for an installed surface
///
/// Empty until the owner is registered; each registration replaces the
/// previous surface.
#[derive(Debug, Default)]
pub struct CapabilitySlot(RwLock<Option<Surface>>);

impl CapabilitySlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `surface`, returning the one it replaces
    pub fn install(&self, surface: Surface) -> Option<Surface> {
        self.0.write().replace(surface)
    }

    /// The installed surface, if any
    pub fn surface(&self) -> Option<Surface> {
        self.0.read().clone()
    }

    /// Check whether a surface is installed
    pub fn is_installed(&self) -> bool {
        self.0.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::EventHub;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_bind_is_on() {
        let surface = Surface::bound_to(Arc::new(EventHub::new()));
        assert!(Arc::ptr_eq(surface.on(), surface.bind()));
    }

    #[test]
    fn test_surfaces_are_fresh_per_build() {
        let hub = Arc::new(EventHub::new());
        let a = Surface::bound_to(Arc::clone(&hub));
        let b = Surface::bound_to(hub);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_on_defaults_scope_to_receiver() {
        let hub = Arc::new(EventHub::new());
        let surface = Surface::bound_to(Arc::clone(&hub));
        let receiver = Scope::new("receiver");
        let seen = Arc::new(Mutex::new(None));

        let s = seen.clone();
        let listener = Listener::new(move |scope, _| {
            *s.lock().unwrap() = Some(scope.clone());
            Ok(())
        });
        (surface.on())(&receiver, "ping", listener, None, false).unwrap();
        (surface.emit())("ping", &[]).unwrap();

        let seen = seen.lock().unwrap().clone().expect("listener ran");
        assert!(seen.same(&receiver));
    }

    #[test]
    fn test_explicit_scope_wins() {
        let hub = Arc::new(EventHub::new());
        let surface = Surface::bound_to(Arc::clone(&hub));
        let receiver = Scope::new("receiver");
        let explicit = Scope::new("explicit");
        let seen = Arc::new(Mutex::new(None));

        let s = seen.clone();
        let listener = Listener::new(move |scope, _| {
            *s.lock().unwrap() = Some(scope.clone());
            Ok(())
        });
        (surface.bind())(&receiver, "ping", listener, Some(explicit.clone()), false).unwrap();
        (surface.emit())("ping", &[json!(1)]).unwrap();

        let seen = seen.lock().unwrap().clone().expect("listener ran");
        assert!(seen.same(&explicit));
    }

    #[test]
    fn test_slot_install_replaces() {
        let hub = Arc::new(EventHub::new());
        let slot = CapabilitySlot::new();
        assert!(!slot.is_installed());

        let first = Surface::bound_to(Arc::clone(&hub));
        assert!(slot.install(first.clone()).is_none());

        let second = Surface::bound_to(hub);
        let replaced = slot.install(second.clone()).expect("first surface");
        assert!(replaced.ptr_eq(&first));
        assert!(slot.surface().unwrap().ptr_eq(&second));
    }
}
