//! Registration targets
//!
//! Typed values convert into [`Target`] directly. Values only known at
//! runtime go through [`Target::classify`], which rejects anything that is
//! not a target.

use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

use super::object::{Blueprint, Prototype, Registrable};
use crate::error::RegistryError;

/// What a registration applies to
#[derive(Clone)]
pub enum Target {
    /// A blueprint: the surface goes on its shared prototype
    Blueprint(Arc<Prototype>),
    /// A single object: the surface goes on the object itself
    Instance(Arc<dyn Registrable>),
    /// Several targets, each handled independently
    Collection(Vec<Target>),
}

impl Target {
    /// Collect several targets
    pub fn many<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        Target::Collection(targets.into_iter().map(Into::into).collect())
    }

    /// Classify a candidate value
    ///
    /// Objects, blueprints and targets resolve directly. Erased values are
    /// resolved by [`AnyTarget::into_target`]. A collection is classified in
    /// full before anything is returned, so one bad element rejects it.
    pub fn classify<V: IntoAnyTarget>(value: V) -> Result<Target, RegistryError> {
        value.into_any_target().into_target()
    }

    /// Number of non-collection targets reached by this target
    pub fn len(&self) -> usize {
        match self {
            Target::Blueprint(_) | Target::Instance(_) => 1,
            Target::Collection(items) => items.iter().map(Target::len).sum(),
        }
    }

    /// Check whether this is a collection with no targets in it
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Target::Blueprint(prototype) => prototype.name(),
            Target::Instance(object) => object.type_label(),
            Target::Collection(_) => "collection",
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Blueprint(prototype) => {
                f.debug_tuple("Blueprint").field(&prototype.name()).finish()
            }
            Target::Instance(object) => {
                f.debug_tuple("Instance").field(&object.type_label()).finish()
            }
            Target::Collection(items) => f.debug_tuple("Collection").field(items).finish(),
        }
    }
}

impl<T: Send + Sync + 'static> From<&Blueprint<T>> for Target {
    fn from(blueprint: &Blueprint<T>) -> Self {
        Target::Blueprint(Arc::clone(blueprint.prototype()))
    }
}

impl<R: Registrable> From<Arc<R>> for Target {
    fn from(object: Arc<R>) -> Self {
        Target::Instance(object)
    }
}

impl<R: Registrable> From<&Arc<R>> for Target {
    fn from(object: &Arc<R>) -> Self {
        Target::Instance(Arc::clone(object) as Arc<dyn Registrable>)
    }
}

impl From<Arc<dyn Registrable>> for Target {
    fn from(object: Arc<dyn Registrable>) -> Self {
        Target::Instance(object)
    }
}

impl From<Vec<Target>> for Target {
    fn from(items: Vec<Target>) -> Self {
        Target::Collection(items)
    }
}

/// A candidate target that remembers its type name
///
/// Either already resolved from a typed value, or erased and classified
/// when [`AnyTarget::into_target`] is called.
pub struct AnyTarget {
    candidate: Candidate,
    type_name: &'static str,
}

enum Candidate {
    Resolved(Target),
    Erased(Box<dyn Any + Send + Sync>),
}

type BoxedAny = Box<dyn Any + Send + Sync>;

impl AnyTarget {
    /// Erase a value
    pub fn new<V: Any + Send + Sync>(value: V) -> Self {
        Self {
            candidate: Candidate::Erased(Box::new(value)),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Wrap a value that is known to be a target
    pub fn resolved<V: Into<Target>>(value: V) -> Self {
        Self {
            candidate: Candidate::Resolved(value.into()),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Take an already boxed value; the concrete type name is unknown
    pub fn from_boxed(value: BoxedAny) -> Self {
        Self {
            candidate: Candidate::Erased(value),
            type_name: std::any::type_name::<BoxedAny>(),
        }
    }

    /// Name of the candidate's type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolve into a target, or report the offending type
    ///
    /// An erased value must hold a `Target`, a `Vec<Target>`, an
    /// `Arc<dyn Registrable>`, an `AnyTarget`, a `Vec<AnyTarget>`, or a boxed
    /// or `Vec` of boxed values of those shapes.
    pub fn into_target(self) -> Result<Target, RegistryError> {
        match self.candidate {
            Candidate::Resolved(target) => Ok(target),
            Candidate::Erased(value) => classify_erased(value, self.type_name),
        }
    }
}

fn classify_erased(value: BoxedAny, type_name: &'static str) -> Result<Target, RegistryError> {
    let value = match value.downcast::<Target>() {
        Ok(target) => return Ok(*target),
        Err(value) => value,
    };
    let value = match value.downcast::<Vec<Target>>() {
        Ok(items) => return Ok(Target::Collection(*items)),
        Err(value) => value,
    };
    let value = match value.downcast::<Arc<dyn Registrable>>() {
        Ok(object) => return Ok(Target::Instance(*object)),
        Err(value) => value,
    };
    let value = match value.downcast::<AnyTarget>() {
        Ok(inner) => return inner.into_target(),
        Err(value) => value,
    };
    let value = match value.downcast::<Vec<AnyTarget>>() {
        Ok(items) => return collect(items.into_iter().map(AnyTarget::into_target)),
        Err(value) => value,
    };
    let value = match value.downcast::<BoxedAny>() {
        Ok(inner) => return classify_erased(*inner, type_name),
        Err(value) => value,
    };
    match value.downcast::<Vec<BoxedAny>>() {
        Ok(items) => collect(
            items
                .into_iter()
                .map(|item| AnyTarget::from_boxed(item).into_target()),
        ),
        Err(_) => Err(RegistryError::InvalidTarget { type_name }),
    }
}

fn collect<I>(items: I) -> Result<Target, RegistryError>
where
    I: Iterator<Item = Result<Target, RegistryError>>,
{
    items.collect::<Result<Vec<_>, _>>().map(Target::Collection)
}

impl std::fmt::Debug for AnyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyTarget").field(&self.type_name).finish()
    }
}

/// Values accepted by [`Target::classify`] and `Registry::register_any`
///
/// Objects, blueprints and targets resolve without inspection. Other
/// values are erased and rejected by name unless they hold a target.
/// Wrap a value in [`AnyTarget::new`] to classify a type not listed here.
pub trait IntoAnyTarget {
    /// Convert into a candidate target
    fn into_any_target(self) -> AnyTarget;
}

impl IntoAnyTarget for AnyTarget {
    fn into_any_target(self) -> AnyTarget {
        self
    }
}

impl IntoAnyTarget for Target {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(self)
    }
}

impl<R: Registrable> IntoAnyTarget for Arc<R> {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(self)
    }
}

impl<R: Registrable> IntoAnyTarget for &Arc<R> {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(self)
    }
}

impl IntoAnyTarget for Arc<dyn Registrable> {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(self)
    }
}

impl<T: Send + Sync + 'static> IntoAnyTarget for Blueprint<T> {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(&self)
    }
}

impl<T: Send + Sync + 'static> IntoAnyTarget for &Blueprint<T> {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::resolved(self)
    }
}

impl IntoAnyTarget for BoxedAny {
    fn into_any_target(self) -> AnyTarget {
        AnyTarget::from_boxed(self)
    }
}

impl<V: IntoAnyTarget> IntoAnyTarget for Vec<V> {
    fn into_any_target(self) -> AnyTarget {
        let items: Vec<AnyTarget> = self.into_iter().map(IntoAnyTarget::into_any_target).collect();
        AnyTarget::new(items)
    }
}

macro_rules! erased_candidates {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoAnyTarget for $ty {
                fn into_any_target(self) -> AnyTarget {
                    AnyTarget::new(self)
                }
            }
        )*
    };
}

erased_candidates!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
    Value,
);
