//! Type-erased values and runtime type descriptors

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime descriptor of a value type
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// A value of any type, or null
///
/// Carries its own [`TypeKey`] so the save path can pick the typed store
/// operation without knowing the static type.
pub struct Value {
    inner: Option<(TypeKey, Box<dyn Any + Send + Sync>)>,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Some((TypeKey::of::<T>(), Box::new(value))),
        }
    }

    pub fn null() -> Self {
        Self { inner: None }
    }

    /// `None` becomes null
    pub fn from_option<T: Any + Send + Sync>(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Self::new)
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Runtime type, `None` for null
    pub fn type_key(&self) -> Option<TypeKey> {
        self.inner.as_ref().map(|(key, _)| *key)
    }

    pub fn as_any(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.as_ref().map(|(_, value)| value.as_ref())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_key() == Some(TypeKey::of::<T>())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any()?.downcast_ref::<T>()
    }

    /// Take the value out as `T`, handing `self` back on a type mismatch
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.inner {
            Some((key, value)) if key == TypeKey::of::<T>() => match value.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(value) => Err(Self {
                    inner: Some((key, value)),
                }),
            },
            inner => Err(Self { inner }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_key() {
            Some(key) => write!(f, "Value({})", key.name()),
            None => f.write_str("Value(null)"),
        }
    }
}
