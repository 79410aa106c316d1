use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::container::ioc_container::ResolutionContext;
use crate::container::scope::ServiceScope;
use crate::errors::CoreError;

/// Service identifier: a type id plus its readable name
#[derive(Debug, Clone, Copy)]
pub struct ServiceId {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl ServiceId {
    /// Create a new service ID for a type
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Check if this id names `T`
    pub fn is<T: 'static + ?Sized>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module path, e.g. `FileService` or `dyn IService`
    pub fn short_name(&self) -> String {
        let name = self.type_name;
        let (prefix, path) = match name.strip_prefix("dyn ") {
            Some(rest) => ("dyn ", rest),
            None => ("", name),
        };
        let path = path.split(" + ").next().unwrap_or(path);
        let head = path.split('<').next().unwrap_or(path);
        let last = head.rsplit("::").next().unwrap_or(head);
        format!("{}{}{}", prefix, last, &path[head.len()..])
    }
}

// Names can differ across crates for the same type; identity is the type id.
impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceId {}

impl std::hash::Hash for ServiceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Type-erased service instance. The concrete value is always an `Arc<V>`
/// where `V` is the type named by the registration's service id.
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// Factory function for creating service instances
pub type ServiceFactory =
    Arc<dyn Fn(&ResolutionContext<'_>) -> Result<ErasedInstance, CoreError> + Send + Sync>;

/// Service descriptor containing all metadata for a registration
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Key the registration is resolved under
    pub service_id: ServiceId,
    /// Type that actually produces the instance
    pub implementation: ServiceId,
    /// Service lifetime/scope
    pub lifetime: ServiceScope,
    factory: ServiceFactory,
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_id", &self.service_id)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .field("factory", &"<factory_fn>")
            .finish()
    }
}

impl ServiceDescriptor {
    /// Create a descriptor from an already erased factory.
    ///
    /// The factory must return an `Arc<V>` boxed as [`ErasedInstance`], with
    /// `V` being the type behind `service_id`.
    pub fn erased(
        service_id: ServiceId,
        implementation: ServiceId,
        lifetime: ServiceScope,
        factory: ServiceFactory,
    ) -> Self {
        Self {
            service_id,
            implementation,
            lifetime,
            factory,
        }
    }

    /// Create a typed descriptor registered under `V`
    pub fn from_factory<V, F>(implementation: ServiceId, lifetime: ServiceScope, factory: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<V>, CoreError> + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |ctx: &ResolutionContext<'_>| {
            let instance = factory(ctx)?;
            Ok(Arc::new(instance) as ErasedInstance)
        });

        Self::erased(ServiceId::of::<V>(), implementation, lifetime, factory)
    }

    /// Register a ready-made instance under `V` as a singleton
    pub fn from_instance<V>(implementation: ServiceId, instance: Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        Self::from_factory::<V, _>(implementation, ServiceScope::Singleton, move |_| {
            Ok(instance.clone())
        })
    }

    pub(crate) fn create(&self, ctx: &ResolutionContext<'_>) -> Result<ErasedInstance, CoreError> {
        (self.factory)(ctx)
    }
}

/// Recover a typed `Arc<V>` from an erased instance
pub(crate) fn downcast_instance<V>(instance: &ErasedInstance) -> Result<Arc<V>, CoreError>
where
    V: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<V>>()
        .cloned()
        .ok_or_else(|| CoreError::InvalidServiceDescriptor {
            message: format!(
                "registration for {} produced an instance of another type",
                std::any::type_name::<V>()
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_service_id_identity() {
        let a = ServiceId::of::<dyn Greeter>();
        let b = ServiceId::of::<dyn Greeter>();
        assert_eq!(a, b);
        assert!(a.is::<dyn Greeter>());
        assert!(!a.is::<English>());
        assert_ne!(a, ServiceId::of::<English>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(ServiceId::of::<English>().short_name(), "English");
        assert_eq!(ServiceId::of::<dyn Greeter>().short_name(), "dyn Greeter");
        assert_eq!(ServiceId::of::<Vec<u8>>().short_name(), "Vec<u8>");
    }

    #[test]
    fn test_erased_round_trip() {
        let instance: Arc<dyn Greeter> = Arc::new(English);
        let erased: ErasedInstance = Arc::new(instance);
        let back = downcast_instance::<dyn Greeter>(&erased).unwrap();
        assert_eq!(back.greet(), "hello");

        let err = downcast_instance::<English>(&erased).err().unwrap();
        assert!(matches!(err, CoreError::InvalidServiceDescriptor { .. }));
    }

    #[test]
    fn test_descriptor_debug_hides_factory() {
        let descriptor = ServiceDescriptor::from_instance::<dyn Greeter>(
            ServiceId::of::<English>(),
            Arc::new(English),
        );
        let debug = format!("{:?}", descriptor);
        assert!(debug.contains("<factory_fn>"));
        assert_eq!(descriptor.lifetime, ServiceScope::Singleton);
        assert!(descriptor.service_id.is::<dyn Greeter>());
        assert!(descriptor.implementation.is::<English>());
    }
}
