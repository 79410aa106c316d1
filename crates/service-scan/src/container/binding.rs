use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::container::descriptor::{ServiceDescriptor, ServiceId};
use crate::container::ioc_container::ResolutionContext;
use crate::container::scope::ServiceScope;
use crate::errors::CoreError;

/// Trait for anything that accepts service registrations
pub trait ServiceBinder {
    /// Add a fully built descriptor
    fn add_descriptor(&mut self, descriptor: ServiceDescriptor) -> Result<&mut Self, CoreError>;

    /// Bind `V` to a factory with the given lifetime
    fn bind_factory<V, F>(
        &mut self,
        lifetime: ServiceScope,
        implementation: ServiceId,
        factory: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<V>, CoreError> + Send + Sync + 'static,
    {
        self.add_descriptor(ServiceDescriptor::from_factory::<V, F>(
            implementation,
            lifetime,
            factory,
        ))
    }

    /// Bind a pre-created instance under `V`
    fn bind_instance<V, TImpl>(&mut self, instance: Arc<V>) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        TImpl: 'static,
    {
        self.add_descriptor(ServiceDescriptor::from_instance::<V>(
            ServiceId::of::<TImpl>(),
            instance,
        ))
    }

    /// Bind a `Default`-constructible type under its own type as a singleton
    fn bind_singleton<T>(&mut self) -> Result<&mut Self, CoreError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.bind_factory::<T, _>(ServiceScope::Singleton, ServiceId::of::<T>(), |_| {
            Ok(Arc::new(T::default()))
        })
    }

    /// Bind a `Default`-constructible type under its own type as transient
    fn bind_transient<T>(&mut self) -> Result<&mut Self, CoreError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.bind_factory::<T, _>(ServiceScope::Transient, ServiceId::of::<T>(), |_| {
            Ok(Arc::new(T::default()))
        })
    }

    /// Bind a `Default`-constructible type under its own type, one per scope
    fn bind_scoped<T>(&mut self) -> Result<&mut Self, CoreError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.bind_factory::<T, _>(ServiceScope::Scoped, ServiceId::of::<T>(), |_| {
            Ok(Arc::new(T::default()))
        })
    }
}

/// Ordered collection of service descriptors.
///
/// Several descriptors may share a service id; they keep their insertion
/// order, and the last one is the default for single resolution.
#[derive(Debug, Default, Clone)]
pub struct ServiceBindings {
    descriptors: Vec<ServiceDescriptor>,
    slots: HashMap<TypeId, Vec<usize>>,
}

impl ServiceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn push(&mut self, descriptor: ServiceDescriptor) {
        let slot = self.descriptors.len();
        self.slots
            .entry(descriptor.service_id.type_id)
            .or_default()
            .push(slot);
        self.descriptors.push(descriptor);
    }

    /// Get all descriptors in registration order
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Get the descriptor single resolution would use
    pub fn get_descriptor(&self, service_id: &ServiceId) -> Option<&ServiceDescriptor> {
        self.slots_for(service_id)
            .last()
            .and_then(|slot| self.descriptors.get(*slot))
    }

    /// Get every descriptor registered under a service id
    pub fn descriptors_for(&self, service_id: &ServiceId) -> Vec<&ServiceDescriptor> {
        self.slots_for(service_id)
            .iter()
            .filter_map(|slot| self.descriptors.get(*slot))
            .collect()
    }

    pub(crate) fn slots_for(&self, service_id: &ServiceId) -> &[usize] {
        self.slots
            .get(&service_id.type_id)
            .map(|slots| slots.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn descriptor_at(&self, slot: usize) -> Option<&ServiceDescriptor> {
        self.descriptors.get(slot)
    }

    /// Distinct service ids, in order of first registration
    pub fn service_ids(&self) -> Vec<ServiceId> {
        let mut seen = std::collections::HashSet::new();
        self.descriptors
            .iter()
            .filter(|d| seen.insert(d.service_id.type_id))
            .map(|d| d.service_id)
            .collect()
    }

    /// Check if a service is registered
    pub fn contains(&self, service_id: &ServiceId) -> bool {
        !self.slots_for(service_id).is_empty()
    }

    /// Get the number of registered descriptors
    pub fn count(&self) -> usize {
        self.descriptors.len()
    }
}

impl ServiceBinder for ServiceBindings {
    fn add_descriptor(&mut self, descriptor: ServiceDescriptor) -> Result<&mut Self, CoreError> {
        self.push(descriptor);
        Ok(self)
    }
}
