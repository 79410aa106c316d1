use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::container::binding::{ServiceBinder, ServiceBindings};
use crate::container::descriptor::{downcast_instance, ErasedInstance, ServiceDescriptor, ServiceId};
use crate::container::scope::{ScopeId, ScopedServiceManager, ServiceScope};
use crate::errors::CoreError;

/// IoC container holding registrations, cached instances and scopes.
///
/// Registration needs `&mut self` and is only allowed before [`build`].
/// Resolution takes `&self` and may run concurrently.
///
/// [`build`]: IocContainer::build
#[derive(Debug, Default)]
pub struct IocContainer {
    /// Service bindings and descriptors
    bindings: ServiceBindings,
    /// Singleton instances by registration slot
    singletons: RwLock<HashMap<usize, ErasedInstance>>,
    /// Active scopes
    scopes: RwLock<HashMap<ScopeId, Arc<ScopedServiceManager>>>,
    /// Whether the container is built and ready
    is_built: bool,
}

impl IocContainer {
    /// Create a new IoC container
    pub fn new() -> Self {
        Self::default()
    }

    /// Create IoC container from existing bindings
    pub fn from_bindings(bindings: ServiceBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Build the container and prepare for service resolution
    pub fn build(&mut self) -> Result<(), CoreError> {
        if self.is_built {
            return Ok(());
        }

        self.is_built = true;
        tracing::debug!(
            registrations = self.bindings.count(),
            services = self.bindings.service_ids().len(),
            "IoC container built"
        );
        Ok(())
    }

    /// Check if the container has been built
    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// Get the registered bindings
    pub fn bindings(&self) -> &ServiceBindings {
        &self.bindings
    }

    /// Add several descriptors at once. Either all are added or none.
    pub fn add_descriptors<I>(&mut self, descriptors: I) -> Result<&mut Self, CoreError>
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        self.ensure_not_built()?;
        for descriptor in descriptors {
            self.bindings.push(descriptor);
        }
        Ok(self)
    }

    /// Create a new service scope
    pub fn create_scope(&self) -> Result<ScopeId, CoreError> {
        let scope_id = ScopeId::new();
        let mut scopes = self.scopes.write().map_err(|_| CoreError::lock("scopes"))?;
        scopes.insert(scope_id, Arc::new(ScopedServiceManager::new(scope_id)));

        tracing::debug!(scope = %scope_id, "scope created");
        Ok(scope_id)
    }

    /// Dispose of a scope and drop every instance it owns
    pub fn dispose_scope(&self, scope_id: &ScopeId) -> Result<(), CoreError> {
        let removed = {
            let mut scopes = self.scopes.write().map_err(|_| CoreError::lock("scopes"))?;
            scopes.remove(scope_id)
        };

        match removed {
            Some(manager) => {
                tracing::debug!(
                    scope = %manager.scope_id(),
                    instances = manager.service_count(),
                    "scope disposed"
                );
                Ok(())
            }
            None => Err(CoreError::ScopeNotFound {
                scope: scope_id.to_string(),
            }),
        }
    }

    /// Resolve the most recently registered implementation of `V`
    pub fn resolve<V>(&self) -> Result<Arc<V>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve_in::<V>(None)
    }

    /// Try to resolve a service, returning None if it fails
    pub fn try_resolve<V>(&self) -> Option<Arc<V>>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<V>().ok()
    }

    /// Resolve every implementation of `V` in registration order
    pub fn resolve_all<V>(&self) -> Result<Vec<Arc<V>>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve_all_in::<V>(None)
    }

    /// Resolve a service within a scope
    pub fn resolve_scoped<V>(&self, scope_id: &ScopeId) -> Result<Arc<V>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve_in::<V>(Some(scope_id))
    }

    /// Try to resolve a service within a scope
    pub fn try_resolve_scoped<V>(&self, scope_id: &ScopeId) -> Option<Arc<V>>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve_scoped::<V>(scope_id).ok()
    }

    /// Resolve every implementation of `V` within a scope
    pub fn resolve_all_scoped<V>(&self, scope_id: &ScopeId) -> Result<Vec<Arc<V>>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve_all_in::<V>(Some(scope_id))
    }

    /// Check if a service is registered
    pub fn contains<V: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains(&ServiceId::of::<V>())
    }

    /// Get the number of registrations
    pub fn service_count(&self) -> usize {
        self.bindings.count()
    }

    /// Get every registration under `V`, in registration order
    pub fn registrations_for<V: ?Sized + 'static>(&self) -> Vec<&ServiceDescriptor> {
        self.bindings.descriptors_for(&ServiceId::of::<V>())
    }

    fn ensure_not_built(&self) -> Result<(), CoreError> {
        if self.is_built {
            return Err(CoreError::InvalidServiceDescriptor {
                message: "cannot add registrations after the container is built".to_string(),
            });
        }
        Ok(())
    }

    fn ensure_built(&self) -> Result<(), CoreError> {
        if !self.is_built {
            return Err(CoreError::InvalidServiceDescriptor {
                message: "container must be built before resolving services".to_string(),
            });
        }
        Ok(())
    }

    fn resolve_in<V>(&self, scope: Option<&ScopeId>) -> Result<Arc<V>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.ensure_built()?;
        let service_id = ServiceId::of::<V>();
        let slot = *self
            .bindings
            .slots_for(&service_id)
            .last()
            .ok_or_else(|| CoreError::service_not_found(service_id.type_name()))?;

        let instance = self.resolve_slot(slot, scope)?;
        downcast_instance::<V>(&instance)
    }

    fn resolve_all_in<V>(&self, scope: Option<&ScopeId>) -> Result<Vec<Arc<V>>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.ensure_built()?;
        self.bindings
            .slots_for(&ServiceId::of::<V>())
            .iter()
            .map(|slot| {
                let instance = self.resolve_slot(*slot, scope)?;
                downcast_instance::<V>(&instance)
            })
            .collect()
    }

    /// Resolve the registration of `service_id` produced by `implementation`
    pub(crate) fn resolve_registration(
        &self,
        service_id: &ServiceId,
        implementation: &ServiceId,
        scope: Option<&ScopeId>,
    ) -> Result<ErasedInstance, CoreError> {
        self.ensure_built()?;
        let slot = self
            .bindings
            .slots_for(service_id)
            .iter()
            .rev()
            .copied()
            .find(|slot| {
                self.bindings
                    .descriptor_at(*slot)
                    .is_some_and(|d| d.implementation == *implementation)
            })
            .ok_or_else(|| {
                CoreError::service_not_found(format!(
                    "{} implemented by {}",
                    service_id.type_name(),
                    implementation.type_name()
                ))
            })?;

        self.resolve_slot(slot, scope)
    }

    fn scope_manager(&self, scope_id: &ScopeId) -> Result<Arc<ScopedServiceManager>, CoreError> {
        let scopes = self.scopes.read().map_err(|_| CoreError::lock("scopes"))?;
        scopes
            .get(scope_id)
            .cloned()
            .ok_or_else(|| CoreError::ScopeNotFound {
                scope: scope_id.to_string(),
            })
    }

    // Locks are released before any factory runs so factories may resolve
    // their own dependencies.
    fn resolve_slot(&self, slot: usize, scope: Option<&ScopeId>) -> Result<ErasedInstance, CoreError> {
        let descriptor = self
            .bindings
            .descriptor_at(slot)
            .ok_or_else(|| CoreError::InvalidServiceDescriptor {
                message: format!("no registration in slot {}", slot),
            })?;

        match descriptor.lifetime {
            ServiceScope::Singleton => {
                {
                    let singletons = self
                        .singletons
                        .read()
                        .map_err(|_| CoreError::lock("singletons"))?;
                    if let Some(instance) = singletons.get(&slot) {
                        return Ok(instance.clone());
                    }
                }

                let instance = descriptor.create(&ResolutionContext::new(self, None))?;
                let mut singletons = self
                    .singletons
                    .write()
                    .map_err(|_| CoreError::lock("singletons"))?;
                Ok(singletons.entry(slot).or_insert(instance).clone())
            }
            ServiceScope::Scoped => {
                let scope_id = scope.ok_or_else(|| CoreError::ScopeRequired {
                    service_type: descriptor.service_id.type_name().to_string(),
                })?;
                let manager = self.scope_manager(scope_id)?;
                if let Some(instance) = manager.get(slot)? {
                    return Ok(instance);
                }

                let instance = descriptor.create(&ResolutionContext::new(self, Some(scope_id)))?;
                manager.get_or_insert(slot, instance)
            }
            ServiceScope::Transient => descriptor.create(&ResolutionContext::new(self, scope)),
        }
    }
}

impl ServiceBinder for IocContainer {
    fn add_descriptor(&mut self, descriptor: ServiceDescriptor) -> Result<&mut Self, CoreError> {
        self.ensure_not_built()?;
        self.bindings.push(descriptor);
        Ok(self)
    }
}

/// Handle passed to factories so they can resolve their own dependencies.
///
/// It remembers the scope the outer resolution runs in. Singletons are
/// always created without a scope, so they cannot capture scoped services.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    container: &'a IocContainer,
    scope: Option<&'a ScopeId>,
}

impl<'a> ResolutionContext<'a> {
    pub(crate) fn new(container: &'a IocContainer, scope: Option<&'a ScopeId>) -> Self {
        Self { container, scope }
    }

    pub fn container(&self) -> &'a IocContainer {
        self.container
    }

    pub fn scope(&self) -> Option<&'a ScopeId> {
        self.scope
    }

    pub fn resolve<V>(&self) -> Result<Arc<V>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve_in::<V>(self.scope)
    }

    pub fn try_resolve<V>(&self) -> Option<Arc<V>>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<V>().ok()
    }

    pub fn resolve_all<V>(&self) -> Result<Vec<Arc<V>>, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve_all_in::<V>(self.scope)
    }

    pub(crate) fn resolve_registration(
        &self,
        service_id: &ServiceId,
        implementation: &ServiceId,
    ) -> Result<ErasedInstance, CoreError> {
        self.container
            .resolve_registration(service_id, implementation, self.scope)
    }
}
