use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::CoreError;

/// Service lifetime enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceScope {
    /// Single instance shared across the container
    #[default]
    Singleton,
    /// New instance created for each resolution
    Transient,
    /// One instance per scope created with `IocContainer::create_scope`
    Scoped,
}

impl ServiceScope {
    /// Check if the scope is singleton
    pub fn is_singleton(&self) -> bool {
        matches!(self, ServiceScope::Singleton)
    }

    /// Check if the scope is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceScope::Transient)
    }

    /// Check if the scope is scoped
    pub fn is_scoped(&self) -> bool {
        matches!(self, ServiceScope::Scoped)
    }

    /// Get the scope name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceScope::Singleton => "singleton",
            ServiceScope::Transient => "transient",
            ServiceScope::Scoped => "scoped",
        }
    }
}

impl std::fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServiceScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleton" => Ok(ServiceScope::Singleton),
            "transient" => Ok(ServiceScope::Transient),
            "scoped" => Ok(ServiceScope::Scoped),
            _ => Err(CoreError::unsupported_lifetime(s)),
        }
    }
}

/// Anything a bulk registration accepts as a lifetime.
///
/// Lifetimes named by string are parsed here, so an unknown name surfaces
/// as [`CoreError::UnsupportedLifetime`] before any scanning happens.
pub trait IntoServiceScope {
    fn into_service_scope(self) -> Result<ServiceScope, CoreError>;
}

impl IntoServiceScope for ServiceScope {
    fn into_service_scope(self) -> Result<ServiceScope, CoreError> {
        Ok(self)
    }
}

impl IntoServiceScope for &str {
    fn into_service_scope(self) -> Result<ServiceScope, CoreError> {
        self.parse()
    }
}

impl IntoServiceScope for String {
    fn into_service_scope(self) -> Result<ServiceScope, CoreError> {
        self.parse()
    }
}

impl IntoServiceScope for &String {
    fn into_service_scope(self) -> Result<ServiceScope, CoreError> {
        self.parse()
    }
}

/// Identifier of a resolution scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(uuid::Uuid);

impl ScopeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instances owned by a single scope, keyed by registration slot
#[derive(Debug)]
pub(crate) struct ScopedServiceManager {
    scope_id: ScopeId,
    services: RwLock<HashMap<usize, Arc<dyn Any + Send + Sync>>>,
}

impl ScopedServiceManager {
    pub(crate) fn new(scope_id: ScopeId) -> Self {
        Self {
            scope_id,
            services: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    pub(crate) fn get(&self, slot: usize) -> Result<Option<Arc<dyn Any + Send + Sync>>, CoreError> {
        let services = self
            .services
            .read()
            .map_err(|_| CoreError::lock("scoped_services"))?;
        Ok(services.get(&slot).cloned())
    }

    /// Store an instance unless another caller got there first; returns the stored one.
    pub(crate) fn get_or_insert(
        &self,
        slot: usize,
        instance: Arc<dyn Any + Send + Sync>,
    ) -> Result<Arc<dyn Any + Send + Sync>, CoreError> {
        let mut services = self
            .services
            .write()
            .map_err(|_| CoreError::lock("scoped_services"))?;
        Ok(services.entry(slot).or_insert(instance).clone())
    }

    pub(crate) fn service_count(&self) -> usize {
        self.services.read().map(|s| s.len()).unwrap_or(0)
    }
}
