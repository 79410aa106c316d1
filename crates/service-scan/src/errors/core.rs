use thiserror::Error;

/// Core error type for service scanning and registration
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("Unsupported service lifetime: {lifetime}")]
    UnsupportedLifetime { lifetime: String },

    #[error("Duplicate key {key} while indexing implementations of {contract}")]
    DuplicateKey { key: String, contract: String },

    #[error("Type '{implementation}' satisfies '{contract}' but provides no view for it")]
    MissingContractView {
        implementation: String,
        contract: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("Scoped service '{service_type}' must be resolved within a scope")]
    ScopeRequired { service_type: String },

    #[error("Scope not found: {scope}")]
    ScopeNotFound { scope: String },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("Invalid service descriptor: {message}")]
    InvalidServiceDescriptor { message: String },

    #[error("Service initialization failed for '{service_type}': {source}")]
    ServiceInitializationFailed {
        service_type: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CoreError {
    /// Create a new invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Create a new unsupported lifetime error
    pub fn unsupported_lifetime(lifetime: impl Into<String>) -> Self {
        Self::UnsupportedLifetime {
            lifetime: lifetime.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Wrap a failure raised while constructing a service
    pub fn initialization_failed(
        service_type: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ServiceInitializationFailed {
            service_type: service_type.into(),
            source: source.into(),
        }
    }

    pub(crate) fn lock(resource: &str) -> Self {
        Self::LockError {
            resource: resource.to_string(),
        }
    }

    /// Check if the error is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Check if the error is an unsupported lifetime error
    pub fn is_unsupported_lifetime(&self) -> bool {
        matches!(self, Self::UnsupportedLifetime { .. })
    }

    /// Check if the error is a duplicate key error
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Check if the error is a service lookup error
    pub fn is_service_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}
