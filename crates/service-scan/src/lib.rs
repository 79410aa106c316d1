//! Scan type catalogs for implementations of a base contract and register
//! them into an IoC container in bulk, as singletons, scoped or transient
//! services.
//!
//! ```ignore
//! use service_scan::prelude::*;
//!
//! let catalog = TypeCatalog::new("services")
//!     .with_type(TypeDescriptor::of_default::<FileService>().implements::<dyn Service>(|s| s))
//!     .with_type(TypeDescriptor::of_default::<ImageService>().implements::<dyn Service>(|s| s));
//!
//! let mut container = IocContainer::new();
//! container.add_all_singleton(&ContractDescriptor::interface::<dyn Service>(), &catalog)?;
//! container.build()?;
//!
//! let services = container.resolve_all::<dyn Service>()?;
//! ```

pub mod catalog;
pub mod config;
pub mod container;
pub mod errors;
pub mod registrar;

#[doc(hidden)]
pub use inventory;

pub use catalog::{
    ContractDescriptor, ContractKind, ContractRegistry, ExportedType, ExportedTypes, TypeCatalog,
    TypeDescriptor, TypeKind, TypeSource,
};
pub use config::{RegistrationConfig, RegistrationMode, ScanEntry};
pub use container::{
    IntoServiceScope, IocContainer, ResolutionContext, ScopeId, ServiceBinder, ServiceIndex,
    ServiceScope,
};
pub use errors::CoreError;
pub use registrar::{
    register_all_and_index, register_all_separately, register_all_under_contract,
    BulkRegistration,
};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::catalog::{ContractDescriptor, ExportedTypes, TypeCatalog, TypeDescriptor, TypeSource};
    pub use crate::container::{IocContainer, ServiceBinder, ServiceIndex, ServiceScope};
    pub use crate::errors::CoreError;
    pub use crate::registrar::BulkRegistration;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
