//! Type descriptors and the sources bulk registration scans.

pub mod contract;
pub mod descriptor;
pub mod exported;
pub mod source;

pub use contract::{ContractDescriptor, ContractKind, ContractRegistry};
pub use descriptor::{RawInstance, TypeBuilder, TypeDescriptor, TypeKind};
pub use exported::{ExportedType, ExportedTypes};
pub use source::{TypeCatalog, TypeSource};
