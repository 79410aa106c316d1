pub mod binding;
pub mod descriptor;
pub mod index;
pub mod ioc_container;
pub mod scope;

pub use binding::{ServiceBinder, ServiceBindings};
pub use descriptor::{ErasedInstance, ServiceDescriptor, ServiceFactory, ServiceId};
pub use index::ServiceIndex;
pub use ioc_container::{IocContainer, ResolutionContext};
pub use scope::{IntoServiceScope, ScopeId, ServiceScope};
