//! Bulk registration of catalogued types into an [`IocContainer`].
//!
//! [`IocContainer`]: crate::container::IocContainer

pub mod bulk;
pub mod extensions;

pub use bulk::{register_all_and_index, register_all_separately, register_all_under_contract};
pub use extensions::BulkRegistration;
