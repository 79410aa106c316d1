use std::fmt::Debug;
use std::hash::Hash;

use crate::catalog::{ContractDescriptor, ExportedTypes, TypeSource};
use crate::container::{IntoServiceScope, IocContainer, ServiceScope};
use crate::errors::CoreError;
use crate::registrar::bulk::{register_all_and_index, register_all_separately, register_all_under_contract};

/// Lifetime-specific bulk registration helpers for [`IocContainer`].
///
/// ```ignore
/// container
///     .add_all_singleton(&ContractDescriptor::interface::<dyn Service>(), &catalog)?
///     .add_all_scoped_separately(&ContractDescriptor::interface::<dyn Handler>(), &catalog)?;
/// ```
pub trait BulkRegistration {
    fn add_all_singleton(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_scoped(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_transient(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_singleton_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_scoped_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_transient_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError>;

    fn add_all_singleton_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static;

    fn add_all_scoped_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static;

    fn add_all_transient_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static;

    /// Register every type exported by the crate that declares `contract`
    fn add_all_exported<L: IntoServiceScope>(
        &mut self,
        contract: &ContractDescriptor,
        lifetime: L,
    ) -> Result<&mut Self, CoreError>;
}

impl BulkRegistration for IocContainer {
    fn add_all_singleton(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_under_contract(self, Some(contract), Some(source), ServiceScope::Singleton)
    }

    fn add_all_scoped(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_under_contract(self, Some(contract), Some(source), ServiceScope::Scoped)
    }

    fn add_all_transient(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_under_contract(self, Some(contract), Some(source), ServiceScope::Transient)
    }

    fn add_all_singleton_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_separately(self, Some(contract), Some(source), ServiceScope::Singleton)
    }

    fn add_all_scoped_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_separately(self, Some(contract), Some(source), ServiceScope::Scoped)
    }

    fn add_all_transient_separately(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
    ) -> Result<&mut Self, CoreError> {
        register_all_separately(self, Some(contract), Some(source), ServiceScope::Transient)
    }

    fn add_all_singleton_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        register_all_and_index::<V, K, F>(
            self,
            Some(contract),
            Some(source),
            ServiceScope::Singleton,
            Some(key_fn),
        )
    }

    fn add_all_scoped_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        register_all_and_index::<V, K, F>(
            self,
            Some(contract),
            Some(source),
            ServiceScope::Scoped,
            Some(key_fn),
        )
    }

    fn add_all_transient_indexed<V, K, F>(
        &mut self,
        contract: &ContractDescriptor,
        source: &dyn TypeSource,
        key_fn: F,
    ) -> Result<&mut Self, CoreError>
    where
        V: ?Sized + Send + Sync + 'static,
        K: Eq + Hash + Debug + Send + Sync + 'static,
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        register_all_and_index::<V, K, F>(
            self,
            Some(contract),
            Some(source),
            ServiceScope::Transient,
            Some(key_fn),
        )
    }

    fn add_all_exported<L: IntoServiceScope>(
        &mut self,
        contract: &ContractDescriptor,
        lifetime: L,
    ) -> Result<&mut Self, CoreError> {
        let catalog = ExportedTypes::crate_of(contract).ok_or_else(|| {
            CoreError::invalid_argument(
                "source",
                format!("crate `{}` exports no types", contract.crate_name()),
            )
        })?;

        register_all_under_contract(self, Some(contract), Some(&catalog), lifetime)
    }
}
