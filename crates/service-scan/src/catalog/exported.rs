use std::sync::OnceLock;

use crate::catalog::contract::ContractDescriptor;
use crate::catalog::descriptor::TypeDescriptor;
use crate::catalog::source::TypeCatalog;

/// A type submitted to the process-wide registry with [`export_type!`].
///
/// [`export_type!`]: crate::export_type
pub struct ExportedType {
    /// Module path of the submitting code
    pub module: &'static str,
    describe: fn() -> TypeDescriptor,
}

impl ExportedType {
    pub const fn new(module: &'static str, describe: fn() -> TypeDescriptor) -> Self {
        Self { module, describe }
    }

    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }

    /// Check if the type was exported from `prefix` or one of its submodules
    pub fn is_under(&self, prefix: &str) -> bool {
        self.module == prefix
            || self
                .module
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

inventory::collect!(ExportedType);

/// Export a type descriptor so module and crate scans can find it.
///
/// ```ignore
/// fn describe_file_service() -> TypeDescriptor {
///     TypeDescriptor::of_default::<FileService>()
///         .implements::<dyn Service>(|this| this)
///         .build()
/// }
///
/// service_scan::export_type!(describe_file_service);
/// ```
#[macro_export]
macro_rules! export_type {
    ($describe:path) => {
        $crate::inventory::submit! {
            $crate::catalog::ExportedType::new(module_path!(), $describe)
        }
    };
}

static GLOBAL: OnceLock<TypeCatalog> = OnceLock::new();

/// Access to the types registered with [`export_type!`].
///
/// Catalogs built from exports are ordered by module path and then by type
/// name, since link order is not stable.
///
/// [`export_type!`]: crate::export_type
pub struct ExportedTypes;

impl ExportedTypes {
    /// Every raw export
    pub fn all() -> impl Iterator<Item = &'static ExportedType> {
        inventory::iter::<ExportedType>.into_iter()
    }

    /// Catalog of every exported type, built on first use
    pub fn global() -> &'static TypeCatalog {
        GLOBAL.get_or_init(|| {
            let catalog = Self::collect("exported types", |_| true);
            tracing::debug!(types = catalog.len(), "exported type catalog initialised");
            catalog
        })
    }

    /// Catalog of the types exported from a module and its submodules.
    ///
    /// Returns `None` when nothing is exported there.
    pub fn under(module: &str) -> Option<TypeCatalog> {
        let catalog = Self::collect(module, |export| export.is_under(module));
        if catalog.is_empty() {
            None
        } else {
            Some(catalog)
        }
    }

    /// Catalog of the types exported by the crate declaring `contract`
    pub fn crate_of(contract: &ContractDescriptor) -> Option<TypeCatalog> {
        Self::under(contract.crate_name())
    }

    fn collect(name: &str, filter: impl Fn(&ExportedType) -> bool) -> TypeCatalog {
        let mut exports: Vec<(&'static str, TypeDescriptor)> = Self::all()
            .filter(|export| filter(export))
            .map(|export| (export.module, export.describe()))
            .collect();
        exports.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.name().cmp(b.1.name())));

        let mut catalog = TypeCatalog::new(name);
        catalog.extend(exports.into_iter().map(|(_, descriptor)| descriptor));
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::TypeSource;

    #[derive(Default)]
    struct Exported;

    fn describe_exported() -> TypeDescriptor {
        TypeDescriptor::of_default::<Exported>().build()
    }

    crate::export_type!(describe_exported);

    #[test]
    fn test_module_prefix_matching() {
        let export = ExportedType::new("app::services::files", describe_exported);
        assert!(export.is_under("app"));
        assert!(export.is_under("app::services"));
        assert!(export.is_under("app::services::files"));
        assert!(!export.is_under("app::serv"));
        assert!(!export.is_under("other"));
    }

    #[test]
    fn test_exports_are_discoverable() {
        let module = module_path!();
        assert!(ExportedTypes::all().any(|e| e.module == module));

        let catalog = ExportedTypes::under(module).unwrap();
        assert!(catalog.contains::<Exported>());
        assert_eq!(catalog.name(), module);

        assert!(ExportedTypes::global().contains::<Exported>());
        assert!(ExportedTypes::under("no_such_crate::anywhere").is_none());
    }
}
