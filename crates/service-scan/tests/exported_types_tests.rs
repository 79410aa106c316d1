//! Integration tests for link-time exported types
//!
//! Types are exported with `export_type!` from the modules below and picked
//! up by module scans, crate scans and configuration files.

use std::env;

use serial_test::serial;
use service_scan::catalog::{ContractDescriptor, ContractRegistry, ExportedTypes, TypeCatalog, TypeDescriptor, TypeSource};
use service_scan::config::{RegistrationConfig, ScanEntry, DEFAULT_LIFETIME_ENV};
use service_scan::container::IocContainer;
use service_scan::errors::CoreError;
use service_scan::registrar::BulkRegistration;

pub trait Handler: Send + Sync {
    fn route(&self) -> &'static str;
}

pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

pub mod handlers {
    use super::Handler;
    use service_scan::catalog::TypeDescriptor;
    use service_scan::export_type;

    /// Abstract base of every HTTP handler
    pub struct HandlerBase;

    #[derive(Default)]
    pub struct UsersHandler;

    impl Handler for UsersHandler {
        fn route(&self) -> &'static str {
            "/users"
        }
    }

    #[derive(Default)]
    pub struct OrdersHandler;

    impl Handler for OrdersHandler {
        fn route(&self) -> &'static str {
            "/orders"
        }
    }

    fn describe_base() -> TypeDescriptor {
        TypeDescriptor::abstract_type::<HandlerBase>()
            .declares::<dyn Handler>()
            .build()
    }

    fn describe_users() -> TypeDescriptor {
        TypeDescriptor::of_default::<UsersHandler>()
            .extends::<HandlerBase>()
            .inherits::<dyn Handler>(|this| this)
            .build()
    }

    fn describe_orders() -> TypeDescriptor {
        TypeDescriptor::of_default::<OrdersHandler>()
            .extends::<HandlerBase>()
            .inherits::<dyn Handler>(|this| this)
            .build()
    }

    export_type!(describe_base);
    export_type!(describe_users);
    export_type!(describe_orders);

    pub mod admin {
        use super::super::Handler;
        use super::HandlerBase;
        use service_scan::catalog::TypeDescriptor;

        #[derive(Default)]
        pub struct AdminHandler;

        impl Handler for AdminHandler {
            fn route(&self) -> &'static str {
                "/admin"
            }
        }

        fn describe_admin() -> TypeDescriptor {
            TypeDescriptor::of_default::<AdminHandler>()
                .extends::<HandlerBase>()
                .inherits::<dyn Handler>(|this| this)
                .build()
        }

        service_scan::export_type!(describe_admin);
    }
}

pub mod notifiers {
    use super::Notifier;
    use service_scan::catalog::TypeDescriptor;

    #[derive(Default)]
    pub struct EmailNotifier;

    impl Notifier for EmailNotifier {
        fn channel(&self) -> &'static str {
            "email"
        }
    }

    fn describe_email() -> TypeDescriptor {
        TypeDescriptor::of_default::<EmailNotifier>()
            .implements::<dyn Notifier>(|this| this)
            .build()
    }

    service_scan::export_type!(describe_email);
}

fn routes(container: &IocContainer) -> Vec<&'static str> {
    let mut routes: Vec<_> = container
        .resolve_all::<dyn Handler>()
        .unwrap()
        .iter()
        .map(|h| h.route())
        .collect();
    routes.sort_unstable();
    routes
}

fn contracts() -> ContractRegistry {
    ContractRegistry::new()
        .with("Handler", ContractDescriptor::interface::<dyn Handler>())
        .with("Notifier", ContractDescriptor::interface::<dyn Notifier>())
        .with(
            "HandlerBase",
            ContractDescriptor::class::<handlers::HandlerBase, dyn Handler>(),
        )
}

#[test]
fn test_module_scan_includes_submodules() {
    let catalog = ExportedTypes::under("exported_types_tests::handlers").unwrap();
    assert_eq!(catalog.len(), 4);
    assert!(catalog.contains::<handlers::admin::AdminHandler>());
    assert!(!catalog.contains::<notifiers::EmailNotifier>());

    let admin_only = ExportedTypes::under("exported_types_tests::handlers::admin").unwrap();
    assert_eq!(admin_only.len(), 1);

    assert!(ExportedTypes::under("exported_types_tests::nothing_here").is_none());
}

#[test]
fn test_exported_catalog_order_is_stable() {
    let catalog = ExportedTypes::under("exported_types_tests").unwrap();
    let names: Vec<_> = catalog
        .exported_types()
        .iter()
        .map(|t| t.id().short_name())
        .collect();

    assert_eq!(
        names,
        vec![
            "HandlerBase",
            "OrdersHandler",
            "UsersHandler",
            "AdminHandler",
            "EmailNotifier"
        ]
    );
}

#[test]
fn test_add_all_exported_scans_the_declaring_crate() {
    let mut container = IocContainer::new();
    container
        .add_all_exported(&ContractDescriptor::interface::<dyn Handler>(), "transient")
        .unwrap()
        .add_all_exported(&ContractDescriptor::interface::<dyn Notifier>(), "singleton")
        .unwrap();
    container.build().unwrap();

    assert_eq!(routes(&container), vec!["/admin", "/orders", "/users"]);
    let notifiers = container.resolve_all::<dyn Notifier>().unwrap();
    assert_eq!(notifiers.len(), 1);
    assert_eq!(notifiers[0].channel(), "email");
}

#[test]
fn test_add_all_exported_without_exports_is_rejected() {
    trait Orphan: Send + Sync {}

    let mut container = IocContainer::new();
    let err = container
        .add_all_exported(&ContractDescriptor::interface::<dyn std::fmt::Debug + Send + Sync>(), "singleton")
        .err()
        .unwrap();
    assert!(err.is_invalid_argument());

    // Declared in this crate, so the crate scan runs and simply finds nothing.
    container
        .add_all_exported(&ContractDescriptor::interface::<dyn Orphan>(), "singleton")
        .unwrap();
    assert_eq!(container.service_count(), 0);
}

#[test]
fn test_ancestors_are_found_among_exported_types() {
    // The explicit catalog lacks HandlerBase; its interface comes from the export.
    let catalog = TypeCatalog::new("explicit").with_type(
        TypeDescriptor::of_default::<handlers::UsersHandler>()
            .extends::<handlers::HandlerBase>()
            .inherits::<dyn Handler>(|this| this),
    );

    let mut container = IocContainer::new();
    container
        .add_all_singleton(&ContractDescriptor::interface::<dyn Handler>(), &catalog)
        .unwrap();
    container.build().unwrap();

    assert_eq!(routes(&container), vec!["/users"]);
}

#[test]
fn test_config_applies_module_entries() {
    let config = RegistrationConfig::from_yaml_str(
        r#"
default_lifetime: singleton
registrations:
  - contract: Handler
    module: exported_types_tests::handlers
    lifetime: scoped
  - contract: Notifier
    mode: separately
"#,
    )
    .unwrap();

    let mut container = IocContainer::new();
    config.apply(&mut container, &contracts()).unwrap();
    container.build().unwrap();

    let scope = container.create_scope().unwrap();
    let handlers = container.resolve_all_scoped::<dyn Handler>(&scope).unwrap();
    assert_eq!(handlers.len(), 3);

    let email = container.resolve::<notifiers::EmailNotifier>().unwrap();
    let notifier = container.resolve::<dyn Notifier>().unwrap();
    assert_eq!(email.channel(), notifier.channel());
}

#[test]
fn test_config_class_contract() {
    let config = RegistrationConfig::new().with_entry(
        ScanEntry::new("HandlerBase")
            .in_module("exported_types_tests")
            .with_lifetime("transient"),
    );

    let mut container = IocContainer::new();
    config.apply(&mut container, &contracts()).unwrap();
    container.build().unwrap();

    assert_eq!(routes(&container), vec!["/admin", "/orders", "/users"]);
}

#[test]
fn test_config_errors_leave_container_untouched() {
    let mut container = IocContainer::new();

    let config = RegistrationConfig::new()
        .with_entry(ScanEntry::new("Handler"))
        .with_entry(ScanEntry::new("Unknown"));
    let err = config.apply(&mut container, &contracts()).err().unwrap();
    assert!(err.is_invalid_argument());
    assert_eq!(container.service_count(), 0);

    let config = RegistrationConfig::new()
        .with_entry(ScanEntry::new("Handler").in_module("exported_types_tests::missing"));
    let err = config.apply(&mut container, &contracts()).err().unwrap();
    assert!(matches!(err, CoreError::InvalidArgument { ref argument, .. } if argument == "source"));

    let config = RegistrationConfig::new().with_entry(ScanEntry::new("Handler").with_lifetime("pooled"));
    let err = config.apply(&mut container, &contracts()).err().unwrap();
    assert!(err.is_unsupported_lifetime());
    assert_eq!(container.service_count(), 0);
}

#[test]
#[serial]
fn test_env_default_lifetime_applies() {
    env::set_var(DEFAULT_LIFETIME_ENV, "scoped");
    let config = RegistrationConfig::new()
        .with_entry(ScanEntry::new("Notifier"))
        .with_env_overrides()
        .unwrap();
    env::remove_var(DEFAULT_LIFETIME_ENV);

    let mut container = IocContainer::new();
    config.apply(&mut container, &contracts()).unwrap();
    container.build().unwrap();

    let err = container.resolve::<dyn Notifier>().err().unwrap();
    assert!(matches!(err, CoreError::ScopeRequired { .. }));

    let scope = container.create_scope().unwrap();
    assert!(container.resolve_scoped::<dyn Notifier>(&scope).is_ok());
}
