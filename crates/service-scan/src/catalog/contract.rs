use std::any::TypeId;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::descriptor::TypeDescriptor;
use crate::catalog::exported::ExportedTypes;
use crate::catalog::source::TypeSource;
use crate::container::descriptor::ServiceId;

/// Whether a contract is matched by interface implementation or by descent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Interface,
    Class,
}

/// The base contract a bulk registration scans for.
///
/// `identity` is what candidates are matched against; `view` is the type
/// registrations are keyed and resolved under. Interface contracts use the
/// trait object for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractDescriptor {
    kind: ContractKind,
    identity: ServiceId,
    view: ServiceId,
}

impl ContractDescriptor {
    /// Contract matched by implementors of interface `V`
    pub fn interface<V: ?Sized + 'static>() -> Self {
        Self {
            kind: ContractKind::Interface,
            identity: ServiceId::of::<V>(),
            view: ServiceId::of::<V>(),
        }
    }

    /// Contract matched by class `C` and its descendants, resolved as `V`
    pub fn class<C: ?Sized + 'static, V: ?Sized + 'static>() -> Self {
        Self {
            kind: ContractKind::Class,
            identity: ServiceId::of::<C>(),
            view: ServiceId::of::<V>(),
        }
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    pub fn identity(&self) -> &ServiceId {
        &self.identity
    }

    pub fn view(&self) -> &ServiceId {
        &self.view
    }

    pub fn name(&self) -> String {
        self.identity.short_name()
    }

    /// Name of the crate that declares the contract type
    pub fn crate_name(&self) -> &'static str {
        let name = self.identity.type_name();
        let path = name.strip_prefix("dyn ").unwrap_or(name);
        path.split("::").next().unwrap_or(path)
    }

    /// Check whether `candidate` may be registered for this contract.
    ///
    /// Only concrete types qualify. Ancestors are looked up in `source`
    /// first and then among the exported types.
    pub fn is_satisfied_by(&self, candidate: &TypeDescriptor, source: &dyn TypeSource) -> bool {
        if !candidate.is_concrete() {
            return false;
        }

        match self.kind {
            ContractKind::Interface => implements(candidate, self.identity.type_id, source),
            ContractKind::Class => descends_from(candidate, self.identity.type_id, source),
        }
    }
}

impl std::fmt::Display for ContractDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identity.type_name())
    }
}

fn lookup<'a>(type_id: TypeId, source: &'a dyn TypeSource) -> Option<&'a TypeDescriptor> {
    source
        .find(type_id)
        .or_else(|| ExportedTypes::global().find(type_id))
}

fn descends_from(candidate: &TypeDescriptor, target: TypeId, source: &dyn TypeSource) -> bool {
    if candidate.id().type_id == target {
        return true;
    }

    let mut visited = HashSet::from([candidate.id().type_id]);
    let mut next = candidate.base().copied();
    while let Some(id) = next {
        if id.type_id == target {
            return true;
        }
        if !visited.insert(id.type_id) {
            return false;
        }
        next = lookup(id.type_id, source).and_then(|d| d.base().copied());
    }
    false
}

// Breadth-first over direct interfaces, interface extensions and base types.
fn implements(candidate: &TypeDescriptor, target: TypeId, source: &dyn TypeSource) -> bool {
    let mut visited = HashSet::from([candidate.id().type_id]);
    let mut pending: VecDeque<&TypeDescriptor> = VecDeque::from([candidate]);

    while let Some(descriptor) = pending.pop_front() {
        let related = descriptor.interfaces().iter().chain(descriptor.base());
        for id in related {
            if id.type_id == target && descriptor.interfaces().contains(id) {
                return true;
            }
            if visited.insert(id.type_id) {
                if let Some(next) = lookup(id.type_id, source) {
                    pending.push_back(next);
                }
            }
        }
    }
    false
}

/// Named contracts, used to resolve contract names in configuration
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, ContractDescriptor>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract under a name, replacing any earlier one
    pub fn register(&mut self, name: impl Into<String>, contract: ContractDescriptor) -> &mut Self {
        self.contracts.insert(name.into(), contract);
        self
    }

    pub fn with(mut self, name: impl Into<String>, contract: ContractDescriptor) -> Self {
        self.register(name, contract);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContractDescriptor> {
        self.contracts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.contracts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::TypeCatalog;

    trait Plugin: Send + Sync {}
    trait AudioPlugin: Plugin {}
    trait Unrelated: Send + Sync {}

    struct PluginBase;
    struct EffectBase;

    #[derive(Default)]
    struct Reverb;
    impl Plugin for Reverb {}

    #[derive(Default)]
    struct Delay;
    impl Plugin for Delay {}
    impl AudioPlugin for Delay {}

    #[derive(Default)]
    struct Standalone;
    impl Plugin for Standalone {}

    fn catalog() -> TypeCatalog {
        TypeCatalog::new("plugins")
            .with_type(TypeDescriptor::interface::<dyn AudioPlugin>().extends_interface::<dyn Plugin>())
            .with_type(TypeDescriptor::abstract_type::<PluginBase>().declares::<dyn Plugin>())
            .with_type(TypeDescriptor::abstract_type::<EffectBase>().extends::<PluginBase>())
            .with_type(
                TypeDescriptor::of_default::<Reverb>()
                    .extends::<EffectBase>()
                    .inherits::<dyn Plugin>(|this| this),
            )
            .with_type(
                TypeDescriptor::of_default::<Delay>()
                    .implements::<dyn AudioPlugin>(|this| this)
                    .inherits::<dyn Plugin>(|this| this),
            )
            .with_type(TypeDescriptor::of_default::<Standalone>())
    }

    #[test]
    fn test_interface_through_base_chain() {
        let catalog = catalog();
        let contract = ContractDescriptor::interface::<dyn Plugin>();
        let reverb = catalog.get::<Reverb>().unwrap();
        assert!(contract.is_satisfied_by(reverb, &catalog));
    }

    #[test]
    fn test_interface_through_interface_extension() {
        let catalog = catalog();
        let contract = ContractDescriptor::interface::<dyn Plugin>();
        let delay = catalog.get::<Delay>().unwrap();
        assert!(contract.is_satisfied_by(delay, &catalog));
        assert!(ContractDescriptor::interface::<dyn AudioPlugin>().is_satisfied_by(delay, &catalog));
    }

    #[test]
    fn test_undeclared_implementations_do_not_match() {
        let catalog = catalog();
        let standalone = catalog.get::<Standalone>().unwrap();
        assert!(!ContractDescriptor::interface::<dyn Plugin>().is_satisfied_by(standalone, &catalog));
        assert!(!ContractDescriptor::interface::<dyn Unrelated>().is_satisfied_by(standalone, &catalog));
    }

    #[test]
    fn test_abstract_types_never_match() {
        let catalog = catalog();
        let contract = ContractDescriptor::class::<PluginBase, dyn Plugin>();
        assert!(!contract.is_satisfied_by(catalog.get::<EffectBase>().unwrap(), &catalog));
        assert!(!contract.is_satisfied_by(catalog.get::<PluginBase>().unwrap(), &catalog));
    }

    #[test]
    fn test_class_contract_matches_descendants_only() {
        let catalog = catalog();
        let contract = ContractDescriptor::class::<PluginBase, dyn Plugin>();
        assert!(contract.is_satisfied_by(catalog.get::<Reverb>().unwrap(), &catalog));
        assert!(!contract.is_satisfied_by(catalog.get::<Delay>().unwrap(), &catalog));

        let exact = ContractDescriptor::class::<Standalone, Standalone>();
        assert!(exact.is_satisfied_by(catalog.get::<Standalone>().unwrap(), &catalog));
    }

    #[test]
    fn test_cyclic_ancestry_terminates() {
        struct Loop;
        let catalog = TypeCatalog::new("cycle")
            .with_type(TypeDescriptor::abstract_type::<Loop>().extends::<Loop>())
            .with_type(TypeDescriptor::of_default::<Reverb>().extends::<Loop>());
        let reverb = catalog.get::<Reverb>().unwrap();

        assert!(!ContractDescriptor::class::<PluginBase, dyn Plugin>().is_satisfied_by(reverb, &catalog));
        assert!(!ContractDescriptor::interface::<dyn Plugin>().is_satisfied_by(reverb, &catalog));
    }

    #[test]
    fn test_contract_names() {
        let contract = ContractDescriptor::interface::<dyn Plugin>();
        assert_eq!(contract.name(), "dyn Plugin");
        assert_eq!(contract.crate_name(), "service_scan");
        assert_eq!(contract.kind(), ContractKind::Interface);
        assert_eq!(contract.identity(), contract.view());

        let class = ContractDescriptor::class::<PluginBase, dyn Plugin>();
        assert_eq!(class.crate_name(), "service_scan");
        assert_ne!(class.identity(), class.view());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ContractRegistry::new()
            .with("Plugin", ContractDescriptor::interface::<dyn Plugin>())
            .with("PluginBase", ContractDescriptor::class::<PluginBase, dyn Plugin>());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Plugin"));
        assert_eq!(registry.get("PluginBase").unwrap().kind(), ContractKind::Class);
        assert!(registry.get("Missing").is_none());
        assert_eq!(registry.names(), vec!["Plugin", "PluginBase"]);
    }
}
