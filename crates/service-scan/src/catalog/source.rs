use std::any::TypeId;
use std::collections::HashMap;

use crate::catalog::descriptor::TypeDescriptor;

/// A set of candidate types to scan
pub trait TypeSource: Send + Sync {
    /// Human readable name, used in logs and errors
    fn name(&self) -> &str;

    /// Every type of the source, in the source's order
    fn exported_types(&self) -> &[TypeDescriptor];

    /// Look up a type by id
    fn find(&self, type_id: TypeId) -> Option<&TypeDescriptor>;
}

/// Explicit, ordered catalog of type descriptors.
///
/// Holds each type at most once; inserting a type again replaces the
/// earlier descriptor in place.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    name: String,
    types: Vec<TypeDescriptor>,
    index: HashMap<TypeId, usize>,
}

impl TypeCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with_type(mut self, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.insert(descriptor);
        self
    }

    /// Insert a descriptor, returning the one it replaced
    pub fn insert(&mut self, descriptor: impl Into<TypeDescriptor>) -> Option<TypeDescriptor> {
        let descriptor = descriptor.into();
        let type_id = descriptor.id().type_id;

        match self.index.get(&type_id) {
            Some(&position) => {
                tracing::warn!(
                    catalog = %self.name,
                    type_name = descriptor.name(),
                    "type already catalogued, replacing its descriptor"
                );
                Some(std::mem::replace(&mut self.types[position], descriptor))
            }
            None => {
                self.index.insert(type_id, self.types.len());
                self.types.push(descriptor);
                None
            }
        }
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: ?Sized + 'static>(&self) -> Option<&TypeDescriptor> {
        self.find(TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }
}

impl TypeSource for TypeCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn exported_types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    fn find(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.index
            .get(&type_id)
            .and_then(|position| self.types.get(*position))
    }
}

impl<D: Into<TypeDescriptor>> Extend<D> for TypeCatalog {
    fn extend<I: IntoIterator<Item = D>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::descriptor::TypeKind;

    #[derive(Default)]
    struct Alpha;

    #[derive(Default)]
    struct Beta;

    struct Base;

    #[test]
    fn test_catalog_keeps_insertion_order() {
        let catalog = TypeCatalog::new("test")
            .with_type(TypeDescriptor::of_default::<Beta>())
            .with_type(TypeDescriptor::of_default::<Alpha>());

        assert_eq!(catalog.name(), "test");
        assert_eq!(catalog.len(), 2);
        let ids: Vec<_> = catalog.exported_types().iter().map(|t| *t.id()).collect();
        assert!(ids[0].is::<Beta>());
        assert!(ids[1].is::<Alpha>());
    }

    #[test]
    fn test_insert_replaces_existing_type() {
        let mut catalog = TypeCatalog::new("test");
        assert!(catalog.insert(TypeDescriptor::of_default::<Alpha>()).is_none());
        catalog.insert(TypeDescriptor::of_default::<Beta>());

        let replaced = catalog
            .insert(TypeDescriptor::of_default::<Alpha>().extends::<Base>())
            .unwrap();
        assert!(replaced.base().is_none());

        assert_eq!(catalog.len(), 2);
        assert!(catalog.exported_types()[0].id().is::<Alpha>());
        assert!(catalog.get::<Alpha>().unwrap().base().unwrap().is::<Base>());
    }

    #[test]
    fn test_find_and_extend() {
        let mut catalog = TypeCatalog::default();
        assert!(catalog.is_empty());

        catalog.extend(vec![
            TypeDescriptor::abstract_type::<Base>(),
            TypeDescriptor::abstract_type::<Base>(),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains::<Base>());
        assert!(!catalog.contains::<Alpha>());

        let found = catalog.find(TypeId::of::<Base>()).unwrap();
        assert_eq!(found.kind(), TypeKind::Abstract);
        assert_eq!(catalog.iter().count(), 1);
    }
}
