use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::descriptor::{ErasedInstance, ServiceId};
use crate::container::ioc_container::ResolutionContext;
use crate::errors::CoreError;

/// What a catalogued type is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Instantiable type, eligible for registration
    Concrete,
    /// Base type that cannot be instantiated on its own
    Abstract,
    /// Interface (a trait, usually seen as `dyn Trait`)
    Interface,
}

/// A bare instance as produced by a constructor: the concrete value is `T`.
pub type RawInstance = Arc<dyn Any + Send + Sync>;

pub(crate) type Constructor =
    Arc<dyn Fn(&ResolutionContext<'_>) -> Result<RawInstance, CoreError> + Send + Sync>;

/// Turns a raw instance into an erased `Arc<V>` for one view type `V`
pub(crate) type ViewCast = Arc<dyn Fn(RawInstance) -> Option<ErasedInstance> + Send + Sync>;

/// Recovers a raw instance from an erased `Arc<T>` of the type itself
pub(crate) type UnwrapSelf = fn(&ErasedInstance) -> Option<RawInstance>;

/// Description of a type: identity, kind, ancestry, and how to build it.
///
/// Casts to trait objects cannot be discovered at runtime, so each view a
/// concrete type can be resolved as is declared on the descriptor.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: ServiceId,
    kind: TypeKind,
    base: Option<ServiceId>,
    interfaces: Vec<ServiceId>,
    views: HashMap<TypeId, ViewCast>,
    constructor: Option<Constructor>,
    unwrap_self: Option<UnwrapSelf>,
}

impl TypeDescriptor {
    /// Describe a concrete type built by `constructor`
    pub fn concrete<T, F>(constructor: F) -> TypeBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move |ctx: &ResolutionContext<'_>| {
                constructor(ctx).map(|value| Arc::new(value) as RawInstance)
            });

        let mut descriptor = Self::bare::<T>(TypeKind::Concrete);
        descriptor.constructor = Some(constructor);
        descriptor.unwrap_self = Some(unwrap_self::<T>);
        descriptor.views.insert(TypeId::of::<T>(), view_cast::<T, T>(|this| this));

        TypeBuilder::new(descriptor)
    }

    /// Describe a concrete type built with `Default`
    pub fn of_default<T>() -> TypeBuilder<T>
    where
        T: Default + Send + Sync + 'static,
    {
        Self::concrete::<T, _>(|_| Ok(T::default()))
    }

    /// Describe a base type that is never instantiated
    pub fn abstract_type<T: ?Sized + 'static>() -> TypeBuilder<T> {
        TypeBuilder::new(Self::bare::<T>(TypeKind::Abstract))
    }

    /// Describe an interface
    pub fn interface<V: ?Sized + 'static>() -> TypeBuilder<V> {
        TypeBuilder::new(Self::bare::<V>(TypeKind::Interface))
    }

    fn bare<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self {
            id: ServiceId::of::<T>(),
            kind,
            base: None,
            interfaces: Vec::new(),
            views: HashMap::new(),
            constructor: None,
            unwrap_self: None,
        }
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.type_name()
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }

    /// Direct base type, if any
    pub fn base(&self) -> Option<&ServiceId> {
        self.base.as_ref()
    }

    /// Interfaces implemented directly, or extended when this is an interface
    pub fn interfaces(&self) -> &[ServiceId] {
        &self.interfaces
    }

    /// Check if instances can be resolved as `V`
    pub fn has_view<V: ?Sized + 'static>(&self) -> bool {
        self.views.contains_key(&TypeId::of::<V>())
    }

    pub(crate) fn view(&self, view: &ServiceId) -> Option<ViewCast> {
        self.views.get(&view.type_id).cloned()
    }

    pub(crate) fn constructor(&self) -> Option<Constructor> {
        self.constructor.clone()
    }

    pub(crate) fn unwrap_self(&self) -> Option<UnwrapSelf> {
        self.unwrap_self
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("base", &self.base)
            .field("interfaces", &self.interfaces)
            .field("views", &self.views.len())
            .finish()
    }
}

/// Fluent builder for [`TypeDescriptor`]
pub struct TypeBuilder<T: ?Sized> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + 'static> TypeBuilder<T> {
    fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            _marker: PhantomData,
        }
    }

    /// Set the base type
    pub fn extends<B: ?Sized + 'static>(mut self) -> Self {
        self.descriptor.base = Some(ServiceId::of::<B>());
        self
    }

    /// Record an implemented interface without a view, as abstract types do
    pub fn declares<V: ?Sized + 'static>(mut self) -> Self {
        self.push_interface(ServiceId::of::<V>());
        self
    }

    /// Record an interface this interface extends
    pub fn extends_interface<W: ?Sized + 'static>(mut self) -> Self {
        debug_assert_eq!(self.descriptor.kind, TypeKind::Interface);
        self.push_interface(ServiceId::of::<W>());
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }

    fn push_interface(&mut self, interface: ServiceId) {
        if !self.descriptor.interfaces.contains(&interface) {
            self.descriptor.interfaces.push(interface);
        }
    }
}

impl<T: Send + Sync + 'static> TypeBuilder<T> {
    /// Implement interface `V` directly, resolvable through `cast`
    pub fn implements<V>(mut self, cast: fn(Arc<T>) -> Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.push_interface(ServiceId::of::<V>());
        self.descriptor
            .views
            .insert(TypeId::of::<V>(), view_cast::<T, V>(cast));
        self
    }

    /// Provide a view for a contract reached through an ancestor
    pub fn inherits<V>(mut self, cast: fn(Arc<T>) -> Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.descriptor
            .views
            .insert(TypeId::of::<V>(), view_cast::<T, V>(cast));
        self
    }
}

impl<T: ?Sized + 'static> From<TypeBuilder<T>> for TypeDescriptor {
    fn from(builder: TypeBuilder<T>) -> Self {
        builder.build()
    }
}

fn view_cast<T, V>(cast: fn(Arc<T>) -> Arc<V>) -> ViewCast
where
    T: Send + Sync + 'static,
    V: ?Sized + Send + Sync + 'static,
{
    Arc::new(move |raw: RawInstance| {
        raw.downcast::<T>()
            .ok()
            .map(|this| Arc::new(cast(this)) as ErasedInstance)
    })
}

fn unwrap_self<T: Send + Sync + 'static>(instance: &ErasedInstance) -> Option<RawInstance> {
    instance
        .downcast_ref::<Arc<T>>()
        .map(|this| this.clone() as RawInstance)
}
