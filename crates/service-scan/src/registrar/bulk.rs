use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::catalog::descriptor::{Constructor, TypeDescriptor, UnwrapSelf, ViewCast};
use crate::catalog::{ContractDescriptor, TypeSource};
use crate::container::descriptor::{ServiceDescriptor, ServiceFactory, ServiceId};
use crate::container::{IntoServiceScope, IocContainer, ResolutionContext, ServiceIndex, ServiceScope};
use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    UnderContract,
    Separately,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::UnderContract => "under contract",
            Mode::Separately => "separately",
        }
    }
}

/// Register every eligible type of `source` under the contract's view.
///
/// All registrations share the contract key; resolve them together with
/// [`IocContainer::resolve_all`]. Nothing is registered unless the whole
/// scan succeeds.
pub fn register_all_under_contract<'c>(
    container: &'c mut IocContainer,
    contract: Option<&ContractDescriptor>,
    source: Option<&dyn TypeSource>,
    lifetime: impl IntoServiceScope,
) -> Result<&'c mut IocContainer, CoreError> {
    let (contract, source, lifetime) = validate(contract, source, lifetime)?;
    let plan = plan(contract, source, lifetime, Mode::UnderContract)?;
    commit(container, contract, source, lifetime, Mode::UnderContract, plan)
}

/// Register every eligible type of `source` under its own concrete type.
///
/// Each type also gets a transient forwarding registration under the
/// contract's view, so the contract collection yields the very instances
/// the concrete registrations hold.
pub fn register_all_separately<'c>(
    container: &'c mut IocContainer,
    contract: Option<&ContractDescriptor>,
    source: Option<&dyn TypeSource>,
    lifetime: impl IntoServiceScope,
) -> Result<&'c mut IocContainer, CoreError> {
    let (contract, source, lifetime) = validate(contract, source, lifetime)?;
    let plan = plan(contract, source, lifetime, Mode::Separately)?;
    commit(container, contract, source, lifetime, Mode::Separately, plan)
}

/// Register every eligible type under the contract's view, plus a
/// [`ServiceIndex`] keyed by `key_fn` with the same lifetime.
///
/// The index is built from the full collection of `V` when it is first
/// resolved; two instances with the same key fail with
/// [`CoreError::DuplicateKey`].
///
/// With a trait-object view, a closure wrapped in `Some` cannot have its
/// argument type inferred; name `V` and give the selector a `'static`
/// object bound, e.g. `Some((|s| s.name()) as fn(&(dyn Service + 'static)) -> String)`.
/// The `BulkRegistration::add_all_*_indexed` helpers take the closure
/// directly and need neither.
pub fn register_all_and_index<'c, V, K, F>(
    container: &'c mut IocContainer,
    contract: Option<&ContractDescriptor>,
    source: Option<&dyn TypeSource>,
    lifetime: impl IntoServiceScope,
    key_fn: Option<F>,
) -> Result<&'c mut IocContainer, CoreError>
where
    V: ?Sized + Send + Sync + 'static,
    K: Eq + Hash + Debug + Send + Sync + 'static,
    F: Fn(&V) -> K + Send + Sync + 'static,
{
    let (contract, source, lifetime) = validate(contract, source, lifetime)?;
    let key_fn = key_fn
        .ok_or_else(|| CoreError::invalid_argument("key_fn", "key selector cannot be absent"))?;
    if !contract.view().is::<V>() {
        return Err(CoreError::invalid_argument(
            "contract",
            format!(
                "contract {} is resolved as {}, not {}",
                contract,
                contract.view(),
                std::any::type_name::<V>()
            ),
        ));
    }

    let mut plan = plan(contract, source, lifetime, Mode::UnderContract)?;
    let contract_name = contract.to_string();
    plan.descriptors
        .push(ServiceDescriptor::from_factory::<ServiceIndex<K, V>, _>(
            ServiceId::of::<ServiceIndex<K, V>>(),
            lifetime,
            move |ctx| {
                let instances = ctx.resolve_all::<V>()?;
                ServiceIndex::try_from_instances(instances, &key_fn, &contract_name).map(Arc::new)
            },
        ));

    let container = commit(container, contract, source, lifetime, Mode::UnderContract, plan)?;
    tracing::debug!(
        contract = %contract,
        key = std::any::type_name::<K>(),
        lifetime = %lifetime,
        "keyed index registered"
    );
    Ok(container)
}

pub(crate) struct Plan {
    pub(crate) descriptors: Vec<ServiceDescriptor>,
    pub(crate) candidates: usize,
}

fn validate<'a>(
    contract: Option<&'a ContractDescriptor>,
    source: Option<&'a dyn TypeSource>,
    lifetime: impl IntoServiceScope,
) -> Result<(&'a ContractDescriptor, &'a dyn TypeSource, ServiceScope), CoreError> {
    let contract =
        contract.ok_or_else(|| CoreError::invalid_argument("contract", "base contract cannot be absent"))?;
    let source =
        source.ok_or_else(|| CoreError::invalid_argument("source", "type source cannot be absent"))?;
    let lifetime = lifetime.into_service_scope()?;
    Ok((contract, source, lifetime))
}

pub(crate) fn plan(
    contract: &ContractDescriptor,
    source: &dyn TypeSource,
    lifetime: ServiceScope,
    mode: Mode,
) -> Result<Plan, CoreError> {
    let mut plan = Plan {
        descriptors: Vec::new(),
        candidates: 0,
    };

    for candidate in source.exported_types() {
        if !contract.is_satisfied_by(candidate, source) {
            tracing::trace!(candidate = candidate.name(), contract = %contract, "skipped");
            continue;
        }

        let view = view_of(candidate, contract.view(), contract)?;
        let constructor = candidate.constructor().ok_or_else(|| {
            CoreError::InvalidServiceDescriptor {
                message: format!("{} has no constructor", candidate.name()),
            }
        })?;
        let implementation = *candidate.id();

        match mode {
            Mode::UnderContract => {
                plan.descriptors.push(ServiceDescriptor::erased(
                    *contract.view(),
                    implementation,
                    lifetime,
                    construct_as(constructor, view, implementation, *contract.view()),
                ));
            }
            Mode::Separately => {
                let own_view = view_of(candidate, &implementation, contract)?;
                let unwrap = candidate.unwrap_self().ok_or_else(|| {
                    CoreError::InvalidServiceDescriptor {
                        message: format!("{} cannot be forwarded", candidate.name()),
                    }
                })?;

                plan.descriptors.push(ServiceDescriptor::erased(
                    implementation,
                    implementation,
                    lifetime,
                    construct_as(constructor, own_view, implementation, implementation),
                ));
                // A contract resolved as the concrete type itself is already
                // served by the registration above.
                if *contract.view() != implementation {
                    plan.descriptors.push(ServiceDescriptor::erased(
                        *contract.view(),
                        implementation,
                        ServiceScope::Transient,
                        forward(implementation, unwrap, view, *contract.view()),
                    ));
                }
            }
        }

        plan.candidates += 1;
        tracing::debug!(
            candidate = candidate.name(),
            contract = %contract,
            lifetime = %lifetime,
            mode = mode.as_str(),
            "candidate registered"
        );
    }

    Ok(plan)
}

fn commit<'c>(
    container: &'c mut IocContainer,
    contract: &ContractDescriptor,
    source: &dyn TypeSource,
    lifetime: ServiceScope,
    mode: Mode,
    plan: Plan,
) -> Result<&'c mut IocContainer, CoreError> {
    container.add_descriptors(plan.descriptors)?;

    tracing::info!(
        contract = %contract,
        source = source.name(),
        lifetime = %lifetime,
        mode = mode.as_str(),
        registered = plan.candidates,
        "bulk registration complete"
    );
    Ok(container)
}

fn view_of(
    candidate: &TypeDescriptor,
    view: &ServiceId,
    contract: &ContractDescriptor,
) -> Result<ViewCast, CoreError> {
    candidate
        .view(view)
        .ok_or_else(|| CoreError::MissingContractView {
            implementation: candidate.name().to_string(),
            contract: format!("{} (resolved as {})", contract, view),
        })
}

fn cast_failed(implementation: &ServiceId, view: &ServiceId) -> CoreError {
    CoreError::InvalidServiceDescriptor {
        message: format!("instance of {} could not be cast to {}", implementation, view),
    }
}

fn construct_as(
    constructor: Constructor,
    view: ViewCast,
    implementation: ServiceId,
    view_id: ServiceId,
) -> ServiceFactory {
    Arc::new(move |ctx: &ResolutionContext<'_>| {
        let raw = constructor(ctx)?;
        view(raw).ok_or_else(|| cast_failed(&implementation, &view_id))
    })
}

fn forward(
    implementation: ServiceId,
    unwrap: UnwrapSelf,
    view: ViewCast,
    view_id: ServiceId,
) -> ServiceFactory {
    Arc::new(move |ctx: &ResolutionContext<'_>| {
        let concrete = ctx.resolve_registration(&implementation, &implementation)?;
        let raw = unwrap(&concrete).ok_or_else(|| cast_failed(&implementation, &implementation))?;
        view(raw).ok_or_else(|| cast_failed(&implementation, &view_id))
    })
}
