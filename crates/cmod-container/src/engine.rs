//! Two-phase construction of a batch of types.
//!
//! Phase 1 ([`ConstructionEngine::validate`]) checks a whole batch before
//! anything is built: every type exists and has a usable constructor, every
//! declared capability exists, is implemented and is still free, and every
//! constructor parameter can be satisfied by a peer in the batch or by the
//! session. Only a parameter nothing is bound to yet is "unresolved"; an
//! ambiguous or multi-valued parameter fails the batch outright.
//!
//! Phase 2 builds the batch in rounds, each round constructing the types
//! whose arguments are all live. A round without progress is a deadlock. Any failure in phase 2 removes every instance the batch has
//! registered so far.

use crate::error::{ContainerError, ContainerResult};
use crate::instance::Instance;
use crate::session::Session;
use crate::type_def::{Constructor, TypeDef};
use cmod_runtime::TypeDescriptor;
use std::collections::HashSet;
use tracing::{debug, info};

/// One validated descriptor.
#[derive(Debug, Clone)]
pub struct PlannedType {
    pub descriptor: TypeDescriptor,
    pub def: TypeDef,
    pub constructor: Constructor,
}

/// A batch that passed phase 1.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    steps: Vec<PlannedType>,
}

impl Plan {
    pub fn steps(&self) -> &[PlannedType] {
        &self.steps
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.def.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builds instances from type descriptors.
pub struct ConstructionEngine;

impl ConstructionEngine {
    /// Phase 1: check `batch` without constructing anything.
    pub fn validate(session: &Session<'_>, batch: &[TypeDescriptor]) -> ContainerResult<Plan> {
        let catalog = session.registry().catalog();
        let mut claimed = HashSet::new();
        let mut steps = Vec::with_capacity(batch.len());

        for descriptor in batch {
            let def = catalog
                .type_def(&descriptor.type_name)
                .ok_or_else(|| ContainerError::TypeNotFound(descriptor.type_name.clone()))?;
            let constructor = def.constructor()?.clone();

            if let Some(capability) = &descriptor.capability {
                let cap_def = catalog
                    .capability(capability)
                    .ok_or_else(|| ContainerError::CapabilityNotFound(capability.clone()))?;

                if !def.implements(capability) {
                    return Err(ContainerError::CapabilityNotImplemented {
                        type_name: def.name().to_string(),
                        capability: capability.clone(),
                    });
                }

                if cap_def.is_exclusive()
                    && (session.registry().is_bound(capability)
                        || !claimed.insert(capability.as_str()))
                {
                    return Err(ContainerError::CapabilityAlreadyBound {
                        capability: capability.clone(),
                        type_name: def.name().to_string(),
                    });
                }
            }

            steps.push(PlannedType {
                descriptor: descriptor.clone(),
                def: def.clone(),
                constructor,
            });
        }

        let mut unresolved: Vec<String> = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            for param in step.constructor.params() {
                let by_peer = batch
                    .iter()
                    .enumerate()
                    .any(|(other, d)| other != index && d.provides(param));

                if by_peer {
                    continue;
                }
                match session.find_single(param) {
                    Ok(_) => {}
                    Err(ContainerError::NotResolved(_)) => {
                        if !unresolved.contains(param) {
                            unresolved.push(param.clone());
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if !unresolved.is_empty() {
            debug!("Batch has unresolved dependencies: {:?}", unresolved);
            return Err(ContainerError::UnresolvedDependency(unresolved));
        }

        Ok(Plan { steps })
    }

    /// Phase 2: construct and register every type of `plan`.
    ///
    /// On error the registry is restored to its state before the call.
    pub fn construct(session: &mut Session<'_>, plan: Plan) -> ContainerResult<Vec<Instance>> {
        let checkpoint = session.registry().checkpoint();

        match Self::construct_rounds(session, plan) {
            Ok(instances) => Ok(instances),
            Err(e) => {
                session.registry_mut().rollback(checkpoint);
                Err(e)
            }
        }
    }

    /// Validate and construct `batch`.
    pub fn resolve(
        session: &mut Session<'_>,
        batch: &[TypeDescriptor],
    ) -> ContainerResult<Vec<Instance>> {
        let plan = Self::validate(session, batch)?;
        let instances = Self::construct(session, plan)?;
        info!("Resolved {} type(s)", instances.len());
        Ok(instances)
    }

    /// Validate and construct a single type.
    pub fn resolve_type(
        session: &mut Session<'_>,
        type_name: &str,
        capability: Option<&str>,
    ) -> ContainerResult<Instance> {
        let descriptor = TypeDescriptor::new(type_name, capability.map(str::to_string));
        let mut instances = Self::resolve(session, &[descriptor])?;
        instances
            .pop()
            .ok_or_else(|| ContainerError::NotResolved(type_name.to_string()))
    }

    fn construct_rounds(
        session: &mut Session<'_>,
        plan: Plan,
    ) -> ContainerResult<Vec<Instance>> {
        let mut pending = plan.steps;
        let mut built = Vec::with_capacity(pending.len());
        let mut round = 0;

        while !pending.is_empty() {
            round += 1;
            let before = pending.len();
            let mut waiting = Vec::new();

            for step in pending {
                let Some(values) = Self::live_arguments(session, &step)? else {
                    waiting.push(step);
                    continue;
                };

                let type_name = step.def.name();
                let instance = step.constructor.invoke(type_name, values).map_err(|source| {
                    ContainerError::ConstructionFailed {
                        type_name: type_name.to_string(),
                        source,
                    }
                })?;

                debug!("Constructed {} (round {})", type_name, round);
                session.registry_mut().add_resolved(instance.clone())?;
                built.push(instance);
            }

            if waiting.len() == before {
                let stuck = waiting.iter().map(|s| s.def.name().to_string()).collect();
                return Err(ContainerError::ConstructionDeadlock(stuck));
            }
            pending = waiting;
        }

        Ok(built)
    }

    /// Arguments from live instances only; `None` if one is not live yet.
    fn live_arguments(
        session: &Session<'_>,
        step: &PlannedType,
    ) -> ContainerResult<Option<Vec<Instance>>> {
        let mut values = Vec::with_capacity(step.constructor.params().len());

        for param in step.constructor.params() {
            match session.find_single(param) {
                Ok(instance) => values.push(instance),
                Err(ContainerError::NotResolved(_)) => return Ok(None),
                Err(e) => return Err(e),
            }
        }

        Ok(Some(values))
    }
}
