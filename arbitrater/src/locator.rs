//! Finds a concrete implementor for abstract and sealed types.

use tracing::debug;

use crate::descriptor::{Implementor, TypeDescriptor, TypeKind};
use crate::error::{ArbitraterError, ArbitraterResult};
use crate::picker::choose;
use crate::universe::TypeUniverse;

/// Enumerates and selects concrete implementors of a type
#[derive(Debug, Clone, Copy)]
pub struct ConcreteTypeLocator<'a> {
    universe: &'a TypeUniverse,
}

impl<'a> ConcreteTypeLocator<'a> {
    pub fn new(universe: &'a TypeUniverse) -> Self {
        Self { universe }
    }

    /// Every concrete candidate for `descriptor`
    ///
    /// Interfaces resolve to their implementors, abstract classes to their
    /// subclasses and sealed hierarchies to their declared variants plus any
    /// registered subclasses.
    pub fn candidates(&self, descriptor: &TypeDescriptor) -> ArbitraterResult<Vec<Implementor>> {
        let id = descriptor.id();
        match descriptor.kind() {
            TypeKind::Abstract { interface: true } => Ok(self.universe.implementors_of(id)),
            TypeKind::Abstract { interface: false } => Ok(self.universe.subclasses_of(id)),
            TypeKind::Hierarchy { variants } => {
                let mut candidates = variants();
                candidates.extend(self.universe.subclasses_of(id));
                Ok(candidates)
            }
            other => Err(ArbitraterError::unsupported_type(
                descriptor.name(),
                format!("{} type has no implementors", other.label()),
            )),
        }
    }

    /// Select one candidate uniformly at random
    pub fn locate(
        &self,
        descriptor: &TypeDescriptor,
        rng: &mut dyn rand::RngCore,
    ) -> ArbitraterResult<Implementor> {
        let candidates = self.candidates(descriptor)?;
        let count = candidates.len();
        let chosen = choose(candidates, rng)
            .ok_or_else(|| ArbitraterError::empty_candidate_set(descriptor.name()))?;
        debug!(
            abstract_type = descriptor.name(),
            concrete_type = chosen.descriptor().name(),
            candidates = count,
            "selected implementor"
        );
        Ok(chosen)
    }
}
