//! Uniform selection of enum variants and candidates.

use rand::Rng;

use crate::descriptor::{TypeDescriptor, TypeKind, Value};
use crate::error::{ArbitraterError, ArbitraterResult};

/// Remove and return one element chosen uniformly at random
pub fn choose<T>(mut candidates: Vec<T>, rng: &mut dyn rand::RngCore) -> Option<T> {
    if candidates.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    Some(candidates.swap_remove(index))
}

/// Pick one declared variant of an enum type
pub fn pick_variant(
    descriptor: &TypeDescriptor,
    rng: &mut dyn rand::RngCore,
) -> ArbitraterResult<Value> {
    let TypeKind::Enum { variants } = descriptor.kind() else {
        return Err(ArbitraterError::unsupported_type(
            descriptor.name(),
            "not an enum",
        ));
    };
    choose(variants(), rng).ok_or_else(|| ArbitraterError::empty_candidate_set(descriptor.name()))
}
