//! Generator trait and the copy-on-write generator registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::Value;

/// Produces random values of `T`
pub trait Generator<T> {
    /// Generate a random value of type T using the provided RNG
    fn generate(&self, rng: &mut dyn rand::RngCore) -> T;
}

impl<T, F> Generator<T> for F
where
    F: Fn(&mut dyn rand::RngCore) -> T,
{
    fn generate(&self, rng: &mut dyn rand::RngCore) -> T {
        self(rng)
    }
}

type ErasedGenerate = dyn Fn(&mut dyn rand::RngCore) -> Value + Send + Sync;

/// A generator stored in the registry with its output type erased
#[derive(Clone)]
pub struct RegisteredGenerator {
    type_name: &'static str,
    generate: Arc<ErasedGenerate>,
}

impl RegisteredGenerator {
    fn new<T: Any, G: Generator<T> + Send + Sync + 'static>(generator: G) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            generate: Arc::new(move |rng: &mut dyn rand::RngCore| -> Value {
                Box::new(generator.generate(rng))
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn generate(&self, rng: &mut dyn rand::RngCore) -> Value {
        (self.generate)(rng)
    }
}

impl fmt::Debug for RegisteredGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredGenerator")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Mapping from exact (non-nullable) type to generator
///
/// Cloning is cheap: the table is shared until one of the clones registers a
/// generator, at which point that clone gets its own copy.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Arc<HashMap<TypeId, RegisteredGenerator>>,
}

impl GeneratorRegistry {
    /// Create a new empty generator registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator for a specific type
    pub fn register<T: Any, G: Generator<T> + Send + Sync + 'static>(&mut self, generator: G) {
        Arc::make_mut(&mut self.generators)
            .insert(TypeId::of::<T>(), RegisteredGenerator::new(generator));
    }

    /// A copy of this registry with one more generator; `self` is left untouched
    pub fn with_generator<T: Any, G: Generator<T> + Send + Sync + 'static>(
        &self,
        generator: G,
    ) -> Self {
        let mut extended = self.clone();
        extended.register::<T, G>(generator);
        extended
    }

    /// Copy in every generator from `other` whose type is not registered here
    pub fn extend_missing(&mut self, other: &GeneratorRegistry) {
        let missing: Vec<_> = other
            .generators
            .iter()
            .filter(|(id, _)| !self.generators.contains_key(id))
            .map(|(id, generator)| (*id, generator.clone()))
            .collect();
        if missing.is_empty() {
            return;
        }
        Arc::make_mut(&mut self.generators).extend(missing);
    }

    /// Look up the generator for a type
    pub fn get(&self, type_id: TypeId) -> Option<&RegisteredGenerator> {
        self.generators.get(&type_id)
    }

    /// Check if a generator is registered for a specific type
    pub fn contains<T: Any>(&self) -> bool {
        self.generators.contains_key(&TypeId::of::<T>())
    }

    /// Remove a generator for a specific type
    pub fn remove<T: Any>(&mut self) -> bool {
        if !self.contains::<T>() {
            return false;
        }
        Arc::make_mut(&mut self.generators)
            .remove(&TypeId::of::<T>())
            .is_some()
    }

    /// Get the number of registered generators
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.generators.values().map(|g| g.type_name))
            .finish()
    }
}
