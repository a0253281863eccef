//! The type universe: which concrete types implement which abstract types.
//!
//! Rust has no classpath to scan, so the index is populated by explicit
//! registration once at startup and is read-only afterwards.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use crate::config::ConfigError;
use crate::descriptor::{Implementor, TypeKind};
use crate::reflect::Reflect;

/// Read-only index from abstract type to its registered implementors
#[derive(Clone, Default, Debug)]
pub struct TypeUniverse {
    implementors: HashMap<TypeId, Vec<Implementor>>,
    subclasses: HashMap<TypeId, Vec<Implementor>>,
}

impl TypeUniverse {
    pub fn builder() -> TypeUniverseBuilder {
        TypeUniverseBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Concrete types implementing the interface `base`, directly or through
    /// intermediate abstract types
    pub fn implementors_of(&self, base: TypeId) -> Vec<Implementor> {
        self.closure(base, &[&self.implementors, &self.subclasses])
    }

    /// Concrete direct and indirect subclasses of the abstract class `base`
    pub fn subclasses_of(&self, base: TypeId) -> Vec<Implementor> {
        self.closure(base, &[&self.subclasses])
    }

    /// Number of registered edges
    pub fn len(&self) -> usize {
        self.implementors.values().map(Vec::len).sum::<usize>()
            + self.subclasses.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk registered edges from `base`, composing upcasts along the way.
    /// Abstract intermediates are expanded rather than returned.
    fn closure(&self, base: TypeId, edges: &[&HashMap<TypeId, Vec<Implementor>>]) -> Vec<Implementor> {
        let mut found = Vec::new();
        let mut visited = HashSet::from([base]);
        let mut pending: Vec<Implementor> = edges
            .iter()
            .filter_map(|map| map.get(&base))
            .flatten()
            .cloned()
            .collect();

        while let Some(candidate) = pending.pop() {
            let id = candidate.descriptor().id();
            if !visited.insert(id) {
                continue;
            }
            if matches!(candidate.descriptor().kind(), TypeKind::Abstract { .. }) {
                let outer = candidate.upcast_fn();
                pending.extend(
                    edges
                        .iter()
                        .filter_map(|map| map.get(&id))
                        .flatten()
                        .map(|nested| nested.then(Arc::clone(&outer))),
                );
            } else {
                found.push(candidate);
            }
        }

        found
    }
}

/// Collects registrations before freezing them into a [`TypeUniverse`]
#[derive(Default)]
pub struct TypeUniverseBuilder {
    universe: TypeUniverse,
}

impl TypeUniverseBuilder {
    /// Register `C` as an implementor of the interface `Base`
    pub fn implementor<Base: Any, C: Reflect>(self, upcast: fn(C) -> Base) -> Self {
        self.implementor_of(TypeId::of::<Base>(), Implementor::of(upcast))
    }

    /// Register `C` as a subclass of the abstract class `Base`
    pub fn subclass<Base: Any, C: Reflect>(self, upcast: fn(C) -> Base) -> Self {
        self.subclass_of(TypeId::of::<Base>(), Implementor::of(upcast))
    }

    pub fn implementor_of(mut self, base: TypeId, implementor: Implementor) -> Self {
        self.universe
            .implementors
            .entry(base)
            .or_default()
            .push(implementor);
        self
    }

    pub fn subclass_of(mut self, base: TypeId, implementor: Implementor) -> Self {
        self.universe
            .subclasses
            .entry(base)
            .or_default()
            .push(implementor);
        self
    }

    pub fn build(self) -> TypeUniverse {
        self.universe
    }
}

static GLOBAL_UNIVERSE: OnceLock<Arc<TypeUniverse>> = OnceLock::new();

/// Install the process-wide type universe; only the first call succeeds
pub fn install_universe(universe: TypeUniverse) -> Result<(), ConfigError> {
    GLOBAL_UNIVERSE
        .set(Arc::new(universe))
        .map_err(|_| ConfigError::UniverseAlreadyInstalled)
}

/// The process-wide type universe, empty if none was installed
pub fn global_universe() -> Arc<TypeUniverse> {
    Arc::clone(GLOBAL_UNIVERSE.get_or_init(|| Arc::new(TypeUniverse::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Constructor, TypeDescriptor, downcast_value};

    trait Animal {
        fn sound(&self) -> &'static str;
    }

    trait Pet: Animal {}

    struct Dog;
    struct Cat;

    impl Animal for Dog {
        fn sound(&self) -> &'static str {
            "woof"
        }
    }

    impl Animal for Cat {
        fn sound(&self) -> &'static str {
            "meow"
        }
    }

    impl Pet for Cat {}

    impl Reflect for Dog {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Dog>(|| Constructor::new(|_| Ok(Box::new(Dog))))
        }
    }

    impl Reflect for Cat {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Cat>(|| Constructor::new(|_| Ok(Box::new(Cat))))
        }
    }

    impl Reflect for Box<dyn Pet> {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::interface::<Self>()
        }
    }

    impl Reflect for Box<dyn Animal> {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::interface::<Self>()
        }
    }

    fn pet_as_animal(pet: Box<dyn Pet>) -> Box<dyn Animal> {
        struct PetAnimal(Box<dyn Pet>);
        impl Animal for PetAnimal {
            fn sound(&self) -> &'static str {
                self.0.sound()
            }
        }
        Box::new(PetAnimal(pet))
    }

    fn universe() -> TypeUniverse {
        TypeUniverse::builder()
            .implementor::<Box<dyn Animal>, Dog>(|dog| Box::new(dog))
            .implementor::<Box<dyn Animal>, Box<dyn Pet>>(pet_as_animal)
            .implementor::<Box<dyn Pet>, Cat>(|cat| Box::new(cat))
            .build()
    }

    #[test]
    fn test_implementors_expand_intermediate_interfaces() {
        let universe = universe();
        let candidates = universe.implementors_of(TypeId::of::<Box<dyn Animal>>());

        let mut sounds: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                let concrete: Box<dyn std::any::Any> = if candidate.descriptor().id() == TypeId::of::<Dog>() {
                    Box::new(Dog)
                } else {
                    Box::new(Cat)
                };
                let animal = candidate.upcast(concrete).unwrap();
                downcast_value::<Box<dyn Animal>>(animal, "animal").unwrap().sound()
            })
            .collect();
        sounds.sort();

        assert_eq!(sounds, vec!["meow", "woof"]);
    }

    #[test]
    fn test_subclasses_ignore_interface_edges() {
        let universe = universe();
        assert!(universe.subclasses_of(TypeId::of::<Box<dyn Animal>>()).is_empty());
        assert_eq!(universe.len(), 3);
    }

    trait Machine {
        fn fuel(&self) -> &'static str;
    }

    trait Engine: Machine {}

    struct Diesel;

    impl Machine for Diesel {
        fn fuel(&self) -> &'static str {
            "diesel"
        }
    }

    impl Engine for Diesel {}

    impl Reflect for Diesel {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Diesel>(|| Constructor::new(|_| Ok(Box::new(Diesel))))
        }
    }

    impl Reflect for Box<dyn Machine> {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::abstract_class::<Self>()
        }
    }

    impl Reflect for Box<dyn Engine> {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::abstract_class::<Self>()
        }
    }

    fn engine_as_machine(engine: Box<dyn Engine>) -> Box<dyn Machine> {
        struct EngineMachine(Box<dyn Engine>);
        impl Machine for EngineMachine {
            fn fuel(&self) -> &'static str {
                self.0.fuel()
            }
        }
        Box::new(EngineMachine(engine))
    }

    #[test]
    fn test_subclasses_expand_abstract_intermediates() {
        let universe = TypeUniverse::builder()
            .subclass::<Box<dyn Machine>, Box<dyn Engine>>(engine_as_machine)
            .subclass::<Box<dyn Engine>, Diesel>(|diesel| Box::new(diesel))
            .build();

        let candidates = universe.subclasses_of(TypeId::of::<Box<dyn Machine>>());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].descriptor().id(), TypeId::of::<Diesel>());

        let machine = candidates[0].upcast(Box::new(Diesel)).unwrap();
        let machine = downcast_value::<Box<dyn Machine>>(machine, "machine").unwrap();
        assert_eq!(machine.fuel(), "diesel");

        // The intermediate is expanded, never offered itself
        assert_eq!(
            universe.subclasses_of(TypeId::of::<Box<dyn Engine>>()).len(),
            1
        );
    }

    #[test]
    fn test_unknown_base_has_no_candidates() {
        let universe = TypeUniverse::empty();
        assert!(universe.is_empty());
        assert!(universe.implementors_of(TypeId::of::<Dog>()).is_empty());
    }
}
