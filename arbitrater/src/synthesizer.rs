//! Per-type value synthesis.
//!
//! [`ValueSynthesizer::random_value`] classifies a descriptor into a [`Shape`]
//! and runs the handler for that shape. Precedence is fixed: nulls first, then
//! registered generators, then containers, enums and hierarchies, tuples, and
//! finally anything with a constructor.

use rand::Rng;
use tracing::trace;

use crate::config::{ConfigError, GeneratorSettings};
use crate::creator;
use crate::descriptor::{
    CollectFn, CollectMapFn, CombineFn, Nullability, TypeDescriptor, TypeKind, Value,
};
use crate::error::{ArbitraterError, ArbitraterResult};
use crate::generator::{GeneratorRegistry, RegisteredGenerator};
use crate::locator::ConcreteTypeLocator;
use crate::picker;
use crate::universe::TypeUniverse;

/// What kind of rule produces a value for a descriptor
#[derive(Debug)]
pub enum Shape<'t> {
    Null(Nullability),
    Generated(RegisteredGenerator),
    Collection {
        element: &'t TypeDescriptor,
        collect: CollectFn,
    },
    Map {
        key: &'t TypeDescriptor,
        value: &'t TypeDescriptor,
        collect: CollectMapFn,
    },
    Enum,
    Hierarchy,
    Tuple {
        first: &'t TypeDescriptor,
        second: &'t TypeDescriptor,
        combine: CombineFn,
    },
    Composite,
    Unsupported(&'static str),
}

impl Shape<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Shape::Null(_) => "null",
            Shape::Generated(_) => "generated",
            Shape::Collection { .. } => "collection",
            Shape::Map { .. } => "map",
            Shape::Enum => "enum",
            Shape::Hierarchy => "hierarchy",
            Shape::Tuple { .. } => "tuple",
            Shape::Composite => "composite",
            Shape::Unsupported(_) => "unsupported",
        }
    }
}

/// State for one synthesis pass
///
/// Registry, universe and settings are shared read-only; the RNG and the
/// current nesting depth belong to this pass.
pub struct ValueSynthesizer<'a> {
    registry: &'a GeneratorRegistry,
    universe: &'a TypeUniverse,
    settings: &'a GeneratorSettings,
    rng: &'a mut dyn rand::RngCore,
    depth: usize,
}

impl<'a> ValueSynthesizer<'a> {
    pub fn new(
        registry: &'a GeneratorRegistry,
        universe: &'a TypeUniverse,
        settings: &'a GeneratorSettings,
        rng: &'a mut dyn rand::RngCore,
    ) -> Self {
        Self {
            registry,
            universe,
            settings,
            rng,
            depth: 0,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        self.settings
    }

    /// Decide which rule applies to `ty`
    ///
    /// Rolling for null consumes randomness, so this takes `&mut self`.
    /// An out-of-range `null_probability` is reported as a config error.
    pub fn classify<'t>(&mut self, ty: &'t TypeDescriptor) -> ArbitraterResult<Shape<'t>> {
        if let Some(nullability) = ty.nullability() {
            if self.settings.generate_nulls {
                let probability = self.settings.null_probability;
                if !(0.0..=1.0).contains(&probability) {
                    return Err(ConfigError::InvalidNullProbability(probability).into());
                }
                if self.rng.gen_bool(probability) {
                    return Ok(Shape::Null(nullability));
                }
            }
        }

        if let Some(generator) = self.registry.get(ty.id()) {
            return Ok(Shape::Generated(generator.clone()));
        }

        let shape = match ty.kind() {
            TypeKind::Sequence { collect } | TypeKind::Set { collect } => Shape::Collection {
                element: ty.argument(0)?,
                collect,
            },
            TypeKind::Map { collect } => Shape::Map {
                key: ty.argument(0)?,
                value: ty.argument(1)?,
                collect,
            },
            TypeKind::Enum { .. } => Shape::Enum,
            TypeKind::Hierarchy { .. } => Shape::Hierarchy,
            TypeKind::Tuple { combine } => Shape::Tuple {
                first: ty.argument(0)?,
                second: ty.argument(1)?,
                combine,
            },
            TypeKind::Composite { .. }
            | TypeKind::Object { .. }
            | TypeKind::Abstract { .. }
            | TypeKind::Opaque => Shape::Composite,
            TypeKind::Primitive => Shape::Unsupported("no generator registered for primitive type"),
        };
        Ok(shape)
    }

    /// Produce a random value of `ty`
    pub fn random_value(&mut self, ty: &TypeDescriptor) -> ArbitraterResult<Value> {
        let shape = self.classify(ty)?;
        trace!(type_name = %ty, shape = shape.label(), "synthesizing value");

        let value = match shape {
            Shape::Null(nullability) => return Ok(nullability.none()),
            Shape::Generated(generator) => generator.generate(&mut *self.rng),
            Shape::Collection { element, collect } => {
                let elements = (0..self.settings.collection_size)
                    .map(|_| self.random_value(element))
                    .collect::<ArbitraterResult<Vec<_>>>()?;
                collect(elements)?
            }
            Shape::Map {
                key,
                value,
                collect,
            } => {
                let pairs = (0..self.settings.map_size)
                    .map(|_| -> ArbitraterResult<(Value, Value)> {
                        Ok((self.random_value(key)?, self.random_value(value)?))
                    })
                    .collect::<ArbitraterResult<Vec<_>>>()?;
                collect(pairs)?
            }
            Shape::Enum => picker::pick_variant(ty, &mut *self.rng)?,
            Shape::Hierarchy => self.instantiate_implementor(&ty.non_nullable())?,
            Shape::Tuple {
                first,
                second,
                combine,
            } => {
                let first = self.random_value(first)?;
                let second = self.random_value(second)?;
                combine(first, second)?
            }
            Shape::Composite => creator::instantiate(self, &ty.non_nullable(), None)?,
            Shape::Unsupported(reason) => {
                return Err(ArbitraterError::unsupported_type(ty.to_string(), reason));
            }
        };

        match ty.nullability() {
            Some(nullability) => nullability.some(value),
            None => Ok(value),
        }
    }

    /// Build a random concrete implementor of an abstract or sealed type,
    /// seen as that type
    pub fn instantiate_implementor(&mut self, ty: &TypeDescriptor) -> ArbitraterResult<Value> {
        let implementor = ConcreteTypeLocator::new(self.universe).locate(ty, &mut *self.rng)?;
        let concrete = creator::instantiate(self, implementor.descriptor(), None)?;
        implementor.upcast(concrete)
    }

    /// Record one more level of constructor nesting
    pub(crate) fn enter(&mut self, ty: &TypeDescriptor) -> ArbitraterResult<()> {
        if let Some(max_depth) = self.settings.max_depth {
            if self.depth >= max_depth {
                return Err(ArbitraterError::recursion_limit(ty.name(), max_depth));
            }
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
