//! The instance creator: the public entry point for building arbitrary values.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::GeneratorSettings;
use crate::descriptor::{Arguments, Constructor, TypeDescriptor, TypeKind, Value, downcast_value};
use crate::error::{ArbitraterError, ArbitraterResult};
use crate::generator::{Generator, GeneratorRegistry};
use crate::primitives::default_registry;
use crate::reflect::Reflect;
use crate::rng::create_rng;
use crate::synthesizer::ValueSynthesizer;
use crate::universe::{TypeUniverse, global_universe};

type OverrideValue = Arc<dyn Fn() -> Value + Send + Sync>;

/// Fixed values for named canonical-constructor parameters of one target type
#[derive(Clone, Default)]
pub(crate) struct ParameterOverrides {
    values: HashMap<&'static str, OverrideValue>,
}

impl ParameterOverrides {
    fn insert(&mut self, parameter: &'static str, value: OverrideValue) {
        self.values.insert(parameter, value);
    }

    fn get(&self, parameter: &str) -> Option<Value> {
        self.values.get(parameter).map(|value| value())
    }
}

impl fmt::Debug for ParameterOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Builds arbitrary instances of `T`
///
/// Configuration methods return new creators and leave the receiver as it
/// was; only [`with_value`](Self::with_value) consumes the creator.
///
/// ```rust
/// use arbitrater::{InstanceCreator, Reflect};
///
/// #[derive(Debug, Reflect)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let point = InstanceCreator::<Point>::new()
///     .with_value("x", 5)
///     .unwrap()
///     .create_instance()
///     .unwrap();
/// assert_eq!(point.x, 5);
/// ```
pub struct InstanceCreator<T> {
    descriptor: TypeDescriptor,
    settings: GeneratorSettings,
    registry: GeneratorRegistry,
    universe: Arc<TypeUniverse>,
    overrides: ParameterOverrides,
    _target: PhantomData<fn() -> T>,
}

impl<T: Reflect> InstanceCreator<T> {
    /// A creator with default settings, the default generator table and the
    /// process-wide type universe
    pub fn new() -> Self {
        Self::from_settings(GeneratorSettings::default())
    }

    pub fn from_settings(settings: GeneratorSettings) -> Self {
        Self {
            descriptor: T::type_descriptor(),
            settings,
            registry: default_registry().clone(),
            universe: global_universe(),
            overrides: ParameterOverrides::default(),
            _target: PhantomData,
        }
    }

    /// A copy that emits `None` for nullable values when `enabled`
    pub fn generate_nulls(&self, enabled: bool) -> Self {
        self.with_settings(self.settings.with_generate_nulls(enabled))
    }

    /// A copy that leaves defaulted parameters to their defaults when `enabled`
    pub fn use_default_values(&self, enabled: bool) -> Self {
        self.with_settings(self.settings.with_use_default_values(enabled))
    }

    /// A copy whose instances are reproducible from `seed`
    pub fn with_seed(&self, seed: u64) -> Self {
        self.with_settings(self.settings.with_seed(Some(seed)))
    }

    pub fn with_settings(&self, settings: GeneratorSettings) -> Self {
        Self {
            settings,
            ..self.clone()
        }
    }

    /// A copy whose registry also maps `V` to `generator`
    pub fn with_generator<V: Any, G: Generator<V> + Send + Sync + 'static>(
        &self,
        generator: G,
    ) -> Self {
        Self {
            registry: self.registry.with_generator::<V, G>(generator),
            ..self.clone()
        }
    }

    /// A copy using `registry`, topped up with the default generators it lacks
    pub fn with_registry(&self, mut registry: GeneratorRegistry) -> Self {
        registry.extend_missing(default_registry());
        Self {
            registry,
            ..self.clone()
        }
    }

    /// A copy resolving abstract types through `universe`
    pub fn with_universe(&self, universe: Arc<TypeUniverse>) -> Self {
        Self {
            universe,
            ..self.clone()
        }
    }

    /// Use `value` for the canonical-constructor parameter `parameter_name`
    ///
    /// Fails with [`ArbitraterError::UnknownParameter`] when the target's
    /// canonical constructor has no such parameter, and with
    /// [`ArbitraterError::ArgumentMismatch`] when `V` is not the parameter's
    /// type. `Option` parameters take an `Option` value.
    pub fn with_value<V>(mut self, parameter_name: &str, value: V) -> ArbitraterResult<Self>
    where
        V: Any + Clone + Send + Sync,
    {
        let parameter = self
            .descriptor
            .canonical_constructor()
            .and_then(|constructor| constructor.find(parameter_name).copied())
            .ok_or_else(|| {
                ArbitraterError::unknown_parameter(parameter_name, self.descriptor.name())
            })?;

        let expected = parameter.type_descriptor();
        if expected.value_type_id() != TypeId::of::<V>() {
            return Err(ArbitraterError::argument_mismatch(
                parameter.name(),
                expected.value_type_name(),
            ));
        }

        self.overrides.insert(
            parameter.name(),
            Arc::new(move || -> Value { Box::new(value.clone()) }),
        );
        Ok(self)
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Create an arbitrary instance of `T`
    ///
    /// Any failure, however deep, is reported as
    /// [`ArbitraterError::InstanceCreation`] naming `T`, with the original
    /// error as its source.
    pub fn create_instance(&self) -> ArbitraterResult<T> {
        debug!(target_type = %self.descriptor, "creating instance");
        self.synthesize()
            .map_err(|source| ArbitraterError::instance_creation(self.descriptor.to_string(), source))
    }

    fn synthesize(&self) -> ArbitraterResult<T> {
        self.settings.validate()?;

        let mut rng = create_rng(self.settings.seed);
        let mut synthesizer =
            ValueSynthesizer::new(&self.registry, &self.universe, &self.settings, &mut rng);

        let value = if self.descriptor.kind().is_class() && !self.descriptor.is_nullable() {
            instantiate(&mut synthesizer, &self.descriptor, Some(&self.overrides))?
        } else {
            synthesizer.random_value(&self.descriptor)?
        };
        downcast_value(value, self.descriptor.name())
    }
}

impl<T: Reflect> Default for InstanceCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InstanceCreator<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            settings: self.settings.clone(),
            registry: self.registry.clone(),
            universe: Arc::clone(&self.universe),
            overrides: self.overrides.clone(),
            _target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for InstanceCreator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCreator")
            .field("target", &self.descriptor.name())
            .field("settings", &self.settings)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// Create an arbitrary `T` with default settings
pub fn arbitrary<T: Reflect>() -> ArbitraterResult<T> {
    InstanceCreator::<T>::new().create_instance()
}

/// Build an instance of a class-like type
///
/// Abstract and sealed types delegate to a concrete implementor, objects
/// return their instance and composites go through their canonical
/// constructor. `overrides` only ever applies to the requested type itself.
///
/// Only the concrete type counts towards `max_depth`; delegating from an
/// abstract type to its implementor is not a level of nesting.
pub(crate) fn instantiate(
    synthesizer: &mut ValueSynthesizer<'_>,
    ty: &TypeDescriptor,
    overrides: Option<&ParameterOverrides>,
) -> ArbitraterResult<Value> {
    if ty.kind().is_abstract() {
        return synthesizer.instantiate_implementor(ty);
    }

    synthesizer.enter(ty)?;
    let result = match ty.kind() {
        TypeKind::Object { instance } => Ok(instance()),
        TypeKind::Composite { constructor } => {
            construct(synthesizer, &constructor(), overrides)
        }
        _ => Err(ArbitraterError::unsupported_type(
            ty.name(),
            "no canonical constructor; register a generator for it or derive `Reflect`",
        )),
    };
    synthesizer.exit();
    result
}

fn construct(
    synthesizer: &mut ValueSynthesizer<'_>,
    constructor: &Constructor,
    overrides: Option<&ParameterOverrides>,
) -> ArbitraterResult<Value> {
    let mut arguments = Arguments::new();

    for parameter in constructor.parameters() {
        if parameter.has_default() && synthesizer.settings().use_default_values {
            trace!(parameter = parameter.name(), "leaving parameter to its default");
            continue;
        }
        if let Some(value) = overrides.and_then(|o| o.get(parameter.name())) {
            arguments.insert(parameter.name(), value);
            continue;
        }
        let value = synthesizer.random_value(&parameter.type_descriptor())?;
        arguments.insert(parameter.name(), value);
    }

    constructor.invoke(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Implementor, Parameter};

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Reflect for Point {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Point>(|| {
                Constructor::new(|arguments| {
                    Ok(Box::new(Point {
                        x: arguments.take("x")?,
                        y: arguments.take("y")?,
                    }))
                })
                .parameter(Parameter::new::<i32>("x"))
                .parameter(Parameter::new::<i32>("y"))
            })
        }
    }

    #[derive(Debug)]
    struct Counter {
        start: u64,
        step: u64,
    }

    impl Reflect for Counter {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Counter>(|| {
                Constructor::new(|arguments| {
                    Ok(Box::new(Counter {
                        start: arguments.take("start")?,
                        step: arguments.take_or_else("step", || 1)?,
                    }))
                })
                .parameter(Parameter::new::<u64>("start"))
                .parameter(Parameter::new::<u64>("step").with_default())
            })
        }
    }

    #[derive(Debug)]
    struct Handle;

    #[derive(Debug, Clone)]
    struct Labelled {
        label: Option<String>,
    }

    impl Reflect for Labelled {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Labelled>(|| {
                Constructor::new(|arguments| {
                    Ok(Box::new(Labelled {
                        label: arguments.take("label")?,
                    }))
                })
                .parameter(Parameter::new::<Option<String>>("label"))
            })
        }
    }

    #[derive(Debug)]
    enum Light {
        On { brightness: u8 },
        Off(bool),
    }

    impl Reflect for Light {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::hierarchy::<Light>(|| {
                vec![
                    Implementor::variant(
                        TypeDescriptor::composite::<Light>(|| {
                            Constructor::new(|arguments| {
                                Ok(Box::new(Light::On {
                                    brightness: arguments.take("brightness")?,
                                }))
                            })
                            .parameter(Parameter::new::<u8>("brightness"))
                        })
                        .named("Light::On"),
                    ),
                    Implementor::variant(
                        TypeDescriptor::composite::<Light>(|| {
                            Constructor::new(|arguments| Ok(Box::new(Light::Off(arguments.take("0")?))))
                                .parameter(Parameter::new::<bool>("0"))
                        })
                        .named("Light::Off"),
                    ),
                ]
            })
        }
    }

    #[derive(Debug)]
    struct Wrapper {
        point: Point,
    }

    impl Reflect for Wrapper {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::composite::<Wrapper>(|| {
                Constructor::new(|arguments| {
                    Ok(Box::new(Wrapper {
                        point: arguments.take("point")?,
                    }))
                })
                .parameter(Parameter::new::<Point>("point"))
            })
        }
    }

    impl Reflect for Handle {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::opaque::<Handle>()
        }
    }

    #[test]
    fn test_with_value_overrides_parameter() {
        let creator = InstanceCreator::<Point>::new().with_value("x", 5).unwrap();
        for _ in 0..20 {
            assert_eq!(creator.create_instance().unwrap().x, 5);
        }
    }

    #[test]
    fn test_with_value_unknown_parameter() {
        let error = InstanceCreator::<Point>::new()
            .with_value("z", 1)
            .err()
            .unwrap();
        assert_eq!(
            error,
            ArbitraterError::unknown_parameter("z", std::any::type_name::<Point>())
        );
    }

    #[test]
    fn test_with_value_wrong_type_is_rejected_up_front() {
        let error = InstanceCreator::<Point>::new()
            .with_value("x", "five".to_string())
            .unwrap_err();
        assert_eq!(error, ArbitraterError::argument_mismatch("x", "i32"));

        let error = InstanceCreator::<Counter>::new()
            .with_value("start", 5)
            .unwrap_err();
        assert_eq!(error, ArbitraterError::argument_mismatch("start", "u64"));
    }

    #[test]
    fn test_with_value_for_option_parameter_takes_option() {
        let creator = InstanceCreator::<Labelled>::new();
        assert!(matches!(
            creator.clone().with_value("label", "tag".to_string()),
            Err(ArbitraterError::ArgumentMismatch { .. })
        ));

        let labelled = creator
            .with_value("label", None::<String>)
            .unwrap()
            .create_instance()
            .unwrap();
        assert_eq!(labelled.label, None);
    }

    #[test]
    fn test_configuration_returns_new_creator() {
        let original = InstanceCreator::<Counter>::new();
        let modified = original.use_default_values(false).generate_nulls(true);

        assert!(original.settings().use_default_values);
        assert!(!original.settings().generate_nulls);
        assert!(!modified.settings().use_default_values);
        assert!(modified.settings().generate_nulls);
    }

    #[test]
    fn test_default_values_are_left_to_constructor() {
        let creator = InstanceCreator::<Counter>::new();
        for _ in 0..20 {
            assert_eq!(creator.create_instance().unwrap().step, 1);
        }

        let creator = creator.use_default_values(false);
        let steps: Vec<u64> = (0..20)
            .map(|_| creator.create_instance().unwrap().step)
            .collect();
        assert!(steps.iter().any(|&step| step != 1));
    }

    #[test]
    fn test_default_takes_precedence_over_override() {
        let creator = InstanceCreator::<Counter>::new()
            .with_value("step", 9u64)
            .unwrap();
        assert_eq!(creator.create_instance().unwrap().step, 1);

        let counter = creator
            .use_default_values(false)
            .create_instance()
            .unwrap();
        assert_eq!(counter.step, 9);
    }

    #[test]
    fn test_max_depth_counts_constructors_only() {
        let settings = GeneratorSettings::default().with_max_depth(Some(1));

        let light = InstanceCreator::<Light>::from_settings(settings.clone())
            .create_instance()
            .unwrap();
        assert!(matches!(light, Light::On { .. } | Light::Off(_)));

        let point = InstanceCreator::<Point>::from_settings(settings.clone());
        assert!(point.create_instance().is_ok());

        let error = InstanceCreator::<Wrapper>::from_settings(settings)
            .create_instance()
            .unwrap_err();
        assert_eq!(
            error.root_cause(),
            &ArbitraterError::recursion_limit(std::any::type_name::<Point>(), 1)
        );
    }

    #[test]
    fn test_opaque_type_is_unsupported() {
        let error = InstanceCreator::<Handle>::new().create_instance().unwrap_err();

        assert!(matches!(
            &error,
            ArbitraterError::InstanceCreation { type_name, .. } if type_name == std::any::type_name::<Handle>()
        ));
        assert!(matches!(
            error.root_cause(),
            ArbitraterError::UnsupportedType { .. }
        ));
    }

    #[test]
    fn test_generator_makes_opaque_type_supported() {
        let creator = InstanceCreator::<Handle>::new()
            .with_generator::<Handle, _>(|_: &mut dyn rand::RngCore| Handle);
        assert!(creator.create_instance().is_ok());
        assert!(!InstanceCreator::<Handle>::new().registry().contains::<Handle>());
    }

    #[test]
    fn test_registered_generator_reaches_nested_parameters() {
        let creator = InstanceCreator::<Point>::new()
            .with_generator::<i32, _>(|_: &mut dyn rand::RngCore| 3);
        assert_eq!(creator.create_instance().unwrap(), Point { x: 3, y: 3 });
    }

    #[test]
    fn test_seed_reproduces_instances() {
        let creator = InstanceCreator::<Point>::new().with_seed(1234);
        assert_eq!(
            creator.create_instance().unwrap(),
            creator.create_instance().unwrap()
        );
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let settings = GeneratorSettings::default().with_null_probability(-0.1);
        let error = InstanceCreator::<Point>::from_settings(settings)
            .create_instance()
            .unwrap_err();
        assert!(matches!(error.root_cause(), ArbitraterError::Config(_)));
    }

    #[test]
    fn test_top_level_non_class_types() {
        let values = InstanceCreator::<Vec<Point>>::new().create_instance().unwrap();
        assert_eq!(values.len(), 2);

        let value = arbitrary::<Option<Point>>().unwrap();
        assert!(value.is_some());
    }

    #[test]
    fn test_creator_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<InstanceCreator<Point>>();
    }

    #[test]
    fn test_with_value_requires_canonical_constructor() {
        let error = InstanceCreator::<Vec<u8>>::new()
            .with_value("len", 3usize)
            .unwrap_err();
        assert!(matches!(error, ArbitraterError::UnknownParameter { .. }));
    }
}
