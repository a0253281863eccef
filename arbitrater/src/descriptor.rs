//! Type descriptors: the runtime view of a type that synthesis dispatches on.
//!
//! A [`TypeDescriptor`] records a type's identity, whether it is nullable
//! (`Option<T>`), its generic arguments and its [`TypeKind`]. Composite types
//! carry their canonical [`Constructor`] lazily so that self-referential types
//! can still be described.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ArbitraterError, ArbitraterResult};
use crate::reflect::Reflect;

/// A type-erased synthesized value
pub type Value = Box<dyn Any>;

/// Builds a sequence or set from synthesized elements
pub type CollectFn = fn(Vec<Value>) -> ArbitraterResult<Value>;
/// Builds a map from synthesized key/value pairs
pub type CollectMapFn = fn(Vec<(Value, Value)>) -> ArbitraterResult<Value>;
/// Combines two synthesized values into a pair
pub type CombineFn = fn(Value, Value) -> ArbitraterResult<Value>;
/// Lists every variant of a fieldless enum
pub type VariantsFn = fn() -> Vec<Value>;
/// Lists the concrete members of a closed hierarchy
pub type HierarchyFn = fn() -> Vec<Implementor>;
/// Produces the single instance of an object type
pub type InstanceFn = fn() -> Value;
/// Resolves a composite type's canonical constructor
pub type ConstructorFn = fn() -> Constructor;
/// Invokes a canonical constructor with resolved arguments
pub type BuildFn = fn(&mut Arguments) -> ArbitraterResult<Value>;
/// Describes a parameter's type on demand
pub type DescribeFn = fn() -> TypeDescriptor;
/// Converts a concrete implementor's value into its abstract type
pub type Upcast = Arc<dyn Fn(Value) -> ArbitraterResult<Value> + Send + Sync>;

/// Classification of a type's shape
#[derive(Debug, Clone, Copy)]
pub enum TypeKind {
    /// Only synthesizable through a registered generator
    Primitive,
    /// Ordered sequence with one type argument
    Sequence { collect: CollectFn },
    /// Set with one type argument; duplicates collapse
    Set { collect: CollectFn },
    /// Key/value map with two type arguments
    Map { collect: CollectMapFn },
    /// Fieldless enum
    Enum { variants: VariantsFn },
    /// Closed hierarchy (sum type) whose members are statically known
    Hierarchy { variants: HierarchyFn },
    /// Open abstract type resolved through the type universe
    Abstract { interface: bool },
    /// Two-element tuple
    Tuple { combine: CombineFn },
    /// Singleton type
    Object { instance: InstanceFn },
    /// Concrete type with a canonical constructor
    Composite { constructor: ConstructorFn },
    /// Known type with no canonical constructor
    Opaque,
}

impl TypeKind {
    /// Short label for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Primitive => "primitive",
            TypeKind::Sequence { .. } => "sequence",
            TypeKind::Set { .. } => "set",
            TypeKind::Map { .. } => "map",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Hierarchy { .. } => "hierarchy",
            TypeKind::Abstract { .. } => "abstract",
            TypeKind::Tuple { .. } => "tuple",
            TypeKind::Object { .. } => "object",
            TypeKind::Composite { .. } => "composite",
            TypeKind::Opaque => "opaque",
        }
    }

    /// Whether instances are built by the orchestrator rather than by a value rule
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            TypeKind::Hierarchy { .. }
                | TypeKind::Abstract { .. }
                | TypeKind::Object { .. }
                | TypeKind::Composite { .. }
        )
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeKind::Hierarchy { .. } | TypeKind::Abstract { .. })
    }
}

/// How to produce `None` and `Some(v)` for an `Option<T>`
#[derive(Debug, Clone, Copy)]
pub struct Nullability {
    id: TypeId,
    name: &'static str,
    none: InstanceFn,
    some: fn(Value) -> ArbitraterResult<Value>,
}

impl Nullability {
    fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<Option<T>>(),
            name: std::any::type_name::<Option<T>>(),
            none: || -> Value { Box::new(None::<T>) },
            some: |value| -> ArbitraterResult<Value> {
                Ok(Box::new(Some(downcast_value::<T>(value, "Option")?)))
            },
        }
    }

    pub fn none(&self) -> Value {
        (self.none)()
    }

    pub fn some(&self, value: Value) -> ArbitraterResult<Value> {
        (self.some)(value)
    }
}

/// Runtime description of a type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    nullable: Option<Nullability>,
    arguments: Vec<TypeDescriptor>,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Describe `T` with the given kind
    pub fn new<T: Any>(kind: TypeKind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            nullable: None,
            arguments: Vec::new(),
            kind,
        }
    }

    pub fn primitive<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Primitive)
    }

    pub fn opaque<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Opaque)
    }

    pub fn composite<T: Any>(constructor: ConstructorFn) -> Self {
        Self::new::<T>(TypeKind::Composite { constructor })
    }

    pub fn object<T: Any>(instance: InstanceFn) -> Self {
        Self::new::<T>(TypeKind::Object { instance })
    }

    pub fn enumeration<T: Any>(variants: VariantsFn) -> Self {
        Self::new::<T>(TypeKind::Enum { variants })
    }

    pub fn hierarchy<T: Any>(variants: HierarchyFn) -> Self {
        Self::new::<T>(TypeKind::Hierarchy { variants })
    }

    /// An abstract type without constructors, resolved via its implementors
    pub fn interface<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Abstract { interface: true })
    }

    /// An abstract type with constructors, resolved via its subclasses
    pub fn abstract_class<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Abstract { interface: false })
    }

    pub fn sequence<T: Any>(collect: CollectFn, element: TypeDescriptor) -> Self {
        Self::new::<T>(TypeKind::Sequence { collect }).with_arguments(vec![element])
    }

    pub fn set<T: Any>(collect: CollectFn, element: TypeDescriptor) -> Self {
        Self::new::<T>(TypeKind::Set { collect }).with_arguments(vec![element])
    }

    pub fn map<T: Any>(collect: CollectMapFn, key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new::<T>(TypeKind::Map { collect }).with_arguments(vec![key, value])
    }

    pub fn tuple<T: Any>(combine: CombineFn, first: TypeDescriptor, second: TypeDescriptor) -> Self {
        Self::new::<T>(TypeKind::Tuple { combine }).with_arguments(vec![first, second])
    }

    pub fn with_arguments(mut self, arguments: Vec<TypeDescriptor>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Override the display name, used for enum variants described as types
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// The nullable form of this descriptor, where `T` is the described type
    pub fn into_nullable<T: Any>(mut self) -> Self {
        self.nullable = Some(Nullability::of::<T>());
        self
    }

    /// The same type with nullability stripped
    pub fn non_nullable(&self) -> Self {
        Self {
            nullable: None,
            ..self.clone()
        }
    }

    /// Identity of the non-nullable form
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.is_some()
    }

    pub fn nullability(&self) -> Option<Nullability> {
        self.nullable
    }

    /// Identity of the values this descriptor produces, `Option<T>` when nullable
    pub fn value_type_id(&self) -> TypeId {
        self.nullable.map_or(self.id, |nullability| nullability.id)
    }

    pub fn value_type_name(&self) -> &'static str {
        self.nullable.map_or(self.name, |nullability| nullability.name)
    }

    pub fn arguments(&self) -> &[TypeDescriptor] {
        &self.arguments
    }

    /// The generic argument at `index`
    pub fn argument(&self, index: usize) -> ArbitraterResult<&TypeDescriptor> {
        self.arguments.get(index).ok_or_else(|| {
            ArbitraterError::unsupported_type(
                self.name,
                format!("missing type argument #{}", index),
            )
        })
    }

    /// The canonical constructor, if this is a non-nullable composite
    pub fn canonical_constructor(&self) -> Option<Constructor> {
        match self.kind {
            TypeKind::Composite { constructor } if !self.is_nullable() => Some(constructor()),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nullable() {
            write!(f, "Option<{}>", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// One parameter of a canonical constructor
#[derive(Debug, Clone, Copy)]
pub struct Parameter {
    name: &'static str,
    ty: DescribeFn,
    has_default: bool,
}

impl Parameter {
    /// A parameter of type `T` with no declared default
    pub fn new<T: Reflect>(name: &'static str) -> Self {
        Self {
            name,
            ty: T::type_descriptor,
            has_default: false,
        }
    }

    /// Mark the parameter as having a declared default
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn type_descriptor(&self) -> TypeDescriptor {
        (self.ty)()
    }
}

/// A canonical constructor: its parameters plus the function that invokes it
#[derive(Debug, Clone)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    build: BuildFn,
}

impl Constructor {
    pub fn new(build: BuildFn) -> Self {
        Self {
            parameters: Vec::new(),
            build,
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn invoke(&self, mut arguments: Arguments) -> ArbitraterResult<Value> {
        (self.build)(&mut arguments)
    }
}

/// Resolved constructor arguments, keyed by parameter name
///
/// Parameters skipped in favour of their declared default are simply absent.
#[derive(Default)]
pub struct Arguments {
    values: HashMap<&'static str, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    /// Remove the argument for `name` as a `T`
    pub fn take<T: Any>(&mut self, name: &str) -> ArbitraterResult<T> {
        match self.values.remove(name) {
            Some(value) => downcast_value(value, name),
            None => Err(ArbitraterError::missing_argument(name)),
        }
    }

    /// Remove the argument for `name`, falling back to the declared default
    pub fn take_or_else<T: Any>(
        &mut self,
        name: &str,
        default: impl FnOnce() -> T,
    ) -> ArbitraterResult<T> {
        match self.values.remove(name) {
            Some(value) => downcast_value(value, name),
            None => Ok(default()),
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// A concrete candidate for an abstract type
#[derive(Clone)]
pub struct Implementor {
    descriptor: TypeDescriptor,
    upcast: Upcast,
}

impl Implementor {
    pub fn new(
        descriptor: TypeDescriptor,
        upcast: impl Fn(Value) -> ArbitraterResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            upcast: Arc::new(upcast),
        }
    }

    /// Concrete type `C` seen as `Base` through `upcast`
    pub fn of<Base: Any, C: Reflect>(upcast: fn(C) -> Base) -> Self {
        Self::new(C::type_descriptor(), move |value| {
            let concrete = downcast_value::<C>(value, std::any::type_name::<C>())?;
            Ok(Box::new(upcast(concrete)))
        })
    }

    /// A member whose values already have the hierarchy's type
    pub fn variant(descriptor: TypeDescriptor) -> Self {
        Self::new(descriptor, Ok)
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn upcast(&self, value: Value) -> ArbitraterResult<Value> {
        (self.upcast)(value)
    }

    /// Chain a further upcast after this one
    pub(crate) fn then(&self, outer: Upcast) -> Implementor {
        let inner = Arc::clone(&self.upcast);
        Implementor {
            descriptor: self.descriptor.clone(),
            upcast: Arc::new(move |value| outer(inner(value)?)),
        }
    }

    pub(crate) fn upcast_fn(&self) -> Upcast {
        Arc::clone(&self.upcast)
    }
}

impl fmt::Debug for Implementor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementor")
            .field("descriptor", &self.descriptor.name)
            .finish_non_exhaustive()
    }
}

/// Recover a typed value, naming `context` on failure
pub fn downcast_value<T: Any>(value: Value, context: &str) -> ArbitraterResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ArbitraterError::argument_mismatch(context, std::any::type_name::<T>()))
}
