//! The `Reflect` trait and its implementations for standard types.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::time::Duration;

use crate::descriptor::{TypeDescriptor, Value, downcast_value};
use crate::error::ArbitraterResult;

/// Types that can describe themselves to the synthesis engine
///
/// Implement this by hand for trait objects and opaque types, or use
/// `#[derive(Reflect)]` for structs and enums.
///
/// ```rust
/// use arbitrater::{Reflect, TypeDescriptor};
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// impl Reflect for Box<dyn Shape> {
///     fn type_descriptor() -> TypeDescriptor {
///         TypeDescriptor::interface::<Self>()
///     }
/// }
/// ```
pub trait Reflect: 'static {
    /// Describe the type
    fn type_descriptor() -> TypeDescriptor;
}

macro_rules! impl_reflect_primitive {
    ($($t:ty),*) => {
        $(
            impl Reflect for $t {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive::<$t>()
                }
            }
        )*
    };
}

impl_reflect_primitive!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    Duration
);

impl Reflect for () {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<()>(|| -> Value { Box::new(()) })
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        let inner = T::type_descriptor();
        if inner.is_nullable() {
            // Nested options have no single nullable form
            return TypeDescriptor::opaque::<Option<T>>();
        }
        inner.into_nullable::<T>()
    }
}

/// Downcast every element and collect into `C`
fn collect_into<T: Any, C: FromIterator<T> + Any>(values: Vec<Value>) -> ArbitraterResult<Value> {
    let collection = values
        .into_iter()
        .map(|value| downcast_value::<T>(value, std::any::type_name::<C>()))
        .collect::<ArbitraterResult<C>>()?;
    Ok(Box::new(collection))
}

fn collect_pairs<K: Any, V: Any, M: FromIterator<(K, V)> + Any>(
    pairs: Vec<(Value, Value)>,
) -> ArbitraterResult<Value> {
    let context = std::any::type_name::<M>();
    let map = pairs
        .into_iter()
        .map(|(key, value)| -> ArbitraterResult<(K, V)> {
            Ok((
                downcast_value::<K>(key, context)?,
                downcast_value::<V>(value, context)?,
            ))
        })
        .collect::<ArbitraterResult<M>>()?;
    Ok(Box::new(map))
}

fn combine_pair<A: Any, B: Any>(first: Value, second: Value) -> ArbitraterResult<Value> {
    let context = std::any::type_name::<(A, B)>();
    Ok(Box::new((
        downcast_value::<A>(first, context)?,
        downcast_value::<B>(second, context)?,
    )))
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(collect_into::<T, Self>, T::type_descriptor())
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(collect_into::<T, Self>, T::type_descriptor())
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::set::<Self>(collect_into::<T, Self>, T::type_descriptor())
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::set::<Self>(collect_into::<T, Self>, T::type_descriptor())
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<Self>(
            collect_pairs::<K, V, Self>,
            K::type_descriptor(),
            V::type_descriptor(),
        )
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<Self>(
            collect_pairs::<K, V, Self>,
            K::type_descriptor(),
            V::type_descriptor(),
        )
    }
}

impl<A: Reflect, B: Reflect> Reflect for (A, B) {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::tuple::<Self>(
            combine_pair::<A, B>,
            A::type_descriptor(),
            B::type_descriptor(),
        )
    }
}
