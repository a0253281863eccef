//! Generators for primitive types and the process-wide default table.

use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;
use rand::distributions::uniform::SampleUniform;

use crate::generator::{Generator, GeneratorRegistry};

/// Generator for boolean values
#[derive(Debug, Clone)]
pub struct BoolGenerator;

impl Generator<bool> for BoolGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> bool {
        rng.r#gen()
    }
}

/// Generator for integer types within an inclusive range
#[derive(Debug, Clone)]
pub struct IntGenerator<T> {
    min: T,
    max: T,
}

impl<T> IntGenerator<T>
where
    T: num_traits::PrimInt,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Create a generator for the full range of the type
    pub fn full_range() -> Self {
        Self::new(T::min_value(), T::max_value())
    }
}

impl<T> Generator<T> for IntGenerator<T>
where
    T: num_traits::PrimInt + SampleUniform,
{
    fn generate(&self, rng: &mut dyn rand::RngCore) -> T {
        rng.gen_range(self.min..=self.max)
    }
}

/// Generator for floating-point types
#[derive(Debug, Clone)]
pub struct FloatGenerator<T> {
    min: T,
    max: T,
}

impl<T> FloatGenerator<T>
where
    T: num_traits::Float,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Finite values in `-1000.0..1000.0`
    pub fn reasonable_range() -> Self {
        let bound = <T as num_traits::NumCast>::from(1000.0).unwrap_or_else(T::one);
        Self::new(-bound, bound)
    }
}

impl<T> Generator<T> for FloatGenerator<T>
where
    T: num_traits::Float + SampleUniform,
{
    fn generate(&self, rng: &mut dyn rand::RngCore) -> T {
        rng.gen_range(self.min..self.max)
    }
}

/// Generator for character values
#[derive(Debug, Clone)]
pub struct CharGenerator {
    ranges: Vec<(char, char)>,
}

impl CharGenerator {
    /// ASCII printable characters
    pub fn ascii_printable() -> Self {
        Self {
            ranges: vec![(' ', '~')],
        }
    }

    /// ASCII alphanumeric characters
    pub fn ascii_alphanumeric() -> Self {
        Self {
            ranges: vec![('0', '9'), ('A', 'Z'), ('a', 'z')],
        }
    }
}

impl Generator<char> for CharGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> char {
        if self.ranges.is_empty() {
            return 'a';
        }

        let (start, end) = self.ranges[rng.gen_range(0..self.ranges.len())];
        let code = rng.gen_range(start as u32..=end as u32);
        char::from_u32(code).unwrap_or('a')
    }
}

/// Generator for string values
#[derive(Debug, Clone)]
pub struct StringGenerator {
    char_generator: CharGenerator,
    min_length: usize,
    max_length: usize,
}

impl StringGenerator {
    pub fn ascii_alphanumeric(min_length: usize, max_length: usize) -> Self {
        Self {
            char_generator: CharGenerator::ascii_alphanumeric(),
            min_length,
            max_length,
        }
    }
}

impl Generator<String> for StringGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> String {
        let length = if self.min_length >= self.max_length {
            self.min_length
        } else {
            rng.gen_range(self.min_length..=self.max_length)
        };

        (0..length)
            .map(|_| self.char_generator.generate(rng))
            .collect()
    }
}

/// Generator for durations up to one year
#[derive(Debug, Clone)]
pub struct DurationGenerator;

impl Generator<Duration> for DurationGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> Duration {
        let secs = rng.gen_range(0..=365 * 24 * 60 * 60);
        let nanos = rng.gen_range(0..1_000_000_000);
        Duration::new(secs, nanos)
    }
}

static DEFAULT_REGISTRY: OnceLock<GeneratorRegistry> = OnceLock::new();

/// The process-wide default generator table
///
/// Built on first use and never mutated afterwards. Creators extend copies of
/// it instead.
pub fn default_registry() -> &'static GeneratorRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

macro_rules! register_ints {
    ($registry:ident, $($t:ty),*) => {
        $(
            $registry.register::<$t, _>(IntGenerator::<$t>::full_range());
        )*
    };
}

fn build_default_registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    register_ints!(
        registry, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
    );
    registry.register::<f32, _>(FloatGenerator::<f32>::reasonable_range());
    registry.register::<f64, _>(FloatGenerator::<f64>::reasonable_range());
    registry.register::<bool, _>(BoolGenerator);
    registry.register::<char, _>(CharGenerator::ascii_printable());
    registry.register::<String, _>(StringGenerator::ascii_alphanumeric(1, 20));
    registry.register::<Duration, _>(DurationGenerator);
    registry
}
