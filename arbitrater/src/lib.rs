//! # Arbitrater - arbitrary instances for tests
//!
//! Arbitrater builds fully-populated, randomly-valued instances of your types
//! so tests can ask for "any valid `Order`" instead of hand-writing fixtures.
//! Nested structs, collections, maps, enums, sealed hierarchies, trait objects
//! and `Option` fields are resolved recursively.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use arbitrater::{InstanceCreator, Reflect};
//!
//! #[derive(Debug, Reflect)]
//! enum Status {
//!     Active,
//!     Suspended,
//! }
//!
//! #[derive(Debug, Reflect)]
//! struct Account {
//!     id: u64,
//!     owner: String,
//!     status: Status,
//!     tags: Vec<String>,
//!     limits: HashMap<String, u32>,
//!     nickname: Option<String>,
//!     #[reflect(default)]
//!     retries: u8,
//! }
//!
//! let account = InstanceCreator::<Account>::new()
//!     .with_value("owner", "alice".to_string())
//!     .unwrap()
//!     .create_instance()
//!     .unwrap();
//!
//! assert_eq!(account.owner, "alice");
//! assert_eq!(account.tags.len(), 2);
//! assert!(account.limits.len() <= 10);
//! assert_eq!(account.retries, 0);
//! ```

// Lets the derive macro's `::arbitrater` paths resolve inside this crate
extern crate self as arbitrater;

pub mod config;
pub mod creator;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod locator;
pub mod picker;
pub mod primitives;
pub mod reflect;
pub mod rng;
pub mod synthesizer;
pub mod universe;

// Re-export the main public API
pub use config::{ConfigError, GeneratorSettings};
pub use creator::{InstanceCreator, arbitrary};
pub use descriptor::{
    Arguments, Constructor, Implementor, Parameter, TypeDescriptor, TypeKind, Value,
    downcast_value,
};
pub use error::{ArbitraterError, ArbitraterResult};
pub use generator::{Generator, GeneratorRegistry};
pub use locator::ConcreteTypeLocator;
pub use primitives::default_registry;
pub use reflect::Reflect;
pub use synthesizer::ValueSynthesizer;
pub use universe::{TypeUniverse, TypeUniverseBuilder, global_universe, install_universe};

// Re-export derive macro from separate crate when derive feature is enabled
#[cfg(feature = "derive")]
pub use arbitrater_derive::Reflect;
