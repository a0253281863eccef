//! Derive macros for the Arbitrater test-data library
//!
//! This crate provides the `Reflect` derive, which describes a type's shape to
//! the Arbitrater synthesis engine.

use proc_macro::TokenStream;

mod derive;

/// Derive macro for automatically implementing the Reflect trait
///
/// # Basic Usage
///
/// ```rust
/// use arbitrater::Reflect;
///
/// #[derive(Reflect)]
/// struct User {
///     id: u32,
///     name: String,
///     active: bool,
/// }
/// ```
///
/// # Declared Defaults
///
/// Fields marked with `#[reflect(default)]` take `Default::default()` when the
/// creator is told to use default values; `#[reflect(default = "path")]`
/// names a function supplying the default instead.
///
/// ```rust
/// use arbitrater::Reflect;
///
/// #[derive(Reflect)]
/// struct Connection {
///     host: String,
///     #[reflect(default = "default_port")]
///     port: u16,
///     #[reflect(default)]
///     retries: u8,
/// }
///
/// fn default_port() -> u16 {
///     8080
/// }
/// ```
///
/// # Enums
///
/// Enums whose variants carry no data are picked from uniformly. Enums with
/// data-carrying variants are treated as sealed hierarchies: one variant is
/// chosen and its fields are synthesized.
///
/// ```rust
/// use arbitrater::Reflect;
///
/// #[derive(Reflect)]
/// enum Status {
///     Active,
///     Inactive(String),
///     Pending { reason: String },
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    derive::derive_reflect_impl(input)
}
