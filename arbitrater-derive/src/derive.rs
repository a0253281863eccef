//! Derive macro implementation for the Reflect trait
//!
//! Structs become composite types whose canonical constructor takes the fields
//! in declaration order. Fieldless enums become enum types, enums with data
//! become closed hierarchies whose members are the variants, and unit structs
//! become object types.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, GenericParam, LitStr, Path, Result, Type,
    Variant, parse_macro_input, parse_quote,
};

/// Main entry point for the Reflect derive macro
pub fn derive_reflect_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_reflect_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Generate the Reflect implementation for the given input
fn generate_reflect_impl(input: &DeriveInput) -> Result<TokenStream> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(Error::new_spanned(
            lifetime,
            "Reflect cannot be derived for types with lifetime parameters",
        ));
    }

    let name = &input.ident;
    let mut bounded_generics = input.generics.clone();
    add_trait_bounds(&mut bounded_generics);
    let (impl_generics, ty_generics, where_clause) = bounded_generics.split_for_impl();

    let descriptor = match &input.data {
        Data::Struct(data_struct) => struct_descriptor(&data_struct.fields)?,
        Data::Enum(data_enum) => {
            enum_descriptor(name, &data_enum.variants.iter().collect::<Vec<_>>())?
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Reflect derive is not supported for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::arbitrater::Reflect for #name #ty_generics #where_clause {
            fn type_descriptor() -> ::arbitrater::TypeDescriptor {
                #descriptor
            }
        }
    })
}

/// Add the Reflect bound to every type parameter
fn add_trait_bounds(generics: &mut syn::Generics) {
    for param in &mut generics.params {
        if let GenericParam::Type(type_param) = param {
            type_param.bounds.push(parse_quote!(::arbitrater::Reflect));
        }
    }
}

/// Descriptor expression for a struct
fn struct_descriptor(fields: &Fields) -> Result<TokenStream> {
    match fields {
        Fields::Unit => Ok(quote! {
            ::arbitrater::TypeDescriptor::object::<Self>(|| -> ::arbitrater::Value {
                ::std::boxed::Box::new(Self)
            })
        }),
        _ => {
            let constructor = constructor_expr(quote!(Self), fields)?;
            Ok(quote! {
                ::arbitrater::TypeDescriptor::composite::<Self>(|| #constructor)
            })
        }
    }
}

/// Descriptor expression for an enum
fn enum_descriptor(name: &syn::Ident, variants: &[&Variant]) -> Result<TokenStream> {
    if variants.is_empty() {
        return Err(Error::new_spanned(
            name,
            "Cannot derive Reflect for empty enum",
        ));
    }

    let fieldless = variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit));

    if fieldless {
        let values = variants.iter().map(|variant| {
            let variant_name = &variant.ident;
            quote! {
                ::std::boxed::Box::new(Self::#variant_name) as ::arbitrater::Value
            }
        });
        return Ok(quote! {
            ::arbitrater::TypeDescriptor::enumeration::<Self>(|| ::std::vec![#(#values),*])
        });
    }

    let members = variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let member_name = format!("{}::{}", name, variant_name.unraw());
            let member = match &variant.fields {
                Fields::Unit => quote! {
                    ::arbitrater::TypeDescriptor::object::<Self>(|| -> ::arbitrater::Value {
                        ::std::boxed::Box::new(Self::#variant_name)
                    })
                },
                fields => {
                    let constructor = constructor_expr(quote!(Self::#variant_name), fields)?;
                    quote! {
                        ::arbitrater::TypeDescriptor::composite::<Self>(|| #constructor)
                    }
                }
            };
            Ok(quote! {
                ::arbitrater::Implementor::variant(#member.named(#member_name))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        ::arbitrater::TypeDescriptor::hierarchy::<Self>(|| ::std::vec![#(#members),*])
    })
}

/// Canonical constructor expression building `path` from named or tuple fields
fn constructor_expr(path: TokenStream, fields: &Fields) -> Result<TokenStream> {
    let mut parameters = Vec::new();
    let mut initializers = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let parameter_name = match &field.ident {
            Some(ident) => ident.unraw().to_string(),
            None => index.to_string(),
        };
        let default = parse_default(&field.attrs)?;
        parameters.push(parameter_expr(&field.ty, &parameter_name, default.is_some()));

        let take = take_expr(&field.ty, &parameter_name, default.as_ref());
        initializers.push(match &field.ident {
            Some(ident) => quote! { #ident: #take },
            None => take,
        });
    }

    let construction = match fields {
        Fields::Named(_) => quote! { #path { #(#initializers),* } },
        _ => quote! { #path ( #(#initializers),* ) },
    };

    Ok(quote! {
        ::arbitrater::Constructor::new(|arguments| {
            ::std::result::Result::Ok(::std::boxed::Box::new(#construction))
        })
        #(.parameter(#parameters))*
    })
}

fn parameter_expr(ty: &Type, name: &str, has_default: bool) -> TokenStream {
    if has_default {
        quote! { ::arbitrater::Parameter::new::<#ty>(#name).with_default() }
    } else {
        quote! { ::arbitrater::Parameter::new::<#ty>(#name) }
    }
}

fn take_expr(ty: &Type, name: &str, default: Option<&FieldDefault>) -> TokenStream {
    match default {
        None => quote! { arguments.take::<#ty>(#name)? },
        Some(FieldDefault::Trait) => quote! {
            arguments.take_or_else::<#ty>(#name, ::std::default::Default::default)?
        },
        Some(FieldDefault::Function(path)) => quote! {
            arguments.take_or_else::<#ty>(#name, #path)?
        },
    }
}

/// How a field's declared default is produced
#[derive(Debug)]
enum FieldDefault {
    /// `#[reflect(default)]`
    Trait,
    /// `#[reflect(default = "path::to_fn")]`
    Function(Path),
}

/// Parse `#[reflect(...)]` field attributes
fn parse_default(attrs: &[Attribute]) -> Result<Option<FieldDefault>> {
    let mut default = None;

    for attr in attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = Some(if meta.input.peek(syn::Token![=]) {
                    let function: LitStr = meta.value()?.parse()?;
                    FieldDefault::Function(function.parse()?)
                } else {
                    FieldDefault::Trait
                });
                Ok(())
            } else {
                Err(meta.error("unsupported reflect attribute, expected `default`"))
            }
        })?;
    }

    Ok(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        generate_reflect_impl(&input).unwrap().to_string()
    }

    #[test]
    fn test_add_trait_bounds() {
        let mut generics: syn::Generics = parse_quote! { <T, U> };
        add_trait_bounds(&mut generics);

        if let GenericParam::Type(type_param) = &generics.params[0] {
            assert_eq!(type_param.bounds.len(), 1);
        }
    }

    #[test]
    fn test_unit_struct_is_object() {
        let expanded = expand(parse_quote! { struct Marker; });
        assert!(expanded.contains("TypeDescriptor :: object"));
    }

    #[test]
    fn test_named_struct_parameters() {
        let expanded = expand(parse_quote! {
            struct Point {
                x: i32,
                #[reflect(default)]
                y: i32,
            }
        });
        assert!(expanded.contains("TypeDescriptor :: composite"));
        assert!(expanded.contains("Parameter :: new :: < i32 > (\"x\")"));
        assert!(expanded.contains("Parameter :: new :: < i32 > (\"y\") . with_default ()"));
        assert!(expanded.contains("take_or_else :: < i32 > (\"y\""));
    }

    #[test]
    fn test_tuple_struct_uses_positional_names() {
        let expanded = expand(parse_quote! { struct Pair(u8, String); });
        assert!(expanded.contains("(\"0\")"));
        assert!(expanded.contains("(\"1\")"));
    }

    #[test]
    fn test_fieldless_enum_is_enumeration() {
        let expanded = expand(parse_quote! { enum Colour { Red, Green } });
        assert!(expanded.contains("TypeDescriptor :: enumeration"));
        assert!(expanded.contains("Self :: Green"));
    }

    #[test]
    fn test_data_enum_is_hierarchy() {
        let expanded = expand(parse_quote! {
            enum Shape {
                Circle { radius: f64 },
                Square(f64),
                Empty,
            }
        });
        assert!(expanded.contains("TypeDescriptor :: hierarchy"));
        assert!(expanded.contains("\"Shape::Circle\""));
        assert!(expanded.contains("\"Shape::Empty\""));
    }

    #[test]
    fn test_default_function_attribute() {
        let field: syn::Field = parse_quote! {
            #[reflect(default = "defaults::port")]
            port: u16
        };
        match parse_default(&field.attrs).unwrap() {
            Some(FieldDefault::Function(path)) => {
                assert_eq!(quote!(#path).to_string(), "defaults :: port");
            }
            other => panic!("unexpected default: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_attribute() {
        let field: syn::Field = parse_quote! {
            #[reflect(skip)]
            port: u16
        };
        assert!(parse_default(&field.attrs).is_err());
    }

    #[test]
    fn test_rejects_empty_enum_and_lifetimes() {
        assert!(generate_reflect_impl(&parse_quote! { enum Never {} }).is_err());
        assert!(generate_reflect_impl(&parse_quote! { struct View<'a> { s: &'a str } }).is_err());
    }
}
