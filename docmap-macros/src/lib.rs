//! Procedural macros for the docmap project.
//!
//! `#[derive(Model)]` implements `ModelDefinition` from a `#[model(...)]` attribute, so the
//! schema of a model type is declared next to the type instead of being looked up at
//! runtime.
//!
//! ```ignore
//! use docmap::Model;
//!
//! #[derive(Model)]
//! #[model(
//!     collection = "soft",
//!     casts(_id = object_id, published_at = date_time),
//!     dates(deleted_at),
//! )]
//! pub struct Soft;
//! ```
//!
//! Supported keys:
//!
//! - `collection = "..."` (defaults to the snake_case type name followed by `s`)
//! - `primary_key = "..."` (defaults to `_id`)
//! - `date_format = "..."` (a `chrono` format string)
//! - `casts(attribute = object_id | date_time, ...)`
//! - `dates(attribute, ...)`

#[allow(unused_extern_crates)]
extern crate self as docmap_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Ident, LitStr, ext::IdentExt, parse_macro_input};

#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ModelArgs {
    collection: Option<String>,
    primary_key: Option<String>,
    date_format: Option<String>,
    casts: Vec<(String, TokenStream2)>,
    dates: Vec<String>,
}

fn attribute_name(path: &syn::Path) -> syn::Result<String> {
    path.get_ident()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| syn::Error::new_spanned(path, "expected an attribute name"))
}

fn caster_kind(kind: &Ident) -> syn::Result<TokenStream2> {
    match kind.to_string().as_str() {
        "object_id" => Ok(quote!(::docmap::cast::CasterKind::ObjectId)),
        "date_time" => Ok(quote!(::docmap::cast::CasterKind::DateTime)),
        _ => Err(syn::Error::new_spanned(
            kind,
            "unknown caster, expected `object_id` or `date_time`",
        )),
    }
}

fn parse_args(input: &DeriveInput) -> syn::Result<ModelArgs> {
    let mut args = ModelArgs::default();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                args.collection = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("primary_key") {
                args.primary_key = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("date_format") {
                args.date_format = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("casts") {
                meta.parse_nested_meta(|cast| {
                    let attribute = attribute_name(&cast.path)?;
                    let kind = caster_kind(&cast.value()?.parse::<Ident>()?)?;
                    args.casts.push((attribute, kind));
                    Ok(())
                })?;
            } else if meta.path.is_ident("dates") {
                meta.parse_nested_meta(|date| {
                    args.dates.push(attribute_name(&date.path)?);
                    Ok(())
                })?;
            } else {
                return Err(meta.error("unsupported model attribute"));
            }

            Ok(())
        })?;
    }

    Ok(args)
}

fn snake_case(name: &str) -> String {
    let mut out = String::new();

    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let args = parse_args(input)?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let name = ident.unraw().to_string();
    let collection = args
        .collection
        .unwrap_or_else(|| format!("{}s", snake_case(&name)));

    let primary_key = args
        .primary_key
        .map(|key| quote!(.primary_key(#key)));
    let date_format = args
        .date_format
        .map(|format| quote!(.date_format(#format)));
    let casts = args
        .casts
        .iter()
        .map(|(attribute, kind)| quote!(.cast(#attribute, #kind)));
    let dates = args.dates.iter().map(|attribute| quote!(.date(#attribute)));

    Ok(quote! {
        impl #impl_generics ::docmap::schema::ModelDefinition for #ident #ty_generics #where_clause {
            fn schema() -> ::docmap::schema::ModelSchema {
                ::docmap::schema::ModelSchema::new(#collection)
                    .named(#name)
                    #primary_key
                    #date_format
                    #(#casts)*
                    #(#dates)*
            }
        }
    })
}
