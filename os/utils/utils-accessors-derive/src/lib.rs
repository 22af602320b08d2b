//! # Setter Derive
//!
//! `#[derive(Setters)]` for plain configuration structs such as slot ranges
//! and partition descriptions, which are built once and then adjusted field
//! by field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Field, Fields, LitBool, parse_macro_input};

/// Generates, for each named field `f: T`,
///
/// - `fn set_f(&mut self, value: T) -> &mut Self`, and
/// - `const fn with_f(self, value: T) -> Self`.
///
/// `#[setters(skip)]` (or `#[setters(skip = true)]`) leaves a field out.
/// Field types must be droppable in a `const fn`, i.e. plain `Copy` data.
///
/// # Example
///
/// ```
/// use utils_accessors_derive::Setters;
///
/// #[derive(Setters)]
/// struct Range {
///     first: u16,
///     last: u16,
///     #[setters(skip)]
///     cursor: u16,
/// }
///
/// let mut range = Range { first: 4, last: 0xFFFF, cursor: 0 };
/// range.set_last(0x00FF);
/// let range = range.with_first(0x0010);
/// assert_eq!((range.first, range.last, range.cursor), (0x0010, 0x00FF, 0));
/// ```
#[proc_macro_derive(Setters, attributes(setters))]
pub fn derive_setters(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut methods = Vec::new();
    for field in named_fields(input)? {
        if !is_skipped(field)? {
            methods.push(setters_for(field));
        }
    }

    Ok(quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&Punctuated<Field, Comma>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Setters can only be derived for structs",
        ));
    };
    match &data.fields {
        Fields::Named(named) => Ok(&named.named),
        Fields::Unnamed(unnamed) => Err(syn::Error::new_spanned(
            unnamed,
            "Setters requires named fields",
        )),
        Fields::Unit => Err(syn::Error::new_spanned(
            &input.ident,
            "Setters has nothing to generate for a unit struct",
        )),
    }
}

fn setters_for(field: &Field) -> TokenStream2 {
    let Some(name) = &field.ident else {
        return TokenStream2::new();
    };
    let ty = &field.ty;
    let set_name = format_ident!("set_{}", name);
    let with_name = format_ident!("with_{}", name);
    let set_doc = format!("Sets `{name}`.");
    let with_doc = format!("Returns `self` with `{name}` replaced.");

    quote! {
        #[doc = #set_doc]
        #[inline]
        pub fn #set_name(&mut self, value: #ty) -> &mut Self {
            self.#name = value;
            self
        }

        #[doc = #with_doc]
        #[inline]
        #[must_use]
        pub const fn #with_name(mut self, value: #ty) -> Self {
            self.#name = value;
            self
        }
    }
}

fn is_skipped(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("setters")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("skip") {
                return Err(meta.error("expected `skip`"));
            }
            skip = if meta.input.is_empty() {
                true
            } else {
                meta.value()?.parse::<LitBool>()?.value
            };
            Ok(())
        })?;
    }
    Ok(skip)
}
