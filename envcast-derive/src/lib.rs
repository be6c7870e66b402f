//! Derive macro implementation for envcast

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Type};

mod attrs;

use attrs::{FieldAttrs, StructAttrs};

/// Extract inner type from Option<T>
fn extract_option_inner_type(ty: &Type) -> &Type {
    if let Type::Path(type_path) = ty {
        if let Some(seg) = type_path.path.segments.last() {
            if let syn::PathArguments::AngleBracketed(args) = &seg.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return inner;
                }
            }
        }
    }
    ty
}

fn last_segment_is(ty: &Type, ident: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident == ident)
            .unwrap_or(false),
        _ => false,
    }
}

/// `FromEnv` derive macro
///
/// Implements `from_env()` and `from_reader(&mut Env)` on structs with named
/// fields. `from_env()` reads every field with a deferred reader over the
/// process environment, so all failures are reported together.
///
/// # Supported Attributes
///
/// **Struct-level**:
/// - `#[env(prefix = "PREFIX_")]`: Add prefix to all env var names
/// - `#[env(expand_vars)]`: Follow `${VAR}` references in `from_env()`
///
/// **Field-level**:
/// - `#[env(name = "CUSTOM_NAME")]`: Custom environment variable name
/// - `#[env(default)]`: Use `Default::default()` if env var not set
/// - `#[env(default = value)]`: Use explicit default value if env var not set
/// - `#[env(from_file)]`: Support `{VAR}_FILE` pattern
/// - `#[env(kind = "tag")]`: Parse with the rule registered under `tag`
/// - `#[env(delimiter = ";")]`: Item delimiter for lists and mappings
/// - `#[env(deserializer = "func")]`: Use custom deserializer function
///
/// # Example
///
/// See the `envcast` crate documentation for usage examples.
#[proc_macro_derive(FromEnv, attributes(env))]
pub fn derive_from_env(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let struct_attrs = StructAttrs::from_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "FromEnv only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "FromEnv only supports structs",
            ))
        }
    };

    let mut reads = Vec::with_capacity(fields.len());
    let mut initializers = Vec::with_capacity(fields.len());
    for field in fields {
        let (read, initializer) = expand_field(field)?;
        reads.push(read);
        initializers.push(initializer);
    }

    let prefix = &struct_attrs.prefix;
    let expand_vars = struct_attrs.expand_vars;

    Ok(quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            /// Load configuration from environment variables
            ///
            /// Every field is read before failing, and the error lists each
            /// offending variable.
            ///
            /// # Errors
            ///
            /// - Required environment variables are not set
            /// - Environment variable values cannot be parsed into target types
            /// - File-based configuration fails to read files
            pub fn from_env() -> ::envcast::anyhow::Result<Self> {
                let mut env = ::envcast::Env::builder()
                    .eager(false)
                    .expand_vars(#expand_vars)
                    .build();
                let result = Self::from_reader(&mut env);
                env.seal()?;
                Ok(result?)
            }

            /// Load configuration through an existing reader
            ///
            /// The struct prefix is pushed on top of the reader's current
            /// prefix. With a deferred reader, failures are recorded on it
            /// and also returned.
            pub fn from_reader(
                env: &mut ::envcast::Env,
            ) -> ::core::result::Result<Self, ::envcast::EnvError> {
                type __Result<T> = ::core::result::Result<T, ::envcast::EnvError>;
                env.with_prefix(#prefix, |__env: &mut ::envcast::Env| -> __Result<Self> {
                    #(#reads)*
                    Ok(Self {
                        #(#initializers),*
                    })
                })
            }
        }
    })
}

/// Read statement and struct initializer for one field.
fn expand_field(field: &Field) -> syn::Result<(TokenStream2, TokenStream2)> {
    let field_name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "FromEnv requires named fields"))?;
    let field_type = &field.ty;
    let attrs = FieldAttrs::from_field(field)?;

    let is_option = last_segment_is(field_type, "Option");

    // Check for invalid combinations
    if is_option && attrs.default.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "Option<T> fields cannot have default attribute (they default to None automatically)",
        ));
    }
    if attrs.deserializer.is_some() {
        if attrs.default.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "default value is not supported with deserializer attribute",
            ));
        }
        if attrs.kind.is_some() || attrs.delimiter.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "kind and delimiter are not supported with deserializer attribute",
            ));
        }
    }

    let env_var_name = attrs
        .name
        .clone()
        .unwrap_or_else(|| field_name.unraw().to_string().to_uppercase());
    let value_type = if is_option {
        extract_option_inner_type(field_type)
    } else {
        field_type
    };

    let mut read = match (&attrs.deserializer, &attrs.kind) {
        (Some(func_path), _) => {
            let func: TokenStream2 = func_path.parse().map_err(|_| {
                syn::Error::new_spanned(field, format!("invalid deserializer path `{func_path}`"))
            })?;
            quote! { __env.deserialize(#env_var_name, |__raw: &str| #func(__raw)) }
        }
        (None, Some(kind)) => quote! { __env.parse::<#value_type>(#kind, #env_var_name) },
        (None, None) => quote! { __env.var::<#value_type>(#env_var_name) },
    };

    if attrs.from_file {
        read.extend(quote! { .from_file() });
    }
    if let Some(delimiter) = &attrs.delimiter {
        read.extend(quote! { .delimiter(#delimiter) });
    }
    match &attrs.default {
        Some(Some(default_value)) => {
            let is_str_literal = syn::parse2::<syn::LitStr>(default_value.clone()).is_ok();
            if is_str_literal && last_segment_is(field_type, "String") {
                read.extend(quote! { .default(::std::string::String::from(#default_value)) });
            } else {
                read.extend(quote! { .default(#default_value) });
            }
        }
        Some(None) => read.extend(quote! { .default(::core::default::Default::default()) }),
        None if is_option => read.extend(quote! { .default_none() }),
        None => {}
    }

    let local = format_ident!("__envcast_{}", field_name.unraw());
    let statement = quote! {
        let #local: ::core::option::Option<#value_type> = #read.get()?;
    };
    let initializer = if is_option {
        quote! { #field_name: #local }
    } else {
        quote! { #field_name: __env.__field(#local, #env_var_name)? }
    };

    Ok((statement, initializer))
}
