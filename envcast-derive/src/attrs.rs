//! Attribute parsing for `#[env(...)]` annotations.

use syn::{Attribute, Field, LitStr};

/// Parsed `#[env(...)]` attributes on the struct itself.
#[derive(Debug, Default)]
pub struct StructAttrs {
    /// Prepended to every variable name.
    pub prefix: String,

    /// Follow `${VAR}` references in values.
    pub expand_vars: bool,
}

impl StructAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("env") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("prefix") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.prefix = lit.value();
                    return Ok(());
                }

                if meta.path.is_ident("expand_vars") {
                    parsed.expand_vars = true;
                    return Ok(());
                }

                Err(meta.error("unsupported struct-level env attribute"))
            })?;
        }

        Ok(parsed)
    }
}

/// Parsed `#[env(...)]` attributes from a struct field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Custom variable name. If `None`, the field name is uppercased.
    pub name: Option<String>,

    /// Default value strategy:
    /// - `None`: Field is required (no default)
    /// - `Some(None)`: Use `Default::default()`
    /// - `Some(Some(tokens))`: Use explicit token stream as default value
    pub default: Option<Option<proc_macro2::TokenStream>>,

    /// Fall back to `{VAR}_FILE`.
    pub from_file: bool,

    /// Rule tag overriding the one implied by the field type.
    pub kind: Option<String>,

    /// Item delimiter for lists and mappings.
    pub delimiter: Option<String>,

    /// Custom deserializer function path (e.g., `"serde_json::from_str"`).
    pub deserializer: Option<String>,
}

impl FieldAttrs {
    /// Extract `#[env(...)]` attributes from a struct field.
    ///
    /// Attributes of other macros are skipped. Unknown keys inside
    /// `#[env(...)]` are errors.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();

        for attr in &field.attrs {
            if !attr.path().is_ident("env") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                // name = "..."
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.name = Some(lit.value());
                    return Ok(());
                }

                // default or default = value
                if meta.path.is_ident("default") {
                    if meta.input.peek(syn::Token![=]) {
                        let value = meta.value()?;
                        let expr: syn::Expr = value.parse()?;
                        attrs.default = Some(Some(quote::ToTokens::to_token_stream(&expr)));
                    } else {
                        attrs.default = Some(None);
                    }
                    return Ok(());
                }

                if meta.path.is_ident("from_file") {
                    attrs.from_file = true;
                    return Ok(());
                }

                if meta.path.is_ident("kind") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.kind = Some(lit.value());
                    return Ok(());
                }

                if meta.path.is_ident("delimiter") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.delimiter = Some(lit.value());
                    return Ok(());
                }

                // deserializer = "function::path"
                if meta.path.is_ident("deserializer") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.deserializer = Some(lit.value());
                    return Ok(());
                }

                Err(meta.error("unsupported env attribute"))
            })?;
        }

        Ok(attrs)
    }
}
