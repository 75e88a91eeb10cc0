//! Parsing utilities for the document derive.
//!
//! This module turns a `DeriveInput` and its `#[docket(...)]` and
//! `#[validate(...)]` attributes into a [`DocumentInput`].

use proc_macro2::Span;
use syn::{
    ext::IdentExt, meta::ParseNestedMeta, spanned::Spanned, Attribute, Data, DeriveInput, Expr,
    Fields, GenericArgument, GenericParam, Generics, Ident, LitStr, Path, PathArguments, Type,
};

/// Capabilities the type implements by hand, from the container attribute.
///
/// `#[docket(default_fields, custom_fields, hooks, identifier, validate)]`,
/// plus `#[docket(crate = "path")]` to name the core crate.
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    /// The type implements `DefaultFieldSetter`.
    pub default_fields: bool,
    /// The type implements `CustomFieldSetter`.
    pub custom_fields: bool,
    /// The type implements `LifecycleHook`.
    pub hooks: bool,
    /// The type implements `IdentifierHolder`.
    pub identifier: bool,
    /// The type implements `Validate`.
    pub validate: bool,
    /// Path to `docket-core`, when it is not a direct dependency.
    pub krate: Option<Path>,
}

impl ContainerAttrs {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("docket")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.krate = Some(lit.parse()?);
                    return Ok(());
                }
                let flag = if meta.path.is_ident("default_fields") {
                    &mut parsed.default_fields
                } else if meta.path.is_ident("custom_fields") {
                    &mut parsed.custom_fields
                } else if meta.path.is_ident("hooks") {
                    &mut parsed.hooks
                } else if meta.path.is_ident("identifier") {
                    &mut parsed.identifier
                } else if meta.path.is_ident("validate") {
                    &mut parsed.validate
                } else {
                    return Err(meta.error(
                        "unknown docket attribute, expected one of: \
                         default_fields, custom_fields, hooks, identifier, validate, crate",
                    ));
                };
                *flag = true;
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

/// How a field is exposed through `FieldAccess::field_mut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// `DateTime<Utc>`
    Timestamp,
    /// `i64`
    UnixSeconds,
    /// `DocumentId`
    Id,
    /// `String`
    Text,
    /// Anything else.
    Unsupported,
}

impl SlotKind {
    /// Classifies a field type by the last segment of its path.
    pub fn classify(ty: &Type) -> Self {
        let Type::Path(type_path) = ty else {
            return Self::Unsupported;
        };
        if type_path.qself.is_some() {
            return Self::Unsupported;
        }
        let Some(segment) = type_path.path.segments.last() else {
            return Self::Unsupported;
        };
        match segment.ident.to_string().as_str() {
            "DateTime" if is_utc(&segment.arguments) => Self::Timestamp,
            "i64" if segment.arguments.is_empty() => Self::UnixSeconds,
            "DocumentId" if segment.arguments.is_empty() => Self::Id,
            "String" if segment.arguments.is_empty() => Self::Text,
            _ => Self::Unsupported,
        }
    }
}

fn is_utc(arguments: &PathArguments) -> bool {
    let PathArguments::AngleBracketed(args) = arguments else {
        return false;
    };
    let mut iter = args.args.iter();
    match (iter.next(), iter.next()) {
        (Some(GenericArgument::Type(Type::Path(tz))), None) => tz
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "Utc"),
        _ => false,
    }
}

/// A declared field constraint.
#[derive(Debug)]
pub enum FieldRule {
    /// `required`
    Required,
    /// `email`
    Email,
    /// `pattern = "..."`
    Pattern(LitStr),
    /// `range(min = .., max = ..)`
    Range {
        /// Lower bound.
        min: Option<Expr>,
        /// Upper bound.
        max: Option<Expr>,
    },
    /// `length(min = .., max = ..)`
    Length {
        /// Lower bound.
        min: Option<Expr>,
        /// Upper bound.
        max: Option<Expr>,
    },
}

impl FieldRule {
    fn parse_list(attr: &Attribute, rules: &mut Vec<Self>) -> syn::Result<()> {
        attr.parse_nested_meta(|meta| {
            let rule = if meta.path.is_ident("required") {
                Self::Required
            } else if meta.path.is_ident("email") {
                Self::Email
            } else if meta.path.is_ident("pattern") {
                Self::Pattern(meta.value()?.parse()?)
            } else if meta.path.is_ident("range") {
                let (min, max) = parse_bounds(&meta)?;
                Self::Range { min, max }
            } else if meta.path.is_ident("length") {
                let (min, max) = parse_bounds(&meta)?;
                Self::Length { min, max }
            } else {
                return Err(meta.error(
                    "unknown validation rule, expected one of: \
                     required, email, pattern, range, length",
                ));
            };
            rules.push(rule);
            Ok(())
        })
    }
}

fn parse_bounds(meta: &ParseNestedMeta<'_>) -> syn::Result<(Option<Expr>, Option<Expr>)> {
    let mut min = None;
    let mut max = None;
    meta.parse_nested_meta(|bound| {
        if bound.path.is_ident("min") {
            min = Some(bound.value()?.parse::<Expr>()?);
        } else if bound.path.is_ident("max") {
            max = Some(bound.value()?.parse::<Expr>()?);
        } else {
            return Err(bound.error("expected `min` or `max`"));
        }
        Ok(())
    })?;
    if min.is_none() && max.is_none() {
        return Err(meta.error("expected at least one of `min` or `max`"));
    }
    Ok((min, max))
}

/// A parsed named field.
#[derive(Debug)]
pub struct DocField {
    /// The field identifier.
    pub ident: Ident,
    /// The declared name, without any `r#` prefix.
    pub name: String,
    /// Extra lookup name from `#[docket(rename = "..")]`.
    pub alias: Option<String>,
    /// The declared type.
    pub ty: Type,
    /// How the field is exposed by name.
    pub slot: SlotKind,
    /// `#[docket(embed)]`: delegates default fields and identifier here.
    pub embed: bool,
    /// `#[docket(id)]`: this field is the identifier.
    pub id: bool,
    /// Declared constraints, in order.
    pub rules: Vec<FieldRule>,
}

impl DocField {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;

        let mut alias = None;
        let mut embed = false;
        let mut id = false;
        let mut rules = Vec::new();

        for attr in &field.attrs {
            if attr.path().is_ident("docket") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("embed") {
                        embed = true;
                    } else if meta.path.is_ident("id") {
                        id = true;
                    } else if meta.path.is_ident("rename") {
                        let name: LitStr = meta.value()?.parse()?;
                        alias = Some(name.value());
                    } else {
                        return Err(meta.error(
                            "unknown docket field attribute, expected one of: embed, id, rename",
                        ));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("validate") {
                FieldRule::parse_list(attr, &mut rules)?;
            }
        }

        if embed && id {
            return Err(syn::Error::new(
                ident.span(),
                "a field cannot be both `embed` and `id`",
            ));
        }

        let slot = SlotKind::classify(&field.ty);
        if id && slot != SlotKind::Id {
            return Err(syn::Error::new(
                field.ty.span(),
                "`#[docket(id)]` requires a `DocumentId` field",
            ));
        }

        Ok(Self {
            name: ident.unraw().to_string(),
            ident,
            alias,
            ty: field.ty.clone(),
            slot,
            embed,
            id,
            rules,
        })
    }

    /// Returns the name used in validation errors.
    pub fn external_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A parsed `#[derive(Document)]` input.
#[derive(Debug)]
pub struct DocumentInput {
    /// The type name.
    pub ident: Ident,
    /// The type generics.
    pub generics: Generics,
    /// Container capability flags.
    pub attrs: ContainerAttrs,
    /// Named fields, in declaration order. Empty for unit structs.
    pub fields: Vec<DocField>,
}

impl DocumentInput {
    /// Parses and checks a derive input.
    pub fn parse(input: DeriveInput) -> syn::Result<Self> {
        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named
                    .named
                    .iter()
                    .map(DocField::parse)
                    .collect::<syn::Result<Vec<_>>>()?,
                Fields::Unit => Vec::new(),
                Fields::Unnamed(_) => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "Document can only be derived for structs with named fields",
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Document can only be derived for structs",
                ))
            }
        };

        if let Some(lifetime) = input.generics.lifetimes().next() {
            return Err(syn::Error::new(
                lifetime.span(),
                "documents cannot borrow: lifetime parameters are not supported",
            ));
        }

        let attrs = ContainerAttrs::from_attrs(&input.attrs)?;
        let parsed = Self {
            ident: input.ident,
            generics: input.generics,
            attrs,
            fields,
        };
        parsed.check()?;
        Ok(parsed)
    }

    fn check(&self) -> syn::Result<()> {
        let mut embedded = self.fields.iter().filter(|f| f.embed);
        let mut ids = self.fields.iter().filter(|f| f.id);
        if let (Some(_), Some(second)) = (embedded.next(), embedded.next()) {
            return Err(syn::Error::new(
                second.ident.span(),
                "only one field can be `embed`",
            ));
        }
        if let (Some(_), Some(second)) = (ids.next(), ids.next()) {
            return Err(syn::Error::new(second.ident.span(), "only one field can be `id`"));
        }

        let embed = self.embedded_field();
        let id = self.id_field();
        if embed.is_some() && self.attrs.default_fields {
            return conflict("default_fields", "an `embed` field");
        }
        if (embed.is_some() || id.is_some()) && self.attrs.identifier {
            return conflict("identifier", "an `embed` or `id` field");
        }
        if embed.is_some() && id.is_some() {
            return conflict("`embed`", "an `id` field");
        }
        if self.attrs.validate && self.has_rules() {
            return conflict("validate", "`#[validate(...)]` field rules");
        }
        Ok(())
    }

    /// Returns the `#[docket(embed)]` field.
    pub fn embedded_field(&self) -> Option<&DocField> {
        self.fields.iter().find(|f| f.embed)
    }

    /// Returns the `#[docket(id)]` field.
    pub fn id_field(&self) -> Option<&DocField> {
        self.fields.iter().find(|f| f.id)
    }

    /// Returns the path generated code uses for `docket-core`.
    pub fn core_path(&self) -> Path {
        self.attrs
            .krate
            .clone()
            .unwrap_or_else(|| syn::parse_quote!(::docket_core))
    }

    /// Returns true if any field declares a constraint.
    pub fn has_rules(&self) -> bool {
        self.fields.iter().any(|f| !f.rules.is_empty())
    }

    /// Returns the type parameters, which all need a `'static` bound.
    pub fn type_params(&self) -> impl Iterator<Item = &Ident> {
        self.generics.params.iter().filter_map(|p| match p {
            GenericParam::Type(t) => Some(&t.ident),
            _ => None,
        })
    }
}

fn conflict(what: &str, with: &str) -> syn::Result<()> {
    Err(syn::Error::new(
        Span::call_site(),
        format!("{what} cannot be combined with {with}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_container_flags() {
        let input: DeriveInput = parse_quote! {
            #[docket(hooks, custom_fields)]
            struct User {
                name: String,
            }
        };
        let doc = DocumentInput::parse(input).unwrap();
        assert!(doc.attrs.hooks);
        assert!(doc.attrs.custom_fields);
        assert!(!doc.attrs.default_fields);
        assert_eq!(doc.fields.len(), 1);
    }

    #[test]
    fn test_parse_crate_path() {
        let input: DeriveInput = parse_quote! {
            #[docket(hooks, crate = "docket::core")]
            struct User {
                name: String,
            }
        };
        let doc = DocumentInput::parse(input).unwrap();
        let expected: Path = parse_quote!(docket::core);
        assert_eq!(doc.core_path(), expected);

        let input: DeriveInput = parse_quote! {
            struct Plain;
        };
        let expected: Path = parse_quote!(::docket_core);
        assert_eq!(DocumentInput::parse(input).unwrap().core_path(), expected);
    }

    #[test]
    fn test_crate_path_must_be_a_string() {
        let input: DeriveInput = parse_quote! {
            #[docket(crate = docket::core)]
            struct User;
        };
        assert!(DocumentInput::parse(input).is_err());
    }

    #[test]
    fn test_classify_slots() {
        let cases: [(Type, SlotKind); 6] = [
            (parse_quote!(DateTime<Utc>), SlotKind::Timestamp),
            (parse_quote!(chrono::DateTime<chrono::Utc>), SlotKind::Timestamp),
            (parse_quote!(DateTime<Local>), SlotKind::Unsupported),
            (parse_quote!(i64), SlotKind::UnixSeconds),
            (parse_quote!(docket_core::DocumentId), SlotKind::Id),
            (parse_quote!(Option<String>), SlotKind::Unsupported),
        ];
        for (ty, expected) in cases {
            assert_eq!(SlotKind::classify(&ty), expected);
        }
    }

    #[test]
    fn test_parse_field_attrs() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[docket(embed)]
                base: DefaultFields,
                #[docket(rename = "emailAddress")]
                #[validate(required, email)]
                email: String,
                #[validate(range(min = 18, max = 130))]
                age: u8,
                #[validate(length(max = 3), pattern = "^[a-z]+$")]
                r#type: String,
            }
        };
        let doc = DocumentInput::parse(input).unwrap();
        assert_eq!(doc.embedded_field().unwrap().name, "base");
        assert_eq!(doc.fields[1].external_name(), "emailAddress");
        assert_eq!(doc.fields[1].rules.len(), 2);
        assert!(matches!(
            doc.fields[2].rules[0],
            FieldRule::Range {
                min: Some(_),
                max: Some(_)
            }
        ));
        assert_eq!(doc.fields[3].name, "type");
        assert_eq!(doc.fields[3].rules.len(), 2);
    }

    #[test]
    fn test_empty_bounds_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[validate(range())]
                age: u8,
            }
        };
        assert!(DocumentInput::parse(input).is_err());
    }

    #[test]
    fn test_id_requires_document_id() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[docket(id)]
                id: String,
            }
        };
        assert!(DocumentInput::parse(input).is_err());
    }

    #[test]
    fn test_conflicting_capabilities_rejected() {
        let input: DeriveInput = parse_quote! {
            #[docket(default_fields)]
            struct User {
                #[docket(embed)]
                base: DefaultFields,
            }
        };
        assert!(DocumentInput::parse(input).is_err());
    }

    #[test]
    fn test_enums_and_tuple_structs_rejected() {
        let enum_input: DeriveInput = parse_quote! {
            enum Status { Active }
        };
        assert!(DocumentInput::parse(enum_input).is_err());

        let tuple_input: DeriveInput = parse_quote! {
            struct Wrapper(String);
        };
        assert!(DocumentInput::parse(tuple_input).is_err());
    }

    #[test]
    fn test_unit_struct_accepted() {
        let input: DeriveInput = parse_quote! {
            struct Marker;
        };
        assert!(DocumentInput::parse(input).unwrap().fields.is_empty());
    }
}
