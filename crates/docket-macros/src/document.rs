//! Document derive implementation.
//!
//! This module contains the core logic for expanding `#[derive(Document)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, DeriveInput, LitStr, Path};

use crate::parse::{DocField, DocumentInput, FieldRule, SlotKind};

/// Expands `#[derive(Document)]`.
///
/// Generates `FieldAccess`, `Document` and `Element` impls, plus a
/// `Validate` impl when any field declares a constraint.
pub fn expand_document(item: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(item)?;
    let doc = DocumentInput::parse(input)?;

    let field_access = generate_field_access(&doc);
    let document = generate_document(&doc);
    let element = generate_element(&doc);
    let validate = if doc.has_rules() {
        generate_validate(&doc)
    } else {
        TokenStream::new()
    };

    Ok(quote! {
        #field_access
        #document
        #element
        #validate
    })
}

/// Builds the impl header pieces, adding `'static` to every type parameter.
fn impl_parts(doc: &DocumentInput) -> (TokenStream, TokenStream, TokenStream) {
    let mut generics = doc.generics.clone();
    let params: Vec<_> = doc.type_params().cloned().collect();
    if !params.is_empty() {
        let where_clause = generics.make_where_clause();
        for param in params {
            where_clause.predicates.push(parse_quote!(#param: 'static));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    (
        quote! { #impl_generics },
        quote! { #ty_generics },
        quote! { #where_clause },
    )
}

fn slot_tokens(krate: &Path, field: &DocField) -> TokenStream {
    let ident = &field.ident;
    let ty = &field.ty;
    match field.slot {
        SlotKind::Timestamp => quote! { #krate::FieldMut::Timestamp(&mut self.#ident) },
        SlotKind::UnixSeconds => quote! { #krate::FieldMut::UnixSeconds(&mut self.#ident) },
        SlotKind::Id => quote! { #krate::FieldMut::Id(&mut self.#ident) },
        SlotKind::Text => quote! { #krate::FieldMut::Text(&mut self.#ident) },
        SlotKind::Unsupported => {
            quote! { #krate::FieldMut::Unsupported(::core::any::type_name::<#ty>()) }
        }
    }
}

fn generate_field_access(doc: &DocumentInput) -> TokenStream {
    let krate = doc.core_path();
    let ident = &doc.ident;
    let (impl_generics, ty_generics, where_clause) = impl_parts(doc);

    let names: Vec<&str> = doc
        .fields
        .iter()
        .flat_map(|f| std::iter::once(f.name.as_str()).chain(f.alias.as_deref()))
        .collect();

    let arms = doc.fields.iter().map(|field| {
        let name = field.name.as_str();
        let slot = slot_tokens(&krate, field);
        match &field.alias {
            Some(alias) => quote! { #name | #alias => ::core::option::Option::Some(#slot), },
            None => quote! { #name => ::core::option::Option::Some(#slot), },
        }
    });

    let field_mut = if doc.fields.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            fn field_mut(&mut self, name: &str) -> ::core::option::Option<#krate::FieldMut<'_>> {
                match name {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    quote! {
        #[automatically_derived]
        impl #impl_generics #krate::FieldAccess for #ident #ty_generics #where_clause {
            fn field_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            #field_mut
        }
    }
}

fn generate_document(doc: &DocumentInput) -> TokenStream {
    let krate = doc.core_path();
    let ident = &doc.ident;
    let type_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = impl_parts(doc);

    let default_fields = if let Some(embed) = doc.embedded_field() {
        let field = &embed.ident;
        quote! {
            fn as_default_fields(&mut self) -> ::core::option::Option<&mut dyn #krate::DefaultFieldSetter> {
                ::core::option::Option::Some(&mut self.#field)
            }
        }
    } else if doc.attrs.default_fields {
        quote! {
            fn as_default_fields(&mut self) -> ::core::option::Option<&mut dyn #krate::DefaultFieldSetter> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream::new()
    };

    let identifier = if let Some(field) = doc.embedded_field().or_else(|| doc.id_field()) {
        let field = &field.ident;
        quote! {
            fn as_identifier(&mut self) -> ::core::option::Option<&mut dyn #krate::IdentifierHolder> {
                ::core::option::Option::Some(&mut self.#field)
            }
        }
    } else if doc.attrs.identifier {
        quote! {
            fn as_identifier(&mut self) -> ::core::option::Option<&mut dyn #krate::IdentifierHolder> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream::new()
    };

    let custom_fields = if doc.attrs.custom_fields {
        quote! {
            fn as_custom_fields(&self) -> ::core::option::Option<&dyn #krate::CustomFieldSetter> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream::new()
    };

    let hook = if doc.attrs.hooks {
        quote! {
            fn as_hook(&mut self) -> ::core::option::Option<&mut dyn #krate::LifecycleHook> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream::new()
    };

    let validate = if doc.attrs.validate || doc.has_rules() {
        quote! {
            fn as_validate(&self) -> ::core::option::Option<&dyn #krate::Validate> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream::new()
    };

    quote! {
        #[automatically_derived]
        impl #impl_generics #krate::Document for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #default_fields
            #custom_fields
            #hook
            #identifier
            #validate
        }
    }
}

fn generate_element(doc: &DocumentInput) -> TokenStream {
    let krate = doc.core_path();
    let ident = &doc.ident;
    let (impl_generics, ty_generics, where_clause) = impl_parts(doc);

    quote! {
        #[automatically_derived]
        impl #impl_generics #krate::Element for #ident #ty_generics #where_clause {
            fn kind(&self) -> #krate::ElementKind {
                #krate::ElementKind::Document
            }

            fn static_kind() -> #krate::ElementKind {
                #krate::ElementKind::Document
            }

            fn collect<'__docket>(
                &'__docket mut self,
                _depth: usize,
                _limits: &#krate::ShapeLimits,
                out: &mut #krate::Batch<'__docket>,
            ) -> #krate::PipelineResult<()> {
                out.push(self);
                ::core::result::Result::Ok(())
            }
        }
    }
}

fn generate_validate(doc: &DocumentInput) -> TokenStream {
    let krate = &doc.core_path();
    let ident = &doc.ident;
    let (impl_generics, ty_generics, where_clause) = impl_parts(doc);

    let checks = doc
        .fields
        .iter()
        .flat_map(|field| field.rules.iter().map(move |rule| rule_check(krate, field, rule)));

    quote! {
        #[automatically_derived]
        impl #impl_generics #krate::Validate for #ident #ty_generics #where_clause {
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::unnecessary_cast)]
            fn validate(&self) -> ::core::result::Result<(), #krate::ValidationError> {
                #(#checks)*
                ::core::result::Result::Ok(())
            }
        }
    }
}

fn bound(expr: Option<&syn::Expr>, ty: TokenStream) -> TokenStream {
    match expr {
        Some(expr) => quote! { ::core::option::Option::Some((#expr) as #ty) },
        None => quote! { ::core::option::Option::None },
    }
}

fn rule_check(krate: &Path, field: &DocField, rule: &FieldRule) -> TokenStream {
    let ident = &field.ident;
    let name = field.external_name();
    let helpers = quote! { #krate::validate };

    match rule {
        FieldRule::Required => quote! {
            #helpers::required(#name, &self.#ident)?;
        },
        FieldRule::Email => quote! {
            #helpers::email(#name, &self.#ident)?;
        },
        FieldRule::Range { min, max } => {
            let min = bound(min.as_ref(), quote! { f64 });
            let max = bound(max.as_ref(), quote! { f64 });
            quote! {
                #helpers::range(#name, &self.#ident, #min, #max)?;
            }
        }
        FieldRule::Length { min, max } => {
            let min = bound(min.as_ref(), quote! { usize });
            let max = bound(max.as_ref(), quote! { usize });
            quote! {
                #helpers::length(#name, &self.#ident, #min, #max)?;
            }
        }
        FieldRule::Pattern(source) => pattern_check(krate, name, ident, source),
    }
}

/// Compiles the pattern once per field, on first use.
fn pattern_check(krate: &Path, name: &str, ident: &syn::Ident, source: &LitStr) -> TokenStream {
    quote! {
        {
            static PATTERN: ::std::sync::OnceLock<::core::option::Option<#krate::validate::Regex>> =
                ::std::sync::OnceLock::new();
            let compiled = PATTERN
                .get_or_init(|| #krate::validate::Regex::new(#source).ok())
                .as_ref();
            #krate::validate::pattern(#name, &self.#ident, compiled, #source)?;
        }
    }
}
