use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::{
    Data, DeriveInput, Fields, GenericArgument, Lit, Meta, PathArguments, Token, Type,
    parse_macro_input,
    punctuated::Punctuated,
};

/// Derives [`stitch_core::MappedEntity`] for a struct.
///
/// Struct attribute: `#[entity(table = "orders")]`.
///
/// Field attributes:
/// - `#[entity(column = "order_id", pk, kind = "uuid")]` for a scalar column.
///   `column` defaults to the field name in `snake_case`; `kind` is optional
///   and looked up in the [`stitch_core::TypeRegistry`] at fill time.
/// - `#[entity(fk = "customer_id:id")]` for a reference field, whose type
///   must be `Option<Arc<T>>` (one-to-one/many-to-one) or `Vec<Arc<T>>`
///   (one-to-many). Multiple pairs are comma-separated:
///   `fk = "customer_id:id, tenant_id:tenant_id"`.
/// - `#[entity(skip)]` to exclude a field from both binding and wiring.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let table = struct_table(&input)?.unwrap_or_else(|| ident.to_string().to_case(Case::Snake));

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input,
            "Entity can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut columns = Vec::new();
    let mut references = Vec::new();
    for field in &fields.named {
        let attr = FieldAttr::parse(field)?;
        if attr.skip {
            continue;
        }
        let ident = field.ident.as_ref().unwrap();
        if let Some(fk_raw) = &attr.fk {
            let (cardinality, target) = reference_target(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "fields with `fk` must be `Option<Arc<T>>` or `Vec<Arc<T>>`",
                )
            })?;
            let (fk, fk_valid) = parse_fk(fk_raw);
            references.push(ReferenceField {
                ident: ident.clone(),
                target,
                cardinality,
                fk,
                fk_raw: fk_raw.clone(),
                fk_valid,
            });
        } else {
            let column = attr
                .column
                .clone()
                .unwrap_or_else(|| ident.to_string().to_case(Case::Snake));
            columns.push(ColumnField {
                ident: ident.clone(),
                column,
                kind: attr.kind.clone(),
                pk: attr.pk,
            });
        }
    }

    let entity_name = ident.to_string();
    let descriptor = emit_descriptor(&table, &columns, &references);
    let fill_body = emit_fill(&table, ident, &columns, &references);
    let fill_references = emit_fill_references(&entity_name, &references, false);
    let fill_nested_references = emit_fill_references(&entity_name, &references, true);
    let pk_key = emit_pk_key(&columns);
    let column_value = emit_column_value(&columns);
    let wire_references = emit_wire_references(&columns, &references);

    Ok(quote! {
        impl ::stitch_core::MappedEntity for #ident {
            fn descriptor() -> &'static ::stitch_core::EntityDescriptor {
                #descriptor
                &DESCRIPTOR
            }

            fn fill(
                row: &::stitch_core::RowLabeled,
                registry: &::stitch_core::TypeRegistry,
            ) -> ::stitch_core::Result<Self> {
                #fill_body
            }

            fn fill_references(
                row: &::stitch_core::RowLabeled,
                registry: &::stitch_core::TypeRegistry,
                arena: &::stitch_core::ModelArena,
            ) -> impl ::std::future::Future<Output = ::stitch_core::Result<()>> + Send {
                async move {
                    #fill_references
                    Ok(())
                }
            }

            fn fill_nested_references(
                row: &::stitch_core::RowLabeled,
                registry: &::stitch_core::TypeRegistry,
                arena: &::stitch_core::ModelArena,
            ) -> impl ::std::future::Future<Output = ::stitch_core::Result<()>> + Send {
                async move {
                    #fill_nested_references
                    Ok(())
                }
            }

            fn pk_key(&self) -> ::stitch_core::PkKey {
                #pk_key
            }

            fn column_value(&self, column: &str) -> ::stitch_core::Value {
                #column_value
            }

            fn wire_references(
                &mut self,
                arena: &::stitch_core::ModelArena,
            ) -> impl ::std::future::Future<Output = ::stitch_core::Result<()>> + Send {
                async move {
                    #wire_references
                    Ok(())
                }
            }
        }
    })
}

struct ColumnField {
    ident: syn::Ident,
    column: String,
    kind: Option<String>,
    pk: bool,
}

struct ReferenceField {
    ident: syn::Ident,
    target: Type,
    cardinality: Cardinality,
    fk: Vec<(String, String)>,
    /// The raw, unparsed `fk` attribute value, kept for the `FkTagInvalid`
    /// error message if `fk_valid` is `false`.
    fk_raw: String,
    /// `false` if any comma-separated segment of `fk_raw` failed to parse
    /// as a `local:foreign` pair (missing `:`, or an empty side).
    fk_valid: bool,
}

#[derive(Clone, Copy)]
enum Cardinality {
    One,
    Many,
}

#[derive(Default)]
struct FieldAttr {
    column: Option<String>,
    kind: Option<String>,
    pk: bool,
    skip: bool,
    fk: Option<String>,
}

impl FieldAttr {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let mut out = FieldAttr::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("entity") {
                continue;
            }
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                match meta {
                    Meta::Path(p) if p.is_ident("pk") => out.pk = true,
                    Meta::Path(p) if p.is_ident("skip") => out.skip = true,
                    Meta::NameValue(nv) if nv.path.is_ident("column") => {
                        out.column = Some(lit_str(&nv.value)?);
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("kind") => {
                        out.kind = Some(lit_str(&nv.value)?);
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("fk") => {
                        out.fk = Some(lit_str(&nv.value)?);
                    }
                    other => {
                        return Err(syn::Error::new_spanned(other, "unrecognized entity attribute"));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn lit_str(expr: &syn::Expr) -> syn::Result<String> {
    if let syn::Expr::Lit(syn::ExprLit {
        lit: Lit::Str(s), ..
    }) = expr
    {
        Ok(s.value())
    } else {
        Err(syn::Error::new_spanned(expr, "expected a string literal"))
    }
}

/// Parse a `local:foreign[, local:foreign...]` tag into its pairs, also
/// reporting whether every non-empty segment parsed cleanly. A malformed
/// segment (no `:`, or an empty side) is dropped from the returned pairs —
/// the caller surfaces `fk_valid == false` as a runtime `FkTagInvalid`
/// rather than silently wiring on whatever pairs did parse.
fn parse_fk(value: &str) -> (Vec<(String, String)>, bool) {
    let mut valid = !value.trim().is_empty();
    let mut pairs = Vec::new();
    for segment in value.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once(':') {
            Some((local, foreign)) if !local.trim().is_empty() && !foreign.trim().is_empty() => {
                pairs.push((local.trim().to_string(), foreign.trim().to_string()));
            }
            _ => valid = false,
        }
    }
    (pairs, valid)
}

fn struct_table(input: &DeriveInput) -> syn::Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in metas {
            if let Meta::NameValue(nv) = &meta
                && nv.path.is_ident("table")
            {
                return Ok(Some(lit_str(&nv.value)?));
            }
        }
    }
    Ok(None)
}

/// Recognize `Option<Arc<T>>` (one) and `Vec<Arc<T>>` (many) reference field
/// shapes, returning the cardinality and `T`.
fn reference_target(ty: &Type) -> Option<(Cardinality, Type)> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    let cardinality = if segment.ident == "Option" {
        Cardinality::One
    } else if segment.ident == "Vec" {
        Cardinality::Many
    } else {
        return None;
    };
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let GenericArgument::Type(Type::Path(arc_path)) = args.args.first()? else {
        return None;
    };
    let arc_segment = arc_path.path.segments.last()?;
    if arc_segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(inner_args) = &arc_segment.arguments else {
        return None;
    };
    let GenericArgument::Type(inner) = inner_args.args.first()? else {
        return None;
    };
    Some((cardinality, inner.clone()))
}

fn emit_descriptor(
    table: &str,
    columns: &[ColumnField],
    references: &[ReferenceField],
) -> TokenStream2 {
    let column_entries = columns.iter().map(|c| {
        let column = &c.column;
        let pk = c.pk;
        let kind = match &c.kind {
            Some(k) => quote! { ::std::option::Option::Some(#k) },
            None => quote! { ::std::option::Option::None },
        };
        quote! {
            ::stitch_core::ColumnMeta { column: #column, kind: #kind, is_pk: #pk }
        }
    });
    let reference_entries = references.iter().map(|r| {
        let target = r.target.to_token_stream().to_string();
        let cardinality = match r.cardinality {
            Cardinality::One => quote! { ::stitch_core::Cardinality::One },
            Cardinality::Many => quote! { ::stitch_core::Cardinality::Many },
        };
        let fk_entries = r.fk.iter().map(|(local, foreign)| {
            quote! { ::stitch_core::FkPair { local: #local, foreign: #foreign } }
        });
        quote! {
            ::stitch_core::ReferenceMeta {
                target: #target,
                cardinality: #cardinality,
                fk: &[#(#fk_entries),*],
            }
        }
    });
    quote! {
        static COLUMNS: &[::stitch_core::ColumnMeta] = &[#(#column_entries),*];
        static REFERENCES: &[::stitch_core::ReferenceMeta] = &[#(#reference_entries),*];
        static DESCRIPTOR: ::stitch_core::EntityDescriptor = ::stitch_core::EntityDescriptor {
            table: #table,
            columns: COLUMNS,
            references: REFERENCES,
        };
    }
}

fn emit_fill(
    table: &str,
    ident: &syn::Ident,
    columns: &[ColumnField],
    references: &[ReferenceField],
) -> TokenStream2 {
    let column_binds = columns.iter().map(|c| {
        let field = &c.ident;
        let qualified = format!("{table}.{}", c.column);
        let bind = match &c.kind {
            Some(kind) => quote! {
                {
                    let raw = row.get_column(#qualified).cloned().unwrap_or(::stitch_core::Value::Null);
                    let bound = match registry.get(#kind) {
                        ::std::option::Option::Some(k) => k.bind(&raw)?,
                        ::std::option::Option::None => ::std::option::Option::Some(raw),
                    };
                    match bound {
                        ::std::option::Option::Some(v) => ::stitch_core::AsValue::try_from_value(v)?,
                        ::std::option::Option::None => ::std::default::Default::default(),
                    }
                }
            },
            None => quote! {
                {
                    let raw = row.get_column(#qualified).cloned().unwrap_or(::stitch_core::Value::Null);
                    ::stitch_core::AsValue::try_from_value(raw)?
                }
            },
        };
        quote! { #field: #bind }
    });
    let reference_defaults = references.iter().map(|r| {
        let field = &r.ident;
        quote! { #field: ::std::default::Default::default() }
    });
    quote! {
        Ok(#ident {
            #(#column_binds,)*
            #(#reference_defaults,)*
        })
    }
}

fn emit_fill_references(entity_name: &str, references: &[ReferenceField], nested: bool) -> TokenStream2 {
    let calls = references.iter().map(|r| {
        let target = &r.target;
        let fk_valid = r.fk_valid;
        let fk_raw = &r.fk_raw;
        let validity_check = quote! {
            if !#fk_valid {
                return ::std::result::Result::Err(::stitch_core::Error::new(
                    ::stitch_core::MapperErrorKind::FkTagInvalid {
                        entity: #entity_name,
                        tag: #fk_raw,
                    },
                ));
            }
        };
        if nested {
            quote! {
                {
                    #validity_check
                    let child = <#target as ::stitch_core::MappedEntity>::fill(row, registry)?;
                    arena.dedupe_and_store(child).await?;
                }
            }
        } else {
            quote! {
                {
                    #validity_check
                    let child = <#target as ::stitch_core::MappedEntity>::fill(row, registry)?;
                    <#target as ::stitch_core::MappedEntity>::fill_nested_references(row, registry, arena).await?;
                    arena.dedupe_and_store(child).await?;
                }
            }
        }
    });
    quote! { #(#calls)* }
}

fn emit_pk_key(columns: &[ColumnField]) -> TokenStream2 {
    let pk_columns: Vec<&str> = columns
        .iter()
        .filter(|c| c.pk)
        .map(|c| c.column.as_str())
        .collect();
    if pk_columns.is_empty() {
        return quote! { ::stitch_core::PkKey::Undeclared };
    }
    quote! {
        let parts: ::std::vec::Vec<::stitch_core::Value> =
            ::std::vec![#(self.column_value(#pk_columns)),*];
        if parts.iter().all(::stitch_core::Value::is_canonical_zero) {
            ::stitch_core::PkKey::Empty
        } else {
            ::stitch_core::PkKey::Value(
                parts
                    .iter()
                    .map(::stitch_core::Value::to_key_string)
                    .collect::<::std::vec::Vec<_>>()
                    .join("\u{1}"),
            )
        }
    }
}

fn emit_column_value(columns: &[ColumnField]) -> TokenStream2 {
    let arms = columns.iter().map(|c| {
        let field = &c.ident;
        let column = &c.column;
        quote! { #column => ::stitch_core::AsValue::as_value(::std::clone::Clone::clone(&self.#field)) }
    });
    quote! {
        match column {
            #(#arms,)*
            _ => ::stitch_core::Value::Null,
        }
    }
}

/// Shared body for every entity's `wire_references`: the depth-2 cap is
/// enforced when rows are filled (a nested entity's own reference fields
/// are simply never filled from the row), not here, so matching against the
/// arena is identical regardless of how deep `Self` sits in the graph.
///
/// Fans reference fields out as independent concurrent tasks (spec.md §5's
/// "one sub-task per reference field" inner layer): each field's local `fk`
/// column values are read from `self` up front, then every field's lookup
/// and assignment runs as its own future, joined with
/// `stitch_core::join_wiring_futures`. Reading locals before building the
/// futures lets each future capture only its own field of `self` rather
/// than all of it, so the fields can be assigned concurrently.
fn emit_wire_references(columns: &[ColumnField], references: &[ReferenceField]) -> TokenStream2 {
    let kind_of = |column: &str| -> TokenStream2 {
        match columns.iter().find(|c| c.column == column).and_then(|c| c.kind.as_deref()) {
            Some(kind) => quote! { ::std::option::Option::Some(#kind) },
            None => quote! { ::std::option::Option::None },
        }
    };

    let mut locals_lets = Vec::new();
    let mut futures = Vec::new();
    for (i, r) in references.iter().enumerate() {
        let field = &r.ident;
        let target = &r.target;
        let locals_ident = syn::Ident::new(&format!("__wire_locals_{i}"), field.span());
        let local_entries = r.fk.iter().map(|(l, _)| {
            let kind = kind_of(l);
            quote! { (self.column_value(#l), #kind) }
        });
        locals_lets.push(quote! {
            let #locals_ident: ::std::vec::Vec<(::stitch_core::Value, ::std::option::Option<&str>)> =
                ::std::vec![#(#local_entries),*];
        });
        let foreigns = r.fk.iter().map(|(_, f)| f.as_str());
        let assign = match r.cardinality {
            Cardinality::One => quote! {
                self.#field = candidates.into_iter().find(|candidate| {
                    let foreigns: ::std::vec::Vec<::stitch_core::Value> =
                        [#(#foreigns),*].iter().copied().map(|c| candidate.column_value(c)).collect();
                    ::stitch_core::fk_matches(arena.registry(), &#locals_ident, &foreigns)
                });
            },
            Cardinality::Many => quote! {
                self.#field = candidates
                    .into_iter()
                    .filter(|candidate| {
                        let foreigns: ::std::vec::Vec<::stitch_core::Value> =
                            [#(#foreigns),*].iter().copied().map(|c| candidate.column_value(c)).collect();
                        ::stitch_core::fk_matches(arena.registry(), &#locals_ident, &foreigns)
                    })
                    .collect();
            },
        };
        futures.push(quote! {
            ::std::boxed::Box::pin(async move {
                arena.ensure_frozen::<#target>().await?;
                let candidates = arena.frozen_items::<#target>().await;
                #assign
                ::std::result::Result::Ok::<(), ::stitch_core::Error>(())
            }) as ::std::pin::Pin<::std::boxed::Box<dyn ::std::future::Future<Output = ::stitch_core::Result<()>> + ::std::marker::Send + '_>>
        });
    }
    quote! {
        #(#locals_lets)*
        ::stitch_core::join_wiring_futures(::std::vec![#(#futures),*]).await?;
    }
}
