//! Derive macro for typed table descriptors.
//!
//! This crate provides `#[derive(Table)]`, which turns a row struct into a
//! descriptor holding one typed column per field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Lit,
    Meta, PathArguments, Type,
};

/// Derives a table descriptor for a row struct.
///
/// # Attributes
///
/// - `#[table(name = "Invoice")]` - SQL table name (defaults to the struct
///   name)
/// - `#[table(schema = "dbo")]` - SQL schema name
/// - `#[table(enclose)]` - always quote the table name
///
/// # Field Attributes
///
/// - `#[column(name = "InvoiceId")]` - SQL column name (defaults to the field
///   name in PascalCase)
/// - `#[column(primary_key)]` - marks the primary key
/// - `#[column(nullable)]` - the column may hold `NULL` even though the field
///   is not an `Option`; `NULL` reads yield the type's default
/// - `#[column(enclose)]` - always quote the column name
///
/// `Option<T>` fields become `NullableColumn<T>`; all others `Column<T>`.
///
/// # Generated Items
///
/// For a struct `Invoice`, this macro generates `InvoiceTable` with:
///
/// - a public typed column field per struct field
/// - `new()` (a fresh instance with its own alias) and `instance()`
///   (a shared process-wide instance)
/// - `read_row(&self, row)` decoding one `Invoice`
/// - a `TableDef` implementation carrying `NAME`, `SCHEMA`, `COLUMNS` and
///   `PRIMARY_KEY`
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_attrs = parse_table_attrs(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;
        let column_name = column_attrs
            .name
            .unwrap_or_else(|| to_pascal_case(&field_name.to_string()));
        if column_name.is_empty() {
            return Err(syn::Error::new_spanned(field, "column name must not be empty"));
        }
        let (value_type, optional) = match option_inner(&field.ty) {
            Some(inner) => (inner.clone(), true),
            None => (field.ty.clone(), false),
        };

        column_infos.push(ColumnInfo {
            field_name: field_name.clone(),
            value_type,
            optional,
            column_name,
            is_primary_key: column_attrs.primary_key,
            is_nullable: optional || column_attrs.nullable,
            enclose: column_attrs.enclose,
        });
    }

    if column_infos.iter().filter(|c| c.is_primary_key).count() > 1 {
        return Err(syn::Error::new_spanned(
            &input,
            "at most one field can be marked #[column(primary_key)]",
        ));
    }

    let table_struct_name = format_ident!("{}Table", struct_name);
    let table_name = &table_attrs.name;
    let table_enclose = table_attrs.enclose;
    let schema_tokens = match &table_attrs.schema {
        Some(schema) => quote! { Some(#schema) },
        None => quote! { None },
    };

    let column_fields: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let value_type = &info.value_type;
            let doc = format!("The `{}` column.", info.column_name);
            if info.is_nullable {
                quote! {
                    #[doc = #doc]
                    pub #field_name: ::oxide_query_core::schema::NullableColumn<#value_type>
                }
            } else {
                quote! {
                    #[doc = #doc]
                    pub #field_name: ::oxide_query_core::schema::Column<#value_type>
                }
            }
        })
        .collect();

    let column_inits: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            let constructor = if info.is_nullable {
                quote! { nullable_column }
            } else {
                quote! { column }
            };
            let enclose = if info.enclose {
                quote! { .enclose() }
            } else {
                quote! {}
            };
            quote! {
                #field_name: table.#constructor(#column_name)#enclose
            }
        })
        .collect();

    let row_reads: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let value_type = &info.value_type;
            if info.is_nullable && !info.optional {
                quote! {
                    #field_name: row.get(&self.#field_name)?.unwrap_or_else(
                        <#value_type as ::oxide_query_core::value::ColumnValue>::null_default,
                    )
                }
            } else {
                quote! { #field_name: row.get(&self.#field_name)? }
            }
        })
        .collect();

    let all_column_names: Vec<&str> = column_infos
        .iter()
        .map(|c| c.column_name.as_str())
        .collect();

    let primary_key_tokens = match column_infos.iter().find(|c| c.is_primary_key) {
        Some(pk) => {
            let name = &pk.column_name;
            quote! { Some(#name) }
        }
        None => quote! { None },
    };

    let expanded = quote! {
        /// Table descriptor generated by `#[derive(Table)]`.
        #[derive(Debug, Clone)]
        pub struct #table_struct_name {
            table: ::oxide_query_core::schema::Table,
            #(#column_fields,)*
        }

        impl #table_struct_name {
            /// Creates an instance with its own alias.
            #[must_use]
            pub fn new() -> Self {
                let table = ::oxide_query_core::schema::Table::__derived(
                    #schema_tokens,
                    #table_name,
                    #table_enclose,
                );
                Self {
                    #(#column_inits,)*
                    table,
                }
            }

            /// The shared process-wide instance.
            #[must_use]
            pub fn instance() -> &'static Self {
                static INSTANCE: ::std::sync::OnceLock<#table_struct_name> =
                    ::std::sync::OnceLock::new();
                INSTANCE.get_or_init(Self::new)
            }

            /// The table instance.
            #[must_use]
            pub fn table(&self) -> &::oxide_query_core::schema::Table {
                &self.table
            }

            /// Reads one row, in field declaration order.
            ///
            /// # Errors
            ///
            /// Returns the decode error of the first field that fails.
            pub fn read_row(
                &self,
                row: &mut ::oxide_query_core::decode::Row<'_>,
            ) -> ::std::result::Result<#struct_name, ::oxide_query_core::DecodeError> {
                ::std::result::Result::Ok(#struct_name {
                    #(#row_reads,)*
                })
            }
        }

        impl ::std::default::Default for #table_struct_name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::convert::AsRef<::oxide_query_core::schema::Table> for #table_struct_name {
            fn as_ref(&self) -> &::oxide_query_core::schema::Table {
                &self.table
            }
        }

        impl ::oxide_query_core::schema::TableDef for #table_struct_name {
            type Row = #struct_name;

            const NAME: &'static str = #table_name;
            const SCHEMA: ::std::option::Option<&'static str> = #schema_tokens;
            const COLUMNS: &'static [&'static str] = &[#(#all_column_names),*];
            const PRIMARY_KEY: ::std::option::Option<&'static str> = #primary_key_tokens;

            fn table(&self) -> &::oxide_query_core::schema::Table {
                &self.table
            }

            fn instance() -> &'static Self {
                #table_struct_name::instance()
            }

            fn fresh() -> Self {
                Self::new()
            }
        }
    };

    Ok(expanded)
}

struct ColumnInfo {
    field_name: Ident,
    value_type: Type,
    optional: bool,
    column_name: String,
    is_primary_key: bool,
    is_nullable: bool,
    enclose: bool,
}

struct TableAttrs {
    name: String,
    schema: Option<String>,
    enclose: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    enclose: bool,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn parse_table_attrs(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<TableAttrs> {
    let mut result = TableAttrs {
        name: struct_name.to_string(),
        schema: None,
        enclose: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("table") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let name = string_value(&meta)?;
                if name.is_empty() {
                    return Err(meta.error("table name must not be empty"));
                }
                result.name = name;
            } else if meta.path.is_ident("schema") {
                let schema = string_value(&meta)?;
                result.schema = Some(schema).filter(|s| !s.is_empty());
            } else if meta.path.is_ident("enclose") {
                result.enclose = true;
            } else {
                return Err(meta.error("unknown table attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("column") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                result.primary_key = true;
            } else if meta.path.is_ident("nullable") {
                result.nullable = true;
            } else if meta.path.is_ident("enclose") {
                result.enclose = true;
            } else if meta.path.is_ident("name") {
                result.name = Some(string_value(&meta)?);
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// `T` when `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
