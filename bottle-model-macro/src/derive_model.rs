use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr};

/// Options collected from `#[model(...)]`.
#[derive(Default)]
struct ModelOptions {
    table: Option<LitStr>,
    connection: Option<LitStr>,
    database: Option<LitStr>,
    primary_key: Option<LitStr>,
    array_to: Option<TokenStream>,
    json_to: Option<TokenStream>,
    datetime_format: Option<LitStr>,
    date_format: Option<LitStr>,
    time_format: Option<LitStr>,
    hidden: Vec<LitStr>,
    visible: Vec<LitStr>,
}

/// Maps a cast target literal to its `CastTarget` variant.
fn cast_target(value: &LitStr) -> syn::Result<TokenStream> {
    match value.value().as_str() {
        "array" => Ok(quote! { bottle_model::CastTarget::Array }),
        "object" => Ok(quote! { bottle_model::CastTarget::Object }),
        other => Err(syn::Error::new(
            value.span(),
            format!("unknown cast target `{}`, expected \"array\" or \"object\"", other),
        )),
    }
}

fn parse_options(ast: &DeriveInput) -> syn::Result<ModelOptions> {
    let mut options = ModelOptions::default();

    for attr in &ast.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let value: LitStr = meta.value()?.parse()?;

            if meta.path.is_ident("table") {
                options.table = Some(value);
            } else if meta.path.is_ident("connection") {
                options.connection = Some(value);
            } else if meta.path.is_ident("database") {
                options.database = Some(value);
            } else if meta.path.is_ident("primary_key") {
                options.primary_key = Some(value);
            } else if meta.path.is_ident("autocast_array_to") {
                options.array_to = Some(cast_target(&value)?);
            } else if meta.path.is_ident("autocast_json_to") {
                options.json_to = Some(cast_target(&value)?);
            } else if meta.path.is_ident("autocast_datetime_format") {
                options.datetime_format = Some(value);
            } else if meta.path.is_ident("autocast_date_format") {
                options.date_format = Some(value);
            } else if meta.path.is_ident("autocast_time_format") {
                options.time_format = Some(value);
            } else if meta.path.is_ident("hidden") {
                options.hidden.push(value);
            } else if meta.path.is_ident("visible") {
                options.visible.push(value);
            } else {
                return Err(meta.error("unsupported model attribute"));
            }

            Ok(())
        })?;
    }

    Ok(options)
}

fn optional<T: quote::ToTokens>(value: &Option<T>) -> TokenStream {
    match value {
        Some(value) => quote! { Some(#value) },
        None => quote! { None },
    }
}

fn optional_string(value: &Option<LitStr>) -> TokenStream {
    match value {
        Some(value) => quote! { Some(String::from(#value)) },
        None => quote! { None },
    }
}

/// Expands the `#[derive(Model)]` macro.
///
/// Only the declarations present in `#[model(...)]` are generated; every
/// other method keeps the trait's default.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let options = parse_options(&ast)?;
    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let table_fn = options.table.as_ref().map(|table| {
        quote! {
            fn table_name() -> String {
                String::from(#table)
            }
        }
    });

    let connection_fn = options.connection.as_ref().map(|connection| {
        quote! {
            fn connection_name() -> Option<&'static str> {
                Some(#connection)
            }
        }
    });

    let database_fn = options.database.as_ref().map(|database| {
        quote! {
            fn database_name() -> Option<&'static str> {
                Some(#database)
            }
        }
    });

    let primary_key_fn = options.primary_key.as_ref().map(|primary_key| {
        quote! {
            fn primary_key_name() -> &'static str {
                #primary_key
            }
        }
    });

    let array_to = optional(&options.array_to);
    let json_to = optional(&options.json_to);
    let datetime_format = optional_string(&options.datetime_format);
    let date_format = optional_string(&options.date_format);
    let time_format = optional_string(&options.time_format);
    let hidden = &options.hidden;
    let visible = &options.visible;

    Ok(quote! {
        impl #impl_generics bottle_model::Model for #struct_name #ty_generics #where_clause {
            fn model_name() -> &'static str {
                stringify!(#struct_name)
            }

            #table_fn
            #connection_fn
            #database_fn
            #primary_key_fn

            fn autocast_overrides() -> bottle_model::CastOverrides {
                bottle_model::CastOverrides {
                    autocast_array_to: #array_to,
                    autocast_json_to: #json_to,
                    autocast_datetime_format: #datetime_format,
                    autocast_date_format: #date_format,
                    autocast_time_format: #time_format,
                }
            }

            fn hidden() -> Vec<&'static str> {
                vec![#(#hidden),*]
            }

            fn visible() -> Vec<&'static str> {
                vec![#(#visible),*]
            }
        }
    })
}
