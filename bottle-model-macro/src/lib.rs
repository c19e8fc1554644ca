//! Procedural macros for bottle-model.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_model;

/// Derives `bottle_model::Model`.
///
/// Struct-level `#[model(...)]` keys, all optional:
///
/// - `table`, `connection`, `database`, `primary_key`: table identity.
/// - `autocast_array_to`, `autocast_json_to`: `"array"` or `"object"`.
/// - `autocast_datetime_format`, `autocast_date_format`,
///   `autocast_time_format`: chrono format patterns.
/// - `hidden`, `visible`: an attribute name; repeat the key for more.
#[proc_macro_derive(Model, attributes(model))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
