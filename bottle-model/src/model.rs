use heck::ToSnakeCase;

use crate::{
    cast::CastMap,
    config::CastOverrides,
    defaults::DefaultSpec,
    schema::TableIdentity,
    validation::Rules,
};

/// Static declarations of a model type: where its table lives and how it is
/// autocast.
///
/// This trait is typically implemented automatically via the
/// `#[derive(Model)]` macro.
///
/// # Example
///
/// ```rust,ignore
/// use bottle_model::Model;
///
/// #[derive(Model)]
/// #[model(table = "people", autocast_json_to = "object", hidden = "password")]
/// struct Person;
/// ```
pub trait Model: Send + Sync + 'static {
    /// The type's name, e.g. `BlogPost`.
    fn model_name() -> &'static str;

    /// Returns the table name associated with this model.
    /// Defaults to the snake_case plural of the model name (`BlogPost` ->
    /// `blog_posts`).
    fn table_name() -> String {
        table_name_for(Self::model_name())
    }

    /// Connection name, `None` for the default connection.
    fn connection_name() -> Option<&'static str> {
        None
    }

    /// Database name, `None` for the connection's default database.
    fn database_name() -> Option<&'static str> {
        None
    }

    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Autocasting settings that take precedence over the process-wide ones.
    fn autocast_overrides() -> CastOverrides {
        CastOverrides::default()
    }

    /// Attributes left out of array form.
    fn hidden() -> Vec<&'static str> {
        Vec::new()
    }

    /// When non-empty, the only attributes included in array form.
    fn visible() -> Vec<&'static str> {
        Vec::new()
    }

    fn table_identity() -> TableIdentity {
        TableIdentity {
            connection: Self::connection_name().map(String::from),
            database: Self::database_name().map(String::from),
            table: Self::table_name(),
        }
    }

    /// `database.table`, or the table name when no database is declared.
    fn qualified_table_name() -> String {
        Self::table_identity().qualified_name()
    }

    /// `table.primary_key`.
    fn qualified_primary_key_name() -> String {
        format!("{}.{}", Self::table_name(), Self::primary_key_name())
    }

    /// `database.table.primary_key`.
    ///
    /// Models do not know their connection's default database, so without a
    /// declared database this is the same as
    /// [`qualified_primary_key_name`](Model::qualified_primary_key_name).
    fn super_qualified_primary_key_name() -> String {
        format!("{}.{}", Self::qualified_table_name(), Self::primary_key_name())
    }
}

/// Declares the attributes a fresh record starts with.
pub trait HasDefaults {
    fn defaults() -> DefaultSpec {
        DefaultSpec::new()
    }
}

/// Declares manual casts. They override automatic casts on the same key.
pub trait HasCasts {
    fn casts() -> CastMap {
        CastMap::new()
    }
}

/// Declares the rules a record is validated against before it is saved.
pub trait HasValidation {
    fn rules() -> Rules {
        Rules::new()
    }
}

/// A model with every capability. Implemented for all qualifying types.
pub trait Entity: Model + HasDefaults + HasCasts + HasValidation {}

impl<T> Entity for T where T: Model + HasDefaults + HasCasts + HasValidation {}

/// Snake_case plural of a model name.
pub fn table_name_for(model_name: &str) -> String {
    let snake = model_name.strip_prefix("r#").unwrap_or(model_name).to_snake_case();
    pluralize(&snake)
}

fn pluralize(word: &str) -> String {
    const UNCHANGED: [&str; 6] = ["data", "media", "metadata", "news", "series", "species"];

    let last_word = word.rsplit('_').next().unwrap_or(word);
    if UNCHANGED.contains(&last_word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", stem);
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with('z') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{}es", word);
    }
    format!("{}s", word)
}
