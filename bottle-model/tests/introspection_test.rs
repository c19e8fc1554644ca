use bottle_model::{
    Attributes, CastDirective, CastMap, CastTarget, Database, HasCasts, HasDefaults, HasValidation, MemoryStore,
    Model, ModelContext, Registry, Rules, SchemaIntrospector, SemanticType, TableIdentity, ValidationReport,
};
use std::sync::Arc;

#[derive(Model)]
#[model(autocast_json_to = "object", autocast_date_format = "%d.%m.%Y")]
struct Invoice;

impl HasDefaults for Invoice {}
impl HasCasts for Invoice {
    fn casts() -> CastMap {
        let mut casts = CastMap::new();
        casts.insert("total".to_string(), CastDirective::Custom("decimal:2".to_string()));
        casts
    }
}
impl HasValidation for Invoice {}

#[derive(Model)]
#[model(table = "invoices")]
struct InvoiceView;

impl HasDefaults for InvoiceView {}
impl HasCasts for InvoiceView {}
impl HasValidation for InvoiceView {}

async fn setup() -> Result<Database, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();

    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.raw(
        "CREATE TABLE invoices (
            id BIGINT PRIMARY KEY,
            number VARCHAR(32) NOT NULL,
            paid BOOLEAN,
            total DECIMAL(10,2),
            lines JSON,
            issued_on DATE,
            sent_at DATETIME,
            due_time TIME,
            notes TEXT,
            shape GEOMETRY
        )",
    )
    .execute()
    .await?;
    Ok(db)
}

fn accept_all(_: &Attributes, _: &Rules) -> ValidationReport {
    ValidationReport::passed()
}

#[tokio::test]
async fn test_sqlite_columns_are_classified() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    assert!(db.table_exists("invoices").await?);
    assert!(!db.table_exists("payments").await?);

    let columns = db.list_columns(&TableIdentity::new("invoices")).await?;
    let described: Vec<(&str, SemanticType)> = columns.iter().map(|c| (c.name(), c.semantic_type())).collect();

    assert_eq!(
        described,
        vec![
            ("id", SemanticType::BigInt),
            ("number", SemanticType::String),
            ("paid", SemanticType::Boolean),
            ("total", SemanticType::Decimal),
            ("lines", SemanticType::Json),
            ("issued_on", SemanticType::DateMutable),
            ("sent_at", SemanticType::DateTimeMutable),
            ("due_time", SemanticType::TimeMutable),
            ("notes", SemanticType::Text),
            ("shape", SemanticType::Unknown),
        ]
    );

    let names = db.get_table_columns("invoices").await?;
    assert_eq!(names.len(), 10);
    assert_eq!(names[0], "id");
    Ok(())
}

#[tokio::test]
async fn test_casts_resolve_from_database() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let ctx = ModelContext::new(db, MemoryStore::new(), accept_all).with_registry(Arc::new(Registry::default()));

    let casts = ctx.casts::<Invoice>().await?;

    assert_eq!(casts["id"], CastDirective::Integer);
    assert_eq!(casts["paid"], CastDirective::Boolean);
    assert_eq!(casts["total"], CastDirective::Custom("decimal:2".to_string()));
    assert_eq!(casts["lines"], CastDirective::JsonAs(CastTarget::Object));
    assert_eq!(casts["issued_on"], CastDirective::DateWithFormat("%d.%m.%Y".to_string()));
    assert_eq!(casts["sent_at"], CastDirective::DateTimeWithFormat("%Y-%m-%dT%H:%M:%S%:z".to_string()));
    assert_eq!(casts["due_time"], CastDirective::TimeWithFormat("%H:%M:%S".to_string()));
    assert!(!casts.contains_key("number"));
    assert!(!casts.contains_key("notes"));
    assert!(!casts.contains_key("shape"));

    // Same table, different model: its own overrides and no manual casts.
    let view_casts = ctx.casts::<InvoiceView>().await?;
    assert_eq!(view_casts["total"], CastDirective::Float);
    assert_eq!(view_casts["lines"], CastDirective::JsonAs(CastTarget::Array));
    Ok(())
}

#[tokio::test]
async fn test_columns_are_cached_until_purged() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let registry = Arc::new(Registry::default());
    let ctx = ModelContext::new(db.clone(), MemoryStore::new(), accept_all).with_registry(registry.clone());

    assert!(!registry.is_cached::<Invoice>());
    assert_eq!(ctx.column_names::<Invoice>().await?.len(), 10);
    assert!(registry.is_cached::<Invoice>());

    db.raw("ALTER TABLE invoices ADD COLUMN archived BOOLEAN").execute().await?;

    assert_eq!(ctx.column_names::<Invoice>().await?.len(), 10);
    assert!(ctx.column::<Invoice>("archived").await?.is_none());
    assert!(!ctx.casts::<Invoice>().await?.contains_key("archived"));

    registry.purge::<Invoice>();
    assert!(!registry.is_cached::<Invoice>());

    assert_eq!(ctx.column_names::<Invoice>().await?.len(), 11);
    let archived = ctx.column::<Invoice>("archived").await?.expect("archived column");
    assert_eq!(archived.semantic_type(), SemanticType::Boolean);
    assert_eq!(ctx.casts::<Invoice>().await?["archived"], CastDirective::Boolean);
    Ok(())
}

#[tokio::test]
async fn test_booter_warms_caches() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let registry = Arc::new(Registry::default());
    let ctx = ModelContext::new(db, MemoryStore::new(), accept_all).with_registry(registry.clone());

    let booter = ctx.booter().register::<Invoice>().register::<InvoiceView>();
    assert_eq!(booter.len(), 2);
    booter.run().await?;

    assert!(registry.is_cached::<Invoice>());
    assert!(registry.is_cached::<InvoiceView>());
    Ok(())
}

#[tokio::test]
async fn test_missing_table_fails_boot() -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Model)]
    #[model(table = "missing", database = "nowhere")]
    struct Ghost;

    impl HasDefaults for Ghost {}
    impl HasCasts for Ghost {}
    impl HasValidation for Ghost {}

    let db = setup().await?;
    let ctx = ModelContext::new(db, MemoryStore::new(), accept_all).with_registry(Arc::new(Registry::default()));

    assert!(ctx.booter().register::<Ghost>().run().await.is_err());
    Ok(())
}

/// Declares itself an integer but refuses to encode.
struct Unencodable;

impl sqlx::Type<sqlx::Any> for Unencodable {
    fn type_info() -> sqlx::any::AnyTypeInfo {
        <i64 as sqlx::Type<sqlx::Any>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Any> for Unencodable {
    fn encode_by_ref(
        &self,
        _buf: &mut <sqlx::Any as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        Err("value cannot be encoded".into())
    }
}

#[tokio::test]
async fn test_raw_reports_bind_failure() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let result = db
        .raw("INSERT INTO invoices (id, number) VALUES (?, ?)")
        .bind(Unencodable)
        .bind("INV-1")
        .execute()
        .await;

    assert!(matches!(result, Err(bottle_model::Error::Database(sqlx::Error::Encode(_)))));
    assert!(db.get_table_columns("invoices").await?.contains(&"number".to_string()));

    let inserted = db.raw("INSERT INTO invoices (id, number) VALUES (?, ?)").bind(1_i64).bind("INV-1").execute().await?;
    assert_eq!(inserted, 1);
    Ok(())
}
