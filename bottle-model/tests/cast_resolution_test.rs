use bottle_model::{
    merge_casts, resolve_casts, AutocastConfig, CastConfig, CastDirective, CastMap, CastOverrides, CastTarget,
    ColumnDescriptor, SemanticType,
};

fn column(name: &str, semantic_type: SemanticType) -> ColumnDescriptor {
    ColumnDescriptor::new(name, semantic_type)
}

#[test]
fn test_decimal_json_and_unknown_columns() {
    let columns = vec![
        column("amount", SemanticType::Decimal),
        column("meta", SemanticType::Json),
        column("note", SemanticType::Unknown),
    ];

    let casts = resolve_casts(&columns, &CastConfig::default());

    let mut expected = CastMap::new();
    expected.insert("amount".to_string(), CastDirective::Float);
    expected.insert("meta".to_string(), CastDirective::JsonAs(CastTarget::Array));
    assert_eq!(casts, expected);
    assert!(!casts.contains_key("note"));
}

#[test]
fn test_every_semantic_type_is_classified() {
    let config = CastConfig::default();
    let cases = [
        (SemanticType::Array, Some(CastDirective::ArrayAs(CastTarget::Array))),
        (SemanticType::SimpleArray, Some(CastDirective::ArrayAs(CastTarget::Array))),
        (SemanticType::Json, Some(CastDirective::JsonAs(CastTarget::Array))),
        (SemanticType::BigInt, Some(CastDirective::Integer)),
        (SemanticType::Integer, Some(CastDirective::Integer)),
        (SemanticType::SmallInt, Some(CastDirective::Integer)),
        (SemanticType::Boolean, Some(CastDirective::Boolean)),
        (SemanticType::DateTimeMutable, Some(CastDirective::DateTimeWithFormat("%Y-%m-%dT%H:%M:%S%:z".into()))),
        (SemanticType::DateTimeTzMutable, Some(CastDirective::DateTimeWithFormat("%Y-%m-%dT%H:%M:%S%:z".into()))),
        (SemanticType::DateTimeTzImmutable, Some(CastDirective::DateTimeWithFormat("%Y-%m-%dT%H:%M:%S%:z".into()))),
        (SemanticType::TimeMutable, Some(CastDirective::TimeWithFormat("%H:%M:%S".into()))),
        (SemanticType::TimeImmutable, Some(CastDirective::TimeWithFormat("%H:%M:%S".into()))),
        (SemanticType::DateMutable, Some(CastDirective::DateWithFormat("%Y-%m-%d".into()))),
        (SemanticType::DateImmutable, Some(CastDirective::DateWithFormat("%Y-%m-%d".into()))),
        (SemanticType::Decimal, Some(CastDirective::Float)),
        (SemanticType::Float, Some(CastDirective::Float)),
        (SemanticType::DateTimeImmutable, None),
        (SemanticType::String, None),
        (SemanticType::Text, None),
        (SemanticType::Binary, None),
        (SemanticType::Guid, None),
        (SemanticType::Unknown, None),
    ];

    for (semantic_type, expected) in cases {
        assert_eq!(CastDirective::for_semantic_type(semantic_type, &config), expected, "{:?}", semantic_type);
    }
}

#[test]
fn test_resolution_ignores_column_order() {
    let columns = vec![
        column("id", SemanticType::BigInt),
        column("active", SemanticType::Boolean),
        column("published_at", SemanticType::DateTimeMutable),
        column("tags", SemanticType::SimpleArray),
        column("title", SemanticType::String),
    ];
    let mut reversed = columns.clone();
    reversed.reverse();

    let config = CastConfig::default();
    let forward = resolve_casts(&columns, &config);
    let backward = resolve_casts(&reversed, &config);

    assert_eq!(forward, backward);
    assert_eq!(forward.keys().collect::<Vec<_>>(), vec!["active", "id", "published_at", "tags"]);
}

#[test]
fn test_manual_casts_win() {
    let columns = vec![column("price", SemanticType::Decimal), column("flags", SemanticType::Json)];
    let auto = resolve_casts(&columns, &CastConfig::default());

    let mut manual = CastMap::new();
    manual.insert("price".to_string(), CastDirective::Custom("decimal:2".to_string()));
    manual.insert("slug".to_string(), CastDirective::Custom("string".to_string()));

    let merged = merge_casts(&auto, manual);

    assert_eq!(merged["price"], CastDirective::Custom("decimal:2".to_string()));
    assert_eq!(merged["flags"], CastDirective::JsonAs(CastTarget::Array));
    assert_eq!(merged["slug"], CastDirective::Custom("string".to_string()));
}

#[test]
fn test_config_precedence() {
    let global = AutocastConfig::from_toml_str(
        r#"
        [autocasting]
        json = "object"

        [autocasting.formats]
        date = "%d/%m/%Y"
        time = "%H:%M"
        "#,
    )
    .unwrap();

    let overrides = CastOverrides {
        autocast_date_format: Some("%Y%m%d".to_string()),
        autocast_array_to: Some(CastTarget::Object),
        ..CastOverrides::default()
    };

    let config = CastConfig::resolve(&global, &overrides);

    assert_eq!(config.array_cast_target, CastTarget::Object);
    assert_eq!(config.json_cast_target, CastTarget::Object);
    assert_eq!(config.date_format, "%Y%m%d");
    assert_eq!(config.time_format, "%H:%M");
    assert_eq!(config.datetime_format, "%Y-%m-%dT%H:%M:%S%:z");

    let columns = vec![column("tags", SemanticType::Array), column("opens_at", SemanticType::TimeMutable)];
    let casts = resolve_casts(&columns, &config);
    assert_eq!(casts["tags"], CastDirective::ArrayAs(CastTarget::Object));
    assert_eq!(casts["opens_at"], CastDirective::TimeWithFormat("%H:%M".to_string()));
}

#[test]
fn test_cast_string_forms() {
    assert_eq!(CastDirective::Integer.to_string(), "integer");
    assert_eq!(CastDirective::Boolean.to_string(), "bool");
    assert_eq!(CastDirective::Float.to_string(), "float");
    assert_eq!(CastDirective::JsonAs(CastTarget::Object).to_string(), "object");
    assert_eq!(CastDirective::ArrayAs(CastTarget::Array).to_string(), "array");
    assert_eq!(CastDirective::DateWithFormat("%Y-%m-%d".into()).to_string(), "date:%Y-%m-%d");
    assert_eq!(CastDirective::TimeWithFormat("%H:%M:%S".into()).to_string(), "datetime:%H:%M:%S");
}

#[test]
fn test_sql_type_classification() {
    let cases = [
        ("BIGINT", SemanticType::BigInt),
        ("int", SemanticType::Integer),
        ("INT(11) UNSIGNED", SemanticType::Integer),
        ("smallint", SemanticType::SmallInt),
        ("tinyint(1)", SemanticType::Boolean),
        ("tinyint(4)", SemanticType::SmallInt),
        ("BOOLEAN", SemanticType::Boolean),
        ("DECIMAL(10,2)", SemanticType::Decimal),
        ("double precision", SemanticType::Float),
        ("jsonb", SemanticType::Json),
        ("integer[]", SemanticType::Array),
        ("ARRAY", SemanticType::Array),
        ("DATETIME", SemanticType::DateTimeMutable),
        ("timestamp with time zone", SemanticType::DateTimeTzMutable),
        ("DATE", SemanticType::DateMutable),
        ("time without time zone", SemanticType::TimeMutable),
        ("VARCHAR(255)", SemanticType::String),
        ("uuid", SemanticType::Guid),
        ("", SemanticType::Unknown),
        ("geometry", SemanticType::Unknown),
    ];

    for (sql_type, expected) in cases {
        assert_eq!(SemanticType::from_sql_type(sql_type), expected, "{}", sql_type);
    }
}
