use async_trait::async_trait;
use bottle_model::{
    Attributes, ColumnDescriptor, Error, HasCasts, HasDefaults, HasValidation, MemoryStore, Model, ModelContext,
    Registry, Rules, SchemaIntrospector, SemanticType, TableIdentity, ValidationReport,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Every call returns a different single column, `v1`, `v2`, ... Later
/// calls finish sooner, so the last call to start is the first to finish.
struct ChangingColumns {
    calls: Arc<AtomicUsize>,
    callers: usize,
}

#[async_trait]
impl SchemaIntrospector for ChangingColumns {
    async fn list_columns(&self, _table: &TableIdentity) -> Result<Vec<ColumnDescriptor>, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = (self.callers + 1 - call) as u64 * 20;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![ColumnDescriptor::new(format!("v{}", call), SemanticType::Integer)])
    }
}

#[derive(Model)]
struct Gauge;

impl HasDefaults for Gauge {}
impl HasCasts for Gauge {}
impl HasValidation for Gauge {}

fn accept_all(_: &Attributes, _: &Rules) -> ValidationReport {
    ValidationReport::passed()
}

#[tokio::test]
async fn test_concurrent_first_access_keeps_first_stored() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();

    let callers = 4;
    let calls = Arc::new(AtomicUsize::new(0));
    let introspector = ChangingColumns { calls: calls.clone(), callers };
    let ctx = ModelContext::new(introspector, MemoryStore::new(), accept_all)
        .with_registry(Arc::new(Registry::default()));

    let results = futures::future::join_all((0..callers).map(|_| ctx.columns::<Gauge>())).await;
    let results = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    // Every caller missed the cache, so every caller introspected.
    assert_eq!(calls.load(Ordering::SeqCst), callers);

    // The last call finished first; its columns are the ones everybody got.
    let first = &results[0];
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name(), format!("v{}", callers));
    for columns in &results {
        assert!(Arc::ptr_eq(first, columns));
    }

    let cached = ctx.columns::<Gauge>().await?;
    assert!(Arc::ptr_eq(first, &cached));
    assert_eq!(calls.load(Ordering::SeqCst), callers);
    Ok(())
}

#[tokio::test]
async fn test_auto_casts_follow_cached_columns() -> Result<(), Box<dyn std::error::Error>> {
    let calls = Arc::new(AtomicUsize::new(0));
    let introspector = ChangingColumns { calls: calls.clone(), callers: 1 };
    let registry = Arc::new(Registry::default());
    let ctx = ModelContext::new(introspector, MemoryStore::new(), accept_all).with_registry(registry.clone());

    let casts = ctx.casts::<Gauge>().await?;
    assert_eq!(casts.keys().collect::<Vec<_>>(), vec!["v1"]);

    let again = ctx.casts::<Gauge>().await?;
    assert_eq!(casts, again);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    registry.purge::<Gauge>();
    assert!(!registry.is_cached::<Gauge>());
    Ok(())
}
