use futures::future::BoxFuture;

use crate::{context::ModelContext, model::Entity, Result};

/// Type alias for boot tasks.
///
/// These tasks are closures that take a `ModelContext` and return a future.
pub type BootTask = Box<dyn Fn(ModelContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Model boot manager.
///
/// Introspects the table and resolves the automatic casts of every
/// registered model up front, in registration order, instead of on first
/// use.
pub struct Booter<'a> {
    pub(crate) ctx: &'a ModelContext,
    pub(crate) tasks: Vec<BootTask>,
}

impl<'a> Booter<'a> {
    /// Creates a new Booter bound to a context.
    pub fn new(ctx: &'a ModelContext) -> Self {
        Self { ctx, tasks: Vec::new() }
    }

    /// Registers a model for booting.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// ctx.booter()
    ///   .register::<User>()
    ///   .register::<Post>()
    ///   .run()
    ///   .await?;
    /// ```
    pub fn register<M: Entity>(mut self) -> Self {
        let task = Box::new(|ctx: ModelContext| -> BoxFuture<'static, Result<()>> {
            Box::pin(async move {
                ctx.casts::<M>().await?;
                Ok(())
            })
        });
        self.tasks.push(task);
        self
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Executes all boot tasks, stopping at the first failure.
    pub async fn run(self) -> Result<ModelContext> {
        for task in self.tasks {
            (task)(self.ctx.clone()).await?;
        }
        Ok(self.ctx.clone())
    }
}
