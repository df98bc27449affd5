use async_trait::async_trait;

/// One daily scheduled unit of work. Grounded on the collection/decision/EOD
/// jobs of `original_source/src/orchestrator/scheduler.py`, generalized away
/// from APScheduler's callback-registry into a plain trait.
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &str;
    async fn run(&self);
}
