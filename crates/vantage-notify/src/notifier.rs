use async_trait::async_trait;

/// Best-effort outbound notification (§4.7 SPEC_FULL.md "Notifier boundary").
/// A `send` failure is logged by the caller and never escalated — this trait
/// carries no retry or queueing semantics of its own.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// A `Notifier` that drops every message, for when Telegram is not configured
/// at all and the caller would rather not branch on `Option<Box<dyn Notifier>>`.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
