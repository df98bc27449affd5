//! Outbound notification boundary (§4.7 SPEC_FULL.md "Notifier boundary").
//! Out of scope for the decision core itself, but the core depends on the
//! `Notifier` trait, so it lives alongside the rest of the orchestrator crates.

pub mod notifier;
pub mod summary;
pub mod telegram;

pub use notifier::{NullNotifier, Notifier};
pub use summary::{format_daily_summary, format_error, format_sell_signals};
pub use telegram::TelegramNotifier;
