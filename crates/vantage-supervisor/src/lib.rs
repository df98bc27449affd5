//! Orchestration boundary (SPEC_FULL.md §4.7): wires the signal pipeline, the
//! research pipeline, the sell engine, the trade executor, and the blacklist
//! store into the three cycles a deployment schedules — the decision cycle, the
//! sell-check cycle, and the end-of-day snapshot. A pure composition layer: it
//! owns no concrete adapter, only trait objects supplied by its caller. Grounded
//! on `original_source/src/orchestrator/supervisor.py`.

pub mod decision_cycle;
pub mod eod;
pub mod error;
pub mod market_data;
pub mod sell_cycle;
pub mod tool_backend;

pub use decision_cycle::{
    DecisionCycleConfig, DecisionCycleOutcome, DecisionCyclePorts, StrategyCycleResult, StrategyOutcome, StrategyPorts,
};
pub use eod::{run_end_of_day, AccountSnapshot, PortfolioSnapshot, SnapshotSink};
pub use error::OrchestratorError;
pub use market_data::{build_market_data, eur_usd_rate_or_fallback, to_eur, Currency, MarketDataProvider, PriceQuote};
pub use sell_cycle::{run_sell_checks, AccountScope, SellCycleConfig, SellCycleOutcome};
pub use tool_backend::SupervisorToolBackend;
