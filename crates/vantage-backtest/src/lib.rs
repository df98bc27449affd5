pub mod engine;
pub mod ports;
pub mod tool_backend;

pub use engine::{run, BacktestPorts, BacktestReport, BacktestRunConfig, StrategySummary};
pub use ports::{BacktestStore, HistoricalDigestSource, HistoricalMarketData};
pub use tool_backend::HistoricalToolBackend;
