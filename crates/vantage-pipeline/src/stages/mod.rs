pub mod market;
pub mod research;
pub mod risk_review;
pub mod sentiment;
pub mod trader;

pub use trader::AnalysisInput;
