pub mod anthropic;
pub mod news;
pub mod null_sources;
pub mod yahoo;

pub use anthropic::AnthropicGenerator;
pub use news::NewsApiProvider;
pub use null_sources::{NullInsiderSource, NullNewsProvider, NullPoliticianSource};
pub use yahoo::YahooMarketData;
