//! Wires every concrete adapter into the trait objects the composition layer
//! (`vantage-supervisor`, `vantage-backtest`) depends on. Built once at process
//! start from `Settings`; commands borrow from it for the lifetime of one cycle.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use vantage_blacklist::BlacklistStore;
use vantage_broker_live::Trading212Broker;
use vantage_config::Settings;
use vantage_notify::{Notifier, TelegramNotifier};
use vantage_pipeline::tools::{ToolDefinition, ALLOWED_TOOLS};
use vantage_signals::{EnrichmentProvider, InsiderSource, NewsCircuitBreaker, NewsProvider, PoliticianSource};
use vantage_supervisor::MarketDataProvider;

use crate::adapters::{AnthropicGenerator, NewsApiProvider, NullInsiderSource, NullNewsProvider, NullPoliticianSource, YahooMarketData};

/// Anthropic model identifiers. The aggressive strategy uses the stronger/slower
/// tier since its tool-calling research branch already tolerates extra round-trips.
pub const CONSERVATIVE_MODEL: &str = "claude-3-5-haiku-20241022";
pub const AGGRESSIVE_MODEL: &str = "claude-sonnet-4-20250514";

pub struct AppContext {
    pub settings: Settings,
    pub broker: Trading212Broker,
    pub notifier: Arc<dyn Notifier>,
    pub market_data: Arc<dyn MarketDataProvider>,
    /// Same Yahoo adapter behind `market_data`, kept concrete so the backtest
    /// command can borrow it as `&dyn HistoricalMarketData` (a capability the
    /// trait-object form above doesn't expose).
    pub yahoo: Arc<YahooMarketData>,
    pub enrichment: Arc<dyn EnrichmentProvider>,
    pub primary_news: Arc<dyn NewsProvider>,
    pub fallback_news: Option<Arc<dyn NewsProvider>>,
    pub news_breaker: Arc<NewsCircuitBreaker>,
    pub insider_source: Arc<dyn InsiderSource>,
    pub politician_source: Option<Arc<dyn PoliticianSource>>,
    pub conservative_generator: AnthropicGenerator,
    pub aggressive_generator: AnthropicGenerator,
    pub blacklist: Mutex<BlacklistStore>,
}

impl AppContext {
    pub fn build(settings: Settings) -> Result<Self> {
        let yahoo = Arc::new(YahooMarketData::new());
        let market_data: Arc<dyn MarketDataProvider> = yahoo.clone();
        let enrichment: Arc<dyn EnrichmentProvider> = yahoo.clone();

        if settings.telegram_enabled && (settings.telegram_bot_token.is_none() || settings.telegram_chat_id.is_none()) {
            tracing::warn!("TELEGRAM_ENABLED is set but bot token or chat id is missing, notifications will be skipped");
        }
        let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
            settings.telegram_enabled,
            settings.telegram_bot_token.clone(),
            settings.telegram_chat_id.clone(),
        ));

        let primary_news: Arc<dyn NewsProvider> = match &settings.news_api_key {
            Some(key) if !key.is_empty() => Arc::new(NewsApiProvider::new(key.clone())),
            _ => {
                tracing::warn!("NEWS_API_KEY is not set, news enrichment will be unavailable");
                Arc::new(NullNewsProvider)
            }
        };

        let broker = Trading212Broker::new(
            settings.broker_api_key.clone(),
            settings.broker_base_url.clone(),
            settings.broker_demo_base_url.clone(),
        );

        let blacklist = BlacklistStore::load(settings.blacklist_file_path.clone());

        let conservative_generator = AnthropicGenerator::new(settings.llm_primary_api_key.clone());
        let aggressive_generator = AnthropicGenerator::new(settings.llm_aggressive_api_key.clone());
        let news_breaker = Arc::new(NewsCircuitBreaker::new(settings.news_circuit_breaker_cooldown_seconds));

        Ok(AppContext {
            settings,
            broker,
            notifier,
            market_data,
            yahoo,
            enrichment,
            primary_news,
            fallback_news: None,
            news_breaker,
            insider_source: Arc::new(NullInsiderSource),
            politician_source: Some(Arc::new(NullPoliticianSource)),
            conservative_generator,
            aggressive_generator,
            blacklist: Mutex::new(blacklist),
        })
    }

    /// Borrows the Yahoo adapter as `&dyn HistoricalMarketData`, for the backtest command only.
    pub fn market_data_historical(&self) -> &dyn vantage_backtest::HistoricalMarketData {
        self.yahoo.as_ref()
    }
}

/// Research branch tool catalogue, one entry per tool `SupervisorToolBackend`
/// (and `vantage-backtest`'s `HistoricalToolBackend`) knows how to dispatch —
/// every tool takes a single required `ticker` string, matching both backends'
/// shared `ticker_arg` helper.
pub fn research_tool_definitions() -> Vec<ToolDefinition> {
    ALLOWED_TOOLS
        .iter()
        .map(|name| ToolDefinition {
            name: name.to_string(),
            description: format!("Look up {name} for a single ticker symbol."),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": { "ticker": { "type": "string" } },
                "required": ["ticker"],
            }),
        })
        .collect()
}
