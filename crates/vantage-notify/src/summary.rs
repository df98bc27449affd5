//! Plain-text summary rendering, grounded on
//! `original_source/src/notifications/telegram.py`'s `notify_daily_summary`/
//! `notify_sell_signals` message bodies — same line shape, Markdown emphasis kept.

use chrono::NaiveDate;
use vantage_schemas::{SellSignal, StockPick, TradeResult};

const MARKET_SUMMARY_TRUNCATE: usize = 200;

pub fn format_daily_summary(
    run_date: NaiveDate,
    strategy_tag: &str,
    insider_count: u32,
    picks: &[StockPick],
    filled: &[TradeResult],
    failed: &[TradeResult],
    confidence: f64,
    market_summary: &str,
) -> String {
    let mut lines = vec![
        format!("*Daily Summary ({strategy_tag}) - {run_date}*"),
        format!("Insider candidates: {insider_count}"),
        format!("Picks: {} | Filled: {} | Failed: {}", picks.len(), filled.len(), failed.len()),
        format!("Confidence: {confidence:.2}"),
    ];
    if !market_summary.is_empty() {
        let truncated: String = market_summary.chars().take(MARKET_SUMMARY_TRUNCATE).collect();
        lines.push(format!("_{truncated}_"));
    }
    if !filled.is_empty() {
        let tickers = filled.iter().map(|t| t.ticker.as_str()).collect::<Vec<_>>().join(", ");
        lines.push(format!("Bought: {tickers}"));
    }
    lines.join("\n")
}

pub fn format_sell_signals(run_date: NaiveDate, executed: &[(SellSignal, TradeResult)]) -> Option<String> {
    if executed.is_empty() {
        return None;
    }
    let mut lines = vec![format!("*Sell Triggers - {run_date}*")];
    for (signal, _result) in executed {
        let pnl = signal.return_pct;
        let pnl_str = if pnl >= rust_decimal::Decimal::ZERO { format!("+{pnl:.1}%") } else { format!("{pnl:.1}%") };
        lines.push(format!("  {}: {} ({pnl_str})", signal.ticker, signal.reasoning));
    }
    Some(lines.join("\n"))
}

pub fn format_error(run_date: NaiveDate, stage: &str, error: &str) -> String {
    format!("*Error - {run_date}*\nStage: {stage}\n{error}")
}
