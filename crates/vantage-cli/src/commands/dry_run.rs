//! `dry_run` — builds a digest and runs both strategies exactly like the
//! decision cycle, but never touches a broker or the blacklist: picks are
//! printed, never executed (§6 SPEC_FULL.md: "never place orders").

use anyhow::Result;
use rust_decimal::Decimal;
use vantage_pipeline::{run_both, AnalysisBranch, CancelSignal, StrategyConfig};
use vantage_schemas::PickAction;
use vantage_signals::build_digest;
use vantage_supervisor::{build_market_data, eur_usd_rate_or_fallback, SupervisorToolBackend};

use crate::context::{research_tool_definitions, AppContext, AGGRESSIVE_MODEL, CONSERVATIVE_MODEL};
use crate::jobs::digest_config;

pub async fn run(ctx: &AppContext, budget: Option<Decimal>, lookback_days: Option<i64>) -> Result<()> {
    let settings = &ctx.settings;
    let as_of = vantage_scheduler::today_in(settings.orchestrator_timezone);

    let mut cfg = digest_config(settings, as_of);
    if let Some(days) = lookback_days {
        cfg.insider_lookback_days = days;
    }

    let digest = build_digest(
        ctx.insider_source.as_ref(),
        ctx.politician_source.as_deref(),
        ctx.enrichment.clone(),
        ctx.primary_news.clone(),
        ctx.fallback_news.clone(),
        ctx.news_breaker.clone(),
        &cfg,
    )
    .await;

    println!("candidates={} insider_count={}", digest.candidates.len(), digest.insider_count);
    if digest.is_empty() {
        println!("digest is empty, nothing to preview");
        return Ok(());
    }

    let capped: Vec<_> = digest.candidates.iter().take(settings.research_top_n).cloned().collect();
    let market_data = build_market_data(&capped, ctx.market_data.as_ref()).await;
    let eur_usd_rate = eur_usd_rate_or_fallback(ctx.market_data.as_ref(), settings.eur_usd_static_fallback_rate).await;
    println!("eur_usd_rate={eur_usd_rate}");

    let tool_backend = SupervisorToolBackend::new(ctx.market_data.clone(), ctx.enrichment.clone(), as_of);
    let tool_executor = vantage_pipeline::tools::ToolExecutor::new(Box::new(tool_backend));
    let tool_definitions = research_tool_definitions();

    let preview_budget = budget.unwrap_or(settings.daily_budget_eur);

    let conservative = StrategyConfig {
        strategy_tag: "conservative",
        model: CONSERVATIVE_MODEL,
        structured: &ctx.conservative_generator,
        tool_calling: None,
        branch: AnalysisBranch::Market { market_data: &market_data },
        portfolio: &[],
        budget: preview_budget,
    };
    let aggressive = StrategyConfig {
        strategy_tag: "aggressive",
        model: AGGRESSIVE_MODEL,
        structured: &ctx.aggressive_generator,
        tool_calling: Some(&ctx.aggressive_generator),
        branch: AnalysisBranch::Research { tools: &tool_definitions, executor: &tool_executor, max_tool_rounds: settings.max_tool_rounds },
        portfolio: &[],
        budget: preview_budget,
    };

    let (conservative_result, aggressive_result) =
        run_both(&digest, conservative, aggressive, CancelSignal::new(), settings.pipeline_timeout()).await;

    for (tag, result) in [("conservative", conservative_result), ("aggressive", aggressive_result)] {
        match result {
            Ok(review) => {
                println!("--- {tag} ---");
                for pick in &review.picks {
                    if pick.action == PickAction::Buy {
                        println!(
                            "ticker={} allocation_pct={:.1} confidence={:.2} reasoning={}",
                            pick.ticker, pick.allocation_pct, pick.confidence, pick.reasoning
                        );
                    }
                }
            }
            Err(err) => println!("--- {tag} failed: {err:#} ---"),
        }
    }

    Ok(())
}
