//! sqlx persistence for the Backtest Engine (§4.8, §6 SPEC_FULL.md: "the Backtest
//! Engine is the only module that talks to a database"). Grounded on
//! `mqk-db/src/lib.rs`'s `PgPoolOptions`-built pool, embedded `sqlx::migrate!`
//! migrations, and manual `Row`/`try_get` mapping (no derive macros) — adapted
//! here to back `vantage-backtest`'s `HistoricalDigestSource`/`BacktestStore`
//! ports instead of the teacher's OMS outbox/inbox/reconcile schema.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use vantage_backtest::{BacktestStore, HistoricalDigestSource};
use vantage_schemas::{BacktestRunStatus, DailyResult, EnrichedCandidate, SignalDigest, Source, SourceCounts};

pub const ENV_DB_URL: &str = "VANTAGE_DATABASE_URL";

pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    PgPoolOptions::new().max_connections(10).connect(&url).await.context("failed to connect to Postgres")
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.context("db migrate failed")?;
    Ok(())
}

fn status_as_str(status: BacktestRunStatus) -> &'static str {
    match status {
        BacktestRunStatus::Running => "running",
        BacktestRunStatus::Completed => "completed",
    }
}

fn parse_status(s: &str) -> Result<BacktestRunStatus> {
    match s {
        "running" => Ok(BacktestRunStatus::Running),
        "completed" => Ok(BacktestRunStatus::Completed),
        other => Err(anyhow!("invalid backtest run status: {other}")),
    }
}

pub struct PgBacktestStore {
    pool: PgPool,
}

impl PgBacktestStore {
    pub fn new(pool: PgPool) -> Self {
        PgBacktestStore { pool }
    }
}

#[async_trait]
impl BacktestStore for PgBacktestStore {
    async fn create_run(&self, name: &str, start_date: NaiveDate, end_date: NaiveDate) -> Result<i64> {
        let row = sqlx::query(
            r#"
            insert into backtest_runs (name, start_date, end_date)
            values ($1, $2, $3)
            returning id
            "#,
        )
        .bind(name)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await
        .context("create_run failed")?;

        row.try_get::<i64, _>("id").context("create_run: missing id")
    }

    async fn complete_run(&self, run_id: i64, status: BacktestRunStatus, notes: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            update backtest_runs
            set status = $1, notes = $2, completed_at = now()
            where id = $3
            "#,
        )
        .bind(status_as_str(status))
        .bind(notes)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .context("complete_run failed")?;

        Ok(())
    }

    async fn save_daily_result(&self, result: &DailyResult) -> Result<()> {
        let trades = serde_json::to_value(&result.trades).context("serializing daily result trades")?;

        sqlx::query(
            r#"
            insert into backtest_daily_results
              (run_id, trade_date, strategy_tag, is_real, invested, value, realized_pnl, unrealized_pnl, trades)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            on conflict (run_id, trade_date, strategy_tag) do update set
              is_real = excluded.is_real,
              invested = excluded.invested,
              value = excluded.value,
              realized_pnl = excluded.realized_pnl,
              unrealized_pnl = excluded.unrealized_pnl,
              trades = excluded.trades
            "#,
        )
        .bind(result.run_id)
        .bind(result.trade_date)
        .bind(&result.strategy_tag)
        .bind(result.is_real)
        .bind(result.invested)
        .bind(result.value)
        .bind(result.realized_pnl)
        .bind(result.unrealized_pnl)
        .bind(trades)
        .execute(&self.pool)
        .await
        .context("save_daily_result failed")?;

        Ok(())
    }
}

/// Reads `historical_sentiment` back into `SignalDigest`s. The table has no
/// Reddit-specific columns (DESIGN.md decision 5) — every row is a serialized
/// `EnrichedCandidate`, and `insider_count`/`source_counts` are recomputed from
/// the candidates themselves rather than stored.
pub struct PgDigestSource {
    pool: PgPool,
    lookback_days: i64,
}

impl PgDigestSource {
    pub fn new(pool: PgPool, lookback_days: i64) -> Self {
        PgDigestSource { pool, lookback_days }
    }
}

#[async_trait]
impl HistoricalDigestSource for PgDigestSource {
    async fn available_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        let rows = sqlx::query(
            r#"
            select distinct scrape_date
            from historical_sentiment
            where scrape_date between $1 and $2
            order by scrape_date
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("available_dates query failed")?;

        rows.into_iter().map(|row| row.try_get::<NaiveDate, _>("scrape_date").map_err(Into::into)).collect()
    }

    async fn digest_for_date(&self, date: NaiveDate, ticker_limit: usize) -> Result<SignalDigest> {
        let rows = sqlx::query(
            r#"
            select candidate
            from historical_sentiment
            where scrape_date = $1
            order by (candidate ->> 'conviction_score')::numeric desc
            limit $2
            "#,
        )
        .bind(date)
        .bind(ticker_limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("digest_for_date query failed")?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let value: serde_json::Value = row.try_get("candidate").context("missing candidate column")?;
            let candidate: EnrichedCandidate = serde_json::from_value(value).context("malformed stored candidate")?;
            candidates.push(candidate);
        }

        let mut source_counts = SourceCounts::default();
        for candidate in &candidates {
            match candidate.candidate.source {
                Source::Insider => source_counts.insider += 1,
                Source::Politicians => source_counts.politicians += 1,
                Source::InsiderAndPoliticians => source_counts.insider_and_politicians += 1,
            }
        }
        let insider_count = source_counts.insider + source_counts.insider_and_politicians;

        Ok(SignalDigest { candidates, insider_count, lookback_days: self.lookback_days, source_counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_its_string_form() {
        assert_eq!(parse_status(status_as_str(BacktestRunStatus::Running)).unwrap(), BacktestRunStatus::Running);
        assert_eq!(parse_status(status_as_str(BacktestRunStatus::Completed)).unwrap(), BacktestRunStatus::Completed);
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert!(parse_status("weird").is_err());
    }
}
