//! File-backed, TTL'd ticker blacklist (§4.2 SPEC_FULL.md).
//!
//! A simple JSON-keyed document `ticker -> added_on`. Corrupt or missing files are
//! treated as an empty store, never a fatal error — matching the spec's explicit
//! "not fatal" requirement and the teacher's write-through-on-append convention
//! used elsewhere in this workspace for small local state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

pub struct BlacklistStore {
    path: PathBuf,
    entries: BTreeMap<String, NaiveDate>,
}

impl BlacklistStore {
    /// Reads the store at `path` once. A missing or malformed file is logged and
    /// treated as an empty store rather than propagated as an error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<BTreeMap<String, NaiveDate>>(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "blacklist file corrupt, treating as empty");
                BTreeMap::new()
            }),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "blacklist file missing, treating as empty");
                BTreeMap::new()
            }
        };
        BlacklistStore { path, entries }
    }

    /// Upserts today's date for every ticker, then persists. Write-through: the
    /// caller sees durable state before this returns.
    pub fn add_many(&mut self, tickers: impl IntoIterator<Item = impl Into<String>>, today: NaiveDate) -> Result<()> {
        for ticker in tickers {
            self.entries.insert(ticker.into(), today);
        }
        self.persist()
    }

    /// Entries where `today - added_on < ttl_days`.
    pub fn active_set(&self, ttl_days: i64, today: NaiveDate) -> std::collections::BTreeSet<String> {
        self.entries
            .iter()
            .filter(|(_, added_on)| (today - **added_on).num_days() < ttl_days)
            .map(|(ticker, _)| ticker.clone())
            .collect()
    }

    /// Drops expired entries and persists the smaller set.
    pub fn cleanup(&mut self, ttl_days: i64, today: NaiveDate) -> Result<()> {
        self.entries
            .retain(|_, added_on| (today - *added_on).num_days() < ttl_days);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create blacklist directory: {}", parent.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.entries).context("serialize blacklist")?;
        fs::write(&self.path, raw).with_context(|| format!("write blacklist: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_file_is_empty_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlacklistStore::load(dir.path().join("blacklist.json"));
        assert!(store.active_set(14, date(2026, 1, 1)).is_empty());
    }

    #[test]
    fn add_many_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.json");
        let mut store = BlacklistStore::load(&path);
        store.add_many(["AMD", "NVDA"], date(2026, 1, 1)).unwrap();

        let reloaded = BlacklistStore::load(&path);
        let active = reloaded.active_set(14, date(2026, 1, 1));
        assert!(active.contains("AMD"));
        assert!(active.contains("NVDA"));
    }

    #[test]
    fn active_set_respects_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BlacklistStore::load(dir.path().join("blacklist.json"));
        let added = date(2026, 1, 1);
        store.add_many(["AMD"], added).unwrap();

        let still_active = added.checked_add_days(Days::new(13)).unwrap();
        assert!(store.active_set(14, still_active).contains("AMD"));

        let expired = added.checked_add_days(Days::new(14)).unwrap();
        assert!(!store.active_set(14, expired).contains("AMD"));
    }

    #[test]
    fn cleanup_drops_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.json");
        let mut store = BlacklistStore::load(&path);
        store.add_many(["OLD"], date(2026, 1, 1)).unwrap();
        store.cleanup(14, date(2026, 2, 1)).unwrap();

        let reloaded = BlacklistStore::load(&path);
        assert!(reloaded.active_set(3650, date(2026, 2, 1)).is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.json");
        fs::write(&path, "not json").unwrap();
        let store = BlacklistStore::load(&path);
        assert!(store.active_set(14, date(2026, 1, 1)).is_empty());
    }
}
