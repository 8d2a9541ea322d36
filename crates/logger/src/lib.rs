//! TennisArb — Logger
//! JSONL event stream (denní soubory), Telegram alerty

pub mod telegram;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use telegram::{format_arb_message, NotifyError, TelegramNotifier};

pub struct EventLogger {
    log_dir: PathBuf,
    /// File stem prefix: `events` → `events-2025-09-11.jsonl`.
    stream:  Option<String>,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir, stream: None }
    }

    /// Logger writing to its own daily file next to the main stream.
    pub fn stream(log_dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            stream: Some(name.to_string()),
            ..Self::new(log_dir)
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn current_path(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let file = match &self.stream {
            Some(name) => format!("{name}-{date}.jsonl"),
            None => format!("{date}.jsonl"),
        };
        self.log_dir.join(file)
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let path  = self.current_path();
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArbOpportunityEvent {
    pub ts:                 String,
    pub event:              &'static str,   // "ARB_OPPORTUNITY"
    pub sport:              String,
    pub tournament_id:      String,
    pub tournament:         String,
    pub match_id:           String,
    pub home:               String,
    pub away:               String,
    pub start_time:         Option<String>, // jak přišlo z feedu
    pub home_odds:          f64,
    pub away_odds:          f64,
    pub home_bookmaker_id:  String,
    pub away_bookmaker_id:  String,
    pub home_bookmaker:     String,
    pub away_bookmaker:     String,
    pub stake_home:         f64,
    pub stake_away:         f64,
    pub profit_amount:      f64,
    pub profit_pct:         f64,
    pub total_implied_prob: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArbSkippedEvent {
    pub ts:             String,
    pub event:          &'static str,   // "ARB_SKIPPED"
    pub match_id:       String,
    pub home:           String,
    pub away:           String,
    pub profit_pct:     f64,
    pub min_profit_pct: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OddsMissingEvent {
    pub ts:       String,
    pub event:    &'static str,   // "ODDS_MISSING"
    pub match_id: String,
    pub home:     String,
    pub away:     String,
    pub reason:   String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CycleSummaryEvent {
    pub ts:               String,
    pub event:            &'static str,   // "CYCLE_SUMMARY"
    pub tournaments:      usize,
    pub matches:          usize,
    pub arbs:             usize,
    pub iteration_profit: f64,
    pub balance:          f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tennis-arb-logger-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_log_appends_jsonl_lines() {
        let dir = scratch_dir("append");
        let logger = EventLogger::new(&dir);
        let ev = OddsMissingEvent {
            ts:       now_iso(),
            event:    "ODDS_MISSING",
            match_id: "m1".into(),
            home:     "Sinner J.".into(),
            away:     "Alcaraz C.".into(),
            reason:   "No valid odds data".into(),
        };
        logger.log(&ev).unwrap();
        logger.log(&ev).unwrap();

        let body = fs::read_to_string(logger.current_path()).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["event"], "ODDS_MISSING");
        assert_eq!(parsed["match_id"], "m1");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stream_gets_own_file() {
        let dir = scratch_dir("stream");
        let main = EventLogger::new(&dir);
        let arbs = EventLogger::stream(&dir, "arb");
        assert_ne!(main.current_path(), arbs.current_path());
        let name = arbs.current_path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("arb-") && name.ends_with(".jsonl"));
        fs::remove_dir_all(&dir).ok();
    }
}
