//! TennisArb — Arb Detector
//! Sloučí odds ze všech geo variant, najde nejlepší cenu na každou stranu
//! a spočítá sázky + profit. Fáze 1: OBSERVE only, loguje a alertuje.

pub mod engine;
pub mod report;

pub use engine::{evaluate, ArbOutcome, ArbResult, NoArbReason};
pub use report::{ArbOpportunity, CycleReport, MatchReport, MatchVerdict, TournamentReport, NO_ODDS_MARKER};

use feed_parser::{Match, Tournament};
use logger::{now_iso, ArbOpportunityEvent, ArbSkippedEvent, EventLogger, OddsMissingEvent};
use odds::OddsSnapshot;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Merge + evaluate one match. Pure; a match without usable odds still
/// yields a report carrying the odds-error marker.
pub fn assess_match(
    tournament:     &Tournament,
    m:              &Match,
    snapshots:      &[OddsSnapshot],
    capital:        f64,
    min_profit_pct: f64,
) -> MatchReport {
    let merged = odds::merge(snapshots);
    if merged.is_empty() {
        let verdict = MatchVerdict::NoOdds { odds_error: NO_ODDS_MARKER.to_string() };
        return MatchReport::new(m, verdict);
    }

    let verdict = match evaluate(&merged.quotes, capital, min_profit_pct) {
        ArbOutcome::Found(result) => MatchVerdict::Arb {
            opportunity: report::attach_bookmakers(tournament, m, result, &merged),
            odds:        merged.quotes,
        },
        ArbOutcome::NoArb(reason) => MatchVerdict::NoArb { odds: merged.quotes, reason },
    };
    MatchReport::new(m, verdict)
}

pub struct ArbDetector {
    events:         EventLogger,
    arbs:           EventLogger,
    min_profit_pct: f64,
}

impl ArbDetector {
    pub fn new(log_dir: impl Into<PathBuf>, min_profit_pct: f64) -> Self {
        let dir = log_dir.into();
        Self {
            events: EventLogger::new(&dir),
            arbs:   EventLogger::stream(&dir, "arb"),
            min_profit_pct,
        }
    }

    pub fn min_profit_pct(&self) -> f64 {
        self.min_profit_pct
    }

    pub fn assess(
        &self,
        tournament: &Tournament,
        m:          &Match,
        snapshots:  &[OddsSnapshot],
        capital:    f64,
    ) -> MatchReport {
        assess_match(tournament, m, snapshots, capital, self.min_profit_pct)
    }

    /// Persist the verdict. Returns the event to push to Telegram when an
    /// opportunity was found.
    pub fn record(&self, sport: &str, report: &MatchReport) -> Option<ArbOpportunityEvent> {
        match &report.verdict {
            MatchVerdict::NoOdds { odds_error } => {
                warn!("{}: {}", report.match_id, odds_error);
                let ev = OddsMissingEvent {
                    ts:       now_iso(),
                    event:    "ODDS_MISSING",
                    match_id: report.match_id.clone(),
                    home:     report.home_player.clone(),
                    away:     report.away_player.clone(),
                    reason:   odds_error.clone(),
                };
                if let Err(e) = self.events.log(&ev) {
                    warn!("Log write failed: {e}");
                }
                None
            }
            MatchVerdict::NoArb { reason: NoArbReason::BelowThreshold { profit_pct, min_profit_pct }, .. } => {
                info!("Skipped arb for {}: {}", report.match_id, report.verdict_reason());
                let ev = ArbSkippedEvent {
                    ts:             now_iso(),
                    event:          "ARB_SKIPPED",
                    match_id:       report.match_id.clone(),
                    home:           report.home_player.clone(),
                    away:           report.away_player.clone(),
                    profit_pct:     *profit_pct,
                    min_profit_pct: *min_profit_pct,
                };
                if let Err(e) = self.events.log(&ev) {
                    warn!("Log write failed: {e}");
                }
                None
            }
            MatchVerdict::NoArb { reason, .. } => {
                debug!("{} {} vs {}: {}", report.match_id, report.home_player, report.away_player, reason);
                None
            }
            MatchVerdict::Arb { opportunity, .. } => {
                let ev = opportunity_event(sport, opportunity);
                info!(
                    profit = format!("{:.2}%", ev.profit_pct),
                    home = format!("{} @ {}", ev.home_bookmaker, ev.home_odds),
                    away = format!("{} @ {}", ev.away_bookmaker, ev.away_odds),
                    "{} vs {} — arb found",
                    ev.home, ev.away
                );
                if let Err(e) = self.arbs.log(&ev) {
                    warn!("Arb log write failed: {e}");
                }
                Some(ev)
            }
        }
    }
}

pub fn opportunity_event(sport: &str, opp: &ArbOpportunity) -> ArbOpportunityEvent {
    let r = &opp.result;
    ArbOpportunityEvent {
        ts:                 now_iso(),
        event:              "ARB_OPPORTUNITY",
        sport:              sport.to_string(),
        tournament_id:      opp.tournament_id.clone(),
        tournament:         opp.tournament_name.clone(),
        match_id:           opp.match_id.clone(),
        home:               opp.home_player.clone(),
        away:               opp.away_player.clone(),
        start_time:         opp.start_time.clone(),
        home_odds:          r.home_odds,
        away_odds:          r.away_odds,
        home_bookmaker_id:  r.home_bookmaker_id.clone(),
        away_bookmaker_id:  r.away_bookmaker_id.clone(),
        home_bookmaker:     opp.home_bookmaker_name().to_string(),
        away_bookmaker:     opp.away_bookmaker_name().to_string(),
        stake_home:         r.stake_home,
        stake_away:         r.stake_away,
        profit_amount:      r.profit_amount,
        profit_pct:         r.profit_percentage,
        total_implied_prob: r.total_implied_prob,
    }
}
