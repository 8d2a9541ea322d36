//! Per-match / per-cycle output handed to the logger and notifier.

use feed_parser::{Match, SetScores, Tournament};
use odds::{BookmakerInfo, MergedOdds, OddsQuote, UNKNOWN_BOOKMAKER};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::{ArbResult, NoArbReason};

pub const NO_ODDS_MARKER: &str = "No valid odds data";

/// Opportunity with everything the notifier needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbOpportunity {
    pub tournament_id:   String,
    pub tournament_name: String,
    pub match_id:        String,
    pub home_player:     String,
    pub away_player:     String,
    pub start_time:      Option<String>,
    pub result:          ArbResult,
    pub home_bookmaker:  Option<BookmakerInfo>,
    pub away_bookmaker:  Option<BookmakerInfo>,
}

impl ArbOpportunity {
    pub fn home_bookmaker_name(&self) -> &str {
        self.home_bookmaker.as_ref().map(|b| b.name.as_str()).unwrap_or(UNKNOWN_BOOKMAKER)
    }

    pub fn away_bookmaker_name(&self) -> &str {
        self.away_bookmaker.as_ref().map(|b| b.name.as_str()).unwrap_or(UNKNOWN_BOOKMAKER)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchVerdict {
    /// No variant produced a usable quote.
    NoOdds { odds_error: String },
    NoArb { odds: Vec<OddsQuote>, reason: NoArbReason },
    Arb { odds: Vec<OddsQuote>, opportunity: ArbOpportunity },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub match_id:      String,
    pub home_player:   String,
    pub away_player:   String,
    pub start_time:    Option<String>,
    pub home_sets_won: Option<String>,
    pub away_sets_won: Option<String>,
    pub set_scores:    SetScores,
    pub verdict:       MatchVerdict,
}

impl MatchReport {
    pub(crate) fn new(m: &Match, verdict: MatchVerdict) -> Self {
        Self {
            match_id:      m.match_id.clone(),
            home_player:   m.home_player.label().to_string(),
            away_player:   m.away_player.label().to_string(),
            start_time:    m.start_time.clone(),
            home_sets_won: m.home_sets_won.clone(),
            away_sets_won: m.away_sets_won.clone(),
            set_scores:    m.set_scores.clone(),
            verdict,
        }
    }

    pub fn has_arbitrage(&self) -> bool {
        matches!(self.verdict, MatchVerdict::Arb { .. })
    }

    pub fn opportunity(&self) -> Option<&ArbOpportunity> {
        match &self.verdict {
            MatchVerdict::Arb { opportunity, .. } => Some(opportunity),
            _ => None,
        }
    }

    pub fn verdict_reason(&self) -> String {
        match &self.verdict {
            MatchVerdict::NoOdds { odds_error } => odds_error.clone(),
            MatchVerdict::NoArb { reason, .. } => reason.to_string(),
            MatchVerdict::Arb { .. } => "arbitrage".to_string(),
        }
    }

    pub fn odds(&self) -> &[OddsQuote] {
        match &self.verdict {
            MatchVerdict::NoOdds { .. } => &[],
            MatchVerdict::NoArb { odds, .. } | MatchVerdict::Arb { odds, .. } => odds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentReport {
    pub tournament_id:            String,
    pub tournament_name:          Option<String>,
    pub sport_name:               String,
    pub category:                 Option<String>,
    pub tournament_name_from_url: Option<String>,
    pub matches:                  Vec<MatchReport>,
}

impl TournamentReport {
    pub fn new(t: &Tournament) -> Self {
        Self {
            tournament_id:            t.tournament_id.clone(),
            tournament_name:          t.tournament_name.clone(),
            sport_name:               t.sport_name.clone(),
            category:                 t.category.clone(),
            tournament_name_from_url: t.tournament_name_from_url.clone(),
            matches:                  Vec::new(),
        }
    }
}

/// One polling cycle. `iteration_profit` is what the caller adds to its
/// running balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub tournaments:      Vec<TournamentReport>,
    pub metadata:         BTreeMap<String, String>,
    pub opportunities:    Vec<ArbOpportunity>,
    pub iteration_profit: f64,
}

impl CycleReport {
    pub fn new(metadata: BTreeMap<String, String>) -> Self {
        Self { metadata, ..Self::default() }
    }

    pub fn push_tournament(&mut self, report: TournamentReport) {
        for opp in report.matches.iter().filter_map(MatchReport::opportunity) {
            self.iteration_profit += opp.result.profit_amount;
            self.opportunities.push(opp.clone());
        }
        self.tournaments.push(report);
    }

    pub fn arb_count(&self) -> usize {
        self.opportunities.len()
    }

    pub fn match_count(&self) -> usize {
        self.tournaments.iter().map(|t| t.matches.len()).sum()
    }
}

/// Bookmaker descriptors for both winning sides.
pub(crate) fn attach_bookmakers(
    t: &Tournament,
    m: &Match,
    result: ArbResult,
    merged: &MergedOdds,
) -> ArbOpportunity {
    ArbOpportunity {
        tournament_id:   t.tournament_id.clone(),
        tournament_name: t.display_name().to_string(),
        match_id:        m.match_id.clone(),
        home_player:     m.home_player.label().to_string(),
        away_player:     m.away_player.label().to_string(),
        start_time:      m.start_time.clone(),
        home_bookmaker:  merged.bookmaker(&result.home_bookmaker_id).cloned(),
        away_bookmaker:  merged.bookmaker(&result.away_bookmaker_id).cloned(),
        result,
    }
}
