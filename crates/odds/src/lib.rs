//! TennisArb — Odds
//!
//! Bookmaker odds for one match: extraction from the odds query response
//! and merge across geo variants.

mod extract;
mod merge;

pub use extract::{extract, extract_bookmakers, extract_snapshot, ExtractError};
pub use merge::{merge, merge_quotes, MergedOdds};

use serde::Serialize;

/// Two-way full-time quote of one bookmaker. Both prices are finite and > 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsQuote {
    bookmaker_id: String,
    home_price:   f64,
    away_price:   f64,
}

impl OddsQuote {
    /// `None` when either price is not a usable decimal price.
    pub fn new(bookmaker_id: impl Into<String>, home_price: f64, away_price: f64) -> Option<Self> {
        let valid = |p: f64| p.is_finite() && p > 0.0;
        if !valid(home_price) || !valid(away_price) {
            return None;
        }
        Some(Self {
            bookmaker_id: bookmaker_id.into(),
            home_price,
            away_price,
        })
    }

    pub fn bookmaker_id(&self) -> &str {
        &self.bookmaker_id
    }

    pub fn home_price(&self) -> f64 {
        self.home_price
    }

    pub fn away_price(&self) -> f64 {
        self.away_price
    }

    /// Strictly better for the bettor on at least one side.
    pub fn improves_on(&self, other: &OddsQuote) -> bool {
        self.home_price > other.home_price || self.away_price > other.away_price
    }
}

/// Bookmaker descriptor from the response settings block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmakerInfo {
    pub id:   String,
    pub name: String,
    /// Whole descriptor as received (logo, url, ...).
    pub raw:  serde_json::Value,
}

pub const UNKNOWN_BOOKMAKER: &str = "Unknown";

/// Everything one odds query yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OddsSnapshot {
    pub quotes:     Vec<OddsQuote>,
    pub bookmakers: Vec<BookmakerInfo>,
}

impl OddsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
