//! Merge of the per-geo snapshots of one match.
//!
//! Greedy: one quote per bookmaker, replaced only when a later quote is
//! strictly better on at least one side. Ties keep the earliest.

use std::collections::HashMap;

use crate::{BookmakerInfo, OddsQuote, OddsSnapshot, UNKNOWN_BOOKMAKER};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedOdds {
    pub quotes:     Vec<OddsQuote>,
    /// First descriptor seen per bookmaker id.
    pub bookmakers: HashMap<String, BookmakerInfo>,
}

impl MergedOdds {
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn bookmaker(&self, id: &str) -> Option<&BookmakerInfo> {
        self.bookmakers.get(id)
    }

    pub fn bookmaker_name(&self, id: &str) -> &str {
        self.bookmaker(id).map(|b| b.name.as_str()).unwrap_or(UNKNOWN_BOOKMAKER)
    }
}

/// Merge snapshots in call order (one per geo variant).
pub fn merge(batches: &[OddsSnapshot]) -> MergedOdds {
    let mut merged = MergedOdds::default();

    for batch in batches {
        for quote in &batch.quotes {
            upsert(&mut merged.quotes, quote);
        }
        for info in &batch.bookmakers {
            merged.bookmakers.entry(info.id.clone()).or_insert_with(|| info.clone());
        }
    }

    merged
}

/// Quote-only merge.
pub fn merge_quotes(batches: &[Vec<OddsQuote>]) -> Vec<OddsQuote> {
    let mut out = Vec::new();
    for batch in batches {
        for quote in batch {
            upsert(&mut out, quote);
        }
    }
    out
}

// Replaced quotes move to the back of the list.
fn upsert(quotes: &mut Vec<OddsQuote>, quote: &OddsQuote) {
    match quotes.iter().position(|q| q.bookmaker_id() == quote.bookmaker_id()) {
        None => quotes.push(quote.clone()),
        Some(i) if quote.improves_on(&quotes[i]) => {
            quotes.remove(i);
            quotes.push(quote.clone());
        }
        Some(_) => {}
    }
}
