//! TennisArb — Feed Parser
//!
//! Dekóduje hustý textový feed (turnaje + zápasy) na typovaný strom.
//!
//! Wire format:
//!   `SA÷1¬~ZA÷ATP - SINGLES: Rome¬ZC÷x1¬ZL÷/tennis/atp-singles/rome/¬~AA÷m1¬AD÷1715000000¬...`
//!   - records separated by `¬~`
//!   - fields separated by `¬`
//!   - `KEY÷VALUE`, split on the first `÷`
//!   - optional leading `SA÷...` segment up to the first `¬~` is dropped
//!
//! Unknown keys and unknown record kinds are ignored.

mod model;
mod record;

pub use model::{
    BookmakerList, FeaturedMatch, Match, MiscFlags, Player, SetScore, SetScores, Tournament,
    TENNIS_SPORT_ID,
};
pub use record::{convert_timestamp, FeedRecord, RawRecord};

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

pub const SENTINEL: &str = "SA÷";
pub const RECORD_SEP: &str = "¬~";
pub const FIELD_SEP: char = '¬';
pub const KV_MARKER: char = '÷';

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed is not valid UTF-8 at byte {valid_up_to}")]
    InvalidEncoding { valid_up_to: usize },
}

/// Decoded feed for one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedFeed {
    /// Source order. Ids are unique: a repeated id replaces the earlier entry in place.
    pub tournaments:      Vec<Tournament>,
    pub featured_matches: Vec<FeaturedMatch>,
    pub metadata:         BTreeMap<String, String>,
}

impl ParsedFeed {
    pub fn match_count(&self) -> usize {
        self.tournaments.iter().map(|t| t.matches.len()).sum()
    }

    pub fn tournament(&self, id: &str) -> Option<&Tournament> {
        self.tournaments.iter().find(|t| t.tournament_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty() && self.featured_matches.is_empty() && self.metadata.is_empty()
    }
}

/// Decode a raw feed payload.
pub fn decode(raw: &[u8]) -> Result<ParsedFeed, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|e| ParseError::InvalidEncoding {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(decode_str(text))
}

/// Decode feed text. Per-field and per-record irregularities degrade to
/// absent values, so text input cannot fail.
pub fn decode_str(text: &str) -> ParsedFeed {
    let body = strip_sentinel(text);

    let mut feed = ParsedFeed::default();
    // index into feed.tournaments of the tournament receiving matches
    let mut current: Option<usize> = None;
    let mut ignored = 0usize;

    for chunk in body.split(RECORD_SEP) {
        if chunk.trim().is_empty() {
            continue;
        }

        match FeedRecord::classify(RawRecord::parse(chunk), current.is_some()) {
            FeedRecord::Tournament(raw) => {
                let tournament = Tournament::from_record(&raw, feed.tournaments.len());
                current = Some(insert_tournament(&mut feed.tournaments, tournament));
            }
            FeedRecord::Match(raw) => {
                if let Some(t) = current.and_then(|i| feed.tournaments.get_mut(i)) {
                    let m = Match::from_record(raw, t.is_doubles());
                    t.matches.push(m);
                }
            }
            FeedRecord::Featured(featured) => feed.featured_matches.push(featured),
            FeedRecord::Metadata { session_hash } => {
                feed.metadata.insert("session_hash".to_string(), session_hash);
            }
            FeedRecord::Unrecognized => ignored += 1,
        }
    }

    debug!(
        tournaments = feed.tournaments.len(),
        matches = feed.match_count(),
        featured = feed.featured_matches.len(),
        ignored,
        "feed decoded"
    );
    feed
}

fn strip_sentinel(text: &str) -> &str {
    if !text.starts_with(SENTINEL) {
        return text;
    }
    match text.split_once(RECORD_SEP) {
        Some((_, rest)) => rest,
        None => text,
    }
}

fn insert_tournament(tournaments: &mut Vec<Tournament>, tournament: Tournament) -> usize {
    match tournaments.iter().position(|t| t.tournament_id == tournament.tournament_id) {
        Some(i) => {
            tournaments[i] = tournament;
            i
        }
        None => {
            tournaments.push(tournament);
            tournaments.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "ZA÷ATP - SINGLES: Rome¬ZB÷5724¬ZC÷t1¬ZI÷0¬ZL÷/tennis/atp-singles/rome/¬~\
AA÷m1¬AD÷1715000000¬CX÷Sinner J.¬AF÷Alcaraz C.¬AG÷1¬AH÷0¬BA÷6¬BB÷4¬~\
AA÷m2¬AD÷1715003600¬CX÷Zverev A.¬AF÷Ruud C.¬~\
ZA÷ATP - DOUBLES: Rome¬ZC÷t2¬ZI÷1¬ZL÷/tennis/atp-doubles/rome/¬~\
AA÷m3¬CX÷Bopanna R./Ebden M.¬AF÷Ram R./Salisbury J.¬AG÷7¬AH÷6¬BA÷3¬BB÷6¬BG÷1¬~\
QB÷m1¬QC÷1715000000¬~\
A1÷f00dfeed¬~";

    #[test]
    fn test_decode_tree() {
        let feed = decode_str(BODY);
        assert_eq!(feed.tournaments.len(), 2);
        assert_eq!(feed.match_count(), 3);

        let rome = &feed.tournaments[0];
        assert_eq!(rome.tournament_id, "t1");
        assert_eq!(rome.category.as_deref(), Some("atp-singles"));
        assert_eq!(rome.matches[0].start_time.as_deref(), Some("2024-05-06 12:53:20 UTC"));
        assert_eq!(rome.matches[0].home_sets_won.as_deref(), Some("1"));

        assert_eq!(feed.featured_matches.len(), 1);
        assert_eq!(feed.metadata.get("session_hash").map(String::as_str), Some("f00dfeed"));
    }

    #[test]
    fn test_sentinel_is_stripped() {
        let with = format!("SA÷1¬~{BODY}");
        assert_eq!(decode_str(&with), decode_str(BODY));

        // sentinel but no separator: text kept whole
        let lone = decode_str("SA÷1¬ZA÷Solo¬ZC÷t9");
        assert_eq!(lone.tournaments.len(), 1);
        assert_eq!(lone.tournaments[0].tournament_id, "t9");
    }

    #[test]
    fn test_doubles_suppresses_scores() {
        let feed = decode_str(BODY);
        let doubles = feed.tournament("t2").unwrap();
        assert!(doubles.is_doubles());
        let m = &doubles.matches[0];
        assert_eq!(m.home_sets_won, None);
        assert_eq!(m.away_sets_won, None);
        assert!(m.set_scores.iter().all(|s| s.home.is_none() && s.away.is_none()));
    }

    #[test]
    fn test_unknown_records_ignored() {
        let base = decode_str(BODY);
        let noisy = decode_str(&format!("ZZZ÷what¬~{BODY}XY÷1¬QQ÷2¬~"));
        assert_eq!(noisy.tournaments.len(), base.tournaments.len());
        assert_eq!(noisy.match_count(), base.match_count());
    }

    #[test]
    fn test_match_before_tournament_dropped() {
        let feed = decode_str("AA÷orphan¬CX÷Nobody¬~ZA÷Later¬ZC÷t1¬~");
        assert_eq!(feed.tournaments.len(), 1);
        assert_eq!(feed.match_count(), 0);
    }

    #[test]
    fn test_repeated_tournament_id_replaces() {
        let feed = decode_str("ZA÷First¬ZC÷t1¬~AA÷m1¬~ZA÷Other¬ZC÷t2¬~ZA÷Again¬ZC÷t1¬~AA÷m2¬~");
        assert_eq!(feed.tournaments.len(), 2);
        assert_eq!(feed.tournaments[0].tournament_name.as_deref(), Some("Again"));
        assert_eq!(feed.tournaments[0].matches.len(), 1);
        assert_eq!(feed.tournaments[0].matches[0].match_id, "m2");
    }

    #[test]
    fn test_synthesized_ids() {
        let feed = decode_str("ZA÷A¬~ZA÷B¬~");
        let ids: Vec<_> = feed.tournaments.iter().map(|t| t.tournament_id.as_str()).collect();
        assert_eq!(ids, ["tournament_0", "tournament_1"]);
    }

    #[test]
    fn test_invalid_utf8_is_structural_failure() {
        let err = decode(&[b'Z', b'A', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidEncoding { valid_up_to: 2 }));

        let empty = decode(b"").unwrap();
        assert!(empty.is_empty());
    }
}
