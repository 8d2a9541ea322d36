//! Record level decoding: field split, value coercion, classification.

use chrono::DateTime;
use std::collections::HashMap;
use tracing::debug;

use crate::model::{BookmakerList, FeaturedMatch};
use crate::{FIELD_SEP, KV_MARKER};

/// Keys carrying epoch seconds.
const TIMESTAMP_KEYS: [&str; 4] = ["AD", "ADE", "AO", "QC"];

/// Key of the embedded bookmaker list.
const BOOKMAKERS_KEY: &str = "AL";
/// Literal prefix that marks the bookmaker list as JSON.
const BOOKMAKERS_JSON_PREFIX: &str = r#"{"2":"#;

// Discriminator keys, checked in this order.
const KEY_TOURNAMENT: &str = "ZA";
const KEY_MATCH: &str = "AA";
const KEY_FEATURED: &str = "QB";
const KEY_SESSION: &str = "A1";

/// One decoded record: key → value, with the bookmaker list pulled out
/// as its own sum type so nobody downstream re-sniffs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields:     HashMap<String, String>,
    bookmakers: Option<BookmakerList>,
}

impl RawRecord {
    /// Split one record into fields. Empty fields and fields without the
    /// marker are skipped; the value is everything after the first marker.
    pub fn parse(record: &str) -> Self {
        let mut raw = RawRecord::default();

        for field in record.split(FIELD_SEP) {
            if field.is_empty() {
                continue;
            }
            let Some((key, value)) = field.split_once(KV_MARKER) else {
                continue;
            };

            if key == BOOKMAKERS_KEY {
                raw.bookmakers = Some(BookmakerList::sniff(value));
                continue;
            }

            let value = if TIMESTAMP_KEYS.contains(&key) {
                convert_timestamp(value.trim_end_matches('|'))
            } else {
                value.to_string()
            };
            raw.fields.insert(key.to_string(), value);
        }

        raw
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key) || (key == BOOKMAKERS_KEY && self.bookmakers.is_some())
    }

    /// Owned value of `key`, falling back to `fallback` when absent.
    pub fn string_or(&self, key: &str, fallback: &str) -> Option<String> {
        self.get(key).or_else(|| self.get(fallback)).map(str::to_string)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }

    pub fn take_bookmakers(&mut self) -> Option<BookmakerList> {
        self.bookmakers.take()
    }

    pub fn len(&self) -> usize {
        self.fields.len() + usize::from(self.bookmakers.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BookmakerList {
    fn sniff(value: &str) -> Self {
        if !value.starts_with(BOOKMAKERS_JSON_PREFIX) {
            return BookmakerList::Raw(value.to_string());
        }
        match serde_json::from_str(value) {
            Ok(parsed) => BookmakerList::Parsed(parsed),
            Err(e) => {
                debug!("bookmaker list kept raw: {e}");
                BookmakerList::Raw(value.to_string())
            }
        }
    }
}

/// Epoch seconds → `YYYY-MM-DD HH:MM:SS UTC`; anything unparsable is
/// returned unchanged.
pub fn convert_timestamp(value: &str) -> String {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Record after the classification pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    Tournament(RawRecord),
    Match(RawRecord),
    Featured(FeaturedMatch),
    Metadata { session_hash: String },
    Unrecognized,
}

impl FeedRecord {
    /// A match record only counts as one while a tournament is open;
    /// otherwise it falls through to the remaining checks.
    pub fn classify(raw: RawRecord, in_tournament: bool) -> Self {
        if raw.has(KEY_TOURNAMENT) {
            return FeedRecord::Tournament(raw);
        }
        if raw.has(KEY_MATCH) && in_tournament {
            return FeedRecord::Match(raw);
        }
        if let Some(match_id) = raw.string(KEY_FEATURED) {
            return FeedRecord::Featured(FeaturedMatch {
                match_id,
                timestamp: raw.string("QC"),
            });
        }
        if let Some(session_hash) = raw.string(KEY_SESSION) {
            return FeedRecord::Metadata { session_hash };
        }
        FeedRecord::Unrecognized
    }
}
