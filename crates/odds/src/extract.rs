//! Odds query response → quotes + bookmaker descriptors.
//!
//! Response shape (only the parts read here):
//! ```text
//! { "data": { "findOddsByEventId": {
//!     "odds": [ { "bookmakerId": 417, "bettingType": "HOME_AWAY", "bettingScope": "FULL_TIME",
//!                 "odds": [ { "value": "1.85", "active": true }, { "value": "2.02", "active": true } ] } ],
//!     "settings": { "bookmakers": [ { "bookmaker": { "id": 417, "name": "bet365" } } ] } } } }
//! ```

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{BookmakerInfo, OddsQuote, OddsSnapshot, UNKNOWN_BOOKMAKER};

const EVENT_PATH: [&str; 2] = ["data", "findOddsByEventId"];

const HOME_AWAY: &str = "HOME_AWAY";
const FULL_TIME: &str = "FULL_TIME";

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("odds response: expected object at {0}")]
    NotAnObject(String),
    #[error("odds response: expected array at {0}")]
    NotAnArray(String),
}

/// Full-time two-way quotes in source order. Missing or empty odds list is
/// a valid empty result; entries failing a filter are dropped.
pub fn extract(resp: &Value) -> Result<Vec<OddsQuote>, ExtractError> {
    let Some(entries) = array_at(resp, "odds")? else {
        return Ok(Vec::new());
    };

    let mut quotes = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            return Err(ExtractError::NotAnObject(format!("{}.odds[{i}]", EVENT_PATH.join("."))));
        }
        if let Some(q) = quote_from_entry(entry) {
            quotes.push(q);
        }
    }
    Ok(quotes)
}

fn quote_from_entry(entry: &Value) -> Option<OddsQuote> {
    if entry["bettingType"].as_str() != Some(HOME_AWAY)
        || entry["bettingScope"].as_str() != Some(FULL_TIME)
    {
        return None;
    }

    let bookmaker_id = id_string(&entry["bookmakerId"])?;

    let prices = entry["odds"].as_array()?;
    if prices.len() != 2 {
        debug!(bookmaker = %bookmaker_id, n = prices.len(), "odds entry dropped: not two prices");
        return None;
    }
    if !prices.iter().all(|p| p["active"].as_bool() == Some(true)) {
        debug!(bookmaker = %bookmaker_id, "odds entry dropped: inactive price");
        return None;
    }

    let home = price_value(&prices[0]["value"])?;
    let away = price_value(&prices[1]["value"])?;
    let quote = OddsQuote::new(bookmaker_id, home, away);
    if quote.is_none() {
        debug!(home, away, "odds entry dropped: non-positive price");
    }
    quote
}

/// Prices come as strings ("1.85") or plain numbers.
fn price_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Descriptors from `settings.bookmakers`, keyed by `bookmaker.id`.
pub fn extract_bookmakers(resp: &Value) -> Result<Vec<BookmakerInfo>, ExtractError> {
    let Some(settings) = value_at(resp, &["settings"])? else {
        return Ok(Vec::new());
    };
    let list = match &settings["bookmakers"] {
        Value::Null => return Ok(Vec::new()),
        Value::Array(list) => list,
        _ => {
            return Err(ExtractError::NotAnArray(format!(
                "{}.settings.bookmakers",
                EVENT_PATH.join(".")
            )))
        }
    };

    Ok(list
        .iter()
        .filter_map(|desc| {
            let bookmaker = &desc["bookmaker"];
            let id = id_string(&bookmaker["id"])?;
            let name = bookmaker["name"].as_str().unwrap_or(UNKNOWN_BOOKMAKER).to_string();
            Some(BookmakerInfo { id, name, raw: desc.clone() })
        })
        .collect())
}

/// Quotes and descriptors of one response.
pub fn extract_snapshot(resp: &Value) -> Result<OddsSnapshot, ExtractError> {
    Ok(OddsSnapshot {
        quotes:     extract(resp)?,
        bookmakers: extract_bookmakers(resp)?,
    })
}

fn array_at<'a>(resp: &'a Value, key: &str) -> Result<Option<&'a Vec<Value>>, ExtractError> {
    match value_at(resp, &[key])? {
        None => Ok(None),
        Some(Value::Array(a)) => Ok(Some(a)),
        Some(_) => Err(ExtractError::NotAnArray(format!("{}.{key}", EVENT_PATH.join(".")))),
    }
}

/// Walk `data.findOddsByEventId` then `rest`. `null` or a missing key
/// anywhere means "absent"; a non-object on the way is malformed.
fn value_at<'a>(resp: &'a Value, rest: &[&str]) -> Result<Option<&'a Value>, ExtractError> {
    let mut cur = resp;
    let mut walked = String::from("$");

    for seg in EVENT_PATH.iter().chain(rest.iter()) {
        let obj = match cur {
            Value::Object(obj) => obj,
            _ => return Err(ExtractError::NotAnObject(walked)),
        };
        walked = if walked == "$" { seg.to_string() } else { format!("{walked}.{seg}") };
        match obj.get(*seg) {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => cur = v,
        }
    }
    Ok(Some(cur))
}
