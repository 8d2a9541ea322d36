//! TennisArb — Feed Client
//!
//! Dva zdroje dat:
//!   A) live feed (turnaje + zápasy): delimitovaný text, dekóduje `feed_parser`
//!   B) odds query per zápas: JSON, jednou pro každou geo variantu
//!
//! Jen stahuje. Žádné parsování, žádné retry.

use futures_util::future::join_all;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const FEED_BASE_URL: &str = "https://global.flashscore.ninja/2/x/feed";
const ODDS_URL: &str = "https://global.ds.lsapp.eu/odds/pq_graphql";
const PROJECT_ID: &str = "2";
const FSIGN: &str = "SW9D1eZo";
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Mobile Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no feed id for sport '{0}'")]
    UnknownSport(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("odds body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Feed ids per sport: (plain feed, feed with odds).
fn sport_feed_ids(sport: &str) -> Option<(&'static str, &'static str)> {
    match sport {
        "tennis" => Some(("f_2_0_1_en_1", "fo_2_0_1_en_1_0")),
        _ => None,
    }
}

pub fn feed_id(sport: &str, with_odds: bool) -> Result<&'static str, FetchError> {
    let (plain, odds) = sport_feed_ids(sport).ok_or_else(|| FetchError::UnknownSport(sport.to_string()))?;
    Ok(if with_odds { odds } else { plain })
}

/// Location parameters of one odds query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoVariant {
    pub geo_ip:     String,
    pub sub_geo_ip: String,
}

impl GeoVariant {
    pub fn new(geo_ip: impl Into<String>, sub_geo_ip: impl Into<String>) -> Self {
        Self { geo_ip: geo_ip.into(), sub_geo_ip: sub_geo_ip.into() }
    }

    /// Nigeria/Lagos first (its bookmaker metadata wins the merge), then no geo.
    pub fn defaults() -> Vec<GeoVariant> {
        vec![GeoVariant::new("NG", "NGLA"), GeoVariant::new("", "")]
    }

    pub fn label(&self) -> String {
        if self.geo_ip.is_empty() && self.sub_geo_ip.is_empty() {
            "global".to_string()
        } else {
            format!("{}/{}", self.geo_ip, self.sub_geo_ip)
        }
    }
}

pub fn odds_query(event_id: &str, geo: &GeoVariant) -> Vec<(&'static str, String)> {
    vec![
        ("_hash", "oce".to_string()),
        ("eventId", event_id.to_string()),
        ("projectId", PROJECT_ID.to_string()),
        ("geoIpCode", geo.geo_ip.clone()),
        ("geoIpSubdivisionCode", geo.sub_geo_ip.clone()),
    ]
}

fn default_headers() -> HeaderMap {
    let pairs = [
        ("accept", "*/*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("origin", "https://www.flashscore.com"),
        ("referer", "https://www.flashscore.com/"),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "cross-site"),
        ("x-fsign", FSIGN),
        ("x-geoip", "1"),
    ];
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

pub struct FeedClient {
    client:    reqwest::Client,
    feed_base: String,
    odds_url:  String,
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedClient {
    pub fn new() -> Self {
        Self::with_endpoints(FEED_BASE_URL, ODDS_URL)
    }

    pub fn with_endpoints(feed_base: impl Into<String>, odds_url: impl Into<String>) -> Self {
        Self {
            client:    reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .default_headers(default_headers())
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            feed_base: feed_base.into(),
            odds_url:  odds_url.into(),
        }
    }

    /// Raw feed text for `sport`.
    pub async fn fetch_sport_feed(&self, sport: &str, with_odds: bool) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.feed_base, feed_id(sport, with_odds)?);
        debug!("Fetching events for {sport}: {url}");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate(&body) });
        }
        Ok(body)
    }

    /// Odds query response for one match and one geo variant.
    pub async fn fetch_odds(&self, event_id: &str, geo: &GeoVariant) -> Result<serde_json::Value, FetchError> {
        debug!("Fetching odds for {event_id} ({})", geo.label());

        let resp = self
            .client
            .get(&self.odds_url)
            .query(&odds_query(event_id, geo))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate(&body) });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// All variants concurrently; results in `geos` order.
    pub async fn fetch_odds_variants(
        &self,
        event_id: &str,
        geos:     &[GeoVariant],
    ) -> Vec<(GeoVariant, Result<serde_json::Value, FetchError>)> {
        let results = join_all(geos.iter().map(|g| self.fetch_odds(event_id, g))).await;
        geos.iter()
            .cloned()
            .zip(results)
            .inspect(|(geo, res)| {
                if let Err(e) = res {
                    warn!("Failed to fetch odds for {event_id} with geo {}: {e}", geo.label());
                }
            })
            .collect()
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_ids() {
        assert_eq!(feed_id("tennis", false).unwrap(), "f_2_0_1_en_1");
        assert_eq!(feed_id("tennis", true).unwrap(), "fo_2_0_1_en_1_0");
        assert!(matches!(feed_id("curling", false), Err(FetchError::UnknownSport(s)) if s == "curling"));
    }

    #[test]
    fn test_default_geo_variants() {
        let geos = GeoVariant::defaults();
        assert_eq!(geos.len(), 2);
        assert_eq!(geos[0].label(), "NG/NGLA");
        assert_eq!(geos[1].label(), "global");
    }

    #[test]
    fn test_odds_query_params() {
        let q = odds_query("nHr98cHL", &GeoVariant::new("NG", "NGLA"));
        assert!(q.contains(&("eventId", "nHr98cHL".to_string())));
        assert!(q.contains(&("projectId", "2".to_string())));
        assert!(q.contains(&("geoIpSubdivisionCode", "NGLA".to_string())));

        let global = odds_query("x", &GeoVariant::new("", ""));
        assert!(global.contains(&("geoIpCode", String::new())));
    }

    #[test]
    fn test_headers_build() {
        let h = default_headers();
        assert_eq!(h.get("x-fsign").unwrap(), FSIGN);
        assert_eq!(h.get("x-geoip").unwrap(), "1");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let long = "ř".repeat(500);
        assert_eq!(truncate(&long).chars().count(), 200);
    }
}
