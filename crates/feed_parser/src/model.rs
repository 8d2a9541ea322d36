//! Typed tournament / match tree built from classified records.
//! Every fallback rule for a field lives here, once.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::record::RawRecord;

pub const TENNIS_SPORT_ID: u32 = 2;
const DEFAULT_SPORT: &str = "tennis";
/// `ZI` value marking a doubles tournament.
const DOUBLES_GAME_TYPE: &str = "1";

// ── Bookmaker list ───────────────────────────────────────────────────────────

/// `AL` field: JSON when it looks like JSON and parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BookmakerList {
    Raw(String),
    Parsed(serde_json::Value),
}

// ── Tournament ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tournament {
    pub tournament_id:            String,
    pub tournament_name:          Option<String>,
    pub sport_id:                 u32,
    pub sport_name:               String,
    pub category:                 Option<String>,
    pub tournament_name_from_url: Option<String>,
    pub category_id:              Option<String>,
    pub surface:                  Option<String>,
    pub tournament_unique_id:     Option<String>,
    pub format:                   Option<String>,
    pub status:                   Option<String>,
    pub game_type:                Option<String>,
    pub combined_id:              Option<String>,
    pub stage:                    Option<String>,
    pub link:                     Option<String>,
    pub image:                    Option<String>,
    pub zx_field:                 Option<String>,
    pub season_id:                Option<String>,
    pub tournament_status:        Option<String>,
    pub tss:                      Option<String>,
    pub category_name:            Option<String>,
    pub matches:                  Vec<Match>,
}

impl Tournament {
    /// `seq` is the number of tournaments decoded so far; it names
    /// tournaments that carry no `ZC` id.
    pub fn from_record(raw: &RawRecord, seq: usize) -> Self {
        let url = UrlParts::parse(raw.get("ZL"));
        Self {
            tournament_id:            raw.string("ZC").unwrap_or_else(|| format!("tournament_{seq}")),
            tournament_name:          raw.string("ZA"),
            sport_id:                 TENNIS_SPORT_ID,
            sport_name:               url.sport,
            category:                 url.category,
            tournament_name_from_url: url.slug,
            category_id:              raw.string("ZB"),
            surface:                  raw.string("ZD"),
            tournament_unique_id:     raw.string("ZE"),
            format:                   raw.string("ZF"),
            status:                   raw.string("ZG"),
            game_type:                raw.string("ZI"),
            combined_id:              raw.string("ZO"),
            stage:                    raw.string("ZH"),
            link:                     raw.string("ZL"),
            image:                    raw.string("OAJ"),
            zx_field:                 raw.string("ZX"),
            season_id:                raw.string("ZEE"),
            tournament_status:        raw.string("ZHS"),
            tss:                      raw.string("ZCC"),
            category_name:            raw.string("ZAF"),
            matches:                  Vec::new(),
        }
    }

    pub fn is_doubles(&self) -> bool {
        self.game_type.as_deref() == Some(DOUBLES_GAME_TYPE)
    }

    pub fn display_name(&self) -> &str {
        self.tournament_name.as_deref().unwrap_or(&self.tournament_id)
    }
}

/// `/sport/category/slug/` split of the tournament link.
struct UrlParts {
    sport:    String,
    category: Option<String>,
    slug:     Option<String>,
}

impl UrlParts {
    fn parse(url: Option<&str>) -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^/(\w+)/([\w-]+)/([\w-]+)/?$").expect("tournament url pattern is valid")
        });

        url.and_then(|u| re.captures(u))
            .map(|caps| UrlParts {
                sport:    caps[1].to_string(),
                category: Some(caps[2].to_string()),
                slug:     Some(caps[3].to_string()),
            })
            .unwrap_or(UrlParts {
                sport:    DEFAULT_SPORT.to_string(),
                category: None,
                slug:     None,
            })
    }
}

// ── Match ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Player {
    pub name:         Option<String>,
    pub full_name:    Option<String>,
    pub first_name:   Option<String>,
    pub id:           Option<String>,
    pub slug:         Option<String>,
    pub country_code: Option<String>,
    pub country:      String,
    pub image:        String,
    pub is_winner:    bool,
}

impl Player {
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or("?")
    }
}

/// Games won in one set. `None` = unknown (also forced for doubles).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetScore {
    pub home: Option<String>,
    pub away: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetScores {
    pub set1: SetScore,
    pub set2: SetScore,
    pub set3: SetScore,
    pub set4: SetScore,
}

impl SetScores {
    pub fn iter(&self) -> impl Iterator<Item = &SetScore> {
        [&self.set1, &self.set2, &self.set3, &self.set4].into_iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiscFlags {
    pub home_rank_weight: Option<String>,
    pub away_rank_weight: Option<String>,
    pub bx_flag:          Option<String>,
    pub link_status:      Option<String>,
    pub home_code:        Option<String>,
    pub away_code:        Option<String>,
    pub home_rank_alt:    Option<String>,
    pub away_rank_alt:    Option<String>,
    pub home_set_flag:    Option<String>,
    pub away_set_flag:    Option<String>,
    pub away_status:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub match_id:         String,
    /// As received: converted `YYYY-MM-DD HH:MM:SS UTC` or the raw value.
    pub start_time:       Option<String>,
    pub start_time_alt:   Option<String>,
    pub update_time:      Option<String>,
    pub sets_played:      Option<String>,
    pub current_round:    Option<String>,
    pub game_count:       Option<String>,
    pub home_player:      Player,
    pub away_player:      Player,
    pub home_sets_won:    Option<String>,
    pub away_sets_won:    Option<String>,
    pub set_scores:       SetScores,
    pub home_match_count: Option<String>,
    pub live_status:      Option<String>,
    pub market_watchers:  Option<String>,
    pub bookmakers:       Option<BookmakerList>,
    pub misc_flags:       MiscFlags,
}

impl Match {
    /// Doubles reuse the score keys with other meanings, so scores are
    /// blanked and the per-pair country/image lists cut to the first entry.
    pub fn from_record(mut raw: RawRecord, is_doubles: bool) -> Self {
        let score = |key: &str| if is_doubles { None } else { raw.string(key) };
        let set = |home: &str, away: &str| SetScore { home: score(home), away: score(away) };

        let set_scores = SetScores {
            set1: set("BA", "BB"),
            set2: set("BC", "BD"),
            set3: set("BE", "BF"),
            set4: set("BG", "BH"),
        };
        let home_sets_won = score("AG");
        let away_sets_won = score("AH");

        let home_player = Player {
            name:         raw.string("CX"),
            full_name:    raw.string_or("AE", "CX"),
            first_name:   raw.string_or("FH", "CX"),
            id:           raw.string("JA"),
            slug:         raw.string("WU"),
            country_code: raw.string_or("CA", "CY"),
            country:      pair_part(raw.string_or("CC", "FU"), '/', is_doubles),
            image:        pair_part(raw.string("OA"), ';', is_doubles),
            is_winner:    raw.flag("AS"),
        };
        // away name falls back to CX like the site's own widget does
        let away_player = Player {
            name:         raw.string_or("AF", "CX"),
            full_name:    raw.string_or("AF", "CX"),
            first_name:   raw.string_or("FK", "CX"),
            id:           raw.string("JB"),
            slug:         raw.string("WV"),
            country_code: raw.string_or("CB", "GB"),
            country:      pair_part(raw.string_or("FV", "FX"), '/', is_doubles),
            image:        pair_part(raw.string("OB"), ';', is_doubles),
            is_winner:    raw.flag("AW"),
        };

        let misc_flags = MiscFlags {
            home_rank_weight: raw.string("RW"),
            away_rank_weight: raw.string("BW"),
            bx_flag:          raw.string("BX"),
            link_status:      raw.string("WL"),
            home_code:        raw.string("WM"),
            away_code:        raw.string("WN"),
            home_rank_alt:    raw.string("GRA"),
            away_rank_alt:    raw.string("GRB"),
            home_set_flag:    raw.string("AZ"),
            away_set_flag:    raw.string("AY"),
            away_status:      raw.string("AW"),
        };

        Self {
            match_id:         raw.string("AA").unwrap_or_default(),
            start_time:       raw.string("AD"),
            start_time_alt:   raw.string("ADE"),
            update_time:      raw.string("AO"),
            sets_played:      raw.string("AB"),
            current_round:    raw.string("CR"),
            game_count:       raw.string("AC"),
            home_player,
            away_player,
            home_sets_won,
            away_sets_won,
            set_scores,
            home_match_count: raw.string("HMC"),
            live_status:      raw.string("AN"),
            market_watchers:  raw.string("MW"),
            bookmakers:       raw.take_bookmakers(),
            misc_flags,
        }
    }
}

fn pair_part(value: Option<String>, sep: char, is_doubles: bool) -> String {
    let value = value.unwrap_or_default();
    if !is_doubles {
        return value;
    }
    match value.split_once(sep) {
        Some((first, _)) => first.to_string(),
        None => value,
    }
}

// ── Featured ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedMatch {
    pub match_id:  String,
    pub timestamp: Option<String>,
}
