//! Telegram alerty pro nalezené arby (HTML parse mode).

use chrono::{FixedOffset, NaiveDateTime};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::ArbOpportunityEvent;

const SEND_ATTEMPTS: u32 = 3;
/// West Africa Time, where the channel is read.
const DISPLAY_UTC_OFFSET_SECS: i32 = 3600;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram rejected message: {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("telegram rate limit still hit after {0} attempts")]
    RateLimited(u32),
}

pub struct TelegramNotifier {
    client:   reqwest::Client,
    token:    String,
    chat_id:  String,
    bot_name: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>, bot_name: impl Into<String>) -> Self {
        Self {
            client:   reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            token:    token.into(),
            chat_id:  chat_id.into(),
            bot_name: bot_name.into(),
        }
    }

    /// Send with exponential backoff (1s, 2s, 4s) on HTTP 429 only.
    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": format!("{} \n\n {}", self.bot_name, text),
            "parse_mode": "HTML",
        });

        for attempt in 0..SEND_ATTEMPTS {
            let resp = self.client.post(&url).json(&body).send().await?;
            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let wait = Duration::from_secs(1 << attempt);
                warn!("Telegram 429, retry in {}s", wait.as_secs());
                tokio::time::sleep(wait).await;
                continue;
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Err(NotifyError::RateLimited(SEND_ATTEMPTS))
    }

    pub async fn report_arb(&self, ev: &ArbOpportunityEvent) -> Result<(), NotifyError> {
        self.send_message(&format_arb_message(ev)).await?;
        info!("Telegram arb report sent for {}", ev.match_id);
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `2025-09-11 13:00:00 UTC` → `Sep 11, 2025 02:00 PM` (WAT). Anything
/// else is echoed escaped.
fn display_start_time(start_time: Option<&str>) -> String {
    let Some(raw) = start_time else {
        return "?".to_string();
    };
    let parsed = NaiveDateTime::parse_from_str(raw.trim_end_matches(" UTC"), "%Y-%m-%d %H:%M:%S").ok();
    match (parsed, FixedOffset::east_opt(DISPLAY_UTC_OFFSET_SECS)) {
        (Some(naive), Some(offset)) => naive
            .and_utc()
            .with_timezone(&offset)
            .format("%b %d, %Y %I:%M %p")
            .to_string(),
        _ => escape_html(raw),
    }
}

pub fn format_arb_message(ev: &ArbOpportunityEvent) -> String {
    format!(
        "🎾 <b><u>Arbitrage Opportunity Found</u></b> \n\
         <b>Match ID:</b> {match_id}\n\
         <b>Match:</b> {home} vs {away}\n\n\
         <b>Odds:</b>\n  \
         -Home: {home_odds} ({home_book})\n  \
         -Away: {away_odds} ({away_book})\n\n\
         <b>Stakes:</b>\n  \
         -Home: {stake_home:.2}\n  \
         -Away: {stake_away:.2}\n\n\
         <b>Profit:</b> 💰 <b>{pct:.2}% ({amount:.2})</b> 💰\n\
         <b>Time:</b> {time}",
        match_id   = escape_html(&ev.match_id),
        home       = escape_html(&ev.home),
        away       = escape_html(&ev.away),
        home_odds  = ev.home_odds,
        home_book  = escape_html(&ev.home_bookmaker),
        away_odds  = ev.away_odds,
        away_book  = escape_html(&ev.away_bookmaker),
        stake_home = ev.stake_home,
        stake_away = ev.stake_away,
        pct        = ev.profit_pct,
        amount     = ev.profit_amount,
        time       = display_start_time(ev.start_time.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ArbOpportunityEvent {
        ArbOpportunityEvent {
            ts:                 crate::now_iso(),
            event:              "ARB_OPPORTUNITY",
            sport:              "tennis".into(),
            tournament_id:      "t1".into(),
            tournament:         "ATP - SINGLES: Rome".into(),
            match_id:           "nHr98cHL".into(),
            home:               "Arnaboldi F.".into(),
            away:               "Napolitano S.".into(),
            start_time:         Some("2025-09-11 13:00:00 UTC".into()),
            home_odds:          3.4,
            away_odds:          1.54,
            home_bookmaker_id:  "16".into(),
            away_bookmaker_id:  "417".into(),
            home_bookmaker:     "bet365".into(),
            away_bookmaker:     "Betway <ZA> & co".into(),
            stake_home:         31174.09,
            stake_away:         68825.91,
            profit_amount:      5991.9,
            profit_pct:         5.99,
            total_implied_prob: 0.9435,
        }
    }

    #[test]
    fn test_message_contents() {
        let msg = format_arb_message(&event());
        assert!(msg.contains("<b>Match:</b> Arnaboldi F. vs Napolitano S."));
        assert!(msg.contains("-Home: 3.4 (bet365)"));
        assert!(msg.contains("-Away: 1.54 (Betway &lt;ZA&gt; &amp; co)"));
        assert!(msg.contains("-Home: 31174.09"));
        assert!(msg.contains("5.99% (5991.90)"));
        assert!(msg.contains("<b>Time:</b> Sep 11, 2025 02:00 PM"));
    }

    #[test]
    fn test_unparsable_start_time_echoed() {
        assert_eq!(display_start_time(Some("soon <ish>")), "soon &lt;ish&gt;");
        assert_eq!(display_start_time(None), "?");
    }
}
