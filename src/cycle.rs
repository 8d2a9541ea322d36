//! Jeden polling cyklus: feed → turnaje → odds per geo → verdikt → log/alert.

use anyhow::{Context, Result};
use arb_detector::{ArbDetector, CycleReport, TournamentReport};
use feed_client::{FeedClient, FetchError, GeoVariant};
use logger::{now_iso, CycleSummaryEvent, EventLogger, TelegramNotifier};
use odds::OddsSnapshot;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;

pub struct Observer {
    sport:    String,
    client:   FeedClient,
    detector: ArbDetector,
    summary:  EventLogger,
    notifier: Option<TelegramNotifier>,
    geos:     Vec<GeoVariant>,
    balance:  f64,
}

impl Observer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            sport:    cfg.sport.clone(),
            client:   FeedClient::new(),
            detector: ArbDetector::new(&cfg.log_dir, cfg.min_profit_pct),
            summary:  EventLogger::new(&cfg.log_dir),
            notifier: cfg
                .telegram
                .as_ref()
                .map(|tg| TelegramNotifier::new(&tg.token, &tg.chat_id, &tg.bot_name)),
            geos:     GeoVariant::defaults(),
            balance:  cfg.capital,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let body = self
            .client
            .fetch_sport_feed(&self.sport, false)
            .await
            .with_context(|| format!("fetching {} feed", self.sport))?;
        let feed = feed_parser::decode_str(&body);
        info!("Feed: {} tournaments, {} matches", feed.tournaments.len(), feed.match_count());

        let mut report = CycleReport::new(feed.metadata.clone());
        for tournament in &feed.tournaments {
            let mut tr = TournamentReport::new(tournament);
            for m in &tournament.matches {
                let responses = self.client.fetch_odds_variants(&m.match_id, &self.geos).await;
                let snapshots = usable_snapshots(&m.match_id, responses);

                let match_report = self.detector.assess(tournament, m, &snapshots, self.balance);
                if let Some(ev) = self.detector.record(&self.sport, &match_report) {
                    if let Some(notifier) = &self.notifier {
                        if let Err(e) = notifier.report_arb(&ev).await {
                            warn!("Telegram alert failed for {}: {e}", ev.match_id);
                        }
                    }
                }
                tr.matches.push(match_report);
            }
            report.push_tournament(tr);
        }

        self.balance = settle(self.balance, &report);
        let summary = summary_event(&report, self.balance);
        info!(
            "Iteration Summary: {} arbs found, Total Profit: {:.2}, New Balance: {:.2}",
            summary.arbs, summary.iteration_profit, summary.balance
        );
        if let Err(e) = self.summary.log(&summary) {
            warn!("Log write failed: {e}");
        }
        Ok(report)
    }
}

/// Keeps the snapshots that extracted cleanly and carry at least one quote,
/// in variant order.
pub fn usable_snapshots(
    match_id:  &str,
    responses: Vec<(GeoVariant, Result<Value, FetchError>)>,
) -> Vec<OddsSnapshot> {
    let mut out = Vec::with_capacity(responses.len());
    for (geo, response) in responses {
        // fetch errors already logged by the client
        let Ok(body) = response else { continue };
        match odds::extract_snapshot(&body) {
            Ok(snapshot) if snapshot.is_empty() => {
                debug!("No odds data found for {match_id} with geo {}", geo.label());
            }
            Ok(snapshot) => out.push(snapshot),
            Err(e) => warn!("Error extracting odds for {match_id} with geo {}: {e}", geo.label()),
        }
    }
    out
}

pub fn settle(balance: f64, report: &CycleReport) -> f64 {
    balance + report.iteration_profit
}

pub fn summary_event(report: &CycleReport, balance: f64) -> CycleSummaryEvent {
    CycleSummaryEvent {
        ts:               now_iso(),
        event:            "CYCLE_SUMMARY",
        tournaments:      report.tournaments.len(),
        matches:          report.match_count(),
        arbs:             report.arb_count(),
        iteration_profit: report.iteration_profit,
        balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(entries: &[(u64, &str, &str)]) -> Value {
        let odds: Vec<Value> = entries
            .iter()
            .map(|(bi, h, a)| {
                json!({
                    "bookmakerId": bi,
                    "bettingType": "HOME_AWAY",
                    "bettingScope": "FULL_TIME",
                    "odds": [ { "value": h, "active": true }, { "value": a, "active": true } ]
                })
            })
            .collect();
        json!({ "data": { "findOddsByEventId": { "odds": odds, "settings": { "bookmakers": [] } } } })
    }

    #[test]
    fn test_usable_snapshots_skip_failed_and_empty() {
        let responses = vec![
            (GeoVariant::new("NG", "NGLA"), Err(FetchError::UnknownSport("x".into()))),
            (GeoVariant::new("", ""), Ok(body(&[]))),
            (GeoVariant::new("KE", ""), Ok(json!({ "data": { "findOddsByEventId": { "odds": 5 } } }))),
            (GeoVariant::new("GH", ""), Ok(body(&[(16, "2.10", "1.80")]))),
        ];
        let snaps = usable_snapshots("m1", responses);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].quotes[0].bookmaker_id(), "16");
    }

    #[test]
    fn test_balance_grows_by_iteration_profit() {
        let feed = feed_parser::decode_str(
            "ZA÷ATP - SINGLES: Rome¬ZC÷t1¬~AA÷m1¬CX÷Sinner J.¬AF÷Alcaraz C.¬~",
        );
        let t = &feed.tournaments[0];
        let snaps = usable_snapshots(
            "m1",
            vec![(GeoVariant::new("", ""), Ok(body(&[(1, "2.0", "2.0"), (2, "1.9", "2.2")])))],
        );

        let mut tr = TournamentReport::new(t);
        tr.matches.push(arb_detector::assess_match(t, &t.matches[0], &snaps, 1000.0, 0.0));
        let mut report = CycleReport::new(feed.metadata.clone());
        report.push_tournament(tr);

        let balance = settle(1000.0, &report);
        assert!((balance - 1047.62).abs() < 1e-9);

        let ev = summary_event(&report, balance);
        assert_eq!(ev.event, "CYCLE_SUMMARY");
        assert_eq!((ev.tournaments, ev.matches, ev.arbs), (1, 1, 1));
    }

    #[test]
    fn test_empty_cycle_keeps_balance() {
        let report = CycleReport::new(Default::default());
        assert_eq!(settle(250.0, &report), 250.0);
        assert_eq!(summary_event(&report, 250.0).arbs, 0);
    }
}
