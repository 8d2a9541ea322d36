//! Two-way arbitrage over merged bookmaker quotes.
//!
//! Pure: no I/O, no state. Rounding happens only when the result is built.

use odds::OddsQuote;
use serde::Serialize;
use std::fmt;

/// Opportunity that passed the profit gate. Money and percentages are
/// rounded to 2 dp, the implied probability to 4 dp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbResult {
    pub home_odds:          f64,
    pub away_odds:          f64,
    pub home_bookmaker_id:  String,
    pub away_bookmaker_id:  String,
    pub stake_home:         f64,
    pub stake_away:         f64,
    pub profit_amount:      f64,
    pub profit_percentage:  f64,
    pub total_implied_prob: f64,
}

/// Why a match has no reportable opportunity. None of these are errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoArbReason {
    /// Fewer than two quotes.
    InsufficientData,
    /// A best price of 1.0 or less is not a usable decimal price.
    InvalidBestPrice { best_home: f64, best_away: f64 },
    /// Implied probabilities sum to 1 or more.
    NoArbitrage { total_implied_prob: f64 },
    /// Real opportunity, but under the configured minimum.
    BelowThreshold { profit_pct: f64, min_profit_pct: f64 },
}

impl fmt::Display for NoArbReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoArbReason::InsufficientData => write!(f, "insufficient odds data"),
            NoArbReason::InvalidBestPrice { best_home, best_away } => {
                write!(f, "best prices too low (home {best_home}, away {best_away})")
            }
            NoArbReason::NoArbitrage { total_implied_prob } => {
                write!(f, "no arbitrage (implied {total_implied_prob:.4})")
            }
            NoArbReason::BelowThreshold { profit_pct, min_profit_pct } => {
                write!(f, "profit {profit_pct:.2}% below minimum {min_profit_pct}%")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ArbOutcome {
    Found(ArbResult),
    NoArb(NoArbReason),
}

impl ArbOutcome {
    pub fn result(&self) -> Option<&ArbResult> {
        match self {
            ArbOutcome::Found(r) => Some(r),
            ArbOutcome::NoArb(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoArbReason> {
        match self {
            ArbOutcome::Found(_) => None,
            ArbOutcome::NoArb(r) => Some(r),
        }
    }
}

/// Best price per side; the first quote wins ties.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPrices<'a> {
    pub home:           f64,
    pub home_bookmaker: &'a str,
    pub away:           f64,
    pub away_bookmaker: &'a str,
}

pub fn best_prices(odds: &[OddsQuote]) -> Option<BestPrices<'_>> {
    let first = odds.first()?;
    let mut best = BestPrices {
        home:           first.home_price(),
        home_bookmaker: first.bookmaker_id(),
        away:           first.away_price(),
        away_bookmaker: first.bookmaker_id(),
    };
    for q in &odds[1..] {
        if q.home_price() > best.home {
            best.home = q.home_price();
            best.home_bookmaker = q.bookmaker_id();
        }
        if q.away_price() > best.away {
            best.away = q.away_price();
            best.away_bookmaker = q.bookmaker_id();
        }
    }
    Some(best)
}

/// Unrounded stake split of `capital` proportional to implied probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakeSplit {
    pub implied_home: f64,
    pub implied_away: f64,
    pub total:        f64,
    pub stake_home:   f64,
    pub stake_away:   f64,
    /// Payout on home win minus capital.
    pub profit:       f64,
}

impl StakeSplit {
    pub fn new(best_home: f64, best_away: f64, capital: f64) -> Self {
        let implied_home = 1.0 / best_home;
        let implied_away = 1.0 / best_away;
        let total = implied_home + implied_away;
        let stake_home = capital * implied_home / total;
        let stake_away = capital * implied_away / total;
        Self {
            implied_home,
            implied_away,
            total,
            stake_home,
            stake_away,
            profit: stake_home * best_home - capital,
        }
    }

    /// Same profit computed through the away side.
    pub fn profit_via_away(&self, best_away: f64) -> f64 {
        self.stake_away * best_away - (self.stake_home + self.stake_away)
    }
}

/// Evaluate merged quotes. `capital` must be > 0.
pub fn evaluate(odds: &[OddsQuote], capital: f64, min_profit_pct: f64) -> ArbOutcome {
    if odds.len() < 2 {
        return ArbOutcome::NoArb(NoArbReason::InsufficientData);
    }
    let Some(best) = best_prices(odds) else {
        return ArbOutcome::NoArb(NoArbReason::InsufficientData);
    };

    if best.home <= 1.0 || best.away <= 1.0 {
        return ArbOutcome::NoArb(NoArbReason::InvalidBestPrice {
            best_home: best.home,
            best_away: best.away,
        });
    }

    let split = StakeSplit::new(best.home, best.away, capital);
    if split.total >= 1.0 || split.total == 0.0 {
        return ArbOutcome::NoArb(NoArbReason::NoArbitrage { total_implied_prob: split.total });
    }

    let profit_pct = 100.0 * split.profit / capital;
    if profit_pct < min_profit_pct {
        return ArbOutcome::NoArb(NoArbReason::BelowThreshold { profit_pct, min_profit_pct });
    }

    ArbOutcome::Found(ArbResult {
        home_odds:          best.home,
        away_odds:          best.away,
        home_bookmaker_id:  best.home_bookmaker.to_string(),
        away_bookmaker_id:  best.away_bookmaker.to_string(),
        stake_home:         round_to(split.stake_home, 2),
        stake_away:         round_to(split.stake_away, 2),
        profit_amount:      round_to(split.profit, 2),
        profit_percentage:  round_to(profit_pct, 2),
        total_implied_prob: round_to(split.total, 4),
    })
}

fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, home: f64, away: f64) -> OddsQuote {
        OddsQuote::new(id, home, away).unwrap()
    }

    #[test]
    fn test_cross_bookmaker_arb() {
        let odds = [q("1", 2.0, 2.0), q("2", 1.9, 2.2)];
        let ArbOutcome::Found(r) = evaluate(&odds, 1000.0, 0.0) else {
            panic!("expected arbitrage");
        };

        assert_eq!(r.home_odds, 2.0);
        assert_eq!(r.home_bookmaker_id, "1");
        assert_eq!(r.away_odds, 2.2);
        assert_eq!(r.away_bookmaker_id, "2");
        assert_eq!(r.total_implied_prob, 0.9545);
        assert_eq!(r.profit_percentage, 4.76);
        assert_eq!(r.profit_amount, 47.62);
        assert_eq!(r.stake_home, 523.81);
        assert_eq!(r.stake_away, 476.19);
        assert!((r.stake_home + r.stake_away - 1000.0).abs() < 0.011);
    }

    #[test]
    fn test_same_bookmaker_can_win_both_sides() {
        let odds = [q("7", 2.1, 2.1), q("8", 1.5, 1.5)];
        let r = evaluate(&odds, 100.0, 0.0);
        let r = r.result().expect("arbitrage");
        assert_eq!(r.home_bookmaker_id, "7");
        assert_eq!(r.away_bookmaker_id, "7");
    }

    #[test]
    fn test_insufficient_data() {
        assert_eq!(evaluate(&[], 1000.0, 0.0), ArbOutcome::NoArb(NoArbReason::InsufficientData));
        assert_eq!(
            evaluate(&[q("1", 1.5, 1.5)], 1000.0, 0.0),
            ArbOutcome::NoArb(NoArbReason::InsufficientData)
        );
        // even a single quote that would be an arb on its own
        assert_eq!(
            evaluate(&[q("1", 3.0, 3.0)], 1000.0, 0.0),
            ArbOutcome::NoArb(NoArbReason::InsufficientData)
        );
    }

    #[test]
    fn test_invalid_best_price() {
        let odds = [q("1", 1.0, 5.0), q("2", 0.8, 4.0)];
        assert_eq!(
            evaluate(&odds, 1000.0, 0.0),
            ArbOutcome::NoArb(NoArbReason::InvalidBestPrice { best_home: 1.0, best_away: 5.0 })
        );
    }

    #[test]
    fn test_exact_boundary_is_no_arb() {
        let odds = [q("1", 2.0, 1.5), q("2", 1.5, 2.0)];
        assert_eq!(
            evaluate(&odds, 1000.0, 0.0),
            ArbOutcome::NoArb(NoArbReason::NoArbitrage { total_implied_prob: 1.0 })
        );
    }

    #[test]
    fn test_overround_is_no_arb() {
        let odds = [q("1", 1.8, 1.95), q("2", 1.85, 1.9)];
        assert!(matches!(
            evaluate(&odds, 1000.0, 0.0),
            ArbOutcome::NoArb(NoArbReason::NoArbitrage { total_implied_prob }) if total_implied_prob > 1.0
        ));
    }

    #[test]
    fn test_below_threshold_is_its_own_reason() {
        // 1/2.04 + 1/2.04 → 2% profit
        let odds = [q("1", 2.04, 1.5), q("2", 1.5, 2.04)];
        match evaluate(&odds, 1000.0, 5.0) {
            ArbOutcome::NoArb(NoArbReason::BelowThreshold { profit_pct, min_profit_pct }) => {
                assert!((profit_pct - 2.0).abs() < 1e-9);
                assert_eq!(min_profit_pct, 5.0);
            }
            other => panic!("expected below-threshold, got {other:?}"),
        }
        assert!(evaluate(&odds, 1000.0, 2.0 - 1e-6).result().is_some());
    }

    #[test]
    fn test_first_quote_wins_ties() {
        let odds = [q("a", 2.2, 1.9), q("b", 2.2, 1.9), q("c", 1.5, 2.1)];
        let best = best_prices(&odds).unwrap();
        assert_eq!(best.home_bookmaker, "a");
        assert_eq!(best.away_bookmaker, "c");
    }

    #[test]
    fn test_profit_same_on_both_sides() {
        for (h, a, capital) in [(2.0, 2.2, 1000.0), (3.4, 1.54, 100_000.0), (1.07, 17.0, 12.5), (2.5, 1.9, 7.0)] {
            let split = StakeSplit::new(h, a, capital);
            assert!(
                (split.profit - split.profit_via_away(a)).abs() <= 1e-9 * capital,
                "home/away profit diverge for {h}/{a}"
            );
            assert!((split.stake_home + split.stake_away - capital).abs() <= 1e-9 * capital);
        }
    }

    #[test]
    fn test_reason_display() {
        let r = NoArbReason::BelowThreshold { profit_pct: 2.004, min_profit_pct: 5.0 };
        assert_eq!(r.to_string(), "profit 2.00% below minimum 5%");
    }
}
