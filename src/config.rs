//! Runtime config: `.env` → environment → positional args
//! (`<capital> <wait_secs> <min_profit_pct>`), later wins.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_CAPITAL: f64 = 1000.0;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_BOT_NAME: &str = "TennisArb";

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub token:    String,
    pub chat_id:  String,
    pub bot_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub capital:            f64,
    pub poll_interval_secs: u64,
    pub min_profit_pct:     f64,
    pub log_dir:            PathBuf,
    pub sport:              String,
    pub telegram:           Option<TelegramConfig>,
}

impl Config {
    pub fn from_env_and_args() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(|key| env::var(key).ok(), &args)
    }

    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>, args: &[String]) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut capital = parse_opt::<f64>(var("ARB_CAPITAL"), "ARB_CAPITAL")?.unwrap_or(DEFAULT_CAPITAL);
        let mut poll_interval_secs = parse_opt::<u64>(var("ARB_POLL_INTERVAL_SECS"), "ARB_POLL_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let mut min_profit_pct = parse_opt::<f64>(var("ARB_MIN_PROFIT_PCT"), "ARB_MIN_PROFIT_PCT")?.unwrap_or(0.0);

        match args {
            [] => {}
            [c, w, m] => {
                capital = parse(c, "capital")?;
                poll_interval_secs = parse(w, "wait_time")?;
                min_profit_pct = parse(m, "min_profit_percentage")?;
            }
            _ => bail!("usage: arb-observer [<capital> <wait_time> <min_profit_percentage>]"),
        }

        if !capital.is_finite() || capital <= 0.0 {
            bail!("capital must be a positive number, got {capital}");
        }
        if !min_profit_pct.is_finite() {
            bail!("min profit percentage must be finite");
        }

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHANNEL_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id,
                bot_name: var("TELEGRAM_BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            capital,
            poll_interval_secs,
            min_profit_pct,
            log_dir: var("ARB_LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs")),
            sport: var("ARB_SPORT").unwrap_or_else(|| "tennis".to_string()),
            telegram,
        })
    }
}

fn parse<T>(raw: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse::<T>().with_context(|| format!("invalid {what}: '{raw}'"))
}

fn parse_opt<T>(raw: Option<String>, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|r| parse(&r, what)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], args: &[&str]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        Config::from_sources(|k| vars.get(k).cloned(), &args)
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&[], &[]).unwrap();
        assert_eq!(cfg.capital, 1000.0);
        assert_eq!(cfg.poll_interval_secs, 60);
        assert_eq!(cfg.min_profit_pct, 0.0);
        assert_eq!(cfg.log_dir, PathBuf::from("logs"));
        assert_eq!(cfg.sport, "tennis");
        assert!(cfg.telegram.is_none());
    }

    #[test]
    fn test_args_override_env() {
        let cfg = load(&[("ARB_CAPITAL", "500"), ("ARB_MIN_PROFIT_PCT", "2")], &["100000", "30", "1.5"]).unwrap();
        assert_eq!(cfg.capital, 100_000.0);
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.min_profit_pct, 1.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("ARB_CAPITAL", "lots")], &[]).is_err());
        assert!(load(&[], &["0", "30", "1"]).is_err());
        assert!(load(&[], &["100", "-5", "1"]).is_err());
        assert!(load(&[], &["100", "30"]).is_err());
    }

    #[test]
    fn test_telegram_needs_token_and_channel() {
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "abc")], &[]).unwrap().telegram.is_none());

        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "abc"), ("TELEGRAM_CHANNEL_ID", "-100")], &[]).unwrap();
        let tg = cfg.telegram.unwrap();
        assert_eq!(tg.chat_id, "-100");
        assert_eq!(tg.bot_name, "TennisArb");
    }
}
