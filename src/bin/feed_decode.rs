//! Offline decode uloženého feedu.
//!
//!   cargo run --bin feed-decode -- data/feed.txt          # souhrn
//!   cargo run --bin feed-decode -- data/feed.txt --json   # celý strom jako JSON

use anyhow::{bail, Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (path, as_json) = match args.as_slice() {
        [path] => (path, false),
        [path, flag] if flag == "--json" => (path, true),
        _ => bail!("usage: feed-decode <feed-file> [--json]"),
    };

    let raw = std::fs::read(path).with_context(|| format!("read {path}"))?;
    let feed = feed_parser::decode(&raw).with_context(|| format!("decode {path}"))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&feed).context("serialize feed")?);
        return Ok(());
    }

    println!("file={path}");
    println!("tournaments: {}", feed.tournaments.len());
    println!("matches: {}", feed.match_count());
    println!("featured: {}", feed.featured_matches.len());
    for (k, v) in &feed.metadata {
        println!("meta {k}={v}");
    }

    for t in &feed.tournaments {
        let kind = if t.is_doubles() { "doubles" } else { "singles" };
        println!("\n[{}] {} ({kind}, {} matches)", t.tournament_id, t.display_name(), t.matches.len());
        for m in &t.matches {
            println!(
                "  {} | {} vs {} | {} | sets {}-{}",
                m.match_id,
                m.home_player.label(),
                m.away_player.label(),
                m.start_time.as_deref().unwrap_or("?"),
                m.home_sets_won.as_deref().unwrap_or("-"),
                m.away_sets_won.as_deref().unwrap_or("-"),
            );
        }
    }

    Ok(())
}
