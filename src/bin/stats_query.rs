//! One-shot query runner for ad-hoc use without a JSON-RPC host.
//!
//! ```text
//! stats_query --data <dir> player-summary "Michael Jordan"
//! stats_query --data <dir> top-scorers 1996 [n]
//! stats_query --data <dir> compare "Jordan" "Malone" [per_game|per_36|per_100]
//! stats_query --data <dir> team-summary 1996 "CHI"
//! ```

use anyhow::{Context, Result, anyhow};

use dunkmaster_stats::aggregate::{self, Basis};
use dunkmaster_stats::tables::TableCache;
use dunkmaster_stats::{config, rankings, team_summary};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    config::load_dotenv();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let data_dir = config::resolve_data_dir(&args)?;
    let cache = TableCache::new(data_dir);

    let positional = strip_data_flag(&args);
    let Some(command) = positional.first() else {
        return Err(anyhow!(
            "usage: stats_query --data <dir> <player-summary|top-scorers|compare|team-summary> ..."
        ));
    };
    let rest = &positional[1..];

    let value = match command.as_str() {
        "player-summary" => {
            let player = rest.first().context("player-summary needs a player name")?;
            serde_json::to_value(aggregate::player_summary(&cache, player)?)?
        }
        "top-scorers" => {
            let season = parse_season(rest.first())?;
            let n = match rest.get(1) {
                Some(raw) => raw.parse::<usize>().context("n must be a positive integer")?,
                None => 10,
            };
            serde_json::to_value(rankings::top_scorers(&cache, season, n)?)?
        }
        "compare" => {
            let player_a = rest.first().context("compare needs two player names")?;
            let player_b = rest.get(1).context("compare needs two player names")?;
            let basis = match rest.get(2) {
                Some(raw) => {
                    Basis::parse(raw).ok_or_else(|| anyhow!("unknown basis '{raw}'"))?
                }
                None => Basis::PerGame,
            };
            serde_json::to_value(aggregate::compare_players(
                &cache, player_a, player_b, basis,
            )?)?
        }
        "team-summary" => {
            let season = parse_season(rest.first())?;
            let team = rest.get(1).context("team-summary needs a team query")?;
            serde_json::to_value(team_summary::team_summary(&cache, season, team)?)?
        }
        other => return Err(anyhow!("unknown command '{other}'")),
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn parse_season(raw: Option<&String>) -> Result<i32> {
    raw.context("a season year is required")?
        .parse::<i32>()
        .context("season must be an integer year")
}

fn strip_data_flag(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--data" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--data=") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}
