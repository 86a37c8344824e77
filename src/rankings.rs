use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{merge_seasons, round2};
use crate::error::StatsError;
use crate::tables::{Dataset, SeasonRow, TableCache};

const SCORING_METRIC: &str = "pts_per_game";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankEntry {
    pub player: String,
    pub team: String,
    pub pts_per_game: f64,
    pub g: u32,
}

/// Top-N points-per-game leaders for one season.
///
/// A season with zero rows returns an empty list; only a missing dataset is
/// an error. Fewer than `n` qualifying players returns all of them.
pub fn top_scorers(cache: &TableCache, season: i32, n: usize) -> Result<Vec<RankEntry>, StatsError> {
    leaders_by(cache, season, n, SCORING_METRIC)
}

fn leaders_by(
    cache: &TableCache,
    season: i32,
    n: usize,
    metric: &str,
) -> Result<Vec<RankEntry>, StatsError> {
    let table = cache.get(Dataset::PerGame)?;

    let mut by_player: BTreeMap<&str, Vec<&SeasonRow>> = BTreeMap::new();
    for row in &table.rows {
        if row.season == Some(season) {
            by_player.entry(row.name.as_str()).or_default().push(row);
        }
    }

    let mut entries = Vec::with_capacity(by_player.len());
    for (player, rows) in by_player {
        let lines = merge_seasons(&rows)?;
        let Some(line) = lines.first() else { continue };
        let Some(value) = line.stats.get(metric).copied() else {
            continue;
        };
        entries.push(RankEntry {
            player: player.to_string(),
            team: line.team.clone(),
            pts_per_game: round2(value),
            g: line.games,
        });
    }

    entries.sort_by(rank_order);
    entries.truncate(n);
    Ok(entries)
}

/// Metric descending, then games descending, then name ascending, so equal
/// scorers always list in the same order.
fn rank_order(a: &RankEntry, b: &RankEntry) -> Ordering {
    b.pts_per_game
        .partial_cmp(&a.pts_per_game)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.g.cmp(&a.g))
        .then_with(|| a.player.cmp(&b.player))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(player: &str, value: f64, g: u32) -> RankEntry {
        RankEntry {
            player: player.to_string(),
            team: "AAA".to_string(),
            pts_per_game: value,
            g,
        }
    }

    #[test]
    fn orders_by_metric_then_games_then_name() {
        let mut entries = vec![
            entry("Charlie", 20.0, 60),
            entry("Alpha", 20.0, 70),
            entry("Bravo", 20.0, 70),
            entry("Delta", 25.0, 10),
        ];
        entries.sort_by(rank_order);
        let order: Vec<&str> = entries.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(order, vec!["Delta", "Alpha", "Bravo", "Charlie"]);
    }
}
