use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::StatsError;
use crate::resolve::{self, Candidate, MatchResult, Resolution};
use crate::tables::{Dataset, SeasonRow, Table, TableCache};

/// Statistical normalization mode for career aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    PerGame,
    Per36,
    Per100,
}

impl Basis {
    pub fn parse(raw: &str) -> Option<Basis> {
        match raw {
            "per_game" => Some(Basis::PerGame),
            "per_36" => Some(Basis::Per36),
            "per_100" => Some(Basis::Per100),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Basis::PerGame => "per_game",
            Basis::Per36 => "per_36",
            Basis::Per100 => "per_100",
        }
    }

    pub fn dataset(self) -> Dataset {
        match self {
            Basis::PerGame => Dataset::PerGame,
            Basis::Per36 => Dataset::Per36,
            Basis::Per100 => Dataset::Per100,
        }
    }

    /// Column names for the tracked stats in this basis's table.
    fn columns(self) -> BasisColumns {
        match self {
            Basis::PerGame => BasisColumns {
                pts: "pts_per_game",
                ast: "ast_per_game",
                trb: "trb_per_game",
            },
            Basis::Per36 => BasisColumns {
                pts: "pts_per_36_min",
                ast: "ast_per_36_min",
                trb: "trb_per_36_min",
            },
            Basis::Per100 => BasisColumns {
                pts: "pts_per_100_poss",
                ast: "ast_per_100_poss",
                trb: "trb_per_100_poss",
            },
        }
    }
}

struct BasisColumns {
    pts: &'static str,
    ast: &'static str,
    trb: &'static str,
}

/// One season after stint merging: either the aggregate "total" row's values
/// or a games-weighted combination of the stint rows.
#[derive(Debug, Clone)]
pub struct SeasonLine {
    pub season: i32,
    pub team: String,
    pub games: u32,
    pub stats: BTreeMap<String, f64>,
    /// Per-team stint codes in file (chronological) order, aggregate markers
    /// excluded.
    pub stint_teams: Vec<String>,
}

/// Group rows by season and merge each season's stints, ascending by season.
///
/// If a season carries an aggregate row it is used alone for the stat values
/// (the stint rows still report which teams were played for); duplicated
/// aggregate rows are a data-quality failure rather than a silent pick.
pub fn merge_seasons(rows: &[&SeasonRow]) -> Result<Vec<SeasonLine>, StatsError> {
    let mut by_season: BTreeMap<i32, Vec<&SeasonRow>> = BTreeMap::new();
    for &row in rows {
        let Some(season) = row.season else { continue };
        by_season.entry(season).or_default().push(row);
    }

    let mut out = Vec::with_capacity(by_season.len());
    for (season, group) in by_season {
        out.push(merge_one_season(season, &group)?);
    }
    Ok(out)
}

fn merge_one_season(season: i32, group: &[&SeasonRow]) -> Result<SeasonLine, StatsError> {
    let mut stint_teams: Vec<String> = Vec::new();
    for row in group {
        if row.is_multi_team_total() || row.team.is_empty() {
            continue;
        }
        if !stint_teams.contains(&row.team) {
            stint_teams.push(row.team.clone());
        }
    }

    let mut aggregates = group.iter().filter(|row| row.is_multi_team_total());
    if let Some(total) = aggregates.next() {
        if aggregates.next().is_some() {
            return Err(StatsError::DataQuality(format!(
                "duplicate aggregate rows for '{}' in season {season}",
                total.name
            )));
        }
        return Ok(SeasonLine {
            season,
            team: total.team.clone(),
            games: total.games,
            stats: total.stats.clone(),
            stint_teams,
        });
    }

    // No aggregate row: weight each stat by stint games, pairwise so a stint
    // missing one column still contributes to the others.
    let mut acc: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    let mut games = 0u32;
    for row in group {
        games += row.games;
        if row.games == 0 {
            continue;
        }
        let weight = f64::from(row.games);
        for (key, value) in &row.stats {
            let slot = acc.entry(key.as_str()).or_insert((0.0, 0.0));
            slot.0 += value * weight;
            slot.1 += weight;
        }
    }
    let stats = acc
        .into_iter()
        .filter(|(_, (_, den))| *den > 0.0)
        .map(|(key, (num, den))| (key.to_string(), num / den))
        .collect();

    let team = match stint_teams.len() {
        0 => String::new(),
        1 => stint_teams[0].clone(),
        _ => stint_teams.join("/"),
    };
    Ok(SeasonLine {
        season,
        team,
        games,
        stats,
        stint_teams,
    })
}

/// Games-weighted career mean of one stat across merged seasons; `None`
/// ("no data") when no season contributes any weight.
pub fn weighted_average(lines: &[SeasonLine], stat: &str) -> Option<f64> {
    let mut num = 0.0;
    let mut den = 0.0;
    for line in lines {
        if line.games == 0 {
            continue;
        }
        let Some(value) = line.stats.get(stat) else {
            continue;
        };
        num += value * f64::from(line.games);
        den += f64::from(line.games);
    }
    (den > 0.0).then(|| num / den)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CareerSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trb: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AwardShare {
    pub award: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<i32>,
    pub share: f64,
    pub winner: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    #[serde(rename = "match")]
    pub name: String,
    pub score: f64,
    pub span: CareerSpan,
    pub teams: Vec<String>,
    pub career_avgs: StatLine,
    pub games: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_star_selections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_award_shares: Option<Vec<AwardShare>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareSide {
    #[serde(rename = "match")]
    pub name: String,
    pub score: f64,
    pub g: u32,
    #[serde(flatten)]
    pub stats: StatLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub basis: &'static str,
    pub player_a: CompareSide,
    pub player_b: CompareSide,
}

/// Compact career overview: span, teams, weighted averages, All-Star and
/// award enrichment.
pub fn player_summary(cache: &TableCache, query: &str) -> Result<PlayerSummary, StatsError> {
    let per_game = cache.get(Dataset::PerGame)?;
    let best = resolve_player(query, per_game)?;

    let rows: Vec<&SeasonRow> = per_game.rows_for(&best.name).collect();
    let lines = merge_seasons(&rows)?;
    let columns = Basis::PerGame.columns();

    let mut career = StatLine {
        pts: weighted_average(&lines, columns.pts),
        ast: weighted_average(&lines, columns.ast),
        trb: weighted_average(&lines, columns.trb),
    };
    fill_from_totals(cache, &best.name, &mut career)?;

    let span = career_span(cache, &best.name, &lines);

    let mut teams = Vec::new();
    for line in &lines {
        for team in &line.stint_teams {
            if !teams.contains(team) {
                teams.push(team.clone());
            }
        }
    }

    let games = lines.iter().map(|line| line.games).sum();
    let all_star_selections = all_star_count(cache, &best.name);
    let top_award_shares = top_award_shares(cache, &best.name);

    Ok(PlayerSummary {
        name: best.name,
        score: round2(best.score),
        span,
        teams,
        career_avgs: StatLine {
            pts: career.pts.map(round2),
            ast: career.ast.map(round2),
            trb: career.trb.map(round2),
        },
        games,
        all_star_selections,
        top_award_shares,
    })
}

/// Compare two careers on one basis table.
pub fn compare_players(
    cache: &TableCache,
    player_a: &str,
    player_b: &str,
    basis: Basis,
) -> Result<Comparison, StatsError> {
    let table = cache.get(basis.dataset())?;
    Ok(Comparison {
        basis: basis.as_str(),
        player_a: compare_side(table, player_a, basis)?,
        player_b: compare_side(table, player_b, basis)?,
    })
}

fn compare_side(table: &Table, query: &str, basis: Basis) -> Result<CompareSide, StatsError> {
    let best = resolve_player(query, table)?;
    let rows: Vec<&SeasonRow> = table.rows_for(&best.name).collect();
    let lines = merge_seasons(&rows)?;
    let columns = basis.columns();
    Ok(CompareSide {
        name: best.name,
        score: round2(best.score),
        g: lines.iter().map(|line| line.games).sum(),
        stats: StatLine {
            pts: weighted_average(&lines, columns.pts).map(round2),
            ast: weighted_average(&lines, columns.ast).map(round2),
            trb: weighted_average(&lines, columns.trb).map(round2),
        },
    })
}

fn resolve_player(query: &str, table: &Table) -> Result<MatchResult, StatsError> {
    let candidates: Vec<Candidate> = table
        .distinct_names()
        .into_iter()
        .map(Candidate::new)
        .collect();
    match resolve::resolve(query, &candidates) {
        Resolution::Match(m) => Ok(m),
        Resolution::NotFound { best_score } => Err(StatsError::PlayerNotFound {
            query: query.to_string(),
            best_score,
        }),
    }
}

/// Early seasons miss some per-game columns entirely; recompute those career
/// rates from the counting-stat totals (`sum(stat) / sum(games)`) instead of
/// dropping them.
fn fill_from_totals(
    cache: &TableCache,
    name: &str,
    career: &mut StatLine,
) -> Result<(), StatsError> {
    if career.pts.is_some() && career.ast.is_some() && career.trb.is_some() {
        return Ok(());
    }
    let totals = match cache.get(Dataset::Totals) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!("totals fallback unavailable: {err}");
            return Ok(());
        }
    };
    let rows: Vec<&SeasonRow> = totals.rows_for(name).collect();
    let lines = merge_seasons(&rows)?;
    career.pts = career.pts.or_else(|| rate_from_totals(&lines, "pts"));
    career.ast = career.ast.or_else(|| rate_from_totals(&lines, "ast"));
    career.trb = career.trb.or_else(|| rate_from_totals(&lines, "trb"));
    Ok(())
}

fn rate_from_totals(lines: &[SeasonLine], stat: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut games = 0.0;
    for line in lines {
        if line.games == 0 {
            continue;
        }
        let Some(value) = line.stats.get(stat) else {
            continue;
        };
        total += value;
        games += f64::from(line.games);
    }
    (games > 0.0).then(|| total / games)
}

fn career_span(cache: &TableCache, name: &str, lines: &[SeasonLine]) -> CareerSpan {
    let from = lines.first().map(|line| line.season);
    let to = lines.last().map(|line| line.season);
    if from.is_some() {
        return CareerSpan { from, to };
    }
    // Rows without a usable season column: fall back to the career-info
    // table's first/last season.
    let Ok(career) = cache.get(Dataset::CareerInfo) else {
        return CareerSpan::default();
    };
    let Some(row) = career.rows_for(name).next() else {
        return CareerSpan::default();
    };
    CareerSpan {
        from: row.stat("first_seas").map(|v| v as i32),
        to: row.stat("last_seas").map(|v| v as i32),
    }
}

/// Selection count, `None` (field omitted) when the dataset is absent.
fn all_star_count(cache: &TableCache, name: &str) -> Option<u32> {
    let table = match cache.get(Dataset::AllStar) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!("all-star enrichment unavailable: {err}");
            return None;
        }
    };
    // The enrichment tables key on the same canonical names as the per-game
    // table, so an exact row lookup on the resolved name is enough.
    Some(table.rows_for(name).count() as u32)
}

/// Highest share per distinct award, `None` when the dataset is absent.
fn top_award_shares(cache: &TableCache, name: &str) -> Option<Vec<AwardShare>> {
    let table = match cache.get(Dataset::AwardShares) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!("award enrichment unavailable: {err}");
            return None;
        }
    };

    let mut by_award: BTreeMap<&str, &SeasonRow> = BTreeMap::new();
    for row in table.rows_for(name) {
        let Some(award) = row.award.as_deref() else {
            continue;
        };
        if row.stat("share").is_none() {
            continue;
        }
        by_award
            .entry(award)
            .and_modify(|current| {
                let held = current.stat("share").unwrap_or(f64::MIN);
                let offered = row.stat("share").unwrap_or(f64::MIN);
                // Strictly-greater keeps the earliest season on equal shares.
                if offered > held {
                    *current = row;
                }
            })
            .or_insert(row);
    }

    Some(
        by_award
            .into_values()
            .map(|row| AwardShare {
                award: row.award.clone().unwrap_or_default(),
                season: row.season,
                share: row.stat("share").unwrap_or(0.0),
                winner: row.stat("winner") == Some(1.0),
            })
            .collect(),
    )
}
