use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::round2;
use crate::error::StatsError;
use crate::resolve::{self, Candidate, MatchResult, Resolution};
use crate::tables::{Dataset, SeasonRow, TableCache};

#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    #[serde(rename = "match")]
    pub team: String,
    pub score: f64,
    pub season: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    pub summary: TeamMetrics,
}

/// Ratings from the summary table joined with per-game box stats; a field
/// absent from both sources stays absent rather than reading as zero.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TeamMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o_rtg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d_rtg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_rtg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_fg_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tov_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orb_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ft_fga: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts_per_game: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trb_per_game: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast_per_game: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x3p_percent: Option<f64>,
}

/// W/L, SRS, ratings, pace and shooting/possession metrics for one
/// team-season, resolved by name or abbreviation.
pub fn team_summary(
    cache: &TableCache,
    season: i32,
    query: &str,
) -> Result<TeamSummary, StatsError> {
    let summaries = cache.get(Dataset::TeamSummaries)?;
    let season_rows: Vec<&SeasonRow> = summaries
        .rows
        .iter()
        .filter(|row| row.season == Some(season))
        .collect();
    if season_rows.is_empty() {
        return Err(StatsError::SeasonNotFound(season));
    }

    let best = resolve_team(query, &season_rows)?;
    let row = pick_team_row(&season_rows, &best.name, season)?.ok_or_else(|| {
        // The candidate came from these rows, so this only fires on a
        // pathological name mismatch.
        StatsError::TeamNotFound {
            query: query.to_string(),
            best_score: best.score,
        }
    })?;

    let mut metrics = TeamMetrics::default();
    fill_summary_metrics(&mut metrics, row);

    match cache.get(Dataset::TeamStatsPerGame) {
        Ok(per_game) => {
            let pg_rows: Vec<&SeasonRow> = per_game
                .rows
                .iter()
                .filter(|row| row.season == Some(season))
                .collect();
            if let Some(pg_row) = pick_team_row(&pg_rows, &best.name, season)? {
                fill_per_game_metrics(&mut metrics, pg_row);
            }
        }
        Err(err) => tracing::warn!("per-game team stats unavailable: {err}"),
    }

    Ok(TeamSummary {
        team: best.name,
        score: round2(best.score),
        season,
        abbreviation: (!row.team.is_empty()).then(|| row.team.clone()),
        summary: metrics,
    })
}

fn resolve_team(query: &str, season_rows: &[&SeasonRow]) -> Result<MatchResult, StatsError> {
    // One candidate per team name in this season; the abbreviation column is
    // the alias set (several abbreviations can map to one franchise across
    // eras, but within a season the mapping is one-to-one).
    let mut by_name: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for row in season_rows {
        let entry = by_name.entry(row.name.as_str()).or_insert(None);
        if entry.is_none() && !row.team.is_empty() {
            *entry = Some(row.team.as_str());
        }
    }
    let candidates: Vec<Candidate> = by_name
        .into_iter()
        .map(|(name, abbr)| {
            let candidate = Candidate::new(name);
            match abbr {
                Some(abbr) => candidate.with_alias(abbr),
                None => candidate,
            }
        })
        .collect();

    match resolve::resolve(query, &candidates) {
        Resolution::Match(m) => Ok(m),
        Resolution::NotFound { best_score } => Err(StatsError::TeamNotFound {
            query: query.to_string(),
            best_score,
        }),
    }
}

/// Pick the row for one (season, team): regular-season rows beat playoff
/// rows, and duplicates within the preferred tier are refused.
fn pick_team_row<'a>(
    rows: &[&'a SeasonRow],
    team_name: &str,
    season: i32,
) -> Result<Option<&'a SeasonRow>, StatsError> {
    let matched: Vec<&SeasonRow> = rows
        .iter()
        .copied()
        .filter(|row| row.name.trim().eq_ignore_ascii_case(team_name.trim()))
        .collect();
    if matched.is_empty() {
        return Ok(None);
    }

    let regular: Vec<&SeasonRow> = matched
        .iter()
        .copied()
        .filter(|row| !row.playoffs)
        .collect();
    let (tier, pick) = if regular.is_empty() {
        ("playoff", matched)
    } else {
        ("regular-season", regular)
    };
    if pick.len() > 1 {
        return Err(StatsError::DataQuality(format!(
            "duplicate {tier} rows for '{team_name}' in season {season}"
        )));
    }
    Ok(Some(pick[0]))
}

fn fill_summary_metrics(metrics: &mut TeamMetrics, row: &SeasonRow) {
    metrics.w = row.stat("w").map(|v| v.round() as u32);
    metrics.l = row.stat("l").map(|v| v.round() as u32);
    metrics.srs = row.stat("srs");
    metrics.o_rtg = row.stat("o_rtg");
    metrics.d_rtg = row.stat("d_rtg");
    metrics.n_rtg = row.stat("n_rtg").or(match (metrics.o_rtg, metrics.d_rtg) {
        (Some(o), Some(d)) => Some(round2(o - d)),
        _ => None,
    });
    metrics.pace = row.stat("pace");
    metrics.ts_percent = row.stat("ts_percent").map(as_percent);
    metrics.e_fg_percent = row.stat("e_fg_percent").map(as_percent);
    metrics.tov_percent = row.stat("tov_percent").map(as_percent);
    metrics.orb_percent = row.stat("orb_percent").map(as_percent);
    metrics.ft_fga = row.stat("ft_fga");
}

fn fill_per_game_metrics(metrics: &mut TeamMetrics, row: &SeasonRow) {
    metrics.pts_per_game = row.stat("pts_per_game");
    metrics.trb_per_game = row.stat("trb_per_game");
    metrics.ast_per_game = row.stat("ast_per_game");
    metrics.x3p_percent = row.stat("x3p_percent").map(as_percent);
}

/// Shooting/possession shares appear both as fractions and as already-scaled
/// percentages across source eras; normalize to the 0-100 scale.
fn as_percent(value: f64) -> f64 {
    if value <= 1.0 {
        round2(value * 100.0)
    } else {
        value
    }
}
