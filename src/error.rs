use thiserror::Error;

/// Failures the query engine can surface to a caller.
///
/// Per-stat "no data" (a resolved player whose weighting has zero total
/// games) is not represented here; it shows up as an absent field on the
/// result object so the remaining stats still return.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A required dataset could not be loaded. Fatal for the current query,
    /// harmless for queries against other datasets.
    #[error("dataset '{dataset}' unavailable: {reason}")]
    DataUnavailable {
        dataset: &'static str,
        reason: String,
    },

    #[error("player '{query}' not found (best score {best_score:.1})")]
    PlayerNotFound { query: String, best_score: f64 },

    #[error("team '{query}' not found (best score {best_score:.1})")]
    TeamNotFound { query: String, best_score: f64 },

    /// A season-scoped operation that strictly requires the season found no
    /// rows for it in an otherwise healthy dataset.
    #[error("no rows for season {0}")]
    SeasonNotFound(i32),

    /// Rows whose precedence should be unambiguous (one aggregate row per
    /// player-season, one regular-season row per team-season) came back
    /// duplicated. We refuse to pick one silently.
    #[error("data quality: {0}")]
    DataQuality(String),
}
