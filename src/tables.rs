use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::error::StatsError;

/// The CSV tables the engine can address, one per backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    PerGame,
    Per36,
    Per100,
    Totals,
    CareerInfo,
    AllStar,
    AwardShares,
    TeamSummaries,
    TeamStatsPerGame,
}

pub const ALL_DATASETS: [Dataset; 9] = [
    Dataset::PerGame,
    Dataset::Per36,
    Dataset::Per100,
    Dataset::Totals,
    Dataset::CareerInfo,
    Dataset::AllStar,
    Dataset::AwardShares,
    Dataset::TeamSummaries,
    Dataset::TeamStatsPerGame,
];

impl Dataset {
    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::PerGame => "Player Per Game.csv",
            Dataset::Per36 => "Per 36 Minutes.csv",
            Dataset::Per100 => "Per 100 Poss.csv",
            Dataset::Totals => "Player Totals.csv",
            Dataset::CareerInfo => "Player Career Info.csv",
            Dataset::AllStar => "All-Star Selections.csv",
            Dataset::AwardShares => "Player Award Shares.csv",
            Dataset::TeamSummaries => "Team Summaries.csv",
            Dataset::TeamStatsPerGame => "Team Stats Per Game.csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dataset::PerGame => "per_game",
            Dataset::Per36 => "per_36",
            Dataset::Per100 => "per_100",
            Dataset::Totals => "totals",
            Dataset::CareerInfo => "career_info",
            Dataset::AllStar => "all_star",
            Dataset::AwardShares => "award_shares",
            Dataset::TeamSummaries => "team_summaries",
            Dataset::TeamStatsPerGame => "team_stats_per_game",
        }
    }

    /// Column whose value identifies the row's entity.
    fn key_column(self) -> &'static str {
        match self {
            Dataset::TeamSummaries | Dataset::TeamStatsPerGame => "team",
            _ => "player",
        }
    }
}

/// One record from a per-season table, immutable after load.
///
/// `team` holds the player tables' team code (possibly a multi-team
/// aggregate marker) or the team tables' abbreviation. Every numeric column
/// other than the identity ones lands in `stats`; blank or unparseable cells
/// are simply absent, which is how incomplete historical seasons show up.
#[derive(Debug, Clone)]
pub struct SeasonRow {
    pub season: Option<i32>,
    pub name: String,
    pub team: String,
    pub games: u32,
    pub playoffs: bool,
    pub award: Option<String>,
    pub stats: BTreeMap<String, f64>,
}

impl SeasonRow {
    pub fn stat(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied()
    }

    /// True for the aggregate "total" rows a traded player gets in addition
    /// to the per-team stint rows.
    pub fn is_multi_team_total(&self) -> bool {
        is_multi_team_code(&self.team)
    }
}

/// `TOT` plus the newer `2TM`/`3TM`-style markers, matched by shape rather
/// than substring so real abbreviations can never collide.
pub fn is_multi_team_code(code: &str) -> bool {
    if code == "TOT" {
        return true;
    }
    let mut chars = code.chars();
    matches!(
        (chars.next(), chars.next(), chars.next(), chars.next()),
        (Some(d), Some('T'), Some('M'), None) if d.is_ascii_digit()
    )
}

/// A fully loaded dataset: ordered rows plus a normalized-key index so
/// per-query lookups do not rescan the whole vector.
#[derive(Debug)]
pub struct Table {
    pub dataset: Dataset,
    pub rows: Vec<SeasonRow>,
    index: HashMap<String, Vec<usize>>,
}

impl Table {
    fn new(dataset: Dataset, rows: Vec<SeasonRow>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, row) in rows.iter().enumerate() {
            index.entry(normalize_key(&row.name)).or_default().push(pos);
        }
        Self {
            dataset,
            rows,
            index,
        }
    }

    /// Rows for one entity, in stored (file) order.
    pub fn rows_for(&self, name: &str) -> impl Iterator<Item = &SeasonRow> {
        self.index
            .get(&normalize_key(name))
            .into_iter()
            .flatten()
            .map(|&pos| &self.rows[pos])
    }

    /// Distinct raw entity names, sorted for deterministic candidate pools.
    pub fn distinct_names(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|row| row.name.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Lazy, load-once cache over the dataset files.
///
/// Each dataset has its own cell, so the first caller performs the load and
/// publishes an immutable `Table`; concurrent first callers block on the same
/// cell rather than loading twice, and a failed load does not poison the
/// slot or any sibling dataset.
pub struct TableCache {
    data_dir: PathBuf,
    slots: [OnceCell<Table>; ALL_DATASETS.len()],
}

impl TableCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            slots: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn get(&self, dataset: Dataset) -> Result<&Table, StatsError> {
        self.slots[dataset as usize].get_or_try_init(|| load_table(&self.data_dir, dataset))
    }
}

fn load_table(dir: &Path, dataset: Dataset) -> Result<Table, StatsError> {
    let path = dir.join(dataset.file_name());
    let unavailable = |reason: String| StatsError::DataUnavailable {
        dataset: dataset.name(),
        reason,
    };

    let file =
        File::open(&path).map_err(|err| unavailable(format!("{}: {err}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|err| unavailable(format!("bad header in {}: {err}", path.display())))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|err| unavailable(format!("bad record in {}: {err}", path.display())))?;
        if let Some(row) = parse_row(dataset, &headers, &record) {
            rows.push(row);
        }
    }
    tracing::debug!(dataset = dataset.name(), rows = rows.len(), "loaded table");
    Ok(Table::new(dataset, rows))
}

fn parse_row(
    dataset: Dataset,
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
) -> Option<SeasonRow> {
    let key_column = dataset.key_column();
    let mut season = None;
    let mut name = String::new();
    let mut team = String::new();
    let mut games = 0u32;
    let mut playoffs = false;
    let mut award = None;
    let mut stats = BTreeMap::new();

    for (header, raw) in headers.iter().zip(record.iter()) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        if header == key_column {
            name = raw.to_string();
        } else if header == "season" {
            season = parse_value(raw).map(|v| v as i32);
        } else if header == "g" {
            games = parse_value(raw).map_or(0, |v| v.max(0.0) as u32);
        } else if header == "playoffs" {
            playoffs = matches!(raw.to_ascii_lowercase().as_str(), "true" | "1");
        } else if header == "award" {
            award = Some(raw.to_string());
        } else if (header == "team" || header == "tm") && key_column == "player" {
            team = raw.to_string();
        } else if header == "abbreviation" && key_column == "team" {
            team = raw.to_string();
        } else if let Some(value) = parse_value(raw) {
            stats.insert(header.to_string(), value);
        }
    }

    if name.is_empty() {
        return None;
    }
    Some(SeasonRow {
        season,
        name,
        team,
        games,
        playoffs,
        award,
        stats,
    })
}

/// Numeric cell parse; TRUE/FALSE cells (award winner flags) map to 1/0.
fn parse_value(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "NA" {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(1.0),
        "false" => Some(0.0),
        _ => None,
    }
}
