use std::path::PathBuf;

use dunkmaster_stats::error::StatsError;
use dunkmaster_stats::rankings::top_scorers;
use dunkmaster_stats::tables::TableCache;

fn fixture_cache() -> TableCache {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("full");
    TableCache::new(path)
}

#[test]
fn returns_leaders_in_descending_metric_order() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1996, 10).expect("season exists");
    let order: Vec<&str> = entries.iter().map(|e| e.player.as_str()).collect();
    assert_eq!(order, vec!["Michael Jordan", "Karl Malone", "Scottie Pippen"]);
    assert_eq!(entries[0].pts_per_game, 30.4);
    assert_eq!(entries[0].team, "CHI");
    assert_eq!(entries[0].g, 82);
}

#[test]
fn short_seasons_return_fewer_entries_not_an_error() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1996, 5).expect("season exists");
    assert_eq!(entries.len(), 3);
}

#[test]
fn n_truncates() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1996, 2).expect("season exists");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].player, "Karl Malone");
}

#[test]
fn aggregate_total_rows_beat_stint_rows() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1999, 10).expect("season exists");
    assert_eq!(entries.len(), 1);
    // The TOT row's 18.0/50g, not the best stint's 20.0/30g.
    assert_eq!(entries[0].pts_per_game, 18.0);
    assert_eq!(entries[0].g, 50);
    assert_eq!(entries[0].team, "TOT");
}

#[test]
fn merged_stints_rank_as_one_player() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1998, 10).expect("season exists");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pts_per_game, 21.67);
    assert_eq!(entries[0].g, 60);
    assert_eq!(entries[0].team, "AAA/BBB");
}

#[test]
fn unknown_season_is_empty_not_an_error() {
    let cache = fixture_cache();
    let entries = top_scorers(&cache, 1890, 10).expect("healthy dataset");
    assert!(entries.is_empty());
}

#[test]
fn missing_dataset_is_fatal() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("does-not-exist");
    let cache = TableCache::new(path);
    let err = top_scorers(&cache, 1996, 10).unwrap_err();
    assert!(matches!(err, StatsError::DataUnavailable { .. }));
}
