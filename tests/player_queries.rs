use std::path::PathBuf;

use dunkmaster_stats::aggregate::{compare_players, player_summary, Basis};
use dunkmaster_stats::error::StatsError;
use dunkmaster_stats::tables::TableCache;

fn fixture_cache(set: &str) -> TableCache {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(set);
    TableCache::new(path)
}

#[test]
fn career_averages_weight_by_games_not_seasons() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "Weight Case").expect("player resolves");
    // (10*20 + 30*10) / 40, not the naive season mean of 15.
    assert_eq!(summary.career_avgs.pts, Some(12.5));
    assert_eq!(summary.games, 40);
    assert_eq!(summary.span.from, Some(2001));
    assert_eq!(summary.span.to, Some(2002));
}

#[test]
fn traded_season_merges_stints_and_keeps_team_order() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "Trady Splitsman").expect("player resolves");
    assert_eq!(summary.career_avgs.pts, Some(21.67));
    assert_eq!(summary.teams, vec!["AAA", "BBB"]);
    assert_eq!(summary.games, 60);
}

#[test]
fn aggregate_total_row_is_used_alone_for_its_season() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "Tot Haver").expect("player resolves");
    assert_eq!(summary.career_avgs.pts, Some(18.0));
    assert_eq!(summary.games, 50);
    // Stint rows still say which teams were played for.
    assert_eq!(summary.teams, vec!["CCC", "DDD"]);
}

#[test]
fn summary_includes_awards_and_all_star_enrichment() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "jordan").expect("single token resolves");
    assert_eq!(summary.name, "Michael Jordan");
    assert_eq!(summary.career_avgs.pts, Some(30.0));
    assert_eq!(summary.career_avgs.trb, Some(6.25));
    assert_eq!(summary.all_star_selections, Some(2));

    let awards = summary.top_award_shares.expect("awards dataset present");
    assert_eq!(awards.len(), 2);
    // Sorted by award name; each entry carries the best season's share.
    assert_eq!(awards[0].award, "dpoy");
    assert!(!awards[0].winner);
    assert_eq!(awards[1].award, "nba mvp");
    assert_eq!(awards[1].share, 0.873);
    assert_eq!(awards[1].season, Some(1996));
    assert!(awards[1].winner);
}

#[test]
fn missing_enrichment_datasets_omit_fields_instead_of_failing() {
    let cache = fixture_cache("minimal");
    let summary = player_summary(&cache, "Michael Jordan").expect("core datasets suffice");
    assert_eq!(summary.all_star_selections, None);
    assert_eq!(summary.top_award_shares, None);

    let json = serde_json::to_value(&summary).expect("serializes");
    assert!(json.get("all_star_selections").is_none());
    assert!(json.get("top_award_shares").is_none());
}

#[test]
fn absent_per_game_columns_fall_back_to_counting_totals() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "Early Fella").expect("player resolves");
    // trb_per_game is blank for 1950; 480 rebounds over 60 games fills it.
    assert_eq!(summary.career_avgs.trb, Some(8.0));
    assert_eq!(summary.career_avgs.pts, Some(15.0));
}

#[test]
fn span_falls_back_to_career_info_when_rows_lack_seasons() {
    let cache = fixture_cache("full");
    let summary = player_summary(&cache, "No Season Man").expect("player resolves");
    assert_eq!(summary.span.from, Some(1947));
    assert_eq!(summary.span.to, Some(1948));
    // Zero usable games: explicit no-data, not a crash.
    assert_eq!(summary.career_avgs.pts, None);
    assert_eq!(summary.games, 0);
}

#[test]
fn unresolvable_query_is_player_not_found_with_the_query_text() {
    let cache = fixture_cache("full");
    let err = player_summary(&cache, "xqzw qblt").unwrap_err();
    match err {
        StatsError::PlayerNotFound { query, best_score } => {
            assert_eq!(query, "xqzw qblt");
            assert!(best_score < 70.0);
        }
        other => panic!("expected PlayerNotFound, got {other:?}"),
    }
}

#[test]
fn compare_uses_the_requested_basis_table() {
    let cache = fixture_cache("full");
    let result =
        compare_players(&cache, "jordan", "malone", Basis::Per36).expect("both resolve");
    assert_eq!(result.basis, "per_36");
    assert_eq!(result.player_a.name, "Michael Jordan");
    assert_eq!(result.player_a.g, 164);
    assert_eq!(result.player_a.stats.pts, Some(28.6));
    assert_eq!(result.player_b.name, "Karl Malone");
    assert_eq!(result.player_b.g, 82);
    assert_eq!(result.player_b.stats.pts, Some(24.3));
}

#[test]
fn repeated_queries_give_byte_identical_results() {
    let cache = fixture_cache("full");
    let first = serde_json::to_string(&player_summary(&cache, "Tot Haver").unwrap()).unwrap();
    let second = serde_json::to_string(&player_summary(&cache, "Tot Haver").unwrap()).unwrap();
    assert_eq!(first, second);
}
