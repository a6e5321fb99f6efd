use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use ncaa_scout::config::ScoringConfig;
use ncaa_scout::curation::{CurationList, backup_file};
use ncaa_scout::dataset::{
    ExportLayout, ExportTable, filter_by_position, filter_players_with_data, load_seasons,
};
use ncaa_scout::error::{Recovery, ScoutError};
use ncaa_scout::model::{Conference, PlayerRecord, PositionProfile};
use ncaa_scout::padj::{TeamPossessions, add_padj_metrics};
use ncaa_scout::team_stats::{TeamDirectory, pct_of_team_minutes, team_name_from_file};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn layout() -> ExportLayout {
    ExportLayout::new(fixture("data"), 2025)
}

fn find<'a>(records: &'a [PlayerRecord], name: &str, season: i32) -> &'a PlayerRecord {
    records
        .iter()
        .find(|r| r.player == name && r.season == season)
        .expect("player should be loaded")
}

#[test]
fn loads_current_and_past_seasons() {
    let loaded = load_seasons(&layout(), &[Conference::Acc], 2024, 2025, None);
    assert_eq!(loaded.files, 2);
    // Three position files per season are not on file.
    assert_eq!(loaded.errors.len(), 6);
    assert_eq!(loaded.records.len(), 10);

    let ava = find(&loaded.records, "Ava Smith", 2025);
    assert_eq!(ava.team, "Virginia Cavaliers");
    assert_eq!(ava.position, "RCB, LCB");
    assert_eq!(ava.profile, PositionProfile::HybridCb);
    assert_eq!(ava.value("Interceptions per 90"), Some(3.1));
    assert_eq!(ava.value("Defensive duels won, %"), Some(62.5));
    assert_eq!(ava.minutes(), Some(1520.0));

    let fay = find(&loaded.records, "Fay Quinn", 2025);
    assert!(fay.has_column("Defensive duels won, %"));
    assert_eq!(fay.value("Defensive duels won, %"), None);
    assert!(!fay.has_column("Player"));
}

#[test]
fn missing_file_is_recoverable() {
    let path = layout().position_file(PositionProfile::TouchlineWinger, Conference::Sec, 2025);
    let err = ExportTable::read_csv(&path).expect_err("no SEC winger export");
    assert!(matches!(err, ScoutError::MissingFile(_)));
    assert_eq!(err.recovery(), Recovery::Continue);
    assert!(path.ends_with("Players Stats By Position/W Touchline Winger SEC 2025.csv"));
    let past = layout().position_file(PositionProfile::HybridCb, Conference::Acc, 2023);
    assert!(past.ends_with("Past Seasons/CB Hybrid ACC 2023.csv"));
}

#[test]
fn workbook_exports_load_like_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let xlsx_layout = ExportLayout::new(dir.path(), 2025);
    let target = xlsx_layout
        .player_stats_dir(2025)
        .join("CB Hybrid ACC 2025.xlsx");
    fs::create_dir_all(target.parent().expect("parent")).expect("mkdir");
    let table = ExportTable::read_csv(&layout().position_file(PositionProfile::HybridCb, Conference::Acc, 2025))
        .expect("fixture csv");
    table.write_xlsx(&target).expect("write workbook");

    assert_eq!(
        xlsx_layout.position_file(PositionProfile::HybridCb, Conference::Acc, 2025),
        target
    );
    let loaded = load_seasons(&xlsx_layout, &[Conference::Acc], 2025, 2025, None);
    assert_eq!(loaded.files, 1);
    assert_eq!(loaded.records.len(), 7);

    let ava = find(&loaded.records, "Ava Smith", 2025);
    assert_eq!(ava.team, "Virginia Cavaliers");
    assert_eq!(ava.position, "RCB, LCB");
    assert_eq!(ava.value("Interceptions per 90"), Some(3.1));
    assert_eq!(ava.minutes(), Some(1520.0));
    let fay = find(&loaded.records, "Fay Quinn", 2025);
    assert!(fay.has_column("Defensive duels won, %"));
    assert_eq!(fay.value("Defensive duels won, %"), None);
}

#[test]
fn curation_applies_during_load() {
    let list = CurationList::load(&fixture("curation.json")).expect("curation fixture");
    let loaded = load_seasons(&layout(), &[Conference::Acc], 2025, 2025, Some(&list));
    assert_eq!(loaded.curated_rows, 2);

    let erin: Vec<&PlayerRecord> = loaded
        .records
        .iter()
        .filter(|r| r.player == "Erin Wu")
        .collect();
    assert_eq!(erin.len(), 1);
    assert_eq!(erin[0].minutes(), Some(1400.0));
    assert!(loaded.records.iter().any(|r| r.player == "Cara Lee (2)"));
    assert!(!loaded.records.iter().any(|r| r.player == "Cara Lee"));
}

#[test]
fn curated_rewrite_keeps_timestamped_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("CB Hybrid ACC 2025.csv");
    fs::copy(
        layout().position_file(PositionProfile::HybridCb, Conference::Acc, 2025),
        &path,
    )
    .expect("copy fixture");

    let list = CurationList::load(&fixture("curation.json")).expect("curation fixture");
    let mut table = ExportTable::read_csv(&path).expect("read copy");
    let report = list.apply(&mut table);
    assert_eq!(report.removed, 1);
    assert_eq!(report.renamed, 1);

    let backup = backup_file(&path).expect("backup");
    table.write_csv(&path).expect("rewrite");

    let name = backup
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    assert!(name.starts_with("CB Hybrid ACC 2025_BACKUP_"), "{name}");
    assert!(name.ends_with(".csv"), "{name}");
    // `_BACKUP_` + YYYYmmdd_HHMMSS
    assert_eq!(name.len(), "CB Hybrid ACC 2025_BACKUP_".len() + 15 + ".csv".len());

    let original = ExportTable::read_csv(&backup).expect("backup readable");
    let rewritten = ExportTable::read_csv(&path).expect("rewrite readable");
    assert_eq!(original.rows.len(), 7);
    assert_eq!(rewritten.rows.len(), 6);
    assert_eq!(rewritten.headers, original.headers);
    assert_eq!(rewritten.cell(0, "Team within selected timeframe"), Some("Virginia Cavaliers"));
    assert!(!dir.path().join("CB Hybrid ACC 2025.csv.tmp").exists());
}

#[test]
fn position_and_empty_row_filters() {
    let records = vec![
        PlayerRecord::new("a", "T", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_position("RCB, LCB")
            .with_metric("Interceptions per 90", Some(2.0)),
        PlayerRecord::new("b", "T", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_position("DMF")
            .with_metric("Interceptions per 90", Some(2.0)),
        PlayerRecord::new("c", "T", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_position("CB")
            .with_metric("Interceptions per 90", Some(0.0)),
    ];
    let kept = filter_by_position(records, PositionProfile::HybridCb);
    assert_eq!(kept.len(), 2);

    let cfg = ScoringConfig::bundled().expect("bundled");
    let columns = cfg.profile(PositionProfile::HybridCb).expect("cb").component_columns();
    let with_data = filter_players_with_data(kept.clone(), &columns);
    assert_eq!(with_data.len(), 1);
    assert_eq!(with_data[0].player, "a");

    // No relevant column anywhere: nothing is dropped.
    let unrelated: BTreeSet<String> = ["Goals per 90".to_string()].into_iter().collect();
    assert_eq!(filter_players_with_data(kept, &unrelated).len(), 2);
}

#[test]
fn team_logs_summarize_possessions_and_minutes() {
    let dir = TeamDirectory::load(&layout().team_stats_dir(Conference::Acc));
    assert!(dir.errors.is_empty(), "{:?}", dir.errors);
    assert_eq!(dir.teams.len(), 2);

    let duke = dir.find("Duke Blue Devils").expect("duke");
    assert_eq!(duke.matches, 2);
    assert_eq!(duke.possessions_per_game, Some(105.0));
    assert_eq!(duke.total_minutes, Some(180.0));

    // Leading summary row is not a match.
    let virginia = dir.find("virginia").expect("fuzzy lookup");
    assert_eq!(virginia.matches, 2);
    assert_eq!(virginia.possessions_per_game, Some(95.0));
    assert_eq!(dir.total_minutes("Virginia Cavaliers"), Some(185.0));

    assert_eq!(
        team_name_from_file(&PathBuf::from("Team Stats Duke Blue Devils (2).csv")),
        "Duke Blue Devils"
    );
}

#[test]
fn missing_team_directory_is_collected() {
    let dir = TeamDirectory::load(&layout().team_stats_dir(Conference::Nwsl));
    assert!(dir.teams.is_empty());
    assert_eq!(dir.errors.len(), 1);
}

#[test]
fn padj_scales_by_league_average_possessions() {
    let dir = TeamDirectory::load(&layout().team_stats_dir(Conference::Acc));
    let possessions = TeamPossessions::from_directory(&dir);
    assert_eq!(possessions.league_average, Some(100.0));

    let mut records = vec![
        PlayerRecord::new("ava", "Virginia Cavaliers", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_metric("Interceptions per 90", Some(3.1))
            .with_metric("Accurate passes, %", Some(88.1)),
        PlayerRecord::new("dana", "Duke Blue Devils", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_metric("Interceptions per 90", Some(3.8))
            .with_metric("Accurate passes, %", Some(90.2)),
        PlayerRecord::new("x", "Clemson", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_metric("Interceptions per 90", Some(1.0)),
    ];
    let added = add_padj_metrics(&mut records, &possessions);
    assert_eq!(added.len(), 1);
    assert!(added.contains("PAdj Interceptions per 90"));
    assert_eq!(records[0].value("PAdj Interceptions per 90"), Some(3.26));
    assert_eq!(records[1].value("PAdj Interceptions per 90"), Some(3.62));
    // Unknown team keeps the raw value.
    assert_eq!(records[2].value("PAdj Interceptions per 90"), Some(1.0));
    assert!(!records[0].has_column("PAdj Accurate passes, %"));
}

#[test]
fn team_minutes_share_is_capped() {
    assert_eq!(pct_of_team_minutes(Some(90.0), Some(180.0)), Some(50.0));
    assert_eq!(pct_of_team_minutes(Some(1520.0), Some(185.0)), Some(100.0));
    assert_eq!(pct_of_team_minutes(None, Some(185.0)), None);
    assert_eq!(pct_of_team_minutes(Some(90.0), None), None);
}
