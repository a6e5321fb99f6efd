use ncaa_scout::config::{MetricGroup, ProfileConfig};
use ncaa_scout::dataset::ExportTable;
use ncaa_scout::grading::comparison_grade;
use ncaa_scout::model::{Conference, Grade, PlayerRecord, PositionProfile};
use ncaa_scout::normalize::{DEGENERATE_SCORE, MISSING_SCORE, Scale, normalize_column};
use ncaa_scout::population::Population;
use ncaa_scout::report::{rate_players, score_players};
use ncaa_scout::scoring::{composite_scores, score_population};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn cb(name: &str) -> PlayerRecord {
    PlayerRecord::new(name, "Virginia Cavaliers", PositionProfile::HybridCb, Conference::Acc, 2025)
}

fn single_metric_profile(column: &str) -> ProfileConfig {
    ProfileConfig {
        position: "Center Back".to_string(),
        core: vec![MetricGroup::simple(column, 1.0)],
        specific: Vec::new(),
        core_weight: 1.0,
        specific_weight: 0.0,
    }
}

#[test]
fn min_max_members_stay_in_unit_range() {
    let reference = [Some(-4.0), Some(12.5), Some(130.0), None, Some(55.0)];
    let out = normalize_column(&reference, &reference);
    for (value, score) in reference.iter().zip(&out) {
        if value.is_some() {
            assert!((0.0..=1.0).contains(score), "{value:?} -> {score}");
        }
    }
    assert!(close(out[0], 0.0));
    assert!(close(out[2], 1.0));
}

#[test]
fn identical_reference_values_score_half() {
    let reference = [Some(250.0), Some(250.0), Some(250.0)];
    let scoring = [Some(250.0), Some(400.0), Some(-10.0)];
    assert_eq!(
        Scale::from_reference(reference.iter().copied()),
        Scale::Degenerate
    );
    for score in normalize_column(&scoring, &reference) {
        assert_eq!(score, DEGENERATE_SCORE);
    }
}

#[test]
fn missing_value_scores_point_one_under_every_scale() {
    let references: [&[Option<f64>]; 4] = [
        &[None, None],
        &[Some(10.0), Some(60.0)],
        &[Some(200.0), Some(900.0)],
        &[Some(500.0), Some(500.0)],
    ];
    for reference in references {
        let out = normalize_column(&[None, Some(f64::NAN)], reference);
        assert_eq!(out, vec![MISSING_SCORE, MISSING_SCORE], "{reference:?}");
    }
}

#[test]
fn reference_without_data_scores_point_one() {
    let out = normalize_column(&[Some(3.0), Some(7.0)], &[None, None, None]);
    assert_eq!(out, vec![MISSING_SCORE, MISSING_SCORE]);
}

#[test]
fn percentage_like_reference_divides_by_hundred() {
    let values = [Some(10.0), Some(20.0), Some(30.0)];
    let out = normalize_column(&values, &values);
    assert!(close(out[0], 0.1));
    assert!(close(out[1], 0.2));
    assert!(close(out[2], 0.3));
}

#[test]
fn absent_component_weight_is_redistributed() {
    let records = vec![
        cb("both")
            .with_metric("Passes per 90", Some(300.0))
            .with_metric("Accurate passes, %", Some(80.0)),
        cb("low")
            .with_metric("Passes per 90", Some(100.0))
            .with_metric("Accurate passes, %", Some(40.0)),
        // No accuracy column at all on this row.
        cb("volume only").with_metric("Passes per 90", Some(200.0)),
    ];
    let pop = Population::new(&records);
    let group = MetricGroup::composite(
        "Passing",
        1.0,
        &[("Passes per 90", 0.7), ("Accurate passes, %", 0.3)],
    );
    let out = composite_scores(&group, &pop, &pop);

    // Passes: min-max over 100..300. Accuracy: percentage branch.
    assert!(close(out[0], 0.7 * 1.0 + 0.3 * 0.8));
    assert!(close(out[1], 0.7 * 0.0 + 0.3 * 0.4));
    assert!(close(out[2], 0.5));
}

#[test]
fn missing_component_value_still_counts_at_point_one() {
    let records = vec![
        cb("a")
            .with_metric("Passes per 90", Some(300.0))
            .with_metric("Accurate passes, %", None),
        cb("b")
            .with_metric("Passes per 90", Some(100.0))
            .with_metric("Accurate passes, %", Some(50.0)),
    ];
    let pop = Population::new(&records);
    let group = MetricGroup::composite(
        "Passing",
        1.0,
        &[("Passes per 90", 0.7), ("Accurate passes, %", 0.3)],
    );
    let out = composite_scores(&group, &pop, &pop);
    assert!(close(out[0], 0.7 + 0.3 * MISSING_SCORE));
}

#[test]
fn core_and_specific_are_weighted_into_total() {
    let records = vec![
        cb("a")
            .with_metric("Interceptions per 90", Some(150.0))
            .with_metric("Shots blocked per 90", Some(20.0)),
        cb("b")
            .with_metric("Interceptions per 90", Some(250.0))
            .with_metric("Shots blocked per 90", Some(60.0)),
    ];
    let pop = Population::new(&records);
    let profile = ProfileConfig {
        position: "Center Back".to_string(),
        core: vec![MetricGroup::simple("Interceptions per 90", 1.0)],
        specific: vec![MetricGroup::simple("Shots blocked per 90", 1.0)],
        core_weight: 0.6,
        specific_weight: 0.4,
    };
    let scores = score_population(&profile, &pop, &pop);
    assert!(close(scores[0].core, 0.0));
    assert!(close(scores[0].specific, 0.2));
    assert!(close(scores[0].total, 0.4 * 0.2));
    assert!(close(scores[1].total, 0.6 * 1.0 + 0.4 * 0.6));
    assert!(close(scores[1].metric_scores["Interceptions per 90"], 1.0));
}

#[test]
fn three_player_scenario() {
    let records: Vec<PlayerRecord> = [("low", 100.0), ("mid", 200.0), ("high", 300.0)]
        .into_iter()
        .map(|(name, v)| cb(name).with_metric("Interceptions per 90", Some(v)))
        .collect();
    let pop = Population::new(&records);
    let profile = single_metric_profile("Interceptions per 90");

    let mut players = score_players(&profile, &pop, &pop);
    let totals: Vec<f64> = players.iter().map(|p| p.score.total).collect();
    assert!(close(totals[0], 0.0));
    assert!(close(totals[1], 0.5));
    assert!(close(totals[2], 1.0));

    rate_players(&mut players);
    let percentiles: Vec<f64> = players.iter().filter_map(|p| p.total_percentile).collect();
    assert!(close(percentiles[0], 100.0 / 3.0));
    assert!(close(percentiles[1], 200.0 / 3.0));
    assert!(close(percentiles[2], 100.0));

    let scaled: Vec<f64> = players.iter().map(|p| p.total_score_1_10).collect();
    assert!(close(scaled[0], 3.0 + (100.0 / 3.0 - 30.0) / 10.0));
    assert!(close(scaled[1], 6.0 + (200.0 / 3.0 - 60.0) / 10.0));
    assert!(close(scaled[2], 10.0));

    let grades: Vec<Option<Grade>> = players
        .iter()
        .map(|p| comparison_grade(Some(p.score.total), &totals))
        .collect();
    assert_eq!(grades, vec![Some(Grade::F), Some(Grade::D), Some(Grade::A)]);
}

#[test]
fn scoring_is_deterministic() {
    let records: Vec<PlayerRecord> = (0..40)
        .map(|i| {
            let v = f64::from(i);
            cb(&format!("p{i}"))
                .with_metric("Passes per 90", Some(120.0 + v * 3.7))
                .with_metric("Accurate passes, %", Some(60.0 + (v * 1.3) % 35.0))
                .with_metric("Interceptions per 90", if i % 7 == 0 { None } else { Some(v * 0.11) })
        })
        .collect();
    let pop = Population::new(&records);
    let profile = ProfileConfig {
        position: "Center Back".to_string(),
        core: vec![
            MetricGroup::composite(
                "Passing",
                0.5,
                &[("Passes per 90", 0.8), ("Accurate passes, %", 0.2)],
            ),
            MetricGroup::simple("Interceptions per 90", 0.5),
        ],
        specific: Vec::new(),
        core_weight: 1.0,
        specific_weight: 0.0,
    };
    let first = score_population(&profile, &pop, &pop);
    let second = score_population(&profile, &pop, &pop);
    let bits = |s: &[ncaa_scout::model::PositionScore]| -> Vec<u64> {
        s.iter().map(|p| p.total.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn export_column_without_data_scores_as_missing() {
    let csv = "Player,Team,Position,Interceptions per 90,Shots blocked per 90\n\
               Ava,Virginia Cavaliers,CB,2.0,-\n\
               Bella,Virginia Cavaliers,CB,3.0,\n";
    let table = ExportTable::from_reader(csv.as_bytes()).expect("csv");
    let records = table.to_records(PositionProfile::HybridCb, Conference::Acc, 2025);
    let pop = Population::new(&records);

    let blocked = MetricGroup::simple("Shots blocked per 90", 1.0);
    assert_eq!(composite_scores(&blocked, &pop, &pop), vec![MISSING_SCORE, MISSING_SCORE]);

    // The empty column keeps its share of the weight.
    let mixed = MetricGroup::composite(
        "Defending",
        1.0,
        &[("Interceptions per 90", 0.5), ("Shots blocked per 90", 0.5)],
    );
    let out = composite_scores(&mixed, &pop, &pop);
    assert!(close(out[0], 0.5 * 0.02 + 0.5 * MISSING_SCORE), "{out:?}");
    assert!(close(out[1], 0.5 * 0.03 + 0.5 * MISSING_SCORE), "{out:?}");
}
