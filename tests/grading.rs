use ncaa_scout::grading::{
    comparison_grade, grade_from_1_10, grade_from_percentile, in_top_n, inclusive_rank,
    percentile_in, percentile_ranks, percentile_to_1_10, rate_within,
};
use ncaa_scout::model::{Conference, Grade, PlayerRecord, PositionProfile, ScoredPlayer};
use ncaa_scout::report::{assign_conference_grades, assign_team_grades, rate_players};

#[test]
fn decile_boundaries() {
    assert_eq!(percentile_to_1_10(Some(90.0)), 9.0);
    let below = percentile_to_1_10(Some(89.9));
    assert!((8.9..9.0).contains(&below), "{below}");
    assert_eq!(percentile_to_1_10(Some(0.0)), 1.0);
    assert_eq!(percentile_to_1_10(Some(9.99)), 1.0);
    assert_eq!(percentile_to_1_10(Some(10.0)), 1.0);
    assert!((percentile_to_1_10(Some(55.0)) - 5.5).abs() < 1e-12);
    assert_eq!(percentile_to_1_10(Some(100.0)), 10.0);
    assert_eq!(percentile_to_1_10(None), 1.0);
}

#[test]
fn fixed_grade_thresholds() {
    assert_eq!(grade_from_1_10(Some(9.0)), Grade::A);
    assert_eq!(grade_from_1_10(Some(8.99)), Grade::B);
    assert_eq!(grade_from_1_10(Some(7.0)), Grade::C);
    assert_eq!(grade_from_1_10(Some(6.5)), Grade::D);
    assert_eq!(grade_from_1_10(Some(5.99)), Grade::F);
    assert_eq!(grade_from_1_10(None), Grade::F);

    assert_eq!(grade_from_percentile(90.0), Grade::A);
    assert_eq!(grade_from_percentile(80.0), Grade::B);
    assert_eq!(grade_from_percentile(79.9), Grade::C);
    assert_eq!(grade_from_percentile(60.0), Grade::D);
    assert_eq!(grade_from_percentile(12.0), Grade::F);
}

#[test]
fn ties_share_average_rank() {
    let ranks = percentile_ranks(&[Some(1.0), Some(2.0), Some(2.0), None, Some(3.0)]);
    assert_eq!(ranks[0], Some(25.0));
    assert_eq!(ranks[1], Some(62.5));
    assert_eq!(ranks[2], Some(62.5));
    assert_eq!(ranks[3], None);
    assert_eq!(ranks[4], Some(100.0));
}

#[test]
fn single_member_population_ranks_at_hundred() {
    let rated = rate_within(&[Some(0.42)]);
    assert_eq!(rated[0].percentile, Some(100.0));
    assert_eq!(rated[0].score_1_10, 10.0);
    assert_eq!(rated[0].grade, Grade::A);
    assert_eq!(percentile_in(Some(0.42), &[0.42]), Some(100.0));
    assert_eq!(comparison_grade(Some(0.42), &[0.42]), Some(Grade::A));
}

#[test]
fn empty_comparison_population_has_no_grade() {
    assert_eq!(percentile_in(Some(1.0), &[]), None);
    assert_eq!(comparison_grade(Some(1.0), &[]), None);
    assert_eq!(comparison_grade(None, &[1.0, 2.0]), None);
}

#[test]
fn comparison_grades_follow_percentile_thresholds() {
    let population: Vec<f64> = (1..=20).map(f64::from).collect();
    for value in &population {
        let pct = percentile_in(Some(*value), &population).unwrap_or_default();
        let grade = comparison_grade(Some(*value), &population);
        assert_eq!(grade, Some(grade_from_percentile(pct)), "{value}");
        assert_eq!(grade == Some(Grade::A), pct >= 90.0);
    }
    // Inclusive counting puts the 18th of 20 exactly on the A line.
    assert_eq!(comparison_grade(Some(17.0), &population), Some(Grade::B));
    assert_eq!(comparison_grade(Some(18.0), &population), Some(Grade::A));
}

#[test]
fn ten_distinct_totals_give_two_a_grades() {
    let population: Vec<f64> = (1..=10).map(f64::from).collect();
    let grades: Vec<Option<Grade>> = population
        .iter()
        .map(|v| comparison_grade(Some(*v), &population))
        .collect();
    // 9 of 10 is at or below the 9th value, so it lands on 90 and grades A.
    assert_eq!(grades[9], Some(Grade::A));
    assert_eq!(grades[8], Some(Grade::A));
    assert_eq!(grades[7], Some(Grade::B));
    assert_eq!(grades[6], Some(Grade::C));
    assert_eq!(grades[5], Some(Grade::D));
    assert_eq!(grades[4], Some(Grade::F));
    assert_eq!(grades.iter().filter(|g| **g == Some(Grade::A)).count(), 2);
}

fn scored(name: &str, team: &str, total: f64) -> ScoredPlayer {
    let record = PlayerRecord::new(name, team, PositionProfile::HybridCb, Conference::Acc, 2025);
    let mut player = ScoredPlayer::new(record, Default::default());
    player.score.total = total;
    player
}

#[test]
fn grade_depends_on_comparison_population() {
    let mut players = vec![
        scored("a", "Duke Blue Devils", 0.30),
        scored("b", "Duke Blue Devils", 0.10),
        scored("c", "Virginia Cavaliers", 0.90),
        scored("d", "Virginia Cavaliers", 0.80),
        scored("e", "Virginia Cavaliers", 0.70),
    ];
    rate_players(&mut players);
    let before: Vec<f64> = players.iter().map(|p| p.total_score_1_10).collect();

    assign_team_grades(&mut players);
    assign_conference_grades(&mut players);

    // Best on a weak team, middling in the conference.
    assert_eq!(players[0].team_grade, Some(Grade::A));
    assert_eq!(players[0].conference_grade, Some(Grade::F));
    let after: Vec<f64> = players.iter().map(|p| p.total_score_1_10).collect();
    assert_eq!(before, after);
}

#[test]
fn top_n_counts_self_inclusively() {
    let population = [9.0, 8.0, 8.0, 7.0, 6.0];
    assert_eq!(inclusive_rank(9.0, &population), 1);
    assert_eq!(inclusive_rank(8.0, &population), 3);
    assert_eq!(inclusive_rank(100.0, &population), 1);

    assert!(in_top_n(Some(9.0), &population, 1));
    assert!(!in_top_n(Some(8.0), &population, 1));
    // Tie at the cut-off: both 8.0s are in the top 2.
    assert!(in_top_n(Some(8.0), &population, 2));
    assert!(!in_top_n(Some(7.0), &population, 3));
    assert!(!in_top_n(None, &population, 5));
    assert!(!in_top_n(Some(9.0), &[], 5));
}
