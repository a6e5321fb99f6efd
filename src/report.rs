use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::columns::{resolve_column, team_key};
use crate::config::{AccuracySplit, ProfileConfig, ScoringConfig};
use crate::curation::CurationList;
use crate::dataset::{ExportLayout, has_data, load_seasons};
use crate::experience::{ExperienceClass, ExperienceIndex};
use crate::grading::{comparison_grade, in_top_n, rate_within};
use crate::model::{
    Conference, Grade, PlayerRecord, PositionProfile, ScoredPlayer, sort_by_grade_then_percentile,
};
use crate::padj::{TeamPossessions, add_padj_metrics, is_padj_column};
use crate::population::Population;
use crate::scoring::score_population;
use crate::team_stats::{TeamDirectory, pct_of_team_minutes};

pub const TOP_N: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSettings {
    pub season: i32,
    pub first_season: i32,
    pub split: AccuracySplit,
    pub padj: bool,
}

impl ReportSettings {
    pub fn new(season: i32, first_season: i32) -> Self {
        Self {
            season,
            first_season,
            split: AccuracySplit::INTENT_80_20,
            padj: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub profile: PositionProfile,
    pub metrics: Vec<String>,
    pub players: Vec<ScoredPlayer>,
}

#[derive(Debug, Clone)]
pub struct ConferenceReport {
    pub conference: Conference,
    pub settings: ReportSettings,
    pub profiles: Vec<ProfileReport>,
    pub unresolved_columns: Vec<String>,
    pub errors: Vec<String>,
}

impl ConferenceReport {
    pub fn players(&self) -> impl Iterator<Item = &ScoredPlayer> {
        self.profiles.iter().flat_map(|p| p.players.iter())
    }

    pub fn teams(&self) -> BTreeSet<String> {
        self.players().map(|p| p.record.team.clone()).collect()
    }
}

pub fn derive_profile_config(
    base: &ProfileConfig,
    reference: &Population<'_>,
    split: AccuracySplit,
    padj: bool,
) -> (ProfileConfig, Vec<String>) {
    let columns = reference.columns();
    let headers: Vec<&String> = columns.iter().filter(|c| !is_padj_column(c)).collect();
    let (cfg, unresolved) = base.with_accuracy_split(split).resolved_against(&headers);
    let cfg = if padj { cfg.with_padj(&columns) } else { cfg };
    (cfg, unresolved)
}

pub fn score_players(
    cfg: &ProfileConfig,
    scoring: &Population<'_>,
    reference: &Population<'_>,
) -> Vec<ScoredPlayer> {
    score_population(cfg, scoring, reference)
        .into_iter()
        .zip(scoring.iter())
        .map(|(score, record)| ScoredPlayer::new(record.clone(), score))
        .collect()
}

pub fn rate_players(players: &mut [ScoredPlayer]) {
    let totals: Vec<Option<f64>> = players.iter().map(|p| Some(p.score.total)).collect();
    for (player, rating) in players.iter_mut().zip(rate_within(&totals)) {
        player.total_percentile = rating.percentile;
        player.total_score_1_10 = rating.score_1_10;
        player.total_grade = rating.grade;
    }
}

fn grade_within_groups<K, F, S>(players: &mut [ScoredPlayer], key: F, mut set: S)
where
    K: Ord,
    F: Fn(&ScoredPlayer) -> K,
    S: FnMut(&mut ScoredPlayer, Option<Grade>),
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for p in players.iter() {
        groups.entry(key(p)).or_default().push(p.score.total);
    }
    for p in players.iter_mut() {
        let grade = groups
            .get(&key(&*p))
            .and_then(|totals| comparison_grade(Some(p.score.total), totals));
        set(p, grade);
    }
}

pub fn assign_team_grades(players: &mut [ScoredPlayer]) {
    grade_within_groups(
        players,
        |p| (team_key(&p.record.team), p.record.profile),
        |p, g| p.team_grade = g,
    );
}

pub fn assign_conference_grades(players: &mut [ScoredPlayer]) {
    grade_within_groups(
        players,
        |p| (p.record.conference, p.record.profile),
        |p, g| p.conference_grade = g,
    );
}

pub fn assign_experience_grades(players: &mut [ScoredPlayer]) {
    grade_within_groups(
        players,
        |p| {
            (
                p.record.profile,
                p.ncaa_seasons.map(ExperienceClass::from_seasons),
            )
        },
        |p, g| {
            if p.ncaa_seasons.is_some() {
                p.experience_grade = g;
            }
        },
    );
}

#[derive(Debug, Clone, Default)]
pub struct PoolTotals {
    pub totals: Vec<f64>,
    pub by_player_season: BTreeMap<((String, String), i32), f64>,
}

pub fn score_season_by_season(
    base: &ProfileConfig,
    pool: &Population<'_>,
    split: AccuracySplit,
    padj: bool,
) -> PoolTotals {
    let mut out = PoolTotals::default();
    for season in pool.distinct_seasons() {
        let scoring = pool.season(season);
        let earlier = pool.before_season(season);
        let reference = if earlier.is_empty() { scoring.clone() } else { earlier };
        let (cfg, _) = derive_profile_config(base, &reference, split, padj);
        for (record, score) in scoring.iter().zip(score_population(&cfg, &scoring, &reference)) {
            out.totals.push(score.total);
            out.by_player_season
                .insert((record.identity(), record.season), score.total);
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct TopNPool {
    columns: Vec<(String, Vec<f64>)>,
}

impl TopNPool {
    pub fn new(columns: &[String], pool: &Population<'_>) -> Self {
        let pool_columns: Vec<String> = pool.columns().into_iter().collect();
        let columns = columns
            .iter()
            .filter_map(|desired| {
                let column = resolve_column(desired, &pool_columns)?;
                let values = pool.column_values(&column).into_iter().flatten().collect();
                Some((desired.clone(), values))
            })
            .collect();
        Self { columns }
    }

    pub fn count(&self, record: &PlayerRecord) -> u32 {
        let own_columns: Vec<&String> = record.metrics.keys().collect();
        self.columns
            .iter()
            .filter(|(desired, values)| {
                let own = resolve_column(desired, &own_columns).and_then(|c| record.value(&c));
                in_top_n(own, values, TOP_N)
            })
            .count() as u32
    }
}

pub fn apply_padj_by_conference(
    records: &mut [PlayerRecord],
    teams: &BTreeMap<Conference, TeamDirectory>,
) -> BTreeSet<String> {
    records.sort_by_key(|r| r.conference);
    let mut added = BTreeSet::new();
    for chunk in records.chunk_by_mut(|a, b| a.conference == b.conference) {
        let Some(conference) = chunk.first().map(|r| r.conference) else {
            continue;
        };
        let possessions = teams
            .get(&conference)
            .map(TeamPossessions::from_directory)
            .unwrap_or_default();
        if possessions.is_empty() {
            log::warn!("{conference}: no team possession data, PAdj keeps raw values");
        }
        added.extend(add_padj_metrics(chunk, &possessions));
    }
    added
}

#[derive(Debug, Default)]
pub struct RunInputs {
    pub records: Vec<PlayerRecord>,
    pub teams: BTreeMap<Conference, TeamDirectory>,
    pub files: usize,
    pub curated_rows: usize,
    pub errors: Vec<String>,
}

pub fn load_run_inputs(
    layout: &ExportLayout,
    conferences: &[Conference],
    first_season: i32,
    curation: Option<&CurationList>,
    padj: bool,
) -> RunInputs {
    let loaded = load_seasons(layout, conferences, first_season, layout.current_season, curation);
    let mut inputs = RunInputs {
        records: loaded.records,
        files: loaded.files,
        curated_rows: loaded.curated_rows,
        errors: loaded.errors,
        ..RunInputs::default()
    };
    for conference in conferences {
        let dir = TeamDirectory::load(&layout.team_stats_dir(*conference));
        inputs.errors.extend(dir.errors.iter().cloned());
        inputs.teams.insert(*conference, dir);
    }
    if padj {
        let added = apply_padj_by_conference(&mut inputs.records, &inputs.teams);
        log::info!("added {} PAdj columns", added.len());
    }
    inputs
}

pub fn conferences_for_report(conference: Conference) -> Vec<Conference> {
    let mut out = vec![conference];
    out.extend(Conference::POWER_FIVE.iter().copied().filter(|c| *c != conference));
    out
}

/// Full report for one conference's current season.
///
/// `records` must hold every season from `first_season` to `season` for the
/// conference, plus the other Power Five conferences for the Power Five
/// grade and Top-15 counts. PAdj columns must already be present when
/// `settings.padj` is set.
pub fn build_conference_report(
    config: &ScoringConfig,
    records: &[PlayerRecord],
    teams: Option<&TeamDirectory>,
    conference: Conference,
    settings: ReportSettings,
) -> Result<ConferenceReport> {
    let all = Population::new(records).seasons(settings.first_season, settings.season);
    let experience = ExperienceIndex::build(&all);
    let mut report = ConferenceReport {
        conference,
        settings,
        profiles: Vec::new(),
        unresolved_columns: Vec::new(),
        errors: Vec::new(),
    };

    for profile in PositionProfile::ALL {
        let base = config.profile(profile)?;
        let by_profile = all.profile(profile);
        let conf_pool = by_profile.conference(conference);
        let reference = conf_pool.clone();
        let relevant = base.component_columns();
        let scoring = conf_pool
            .season(settings.season)
            .filter(|r| has_data(r, &relevant) || !relevant.iter().any(|c| r.has_column(c)));
        if scoring.is_empty() {
            let msg = format!("{conference} {}: no {} players", settings.season, profile);
            log::warn!("{msg}");
            report.errors.push(msg);
            continue;
        }

        let (cfg, unresolved) = derive_profile_config(base, &reference, settings.split, settings.padj);
        for column in unresolved {
            if !report.unresolved_columns.contains(&column) {
                log::warn!("{conference} {profile}: no export column for {column:?}");
                report.unresolved_columns.push(column);
            }
        }

        let mut players = score_players(&cfg, &scoring, &reference);
        rate_players(&mut players);
        assign_team_grades(&mut players);
        assign_conference_grades(&mut players);

        let power_five = by_profile.power_five();
        let pool = score_season_by_season(base, &power_five, settings.split, settings.padj);
        let top_columns: Vec<String> = base.component_columns().into_iter().collect();
        let top_pool = TopNPool::new(&top_columns, &power_five.season(settings.season));

        let previous = previous_season_scores(base, &conf_pool, settings);

        for player in &mut players {
            let key = (player.record.identity(), player.record.season);
            let p5_total = pool
                .by_player_season
                .get(&key)
                .copied()
                .unwrap_or(player.score.total);
            player.power_five_grade = comparison_grade(Some(p5_total), &pool.totals);
            player.ncaa_seasons = Some(experience.ncaa_seasons(&player.record));
            player.top_15s = Some(top_pool.count(&player.record));
            if let Some((season, score)) = previous.get(&player.record.identity()) {
                player.previous_season = Some(*season);
                player.previous_score_1_10 = Some(*score);
            }
            if let Some(teams) = teams {
                player.pct_of_team_minutes = pct_of_team_minutes(
                    player.record.minutes(),
                    teams.total_minutes(&player.record.team),
                );
            }
        }
        assign_experience_grades(&mut players);
        sort_by_grade_then_percentile(&mut players);

        report.profiles.push(ProfileReport {
            profile,
            metrics: cfg.group_names(),
            players,
        });
    }

    log::info!(
        "{conference} {} ({}): {} players across {} profiles",
        settings.season,
        settings.split.short_label(),
        report.players().count(),
        report.profiles.len()
    );
    Ok(report)
}

fn previous_season_scores(
    base: &ProfileConfig,
    conf_pool: &Population<'_>,
    settings: ReportSettings,
) -> BTreeMap<(String, String), (i32, f64)> {
    let mut out = BTreeMap::new();
    for season in settings.first_season..settings.season {
        let scoring = conf_pool.season(season);
        if scoring.is_empty() {
            continue;
        }
        let reference = conf_pool.seasons(settings.first_season, season);
        let (cfg, _) = derive_profile_config(base, &reference, settings.split, settings.padj);
        let mut players = score_players(&cfg, &scoring, &reference);
        rate_players(&mut players);
        for p in players {
            out.insert(p.record.identity(), (season, p.total_score_1_10));
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct PositionVariant {
    pub label: String,
    pub split: AccuracySplit,
    pub metrics: Vec<String>,
    pub players: Vec<ScoredPlayer>,
}

pub fn build_position_variant(
    base: &ProfileConfig,
    records: &[PlayerRecord],
    profile: PositionProfile,
    settings: ReportSettings,
    label: &str,
) -> PositionVariant {
    let all = Population::new(records)
        .seasons(settings.first_season, settings.season)
        .profile(profile);
    let current = all.season(settings.season);
    let conferences: BTreeSet<Conference> = current.iter().map(|r| r.conference).collect();
    let experience = ExperienceIndex::build(&all);

    let mut players = Vec::new();
    let mut metrics = Vec::new();
    for conference in conferences {
        let scoring = current.conference(conference);
        let reference = all
            .conference(conference)
            .before_season(settings.season)
            .union(&current);
        let (cfg, _) = derive_profile_config(base, &reference, settings.split, settings.padj);
        if metrics.is_empty() {
            metrics = cfg.group_names();
        }
        players.extend(score_players(&cfg, &scoring, &reference));
    }

    rate_players(&mut players);
    assign_team_grades(&mut players);
    assign_conference_grades(&mut players);
    for player in &mut players {
        player.ncaa_seasons = Some(experience.ncaa_seasons(&player.record));
    }
    assign_experience_grades(&mut players);
    sort_by_grade_then_percentile(&mut players);

    PositionVariant {
        label: label.to_string(),
        split: settings.split,
        metrics,
        players,
    }
}
