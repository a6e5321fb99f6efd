use std::collections::BTreeMap;

use crate::columns::{normalize_player_name, team_key};
use crate::model::{Grade, PositionProfile, ScoredPlayer};
use crate::report::ConferenceReport;
use crate::team_stats::mean;

type RowKey = (PositionProfile, String, String);

fn row_key(p: &ScoredPlayer) -> RowKey {
    (
        p.record.profile,
        normalize_player_name(&p.record.player),
        team_key(&p.record.team),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantCell {
    pub score: f64,
    pub conference_grade: Option<Grade>,
    pub power_five_grade: Option<Grade>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightingRow {
    pub player: String,
    pub team: String,
    pub position: String,
    pub profile: PositionProfile,
    pub cells: Vec<Option<VariantCell>>,
}

impl WeightingRow {
    pub fn delta(&self, idx: usize) -> Option<f64> {
        let base = self.cells.first()?.as_ref()?.score;
        let other = self.cells.get(idx)?.as_ref()?.score;
        Some(other - base)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub group: String,
    pub players: usize,
    pub average_scores: Vec<Option<f64>>,
    pub average_deltas: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightingComparison {
    pub labels: Vec<String>,
    pub rows: Vec<WeightingRow>,
}

impl WeightingComparison {
    pub fn build(reports: &[ConferenceReport]) -> Self {
        let labels: Vec<String> = reports.iter().map(|r| r.settings.split.label()).collect();
        let mut rows: BTreeMap<RowKey, WeightingRow> = BTreeMap::new();
        for (idx, report) in reports.iter().enumerate() {
            for p in report.players() {
                let row = rows.entry(row_key(p)).or_insert_with(|| WeightingRow {
                    player: p.record.player.clone(),
                    team: p.record.team.clone(),
                    position: p.record.position.clone(),
                    profile: p.record.profile,
                    cells: vec![None; reports.len()],
                });
                row.cells[idx] = Some(VariantCell {
                    score: p.total_score_1_10,
                    conference_grade: p.conference_grade,
                    power_five_grade: p.power_five_grade,
                });
            }
        }

        let mut rows: Vec<WeightingRow> = rows.into_values().collect();
        // Profile, then baseline score high to low.
        rows.sort_by(|a, b| {
            a.profile.cmp(&b.profile).then_with(|| {
                let sa = a.cells.first().cloned().flatten().map(|c| c.score);
                let sb = b.cells.first().cloned().flatten().map(|c| c.score);
                sb.unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&sa.unwrap_or(f64::NEG_INFINITY))
            })
        });
        Self { labels, rows }
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        let mut out = Vec::new();
        for profile in PositionProfile::ALL {
            let rows: Vec<&WeightingRow> = self.rows.iter().filter(|r| r.profile == profile).collect();
            if rows.is_empty() {
                continue;
            }
            out.push(self.summary_row(profile.display_name(), &rows));
        }
        let all: Vec<&WeightingRow> = self.rows.iter().collect();
        if !all.is_empty() {
            out.push(self.summary_row("All", &all));
        }
        out
    }

    fn summary_row(&self, group: &str, rows: &[&WeightingRow]) -> SummaryRow {
        let average_scores = (0..self.labels.len())
            .map(|idx| {
                let scores: Vec<f64> = rows
                    .iter()
                    .filter_map(|r| r.cells[idx].as_ref().map(|c| c.score))
                    .collect();
                mean(&scores)
            })
            .collect();
        let average_deltas = (0..self.labels.len())
            .map(|idx| {
                if idx == 0 {
                    return None;
                }
                let deltas: Vec<f64> = rows.iter().filter_map(|r| r.delta(idx)).collect();
                mean(&deltas)
            })
            .collect();
        SummaryRow {
            group: group.to_string(),
            players: rows.len(),
            average_scores,
            average_deltas,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PadjComparisonRow {
    pub player: String,
    pub team: String,
    pub profile: PositionProfile,
    pub pre: f64,
    pub post: f64,
}

impl PadjComparisonRow {
    pub fn difference(&self) -> f64 {
        self.post - self.pre
    }

    pub fn percent_change(&self) -> f64 {
        if self.pre == 0.0 {
            0.0
        } else {
            self.difference() / self.pre * 100.0
        }
    }
}

pub fn padj_comparison(raw: &ConferenceReport, adjusted: &ConferenceReport) -> Vec<PadjComparisonRow> {
    let post: BTreeMap<RowKey, f64> = adjusted
        .players()
        .map(|p| (row_key(p), p.total_score_1_10))
        .collect();
    let mut rows: Vec<PadjComparisonRow> = raw
        .players()
        .filter_map(|p| {
            post.get(&row_key(p)).map(|post| PadjComparisonRow {
                player: p.record.player.clone(),
                team: p.record.team.clone(),
                profile: p.record.profile,
                pre: p.total_score_1_10,
                post: *post,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        team_key(&a.team)
            .cmp(&team_key(&b.team))
            .then(a.profile.cmp(&b.profile))
            .then(b.difference().total_cmp(&a.difference()))
    });
    rows
}
