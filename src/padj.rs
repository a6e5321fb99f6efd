use std::collections::{BTreeMap, BTreeSet};

use crate::columns::{is_percentage_column, team_key, teams_match};
use crate::model::PlayerRecord;
use crate::team_stats::{TeamDirectory, mean};

pub const PADJ_PREFIX: &str = "PAdj ";

pub const PADJ_BASE_METRICS: &[&str] = &[
    "Interceptions",
    "Sliding tackles",
    "Clearances",
    "Shots blocked",
    "Defensive duels",
    "Aerial duels",
    "Passes",
    "Long passes",
    "Forward passes",
    "Back passes",
    "Lateral passes",
    "Progressive passes",
    "Smart passes",
    "Through passes",
    "Passes to final third",
    "Passes to penalty area",
    "Deep completed passes",
    "Shots",
    "Key passes",
    "Touches in penalty area",
    "Offensive duels",
    "Recoveries",
    "Dribbles",
    "Progressive runs",
    "Received passes",
];

pub fn padj_column_name(column: &str) -> String {
    format!("{PADJ_PREFIX}{column}")
}

pub fn is_padj_column(column: &str) -> bool {
    column.to_ascii_lowercase().contains("padj")
}

pub fn is_padj_source(column: &str) -> bool {
    if is_percentage_column(column) || is_padj_column(column) {
        return false;
    }
    let lower = column.trim().to_ascii_lowercase();
    PADJ_BASE_METRICS.iter().any(|base| {
        let base = base.to_ascii_lowercase();
        lower == base
            || lower.contains(&format!("{base} per 90"))
            || lower.contains(&format!("{base}s per 90"))
            || lower.ends_with(&format!(" {base}"))
            || lower.ends_with(&format!(" {base}s"))
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamPossessions {
    pub by_team: BTreeMap<String, f64>,
    pub league_average: Option<f64>,
}

impl TeamPossessions {
    pub fn from_directory(dir: &TeamDirectory) -> Self {
        let by_team: BTreeMap<String, f64> = dir
            .teams
            .iter()
            .filter_map(|t| t.possessions_per_game.map(|p| (t.team.clone(), p)))
            .collect();
        Self::from_teams(by_team)
    }

    pub fn from_teams(by_team: BTreeMap<String, f64>) -> Self {
        let values: Vec<f64> = by_team.values().copied().collect();
        Self {
            league_average: mean(&values),
            by_team,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }

    pub fn team_possessions(&self, team: &str) -> Option<f64> {
        let key = team_key(team);
        self.by_team
            .iter()
            .find(|(name, _)| team_key(name) == key)
            .or_else(|| self.by_team.iter().find(|(name, _)| teams_match(name, team)))
            .map(|(_, p)| *p)
    }

    pub fn factor(&self, team: &str) -> Option<f64> {
        let league = self.league_average?;
        let team = self.team_possessions(team).filter(|p| *p > 0.0)?;
        Some(league / team)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Adds a `PAdj <column>` metric next to every volume column a record
/// carries. Teams without possession data keep their raw value. Returns the
/// set of PAdj columns added.
pub fn add_padj_metrics(records: &mut [PlayerRecord], possessions: &TeamPossessions) -> BTreeSet<String> {
    let sources: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.metrics.keys())
        .filter(|c| is_padj_source(c))
        .cloned()
        .collect();

    let mut added = BTreeSet::new();
    for record in records.iter_mut() {
        let factor = possessions.factor(&record.team);
        for column in &sources {
            if !record.has_column(column) {
                continue;
            }
            let raw = record.value(column);
            let adjusted = match factor {
                Some(f) => raw.map(|v| round2(v * f)),
                None => raw,
            };
            let name = padj_column_name(column);
            record.metrics.insert(name.clone(), adjusted);
            added.insert(name);
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conference, PositionProfile};

    #[test]
    fn source_columns() {
        assert!(is_padj_source("Passes per 90"));
        assert!(is_padj_source("Progressive passes per 90"));
        assert!(is_padj_source("Interceptions per 90"));
        assert!(!is_padj_source("Accurate passes, %"));
        assert!(!is_padj_source("PAdj Passes per 90"));
        assert!(!is_padj_source("Goals per 90"));
    }

    #[test]
    fn adjusts_by_league_ratio() {
        let possessions = TeamPossessions::from_teams(BTreeMap::from([
            ("Slow FC".to_string(), 80.0),
            ("Fast FC".to_string(), 120.0),
        ]));
        let mut records = vec![
            PlayerRecord::new("a", "Slow FC", PositionProfile::HybridCb, Conference::Acc, 2025)
                .with_metric("Passes per 90", Some(40.0))
                .with_metric("Accurate passes, %", Some(80.0)),
            PlayerRecord::new("b", "Unknown FC", PositionProfile::HybridCb, Conference::Acc, 2025)
                .with_metric("Passes per 90", Some(30.0)),
        ];
        let added = add_padj_metrics(&mut records, &possessions);
        assert_eq!(added, BTreeSet::from(["PAdj Passes per 90".to_string()]));
        assert_eq!(records[0].value("PAdj Passes per 90"), Some(50.0));
        assert_eq!(records[1].value("PAdj Passes per 90"), Some(30.0));
        assert!(!records[0].has_column("PAdj Accurate passes, %"));
    }
}
