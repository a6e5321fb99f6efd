use std::fs;
use std::path::Path;

use crate::columns::{normalize_team_name, teams_match};
use crate::dataset::{ExportTable, is_workbook};

const FILE_PREFIX: &str = "Team Stats ";
const PASSES_COLUMN: &str = "Passes";
const PASSES_PER_POSSESSION_COLUMN: &str = "Average passes per possession";
const DURATION_COLUMN: &str = "Duration";
const DATE_COLUMN: &str = "Date";

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStats {
    pub team: String,
    pub matches: usize,
    pub possessions_per_game: Option<f64>,
    pub total_minutes: Option<f64>,
}

pub fn team_name_from_file(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut name = stem.trim();
    name = name.strip_prefix(FILE_PREFIX).unwrap_or(name).trim();
    if let Some(open) = name.rfind(" (")
        && let Some(digits) = name[open + 2..].strip_suffix(')')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
    {
        name = name[..open].trim();
    }
    normalize_team_name(name)
}

pub fn summarize_team_table(team: &str, table: &ExportTable) -> TeamStats {
    // Some exports open with a team summary row instead of a match.
    let first_match_row = match table.cell(0, DATE_COLUMN) {
        Some(date) if !date.is_empty() && !date.starts_with("20") => 1,
        _ => 0,
    };

    let mut possessions = Vec::new();
    let mut minutes = 0.0;
    let mut has_minutes = false;
    let mut matches = 0usize;
    for row in first_match_row..table.rows.len() {
        matches += 1;
        let passes = table.number(row, PASSES_COLUMN);
        let per_possession = table.number(row, PASSES_PER_POSSESSION_COLUMN);
        if let (Some(p), Some(pp)) = (passes, per_possession)
            && pp > 0.0
        {
            possessions.push(p / pp);
        }
        if let Some(d) = table.number(row, DURATION_COLUMN) {
            minutes += d;
            has_minutes = true;
        }
    }

    TeamStats {
        team: team.to_string(),
        matches,
        possessions_per_game: mean(&possessions),
        total_minutes: has_minutes.then_some(minutes),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    pub teams: Vec<TeamStats>,
    pub errors: Vec<String>,
}

impl TeamDirectory {
    pub fn load(dir: &Path) -> Self {
        let mut out = TeamDirectory::default();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                let msg = format!("team stats dir {}: {err}", dir.display());
                log::warn!("{msg}");
                out.errors.push(msg);
                return out;
            }
        };
        let mut files: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                (is_workbook(p) || p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
                    && p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(FILE_PREFIX))
            })
            .collect();
        files.sort();

        for path in files {
            match ExportTable::read(&path) {
                Ok(table) => {
                    let team = team_name_from_file(&path);
                    out.teams.push(summarize_team_table(&team, &table));
                }
                Err(err) => {
                    log::warn!("{err}");
                    out.errors.push(err.to_string());
                }
            }
        }
        out
    }

    pub fn find(&self, team: &str) -> Option<&TeamStats> {
        self.teams
            .iter()
            .find(|t| normalize_team_name(&t.team).eq_ignore_ascii_case(&normalize_team_name(team)))
            .or_else(|| self.teams.iter().find(|t| teams_match(&t.team, team)))
    }

    pub fn total_minutes(&self, team: &str) -> Option<f64> {
        self.find(team).and_then(|t| t.total_minutes)
    }
}

pub fn pct_of_team_minutes(player_minutes: Option<f64>, team_minutes: Option<f64>) -> Option<f64> {
    let player = player_minutes?;
    let team = team_minutes.filter(|t| *t > 0.0)?;
    Some((player / team * 100.0).min(100.0))
}
