use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::columns::{normalize_player_name, team_key};
use crate::dataset::{ExportTable, PLAYER_COLUMN, POSITION_COLUMN};

const MATCHES_COLUMN: &str = "Matches played";
const MINUTES_COLUMN: &str = "Minutes played";
const GOALS_COLUMN: &str = "Goals";
const ASSISTS_COLUMN: &str = "Assists";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assists: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl Criteria {
    fn is_empty(&self) -> bool {
        self.matches.is_none()
            && self.minutes.is_none()
            && self.goals.is_none()
            && self.assists.is_none()
            && self.position.is_none()
    }

    pub fn matches_row(&self, table: &ExportTable, row: usize) -> bool {
        if self.is_empty() {
            return false;
        }
        let numeric = [
            (self.matches, MATCHES_COLUMN),
            (self.minutes, MINUTES_COLUMN),
            (self.goals, GOALS_COLUMN),
            (self.assists, ASSISTS_COLUMN),
        ];
        for (wanted, column) in numeric {
            let Some(wanted) = wanted else { continue };
            match table.number(row, column) {
                Some(v) if (v - wanted).abs() < 1e-9 => {}
                _ => return false,
            }
        }
        if let Some(pos) = &self.position {
            let cell = table.cell(row, POSITION_COLUMN).unwrap_or_default();
            if !cell.to_lowercase().contains(&pos.trim().to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    pub when: Criteria,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationRule {
    pub player: String,
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<Criteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<Criteria>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
}

impl CurationRule {
    fn rows(&self, table: &ExportTable) -> Vec<usize> {
        let player = normalize_player_name(&self.player);
        let team = team_key(&self.team);
        (0..table.rows.len())
            .filter(|row| {
                table
                    .player(*row)
                    .is_some_and(|p| normalize_player_name(p) == player)
                    && table.team(*row).is_some_and(|t| team_key(t) == team)
            })
            .collect()
    }

    fn is_rename_only(&self) -> bool {
        !self.renames.is_empty() && self.keep.is_none() && self.remove.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurationList {
    #[serde(default)]
    pub rules: Vec<CurationRule>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurationReport {
    pub removed: usize,
    pub renamed: usize,
    pub notes: Vec<String>,
}

impl CurationReport {
    pub fn changed_rows(&self) -> usize {
        self.removed + self.renamed
    }
}

impl CurationList {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read curation list {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse curation list {}", path.display()))
    }

    pub fn apply(&self, table: &mut ExportTable) -> CurationReport {
        let mut report = CurationReport::default();
        let mut drop_rows = BTreeSet::new();

        for rule in &self.rules {
            let rows = rule.rows(table);
            for rename in &rule.renames {
                for row in rows.iter().copied() {
                    if rename.when.matches_row(table, row)
                        && table.set_cell(row, PLAYER_COLUMN, &rename.to)
                    {
                        report.renamed += 1;
                        report
                            .notes
                            .push(format!("renamed {} ({}) -> {}", rule.player, rule.team, rename.to));
                    }
                }
            }
            if rule.is_rename_only() {
                continue;
            }

            let rows = rule.rows(table);
            if rows.len() < 2 {
                continue;
            }
            let mut picked: Vec<usize> = rows
                .iter()
                .copied()
                .filter(|row| {
                    let removed = rule
                        .remove
                        .as_ref()
                        .is_some_and(|c| c.matches_row(table, *row));
                    let kept = rule
                        .keep
                        .as_ref()
                        .is_some_and(|c| c.matches_row(table, *row));
                    removed || (rule.keep.is_some() && !kept)
                })
                .collect();
            // Never drop every row of a player.
            if picked.len() == rows.len() || picked.is_empty() {
                picked = rows[1..].to_vec();
            }
            report.notes.push(format!(
                "{} ({}): kept {} of {} rows",
                rule.player,
                rule.team,
                rows.len() - picked.len(),
                rows.len()
            ));
            for row in picked {
                if drop_rows.insert(row) {
                    report.removed += 1;
                }
            }
        }

        for row in drop_rows.into_iter().rev() {
            table.rows.remove(row);
        }
        report
    }
}

pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_BACKUP_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_BACKUP_{stamp}"),
    };
    let backup = path.with_file_name(name);
    fs::copy(path, &backup)
        .with_context(|| format!("backup {} -> {}", path.display(), backup.display()))?;
    Ok(backup)
}
