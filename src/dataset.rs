use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;

use crate::columns::normalize_team_name;
use crate::curation::CurationList;
use crate::error::{Recovery, ScoutError};
use crate::model::{Conference, PlayerRecord, PositionProfile};

pub const PLAYER_COLUMN: &str = "Player";
pub const POSITION_COLUMN: &str = "Position";
pub const MINUTES_COLUMN: &str = "Minutes played";
pub const TEAM_COLUMNS: &[&str] = &["Team within selected timeframe", "Team"];

// Descriptive columns that are never metrics even when a cell looks numeric.
const TEXT_COLUMNS: &[&str] = &[
    "Player",
    "Team",
    "Team within selected timeframe",
    "Position",
    "Birth country",
    "Passport country",
    "Foot",
    "On loan",
    "Contract expires",
    "League",
    "Conference",
    "Year",
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn read_csv(path: &Path) -> std::result::Result<Self, ScoutError> {
        if !path.is_file() {
            return Err(ScoutError::MissingFile(path.to_path_buf()));
        }
        let file = fs::File::open(path).map_err(|e| ScoutError::unreadable(path, e))?;
        Self::from_reader(file).map_err(|e| ScoutError::unreadable(path, e))
    }

    pub fn read(path: &Path) -> std::result::Result<Self, ScoutError> {
        if is_workbook(path) {
            Self::read_xlsx(path)
        } else {
            Self::read_csv(path)
        }
    }

    pub fn read_xlsx(path: &Path) -> std::result::Result<Self, ScoutError> {
        if !path.is_file() {
            return Err(ScoutError::MissingFile(path.to_path_buf()));
        }
        let mut workbook = open_workbook_auto(path).map_err(|e| ScoutError::unreadable(path, e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ScoutError::unreadable(path, "workbook has no sheets"))?
            .map_err(|e| ScoutError::unreadable(path, e))?;
        let mut cells = range
            .rows()
            .map(|row| row.iter().map(|c| c.to_string()).collect::<Vec<String>>());
        let headers: Vec<String> = cells
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = cells
            .map(|mut row| {
                row.resize(headers.len(), String::new());
                row
            })
            .collect();
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if is_workbook(path) {
            self.write_xlsx(path)
        } else {
            self.write_csv(path)
        }
    }

    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("tmp.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string(0, col as u16, header)?;
        }
        for (idx, row) in self.rows.iter().enumerate() {
            let r = idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                match cell.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => sheet.write_number(r, col as u16, v)?,
                    _ if cell.is_empty() => continue,
                    _ => sheet.write_string(r, col as u16, cell)?,
                };
            }
        }
        workbook
            .save(&tmp)
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp)
                .with_context(|| format!("create {}", tmp.display()))?;
            wtr.write_record(&self.headers)
                .with_context(|| format!("write header to {}", tmp.display()))?;
            for row in &self.rows {
                wtr.write_record(row)
                    .with_context(|| format!("write row to {}", tmp.display()))?;
            }
            wtr.flush()
                .with_context(|| format!("flush {}", tmp.display()))?;
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .map(|s| s.trim())
    }

    pub fn set_cell(&mut self, row: usize, column: &str, value: &str) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|r| r.get_mut(idx)) {
            Some(cell) => {
                *cell = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.cell(row, column).and_then(parse_number)
    }

    pub fn player(&self, row: usize) -> Option<&str> {
        self.cell(row, PLAYER_COLUMN).filter(|s| !s.is_empty())
    }

    pub fn team(&self, row: usize) -> Option<&str> {
        TEAM_COLUMNS
            .iter()
            .filter_map(|c| self.cell(row, c))
            .find(|s| !s.is_empty())
    }

    fn metric_columns(&self) -> Vec<(usize, &str)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .filter(|(_, h)| !TEXT_COLUMNS.iter().any(|t| t.eq_ignore_ascii_case(h)))
            // An all-blank column is still a metric, recorded as missing.
            .filter(|(idx, _)| {
                let cells = || self.rows.iter().filter_map(|r| r.get(*idx));
                cells().any(|c| parse_number(c).is_some()) || cells().all(|c| is_blank(c))
            })
            .map(|(idx, h)| (idx, h.as_str()))
            .collect()
    }

    pub fn to_records(
        &self,
        profile: PositionProfile,
        conference: Conference,
        season: i32,
    ) -> Vec<PlayerRecord> {
        let metric_columns = self.metric_columns();
        let mut out = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let Some(player) = self.player(row_idx) else {
                continue;
            };
            let team = self.team(row_idx).map(normalize_team_name).unwrap_or_default();
            let mut record = PlayerRecord::new(player.to_string(), team, profile, conference, season);
            record.position = self.cell(row_idx, POSITION_COLUMN).unwrap_or_default().to_string();
            for (idx, column) in &metric_columns {
                let value = row.get(*idx).and_then(|c| parse_number(c));
                record.metrics.insert((*column).to_string(), value);
            }
            out.push(record);
        }
        out
    }
}

/// Parses export cells such as `1,234`, `45.2%` or ` 3 `. `-`, blanks and
/// anything with letters are missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" || s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let cleaned: String = s
        .trim_end_matches('%')
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "xlsx" | "xlsm" | "xls"))
}

fn is_blank(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty() || s == "-"
}

#[derive(Debug, Clone)]
pub struct ExportLayout {
    pub root: PathBuf,
    pub current_season: i32,
}

impl ExportLayout {
    pub fn new(root: impl Into<PathBuf>, current_season: i32) -> Self {
        Self {
            root: root.into(),
            current_season,
        }
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("Exports")
    }

    pub fn player_stats_dir(&self, season: i32) -> PathBuf {
        if season >= self.current_season {
            self.exports_dir().join("Players Stats By Position")
        } else {
            self.exports_dir().join("Past Seasons")
        }
    }

    pub fn position_file(&self, profile: PositionProfile, conference: Conference, season: i32) -> PathBuf {
        let stem = format!("{} {} {}", profile.file_prefix(), conference.code(), season);
        let dir = self.player_stats_dir(season);
        let xlsx = dir.join(format!("{stem}.xlsx"));
        if xlsx.is_file() {
            xlsx
        } else {
            dir.join(format!("{stem}.csv"))
        }
    }

    pub fn team_stats_dir(&self, conference: Conference) -> PathBuf {
        self.exports_dir()
            .join("Team Stats By Conference")
            .join(conference.code())
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<PlayerRecord>,
    pub files: usize,
    pub curated_rows: usize,
    pub errors: Vec<String>,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.records.extend(other.records);
        self.files += other.files;
        self.curated_rows += other.curated_rows;
        self.errors.extend(other.errors);
    }
}

pub fn load_position_file(
    layout: &ExportLayout,
    profile: PositionProfile,
    conference: Conference,
    season: i32,
    curation: Option<&CurationList>,
) -> std::result::Result<(Vec<PlayerRecord>, usize), ScoutError> {
    let path = layout.position_file(profile, conference, season);
    let mut table = ExportTable::read(&path)?;
    if table.column_index(PLAYER_COLUMN).is_none() {
        return Err(ScoutError::MissingColumn {
            path,
            column: PLAYER_COLUMN.to_string(),
        });
    }
    let curated = match curation {
        Some(list) => list.apply(&mut table).changed_rows(),
        None => 0,
    };
    Ok((table.to_records(profile, conference, season), curated))
}

pub fn load_conference_season(
    layout: &ExportLayout,
    conference: Conference,
    season: i32,
    curation: Option<&CurationList>,
) -> LoadReport {
    let mut report = LoadReport::default();
    for profile in PositionProfile::ALL {
        match load_position_file(layout, profile, conference, season, curation) {
            Ok((records, curated)) => {
                log::debug!(
                    "{} {} {}: {} players",
                    profile.file_prefix(),
                    conference,
                    season,
                    records.len()
                );
                report.files += 1;
                report.curated_rows += curated;
                report.records.extend(records);
            }
            Err(err) if err.recovery() == Recovery::Continue => {
                log::warn!("{err}");
                report.errors.push(err.to_string());
            }
            Err(err) => {
                log::error!("{err}");
                report.errors.push(err.to_string());
            }
        }
    }
    report
}

pub fn load_seasons(
    layout: &ExportLayout,
    conferences: &[Conference],
    first_season: i32,
    last_season: i32,
    curation: Option<&CurationList>,
) -> LoadReport {
    let mut report = LoadReport::default();
    for season in first_season..=last_season {
        for conference in conferences {
            report.merge(load_conference_season(layout, *conference, season, curation));
        }
    }
    report
}

pub fn filter_by_position(records: Vec<PlayerRecord>, profile: PositionProfile) -> Vec<PlayerRecord> {
    records
        .into_iter()
        .filter(|r| profile.matches_position(&r.position))
        .collect()
}

pub fn has_data(record: &PlayerRecord, columns: &BTreeSet<String>) -> bool {
    columns
        .iter()
        .any(|c| record.value(c).is_some_and(|v| v != 0.0))
}

pub fn filter_players_with_data(
    records: Vec<PlayerRecord>,
    columns: &BTreeSet<String>,
) -> Vec<PlayerRecord> {
    let any_column = records
        .iter()
        .any(|r| columns.iter().any(|c| r.has_column(c)));
    if !any_column {
        return records;
    }
    records.into_iter().filter(|r| has_data(r, columns)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_handles_export_cells() {
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number(" 45.5% "), Some(45.5));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number("RCB"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn empty_metric_columns_load_as_missing() {
        let csv = "Player,Team,Position,Interceptions per 90,Shots blocked per 90,Nickname\n\
                   A,T,CB,2.5,-,left\n\
                   B,T,CB,1.5,,right\n";
        let table = ExportTable::from_reader(csv.as_bytes()).expect("csv");
        let records = table.to_records(PositionProfile::HybridCb, Conference::Acc, 2025);
        assert_eq!(records.len(), 2);
        for r in &records {
            assert!(r.has_column("Shots blocked per 90"));
            assert_eq!(r.value("Shots blocked per 90"), None);
        }
        assert!(!records[0].has_column("Nickname"));
    }

    #[test]
    fn team_prefers_timeframe_column() {
        let csv = "Player,Team,Team within selected timeframe\nA,New FC,Old FC\nB,Solo FC,\n";
        let table = ExportTable::from_reader(csv.as_bytes()).expect("csv");
        assert_eq!(table.team(0), Some("Old FC"));
        assert_eq!(table.team(1), Some("Solo FC"));
    }

    #[test]
    fn layout_splits_current_and_past() {
        let layout = ExportLayout::new("/data", 2025);
        assert_eq!(
            layout.position_file(PositionProfile::HybridCb, Conference::Acc, 2025),
            PathBuf::from("/data/Exports/Players Stats By Position/CB Hybrid ACC 2025.csv")
        );
        assert_eq!(
            layout.position_file(PositionProfile::TouchlineWinger, Conference::Sec, 2023),
            PathBuf::from("/data/Exports/Past Seasons/W Touchline Winger SEC 2023.csv")
        );
    }
}
