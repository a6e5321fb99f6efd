use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::columns::team_key;
use crate::comparison::{PadjComparisonRow, WeightingComparison};
use crate::experience::ExperienceClass;
use crate::model::{Grade, ScoredPlayer};
use crate::report::{ConferenceReport, PositionVariant};

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub sheets: usize,
    pub rows: usize,
}

pub fn grade_color(grade: Grade) -> u32 {
    match grade {
        Grade::A => 0x8B0000,
        Grade::B => 0xC5504B,
        Grade::C => 0xF2A2A2,
        Grade::D => 0x8FAADC,
        Grade::F => 0x1F4E79,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinutesBand {
    pub label: &'static str,
    pub lower: f64,
    pub color: u32,
}

pub const MINUTES_BANDS: [MinutesBand; 6] = [
    MinutesBand { label: "0-187", lower: 0.0, color: 0x1F4E79 },
    MinutesBand { label: "187-373", lower: 187.0, color: 0x4472C4 },
    MinutesBand { label: "373-560", lower: 373.0, color: 0x8FAADC },
    MinutesBand { label: "560-747", lower: 560.0, color: 0xF2A2A2 },
    MinutesBand { label: "747-933", lower: 747.0, color: 0xC5504B },
    MinutesBand { label: "933+", lower: 933.0, color: 0x8B0000 },
];

pub fn minutes_band(minutes: f64) -> usize {
    MINUTES_BANDS
        .iter()
        .rposition(|b| minutes >= b.lower)
        .unwrap_or(0)
}

fn light_fill(color: u32) -> bool {
    matches!(color, 0xF2A2A2 | 0x8FAADC)
}

fn fill_format(color: u32) -> Format {
    let font = if light_fill(color) { Color::Black } else { Color::White };
    Format::new()
        .set_background_color(Color::RGB(color))
        .set_font_color(font)
        .set_align(FormatAlign::Center)
}

struct Formats {
    header: Format,
    title: Format,
    number: Format,
    grades: Vec<(Grade, Format)>,
    minutes: Vec<Format>,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xD9E1F2))
                .set_border(FormatBorder::Thin),
            title: Format::new().set_bold().set_font_size(14),
            number: Format::new().set_num_format("0.00"),
            grades: Grade::ALL
                .into_iter()
                .map(|g| (g, fill_format(grade_color(g))))
                .collect(),
            minutes: MINUTES_BANDS
                .iter()
                .map(|b| fill_format(b.color).set_num_format("0"))
                .collect(),
        }
    }

    fn grade(&self, grade: Grade) -> &Format {
        self.grades
            .iter()
            .find(|(g, _)| *g == grade)
            .map(|(_, f)| f)
            .unwrap_or(&self.header)
    }
}

pub fn sheet_name(raw: &str, used: &mut BTreeSet<String>) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '-' } else { c })
        .collect();
    let base: String = cleaned.trim().chars().take(31).collect();
    let base = if base.is_empty() { "Sheet".to_string() } else { base };
    let mut name = base.clone();
    let mut n = 2;
    while used.contains(&name.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = 31usize.saturating_sub(suffix.len());
        name = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    used.insert(name.to_lowercase());
    name
}

fn write_header(sheet: &mut Worksheet, row: u32, headers: &[String], fmt: &Format) -> Result<()> {
    for (col, h) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(row, col as u16, h, fmt)
            .with_context(|| format!("write header ({row},{col})"))?;
    }
    Ok(())
}

fn write_opt_number(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>, fmt: &Format) -> Result<()> {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        sheet
            .write_number_with_format(row, col, v, fmt)
            .with_context(|| format!("write cell ({row},{col})"))?;
    }
    Ok(())
}

fn write_grade(sheet: &mut Worksheet, row: u32, col: u16, grade: Option<Grade>, formats: &Formats) -> Result<()> {
    if let Some(g) = grade {
        sheet
            .write_string_with_format(row, col, g.letter(), formats.grade(g))
            .with_context(|| format!("write grade ({row},{col})"))?;
    }
    Ok(())
}

fn player_headers(season: i32, metrics: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = [
        "Player",
        "Team",
        "Position",
        "Position Profile",
        "Minutes played",
        "% of Team Minutes",
        "NCAA Seasons",
        "Experience",
        "Core Score",
        "Specific Score",
        "Total Score",
        "Total Percentile",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    headers.push(format!("{season} Total Score"));
    for h in [
        "Grade",
        "Team Grade",
        "Conference Grade",
        "Power Five Grade",
        "Experience Grade",
        "Top 15s",
    ] {
        headers.push(h.to_string());
    }
    for h in ["Previous Year", "Previous Score", "Change From Previous"] {
        headers.push(h.to_string());
    }
    headers.extend(metrics.iter().cloned());
    headers
}

fn write_player_table(
    sheet: &mut Worksheet,
    players: &[&ScoredPlayer],
    metrics: &[String],
    season: i32,
    formats: &Formats,
) -> Result<usize> {
    let headers = player_headers(season, metrics);
    write_header(sheet, 0, &headers, &formats.header)?;

    for (idx, p) in players.iter().enumerate() {
        let row = idx as u32 + 1;
        let r = &p.record;
        sheet.write_string(row, 0, &r.player)?;
        sheet.write_string(row, 1, &r.team)?;
        sheet.write_string(row, 2, &r.position)?;
        sheet.write_string(row, 3, r.profile.display_name())?;
        if let Some(minutes) = r.minutes() {
            let band = &formats.minutes[minutes_band(minutes)];
            sheet.write_number_with_format(row, 4, minutes, band)?;
        }
        write_opt_number(sheet, row, 5, p.pct_of_team_minutes, &formats.number)?;
        if let Some(n) = p.ncaa_seasons {
            sheet.write_number(row, 6, n as f64)?;
            sheet.write_string(row, 7, ExperienceClass::from_seasons(n).label())?;
        }
        write_opt_number(sheet, row, 8, Some(p.score.core), &formats.number)?;
        write_opt_number(sheet, row, 9, Some(p.score.specific), &formats.number)?;
        write_opt_number(sheet, row, 10, Some(p.score.total), &formats.number)?;
        write_opt_number(sheet, row, 11, p.total_percentile, &formats.number)?;
        write_opt_number(sheet, row, 12, Some(p.total_score_1_10), &formats.number)?;
        write_grade(sheet, row, 13, Some(p.total_grade), formats)?;
        write_grade(sheet, row, 14, p.team_grade, formats)?;
        write_grade(sheet, row, 15, p.conference_grade, formats)?;
        write_grade(sheet, row, 16, p.power_five_grade, formats)?;
        write_grade(sheet, row, 17, p.experience_grade, formats)?;
        if let Some(top) = p.top_15s {
            sheet.write_number(row, 18, top as f64)?;
        }
        if let Some(year) = p.previous_season {
            sheet.write_number(row, 19, year as f64)?;
        }
        write_opt_number(sheet, row, 20, p.previous_score_1_10, &formats.number)?;
        write_opt_number(sheet, row, 21, p.change_from_previous(), &formats.number)?;
        for (offset, metric) in metrics.iter().enumerate() {
            let col = 22 + offset as u16;
            write_opt_number(sheet, row, col, p.score.metric_scores.get(metric).copied(), &formats.number)?;
        }
    }

    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 24)?;
    sheet.set_column_width(3, 22)?;
    sheet.set_freeze_panes(1, 1)?;
    Ok(players.len())
}

fn write_notes(sheet: &mut Worksheet, lines: &[(String, String)], formats: &Formats) -> Result<()> {
    sheet.write_string_with_format(0, 0, "Data Summary", &formats.title)?;
    let mut row = 2u32;
    for (key, value) in lines {
        sheet.write_string_with_format(row, 0, key, &formats.header)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }

    row += 1;
    sheet.write_string_with_format(row, 0, "Grade", &formats.header)?;
    sheet.write_string_with_format(row, 1, "Percentile", &formats.header)?;
    for (grade, band) in Grade::ALL.into_iter().zip(["90+", "80-89", "70-79", "60-69", "<60"]) {
        row += 1;
        write_grade(sheet, row, 0, Some(grade), formats)?;
        sheet.write_string(row, 1, band)?;
    }

    row += 2;
    sheet.write_string_with_format(row, 0, "Minutes played", &formats.header)?;
    for (idx, band) in MINUTES_BANDS.iter().enumerate() {
        row += 1;
        sheet.write_string_with_format(row, 0, band.label, &formats.minutes[idx])?;
    }
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 60)?;
    Ok(())
}

fn save(mut workbook: Workbook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))
}

pub fn write_conference_report(path: &Path, report: &ConferenceReport) -> Result<ExportSummary> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut used = BTreeSet::new();
    let season = report.settings.season;

    let mut notes = vec![
        ("Conference".to_string(), report.conference.to_string()),
        ("Season".to_string(), season.to_string()),
        ("Accuracy weighting".to_string(), report.settings.split.label()),
        (
            "Possession adjusted".to_string(),
            if report.settings.padj { "Yes" } else { "No" }.to_string(),
        ),
        ("Players".to_string(), report.players().count().to_string()),
        (
            "Reference seasons".to_string(),
            format!("{}-{}", report.settings.first_season, season),
        ),
    ];
    if !report.unresolved_columns.is_empty() {
        notes.push(("Missing columns".to_string(), report.unresolved_columns.join(", ")));
    }
    for err in &report.errors {
        notes.push(("Warning".to_string(), err.clone()));
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name("Data Summary", &mut used))?;
        write_notes(sheet, &notes, &formats)?;
    }

    let mut rows = 0;
    for profile in &report.profiles {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(profile.profile.display_name(), &mut used))?;
        let players: Vec<&ScoredPlayer> = profile.players.iter().collect();
        rows += write_player_table(sheet, &players, &profile.metrics, season, &formats)?;
    }

    let team_sheets = write_team_sheets(&mut workbook, report.players().collect(), &[], season, &formats, &mut used)?;

    let sheets = 1 + report.profiles.len() + team_sheets;
    save(workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        sheets,
        rows,
    })
}

fn write_team_sheets(
    workbook: &mut Workbook,
    mut players: Vec<&ScoredPlayer>,
    metrics: &[String],
    season: i32,
    formats: &Formats,
    used: &mut BTreeSet<String>,
) -> Result<usize> {
    players.sort_by(|a, b| {
        team_key(&a.record.team)
            .cmp(&team_key(&b.record.team))
            .then(a.record.profile.cmp(&b.record.profile))
            .then(a.total_grade.cmp(&b.total_grade))
            .then(b.score.total.total_cmp(&a.score.total))
    });
    let mut sheets = 0;
    for chunk in players.chunk_by(|a, b| team_key(&a.record.team) == team_key(&b.record.team)) {
        let Some(first) = chunk.first() else { continue };
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(&first.record.team, used))?;
        write_player_table(sheet, chunk, metrics, season, formats)?;
        sheets += 1;
    }
    Ok(sheets)
}

pub fn write_position_variants(
    path: &Path,
    variants: &[PositionVariant],
    season: i32,
    by_team: bool,
) -> Result<ExportSummary> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut used = BTreeSet::new();
    let mut rows = 0;
    let mut sheets = 0;

    for variant in variants {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(&variant.label, &mut used))?;
        let players: Vec<&ScoredPlayer> = variant.players.iter().collect();
        rows += write_player_table(sheet, &players, &variant.metrics, season, &formats)?;
        sheets += 1;
    }
    if by_team && let Some(first) = variants.first() {
        sheets += write_team_sheets(
            &mut workbook,
            first.players.iter().collect(),
            &first.metrics,
            season,
            &formats,
            &mut used,
        )?;
    }

    save(workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        sheets,
        rows,
    })
}

pub fn write_weighting_comparison(path: &Path, comparison: &WeightingComparison) -> Result<ExportSummary> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let labels = &comparison.labels;
    let baseline = labels.first().cloned().unwrap_or_default();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Player Comparison")?;
        let mut headers: Vec<String> = ["Player", "Team", "Position", "Position Profile"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        headers.extend(labels.iter().map(|l| format!("Score ({l})")));
        headers.extend(labels.iter().map(|l| format!("Conference Grade ({l})")));
        headers.extend(labels.iter().map(|l| format!("Power Five Grade ({l})")));
        headers.extend(labels.iter().skip(1).map(|l| format!("Δ Score ({l} - {baseline})")));
        write_header(sheet, 0, &headers, &formats.header)?;

        let n = labels.len() as u16;
        for (idx, r) in comparison.rows.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, &r.player)?;
            sheet.write_string(row, 1, &r.team)?;
            sheet.write_string(row, 2, &r.position)?;
            sheet.write_string(row, 3, r.profile.display_name())?;
            for (i, cell) in r.cells.iter().enumerate() {
                let i = i as u16;
                write_opt_number(sheet, row, 4 + i, cell.as_ref().map(|c| c.score), &formats.number)?;
                write_grade(sheet, row, 4 + n + i, cell.as_ref().and_then(|c| c.conference_grade), &formats)?;
                write_grade(sheet, row, 4 + 2 * n + i, cell.as_ref().and_then(|c| c.power_five_grade), &formats)?;
            }
            for i in 1..labels.len() {
                let col = 4 + 3 * n + (i as u16 - 1);
                write_opt_number(sheet, row, col, r.delta(i), &formats.number)?;
            }
        }
        sheet.set_column_width(0, 24)?;
        sheet.set_column_width(1, 24)?;
        sheet.set_freeze_panes(1, 1)?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        let mut headers = vec!["Position Profile".to_string(), "Players".to_string()];
        headers.extend(labels.iter().map(|l| format!("Avg Score ({l})")));
        headers.extend(labels.iter().skip(1).map(|l| format!("Avg Δ Score ({l} - {baseline})")));
        write_header(sheet, 0, &headers, &formats.header)?;
        for (idx, s) in comparison.summary().iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, &s.group)?;
            sheet.write_number(row, 1, s.players as f64)?;
            let mut col = 2u16;
            for avg in &s.average_scores {
                write_opt_number(sheet, row, col, *avg, &formats.number)?;
                col += 1;
            }
            for delta in s.average_deltas.iter().skip(1) {
                write_opt_number(sheet, row, col, *delta, &formats.number)?;
                col += 1;
            }
        }
        sheet.set_column_width(0, 24)?;
    }

    save(workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        sheets: 2,
        rows: comparison.rows.len(),
    })
}

pub fn write_padj_comparison(path: &Path, rows: &[PadjComparisonRow]) -> Result<ExportSummary> {
    let formats = Formats::new();
    let gain = Format::new()
        .set_num_format("0.00")
        .set_font_color(Color::RGB(0x006100));
    let loss = Format::new()
        .set_num_format("0.00")
        .set_font_color(Color::RGB(0x9C0006));
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("PAdj Score Comparison")?;
        let headers: Vec<String> = [
            "Player",
            "Team",
            "Position Profile",
            "Pre-PAdj Score",
            "Post-PAdj Score",
            "Difference",
            "% Change",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        write_header(sheet, 0, &headers, &formats.header)?;
        for (idx, r) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, &r.player)?;
            sheet.write_string(row, 1, &r.team)?;
            sheet.write_string(row, 2, r.profile.display_name())?;
            sheet.write_number_with_format(row, 3, r.pre, &formats.number)?;
            sheet.write_number_with_format(row, 4, r.post, &formats.number)?;
            let diff_fmt = if r.difference() >= 0.0 { &gain } else { &loss };
            sheet.write_number_with_format(row, 5, r.difference(), diff_fmt)?;
            sheet.write_number_with_format(row, 6, r.percent_change(), diff_fmt)?;
        }
        sheet.set_column_width(0, 24)?;
        sheet.set_column_width(1, 24)?;
        sheet.set_column_width(2, 22)?;
        sheet.set_freeze_panes(1, 0)?;
    }
    save(workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        sheets: 1,
        rows: rows.len(),
    })
}
