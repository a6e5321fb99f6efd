use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use ncaa_scout::config::{AccuracySplit, load_scoring_config};
use ncaa_scout::dataset::{filter_by_position, filter_players_with_data};
use ncaa_scout::export::{ExportSummary, write_position_variants};
use ncaa_scout::model::{Conference, PlayerRecord, PositionProfile};
use ncaa_scout::report::{PositionVariant, ReportSettings, build_position_variant, load_run_inputs};
use ncaa_scout::settings::{Settings, flag_value, has_flag, init_logging, positionals};

const VARIANTS: [(&str, AccuracySplit); 2] = [
    ("Intent_Focused", AccuracySplit::INTENT_80_20),
    ("Balanced", AccuracySplit::INTENT_60_40),
];

const USAGE: &str = "usage: ncaa_scout [position] [season] [--config <path>] [--by-team]";

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if has_flag(&args, "help") {
        println!("{USAGE}");
        return Ok(());
    }
    let positional = positionals(&args, &["config"]);

    let profiles = match positional.first() {
        Some(raw) => match PositionProfile::parse(raw) {
            Some(profile) => vec![profile],
            None => bail!("unknown position {raw:?}\n{USAGE}"),
        },
        None => PositionProfile::ALL.to_vec(),
    };

    let mut settings = Settings::from_env();
    if let Some(raw) = positional.get(1) {
        settings.season = raw
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid season {raw:?}"))?;
        settings.first_season = settings.first_season.min(settings.season);
    }
    let by_team = has_flag(&args, "by-team");

    let layout = settings.layout()?;
    let config_path = flag_value(&args, "config").map(PathBuf::from);
    let config = load_scoring_config(config_path.as_deref(), &settings.data_dir)?;
    let curation = settings.curation()?;

    let inputs = load_run_inputs(
        &layout,
        &Conference::ALL,
        settings.first_season,
        curation.as_ref(),
        false,
    );

    let mut written = Vec::new();
    let mut errors = inputs.errors.clone();
    for profile in &profiles {
        let base = config.profile(*profile)?;
        let records: Vec<PlayerRecord> = inputs
            .records
            .iter()
            .filter(|r| r.profile == *profile)
            .cloned()
            .collect();
        let records = filter_players_with_data(
            filter_by_position(records, *profile),
            &base.component_columns(),
        );
        if !records.iter().any(|r| r.season == settings.season) {
            errors.push(format!("{profile}: no {} players on file", settings.season));
            continue;
        }

        let variants: Vec<PositionVariant> = VARIANTS
            .iter()
            .map(|(label, split)| {
                let run = ReportSettings {
                    split: *split,
                    padj: false,
                    ..ReportSettings::new(settings.season, settings.first_season)
                };
                build_position_variant(base, &records, *profile, run, label)
            })
            .collect();

        match write_variant_workbooks(&settings, *profile, &variants, by_team) {
            Ok(mut summaries) => written.append(&mut summaries),
            Err(err) => errors.push(format!("{profile}: {err:#}")),
        }
    }

    println!("Position report batch complete");
    println!("Season: {} (reference from {})", settings.season, settings.first_season);
    println!("Files read: {}", inputs.files);
    if inputs.curated_rows > 0 {
        println!("Curated rows: {}", inputs.curated_rows);
    }
    println!("Workbooks written: {}", written.len());
    for summary in &written {
        println!(
            " - {} ({} sheets, {} rows)",
            summary.path.display(),
            summary.sheets,
            summary.rows
        );
    }
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}

fn write_variant_workbooks(
    settings: &Settings,
    profile: PositionProfile,
    variants: &[PositionVariant],
    by_team: bool,
) -> Result<Vec<ExportSummary>> {
    let prefix = profile.file_prefix().replace(' ', "_");
    let dir = settings.output_dir.join(&prefix);
    let season = settings.season;

    let conferences: BTreeSet<Conference> = variants
        .iter()
        .flat_map(|v| v.players.iter().map(|p| p.record.conference))
        .collect();

    let mut out = Vec::new();
    for conference in conferences {
        let filtered: Vec<PositionVariant> = variants
            .iter()
            .map(|v| PositionVariant {
                players: v
                    .players
                    .iter()
                    .filter(|p| p.record.conference == conference)
                    .cloned()
                    .collect(),
                ..v.clone()
            })
            .collect();
        let path = dir.join(format!("{prefix}_{}_{season}.xlsx", conference.code()));
        out.push(write_position_variants(&path, &filtered, season, by_team)?);
    }

    let path = dir.join(format!("{prefix}_All_Conferences_{season}.xlsx"));
    out.push(write_position_variants(&path, variants, season, by_team)?);
    Ok(out)
}
