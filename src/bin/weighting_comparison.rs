use std::path::PathBuf;

use anyhow::{Result, bail};

use ncaa_scout::comparison::WeightingComparison;
use ncaa_scout::config::{AccuracySplit, load_scoring_config};
use ncaa_scout::export::write_weighting_comparison;
use ncaa_scout::model::Conference;
use ncaa_scout::report::{
    ReportSettings, build_conference_report, conferences_for_report, load_run_inputs,
};
use ncaa_scout::settings::{Settings, flag_value, has_flag, init_logging, positionals};

const USAGE: &str = "usage: weighting_comparison <ACC|SEC|BIG10|BIG12|IVY|NWSL> [--no-padj] [--config <path>]";

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = positionals(&args, &["config"]);
    let Some(raw) = positional.first() else {
        bail!("{USAGE}");
    };
    let Some(conference) = Conference::parse(raw) else {
        bail!("unknown conference {raw:?}\n{USAGE}");
    };
    let padj = !has_flag(&args, "no-padj");

    let settings = Settings::from_env();
    let layout = settings.layout()?;
    let config_path = flag_value(&args, "config").map(PathBuf::from);
    let config = load_scoring_config(config_path.as_deref(), &settings.data_dir)?;
    let curation = settings.curation()?;

    let inputs = load_run_inputs(
        &layout,
        &conferences_for_report(conference),
        settings.first_season,
        curation.as_ref(),
        padj,
    );

    let mut reports = Vec::new();
    for split in AccuracySplit::STANDARD {
        let run = ReportSettings {
            split,
            padj,
            ..ReportSettings::new(settings.season, settings.first_season)
        };
        reports.push(build_conference_report(
            &config,
            &inputs.records,
            inputs.teams.get(&conference),
            conference,
            run,
        )?);
    }

    let comparison = WeightingComparison::build(&reports);
    let path = settings.output_dir.join(format!(
        "Weighting_Comparison_{}_{}.xlsx",
        conference.code(),
        settings.season
    ));
    let summary = write_weighting_comparison(&path, &comparison)?;

    println!("Weighting comparison complete");
    println!("Conference: {conference} {}", settings.season);
    println!("Weightings: {}", comparison.labels.join(" | "));
    println!("Players compared: {}", comparison.rows.len());
    for row in comparison.summary() {
        let deltas: Vec<String> = row
            .average_deltas
            .iter()
            .skip(1)
            .map(|d| d.map_or_else(|| "-".to_string(), |d| format!("{d:+.2}")))
            .collect();
        println!(" - {} ({} players): {}", row.group, row.players, deltas.join(", "));
    }
    println!("Workbook: {}", summary.path.display());
    let mut errors = inputs.errors.clone();
    if let Some(first) = reports.first() {
        errors.extend(first.errors.iter().cloned());
    }
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
