use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use ncaa_scout::config::{AccuracySplit, load_scoring_config};
use ncaa_scout::export::write_conference_report;
use ncaa_scout::model::Conference;
use ncaa_scout::report::{
    ReportSettings, build_conference_report, conferences_for_report, load_run_inputs,
};
use ncaa_scout::settings::{Settings, flag_value, has_flag, init_logging, positionals};

const USAGE: &str =
    "usage: conference_report <ACC|SEC|BIG10|BIG12|IVY|NWSL> [split] [--no-padj] [--config <path>]";

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = positionals(&args, &["config", "split"]);

    let Some(raw_conference) = positional.first() else {
        bail!("{USAGE}");
    };
    let Some(conference) = Conference::parse(raw_conference) else {
        bail!("unknown conference {raw_conference:?}\n{USAGE}");
    };
    let split = match flag_value(&args, "split").or_else(|| positional.get(1).cloned()) {
        Some(raw) => {
            AccuracySplit::parse(&raw).with_context(|| format!("invalid accuracy split {raw:?}"))?
        }
        None => AccuracySplit::INTENT_80_20,
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
    let run = ReportSettings {
        split,
        padj,
        ..ReportSettings::new(settings.season, settings.first_season)
    };
    let report = build_conference_report(
        &config,
        &inputs.records,
        inputs.teams.get(&conference),
        conference,
        run,
    )?;

    let file_name = format!(
        "Scouting_Report_{}_{}_{}{}.xlsx",
        conference.code(),
        settings.season,
        split.short_label().replace('/', "_"),
        if padj { "_PAdj" } else { "" }
    );
    let summary = write_conference_report(&settings.output_dir.join(file_name), &report)?;

    println!("Conference report complete");
    println!("Conference: {conference} {}", settings.season);
    println!("Weighting: {}", split.label());
    println!("Possession adjusted: {}", if padj { "yes" } else { "no" });
    println!("Files read: {}", inputs.files);
    println!("Players graded: {}", report.players().count());
    println!("Teams: {}", report.teams().len());
    println!(
        "Workbook: {} ({} sheets)",
        summary.path.display(),
        summary.sheets
    );
    if !report.unresolved_columns.is_empty() {
        println!("Missing columns: {}", report.unresolved_columns.join(", "));
    }
    let errors: Vec<&String> = inputs.errors.iter().chain(&report.errors).collect();
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
