use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use ncaa_scout::comparison::padj_comparison;
use ncaa_scout::config::{AccuracySplit, load_scoring_config};
use ncaa_scout::export::write_padj_comparison;
use ncaa_scout::model::Conference;
use ncaa_scout::report::{
    ReportSettings, build_conference_report, conferences_for_report, load_run_inputs,
};
use ncaa_scout::settings::{Settings, flag_value, init_logging, positionals};

const USAGE: &str = "usage: padj_comparison <ACC|SEC|BIG10|BIG12|IVY|NWSL> [split] [--config <path>]";

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = positionals(&args, &["config", "split"]);
    let Some(raw) = positional.first() else {
        bail!("{USAGE}");
    };
    let Some(conference) = Conference::parse(raw) else {
        bail!("unknown conference {raw:?}\n{USAGE}");
    };
    let split = match flag_value(&args, "split").or_else(|| positional.get(1).cloned()) {
        Some(raw) => {
            AccuracySplit::parse(&raw).with_context(|| format!("invalid accuracy split {raw:?}"))?
        }
        None => AccuracySplit::INTENT_80_20,
    };

    let settings = Settings::from_env();
    let layout = settings.layout()?;
    let config_path = flag_value(&args, "config").map(PathBuf::from);
    let config = load_scoring_config(config_path.as_deref(), &settings.data_dir)?;
    let curation = settings.curation()?;

    // PAdj columns sit beside the raw ones, so one load serves both runs.
    let inputs = load_run_inputs(
        &layout,
        &conferences_for_report(conference),
        settings.first_season,
        curation.as_ref(),
        true,
    );
    let teams = inputs.teams.get(&conference);
    let base = ReportSettings {
        split,
        ..ReportSettings::new(settings.season, settings.first_season)
    };
    let raw_report = build_conference_report(
        &config,
        &inputs.records,
        teams,
        conference,
        ReportSettings { padj: false, ..base },
    )?;
    let adjusted = build_conference_report(
        &config,
        &inputs.records,
        teams,
        conference,
        ReportSettings { padj: true, ..base },
    )?;

    let rows = padj_comparison(&raw_report, &adjusted);
    let path = settings.output_dir.join(format!(
        "PAdj_Comparison_{}_{}_{}.xlsx",
        conference.code(),
        settings.season,
        split.short_label().replace('/', "_")
    ));
    let summary = write_padj_comparison(&path, &rows)?;

    let raised = rows.iter().filter(|r| r.difference() > 0.0).count();
    let lowered = rows.iter().filter(|r| r.difference() < 0.0).count();
    println!("PAdj comparison complete");
    println!("Conference: {conference} {}", settings.season);
    println!("Weighting: {}", split.label());
    println!("Players compared: {}", rows.len());
    println!("Raised: {raised}, lowered: {lowered}");
    if let Some(top) = rows
        .iter()
        .max_by(|a, b| a.difference().abs().total_cmp(&b.difference().abs()))
    {
        println!(
            "Largest change: {} ({}) {:.2} -> {:.2}",
            top.player, top.team, top.pre, top.post
        );
    }
    println!("Workbook: {}", summary.path.display());
    let errors: Vec<&String> = inputs.errors.iter().chain(&adjusted.errors).collect();
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
