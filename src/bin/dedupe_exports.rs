use std::path::PathBuf;

use anyhow::{Result, bail};

use ncaa_scout::curation::{CurationList, backup_file};
use ncaa_scout::dataset::ExportTable;
use ncaa_scout::settings::{has_flag, init_logging, positionals};

const USAGE: &str = "usage: dedupe_exports <curation.json> <export.csv|export.xlsx>... [--dry-run]";

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = positionals(&args, &[]);
    let dry_run = has_flag(&args, "dry-run");
    let Some((list_path, exports)) = positional.split_first() else {
        bail!("{USAGE}");
    };
    if exports.is_empty() {
        bail!("{USAGE}");
    }

    let list = CurationList::load(&PathBuf::from(list_path))?;

    let mut rewritten = 0;
    let mut removed = 0;
    let mut renamed = 0;
    let mut errors = Vec::new();
    for raw in exports {
        let path = PathBuf::from(raw);
        let mut table = match ExportTable::read(&path) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("{err}");
                errors.push(err.to_string());
                continue;
            }
        };
        let report = list.apply(&mut table);
        for note in &report.notes {
            log::info!("{}: {note}", path.display());
        }
        if report.changed_rows() == 0 {
            continue;
        }
        removed += report.removed;
        renamed += report.renamed;
        if dry_run {
            continue;
        }
        let result = backup_file(&path).and_then(|backup| {
            log::info!("backup {}", backup.display());
            table.write(&path)
        });
        match result {
            Ok(()) => rewritten += 1,
            Err(err) => errors.push(format!("{}: {err:#}", path.display())),
        }
    }

    println!("Export curation complete{}", if dry_run { " (dry run)" } else { "" });
    println!("Rules: {}", list.rules.len());
    println!("Files checked: {}", exports.len());
    println!("Files rewritten: {rewritten}");
    println!("Rows removed: {removed}");
    println!("Rows renamed: {renamed}");
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
