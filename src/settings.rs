use std::path::PathBuf;

use anyhow::Result;

use crate::curation::CurationList;
use crate::dataset::ExportLayout;
use crate::error::ScoutError;

pub const DEFAULT_SEASON: i32 = 2025;
pub const DEFAULT_FIRST_SEASON: i32 = 2021;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub season: i32,
    pub first_season: i32,
    pub curation_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_i32(key: &str) -> Option<i32> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
}

impl Settings {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let data_dir = env_path("SCOUT_DATA_DIR").unwrap_or_else(|| PathBuf::from("."));
        let output_dir = env_path("SCOUT_OUTPUT_DIR").unwrap_or_else(|| data_dir.join("Reports"));
        let season = env_i32("SCOUT_SEASON").unwrap_or(DEFAULT_SEASON);
        let first_season = env_i32("SCOUT_FIRST_SEASON")
            .unwrap_or(DEFAULT_FIRST_SEASON)
            .min(season);
        Self {
            data_dir,
            output_dir,
            season,
            first_season,
            curation_path: env_path("SCOUT_CURATION_PATH"),
            config_path: env_path("SCOUT_CONFIG_PATH"),
        }
    }

    pub fn layout(&self) -> Result<ExportLayout> {
        if !self.data_dir.is_dir() {
            return Err(ScoutError::MissingDataRoot(self.data_dir.clone()).into());
        }
        Ok(ExportLayout::new(self.data_dir.clone(), self.season))
    }

    pub fn curation(&self) -> Result<Option<CurationList>> {
        self.curation_path
            .as_deref()
            .map(CurationList::load)
            .transpose()
    }
}

pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == &format!("--{name}")
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    let flag = format!("--{name}");
    args.iter().any(|a| a == &flag)
}

pub fn positionals(args: &[String], valued: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(name) = arg.strip_prefix("--") {
            skip_next = valued.contains(&name);
            continue;
        }
        out.push(arg.clone());
    }
    out
}

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init();
}
