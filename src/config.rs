use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::columns::{is_percentage_column, resolve_column};
use crate::error::ScoutError;
use crate::model::PositionProfile;
use crate::padj::padj_column_name;

const BUNDLED_CONFIG: &str = include_str!("../assets/position_metrics_config.json");
pub const CONFIG_FILE_NAME: &str = "position_metrics_config.json";
const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize)]
struct RawConfig {
    position_profiles: BTreeMap<String, RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    metrics: RawMetrics,
    weightings: RawWeightings,
}

#[derive(Debug, Deserialize)]
struct RawMetrics {
    #[serde(rename = "Core", default)]
    core: BTreeMap<String, RawMetric>,
    #[serde(rename = "Specific", default)]
    specific: BTreeMap<String, RawMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMetric {
    Simple(f64),
    Composite {
        weight: f64,
        #[serde(default)]
        components: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Deserialize)]
struct RawWeightings {
    #[serde(rename = "Core")]
    core: f64,
    #[serde(rename = "Specific")]
    specific: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Core,
    Specific,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub column: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroup {
    pub name: String,
    pub weight: f64,
    pub components: Vec<Component>,
}

impl MetricGroup {
    pub fn simple(column: &str, weight: f64) -> Self {
        Self {
            name: column.to_string(),
            weight,
            components: vec![Component {
                column: column.to_string(),
                weight: 1.0,
            }],
        }
    }

    pub fn composite(name: &str, weight: f64, components: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            components: components
                .iter()
                .map(|(column, w)| Component {
                    column: column.to_string(),
                    weight: *w,
                })
                .collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        self.components.len() > 1
    }

    fn normalize_component_weights(&mut self) {
        let sum: f64 = self.components.iter().map(|c| c.weight).sum();
        if sum > 0.0 {
            for c in &mut self.components {
                c.weight /= sum;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    pub position: String,
    pub core: Vec<MetricGroup>,
    pub specific: Vec<MetricGroup>,
    pub core_weight: f64,
    pub specific_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracySplit {
    pub intent: f64,
    pub accuracy: f64,
}

impl AccuracySplit {
    pub const INTENT_80_20: AccuracySplit = AccuracySplit {
        intent: 0.8,
        accuracy: 0.2,
    };
    pub const INTENT_70_30: AccuracySplit = AccuracySplit {
        intent: 0.7,
        accuracy: 0.3,
    };
    pub const INTENT_60_40: AccuracySplit = AccuracySplit {
        intent: 0.6,
        accuracy: 0.4,
    };
    pub const STANDARD: [AccuracySplit; 3] = [
        Self::INTENT_80_20,
        Self::INTENT_70_30,
        Self::INTENT_60_40,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split(['/', '_', '-', ':']);
        let intent: f64 = parts.next()?.trim().parse().ok()?;
        let accuracy: f64 = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() || intent < 0.0 || accuracy < 0.0 {
            return None;
        }
        let sum = intent + accuracy;
        if sum <= 0.0 || !sum.is_finite() {
            return None;
        }
        Some(Self {
            intent: intent / sum,
            accuracy: accuracy / sum,
        })
    }

    pub fn intent_pct(&self) -> u32 {
        (self.intent * 100.0).round() as u32
    }

    pub fn accuracy_pct(&self) -> u32 {
        (self.accuracy * 100.0).round() as u32
    }

    pub fn short_label(&self) -> String {
        format!("{}/{}", self.intent_pct(), self.accuracy_pct())
    }

    pub fn label(&self) -> String {
        format!(
            "{}% Attempts / {}% Accuracy",
            self.intent_pct(),
            self.accuracy_pct()
        )
    }
}

fn is_accuracy_component(column: &str) -> bool {
    column.to_ascii_lowercase().contains("accurate")
}

impl ProfileConfig {
    pub fn groups(&self) -> impl Iterator<Item = (Category, &MetricGroup)> {
        self.core
            .iter()
            .map(|g| (Category::Core, g))
            .chain(self.specific.iter().map(|g| (Category::Specific, g)))
    }

    fn groups_mut(&mut self) -> impl Iterator<Item = &mut MetricGroup> {
        self.core.iter_mut().chain(self.specific.iter_mut())
    }

    pub fn component_columns(&self) -> BTreeSet<String> {
        self.groups()
            .flat_map(|(_, g)| g.components.iter().map(|c| c.column.clone()))
            .collect()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups().map(|(_, g)| g.name.clone()).collect()
    }

    pub fn with_accuracy_split(&self, split: AccuracySplit) -> ProfileConfig {
        let mut out = self.clone();
        for group in out.groups_mut() {
            let accurate = group
                .components
                .iter()
                .filter(|c| is_accuracy_component(&c.column))
                .count();
            if accurate == 0 || accurate == group.components.len() {
                continue;
            }
            for c in &mut group.components {
                c.weight = if is_accuracy_component(&c.column) {
                    split.accuracy
                } else {
                    split.intent
                };
            }
            group.normalize_component_weights();
        }
        out
    }

    pub fn with_padj(&self, available: &BTreeSet<String>) -> ProfileConfig {
        let mut out = self.clone();
        for group in out.groups_mut() {
            for c in &mut group.components {
                if is_percentage_column(&c.column) {
                    continue;
                }
                let padj = padj_column_name(&c.column);
                if available.contains(&padj) {
                    c.column = padj;
                }
            }
        }
        out
    }

    pub fn resolved_against<S: AsRef<str>>(&self, headers: &[S]) -> (ProfileConfig, Vec<String>) {
        let mut out = self.clone();
        let mut unresolved = Vec::new();
        for group in out.groups_mut() {
            for c in &mut group.components {
                match resolve_column(&c.column, headers) {
                    Some(actual) => c.column = actual,
                    None => {
                        if !unresolved.contains(&c.column) {
                            unresolved.push(c.column.clone());
                        }
                    }
                }
            }
        }
        (out, unresolved)
    }

    fn from_raw(position: &str, raw: RawProfile, issues: &mut Vec<String>) -> Self {
        let mut core = groups_from_raw(position, "Core", raw.metrics.core, issues);
        let mut specific = groups_from_raw(position, "Specific", raw.metrics.specific, issues);
        for g in core.iter_mut().chain(specific.iter_mut()) {
            g.normalize_component_weights();
        }

        let RawWeightings {
            core: core_weight,
            specific: specific_weight,
        } = raw.weightings;
        for (label, w) in [("Core", core_weight), ("Specific", specific_weight)] {
            if !w.is_finite() || w < 0.0 {
                issues.push(format!("{position}: weighting {label} must be non-negative, got {w}"));
            }
        }
        if ((core_weight + specific_weight) - 1.0).abs() > WEIGHT_TOLERANCE {
            issues.push(format!(
                "{position}: Core + Specific weightings must sum to 1, got {}",
                core_weight + specific_weight
            ));
        }
        if core.is_empty() && specific.is_empty() {
            issues.push(format!("{position}: no metrics configured"));
        }

        ProfileConfig {
            position: position.to_string(),
            core,
            specific,
            core_weight,
            specific_weight,
        }
    }
}

fn groups_from_raw(
    position: &str,
    category: &str,
    raw: BTreeMap<String, RawMetric>,
    issues: &mut Vec<String>,
) -> Vec<MetricGroup> {
    let mut out = Vec::with_capacity(raw.len());
    for (name, metric) in raw {
        let group = match metric {
            RawMetric::Simple(weight) => MetricGroup::simple(&name, weight),
            RawMetric::Composite { weight, components } => MetricGroup {
                name: name.clone(),
                weight,
                components: components
                    .into_iter()
                    .map(|(column, weight)| Component { column, weight })
                    .collect(),
            },
        };
        if !group.weight.is_finite() || group.weight < 0.0 {
            issues.push(format!(
                "{position}/{category}/{name}: weight must be non-negative, got {}",
                group.weight
            ));
        }
        if group.components.is_empty() {
            issues.push(format!("{position}/{category}/{name}: composite has no components"));
        }
        for c in &group.components {
            if !c.weight.is_finite() || c.weight < 0.0 {
                issues.push(format!(
                    "{position}/{category}/{name}: component {:?} weight must be non-negative, got {}",
                    c.column, c.weight
                ));
            }
        }
        if !group.components.is_empty() && group.components.iter().map(|c| c.weight).sum::<f64>() <= 0.0 {
            issues.push(format!("{position}/{category}/{name}: component weights sum to 0"));
        }
        out.push(group);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl ScoringConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: RawConfig =
            serde_json::from_str(raw).context("parse scoring config json")?;
        let mut issues = Vec::new();
        let profiles = parsed
            .position_profiles
            .into_iter()
            .map(|(position, profile)| {
                let cfg = ProfileConfig::from_raw(&position, profile, &mut issues);
                (position, cfg)
            })
            .collect::<BTreeMap<_, _>>();
        if profiles.is_empty() {
            issues.push("no position_profiles configured".to_string());
        }
        if !issues.is_empty() {
            return Err(ScoutError::InvalidConfig(issues.join("; ")).into());
        }
        Ok(Self { profiles })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read scoring config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("load {}", path.display()))
    }

    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CONFIG).context("bundled scoring config")
    }

    pub fn profile(&self, profile: PositionProfile) -> Result<&ProfileConfig> {
        self.profiles
            .get(profile.config_key())
            .ok_or_else(|| ScoutError::UnknownProfile(profile.config_key().to_string()).into())
    }
}

pub fn load_scoring_config(explicit: Option<&Path>, data_root: &Path) -> Result<ScoringConfig> {
    if let Some(path) = explicit {
        return ScoringConfig::load(path);
    }
    if let Some(path) = std::env::var("SCOUT_CONFIG_PATH")
        .ok()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
    {
        return ScoringConfig::load(&PathBuf::from(path));
    }
    let local = data_root.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return ScoringConfig::load(&local);
    }
    log::debug!("no {CONFIG_FILE_NAME} under {}, using bundled config", data_root.display());
    ScoringConfig::bundled()
}
