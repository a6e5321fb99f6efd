use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Conference {
    Acc,
    Sec,
    Big10,
    Big12,
    Ivy,
    Nwsl,
}

impl Conference {
    pub const ALL: [Conference; 6] = [
        Conference::Acc,
        Conference::Sec,
        Conference::Big10,
        Conference::Big12,
        Conference::Ivy,
        Conference::Nwsl,
    ];

    pub const POWER_FIVE: [Conference; 5] = [
        Conference::Acc,
        Conference::Sec,
        Conference::Big10,
        Conference::Big12,
        Conference::Ivy,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Conference::Acc => "ACC",
            Conference::Sec => "SEC",
            Conference::Big10 => "BIG10",
            Conference::Big12 => "BIG12",
            Conference::Ivy => "IVY",
            Conference::Nwsl => "NWSL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "ACC" => Some(Conference::Acc),
            "SEC" => Some(Conference::Sec),
            "BIG10" | "BIGTEN" => Some(Conference::Big10),
            "BIG12" | "BIGTWELVE" => Some(Conference::Big12),
            "IVY" | "IVYLEAGUE" => Some(Conference::Ivy),
            "NWSL" => Some(Conference::Nwsl),
            _ => None,
        }
    }

    pub fn is_power_five(self) -> bool {
        Self::POWER_FIVE.contains(&self)
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionProfile {
    HybridCb,
    DmBoxToBox,
    AmAdvancedPlaymaker,
    TouchlineWinger,
}

impl PositionProfile {
    pub const ALL: [PositionProfile; 4] = [
        PositionProfile::HybridCb,
        PositionProfile::DmBoxToBox,
        PositionProfile::AmAdvancedPlaymaker,
        PositionProfile::TouchlineWinger,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            PositionProfile::HybridCb => "Center Back",
            PositionProfile::DmBoxToBox => "Centre Midfielder",
            PositionProfile::AmAdvancedPlaymaker => "Attacking Midfielder",
            PositionProfile::TouchlineWinger => "Winger",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PositionProfile::HybridCb => "Hybrid CB",
            PositionProfile::DmBoxToBox => "DM Box-To-Box",
            PositionProfile::AmAdvancedPlaymaker => "AM Advanced Playmaker",
            PositionProfile::TouchlineWinger => "Right Touchline Winger",
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            PositionProfile::HybridCb => "CB Hybrid",
            PositionProfile::DmBoxToBox => "DM Box-To-Box",
            PositionProfile::AmAdvancedPlaymaker => "AM Advanced Playmaker",
            PositionProfile::TouchlineWinger => "W Touchline Winger",
        }
    }

    pub fn position_codes(self) -> &'static [&'static str] {
        match self {
            PositionProfile::HybridCb => &["CB", "LCB", "RCB"],
            PositionProfile::DmBoxToBox => &["DMF", "CMF", "LCMF", "RCMF"],
            PositionProfile::AmAdvancedPlaymaker => &["AMF", "LAMF", "RAMF"],
            PositionProfile::TouchlineWinger => &["LWB", "RWB", "LWF", "RWF", "LW", "RW"],
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| {
            key == p.config_key().to_ascii_lowercase()
                || key == p.display_name().to_ascii_lowercase()
                || key == p.file_prefix().to_ascii_lowercase()
                || p.aliases().contains(&key.as_str())
        })
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            PositionProfile::HybridCb => &["cb", "centre back", "center-back"],
            PositionProfile::DmBoxToBox => &["dm", "cm", "center midfielder", "box-to-box"],
            PositionProfile::AmAdvancedPlaymaker => &["am", "advanced playmaker"],
            PositionProfile::TouchlineWinger => &["w", "wing", "touchline winger"],
        }
    }

    pub fn matches_position(self, position: &str) -> bool {
        position
            .split([',', '/'])
            .map(|code| code.trim().to_ascii_uppercase())
            .any(|code| self.position_codes().contains(&code.as_str()))
    }
}

impl fmt::Display for PositionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn letter(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.letter().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// One row of a position export: a player's season in one conference.
///
/// `metrics` distinguishes a missing cell (key present, `None`) from a column
/// the export never had (key absent).
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player: String,
    pub team: String,
    pub position: String,
    pub profile: PositionProfile,
    pub conference: Conference,
    pub season: i32,
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl PlayerRecord {
    pub fn new(
        player: impl Into<String>,
        team: impl Into<String>,
        profile: PositionProfile,
        conference: Conference,
        season: i32,
    ) -> Self {
        Self {
            player: player.into(),
            team: team.into(),
            position: String::new(),
            profile,
            conference,
            season,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, column: &str, value: Option<f64>) -> Self {
        self.metrics.insert(column.to_string(), value);
        self
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = position.to_string();
        self
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.metrics
            .get(column)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.metrics.contains_key(column)
    }

    pub fn minutes(&self) -> Option<f64> {
        self.value("Minutes played")
    }

    pub fn identity(&self) -> (String, String) {
        (
            crate::columns::normalize_player_name(&self.player),
            crate::columns::team_key(&self.team),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionScore {
    pub metric_scores: BTreeMap<String, f64>,
    pub core: f64,
    pub specific: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPlayer {
    pub record: PlayerRecord,
    pub score: PositionScore,
    pub total_percentile: Option<f64>,
    pub total_score_1_10: f64,
    pub total_grade: Grade,
    pub team_grade: Option<Grade>,
    pub conference_grade: Option<Grade>,
    pub power_five_grade: Option<Grade>,
    pub experience_grade: Option<Grade>,
    pub ncaa_seasons: Option<u32>,
    pub pct_of_team_minutes: Option<f64>,
    pub top_15s: Option<u32>,
    pub previous_season: Option<i32>,
    pub previous_score_1_10: Option<f64>,
}

impl ScoredPlayer {
    pub fn new(record: PlayerRecord, score: PositionScore) -> Self {
        Self {
            record,
            score,
            total_percentile: None,
            total_score_1_10: 1.0,
            total_grade: Grade::F,
            team_grade: None,
            conference_grade: None,
            power_five_grade: None,
            experience_grade: None,
            ncaa_seasons: None,
            pct_of_team_minutes: None,
            top_15s: None,
            previous_season: None,
            previous_score_1_10: None,
        }
    }

    pub fn change_from_previous(&self) -> Option<f64> {
        self.previous_score_1_10
            .map(|prev| self.total_score_1_10 - prev)
    }
}

pub fn sort_by_grade_then_percentile(players: &mut [ScoredPlayer]) {
    players.sort_by(|a, b| {
        a.total_grade.cmp(&b.total_grade).then_with(|| {
            let pa = a.total_percentile.unwrap_or(f64::NEG_INFINITY);
            let pb = b.total_percentile.unwrap_or(f64::NEG_INFINITY);
            pb.total_cmp(&pa)
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parse_accepts_every_naming() {
        assert_eq!(PositionProfile::parse("Center Back"), Some(PositionProfile::HybridCb));
        assert_eq!(PositionProfile::parse("hybrid cb"), Some(PositionProfile::HybridCb));
        assert_eq!(
            PositionProfile::parse("W Touchline Winger"),
            Some(PositionProfile::TouchlineWinger)
        );
        assert_eq!(PositionProfile::parse("dm"), Some(PositionProfile::DmBoxToBox));
        assert_eq!(PositionProfile::parse("goalkeeper"), None);
    }

    #[test]
    fn position_codes_match_split_labels() {
        assert!(PositionProfile::HybridCb.matches_position("RCB, LCB"));
        assert!(PositionProfile::TouchlineWinger.matches_position("RWF, AMF"));
        assert!(PositionProfile::AmAdvancedPlaymaker.matches_position("RWF, AMF"));
        assert!(!PositionProfile::HybridCb.matches_position("LB, RB"));
    }

    #[test]
    fn conference_parse_is_lenient() {
        assert_eq!(Conference::parse("Big 10"), Some(Conference::Big10));
        assert_eq!(Conference::parse("acc"), Some(Conference::Acc));
        assert_eq!(Conference::parse("Pac-12"), None);
        assert!(Conference::Ivy.is_power_five());
        assert!(!Conference::Nwsl.is_power_five());
    }

    #[test]
    fn missing_and_absent_columns_differ() {
        let r = PlayerRecord::new("A", "T", PositionProfile::HybridCb, Conference::Acc, 2025)
            .with_metric("Passes per 90", None);
        assert!(r.has_column("Passes per 90"));
        assert_eq!(r.value("Passes per 90"), None);
        assert!(!r.has_column("Shots per 90"));
    }
}
