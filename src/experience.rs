use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::columns::normalize_player_name;
use crate::model::{Conference, PlayerRecord, PositionProfile};
use crate::population::Population;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperienceClass {
    Rookie,
    Sophomore,
    Junior,
    Senior,
}

impl ExperienceClass {
    pub fn from_seasons(seasons: u32) -> Self {
        match seasons {
            0 | 1 => ExperienceClass::Rookie,
            2 => ExperienceClass::Sophomore,
            3 => ExperienceClass::Junior,
            _ => ExperienceClass::Senior,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceClass::Rookie => "Rookies",
            ExperienceClass::Sophomore => "Sophomores",
            ExperienceClass::Junior => "Juniors",
            ExperienceClass::Senior => "Seniors",
        }
    }
}

impl fmt::Display for ExperienceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type ExperienceKey = (String, Conference, PositionProfile);

#[derive(Debug, Clone, Default)]
pub struct ExperienceIndex {
    seasons: BTreeMap<ExperienceKey, BTreeSet<i32>>,
}

fn key(record: &PlayerRecord) -> ExperienceKey {
    (
        normalize_player_name(&record.player),
        record.conference,
        record.profile,
    )
}

impl ExperienceIndex {
    pub fn build(history: &Population<'_>) -> Self {
        let mut seasons: BTreeMap<ExperienceKey, BTreeSet<i32>> = BTreeMap::new();
        for record in history.iter() {
            seasons.entry(key(record)).or_default().insert(record.season);
        }
        Self { seasons }
    }

    pub fn ncaa_seasons(&self, record: &PlayerRecord) -> u32 {
        let earlier = self
            .seasons
            .get(&key(record))
            .map(|s| s.range(..record.season).count())
            .unwrap_or(0);
        earlier as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, season: i32) -> PlayerRecord {
        PlayerRecord::new(name, "T", PositionProfile::DmBoxToBox, Conference::Sec, season)
    }

    #[test]
    fn counts_only_earlier_seasons() {
        let history = vec![rec("Ana", 2022), rec("Ana", 2023), rec("Ana", 2023), rec("Ana", 2025)];
        let index = ExperienceIndex::build(&Population::new(&history));
        assert_eq!(index.ncaa_seasons(&rec("Ana", 2024)), 3);
        assert_eq!(index.ncaa_seasons(&rec("ana", 2022)), 1);
        assert_eq!(index.ncaa_seasons(&rec("Bea", 2025)), 1);
    }

    #[test]
    fn classes() {
        assert_eq!(ExperienceClass::from_seasons(1), ExperienceClass::Rookie);
        assert_eq!(ExperienceClass::from_seasons(6), ExperienceClass::Senior);
        assert_eq!(ExperienceClass::Junior.to_string(), "Juniors");
    }
}
