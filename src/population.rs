use std::collections::BTreeSet;

use crate::model::{Conference, PlayerRecord, PositionProfile};

#[derive(Debug, Clone, Default)]
pub struct Population<'a> {
    members: Vec<&'a PlayerRecord>,
}

impl<'a> Population<'a> {
    pub fn new(records: &'a [PlayerRecord]) -> Self {
        Self {
            members: records.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PlayerRecord> + '_ {
        self.members.iter().copied()
    }

    pub fn filter(&self, mut keep: impl FnMut(&PlayerRecord) -> bool) -> Population<'a> {
        Population {
            members: self.members.iter().copied().filter(|r| keep(r)).collect(),
        }
    }

    pub fn union(&self, other: &Population<'a>) -> Population<'a> {
        let mut members = self.members.clone();
        members.extend(other.members.iter().copied());
        Population { members }
    }

    pub fn season(&self, season: i32) -> Population<'a> {
        self.filter(|r| r.season == season)
    }

    pub fn before_season(&self, season: i32) -> Population<'a> {
        self.filter(|r| r.season < season)
    }

    pub fn seasons(&self, first: i32, last: i32) -> Population<'a> {
        self.filter(|r| r.season >= first && r.season <= last)
    }

    pub fn conference(&self, conference: Conference) -> Population<'a> {
        self.filter(|r| r.conference == conference)
    }

    pub fn power_five(&self) -> Population<'a> {
        self.filter(|r| r.conference.is_power_five())
    }

    pub fn profile(&self, profile: PositionProfile) -> Population<'a> {
        self.filter(|r| r.profile == profile)
    }

    pub fn column_values(&self, column: &str) -> Vec<Option<f64>> {
        self.members.iter().map(|r| r.value(column)).collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.members.iter().any(|r| r.has_column(column))
    }

    pub fn columns(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|r| r.metrics.keys().cloned())
            .collect()
    }

    pub fn distinct_seasons(&self) -> BTreeSet<i32> {
        self.members.iter().map(|r| r.season).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, conf: Conference, season: i32) -> PlayerRecord {
        PlayerRecord::new(name, "Team", PositionProfile::HybridCb, conf, season)
    }

    #[test]
    fn selectors_compose() {
        let records = vec![
            rec("a", Conference::Acc, 2024),
            rec("b", Conference::Acc, 2025),
            rec("c", Conference::Nwsl, 2025),
            rec("d", Conference::Sec, 2023),
        ];
        let all = Population::new(&records);
        assert_eq!(all.season(2025).len(), 2);
        assert_eq!(all.before_season(2025).len(), 2);
        assert_eq!(all.power_five().season(2025).len(), 1);
        assert_eq!(all.seasons(2023, 2024).conference(Conference::Sec).len(), 1);
        assert_eq!(all.distinct_seasons().len(), 3);
    }
}
