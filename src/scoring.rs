use crate::config::{MetricGroup, ProfileConfig};
use crate::model::PositionScore;
use crate::normalize::Scale;
use crate::population::Population;

/// Weighted composite of a group's normalized components for every scoring
/// record.
///
/// A component counts for a record only when both the record's export and
/// the reference population carry the column; the weight of the components
/// that count is renormalized per record. No counting component scores 0.
pub fn composite_scores(
    group: &MetricGroup,
    scoring: &Population<'_>,
    reference: &Population<'_>,
) -> Vec<f64> {
    let scales: Vec<Option<Scale>> = group
        .components
        .iter()
        .map(|c| {
            reference
                .has_column(&c.column)
                .then(|| Scale::from_reference(reference.column_values(&c.column)))
        })
        .collect();

    scoring
        .iter()
        .map(|record| {
            let mut sum = 0.0;
            let mut weight = 0.0;
            for (component, scale) in group.components.iter().zip(&scales) {
                let Some(scale) = scale else { continue };
                if !record.has_column(&component.column) {
                    continue;
                }
                sum += scale.normalize(record.value(&component.column)) * component.weight;
                weight += component.weight;
            }
            if weight > 0.0 { sum / weight } else { 0.0 }
        })
        .collect()
}

pub fn score_population(
    profile: &ProfileConfig,
    scoring: &Population<'_>,
    reference: &Population<'_>,
) -> Vec<PositionScore> {
    let mut out = vec![PositionScore::default(); scoring.len()];

    for (category_groups, is_core) in [(&profile.core, true), (&profile.specific, false)] {
        for group in category_groups {
            if !has_any_component(reference, group) {
                log::debug!(
                    "{}: no reference data for {:?}, scoring 0",
                    profile.position,
                    group.name
                );
            }
            let scores = composite_scores(group, scoring, reference);
            for (slot, score) in out.iter_mut().zip(scores) {
                slot.metric_scores.insert(group.name.clone(), score);
                if is_core {
                    slot.core += score * group.weight;
                } else {
                    slot.specific += score * group.weight;
                }
            }
        }
    }

    for slot in &mut out {
        slot.total = slot.core * profile.core_weight + slot.specific * profile.specific_weight;
    }
    out
}

fn has_any_component(population: &Population<'_>, group: &MetricGroup) -> bool {
    group.components.iter().any(|c| population.has_column(&c.column))
}
