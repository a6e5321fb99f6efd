use crate::model::Grade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalRating {
    pub percentile: Option<f64>,
    pub score_1_10: f64,
    pub grade: Grade,
}

impl TotalRating {
    pub fn from_percentile(percentile: Option<f64>) -> Self {
        let score_1_10 = percentile_to_1_10(percentile);
        Self {
            percentile,
            score_1_10,
            grade: grade_from_1_10(Some(score_1_10)),
        }
    }
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Percentile rank (0–100] of each value within the slice. Ties share the
/// average of their ranks. Missing values stay missing and are not counted.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut valid: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();
    let n = valid.len();
    let mut out = vec![None; values.len()];
    if n == 0 {
        return out;
    }
    valid.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && valid[end + 1].1 == valid[start].1 {
            end += 1;
        }
        // 1-based ranks start+1..=end+1
        let avg_rank = (start + end + 2) as f64 / 2.0;
        let pct = avg_rank / n as f64 * 100.0;
        for (idx, _) in &valid[start..=end] {
            out[*idx] = Some(pct);
        }
        start = end + 1;
    }
    out
}

pub fn percentile_in(score: Option<f64>, distribution: &[f64]) -> Option<f64> {
    let score = score.filter(|s| s.is_finite())?;
    let valid = finite(distribution);
    if valid.is_empty() {
        return None;
    }
    let at_or_below = valid.iter().filter(|v| **v <= score).count();
    Some(at_or_below as f64 / valid.len() as f64 * 100.0)
}

pub fn percentile_to_1_10(percentile: Option<f64>) -> f64 {
    match percentile.filter(|p| p.is_finite()) {
        Some(p) if p >= 10.0 => {
            let decile = (p / 10.0).floor().min(9.0);
            (decile + (p - decile * 10.0) / 10.0).min(10.0)
        }
        _ => 1.0,
    }
}

pub fn grade_from_1_10(score: Option<f64>) -> Grade {
    match score.filter(|s| s.is_finite()) {
        Some(s) if s >= 9.0 => Grade::A,
        Some(s) if s >= 8.0 => Grade::B,
        Some(s) if s >= 7.0 => Grade::C,
        Some(s) if s >= 6.0 => Grade::D,
        _ => Grade::F,
    }
}

pub fn grade_from_percentile(percentile: f64) -> Grade {
    if percentile >= 90.0 {
        Grade::A
    } else if percentile >= 80.0 {
        Grade::B
    } else if percentile >= 70.0 {
        Grade::C
    } else if percentile >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

pub fn comparison_grade(score: Option<f64>, population: &[f64]) -> Option<Grade> {
    percentile_in(score, population).map(grade_from_percentile)
}

pub fn rate_within(totals: &[Option<f64>]) -> Vec<TotalRating> {
    percentile_ranks(totals)
        .into_iter()
        .map(TotalRating::from_percentile)
        .collect()
}

pub fn inclusive_rank(value: f64, population: &[f64]) -> usize {
    population
        .iter()
        .filter(|v| v.is_finite() && **v >= value)
        .count()
        .max(1)
}

/// Top-N membership by inclusive rank. With at least `n` values, a value at
/// or above the n-th highest is also in, so ties at the cut-off all count.
pub fn in_top_n(value: Option<f64>, population: &[f64], n: usize) -> bool {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return false;
    };
    if n == 0 {
        return false;
    }
    let mut sorted = finite(population);
    if sorted.is_empty() {
        return false;
    }
    sorted.sort_by(|a, b| b.total_cmp(a));
    if inclusive_rank(value, &sorted) <= n {
        return true;
    }
    sorted.len() >= n && value >= sorted[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_average_rank() {
        let out = percentile_ranks(&[Some(1.0), Some(2.0), Some(2.0), Some(3.0)]);
        assert_eq!(out, vec![Some(25.0), Some(62.5), Some(62.5), Some(100.0)]);
    }

    #[test]
    fn missing_values_are_not_ranked() {
        let out = percentile_ranks(&[None, Some(5.0)]);
        assert_eq!(out, vec![None, Some(100.0)]);
    }

    #[test]
    fn ties_at_cutoff_are_all_top() {
        let mut pop: Vec<f64> = (0..20).map(|i| i as f64).collect();
        pop.push(5.0);
        // 15th highest is 5.0, shared by two players.
        assert!(in_top_n(Some(5.0), &pop, 15));
        assert!(!in_top_n(Some(4.0), &pop, 15));
    }
}
