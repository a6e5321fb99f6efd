/// Score given to a missing value, and to every row when the reference has
/// no data for the metric.
pub const MISSING_SCORE: f64 = 0.1;
pub const DEGENERATE_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Reference has no numeric values for this metric.
    NoReference,
    /// Every reference value lies in [0,100]; treated as an existing percentage.
    Percentage,
    MinMax { min: f64, max: f64 },
    /// `min == max`.
    Degenerate,
}

impl Scale {
    pub fn from_reference<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen = false;
        for v in values.into_iter().flatten().filter(|v| v.is_finite()) {
            seen = true;
            min = min.min(v);
            max = max.max(v);
        }
        if !seen {
            return Scale::NoReference;
        }
        if min >= 0.0 && max <= 100.0 {
            return Scale::Percentage;
        }
        if max == min {
            return Scale::Degenerate;
        }
        Scale::MinMax { min, max }
    }

    pub fn normalize(&self, value: Option<f64>) -> f64 {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return MISSING_SCORE;
        };
        let out = match *self {
            Scale::NoReference => MISSING_SCORE,
            Scale::Percentage => value / 100.0,
            Scale::MinMax { min, max } => (value - min) / (max - min),
            Scale::Degenerate => DEGENERATE_SCORE,
        };
        if out.is_finite() { out } else { MISSING_SCORE }
    }
}

pub fn normalize_column(scoring: &[Option<f64>], reference: &[Option<f64>]) -> Vec<f64> {
    let scale = Scale::from_reference(reference.iter().copied());
    scoring.iter().map(|v| scale.normalize(*v)).collect()
}
