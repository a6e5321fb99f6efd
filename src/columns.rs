const BETTER_THAN_POSITION: &str = "% better than position";

// Applied in order; "accurate, %" only survives when no ", %" precedes it.
const PERCENT_SUFFIXES: &[&str] = &[
    " won, %",
    " won %",
    " won",
    ", %",
    " %",
    "accurate, %",
    "accurate %",
];

const TEAM_CORRECTIONS: &[(&str, &str)] = &[("Mississppi", "Mississippi")];

pub fn is_percentage_column(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    lower.contains('%') || lower.contains("percent")
}

pub fn is_per_90_column(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    lower.contains("per 90") || lower.contains("per90")
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn per_90_base(lower: &str) -> String {
    collapse_whitespace(&lower.replace(" per 90", "").replace(" per90", ""))
}

fn percent_base(lower: &str) -> String {
    let mut base = lower.to_string();
    for suffix in PERCENT_SUFFIXES {
        base = base.replace(suffix, "");
    }
    collapse_whitespace(&base)
}

/// Finds the export column that holds `desired`.
///
/// Exact (case-insensitive) match wins. Per-90 labels then match other per-90
/// columns with the same base name, and percentage labels match other
/// percentage columns with the same base name. "% better than position"
/// columns never match.
pub fn resolve_column<S: AsRef<str>>(desired: &str, available: &[S]) -> Option<String> {
    let wanted = desired.trim().to_ascii_lowercase();
    if wanted.is_empty() {
        return None;
    }

    if let Some(hit) = available
        .iter()
        .map(AsRef::as_ref)
        .find(|c| c.trim().to_ascii_lowercase() == wanted)
    {
        return Some(hit.to_string());
    }

    if wanted.contains(BETTER_THAN_POSITION) {
        return None;
    }

    if is_per_90_column(&wanted) && !wanted.contains('%') {
        let base = per_90_base(&wanted);
        return available
            .iter()
            .map(AsRef::as_ref)
            .find(|c| {
                let lower = c.to_ascii_lowercase();
                is_per_90_column(&lower)
                    && !lower.contains('%')
                    && per_90_base(&lower) == base
            })
            .map(str::to_string);
    }

    if is_percentage_column(&wanted) {
        let base = percent_base(&wanted);
        return available
            .iter()
            .map(AsRef::as_ref)
            .find(|c| {
                let lower = c.to_ascii_lowercase();
                is_percentage_column(&lower)
                    && !is_per_90_column(&lower)
                    && !lower.contains(BETTER_THAN_POSITION)
                    && percent_base(&lower) == base
            })
            .map(str::to_string);
    }

    None
}

pub fn normalize_player_name(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

pub fn normalize_team_name(name: &str) -> String {
    let mut out = collapse_whitespace(name);
    for (wrong, right) in TEAM_CORRECTIONS {
        if out.contains(wrong) {
            out = out.replace(wrong, right);
        }
    }
    out
}

pub fn team_key(name: &str) -> String {
    normalize_team_name(name).to_lowercase()
}

pub fn teams_match(a: &str, b: &str) -> bool {
    let a = team_key(a);
    let b = team_key(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    if !(a.contains(&b) || b.contains(&a)) {
        return false;
    }
    let aw: Vec<&str> = a.split(' ').collect();
    let bw: Vec<&str> = b.split(' ').collect();
    if aw.len() >= 2 && bw.len() >= 2 {
        return aw[..2] == bw[..2];
    }
    true
}
