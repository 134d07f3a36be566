//! Closest-name lookup for mistyped column names.

use rapidfuzz::distance::jaro_winkler;

/// Minimum similarity for a suggestion to be offered.
pub const MIN_SUGGESTION_SCORE: f64 = 0.75;

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Best Jaro-Winkler match for `target` among `candidates`.
pub fn suggest_column<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let wanted = normalize(target);
    if wanted.is_empty() {
        return None;
    }
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = jaro_winkler::similarity(wanted.chars(), normalize(candidate).chars());
        if score < MIN_SUGGESTION_SCORE {
            continue;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best.map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_names() {
        let columns = ["Block", "Variety", "Grain Yield"];
        assert_eq!(
            suggest_column("grain_yeild", columns).as_deref(),
            Some("Grain Yield")
        );
        assert_eq!(suggest_column("varity", columns).as_deref(), Some("Variety"));
        assert_eq!(suggest_column("zzz", columns), None);
    }
}
