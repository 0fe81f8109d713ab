use deunicode::deunicode;
use log::debug;

use crate::model::xtream::CatalogEntry;
use crate::utils::constants::CONSTANTS;
use crate::utils::trace_if_enabled;

/// Minimum similarity a fuzzy candidate must exceed to be accepted.
pub const MATCH_THRESHOLD: f64 = 0.8;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MatchKind {
    Exact,
    Fuzzy(f64),
}

#[derive(Debug, Copy, Clone)]
pub struct ContentMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub kind: MatchKind,
}

/// Drops `(…)`/`[…]` annotations and a trailing year, folds to ascii and keeps only `[a-z0-9]`.
pub fn normalize_title(title: &str) -> String {
    let stripped = CONSTANTS.re_title_annotation.replace_all(title, "");
    let stripped = CONSTANTS.re_title_year.replace(stripped.trim_end(), "");
    deunicode(&stripped)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// `1 - levenshtein / longer length`, in `[0, 1]`.
pub fn similarity(first: &str, second: &str) -> f64 {
    let len = first.chars().count().max(second.chars().count());
    if len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(first, second);
    1.0 - (distance as f64 / len as f64)
}

fn find_exact_match<'a>(entries: &'a [CatalogEntry], normalized_names: &[String], normalized_title: &str) -> Option<&'a CatalogEntry> {
    normalized_names.iter()
        .position(|name| name == normalized_title)
        .map(|idx| &entries[idx])
}

// Scans the whole list, the first entry with the strictly highest score wins.
fn find_best_match<'a>(entries: &'a [CatalogEntry], normalized_names: &[String], normalized_title: &str, threshold: f64) -> Option<(&'a CatalogEntry, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, name) in normalized_names.iter().enumerate() {
        let score = similarity(normalized_title, name);
        trace_if_enabled!("Comparing '{}' with '{}', similarity: {}", normalized_title, name, score);
        match best {
            Some((_, highest)) if score <= highest => {}
            _ => best = Some((idx, score)),
        }
    }
    match best {
        Some((idx, score)) if score > threshold => Some((&entries[idx], score)),
        Some((idx, score)) => {
            debug!("Best candidate '{}' for '{normalized_title}' below threshold: {score:.3}", entries[idx].name);
            None
        }
        None => None,
    }
}

/// Exact normalized match first, best fuzzy match above `threshold` otherwise.
/// A title normalizing to an empty string never matches.
pub fn match_content<'a>(entries: &'a [CatalogEntry], title: &str, threshold: f64) -> Option<ContentMatch<'a>> {
    let normalized_title = normalize_title(title);
    if normalized_title.is_empty() {
        debug!("Title '{title}' normalizes to nothing, skipping catalog match");
        return None;
    }
    debug!("Searching for normalized title: {normalized_title}");
    let normalized_names: Vec<String> = entries.iter().map(|entry| normalize_title(&entry.name)).collect();

    if let Some(entry) = find_exact_match(entries, &normalized_names, &normalized_title) {
        return Some(ContentMatch { entry, kind: MatchKind::Exact });
    }
    debug!("Exact match not found for '{normalized_title}', trying best match");
    find_best_match(entries, &normalized_names, &normalized_title, threshold)
        .map(|(entry, score)| ContentMatch { entry, kind: MatchKind::Fuzzy(score) })
}

#[cfg(test)]
mod tests {
    use crate::model::xtream::CatalogEntry;
    use crate::processing::matcher::{match_content, normalize_title, similarity, MatchKind, MATCH_THRESHOLD};

    fn catalog(names: &[&str]) -> Vec<CatalogEntry> {
        names.iter().enumerate().map(|(idx, name)| CatalogEntry {
            name: (*name).to_string(),
            stream_id: Some(u32::try_from(idx).unwrap() + 1),
            ..CatalogEntry::default()
        }).collect()
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Matrix (1999)"), "thematrix");
        assert_eq!(normalize_title("Heat [4K] (Director's Cut)"), "heat");
        assert_eq!(normalize_title("Blade Runner 2049"), "bladerunner");
        assert_eq!(normalize_title("Léon: The Professional"), "leontheprofessional");
        assert_eq!(normalize_title("1917"), "1917");
        assert_eq!(normalize_title("DE - Das Boot 1981 "), "dedasboot");
        assert_eq!(normalize_title("!!!"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for title in ["The Matrix (1999)", "a12345678", "abc 1234 5678", "(x) [y] 2000", "1917 (2019)", "Ämelie ((nested) x)",
                      "Spider-Man: No Way Home 2021", "  ", "年", "x (unclosed", "Movie2019"] {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "not idempotent for {title}");
        }
    }

    #[test]
    fn test_similarity_bounds() {
        assert!((similarity("abc", "abc") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("", "abc").abs() < f64::EPSILON);
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_exact_match_wins_over_fuzzy() {
        let entries = catalog(&["The Matrixx", "The Matrix (1999)", "The Matrix"]);
        let found = match_content(&entries, "The Matrix", MATCH_THRESHOLD).unwrap();
        assert_eq!(found.kind, MatchKind::Exact);
        assert_eq!(found.entry.stream_id, Some(2));
    }

    #[test]
    fn test_fuzzy_match_takes_best_of_all() {
        let entries = catalog(&["Breaking Bad Extra", "Braking Bad", "Breaking Bd"]);
        let found = match_content(&entries, "Breaking Bad", MATCH_THRESHOLD).unwrap();
        match found.kind {
            MatchKind::Fuzzy(score) => assert!(score > MATCH_THRESHOLD),
            MatchKind::Exact => panic!("unexpected exact match"),
        }
        // both candidates are one edit away, the first one wins the tie
        assert_eq!(found.entry.stream_id, Some(2));
    }

    #[test]
    fn test_fuzzy_match_below_threshold() {
        // one edit on four characters => 0.75
        let entries = catalog(&["Heap"]);
        assert!(match_content(&entries, "Heat", MATCH_THRESHOLD).is_none());
        // one edit on six characters => 0.83
        let entries = catalog(&["Alien3"]);
        assert!(match_content(&entries, "Aliens", MATCH_THRESHOLD).is_some());
    }

    #[test]
    fn test_identical_entry_always_selected() {
        let entries = catalog(&["Something Else", "Dune: Part Two"]);
        let found = match_content(&entries, "dune part two", MATCH_THRESHOLD).unwrap();
        assert_eq!(found.entry.stream_id, Some(2));
    }

    #[test]
    fn test_empty_title_never_matches() {
        let entries = catalog(&["???", "Heat"]);
        assert!(match_content(&entries, "!!!", MATCH_THRESHOLD).is_none());
        assert!(match_content(&[], "Heat", MATCH_THRESHOLD).is_none());
    }
}
