//! Time-off person matcher.
//!
//! Resolves free-text person references from upstream detectors ("@maya",
//! "jordan.kim|jk", "U7AB9QK2") against the roster: exact match on the
//! external identity token first, then fuzzy matching on names.

use std::collections::HashMap;

use coverageiq_domain::constants::{
    EXTERNAL_ID_MIN_SUFFIX_LEN, EXTERNAL_ID_PREFIX, FUZZY_MATCH_THRESHOLD,
};
use coverageiq_domain::Person;
use strsim::normalized_levenshtein;
use tracing::debug;

/// Cache of resolved external identity tokens.
///
/// Entries map a token to the matched person's id and are never evicted:
/// identity tokens are stable and the roster is small, so the cache is
/// bounded by the number of distinct tokens ever seen.
#[derive(Debug, Default)]
pub struct NameResolutionCache {
    entries: HashMap<String, String>,
}

impl NameResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    fn insert(&mut self, token: &str, person_id: &str) {
        self.entries.insert(token.to_string(), person_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Matches person references against the roster.
#[derive(Debug, Clone, Copy)]
pub struct TimeOffMatcher {
    threshold: f64,
}

impl Default for TimeOffMatcher {
    fn default() -> Self {
        Self { threshold: FUZZY_MATCH_THRESHOLD }
    }
}

impl TimeOffMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Whether the reference is shaped like a platform identity token:
    /// the marker prefix followed by at least six uppercase alphanumerics.
    fn looks_like_external_id(reference: &str) -> bool {
        let mut chars = reference.chars();
        chars.next() == Some(EXTERNAL_ID_PREFIX)
            && reference.len() > EXTERNAL_ID_MIN_SUFFIX_LEN
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }

    /// Strips mention markers and display suffixes, folds separators into
    /// spaces, and lowercases: `"@Jordan.Kim|jk"` becomes `"jordan kim"`.
    fn normalize_reference(reference: &str) -> String {
        let bare = reference.trim().trim_start_matches('@');
        let bare = bare.split('|').next().unwrap_or(bare);
        bare.chars()
            .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
            .collect::<String>()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolves a reference to a roster entry, or `None` when nothing
    /// clears the similarity threshold.
    pub fn resolve<'a>(
        &self,
        reference: &str,
        roster: &'a [Person],
        cache: &mut NameResolutionCache,
    ) -> Option<&'a Person> {
        let token = reference.trim().trim_start_matches('@');
        let token = token.split('|').next().unwrap_or(token);

        if Self::looks_like_external_id(token) {
            if let Some(person_id) = cache.get(token) {
                if let Some(person) = roster.iter().find(|p| p.id == person_id) {
                    return Some(person);
                }
            }
            let hit = roster.iter().find(|p| p.external_id.as_deref() == Some(token));
            if let Some(person) = hit {
                cache.insert(token, &person.id);
            } else {
                debug!(token, "external identity token matched no roster entry");
            }
            // Identity tokens are authoritative; never fall through to fuzzy.
            return hit;
        }

        let needle = Self::normalize_reference(reference);
        if needle.is_empty() {
            return None;
        }

        let mut best: Option<(&Person, f64)> = None;
        for person in roster {
            let full = person.name.to_lowercase();
            let first = person.first_name().to_lowercase();
            let ratio = normalized_levenshtein(&needle, &full)
                .max(normalized_levenshtein(&needle, &first));
            // Strict comparison keeps the first maximal roster entry on ties.
            if best.map_or(true, |(_, top)| ratio > top) {
                best = Some((person, ratio));
            }
        }
        best.and_then(|(person, ratio)| (ratio >= self.threshold).then_some(person))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Person> {
        vec![
            Person::new("p1", "Maya Patel").with_external_id("U7AB9QK2"),
            Person::new("p2", "Jordan Kim").with_external_id("U3XC44LM"),
            Person::new("p3", "Sam Okafor"),
        ]
    }

    #[test]
    fn external_id_matches_exactly() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        let hit = matcher.resolve("U7AB9QK2", &roster, &mut cache).unwrap();
        assert_eq!(hit.id, "p1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_token_resolves_on_repeat_lookups() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        matcher.resolve("U3XC44LM", &roster, &mut cache);
        let hit = matcher.resolve("U3XC44LM", &roster, &mut cache).unwrap();
        assert_eq!(hit.id, "p2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unknown_external_id_never_falls_back_to_fuzzy() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        assert!(matcher.resolve("U9ZZZZZZ", &roster, &mut cache).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn short_or_lowercase_tokens_are_not_identity_tokens() {
        assert!(!TimeOffMatcher::looks_like_external_id("U12"));
        assert!(!TimeOffMatcher::looks_like_external_id("u7ab9qk2"));
        assert!(!TimeOffMatcher::looks_like_external_id("Ursula"));
        assert!(TimeOffMatcher::looks_like_external_id("U7AB9QK2"));
    }

    #[test]
    fn first_name_reference_matches() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        let hit = matcher.resolve("maya", &roster, &mut cache).unwrap();
        assert_eq!(hit.name, "Maya Patel");
    }

    #[test]
    fn mention_markers_and_suffixes_are_stripped() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        let hit = matcher.resolve("@Jordan.Kim|jk", &roster, &mut cache).unwrap();
        assert_eq!(hit.id, "p2");
    }

    #[test]
    fn gibberish_matches_nobody() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        assert!(matcher.resolve("zzz-qqq-xxx", &roster, &mut cache).is_none());
        assert!(matcher.resolve("", &roster, &mut cache).is_none());
        assert!(matcher.resolve("@", &roster, &mut cache).is_none());
    }

    #[test]
    fn ties_resolve_to_the_first_roster_entry() {
        let roster = vec![
            Person::new("p1", "Alex Chen"),
            Person::new("p2", "Alex Chen"),
        ];
        let mut cache = NameResolutionCache::new();
        let matcher = TimeOffMatcher::default();
        let hit = matcher.resolve("alex chen", &roster, &mut cache).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn threshold_is_configurable() {
        let roster = roster();
        let mut cache = NameResolutionCache::new();
        // "mya" scores 0.75 against "maya".
        assert!(TimeOffMatcher::new(0.99)
            .resolve("mya", &roster, &mut cache)
            .is_none());
        assert!(TimeOffMatcher::new(0.5)
            .resolve("mya", &roster, &mut cache)
            .is_some());
    }

    #[test]
    fn normalization_folds_separators() {
        assert_eq!(TimeOffMatcher::normalize_reference("@Jordan.Kim|jk"), "jordan kim");
        assert_eq!(TimeOffMatcher::normalize_reference("sam_okafor"), "sam okafor");
        assert_eq!(TimeOffMatcher::normalize_reference("  Maya-Patel  "), "maya patel");
    }
}
