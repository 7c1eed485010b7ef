use crate::domain::model::ProviderId;
use crate::utils::error::{EventSearchError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenreEntry {
    pub name: String,
    pub id: String,
}

/// 單一供應商接受的類型詞彙
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProviderVocabulary {
    /// 供應商以 ID 查詢 (例如 Skiddle 的 `g` 參數)
    Identified { genres: Vec<GenreEntry> },
    /// 供應商以文字標籤查詢 (例如 Ticketmaster 的 `classificationName`)
    Labels { labels: Vec<String> },
}

impl ProviderVocabulary {
    fn is_empty(&self) -> bool {
        match self {
            ProviderVocabulary::Identified { genres } => genres.is_empty(),
            ProviderVocabulary::Labels { labels } => labels.is_empty(),
        }
    }
}

/// Static genre reference data, keyed by provider. Loaded once, read-only afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GenreVocabulary {
    providers: HashMap<ProviderId, ProviderVocabulary>,
}

impl GenreVocabulary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source_name = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            EventSearchError::GenreVocabulary {
                source_name: source_name.clone(),
                message: e.to_string(),
            }
        })?;
        Self::from_json_str(&source_name, &content)
    }

    pub fn from_json_str(source_name: &str, content: &str) -> Result<Self> {
        let vocabulary: GenreVocabulary =
            serde_json::from_str(content).map_err(|e| EventSearchError::GenreVocabulary {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        if vocabulary.providers.is_empty() {
            return Err(EventSearchError::GenreVocabulary {
                source_name: source_name.to_string(),
                message: "no provider vocabularies defined".to_string(),
            });
        }
        for (provider, entries) in &vocabulary.providers {
            if entries.is_empty() {
                return Err(EventSearchError::GenreVocabulary {
                    source_name: source_name.to_string(),
                    message: format!("vocabulary for {} is empty", provider),
                });
            }
        }

        tracing::debug!(
            "Loaded genre vocabulary from {} for {} providers",
            source_name,
            vocabulary.providers.len()
        );
        Ok(vocabulary)
    }

    pub fn for_provider(&self, provider: ProviderId) -> Option<&ProviderVocabulary> {
        self.providers.get(&provider)
    }
}

/// 每個供應商對應後的類型查詢值 (逗號分隔)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledGenres {
    values: HashMap<ProviderId, String>,
}

impl ReconciledGenres {
    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.values.get(&provider).map(String::as_str)
    }
}

pub struct GenreReconciler {
    vocabulary: GenreVocabulary,
}

impl GenreReconciler {
    pub fn new(vocabulary: GenreVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn reconcile_all<I>(&self, terms: &[String], providers: I) -> ReconciledGenres
    where
        I: IntoIterator<Item = ProviderId>,
    {
        let mut values = HashMap::new();
        for provider in providers {
            if let Some(value) = self.reconcile(provider, terms) {
                tracing::debug!("🎵 {} genres: {}", provider, value);
                values.insert(provider, value);
            }
        }
        ReconciledGenres { values }
    }

    /// 將使用者輸入的每個類型對應到供應商詞彙，依輸入順序以逗號串接
    pub fn reconcile(&self, provider: ProviderId, terms: &[String]) -> Option<String> {
        let Some(vocabulary) = self.vocabulary.for_provider(provider) else {
            tracing::warn!("No genre vocabulary for {}, searching without genre filter", provider);
            return None;
        };

        let mut matches: Vec<&str> = Vec::new();
        for term in terms {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            let matched = match vocabulary {
                ProviderVocabulary::Identified { genres } => {
                    best_scored_match(term, genres).map(|entry| entry.id.as_str())
                }
                ProviderVocabulary::Labels { labels } => nearest_label(term, labels),
            };
            match matched {
                Some(value) => matches.push(value),
                None => tracing::debug!("Genre '{}' has no counterpart for {}", term, provider),
            }
        }

        if matches.is_empty() {
            None
        } else {
            Some(matches.join(","))
        }
    }
}

/// Highest normalized Levenshtein similarity wins; first candidate wins ties.
pub fn best_scored_match<'a>(term: &str, candidates: &'a [GenreEntry]) -> Option<&'a GenreEntry> {
    best_by_similarity(term, candidates, |entry| entry.name.as_str())
}

/// 與 `best_scored_match` 相同的評分，用於只有文字標籤的詞彙
pub fn nearest_label<'a>(term: &str, labels: &'a [String]) -> Option<&'a str> {
    best_by_similarity(term, labels, String::as_str).map(String::as_str)
}

/// Similarity is in 0.0..=1.0; an exact match returns immediately, a score of 0 never matches.
fn best_by_similarity<'a, T, F>(term: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = term.to_lowercase();
    let mut best: Option<&T> = None;
    let mut best_score = 0.0;

    for candidate in candidates {
        let score = strsim::normalized_levenshtein(&needle, &name_of(candidate).to_lowercase());
        if score >= 1.0 {
            return Some(candidate);
        }
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCABULARY: &str = r#"{
        "ticketmaster": { "labels": ["Rock", "Jazz", "Pop", "Dance/Electronic", "Hip-Hop/Rap"] },
        "skiddle": { "genres": [
            { "name": "Rock", "id": "2" },
            { "name": "Jazz", "id": "6" },
            { "name": "Pop", "id": "3" },
            { "name": "Techno", "id": "15" },
            { "name": "Tech House", "id": "16" }
        ] }
    }"#;

    fn reconciler() -> GenreReconciler {
        GenreReconciler::new(GenreVocabulary::from_json_str("test", VOCABULARY).unwrap())
    }

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn entries(names: &[&str]) -> Vec<GenreEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| GenreEntry {
                name: name.to_string(),
                id: i.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_misspelled_term_matches_closest_label() {
        let labels = terms(&["Rock", "Jazz", "Pop"]);
        assert_eq!(nearest_label("Rok", &labels), Some("Rock"));

        let scored = entries(&["Rock", "Jazz", "Pop"]);
        assert_eq!(best_scored_match("Rok", &scored).unwrap().name, "Rock");
    }

    #[test]
    fn test_exact_match_wins_over_close_candidates() {
        let scored = entries(&["Techno House", "Tech", "Techno"]);
        assert_eq!(best_scored_match("Techno", &scored).unwrap().name, "Techno");

        let labels = terms(&["Rocks", "Rock"]);
        assert_eq!(nearest_label("Rock", &labels), Some("Rock"));
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        // "Pip" is one edit away from both
        let scored = entries(&["Pop", "Pit"]);
        assert_eq!(best_scored_match("Pip", &scored).unwrap().name, "Pop");

        let labels = terms(&["Pit", "Pop"]);
        assert_eq!(nearest_label("Pip", &labels), Some("Pit"));
    }

    #[test]
    fn test_matching_ignores_case() {
        let scored = entries(&["Jazz", "Rock"]);
        assert_eq!(best_scored_match("ROCK", &scored).unwrap().name, "Rock");
    }

    #[test]
    fn test_completely_unrelated_term_has_no_match() {
        let scored = entries(&["abc"]);
        assert!(best_scored_match("xyz", &scored).is_none());
        assert!(nearest_label("xyz", &terms(&["abc"])).is_none());
    }

    #[test]
    fn test_reconcile_preserves_term_order_per_provider() {
        let reconciler = reconciler();
        let user_terms = terms(&["Techno", " jaz", "Rock"]);

        assert_eq!(
            reconciler.reconcile(ProviderId::Skiddle, &user_terms).as_deref(),
            Some("15,6,2")
        );
        assert_eq!(
            reconciler.reconcile(ProviderId::Ticketmaster, &user_terms).as_deref(),
            Some("Dance/Electronic,Jazz,Rock")
        );
    }

    #[test]
    fn test_labels_prefer_relative_similarity_over_short_names() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/genres.json");
        let reconciler = GenreReconciler::new(GenreVocabulary::from_file(path).unwrap());

        assert_eq!(
            reconciler
                .reconcile(ProviderId::Ticketmaster, &terms(&["Dance", "hiphop"]))
                .as_deref(),
            Some("Dance/Electronic,Hip-Hop/Rap")
        );
        assert_eq!(
            reconciler
                .reconcile(ProviderId::Skiddle, &terms(&["Techno"]))
                .as_deref(),
            Some("15")
        );
    }

    #[test]
    fn test_reconcile_all_skips_empty_input() {
        let reconciler = reconciler();
        let genres = reconciler.reconcile_all(&[], ProviderId::ALL);
        assert_eq!(genres.get(ProviderId::Skiddle), None);
        assert_eq!(genres.get(ProviderId::Ticketmaster), None);

        let genres = reconciler.reconcile_all(&terms(&["Pop"]), [ProviderId::Skiddle]);
        assert_eq!(genres.get(ProviderId::Skiddle), Some("3"));
        assert_eq!(genres.get(ProviderId::Ticketmaster), None);
    }

    #[test]
    fn test_malformed_vocabulary_is_rejected() {
        let err = GenreVocabulary::from_json_str("broken", "{ not json").unwrap_err();
        assert!(matches!(err, EventSearchError::GenreVocabulary { .. }));

        let err = GenreVocabulary::from_json_str("empty", "{}").unwrap_err();
        assert!(matches!(err, EventSearchError::GenreVocabulary { .. }));

        let err =
            GenreVocabulary::from_json_str("no-labels", r#"{"ticketmaster": {"labels": []}}"#)
                .unwrap_err();
        assert!(err.to_string().contains("ticketmaster"));
    }

    #[test]
    fn test_missing_vocabulary_file_is_fatal() {
        let err = GenreVocabulary::from_file("/definitely/not/here/genres.json").unwrap_err();
        assert!(matches!(err, EventSearchError::GenreVocabulary { .. }));
    }
}
