//! Fuzzy index over the configured text fields of a choice list.

use crate::types::{Choice, MatchSpan, SearchKey};
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32String};
use std::collections::BTreeMap;

use super::scoring::spans_from_indices;

/// A single fuzzy hit: the position of the choice in the indexed list, its
/// best score across keys, and highlight spans for every key that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub position: usize,
    pub score: u32,
    pub matches: BTreeMap<SearchKey, Vec<MatchSpan>>,
}

/// Pre-converted haystacks for one choice, parallel to the index keys.
#[derive(Debug, Clone)]
struct Document {
    position: usize,
    fields: Vec<Option<Utf32String>>,
}

/// Rebuildable scoring structure: a pure function of (choices, keys).
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    keys: Vec<SearchKey>,
    documents: Vec<Document>,
}

impl FuzzyIndex {
    /// Builds the index. Header rows (`skip`) are not selectable and are never indexed.
    pub fn build(choices: &[Choice], keys: &[SearchKey]) -> Self {
        let documents = choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| !choice.skip)
            .map(|(position, choice)| Document {
                position,
                fields: keys
                    .iter()
                    .map(|key| key.text(choice).map(Utf32String::from))
                    .collect(),
            })
            .collect();

        Self {
            keys: keys.to_vec(),
            documents,
        }
    }

    pub fn keys(&self) -> &[SearchKey] {
        &self.keys
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Scores every document against `query`.
    ///
    /// Results are sorted by score descending; equal scores keep insertion order.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<IndexHit> {
        if query.trim().is_empty() || self.documents.is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut indices = Vec::new();

        let mut hits: Vec<IndexHit> = self
            .documents
            .iter()
            .filter_map(|document| {
                let mut best: Option<u32> = None;
                let mut matches = BTreeMap::new();

                for (key, field) in self.keys.iter().zip(&document.fields) {
                    let Some(field) = field else { continue };
                    indices.clear();
                    let Some(score) = pattern.indices(field.slice(..), &mut matcher, &mut indices)
                    else {
                        continue;
                    };
                    best = Some(best.map_or(score, |b| b.max(score)));
                    matches.insert(*key, spans_from_indices(&mut indices));
                }

                best.map(|score| IndexHit {
                    position: document.position,
                    score,
                    matches,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.position.cmp(&b.position)));
        tracing::trace!("Fuzzy query '{}' matched {} documents", query, hits.len());
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn names(names: &[&str]) -> Vec<Choice> {
        names.iter().map(|name| Choice::new(*name)).collect()
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = FuzzyIndex::build(&[], &[SearchKey::Name]);
        check!(index.is_empty());
        check!(index.search("anything").is_empty());
    }

    #[test]
    fn blank_query_matches_nothing() {
        let index = FuzzyIndex::build(&names(&["Alpha"]), &[SearchKey::Name]);
        check!(index.search("   ").is_empty());
    }

    #[test]
    fn fuzzy_subsequence_matches_with_spans() {
        let index = FuzzyIndex::build(&names(&["Open Finder", "Quit"]), &[SearchKey::Name]);
        let hits = index.search("ofd");
        check!(hits.len() == 1);
        check!(hits[0].position == 0);
        check!(hits[0].matches.contains_key(&SearchKey::Name));
        check!(!hits[0].matches[&SearchKey::Name].is_empty());
    }

    #[test]
    fn skip_headers_are_not_indexed() {
        let mut header = Choice::new("Apps");
        header.skip = true;
        let index = FuzzyIndex::build(&[header, Choice::new("Apple Music")], &[SearchKey::Name]);
        check!(index.len() == 1);
        let hits = index.search("app");
        check!(hits.len() == 1);
        check!(hits[0].position == 1);
    }

    #[test]
    fn secondary_keys_contribute_matches() {
        let mut choice = Choice::new("Terminal");
        choice.description = Some("shell emulator".to_string());
        let index =
            FuzzyIndex::build(&[choice], &[SearchKey::Name, SearchKey::Description]);
        let hits = index.search("shell");
        check!(hits.len() == 1);
        check!(hits[0].matches.contains_key(&SearchKey::Description));
        check!(!hits[0].matches.contains_key(&SearchKey::Name));
    }
}
