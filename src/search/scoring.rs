//! Substring relevance helpers shared by the ranking paths.
//!
//! Positions and spans are measured in characters of the original text, so
//! they line up with the spans produced by the fuzzy index.

use crate::types::{Choice, MatchSpan, ScoredChoice, SearchKey};

/// Character position of `query_lower` inside `text`, compared case-insensitively.
pub(crate) fn find_position(text: &str, query_lower: &str) -> Option<usize> {
    substring_span(text, query_lower).map(|span| span.start)
}

/// Span covering the first case-insensitive occurrence of `query_lower` in `text`.
///
/// Each char of `text` is folded on its own, so positions stay valid even when
/// lowercasing changes the char count (`İ` folds to two chars).
pub(crate) fn substring_span(text: &str, query_lower: &str) -> Option<MatchSpan> {
    let query: Vec<char> = query_lower.chars().collect();
    if query.is_empty() {
        return Some(MatchSpan::new(0, 0));
    }
    let text: Vec<char> = text.chars().collect();
    (0..text.len()).find_map(|start| {
        folded_match_len(&text[start..], &query).map(|len| MatchSpan::new(start, start + len))
    })
}

/// Number of leading chars of `text` whose lowercase forms spell exactly `query`.
fn folded_match_len(text: &[char], query: &[char]) -> Option<usize> {
    let mut remaining = query;
    for (consumed, c) in text.iter().enumerate() {
        for lower in c.to_lowercase() {
            let (expected, rest) = remaining.split_first()?;
            if *expected != lower {
                return None;
            }
            remaining = rest;
        }
        if remaining.is_empty() {
            return Some(consumed + 1);
        }
    }
    None
}

/// Sort key for the no-group path: earlier occurrences in the name win,
/// names without an occurrence sort last.
pub(crate) fn name_position_key(choice: &Choice, query_lower: &str) -> usize {
    find_position(&choice.name, query_lower).unwrap_or(usize::MAX)
}

/// Collapses matched character indices into contiguous half-open spans.
pub(crate) fn spans_from_indices(indices: &mut Vec<u32>) -> Vec<MatchSpan> {
    indices.sort_unstable();
    indices.dedup();

    let mut spans: Vec<MatchSpan> = Vec::new();
    for &index in indices.iter() {
        let index = index as usize;
        match spans.last_mut() {
            Some(span) if span.end == index => span.end = index + 1,
            _ => spans.push(MatchSpan::new(index, index + 1)),
        }
    }
    spans
}

/// Fallback used when the fuzzy index finds nothing.
///
/// Every choice is checked field by field in key priority order; the first
/// field containing the query produces a synthetic hit. `miss`, `pass` and
/// `info` choices are always included as-is.
pub(crate) fn linear_scan(choices: &[Choice], keys: &[SearchKey], query: &str) -> Vec<ScoredChoice> {
    let query_lower = query.to_lowercase();

    choices
        .iter()
        .filter_map(|choice| {
            if choice.miss || choice.pass.is_set() || choice.info {
                return Some(ScoredChoice::unscored(choice.clone()));
            }
            if choice.skip {
                return None;
            }
            keys.iter().find_map(|key| {
                let span = substring_span(key.text(choice)?, &query_lower)?;
                Some(ScoredChoice::unscored(choice.clone()).with_span(*key, span))
            })
        })
        .collect()
}
