//! Choice registry: the current working set plus every table derived from it.
//!
//! A [`Catalog`] is immutable once built. Replacing the choice list means
//! building a new catalog, so the index, `has_group` and the lookup tables can
//! never disagree with the choices they were derived from.

use crate::search::FuzzyIndex;
use crate::types::{Choice, SearchKey};
use ahash::AHashMap;
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Options accompanying a choice-list replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// The list is a cached preview; its initial ranking ignores the current input.
    pub preload: bool,
    /// Do not run the initial ranking pass after the replacement.
    pub skip_initial_search: bool,
    /// The list is already in final order; skip registries and the index.
    pub generated: bool,
}

/// One version of a session's working set.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    choices: Vec<Choice>,
    index: FuzzyIndex,
    has_group: bool,
    generated: bool,
    shortcodes: AHashMap<String, usize>,
    triggers: AHashMap<String, usize>,
    keywords: AHashMap<String, usize>,
    postfixes: IndexMap<String, usize>,
}

impl Catalog {
    /// An empty catalog scoring the given keys.
    pub fn empty(keys: &[SearchKey]) -> Self {
        Self::build(Vec::new(), keys)
    }

    /// Builds a catalog, dropping `exclude` choices and deriving every lookup table.
    pub fn build(choices: Vec<Choice>, keys: &[SearchKey]) -> Self {
        let choices = prepare(choices);
        let has_group = choices.iter().any(|choice| choice.group.is_some());

        let mut shortcodes = AHashMap::new();
        let mut triggers = AHashMap::new();
        let mut keywords = AHashMap::new();
        let mut postfixes = IndexMap::new();

        for (position, choice) in choices.iter().enumerate() {
            if let Some(shortcode) = choice.shortcode.as_deref().filter(|s| !s.is_empty()) {
                shortcodes.insert(shortcode.to_lowercase(), position);
            }
            if let Some(keyword) = choice.keyword.as_deref().filter(|k| !k.is_empty()) {
                keywords.insert(keyword.to_lowercase(), position);
            }
            let trigger = choice
                .trigger
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .or_else(|| bracket_trigger(&choice.name));
            if let Some(trigger) = trigger {
                triggers.insert(trigger, position);
            }
            if let Some(postfix) = choice.pass.postfix() {
                postfixes.insert(postfix.to_lowercase(), position);
            }
        }

        let index = FuzzyIndex::build(&choices, keys);

        tracing::debug!(
            "Built catalog: {} choices, {} shortcodes, {} triggers, {} keywords, {} postfixes, grouped={}",
            choices.len(),
            shortcodes.len(),
            triggers.len(),
            keywords.len(),
            postfixes.len(),
            has_group
        );

        Self {
            choices,
            index,
            has_group,
            generated: false,
            shortcodes,
            triggers,
            keywords,
            postfixes,
        }
    }

    /// A catalog whose order was decided upstream: no registries, no index.
    pub fn generated(choices: Vec<Choice>, keys: &[SearchKey]) -> Self {
        let choices = prepare(choices);
        Self {
            has_group: choices.iter().any(|choice| choice.group.is_some()),
            index: FuzzyIndex::build(&[], keys),
            choices,
            generated: true,
            ..Self::default()
        }
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn index(&self) -> &FuzzyIndex {
        &self.index
    }

    pub fn keys(&self) -> &[SearchKey] {
        self.index.keys()
    }

    pub fn has_group(&self) -> bool {
        self.has_group
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn shortcode(&self, text: &str) -> Option<&Choice> {
        self.lookup(&self.shortcodes, text)
    }

    pub fn trigger(&self, text: &str) -> Option<&Choice> {
        self.lookup(&self.triggers, text)
    }

    pub fn keyword(&self, text: &str) -> Option<&Choice> {
        self.lookup(&self.keywords, text)
    }

    /// First registered postfix that `input` ends with, ignoring case, along
    /// with the text typed before it.
    pub fn postfix_match<'a>(&self, input: &'a str) -> Option<(&'a str, &Choice)> {
        self.postfixes.iter().find_map(|(postfix, &position)| {
            strip_suffix_ignore_case(input, postfix).map(|rest| (rest, &self.choices[position]))
        })
    }

    fn lookup(&self, table: &AHashMap<String, usize>, text: &str) -> Option<&Choice> {
        table
            .get(&text.to_lowercase())
            .map(|&position| &self.choices[position])
    }
}

/// Drops excluded choices and gives id-less choices a positional id.
fn prepare(choices: Vec<Choice>) -> Vec<Choice> {
    choices
        .into_iter()
        .filter(|choice| !choice.exclude)
        .enumerate()
        .map(|(position, mut choice)| {
            if choice.id.is_empty() {
                choice.id = format!("choice-{position}");
            }
            choice
        })
        .collect()
}

/// `text` without a trailing `suffix_lower`, matched char by char so the cut
/// lands on a boundary of `text` itself.
fn strip_suffix_ignore_case<'a>(text: &'a str, suffix_lower: &str) -> Option<&'a str> {
    let target: Vec<char> = suffix_lower.chars().rev().collect();
    let mut folded: Vec<char> = Vec::with_capacity(target.len());
    for (index, c) in text.char_indices().rev() {
        folded.extend(c.to_lowercase().collect::<Vec<_>>().into_iter().rev());
        match folded.len().cmp(&target.len()) {
            Ordering::Less if target.starts_with(&folded) => {}
            Ordering::Equal if folded == target => return Some(&text[..index]),
            _ => return None,
        }
    }
    None
}

/// Trigger declared inline in a name, e.g. `Open [o]` → `o`.
///
/// Uses the last `[` and the first `]` after it.
fn bracket_trigger(name: &str) -> Option<String> {
    let open = name.rfind('[')?;
    let rest = &name[open + 1..];
    let close = rest.find(']')?;
    Some(&rest[..close])
        .filter(|trigger| !trigger.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pass;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("Open [O]", Some("o"))]
    #[case("[a] Copy [Cb]", Some("cb"))]
    #[case("Empty []", None)]
    #[case("Unclosed [x", None)]
    #[case("Plain", None)]
    fn test_bracket_trigger(#[case] name: &str, #[case] expected: Option<&str>) {
        check!(bracket_trigger(name).as_deref() == expected);
    }

    #[test]
    fn empty_catalog_is_inert() {
        let catalog = Catalog::build(Vec::new(), &[SearchKey::Name]);
        check!(catalog.is_empty());
        check!(!catalog.has_group());
        check!(catalog.index().is_empty());
        check!(catalog.trigger("x").is_none());
    }

    #[test]
    fn excluded_choices_are_dropped_before_indexing() {
        let mut hidden = Choice::new("Hidden");
        hidden.exclude = true;
        hidden.shortcode = Some("h".to_string());
        let catalog = Catalog::build(vec![hidden, Choice::new("Shown")], &[SearchKey::Name]);
        check!(catalog.len() == 1);
        check!(catalog.shortcode("h").is_none());
        check!(catalog.index().len() == 1);
    }

    #[test]
    fn registries_are_case_insensitive() {
        let mut firefox = Choice::new("Firefox").with_value("firefox");
        firefox.shortcode = Some("FF".to_string());
        firefox.keyword = Some("Web".to_string());
        firefox.trigger = Some("Fx".to_string());
        let catalog = Catalog::build(vec![firefox], &[SearchKey::Name]);

        check!(catalog.shortcode("ff").map(|c| c.name.as_str()) == Some("Firefox"));
        check!(catalog.keyword("WEB").is_some());
        check!(catalog.trigger("fX").is_some());
    }

    #[test]
    fn explicit_trigger_wins_over_bracket_trigger() {
        let mut choice = Choice::new("Open [o]");
        choice.trigger = Some("op".to_string());
        let catalog = Catalog::build(vec![choice], &[SearchKey::Name]);
        check!(catalog.trigger("op").is_some());
        check!(catalog.trigger("o").is_none());
    }

    #[test]
    fn has_group_tracks_any_grouped_choice() {
        let catalog = Catalog::build(
            vec![Choice::new("a"), Choice::new("b").with_group("G")],
            &[SearchKey::Name],
        );
        check!(catalog.has_group());
    }

    #[test]
    fn only_string_pass_registers_postfix() {
        let mut translate = Choice::new("Translate");
        translate.pass = Pass::Postfix(" ?t ".to_string());
        let mut passthrough = Choice::new("Pass");
        passthrough.pass = Pass::Flag(true);
        let catalog = Catalog::build(vec![translate, passthrough], &[SearchKey::Name]);

        let (remainder, choice) = catalog.postfix_match("hello ?T").unwrap();
        check!(remainder == "hello ");
        check!(choice.name == "Translate");
        check!(catalog.postfix_match("hello").is_none());
    }

    #[rstest]
    #[case("İx?t", "?t", Some("İx"))]
    #[case("?T", "?t", Some(""))]
    #[case("t", "?t", None)]
    #[case("xİ", "i", None)]
    #[case("xİ", "i\u{307}", Some("x"))]
    fn test_strip_suffix_ignore_case(
        #[case] text: &str,
        #[case] suffix: &str,
        #[case] expected: Option<&str>,
    ) {
        check!(strip_suffix_ignore_case(text, suffix) == expected);
    }

    #[test]
    fn missing_ids_get_positional_ids() {
        let choices: Vec<Choice> = serde_json::from_str(r#"[{"name":"a"},{"name":"b"}]"#).unwrap();
        let catalog = Catalog::build(choices, &[SearchKey::Name]);
        let ids: Vec<&str> = catalog.choices().iter().map(|c| c.id.as_str()).collect();
        check!(ids == vec!["choice-0", "choice-1"]);
    }

    #[test]
    fn generated_catalog_skips_registries() {
        let mut choice = Choice::new("Gen");
        choice.shortcode = Some("g".to_string());
        let catalog = Catalog::generated(vec![choice], &[SearchKey::Name]);
        check!(catalog.is_generated());
        check!(catalog.len() == 1);
        check!(catalog.shortcode("g").is_none());
        check!(catalog.index().is_empty());
    }
}
