//! Per-keystroke fast-path classification.
//!
//! [`SearchState::classify`] runs before ranking on every keystroke. It either
//! resolves the keystroke directly (triggers, postfixes, shortcodes), manages
//! keyword scoping, holds input behind command characters, or hands an
//! effective query on to the ranking engine.
//!
//! Rules are evaluated in a fixed order and the first one that applies wins:
//!
//! 1. both previous and current input empty → rank
//! 2. command-character hold
//! 3. effective input via the active input regex
//! 4. trigger
//! 5. postfix
//! 6. keyword scope exit
//! 7. shortcode, then keyword scope entry
//! 8. one-shot suppression after a scope exit
//! 9. rank

use crate::registry::Catalog;
use crate::types::Choice;
use ahash::AHashSet;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::sync::Arc;

/// A choice resolved without ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Value,
    pub choice: Choice,
}

/// Result of classifying one keystroke.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Ranking should run against this effective query.
    Rank(String),
    /// Input was stored but is held back by command-character gating.
    Held,
    /// A fast path resolved the keystroke.
    Resolve(Resolution),
    /// A fast path matched a choice that still needs follow-up input.
    NeedsMoreInput(Choice),
    /// Keyword scope was entered.
    KeywordEntered { keyword: String, choice: Choice },
    /// Keyword scope ended.
    KeywordExited,
    /// The keystroke after a scope exit is swallowed once.
    Suppressed,
}

impl Outcome {
    /// Whether ranking should follow.
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Rank(_))
    }
}

/// Mutable classification state of one search scope.
#[derive(Debug, Clone)]
pub struct SearchState {
    catalog: Arc<Catalog>,
    input: String,
    keyword: String,
    input_regex: Option<Regex>,
    keyword_cleared: bool,
    command_chars: AHashSet<char>,
    ready: bool,
}

impl SearchState {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            input: String::new(),
            keyword: String::new(),
            input_regex: None,
            keyword_cleared: false,
            command_chars: AHashSet::new(),
            ready: true,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Swaps in a freshly built catalog. Scope state is kept.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
    }

    /// The last effective (post-classification) input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The active keyword, empty when not scoped.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn keyword_cleared(&self) -> bool {
        self.keyword_cleared
    }

    pub fn set_command_chars(&mut self, chars: impl IntoIterator<Item = char>) {
        self.command_chars = chars.into_iter().collect();
    }

    /// Gates the trigger and postfix fast paths.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Installs a case-insensitive input pattern. Malformed patterns leave no
    /// pattern active.
    pub fn set_input_regex(&mut self, pattern: Option<&str>) {
        self.input_regex = pattern.and_then(compile_input_regex);
    }

    pub fn has_input_regex(&self) -> bool {
        self.input_regex.is_some()
    }

    /// Applies the active input regex: the first capture group if the pattern
    /// has one, otherwise the whole match, or `""` when nothing matches.
    pub fn effective_input(&self, raw: &str) -> String {
        let Some(regex) = &self.input_regex else {
            return raw.to_string();
        };
        regex
            .captures(raw)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Classifies the full current text of the input field.
    pub fn classify(&mut self, raw: &str) -> Outcome {
        if self.input.is_empty() && raw.is_empty() {
            self.keyword_cleared = false;
            return Outcome::Rank(String::new());
        }

        if !self.command_chars.is_empty() && self.holds_for_command_chars(raw) {
            self.input = self.effective_input(raw);
            tracing::trace!("Holding '{}' until a command character boundary", raw);
            return Outcome::Held;
        }

        let effective = self.effective_input(raw);
        let effective_lower = effective.to_lowercase();

        if self.ready
            && let Some(choice) = self.catalog.trigger(&effective_lower)
        {
            tracing::debug!("Trigger '{}' matched '{}'", effective_lower, choice.name);
            return resolve(choice.clone());
        }

        if self.ready
            && let Some((remainder, choice)) = self.catalog.postfix_match(&effective)
        {
            let mut choice = choice.clone();
            choice.postfix = Some(remainder.to_string());
            tracing::debug!("Postfix matched '{}' after '{}'", choice.name, remainder);
            return resolve(choice);
        }

        if !self.keyword.is_empty() && !starts_with_ignore_case(raw, &format!("{} ", self.keyword))
        {
            tracing::debug!("Leaving keyword scope '{}'", self.keyword);
            self.keyword.clear();
            self.input_regex = None;
            self.keyword_cleared = true;
            return Outcome::KeywordExited;
        }

        if raw.contains(' ') {
            if raw.ends_with(' ')
                && let Some(choice) = self.catalog.shortcode(effective.trim_end())
            {
                tracing::debug!("Shortcode '{}' matched '{}'", effective.trim_end(), choice.name);
                return Outcome::Resolve(Resolution {
                    value: choice.resolved_value(),
                    choice: choice.clone(),
                });
            }

            if let Some(token) = raw.split_whitespace().next()
                && !token.eq_ignore_ascii_case(&self.keyword)
                && let Some(choice) = self.catalog.keyword(token)
            {
                let choice = choice.clone();
                self.enter_keyword(token);
                return Outcome::KeywordEntered {
                    keyword: token.to_string(),
                    choice,
                };
            }
        }

        if self.keyword_cleared {
            self.keyword_cleared = false;
            return Outcome::Suppressed;
        }

        self.input.clone_from(&effective);
        Outcome::Rank(effective)
    }

    /// Command-character gating: only vetoes, never resolves.
    fn holds_for_command_chars(&self, raw: &str) -> bool {
        if self.input.is_empty() {
            let preceding = raw.chars().rev().nth(1);
            if !preceding.is_some_and(|c| self.command_chars.contains(&c)) {
                return true;
            }
        }
        raw.chars()
            .next_back()
            .is_some_and(|c| self.command_chars.contains(&c))
    }

    fn enter_keyword(&mut self, token: &str) {
        tracing::debug!("Entering keyword scope '{}'", token);
        self.keyword = token.to_string();
        self.input_regex = compile_input_regex(&format!("^{} (.*)$", regex::escape(token)));
    }
}

fn resolve(choice: Choice) -> Outcome {
    if choice.inputs.is_empty() {
        Outcome::Resolve(Resolution {
            value: choice.resolved_value(),
            choice,
        })
    } else {
        Outcome::NeedsMoreInput(choice)
    }
}

fn compile_input_regex(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Ignoring malformed input pattern '{}': {}", pattern, e);
            None
        }
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.to_lowercase().starts_with(&prefix.to_lowercase())
}
