//! Core data model: choices, scored results, and session identifiers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an independent search session (one prompt).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Which of a session's two independent choice lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// The primary choice list.
    Main,
    /// The secondary actions/flags list.
    Actions,
}

/// The `pass` flag: either a plain boolean or a postfix trigger string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pass {
    Flag(bool),
    Postfix(String),
}

impl Default for Pass {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl Pass {
    /// Whether the choice passes input through (`true` or any non-empty postfix).
    pub fn is_set(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Postfix(postfix) => !postfix.is_empty(),
        }
    }

    /// The trimmed postfix trigger, if this is a non-blank string.
    pub fn postfix(&self) -> Option<&str> {
        match self {
            Self::Postfix(postfix) => Some(postfix.trim()).filter(|p| !p.is_empty()),
            Self::Flag(_) => None,
        }
    }
}

/// One selectable item in a session's working set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Choice {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the environment the choice originates from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kenv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    pub pass: Pass,
    pub miss: bool,
    pub skip: bool,
    pub hide_without_input: bool,
    pub info: bool,
    pub last_group: bool,
    pub exclude: bool,
    /// Set on clones placed in the "Exact Match" block.
    pub exact: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Names of follow-up inputs required before the choice can resolve.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// Text typed before a postfix trigger, recorded when the postfix fires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postfix: Option<String>,
}

impl Choice {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// The value emitted when this choice resolves; falls back to the name.
    pub fn resolved_value(&self) -> Value {
        if self.value.is_null() {
            Value::String(self.name.clone())
        } else {
            self.value.clone()
        }
    }

    /// A non-selectable header row for `group`.
    pub(crate) fn header(group: &str) -> Self {
        Self {
            id: format!("header:{group}"),
            name: group.to_string(),
            group: Some(group.to_string()),
            skip: true,
            ..Self::default()
        }
    }
}

/// Text fields of a [`Choice`] that the fuzzy index can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKey {
    Name,
    Description,
    Group,
    Kenv,
    Tag,
    Keyword,
    Alias,
}

impl SearchKey {
    pub fn text(self, choice: &Choice) -> Option<&str> {
        match self {
            Self::Name => Some(choice.name.as_str()),
            Self::Description => choice.description.as_deref(),
            Self::Group => choice.group.as_deref(),
            Self::Kenv => choice.kenv.as_deref(),
            Self::Tag => choice.tag.as_deref(),
            Self::Keyword => choice.keyword.as_deref(),
            Self::Alias => choice.alias.as_deref(),
        }
        .filter(|text| !text.is_empty())
    }
}

/// Half-open `[start, end)` character range of a highlighted match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A choice with its relevance score and highlight spans per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChoice {
    pub item: Choice,
    pub score: u32,
    pub matches: BTreeMap<SearchKey, Vec<MatchSpan>>,
}

impl ScoredChoice {
    /// Wraps a choice with the neutral score used for unranked entries.
    pub fn unscored(item: Choice) -> Self {
        Self {
            item,
            score: 1,
            matches: BTreeMap::new(),
        }
    }

    pub fn with_span(mut self, key: SearchKey, span: MatchSpan) -> Self {
        self.matches.insert(key, vec![span]);
        self
    }
}

/// One entry of an action-flags description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlagSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    pub shortcut: Option<String>,
    pub group: Option<String>,
    pub hide_without_input: bool,
}

/// Map-like flags description; insertion order is the display order.
pub type FlagsSpec = indexmap::IndexMap<String, FlagSpec>;

impl FlagSpec {
    /// Builds the synthetic choice for the flag stored under `key`.
    pub fn to_choice(&self, key: &str) -> Choice {
        Choice {
            id: key.to_string(),
            name: self.name.clone().unwrap_or_else(|| key.to_string()),
            value: Value::String(key.to_string()),
            description: self.description.clone(),
            group: self.group.clone(),
            tag: self.shortcut.clone(),
            hide_without_input: self.hide_without_input,
            ..Choice::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"name":"a","pass":true}"#, true, None)]
    #[case(r#"{"name":"a","pass":false}"#, false, None)]
    #[case(r#"{"name":"a","pass":" !! "}"#, true, Some("!!"))]
    #[case(r#"{"name":"a"}"#, false, None)]
    fn pass_deserializes_bool_or_postfix(
        #[case] json: &str,
        #[case] is_set: bool,
        #[case] postfix: Option<&str>,
    ) {
        let choice: Choice = serde_json::from_str(json).unwrap();
        check!(choice.pass.is_set() == is_set);
        check!(choice.pass.postfix() == postfix);
    }

    #[test]
    fn camel_case_flags_deserialize() {
        let choice: Choice =
            serde_json::from_str(r#"{"name":"x","hideWithoutInput":true,"lastGroup":true}"#)
                .unwrap();
        check!(choice.hide_without_input);
        check!(choice.last_group);
        check!(!choice.miss);
    }

    #[test]
    fn resolved_value_falls_back_to_name() {
        check!(Choice::new("Safari").resolved_value() == Value::from("Safari"));
        check!(
            Choice::new("Safari").with_value("com.apple.Safari").resolved_value()
                == Value::from("com.apple.Safari")
        );
    }

    #[test]
    fn flag_spec_uses_key_when_unnamed() {
        let choice = FlagSpec::default().to_choice("open");
        check!(choice.name == "open");
        check!(choice.id == "open");
        check!(choice.value == Value::from("open"));
    }
}
