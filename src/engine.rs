//! The engine front door: session registry and outgoing event stream.
//!
//! Collaborators push choice lists and raw keystrokes in; the engine answers
//! with [`Event`]s on an unbounded channel. Calls are expected to be
//! serialized by the caller (one event loop); debounced ranking passes run on
//! the tokio runtime and report back through the same channel.

use crate::classify::Outcome;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::registry::ReplaceOptions;
use crate::session::Session;
use crate::types::{Choice, FlagsSpec, ListKind, ScoredChoice, SessionId};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Notifications emitted to the renderer/transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// A ranking pass completed.
    Ranked {
        session: SessionId,
        list: ListKind,
        choices: Vec<ScoredChoice>,
    },
    /// A fast path resolved a value; no ranking follows for this keystroke.
    Resolve {
        session: SessionId,
        list: ListKind,
        value: Value,
        choice: Choice,
    },
    /// Keyword scope was entered (`choice` set) or left (`choice` empty).
    KeywordScopeChanged {
        session: SessionId,
        list: ListKind,
        keyword: String,
        choice: Option<Choice>,
    },
    /// A matched choice requires more structured input before resolving.
    NeedsMoreInput {
        session: SessionId,
        list: ListKind,
        choice: Choice,
    },
}

impl Event {
    pub fn session(&self) -> &SessionId {
        match self {
            Self::Ranked { session, .. }
            | Self::Resolve { session, .. }
            | Self::KeywordScopeChanged { session, .. }
            | Self::NeedsMoreInput { session, .. } => session,
        }
    }
}

/// Owns every live session.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    sessions: HashMap<SessionId, Session>,
    events: UnboundedSender<Event>,
}

impl Engine {
    /// Creates an engine and the receiving end of its event stream.
    pub fn new(config: EngineConfig) -> (Self, UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            config,
            sessions: HashMap::new(),
            events,
        };
        (engine, rx)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Replaces the main choice list, creating the session on first use.
    pub fn replace_choices(&mut self, id: &SessionId, choices: Vec<Choice>, options: ReplaceOptions) {
        self.session_or_create(id)
            .scope_mut(ListKind::Main)
            .replace_choices(choices, options);
    }

    /// Like [`replace_choices`](Self::replace_choices) for a JSON array of choices.
    pub fn replace_choices_json(
        &mut self,
        id: &SessionId,
        json: &str,
        options: ReplaceOptions,
    ) -> Result<(), EngineError> {
        let choices: Vec<Choice> = serde_json::from_str(json).map_err(EngineError::InvalidChoices)?;
        self.replace_choices(id, choices, options);
        Ok(())
    }

    /// Builds the actions list from a flags description; each entry becomes a
    /// choice keyed by its map key.
    pub fn set_action_choices(&mut self, id: &SessionId, flags: &FlagsSpec) {
        let choices = flags
            .iter()
            .map(|(key, flag)| flag.to_choice(key))
            .collect();
        self.session_or_create(id)
            .scope_mut(ListKind::Actions)
            .replace_choices(choices, ReplaceOptions::default());
    }

    pub fn set_action_choices_json(&mut self, id: &SessionId, json: &str) -> Result<(), EngineError> {
        let flags: FlagsSpec = serde_json::from_str(json).map_err(EngineError::InvalidFlags)?;
        self.set_action_choices(id, &flags);
        Ok(())
    }

    /// Classifies a keystroke on the main list and ranks if it proceeds.
    pub fn classify_and_maybe_rank(
        &mut self,
        id: &SessionId,
        raw: &str,
    ) -> Result<Outcome, EngineError> {
        self.classify_list(id, ListKind::Main, raw)
    }

    /// Classifies a keystroke on the given list and ranks if it proceeds.
    pub fn classify_list(
        &mut self,
        id: &SessionId,
        list: ListKind,
        raw: &str,
    ) -> Result<Outcome, EngineError> {
        Ok(self.session_mut(id)?.scope_mut(list).classify_and_maybe_rank(raw))
    }

    pub fn set_command_chars(
        &mut self,
        id: &SessionId,
        list: ListKind,
        chars: impl IntoIterator<Item = char>,
    ) -> Result<(), EngineError> {
        self.session_mut(id)?
            .scope_mut(list)
            .state_mut()
            .set_command_chars(chars);
        Ok(())
    }

    pub fn set_input_regex(
        &mut self,
        id: &SessionId,
        list: ListKind,
        pattern: Option<&str>,
    ) -> Result<(), EngineError> {
        self.session_mut(id)?
            .scope_mut(list)
            .state_mut()
            .set_input_regex(pattern);
        Ok(())
    }

    pub fn set_ready(&mut self, id: &SessionId, ready: bool) -> Result<(), EngineError> {
        let session = self.session_mut(id)?;
        for list in [ListKind::Main, ListKind::Actions] {
            session.scope_mut(list).state_mut().set_ready(ready);
        }
        Ok(())
    }

    /// Discards a session; pending ranking passes are cancelled.
    pub fn end_session(&mut self, id: &SessionId) -> bool {
        let ended = self.sessions.remove(id).is_some();
        if ended {
            tracing::info!("Ended session '{}'", id);
        }
        ended
    }

    fn session_mut(&mut self, id: &SessionId) -> Result<&mut Session, EngineError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownSession(id.clone()))
    }

    fn session_or_create(&mut self, id: &SessionId) -> &mut Session {
        let Self {
            config,
            sessions,
            events,
        } = self;
        sessions.entry(id.clone()).or_insert_with(|| {
            tracing::info!("Created session '{}'", id);
            Session::new(config, events, id)
        })
    }
}
