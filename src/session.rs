//! Sessions and their independently stateful search scopes.

use crate::classify::{Outcome, SearchState};
use crate::config::EngineConfig;
use crate::engine::Event;
use crate::registry::{Catalog, ReplaceOptions};
use crate::types::{Choice, ListKind, SearchKey, SessionId};
use crate::worker::{Debouncer, Invocation};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Sends events tagged with the scope they came from.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    tx: UnboundedSender<Event>,
    session: SessionId,
    list: ListKind,
}

impl Emitter {
    pub(crate) fn new(tx: UnboundedSender<Event>, session: SessionId, list: ListKind) -> Self {
        Self { tx, session, list }
    }

    pub(crate) fn send(&self, build: impl FnOnce(SessionId, ListKind) -> Event) {
        if self.tx.send(build(self.session.clone(), self.list)).is_err() {
            tracing::debug!("Event receiver for session '{}' dropped", self.session);
        }
    }
}

/// One choice list with its classification state and ranking debouncer.
#[derive(Debug)]
pub struct Scope {
    state: SearchState,
    debouncer: Debouncer,
    keys: Vec<SearchKey>,
    emitter: Emitter,
}

impl Scope {
    pub(crate) fn new(config: &EngineConfig, emitter: Emitter) -> Self {
        let mut state = SearchState::new(Arc::new(Catalog::empty(&config.keys)));
        state.set_command_chars(config.command_chars.iter().copied());
        Self {
            state,
            debouncer: Debouncer::new(config.debounce_threshold, config.debounce_delay()),
            keys: config.keys.clone(),
            emitter,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    pub fn has_pending_ranking(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Replaces the working set, rebuilding registries and index in one step,
    /// then runs the initial ranking pass unless asked not to.
    ///
    /// A debounced pass still pending against the old list is cancelled. When
    /// the initial pass is skipped, that pending pass is rescheduled against
    /// the new list so the last keystroke still gets its ranking.
    pub fn replace_choices(&mut self, choices: Vec<Choice>, options: ReplaceOptions) {
        let was_pending = self.debouncer.has_pending();
        self.debouncer.cancel();

        let catalog = if options.generated {
            Catalog::generated(choices, &self.keys)
        } else {
            Catalog::build(choices, &self.keys)
        };
        tracing::info!(
            "Session '{}' ({:?}): replaced choices with {} entries",
            self.emitter.session,
            self.emitter.list,
            catalog.len()
        );
        self.state.replace_catalog(Arc::new(catalog));

        if options.skip_initial_search {
            if was_pending {
                tracing::debug!("Rescheduling pending ranking against the new choices");
                self.run_ranking(self.state.input().to_string());
            }
            return;
        }
        let query = if options.preload {
            String::new()
        } else {
            self.state.input().to_string()
        };
        self.run_ranking(query);
    }

    /// Classifies `raw` and either emits the fast-path event or ranks.
    pub fn classify_and_maybe_rank(&mut self, raw: &str) -> Outcome {
        let outcome = self.state.classify(raw);
        tracing::debug!("Classified '{}' as {}", raw, outcome_label(&outcome));

        match &outcome {
            Outcome::Rank(query) => {
                self.run_ranking(query.clone());
            }
            Outcome::Resolve(resolution) => {
                let resolution = resolution.clone();
                self.emitter.send(|session, list| Event::Resolve {
                    session,
                    list,
                    value: resolution.value,
                    choice: resolution.choice,
                });
            }
            Outcome::NeedsMoreInput(choice) => {
                let choice = choice.clone();
                self.emitter
                    .send(|session, list| Event::NeedsMoreInput { session, list, choice });
            }
            Outcome::KeywordEntered { keyword, choice } => {
                let (keyword, choice) = (keyword.clone(), choice.clone());
                self.emitter.send(|session, list| Event::KeywordScopeChanged {
                    session,
                    list,
                    keyword,
                    choice: Some(choice),
                });
            }
            Outcome::KeywordExited => {
                self.emitter.send(|session, list| Event::KeywordScopeChanged {
                    session,
                    list,
                    keyword: String::new(),
                    choice: None,
                });
            }
            Outcome::Held | Outcome::Suppressed => {}
        }

        outcome
    }

    fn run_ranking(&mut self, query: String) -> Invocation {
        let emitter = self.emitter.clone();
        self.debouncer
            .invoke(Arc::clone(self.state.catalog()), query, move |choices| {
                emitter.send(|session, list| Event::Ranked {
                    session,
                    list,
                    choices,
                });
            })
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Rank(_) => "rank",
        Outcome::Held => "held",
        Outcome::Resolve(_) => "resolve",
        Outcome::NeedsMoreInput(_) => "needs-more-input",
        Outcome::KeywordEntered { .. } => "keyword-entered",
        Outcome::KeywordExited => "keyword-exited",
        Outcome::Suppressed => "suppressed",
    }
}

/// One prompt: the main choice list and the secondary actions list.
#[derive(Debug)]
pub struct Session {
    main: Scope,
    actions: Scope,
}

impl Session {
    pub(crate) fn new(config: &EngineConfig, tx: &UnboundedSender<Event>, id: &SessionId) -> Self {
        Self {
            main: Scope::new(config, Emitter::new(tx.clone(), id.clone(), ListKind::Main)),
            actions: Scope::new(config, Emitter::new(tx.clone(), id.clone(), ListKind::Actions)),
        }
    }

    pub fn scope(&self, list: ListKind) -> &Scope {
        match list {
            ListKind::Main => &self.main,
            ListKind::Actions => &self.actions,
        }
    }

    pub fn scope_mut(&mut self, list: ListKind) -> &mut Scope {
        match list {
            ListKind::Main => &mut self.main,
            ListKind::Actions => &mut self.actions,
        }
    }
}
