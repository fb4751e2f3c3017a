//! Shared builders for integration tests.
//!
//! Choices are built in code rather than loaded from fixtures so each test
//! states exactly the working set it depends on.

use choice_engine::{
    Catalog, Choice, Engine, EngineConfig, Event, ReplaceOptions, ScoredChoice, SearchKey,
    SessionId,
};
use rstest::fixture;
use tokio::sync::mpsc::UnboundedReceiver;

/// A plain ungrouped choice whose id and value are its name.
#[allow(dead_code)] // Helpers used across different integration test crates
pub fn choice(name: &str) -> Choice {
    Choice::new(name).with_value(name)
}

#[allow(dead_code)]
pub fn grouped(name: &str, group: &str) -> Choice {
    choice(name).with_group(group)
}

/// A non-selectable group header.
#[allow(dead_code)]
pub fn header(group: &str) -> Choice {
    let mut header = Choice::new(group).with_group(group);
    header.id = format!("header-{group}");
    header.skip = true;
    header
}

#[allow(dead_code)]
pub fn catalog(choices: Vec<Choice>) -> Catalog {
    Catalog::build(choices, &[SearchKey::Name])
}

#[allow(dead_code)]
pub fn names(results: &[ScoredChoice]) -> Vec<&str> {
    results.iter().map(|r| r.item.name.as_str()).collect()
}

/// An engine with default config and its event receiver.
#[allow(dead_code)]
pub struct TestEngine {
    pub engine: Engine,
    pub events: UnboundedReceiver<Event>,
    pub session: SessionId,
}

#[allow(dead_code)]
impl TestEngine {
    pub fn with_config(config: EngineConfig) -> Self {
        let (engine, events) = Engine::new(config);
        Self {
            engine,
            events,
            session: SessionId::new("test"),
        }
    }

    /// Replaces the main list without running the initial ranking pass.
    pub fn load(&mut self, choices: Vec<Choice>) {
        self.engine.replace_choices(
            &self.session,
            choices,
            ReplaceOptions {
                skip_initial_search: true,
                ..ReplaceOptions::default()
            },
        );
    }

    /// Types each input in turn on the main list.
    pub fn type_all(&mut self, inputs: &[&str]) {
        for input in inputs {
            self.engine
                .classify_and_maybe_rank(&self.session, input)
                .expect("session exists");
        }
    }

    /// Every event emitted so far.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Names from the most recent `Ranked` event, if any.
    pub fn last_ranked(&mut self) -> Option<Vec<String>> {
        self.drain().into_iter().rev().find_map(|event| match event {
            Event::Ranked { choices, .. } => {
                Some(choices.into_iter().map(|c| c.item.name).collect())
            }
            _ => None,
        })
    }
}

#[fixture]
#[allow(dead_code)]
pub fn test_engine() -> TestEngine {
    TestEngine::with_config(EngineConfig::default())
}
