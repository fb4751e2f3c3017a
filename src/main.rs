use anyhow::Context;
use choice_engine::cli::{Cli, Commands};
use choice_engine::{
    Catalog, Engine, EngineConfig, Event, ListKind, ReplaceOptions, SessionId, rank,
};
use clap::Parser;
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    choice_engine::tracing::init(cli.log_format);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Rank { choices, query } => {
            let choices = serde_json::from_str(&read(&choices)?)
                .with_context(|| format!("Invalid choice list in {}", choices.display()))?;
            let catalog = Catalog::build(choices, &config.keys);
            let ranked = rank(&catalog, &query);
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
        Commands::Replay {
            choices,
            actions,
            list,
            command_chars,
            inputs,
        } => {
            let delay = config.debounce_delay();
            let (mut engine, mut events) = Engine::new(config);
            let session = SessionId::new("replay");
            let list = ListKind::from(list);

            engine.replace_choices_json(&session, &read(&choices)?, ReplaceOptions::default())?;
            if let Some(actions) = actions {
                engine.set_action_choices_json(&session, &read(&actions)?)?;
            }
            if let Some(chars) = command_chars {
                engine.set_command_chars(&session, list, chars.chars())?;
            }
            drain(&mut events)?;

            for input in &inputs {
                tracing::info!("Input: {:?}", input);
                engine.classify_list(&session, list, input)?;
                drain(&mut events)?;
            }

            let pending = engine
                .session(&session)
                .is_some_and(|s| s.scope(list).has_pending_ranking());
            if pending {
                tokio::time::sleep(delay * 2).await;
                drain(&mut events)?;
            }
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn drain(events: &mut UnboundedReceiver<Event>) -> anyhow::Result<()> {
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
