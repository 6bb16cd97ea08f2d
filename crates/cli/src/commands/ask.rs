//! `chatrelay ask` — One pass through gate and orchestrator.

use std::sync::Arc;

use chatrelay_agent::{FallbackOrchestrator, Reply, ReplySource, ResponseGate};
use chatrelay_config::AppConfig;
use chatrelay_core::random::{RandomSource, SeededRandom, ThreadRandom};
use chatrelay_providers::FallbackChain;

pub async fn run(
    message: String,
    sender: String,
    force: bool,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let random: Arc<dyn RandomSource> = match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };
    let chain = chatrelay_providers::build_from_config(&config);

    match answer(&config, chain, random, &message, &sender, force).await {
        Some(reply) => {
            println!("{}: {}", config.assistant.name, reply.text);
            println!("   (via {})", describe(&reply.source));
        }
        None => println!("({} stays quiet; pass --force to answer anyway)", config.assistant.name),
    }

    Ok(())
}

/// `None` when the gate declines and `force` is off.
pub async fn answer(
    config: &AppConfig,
    chain: FallbackChain,
    random: Arc<dyn RandomSource>,
    message: &str,
    sender: &str,
    force: bool,
) -> Option<Reply> {
    let gate = ResponseGate::new(random.clone(), config.assistant.idle_chatter_probability);
    if !force && !gate.should_respond(message, sender) {
        return None;
    }

    let orchestrator = FallbackOrchestrator::new(chain, random);
    Some(orchestrator.reply(message, sender, &[]).await)
}

fn describe(source: &ReplySource) -> String {
    match source {
        ReplySource::Intercept(intercept) => format!("built-in {intercept:?}").to_lowercase(),
        ReplySource::Provider(name) => name.clone(),
        ReplySource::Local => "local responder".into(),
    }
}
