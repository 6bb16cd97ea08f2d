//! Turns a message into reply text.
//!
//! Built-in intercepts first, then the provider chain, then the local
//! responder. [`FallbackOrchestrator::respond`] cannot fail.

use std::sync::Arc;

use chatrelay_core::message::HistoryEntry;
use chatrelay_core::provider::GenerateRequest;
use chatrelay_core::random::RandomSource;
use chatrelay_providers::FallbackChain;
use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::gate::strip_command_prefix;
use crate::local::LocalResponder;

pub const JOKES: [&str; 5] = [
    "Why don't scientists trust atoms? Because they make up everything! 😄",
    "I told my computer a joke about UDP... I'm not sure if it got it! 💻😂",
    "Why do programmers prefer dark mode? Because light attracts bugs! 🐛💡",
    "What's a computer's favorite snack? Microchips! 🍪💻",
    "Why did the AI break up with the database? There were too many relationship issues! 💔📊",
];

/// A reply the orchestrator produces without asking any provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intercept {
    Help,
    Time,
    Date,
    Joke,
}

impl Intercept {
    /// Match an already prefix-stripped message.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower == "/help" || lower == "help" {
            Some(Self::Help)
        } else if lower == "/time" || lower.contains("what time") {
            Some(Self::Time)
        } else if lower == "/date" || lower.contains("what date") {
            Some(Self::Date)
        } else if lower.contains("joke") || lower.contains("funny") {
            Some(Self::Joke)
        } else {
            None
        }
    }
}

/// Which path produced a reply. Surfaced in logs and by `chatrelay ask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Intercept(Intercept),
    Provider(String),
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

pub struct FallbackOrchestrator {
    chain: FallbackChain,
    local: LocalResponder,
    random: Arc<dyn RandomSource>,
}

impl FallbackOrchestrator {
    pub fn new(chain: FallbackChain, random: Arc<dyn RandomSource>) -> Self {
        Self {
            chain,
            local: LocalResponder::new(random.clone()),
            random,
        }
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Reply text for `text` from `sender`. Never empty.
    pub async fn respond(&self, text: &str, sender: &str, history: &[HistoryEntry]) -> String {
        self.reply(text, sender, history).await.text
    }

    /// Like [`respond`](Self::respond), but also reports where the text came from.
    pub async fn reply(&self, text: &str, sender: &str, history: &[HistoryEntry]) -> Reply {
        let text = strip_command_prefix(text);

        if let Some(intercept) = Intercept::detect(text) {
            debug!(?intercept, "Answering from intercept");
            return Reply {
                text: self.intercept(intercept, text, sender, Local::now()),
                source: ReplySource::Intercept(intercept),
            };
        }

        if !text.is_empty() {
            let request = GenerateRequest::new(text, sender).with_history(history.to_vec());
            if let Ok(reply) = self.chain.generate(request).await {
                info!(provider = %reply.provider, "Provider responded");
                return Reply {
                    text: reply.text,
                    source: ReplySource::Provider(reply.provider),
                };
            }
        }

        info!("Using local responder");
        Reply {
            text: self.local.local_response(text, sender),
            source: ReplySource::Local,
        }
    }

    fn intercept(&self, intercept: Intercept, text: &str, sender: &str, now: DateTime<Local>) -> String {
        match intercept {
            Intercept::Help => self.local.local_response(text, sender),
            Intercept::Time => format!("🕐 Current time: {}, {sender}!", now.format("%-I:%M:%S %p")),
            Intercept::Date => format!("📅 Today's date: {}, {sender}!", now.format("%-m/%-d/%Y")),
            Intercept::Joke => JOKES[self.random.index(JOKES.len())].to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatrelay_core::error::ProviderError;
    use chatrelay_core::provider::Provider;
    use chatrelay_core::random::{FixedRandom, SeededRandom};
    use chrono::TimeZone;
    use std::sync::Mutex;

    use crate::local::ResponseCategory;

    struct CountingProvider {
        available: bool,
        reply: Result<&'static str, ProviderError>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl CountingProvider {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                available: true,
                reply: Ok(text),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                available: true,
                reply: Err(ProviderError::Network("down".into())),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                available: false,
                reply: Ok("unreachable"),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map(String::from)
        }
    }

    fn orchestrator(chain: FallbackChain) -> FallbackOrchestrator {
        FallbackOrchestrator::new(chain, Arc::new(FixedRandom(0.0)))
    }

    #[test]
    fn intercept_detection() {
        assert_eq!(Intercept::detect("help"), Some(Intercept::Help));
        assert_eq!(Intercept::detect("/HELP"), Some(Intercept::Help));
        assert_eq!(Intercept::detect("help me please"), None);
        assert_eq!(Intercept::detect("what time is it"), Some(Intercept::Time));
        assert_eq!(Intercept::detect("/time"), Some(Intercept::Time));
        assert_eq!(Intercept::detect("what date is today"), Some(Intercept::Date));
        assert_eq!(Intercept::detect("tell me a JOKE"), Some(Intercept::Joke));
        assert_eq!(Intercept::detect("that was funny"), Some(Intercept::Joke));
        assert_eq!(Intercept::detect("what is rust"), None);
    }

    #[test]
    fn time_and_date_formats() {
        let o = orchestrator(FallbackChain::new());
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            o.intercept(Intercept::Time, "/time", "Bob", now),
            "🕐 Current time: 2:07:09 PM, Bob!"
        );
        assert_eq!(
            o.intercept(Intercept::Date, "/date", "Bob", now),
            "📅 Today's date: 3/5/2024, Bob!"
        );
    }

    #[tokio::test]
    async fn what_time_never_reaches_providers() {
        let p = CountingProvider::ok("from provider");
        let o = orchestrator(FallbackChain::new().add_default(p.clone()));

        let reply = o.reply("what time is it", "Bob", &[]).await;
        assert!(reply.text.starts_with("🕐 Current time: "));
        assert!(reply.text.ends_with(", Bob!"));
        assert_eq!(reply.source, ReplySource::Intercept(Intercept::Time));
        assert_eq!(p.calls(), 0);
    }

    #[tokio::test]
    async fn jokes_come_from_the_fixed_list() {
        let o = FallbackOrchestrator::new(FallbackChain::new(), Arc::new(SeededRandom::new(3)));
        for _ in 0..10 {
            let text = o.respond("say something funny", "A", &[]).await;
            assert!(JOKES.contains(&text.as_str()));
        }
    }

    #[tokio::test]
    async fn prefix_is_stripped_before_intercepts_and_chain() {
        let p = CountingProvider::ok("sure");
        let o = orchestrator(FallbackChain::new().add_default(p.clone()));

        let reply = o.reply("/ai help", "A", &[]).await;
        assert_eq!(reply.source, ReplySource::Intercept(Intercept::Help));

        let reply = o.reply("@AI   explain lifetimes", "A", &[]).await;
        assert_eq!(reply.text, "sure");
        assert_eq!(p.seen.lock().unwrap()[0].text, "explain lifetimes");
    }

    #[tokio::test]
    async fn provider_gets_sender_and_history() {
        let p = CountingProvider::ok("answer");
        let o = orchestrator(FallbackChain::new().add_default(p.clone()));
        let history = vec![HistoryEntry::user("earlier", "Alice")];

        let reply = o.reply("what is ownership", "Alice", &history).await;
        assert_eq!(reply.source, ReplySource::Provider("counting".into()));

        let seen = p.seen.lock().unwrap();
        assert_eq!(seen[0].sender, "Alice");
        assert_eq!(seen[0].history, history);
    }

    #[tokio::test]
    async fn no_providers_means_local_with_zero_calls() {
        let a = CountingProvider::unavailable();
        let b = CountingProvider::unavailable();
        let o = orchestrator(FallbackChain::new().add_default(a.clone()).add_default(b.clone()));

        let reply = o.reply("hi", "Alice", &[]).await;
        assert_eq!(reply.source, ReplySource::Local);
        assert!(ResponseCategory::Greeting.templates("Alice").contains(&reply.text));
        assert_eq!(a.calls() + b.calls(), 0);
    }

    #[tokio::test]
    async fn all_failing_falls_back_to_local() {
        let a = CountingProvider::failing();
        let b = CountingProvider::failing();
        let o = orchestrator(FallbackChain::new().add_default(a.clone()).add_default(b.clone()));

        let reply = o.reply("why is the sky blue?", "Al", &[]).await;
        assert_eq!(reply.source, ReplySource::Local);
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn respond_is_never_empty() {
        let o = orchestrator(FallbackChain::new().add_default(CountingProvider::failing()));
        for text in ["", "/ai ", "ok", "?", "hello", "help", "what date", "💥"] {
            assert!(!o.respond(text, "A", &[]).await.trim().is_empty(), "{text:?}");
        }
    }
}
