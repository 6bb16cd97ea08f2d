//! Decides whether the assistant speaks up for a given message.

use std::sync::{Arc, LazyLock};

use chatrelay_core::random::RandomSource;
use regex::Regex;

/// Prefixes that address the assistant directly.
pub const COMMAND_PREFIXES: [&str; 2] = ["/ai ", "@ai "];

/// Default chance of answering a message nobody addressed to the assistant.
pub const DEFAULT_IDLE_CHATTER_PROBABILITY: f64 = 0.05;

static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:what|how|why|when|where|who|can you|could you|would you|will you)\b")
        .expect("static regex")
});

pub(crate) static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:hi|hello|hey|greetings|good morning|good afternoon)\b").expect("static regex")
});

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:bot|ai|chatbot|assistant|help)\b").expect("static regex"));

/// The heuristic gate in front of every reply.
///
/// Deterministic except for the idle-chatter draw, which comes from the
/// injected [`RandomSource`].
pub struct ResponseGate {
    random: Arc<dyn RandomSource>,
    idle_chatter_probability: f64,
}

impl ResponseGate {
    pub fn new(random: Arc<dyn RandomSource>, idle_chatter_probability: f64) -> Self {
        Self {
            random,
            idle_chatter_probability,
        }
    }

    /// True when `text` is addressed to, asks, greets or mentions the
    /// assistant, or when the idle-chatter draw comes up.
    pub fn should_respond(&self, text: &str, _sender: &str) -> bool {
        let lower = text.to_lowercase();

        is_command(&lower)
            || lower.contains('?')
            || INTERROGATIVE.is_match(&lower)
            || GREETING.is_match(&lower)
            || MENTION.is_match(&lower)
            || self.random.unit() < self.idle_chatter_probability
    }
}

fn is_command(lower: &str) -> bool {
    COMMAND_PREFIXES.iter().any(|p| lower.starts_with(p)) || lower.starts_with("/help") || lower == "help"
}

/// Strip a leading `/ai ` or `@ai ` (any case) and trim what remains.
pub fn strip_command_prefix(text: &str) -> &str {
    for prefix in COMMAND_PREFIXES {
        if let Some(head) = text.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            return text[prefix.len()..].trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::random::FixedRandom;

    fn quiet() -> ResponseGate {
        ResponseGate::new(Arc::new(FixedRandom(0.99)), DEFAULT_IDLE_CHATTER_PROBABILITY)
    }

    #[test]
    fn question_mark_always_triggers() {
        let gate = quiet();
        assert!(gate.should_respond("lunch?", "Bob"));
        assert!(gate.should_respond("??", "Bob"));
    }

    #[test]
    fn greetings_trigger() {
        let gate = quiet();
        assert!(gate.should_respond("hi", "Alice"));
        assert!(gate.should_respond("Good Morning everyone", "Alice"));
    }

    #[test]
    fn commands_trigger() {
        let gate = quiet();
        assert!(gate.should_respond("/ai tell me more", "A"));
        assert!(gate.should_respond("@AI summarise", "A"));
        assert!(gate.should_respond("/helpme", "A"));
        assert!(gate.should_respond("HELP", "A"));
    }

    #[test]
    fn interrogatives_and_mentions_trigger() {
        let gate = quiet();
        assert!(gate.should_respond("tell me how it works", "A"));
        assert!(gate.should_respond("could you check this", "A"));
        assert!(gate.should_respond("the bot is slow", "A"));
    }

    #[test]
    fn word_boundaries_are_respected() {
        let gate = quiet();
        assert!(!gate.should_respond("aiming higher", "A"));
        assert!(!gate.should_respond("this is nice", "A"));
        assert!(!gate.should_respond("shipping robots", "A"));
    }

    #[test]
    fn idle_chatter_uses_random_source() {
        let chatty = ResponseGate::new(Arc::new(FixedRandom(0.01)), DEFAULT_IDLE_CHATTER_PROBABILITY);
        assert!(chatty.should_respond("ok", "A"));
        assert!(!quiet().should_respond("ok", "A"));
    }

    #[test]
    fn zero_probability_never_chatters() {
        let gate = ResponseGate::new(Arc::new(FixedRandom(0.0)), 0.0);
        assert!(!gate.should_respond("ok", "A"));
    }

    #[test]
    fn prefix_stripping() {
        assert_eq!(strip_command_prefix("/ai   what is rust "), "what is rust");
        assert_eq!(strip_command_prefix("@AI hello"), "hello");
        assert_eq!(strip_command_prefix("/aide"), "/aide");
        assert_eq!(strip_command_prefix("plain text"), "plain text");
        assert_eq!(strip_command_prefix("é"), "é");
    }
}
