//! Offline responder: keyword classification plus canned templates.
//!
//! This is the terminal fallback of the orchestrator, so it must always
//! produce non-empty text and must never touch the network.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chatrelay_core::random::RandomSource;
use regex::Regex;

use crate::gate::GREETING;

static PROGRAMMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:code|coding|program|javascript|python|html|css|web|software|app)\b")
        .expect("static regex")
});

static TECHNOLOGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:technology|tech|computer|ai|machine learning|data|cloud|server)\b")
        .expect("static regex")
});

static BUSINESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:business|marketing|sales|strategy|startup|company|money|investment)\b")
        .expect("static regex")
});

static SCIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:science|research|biology|chemistry|physics|study|experiment)\b")
        .expect("static regex")
});

static QUESTION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:what|how|why|when|where|who)\b").expect("static regex"));

/// Topic bucket a message falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCategory {
    Greeting,
    Technology,
    Programming,
    Business,
    Science,
    General,
    Help,
    Unknown,
}

impl ResponseCategory {
    /// Classify `text`. The first matching rule wins.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();

        if GREETING.is_match(&lower) {
            Self::Greeting
        } else if lower.contains("help") || lower.contains("commands") {
            Self::Help
        } else if PROGRAMMING.is_match(&lower) {
            Self::Programming
        } else if TECHNOLOGY.is_match(&lower) {
            Self::Technology
        } else if BUSINESS.is_match(&lower) {
            Self::Business
        } else if SCIENCE.is_match(&lower) {
            Self::Science
        } else if !lower.contains('?') && !QUESTION_WORD.is_match(&lower) {
            Self::Unknown
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Technology => "technology",
            Self::Programming => "programming",
            Self::Business => "business",
            Self::Science => "science",
            Self::General => "general",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }

    /// Every reply this category can produce for `sender`.
    pub fn templates(&self, sender: &str) -> Vec<String> {
        match self {
            Self::Greeting => vec![
                format!("Hello {sender}! 👋 How can I help you today?"),
                format!("Hi there {sender}! I'm here to answer your questions! 🤖"),
                format!("Greetings {sender}! What would you like to know? 😊"),
                format!("Hey {sender}! I'm your AI assistant, ready to help! 🚀"),
            ],
            Self::Technology => fixed(&[
                "That's a great tech question! 💻 Based on current trends, I'd suggest...",
                "Interesting technology topic! 🔧 Here's what I think...",
                "Great question about tech! ⚡ Let me share some insights...",
                "Technology is fascinating! 🌟 Here's my perspective...",
            ]),
            Self::Programming => fixed(&[
                "Nice programming question! 👨‍💻 Here's how I'd approach it...",
                "Coding question detected! 🐍 Let me help you with that...",
                "Programming is fun! 💡 Here's what you might try...",
                "Good coding question! 🎯 Consider this approach...",
            ]),
            Self::Business => fixed(&[
                "That's a solid business question! 📈 From my perspective...",
                "Business strategy is important! 💼 Here's what I'd recommend...",
                "Great business inquiry! 🎯 Consider these factors...",
                "Business-wise, I think... 📊",
            ]),
            Self::Science => fixed(&[
                "Fascinating scientific question! 🔬 Based on current research...",
                "Science is amazing! 🧪 Here's what we know...",
                "Great scientific inquiry! 🌌 The current understanding is...",
                "Love the science question! ⚗️ Here's the scoop...",
            ]),
            Self::General => vec![
                format!("That's an interesting question, {sender}! 🤔 Let me think..."),
                format!("Great point, {sender}! 💭 Here's my perspective..."),
                format!("Thanks for asking, {sender}! 🙏 I'd say..."),
                format!("Excellent question, {sender}! 🌟 My thoughts are..."),
            ],
            Self::Help => vec![format!(
                "I can help with various topics, {sender}! 🆘 Try asking about:\n\
                 • Technology & Programming 💻\n\
                 • Science & Research 🔬\n\
                 • Business & Strategy 📈\n\
                 • General knowledge 🧠\n\
                 • Current events 📰\n\
                 • Or just chat with me! 💬"
            )],
            Self::Unknown => vec![
                format!("Hmm, that's a tricky one, {sender}! 🤷‍♂️ Could you elaborate?"),
                format!(
                    "I'm not sure about that specific topic, {sender}. Can you provide more context? 🤔"
                ),
                format!("That's outside my current knowledge, {sender}. Can you ask it differently? 💭"),
                format!(
                    "Interesting question, {sender}! I'd need more details to give a good answer. 🔍"
                ),
            ],
        }
    }
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fixed(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

/// Picks a canned reply for a message.
pub struct LocalResponder {
    random: Arc<dyn RandomSource>,
}

impl LocalResponder {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Classify `text` and return one of that category's templates.
    pub fn local_response(&self, text: &str, sender: &str) -> String {
        let mut templates = ResponseCategory::classify(text).templates(sender);
        let i = self.random.index(templates.len());
        templates.swap_remove(i)
    }
}
