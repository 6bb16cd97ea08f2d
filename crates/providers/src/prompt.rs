//! The persona every provider speaks with.

use chatrelay_core::message::{HistoryEntry, Role};

/// System prompt: who the assistant is and how it should answer `sender`.
pub fn persona(assistant_name: &str, sender: &str) -> String {
    format!(
        "You are {assistant_name}, a helpful AI assistant in a real-time chat room.\n\
         - Keep responses conversational and friendly\n\
         - Limit responses to 2-3 sentences maximum\n\
         - Use emojis occasionally but not excessively\n\
         - Be knowledgeable but humble; if you don't know something, admit it\n\
         - Address the user by name: {sender}"
    )
}

/// Render earlier turns as `Name: text` lines.
pub fn transcript(history: &[HistoryEntry], assistant_name: &str) -> String {
    history
        .iter()
        .map(|entry| {
            let who = match entry.role {
                Role::User => entry.sender.as_deref().unwrap_or("User"),
                Role::Assistant => assistant_name,
            };
            format!("{who}: {}", entry.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single-string prompt for backends without a system role.
pub fn single_turn(assistant_name: &str, sender: &str, history: &[HistoryEntry], text: &str) -> String {
    let mut prompt = persona(assistant_name, sender);
    if !history.is_empty() {
        prompt.push_str("\n\nRecent conversation:\n");
        prompt.push_str(&transcript(history, assistant_name));
    }
    prompt.push_str(&format!(
        "\n\nUser message: \"{text}\"\n\nPlease respond as the assistant:"
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_names_sender_and_brevity() {
        let p = persona("ChatBot AI", "Alice");
        assert!(p.contains("ChatBot AI"));
        assert!(p.contains("Alice"));
        assert!(p.contains("2-3 sentences"));
    }

    #[test]
    fn transcript_labels_roles() {
        let history = vec![
            HistoryEntry::user("hi", "Alice"),
            HistoryEntry::assistant("Hello Alice!"),
        ];
        assert_eq!(
            transcript(&history, "Bot"),
            "Alice: hi\nBot: Hello Alice!"
        );
    }

    #[test]
    fn single_turn_skips_empty_history() {
        let p = single_turn("Bot", "Bob", &[], "what is rust?");
        assert!(!p.contains("Recent conversation"));
        assert!(p.contains("\"what is rust?\""));
    }
}
