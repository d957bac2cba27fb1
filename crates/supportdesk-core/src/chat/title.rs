//! Conversation title derivation.
//!
//! Titles come from the first user message, not from an LLM call: the first
//! 50 characters, with `...` appended when the message was longer.

use supportdesk_types::chat::{Conversation, NEW_CHAT_TITLE, TurnRole};

/// Maximum characters taken from the first user message.
pub const TITLE_MAX_CHARS: usize = 50;

/// Truncate `message` to [`TITLE_MAX_CHARS`] Unicode scalar values.
pub fn title_from_message(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Set the title from the first user turn when this is still the first
/// exchange and the conversation is untitled (or holds the placeholder).
///
/// Returns `true` if the title changed.
pub fn apply_title_rule(conversation: &mut Conversation) -> bool {
    if conversation.turn_count() > 2 {
        return false;
    }
    let untitled = conversation
        .title
        .as_deref()
        .is_none_or(|title| title == NEW_CHAT_TITLE);
    if !untitled {
        return false;
    }

    let Some(first_user) = conversation
        .turns
        .iter()
        .find(|turn| turn.role == TurnRole::User)
    else {
        return false;
    };

    conversation.title = Some(title_from_message(&first_user.content));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use supportdesk_types::user::UserId;

    #[test]
    fn test_short_message_is_kept_whole() {
        assert_eq!(title_from_message("Hello"), "Hello");
        assert_eq!(title_from_message(&"a".repeat(50)), "a".repeat(50));
    }

    #[test]
    fn test_long_message_is_truncated_with_ellipsis() {
        let title = title_from_message(&"b".repeat(51));
        assert_eq!(title, format!("{}...", "b".repeat(50)));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let message = "é".repeat(60);
        let title = title_from_message(&message);
        assert_eq!(title.chars().count(), 53);
        assert!(title.starts_with(&"é".repeat(50)));
    }

    #[test]
    fn test_first_exchange_sets_title() {
        let mut conversation = Conversation::new(UserId::new(), None);
        conversation.push_turn(TurnRole::User, "Where is my order?");
        conversation.push_turn(TurnRole::Assistant, "Let me check.");
        assert!(apply_title_rule(&mut conversation));
        assert_eq!(conversation.title.as_deref(), Some("Where is my order?"));
    }

    #[test]
    fn test_placeholder_title_is_replaced() {
        let mut conversation = Conversation::new(UserId::new(), Some(NEW_CHAT_TITLE.into()));
        conversation.push_turn(TurnRole::User, "Refund please");
        conversation.push_turn(TurnRole::Assistant, "Sure.");
        assert!(apply_title_rule(&mut conversation));
        assert_eq!(conversation.title.as_deref(), Some("Refund please"));
    }

    #[test]
    fn test_existing_title_and_later_turns_are_left_alone() {
        let mut titled = Conversation::new(UserId::new(), Some("Billing".into()));
        titled.push_turn(TurnRole::User, "Hi");
        assert!(!apply_title_rule(&mut titled));
        assert_eq!(titled.title.as_deref(), Some("Billing"));

        let mut long = Conversation::new(UserId::new(), None);
        for text in ["one", "two", "three"] {
            long.push_turn(TurnRole::User, text);
        }
        assert!(!apply_title_rule(&mut long));
        assert!(long.title.is_none());
    }
}
