use serde::Serialize;

/// Who produced a turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the transcript. Fields are private so a turn can't change after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The ordered transcript for one session.
///
/// Only the orchestrator in this crate can append to it. Everything else,
/// including the rendering surface, gets read access through `turns()`.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent `n` turns, oldest first.
    pub fn last(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub(crate) fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hi"));
        conversation.append(Turn::assistant("hello"));
        conversation.append(Turn::assistant("anything else?"));

        let roles: Vec<Role> = conversation.turns().iter().map(Turn::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant]);
        assert_eq!(conversation.turns()[1].content(), "hello");
    }

    #[test]
    fn test_last_clamps_to_length() {
        let mut conversation = Conversation::new();
        assert!(conversation.last(2).is_empty());

        conversation.append(Turn::user("one"));
        conversation.append(Turn::assistant("two"));
        conversation.append(Turn::user("three"));

        assert_eq!(conversation.last(2).len(), 2);
        assert_eq!(conversation.last(2)[0].content(), "two");
        assert_eq!(conversation.last(10).len(), 3);
    }

    #[test]
    fn test_turn_serializes_as_role_content_pair() {
        let json = serde_json::to_value(Turn::assistant("4")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "4"}));
    }
}
