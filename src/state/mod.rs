//! Conversation state storage
//!
//! Holds the transient dialogue state of every conversation that is part way
//! through the dialogue, keyed by id. A conversation with no entry is in the
//! cleared state. Owned by the dialogue state machine, so no locking is involved.

use crate::models::{ConversationId, ConversationState};
use std::collections::HashMap;
use tracing::debug;

/// In-memory mapping from conversation id to its dialogue state
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<ConversationId, ConversationState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: HashMap::new(),
        }
    }

    /// Fetch the state for a conversation, creating a cleared one on first use.
    pub fn get_or_create(&mut self, id: &ConversationId) -> &mut ConversationState {
        self.conversations.entry(id.clone()).or_insert_with(|| {
            debug!(conversation_id = %id, "Creating conversation state");
            ConversationState::default()
        })
    }

    pub fn get(&self, id: &ConversationId) -> Option<&ConversationState> {
        self.conversations.get(id)
    }

    /// Clear a conversation back to its initial phase by forgetting it.
    pub fn reset(&mut self, id: &ConversationId) {
        if self.conversations.remove(id).is_some() {
            debug!(conversation_id = %id, "Dropped conversation state");
        }
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Phase};

    #[test]
    fn test_get_or_create_starts_cleared() {
        let mut store = ConversationStore::new();
        let id = ConversationId::new("chat-1");

        assert!(store.get(&id).is_none());
        assert!(store.get_or_create(&id).is_cleared());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conversations_are_isolated() {
        let mut store = ConversationStore::new();
        let first = ConversationId::new("first");
        let second = ConversationId::new("second");

        {
            let state = store.get_or_create(&first);
            state.phase = Phase::SelectCurrency;
            state.direction = Some(Direction::HomeToForeign);
        }

        assert!(store.get_or_create(&second).is_cleared());
        assert_eq!(store.get(&first).unwrap().phase, Phase::SelectCurrency);
    }

    #[test]
    fn test_reset_forgets_existing_state() {
        let mut store = ConversationStore::new();
        let id = ConversationId::from(7_i64);

        store.get_or_create(&id).direction = Some(Direction::ForeignToHome);
        store.reset(&id);

        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
        assert!(store.get_or_create(&id).is_cleared());
    }

    #[test]
    fn test_reset_of_unknown_conversation_stores_nothing() {
        let mut store = ConversationStore::new();

        store.reset(&ConversationId::new("unknown"));

        assert!(store.is_empty());
    }
}
