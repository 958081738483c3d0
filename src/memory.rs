// memory.rs
use crate::message::Message;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Shared, bus-owned form of a memory: appended to by every publishing
/// role, read as an owned snapshot by each role's observe.
pub type SharedMemory = Arc<RwLock<Memory>>;

pub fn shared() -> SharedMemory {
    Arc::new(RwLock::new(Memory::new()))
}

/// Ordered, append-only message history. Insertion order is preserved and
/// nothing is ever removed or edited.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    storage: Vec<Message>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message. Re-adding a message already stored by value is a
    /// no-op, not an error.
    pub fn add(&mut self, message: Message) {
        if self.storage.contains(&message) {
            return;
        }
        self.storage.push(message);
    }

    pub fn contains(&self, message: &Message) -> bool {
        self.storage.contains(message)
    }

    /// Full ordered snapshot.
    pub fn get(&self) -> Vec<Message> {
        self.storage.clone()
    }

    /// Ordered subsequence caused by a single action kind.
    pub fn get_by_action(&self, kind: &str) -> Vec<Message> {
        self.storage
            .iter()
            .filter(|m| m.cause_by == kind)
            .cloned()
            .collect()
    }

    /// Ordered subsequence caused by any of the watched action kinds.
    pub fn get_by_actions(&self, kinds: &HashSet<String>) -> Vec<Message> {
        self.storage
            .iter()
            .filter(|m| kinds.contains(&m.cause_by))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_for_equal_messages() {
        let mut memory = Memory::new();
        let msg = Message::new("once");
        memory.add(msg.clone());
        memory.add(msg.clone());
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get(), vec![msg]);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut memory = Memory::new();
        let first = Message::new("first");
        let second = Message::new("second");
        memory.add(first.clone());
        memory.add(second.clone());
        memory.add(first.clone());
        let contents: Vec<String> = memory.get().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn filters_by_watched_action_kinds() {
        let mut memory = Memory::new();
        memory.add(Message::new("a").with_cause_by("WriteSpec"));
        memory.add(Message::new("b").with_cause_by("WriteCode"));
        memory.add(Message::new("c").with_cause_by("WriteSpec"));

        let watched = HashSet::from(["WriteSpec".to_string()]);
        let contents: Vec<String> = memory
            .get_by_actions(&watched)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["a", "c"]);
        assert_eq!(memory.get_by_action("WriteCode").len(), 1);
        assert!(memory.get_by_action("Unknown").is_empty());
    }
}
