use std::collections::HashMap;

use crate::attribute::AttributeContainer;

use super::message::Message;
use super::ModelError;

/// A participant on the bus: a name and the messages it sends. Grounded in
/// `canpy/can_objects/can_node.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub name: String,
    pub description: String,
    pub attributes: AttributeContainer,
    messages: HashMap<u32, Message>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            description: String::new(),
            attributes: AttributeContainer::new(),
            messages: HashMap::new(),
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn message(&self, can_id: u32) -> Option<&Message> {
        self.messages.get(&can_id)
    }

    pub fn message_mut(&mut self, can_id: u32) -> Option<&mut Message> {
        self.messages.get_mut(&can_id)
    }

    /// Attaches `message`, enforcing spec §3 invariant 2: a message has
    /// exactly one sender, and a can_id is unique under this node.
    pub fn add_message(&mut self, mut message: Message) -> Result<(), ModelError> {
        if message.sender.is_some() {
            return Err(ModelError::MessageAlreadyHasSender);
        }
        if self.messages.contains_key(&message.can_id) {
            return Err(ModelError::DuplicateKey);
        }
        message.sender = Some(self.name.clone());
        self.messages.insert(message.can_id, message);
        Ok(())
    }
}
