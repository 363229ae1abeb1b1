use std::collections::HashMap;

use crate::attribute::{Attribute, AttributeContainer, ObjectKind};

use super::node::Node;
use super::resolve_attribute;
use super::value_table::ValueTable;
use super::Message;

/// The top-level CAN network: nodes, value tables, and the network's own
/// attribute definitions. Grounded in `canpy/can_objects/can_network.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Network {
    pub version: String,
    pub speed: u32,
    pub description: String,
    pub attributes: AttributeContainer,
    nodes: HashMap<String, Node>,
    value_tables: HashMap<String, ValueTable>,
}

impl Default for Network {
    fn default() -> Self {
        Network {
            version: String::new(),
            speed: 100,
            description: String::new(),
            attributes: AttributeContainer::new(),
            nodes: HashMap::new(),
            value_tables: HashMap::new(),
        }
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    /// Registers `node` under its name. Last write wins on a name collision
    /// (spec §9 Open Question 3) — tests that parse real DBC files rely on
    /// this rather than a rejection.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn value_tables(&self) -> impl Iterator<Item = &ValueTable> {
        self.value_tables.values()
    }

    pub fn value_table(&self, name: &str) -> Option<&ValueTable> {
        self.value_tables.get(name)
    }

    pub fn add_value_table(&mut self, table: ValueTable) {
        self.value_tables.insert(table.name.clone(), table);
    }

    /// Raw accessor used by [`Signal::value`](super::Signal::value), which
    /// needs the whole table map, not just one lookup.
    pub fn value_table_map(&self) -> &HashMap<String, ValueTable> {
        &self.value_tables
    }

    /// The unique message with this can_id across all nodes, or `None`.
    pub fn get_message(&self, can_id: u32) -> Option<&Message> {
        self.nodes.values().find_map(|n| n.message(can_id))
    }

    pub fn get_message_mut(&mut self, can_id: u32) -> Option<&mut Message> {
        self.nodes.values_mut().find_map(|n| n.message_mut(can_id))
    }

    pub fn get_signal(&self, can_id: u32, name: &str) -> Option<&super::Signal> {
        self.get_message(can_id)?.signal(name)
    }

    /// Every message containing at least one signal whose receivers include
    /// `node_name`.
    pub fn get_consumed_messages(&self, node_name: &str) -> Vec<&Message> {
        self.nodes
            .values()
            .flat_map(|n| n.messages())
            .filter(|m| {
                m.signals()
                    .any(|s| s.receivers.iter().any(|r| r == node_name))
            })
            .collect()
    }

    /// Resolves a network-scoped attribute: the local value, or else the
    /// network's own definition default — the network is its own first (and
    /// only) stop in the ancestor chain, matching canpy's
    /// `_check_attribute_for_default_value`, which starts at
    /// `object_to_check = self._can_object` before walking further up.
    pub fn network_attribute(&self, key: &str) -> Option<Attribute> {
        resolve_attribute(key, ObjectKind::Network, &self.attributes, [&self.attributes])
    }

    pub fn node_attribute(&self, node_name: &str, key: &str) -> Option<Attribute> {
        let node = self.node(node_name)?;
        resolve_attribute(key, ObjectKind::Node, &node.attributes, [&self.attributes])
    }

    pub fn message_attribute(&self, can_id: u32, key: &str) -> Option<Attribute> {
        let node = self.nodes.values().find(|n| n.message(can_id).is_some())?;
        let message = node.message(can_id)?;
        resolve_attribute(
            key,
            ObjectKind::Message,
            &message.attributes,
            [&node.attributes, &self.attributes],
        )
    }

    pub fn signal_attribute(&self, can_id: u32, signal_name: &str, key: &str) -> Option<Attribute> {
        let node = self.nodes.values().find(|n| n.message(can_id).is_some())?;
        let message = node.message(can_id)?;
        let signal = message.signal(signal_name)?;
        resolve_attribute(
            key,
            ObjectKind::Signal,
            &signal.attributes,
            [&message.attributes, &node.attributes, &self.attributes],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeDefinition, AttributeKind, RawAttributeValue};
    use crate::model::Signal;

    #[test]
    fn test_add_node_last_write_wins() {
        let mut net = Network::new();
        net.add_node(Node::new("ABS"));
        net.add_node(Node::new("ABS"));
        assert_eq!(net.nodes().count(), 1);
    }

    #[test]
    fn test_get_message_across_nodes() {
        let mut net = Network::new();
        let mut node = Node::new("ABS");
        node.add_message(Message::new(42, "M", 8)).unwrap();
        net.add_node(node);
        assert_eq!(net.get_message(42).unwrap().name, "M");
        assert!(net.get_message(99).is_none());
    }

    #[test]
    fn test_get_signal() {
        let mut net = Network::new();
        let mut node = Node::new("ABS");
        let mut msg = Message::new(42, "M", 8);
        msg.add_signal(Signal::new("Speed", 0, 8)).unwrap();
        node.add_message(msg).unwrap();
        net.add_node(node);
        assert!(net.get_signal(42, "Speed").is_some());
        assert!(net.get_signal(42, "Missing").is_none());
    }

    #[test]
    fn test_get_consumed_messages() {
        let mut net = Network::new();
        let mut node = Node::new("ABS");
        let mut msg = Message::new(1, "M", 8);
        let mut sig = Signal::new("Speed", 0, 8);
        sig.add_receiver("DRS");
        msg.add_signal(sig).unwrap();
        node.add_message(msg).unwrap();
        net.add_node(node);
        net.add_node(Node::new("DRS"));

        let consumed = net.get_consumed_messages("DRS");
        assert_eq!(consumed.len(), 1);
        assert_eq!(consumed[0].name, "M");
        assert!(net.get_consumed_messages("Someone").is_empty());
    }

    // S5
    #[test]
    fn test_default_attribute_inheritance() {
        let mut net = Network::new();
        let mut def = AttributeDefinition::new(
            "Prio",
            ObjectKind::Signal,
            AttributeKind::Int { min: 0, max: 10 },
        );
        def.set_default(&RawAttributeValue::Int(5));
        net.attributes.add_definition(def);

        let mut node = Node::new("ABS");
        let mut msg = Message::new(1, "M", 8);
        msg.add_signal(Signal::new("Speed", 0, 8)).unwrap();
        node.add_message(msg).unwrap();
        net.add_node(node);

        let attr = net.signal_attribute(1, "Speed", "Prio").unwrap();
        assert_eq!(
            attr.value,
            crate::attribute::AttributeValue::Int(5)
        );
    }

    #[test]
    fn test_network_attribute_resolves_its_own_default() {
        let mut net = Network::new();
        let mut def = AttributeDefinition::new(
            "BusType",
            ObjectKind::Network,
            AttributeKind::String,
        );
        def.set_default(&RawAttributeValue::Str("CAN".into()));
        net.attributes.add_definition(def);

        let attr = net.network_attribute("BusType").unwrap();
        assert_eq!(
            attr.value,
            crate::attribute::AttributeValue::String("CAN".into())
        );
        assert!(net.network_attribute("Missing").is_none());
    }

    #[test]
    fn test_closer_definition_overrides_further_default() {
        let mut net = Network::new();
        let mut net_def = AttributeDefinition::new(
            "Prio",
            ObjectKind::Signal,
            AttributeKind::Int { min: 0, max: 10 },
        );
        net_def.set_default(&RawAttributeValue::Int(5));
        net.attributes.add_definition(net_def);

        let mut node = Node::new("ABS");
        let mut node_def = AttributeDefinition::new(
            "Prio",
            ObjectKind::Signal,
            AttributeKind::Int { min: 0, max: 10 },
        );
        node_def.set_default(&RawAttributeValue::Int(9));
        node.attributes.add_definition(node_def);

        let mut msg = Message::new(1, "M", 8);
        msg.add_signal(Signal::new("Speed", 0, 8)).unwrap();
        node.add_message(msg).unwrap();
        net.add_node(node);

        let attr = net.signal_attribute(1, "Speed", "Prio").unwrap();
        assert_eq!(attr.value, crate::attribute::AttributeValue::Int(9));
    }

    #[test]
    fn test_local_attribute_overrides_default() {
        let mut net = Network::new();
        let mut def = AttributeDefinition::new(
            "Prio",
            ObjectKind::Signal,
            AttributeKind::Int { min: 0, max: 10 },
        );
        def.set_default(&RawAttributeValue::Int(5));
        net.attributes.add_definition(def);

        let mut node = Node::new("ABS");
        let mut msg = Message::new(1, "M", 8);
        let mut sig = Signal::new("Speed", 0, 8);
        sig.attributes.add(Attribute {
            name: "Prio".into(),
            value: crate::attribute::AttributeValue::Int(2),
        });
        msg.add_signal(sig).unwrap();
        node.add_message(msg).unwrap();
        net.add_node(node);

        let attr = net.signal_attribute(1, "Speed", "Prio").unwrap();
        assert_eq!(attr.value, crate::attribute::AttributeValue::Int(2));
    }
}
