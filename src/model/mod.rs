//! The Network → Node → Message → Signal tree: keyed children, structural
//! invariants, and default-attribute inheritance through the parent chain.
//!
//! Grounded in `canpy/can_objects/{can_network,can_node,can_message,can_signal}.py`.

mod message;
mod network;
mod node;
mod signal;
mod value_table;

pub use message::Message;
pub use network::Network;
pub use node::Node;
pub use signal::{Signal, SignalValue};
pub use value_table::ValueTable;

use crate::attribute::{Attribute, AttributeContainer, ObjectKind};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("name or id already in use at this level")]
    DuplicateKey,
    #[error("message already belongs to a sending node")]
    MessageAlreadyHasSender,
    #[error("signal already belongs to a message")]
    SignalAlreadyAttached,
    #[error("signal does not fit in the message layout")]
    SignalDoesNotFit,
    #[error("signal length must be at least 1 bit")]
    ZeroLengthSignal,
    #[error("signal overlaps another signal outside of distinct multiplexer groups")]
    SignalOverlap,
    #[error("message already has a multiplexer signal")]
    DuplicateMultiplexer,
    #[error("multiplexer_id set but message has no multiplexer signal")]
    NoMultiplexerForId,
    #[error("raw value outside the signal's domain")]
    RawValueOutOfDomain,
}

/// Resolves `key` for an object of kind `obj_kind`: first the object's own
/// locally set attribute, then each ancestor's container (nearest first),
/// synthesizing an attribute from the first definition matching `obj_kind`
/// that carries a non-null default. Implements spec §4.B's lookup chain as a
/// plain ordered list rather than boxed closures.
pub fn resolve_attribute<'a>(
    key: &str,
    obj_kind: ObjectKind,
    local: &AttributeContainer,
    ancestors: impl IntoIterator<Item = &'a AttributeContainer>,
) -> Option<Attribute> {
    if let Some(attr) = local.local(key) {
        return Some(attr.clone());
    }
    for ancestor in ancestors {
        if let Some(def) = ancestor.definition(key) {
            if def.obj_type == obj_kind {
                if let Some(default) = def.default() {
                    return Some(Attribute {
                        name: key.to_string(),
                        value: default.clone(),
                    });
                }
            }
        }
    }
    None
}
