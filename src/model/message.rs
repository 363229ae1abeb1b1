use std::collections::HashMap;

use crate::attribute::AttributeContainer;

use super::signal::Signal;
use super::ModelError;

/// A CAN frame: its arbitration id, sending node, and the signals packed
/// into its payload. Grounded in `canpy/can_objects/can_message.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub can_id: u32,
    pub name: String,
    pub length: u32,
    pub sender: Option<String>,
    pub is_active: bool,
    pub description: String,
    pub attributes: AttributeContainer,
    signals: HashMap<String, Signal>,
}

impl Message {
    pub fn new(can_id: u32, name: impl Into<String>, length: u32) -> Self {
        Message {
            can_id,
            name: name.into(),
            length,
            sender: None,
            is_active: true,
            description: String::new(),
            attributes: AttributeContainer::new(),
            signals: HashMap::new(),
        }
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    pub fn signal_mut(&mut self, name: &str) -> Option<&mut Signal> {
        self.signals.get_mut(name)
    }

    pub fn multiplexer_signal(&self) -> Option<&Signal> {
        self.signals.values().find(|s| s.is_multiplexer)
    }

    /// Attaches `signal`, enforcing spec §3 invariants 3–5: a signal belongs
    /// to exactly one message, must fit the message layout, and must not
    /// overlap another signal unless both carry distinct multiplexer ids.
    pub fn add_signal(&mut self, signal: Signal) -> Result<(), ModelError> {
        if self.signals.contains_key(&signal.name) {
            return Err(ModelError::DuplicateKey);
        }
        if signal.length == 0 {
            return Err(ModelError::ZeroLengthSignal);
        }
        if signal.last_bit() >= self.length * 8 {
            return Err(ModelError::SignalDoesNotFit);
        }
        self.check_layout(&signal)?;
        self.check_multiplexer_coherence(&signal)?;
        self.signals.insert(signal.name.clone(), signal);
        Ok(())
    }

    fn check_layout(&self, new_signal: &Signal) -> Result<(), ModelError> {
        for existing in self.signals.values() {
            let distinct_mux_groups = matches!(
                (existing.multiplexer_id, new_signal.multiplexer_id),
                (Some(a), Some(b)) if a != b
            );
            if distinct_mux_groups {
                continue;
            }
            let overlaps = existing.start_bit <= new_signal.last_bit()
                && new_signal.start_bit <= existing.last_bit();
            if overlaps {
                return Err(ModelError::SignalOverlap);
            }
        }
        Ok(())
    }

    fn check_multiplexer_coherence(&self, new_signal: &Signal) -> Result<(), ModelError> {
        let has_multiplexer = self.multiplexer_signal().is_some();
        if new_signal.is_multiplexer && has_multiplexer {
            return Err(ModelError::DuplicateMultiplexer);
        }
        if new_signal.multiplexer_id.is_some() && !has_multiplexer && !new_signal.is_multiplexer {
            return Err(ModelError::NoMultiplexerForId);
        }
        Ok(())
    }

    /// Sums `int(signal.bits) << signal.start_bit` across all signals,
    /// matching `CANMessage.__int__`.
    pub fn pack(&self) -> u64 {
        self.signals.values().fold(0u64, |acc, sig| {
            let encoded = sig.bits().to_int();
            let shifted = (encoded as u64).checked_shl(sig.start_bit).unwrap_or(0);
            acc.wrapping_add(shifted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_signal_duplicate_name_rejected() {
        let mut msg = Message::new(1, "M", 8);
        msg.add_signal(Signal::new("S", 0, 8)).unwrap();
        assert_eq!(
            msg.add_signal(Signal::new("S", 8, 8)),
            Err(ModelError::DuplicateKey)
        );
    }

    #[test]
    fn test_add_signal_rejects_zero_length() {
        let mut msg = Message::new(1, "M", 8);
        assert_eq!(
            msg.add_signal(Signal::new("S", 0, 0)),
            Err(ModelError::ZeroLengthSignal)
        );
    }

    #[test]
    fn test_add_signal_rejects_overflow_past_message_length() {
        let mut msg = Message::new(1, "M", 1);
        assert_eq!(
            msg.add_signal(Signal::new("S", 0, 16)),
            Err(ModelError::SignalDoesNotFit)
        );
    }

    #[test]
    fn test_add_signal_rejects_overlap() {
        let mut msg = Message::new(1, "M", 8);
        msg.add_signal(Signal::new("S1", 0, 16)).unwrap();
        assert_eq!(
            msg.add_signal(Signal::new("S2", 8, 8)),
            Err(ModelError::SignalOverlap)
        );
    }

    #[test]
    fn test_add_signal_allows_overlap_across_distinct_multiplexer_groups() {
        let mut msg = Message::new(1, "M", 8);
        let mut mux = Signal::new("Mux", 0, 2);
        mux.is_multiplexer = true;
        msg.add_signal(mux).unwrap();

        let mut a = Signal::new("A", 8, 8);
        a.multiplexer_id = Some(0);
        msg.add_signal(a).unwrap();

        let mut b = Signal::new("B", 8, 8);
        b.multiplexer_id = Some(1);
        assert!(msg.add_signal(b).is_ok());
    }

    #[test]
    fn test_only_one_multiplexer_signal_allowed() {
        let mut msg = Message::new(1, "M", 8);
        let mut mux1 = Signal::new("Mux1", 0, 2);
        mux1.is_multiplexer = true;
        msg.add_signal(mux1).unwrap();

        let mut mux2 = Signal::new("Mux2", 2, 2);
        mux2.is_multiplexer = true;
        assert_eq!(
            msg.add_signal(mux2),
            Err(ModelError::DuplicateMultiplexer)
        );
    }

    #[test]
    fn test_multiplexer_id_requires_existing_multiplexer() {
        let mut msg = Message::new(1, "M", 8);
        let mut a = Signal::new("A", 0, 8);
        a.multiplexer_id = Some(0);
        assert_eq!(
            msg.add_signal(a),
            Err(ModelError::NoMultiplexerForId)
        );
    }

    // S7
    #[test]
    fn test_pack_two_signals() {
        let mut msg = Message::new(1, "M", 2);
        let mut s0 = Signal::new("S0", 0, 8);
        s0.set_raw_value(159).unwrap();
        let mut s1 = Signal::new("S1", 8, 8);
        s1.set_raw_value(96).unwrap();
        msg.add_signal(s0).unwrap();
        msg.add_signal(s1).unwrap();
        assert_eq!(msg.pack(), 159 | (96 << 8));
    }
}
