use std::collections::HashMap;

use crate::attribute::AttributeContainer;
use crate::bits::BitVector;

use super::value_table::ValueTable;
use super::ModelError;

/// A contiguous (or endian-reordered) bit field inside a message payload,
/// with linear scaling to an engineering value. Grounded in
/// `canpy/can_objects/can_signal.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub name: String,
    pub start_bit: u32,
    pub length: u32,
    pub little_endian: bool,
    pub signed: bool,
    pub factor: f64,
    pub offset: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub unit: String,
    pub is_multiplexer: bool,
    pub multiplexer_id: Option<u32>,
    pub receivers: Vec<String>,
    pub value_table: Option<String>,
    pub description: String,
    pub attributes: AttributeContainer,
    raw_value: i64,
}

/// The engineering-value side of [`Signal::value`]: either a scaled number
/// or a label resolved through the signal's value table.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    Numeric(f64),
    Label(String),
}

impl Signal {
    pub fn new(name: impl Into<String>, start_bit: u32, length: u32) -> Self {
        Signal {
            name: name.into(),
            start_bit,
            length,
            little_endian: true,
            signed: false,
            factor: 1.0,
            offset: 0.0,
            value_min: 0.0,
            value_max: 0.0,
            unit: String::new(),
            is_multiplexer: false,
            multiplexer_id: None,
            receivers: Vec::new(),
            value_table: None,
            description: String::new(),
            attributes: AttributeContainer::new(),
            raw_value: 0,
        }
    }

    /// `start_bit + length - 1`, the highest bit index this signal occupies.
    /// Saturates rather than underflowing for a zero-length signal (rejected
    /// by [`super::Message::add_signal`], but `length` is a public field a
    /// caller could still zero out after construction).
    pub fn last_bit(&self) -> u32 {
        self.start_bit + self.length.saturating_sub(1)
    }

    pub fn raw_value(&self) -> i64 {
        self.raw_value
    }

    /// Sets the raw value, enforcing spec §3 invariant 6's domain: unsigned
    /// raw values must be non-negative and fit `length` bits; signed raw
    /// values must satisfy `|raw| < 2^(length-1)`, strictly.
    pub fn set_raw_value(&mut self, value: i64) -> Result<(), ModelError> {
        if !self.signed && value < 0 {
            return Err(ModelError::RawValueOutOfDomain);
        }
        let usable_length = if self.signed {
            self.length.saturating_sub(1)
        } else {
            self.length
        };
        if usable_length < 63 && value.unsigned_abs() >= (1u64 << usable_length) {
            return Err(ModelError::RawValueOutOfDomain);
        }
        self.raw_value = value;
        Ok(())
    }

    pub fn add_receiver(&mut self, node_name: impl Into<String>) {
        self.receivers.push(node_name.into());
    }

    /// Builds the bit vector that would ride on the wire for the current
    /// raw value.
    pub fn bits(&self) -> BitVector {
        BitVector::new(self.length as usize, self.raw_value, self.little_endian, self.signed)
    }

    /// Sets the raw value from a decoded bit vector.
    pub fn set_bits(&mut self, bits: &BitVector) -> Result<(), ModelError> {
        self.set_raw_value(bits.to_int())
    }

    /// `value_table`-mapped label if the raw value is a key in it, otherwise
    /// `raw_value * factor + offset`.
    pub fn value(&self, tables: &HashMap<String, ValueTable>) -> SignalValue {
        if let Some(table_name) = &self.value_table {
            if let Some(table) = tables.get(table_name) {
                if let Some(label) = table.get(self.raw_value) {
                    return SignalValue::Label(label.to_string());
                }
            }
        }
        SignalValue::Numeric(self.raw_value as f64 * self.factor + self.offset)
    }

    /// Clamps to `[value_min, value_max]` when that range isn't the
    /// "no clamping" zero sentinel, then sets the raw value from the
    /// engineering value via the inverse linear transform.
    pub fn set_value(&mut self, value: f64) -> Result<(), ModelError> {
        let mut v = value;
        if self.value_min != 0.0 || self.value_max != 0.0 {
            v = v.clamp(self.value_min.min(self.value_max), self.value_min.max(self.value_max));
        }
        let raw = ((v - self.offset) / self.factor).trunc() as i64;
        self.set_raw_value(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_bit() {
        let sig = Signal::new("S", 32, 32);
        assert_eq!(sig.last_bit(), 63);
    }

    #[test]
    fn test_set_raw_value_unsigned_rejects_negative() {
        let mut sig = Signal::new("S", 0, 8);
        assert_eq!(sig.set_raw_value(-1), Err(ModelError::RawValueOutOfDomain));
    }

    #[test]
    fn test_set_raw_value_unsigned_rejects_overflow() {
        let mut sig = Signal::new("S", 0, 4);
        assert!(sig.set_raw_value(15).is_ok());
        assert_eq!(sig.set_raw_value(16), Err(ModelError::RawValueOutOfDomain));
    }

    #[test]
    fn test_set_raw_value_signed_strict_bound() {
        let mut sig = Signal::new("S", 0, 4);
        sig.signed = true;
        assert!(sig.set_raw_value(7).is_ok());
        assert_eq!(sig.set_raw_value(8), Err(ModelError::RawValueOutOfDomain));
        assert!(sig.set_raw_value(-7).is_ok());
        assert_eq!(sig.set_raw_value(-8), Err(ModelError::RawValueOutOfDomain));
    }

    // Testable property 3: value linear law.
    #[test]
    fn test_value_linear_law() {
        let mut sig = Signal::new("S", 0, 16);
        sig.factor = 2.0;
        sig.offset = 10.0;
        sig.set_raw_value(5).unwrap();
        assert_eq!(sig.value(&HashMap::new()), SignalValue::Numeric(20.0));
    }

    // Testable property 4: clamp idempotence.
    #[test]
    fn test_clamp_idempotence() {
        let mut sig = Signal::new("S", 0, 16);
        sig.value_min = 0.0;
        sig.value_max = 100.0;
        sig.set_value(250.0).unwrap();
        let SignalValue::Numeric(v) = sig.value(&HashMap::new()) else {
            panic!("expected numeric value")
        };
        sig.set_value(v).unwrap();
        let raw_after_first = sig.raw_value();
        sig.set_value(v).unwrap();
        assert_eq!(sig.raw_value(), raw_after_first);
    }

    #[test]
    fn test_value_table_lookup() {
        let mut sig = Signal::new("S", 0, 8);
        sig.value_table = Some("Gear".into());
        sig.set_raw_value(2).unwrap();
        let mut table = ValueTable::new("Gear");
        table.insert(2, "Park");
        let mut tables = HashMap::new();
        tables.insert("Gear".to_string(), table);
        assert_eq!(sig.value(&tables), SignalValue::Label("Park".into()));
    }

    #[test]
    fn test_bits_roundtrip_through_signal() {
        let mut sig = Signal::new("S", 0, 8);
        sig.set_raw_value(159).unwrap();
        let bits = sig.bits();
        let mut other = Signal::new("S2", 0, 8);
        other.set_bits(&bits).unwrap();
        assert_eq!(other.raw_value(), 159);
    }
}
