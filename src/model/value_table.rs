use std::collections::HashMap;

/// A named mapping from integer codes to human-readable strings, used to
/// label enumerated signal values (`VAL_TABLE_` / `VAL_` in the DBC grammar).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueTable {
    pub name: String,
    entries: HashMap<i64, String>,
}

impl ValueTable {
    pub fn new(name: impl Into<String>) -> Self {
        ValueTable {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, code: i64, label: impl Into<String>) {
        self.entries.insert(code, label.into());
    }

    pub fn get(&self, code: i64) -> Option<&str> {
        self.entries.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut table = ValueTable::new("Status");
        table.insert(0, "Off");
        table.insert(1, "On");
        assert_eq!(table.get(0), Some("Off"));
        assert_eq!(table.get(2), None);
    }
}
