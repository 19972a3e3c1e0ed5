use serde::ser::{Serialize, SerializeMap, Serializer};

/// Named numeric metrics recovered from one benchmark invocation.
///
/// Fields keep the order in which they were inserted, which for parsed records
/// is the record's line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkRecord {
    fields: Vec<(String, f64)>,
}

impl BenchmarkRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an earlier value while keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for BenchmarkRecord {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut record = BenchmarkRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for BenchmarkRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_first_position() {
        let mut record = BenchmarkRecord::new();
        record.insert("b", 1.0);
        record.insert("a", 2.0);
        record.insert("b", 3.0);

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(3.0));
        assert_eq!(record.get("c"), None);
        assert_eq!(record.len(), 2);
    }
}
