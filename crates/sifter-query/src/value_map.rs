//! Ordered key/value results, as produced by `pluck`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// Ordered mapping from key value to value, keys compared loosely.
///
/// Inserting an existing key replaces its value in place, so a later row wins
/// the way a SQL `pluck` into a keyed map does.
///
/// ```
/// use sifter_query::{Value, ValueMap};
///
/// let mut counts = ValueMap::new();
/// counts.insert(14, 2);
/// counts.insert("14", 3);
///
/// assert_eq!(counts.len(), 1);
/// assert_eq!(counts.get(14), Some(&Value::from(3)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        ValueMap::default()
    }

    /// Inserts or replaces the value for `key`.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: impl Into<Value>) -> Option<&Value> {
        let key = key.into();
        self.position(&key).map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, key: impl Into<Value>) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing == key || existing.loose_eq(key))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Serializes as an object keyed by the display form of each key.
impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let map: ValueMap = [(3, 1), (1, 2), (2, 1)].into_iter().collect();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Value::from(3), Value::from(1), Value::from(2)]);
    }

    #[test]
    fn null_key_is_addressable() {
        let mut map = ValueMap::new();
        map.insert(Value::Null, 4);
        assert_eq!(map.get(Value::Null), Some(&Value::from(4)));
        assert!(!map.contains_key(0));
    }

    #[test]
    fn serializes_as_object() {
        let map: ValueMap = [(0, 1), (14, 2)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0":1,"14":2}"#);
    }
}
