use std::collections::HashMap;

/// One raw sample of the controller: driver key -> integer value
///
/// Digital keys carry 0/1, stick keys carry `[-32768, 32768]`, trigger keys
/// `[0, 255]`. Keys may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    values: HashMap<String, i32>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a raw value, returning the previous one for this key
    pub fn insert(&mut self, key: impl Into<String>, value: i32) -> Option<i32> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i32)> for Frame {
    fn from_iter<I: IntoIterator<Item = (K, i32)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, i32); N]> for Frame {
    fn from(pairs: [(K, i32); N]) -> Self {
        pairs.into_iter().collect()
    }
}
