use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TwoWayDictError {
    #[error("Key not found")]
    KeyNotFound,
}

/// Map holding every pair in both directions: `{key: value, value: key}`.
///
/// Setting a pair first drops any pair that involves either of its
/// members, so the stored entries always form disjoint 2-cycles (a value
/// paired with itself occupies a single entry).
#[derive(Debug, Clone, Default)]
pub struct TwoWayDict<T> {
    entries: HashMap<T, T>,
}

impl<T> TwoWayDict<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: T, value: T) {
        // Remove any previous connections with these values
        for member in [&key, &value] {
            if let Some(partner) = self.entries.remove(member) {
                self.entries.remove(&partner);
            }
        }
        self.entries.insert(key.clone(), value.clone());
        self.entries.insert(value, key);
    }

    pub fn get(&self, key: &T) -> Result<&T, TwoWayDictError> {
        self.entries.get(key).ok_or(TwoWayDictError::KeyNotFound)
    }

    /// Remove `key` and its partner.
    pub fn delete(&mut self, key: &T) -> Result<(), TwoWayDictError> {
        let partner = self
            .entries
            .remove(key)
            .ok_or(TwoWayDictError::KeyNotFound)?;
        self.entries.remove(&partner);
        Ok(())
    }

    pub fn contains_key(&self, key: &T) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of connections, not of stored entries. A lone self-pair
    /// such as `None <-> None` does not count.
    pub fn len(&self) -> usize {
        self.entries.len() / 2
    }

    /// `len() == 0`, so a dict holding only a self-pair is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored entry; each pair shows up once per direction.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.entries.iter()
    }
}

impl<T> FromIterator<(T, T)> for TwoWayDict<T>
where
    T: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}
