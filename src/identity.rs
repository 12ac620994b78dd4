use indexmap::IndexMap;

use crate::constants::pipeline::DEFAULT_ID_ORIGIN;
use crate::errors::DedupeError;
use crate::types::{ExternalId, InternalKey};

/// Bijection between external identifiers and dense internal keys.
///
/// Keys are handed out in first-seen order starting at `origin`, without gaps
/// and without reuse. Assignment fails once the key space above `origin` is
/// used up. Not synchronized; wrap it yourself for shared use.
#[derive(Clone, Debug)]
pub struct IdentityMapper {
    keys: IndexMap<ExternalId, InternalKey>,
    origin: InternalKey,
    next: Option<InternalKey>,
}

impl Default for IdentityMapper {
    fn default() -> Self {
        Self::new(DEFAULT_ID_ORIGIN)
    }
}

impl IdentityMapper {
    /// Create a mapper whose first assigned key is `origin`.
    pub fn new(origin: InternalKey) -> Self {
        Self {
            keys: IndexMap::new(),
            origin,
            next: Some(origin),
        }
    }

    /// Return the key for `external_id`, assigning the next one on first sight.
    pub fn get_id(&mut self, external_id: &str) -> Result<InternalKey, DedupeError> {
        if let Some(&key) = self.keys.get(external_id) {
            return Ok(key);
        }
        let key = self.next.ok_or(DedupeError::KeySpaceExhausted {
            origin: self.origin,
            assigned: self.keys.len(),
        })?;
        self.keys.insert(external_id.to_string(), key);
        self.next = key.checked_add(1);
        Ok(key)
    }

    /// Key previously assigned to `external_id`, without assigning one.
    pub fn key_of(&self, external_id: &str) -> Option<InternalKey> {
        self.keys.get(external_id).copied()
    }

    /// External identifier that was assigned `key`.
    pub fn external_id(&self, key: InternalKey) -> Option<&str> {
        let index = key.checked_sub(self.origin)?;
        self.keys.get_index(index).map(|(id, _)| id.as_str())
    }

    /// Key that the next unseen identifier will receive, if any is left.
    pub fn next_key(&self) -> Option<InternalKey> {
        self.next
    }

    /// Number of distinct identifiers seen.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` when no identifier has been seen.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate `(external_id, key)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, InternalKey)> + '_ {
        self.keys.iter().map(|(id, &key)| (id.as_str(), key))
    }
}
