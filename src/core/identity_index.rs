use crate::core::record_fields::{IdentityKey, RecordKeys};
use std::collections::HashMap;

/// Position of a record within its group's input; stable for the whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

/// Canonical record per identifier and per email.
///
/// Both maps always point at the most recently *processed* record for a key,
/// which is not necessarily the most recently dated one.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    by_id: HashMap<IdentityKey, RecordId>,
    by_email: HashMap<IdentityKey, RecordId>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier match first; the email map is only consulted when the
    /// identifier is unknown.
    pub fn lookup(&self, keys: &RecordKeys) -> Option<RecordId> {
        if let Some(id) = self.by_id.get(&keys.identifier) {
            return Some(*id);
        }
        self.by_email.get(&keys.email).copied()
    }

    pub fn update(&mut self, keys: &RecordKeys, record: RecordId) {
        self.by_id.insert(keys.identifier.clone(), record);
        self.by_email.insert(keys.email.clone(), record);
    }
}
