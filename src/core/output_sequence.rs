use crate::core::identity_index::RecordId;
use std::collections::HashMap;

/// Ordered set of surviving records, addressed by [`RecordId`].
///
/// Removal leaves a tombstone so that positions recorded for other entries
/// stay valid; tombstones are dropped when the sequence is finished.
#[derive(Debug, Default)]
pub struct OutputSequence {
    slots: Vec<Option<RecordId>>,
    positions: HashMap<RecordId, usize>,
}

impl OutputSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, record: RecordId) {
        self.positions.insert(record, self.slots.len());
        self.slots.push(Some(record));
    }

    /// Removes `record` if it is currently present. Returns whether it was.
    pub fn remove(&mut self, record: RecordId) -> bool {
        match self.positions.remove(&record) {
            Some(position) => {
                self.slots[position] = None;
                true
            }
            None => false,
        }
    }

    /// Surviving ids in append order.
    pub fn into_ids(self) -> Vec<RecordId> {
        self.slots.into_iter().flatten().collect()
    }
}
