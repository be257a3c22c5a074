use crate::core::diff::field_changes;
use crate::core::identity_index::{IdentityIndex, RecordId};
use crate::core::output_sequence::OutputSequence;
use crate::core::record_fields::{RecordFields, RecordKeys};
use crate::domain::model::{
    ChangeLogEntry, Dataset, DedupReport, GroupResult, MergeStats, Record, RecordGroup,
};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// What happens to an incoming record that is older than the record it matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// The older record is still indexed and appended, so it sits in the
    /// output next to the newer one and becomes the canonical record for
    /// its keys.
    #[default]
    Compatible,
    /// The older record is discarded: the index and the output only ever
    /// advance to the record that wins the date comparison.
    NewestWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub fields: RecordFields,
    pub stale_policy: StalePolicy,
}

/// Records of one group plus their parsed keys, addressed by [`RecordId`].
struct RecordArena {
    records: Vec<Record>,
    keys: Vec<RecordKeys>,
}

impl RecordArena {
    fn load(group: RecordGroup, fields: &RecordFields) -> Result<Self> {
        let keys = group
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| fields.keys(&group.name, index, record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            records: group.records,
            keys,
        })
    }

    fn record(&self, id: RecordId) -> &Record {
        &self.records[id.0]
    }

    fn keys(&self, id: RecordId) -> &RecordKeys {
        &self.keys[id.0]
    }
}

/// Runs the single forward merge pass over one group.
///
/// Every record is validated before the pass starts, so a group either
/// yields a complete result or an error.
pub fn deduplicate_group(group: RecordGroup, options: &MergeOptions) -> Result<GroupResult> {
    let name = group.name.clone();
    let arena = RecordArena::load(group, &options.fields)?;
    let total = arena.records.len();

    let mut index = IdentityIndex::new();
    let mut output = OutputSequence::with_capacity(total);
    let mut change_log = Vec::new();
    let mut stats = MergeStats {
        input_records: total,
        ..MergeStats::default()
    };

    for position in 0..total {
        let incoming = RecordId(position);
        let incoming_keys = arena.keys(incoming);

        if let Some(existing) = index.lookup(incoming_keys) {
            let existing_keys = arena.keys(existing);
            if incoming_keys.entry_date >= existing_keys.entry_date {
                let changes = field_changes(arena.record(existing), arena.record(incoming));
                tracing::debug!(
                    group = %name,
                    source = existing.0,
                    output = incoming.0,
                    changed_fields = changes.len(),
                    "merge: incoming record supersedes existing"
                );
                change_log.push(ChangeLogEntry {
                    source_record: arena.record(existing).clone(),
                    output_record: arena.record(incoming).clone(),
                    field_changes: changes,
                });
                output.remove(existing);
                stats.merges += 1;
            } else {
                stats.stale_incoming += 1;
                tracing::debug!(
                    group = %name,
                    existing = existing.0,
                    incoming = incoming.0,
                    policy = ?options.stale_policy,
                    "incoming record is older than the record it matches"
                );
                if options.stale_policy == StalePolicy::NewestWins {
                    continue;
                }
            }
        }

        index.update(incoming_keys, incoming);
        output.append(incoming);
    }

    let ids = output.into_ids();
    stats.output_records = ids.len();

    let RecordArena { records, .. } = arena;
    let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
    let deduplicated_records = ids
        .into_iter()
        .filter_map(|id| slots[id.0].take())
        .collect();

    Ok(GroupResult {
        name,
        deduplicated_records,
        change_log,
        stats,
    })
}

/// Deduplicates every group independently. The first failing group aborts
/// the whole dataset.
pub fn deduplicate_dataset(dataset: Dataset, options: &MergeOptions) -> Result<DedupReport> {
    let groups = dataset
        .groups
        .into_iter()
        .map(|group| deduplicate_group(group, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(DedupReport { groups })
}
