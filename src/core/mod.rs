pub mod dedup;
pub mod diff;
pub mod engine;
pub mod identity_index;
pub mod output_sequence;
pub mod pipeline;
pub mod record_fields;

pub use crate::domain::model::{
    ChangeLogEntry, Dataset, DedupReport, FieldChange, FieldChanges, GroupResult, MergeStats,
    Record, RecordGroup,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
