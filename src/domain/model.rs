use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One input record: a JSON object whose field order is kept as read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// A named bucket of records. Deduplication never crosses group boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub name: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub groups: Vec<RecordGroup>,
}

impl Dataset {
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub value_from: Value,
    pub value_to: Value,
}

/// Field-level differences of one merge event, in the incoming record's field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges(Vec<(String, FieldChange)>);

impl FieldChanges {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, change: FieldChange) {
        self.0.push((field.into(), change));
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.iter().find(|(f, _)| f == field).map(|(_, c)| c)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(f, _)| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FieldChanges {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, change) in &self.0 {
            map.serialize_entry(field, change)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldChanges {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut changes = FieldChanges::new();
        for (field, value) in raw {
            let change = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            changes.push(field, change);
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub source_record: Record,
    pub output_record: Record,
    pub field_changes: FieldChanges,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub input_records: usize,
    pub output_records: usize,
    pub merges: usize,
    pub stale_incoming: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub name: String,
    pub deduplicated_records: Vec<Record>,
    pub change_log: Vec<ChangeLogEntry>,
    pub stats: MergeStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupReport {
    pub groups: Vec<GroupResult>,
}
