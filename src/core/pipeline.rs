use crate::core::dedup::deduplicate_dataset;
use crate::core::{ConfigProvider, Dataset, DedupReport, Pipeline, Record, RecordGroup, Storage};
use crate::utils::error::{DedupError, Result};
use serde_json::{Map, Value};
use std::path::Path;

pub const DEDUPLICATED_RECORDS_SUFFIX: &str = "deduplicated_records";
pub const CHANGE_LOG_SUFFIX: &str = "change_log";

/// Reads a JSON document of record groups and writes two JSON artifacts per
/// group: the deduplicated records and the change log.
pub struct JsonFilePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> JsonFilePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn artifact_name(group: &str, kind: &str) -> String {
        format!("{}_{}.json", group, kind)
    }
}

/// Splits a parsed input document into record groups, in document order.
pub fn parse_dataset(document: Value) -> Result<Dataset> {
    let Value::Object(groups) = document else {
        return Err(DedupError::malformed(
            "top-level value must be an object of record groups",
        ));
    };

    let mut dataset = Dataset::default();
    for (name, records) in groups {
        let Value::Array(items) = records else {
            return Err(DedupError::malformed(format!(
                "group '{}' must be an array of records",
                name
            )));
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(data) => Ok(Record::new(data)),
                _ => Err(DedupError::malformed(format!(
                    "group '{}', record #{} is not an object",
                    name, index
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        dataset.groups.push(RecordGroup { name, records });
    }
    Ok(dataset)
}

/// Wraps `payload` as `{ "<group>": payload }` and renders it with two-space indentation.
fn render_artifact(group: &str, payload: Value) -> Result<Vec<u8>> {
    let mut wrapper = Map::new();
    wrapper.insert(group.to_string(), payload);
    Ok(serde_json::to_vec_pretty(&Value::Object(wrapper))?)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for JsonFilePipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input from: {}", input_path);

        let bytes = self.storage.read_file(input_path).await.map_err(|e| match e {
            DedupError::IoError(source) => DedupError::InputUnavailable {
                path: input_path.to_string(),
                source,
            },
            other => other,
        })?;

        let document: Value = serde_json::from_slice(&bytes).map_err(|e| {
            DedupError::malformed(format!("{} is not valid JSON: {}", input_path, e))
        })?;

        let dataset = parse_dataset(document)?;
        tracing::debug!(
            "Parsed {} groups ({} records)",
            dataset.groups.len(),
            dataset.record_count()
        );
        Ok(dataset)
    }

    async fn transform(&self, data: Dataset) -> Result<DedupReport> {
        let options = self.config.merge_options();
        tracing::debug!(
            "Deduplicating with stale policy {:?} on fields {:?}",
            options.stale_policy,
            options.fields
        );
        deduplicate_dataset(data, &options)
    }

    async fn load(&self, report: DedupReport) -> Result<Vec<String>> {
        let output_dir = Path::new(self.config.output_path());
        let mut written = Vec::with_capacity(report.groups.len() * 2);

        for group in report.groups {
            let records = serde_json::to_value(&group.deduplicated_records)?;
            let change_log = serde_json::to_value(&group.change_log)?;

            for (kind, payload) in [
                (DEDUPLICATED_RECORDS_SUFFIX, records),
                (CHANGE_LOG_SUFFIX, change_log),
            ] {
                let file_name = Self::artifact_name(&group.name, kind);
                let data = render_artifact(&group.name, payload)?;
                tracing::debug!("Writing {} ({} bytes)", file_name, data.len());
                self.storage.write_file(&file_name, &data).await?;
                written.push(output_dir.join(&file_name).display().to_string());
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dedup::{MergeOptions, StalePolicy};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_json(&self, path: &str) -> Option<Value> {
            let files = self.files.lock().await;
            files.get(path).map(|b| serde_json::from_slice(b).unwrap())
        }

        async fn file_names(&self) -> Vec<String> {
            let mut names: Vec<_> = self.files.lock().await.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                DedupError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such file",
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        stale_policy: StalePolicy,
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "input.json"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn merge_options(&self) -> MergeOptions {
            MergeOptions {
                stale_policy: self.stale_policy,
                ..MergeOptions::default()
            }
        }
    }

    fn pipeline(storage: MockStorage) -> JsonFilePipeline<MockStorage, MockConfig> {
        JsonFilePipeline::new(
            storage,
            MockConfig {
                stale_policy: StalePolicy::Compatible,
            },
        )
    }

    #[tokio::test]
    async fn test_extract_keeps_group_order() {
        let storage = MockStorage::default();
        storage
            .put(
                "input.json",
                br#"{"zeta": [{"_id": 1}], "alpha": [], "mid": [{"_id": 2}, {"_id": 3}]}"#,
            )
            .await;

        let dataset = pipeline(storage).extract().await.unwrap();
        let names: Vec<_> = dataset.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(dataset.record_count(), 3);
    }

    #[tokio::test]
    async fn test_extract_missing_input_is_unavailable() {
        let err = pipeline(MockStorage::default()).extract().await.unwrap_err();
        assert!(matches!(err, DedupError::InputUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_json() {
        let storage = MockStorage::default();
        storage.put("input.json", b"{not json").await;
        let err = pipeline(storage).extract().await.unwrap_err();
        assert!(matches!(err, DedupError::MalformedInput { .. }));
    }

    #[test]
    fn test_parse_dataset_shape_errors() {
        assert!(parse_dataset(json!([1, 2])).is_err());
        assert!(parse_dataset(json!({"users": {"_id": 1}})).is_err());
        let err = parse_dataset(json!({"users": [{"_id": 1}, "oops"]})).unwrap_err();
        assert!(err.to_string().contains("record #1"));
    }

    #[tokio::test]
    async fn test_load_writes_two_artifacts_per_group() {
        let storage = MockStorage::default();
        storage
            .put(
                "input.json",
                serde_json::to_vec(&json!({
                    "users": [
                        {"_id": "u1", "email": "a@x", "entryDate": "2020-01-01", "name": "Ann"},
                        {"_id": "u1", "email": "a@x", "entryDate": "2021-01-01", "name": "Anne"}
                    ],
                    "admins": [
                        {"_id": "u9", "email": "z@x", "entryDate": "2020-01-01"}
                    ]
                }))
                .unwrap()
                .as_slice(),
            )
            .await;

        let pipeline = pipeline(storage.clone());
        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();
        let written = pipeline.load(report).await.unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(
            storage.file_names().await,
            vec![
                "admins_change_log.json",
                "admins_deduplicated_records.json",
                "input.json",
                "users_change_log.json",
                "users_deduplicated_records.json",
            ]
        );

        let records = storage.get_json("users_deduplicated_records.json").await.unwrap();
        assert_eq!(
            records,
            json!({"users": [{"_id": "u1", "email": "a@x", "entryDate": "2021-01-01", "name": "Anne"}]})
        );

        let log = storage.get_json("users_change_log.json").await.unwrap();
        assert_eq!(
            log["users"][0]["field_changes"]["name"],
            json!({"value_from": "Ann", "value_to": "Anne"})
        );

        let admin_log = storage.get_json("admins_change_log.json").await.unwrap();
        assert_eq!(admin_log, json!({"admins": []}));
    }

    #[tokio::test]
    async fn test_artifacts_use_two_space_indent() {
        let storage = MockStorage::default();
        storage
            .put(
                "input.json",
                br#"{"g": [{"_id": 1, "email": "e", "entryDate": "2020-01-01"}]}"#,
            )
            .await;
        let pipeline = pipeline(storage.clone());
        let report = pipeline
            .transform(pipeline.extract().await.unwrap())
            .await
            .unwrap();
        pipeline.load(report).await.unwrap();

        let files = storage.files.lock().await;
        let text = String::from_utf8(files["g_deduplicated_records.json"].clone()).unwrap();
        assert!(text.starts_with("{\n  \"g\": [\n    {\n      \"_id\": 1,"));
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            JsonFilePipeline::<MockStorage, MockConfig>::artifact_name("users", CHANGE_LOG_SUFFIX),
            "users_change_log.json"
        );
    }

    #[test]
    fn test_transform_blocking_runtime() {
        let storage = MockStorage::default();
        let pipeline = JsonFilePipeline::new(
            storage,
            MockConfig {
                stale_policy: StalePolicy::NewestWins,
            },
        );
        let dataset = parse_dataset(json!({"g": [
            {"_id": 1, "email": "e", "entryDate": "2021-01-01"},
            {"_id": 1, "email": "e", "entryDate": "2020-01-01"}
        ]}))
        .unwrap();
        let report = tokio_test::block_on(pipeline.transform(dataset)).unwrap();
        assert_eq!(report.groups[0].deduplicated_records.len(), 1);
        assert_eq!(report.groups[0].stats.stale_incoming, 1);
    }
}
