use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct DedupEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> DedupEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load. Nothing is written unless every
    /// group deduplicated cleanly. Returns the paths of the written artifacts.
    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("Starting deduplication run");

        let dataset = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} records in {} groups",
            dataset.record_count(),
            dataset.groups.len()
        );

        let report = self.pipeline.transform(dataset).await?;
        for group in &report.groups {
            let stats = &group.stats;
            tracing::info!(
                "Group '{}': {} -> {} records, {} merges, {} stale incoming",
                group.name,
                stats.input_records,
                stats.output_records,
                stats.merges,
                stats.stale_incoming
            );
            if stats.stale_incoming > 0 {
                tracing::warn!(
                    "Group '{}' has {} records older than the record they matched",
                    group.name,
                    stats.stale_incoming
                );
            }
        }

        let written = self.pipeline.load(report).await?;
        tracing::info!("Wrote {} artifacts", written.len());

        Ok(written)
    }
}
