pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, RunConfig};
pub use core::dedup::{deduplicate_dataset, deduplicate_group, MergeOptions, StalePolicy};
pub use core::{engine::DedupEngine, pipeline::JsonFilePipeline};
pub use utils::error::{DedupError, Result};
