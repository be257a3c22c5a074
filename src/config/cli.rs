use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Filesystem storage: reads paths as given, writes under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(Path::new(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("nested").join("out");
        let storage = LocalStorage::new(&out);

        storage.write_file("g_change_log.json", b"{}").await.unwrap();
        assert_eq!(std::fs::read(out.join("g_change_log.json")).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_read_uses_path_as_given() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.json");
        std::fs::write(&input, b"[]").unwrap();

        let storage = LocalStorage::new("/nonexistent-output-dir");
        let data = storage.read_file(input.to_str().unwrap()).await.unwrap();
        assert_eq!(data, b"[]");
        assert!(storage.read_file("/definitely/not/here.json").await.is_err());
    }
}
