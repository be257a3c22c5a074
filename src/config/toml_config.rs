use crate::core::dedup::{MergeOptions, StalePolicy};
use crate::core::record_fields::RecordFields;
use crate::utils::error::{DedupError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub output: OutputConfig,
    pub merge: MergeConfig,
    pub fields: RecordFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub stale_policy: StalePolicy,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DedupError::config(format!(
                "cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| DedupError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${OUTPUT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| DedupError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            fields: self.fields.clone(),
            stale_policy: self.merge.stale_policy,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.output.path {
            validation::validate_path("output.path", path)?;
        }
        validation::validate_non_empty_string("fields.identifier", &self.fields.identifier)?;
        validation::validate_non_empty_string("fields.email", &self.fields.email)?;
        validation::validate_non_empty_string("fields.entry_date", &self.fields.entry_date)?;
        validation::validate_distinct(
            "fields",
            &[
                self.fields.identifier.as_str(),
                self.fields.email.as_str(),
                self.fields.entry_date.as_str(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.merge_options(), MergeOptions::default());
        assert_eq!(config.fields.identifier, "_id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[output]
path = "./dedup-out"

[merge]
stale_policy = "newest-wins"

[fields]
identifier = "id"
email = "mail"
entry_date = "updatedAt"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output.path.as_deref(), Some("./dedup-out"));
        assert_eq!(config.merge.stale_policy, StalePolicy::NewestWins);
        assert_eq!(config.fields.entry_date, "updatedAt");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_fields_section_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str("[fields]\nemail = \"contact\"\n").unwrap();
        assert_eq!(config.fields.email, "contact");
        assert_eq!(config.fields.identifier, "_id");
        assert_eq!(config.fields.entry_date, "entryDate");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RECORD_DEDUP_TEST_OUT", "/tmp/dedup-test");

        let config =
            TomlConfig::from_toml_str("[output]\npath = \"${RECORD_DEDUP_TEST_OUT}\"\n").unwrap();
        assert_eq!(config.output.path.as_deref(), Some("/tmp/dedup-test"));

        std::env::remove_var("RECORD_DEDUP_TEST_OUT");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(TomlConfig::from_toml_str("[merge]\nstale_policy = \"random\"\n").is_err());
    }

    #[test]
    fn test_duplicate_field_names_fail_validation() {
        let config =
            TomlConfig::from_toml_str("[fields]\nidentifier = \"email\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[merge]\nstale_policy = \"compatible\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.merge.stale_policy, StalePolicy::Compatible);
        assert!(TomlConfig::from_file("/no/such/config.toml").is_err());
    }
}
