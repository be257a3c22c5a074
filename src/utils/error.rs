use thiserror::Error;

#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Input unavailable: {path}: {source}")]
    InputUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Group '{group}', record #{index}: missing required field '{field}'")]
    MissingRequiredField {
        group: String,
        index: usize,
        field: String,
    },

    #[error("Group '{group}', record #{index}: unparsable entry date {value}: {reason}")]
    UnparsableDate {
        group: String,
        index: usize,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DedupError {
    pub fn malformed(message: impl Into<String>) -> Self {
        DedupError::MalformedInput {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        DedupError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DedupError::InputUnavailable { .. } | DedupError::MalformedInput { .. } => {
                ErrorCategory::Input
            }
            DedupError::MissingRequiredField { .. } | DedupError::UnparsableDate { .. } => {
                ErrorCategory::Data
            }
            DedupError::IoError(_) | DedupError::SerializationError(_) => ErrorCategory::System,
            DedupError::ConfigError { .. } | DedupError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DedupError::InputUnavailable { .. } => {
                "Check that the input file exists and is readable"
            }
            DedupError::MalformedInput { .. } => {
                "The input must be a JSON object mapping group names to arrays of record objects"
            }
            DedupError::MissingRequiredField { .. } => {
                "Every record needs an identifier, an email and an entry date"
            }
            DedupError::UnparsableDate { .. } => {
                "Use ISO-8601 dates such as 2020-01-01 or 2020-01-01T10:00:00+00:00"
            }
            DedupError::IoError(_) => "Check that the output directory is writable",
            DedupError::SerializationError(_) => "Report this failure with the input that caused it",
            DedupError::ConfigError { .. } | DedupError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the TOML configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not load input: {}", self),
            ErrorCategory::Data => format!("Invalid record: {}", self),
            ErrorCategory::System => format!("System failure: {}", self),
            ErrorCategory::Configuration => format!("Bad configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DedupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_errors_are_high_severity() {
        let err = DedupError::MissingRequiredField {
            group: "users".to_string(),
            index: 3,
            field: "email".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("record #3"));
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(DedupError::config("bad").exit_code(), 2);
        let io = DedupError::IoError(std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 3);
        assert!(io.user_friendly_message().starts_with("System failure"));
    }
}
