use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoLinkError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Required dataset file '{file}' not found")]
    MissingDatasetError { file: String },

    #[error("Dataset file '{file}' is malformed at '{field}': {message}")]
    MalformedDatasetError {
        file: String,
        field: String,
        message: String,
    },

    #[error("Dataset integrity check failed with {count} issue(s), first: {first}")]
    IntegrityError { count: usize, first: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Service '{service}' has no targets in the dataset")]
    UnknownServiceError { service: String },

    #[error("Report rendering failed for '{artifact}': {message}")]
    ReportError { artifact: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Dataset,
    Integrity,
    Configuration,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GeoLinkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeoLinkError::MissingDatasetError { .. }
            | GeoLinkError::MalformedDatasetError { .. }
            | GeoLinkError::UnknownServiceError { .. } => ErrorCategory::Dataset,
            GeoLinkError::IntegrityError { .. } => ErrorCategory::Integrity,
            GeoLinkError::ConfigValidationError { .. }
            | GeoLinkError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            GeoLinkError::CsvError(_)
            | GeoLinkError::SerializationError(_)
            | GeoLinkError::ReportError { .. } => ErrorCategory::Output,
            GeoLinkError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Integrity => ErrorSeverity::Medium,
            ErrorCategory::Dataset | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Single-line message naming the file or field that caused the abort.
    pub fn user_friendly_message(&self) -> String {
        match self {
            GeoLinkError::MissingDatasetError { file } => {
                format!("Missing required dataset file: {}", file)
            }
            GeoLinkError::MalformedDatasetError { file, field, .. } => {
                format!("Dataset file {} could not be parsed (field: {})", file, field)
            }
            GeoLinkError::IntegrityError { count, first } => {
                format!("{} data-integrity issue(s) found, e.g. {}", count, first)
            }
            GeoLinkError::InvalidConfigValueError { field, value, .. } => {
                format!("Invalid configuration value for {}: {}", field, value)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Dataset => {
                "Check --data-dir and the [dataset] file names; required files are clusters, adjacency and the suburb registry"
            }
            ErrorCategory::Integrity => {
                "Run the doctor binary for the full issue list, or set dataset.strict = false"
            }
            ErrorCategory::Configuration => "Fix the configuration value and re-run",
            ErrorCategory::Output => "Check that the output path is writable",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    /// Exit code used by the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dataset_is_high_severity() {
        let err = GeoLinkError::MissingDatasetError {
            file: "clusters.json".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Dataset);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("clusters.json"));
    }

    #[test]
    fn test_integrity_error_exit_code() {
        let err = GeoLinkError::IntegrityError {
            count: 3,
            first: "a -> b is not reciprocal".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(!err.user_friendly_message().contains('\n'));
    }
}
