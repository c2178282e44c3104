use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Webhook request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Webhook returned a non-JSON body (status {status}): {preview}")]
    InvalidResponse { status: u16, preview: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Report error: {message}")]
    ReportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Response,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProbeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::HttpError(_) => ErrorCategory::Network,
            ProbeError::UrlError(_)
            | ProbeError::ConfigValidationError { .. }
            | ProbeError::InvalidConfigValueError { .. }
            | ProbeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ProbeError::InvalidResponse { .. } => ErrorCategory::Response,
            ProbeError::IoError(_) | ProbeError::CsvError(_) | ProbeError::ReportError { .. } => {
                ErrorCategory::Storage
            }
            ProbeError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一 webhook 失敗不影響其他探測
            ErrorCategory::Network | ErrorCategory::Response => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProbeError::HttpError(e) if e.is_timeout() => {
                "Increase --timeout-seconds or check that the workflow instance is responsive"
            }
            ProbeError::HttpError(_) => {
                "Check network connectivity and that the workflow instance is reachable"
            }
            ProbeError::UrlError(_) => "Use a full http:// or https:// base URL",
            ProbeError::InvalidResponse { .. } => {
                "Make sure the webhook workflow is active and ends with a JSON 'Respond to Webhook' node"
            }
            ProbeError::ConfigValidationError { .. }
            | ProbeError::InvalidConfigValueError { .. }
            | ProbeError::MissingConfigError { .. } => {
                "Review the scenario file and command line flags"
            }
            ProbeError::IoError(_) | ProbeError::CsvError(_) | ProbeError::ReportError { .. } => {
                "Check that the report directory exists and is writable"
            }
            ProbeError::SerializationError(_) => "Inspect the payload or response for invalid JSON",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProbeError::HttpError(e) if e.is_timeout() => {
                "The webhook did not answer before the timeout".to_string()
            }
            ProbeError::HttpError(e) if e.is_connect() => {
                "Could not connect to the workflow instance".to_string()
            }
            ProbeError::InvalidResponse { status, .. } => {
                format!("Webhook answered with status {} but the body is not JSON", status)
            }
            ProbeError::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_high_severity() {
        let err = ProbeError::MissingConfigError {
            field: "target.base_url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("target.base_url"));
    }

    #[test]
    fn test_invalid_response_is_recoverable() {
        let err = ProbeError::InvalidResponse {
            status: 502,
            preview: "<html>Bad Gateway</html>".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Response);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("502"));
    }
}
