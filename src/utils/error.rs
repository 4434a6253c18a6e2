use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Salesforce login failed [{code}]: {message}")]
    AuthenticationError { code: String, message: String },

    #[error("Salesforce responded {status} for {url}: {body}")]
    ApiStatusError {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Import aborted by operator")]
    Aborted,

    #[error("{failed} of {total} user rows failed to import")]
    PartialFailure { failed: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Input,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorCategory::Network,
            Self::AuthenticationError { .. } => ErrorCategory::Authentication,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::Aborted => ErrorCategory::Input,
            Self::ProcessingError { .. } | Self::PartialFailure { .. } => ErrorCategory::Data,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Exit code 2 is reserved for row failures; everything that stops
            // the run before rows are sent maps to High.
            Self::PartialFailure { .. } => ErrorSeverity::Medium,
            Self::SerializationError(_) => ErrorSeverity::Critical,
            Self::IoError(e) if e.kind() != std::io::ErrorKind::NotFound => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Short message for the terminal, without the internal detail of the
    /// wrapped error.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => "Salesforce did not answer in time".to_string(),
            Self::ApiError(_) => "Could not reach Salesforce".to_string(),
            Self::ApiStatusError { status, .. } => {
                format!("Salesforce rejected the request (HTTP {})", status)
            }
            Self::AuthenticationError { message, .. } => {
                format!("Salesforce login failed: {}", message)
            }
            Self::CsvError(e) => format!("The user sheet could not be read: {}", e),
            Self::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("File not found: {}", e)
            }
            Self::Aborted => "Import cancelled".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network access to SF_API_BASE_URL and try again"
            }
            ErrorCategory::Authentication => {
                "Check SF_USER, SF_PASSWORD, SF_TOKEN and SF_DOMAIN in the env file"
            }
            ErrorCategory::Configuration => {
                "Check the envs/.env.<env> file and the command line options"
            }
            ErrorCategory::Input => "Check the CSV path and its header row",
            ErrorCategory::Data => "Fix the failed rows listed above and re-run with only those rows",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
