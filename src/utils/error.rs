use crate::domain::model::ProviderId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventSearchError {
    #[error("Genre vocabulary '{source_name}' could not be loaded: {message}")]
    GenreVocabulary {
        source_name: String,
        message: String,
    },

    #[error("City '{city}' could not be resolved to coordinates")]
    CityNotFound { city: String },

    #[error("Geocoding request for '{city}' failed: {message}")]
    Geocoding { city: String, message: String },

    #[error("{provider} responded with HTTP {status}: {body}")]
    ProviderStatus {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("{provider} request for {target} timed out after {seconds}s")]
    ProviderTimeout {
        provider: ProviderId,
        target: String,
        seconds: u64,
    },

    #[error("{provider} response could not be decoded: {source}")]
    Decode {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid date range: {message}")]
    InvalidDateRange { message: String },

    #[error("Calendar error: {message}")]
    Calendar { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Geocoding,
    Provider,
    Validation,
    Calendar,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EventSearchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GenreVocabulary { .. }
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CityNotFound { .. } | Self::Geocoding { .. } => ErrorCategory::Geocoding,
            Self::ProviderStatus { .. }
            | Self::ProviderTimeout { .. }
            | Self::Decode { .. }
            | Self::Http(_) => ErrorCategory::Provider,
            Self::InvalidDateRange { .. } => ErrorCategory::Validation,
            Self::Calendar { .. } => ErrorCategory::Calendar,
            Self::IoError(_) | Self::SerializationError(_) | Self::CsvError(_) => {
                ErrorCategory::System
            }
        }
    }

    /// 單一城市或單一供應商的失敗不影響整體搜尋
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Geocoding => ErrorSeverity::Low,
            ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Calendar => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::GenreVocabulary { .. } => {
                "Check that search.genres_file points to a readable, well-formed genres JSON file"
            }
            Self::CityNotFound { .. } => "Check the spelling of the city name",
            Self::Geocoding { .. } => "Check geocoding.api_key and network connectivity",
            Self::ProviderStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check the provider API key in the configuration file"
            }
            Self::ProviderStatus { .. } | Self::Http(_) => {
                "The provider may be temporarily unavailable, try again later"
            }
            Self::ProviderTimeout { .. } => "Increase search.request_timeout_seconds",
            Self::Decode { .. } => "The provider response format may have changed",
            Self::InvalidDateRange { .. } => {
                "Use --from/--to dates in YYYY-MM-DD format, starting today or later"
            }
            Self::Calendar { .. } => "Check calendar.path and the calendar file contents",
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::SerializationError(_) | Self::CsvError(_) => "Check the output file path",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the TOML configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::GenreVocabulary { .. } => format!("Cannot match genres: {}", self),
            Self::InvalidDateRange { message } => format!("The search dates are not valid: {}", message),
            Self::Calendar { message } => format!("Calendar problem: {}", message),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EventSearchError>;
