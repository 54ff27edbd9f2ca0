use thiserror::Error;

/// 使用者可見錯誤的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    RateLimited,
    ServiceUnavailable,
    Network,
    Timeout,
    Unknown,
}

/// Which field a failed lookup was serving. Only changes the wording of
/// 404 and fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupContext {
    Localities,
    PostalCodes,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Status(u16),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::Network(_) => ErrorKind::Network,
            LookupError::Timeout => ErrorKind::Timeout,
            LookupError::Status(404) => ErrorKind::NotFound,
            LookupError::Status(429) => ErrorKind::RateLimited,
            LookupError::Status(500) | LookupError::Status(503) => ErrorKind::ServiceUnavailable,
            LookupError::Status(_) | LookupError::Decode(_) => ErrorKind::Unknown,
        }
    }

    /// 轉換為表單上顯示的訊息
    pub fn user_message(&self, context: LookupContext) -> String {
        match self {
            LookupError::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            LookupError::Status(404) => match context {
                LookupContext::Localities => "No matching cities found.".to_string(),
                LookupContext::PostalCodes => "Postal code not found in the database.".to_string(),
            },
            LookupError::Status(429) => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            LookupError::Status(500) | LookupError::Status(503) => {
                "Service temporarily unavailable. Please try again later.".to_string()
            }
            LookupError::Status(code) => format!("Server error ({}). Please try again.", code),
            LookupError::Timeout => "Request timed out. Please try again.".to_string(),
            LookupError::Decode(_) => match context {
                LookupContext::Localities => "Unable to search cities. Please try again.".to_string(),
                LookupContext::PostalCodes => {
                    "Unable to fetch postal codes. Please try again.".to_string()
                }
            },
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else if let Some(status) = err.status() {
            LookupError::Status(status.as_u16())
        } else if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
