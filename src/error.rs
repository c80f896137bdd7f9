//! Unified error handling for the stale order reaper
//!
//! Every collaborator (config loading, the Kraken transport, the CLI) reports
//! failures through `ReaperError`. The reconciliation core wraps these into its
//! own pass-level taxonomy (`core::reconciler::PassError`).

use std::fmt;
use std::io;

/// Main error type for the reaper
#[derive(Debug)]
pub enum ReaperError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // API errors
    ApiConnection(String),
    ApiAuthentication(String),
    ApiRateLimit(String),
    ApiResponse(String),
    ApiTimeout(String),

    // Order errors
    OrderFailed(String),
    InvalidOrder(String),

    // IO errors
    FileNotFound(String),
    FileRead(String),
    FileWrite(String),

    // General errors
    Internal(String),
}

impl ReaperError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            ReaperError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: reaper init\n\
                    2. Edit config.toml with your Kraken API keys\n\
                    3. Try again",
                    path
                )
            }
            ReaperError::ConfigValidation(msg) => {
                format!(
                    "Configuration validation error: {}\n\n\
                    💡 Check config.toml for:\n\
                    - Valid API keys (not placeholders)\n\
                    - fast_window < slow_window <= min_bars\n\
                    - A Kraken-supported interval_minutes",
                    msg
                )
            }
            ReaperError::ApiAuthentication(msg) => {
                format!(
                    "API authentication failed: {}\n\n\
                    💡 Check:\n\
                    - API key is correct\n\
                    - API secret is correct (base64, as shown by Kraken)\n\
                    - Key has 'Query open orders' and 'Cancel orders' permissions",
                    msg
                )
            }
            ReaperError::ApiRateLimit(msg) => {
                format!(
                    "API rate limit exceeded: {}\n\n\
                    💡 Consider raising poll_interval_seconds",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReaperError::ApiTimeout(_)
                | ReaperError::ApiConnection(_)
                | ReaperError::ApiRateLimit(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ReaperError::ConfigNotFound(_)
            | ReaperError::ConfigParse(_)
            | ReaperError::ConfigValidation(_) => "config",

            ReaperError::ApiConnection(_)
            | ReaperError::ApiAuthentication(_)
            | ReaperError::ApiRateLimit(_)
            | ReaperError::ApiResponse(_)
            | ReaperError::ApiTimeout(_) => "api",

            ReaperError::OrderFailed(_) | ReaperError::InvalidOrder(_) => "order",

            ReaperError::FileNotFound(_)
            | ReaperError::FileRead(_)
            | ReaperError::FileWrite(_) => "io",

            ReaperError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for ReaperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaperError::ConfigNotFound(path) => write!(f, "Configuration file not found: {}", path),
            ReaperError::ConfigParse(msg) => write!(f, "Configuration parse error: {}", msg),
            ReaperError::ConfigValidation(msg) => write!(f, "Configuration validation error: {}", msg),

            ReaperError::ApiConnection(msg) => write!(f, "API connection error: {}", msg),
            ReaperError::ApiAuthentication(msg) => write!(f, "API authentication failed: {}", msg),
            ReaperError::ApiRateLimit(msg) => write!(f, "API rate limit exceeded: {}", msg),
            ReaperError::ApiResponse(msg) => write!(f, "API response error: {}", msg),
            ReaperError::ApiTimeout(msg) => write!(f, "API timeout: {}", msg),

            ReaperError::OrderFailed(msg) => write!(f, "Order failed: {}", msg),
            ReaperError::InvalidOrder(msg) => write!(f, "Invalid order: {}", msg),

            ReaperError::FileNotFound(path) => write!(f, "File not found: {}", path),
            ReaperError::FileRead(msg) => write!(f, "File read error: {}", msg),
            ReaperError::FileWrite(msg) => write!(f, "File write error: {}", msg),

            ReaperError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ReaperError {}

// Conversion implementations for common error types

impl From<io::Error> for ReaperError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ReaperError::FileNotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => ReaperError::FileRead(err.to_string()),
            io::ErrorKind::TimedOut => ReaperError::ApiTimeout(err.to_string()),
            io::ErrorKind::ConnectionRefused => ReaperError::ApiConnection(err.to_string()),
            _ => ReaperError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<reqwest::Error> for ReaperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReaperError::ApiTimeout(err.to_string())
        } else if err.is_connect() {
            ReaperError::ApiConnection(err.to_string())
        } else if err.is_status() || err.is_decode() {
            ReaperError::ApiResponse(err.to_string())
        } else {
            ReaperError::ApiConnection(err.to_string())
        }
    }
}

impl From<crate::config::ConfigError> for ReaperError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotInitialized(path) => ReaperError::ConfigNotFound(path),
            ConfigError::FileRead(msg) => ReaperError::FileRead(msg),
            ConfigError::FileWrite(msg) => ReaperError::FileWrite(msg),
            ConfigError::Parse(msg) => ReaperError::ConfigParse(msg),
            ConfigError::Validation(msg) => ReaperError::ConfigValidation(msg),
        }
    }
}

/// Result type alias using ReaperError
pub type ReaperResult<T> = Result<T, ReaperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReaperError::ConfigNotFound("config.toml".to_string());
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_error_category() {
        let err = ReaperError::ConfigValidation("test".to_string());
        assert_eq!(err.category(), "config");

        let err = ReaperError::OrderFailed("EOrder:Unknown order".to_string());
        assert_eq!(err.category(), "order");

        let err = ReaperError::ApiTimeout("test".to_string());
        assert_eq!(err.category(), "api");
    }

    #[test]
    fn test_retryable() {
        let err = ReaperError::ApiRateLimit("EAPI:Rate limit exceeded".to_string());
        assert!(err.is_retryable());

        let err = ReaperError::ApiAuthentication("EAPI:Invalid key".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_message() {
        let err = ReaperError::ConfigNotFound("missing.toml".to_string());
        let msg = err.user_message();
        assert!(msg.contains("missing.toml"));
        assert!(msg.contains("reaper init"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: ReaperError = io_err.into();
        assert!(matches!(err, ReaperError::FileNotFound(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        use crate::config::ConfigError;

        let err: ReaperError = ConfigError::Parse("expected `]`".to_string()).into();
        assert!(matches!(err, ReaperError::ConfigParse(_)));
        assert_eq!(err.category(), "config");

        let err: ReaperError = ConfigError::NotInitialized("config.toml".to_string()).into();
        assert!(matches!(err, ReaperError::ConfigNotFound(_)));
    }
}
