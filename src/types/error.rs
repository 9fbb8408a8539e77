//! Unified Error Type System
//!
//! Centralized error types for the orchestration core.
//!
//! ## Taxonomy
//!
//! - **Configuration**: credential or model absent, fixed only by an operator
//!   (`NotConfigured`, `NoProviderConfigured`, `ConfigInvalid`)
//! - **Invocation**: upstream provider failures, aggregated but never retried
//!   here (`InvocationFailed`, `AggregateFailure`)
//! - **Data shape**: model output that cannot be decoded (`MalformedOutput`)
//! - **Usage**: rejected before any network call (`UnsupportedParameter`,
//!   `UnknownAnalysisKind`, `ProviderUnavailable`)
//!
//! Every error maps onto a stable [`ErrorCode`] and can be rendered as an
//! [`ErrorBody`] for external collaborators.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::provider::FallbackAttemptLog;

// =============================================================================
// Error Categories
// =============================================================================

/// Classification of an upstream invocation failure.
///
/// Used for diagnostics only: the core does not retry, but callers may use
/// the category (and [`ErrorCategory::recommended_delay`]) to drive their own
/// retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limited by the provider
    RateLimit,
    /// Prompt rejected by the provider's content filter
    ContentPolicy,
    /// Credential present but rejected
    Auth,
    /// Connectivity issues
    Network,
    /// Provider or endpoint unavailable
    Unavailable,
    /// Request rejected as invalid
    BadRequest,
    /// Provider response could not be decoded
    ParseError,
    /// Temporary server-side issue
    Transient,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::ContentPolicy => write!(f, "CONTENT_POLICY"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether a caller-side retry against the same provider may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unavailable
        )
    }

    /// Suggested wait before a caller-side retry
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network => Duration::from_secs(5),
            Self::Transient | Self::Unavailable => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport and HTTP outcomes onto an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code, looking at the body for content-policy hints
    pub fn classify_http_status(status: u16, body: &str) -> ErrorCategory {
        match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 if Self::mentions_content_policy(body) => ErrorCategory::ContentPolicy,
            400 | 413 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            500 | 502 | 503 | 504 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Classify a transport-level failure from reqwest
    pub fn classify_transport(err: &reqwest::Error) -> ErrorCategory {
        if err.is_timeout() || err.is_connect() {
            ErrorCategory::Network
        } else if err.is_decode() || err.is_body() {
            ErrorCategory::ParseError
        } else if let Some(status) = err.status() {
            Self::classify_http_status(status.as_u16(), "")
        } else {
            ErrorCategory::Unknown
        }
    }

    fn mentions_content_policy(body: &str) -> bool {
        let lower = body.to_lowercase();
        lower.contains("content_policy")
            || lower.contains("content policy")
            || lower.contains("safety")
            || lower.contains("moderation")
            || lower.contains("nsfw")
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Failure of a single adapter invocation.
///
/// `NotConfigured` is kept distinct from `InvocationFailed`: the fallback
/// chain skips the former without counting it as an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("{provider} invocation failed [{category}]: {message}")]
    InvocationFailed {
        provider: String,
        category: ErrorCategory,
        message: String,
    },

    #[error("{provider} does not support {parameter} '{value}'")]
    UnsupportedParameter {
        provider: String,
        parameter: String,
        value: String,
    },
}

impl ProviderError {
    pub fn not_configured(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn invocation(
        provider: impl Into<String>,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self::InvocationFailed {
            provider: provider.into(),
            category,
            message: message.into(),
        }
    }

    pub fn unsupported(
        provider: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UnsupportedParameter {
            provider: provider.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Build an invocation error from a non-success HTTP response
    pub fn from_status(provider: impl Into<String>, status: u16, body: &str) -> Self {
        let category = ErrorClassifier::classify_http_status(status, body);
        let preview: String = body
            .chars()
            .take(crate::constants::network::ERROR_BODY_PREVIEW_CHARS)
            .collect();
        Self::invocation(provider, category, format!("HTTP {}: {}", status, preview))
    }

    /// Build an invocation error from a transport failure
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::invocation(
            provider,
            ErrorClassifier::classify_transport(err),
            format!("request failed: {}", err),
        )
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::NotConfigured { provider, .. }
            | Self::InvocationFailed { provider, .. }
            | Self::UnsupportedParameter { provider, .. } => provider,
        }
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotConfigured { .. } => ErrorCode::NotConfigured,
            Self::InvocationFailed { .. } => ErrorCode::InvocationFailed,
            Self::UnsupportedParameter { .. } => ErrorCode::UnsupportedParameter,
        }
    }
}

// =============================================================================
// Error Codes & Boundary Representation
// =============================================================================

/// Stable codes surfaced to external collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    NotConfigured,
    InvocationFailed,
    UnsupportedParameter,
    AggregateFailure,
    NoProviderConfigured,
    ProviderUnavailable,
    MalformedOutput,
    UnknownAnalysisKind,
    ConfigInvalid,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotConfigured => "NotConfigured",
            Self::InvocationFailed => "InvocationFailed",
            Self::UnsupportedParameter => "UnsupportedParameter",
            Self::AggregateFailure => "AggregateFailure",
            Self::NoProviderConfigured => "NoProviderConfigured",
            Self::ProviderUnavailable => "ProviderUnavailable",
            Self::MalformedOutput => "MalformedOutput",
            Self::UnknownAnalysisKind => "UnknownAnalysisKind",
            Self::ConfigInvalid => "ConfigInvalid",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Structured error object handed across the core's boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum GenError {
    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("All image providers failed; last error: {last_reason}")]
    AggregateFailure {
        last_reason: String,
        attempts: FallbackAttemptLog,
    },

    #[error("No image provider is configured")]
    NoProviderConfigured { attempts: FallbackAttemptLog },

    #[error("Model '{model}' is not available yet: {reason}")]
    ProviderUnavailable { model: String, reason: String },

    // -------------------------------------------------------------------------
    // Data Errors
    // -------------------------------------------------------------------------
    #[error("Model output is not valid JSON: {reason}")]
    MalformedOutput { raw_text: String, reason: String },

    #[error("Unknown analysis kind: {0}")]
    UnknownAnalysisKind(String),

    // -------------------------------------------------------------------------
    // System Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;

impl GenError {
    /// Usage error raised by the core itself rather than an adapter
    pub fn unsupported(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Provider(ProviderError::unsupported("core", parameter, value))
    }

    pub fn malformed(raw_text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            raw_text: raw_text.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Provider(err) => err.code(),
            Self::AggregateFailure { .. } => ErrorCode::AggregateFailure,
            Self::NoProviderConfigured { .. } => ErrorCode::NoProviderConfigured,
            Self::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            Self::MalformedOutput { .. } => ErrorCode::MalformedOutput,
            Self::UnknownAnalysisKind(_) => ErrorCode::UnknownAnalysisKind,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => ErrorCode::Internal,
        }
    }

    /// Attempt log of a failed fallback run, if this error came from one
    pub fn attempts(&self) -> Option<&FallbackAttemptLog> {
        match self {
            Self::AggregateFailure { attempts, .. } | Self::NoProviderConfigured { attempts } => {
                Some(attempts)
            }
            _ => None,
        }
    }

    /// Render as the structured object surfaced to collaborators
    pub fn to_body(&self) -> ErrorBody {
        let raw_text = match self {
            Self::MalformedOutput { raw_text, .. } => Some(raw_text.clone()),
            _ => None,
        };
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            raw_text,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::ContentPolicy.to_string(), "CONTENT_POLICY");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::ContentPolicy.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(
            ErrorClassifier::classify_http_status(429, ""),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(401, ""),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(400, "invalid size"),
            ErrorCategory::BadRequest
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(400, "Your request was rejected by our safety system"),
            ErrorCategory::ContentPolicy
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(503, ""),
            ErrorCategory::Transient
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(418, ""),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_from_status_truncates_body() {
        let body = "x".repeat(2000);
        let err = ProviderError::from_status("openai", 500, &body);
        match err {
            ProviderError::InvocationFailed {
                category, message, ..
            } => {
                assert_eq!(category, ErrorCategory::Transient);
                assert!(message.len() < 600);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_provider_error_codes() {
        assert_eq!(
            ProviderError::not_configured("fal", "FAL_KEY missing").code(),
            ErrorCode::NotConfigured
        );
        assert_eq!(
            ProviderError::invocation("fal", ErrorCategory::Network, "boom").code(),
            ErrorCode::InvocationFailed
        );
        assert_eq!(
            ProviderError::unsupported("openai", "aspect_ratio", "4:3").code(),
            ErrorCode::UnsupportedParameter
        );
    }

    #[test]
    fn test_error_code_serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::NoProviderConfigured).unwrap(),
            "\"NoProviderConfigured\""
        );
        assert_eq!(ErrorCode::MalformedOutput.to_string(), "MalformedOutput");
    }

    #[test]
    fn test_malformed_body_carries_raw_text() {
        let err = GenError::malformed("{\"a\": 1", "EOF while parsing");
        let body = err.to_body();
        assert_eq!(body.code, ErrorCode::MalformedOutput);
        assert_eq!(body.raw_text.as_deref(), Some("{\"a\": 1"));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["rawText"], "{\"a\": 1");
    }

    #[test]
    fn test_body_omits_raw_text_for_other_errors() {
        let body = GenError::UnknownAnalysisKind("poetry".into()).to_body();
        assert_eq!(body.code, ErrorCode::UnknownAnalysisKind);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("rawText").is_none());
    }

    #[test]
    fn test_core_unsupported_parameter() {
        let err = GenError::unsupported("aspect_ratio", "7:5");
        assert_eq!(err.code(), ErrorCode::UnsupportedParameter);
        assert!(err.to_string().contains("7:5"));
    }
}
