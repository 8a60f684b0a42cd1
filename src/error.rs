use thiserror::Error;

/// Classification of a transient service failure.
///
/// Transient failures are absorbed by the retry policy and only surface to
/// callers as [`Error::MaxRetriesExceeded`] once the attempt budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// The request timed out before the service answered.
    Timeout,
    /// The service answered with a rate-limit response (HTTP 429).
    RateLimited,
    /// The service answered with a 5xx / unavailable response.
    ServiceUnavailable,
    /// The connection itself failed (DNS, reset, refused).
    Network,
}

impl TransientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the motiva runtime.
///
/// This aggregates all failure modes of the generation pipeline into
/// actionable, high-level categories. Transient service failures never reach
/// callers directly; the retry policy converts exhaustion into
/// [`Error::MaxRetriesExceeded`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("intent not found: {0}")]
    IntentNotFound(String),

    #[error("duplicate intent id: {0}")]
    DuplicateIntent(String),

    #[error("generation already in flight for intent {active}; rejected request for {requested}")]
    AlreadyGenerating { requested: String, active: String },

    #[error("illegal status transition for intent {intent_id}: {from} -> {to}")]
    InvalidTransition {
        intent_id: String,
        from: String,
        to: String,
    },

    #[error("transient {kind} failure{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transient {
        kind: TransientKind,
        status: Option<u16>,
        message: String,
    },

    #[error("gave up after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("generated content rejected: {}", .issues.join("; "))]
    ContentValidationFailed { issues: Vec<String> },

    #[error("malformed response from {service}: {message}")]
    MalformedResponse { service: String, message: String },

    #[error("cache store failed: {0}")]
    CachingFailed(String),

    #[error("invalid cache data: {0}")]
    InvalidData(String),

    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Transient {
            kind: TransientKind::Timeout,
            status: None,
            message: message.into(),
        }
    }

    pub fn rate_limited(status: u16, message: impl Into<String>) -> Self {
        Error::Transient {
            kind: TransientKind::RateLimited,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn service_unavailable(status: u16, message: impl Into<String>) -> Self {
        Error::Transient {
            kind: TransientKind::ServiceUnavailable,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::Transient {
            kind: TransientKind::Network,
            status: None,
            message: message.into(),
        }
    }

    pub fn malformed(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether the retry policy may consume an attempt on this error.
    ///
    /// Everything that is not an explicit transient service failure is
    /// permanent: malformed responses and validation failures will not get
    /// better by asking again, and state machine errors are caller bugs.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let transient = vec![
            Error::timeout("read timed out"),
            Error::rate_limited(429, "slow down"),
            Error::service_unavailable(503, "overloaded"),
            Error::network("connection reset"),
        ];
        for err in transient {
            assert!(err.is_transient(), "{err} should be transient");
        }

        let permanent = vec![
            Error::malformed("text-gen", "empty choices array"),
            Error::ContentValidationFailed {
                issues: vec!["too short".into()],
            },
            Error::IntentNotFound("abc".into()),
            Error::CachingFailed("disk full".into()),
        ];
        for err in permanent {
            assert!(!err.is_transient(), "{err} should be permanent");
        }
    }

    #[test]
    fn display_carries_status_code() {
        let err = Error::rate_limited(429, "quota exceeded");
        let text = err.to_string();
        assert!(text.contains("429"), "display was: {text}");
        assert!(text.contains("rate_limited"));
    }

    #[test]
    fn validation_display_joins_issues() {
        let err = Error::ContentValidationFailed {
            issues: vec![
                "word count 3 below minimum 30".into(),
                "no terminator".into(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("word count 3"));
        assert!(text.contains("no terminator"));
    }
}
