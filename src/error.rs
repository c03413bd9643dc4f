use thiserror::Error;

/// Status codes the People API uses for conditions that clear up on their own.
pub const TRANSIENT_STATUS_CODES: [u16; 2] = [429, 503];

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("People API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{operation} gave up after {retries} retries: {source}")]
    RetriesExhausted {
        operation: String,
        retries: u32,
        #[source]
        source: Box<CleanupError>,
    },

    #[error("Contact fetch aborted after {pages} page(s): {source}")]
    FetchAborted {
        pages: usize,
        #[source]
        source: Box<CleanupError>,
    },

    #[error("No label provided")]
    MissingLabel,

    #[error("No label found for name {0}")]
    LabelNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CleanupError {
    /// Rate-limit-exceeded and service-unavailable responses are worth retrying.
    /// Everything else, transport failures included, is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            CleanupError::Api { status, .. } => TRANSIENT_STATUS_CODES.contains(status),
            _ => false,
        }
    }

    /// The credentials were rejected. No later call with the same token can succeed.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CleanupError::Auth(_)) || self.status() == Some(401)
    }

    /// HTTP status behind this error, looking through retry and abort wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            CleanupError::Api { status, .. } => Some(*status),
            CleanupError::Http(e) => e.status().map(|s| s.as_u16()),
            CleanupError::RetriesExhausted { source, .. } | CleanupError::FetchAborted { source, .. } => {
                source.status()
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanupError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> CleanupError {
        CleanupError::Api {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_only_429_and_503_are_transient() {
        assert!(api(429).is_transient());
        assert!(api(503).is_transient());
        for status in [400, 401, 403, 404, 500, 502, 504] {
            assert!(!api(status).is_transient(), "{} should be permanent", status);
        }
        assert!(!CleanupError::MissingLabel.is_transient());
    }

    #[test]
    fn test_status_looks_through_wrappers() {
        let err = CleanupError::FetchAborted {
            pages: 2,
            source: Box::new(CleanupError::RetriesExhausted {
                operation: "list connections".to_string(),
                retries: 6,
                source: Box::new(api(503)),
            }),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_rejected_credentials_are_auth_failures() {
        assert!(api(401).is_auth_failure());
        assert!(CleanupError::Auth("token revoked".to_string()).is_auth_failure());
        assert!(!api(403).is_auth_failure());
        assert!(!api(429).is_auth_failure());

        let wrapped = CleanupError::RetriesExhausted {
            operation: "delete contact".to_string(),
            retries: 0,
            source: Box::new(api(401)),
        };
        assert!(wrapped.is_auth_failure());
    }
}
