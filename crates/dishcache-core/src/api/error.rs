use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to connect to the network. Please check your internet connection.")]
    Connection(#[source] reqwest::Error),

    #[error("A server error has occurred. Please try again later. ({0})")]
    Server(String),

    #[error("Unexpected response format: {0}")]
    Decoding(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Other(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::Server(format!("Status {}: {}", status, Self::truncate_body(body)))
    }

    /// Classify a transport-level failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            FetchError::Connection(err)
        } else if err.is_decode() || err.is_body() {
            FetchError::Server(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }

    /// True when the failure means the network path is unusable.
    pub fn is_connection(&self) -> bool {
        matches!(self, FetchError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_truncates_long_bodies() {
        let body = "x".repeat(800);
        let err = FetchError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body);
        let message = err.to_string();
        assert!(message.contains("502"));
        assert!(message.contains("truncated, 800 total bytes"));
        assert!(!err.is_connection());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // Two-byte characters put byte 500 in the middle of a char
        let body = format!("a{}", "ж".repeat(400));
        let truncated = FetchError::truncate_body(&body);
        assert!(truncated.starts_with('a'));
        assert!(truncated.contains("truncated"));
    }
}
