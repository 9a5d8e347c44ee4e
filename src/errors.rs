use thiserror::Error;

/// Error types for localpeek
///
/// Three disjoint kinds flow through the pipelines: transport errors (the
/// socket could not be reached or the request could not be exchanged), API
/// errors (the daemon answered with a non-2xx status), and decode errors
/// (the body was not the expected JSON shape). See the kind predicates below.
#[derive(Error, Debug)]
pub enum LocalPeekError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP parsing error: {0}")]
    HttpParse(#[from] httparse::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),

    #[error("String conversion error: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("{message}")]
    Api { status: u16, message: String },
}

impl LocalPeekError {
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// An API-level failure. The message is printed verbatim, so callers
    /// embed the status (and body, where they read it) themselves.
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if error happened before a usable HTTP response existed
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Connection { .. }
                | Self::Protocol { .. }
                | Self::HttpParse(_)
                | Self::Http(_)
                | Self::InvalidStatusCode(_)
        )
    }

    /// Check if error is a non-2xx answer from the daemon
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Check if error came from interpreting a successful response body
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Json(_) | Self::FromUtf8(_))
    }

    /// HTTP status captured by an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for localpeek operations
pub type Result<T> = std::result::Result<T, LocalPeekError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_disjoint() {
        let connection_error = LocalPeekError::connection("socket missing");
        assert!(connection_error.is_transport());
        assert!(!connection_error.is_api());
        assert!(!connection_error.is_decode());

        let api_error = LocalPeekError::api(404, "Docker API error: 404 Not Found");
        assert!(api_error.is_api());
        assert!(!api_error.is_transport());
        assert!(!api_error.is_decode());

        let decode_error: LocalPeekError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(decode_error.is_decode());
        assert!(!decode_error.is_transport());
        assert!(!decode_error.is_api());
    }

    #[test]
    fn test_api_error_carries_status_and_message() {
        let err = LocalPeekError::api(500, "Local API error 500: internal error");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Local API error 500: internal error");

        let transport = LocalPeekError::connection("refused");
        assert_eq!(transport.status(), None);
    }

    #[test]
    fn test_io_error_is_transport() {
        let err: LocalPeekError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.is_transport());
        assert!(err.status().is_none());
    }
}
