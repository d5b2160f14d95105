//! Error types for context construction and response serialization

use thiserror::Error;

/// Failure to assemble an invocation context from runtime metadata.
///
/// Both variants are contract violations by the hosting runtime, not
/// recoverable by handler logic: the invocation is aborted before the
/// handler runs.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A required identifier was not supplied (or supplied empty).
    #[error("runtime did not supply {0}")]
    NotAvailable(&'static str),

    /// Metadata could not be parsed into the expected shape.
    #[error("malformed invocation metadata: {0}")]
    Malformed(String),
}

/// Failure to serialize a response envelope.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The payload could not be captured as a structured value,
    /// e.g. it contains a non-finite float or a non-string map key.
    #[error("payload not serializable")]
    Payload {
        #[source]
        source: serde_json::Error,
    },

    /// The payload is not representable under the declared content type.
    #[error("payload not serializable as {content_type}")]
    Serialization {
        content_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A response header name or value is not valid HTTP.
    #[error("invalid response header: {name}")]
    InvalidHeader { name: String },

    /// The status code is outside the valid HTTP range.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_error_display() {
        let err = ContextError::NotAvailable("call_id");
        assert_eq!(err.to_string(), "runtime did not supply call_id");

        let err = ContextError::Malformed("deadline is not a timestamp".to_string());
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn test_response_error_display() {
        let err = ResponseError::InvalidStatus(9999);
        assert_eq!(err.to_string(), "invalid status code: 9999");
    }
}
