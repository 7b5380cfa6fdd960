//! Error types for queue service operations.
//!
//! Errors fall into four groups:
//! - local validation failures raised before any request is sent
//! - transport failures (connection refused, timeout) surfaced verbatim
//! - errors reported by the service, decoded from the error document
//! - response problems (undecodable documents, checksum mismatches)
//!
//! Partial failures inside batch operations are NOT errors. They are returned
//! as [`BatchFailure`](crate::batch::BatchFailure) records alongside the
//! successful entries.

use thiserror::Error;

/// Comprehensive error type for all client operations
#[derive(Debug, Error)]
pub enum SqsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Connection failed: {message}")]
    Transport { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Checksum mismatch for {subject}: expected {expected}, service returned {actual}")]
    ChecksumMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to decode service response: {message}")]
    Deserialization { message: String },
}

impl SqsError {
    /// Check if error is transient and the caller may retry the call
    ///
    /// The client never retries on its own. This classification exists for
    /// callers that layer a retry policy on top.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Configuration(_) => false,
            Self::Transport { .. } => true,
            Self::Timeout { .. } => true,
            Self::Service(e) => e.is_transient(),
            Self::ChecksumMismatch { .. } => true,
            Self::Deserialization { .. } => false,
        }
    }

    /// Get the service error, if the service rejected the request
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the service reported that the queue does not exist
    pub fn is_queue_not_found(&self) -> bool {
        self.service_error()
            .is_some_and(ServiceError::is_queue_not_found)
    }

    /// Check if the service rejected a stale or malformed receipt handle
    pub fn is_invalid_receipt_handle(&self) -> bool {
        self.service_error()
            .is_some_and(ServiceError::is_invalid_receipt_handle)
    }

    pub(crate) fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }
}

/// Which side of the exchange the service blames for a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    /// The request was wrong (bad parameters, stale handles, missing queues)
    Sender,
    /// The service failed to process a valid request
    Receiver,
    /// The error document did not say
    Unknown,
}

impl FaultType {
    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "Sender" => Self::Sender,
            "Receiver" => Self::Receiver,
            _ => Self::Unknown,
        }
    }
}

/// Error reported by the queue service in an `ErrorResponse` document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (HTTP {status}): {message}")]
pub struct ServiceError {
    /// HTTP status code of the response
    pub status: u16,
    /// Service error code, e.g. `AWS.SimpleQueueService.NonExistentQueue`
    pub code: String,
    /// Human readable message from the service
    pub message: String,
    /// Whether the service blamed the sender or itself
    pub fault: FaultType,
    /// Request id assigned by the service, when present
    pub request_id: Option<String>,
}

impl ServiceError {
    /// Check if the error refers to a queue that does not exist
    pub fn is_queue_not_found(&self) -> bool {
        matches!(
            self.code.as_str(),
            "AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist"
        )
    }

    /// Check if the error refers to a stale or malformed receipt handle
    pub fn is_invalid_receipt_handle(&self) -> bool {
        matches!(
            self.code.as_str(),
            "ReceiptHandleIsInvalid"
                | "InvalidReceiptHandle"
                | "AWS.SimpleQueueService.MessageNotInflight"
                | "MessageNotInflight"
        )
    }

    /// Check if the request was rejected for authentication or authorization
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.code.as_str(),
            "AccessDenied"
                | "AccessDeniedException"
                | "InvalidClientTokenId"
                | "SignatureDoesNotMatch"
                | "IncompleteSignature"
                | "MissingAuthenticationToken"
                | "InvalidSecurity"
        ) || self.status == 401
            || self.status == 403
    }

    /// Check if error is transient
    pub fn is_transient(&self) -> bool {
        self.status >= 500
            || self.status == 429
            || matches!(
                self.code.as_str(),
                "ServiceUnavailable"
                    | "InternalFailure"
                    | "RequestThrottled"
                    | "ThrottlingException"
                    | "AWS.SimpleQueueService.RequestThrottled"
            )
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

/// Validation errors raised before a request leaves the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },

    #[error("Batch entry id '{id}' is used more than once")]
    DuplicateBatchId { id: String },

    #[error("Batch has no entries")]
    EmptyBatch,

    #[error("Batch has {count} entries (allowed: 1-{max})")]
    TooManyEntries { count: usize, max: usize },

    #[error("Payload of {size} bytes exceeds the {max_size} byte limit")]
    PayloadTooLarge { size: usize, max_size: usize },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
