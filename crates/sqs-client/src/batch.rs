//! Batch entries, per-entry outcomes and their reconciliation.
//!
//! A batch request bundles 1-10 independent entries, each tagged with a
//! caller-assigned id that is unique within the request. The service answers
//! with two lists (successful and failed entries) keyed by those ids. Results
//! are always correlated by id, never by position.

use crate::error::{SqsError, ValidationError};
use crate::message::{MessageId, ReceiptHandle};
use crate::validation::{
    check_batch_id, check_delay_seconds, check_message_body, check_visibility_timeout,
    MAX_BATCH_ENTRIES, MAX_MESSAGE_SIZE,
};
use std::collections::HashSet;

// ============================================================================
// Request entries
// ============================================================================

/// Entry kinds accepted by batch operations
pub(crate) trait BatchEntry {
    fn id(&self) -> &str;

    /// Entry-specific checks beyond the id
    fn validate(&self) -> Result<(), ValidationError>;
}

/// One message of a batch send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageBatchEntry {
    pub id: String,
    pub body: String,
    pub delay_seconds: Option<u32>,
}

impl SendMessageBatchEntry {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            delay_seconds: None,
        }
    }

    pub fn with_delay(mut self, seconds: u32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }
}

impl BatchEntry for SendMessageBatchEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_message_body(&self.body)?;
        if let Some(delay) = self.delay_seconds {
            check_delay_seconds(delay)?;
        }
        Ok(())
    }
}

/// One receipt handle of a batch delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteMessageBatchEntry {
    pub id: String,
    pub receipt_handle: ReceiptHandle,
}

impl DeleteMessageBatchEntry {
    pub fn new(id: impl Into<String>, receipt_handle: ReceiptHandle) -> Self {
        Self {
            id: id.into(),
            receipt_handle,
        }
    }
}

impl BatchEntry for DeleteMessageBatchEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// One receipt handle and its new timeout in a batch visibility change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeVisibilityBatchEntry {
    pub id: String,
    pub receipt_handle: ReceiptHandle,
    pub visibility_timeout: u32,
}

impl ChangeVisibilityBatchEntry {
    pub fn new(id: impl Into<String>, receipt_handle: ReceiptHandle, visibility_timeout: u32) -> Self {
        Self {
            id: id.into(),
            receipt_handle,
            visibility_timeout,
        }
    }
}

impl BatchEntry for ChangeVisibilityBatchEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_visibility_timeout(self.visibility_timeout).map(|_| ())
    }
}

/// Check entry count, id format, id uniqueness and each entry
pub(crate) fn validate_entries<E: BatchEntry>(entries: &[E]) -> Result<(), ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    if entries.len() > MAX_BATCH_ENTRIES {
        return Err(ValidationError::TooManyEntries {
            count: entries.len(),
            max: MAX_BATCH_ENTRIES,
        });
    }

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        check_batch_id(entry.id())?;
        if !seen.insert(entry.id()) {
            return Err(ValidationError::DuplicateBatchId {
                id: entry.id().to_string(),
            });
        }
        entry.validate()?;
    }

    Ok(())
}

/// Check the combined body size of a batch send against the service cap
pub(crate) fn validate_payload(entries: &[SendMessageBatchEntry]) -> Result<(), ValidationError> {
    let size: usize = entries.iter().map(|e| e.body.len()).sum();
    if size > MAX_MESSAGE_SIZE {
        return Err(ValidationError::PayloadTooLarge {
            size,
            max_size: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

// ============================================================================
// Outcomes
// ============================================================================

/// Successful entry kinds, identified by the caller-assigned id
pub trait BatchResult {
    fn id(&self) -> &str;
}

/// A message accepted by a batch send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageBatchResult {
    pub id: String,
    pub message_id: MessageId,
    pub md5_of_message_body: String,
}

impl BatchResult for SendMessageBatchResult {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An entry of a batch delete or visibility change that succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultEntry {
    pub id: String,
}

impl BatchResult for BatchResultEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Failure code for a sent entry whose reported MD5 digest is wrong
pub const CHECKSUM_MISMATCH_CODE: &str = "ChecksumMismatch";

/// An entry the service rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: String,
    pub code: String,
    pub message: String,
    /// True when the entry itself was at fault rather than the service
    pub sender_fault: bool,
}

/// Per-entry outcome of a batch call
///
/// `successful` and `failed` are disjoint and together cover every entry of
/// the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput<T> {
    pub successful: Vec<T>,
    pub failed: Vec<BatchFailure>,
    pub request_id: String,
}

impl<T: BatchResult> BatchOutput<T> {
    pub fn successful_ids(&self) -> Vec<&str> {
        self.successful.iter().map(BatchResult::id).collect()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.id.as_str()).collect()
    }

    /// Successful entry with the given id
    pub fn success(&self, id: &str) -> Option<&T> {
        self.successful.iter().find(|s| s.id() == id)
    }

    /// Failed entry with the given id
    pub fn failure(&self, id: &str) -> Option<&BatchFailure> {
        self.failed.iter().find(|f| f.id == id)
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Match the service's outcome lists against the requested ids
///
/// Every requested id must appear in exactly one list, and no list may
/// mention an id that was not requested.
pub(crate) fn reconcile<T: BatchResult>(
    requested: &[&str],
    successful: Vec<T>,
    failed: Vec<BatchFailure>,
    request_id: String,
) -> Result<BatchOutput<T>, SqsError> {
    let expected: HashSet<&str> = requested.iter().copied().collect();
    let mut reported: HashSet<&str> = HashSet::with_capacity(requested.len());

    let outcome_ids = successful
        .iter()
        .map(BatchResult::id)
        .chain(failed.iter().map(|f| f.id.as_str()));
    for id in outcome_ids {
        if !expected.contains(id) {
            return Err(SqsError::deserialization(format!(
                "Batch response mentions unknown entry id '{}'",
                id
            )));
        }
        if !reported.insert(id) {
            return Err(SqsError::deserialization(format!(
                "Batch response reports entry id '{}' more than once",
                id
            )));
        }
    }

    if let Some(missing) = requested.iter().find(|id| !reported.contains(**id)) {
        return Err(SqsError::deserialization(format!(
            "Batch response has no outcome for entry id '{}'",
            missing
        )));
    }

    Ok(BatchOutput {
        successful,
        failed,
        request_id,
    })
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
