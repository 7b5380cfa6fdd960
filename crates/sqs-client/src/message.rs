//! Message types for send and receive operations.

use crate::attributes::{Attribute, QueueAttributeName};
use crate::error::{SqsError, ValidationError};
use crate::validation::{
    check_delay_seconds, check_max_messages, check_message_body, check_receipt_handle,
    check_visibility_timeout, check_wait_time,
};
use chrono::{DateTime, TimeZone, Utc};
use md5::{Digest, Md5};
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Service-assigned identifier of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Token identifying one delivery of a message
///
/// A handle is valid only for the delivery that produced it. Once the
/// message is deleted or its visibility window lapses and it is received
/// again, the service rejects the old handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    /// Create a receipt handle from a previously received value
    pub fn new(handle: impl Into<String>) -> Result<Self, ValidationError> {
        let handle = handle.into();
        check_receipt_handle(&handle)?;
        Ok(Self(handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReceiptHandle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// Received messages
// ============================================================================

/// A message delivered by a receive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: MessageId,
    pub receipt_handle: ReceiptHandle,
    /// Hex MD5 digest of the body as reported by the service
    pub md5_of_body: String,
    pub body: String,
    /// System attributes requested in the receive call
    pub attributes: Vec<Attribute>,
}

impl Message {
    /// Value of a system attribute, looked up by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Number of times this message has been delivered, if requested
    pub fn approximate_receive_count(&self) -> Option<u32> {
        self.attribute("ApproximateReceiveCount")
            .and_then(|v| v.parse().ok())
    }

    /// Time the message was sent, if requested
    pub fn sent_timestamp(&self) -> Option<DateTime<Utc>> {
        self.attribute("SentTimestamp").and_then(epoch_millis)
    }

    /// Time the message was first received, if requested
    pub fn first_receive_timestamp(&self) -> Option<DateTime<Utc>> {
        self.attribute("ApproximateFirstReceiveTimestamp")
            .and_then(epoch_millis)
    }

    /// Check the reported body digest against the body
    pub(crate) fn verify_checksum(&self) -> Result<(), SqsError> {
        verify_md5(
            &format!("body of message {}", self.message_id),
            &self.body,
            &self.md5_of_body,
        )
    }
}

fn epoch_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis = value.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

// ============================================================================
// Requests and outputs
// ============================================================================

/// Parameters of a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub body: String,
    /// Per-message delivery delay overriding the queue's `DelaySeconds`
    pub delay_seconds: Option<u32>,
}

impl SendMessageRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            delay_seconds: None,
        }
    }

    pub fn with_delay(mut self, seconds: u32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_message_body(&self.body)?;
        if let Some(delay) = self.delay_seconds {
            check_delay_seconds(delay)?;
        }
        Ok(())
    }
}

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageOutput {
    pub message_id: MessageId,
    pub md5_of_message_body: String,
    pub request_id: String,
}

/// Parameters of a receive call
///
/// Defaults to one message, no long polling and the queue's own visibility
/// timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveMessageRequest {
    /// System attributes to return with each message (`All` for every one)
    pub attribute_names: Vec<String>,
    pub max_number_of_messages: u32,
    /// Long-poll wait; `None` uses the queue's `ReceiveMessageWaitTimeSeconds`
    pub wait_time_seconds: Option<u32>,
    /// Visibility timeout applied to the returned messages only
    pub visibility_timeout: Option<u32>,
}

impl Default for ReceiveMessageRequest {
    fn default() -> Self {
        Self {
            attribute_names: Vec::new(),
            max_number_of_messages: 1,
            wait_time_seconds: None,
            visibility_timeout: None,
        }
    }
}

impl ReceiveMessageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_messages(mut self, count: u32) -> Self {
        self.max_number_of_messages = count;
        self
    }

    pub fn with_wait_time(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Request every system attribute
    pub fn with_all_attributes(self) -> Self {
        self.with_attribute_names([QueueAttributeName::All.as_str()])
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_max_messages(self.max_number_of_messages)?;
        if let Some(wait) = self.wait_time_seconds {
            check_wait_time(wait)?;
        }
        if let Some(timeout) = self.visibility_timeout {
            check_visibility_timeout(timeout)?;
        }
        if self.attribute_names.iter().any(|n| n.is_empty()) {
            return Err(ValidationError::Required {
                field: "attribute_name".to_string(),
            });
        }
        Ok(())
    }
}

/// Messages returned by a receive call, possibly none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveMessageOutput {
    pub messages: Vec<Message>,
    /// Deliveries whose body did not match the reported MD5 digest
    ///
    /// These are still in flight; their receipt handles can be used to
    /// delete them or make them visible again.
    pub checksum_failures: Vec<Message>,
    pub request_id: String,
}

impl ReceiveMessageOutput {
    /// True when the receive delivered nothing at all
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.checksum_failures.is_empty()
    }
}

// ============================================================================
// Checksums
// ============================================================================

/// Lowercase hex MD5 digest of a message body
pub fn md5_hex(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

pub(crate) fn verify_md5(subject: &str, body: &str, reported: &str) -> Result<(), SqsError> {
    let expected = md5_hex(body);
    if !expected.eq_ignore_ascii_case(reported) {
        return Err(SqsError::ChecksumMismatch {
            subject: subject.to_string(),
            expected,
            actual: reported.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
