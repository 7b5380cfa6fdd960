//! Queue attributes: names, name/value pairs, and their write-time checks.

use crate::error::ValidationError;
use crate::validation::{
    check_range, MAX_DELAY_SECONDS, MAX_MESSAGE_SIZE, MAX_RETENTION_SECONDS,
    MAX_VISIBILITY_TIMEOUT_SECONDS, MAX_WAIT_TIME_SECONDS, MIN_MAXIMUM_MESSAGE_SIZE,
    MIN_RETENTION_SECONDS,
};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Names of queue attributes understood by the service
///
/// Unknown names round-trip through [`QueueAttributeName::Other`] so newer
/// service attributes remain usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueueAttributeName {
    /// Wildcard requesting every attribute
    All,
    ApproximateNumberOfMessages,
    ApproximateNumberOfMessagesDelayed,
    ApproximateNumberOfMessagesNotVisible,
    ContentBasedDeduplication,
    CreatedTimestamp,
    DelaySeconds,
    FifoQueue,
    LastModifiedTimestamp,
    MaximumMessageSize,
    MessageRetentionPeriod,
    Policy,
    QueueArn,
    ReceiveMessageWaitTimeSeconds,
    RedrivePolicy,
    VisibilityTimeout,
    Other(String),
}

impl QueueAttributeName {
    /// Wire name of the attribute
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "All",
            Self::ApproximateNumberOfMessages => "ApproximateNumberOfMessages",
            Self::ApproximateNumberOfMessagesDelayed => "ApproximateNumberOfMessagesDelayed",
            Self::ApproximateNumberOfMessagesNotVisible => "ApproximateNumberOfMessagesNotVisible",
            Self::ContentBasedDeduplication => "ContentBasedDeduplication",
            Self::CreatedTimestamp => "CreatedTimestamp",
            Self::DelaySeconds => "DelaySeconds",
            Self::FifoQueue => "FifoQueue",
            Self::LastModifiedTimestamp => "LastModifiedTimestamp",
            Self::MaximumMessageSize => "MaximumMessageSize",
            Self::MessageRetentionPeriod => "MessageRetentionPeriod",
            Self::Policy => "Policy",
            Self::QueueArn => "QueueArn",
            Self::ReceiveMessageWaitTimeSeconds => "ReceiveMessageWaitTimeSeconds",
            Self::RedrivePolicy => "RedrivePolicy",
            Self::VisibilityTimeout => "VisibilityTimeout",
            Self::Other(name) => name,
        }
    }

    /// Attributes computed by the service that cannot be set
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::All
                | Self::ApproximateNumberOfMessages
                | Self::ApproximateNumberOfMessagesDelayed
                | Self::ApproximateNumberOfMessagesNotVisible
                | Self::CreatedTimestamp
                | Self::LastModifiedTimestamp
                | Self::QueueArn
        )
    }
}

impl FromStr for QueueAttributeName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "All" => Self::All,
            "ApproximateNumberOfMessages" => Self::ApproximateNumberOfMessages,
            "ApproximateNumberOfMessagesDelayed" => Self::ApproximateNumberOfMessagesDelayed,
            "ApproximateNumberOfMessagesNotVisible" => Self::ApproximateNumberOfMessagesNotVisible,
            "ContentBasedDeduplication" => Self::ContentBasedDeduplication,
            "CreatedTimestamp" => Self::CreatedTimestamp,
            "DelaySeconds" => Self::DelaySeconds,
            "FifoQueue" => Self::FifoQueue,
            "LastModifiedTimestamp" => Self::LastModifiedTimestamp,
            "MaximumMessageSize" => Self::MaximumMessageSize,
            "MessageRetentionPeriod" => Self::MessageRetentionPeriod,
            "Policy" => Self::Policy,
            "QueueArn" => Self::QueueArn,
            "ReceiveMessageWaitTimeSeconds" => Self::ReceiveMessageWaitTimeSeconds,
            "RedrivePolicy" => Self::RedrivePolicy,
            "VisibilityTimeout" => Self::VisibilityTimeout,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for QueueAttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for QueueAttributeName {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(name) => name,
            Err(never) => match never {},
        }
    }
}

/// A queue configuration attribute as a name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Create an attribute from raw name and value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn visibility_timeout(seconds: u32) -> Self {
        Self::new(QueueAttributeName::VisibilityTimeout.as_str(), seconds.to_string())
    }

    pub fn delay_seconds(seconds: u32) -> Self {
        Self::new(QueueAttributeName::DelaySeconds.as_str(), seconds.to_string())
    }

    pub fn maximum_message_size(bytes: u32) -> Self {
        Self::new(QueueAttributeName::MaximumMessageSize.as_str(), bytes.to_string())
    }

    pub fn message_retention_period(seconds: u32) -> Self {
        Self::new(
            QueueAttributeName::MessageRetentionPeriod.as_str(),
            seconds.to_string(),
        )
    }

    pub fn receive_message_wait_time(seconds: u32) -> Self {
        Self::new(
            QueueAttributeName::ReceiveMessageWaitTimeSeconds.as_str(),
            seconds.to_string(),
        )
    }

    /// Access policy document (JSON)
    pub fn policy(document: impl Into<String>) -> Self {
        Self::new(QueueAttributeName::Policy.as_str(), document)
    }

    /// Redrive policy sending messages to `dead_letter_target_arn` after
    /// `max_receive_count` failed receives
    pub fn redrive_policy(dead_letter_target_arn: &str, max_receive_count: u32) -> Self {
        let document = serde_json::json!({
            "deadLetterTargetArn": dead_letter_target_arn,
            "maxReceiveCount": max_receive_count.to_string(),
        });
        Self::new(
            QueueAttributeName::RedrivePolicy.as_str(),
            document.to_string(),
        )
    }

    /// Typed name of this attribute
    pub fn kind(&self) -> QueueAttributeName {
        QueueAttributeName::from(self.name.as_str())
    }

    /// Check that the attribute may be written and its value is within the
    /// bounds the service enforces
    pub fn validate_for_write(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::Required {
                field: "attribute_name".to_string(),
            });
        }

        let kind = self.kind();
        if kind.is_read_only() {
            return Err(ValidationError::InvalidFormat {
                field: self.name.clone(),
                message: "attribute is read-only".to_string(),
            });
        }

        match kind {
            QueueAttributeName::VisibilityTimeout => {
                self.check_numeric(0, MAX_VISIBILITY_TIMEOUT_SECONDS)
            }
            QueueAttributeName::DelaySeconds => self.check_numeric(0, MAX_DELAY_SECONDS),
            QueueAttributeName::MaximumMessageSize => {
                self.check_numeric(MIN_MAXIMUM_MESSAGE_SIZE, MAX_MESSAGE_SIZE as u32)
            }
            QueueAttributeName::MessageRetentionPeriod => {
                self.check_numeric(MIN_RETENTION_SECONDS, MAX_RETENTION_SECONDS)
            }
            QueueAttributeName::ReceiveMessageWaitTimeSeconds => {
                self.check_numeric(0, MAX_WAIT_TIME_SECONDS)
            }
            QueueAttributeName::Policy | QueueAttributeName::RedrivePolicy => self.check_json(),
            QueueAttributeName::FifoQueue | QueueAttributeName::ContentBasedDeduplication => {
                self.check_bool()
            }
            _ => Ok(()),
        }
    }

    fn check_numeric(&self, min: u32, max: u32) -> Result<(), ValidationError> {
        let value = self
            .value
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: self.name.clone(),
                message: format!("'{}' is not a non-negative integer", self.value),
            })?;
        check_range(&self.name, value, min, max).map(|_| ())
    }

    fn check_json(&self) -> Result<(), ValidationError> {
        serde_json::from_str::<serde_json::Value>(&self.value)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidFormat {
                field: self.name.clone(),
                message: format!("not a JSON document: {}", e),
            })
    }

    fn check_bool(&self) -> Result<(), ValidationError> {
        match self.value.as_str() {
            "true" | "false" => Ok(()),
            _ => Err(ValidationError::InvalidFormat {
                field: self.name.clone(),
                message: "must be 'true' or 'false'".to_string(),
            }),
        }
    }
}

/// Result of a `GetQueueAttributes` call
///
/// The service does not define an order for the returned attributes, so
/// values are looked up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAttributes {
    pub attributes: Vec<Attribute>,
    pub request_id: String,
}

impl QueueAttributes {
    /// Value of the named attribute, if it was returned
    pub fn get(&self, name: impl Into<QueueAttributeName>) -> Option<&str> {
        let name = name.into();
        self.attributes
            .iter()
            .find(|a| a.name == name.as_str())
            .map(|a| a.value.as_str())
    }

    /// Value of the named attribute parsed into `T`
    pub fn get_parsed<T: FromStr>(&self, name: impl Into<QueueAttributeName>) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
