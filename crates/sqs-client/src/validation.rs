//! Service limits and client-side parameter checks.
//!
//! Every numeric parameter the service bounds is checked here before a request
//! is built, so out-of-range values fail fast with a [`ValidationError`]
//! instead of a round trip to the service.

use crate::error::ValidationError;

/// Largest message body (and combined batch payload) the service accepts
pub const MAX_MESSAGE_SIZE: usize = 262_144;

/// Smallest value accepted for the `MaximumMessageSize` queue attribute
pub const MIN_MAXIMUM_MESSAGE_SIZE: u32 = 1_024;

/// Maximum number of entries in a single batch request
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Maximum number of messages a single receive can return
pub const MAX_RECEIVE_MESSAGES: u32 = 10;

/// Longest long-poll wait the service allows
pub const MAX_WAIT_TIME_SECONDS: u32 = 20;

/// Longest visibility timeout (12 hours)
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u32 = 43_200;

/// Longest per-message or per-queue delivery delay (15 minutes)
pub const MAX_DELAY_SECONDS: u32 = 900;

/// Shortest message retention period (1 minute)
pub const MIN_RETENTION_SECONDS: u32 = 60;

/// Longest message retention period (14 days)
pub const MAX_RETENTION_SECONDS: u32 = 1_209_600;

/// Maximum length of queue names, batch ids and permission labels
pub const MAX_IDENTIFIER_LENGTH: usize = 80;

const FIFO_SUFFIX: &str = ".fifo";

/// Check an unsigned value against an inclusive range
pub fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<u32, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            message: format!("{} is outside {}..={}", value, min, max),
        });
    }
    Ok(value)
}

pub fn check_visibility_timeout(seconds: u32) -> Result<u32, ValidationError> {
    check_range(
        "visibility_timeout",
        seconds,
        0,
        MAX_VISIBILITY_TIMEOUT_SECONDS,
    )
}

pub fn check_delay_seconds(seconds: u32) -> Result<u32, ValidationError> {
    check_range("delay_seconds", seconds, 0, MAX_DELAY_SECONDS)
}

pub fn check_wait_time(seconds: u32) -> Result<u32, ValidationError> {
    check_range("wait_time_seconds", seconds, 0, MAX_WAIT_TIME_SECONDS)
}

pub fn check_max_messages(count: u32) -> Result<u32, ValidationError> {
    check_range("max_number_of_messages", count, 1, MAX_RECEIVE_MESSAGES)
}

/// Validate a queue name: 1-80 characters of `[A-Za-z0-9_-]`, optionally
/// followed by the `.fifo` suffix (counted towards the length)
pub fn check_queue_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "queue_name".to_string(),
        });
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::OutOfRange {
            field: "queue_name".to_string(),
            message: format!("must be 1-{} characters", MAX_IDENTIFIER_LENGTH),
        });
    }

    let base = name.strip_suffix(FIFO_SUFFIX).unwrap_or(name);
    if base.is_empty() || !is_identifier(base) {
        return Err(ValidationError::InvalidFormat {
            field: "queue_name".to_string(),
            message: "only ASCII alphanumeric, hyphens, underscores and a '.fifo' suffix allowed"
                .to_string(),
        });
    }

    Ok(())
}

/// Validate a queue name prefix used for listing (may be empty)
pub fn check_queue_name_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.len() > MAX_IDENTIFIER_LENGTH || !is_identifier(prefix) {
        return Err(ValidationError::InvalidFormat {
            field: "queue_name_prefix".to_string(),
            message: format!(
                "at most {} ASCII alphanumeric, hyphen or underscore characters",
                MAX_IDENTIFIER_LENGTH
            ),
        });
    }
    Ok(())
}

/// Validate a caller-assigned batch entry id
pub fn check_batch_id(id: &str) -> Result<(), ValidationError> {
    check_identifier("batch_entry_id", id)
}

/// Validate a permission label
pub fn check_label(label: &str) -> Result<(), ValidationError> {
    check_identifier("label", label)
}

/// Validate a 12-digit account id
pub fn check_account_id(account_id: &str) -> Result<(), ValidationError> {
    if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "account_id".to_string(),
            message: format!("'{}' is not a 12-digit account id", account_id),
        });
    }
    Ok(())
}

/// Validate a message body: non-empty, within [`MAX_MESSAGE_SIZE`], and only
/// characters the service accepts (tab, newline, carriage return and
/// `U+0020` upward, excluding the `U+FFFE`/`U+FFFF` noncharacters)
pub fn check_message_body(body: &str) -> Result<(), ValidationError> {
    if body.is_empty() {
        return Err(ValidationError::Required {
            field: "message_body".to_string(),
        });
    }

    if body.len() > MAX_MESSAGE_SIZE {
        return Err(ValidationError::PayloadTooLarge {
            size: body.len(),
            max_size: MAX_MESSAGE_SIZE,
        });
    }

    if let Some(bad) = body.chars().find(|c| !is_allowed_body_char(*c)) {
        return Err(ValidationError::InvalidFormat {
            field: "message_body".to_string(),
            message: format!("character U+{:04X} is not allowed", bad as u32),
        });
    }

    Ok(())
}

/// Validate a receipt handle is present
pub fn check_receipt_handle(handle: &str) -> Result<(), ValidationError> {
    if handle.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "receipt_handle".to_string(),
        });
    }
    Ok(())
}

fn check_identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_IDENTIFIER_LENGTH || !is_identifier(value) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            message: format!(
                "'{}' must be 1-{} ASCII alphanumeric, hyphen or underscore characters",
                value, MAX_IDENTIFIER_LENGTH
            ),
        });
    }

    Ok(())
}

fn is_identifier(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_allowed_body_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
