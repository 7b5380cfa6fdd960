//! Decoding of service response and error documents.

use crate::attributes::Attribute;
use crate::batch::{BatchFailure, BatchResultEntry, SendMessageBatchResult};
use crate::error::{FaultType, ServiceError, SqsError};
use crate::message::{Message, MessageId, ReceiptHandle, SendMessageOutput};
use crate::xml::{self, XmlElement};

/// Request correlation data returned with every successful call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMetadata {
    /// Service-assigned id of the request, empty if the service sent none
    pub request_id: String,
}

/// A decoded success document for one action
#[derive(Debug)]
pub(crate) struct ActionResponse {
    root: XmlElement,
    result_name: String,
}

impl ActionResponse {
    /// Parse `body` and check that it answers `action`
    pub fn parse(action: &str, body: &str) -> Result<Self, SqsError> {
        let root = xml::parse(body)?;
        let expected = format!("{}Response", action);
        if root.name != expected {
            return Err(SqsError::deserialization(format!(
                "Expected <{}> but the document root is <{}>",
                expected, root.name
            )));
        }

        Ok(Self {
            root,
            result_name: format!("{}Result", action),
        })
    }

    /// The `<ActionResult>` element; actions without output may omit it
    pub fn result(&self) -> &XmlElement {
        self.root.child(&self.result_name).unwrap_or(&self.root)
    }

    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            request_id: request_id(&self.root).unwrap_or_default(),
        }
    }

    pub fn request_id(&self) -> String {
        self.metadata().request_id
    }
}

fn request_id(root: &XmlElement) -> Option<String> {
    root.child("ResponseMetadata")
        .and_then(|m| m.child_text("RequestId"))
        .or_else(|| root.child_text("RequestId"))
        .map(str::to_string)
}

/// Decode an `ErrorResponse` document returned with a non-success status
///
/// Bodies that are not error documents still produce a [`ServiceError`],
/// carrying the HTTP status and whatever text the body had.
pub(crate) fn parse_error(status: u16, body: &str) -> ServiceError {
    let fallback = || ServiceError {
        status,
        code: "Unknown".to_string(),
        message: if body.trim().is_empty() {
            format!("HTTP {} with empty body", status)
        } else {
            body.trim().chars().take(512).collect()
        },
        fault: FaultType::Unknown,
        request_id: None,
    };

    let root = match xml::parse(body) {
        Ok(root) => root,
        Err(_) => return fallback(),
    };
    let error = match root.find("Error") {
        Some(error) => error,
        None => return fallback(),
    };

    ServiceError {
        status,
        code: error.child_text("Code").unwrap_or("Unknown").to_string(),
        message: error
            .child_text("Message")
            .unwrap_or("Unknown error")
            .to_string(),
        fault: FaultType::parse(error.child_text("Type").unwrap_or_default()),
        request_id: request_id(&root),
    }
}

// ============================================================================
// Queue-level results
// ============================================================================

/// `QueueUrl` of a `CreateQueue` or `GetQueueUrl` result
pub(crate) fn queue_url(response: &ActionResponse) -> Result<String, SqsError> {
    let url = response.result().required_text("QueueUrl")?;
    if url.is_empty() {
        return Err(SqsError::deserialization("Service returned an empty QueueUrl"));
    }
    Ok(url.to_string())
}

pub(crate) fn queue_urls(response: &ActionResponse) -> Vec<String> {
    response
        .result()
        .children_named("QueueUrl")
        .map(|e| e.text.clone())
        .collect()
}

pub(crate) fn attributes(element: &XmlElement) -> Result<Vec<Attribute>, SqsError> {
    element
        .children_named("Attribute")
        .map(|a| -> Result<Attribute, SqsError> {
            Ok(Attribute::new(
                a.required_text("Name")?,
                a.child_text("Value").unwrap_or_default(),
            ))
        })
        .collect()
}

// ============================================================================
// Message results
// ============================================================================

pub(crate) fn send_message(response: &ActionResponse) -> Result<SendMessageOutput, SqsError> {
    let result = response.result();
    Ok(SendMessageOutput {
        message_id: message_id(result)?,
        md5_of_message_body: result.required_text("MD5OfMessageBody")?.to_string(),
        request_id: response.request_id(),
    })
}

pub(crate) fn messages(response: &ActionResponse) -> Result<Vec<Message>, SqsError> {
    response
        .result()
        .children_named("Message")
        .map(|m| -> Result<Message, SqsError> {
            let handle = m.required_text("ReceiptHandle")?;
            Ok(Message {
                message_id: message_id(m)?,
                receipt_handle: ReceiptHandle::new(handle).map_err(|_| {
                    SqsError::deserialization("Message has an empty ReceiptHandle")
                })?,
                md5_of_body: m.required_text("MD5OfBody")?.to_string(),
                body: m.required_text("Body")?.to_string(),
                attributes: attributes(m)?,
            })
        })
        .collect()
}

fn message_id(element: &XmlElement) -> Result<MessageId, SqsError> {
    element
        .required_text("MessageId")?
        .parse()
        .map_err(|_| SqsError::deserialization(format!("<{}> has an empty MessageId", element.name)))
}

// ============================================================================
// Batch results
// ============================================================================

pub(crate) fn send_batch_results(
    response: &ActionResponse,
) -> Result<Vec<SendMessageBatchResult>, SqsError> {
    response
        .result()
        .children_named("SendMessageBatchResultEntry")
        .map(|e| -> Result<SendMessageBatchResult, SqsError> {
            Ok(SendMessageBatchResult {
                id: e.required_text("Id")?.to_string(),
                message_id: message_id(e)?,
                md5_of_message_body: e.required_text("MD5OfMessageBody")?.to_string(),
            })
        })
        .collect()
}

/// Success entries of a delete or visibility-change batch
pub(crate) fn batch_results(
    response: &ActionResponse,
    entry_name: &str,
) -> Result<Vec<BatchResultEntry>, SqsError> {
    response
        .result()
        .children_named(entry_name)
        .map(|e| -> Result<BatchResultEntry, SqsError> {
            Ok(BatchResultEntry {
                id: e.required_text("Id")?.to_string(),
            })
        })
        .collect()
}

pub(crate) fn batch_failures(response: &ActionResponse) -> Result<Vec<BatchFailure>, SqsError> {
    response
        .result()
        .children_named("BatchResultErrorEntry")
        .map(|e| -> Result<BatchFailure, SqsError> {
            Ok(BatchFailure {
                id: e.required_text("Id")?.to_string(),
                code: e.required_text("Code")?.to_string(),
                message: e.child_text("Message").unwrap_or_default().to_string(),
                sender_fault: e
                    .child_text("SenderFault")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
