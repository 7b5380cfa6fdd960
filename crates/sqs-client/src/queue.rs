//! Handle for message-level operations on one queue.

use crate::attributes::{Attribute, QueueAttributeName, QueueAttributes};
use crate::batch::{
    self, BatchFailure, BatchOutput, BatchResultEntry, ChangeVisibilityBatchEntry,
    DeleteMessageBatchEntry, SendMessageBatchEntry, SendMessageBatchResult,
    CHECKSUM_MISMATCH_CODE,
};
use crate::error::{SqsError, ValidationError};
use crate::message::{
    verify_md5, ReceiptHandle, ReceiveMessageOutput, ReceiveMessageRequest, SendMessageOutput,
    SendMessageRequest,
};
use crate::permission::AccountPermission;
use crate::protocol::QueryRequest;
use crate::response::{self, ResponseMetadata};
use crate::transport::Transport;
use crate::validation::{check_label, check_visibility_timeout};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A queue identified by its URL
///
/// Handles are cheap to clone and share the client's transport. Every call is
/// an independent request; the handle holds no mutable state.
#[derive(Clone)]
pub struct Queue {
    transport: Arc<Transport>,
    url: String,
}

impl Queue {
    pub(crate) fn new(transport: Arc<Transport>, url: String) -> Self {
        Self { transport, url }
    }

    /// URL of the queue
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue name, taken from the last path segment of the URL
    pub fn name(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    fn request(&self, action: &'static str) -> QueryRequest {
        QueryRequest::new(action).param("QueueUrl", &self.url)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Send a message with the queue's default delay
    pub async fn send_message(&self, body: &str) -> Result<SendMessageOutput, SqsError> {
        self.send_message_with(SendMessageRequest::new(body)).await
    }

    /// Send a message, optionally overriding the delivery delay
    ///
    /// The digest returned by the service is checked against the body sent.
    #[instrument(skip(self, request), fields(queue_url = %self.url, body_len = request.body.len()))]
    pub async fn send_message_with(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageOutput, SqsError> {
        request.validate()?;

        let query = self
            .request("SendMessage")
            .param("MessageBody", &request.body)
            .param_opt("DelaySeconds", request.delay_seconds);

        let response = self.transport.send(query).await?;
        let output = response::send_message(&response)?;
        verify_md5(
            &format!("message {}", output.message_id),
            &request.body,
            &output.md5_of_message_body,
        )?;

        debug!(message_id = %output.message_id, "Message sent");
        Ok(output)
    }

    /// Receive up to `max_number_of_messages` messages
    ///
    /// An empty result is normal when the queue is empty or the poll window
    /// elapses without a delivery. Messages whose body fails its MD5 check are
    /// returned separately in `checksum_failures`.
    #[instrument(skip(self, request), fields(
        queue_url = %self.url,
        max_messages = request.max_number_of_messages,
        wait_time = ?request.wait_time_seconds
    ))]
    pub async fn receive_messages(
        &self,
        request: &ReceiveMessageRequest,
    ) -> Result<ReceiveMessageOutput, SqsError> {
        request.validate()?;

        let query = self
            .request("ReceiveMessage")
            .list("AttributeName", &request.attribute_names)
            .param("MaxNumberOfMessages", request.max_number_of_messages)
            .param_opt("WaitTimeSeconds", request.wait_time_seconds)
            .param_opt("VisibilityTimeout", request.visibility_timeout);

        let response = self.transport.send(query).await?;
        let received = response::messages(&response)?;
        let (messages, checksum_failures): (Vec<_>, Vec<_>) = received
            .into_iter()
            .partition(|m| m.verify_checksum().is_ok());
        for message in &checksum_failures {
            warn!(
                message_id = %message.message_id,
                reported = %message.md5_of_body,
                "Received message body does not match its MD5 digest"
            );
        }

        debug!(
            count = messages.len(),
            corrupted = checksum_failures.len(),
            "Messages received"
        );
        Ok(ReceiveMessageOutput {
            messages,
            checksum_failures,
            request_id: response.request_id(),
        })
    }

    /// Delete the delivery identified by `receipt_handle`
    ///
    /// Fails with the service error if the handle is stale.
    #[instrument(skip(self, receipt_handle), fields(queue_url = %self.url))]
    pub async fn delete_message(
        &self,
        receipt_handle: &ReceiptHandle,
    ) -> Result<ResponseMetadata, SqsError> {
        let query = self
            .request("DeleteMessage")
            .param("ReceiptHandle", receipt_handle);

        let response = self.transport.send(query).await?;
        Ok(response.metadata())
    }

    /// Change how long the delivery stays hidden, counted from now
    #[instrument(skip(self, receipt_handle), fields(queue_url = %self.url))]
    pub async fn change_message_visibility(
        &self,
        receipt_handle: &ReceiptHandle,
        visibility_timeout: u32,
    ) -> Result<ResponseMetadata, SqsError> {
        check_visibility_timeout(visibility_timeout)?;

        let query = self
            .request("ChangeMessageVisibility")
            .param("ReceiptHandle", receipt_handle)
            .param("VisibilityTimeout", visibility_timeout);

        let response = self.transport.send(query).await?;
        Ok(response.metadata())
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Send up to 10 messages in one request
    ///
    /// Entries the service rejects are reported in [`BatchOutput::failed`],
    /// as are entries whose reported MD5 digest does not match the body sent
    /// (code [`CHECKSUM_MISMATCH_CODE`]). Only a transport or request-level
    /// failure is an error.
    #[instrument(skip(self, entries), fields(queue_url = %self.url, entries = entries.len()))]
    pub async fn send_message_batch(
        &self,
        entries: &[SendMessageBatchEntry],
    ) -> Result<BatchOutput<SendMessageBatchResult>, SqsError> {
        batch::validate_entries(entries)?;
        batch::validate_payload(entries)?;

        let mut query = self.request("SendMessageBatch");
        for (index, entry) in entries.iter().enumerate() {
            let prefix = format!("SendMessageBatchRequestEntry.{}", index + 1);
            query.push(format!("{}.Id", prefix), &entry.id);
            query.push(format!("{}.MessageBody", prefix), &entry.body);
            if let Some(delay) = entry.delay_seconds {
                query.push(format!("{}.DelaySeconds", prefix), delay);
            }
        }

        let response = self.transport.send(query).await?;
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let mut output = batch::reconcile(
            &ids,
            response::send_batch_results(&response)?,
            response::batch_failures(&response)?,
            response.request_id(),
        )?;

        // A digest mismatch fails only its own entry
        let mut successful = Vec::with_capacity(output.successful.len());
        for result in std::mem::take(&mut output.successful) {
            let checked = match entries.iter().find(|e| e.id == result.id) {
                Some(entry) => verify_md5(
                    &format!("batch entry {}", result.id),
                    &entry.body,
                    &result.md5_of_message_body,
                ),
                None => Ok(()),
            };
            match checked {
                Ok(()) => successful.push(result),
                Err(err) => output.failed.push(BatchFailure {
                    id: result.id,
                    code: CHECKSUM_MISMATCH_CODE.to_string(),
                    message: err.to_string(),
                    sender_fault: false,
                }),
            }
        }
        output.successful = successful;

        log_batch_outcome("SendMessageBatch", &output);
        Ok(output)
    }

    /// Delete up to 10 deliveries in one request
    #[instrument(skip(self, entries), fields(queue_url = %self.url, entries = entries.len()))]
    pub async fn delete_message_batch(
        &self,
        entries: &[DeleteMessageBatchEntry],
    ) -> Result<BatchOutput<BatchResultEntry>, SqsError> {
        batch::validate_entries(entries)?;

        let mut query = self.request("DeleteMessageBatch");
        for (index, entry) in entries.iter().enumerate() {
            let prefix = format!("DeleteMessageBatchRequestEntry.{}", index + 1);
            query.push(format!("{}.Id", prefix), &entry.id);
            query.push(format!("{}.ReceiptHandle", prefix), &entry.receipt_handle);
        }

        let response = self.transport.send(query).await?;
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let output = batch::reconcile(
            &ids,
            response::batch_results(&response, "DeleteMessageBatchResultEntry")?,
            response::batch_failures(&response)?,
            response.request_id(),
        )?;

        log_batch_outcome("DeleteMessageBatch", &output);
        Ok(output)
    }

    /// Change the visibility timeout of up to 10 deliveries in one request
    #[instrument(skip(self, entries), fields(queue_url = %self.url, entries = entries.len()))]
    pub async fn change_message_visibility_batch(
        &self,
        entries: &[ChangeVisibilityBatchEntry],
    ) -> Result<BatchOutput<BatchResultEntry>, SqsError> {
        batch::validate_entries(entries)?;

        let mut query = self.request("ChangeMessageVisibilityBatch");
        for (index, entry) in entries.iter().enumerate() {
            let prefix = format!("ChangeMessageVisibilityBatchRequestEntry.{}", index + 1);
            query.push(format!("{}.Id", prefix), &entry.id);
            query.push(format!("{}.ReceiptHandle", prefix), &entry.receipt_handle);
            query.push(
                format!("{}.VisibilityTimeout", prefix),
                entry.visibility_timeout,
            );
        }

        let response = self.transport.send(query).await?;
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let output = batch::reconcile(
            &ids,
            response::batch_results(&response, "ChangeMessageVisibilityBatchResultEntry")?,
            response::batch_failures(&response)?,
            response.request_id(),
        )?;

        log_batch_outcome("ChangeMessageVisibilityBatch", &output);
        Ok(output)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Fetch the named attributes; no names fetches all of them
    #[instrument(skip(self, names), fields(queue_url = %self.url))]
    pub async fn get_attributes<I, N>(&self, names: I) -> Result<QueueAttributes, SqsError>
    where
        I: IntoIterator<Item = N>,
        N: Into<QueueAttributeName>,
    {
        let mut names: Vec<QueueAttributeName> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            names.push(QueueAttributeName::All);
        }
        if names.iter().any(|n| n.as_str().is_empty()) {
            return Err(ValidationError::Required {
                field: "attribute_name".to_string(),
            }
            .into());
        }

        let query = self
            .request("GetQueueAttributes")
            .list("AttributeName", names.iter().map(QueueAttributeName::as_str));

        let response = self.transport.send(query).await?;
        Ok(QueueAttributes {
            attributes: response::attributes(response.result())?,
            request_id: response.request_id(),
        })
    }

    /// Set one attribute
    pub async fn set_attribute(&self, attribute: &Attribute) -> Result<ResponseMetadata, SqsError> {
        self.set_attributes(std::slice::from_ref(attribute)).await
    }

    /// Set several attributes in one request
    #[instrument(skip(self, attributes), fields(queue_url = %self.url, count = attributes.len()))]
    pub async fn set_attributes(
        &self,
        attributes: &[Attribute],
    ) -> Result<ResponseMetadata, SqsError> {
        if attributes.is_empty() {
            return Err(ValidationError::Required {
                field: "attributes".to_string(),
            }
            .into());
        }
        for attribute in attributes {
            attribute.validate_for_write()?;
        }

        let query = self.request("SetQueueAttributes").attributes(attributes);

        let response = self.transport.send(query).await?;
        info!(
            names = ?attributes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "Queue attributes updated"
        );
        Ok(response.metadata())
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    /// Grant actions to other accounts under `label`
    #[instrument(skip(self, permissions), fields(queue_url = %self.url))]
    pub async fn add_permission(
        &self,
        label: &str,
        permissions: &[AccountPermission],
    ) -> Result<ResponseMetadata, SqsError> {
        check_label(label)?;
        if permissions.is_empty() {
            return Err(ValidationError::Required {
                field: "permissions".to_string(),
            }
            .into());
        }
        for permission in permissions {
            permission.validate()?;
        }

        let query = self
            .request("AddPermission")
            .param("Label", label)
            .list(
                "AWSAccountId",
                permissions.iter().map(|p| p.account_id.as_str()),
            )
            .list("ActionName", permissions.iter().map(|p| p.action.as_str()));

        let response = self.transport.send(query).await?;
        info!(grants = permissions.len(), "Permission added");
        Ok(response.metadata())
    }

    /// Revoke every grant made under `label`
    #[instrument(skip(self), fields(queue_url = %self.url))]
    pub async fn remove_permission(&self, label: &str) -> Result<ResponseMetadata, SqsError> {
        check_label(label)?;

        let query = self.request("RemovePermission").param("Label", label);

        let response = self.transport.send(query).await?;
        info!("Permission removed");
        Ok(response.metadata())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Delete the queue and every message in it
    ///
    /// A missing queue surfaces as the service error.
    #[instrument(skip(self), fields(queue_url = %self.url))]
    pub async fn delete(&self) -> Result<ResponseMetadata, SqsError> {
        let response = self.transport.send(self.request("DeleteQueue")).await?;
        info!("Queue deleted");
        Ok(response.metadata())
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue").field("url", &self.url).finish()
    }
}

fn log_batch_outcome<T>(action: &str, output: &BatchOutput<T>) {
    if output.failed.is_empty() {
        debug!(action, succeeded = output.successful.len(), "Batch completed");
    } else {
        warn!(
            action,
            succeeded = output.successful.len(),
            failed = output.failed.len(),
            "Batch completed with failed entries"
        );
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
