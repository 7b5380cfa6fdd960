//! Account-level client: queue creation, lookup and listing.

use crate::attributes::Attribute;
use crate::config::ClientConfig;
use crate::error::SqsError;
use crate::protocol::QueryRequest;
use crate::queue::Queue;
use crate::response;
use crate::transport::Transport;
use crate::validation::{check_queue_name, check_queue_name_prefix};
use std::sync::Arc;
use tracing::{field, info, instrument, Span};
use url::Url;

/// Client for a queue service endpoint
///
/// Cheap to clone; clones share one HTTP connection pool and signer.
///
/// # Examples
///
/// ```no_run
/// # use sqs_client::{Attribute, ClientConfig, Credentials, ReceiveMessageRequest, SqsClient};
/// # async fn example() -> Result<(), sqs_client::SqsError> {
/// let client = SqsClient::new(ClientConfig::new(Credentials::new("AKID", "secret")))?;
///
/// let queue = client
///     .create_queue("orders", &[Attribute::visibility_timeout(60)])
///     .await?;
/// queue.send_message("hello").await?;
///
/// let received = queue
///     .receive_messages(&ReceiveMessageRequest::new().with_max_messages(10))
///     .await?;
/// for message in &received.messages {
///     queue.delete_message(&message.receipt_handle).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqsClient {
    transport: Arc<Transport>,
}

impl SqsClient {
    /// Create a client after validating `config`
    pub fn new(config: ClientConfig) -> Result<Self, SqsError> {
        let transport = Transport::new(&config)?;
        info!(
            endpoint = %transport.endpoint(),
            region = %config.region,
            "Queue service client created"
        );
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Endpoint every request is sent to
    pub fn endpoint(&self) -> &Url {
        self.transport.endpoint()
    }

    /// Create a queue, or return the existing one if its attributes match
    ///
    /// The service rejects the call with `QueueAlreadyExists` when a queue of
    /// that name exists with different attribute values.
    #[instrument(skip(self, attributes), fields(queue_name = %name, request_id = field::Empty))]
    pub async fn create_queue(
        &self,
        name: &str,
        attributes: &[Attribute],
    ) -> Result<Queue, SqsError> {
        check_queue_name(name)?;
        for attribute in attributes {
            attribute.validate_for_write()?;
        }

        let query = QueryRequest::new("CreateQueue")
            .param("QueueName", name)
            .attributes(attributes);

        let response = self.transport.send(query).await?;
        Span::current().record("request_id", response.request_id().as_str());
        let url = response::queue_url(&response)?;

        info!(queue_url = %url, "Queue created");
        Ok(self.queue(url))
    }

    /// List queue URLs, optionally only those whose name starts with `prefix`
    #[instrument(skip(self), fields(request_id = field::Empty))]
    pub async fn list_queues(&self, prefix: Option<&str>) -> Result<Vec<String>, SqsError> {
        if let Some(prefix) = prefix {
            check_queue_name_prefix(prefix)?;
        }

        let query = QueryRequest::new("ListQueues")
            .param_opt("QueueNamePrefix", prefix.filter(|p| !p.is_empty()));

        let response = self.transport.send(query).await?;
        Span::current().record("request_id", response.request_id().as_str());
        Ok(response::queue_urls(&response))
    }

    /// Resolve the URL of the named queue
    #[instrument(skip(self), fields(request_id = field::Empty))]
    pub async fn get_queue_url(&self, name: &str) -> Result<String, SqsError> {
        check_queue_name(name)?;

        let query = QueryRequest::new("GetQueueUrl").param("QueueName", name);

        let response = self.transport.send(query).await?;
        Span::current().record("request_id", response.request_id().as_str());
        response::queue_url(&response)
    }

    /// Resolve the named queue and return a handle to it
    pub async fn get_queue(&self, name: &str) -> Result<Queue, SqsError> {
        let url = self.get_queue_url(name).await?;
        Ok(self.queue(url))
    }

    /// Handle for a queue whose URL is already known; no request is made
    pub fn queue(&self, url: impl Into<String>) -> Queue {
        Queue::new(Arc::clone(&self.transport), url.into())
    }
}

impl std::fmt::Debug for SqsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsClient")
            .field("transport", &self.transport)
            .finish()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
