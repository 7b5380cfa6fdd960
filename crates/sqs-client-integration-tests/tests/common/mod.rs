//! Common test utilities for sqs-client integration tests
//!
//! This module provides:
//! - `FakeSqs`, an in-process queue service mounted on a wiremock server
//! - `TestContext`, bundling the server, the fake and a client pointed at it
//! - Tracing setup controlled by `RUST_LOG`

use md5::{Digest, Md5};
use sqs_client::{ClientConfig, Credentials, SqsClient};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ACCOUNT_ID: &str = "123456789012";

const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";

// ============================================================================
// Test Context
// ============================================================================

/// A running fake service and a client configured against it
#[allow(dead_code)]
pub struct TestContext {
    pub server: MockServer,
    pub fake: FakeSqs,
    pub client: SqsClient,
}

impl TestContext {
    /// Number of requests that reached the fake service
    #[allow(dead_code)]
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

/// Start a fake queue service and build a client for it
pub async fn start() -> TestContext {
    init_tracing();

    let server = MockServer::start().await;
    let fake = FakeSqs::new(server.uri());
    Mock::given(method("POST"))
        .respond_with(fake.clone())
        .mount(&server)
        .await;

    let config = ClientConfig::new(Credentials::new("AKIDEXAMPLE", "fake-secret"))
        .with_endpoint(server.uri())
        .with_timeout(Duration::from_secs(5));
    let client = SqsClient::new(config).expect("client should build against the fake service");

    TestContext {
        server,
        fake,
        client,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Fake Queue Service
// ============================================================================

/// Stateful in-process queue service speaking the query protocol
///
/// Honours visibility timeouts, delays, single-use receipt handles, batch
/// entry semantics, attributes and permissions. Long polling returns
/// immediately.
#[derive(Clone)]
pub struct FakeSqs {
    base_url: String,
    queues: Arc<Mutex<BTreeMap<String, FakeQueue>>>,
}

struct FakeQueue {
    url: String,
    attributes: BTreeMap<String, String>,
    messages: Vec<StoredMessage>,
    permissions: BTreeMap<String, Vec<(String, String)>>,
}

struct StoredMessage {
    message_id: String,
    body: String,
    md5: String,
    sent_at_ms: u128,
    first_received_at_ms: Option<u128>,
    available_at: Instant,
    receipt: Option<String>,
    receive_count: u32,
}

impl StoredMessage {
    /// True if `handle` is the receipt of the current, unexpired delivery
    fn is_in_flight_with(&self, handle: &str, now: Instant) -> bool {
        self.receipt.as_deref() == Some(handle) && self.available_at > now
    }
}

/// Outcome of handling one action
type Reply = Result<String, FakeError>;

struct FakeError {
    status: u16,
    code: String,
    message: String,
}

impl FakeError {
    fn sender(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: 400,
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn no_queue() -> Self {
        Self::sender(
            NON_EXISTENT_QUEUE,
            "The specified queue does not exist for this wsdl version.",
        )
    }
}

/// Decoded form parameters of one request
struct Params(Vec<(String, String)>);

impl Params {
    fn parse(body: &[u8]) -> Self {
        Self(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn number(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Values of `prefix.1`, `prefix.2`, ... until the first gap
    fn list(&self, prefix: &str) -> Vec<String> {
        (1..)
            .map_while(|n| self.get(&format!("{}.{}", prefix, n)).map(str::to_string))
            .collect()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        (1..)
            .map_while(|n| {
                let name = self.get(&format!("Attribute.{}.Name", n))?;
                let value = self.get(&format!("Attribute.{}.Value", n)).unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Batch entries as maps of field name to value
    fn entries(&self, prefix: &str) -> Vec<BTreeMap<String, String>> {
        (1..)
            .map_while(|n| {
                let entry_prefix = format!("{}.{}.", prefix, n);
                let fields: BTreeMap<String, String> = self
                    .0
                    .iter()
                    .filter_map(|(k, v)| {
                        k.strip_prefix(&entry_prefix)
                            .map(|field| (field.to_string(), v.clone()))
                    })
                    .collect();
                fields.contains_key("Id").then_some(fields)
            })
            .collect()
    }
}

impl FakeSqs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            queues: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Messages stored in the named queue, in flight or not
    #[allow(dead_code)]
    pub fn message_count(&self, queue_name: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue_name)
            .map(|q| q.messages.len())
            .unwrap_or_default()
    }

    /// Accounts granted under `label` on the named queue
    #[allow(dead_code)]
    pub fn permission(&self, queue_name: &str, label: &str) -> Option<Vec<(String, String)>> {
        self.queues
            .lock()
            .unwrap()
            .get(queue_name)
            .and_then(|q| q.permissions.get(label).cloned())
    }

    fn handle(&self, action: &str, params: &Params) -> Reply {
        let mut queues = self.queues.lock().unwrap();
        match action {
            "CreateQueue" => self.create_queue(&mut queues, params),
            "ListQueues" => Ok(list_queues(&queues, params)),
            "GetQueueUrl" => {
                let name = params.get("QueueName").unwrap_or_default();
                let queue = queues.get(name).ok_or_else(FakeError::no_queue)?;
                Ok(format!("<QueueUrl>{}</QueueUrl>", escape(&queue.url)))
            }
            "DeleteQueue" => {
                let name = queue_name(params)?;
                queues.remove(&name).ok_or_else(FakeError::no_queue)?;
                Ok(String::new())
            }
            _ => {
                let name = queue_name(params)?;
                let queue = queues.get_mut(&name).ok_or_else(FakeError::no_queue)?;
                queue_action(queue, action, params)
            }
        }
    }

    fn create_queue(&self, queues: &mut BTreeMap<String, FakeQueue>, params: &Params) -> Reply {
        let name = params
            .get("QueueName")
            .ok_or_else(|| FakeError::sender("MissingParameter", "QueueName is required"))?
            .to_string();
        let requested = params.attributes();

        if let Some(existing) = queues.get(&name) {
            let conflict = requested
                .iter()
                .find(|(k, v)| existing.attributes.get(k) != Some(v));
            if let Some((attribute, _)) = conflict {
                return Err(FakeError::sender(
                    "QueueAlreadyExists",
                    format!(
                        "A queue already exists with the same name and a different value for attribute {}",
                        attribute
                    ),
                ));
            }
            return Ok(format!("<QueueUrl>{}</QueueUrl>", escape(&existing.url)));
        }

        let url = format!("{}/{}/{}", self.base_url, ACCOUNT_ID, name);
        let mut attributes: BTreeMap<String, String> = [
            ("VisibilityTimeout", "30"),
            ("DelaySeconds", "0"),
            ("MaximumMessageSize", "262144"),
            ("MessageRetentionPeriod", "345600"),
            ("ReceiveMessageWaitTimeSeconds", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        attributes.insert(
            "QueueArn".to_string(),
            format!("arn:aws:sqs:us-east-1:{}:{}", ACCOUNT_ID, name),
        );
        attributes.insert("CreatedTimestamp".to_string(), (epoch_millis() / 1000).to_string());
        attributes.extend(requested);

        queues.insert(
            name,
            FakeQueue {
                url: url.clone(),
                attributes,
                messages: Vec::new(),
                permissions: BTreeMap::new(),
            },
        );
        Ok(format!("<QueueUrl>{}</QueueUrl>", escape(&url)))
    }
}

impl Respond for FakeSqs {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if !request.headers.contains_key("authorization") {
            return error_response(&FakeError {
                status: 403,
                code: "MissingAuthenticationToken".to_string(),
                message: "Request is missing Authentication Token".to_string(),
            });
        }

        let params = Params::parse(&request.body);
        let action = params.get("Action").unwrap_or_default().to_string();
        match self.handle(&action, &params) {
            Ok(result) => success_response(&action, &result),
            Err(error) => error_response(&error),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

fn queue_name(params: &Params) -> Result<String, FakeError> {
    params
        .get("QueueUrl")
        .and_then(|url| url.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(FakeError::no_queue)
}

fn list_queues(queues: &BTreeMap<String, FakeQueue>, params: &Params) -> String {
    let prefix = params.get("QueueNamePrefix").unwrap_or_default();
    queues
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(_, q)| format!("<QueueUrl>{}</QueueUrl>", escape(&q.url)))
        .collect()
}

fn queue_action(queue: &mut FakeQueue, action: &str, params: &Params) -> Reply {
    let now = Instant::now();
    match action {
        "SendMessage" => {
            let body = params.get("MessageBody").unwrap_or_default();
            let (message_id, md5) = send(queue, body, params.number("DelaySeconds"), now)?;
            Ok(format!(
                "<MD5OfMessageBody>{}</MD5OfMessageBody><MessageId>{}</MessageId>",
                md5, message_id
            ))
        }
        "ReceiveMessage" => Ok(receive(queue, params, now)),
        "DeleteMessage" => {
            let handle = params.get("ReceiptHandle").unwrap_or_default();
            delete(queue, handle, now)?;
            Ok(String::new())
        }
        "ChangeMessageVisibility" => {
            let handle = params.get("ReceiptHandle").unwrap_or_default();
            let timeout = params.number("VisibilityTimeout").unwrap_or_default();
            change_visibility(queue, handle, timeout, now)?;
            Ok(String::new())
        }
        "SendMessageBatch" => Ok(batch(
            params.entries("SendMessageBatchRequestEntry"),
            |entry| {
                let body = entry.get("MessageBody").map(String::as_str).unwrap_or_default();
                let delay = entry.get("DelaySeconds").and_then(|d| d.parse().ok());
                let (message_id, md5) = send(queue, body, delay, now)?;
                Ok(format!(
                    "<SendMessageBatchResultEntry><Id>{}</Id><MessageId>{}</MessageId>\
                     <MD5OfMessageBody>{}</MD5OfMessageBody></SendMessageBatchResultEntry>",
                    escape(&entry["Id"]),
                    message_id,
                    md5
                ))
            },
        )),
        "DeleteMessageBatch" => Ok(batch(
            params.entries("DeleteMessageBatchRequestEntry"),
            |entry| {
                let handle = entry.get("ReceiptHandle").map(String::as_str).unwrap_or_default();
                delete(queue, handle, now)?;
                Ok(format!(
                    "<DeleteMessageBatchResultEntry><Id>{}</Id></DeleteMessageBatchResultEntry>",
                    escape(&entry["Id"])
                ))
            },
        )),
        "ChangeMessageVisibilityBatch" => Ok(batch(
            params.entries("ChangeMessageVisibilityBatchRequestEntry"),
            |entry| {
                let handle = entry.get("ReceiptHandle").map(String::as_str).unwrap_or_default();
                let timeout = entry
                    .get("VisibilityTimeout")
                    .and_then(|t| t.parse().ok())
                    .unwrap_or_default();
                change_visibility(queue, handle, timeout, now)?;
                Ok(format!(
                    "<ChangeMessageVisibilityBatchResultEntry><Id>{}</Id>\
                     </ChangeMessageVisibilityBatchResultEntry>",
                    escape(&entry["Id"])
                ))
            },
        )),
        "GetQueueAttributes" => Ok(get_attributes(queue, &params.list("AttributeName"), now)),
        "SetQueueAttributes" => {
            queue.attributes.extend(params.attributes());
            Ok(String::new())
        }
        "AddPermission" => {
            let label = params.get("Label").unwrap_or_default().to_string();
            if queue.permissions.contains_key(&label) {
                return Err(FakeError::sender(
                    "InvalidParameterValue",
                    format!("Value {} for parameter Label is invalid. Reason: Already exists.", label),
                ));
            }
            let grants = params
                .list("AWSAccountId")
                .into_iter()
                .zip(params.list("ActionName"))
                .collect();
            queue.permissions.insert(label, grants);
            Ok(String::new())
        }
        "RemovePermission" => {
            let label = params.get("Label").unwrap_or_default();
            queue.permissions.remove(label).ok_or_else(|| {
                FakeError::sender(
                    "InvalidParameterValue",
                    format!("Value {} for parameter Label is invalid. Reason: can't find label.", label),
                )
            })?;
            Ok(String::new())
        }
        other => Err(FakeError::sender(
            "InvalidAction",
            format!("The action {} is not valid for this endpoint.", other),
        )),
    }
}

fn send(
    queue: &mut FakeQueue,
    body: &str,
    delay: Option<u64>,
    now: Instant,
) -> Result<(String, String), FakeError> {
    let max_size: usize = queue.attributes["MaximumMessageSize"].parse().unwrap_or(262_144);
    if body.is_empty() || body.len() > max_size {
        return Err(FakeError::sender(
            "InvalidParameterValue",
            format!("Message must be between 1 and {} bytes long.", max_size),
        ));
    }

    let delay = delay.unwrap_or_else(|| queue.attributes["DelaySeconds"].parse().unwrap_or(0));
    let message_id = uuid::Uuid::new_v4().to_string();
    let md5 = md5_hex(body);
    queue.messages.push(StoredMessage {
        message_id: message_id.clone(),
        body: body.to_string(),
        md5: md5.clone(),
        sent_at_ms: epoch_millis(),
        first_received_at_ms: None,
        available_at: now + Duration::from_secs(delay),
        receipt: None,
        receive_count: 0,
    });
    Ok((message_id, md5))
}

fn receive(queue: &mut FakeQueue, params: &Params, now: Instant) -> String {
    let max = params.number("MaxNumberOfMessages").unwrap_or(1) as usize;
    let visibility = params
        .number("VisibilityTimeout")
        .unwrap_or_else(|| queue.attributes["VisibilityTimeout"].parse().unwrap_or(30));
    let wanted = params.list("AttributeName");
    let wants = |name: &str| wanted.iter().any(|w| w == "All" || w == name);

    let mut result = String::new();
    for message in queue
        .messages
        .iter_mut()
        .filter(|m| m.available_at <= now)
        .take(max)
    {
        let receipt = format!("{}#{}", message.message_id, uuid::Uuid::new_v4());
        message.receipt = Some(receipt.clone());
        message.available_at = now + Duration::from_secs(visibility);
        message.receive_count += 1;
        let first_received = *message.first_received_at_ms.get_or_insert_with(epoch_millis);

        let mut attributes = String::new();
        for (name, value) in [
            ("SentTimestamp", message.sent_at_ms.to_string()),
            ("ApproximateReceiveCount", message.receive_count.to_string()),
            ("ApproximateFirstReceiveTimestamp", first_received.to_string()),
        ] {
            if wants(name) {
                attributes.push_str(&attribute_xml(name, &value));
            }
        }

        result.push_str(&format!(
            "<Message><MessageId>{}</MessageId><ReceiptHandle>{}</ReceiptHandle>\
             <MD5OfBody>{}</MD5OfBody><Body>{}</Body>{}</Message>",
            message.message_id,
            escape(&receipt),
            message.md5,
            escape(&message.body),
            attributes
        ));
    }
    result
}

fn delete(queue: &mut FakeQueue, handle: &str, now: Instant) -> Result<(), FakeError> {
    let index = queue
        .messages
        .iter()
        .position(|m| m.is_in_flight_with(handle, now))
        .ok_or_else(|| {
            FakeError::sender(
                "ReceiptHandleIsInvalid",
                format!("The input receipt handle \"{}\" is not a valid receipt handle.", handle),
            )
        })?;
    queue.messages.remove(index);
    Ok(())
}

fn change_visibility(
    queue: &mut FakeQueue,
    handle: &str,
    timeout: u64,
    now: Instant,
) -> Result<(), FakeError> {
    let message = queue
        .messages
        .iter_mut()
        .find(|m| m.is_in_flight_with(handle, now))
        .ok_or_else(|| {
            FakeError::sender(
                "MessageNotInflight",
                format!("Message with receipt handle {} is not in flight.", handle),
            )
        })?;
    message.available_at = now + Duration::from_secs(timeout);
    Ok(())
}

/// Apply `apply` to each entry, collecting result or error entries
fn batch<F>(entries: Vec<BTreeMap<String, String>>, mut apply: F) -> String
where
    F: FnMut(&BTreeMap<String, String>) -> Result<String, FakeError>,
{
    entries
        .iter()
        .map(|entry| match apply(entry) {
            Ok(result) => result,
            Err(error) => format!(
                "<BatchResultErrorEntry><Id>{}</Id><Code>{}</Code><Message>{}</Message>\
                 <SenderFault>true</SenderFault></BatchResultErrorEntry>",
                escape(&entry["Id"]),
                error.code,
                escape(&error.message)
            ),
        })
        .collect()
}

fn get_attributes(queue: &FakeQueue, names: &[String], now: Instant) -> String {
    let visible = queue.messages.iter().filter(|m| m.available_at <= now).count();
    let in_flight = queue.messages.iter().filter(|m| m.receipt.is_some() && m.available_at > now).count();
    let delayed = queue.messages.len() - visible - in_flight;

    let mut all = queue.attributes.clone();
    all.insert("ApproximateNumberOfMessages".to_string(), visible.to_string());
    all.insert("ApproximateNumberOfMessagesNotVisible".to_string(), in_flight.to_string());
    all.insert("ApproximateNumberOfMessagesDelayed".to_string(), delayed.to_string());

    all.iter()
        .filter(|(name, _)| names.iter().any(|n| n == "All" || n == *name))
        .map(|(name, value)| attribute_xml(name, value))
        .collect()
}

// ============================================================================
// Documents
// ============================================================================

fn success_response(action: &str, result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<?xml version=\"1.0\"?><{action}Response xmlns=\"http://queue.amazonaws.com/doc/2012-11-05/\">\
         <{action}Result>{result}</{action}Result>\
         <ResponseMetadata><RequestId>{request_id}</RequestId></ResponseMetadata>\
         </{action}Response>",
        action = action,
        result = result,
        request_id = uuid::Uuid::new_v4()
    ))
}

fn error_response(error: &FakeError) -> ResponseTemplate {
    ResponseTemplate::new(error.status).set_body_string(format!(
        "<?xml version=\"1.0\"?><ErrorResponse><Error><Type>Sender</Type>\
         <Code>{}</Code><Message>{}</Message><Detail/></Error>\
         <RequestId>{}</RequestId></ErrorResponse>",
        error.code,
        escape(&error.message),
        uuid::Uuid::new_v4()
    ))
}

fn attribute_xml(name: &str, value: &str) -> String {
    format!(
        "<Attribute><Name>{}</Name><Value>{}</Value></Attribute>",
        name,
        escape(value)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn md5_hex(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
