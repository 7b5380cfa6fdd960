//! # SQS Client
//!
//! Client library for a managed message-queue service speaking the SQS query
//! protocol (API version `2012-11-05`).
//!
//! This library provides:
//! - Queue lifecycle: create, list, resolve URLs, delete
//! - Message send, receive (with long polling), delete and visibility changes
//! - Batch forms of send, delete and visibility change with per-entry outcomes
//! - Queue attribute and cross-account permission management
//! - AWS Signature V4 signing with caller-supplied static credentials
//!
//! The client is a stateless request/response wrapper. It never retries;
//! [`SqsError::is_transient`] tells callers which failures are worth retrying.
//!
//! ## Module Organization
//!
//! - [`client`] - Account-level operations and the shared transport
//! - [`queue`] - Message-level operations on one queue
//! - [`batch`] - Batch entries and per-entry outcomes
//! - [`attributes`] - Queue attribute names and values
//! - [`message`] - Message types and requests
//! - [`config`] - Client configuration and loading
//! - [`error`] - Error types for all operations

pub mod attributes;
pub mod auth;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod permission;
pub mod protocol;
pub mod queue;
pub mod response;
pub mod validation;

mod transport;
mod xml;

pub use attributes::{Attribute, QueueAttributeName, QueueAttributes};
pub use auth::Credentials;
pub use batch::{
    BatchFailure, BatchOutput, BatchResult, BatchResultEntry, ChangeVisibilityBatchEntry,
    DeleteMessageBatchEntry, SendMessageBatchEntry, SendMessageBatchResult,
    CHECKSUM_MISMATCH_CODE,
};
pub use client::SqsClient;
pub use config::{ClientConfig, ClientConfigBuilder, ClientSettings};
pub use error::{ConfigurationError, FaultType, ServiceError, SqsError, ValidationError};
pub use message::{
    md5_hex, Message, MessageId, ReceiptHandle, ReceiveMessageOutput, ReceiveMessageRequest,
    SendMessageOutput, SendMessageRequest,
};
pub use permission::{AccountPermission, PermissionAction};
pub use protocol::API_VERSION;
pub use queue::Queue;
pub use response::ResponseMetadata;
