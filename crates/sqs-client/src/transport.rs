//! Signed HTTP transport shared by the client and every queue handle.

use crate::auth::RequestSigner;
use crate::config::ClientConfig;
use crate::error::{ConfigurationError, SqsError};
use crate::protocol::QueryRequest;
use crate::response::{self, ActionResponse};
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Immutable request pipeline: encode, sign, POST, decode
pub(crate) struct Transport {
    http: reqwest::Client,
    signer: RequestSigner,
    endpoint: Url,
    api_version: String,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self, SqsError> {
        let endpoint = config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            signer: RequestSigner::new(config.credentials.clone(), config.region.clone()),
            endpoint,
            api_version: config.api_version.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one query-protocol request and decode the success document
    ///
    /// Non-success statuses are decoded into [`SqsError::Service`]. Nothing
    /// is retried.
    #[instrument(skip(self, request), fields(action = request.action()))]
    pub async fn send(&self, request: QueryRequest) -> Result<ActionResponse, SqsError> {
        let body = request.encode(&self.api_version);
        let signed = self.signer.sign("POST", &self.endpoint, &body, &Utc::now())?;

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        for (name, value) in signed.iter() {
            builder = builder.header(name, value);
        }

        debug!(endpoint = %self.endpoint, body_len = body.len(), "Sending request");

        let response = builder.body(body).send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let error = response::parse_error(status.as_u16(), &text);
            warn!(
                status = error.status,
                code = %error.code,
                request_id = error.request_id.as_deref().unwrap_or(""),
                "Service rejected request"
            );
            return Err(SqsError::Service(error));
        }

        let decoded = ActionResponse::parse(request.action(), &text)?;
        debug!(
            status = status.as_u16(),
            request_id = %decoded.request_id(),
            "Request completed"
        );
        Ok(decoded)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .field("signer", &self.signer)
            .finish()
    }
}

fn transport_error(e: reqwest::Error) -> SqsError {
    if e.is_timeout() {
        SqsError::Timeout {
            message: e.to_string(),
        }
    } else {
        SqsError::Transport {
            message: e.to_string(),
        }
    }
}
