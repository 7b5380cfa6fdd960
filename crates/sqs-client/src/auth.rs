//! Static credentials and AWS Signature Version 4 request signing.
//!
//! The signer covers the `host` and `x-amz-date` headers (plus
//! `x-amz-security-token` when a session token is present) and the SHA-256
//! hash of the request body. Query-protocol requests carry all parameters in
//! the form body, so the canonical query string is normally empty.
//!
//! ## References
//!
//! - [AWS Signature V4](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)

use crate::error::{ConfigurationError, SqsError};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "sqs";

/// Caller-supplied static credentials
///
/// `Debug` output never includes the secret key or session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Token for temporary credentials, sent as `x-amz-security-token`
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if self.access_key_id.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "access_key_id".to_string(),
            });
        }
        if self.secret_access_key.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "secret_access_key".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Headers produced by signing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

impl SignedHeaders {
    /// Header name/value pairs to attach to the outgoing request
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            Some(("Authorization", self.authorization.as_str())),
            Some(("x-amz-date", self.amz_date.as_str())),
            self.security_token
                .as_deref()
                .map(|token| ("x-amz-security-token", token)),
        ]
        .into_iter()
        .flatten()
    }
}

/// AWS Signature V4 signer for one region
#[derive(Clone)]
pub(crate) struct RequestSigner {
    credentials: Credentials,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: SERVICE.to_string(),
        }
    }

    /// Sign a request to `url` carrying `body`
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        body: &str,
        timestamp: &DateTime<Utc>,
    ) -> Result<SignedHeaders, SqsError> {
        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        let host = host_header(url)?;
        let canonical_uri = match url.path() {
            "" => "/",
            path => path,
        };

        let mut query = url
            .query_pairs()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v)))
            .collect::<Vec<_>>();
        query.sort();
        let canonical_query_string = query.join("&");

        // Canonical headers must be sorted by name
        let token = self.credentials.session_token.as_deref();
        let (canonical_headers, signed_headers) = match token {
            Some(token) => (
                format!(
                    "host:{}\nx-amz-date:{}\nx-amz-security-token:{}\n",
                    host, amz_date, token
                ),
                "host;x-amz-date;x-amz-security-token",
            ),
            None => (
                format!("host:{}\nx-amz-date:{}\n", host, amz_date),
                "host;x-amz-date",
            ),
        };

        let payload_hash = hex::encode(Sha256::digest(body.as_bytes()));

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            canonical_uri,
            canonical_query_string,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, self.service
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date_stamp)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key_id, credential_scope, signed_headers, signature
        );

        Ok(SignedHeaders {
            authorization,
            amz_date,
            security_token: token.map(str::to_string),
        })
    }

    /// Derive the signing key:
    /// HMAC chain over date, region, service and the `aws4_request` terminator
    /// keyed by `"AWS4" + secret`
    fn signing_key(&self, date_stamp: &str) -> Result<Vec<u8>, SqsError> {
        let k_secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
        hmac_sha256(&k_service, b"aws4_request")
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SqsError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ConfigurationError::Invalid {
        message: format!("Unusable signing key: {}", e),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `Host` header value: host name plus the port when it is not the scheme default
fn host_header(url: &Url) -> Result<String, SqsError> {
    let host = url.host_str().ok_or_else(|| ConfigurationError::Invalid {
        message: format!("Endpoint '{}' has no host", url),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
