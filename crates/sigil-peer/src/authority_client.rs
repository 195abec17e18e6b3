//! Access to the token authority.

use crate::error::PeerError;
use async_trait::async_trait;
use serde_json::json;
use sigil_authority::{Authority, AuthorityError};
use sigil_token::{ClaimRequest, IssueOptions, VerificationResult};
use std::time::Duration;

/// The two authority operations a participant needs.
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    /// Ask for a token signed with `identity`'s key.
    async fn issue_token(
        &self,
        identity: &str,
        request: &ClaimRequest,
        options: IssueOptions,
    ) -> Result<String, PeerError>;

    /// Ask whether `token` was signed by `identity` for `audience`.
    async fn verify_token(
        &self,
        identity: &str,
        token: &str,
        audience: &str,
        subject: &str,
    ) -> Result<VerificationResult, PeerError>;
}

/// Talks to a remote authority over HTTP.
pub struct HttpAuthorityClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthorityClient {
    /// Create a client for the authority at `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PeerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Use an existing client.
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenAuthority for HttpAuthorityClient {
    async fn issue_token(
        &self,
        identity: &str,
        request: &ClaimRequest,
        options: IssueOptions,
    ) -> Result<String, PeerError> {
        let mut url = format!("{}/issueToken/{}", self.endpoint, identity);
        if options.expired {
            url.push_str("?expired=true");
        }
        tracing::debug!(url = %url, "Requesting token from authority");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PeerError::AuthorityRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body.trim().to_string())
    }

    async fn verify_token(
        &self,
        identity: &str,
        token: &str,
        audience: &str,
        subject: &str,
    ) -> Result<VerificationResult, PeerError> {
        let url = format!("{}/verify/{}", self.endpoint, identity);
        tracing::debug!(url = %url, "Asking authority to verify token");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "token": token, "aud": audience, "sub": subject }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // Rejections still carry a result body; anything else is an authority fault.
        serde_json::from_str::<VerificationResult>(&body).map_err(|_| PeerError::AuthorityRejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// An authority living in the same process.
#[async_trait]
impl TokenAuthority for Authority {
    async fn issue_token(
        &self,
        identity: &str,
        request: &ClaimRequest,
        options: IssueOptions,
    ) -> Result<String, PeerError> {
        self.issue(identity, request, options).map_err(|e: AuthorityError| {
            PeerError::AuthorityRejected {
                status: e.status().as_u16(),
                body: e.to_string(),
            }
        })
    }

    async fn verify_token(
        &self,
        identity: &str,
        token: &str,
        audience: &str,
        subject: &str,
    ) -> Result<VerificationResult, PeerError> {
        Ok(self.verify(identity, token, Some(audience), Some(subject)))
    }
}
