//! The four trust flows, caller and callee side.

use crate::bearer::{bearer_value, extract_bearer};
use crate::error::PeerError;
use crate::state::PeerState;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigil_token::{ClaimRequest, ErrorKind, IssueOptions, VerificationResult, inspect_unverified};
use std::collections::BTreeMap;
use std::fmt;

/// Which trust model a flow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustModel {
    /// Tokens issued and verified by the central authority.
    Authority,
    /// Tokens self-signed by the caller, verified with its public key.
    Direct,
}

impl TrustModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustModel::Authority => "authority",
            TrustModel::Direct => "direct",
        }
    }

    /// Callee route for this model.
    pub fn receive_path(&self) -> &'static str {
        match self {
            TrustModel::Authority => "/authority/receive",
            TrustModel::Direct => "/direct/receive",
        }
    }
}

impl fmt::Display for TrustModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one outbound call.
///
/// `status` and `body` are set when the target answered; `error` when the leg
/// failed before any response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallOutcome {
    /// The target answered.
    pub fn response(target: impl Into<String>, status: u16, body: Value) -> Self {
        Self {
            target: target.into(),
            status: Some(status),
            body: Some(body),
            error: None,
        }
    }

    /// The leg never got a response.
    pub fn failed(target: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            target: target.into(),
            status: None,
            body: None,
            error: Some(error.to_string()),
        }
    }

    /// Whether the target answered with a 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }

    /// The callee's verification result, if the body is one.
    pub fn verification(&self) -> Option<VerificationResult> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_value(b.clone()).ok())
    }
}

/// Per-target outcomes of a fan-out, keyed by target identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanOutReport(BTreeMap<String, CallOutcome>);

impl FanOutReport {
    pub fn get(&self, target: &str) -> Option<&CallOutcome> {
        self.0.get(target)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CallOutcome)> {
        self.0.iter()
    }
}

impl FromIterator<CallOutcome> for FanOutReport {
    fn from_iter<I: IntoIterator<Item = CallOutcome>>(iter: I) -> Self {
        Self(iter.into_iter().map(|o| (o.target.clone(), o)).collect())
    }
}

impl PeerState {
    /// Obtain a token from this participant to `target`.
    pub async fn acquire_token(
        &self,
        model: TrustModel,
        target: &str,
        options: IssueOptions,
    ) -> Result<String, PeerError> {
        match model {
            TrustModel::Authority => {
                let request = ClaimRequest::new(self.identity(), target);
                self.authority()
                    .issue_token(self.identity(), &request, options)
                    .await
            }
            TrustModel::Direct => self.direct().sign(target, options),
        }
    }

    /// Call `target` with a fresh token. Never fails; failures land in the outcome.
    pub async fn call(&self, model: TrustModel, target: &str, options: IssueOptions) -> CallOutcome {
        let Some(endpoint) = self.config().endpoint_for(target) else {
            return CallOutcome::failed(target, PeerError::UnknownTarget(target.to_string()));
        };

        let token = match self.acquire_token(model, target, options).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(peer = %target, model = %model, error = %e, "Could not obtain token");
                return CallOutcome::failed(target, e);
            }
        };

        let url = format!("{}{}", endpoint, model.receive_path());
        tracing::info!(peer = %target, url = %url, expired = options.expired, "Calling peer");

        let response = match self
            .http()
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, bearer_value(&token))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(peer = %target, error = %e, "Call failed");
                return CallOutcome::failed(target, e);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(e) => return CallOutcome::failed(target, e),
        };
        tracing::info!(peer = %target, status, "Peer answered");
        CallOutcome::response(target, status, body)
    }

    /// Call the first configured target.
    pub async fn call_single(&self, model: TrustModel, expired: bool) -> Result<CallOutcome, PeerError> {
        let targets = self.config().resolved_targets();
        let target = targets.first().ok_or(PeerError::NotEnoughTargets {
            needed: 1,
            configured: 0,
        })?;
        Ok(self.call(model, target, IssueOptions { expired }).await)
    }

    /// Call the first two targets concurrently, each with its own token.
    ///
    /// The leg whose target equals `expired_target` gets a pre-expired token.
    /// Both legs always run to completion.
    pub async fn fan_out(
        &self,
        model: TrustModel,
        expired_target: Option<&str>,
    ) -> Result<FanOutReport, PeerError> {
        let targets = self.config().resolved_targets();
        let [first, second, ..] = targets.as_slice() else {
            return Err(PeerError::NotEnoughTargets {
                needed: 2,
                configured: targets.len(),
            });
        };
        if targets.len() > 2 {
            tracing::debug!(ignored = ?&targets[2..], "Fan-out uses the first two targets");
        }

        let options_for = |target: &str| IssueOptions {
            expired: expired_target == Some(target),
        };
        let (a, b) = tokio::join!(
            self.call(model, first, options_for(first.as_str())),
            self.call(model, second, options_for(second.as_str())),
        );

        let report: FanOutReport = [a, b].into_iter().collect();
        tracing::info!(
            model = %model,
            succeeded = report.iter().filter(|(_, o)| o.is_success()).count(),
            total = report.len(),
            "Fan-out complete"
        );
        Ok(report)
    }

    /// Callee side: check the bearer token on an inbound request.
    ///
    /// Returns the status to answer with and the verification result.
    pub async fn receive(
        &self,
        model: TrustModel,
        headers: &HeaderMap,
    ) -> Result<(StatusCode, VerificationResult), PeerError> {
        let Some(token) = extract_bearer(headers) else {
            tracing::warn!(model = %model, "Request without bearer token");
            return Ok((
                StatusCode::UNAUTHORIZED,
                VerificationResult::invalid(ErrorKind::MissingToken, "no bearer token"),
            ));
        };

        // The claimed caller only picks the key; verification decides.
        let caller = match inspect_unverified(&token) {
            Ok(info) => info.subject().map(str::to_string),
            Err(e) => {
                return Ok((
                    StatusCode::FORBIDDEN,
                    VerificationResult::invalid(ErrorKind::BadSignature, e.to_string()),
                ));
            }
        };
        let Some(caller) = caller.filter(|c| self.config().trusts(c)) else {
            tracing::warn!(model = %model, "Token from untrusted caller");
            return Ok((
                StatusCode::FORBIDDEN,
                VerificationResult::invalid(ErrorKind::UnknownIdentity, "caller is not trusted"),
            ));
        };

        let result = match model {
            TrustModel::Authority => {
                self.authority()
                    .verify_token(&caller, &token, self.identity(), &caller)
                    .await?
            }
            TrustModel::Direct => self.direct().verify(&token, &caller),
        };

        let status = if result.is_valid() {
            tracing::info!(caller = %caller, model = %model, "Accepted call");
            StatusCode::OK
        } else {
            StatusCode::FORBIDDEN
        };
        Ok((status, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_serialization() {
        let ok = CallOutcome::response("serviceb", 200, json!({"valid": true}));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json, json!({"target": "serviceb", "status": 200, "body": {"valid": true}}));
        assert!(ok.is_success());

        let failed = CallOutcome::failed("servicec", "connection refused");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json, json!({"target": "servicec", "error": "connection refused"}));
        assert!(!failed.is_success());
    }

    #[test]
    fn test_report_keyed_by_target() {
        let report: FanOutReport = [
            CallOutcome::response("serviceb", 200, json!({})),
            CallOutcome::response("servicec", 403, json!({})),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["serviceb"]["status"], 200);
        assert_eq!(json["servicec"]["status"], 403);
    }

    #[test]
    fn test_outcome_verification_body() {
        let body = serde_json::to_value(VerificationResult::invalid(ErrorKind::Expired, "late")).unwrap();
        let outcome = CallOutcome::response("serviceb", 403, body);
        assert_eq!(outcome.verification().unwrap().error_kind(), Some(ErrorKind::Expired));
    }
}
