//! Request and response bodies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AuthorityError;

/// Body of `POST /verify/{identity}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
    /// Expected audience.
    #[serde(default)]
    pub aud: Option<String>,
    /// Expected subject.
    #[serde(default)]
    pub sub: Option<String>,
}

/// A public key, base64-encoded PEM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

/// Where a dump went and what it contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpResponse {
    pub directory: String,
    pub identities: Vec<String>,
}

/// `?expired=...` on the issue route.
#[derive(Debug, Default, Deserialize)]
pub struct IssueQuery {
    #[serde(default)]
    pub expired: Option<String>,
}

impl IssueQuery {
    /// Any value other than empty, `false` or `0` turns the flag on.
    pub fn expired(&self) -> bool {
        is_truthy(self.expired.as_deref())
    }
}

pub fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v.eq_ignore_ascii_case("false") || v == "0"),
    }
}

/// Parse an optional JSON body. An empty body is the default value.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AuthorityError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AuthorityError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_token::{ClaimRequest, ClaimValue};

    #[test]
    fn test_truthy_values() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some("")));
        assert!(!is_truthy(Some("false")));
        assert!(!is_truthy(Some("FALSE")));
        assert!(!is_truthy(Some("0")));
        assert!(is_truthy(Some("true")));
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("yes")));
    }

    #[test]
    fn test_parse_body() {
        let empty: ClaimRequest = parse_body(b"").unwrap();
        assert!(empty.is_empty());

        let req: ClaimRequest = parse_body(br#"{"aud":"serviceb","scope":"read","n":3}"#).unwrap();
        assert_eq!(req.aud.as_deref(), Some("serviceb"));
        assert_eq!(req.extra.get("scope"), Some(&ClaimValue::from("read")));
        assert_eq!(req.extra.get("n"), Some(&ClaimValue::from(3i64)));

        let nested = parse_body::<ClaimRequest>(br#"{"aud":"b","roles":["x"]}"#);
        assert!(matches!(nested, Err(AuthorityError::InvalidRequest(_))));

        let garbage = parse_body::<VerifyRequest>(b"not json");
        assert!(matches!(garbage, Err(AuthorityError::InvalidRequest(_))));
    }

    #[test]
    fn test_public_key_wire_name() {
        let json = serde_json::to_value(PublicKeyResponse { public_key: "abc".into() }).unwrap();
        assert_eq!(json["publicKey"], "abc");
    }
}
