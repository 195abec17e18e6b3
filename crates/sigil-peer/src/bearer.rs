//! `Authorization: Bearer` plumbing.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

const SCHEME: &str = "Bearer ";

/// Pull the bearer token out of request headers, if there is a non-empty one.
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(SCHEME)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Header value for an outbound call.
pub fn bearer_value(token: &str) -> String {
    format!("{}{}", SCHEME, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")).as_deref(), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(&headers("Bearer   abc  ")).as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejects_missing_or_other_schemes() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer(&headers("abc.def.ghi")), None);
    }

    #[test]
    fn test_bearer_value_round_trips() {
        let value = bearer_value("abc.def.ghi");
        assert_eq!(value, "Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers(&value)).as_deref(), Some("abc.def.ghi"));
    }
}
