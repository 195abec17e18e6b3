//! CLI command implementations for Sigil.

pub mod authority;
pub mod keys;
pub mod peer;
pub mod token;

/// Replace the port of a `host:port` bind address.
pub fn with_port(bind: &str, port: u16) -> String {
    let host = bind.rsplit_once(':').map(|(host, _)| host).unwrap_or(bind);
    format!("{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("0.0.0.0:5555", 8080), "0.0.0.0:8080");
        assert_eq!(with_port("localhost", 3001), "localhost:3001");
        assert_eq!(with_port("[::1]:3000", 3001), "[::1]:3001");
    }
}
