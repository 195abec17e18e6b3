//! Token commands.
//!
//! `sigil token issue` - Sign a token with a private key file.
//! `sigil token verify` - Verify a token with a public key file.
//! `sigil token inspect` - Decode a token without verifying it.

use anyhow::{Context, bail};
use sigil_token::keys::load_public_key_file;
use sigil_token::{
    ClaimValue, ExtraClaims, IssueOptions, KeyPair, TokenIssuer, TokenVerifier, inspect_unverified,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments of `sigil token issue`.
#[derive(Debug)]
pub struct IssueArgs {
    pub key: PathBuf,
    pub subject: String,
    pub audience: String,
    pub claims: Vec<String>,
    pub expired: bool,
    pub validity: u64,
    pub issuer: String,
}

/// Parse `name=value` pairs into extra claims.
fn parse_claims(raw: &[String]) -> anyhow::Result<ExtraClaims> {
    raw.iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .with_context(|| format!("Invalid claim '{}', expected name=value", pair))?;
            let name = name.trim();
            if name.is_empty() {
                bail!("Invalid claim '{}', name is empty", pair);
            }
            Ok((name.to_string(), ClaimValue::parse_loose(value)))
        })
        .collect()
}

/// Accept either a token or a path to a file holding one.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).is_file() {
        let contents = fs::read_to_string(&token)
            .with_context(|| format!("Failed to read token file: {}", token))?;
        Ok(contents.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

/// Sign a token and return it.
pub fn build(args: IssueArgs) -> anyhow::Result<String> {
    let keypair = KeyPair::load_private_file(&args.subject, &args.key)
        .with_context(|| format!("Failed to load private key from file: {}", args.key.display()))?;
    let extra = parse_claims(&args.claims)?;
    let options = IssueOptions {
        expired: args.expired,
    };

    TokenIssuer::with_validity_secs(args.issuer, args.validity)
        .issue(&keypair, &args.subject, &args.audience, &extra, options)
        .context("Failed to sign token")
}

/// Sign a token and print it or write it to `output`.
pub fn issue(args: IssueArgs, output: Option<PathBuf>) -> anyhow::Result<()> {
    let token = build(args)?;

    if let Some(output_path) = output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
    } else {
        println!("{}", token);
    }

    Ok(())
}

/// Verify a token and print the result.
pub fn verify(
    public_key: &Path,
    token: String,
    audience: &str,
    subject: &str,
    issuer: &str,
) -> anyhow::Result<()> {
    let key = load_public_key_file(public_key)
        .with_context(|| format!("Failed to load public key from file: {}", public_key.display()))?;
    let token = read_token(token)?;

    let result = TokenVerifier::new(issuer).verify(&token, Some(audience), Some(subject), &key);
    println!("{}", serde_json::to_string_pretty(&result)?);

    match result.error_kind() {
        None => {
            println!("✔ Token is valid");
            Ok(())
        }
        Some(kind) => bail!("✖ Token verification failed: {}", kind),
    }
}

/// Print a token's header and claims without verifying anything.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let info = inspect_unverified(&token)?;

    println!("Token Information (unverified):");
    println!("  Algorithm: {:?}", info.header.alg);
    if let Some(kid) = &info.header.kid {
        println!("  Key ID: {}", kid);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_token::keys::{private_key_path, public_key_path};
    use std::sync::LazyLock;
    use tempfile::{TempDir, tempdir};

    static KEYS: LazyLock<KeyPair> = LazyLock::new(|| KeyPair::generate("servicea").unwrap());

    fn key_dir() -> TempDir {
        let dir = tempdir().unwrap();
        KEYS.save_to_dir(dir.path()).unwrap();
        dir
    }

    fn args(dir: &Path) -> IssueArgs {
        IssueArgs {
            key: private_key_path(dir, "servicea"),
            subject: "servicea".into(),
            audience: "serviceb".into(),
            claims: vec!["scope=read".into(), "level=3".into()],
            expired: false,
            validity: 60,
            issuer: "https://service-issuer".into(),
        }
    }

    #[test]
    fn test_parse_claims() {
        let claims = parse_claims(&["scope=read".into(), "admin=true".into(), "url=a=b".into()]).unwrap();
        assert_eq!(claims.get("scope"), Some(&ClaimValue::from("read")));
        assert_eq!(claims.get("admin"), Some(&ClaimValue::from(true)));
        assert_eq!(claims.get("url"), Some(&ClaimValue::from("a=b")));

        assert!(parse_claims(&["noequals".into()]).is_err());
        assert!(parse_claims(&["=value".into()]).is_err());
    }

    #[test]
    fn test_issue_then_verify() {
        let dir = key_dir();
        let token = build(args(dir.path())).unwrap();

        let info = inspect_unverified(&token).unwrap();
        assert_eq!(info.claims["scope"], "read");
        assert_eq!(info.claims["level"], 3);

        verify(
            &public_key_path(dir.path(), "servicea"),
            token.clone(),
            "serviceb",
            "servicea",
            "https://service-issuer",
        )
        .unwrap();

        assert!(
            verify(
                &public_key_path(dir.path(), "servicea"),
                token,
                "servicec",
                "servicea",
                "https://service-issuer",
            )
            .is_err()
        );
    }

    #[test]
    fn test_expired_token_fails_verification() {
        let dir = key_dir();
        let token = build(IssueArgs {
            expired: true,
            ..args(dir.path())
        })
        .unwrap();

        let err = verify(
            &public_key_path(dir.path(), "servicea"),
            token,
            "serviceb",
            "servicea",
            "https://service-issuer",
        )
        .unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_token_from_file() {
        let dir = key_dir();
        let token_path = dir.path().join("token.jwt");
        issue(args(dir.path()), Some(token_path.clone())).unwrap();

        inspect(token_path.to_string_lossy().to_string()).unwrap();
        verify(
            &public_key_path(dir.path(), "servicea"),
            token_path.to_string_lossy().to_string(),
            "serviceb",
            "servicea",
            "https://service-issuer",
        )
        .unwrap();
    }
}
