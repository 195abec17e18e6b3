use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sigil", version, about = "Service-to-service token trust")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the central token authority.
    Authority {
        /// Configuration file (default: $SIGIL_CONFIG, then ./sigil.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address, e.g. 0.0.0.0:5555
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on; replaces the port of the bind address
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Directory of <identity>-{public,private}.pem files
        #[arg(long, env = "KEYS_DIR")]
        keys_dir: Option<PathBuf>,

        /// Issuer stamped into and required in every token
        #[arg(long, env = "ISSUER")]
        issuer: Option<String>,
    },

    /// Run a participant service.
    Peer {
        /// Configuration file (default: $SIGIL_CONFIG, then ./sigil.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address, e.g. 0.0.0.0:3000
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on; replaces the port of the bind address
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// This participant's identity
        #[arg(long, env = "SERVICE_NAME")]
        identity: Option<String>,

        /// Base URL of the token authority
        #[arg(long, env = "AUTHORITY_ENDPOINT")]
        authority_endpoint: Option<String>,

        /// Directory with own private key and trusted callers' public keys
        #[arg(long, env = "KEYS_DIR")]
        keys_dir: Option<PathBuf>,

        /// Issuer for self-signed tokens
        #[arg(long, env = "ISSUER")]
        issuer: Option<String>,
    },

    /// Key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Offline token operations
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a key pair for direct peer trust
    Generate {
        /// Identity the pair belongs to
        #[arg(long)]
        identity: String,

        /// Directory to write <identity>-public.pem and <identity>-private.pem into
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Sign a token with a private key file
    Issue {
        /// Private key PEM file
        #[arg(long)]
        key: PathBuf,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        audience: String,

        /// Extra claim as name=value; repeatable
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// Issue an already expired token
        #[arg(long, default_value_t = false)]
        expired: bool,

        /// Validity window in seconds
        #[arg(long, default_value_t = 60)]
        validity: u64,

        #[arg(long, env = "ISSUER", default_value = "https://service-issuer")]
        issuer: String,

        /// Write the token to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify a token with a public key file
    Verify {
        /// Public key PEM file
        #[arg(long)]
        public_key: PathBuf,

        /// Token string or path to a file containing it
        #[arg(long)]
        token: String,

        #[arg(long)]
        audience: String,

        #[arg(long)]
        subject: String,

        #[arg(long, env = "ISSUER", default_value = "https://service-issuer")]
        issuer: String,
    },

    /// Decode a token without verifying it
    Inspect {
        /// Token string or path to a file containing it
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Authority {
            config,
            bind,
            port,
            keys_dir,
            issuer,
        } => {
            let overrides = commands::authority::Overrides {
                bind,
                port,
                keys_dir,
                issuer,
            };
            commands::authority::run(config.as_deref(), overrides).await?
        }

        Command::Peer {
            config,
            bind,
            port,
            identity,
            authority_endpoint,
            keys_dir,
            issuer,
        } => {
            let overrides = commands::peer::Overrides {
                bind,
                port,
                identity,
                authority_endpoint,
                keys_dir,
                issuer,
            };
            commands::peer::run(config.as_deref(), overrides).await?
        }

        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { identity, output } => commands::keys::generate(&identity, output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                key,
                subject,
                audience,
                claims,
                expired,
                validity,
                issuer,
                output,
            } => {
                let args = commands::token::IssueArgs {
                    key,
                    subject,
                    audience,
                    claims,
                    expired,
                    validity,
                    issuer,
                };
                commands::token::issue(args, output)?
            }
            TokenCommand::Verify {
                public_key,
                token,
                audience,
                subject,
                issuer,
            } => commands::token::verify(&public_key, token, &audience, &subject, &issuer)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },
    }

    Ok(())
}
