use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use opentoken::{CipherSuite, Claims, TokenAgent, TokenPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct PolicyArgs {
    /// Allowed clock skew for 'not-before' in seconds (default: 120)
    #[arg(long, env = "OPENTOKEN_TOLERANCE")]
    tolerance: Option<u32>,

    /// Lifetime of new tokens in seconds (default: 300)
    #[arg(long, env = "OPENTOKEN_LIFETIME")]
    lifetime: Option<u32>,

    /// Renewal window of new tokens in seconds (default: 43200)
    #[arg(long, env = "OPENTOKEN_RENEWAL")]
    renewal: Option<u32>,
}

impl PolicyArgs {
    fn to_policy(&self) -> Result<TokenPolicy> {
        let default = TokenPolicy::default();

        Ok(TokenPolicy::new(
            self.tolerance.unwrap_or(default.tolerance_secs()),
            self.lifetime.unwrap_or(default.lifetime_secs()),
            self.renewal.unwrap_or(default.renewal_secs()),
        )?)
    }
}

#[derive(Debug, clap::Args)]
struct ObfuscationArgs {
    /// Base64 encoded 24-byte 3DES key
    #[arg(long = "key", env = "OPENTOKEN_OBFUSCATION_KEY", hide_env_values = true)]
    key: String,

    /// Base64 encoded 8-byte 3DES IV
    #[arg(long = "iv", env = "OPENTOKEN_OBFUSCATION_IV", hide_env_values = true)]
    iv: String,
}

fn parse_claim(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[derive(Debug, Parser)]
#[command(name = "opentoken")]
#[command(
    version,
    about = "Encode, decode and validate OpenTokens from the command line."
)]
struct Cli {
    /// Cipher suite id: 0 none, 1 AES-256-CBC, 2 AES-128-CBC, 3 3DES-CBC
    #[arg(long, global = true, default_value_t = 2, env = "OPENTOKEN_SUITE")]
    suite: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encodes a raw newline-delimited key=value payload
    #[command(arg_required_else_help = true)]
    Encode { payload: String },

    /// Decodes a token and prints its raw payload
    #[command(arg_required_else_help = true)]
    Decode { token: String },

    /// Issues a token for a subject with validity claims
    #[command(arg_required_else_help = true)]
    Create {
        /// Value of the required 'subject' claim
        #[arg(long)]
        subject: String,

        /// Additional claim, may be repeated
        #[arg(long = "claim", value_name = "KEY=VALUE", value_parser = parse_claim)]
        claims: Vec<(String, String)>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Validates a token and prints its claims as JSON
    #[command(arg_required_else_help = true)]
    Parse {
        token: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Obfuscates the token password for storage in configuration
    Obfuscate {
        #[command(flatten)]
        obfuscation: ObfuscationArgs,
    },

    /// Recovers a password obfuscated with `obfuscate`
    #[command(arg_required_else_help = true)]
    Deobfuscate {
        value: String,

        #[command(flatten)]
        obfuscation: ObfuscationArgs,
    },

    /// Lists the supported cipher suites
    Suites,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Cli::parse();
    match args.command {
        Commands::Encode { payload } => {
            let password = auth::read_password()?;
            let token = opentoken::encode(&payload, args.suite, &password)?;
            println!("{token}");
        }
        Commands::Decode { token } => {
            let password = auth::read_password()?;
            let payload = opentoken::decode(token.trim(), args.suite, &password)?;
            println!("{payload}");
        }
        Commands::Create {
            subject,
            claims,
            policy,
        } => {
            let suite = CipherSuite::from_id(args.suite)?;
            let agent =
                TokenAgent::with_policy(suite, auth::read_password()?, policy.to_policy()?);

            let mut all = Claims::new();
            all.set("subject", subject);
            for (key, value) in claims {
                all.insert(key, value);
            }

            println!("{}", agent.create_token(&all)?);
        }
        Commands::Parse { token, policy } => {
            let suite = CipherSuite::from_id(args.suite)?;
            let agent =
                TokenAgent::with_policy(suite, auth::read_password()?, policy.to_policy()?);

            let claims = agent.parse_token(token.trim())?;
            let json =
                serde_json::to_string_pretty(&claims).context("failed to render claims")?;
            println!("{json}");
        }
        Commands::Obfuscate { obfuscation } => {
            let password = auth::read_password()?;
            let obfuscated =
                opentoken::obfuscate_password(&password, &obfuscation.key, &obfuscation.iv)?;
            println!("{obfuscated}");
        }
        Commands::Deobfuscate { value, obfuscation } => {
            let password =
                opentoken::deobfuscate_password(&value, &obfuscation.key, &obfuscation.iv)?;
            println!("{}", password.as_str());
        }
        Commands::Suites => {
            println!("{:<4}  {:<14}  {:>9}  {:>8}", "Id", "Cipher", "Key bytes", "IV bytes");
            println!("{:-<4}  {:-<14}  {:->9}  {:->8}", "", "", "", "");

            for suite in CipherSuite::ALL {
                println!(
                    "{:<4}  {:<14}  {:>9}  {:>8}",
                    suite.id(),
                    suite.name(),
                    suite.key_len(),
                    suite.iv_len()
                );
            }
        }
    }

    Ok(())
}
