use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use courtside::config::{ConfigError, IdentityConfig, SyncConfig};
use courtside::identity::password::PasswordIdentityProvider;
use courtside::{AuthError, FetchError, Identity, ProfileFetcher, ProfileSource, SessionSync, SyncState, TokenSource};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{}", .0.display_message())]
    Fetch(#[from] FetchError),
    #[error("timed out waiting for the profile to load")]
    Timeout,
    #[error("profile load failed: {0}")]
    Profile(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Bearer token supplied on the command line.
struct StaticToken(String);

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

#[derive(Parser, Debug)]
#[command(name = "courtside", about = "Courtside session and profile sync CLI")]
struct Cli {
    /// Seconds to wait for the profile to settle after signing in.
    #[arg(long, env = "COURTSIDE_WAIT_SECS", default_value_t = 30)]
    wait_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the synchronized session.
    SignIn(Credentials),
    /// Create an account, sign in, and print the synchronized session.
    SignUp(Credentials),
    /// Sign in and print every state change until Ctrl-C.
    Watch(Credentials),
    /// Look up a profile directly with a bearer token.
    Lookup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COURTSIDE_BEARER_TOKEN")]
        token: String,
    },
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, env = "COURTSIDE_EMAIL")]
    email: String,
    #[arg(long, env = "COURTSIDE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let wait = Duration::from_secs(cli.wait_secs);
    let sync_config = SyncConfig::from_env()?;

    match cli.command {
        Command::SignIn(creds) => {
            let sync = start_sync(&sync_config)?;
            sync.sign_in(&creds.email, &creds.password).await?;
            print_settled(&sync, wait).await
        }
        Command::SignUp(creds) => {
            let sync = start_sync(&sync_config)?;
            sync.sign_up(&creds.email, &creds.password).await?;
            print_settled(&sync, wait).await
        }
        Command::Watch(creds) => run_watch(&sync_config, creds).await,
        Command::Lookup { email, token } => run_lookup(&sync_config, email, token).await,
    }
}

fn start_sync(sync_config: &SyncConfig) -> Result<SessionSync, CliError> {
    let provider = PasswordIdentityProvider::new(IdentityConfig::from_env()?)?;
    let fetcher = ProfileFetcher::new(sync_config)?;
    Ok(SessionSync::start(Arc::new(provider), Arc::new(fetcher)))
}

async fn print_settled(sync: &SessionSync, wait: Duration) -> Result<(), CliError> {
    let settled = tokio::time::timeout(
        wait,
        sync.wait_for(|s| s.is_signed_in() && !s.is_bootstrapping && !s.is_profile_loading),
    )
    .await
    .map_err(|_| CliError::Timeout)?;

    print_json(&render_state(&settled))?;
    match settled.last_error {
        Some(failure) => Err(CliError::Profile(failure.message)),
        None => Ok(()),
    }
}

async fn run_watch(sync_config: &SyncConfig, creds: Credentials) -> Result<(), CliError> {
    let sync = start_sync(sync_config)?;
    let mut rx = sync.subscribe();

    sync.sign_in(&creds.email, &creds.password).await?;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                print_json(&render_state(&state))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("signing out");
                sync.sign_out().await?;
                break;
            }
        }
    }
    Ok(())
}

async fn run_lookup(sync_config: &SyncConfig, email: String, token: String) -> Result<(), CliError> {
    let fetcher = ProfileFetcher::new(sync_config)?;
    let identity = Identity::new("cli", Arc::new(StaticToken(token))).with_email(email);
    let profile = fetcher.fetch(&identity).await?;
    print_json(&serde_json::to_value(profile)?)
}

fn render_state(state: &SyncState) -> Value {
    let mut out = Map::new();
    out.insert(
        "identity".to_owned(),
        state.identity.as_ref().map_or(Value::Null, |i| {
            json!({
                "uid": i.uid,
                "email": i.email,
                "display_name": i.display_name,
            })
        }),
    );
    out.insert("role".to_owned(), json!(state.role().map(|r| r.as_str())));
    out.insert("avatar_url".to_owned(), json!(state.avatar_url()));
    out.insert(
        "profile".to_owned(),
        serde_json::to_value(&state.profile).unwrap_or(Value::Null),
    );
    out.insert("is_bootstrapping".to_owned(), Value::Bool(state.is_bootstrapping));
    out.insert("is_profile_loading".to_owned(), Value::Bool(state.is_profile_loading));
    out.insert("is_authenticating".to_owned(), Value::Bool(state.is_authenticating));
    out.insert(
        "last_error".to_owned(),
        json!(state.last_error.as_ref().map(|e| e.message.as_str())),
    );
    Value::Object(out)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
