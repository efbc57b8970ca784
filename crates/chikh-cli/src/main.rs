//! Chikh Counter CLI - a command-line shell over the counter app core.
//!
//! Signs in and out, opens views through the authentication-gated router,
//! and lists the signed-in user's counter groups.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chikh_core::auth::{CredentialStore, FirebaseAuth, SessionProvider, SessionSource};
use chikh_core::store::{FirestoreClient, GroupStore};
use chikh_core::{Config, NavigationGuard, Router};

// ============================================================================
// Constants
// ============================================================================

/// Prefix for the daily-rolling log file in the cache directory
const LOG_FILE_PREFIX: &str = "chikh.log";

const USAGE: &str = "Usage: chikh <command>

Commands:
  login          Sign in with email and password
  logout         Sign out
  status         Show who is signed in
  open <path>    Navigate to a view, e.g. `chikh open /stats`
  groups         List your counter groups as JSON
  colors         Show the configured UI colors";

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({:#}), using defaults", e);
            Config::default()
        }
    };
    let cache_dir = Config::cache_dir().ok();
    if let Some(ref dir) = cache_dir {
        let _ = std::fs::create_dir_all(dir);
    }
    let _log_guard = init_tracing(cache_dir.as_deref());

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    // Needs no backend
    if command == "colors" {
        let colors = config.colors();
        println!("primary: {}", colors.primary);
        println!("accent:  {}", colors.accent);
        return Ok(());
    }

    let cache_dir = cache_dir.context("Could not find cache directory")?;
    let backend = Arc::new(FirebaseAuth::new(
        config.api_key()?,
        cache_dir,
        Arc::new(CredentialStore),
    )?);
    let provider = SessionProvider::start(backend);
    info!(command = %command, "Chikh CLI starting");

    match command.as_str() {
        "login" => login(&provider, config).await,
        "logout" => {
            provider.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
        "status" => {
            let session = provider.wait_resolved().await;
            match session.identity() {
                Some(identity) => println!("Signed in as {}", identity.display_name()),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        "open" => {
            let path = args.get(2).map(String::as_str).unwrap_or("/");
            open(provider, &config, path).await
        }
        "groups" => groups(provider, &config).await,
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            Ok(())
        }
    }
}

/// Prompt for credentials and sign in, remembering the email for next time
async fn login(provider: &SessionProvider, mut config: Config) -> Result<()> {
    let email = prompt_email(config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let session = provider.sign_in(&email, &password).await?;
    println!(
        "Signed in as {}",
        session.identity().map(|i| i.display_name()).unwrap_or(&email)
    );

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        (true, None) => Err(anyhow::anyhow!("Email is required")),
        (false, _) => Ok(input.to_string()),
    }
}

async fn open(provider: Arc<SessionProvider>, config: &Config, path: &str) -> Result<()> {
    let routes = Arc::new(config.route_table()?);
    let session: Arc<dyn SessionSource> = provider;
    let guard = NavigationGuard::new(routes, session, config.landing_route())?
        .with_resolve_timeout(config.resolve_timeout());
    let mut router = Router::new(guard);

    let resolved = router.push(path).await;
    if let Some(from) = &resolved.redirected_from {
        println!("{} requires sign-in, redirected to {}", from, resolved.path);
    }
    match resolved.view {
        Some(view) => println!("view: {} ({})", view, resolved.path),
        None => println!("no view for {}", resolved.path),
    }
    Ok(())
}

async fn groups(provider: Arc<SessionProvider>, config: &Config) -> Result<()> {
    provider.wait_resolved().await;

    let documents = Arc::new(FirestoreClient::new(config.project_id())?);
    let store = GroupStore::new(provider, documents);
    let groups = store.fetch_groups_for_current_user().await?;

    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}
