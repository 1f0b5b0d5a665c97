//! Novabay CLI - exercise the session and cart services from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Accounts
//! nb-cli session sign-up -e ada@example.com -p secret -n "Ada"
//! nb-cli session sign-in -e ada@example.com -p secret
//! nb-cli session sign-out -e ada@example.com -p secret
//! nb-cli session reset -e ada@example.com
//!
//! # Profile (signs in first; nothing is cached between runs)
//! nb-cli profile show -e ada@example.com -p secret
//! nb-cli profile update -e ada@example.com -p secret --phone 555-0100
//!
//! # Cart (persists on device across runs)
//! nb-cli cart add --item item_1 --variant var_1 --name "USB-C Hub" --price 29.99
//! nb-cli cart show
//! nb-cli cart set-qty --variant var_1 --quantity 3
//! nb-cli cart checkout
//! ```
//!
//! # Commands
//!
//! - `session` - sign in, sign up, request a password reset
//! - `profile` - show or update the signed-in user's profile
//! - `cart` - inspect and mutate the on-device cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use novabay_storefront::config::Config;
use novabay_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "nb-cli")]
#[command(author, version, about = "Novabay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, or request a password reset
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Show or update the signed-in user's profile
    Profile {
        #[command(subcommand)]
        action: commands::session::ProfileAction,
    },
    /// Inspect and mutate the on-device cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to warn so command output stays readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "novabay=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::new(config).expect("Failed to initialize application state");

    let cli = Cli::parse();
    if let Err(e) = run(cli, state).await {
        e.report();
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, state: AppState) -> novabay_storefront::error::Result<()> {
    match cli.command {
        Commands::Session { action } => commands::session::run_session(&state, action).await,
        Commands::Profile { action } => commands::session::run_profile(&state, action).await,
        Commands::Cart { action } => commands::cart::run(&state, action).await,
    }
}
