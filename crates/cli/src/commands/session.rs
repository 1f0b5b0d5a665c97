//! Account and profile commands.
//!
//! Nothing is cached between runs: profile commands take credentials and
//! sign in before acting, the same sequence a view layer performs.

use clap::Subcommand;

use novabay_storefront::error::{Result, clear_sentry_user, set_sentry_user};
use novabay_storefront::providers::identity::{Profile, ProfilePatch};
use novabay_storefront::services::session::Session;
use novabay_storefront::state::AppState;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Sign in with email and password
    SignIn {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account
    SignUp {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Sign in and immediately revoke the issued refresh token
    SignOut {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Request a password-reset email
    Reset {
        /// Account email
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile
    Show {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Update profile fields (unset fields are left untouched)
    Update {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New contact phone number
        #[arg(long)]
        phone: Option<String>,

        /// New preferred language tag (en, es)
        #[arg(long)]
        language: Option<String>,

        /// Newsletter opt-in
        #[arg(long)]
        newsletter: Option<bool>,

        /// Order/stock notification opt-in
        #[arg(long)]
        notifications: Option<bool>,
    },
}

/// Run a `session` subcommand.
pub async fn run_session(state: &AppState, action: SessionAction) -> Result<()> {
    let sessions = state.session_manager();
    match action {
        SessionAction::SignIn { email, password } => {
            let session = sessions.sign_in(&email, &password).await?;
            set_sentry_user(&session.user.uid, Some(session.user.email.as_str()));
            print_session(&session);
            sessions.sign_out().await;
            clear_sentry_user();
        }
        SessionAction::SignUp {
            email,
            password,
            name,
        } => {
            let session = sessions.sign_up(&email, &password, &name).await?;
            print_session(&session);
            sessions.sign_out().await;
        }
        SessionAction::SignOut { email, password } => {
            sessions.sign_in(&email, &password).await?;
            sessions.sign_out().await;
            clear_sentry_user();
            done(&format!("Signed out {email}"));
        }
        SessionAction::Reset { email } => {
            sessions.request_password_reset(&email).await?;
            done(&format!("Password-reset email sent to {email}"));
        }
    }
    Ok(())
}

/// Run a `profile` subcommand.
pub async fn run_profile(state: &AppState, action: ProfileAction) -> Result<()> {
    let sessions = state.session_manager();
    match action {
        ProfileAction::Show { email, password } => {
            let session = sessions.sign_in(&email, &password).await?;
            print_profile(&session.profile);
            sessions.sign_out().await;
        }
        ProfileAction::Update {
            email,
            password,
            name,
            phone,
            language,
            newsletter,
            notifications,
        } => {
            sessions.sign_in(&email, &password).await?;
            let patch = ProfilePatch {
                display_name: name,
                phone,
                language,
                newsletter,
                notifications,
                ..ProfilePatch::default()
            };
            let profile = sessions.update_profile(&patch).await?;
            print_profile(&profile);
            sessions.sign_out().await;
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_session(session: &Session) {
    let name = session
        .profile
        .display_name
        .as_deref()
        .unwrap_or(session.user.email.as_str());
    println!("Signed in as {name} ({})", session.user.uid);
}

#[allow(clippy::print_stdout)]
fn print_profile(profile: &Profile) {
    println!("Display name:  {}", profile.display_name.as_deref().unwrap_or("-"));
    println!("Phone:         {}", profile.phone.as_deref().unwrap_or("-"));
    println!("Language:      {}", profile.language);
    println!("Newsletter:    {}", profile.newsletter);
    println!("Notifications: {}", profile.notifications);
    if let Some(address) = &profile.address {
        println!(
            "Address:       {}, {}, {} {}, {}",
            address.street, address.city, address.state, address.zip, address.country
        );
    }
    if let Some(updated) = profile.updated_at {
        println!("Updated:       {updated}");
    }
}

#[allow(clippy::print_stdout)]
fn done(message: &str) {
    println!("{message}");
}
