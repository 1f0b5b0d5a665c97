//! Session management.
//!
//! Tracks the signed-in identity and mirrors a profile document in the
//! remote document store. On every successful sign-in the profile is
//! fetched, or created with default preferences if this identity has never
//! had one (sign-up and first-time external sign-in always create one).
//!
//! The current session is published through a `watch` channel: views read
//! the current value or subscribe for changes instead of receiving pushed
//! context updates.

use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use novabay_core::{Email, EmailError};

use crate::providers::IdentityApi;
use crate::providers::identity::{
    AuthUser, ExternalProvider, IdentityError, IdentityErrorCode, Language, Profile, ProfilePatch,
};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A provider-reported authentication failure, carrying the localized
    /// user-facing message for its error code.
    #[error("{user_message}")]
    Auth {
        /// Parsed provider error code.
        code: IdentityErrorCode,
        /// Localized message, safe to show directly.
        user_message: &'static str,
    },

    /// Email failed client-side validation before any provider call.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Transport-level failure talking to the provider.
    #[error(transparent)]
    Identity(IdentityError),

    /// The operation requires a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}

/// The signed-in state: provider identity plus mirrored profile.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity as the provider reports it (read-only mirror).
    pub user: AuthUser,
    /// Profile document from the remote document store.
    pub profile: Profile,
}

/// Tracks the signed-in identity and its profile document.
///
/// Holds the identity client by value (injected at construction); there is
/// no global provider handle.
pub struct SessionManager<I: IdentityApi> {
    identity: I,
    language: Language,
    state: watch::Sender<Option<Session>>,
}

impl<I: IdentityApi> SessionManager<I> {
    /// Create a session manager in the signed-out state.
    #[must_use]
    pub fn new(identity: I, language: Language) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            identity,
            language,
            state,
        }
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Subscribe to session changes.
    ///
    /// The receiver yields the current value immediately and every
    /// subsequent sign-in/sign-out/profile update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    // =========================================================================
    // Sign-in / Sign-up
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// Fetches the profile for the identity, creating one with default
    /// preferences if absent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` with a localized message for
    /// provider-reported failures.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let email = Email::parse(email)?;
        let user = self
            .identity
            .sign_in_with_password(&email, password)
            .await
            .map_err(|e| self.auth_error(e))?;

        let profile = self.fetch_or_create_profile(&user).await?;
        Ok(self.publish(user, profile))
    }

    /// Register a new account with email, password, and display name.
    ///
    /// Always writes a fresh profile document with default preferences.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` with the "account already exists"
    /// message if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, SessionError> {
        let email = Email::parse(email)?;
        let user = self
            .identity
            .sign_up_with_password(&email, password, display_name)
            .await
            .map_err(|e| self.auth_error(e))?;

        let profile = self
            .identity
            .merge_profile(
                &user.uid,
                &ProfilePatch::initial(Some(display_name), self.language),
            )
            .await
            .map_err(|e| self.auth_error(e))?;

        Ok(self.publish(user, profile))
    }

    /// Sign in through an external provider's id token (popup flow).
    ///
    /// A first-time external sign-in writes a fresh default profile; a
    /// returning one fetches the existing document.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` for provider-reported failures
    /// (e.g., an expired id token).
    #[instrument(skip(self, id_token))]
    pub async fn sign_in_external(
        &self,
        provider: ExternalProvider,
        id_token: &str,
    ) -> Result<Session, SessionError> {
        let user = self
            .identity
            .sign_in_with_id_token(provider, id_token)
            .await
            .map_err(|e| self.auth_error(e))?;

        let profile = if user.is_new_user {
            self.identity
                .merge_profile(
                    &user.uid,
                    &ProfilePatch::initial(user.display_name.as_deref(), self.language),
                )
                .await
                .map_err(|e| self.auth_error(e))?
        } else {
            self.fetch_or_create_profile(&user).await?
        };

        Ok(self.publish(user, profile))
    }

    /// Sign out, clearing the published session.
    ///
    /// Token revocation is best effort: a failure is logged and the local
    /// session is cleared regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Some(session) = self.current() {
            if let Err(e) = self.identity.revoke(&session.user.tokens.refresh_token).await {
                tracing::warn!("Failed to revoke refresh token on sign-out: {e}");
            }
        }
        self.state.send_replace(None);
    }

    /// Ask the provider to send a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` with a localized message for
    /// provider-reported failures (e.g., unknown email).
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let email = Email::parse(email)?;
        self.identity
            .send_password_reset(&email)
            .await
            .map_err(|e| self.auth_error(e))
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Shallow-merge changes into the signed-in user's profile.
    ///
    /// The server stamps the modification timestamp; the updated session
    /// is republished.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSignedIn` without a session, or
    /// `SessionError::Auth` for provider-reported failures.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Profile, SessionError> {
        let session = self.current().ok_or(SessionError::NotSignedIn)?;

        let profile = self
            .identity
            .merge_profile(&session.user.uid, patch)
            .await
            .map_err(|e| self.auth_error(e))?;

        self.publish(session.user, profile.clone());
        Ok(profile)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn fetch_or_create_profile(&self, user: &AuthUser) -> Result<Profile, SessionError> {
        let existing = self
            .identity
            .get_profile(&user.uid)
            .await
            .map_err(|e| self.auth_error(e))?;

        match existing {
            Some(profile) => Ok(profile),
            None => self
                .identity
                .merge_profile(
                    &user.uid,
                    &ProfilePatch::initial(user.display_name.as_deref(), self.language),
                )
                .await
                .map_err(|e| self.auth_error(e)),
        }
    }

    fn publish(&self, user: AuthUser, profile: Profile) -> Session {
        let session = Session { user, profile };
        self.state.send_replace(Some(session.clone()));
        session
    }

    /// Map a provider error to its localized user-facing message.
    ///
    /// Known codes get their fixed message; unknown codes fall back to the
    /// generic one. Transport errors pass through untranslated.
    fn auth_error(&self, error: IdentityError) -> SessionError {
        match error {
            IdentityError::Provider { code, message } => {
                tracing::warn!(code = ?code, "Identity provider rejected request: {message}");
                SessionError::Auth {
                    user_message: code.user_message(self.language),
                    code,
                }
            }
            other => SessionError::Identity(other),
        }
    }
}
