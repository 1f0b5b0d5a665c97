//! Identity platform client.
//!
//! REST client for the hosted identity provider and its per-user profile
//! document store. The provider owns the entire credential lifecycle; this
//! client only exchanges credentials for tokens and mirrors profile
//! documents keyed by the provider-issued user id.
//!
//! Provider failures carry an error *code* string; the enumerated
//! [`IdentityErrorCode`] maps every known code to a fixed localized
//! user-facing message, with a generic fallback for codes we have never
//! seen (the provider adds new codes without notice).

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use novabay_core::{Email, UserId};

use crate::config::IdentityConfig;

/// Errors that can occur when talking to the identity platform.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider reported an error code.
    #[error("identity provider error: {message}")]
    Provider {
        /// Parsed error code.
        code: IdentityErrorCode,
        /// Raw provider message, for logs only - never shown to users.
        message: String,
    },
}

impl IdentityError {
    /// The parsed provider code, if this is a provider-reported error.
    #[must_use]
    pub const fn code(&self) -> Option<&IdentityErrorCode> {
        match self {
            Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Known identity provider error codes.
///
/// Unrecognized codes land in `Other` and get the generic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityErrorCode {
    /// An account already exists for this email.
    EmailExists,
    /// No account exists for this email.
    EmailNotFound,
    /// Wrong password.
    InvalidPassword,
    /// Combined wrong-email-or-password code (newer provider versions).
    InvalidCredentials,
    /// Malformed email.
    InvalidEmail,
    /// Account disabled by an administrator.
    UserDisabled,
    /// Rate limited after repeated failures.
    TooManyAttempts,
    /// Password rejected as too weak.
    WeakPassword,
    /// The session or id token is no longer valid.
    ExpiredToken,
    /// Anything we don't recognize.
    Other(String),
}

impl IdentityErrorCode {
    /// Parse a provider code string.
    ///
    /// Provider messages sometimes carry a detail suffix
    /// (`"WEAK_PASSWORD : Password should be..."`); only the leading token
    /// is the code.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let code = raw.split([' ', ':']).next().unwrap_or(raw);
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" => Self::EmailNotFound,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredentials,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" => Self::ExpiredToken,
            _ => Self::Other(code.to_owned()),
        }
    }

    /// The fixed user-facing message for this code.
    #[must_use]
    pub fn user_message(&self, language: Language) -> &'static str {
        match language {
            Language::En => match self {
                Self::EmailExists => "An account with this email already exists.",
                Self::EmailNotFound | Self::InvalidPassword | Self::InvalidCredentials => {
                    "Incorrect email or password."
                }
                Self::InvalidEmail => "That email address is not valid.",
                Self::UserDisabled => "This account has been disabled.",
                Self::TooManyAttempts => "Too many attempts. Please try again later.",
                Self::WeakPassword => "Password must be at least 6 characters.",
                Self::ExpiredToken => "Your session has expired. Please sign in again.",
                Self::Other(_) => "Something went wrong. Please try again.",
            },
            Language::Es => match self {
                Self::EmailExists => "Ya existe una cuenta con este correo electr\u{f3}nico.",
                Self::EmailNotFound | Self::InvalidPassword | Self::InvalidCredentials => {
                    "Correo o contrase\u{f1}a incorrectos."
                }
                Self::InvalidEmail => "El correo electr\u{f3}nico no es v\u{e1}lido.",
                Self::UserDisabled => "Esta cuenta ha sido deshabilitada.",
                Self::TooManyAttempts => {
                    "Demasiados intentos. Int\u{e9}ntalo de nuevo m\u{e1}s tarde."
                }
                Self::WeakPassword => "La contrase\u{f1}a debe tener al menos 6 caracteres.",
                Self::ExpiredToken => "Tu sesi\u{f3}n ha expirado. Inicia sesi\u{f3}n de nuevo.",
                Self::Other(_) => "Algo sali\u{f3} mal. Int\u{e9}ntalo de nuevo.",
            },
        }
    }
}

/// Language for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    /// BCP 47 tag stored in profile preferences.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// External OAuth providers supported by the popup sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalProvider {
    Google,
    Facebook,
    Apple,
}

impl ExternalProvider {
    /// Provider id string sent to the identity platform.
    #[must_use]
    pub const fn provider_id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
            Self::Facebook => "facebook.com",
            Self::Apple => "apple.com",
        }
    }
}

// =============================================================================
// Domain Types
// =============================================================================

/// Tokens issued on sign-in.
///
/// Implements `Debug` manually so tokens never reach logs.
#[derive(Clone)]
pub struct AuthTokens {
    /// Short-lived id token sent on authenticated calls.
    pub id_token: String,
    /// Long-lived refresh token, revoked on sign-out.
    pub refresh_token: String,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// The signed-in identity, mirrored read-only from the provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Provider-issued opaque user id.
    pub uid: UserId,
    /// Account email.
    pub email: Email,
    /// Display name, if the provider has one.
    pub display_name: Option<String>,
    /// Avatar URL, if the provider has one.
    pub photo_url: Option<String>,
    /// Whether this sign-in created the account (first external sign-in).
    pub is_new_user: bool,
    /// Session tokens.
    pub tokens: AuthTokens,
}

/// A user profile document, keyed by the provider-issued user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name shown in the account views.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Shipping address.
    #[serde(default)]
    pub address: Option<Address>,
    /// Newsletter opt-in.
    #[serde(default)]
    pub newsletter: bool,
    /// Order/stock notification opt-in.
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Preferred language tag.
    #[serde(default)]
    pub language: String,
    /// Server-set modification timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// A shallow merge-write into a profile document.
///
/// Only set fields are sent; the server merges them into the stored
/// document and stamps `updated_at`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ProfilePatch {
    /// The default profile written on sign-up or first external sign-in.
    #[must_use]
    pub fn initial(display_name: Option<&str>, language: Language) -> Self {
        Self {
            display_name: display_name.map(str::to_owned),
            newsletter: Some(false),
            notifications: Some(true),
            language: Some(language.tag().to_owned()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
struct IdpSignInRequest<'a> {
    provider_id: &'static str,
    id_token: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Serialize)]
struct RevokeRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    is_new_user: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// IdentityClient
// =============================================================================

/// Client for the hosted identity platform.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a new identity platform client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.expose_secret().to_owned(),
        }
    }

    /// POST a JSON body and decode a JSON response.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, IdentityError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        // Read the body as text first so failures can be diagnosed
        let text = response.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse identity response"
            );
            IdentityError::Parse(e)
        })
    }

    async fn auth_call<B>(&self, path: &str, body: &B) -> Result<AuthUser, IdentityError>
    where
        B: Serialize + ?Sized,
    {
        let resp: AuthResponse = self.post_json(path, body).await?;

        let email = Email::parse(&resp.email).map_err(|e| IdentityError::Provider {
            code: IdentityErrorCode::InvalidEmail,
            message: format!("provider returned unusable email: {e}"),
        })?;

        Ok(AuthUser {
            uid: UserId::new(resp.local_id),
            email,
            display_name: resp.display_name,
            photo_url: resp.photo_url,
            is_new_user: resp.is_new_user,
            tokens: AuthTokens {
                id_token: resp.id_token,
                refresh_token: resp.refresh_token,
            },
        })
    }
}

/// Parse a provider error body into `IdentityError::Provider`.
fn provider_error(status: reqwest::StatusCode, body: &str) -> IdentityError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => IdentityError::Provider {
            code: IdentityErrorCode::parse(&envelope.error.message),
            message: envelope.error.message,
        },
        Err(_) => {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Identity provider returned unparseable error body"
            );
            IdentityError::Provider {
                code: IdentityErrorCode::Other(format!("HTTP_{}", status.as_u16())),
                message: format!("HTTP {status}"),
            }
        }
    }
}

impl super::IdentityApi for IdentityClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthUser, IdentityError> {
        self.auth_call(
            "/v1/accounts:signInWithPassword",
            &PasswordSignInRequest {
                email: email.as_str(),
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    #[instrument(skip(self, password))]
    async fn sign_up_with_password(
        &self,
        email: &Email,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, IdentityError> {
        self.auth_call(
            "/v1/accounts:signUp",
            &SignUpRequest {
                email: email.as_str(),
                password,
                display_name,
                return_secure_token: true,
            },
        )
        .await
    }

    #[instrument(skip(self, id_token))]
    async fn sign_in_with_id_token(
        &self,
        provider: ExternalProvider,
        id_token: &str,
    ) -> Result<AuthUser, IdentityError> {
        self.auth_call(
            "/v1/accounts:signInWithIdp",
            &IdpSignInRequest {
                provider_id: provider.provider_id(),
                id_token,
                return_secure_token: true,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .post_json(
                "/v1/accounts:sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    email: email.as_str(),
                },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn revoke(&self, refresh_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .post_json("/v1/tokens:revoke", &RevokeRequest { refresh_token })
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(uid = %uid))]
    async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, IdentityError> {
        let url = format!("{}/v1/profiles/{uid}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(provider_error(status, &text));
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    #[instrument(skip(self, patch), fields(uid = %uid))]
    async fn merge_profile(
        &self,
        uid: &UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, IdentityError> {
        let url = format!("{}/v1/profiles/{uid}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(patch)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(provider_error(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
