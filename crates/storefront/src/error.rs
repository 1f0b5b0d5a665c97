//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` for callers that drive both services
//! (e.g., the CLI), plus helpers for tying Sentry events to the signed-in
//! user. Cart sync failures never appear here: they are reported as
//! [`crate::services::cart::SyncStatus::LocalOnly`], not as errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::commerce::CommerceError;
use crate::providers::identity::IdentityError;
use crate::services::cart::CartError;
use crate::services::session::SessionError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Identity platform operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Commerce-cart API operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Whether this error is worth a Sentry event.
    ///
    /// User-correctable failures (bad credentials, invalid email, checkout
    /// before any sync) are noise; infrastructure failures are signal.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) => true,
            Self::Identity(e) => matches!(e, IdentityError::Http(_) | IdentityError::Parse(_)),
            Self::Commerce(e) => matches!(
                e,
                CommerceError::Http(_) | CommerceError::Api { .. } | CommerceError::Parse(_)
            ),
            Self::Session(e) => matches!(e, SessionError::Identity(_)),
            Self::Cart(_) => false,
        }
    }

    /// Capture the error to Sentry when reportable, and log it either way.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Operation failed");
        } else {
            tracing::debug!(error = %self, "Operation failed (not reported)");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Cart(CartError::NoRemoteCart);
        assert_eq!(err.to_string(), "Cart error: cart has no remote counterpart yet");
    }

    #[test]
    fn test_user_correctable_errors_are_not_reportable() {
        assert!(!AppError::Cart(CartError::NoRemoteCart).is_reportable());
        assert!(!AppError::Session(SessionError::NotSignedIn).is_reportable());
        assert!(
            !AppError::Commerce(CommerceError::UserError("sold out".to_owned())).is_reportable()
        );
    }

    #[test]
    fn test_infrastructure_errors_are_reportable() {
        let err = AppError::Commerce(CommerceError::Api {
            status: 500,
            message: "upstream down".to_owned(),
        });
        assert!(err.is_reportable());
    }
}
