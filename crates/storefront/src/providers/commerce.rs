//! Commerce-cart API client.
//!
//! REST client for the hosted cart service. Carts are created lazily, live
//! entirely server-side, and are addressed by an opaque id the storefront
//! persists locally. Every mutation returns the full updated cart.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use novabay_core::{Price, RemoteCartId, RemoteLineId, VariantId};

use crate::config::CommerceConfig;

/// Errors that can occur when interacting with the commerce-cart API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Cart or line not found. On `get_cart` this means the stored id is
    /// stale and should be discarded.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error reported by the API (e.g., unknown variant).
    #[error("User error: {0}")]
    UserError(String),
}

// =============================================================================
// Cart Types
// =============================================================================

/// A line to add when creating a cart or pushing to one.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineInput {
    /// Variant to add.
    pub variant_id: VariantId,
    /// Quantity, >= 1.
    pub quantity: u32,
}

/// A priced line entry on the remote cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCartLine {
    /// Remote line id, required for update/remove calls.
    pub id: RemoteLineId,
    /// Variant this line holds.
    pub variant_id: VariantId,
    /// Quantity.
    pub quantity: u32,
    /// Unit price as the provider currently prices it.
    pub unit_price: Price,
}

/// The server-side cart resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCart {
    /// Opaque cart id, persisted client-side.
    pub id: RemoteCartId,
    /// Web checkout URL, when the provider has one ready.
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// Current lines.
    #[serde(default)]
    pub lines: Vec<RemoteCartLine>,
    /// Provider-computed subtotal.
    pub subtotal: Price,
}

impl RemoteCart {
    /// Find the remote line holding a variant, if any.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &VariantId) -> Option<&RemoteCartLine> {
        self.lines.iter().find(|l| &l.variant_id == variant_id)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct CreateCartRequest {
    lines: Vec<CartLineInput>,
}

#[derive(Serialize)]
struct AddLinesRequest {
    lines: Vec<CartLineInput>,
}

#[derive(Serialize)]
struct UpdateLineRequest {
    quantity: u32,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce-cart API.
#[derive(Clone)]
pub struct CommerceClient {
    client: reqwest::Client,
    base_url: String,
}

impl CommerceClient {
    /// Create a new commerce-cart API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| CommerceError::UserError(format!("Invalid access token: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a request and decode the cart body, mapping error statuses.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();
        // Read the body as text first so failures can be diagnosed
        let text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(CommerceError::NotFound(api_message(&text)));
        }

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            || status == reqwest::StatusCode::BAD_REQUEST
        {
            return Err(CommerceError::UserError(api_message(&text)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: api_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse commerce response"
            );
            CommerceError::Parse(e)
        })
    }
}

/// Best-effort extraction of an error message from a response body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .filter(|b| !b.message.is_empty())
        .map_or_else(
            || body.chars().take(200).collect::<String>(),
            |b| b.message,
        )
}

impl super::CommerceApi for CommerceClient {
    #[instrument(skip(self, lines))]
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<RemoteCart, CommerceError> {
        let url = format!("{}/v1/carts", self.base_url);
        self.execute(self.client.post(&url).json(&CreateCartRequest { lines }))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &RemoteCartId) -> Result<RemoteCart, CommerceError> {
        let url = format!("{}/v1/carts/{cart_id}", self.base_url);
        self.execute(self.client.get(&url)).await
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineInput>,
    ) -> Result<RemoteCart, CommerceError> {
        let url = format!("{}/v1/carts/{cart_id}/lines", self.base_url);
        self.execute(self.client.post(&url).json(&AddLinesRequest { lines }))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn update_line(
        &self,
        cart_id: &RemoteCartId,
        line_id: &RemoteLineId,
        quantity: u32,
    ) -> Result<RemoteCart, CommerceError> {
        let url = format!("{}/v1/carts/{cart_id}/lines/{line_id}", self.base_url);
        self.execute(self.client.patch(&url).json(&UpdateLineRequest { quantity }))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn remove_line(
        &self,
        cart_id: &RemoteCartId,
        line_id: &RemoteLineId,
    ) -> Result<RemoteCart, CommerceError> {
        let url = format!("{}/v1/carts/{cart_id}/lines/{line_id}", self.base_url);
        self.execute(self.client.delete(&url)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use novabay_core::CurrencyCode;

    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("cart_123".to_string());
        assert_eq!(err.to_string(), "Not found: cart_123");

        let err = CommerceError::Api {
            status: 500,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - upstream down");
    }

    #[test]
    fn test_api_message_prefers_json_message() {
        assert_eq!(api_message(r#"{"message": "variant sold out"}"#), "variant sold out");
    }

    #[test]
    fn test_api_message_falls_back_to_body() {
        assert_eq!(api_message("plain text error"), "plain text error");
    }

    #[test]
    fn test_remote_cart_line_lookup() {
        let cart = RemoteCart {
            id: RemoteCartId::new("cart_1"),
            checkout_url: Some("https://checkout.test/cart_1".to_owned()),
            lines: vec![RemoteCartLine {
                id: RemoteLineId::new("line_1"),
                variant_id: VariantId::new("var_a"),
                quantity: 2,
                unit_price: Price::from_minor_units(999, CurrencyCode::USD),
            }],
            subtotal: Price::from_minor_units(1998, CurrencyCode::USD),
        };

        assert!(cart.line_for_variant(&VariantId::new("var_a")).is_some());
        assert!(cart.line_for_variant(&VariantId::new("var_b")).is_none());
    }

    #[test]
    fn test_remote_cart_deserializes_without_checkout_url() {
        let json = r#"{
            "id": "cart_9",
            "lines": [],
            "subtotal": {"amount": "0", "currency_code": "USD"}
        }"#;
        let cart: RemoteCart = serde_json::from_str(json).unwrap();
        assert!(cart.checkout_url.is_none());
        assert!(cart.lines.is_empty());
    }
}
