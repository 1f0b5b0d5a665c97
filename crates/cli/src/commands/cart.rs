//! Cart commands.
//!
//! The cart lives in the storage directory from configuration, so it
//! persists across runs. Mutations report whether the change reached the
//! remote cart or stayed on this device.

use clap::Subcommand;
use rust_decimal::Decimal;

use novabay_core::{CurrencyCode, ItemId, Price, VariantId};
use novabay_storefront::error::Result;
use novabay_storefront::services::cart::{CartSummary, LineItem, SyncStatus};
use novabay_storefront::state::AppState;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the current cart
    Show,
    /// Add an item to the cart
    Add {
        /// Item id
        #[arg(long)]
        item: String,

        /// Variant id
        #[arg(long)]
        variant: String,

        /// Item name shown in the cart
        #[arg(long)]
        name: String,

        /// Unit price in the currency's standard unit (e.g., 29.99)
        #[arg(long)]
        price: Decimal,

        /// ISO 4217 currency code
        #[arg(long, default_value = "USD")]
        currency: CurrencyCode,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant label (e.g., "64GB / Black")
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove a variant's line from the cart
    Remove {
        /// Variant id
        #[arg(long)]
        variant: String,
    },
    /// Set the quantity on a variant's line (0 removes it)
    SetQty {
        /// Variant id
        #[arg(long)]
        variant: String,

        /// New quantity
        #[arg(short, long)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Print the web checkout URL
    Checkout,
}

/// Run a `cart` subcommand.
pub async fn run(state: &AppState, action: CartAction) -> Result<()> {
    let mut cart = state.open_cart().await?;

    match action {
        CartAction::Show => print_summary(&cart.summary()),
        CartAction::Add {
            item,
            variant,
            name,
            price,
            currency,
            quantity,
            label,
        } => {
            let status = cart
                .add(LineItem {
                    item_id: ItemId::new(item),
                    variant_id: VariantId::new(variant),
                    name,
                    unit_price: Price::new(price, currency),
                    quantity,
                    image: None,
                    variant_label: label,
                    compare_at_price: None,
                })
                .await;
            print_summary(&cart.summary());
            print_status(&status);
        }
        CartAction::Remove { variant } => {
            let status = cart.remove(&VariantId::new(variant)).await;
            print_summary(&cart.summary());
            print_status(&status);
        }
        CartAction::SetQty { variant, quantity } => {
            let status = cart.update_quantity(&VariantId::new(variant), quantity).await;
            print_summary(&cart.summary());
            print_status(&status);
        }
        CartAction::Clear => {
            cart.clear();
            print_summary(&cart.summary());
        }
        CartAction::Checkout => {
            let url = cart.checkout_url()?;
            print_checkout(&url);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &CartSummary) {
    if summary.lines.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in &summary.lines {
        let label = line
            .variant_label
            .as_deref()
            .map(|l| format!(" ({l})"))
            .unwrap_or_default();
        println!(
            "{:>3} x {}{label}  @ {}  = {}",
            line.quantity,
            line.name,
            line.unit_price,
            line.unit_price * line.quantity,
        );
    }
    println!("Subtotal: {}  ({} items)", summary.subtotal, summary.item_count);
}

#[allow(clippy::print_stdout)]
fn print_status(status: &SyncStatus) {
    if let SyncStatus::LocalOnly { notice } = status {
        println!("{notice}");
    }
}

#[allow(clippy::print_stdout)]
fn print_checkout(url: &url::Url) {
    println!("{url}");
}
