//! Novabay Core - Shared types library.
//!
//! This crate provides common types used across all Novabay components:
//! - `storefront` - Session and cart synchronization over the hosted providers
//! - `cli` - Command-line tools for exercising sessions and carts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no network clients. This
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
