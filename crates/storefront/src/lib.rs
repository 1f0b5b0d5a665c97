//! Novabay Storefront - session and cart state synchronization.
//!
//! This crate is the glue between a marketplace view layer and the hosted
//! services Novabay delegates to:
//!
//! - an identity platform with a per-user profile document store,
//! - a commerce-cart API (opaque cart id + checkout URL),
//! - local persistent storage for the offline cart state.
//!
//! Two leaf components are exposed, both independent of each other:
//!
//! - [`services::session::SessionManager`] - tracks the signed-in identity
//!   and mirrors a profile record in the remote document store.
//! - [`services::cart::CartSynchronizer`] - keeps an optimistic local line
//!   list mirrored best-effort against a remote cart resource.
//!
//! Provider clients are constructed once (see [`state::AppState`]) and
//! injected; view layers consume state through `watch` subscriptions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod providers;
pub mod services;
pub mod state;
pub mod storage;
