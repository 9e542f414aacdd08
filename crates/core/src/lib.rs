//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types shared by the Bazaar components:
//! - `storefront` - Marketplace HTTP service (buyers and sellers)
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encode/decode impls are available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, roles, prices, ratings, SKUs and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
