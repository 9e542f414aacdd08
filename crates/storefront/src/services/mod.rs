//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login and session tokens
//! - `demo` - Demo dataset bootstrap

pub mod auth;
pub mod demo;
