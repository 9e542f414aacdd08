//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (propagate or generate, record in span)
//! 4. Role gate (`/seller`, `/buyer` prefixes)
//! 5. Body limit (multipart uploads)
//!
//! Handlers then authenticate with the extractors in [`auth`].

pub mod auth;
pub mod request_id;
pub mod role_gate;

pub use auth::{AuthRejection, OptionalAuth, RequireAuth, RequireBuyer, RequireSeller, RequireSession};
pub use request_id::request_id_middleware;
pub use role_gate::role_gate_middleware;
