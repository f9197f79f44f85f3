//! HTTP middleware stack for the admin panel.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Session layer (tower-sessions with `SQLite` store)
//!
//! Authentication is handled per-handler: the [`auth::require_level`]
//! permission gate runs at the top of every page flow, and the
//! [`auth::RequireAuth`] extractor backs pages that only need an identity.

pub mod auth;
pub mod session;

pub use auth::{Denied, RequireAuth, require_level, sign_in, sign_out};
pub use session::create_session_layer;
