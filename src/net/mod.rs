//! Networking modules for the dashboard's remote HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` owns the HTTP client and the auth/users seams the rest of the crate
//! depends on, and `types` defines the wire schema plus `ApiError`.

pub mod api;
pub mod types;
