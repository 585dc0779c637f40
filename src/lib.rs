//! Client core for the Dalli admin dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard is a thin client over a remote HTTP API. What it owns is
//! the session: a persisted bearer token, the profile loaded for it, and the
//! guard that keeps protected views behind sign-in. Everything here is
//! framework-agnostic so the CLI in `main.rs` (and any UI shell) can drive
//! the same state machine.

pub mod config;
pub mod i18n;
pub mod net;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use net::api::{AuthApi, HttpApi, UsersApi};
pub use net::types::{ApiError, ManagedUser, User, UserForm};
pub use state::guard::{GuardDecision, RouteGuard};
pub use state::session::{Session, SessionError, SessionPhase, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
