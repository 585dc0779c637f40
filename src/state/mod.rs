//! Client-side state containers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` owns who is signed in, `guard` decides whether a protected view
//! may render, `users` holds the user-management screen, and `prefs` holds
//! the persisted language/theme choices.

pub mod guard;
pub mod prefs;
pub mod session;
pub mod users;
