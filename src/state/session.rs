//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` is the single owner of the bearer token (in memory, in
//! persisted storage, and in the API client's default header) and of the
//! profile fetched for it. Route guards and user-aware screens read it; only
//! `login`, `register`, `logout` and the profile-fetch reaction mutate it.
//!
//! DESIGN
//! ======
//! Every mutation goes through one transition step under the state lock:
//! compute the next `Session`, persist the token slot, then publish the
//! snapshot on a `watch` channel. Observers never see a token that storage
//! does not hold.
//!
//! Each token change bumps an epoch. A profile fetch remembers the epoch it
//! started under and its result is applied only if that epoch is still
//! current, so a `logout()` or a newer login during an outstanding fetch
//! makes the stale result a no-op (last token wins).
//!
//! TRADE-OFFS
//! ==========
//! A failed profile fetch is not surfaced to anyone: the session silently
//! demotes to anonymous and the next guarded navigation redirects to sign-in.
//! Concurrent `login` calls are not serialized; the last token written wins.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::net::api::AuthApi;
use crate::net::types::{ApiError, User};
use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY};

// =============================================================================
// SESSION SNAPSHOT
// =============================================================================

/// Point-in-time view of the session.
///
/// `user` is only ever `Some` while `token` is `Some`, and always belongs to
/// that token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// The three states of the session machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token, no user.
    Anonymous,
    /// Token set, profile fetch outstanding.
    Pending,
    /// Token set, profile loaded.
    Authenticated,
}

impl Session {
    /// A token alone is not enough; the profile must have loaded too.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.user) {
            (Some(_), Some(_)) => SessionPhase::Authenticated,
            (Some(_), None) => SessionPhase::Pending,
            (None, _) => SessionPhase::Anonymous,
        }
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// Failures surfaced by `login` and `register`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server rejected the call or it never completed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The token could not be persisted; nothing was committed.
    #[error("failed to persist session token: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Server-provided message suitable for showing on the form.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api(e) => e.detail(),
            Self::Storage(_) => None,
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Inner {
    session: Session,
    epoch: u64,
}

struct Shared {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<Inner>,
    tx: watch::Sender<Session>,
}

/// Explicitly constructed session container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl SessionStore {
    /// Create the store, hydrating the token from persisted storage.
    ///
    /// A hydrated token leaves the store `Pending`; call [`Self::hydrate`] to
    /// fetch its profile.
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        api.set_default_bearer(token.as_deref());

        let session = Session { token, user: None };
        let (tx, _rx) = watch::channel(session.clone());
        let shared = Shared { api, storage, state: Mutex::new(Inner { session, epoch: 0 }), tx };
        Self { shared: Arc::new(shared) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Read-only surface
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().session.user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    /// Receive every published session snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.tx.subscribe()
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Fetch the profile for the token currently held, if any.
    ///
    /// Used at startup for a token hydrated from storage. A rejected token
    /// is cleared everywhere.
    pub async fn hydrate(&self) {
        let (token, epoch) = {
            let inner = self.lock();
            (inner.session.token.clone(), inner.epoch)
        };
        if let Some(token) = token {
            self.fetch_user(token, epoch).await;
        }
    }

    /// Sign in and load the profile for the issued token.
    ///
    /// Resolves once the profile fetch settles. A failed fetch does not fail
    /// the login; it leaves the store anonymous.
    ///
    /// # Errors
    ///
    /// Returns the API error if the credentials are rejected or the request
    /// fails, and a storage error if the token cannot be persisted. In both
    /// cases no state is committed.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let issued = self.shared.api.login(email, password).await?;
        let token = issued.access_token;
        let epoch = self.commit_token(&token)?;
        self.fetch_user(token, epoch).await;
        if self.is_authenticated() {
            info!(%email, "session established");
        }
        Ok(())
    }

    /// Create an account, then sign in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns the registration error (login is never attempted), or the
    /// error of the chained login.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), SessionError> {
        self.shared.api.register(name, email, password).await?;
        debug!(%email, "registered; signing in");
        self.login(email, password).await
    }

    /// Clear the session everywhere. Idempotent; never fails.
    pub fn logout(&self) {
        let mut inner = self.lock();
        self.clear(&mut inner);
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Persist `token`, then publish it as `Pending`. Returns the new epoch.
    fn commit_token(&self, token: &str) -> Result<u64, StorageError> {
        let mut inner = self.lock();
        self.shared.storage.set(TOKEN_KEY, token)?;
        self.shared.api.set_default_bearer(Some(token));
        inner.epoch += 1;
        self.publish(&mut inner, Session { token: Some(token.to_owned()), user: None });
        Ok(inner.epoch)
    }

    fn clear(&self, inner: &mut Inner) {
        if let Err(e) = self.shared.storage.remove(TOKEN_KEY) {
            warn!(error = %e, "failed to remove persisted token");
        }
        self.shared.api.set_default_bearer(None);
        inner.epoch += 1;
        self.publish(inner, Session::default());
    }

    fn publish(&self, inner: &mut Inner, next: Session) {
        inner.session = next.clone();
        self.shared.tx.send_replace(next);
    }

    async fn fetch_user(&self, token: String, epoch: u64) {
        let result = self.shared.api.current_user(&token).await;

        let mut inner = self.lock();
        if inner.epoch != epoch || inner.session.token.as_deref() != Some(token.as_str()) {
            debug!(epoch, current = inner.epoch, "discarding profile for superseded token");
            return;
        }
        match result {
            Ok(user) => {
                let next = Session { token: Some(token), user: Some(user) };
                self.publish(&mut inner, next);
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed; clearing session");
                self.clear(&mut inner);
            }
        }
    }
}
