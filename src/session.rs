// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session context: the client's only process-wide state.
//!
//! State changes go through [`AuthState::apply`], a pure transition function.
//! [`SessionContext`] applies events atomically in completion order, persists
//! the token through a [`TokenStore`], and publishes every new state on a
//! watch channel so dependent views can follow along.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::User;
use crate::token_store::TokenStore;

/// Notice shown when a stored or in-use token stops working.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// An authenticated learner.
///
/// `is_admin` is advisory, for deciding what to render; the backend enforces
/// admin access on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: u64,
    pub display_name: String,
    pub is_admin: bool,
}

impl Session {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            token,
            user_id: user.id,
            display_name: user.display_name(),
            is_admin: user.is_admin,
        }
    }
}

/// Authentication state as seen by views.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Not logged in. `notice` explains an involuntary logout.
    Anonymous { notice: Option<String> },
    /// Login, registration, or hydration in flight. `token` is set only while
    /// hydrating a persisted token.
    Authenticating { token: Option<String> },
    Authenticated(Session),
    /// Login or registration failed; treated as not authenticated.
    Error { message: String },
}

/// Inputs to the session transition function.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Login or register form submitted.
    Submitted,
    /// Validating a persisted token.
    Hydrating { token: String },
    /// The backend accepted credentials.
    Authenticated { token: String, user: User },
    /// The backend confirmed a persisted token. Ignored unless that token is
    /// still pending.
    Restored { token: String, user: User },
    /// Login or registration failed.
    Failed { message: String },
    /// The backend refused `token`. Ignored unless it is the current token.
    TokenRejected { token: String, message: String },
    LoggedOut,
    ProfileUpdated(User),
    ErrorCleared,
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Anonymous { notice: None }
    }
}

impl AuthState {
    /// Compute the state that follows `event`.
    pub fn apply(&self, event: SessionEvent) -> AuthState {
        match event {
            SessionEvent::Submitted => match self {
                // The current session stays in place until the attempt settles
                AuthState::Authenticated(_) => self.clone(),
                _ => AuthState::Authenticating { token: None },
            },
            SessionEvent::Hydrating { token } => AuthState::Authenticating { token: Some(token) },
            // A login response wins over anything that completed before it,
            // including a logout
            SessionEvent::Authenticated { token, user } => {
                AuthState::Authenticated(Session::new(token, &user))
            }
            SessionEvent::Restored { token, user } => match self {
                AuthState::Authenticating { token: Some(pending) } if *pending == token => {
                    AuthState::Authenticated(Session::new(token, &user))
                }
                _ => self.clone(),
            },
            SessionEvent::Failed { message } => match self {
                // Failed attempts never log an authenticated user out
                AuthState::Authenticated(_) => self.clone(),
                _ => AuthState::Error { message },
            },
            SessionEvent::TokenRejected { token, message } => {
                if self.token() == Some(token.as_str()) {
                    AuthState::Anonymous {
                        notice: Some(message),
                    }
                } else {
                    self.clone()
                }
            }
            SessionEvent::LoggedOut => AuthState::Anonymous { notice: None },
            SessionEvent::ProfileUpdated(user) => match self {
                AuthState::Authenticated(session) => {
                    AuthState::Authenticated(Session::new(session.token.clone(), &user))
                }
                _ => self.clone(),
            },
            SessionEvent::ErrorCleared => match self {
                AuthState::Error { .. } | AuthState::Anonymous { .. } => {
                    AuthState::Anonymous { notice: None }
                }
                _ => self.clone(),
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_admin)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Bearer token to attach to outgoing requests.
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated(session) => Some(&session.token),
            AuthState::Authenticating { token } => token.as_deref(),
            _ => None,
        }
    }

    /// Message to display, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AuthState::Error { message } => Some(message),
            AuthState::Anonymous { notice } => notice.as_deref(),
            _ => None,
        }
    }
}

/// Claims readable from a JWT payload without verifying it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT. Returns `None` for opaque tokens.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_unix)
    }
}

struct Inner {
    state: watch::Sender<AuthState>,
    store: Arc<dyn TokenStore>,
}

/// Shared handle to the session; cheap to clone.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    /// Create a context, picking up any token persisted by an earlier run.
    ///
    /// A stored token starts in `Authenticating` until hydration confirms it.
    /// A token whose `exp` claim has already passed is dropped right away.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let stored = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored token, starting anonymous");
                None
            }
        };

        let initial = match stored {
            Some(token)
                if TokenClaims::decode(&token)
                    .is_some_and(|c| c.is_expired_at(Utc::now().timestamp())) =>
            {
                tracing::info!("Stored token already expired");
                if let Err(e) = store.clear() {
                    tracing::warn!(error = %e, "Failed to clear expired token");
                }
                AuthState::Anonymous {
                    notice: Some(SESSION_EXPIRED_MESSAGE.to_string()),
                }
            }
            Some(token) => AuthState::Authenticating { token: Some(token) },
            None => AuthState::default(),
        };

        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner { state, store }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Token waiting to be confirmed by hydration, if any.
    pub fn pending_token(&self) -> Option<String> {
        match &*self.inner.state.borrow() {
            AuthState::Authenticating { token } => token.clone(),
            _ => None,
        }
    }

    /// Apply an event and return the resulting state.
    ///
    /// The transition and the token store update happen under the channel's
    /// write lock, so events land in the order they complete.
    pub fn apply(&self, event: SessionEvent) -> AuthState {
        let store = &self.inner.store;
        self.inner.state.send_if_modified(|state| {
            let next = state.apply(event);
            if next == *state {
                return false;
            }

            if next.token() != state.token() {
                let persisted = match next.token() {
                    Some(token) => store.save(token),
                    None => store.clear(),
                };
                if let Err(e) = persisted {
                    tracing::warn!(error = %e, "Failed to persist session token");
                }
            }

            tracing::debug!(
                authenticated = next.is_authenticated(),
                "Session state changed"
            );
            *state = next;
            true
        });
        self.state()
    }
}
