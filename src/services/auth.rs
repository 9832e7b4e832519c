// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication workflows on top of the session context.
//!
//! Each operation validates its form locally, drives the session through
//! its transitions, and hands the outcome back to the caller.

use validator::Validate;

use crate::error::{ApiError, Result};
use crate::models::{Credentials, PasswordChange, ProfileUpdate, Registration, User};
use crate::services::ApiClient;
use crate::session::{AuthState, SessionContext, SessionEvent, SESSION_EXPIRED_MESSAGE};

/// Login, registration, logout, and profile operations.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Create the service and validate any persisted token.
    pub async fn connect(api: ApiClient) -> Self {
        let service = Self::new(api);
        service.hydrate().await;
        service
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        self.api.session()
    }

    /// Confirm a persisted token by fetching the profile.
    ///
    /// Any failure clears the token and leaves the session anonymous with an
    /// explanatory notice. Does nothing if no token is pending.
    pub async fn hydrate(&self) -> AuthState {
        let Some(token) = self.session().pending_token() else {
            return self.session().state();
        };

        match self.api.get_profile().await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Session restored");
                self.session()
                    .apply(SessionEvent::Restored { token, user })
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored session rejected");
                self.session().apply(SessionEvent::TokenRejected {
                    token,
                    message: SESSION_EXPIRED_MESSAGE.to_string(),
                })
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;
        self.session().apply(SessionEvent::Submitted);
        let result = self.api.login(credentials).await;
        self.settle(result)
    }

    pub async fn register(&self, form: &Registration) -> Result<User> {
        form.validate()?;
        self.session().apply(SessionEvent::Submitted);
        let result = self.api.register(form).await;
        self.settle(result)
    }

    fn settle(&self, result: Result<User>) -> Result<User> {
        if let Err(e) = &result {
            tracing::info!(error = %e, "Authentication failed");
            self.session().apply(SessionEvent::Failed {
                message: e.message(),
            });
        }
        result
    }

    /// End the session.
    ///
    /// The remote call is best effort; the local session is cleared whatever
    /// its outcome.
    pub async fn logout(&self) -> AuthState {
        if self.session().token().is_some() {
            if let Err(e) = self.api.logout_remote().await {
                tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        tracing::info!("Logged out");
        self.session().apply(SessionEvent::LoggedOut)
    }

    pub async fn update_profile(&self, form: &ProfileUpdate) -> Result<User> {
        form.validate()?;
        self.require_session()?;
        let user = self.api.update_profile(form).await?;
        self.session()
            .apply(SessionEvent::ProfileUpdated(user.clone()));
        Ok(user)
    }

    pub async fn change_password(&self, form: &PasswordChange) -> Result<String> {
        form.validate()?;
        if form.current_password == form.new_password {
            return Err(ApiError::Validation(
                "new_password must differ from current_password".to_string(),
            ));
        }
        self.require_session()?;
        self.api.change_password(form).await
    }

    /// Dismiss the displayed error.
    pub fn clear_error(&self) -> AuthState {
        self.session().apply(SessionEvent::ErrorCleared)
    }

    fn require_session(&self) -> Result<()> {
        if self.session().is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::Auth("Authentication required".to_string()))
        }
    }
}
