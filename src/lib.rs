// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CourseHub client: session, catalog, and video progress tracking
//!
//! This crate provides the client side of the CourseHub learning platform:
//! a typed REST client, the learner's session, course filtering, stage
//! unlocking, and the video progress tracker.

pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod services;
pub mod session;
pub mod token_store;
pub mod tracker;

use std::sync::Arc;

use config::Config;
use gate::StageGate;
use services::{ApiClient, AuthService};
use session::SessionContext;
use token_store::TokenStore;

/// Shared client state handed to every view.
#[derive(Clone)]
pub struct ClientContext {
    pub config: Config,
    pub api: ApiClient,
    pub auth: AuthService,
    pub gate: StageGate,
}

impl ClientContext {
    /// Build the context and restore any persisted session.
    pub async fn connect(config: Config, store: Arc<dyn TokenStore>) -> error::Result<Self> {
        let session = SessionContext::new(store);
        let api = ApiClient::from_config(&config, session)?;
        let auth = AuthService::connect(api.clone()).await;
        let gate = StageGate::new(config.unlock_policy);
        Ok(Self {
            config,
            api,
            auth,
            gate,
        })
    }

    pub fn session(&self) -> &SessionContext {
        self.api.session()
    }
}
