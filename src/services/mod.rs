// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - everything that talks to the backend.

pub mod api;
pub mod auth;

pub use api::ApiClient;
pub use auth::AuthService;
