// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API client tests against a local mock backend.
//!
//! These tests verify that:
//! 1. The bearer token is attached whenever the session holds one
//! 2. Server error messages surface verbatim, with a generic fallback
//! 3. Transport and schema failures map to their own error kinds
//! 4. A 401 drops the session

use coursehub_client::catalog::CourseFilter;
use coursehub_client::error::ApiError;
use coursehub_client::models::ProgressUpdate;
use coursehub_client::token_store::TokenStore;
use reqwest::Method;

mod common;
use common::{client, spawn_backend, VALID_TOKEN};

#[tokio::test]
async fn test_bearer_token_attached_when_present() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, Some(VALID_TOKEN));

    api.get_categories().await.unwrap();

    let requests = server.state.requests_to("/api/categories");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer valid-token")
    );
}

#[tokio::test]
async fn test_no_authorization_header_when_anonymous() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, None);

    let categories = api.get_categories().await.unwrap();
    assert_eq!(categories, vec!["Programming", "Finance", "Design"]);

    let requests = server.state.requests_to("/api/categories");
    assert!(requests[0].authorization.is_none());
}

#[tokio::test]
async fn test_server_error_message_surfaced() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, None);

    let err = api.get_course(999).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "Database unavailable");
    assert!(err.is_retryable());

    let err = api.get_course(404).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Course not found"));
}

#[tokio::test]
async fn test_network_failure_has_no_status() {
    // Nothing listens on port 1
    let (api, _) = client("http://127.0.0.1:1/api", None);

    let err = api.get_categories().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
    assert_eq!(err.message(), "network failure");
}

#[tokio::test]
async fn test_schema_mismatch_is_reported() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, Some(VALID_TOKEN));

    let err = api.get_dashboard().await.unwrap_err();
    assert!(matches!(err, ApiError::Schema(_)), "got {:?}", err);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_login_persists_token() {
    let server = spawn_backend().await;
    let (api, store) = client(&server.base_url, None);

    let user = api
        .login(&coursehub_client::models::Credentials {
            email: "learner@example.com".to_string(),
            password: common::VALID_PASSWORD.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, 7);
    assert!(api.session().is_authenticated());
    assert_eq!(store.load().unwrap().as_deref(), Some(VALID_TOKEN));
}

#[tokio::test]
async fn test_unauthorized_response_drops_session() {
    let server = spawn_backend().await;
    let (api, store) = client(&server.base_url, Some("stale-token"));

    let err = api.get_profile().await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.message(), "Token has expired");

    let state = api.session().state();
    assert!(!state.is_authenticated());
    assert!(state.token().is_none());
    assert!(state.error_message().is_some());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_course_filter_sent_as_query() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, None);

    let filter = CourseFilter {
        category: "Programming".to_string(),
        difficulty: "All".to_string(),
        search_text: "web dev".to_string(),
    };
    let courses = api.get_courses(&filter).await.unwrap();
    assert_eq!(courses.len(), 2);

    let requests = server.state.requests_to("/api/courses");
    let query = requests[0].query.as_deref().unwrap();
    assert!(query.contains("category=Programming"));
    assert!(query.contains("search=web+dev") || query.contains("search=web%20dev"));
    assert!(!query.contains("difficulty"));
}

#[tokio::test]
async fn test_unfiltered_listing_sends_no_query() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, None);

    api.get_courses(&CourseFilter::default()).await.unwrap();

    let requests = server.state.requests_to("/api/courses");
    assert!(requests[0].query.is_none());
}

#[tokio::test]
async fn test_course_detail_sorted_with_video_progress() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, None);

    let detail = api.get_course(1).await.unwrap();
    let stage_ids: Vec<u64> = detail.course.stages.iter().map(|s| s.id).collect();
    assert_eq!(stage_ids, vec![10, 20]);
    let video_ids: Vec<u64> = detail.course.videos().map(|v| v.id).collect();
    assert_eq!(video_ids, vec![101, 102, 201]);

    assert!(detail.enrolled);
    let completed: Vec<u64> = detail
        .video_progress
        .iter()
        .filter(|p| p.completed)
        .map(|p| p.video_id)
        .collect();
    assert_eq!(completed, vec![101]);
}

#[tokio::test]
async fn test_progress_update_body() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, Some(VALID_TOKEN));

    api.update_video_progress(
        101,
        &ProgressUpdate {
            progress: 45.5,
            completed: false,
        },
    )
    .await
    .unwrap();

    let requests = server.state.requests_to("/api/videos/101/progress");
    assert_eq!(requests[0].method, Method::POST);
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["progress"], 45.5);
    assert_eq!(body["completed"], false);
}

#[tokio::test]
async fn test_forbidden_admin_call() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, Some(VALID_TOKEN));

    let err = api.get_users(&Default::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    assert_eq!(err.message(), "Admin access required");
    // A 403 does not end the session
    assert_eq!(api.session().token().as_deref(), Some(VALID_TOKEN));
}

#[tokio::test]
async fn test_raw_request_and_health() {
    let server = spawn_backend().await;
    let (api, _) = client(&server.base_url, Some(VALID_TOKEN));

    let health = api.health_check().await.unwrap();
    assert_eq!(health["status"], "healthy");

    let err = api
        .request(Method::GET, "/no-such-endpoint", None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}
