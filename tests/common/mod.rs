// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use coursehub_client::services::ApiClient;
use coursehub_client::session::SessionContext;
use coursehub_client::token_store::{MemoryTokenStore, TokenStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Token the mock backend hands out and accepts.
pub const VALID_TOKEN: &str = "valid-token";

/// Password the mock backend accepts for any email.
#[allow(dead_code)]
pub const VALID_PASSWORD: &str = "correct-horse";

/// One request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    holds: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl MockState {
    /// Hold responses on `path` until the returned handle is notified, once
    /// per request.
    #[allow(dead_code)]
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    /// Wait until `count` requests to `path` have arrived.
    #[allow(dead_code)]
    pub async fn wait_for_requests(&self, path: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.requests_to(path).len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("request never reached the backend");
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

/// Backend stub running on an ephemeral local port.
pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
}

/// Start the mock backend.
pub async fn spawn_backend() -> MockServer {
    let state = MockState::default();
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer {
        base_url: format!("http://{}/api", addr),
        state,
    }
}

/// Client against `base_url` with an in-memory token store.
#[allow(dead_code)]
pub fn client(base_url: &str, stored_token: Option<&str>) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(match stored_token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let session = SessionContext::new(store.clone() as Arc<dyn TokenStore>);
    (ApiClient::new(base_url, session), store)
}

#[allow(dead_code)]
pub fn user_json() -> Value {
    json!({
        "id": 7,
        "email": "learner@example.com",
        "first_name": "Grace",
        "last_name": "Hopper",
        "is_admin": false,
        "is_active": true,
        "created_at": "2026-01-05T10:00:00"
    })
}

#[allow(dead_code)]
pub fn course_json(id: u64, title: &str, category: &str, difficulty: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("{} from the ground up", title),
        "category": category,
        "difficulty": difficulty,
        "is_featured": id == 1,
        "is_active": true,
        "enrolled_students": 12
    })
}

fn course_detail_json(id: u64) -> Value {
    let mut course = course_json(id, "Web Development Mastery", "Programming", "Beginner");
    // Deliberately out of order; the client sorts by order_index
    course["stages"] = json!([
        {
            "id": 20, "order_index": 2, "title": "Backend",
            "videos": [
                {"id": 201, "title": "Servers", "youtube_id": "srv", "order_index": 1, "duration_minutes": 10}
            ]
        },
        {
            "id": 10, "order_index": 1, "title": "Basics",
            "videos": [
                {"id": 102, "title": "CSS", "youtube_id": "css", "order_index": 2, "duration_minutes": 8,
                 "progress": 40.0, "completed": false},
                {"id": 101, "title": "HTML", "youtube_id": "html", "order_index": 1, "duration_minutes": 5,
                 "progress": 100.0, "completed": true}
            ]
        }
    ]);
    json!({
        "course": course,
        "enrolled": true,
        "progress": {"completion_percentage": 33.3, "enrolled_at": "2026-01-06T09:00:00"}
    })
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    reply(StatusCode::UNAUTHORIZED, json!({"error": "Token has expired"}))
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    let path = uri.path().to_string();

    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let hold = state.holds.lock().unwrap().get(&path).cloned();
    if let Some(hold) = hold {
        hold.notified().await;
    }

    let authorized = authorization.as_deref() == Some(&format!("Bearer {}", VALID_TOKEN));

    match (method, path.as_str()) {
        (Method::GET, "/api/health") => reply(StatusCode::OK, json!({"status": "healthy"})),

        (Method::POST, "/api/auth/login") => {
            let password = body
                .as_ref()
                .and_then(|b| b["password"].as_str())
                .unwrap_or_default();
            if password == VALID_PASSWORD {
                reply(
                    StatusCode::OK,
                    json!({"access_token": VALID_TOKEN, "user": user_json()}),
                )
            } else {
                reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"error": "Invalid email or password"}),
                )
            }
        }
        (Method::POST, "/api/auth/register") => reply(
            StatusCode::BAD_REQUEST,
            json!({"error": "Email already registered"}),
        ),
        (Method::POST, "/api/auth/logout") => {
            reply(StatusCode::OK, json!({"message": "Logged out"}))
        }
        (Method::GET, "/api/auth/profile") if authorized => {
            reply(StatusCode::OK, json!({"user": user_json()}))
        }
        (Method::PUT, "/api/auth/profile") if authorized => {
            let mut user = user_json();
            if let Some(first) = body.as_ref().and_then(|b| b["first_name"].as_str()) {
                user["first_name"] = json!(first);
            }
            reply(
                StatusCode::OK,
                json!({"message": "Profile updated", "user": user}),
            )
        }
        (_, p) if p.starts_with("/api/auth/") => unauthorized(),

        (Method::GET, "/api/courses") => reply(
            StatusCode::OK,
            json!({"courses": [
                course_json(1, "Web Development Mastery", "Programming", "Beginner"),
                course_json(2, "Trading & Finance", "Finance", "Intermediate")
            ]}),
        ),
        (Method::GET, "/api/courses/999") => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Database unavailable"}),
        ),
        (Method::GET, "/api/courses/404") => {
            reply(StatusCode::NOT_FOUND, json!({"error": "Course not found"}))
        }
        (Method::GET, p) if p.starts_with("/api/courses/") => {
            let id = p.trim_start_matches("/api/courses/").parse().unwrap_or(1);
            reply(StatusCode::OK, course_detail_json(id))
        }
        (Method::GET, "/api/categories") => reply(
            StatusCode::OK,
            json!({"categories": ["Programming", "Finance", "Design"]}),
        ),

        // Authenticated-only from here on
        (_, _) if !authorized => unauthorized(),

        (Method::POST, p) if p.ends_with("/enroll") => reply(
            StatusCode::CREATED,
            json!({"message": "Successfully enrolled in course"}),
        ),
        (Method::POST, p) if p.starts_with("/api/videos/") && p.ends_with("/progress") => reply(
            StatusCode::OK,
            json!({"message": "Progress updated successfully"}),
        ),
        // Shape drifted: stats is not an object
        (Method::GET, "/api/dashboard") => reply(
            StatusCode::OK,
            json!({"stats": "unavailable", "enrolled_courses": []}),
        ),
        (Method::GET, "/api/admin/users") => reply(
            StatusCode::FORBIDDEN,
            json!({"error": "Admin access required"}),
        ),

        _ => reply(StatusCode::NOT_FOUND, json!({"error": "Not found"})),
    }
}
