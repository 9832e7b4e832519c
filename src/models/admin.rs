// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel schemas.
//!
//! The client only renders these; the backend answers 403 for non-admins.

use serde::{Deserialize, Serialize};

use crate::models::{Course, User};

// ─── Users ───────────────────────────────────────────────────

/// Pagination block of `GET /admin/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// User row in the admin list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub enrolled_courses_count: u32,
}

/// `GET /admin/users` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<AdminUser>,
    pub pagination: Pagination,
}

/// Query for the admin user list.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            search: None,
        }
    }
}

impl UserQuery {
    /// Query pairs in the order the endpoint expects.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// Enrollment row in a user detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnrollment {
    pub course_id: u64,
    pub course_title: String,
    #[serde(default)]
    pub course_category: String,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub enrolled_at: Option<String>,
    #[serde(default)]
    pub last_accessed: Option<String>,
}

/// `GET /admin/users/:id` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub enrollments: Vec<UserEnrollment>,
}

/// `PUT /admin/users/:id` body; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ─── Analytics ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    pub total_users: u64,
    pub active_users: u64,
    pub total_courses: u64,
    pub total_enrollments: u64,
    #[serde(default)]
    pub recent_registrations: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseStat {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub enrolled_students: u64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub actual_enrollments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionStat {
    pub course_title: String,
    pub total_enrollments: u64,
    pub completions: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: String,
    pub enrollments: u64,
}

/// `GET /admin/analytics` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub overview: AnalyticsOverview,
    #[serde(default)]
    pub course_stats: Vec<CourseStat>,
    #[serde(default)]
    pub completion_stats: Vec<CompletionStat>,
    #[serde(default)]
    pub activity_chart: Vec<ActivityPoint>,
}

// ─── Courses ─────────────────────────────────────────────────

/// `{message, course}` returned by the toggle endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseToggle {
    #[serde(default)]
    pub message: String,
    pub course: Course,
}
