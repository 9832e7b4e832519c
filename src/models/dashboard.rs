//! Learner dashboard schema.

use serde::{Deserialize, Serialize};

/// `GET /dashboard` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    #[serde(default)]
    pub enrolled_courses: Vec<EnrolledCourse>,
}

/// Enrollment counts by completion bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_courses: u32,
    pub completed_courses: u32,
    pub in_progress_courses: u32,
    pub not_started_courses: u32,
}

/// One enrolled course on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub category: String,
    /// Aggregate completion percent
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub last_accessed: Option<String>,
    #[serde(default)]
    pub enrolled_at: Option<String>,
}

impl EnrolledCourse {
    pub fn is_completed(&self) -> bool {
        self.progress >= 100.0
    }

    pub fn is_in_progress(&self) -> bool {
        self.progress > 0.0 && self.progress < 100.0
    }
}

impl DashboardStats {
    /// Bucket enrollments the same way the dashboard endpoint does.
    pub fn from_courses(courses: &[EnrolledCourse]) -> Self {
        let total = courses.len() as u32;
        let completed = courses.iter().filter(|c| c.is_completed()).count() as u32;
        let in_progress = courses.iter().filter(|c| c.is_in_progress()).count() as u32;
        Self {
            total_courses: total,
            completed_courses: completed,
            in_progress_courses: in_progress,
            not_started_courses: total - completed - in_progress,
        }
    }
}
