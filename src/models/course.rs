// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course, stage, and video reference data.

use serde::{Deserialize, Deserializer, Serialize};

/// A course as listed in the catalog or fetched in detail.
///
/// Listing responses omit `stages`; detail responses include them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub enrolled_students: u32,
    /// Stages in `order_index` order
    #[serde(default, deserialize_with = "ordered_stages")]
    pub stages: Vec<Stage>,
}

fn default_true() -> bool {
    true
}

/// An ordered grouping of videos within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: u64,
    pub order_index: u32,
    #[serde(default)]
    pub title: String,
    /// Videos in `order_index` order
    #[serde(default, deserialize_with = "ordered_videos")]
    pub videos: Vec<Video>,
}

/// A single video lesson hosted by an external player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Identifier on the external video host
    #[serde(rename = "youtube_id")]
    pub external_reference_id: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl Video {
    /// Nominal duration in seconds, when the backend knows it.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration_minutes.map(|m| u64::from(m) * 60)
    }
}

impl Course {
    /// Total number of videos across all stages.
    pub fn video_count(&self) -> usize {
        self.stages.iter().map(|s| s.videos.len()).sum()
    }

    /// Iterate over every video in stage order.
    pub fn videos(&self) -> impl Iterator<Item = &Video> {
        self.stages.iter().flat_map(|s| s.videos.iter())
    }

    /// Position of a stage within the course.
    pub fn stage_index(&self, stage_id: u64) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }
}

fn ordered_stages<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Stage>, D::Error> {
    let mut stages = Vec::<Stage>::deserialize(d)?;
    stages.sort_by_key(|s| s.order_index);
    Ok(stages)
}

fn ordered_videos<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Video>, D::Error> {
    let mut videos = Vec::<Video>::deserialize(d)?;
    videos.sort_by_key(|v| v.order_index);
    Ok(videos)
}

/// `{courses}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseList {
    pub courses: Vec<Course>,
}

/// `{categories}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

/// Learner-specific progress attached to a course detail response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseProgress {
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub last_accessed: Option<String>,
    #[serde(default)]
    pub enrolled_at: Option<String>,
}

/// `GET /courses/:id` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseDetail {
    pub course: Course,
    #[serde(default)]
    pub enrolled: bool,
    #[serde(default)]
    pub progress: CourseProgress,
    /// Per-video progress, present only for enrolled learners
    #[serde(skip)]
    pub video_progress: Vec<VideoProgressEntry>,
}

/// Per-video progress fields the backend adds to enrolled detail responses.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProgressEntry {
    pub video_id: u64,
    pub progress: f64,
    pub completed: bool,
}

impl CourseDetail {
    /// Parse a detail response, collecting the per-video progress fields.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct RawVideo {
            id: u64,
            #[serde(default)]
            progress: Option<f64>,
            #[serde(default)]
            completed: Option<bool>,
        }
        #[derive(Deserialize)]
        struct RawStage {
            #[serde(default)]
            videos: Vec<RawVideo>,
        }
        #[derive(Deserialize)]
        struct RawCourse {
            #[serde(default)]
            stages: Vec<RawStage>,
        }
        #[derive(Deserialize)]
        struct Raw {
            course: RawCourse,
        }

        let raw: Raw = serde_json::from_value(value.clone())?;
        let mut detail: CourseDetail = serde_json::from_value(value)?;
        detail.video_progress = raw
            .course
            .stages
            .into_iter()
            .flat_map(|s| s.videos)
            .filter(|v| v.progress.is_some() || v.completed.is_some())
            .map(|v| VideoProgressEntry {
                video_id: v.id,
                progress: v.progress.unwrap_or(0.0),
                completed: v.completed.unwrap_or(false),
            })
            .collect();
        Ok(detail)
    }
}
