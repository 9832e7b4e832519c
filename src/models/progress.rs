// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video progress records and per-course enrollment aggregates.
//!
//! Two rules hold for every record regardless of how playback moves:
//! - `percent_complete` never decreases (the high-water mark)
//! - `completed` never reverts to false once set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Course;

/// Body of `POST /videos/:id/progress`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Percent watched, clamped to 0..=100
    pub progress: f64,
    pub completed: bool,
}

/// Progress of one learner on one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProgressRecord {
    pub video_id: u64,
    pub user_id: u64,
    pub watched_seconds: u64,
    pub percent_complete: f64,
    pub completed: bool,
}

impl VideoProgressRecord {
    /// Empty record created on first playback.
    pub fn new(video_id: u64, user_id: u64) -> Self {
        Self {
            video_id,
            user_id,
            watched_seconds: 0,
            percent_complete: 0.0,
            completed: false,
        }
    }

    /// Fold a newer observation into this record.
    ///
    /// Returns `true` if anything changed.
    pub fn merge(&mut self, watched_seconds: u64, update: ProgressUpdate) -> bool {
        let before = self.clone();
        self.watched_seconds = self.watched_seconds.max(watched_seconds);
        self.percent_complete = self.percent_complete.max(clamp_percent(update.progress));
        self.completed |= update.completed;
        *self != before
    }
}

/// Clamp a percentage into 0..=100, mapping NaN to 0.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Learner-level summary of one enrolled course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    pub course_id: u64,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// Share of the course's videos that are completed, in percent
    pub aggregate_progress_percent: f64,
}

/// All progress records for one learner in one course.
#[derive(Debug, Clone)]
pub struct ProgressBook {
    course_id: u64,
    user_id: u64,
    video_ids: Vec<u64>,
    records: HashMap<u64, VideoProgressRecord>,
    summary: EnrollmentSummary,
}

impl ProgressBook {
    /// Start an empty book for a freshly enrolled course.
    pub fn new(course: &Course, user_id: u64, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            course_id: course.id,
            user_id,
            video_ids: course.videos().map(|v| v.id).collect(),
            records: HashMap::new(),
            summary: EnrollmentSummary {
                course_id: course.id,
                enrolled_at,
                last_accessed_at: enrolled_at,
                aggregate_progress_percent: 0.0,
            },
        }
    }

    pub fn course_id(&self) -> u64 {
        self.course_id
    }

    pub fn summary(&self) -> &EnrollmentSummary {
        &self.summary
    }

    pub fn record(&self, video_id: u64) -> Option<&VideoProgressRecord> {
        self.records.get(&video_id)
    }

    /// Check whether a video is completed.
    pub fn is_completed(&self, video_id: u64) -> bool {
        self.records.get(&video_id).is_some_and(|r| r.completed)
    }

    /// Merge an observation for a video, recomputing the summary on change.
    ///
    /// Updates for videos outside the course are ignored.
    pub fn apply(
        &mut self,
        video_id: u64,
        watched_seconds: u64,
        update: ProgressUpdate,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.video_ids.contains(&video_id) {
            tracing::debug!(video_id, course_id = self.course_id, "Ignoring progress for foreign video");
            return false;
        }

        let user_id = self.user_id;
        let changed = self
            .records
            .entry(video_id)
            .or_insert_with(|| VideoProgressRecord::new(video_id, user_id))
            .merge(watched_seconds, update);

        if changed {
            self.summary.aggregate_progress_percent = self.aggregate_percent();
            self.summary.last_accessed_at = now;
        }
        changed
    }

    fn aggregate_percent(&self) -> f64 {
        if self.video_ids.is_empty() {
            return 0.0;
        }
        let completed = self
            .video_ids
            .iter()
            .filter(|id| self.is_completed(**id))
            .count();
        completed as f64 / self.video_ids.len() as f64 * 100.0
    }
}
