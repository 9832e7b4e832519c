// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Typed schemas for every API response the client consumes.

pub mod admin;
pub mod course;
pub mod dashboard;
pub mod progress;
pub mod user;

pub use course::{Course, CourseDetail, Stage, Video};
pub use dashboard::{Dashboard, DashboardStats, EnrolledCourse};
pub use progress::{EnrollmentSummary, ProgressBook, ProgressUpdate, VideoProgressRecord};
pub use user::{Credentials, PasswordChange, ProfileUpdate, Registration, User};
