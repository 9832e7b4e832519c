// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video progress tracking.
//!
//! While a video plays, a background task samples the playback position on a
//! fixed period and turns it into progress:
//! - the local view (position, percent) is republished on every sample
//! - a persistence call goes out only when the watched second is a positive
//!   multiple of the emit interval, when the completion threshold is first
//!   crossed, or on the tick after a failed call
//! - the persisted percent never drops below the last persisted value, even
//!   after seeking backwards, and completion never reverts
//!
//! The sampling task lives exactly as long as playback: it starts on
//! `Playing`, is aborted on `Paused`/`Ended`, and on drop.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::models::progress::clamp_percent;
use crate::models::{ProgressBook, ProgressUpdate, Video, VideoProgressRecord};

/// Player state transitions reported by the embedding view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
}

/// One reading of the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    pub position_secs: f64,
    pub duration_secs: f64,
}

/// Read access to the external video player.
pub trait Playback: Send + Sync {
    /// Current position and duration, or `None` if the player is not ready.
    fn sample(&self) -> Option<PlaybackSample>;
}

/// A progress write, as handed to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub video_id: u64,
    pub watched_seconds: u64,
    pub update: ProgressUpdate,
}

/// Destination of throttled progress writes.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn persist(&self, report: &ProgressReport) -> Result<()>;
}

/// What the player chrome shows; updated on every sample and on seek.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressView {
    pub position_secs: f64,
    pub duration_secs: f64,
    /// Percent of the current position, not clamped to the high-water mark
    pub percent: f64,
    pub completed: bool,
}

/// Tracking state for one video, independent of any timer.
#[derive(Debug, Clone)]
pub struct ProgressState {
    video_id: u64,
    threshold: f64,
    emit_interval: u64,
    /// High-water mark of acknowledged writes
    persisted_percent: f64,
    /// Value of a write that was sent but never acknowledged
    in_flight: Option<f64>,
    completed: bool,
    completion_persisted: bool,
    last_emitted_second: Option<u64>,
    retry: bool,
}

impl ProgressState {
    pub fn new(video_id: u64, config: &TrackerConfig) -> Self {
        Self {
            video_id,
            threshold: config.completion_threshold,
            emit_interval: config.emit_interval_secs.max(1),
            persisted_percent: 0.0,
            in_flight: None,
            completed: false,
            completion_persisted: false,
            last_emitted_second: None,
            retry: false,
        }
    }

    /// Continue from a record persisted in an earlier session.
    pub fn resume(config: &TrackerConfig, record: &VideoProgressRecord) -> Self {
        let mut state = Self::new(record.video_id, config);
        state.persisted_percent = clamp_percent(record.percent_complete);
        state.completed = record.completed || state.persisted_percent >= state.threshold;
        state.completion_persisted = record.completed;
        state
    }

    pub fn video_id(&self) -> u64 {
        self.video_id
    }

    pub fn persisted_percent(&self) -> f64 {
        self.persisted_percent
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Check whether a report is out without an answer yet.
    pub fn has_pending_write(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Fold in a playback sample.
    ///
    /// Returns the local view and, if a write is due, the report to persist.
    /// A returned report must be followed by [`acknowledge`](Self::acknowledge)
    /// or [`fail`](Self::fail).
    pub fn observe(&mut self, sample: PlaybackSample) -> (ProgressView, Option<ProgressReport>) {
        if !(sample.duration_secs > 0.0) {
            let view = ProgressView {
                position_secs: sample.position_secs,
                duration_secs: 0.0,
                percent: 0.0,
                completed: self.completed,
            };
            return (view, None);
        }

        // A write that never got an answer may have landed
        if let Some(pending) = self.in_flight.take() {
            self.persisted_percent = self.persisted_percent.max(pending);
            self.retry = true;
        }

        let percent = clamp_percent(sample.position_secs / sample.duration_secs * 100.0);
        let second = sample.position_secs.max(0.0).floor() as u64;

        if percent >= self.threshold {
            self.completed = true;
        }

        let view = ProgressView {
            position_secs: sample.position_secs,
            duration_secs: sample.duration_secs,
            percent,
            completed: self.completed,
        };

        let on_cadence = second > 0
            && second % self.emit_interval == 0
            && self.last_emitted_second != Some(second);
        let crossing = self.completed && !self.completion_persisted;

        if !(on_cadence || crossing || self.retry) {
            return (view, None);
        }

        self.last_emitted_second = Some(second);
        let report = ProgressReport {
            video_id: self.video_id,
            watched_seconds: second,
            update: ProgressUpdate {
                progress: self.persisted_percent.max(percent),
                completed: self.completed,
            },
        };
        self.in_flight = Some(report.update.progress);
        (view, Some(report))
    }

    /// Record that `report` was persisted.
    pub fn acknowledge(&mut self, report: &ProgressReport) {
        self.in_flight = None;
        self.retry = false;
        self.persisted_percent = self.persisted_percent.max(report.update.progress);
        if report.update.completed {
            self.completion_persisted = true;
        }
    }

    /// Record that the last report failed; the next sample retries.
    pub fn fail(&mut self) {
        self.in_flight = None;
        self.retry = true;
    }
}

/// Drives [`ProgressState`] from a periodic sampling task.
pub struct ProgressTracker {
    video_id: u64,
    period: Duration,
    state: Arc<Mutex<ProgressState>>,
    playback: Arc<dyn Playback>,
    sink: Arc<dyn ProgressSink>,
    view: watch::Sender<ProgressView>,
    task: Option<JoinHandle<()>>,
}

impl ProgressTracker {
    /// Track a video that has no stored progress yet.
    pub fn new(
        video: &Video,
        config: &TrackerConfig,
        playback: Arc<dyn Playback>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self::with_state(video, config, ProgressState::new(video.id, config), playback, sink)
    }

    /// Track a video, continuing from stored progress.
    pub fn resume(
        video: &Video,
        config: &TrackerConfig,
        record: &VideoProgressRecord,
        playback: Arc<dyn Playback>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self::with_state(video, config, ProgressState::resume(config, record), playback, sink)
    }

    fn with_state(
        video: &Video,
        config: &TrackerConfig,
        state: ProgressState,
        playback: Arc<dyn Playback>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let duration_secs = video.duration_seconds().unwrap_or(0) as f64;
        let (view, _) = watch::channel(ProgressView {
            position_secs: 0.0,
            duration_secs,
            percent: 0.0,
            completed: state.is_completed(),
        });
        Self {
            video_id: video.id,
            period: config.sample_period,
            state: Arc::new(Mutex::new(state)),
            playback,
            sink,
            view,
            task: None,
        }
    }

    pub fn video_id(&self) -> u64 {
        self.video_id
    }

    /// Follow the local view.
    pub fn subscribe(&self) -> watch::Receiver<ProgressView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> ProgressView {
        *self.view.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Copy of the tracking state.
    pub async fn snapshot(&self) -> ProgressState {
        self.state.lock().await.clone()
    }

    /// React to a player state change.
    pub fn on_state_change(&mut self, state: PlayerState) {
        match state {
            PlayerState::Playing => self.start(),
            PlayerState::Paused | PlayerState::Ended | PlayerState::Buffering => self.stop(),
            PlayerState::Unstarted => {}
        }
    }

    /// Start sampling. Must be called from within a tokio runtime.
    ///
    /// Starting a running tracker does nothing.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        let video_id = self.video_id;
        let period = self.period;
        let state = self.state.clone();
        let playback = self.playback.clone();
        let sink = self.sink.clone();
        let view = self.view.clone();

        tracing::debug!(video_id, "Progress tracking started");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(sample) = playback.sample() else {
                    continue;
                };

                let (local, report) = state.lock().await.observe(sample);
                view.send_replace(local);

                let Some(report) = report else {
                    continue;
                };
                match sink.persist(&report).await {
                    Ok(()) => {
                        tracing::debug!(
                            video_id,
                            progress = report.update.progress,
                            completed = report.update.completed,
                            "Progress persisted"
                        );
                        state.lock().await.acknowledge(&report);
                    }
                    Err(e) => {
                        tracing::warn!(video_id, error = %e, "Progress update failed, retrying on next sample");
                        state.lock().await.fail();
                    }
                }
            }
        }));
    }

    /// Stop sampling. Stopping a stopped tracker does nothing.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(video_id = self.video_id, "Progress tracking stopped");
        }
    }

    /// Jump the displayed position. Never persists anything by itself.
    pub fn seek(&self, position_secs: f64) {
        self.view.send_modify(|view| {
            view.position_secs = position_secs.max(0.0);
            view.percent = if view.duration_secs > 0.0 {
                clamp_percent(view.position_secs / view.duration_secs * 100.0)
            } else {
                0.0
            };
        });
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sink decorator that folds every persisted report into a [`ProgressBook`].
pub struct RecordingSink {
    inner: Arc<dyn ProgressSink>,
    book: Arc<Mutex<ProgressBook>>,
}

impl RecordingSink {
    pub fn new(inner: Arc<dyn ProgressSink>, book: Arc<Mutex<ProgressBook>>) -> Self {
        Self { inner, book }
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn persist(&self, report: &ProgressReport) -> Result<()> {
        self.inner.persist(report).await?;
        self.book
            .lock()
            .await
            .apply(report.video_id, report.watched_seconds, report.update, Utc::now());
        Ok(())
    }
}
