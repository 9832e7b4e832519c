// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stage unlock gate: which stages of a course are playable.
//!
//! Unlock state is a set of stage IDs held per learner and course. The first
//! stage of every course is unlocked on enrollment. Whether a later stage may
//! be unlocked depends on the configured [`UnlockPolicy`].

use std::str::FromStr;

use crate::models::{Course, ProgressBook, Stage};

/// Rule for unlocking stage N when N > 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlockPolicy {
    /// Stage N-1 must be unlocked and all its videos completed.
    #[default]
    PreviousCompleted,
    /// Stage N-1 must be unlocked.
    PreviousUnlocked,
    /// Any stage may be unlocked at any time.
    Independent,
}

impl FromStr for UnlockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "previous-completed" | "sequential" => Ok(UnlockPolicy::PreviousCompleted),
            "previous-unlocked" => Ok(UnlockPolicy::PreviousUnlocked),
            "independent" => Ok(UnlockPolicy::Independent),
            other => Err(format!("unknown unlock policy: {}", other)),
        }
    }
}

/// Why a stage could not be unlocked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Stage {0} is not part of this course")]
    UnknownStage(u64),

    #[error("Unlock stage {0} first")]
    PreviousStageLocked(u64),

    #[error("Complete every video in stage {0} first")]
    PreviousStageIncomplete(u64),
}

/// Stage IDs unlocked for one learner in one course, in unlock order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockedStages {
    ids: Vec<u64>,
}

impl UnlockedStages {
    /// Empty unlock history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlock state of a fresh enrollment: the first stage only.
    pub fn for_enrollment(course: &Course) -> Self {
        let mut unlocked = Self::new();
        if let Some(first) = course.stages.first() {
            unlocked.ids.push(first.id);
        }
        unlocked
    }

    pub fn contains(&self, stage_id: u64) -> bool {
        self.ids.contains(&stage_id)
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }
}

impl FromIterator<u64> for UnlockedStages {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |acc, id| unlock_id(id, acc))
    }
}

/// Check whether `stage` is playable.
pub fn is_unlocked(stage: &Stage, unlocked: &UnlockedStages) -> bool {
    unlocked.contains(stage.id)
}

/// Mark `stage` unlocked. Unlocking twice is a no-op.
pub fn unlock(stage: &Stage, unlocked: UnlockedStages) -> UnlockedStages {
    unlock_id(stage.id, unlocked)
}

fn unlock_id(stage_id: u64, mut unlocked: UnlockedStages) -> UnlockedStages {
    if !unlocked.contains(stage_id) {
        unlocked.ids.push(stage_id);
    }
    unlocked
}

/// Check whether every video in `stage` is completed.
pub fn is_stage_complete(stage: &Stage, progress: &ProgressBook) -> bool {
    stage.videos.iter().all(|v| progress.is_completed(v.id))
}

/// Applies an [`UnlockPolicy`] to a course.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageGate {
    policy: UnlockPolicy,
}

impl StageGate {
    pub fn new(policy: UnlockPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnlockPolicy {
        self.policy
    }

    /// Check whether the policy allows unlocking `stage_id` right now.
    pub fn can_unlock(
        &self,
        course: &Course,
        stage_id: u64,
        unlocked: &UnlockedStages,
        progress: &ProgressBook,
    ) -> Result<(), GateError> {
        let index = course
            .stage_index(stage_id)
            .ok_or(GateError::UnknownStage(stage_id))?;

        // The first stage never has a prerequisite
        if index == 0 || self.policy == UnlockPolicy::Independent {
            return Ok(());
        }

        let previous = &course.stages[index - 1];
        if !is_unlocked(previous, unlocked) {
            return Err(GateError::PreviousStageLocked(previous.id));
        }
        if self.policy == UnlockPolicy::PreviousCompleted && !is_stage_complete(previous, progress)
        {
            return Err(GateError::PreviousStageIncomplete(previous.id));
        }
        Ok(())
    }

    /// Unlock `stage_id` if the policy allows it.
    pub fn try_unlock(
        &self,
        course: &Course,
        stage_id: u64,
        unlocked: UnlockedStages,
        progress: &ProgressBook,
    ) -> Result<UnlockedStages, GateError> {
        self.can_unlock(course, stage_id, &unlocked, progress)?;
        tracing::debug!(course_id = course.id, stage_id, "Stage unlocked");
        Ok(unlock_id(stage_id, unlocked))
    }

    /// Stages currently playable, in course order.
    pub fn playable<'a>(&self, course: &'a Course, unlocked: &UnlockedStages) -> Vec<&'a Stage> {
        course
            .stages
            .iter()
            .filter(|s| is_unlocked(s, unlocked))
            .collect()
    }
}
