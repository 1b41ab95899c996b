//! Progression rules for the tiered vocabulary quizzes.
//!
//! The server is binary about eligibility: a difficulty is either locked or
//! unlocked, derived from completions on every load. The third
//! `Unlockable` tier exists for the client, which layers a volatile
//! "acknowledged" set on top so the unlock animation plays exactly once per
//! transition. `check_prerequisite` is the write-path guard: it re-verifies
//! eligibility server-side before a completion is accepted.

use std::collections::HashSet;

use crate::models::completion::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    /// Prerequisite not completed.
    Locked,
    /// Eligible, but the client has not yet acknowledged the unlock.
    Unlockable,
    /// Eligible and acknowledged.
    Unlocked,
}

/// Server-side eligibility: BEGINNER always, higher tiers iff the
/// immediately lower tier has a completion.
pub fn is_unlocked(difficulty: Difficulty, completed: &HashSet<Difficulty>) -> bool {
    match difficulty.prerequisite() {
        None => true,
        Some(prereq) => completed.contains(&prereq),
    }
}

/// Three-tier state for the client gating UI. `acknowledged` is the
/// client-local set of tiers whose unlock the user has already seen; it is
/// ephemeral per browser session and never persisted.
pub fn unlock_state(
    difficulty: Difficulty,
    completed: &HashSet<Difficulty>,
    acknowledged: &HashSet<Difficulty>,
) -> UnlockState {
    if !is_unlocked(difficulty, completed) {
        UnlockState::Locked
    } else if difficulty.prerequisite().is_some() && !acknowledged.contains(&difficulty) {
        UnlockState::Unlockable
    } else {
        UnlockState::Unlocked
    }
}

/// Write-path guard: Err carries the missing prerequisite level.
pub fn check_prerequisite(
    difficulty: Difficulty,
    completed: &HashSet<Difficulty>,
) -> Result<(), Difficulty> {
    match difficulty.prerequisite() {
        Some(prereq) if !completed.contains(&prereq) => Err(prereq),
        _ => Ok(()),
    }
}
