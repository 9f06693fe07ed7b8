use crate::modules::listeners::{ListenerId, ListenerSet};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// XP awarded for every accepted report.
pub const XP_PER_REPORT: u32 = 10;
/// XP ceiling; overflow carries into level increments.
pub const XP_MAX: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub xp: u32,
    pub level: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// Single-user gamification state. `xp` is kept strictly below `XP_MAX` at
/// all times; awarding enough XP for several levels in one call carries all
/// the overflow before the one `progress_updated` notification fires.
pub struct ProgressTracker {
    state: Mutex<UserProgress>,
    listeners: ListenerSet<UserProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_progress(UserProgress::default())
    }

    /// Starts from a saved snapshot; an out-of-range `xp` is normalized by
    /// the same carry rule as `award_xp`.
    pub fn with_progress(initial: UserProgress) -> Self {
        let mut state = initial;
        while state.xp >= XP_MAX {
            state.xp -= XP_MAX;
            state.level += 1;
        }
        Self {
            state: Mutex::new(state),
            listeners: ListenerSet::new(),
        }
    }

    /// Defensive copy of the current progress.
    pub async fn get_progress(&self) -> UserProgress {
        *self.state.lock().await
    }

    pub async fn award_xp(&self, amount: u32) -> UserProgress {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.xp += amount;
            while state.xp >= XP_MAX {
                state.xp -= XP_MAX;
                state.level += 1;
            }
            *state
        };
        self.listeners.emit(&snapshot);
        snapshot
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&UserProgress) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
