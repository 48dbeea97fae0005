//! Time limits and cancellation for long-running stages.
//!
//! Grid population and ranking check a [`StageBudget`] once per loop
//! iteration. When it expires they stop and hand back what they have so far,
//! flagged as incomplete; running out of time is never an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A deadline and/or external cancel flag for one processing stage.
#[derive(Debug, Clone)]
pub struct StageBudget {
    started: Instant,
    max: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl StageBudget {
    /// A budget that never expires.
    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            max: None,
            cancel: None,
        }
    }

    /// A budget that expires `max` after now. `None` means unlimited.
    pub fn new(max: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            max,
            cancel: None,
        }
    }

    /// Attaches an external cancel flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Returns a fresh budget with the same limit, starting now.
    pub fn restart(&self) -> Self {
        Self {
            started: Instant::now(),
            max: self.max,
            cancel: self.cancel.clone(),
        }
    }

    /// Time since the stage started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the deadline has passed or the cancel flag is set.
    #[inline]
    pub fn expired(&self) -> bool {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        match self.max {
            Some(max) => self.started.elapsed() >= max,
            None => false,
        }
    }
}

impl Default for StageBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// How far a budgeted loop got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    /// Items handled before stopping.
    pub processed: usize,
    /// False if the budget expired before every item was handled.
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited() {
        let budget = StageBudget::unlimited();
        assert!(!budget.expired());
    }

    #[test]
    fn test_zero_duration_expires() {
        let budget = StageBudget::new(Some(Duration::ZERO));
        assert!(budget.expired());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let budget = StageBudget::unlimited().with_cancel_flag(flag.clone());
        assert!(!budget.expired());

        flag.store(true, Ordering::Relaxed);
        assert!(budget.expired());
        assert!(budget.restart().expired());
    }
}
