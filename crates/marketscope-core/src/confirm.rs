//! Two-step confirmation for destructive operations.
//!
//! The dashboard requires a wipe to be requested twice: the first call
//! arms the guard, the second call within the confirmation window goes
//! through. The guard is pure in-memory state held by the caller; the
//! store itself deletes unconditionally, so anything scripted can skip
//! this layer entirely.

use crate::{Result, StoreError};
use marketscope_types::DeleteScope;
use std::time::{Duration, Instant};

const DEFAULT_CONFIRM_WINDOW: Duration = Duration::from_secs(30);

/// Armed-state machine for bulk deletes. One scope can be armed at a
/// time; arming a different scope replaces the previous one.
#[derive(Debug)]
pub struct WipeGuard {
    window: Duration,
    armed: Option<(DeleteScope, Instant)>,
}

impl Default for WipeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl WipeGuard {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_CONFIRM_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self { window, armed: None }
    }

    /// First step: register intent to wipe `scope`. Returns how long
    /// the caller has to confirm.
    pub fn arm(&mut self, scope: DeleteScope) -> Duration {
        self.armed = Some((scope, Instant::now()));
        tracing::info!(
            target: "marketscope::confirm",
            scope = scope.label(),
            window_secs = self.window.as_secs(),
            "wipe armed"
        );
        self.window
    }

    /// Second step: consume the armed state for `scope`. Fails with
    /// `NotArmed` when `scope` was never armed (or a different scope
    /// is), and with `ConfirmExpired` when the window has lapsed. The
    /// guard disarms on every outcome, so a failed confirm starts over.
    pub fn commit(&mut self, scope: DeleteScope) -> Result<()> {
        match self.armed.take() {
            Some((armed_scope, armed_at)) if armed_scope == scope => {
                if armed_at.elapsed() > self.window {
                    return Err(StoreError::ConfirmExpired(scope.label().to_string()));
                }
                Ok(())
            }
            _ => Err(StoreError::NotArmed(scope.label().to_string())),
        }
    }

    /// Drop any armed state without executing.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Whether `scope` is currently armed and inside the window.
    pub fn is_armed(&self, scope: DeleteScope) -> bool {
        matches!(
            self.armed,
            Some((armed_scope, armed_at))
                if armed_scope == scope && armed_at.elapsed() <= self.window
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_then_commit() {
        let mut guard = WipeGuard::new();
        guard.arm(DeleteScope::Everything);
        assert!(guard.is_armed(DeleteScope::Everything));
        assert!(guard.commit(DeleteScope::Everything).is_ok());
        // Consumed: a second commit needs a fresh arm.
        assert!(matches!(
            guard.commit(DeleteScope::Everything),
            Err(StoreError::NotArmed(_))
        ));
    }

    #[test]
    fn test_commit_without_arm_fails() {
        let mut guard = WipeGuard::new();
        assert!(matches!(
            guard.commit(DeleteScope::Searches),
            Err(StoreError::NotArmed(_))
        ));
    }

    #[test]
    fn test_commit_wrong_scope_fails_and_disarms() {
        let mut guard = WipeGuard::new();
        guard.arm(DeleteScope::AnalysisCache);
        assert!(matches!(
            guard.commit(DeleteScope::Everything),
            Err(StoreError::NotArmed(_))
        ));
        // The mismatch consumed the armed state.
        assert!(!guard.is_armed(DeleteScope::AnalysisCache));
    }

    #[test]
    fn test_rearming_replaces_previous_scope() {
        let mut guard = WipeGuard::new();
        guard.arm(DeleteScope::Searches);
        guard.arm(DeleteScope::Telemetry);
        assert!(!guard.is_armed(DeleteScope::Searches));
        assert!(guard.commit(DeleteScope::Telemetry).is_ok());
    }

    #[test]
    fn test_commit_after_window_expires() {
        let mut guard = WipeGuard::with_window(Duration::from_millis(10));
        guard.arm(DeleteScope::Everything);
        std::thread::sleep(Duration::from_millis(25));
        assert!(!guard.is_armed(DeleteScope::Everything));
        assert!(matches!(
            guard.commit(DeleteScope::Everything),
            Err(StoreError::ConfirmExpired(_))
        ));
    }

    #[test]
    fn test_disarm_clears_state() {
        let mut guard = WipeGuard::new();
        guard.arm(DeleteScope::Documents);
        guard.disarm();
        assert!(matches!(
            guard.commit(DeleteScope::Documents),
            Err(StoreError::NotArmed(_))
        ));
    }
}
