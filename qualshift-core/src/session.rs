//! Page-lifetime session state.
//!
//! One `PageSession` exists per page load and owns the flags that used to
//! be free-floating globals: whether the page-side controls are installed,
//! whether the shortcut guide was augmented, and whether a dialog watch is
//! running. Execution is event-driven and serialized, so a flag has one
//! writer at a time; the lock only guards the test-and-set pairs.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct SessionFlags {
    controls_installed: bool,
    guide_augmented: bool,
    dialog_watch_active: bool,
}

/// Shared per-page-load state for relay installation and guide watching.
#[derive(Debug, Default)]
pub struct PageSession {
    flags: Mutex<SessionFlags>,
}

impl PageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the page-side controls have been installed this page load.
    pub fn controls_installed(&self) -> bool {
        self.flags.lock().controls_installed
    }

    /// Marks installation complete. Called only after a successful install.
    pub fn mark_controls_installed(&self) {
        self.flags.lock().controls_installed = true;
    }

    pub fn guide_augmented(&self) -> bool {
        self.flags.lock().guide_augmented
    }

    /// Claims the one-shot augmentation slot; `false` if already claimed.
    pub fn try_mark_guide_augmented(&self) -> bool {
        let mut flags = self.flags.lock();
        if flags.guide_augmented {
            return false;
        }
        flags.guide_augmented = true;
        true
    }

    /// Releases the augmentation slot so a reopened dialog can retry after
    /// a structural failure.
    pub fn clear_guide_augmented(&self) {
        self.flags.lock().guide_augmented = false;
    }

    /// Claims the dialog-watch slot; `false` if a watch is already running.
    pub fn try_begin_dialog_watch(&self) -> bool {
        let mut flags = self.flags.lock();
        if flags.dialog_watch_active {
            return false;
        }
        flags.dialog_watch_active = true;
        true
    }

    pub fn end_dialog_watch(&self) {
        self.flags.lock().dialog_watch_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_flag_starts_clear() {
        let session = PageSession::new();
        assert!(!session.controls_installed());

        session.mark_controls_installed();
        assert!(session.controls_installed());
    }

    #[test]
    fn test_guide_slot_is_one_shot() {
        let session = PageSession::new();

        assert!(session.try_mark_guide_augmented());
        assert!(!session.try_mark_guide_augmented());

        session.clear_guide_augmented();
        assert!(session.try_mark_guide_augmented());
    }

    #[test]
    fn test_dialog_watch_slot() {
        let session = PageSession::new();

        assert!(session.try_begin_dialog_watch());
        assert!(!session.try_begin_dialog_watch());

        session.end_dialog_watch();
        assert!(session.try_begin_dialog_watch());
    }
}
