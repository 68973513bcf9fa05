//! Shortcut-guide dialog augmentation.
//!
//! The host renders a keyboard-shortcut dialog inside a popup container.
//! This module waits for that dialog through a three-stage chain — the
//! container exists, the dialog node appears inside it, the dialog turns
//! visible — with exactly one observer active at a time, then splices
//! rows describing our commands into a recognized section. The host
//! markup is a black box whose shape may change without notice; any
//! structural surprise aborts silently.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::GuideConfig;
use crate::session::PageSession;

/// Opaque identifier of a node in the host-owned dialog markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Push notification about a change in the dialog markup.
#[derive(Debug, Clone)]
pub enum DialogMutation {
    ChildAdded { parent: NodeId, node: NodeId },
    AttributeChanged { node: NodeId, attribute: String },
}

/// One row spliced into the guide: a command label and its hotkey text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutRow {
    pub label: String,
    pub hotkey: String,
}

impl ShortcutRow {
    pub fn new(label: impl Into<String>, hotkey: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hotkey: hotkey.into(),
        }
    }
}

/// Handles into the recognized section of the dialog.
#[derive(Debug, Clone, Copy)]
pub struct GuideSection {
    pub section: NodeId,
    pub subtitle: NodeId,
    pub options: NodeId,
    /// Existing row cloned as the template for spliced rows.
    pub template_row: NodeId,
}

/// Errors raised while augmenting the dialog.
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("dialog structure missing: {part}")]
    StructureMissing { part: &'static str },

    #[error("shortcut rows could not be appended: {reason}")]
    AppendFailed { reason: String },
}

/// View onto the host-owned dialog markup.
///
/// Queries reflect the live structure at call time; `mutations` delivers
/// change notifications for the wait chain. The clone-and-substitute
/// mechanics of row insertion live behind `append_shortcut_rows` since
/// they manipulate host-side nodes.
pub trait DialogSurface: Send + Sync {
    fn mutations(&self) -> broadcast::Receiver<DialogMutation>;

    /// The popup container, if the host has created it yet.
    fn popup_container(&self) -> Option<NodeId>;

    /// Whether a node is the shortcut dialog element.
    fn is_shortcut_dialog(&self, node: NodeId) -> bool;

    /// Whether `node` sits inside `ancestor`'s subtree.
    fn is_within(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// An already-present shortcut dialog inside the container.
    fn dialog_in(&self, container: NodeId) -> Option<NodeId>;

    /// Whether the dialog is currently displayed.
    fn is_visible(&self, node: NodeId) -> bool;

    /// Locates the section whose subtitle matches `title`.
    fn section_titled(&self, title: &str) -> Option<GuideSection>;

    /// Whether a previous augmentation left its marker in the markup.
    fn is_marked_augmented(&self) -> bool;

    /// Clones the section's row template and appends one row per entry,
    /// under a subtitle carrying `title`, marking the inserted subtree.
    fn append_shortcut_rows(
        &self,
        section: &GuideSection,
        title: &str,
        rows: &[ShortcutRow],
    ) -> Result<(), GuideError>;
}

/// Drives the wait chain and performs the one-shot augmentation.
pub struct GuideAugmenter {
    surface: Arc<dyn DialogSurface>,
    session: Arc<PageSession>,
    config: GuideConfig,
}

impl GuideAugmenter {
    pub fn new(
        surface: Arc<dyn DialogSurface>,
        session: Arc<PageSession>,
        config: GuideConfig,
    ) -> Self {
        Self {
            surface,
            session,
            config,
        }
    }

    /// Runs the augmenter on a spawned task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Waits through the three stages, then augments once.
    ///
    /// Each stage checks current state before listening, so a condition
    /// that was satisfied before the watch began is not missed. Only one
    /// wait chain runs per page session.
    pub async fn run(self) {
        if !self.session.try_begin_dialog_watch() {
            debug!("dialog watch already running");
            return;
        }

        let container = self.await_container().await;
        let dialog = self.await_dialog(container).await;
        self.session.end_dialog_watch();

        let Some(dialog) = dialog else {
            debug!("dialog mutation stream closed before the dialog appeared");
            return;
        };

        if !self.await_visibility(dialog).await {
            debug!("dialog mutation stream closed before the dialog was shown");
            return;
        }

        self.augment();
    }

    /// Stage one: poll until the popup container exists.
    ///
    /// A fixed-delay, indefinite retry; the container appears as part of
    /// normal page construction, so waiting is not a leak.
    async fn await_container(&self) -> NodeId {
        loop {
            if let Some(container) = self.surface.popup_container() {
                return container;
            }
            tokio::time::sleep(self.config.container_retry_delay).await;
        }
    }

    /// Stage two: watch for the dialog node inside the container.
    ///
    /// Returns `None` when the mutation stream closes first. The receiver
    /// is dropped on return, disconnecting this stage's observer.
    async fn await_dialog(&self, container: NodeId) -> Option<NodeId> {
        let mut mutations = self.surface.mutations();

        if let Some(existing) = self.surface.dialog_in(container) {
            return Some(existing);
        }

        loop {
            match mutations.recv().await {
                Ok(DialogMutation::ChildAdded { node, .. }) => {
                    if self.surface.is_shortcut_dialog(node)
                        && self.surface.is_within(container, node)
                    {
                        return Some(node);
                    }
                }
                Ok(DialogMutation::AttributeChanged { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed notifications; fall back to a direct look.
                    if let Some(existing) = self.surface.dialog_in(container) {
                        return Some(existing);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stage three: watch the dialog's style until it reports visible.
    async fn await_visibility(&self, dialog: NodeId) -> bool {
        let mut mutations = self.surface.mutations();

        if self.surface.is_visible(dialog) {
            return true;
        }

        loop {
            match mutations.recv().await {
                Ok(DialogMutation::AttributeChanged { node, attribute }) => {
                    if node == dialog && attribute == "style" && self.surface.is_visible(dialog) {
                        return true;
                    }
                }
                Ok(DialogMutation::ChildAdded { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if self.surface.is_visible(dialog) {
                        return true;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }

    /// Splices the rows, guarded against duplicate insertion.
    ///
    /// The session flag is claimed first; on structural failure it is
    /// released again so a reopened dialog can retry.
    fn augment(&self) {
        if !self.session.try_mark_guide_augmented() {
            debug!("guide already augmented this session");
            return;
        }

        if self.surface.is_marked_augmented() {
            debug!("augmentation marker already present in the markup");
            return;
        }

        let result = self
            .surface
            .section_titled(&self.config.section_title)
            .ok_or(GuideError::StructureMissing { part: "section" })
            .and_then(|section| {
                self.surface
                    .append_shortcut_rows(&section, &self.config.guide_title, &self.config.rows)
            });

        match result {
            Ok(()) => info!(rows = self.config.rows.len(), "shortcut guide augmented"),
            Err(error) => {
                warn!(%error, "could not augment shortcut guide");
                self.session.clear_guide_augmented();
            }
        }
    }
}
