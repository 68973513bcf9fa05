//! Simulated host dialog markup.
//!
//! A small mutable node tree with change notifications, shaped like the
//! host's popup container / shortcut dialog / section / row structure.
//! Tests drive it the way a host page would: open the container, insert
//! the dialog hidden, flip it visible.

use std::collections::HashMap;

use parking_lot::Mutex;
use qualshift_core::guide::{
    DialogMutation, DialogSurface, GuideError, GuideSection, NodeId, ShortcutRow,
};
use tokio::sync::broadcast;

const AUGMENT_MARKER: &str = "data-augmented";

#[derive(Debug, Clone, Default)]
struct SimNode {
    name: String,
    attrs: HashMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<NodeId, SimNode>,
    next_id: u64,
    root: NodeId,
}

impl Tree {
    fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SimNode {
                name: "document".to_string(),
                ..SimNode::default()
            },
        );
        Self {
            nodes,
            next_id: 1,
            root,
        }
    }

    fn create(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SimNode {
                name: name.to_string(),
                parent: Some(parent),
                ..SimNode::default()
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        id
    }

    fn find_named(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    fn find_named_within(&self, ancestor: NodeId, name: &str) -> Option<NodeId> {
        let node = self.nodes.get(&ancestor)?;
        for child in &node.children {
            if self.nodes.get(child).is_some_and(|n| n.name == name) {
                return Some(*child);
            }
            if let Some(found) = self.find_named_within(*child, name) {
                return Some(found);
            }
        }
        None
    }

    fn is_within(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.nodes.get(&parent)?;
        node.children
            .iter()
            .find(|child| self.nodes.get(child).is_some_and(|n| n.name == name))
            .copied()
    }

    fn deep_clone(&mut self, node: NodeId, parent: NodeId) -> Option<NodeId> {
        let template = self.nodes.get(&node)?.clone();
        let clone = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            clone,
            SimNode {
                name: template.name,
                attrs: template.attrs,
                text: template.text,
                children: Vec::new(),
                parent: Some(parent),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(clone);
        }
        for child in template.children {
            self.deep_clone(child, clone)?;
        }
        Some(clone)
    }
}

/// In-memory dialog markup implementing [`DialogSurface`].
pub struct SimDialog {
    tree: Mutex<Tree>,
    events: broadcast::Sender<DialogMutation>,
}

impl SimDialog {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            tree: Mutex::new(Tree::new()),
            events,
        }
    }

    fn emit(&self, mutation: DialogMutation) {
        // Nobody listening is fine; the augmenter may not be at this stage.
        let _ = self.events.send(mutation);
    }

    /// Creates the popup container, as the host does during page build.
    pub fn open_popup_container(&self) -> NodeId {
        let (container, root) = {
            let mut tree = self.tree.lock();
            let root = tree.root;
            (tree.create(root, "popup-container"), root)
        };
        self.emit(DialogMutation::ChildAdded {
            parent: root,
            node: container,
        });
        container
    }

    /// Inserts the shortcut dialog, hidden, inside the container.
    pub fn insert_shortcut_dialog(&self, container: NodeId) -> NodeId {
        let dialog = {
            let mut tree = self.tree.lock();
            let dialog = tree.create(container, "shortcut-dialog");
            if let Some(node) = tree.nodes.get_mut(&dialog) {
                node.attrs
                    .insert("style".to_string(), "display: none".to_string());
            }
            dialog
        };
        self.emit(DialogMutation::ChildAdded {
            parent: container,
            node: dialog,
        });
        dialog
    }

    /// Adds a titled section with one template row to the dialog.
    pub fn add_section(
        &self,
        dialog: NodeId,
        title: &str,
        template_label: &str,
        template_hotkey: &str,
    ) -> NodeId {
        let mut tree = self.tree.lock();
        let section = tree.create(dialog, "section");

        let subtitle = tree.create(section, "subtitle");
        if let Some(node) = tree.nodes.get_mut(&subtitle) {
            node.text = title.to_string();
        }

        let options = tree.create(section, "options");
        let row = tree.create(options, "row");
        let label = tree.create(row, "label");
        if let Some(node) = tree.nodes.get_mut(&label) {
            node.text = template_label.to_string();
        }
        let hotkey = tree.create(row, "hotkey");
        if let Some(node) = tree.nodes.get_mut(&hotkey) {
            node.text = template_hotkey.to_string();
        }

        section
    }

    /// Flips the dialog's display style and notifies observers.
    pub fn set_dialog_visible(&self, dialog: NodeId, visible: bool) {
        {
            let mut tree = self.tree.lock();
            if let Some(node) = tree.nodes.get_mut(&dialog) {
                let style = if visible { "display: block" } else { "display: none" };
                node.attrs.insert("style".to_string(), style.to_string());
            }
        }
        self.emit(DialogMutation::AttributeChanged {
            node: dialog,
            attribute: "style".to_string(),
        });
    }

    /// Label/hotkey pairs of the rows under the subtitle titled `title`.
    pub fn rows_titled(&self, title: &str) -> Vec<(String, String)> {
        let tree = self.tree.lock();
        let Some((subtitle, parent)) = tree
            .nodes
            .iter()
            .find(|(_, node)| node.name == "subtitle" && node.text == title)
            .map(|(id, node)| (*id, node.parent))
        else {
            return Vec::new();
        };
        let Some(parent) = parent else {
            return Vec::new();
        };

        // The options block is the sibling inserted right after the subtitle.
        let Some(parent_node) = tree.nodes.get(&parent) else {
            return Vec::new();
        };
        let Some(position) = parent_node.children.iter().position(|id| *id == subtitle) else {
            return Vec::new();
        };
        let Some(options) = parent_node.children.get(position + 1) else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        let Some(options_node) = tree.nodes.get(options) else {
            return Vec::new();
        };
        for row in &options_node.children {
            let label = tree
                .child_named(*row, "label")
                .and_then(|id| tree.nodes.get(&id))
                .map(|n| n.text.clone())
                .unwrap_or_default();
            let hotkey = tree
                .child_named(*row, "hotkey")
                .and_then(|id| tree.nodes.get(&id))
                .map(|n| n.text.clone())
                .unwrap_or_default();
            rows.push((label, hotkey));
        }
        rows
    }
}

impl Default for SimDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogSurface for SimDialog {
    fn mutations(&self) -> broadcast::Receiver<DialogMutation> {
        self.events.subscribe()
    }

    fn popup_container(&self) -> Option<NodeId> {
        self.tree.lock().find_named("popup-container")
    }

    fn is_shortcut_dialog(&self, node: NodeId) -> bool {
        self.tree
            .lock()
            .nodes
            .get(&node)
            .is_some_and(|n| n.name == "shortcut-dialog")
    }

    fn is_within(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.lock().is_within(ancestor, node)
    }

    fn dialog_in(&self, container: NodeId) -> Option<NodeId> {
        self.tree
            .lock()
            .find_named_within(container, "shortcut-dialog")
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.tree
            .lock()
            .nodes
            .get(&node)
            .is_some_and(|n| match n.attrs.get("style") {
                Some(style) => !style.contains("display: none"),
                None => true,
            })
    }

    fn section_titled(&self, title: &str) -> Option<GuideSection> {
        let tree = self.tree.lock();
        let dialog = tree.find_named("shortcut-dialog")?;
        let dialog_node = tree.nodes.get(&dialog)?;

        for section in &dialog_node.children {
            let Some(subtitle) = tree.child_named(*section, "subtitle") else {
                continue;
            };
            let matches = tree
                .nodes
                .get(&subtitle)
                .is_some_and(|n| n.text.eq_ignore_ascii_case(title));
            if !matches {
                continue;
            }

            let options = tree.child_named(*section, "options")?;
            let template_row = tree.child_named(options, "row")?;
            return Some(GuideSection {
                section: *section,
                subtitle,
                options,
                template_row,
            });
        }
        None
    }

    fn is_marked_augmented(&self) -> bool {
        self.tree
            .lock()
            .nodes
            .values()
            .any(|node| node.attrs.contains_key(AUGMENT_MARKER))
    }

    fn append_shortcut_rows(
        &self,
        section: &GuideSection,
        title: &str,
        rows: &[ShortcutRow],
    ) -> Result<(), GuideError> {
        let (added_subtitle, added_options) = {
            let mut tree = self.tree.lock();
            if !tree.nodes.contains_key(&section.section) {
                return Err(GuideError::StructureMissing { part: "section" });
            }

            let subtitle_clone = tree
                .deep_clone(section.subtitle, section.section)
                .ok_or(GuideError::StructureMissing { part: "subtitle" })?;
            if let Some(node) = tree.nodes.get_mut(&subtitle_clone) {
                node.text = title.to_string();
                node.attrs
                    .insert(AUGMENT_MARKER.to_string(), "true".to_string());
            }

            let options_clone = tree.create(section.section, "options");
            for row in rows {
                let row_clone = tree
                    .deep_clone(section.template_row, options_clone)
                    .ok_or(GuideError::StructureMissing { part: "row template" })?;
                let label = tree.child_named(row_clone, "label").ok_or(
                    GuideError::AppendFailed {
                        reason: "row template has no label".to_string(),
                    },
                )?;
                if let Some(node) = tree.nodes.get_mut(&label) {
                    node.text = row.label.clone();
                }
                let hotkey = tree.child_named(row_clone, "hotkey").ok_or(
                    GuideError::AppendFailed {
                        reason: "row template has no hotkey".to_string(),
                    },
                )?;
                if let Some(node) = tree.nodes.get_mut(&hotkey) {
                    node.text = row.hotkey.clone();
                }
            }

            (subtitle_clone, options_clone)
        };

        self.emit(DialogMutation::ChildAdded {
            parent: section.section,
            node: added_subtitle,
        });
        self.emit(DialogMutation::ChildAdded {
            parent: section.section,
            node: added_options,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_discovery_and_visibility() {
        let dialog = SimDialog::new();
        assert!(dialog.popup_container().is_none());

        let container = dialog.open_popup_container();
        assert_eq!(dialog.popup_container(), Some(container));

        let node = dialog.insert_shortcut_dialog(container);
        assert!(dialog.is_shortcut_dialog(node));
        assert!(dialog.is_within(container, node));
        assert!(!dialog.is_visible(node));

        dialog.set_dialog_visible(node, true);
        assert!(dialog.is_visible(node));
    }

    #[test]
    fn test_section_lookup_and_append() {
        let dialog = SimDialog::new();
        let container = dialog.open_popup_container();
        let node = dialog.insert_shortcut_dialog(container);
        dialog.add_section(node, "General", "Toggle play", "k");

        let section = dialog.section_titled("general").expect("section found");
        let rows = vec![
            ShortcutRow::new("Quality down", "Ctrl + Shift + 1"),
            ShortcutRow::new("Quality up", "Ctrl + Shift + 2"),
        ];
        dialog
            .append_shortcut_rows(&section, "Playback quality", &rows)
            .unwrap();

        assert!(dialog.is_marked_augmented());
        assert_eq!(
            dialog.rows_titled("Playback quality"),
            vec![
                ("Quality down".to_string(), "Ctrl + Shift + 1".to_string()),
                ("Quality up".to_string(), "Ctrl + Shift + 2".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_section_title() {
        let dialog = SimDialog::new();
        let container = dialog.open_popup_container();
        let node = dialog.insert_shortcut_dialog(container);
        dialog.add_section(node, "Playback", "Toggle play", "k");

        assert!(dialog.section_titled("General").is_none());
    }
}
