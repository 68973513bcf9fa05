//! Quality level vocabulary, ordering, and display formatting.
//!
//! Levels are opaque string identifiers drawn from a host-defined
//! vocabulary. A fixed priority list defines their total order; the
//! `auto` sentinel means "host decides" and is excluded from every
//! ordered list before index arithmetic.

pub mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use resolver::{Command, resolve_target};

/// Pseudo-level meaning "let the host pick the resolution".
///
/// Never user-selectable and never part of an ordered list.
pub const AUTO_LEVEL: &str = "auto";

/// Fixed priority list over the known vocabulary, highest resolution first.
///
/// Raw player-reported sequences are normalized against this order before
/// any index arithmetic. Unknown identifiers sort before known ones.
pub const QUALITY_ORDER: [&str; 10] = [
    "highres", // 8K
    "hd2880",  // 5K
    "hd2160",  // 4K
    "hd1440",  // 1440p
    "hd1080",  // 1080p
    "hd720",   // 720p
    "large",   // 480p
    "medium",  // 360p
    "small",   // 240p
    "tiny",    // 144p
];

/// Static lookup from raw identifiers to display labels and badge tags.
const RESOLUTION_TABLE: [(&str, &str, Option<&str>); 10] = [
    ("tiny", "144p", None),
    ("small", "240p", None),
    ("medium", "360p", None),
    ("large", "480p", None),
    ("hd720", "720p", None),
    ("hd1080", "1080p", Some("HD")),
    ("hd1440", "1440p", Some("HD+")),
    ("hd2160", "2160p", Some("4K")),
    ("hd2880", "2880p", Some("5K")),
    ("highres", "4320p", Some("8K")),
];

/// Opaque identifier for a playback resolution tier.
///
/// Identifiers outside the known vocabulary are carried through unchanged
/// and display as their own label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityLevel(String);

impl QualityLevel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the auto sentinel.
    pub fn is_auto(&self) -> bool {
        self.0 == AUTO_LEVEL
    }

    /// Position in the fixed priority list, if the identifier is known.
    pub fn priority_rank(&self) -> Option<usize> {
        QUALITY_ORDER.iter().position(|id| *id == self.0)
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualityLevel {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Display triple for a quality level: identifier, label, optional badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityInfo {
    pub id: QualityLevel,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Formats a level for display using the static resolution table.
///
/// Unknown identifiers pass through as their own label with no tag.
pub fn display_info(level: &QualityLevel) -> QualityInfo {
    for (id, label, tag) in RESOLUTION_TABLE {
        if id == level.as_str() {
            return QualityInfo {
                id: level.clone(),
                label: label.to_string(),
                tag: tag.map(str::to_string),
            };
        }
    }
    QualityInfo {
        id: level.clone(),
        label: level.as_str().to_string(),
        tag: None,
    }
}

/// Snapshot of the player's quality state as reported by the page world.
///
/// `current` is `None` and `available` empty when no player is reachable;
/// callers treat that as a normal, recoverable condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub current: Option<QualityInfo>,
    pub available: Vec<QualityInfo>,
}

/// Ordered sequence of selectable levels, highest to lowest.
///
/// Built fresh from a raw player-reported sequence on every query, with
/// the auto sentinel filtered out. Never cached across commands: the host
/// may change its offered set at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityList(Vec<QualityLevel>);

impl QualityList {
    /// Builds an ordered list from the raw player-reported sequence.
    ///
    /// Filters the auto sentinel and sorts by the fixed priority list.
    /// Unknown identifiers sort before every known one.
    pub fn from_raw(raw: impl IntoIterator<Item = QualityLevel>) -> Self {
        let mut levels: Vec<QualityLevel> =
            raw.into_iter().filter(|level| !level.is_auto()).collect();
        levels.sort_by_key(|level| level.priority_rank().map_or(-1, |rank| rank as i64));
        Self(levels)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&QualityLevel> {
        self.0.get(index)
    }

    /// Index of a level within the ordered list, if currently offered.
    pub fn position(&self, level: &QualityLevel) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == level)
    }

    pub fn contains(&self, level: &QualityLevel) -> bool {
        self.position(level).is_some()
    }

    /// Highest offered level (index 0).
    pub fn highest(&self) -> Option<&QualityLevel> {
        self.0.first()
    }

    /// Lowest offered level (last index).
    pub fn lowest(&self) -> Option<&QualityLevel> {
        self.0.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualityLevel> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[QualityLevel] {
        &self.0
    }
}

impl FromIterator<QualityLevel> for QualityList {
    fn from_iter<I: IntoIterator<Item = QualityLevel>>(iter: I) -> Self {
        Self::from_raw(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(ids: &[&str]) -> Vec<QualityLevel> {
        ids.iter().map(|id| QualityLevel::from(*id)).collect()
    }

    #[test]
    fn test_known_level_display() {
        let info = display_info(&QualityLevel::from("hd1080"));
        assert_eq!(info.label, "1080p");
        assert_eq!(info.tag.as_deref(), Some("HD"));

        let info = display_info(&QualityLevel::from("medium"));
        assert_eq!(info.label, "360p");
        assert_eq!(info.tag, None);
    }

    #[test]
    fn test_unknown_level_passes_through() {
        let info = display_info(&QualityLevel::from("hd9000"));
        assert_eq!(info.label, "hd9000");
        assert_eq!(info.tag, None);
    }

    #[test]
    fn test_auto_filtered_from_list() {
        let list = QualityList::from_raw(levels(&["auto", "hd1080", "hd720", "medium"]));
        assert_eq!(list.len(), 3);
        assert!(!list.contains(&QualityLevel::from(AUTO_LEVEL)));
    }

    #[test]
    fn test_list_sorted_highest_first() {
        let list = QualityList::from_raw(levels(&["medium", "hd1080", "tiny", "hd2160"]));
        let ids: Vec<&str> = list.iter().map(QualityLevel::as_str).collect();
        assert_eq!(ids, ["hd2160", "hd1080", "medium", "tiny"]);
        assert_eq!(list.highest().unwrap().as_str(), "hd2160");
        assert_eq!(list.lowest().unwrap().as_str(), "tiny");
    }

    #[test]
    fn test_unknown_levels_sort_first() {
        let list = QualityList::from_raw(levels(&["hd720", "experimental", "hd1080"]));
        let ids: Vec<&str> = list.iter().map(QualityLevel::as_str).collect();
        assert_eq!(ids, ["experimental", "hd1080", "hd720"]);
    }

    #[test]
    fn test_position_lookup() {
        let list = QualityList::from_raw(levels(&["hd1080", "hd720", "medium"]));
        assert_eq!(list.position(&QualityLevel::from("hd720")), Some(1));
        assert_eq!(list.position(&QualityLevel::from("tiny")), None);
    }

    #[test]
    fn test_empty_raw_list() {
        let list = QualityList::from_raw(levels(&["auto"]));
        assert!(list.is_empty());
        assert_eq!(list.highest(), None);
        assert_eq!(list.lowest(), None);
    }
}
