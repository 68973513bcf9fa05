//! Pure resolution of quality commands against a freshly fetched list.
//!
//! Stepping is a saturating walk over the ordered list, never a wrapping
//! one: stepping up at the top or down at the bottom resolves to the
//! unchanged level so callers can still show feedback.

use serde::{Deserialize, Serialize};

use super::{QualityLevel, QualityList};

/// A quality mutation requested by the user.
///
/// Carries no state; always resolved against the current offered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Step toward a lower resolution
    DecreaseQuality,
    /// Step toward a higher resolution
    IncreaseQuality,
    /// Jump to the lowest offered resolution
    LowestQuality,
    /// Jump to the highest offered resolution
    HighestQuality,
    /// Apply a specific level by identifier
    SetSpecificQuality { quality: QualityLevel },
}

/// Resolves a command to a target level, or `None` for a silent no-op.
///
/// A current level missing from the list is treated as index 0 (assume
/// highest). `SetSpecificQuality` resolves only when the requested level
/// is currently offered. An empty list makes every command a no-op.
pub fn resolve_target(
    command: &Command,
    current: Option<&QualityLevel>,
    levels: &QualityList,
) -> Option<QualityLevel> {
    if levels.is_empty() {
        return None;
    }

    let current_index = current.and_then(|level| levels.position(level)).unwrap_or(0);
    let last_index = levels.len() - 1;

    let target_index = match command {
        Command::IncreaseQuality => current_index.saturating_sub(1),
        Command::DecreaseQuality => (current_index + 1).min(last_index),
        Command::HighestQuality => 0,
        Command::LowestQuality => last_index,
        Command::SetSpecificQuality { quality } => {
            return levels.contains(quality).then(|| quality.clone());
        }
    };

    levels.get(target_index).cloned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn list(ids: &[&str]) -> QualityList {
        QualityList::from_raw(ids.iter().map(|id| QualityLevel::from(*id)))
    }

    fn level(id: &str) -> QualityLevel {
        QualityLevel::from(id)
    }

    #[test]
    fn test_step_walk_saturates_at_boundaries() {
        let levels = list(&["hd1080", "hd720", "medium"]);

        // Top of the list: stepping up stays put.
        let target = resolve_target(
            &Command::IncreaseQuality,
            Some(&level("hd1080")),
            &levels,
        );
        assert_eq!(target, Some(level("hd1080")));

        // Bottom of the list: stepping down stays put.
        let target = resolve_target(
            &Command::DecreaseQuality,
            Some(&level("medium")),
            &levels,
        );
        assert_eq!(target, Some(level("medium")));
    }

    #[test]
    fn test_step_moves_one_position() {
        let levels = list(&["hd1080", "hd720", "medium"]);

        let up = resolve_target(&Command::IncreaseQuality, Some(&level("hd720")), &levels);
        assert_eq!(up, Some(level("hd1080")));

        let down = resolve_target(&Command::DecreaseQuality, Some(&level("hd720")), &levels);
        assert_eq!(down, Some(level("medium")));
    }

    #[test]
    fn test_auto_excluded_before_stepping() {
        // Raw list with the sentinel present and current at the top of the
        // filtered set.
        let levels = list(&["auto", "hd1080", "hd720", "medium"]);

        let up = resolve_target(&Command::IncreaseQuality, Some(&level("hd1080")), &levels);
        assert_eq!(up, Some(level("hd1080")));

        let down = resolve_target(&Command::DecreaseQuality, Some(&level("hd1080")), &levels);
        assert_eq!(down, Some(level("hd720")));
    }

    #[test]
    fn test_unknown_current_treated_as_highest() {
        let levels = list(&["hd1080", "hd720", "medium"]);

        let down = resolve_target(&Command::DecreaseQuality, Some(&level("auto")), &levels);
        assert_eq!(down, Some(level("hd720")));

        let down = resolve_target(&Command::DecreaseQuality, None, &levels);
        assert_eq!(down, Some(level("hd720")));
    }

    #[test]
    fn test_jumps_hit_list_ends() {
        let levels = list(&["hd2160", "hd1080", "hd720", "tiny"]);

        let highest = resolve_target(&Command::HighestQuality, Some(&level("hd720")), &levels);
        assert_eq!(highest, Some(level("hd2160")));

        let lowest = resolve_target(&Command::LowestQuality, Some(&level("hd720")), &levels);
        assert_eq!(lowest, Some(level("tiny")));
    }

    #[test]
    fn test_set_specific_requires_membership() {
        let levels = list(&["hd1080", "hd720"]);

        let offered = resolve_target(
            &Command::SetSpecificQuality {
                quality: level("hd720"),
            },
            Some(&level("hd1080")),
            &levels,
        );
        assert_eq!(offered, Some(level("hd720")));

        let missing = resolve_target(
            &Command::SetSpecificQuality {
                quality: level("hd2160"),
            },
            Some(&level("hd1080")),
            &levels,
        );
        assert_eq!(missing, None);

        // The sentinel is never a valid target even though hosts report it.
        let auto = resolve_target(
            &Command::SetSpecificQuality {
                quality: level("auto"),
            },
            Some(&level("hd1080")),
            &levels,
        );
        assert_eq!(auto, None);
    }

    #[test]
    fn test_empty_list_resolves_nothing() {
        let levels = list(&[]);
        let commands = [
            Command::DecreaseQuality,
            Command::IncreaseQuality,
            Command::LowestQuality,
            Command::HighestQuality,
            Command::SetSpecificQuality {
                quality: level("hd1080"),
            },
        ];

        for command in &commands {
            assert_eq!(resolve_target(command, Some(&level("hd1080")), &levels), None);
        }
    }

    #[test]
    fn test_command_wire_vocabulary() {
        let json = serde_json::to_string(&Command::DecreaseQuality).unwrap();
        assert_eq!(json, r#"{"command":"decrease_quality"}"#);

        let json = serde_json::to_string(&Command::SetSpecificQuality {
            quality: level("hd720"),
        })
        .unwrap();
        assert_eq!(json, r#"{"command":"set_specific_quality","quality":"hd720"}"#);

        let parsed: Command = serde_json::from_str(r#"{"command":"highest_quality"}"#).unwrap();
        assert_eq!(parsed, Command::HighestQuality);
    }

    proptest! {
        // Step-up resolves to max(i-1, 0) and step-down to min(i+1, N-1)
        // for any list and any current index.
        #[test]
        fn prop_step_indices_saturate(len in 1usize..10, index in 0usize..10) {
            let index = index.min(len - 1);
            let ids: Vec<QualityLevel> = QUALITY_IDS[..len]
                .iter()
                .map(|id| QualityLevel::from(*id))
                .collect();
            let levels = QualityList::from_raw(ids);
            let current = levels.get(index).cloned().unwrap();

            let up = resolve_target(&Command::IncreaseQuality, Some(&current), &levels).unwrap();
            prop_assert_eq!(levels.position(&up), Some(index.saturating_sub(1)));

            let down = resolve_target(&Command::DecreaseQuality, Some(&current), &levels).unwrap();
            prop_assert_eq!(levels.position(&down), Some((index + 1).min(len - 1)));
        }

        #[test]
        fn prop_jumps_are_extremes(len in 1usize..10, index in 0usize..10) {
            let index = index.min(len - 1);
            let ids: Vec<QualityLevel> = QUALITY_IDS[..len]
                .iter()
                .map(|id| QualityLevel::from(*id))
                .collect();
            let levels = QualityList::from_raw(ids);
            let current = levels.get(index).cloned().unwrap();

            let highest = resolve_target(&Command::HighestQuality, Some(&current), &levels).unwrap();
            prop_assert_eq!(levels.position(&highest), Some(0));

            let lowest = resolve_target(&Command::LowestQuality, Some(&current), &levels).unwrap();
            prop_assert_eq!(levels.position(&lowest), Some(levels.len() - 1));
        }
    }

    const QUALITY_IDS: [&str; 10] = [
        "highres", "hd2880", "hd2160", "hd1440", "hd1080", "hd720", "large", "medium", "small",
        "tiny",
    ];
}
