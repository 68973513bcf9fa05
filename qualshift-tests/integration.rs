//! Integration tests for Qualshift
//!
//! These tests drive the full command path through the public handles:
//! relay actor, page transport, page controller, simulated player and
//! dialog, and the control panel poller.

#[path = "integration/relay_roundtrip.rs"]
mod relay_roundtrip;

#[path = "integration/guide_augmentation.rs"]
mod guide_augmentation;

#[path = "integration/panel_sync.rs"]
mod panel_sync;
