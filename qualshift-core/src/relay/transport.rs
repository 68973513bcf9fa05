//! Page-visible message channel and envelope.
//!
//! The second relay hop crosses into the page's own world over a channel
//! that other page traffic shares. Every envelope carries a private
//! source tag so each side can discard messages that are not ours, and
//! queries carry a generated request id for reply correlation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::RelayError;
use crate::quality::{Command, QualityInfo, QualityReport};

/// Private marker distinguishing our traffic on the shared channel.
pub const SOURCE_TAG: &str = "qualshift-internal";

/// Envelope for every message crossing the page boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMessage {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(flatten)]
    pub body: PageBody,
}

/// Message kinds carried across the page boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBody {
    /// A quality mutation, fire-and-forget.
    Control { command: Command },
    /// Request for the current quality state; expects a correlated reply.
    QualityInfoRequest,
    /// Reply to a `QualityInfoRequest`, echoing its request id.
    QualityInfoResponse {
        current: Option<QualityInfo>,
        available: Vec<QualityInfo>,
    },
}

impl PageMessage {
    pub fn control(command: Command) -> Self {
        Self {
            source: SOURCE_TAG.to_string(),
            request_id: None,
            body: PageBody::Control { command },
        }
    }

    pub fn quality_info_request(request_id: Uuid) -> Self {
        Self {
            source: SOURCE_TAG.to_string(),
            request_id: Some(request_id),
            body: PageBody::QualityInfoRequest,
        }
    }

    pub fn quality_info_response(request_id: Option<Uuid>, report: QualityReport) -> Self {
        Self {
            source: SOURCE_TAG.to_string(),
            request_id,
            body: PageBody::QualityInfoResponse {
                current: report.current,
                available: report.available,
            },
        }
    }

    /// Whether the envelope carries our source tag.
    pub fn is_ours(&self) -> bool {
        self.source == SOURCE_TAG
    }
}

/// Broadcast-style channel into the page world.
///
/// Both relay and page controller publish to and subscribe on the same
/// bus, mirroring a shared messaging channel where unrelated traffic may
/// also appear.
pub trait PageTransport: Send + Sync {
    /// Publishes an envelope to every current subscriber.
    fn publish(&self, message: PageMessage) -> Result<(), RelayError>;

    /// Opens a fresh subscription to the bus.
    fn subscribe(&self) -> broadcast::Receiver<PageMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityLevel;

    #[test]
    fn test_control_envelope_wire_shape() {
        let message = PageMessage::control(Command::IncreaseQuality);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["source"], "qualshift-internal");
        assert_eq!(json["kind"], "control");
        assert_eq!(json["command"]["command"], "increase_quality");
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn test_query_envelope_round_trip() {
        let request_id = Uuid::new_v4();
        let message = PageMessage::quality_info_request(request_id);

        let json = serde_json::to_string(&message).unwrap();
        let parsed: PageMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, Some(request_id));
        assert_eq!(parsed.body, PageBody::QualityInfoRequest);
        assert!(parsed.is_ours());
    }

    #[test]
    fn test_foreign_source_detected() {
        let mut message = PageMessage::control(Command::LowestQuality);
        message.source = "somebody-else".to_string();
        assert!(!message.is_ours());
    }

    #[test]
    fn test_response_echoes_request_id() {
        let request_id = Uuid::new_v4();
        let report = QualityReport {
            current: Some(crate::quality::display_info(&QualityLevel::from("hd720"))),
            available: vec![],
        };

        let message = PageMessage::quality_info_response(Some(request_id), report);
        assert_eq!(message.request_id, Some(request_id));
    }
}
