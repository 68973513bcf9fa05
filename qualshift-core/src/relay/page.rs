//! Page-side half of the relay.
//!
//! The controller lives in the page world next to the host player. It
//! consumes our envelopes from the shared transport, executes mutations
//! through the resolver against a freshly built level list, answers
//! quality queries with a correlated reply, and flashes the indicator on
//! every applied command, including boundary no-ops.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::transport::{PageBody, PageMessage, PageTransport};
use crate::indicator::IndicatorController;
use crate::player::PlayerAdapter;
use crate::quality::{self, Command, QualityList, QualityReport, resolve_target};

/// Executes relayed commands against the host player.
pub struct PageController {
    adapter: PlayerAdapter,
    indicator: IndicatorController,
    transport: Arc<dyn PageTransport>,
}

impl PageController {
    pub fn new(
        adapter: PlayerAdapter,
        indicator: IndicatorController,
        transport: Arc<dyn PageTransport>,
    ) -> Self {
        Self {
            adapter,
            indicator,
            transport,
        }
    }

    /// Runs the controller on a spawned task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Consumes envelopes until the transport closes.
    pub async fn run(self) {
        let mut messages = self.transport.subscribe();
        loop {
            match messages.recv().await {
                Ok(message) => {
                    if !message.is_ours() {
                        continue;
                    }
                    match message.body {
                        PageBody::Control { command } => self.apply_command(command).await,
                        PageBody::QualityInfoRequest => {
                            self.answer_query(message.request_id).await;
                        }
                        // Replies are for the other side of the bridge.
                        PageBody::QualityInfoResponse { .. } => {}
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "page controller lagged behind the transport");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Resolves and applies one mutation command.
    ///
    /// The level list is rebuilt from the player here, never reused from
    /// an earlier command. Missing player or an empty filtered list are
    /// silent no-ops; a resolvable command always flashes the indicator,
    /// even when the level did not change.
    async fn apply_command(&self, command: Command) {
        let raw = self.adapter.list_levels().await;
        if raw.is_empty() {
            debug!("player missing or reporting no levels");
            return;
        }

        let levels = QualityList::from_raw(raw);
        if levels.is_empty() {
            debug!("no selectable levels offered");
            return;
        }

        let current = self.adapter.current_level().await;
        let Some(target) = resolve_target(&command, current.as_ref(), &levels) else {
            debug!(?command, "command did not resolve to an offered level");
            return;
        };

        if current.as_ref() != Some(&target) {
            self.adapter.apply_level(&target).await;
        }

        self.indicator.flash(&quality::display_info(&target));
    }

    /// Answers a quality query, echoing the request id.
    async fn answer_query(&self, request_id: Option<Uuid>) {
        let report = self.build_report().await;
        let reply = PageMessage::quality_info_response(request_id, report);
        if let Err(error) = self.transport.publish(reply) {
            debug!(%error, "could not publish quality reply");
        }
    }

    /// Snapshot of the player's state, formatted for display.
    ///
    /// The raw offered sequence is reported as-is, sentinel included;
    /// consumers decide what is selectable. No player means an empty
    /// report, not an error.
    async fn build_report(&self) -> QualityReport {
        let current = self
            .adapter
            .current_level()
            .await
            .map(|level| quality::display_info(&level));
        let available = self
            .adapter
            .list_levels()
            .await
            .iter()
            .map(quality::display_info)
            .collect();

        QualityReport { current, available }
    }
}
