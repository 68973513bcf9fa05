//! Two-hop command relay between the command source and the page world.
//!
//! Hop one carries a command from the privileged source into the relay
//! actor over an mpsc channel with oneshot responders. Hop two re-encodes
//! it as a [`PageMessage`] on the shared page transport, where the
//! installed [`PageController`] executes it against the host player.
//! Queries are request/reply with correlation ids and a bounded wait;
//! mutations are fire-and-forget followed by a best-effort confirmation
//! query so callers can show the new level immediately.

pub mod page;
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, trace, warn};
use uuid::Uuid;

pub use page::PageController;
pub use transport::{PageBody, PageMessage, PageTransport, SOURCE_TAG};

use crate::config::RelayConfig;
use crate::quality::{Command, QualityInfo, QualityLevel, QualityReport};
use crate::session::PageSession;

/// Errors that can occur while relaying commands into the page world.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay channel closed")]
    ChannelClosed,

    #[error("relay response dropped")]
    ResponseDropped,

    #[error("page controls installation failed: {reason}")]
    InstallFailed { reason: String },

    #[error("timed out waiting for quality info")]
    QueryTimeout,

    #[error("page transport unavailable")]
    TransportClosed,
}

/// Installs the page-side controller into the page world.
///
/// Runs at most once per page load; the relay consults the session flag
/// before calling it. Failure is reported to the command's caller as a
/// rejected operation.
#[async_trait::async_trait]
pub trait PageInstaller: Send + Sync {
    async fn install(&self) -> Result<(), RelayError>;
}

/// Commands accepted by the relay actor.
pub enum RelayCommand {
    Control {
        command: Command,
        responder: oneshot::Sender<Result<Option<QualityInfo>, RelayError>>,
    },
    QualityInfo {
        responder: oneshot::Sender<Result<QualityReport, RelayError>>,
    },
}

/// Public, cloneable handle to the relay actor.
#[derive(Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Steps playback toward a lower resolution.
    pub async fn decrease_quality(&self) -> Result<Option<QualityInfo>, RelayError> {
        self.send_command(Command::DecreaseQuality).await
    }

    /// Steps playback toward a higher resolution.
    pub async fn increase_quality(&self) -> Result<Option<QualityInfo>, RelayError> {
        self.send_command(Command::IncreaseQuality).await
    }

    /// Jumps to the lowest offered resolution.
    pub async fn lowest_quality(&self) -> Result<Option<QualityInfo>, RelayError> {
        self.send_command(Command::LowestQuality).await
    }

    /// Jumps to the highest offered resolution.
    pub async fn highest_quality(&self) -> Result<Option<QualityInfo>, RelayError> {
        self.send_command(Command::HighestQuality).await
    }

    /// Applies a specific level by identifier.
    pub async fn set_specific_quality(
        &self,
        level: QualityLevel,
    ) -> Result<Option<QualityInfo>, RelayError> {
        self.send_command(Command::SetSpecificQuality { quality: level })
            .await
    }

    /// Relays any mutation command, returning the confirmed new level when
    /// the page answered the follow-up query in time.
    pub async fn send_command(
        &self,
        command: Command,
    ) -> Result<Option<QualityInfo>, RelayError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RelayCommand::Control { command, responder };
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        rx.await.map_err(|_| RelayError::ResponseDropped)?
    }

    /// Queries the current and offered quality levels.
    pub async fn quality_info(&self) -> Result<QualityReport, RelayError> {
        let (responder, rx) = oneshot::channel();
        self.sender
            .send(RelayCommand::QualityInfo { responder })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        rx.await.map_err(|_| RelayError::ResponseDropped)?
    }
}

struct Relay {
    config: RelayConfig,
    transport: Arc<dyn PageTransport>,
    installer: Arc<dyn PageInstaller>,
    session: Arc<PageSession>,
    pending: Arc<Mutex<HashMap<Uuid, oneshot::Sender<QualityReport>>>>,
}

impl Relay {
    /// Installs the page-side controller if this page load hasn't yet.
    ///
    /// Installation completes before any command signal is published;
    /// sequencing, not locking, enforces the ordering.
    async fn ensure_page_controls(&self) -> Result<(), RelayError> {
        if self.session.controls_installed() {
            return Ok(());
        }
        self.installer.install().await?;
        self.session.mark_controls_installed();
        debug!("page controls installed");
        Ok(())
    }

    async fn handle_control(&self, command: Command) -> Result<Option<QualityInfo>, RelayError> {
        self.ensure_page_controls().await?;
        self.transport.publish(PageMessage::control(command))?;

        // Give the page side a moment to apply before confirming. The
        // confirmation is best-effort: a quiet page is not an error.
        tokio::time::sleep(self.config.confirm_delay).await;
        match self.query_quality_report().await {
            Ok(report) => Ok(report.current),
            Err(error) => {
                debug!(%error, "confirmation query failed after mutation");
                Ok(None)
            }
        }
    }

    async fn handle_query(&self) -> Result<QualityReport, RelayError> {
        self.ensure_page_controls().await?;
        self.query_quality_report().await
    }

    /// One request/reply exchange with the page world.
    ///
    /// The waiter is keyed by a fresh request id. Whatever the outcome,
    /// the pending entry is gone afterwards: resolved by the reply pump,
    /// or removed here on publish failure and timeout.
    async fn query_quality_report(&self) -> Result<QualityReport, RelayError> {
        let request_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id, tx);
        trace!(%request_id, "awaiting quality reply");

        if let Err(error) = self
            .transport
            .publish(PageMessage::quality_info_request(request_id))
        {
            self.pending.lock().remove(&request_id);
            return Err(error);
        }

        match tokio::time::timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(_)) => Err(RelayError::ResponseDropped),
            Err(_) => {
                self.pending.lock().remove(&request_id);
                debug!(%request_id, "quality reply timed out");
                Err(RelayError::QueryTimeout)
            }
        }
    }
}

/// Spawns the relay actor and its reply pump, returning the handle.
pub fn spawn_relay(
    config: RelayConfig,
    transport: Arc<dyn PageTransport>,
    installer: Arc<dyn PageInstaller>,
    session: Arc<PageSession>,
) -> RelayHandle {
    let (sender, mut receiver) = mpsc::channel(config.command_buffer);
    let pending: Arc<Mutex<HashMap<Uuid, oneshot::Sender<QualityReport>>>> =
        Arc::new(Mutex::new(HashMap::new()));

    // Reply pump: resolves waiting queries by correlation id. Subscribed
    // before any request can be published.
    let mut replies = transport.subscribe();
    let pump_pending = Arc::clone(&pending);
    tokio::spawn(async move {
        loop {
            match replies.recv().await {
                Ok(message) => {
                    if !message.is_ours() {
                        continue;
                    }
                    let PageBody::QualityInfoResponse { current, available } = message.body
                    else {
                        continue;
                    };
                    let Some(request_id) = message.request_id else {
                        continue;
                    };
                    let Some(waiter) = pump_pending.lock().remove(&request_id) else {
                        trace!(%request_id, "reply arrived after its waiter gave up");
                        continue;
                    };
                    let _ = waiter.send(QualityReport { current, available });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "reply pump lagged behind the page transport");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let relay = Relay {
        config,
        transport,
        installer,
        session,
        pending,
    };

    tokio::spawn(async move {
        while let Some(command) = receiver.recv().await {
            match command {
                RelayCommand::Control { command, responder } => {
                    let result = relay.handle_control(command).await;
                    let _ = responder.send(result);
                }
                RelayCommand::QualityInfo { responder } => {
                    let result = relay.handle_query().await;
                    let _ = responder.send(result);
                }
            }
        }
    });

    RelayHandle { sender }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct BusTransport {
        bus: broadcast::Sender<PageMessage>,
    }

    impl BusTransport {
        fn new() -> Arc<Self> {
            let (bus, _) = broadcast::channel(32);
            Arc::new(Self { bus })
        }
    }

    impl PageTransport for BusTransport {
        fn publish(&self, message: PageMessage) -> Result<(), RelayError> {
            self.bus
                .send(message)
                .map(|_| ())
                .map_err(|_| RelayError::TransportClosed)
        }

        fn subscribe(&self) -> broadcast::Receiver<PageMessage> {
            self.bus.subscribe()
        }
    }

    struct CountingInstaller {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingInstaller {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait::async_trait]
    impl PageInstaller for CountingInstaller {
        async fn install(&self) -> Result<(), RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RelayError::InstallFailed {
                    reason: "script rejected".to_string(),
                });
            }
            Ok(())
        }
    }

    fn relay_with(
        transport: Arc<BusTransport>,
        installer: Arc<CountingInstaller>,
    ) -> Relay {
        Relay {
            config: RelayConfig::default(),
            transport,
            installer,
            session: Arc::new(PageSession::new()),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout_removes_waiter() {
        let transport = BusTransport::new();
        // Keep one receiver alive so publishes succeed with no page side.
        let _idle = transport.subscribe();
        let relay = relay_with(Arc::clone(&transport), CountingInstaller::new(false));

        let result = relay.query_quality_report().await;
        assert!(matches!(result, Err(RelayError::QueryTimeout)));
        assert!(relay.pending.lock().is_empty());
    }

    #[tokio::test]
    async fn test_install_failure_rejects_command() {
        let transport = BusTransport::new();
        let _idle = transport.subscribe();
        let relay = relay_with(Arc::clone(&transport), CountingInstaller::new(true));

        let result = relay.handle_control(Command::IncreaseQuality).await;
        assert!(matches!(result, Err(RelayError::InstallFailed { .. })));
    }

    #[tokio::test]
    async fn test_install_runs_once() {
        let transport = BusTransport::new();
        let _idle = transport.subscribe();
        let installer = CountingInstaller::new(false);
        let relay = relay_with(Arc::clone(&transport), Arc::clone(&installer));

        for _ in 0..5 {
            relay.ensure_page_controls().await.unwrap();
        }
        assert_eq!(installer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_discarded() {
        let transport = BusTransport::new();
        let _idle = transport.subscribe();
        let relay = relay_with(Arc::clone(&transport), CountingInstaller::new(false));

        let result = relay.query_quality_report().await;
        assert!(matches!(result, Err(RelayError::QueryTimeout)));

        // A straggler reply for a request nobody waits on anymore must not
        // disturb a following exchange.
        let straggler = PageMessage::quality_info_response(Some(Uuid::new_v4()), QualityReport::default());
        transport.publish(straggler).unwrap();

        let result = relay.query_quality_report().await;
        assert!(matches!(result, Err(RelayError::QueryTimeout)));
        assert!(relay.pending.lock().is_empty());
    }
}
