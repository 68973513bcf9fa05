//! Wired-up simulated page session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use qualshift_core::config::QualshiftConfig;
use qualshift_core::indicator::{IndicatorController, IndicatorSurface};
use qualshift_core::player::{PLAYER_ELEMENT_ID, PlayerAdapter, PlayerLocator};
use qualshift_core::quality::QualityLevel;
use qualshift_core::relay::{
    PageController, PageInstaller, PageTransport, RelayError, RelayHandle, spawn_relay,
};
use qualshift_core::session::PageSession;
use tokio::task::JoinHandle;

use crate::indicator::RecordingIndicator;
use crate::player::{SimElements, SimPlayer};
use crate::transport::SimTransport;

/// What a simulated installation attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallBehavior {
    /// Spawn the page controller, like a successful script load.
    Spawn,
    /// Succeed without installing anything; the page stays silent.
    Noop,
    /// Fail, like a rejected script injection.
    Fail,
}

/// Counting installer that spawns (or withholds) the page controller.
pub struct SimInstaller {
    behavior: InstallBehavior,
    adapter: PlayerAdapter,
    indicator: IndicatorController,
    transport: Arc<dyn PageTransport>,
    install_count: AtomicUsize,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SimInstaller {
    pub fn new(
        behavior: InstallBehavior,
        adapter: PlayerAdapter,
        indicator: IndicatorController,
        transport: Arc<dyn PageTransport>,
    ) -> Self {
        Self {
            behavior,
            adapter,
            indicator,
            transport,
            install_count: AtomicUsize::new(0),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// How many times installation was attempted.
    pub fn install_count(&self) -> usize {
        self.install_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageInstaller for SimInstaller {
    async fn install(&self) -> Result<(), RelayError> {
        self.install_count.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            InstallBehavior::Fail => Err(RelayError::InstallFailed {
                reason: "simulated injection failure".to_string(),
            }),
            InstallBehavior::Noop => Ok(()),
            InstallBehavior::Spawn => {
                let controller = PageController::new(
                    self.adapter.clone(),
                    self.indicator.clone(),
                    Arc::clone(&self.transport),
                );
                self.tasks.lock().push(controller.spawn());
                Ok(())
            }
        }
    }
}

/// A fully wired simulated session: player, transport, relay, indicator.
pub struct SimHarness {
    pub relay: RelayHandle,
    pub player: Arc<SimPlayer>,
    pub elements: Arc<SimElements>,
    pub transport: Arc<SimTransport>,
    pub indicator: Arc<RecordingIndicator>,
    pub installer: Arc<SimInstaller>,
    pub session: Arc<PageSession>,
    pub config: QualshiftConfig,
}

impl SimHarness {
    pub fn builder() -> SimHarnessBuilder {
        SimHarnessBuilder::default()
    }

    /// Session with the given raw levels and current level, page controls
    /// installing normally.
    pub fn with_levels(levels: &[&str], current: &str) -> Self {
        Self::builder().levels(levels).current(current).build()
    }

    pub fn install_count(&self) -> usize {
        self.installer.install_count()
    }
}

/// Builder for [`SimHarness`].
pub struct SimHarnessBuilder {
    config: QualshiftConfig,
    levels: Vec<QualityLevel>,
    current: Option<QualityLevel>,
    behavior: InstallBehavior,
    player_present: bool,
}

impl Default for SimHarnessBuilder {
    fn default() -> Self {
        Self {
            config: QualshiftConfig::for_testing(),
            levels: crate::quality_levels(&["auto", "hd1080", "hd720", "medium"]),
            current: Some(QualityLevel::from("hd1080")),
            behavior: InstallBehavior::Spawn,
            player_present: true,
        }
    }
}

impl SimHarnessBuilder {
    pub fn config(mut self, config: QualshiftConfig) -> Self {
        self.config = config;
        self
    }

    pub fn levels(mut self, ids: &[&str]) -> Self {
        self.levels = crate::quality_levels(ids);
        self
    }

    pub fn current(mut self, id: &str) -> Self {
        self.current = Some(QualityLevel::from(id));
        self
    }

    /// Install succeeds but never spawns a page side; queries time out.
    pub fn without_page_controls(mut self) -> Self {
        self.behavior = InstallBehavior::Noop;
        self
    }

    /// Install fails outright.
    pub fn failing_install(mut self) -> Self {
        self.behavior = InstallBehavior::Fail;
        self
    }

    /// No player element is registered on the page.
    pub fn without_player(mut self) -> Self {
        self.player_present = false;
        self
    }

    /// Wires everything and spawns the relay. Needs a tokio runtime.
    pub fn build(self) -> SimHarness {
        let player = Arc::new(SimPlayer::new(self.levels, self.current));
        let elements = Arc::new(SimElements::new());
        if self.player_present {
            elements.register(PLAYER_ELEMENT_ID, Arc::clone(&player));
        }

        let transport = Arc::new(SimTransport::with_latency(
            self.config.simulation.transport_latency_ms,
            self.config.simulation.deterministic_seed,
        ));
        let indicator = Arc::new(RecordingIndicator::new());

        let adapter =
            PlayerAdapter::new(Arc::clone(&elements) as Arc<dyn PlayerLocator>);
        let indicator_controller = IndicatorController::new(
            Arc::clone(&indicator) as Arc<dyn IndicatorSurface>,
            &self.config.indicator,
        );

        let installer = Arc::new(SimInstaller::new(
            self.behavior,
            adapter,
            indicator_controller,
            Arc::clone(&transport) as Arc<dyn PageTransport>,
        ));
        let session = Arc::new(PageSession::new());

        let relay = spawn_relay(
            self.config.relay.clone(),
            Arc::clone(&transport) as Arc<dyn PageTransport>,
            Arc::clone(&installer) as Arc<dyn PageInstaller>,
            Arc::clone(&session),
        );

        SimHarness {
            relay,
            player,
            elements,
            transport,
            indicator,
            installer,
            session,
            config: self.config,
        }
    }
}
