//! In-process page transport.

use std::time::Duration;

use parking_lot::Mutex;
use qualshift_core::relay::{PageMessage, PageTransport, RelayError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;

/// Broadcast bus standing in for the page's shared message channel.
///
/// Optional latency delays each publish by a fixed base plus seeded
/// jitter, approximating scheduling delay between worlds without losing
/// reproducibility.
pub struct SimTransport {
    bus: broadcast::Sender<PageMessage>,
    latency: Duration,
    jitter: Option<Mutex<StdRng>>,
}

impl SimTransport {
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(64);
        Self {
            bus,
            latency: Duration::ZERO,
            jitter: None,
        }
    }

    /// Transport with per-message latency and deterministic jitter.
    pub fn with_latency(latency_ms: u64, seed: Option<u64>) -> Self {
        let (bus, _) = broadcast::channel(64);
        Self {
            bus,
            latency: Duration::from_millis(latency_ms),
            jitter: seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn delay(&self) -> Duration {
        let jitter_ms = match &self.jitter {
            Some(rng) => rng.lock().random_range(0..=self.latency.as_millis() as u64 / 2),
            None => 0,
        };
        self.latency + Duration::from_millis(jitter_ms)
    }
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTransport for SimTransport {
    fn publish(&self, message: PageMessage) -> Result<(), RelayError> {
        if self.latency.is_zero() {
            return self
                .bus
                .send(message)
                .map(|_| ())
                .map_err(|_| RelayError::TransportClosed);
        }

        let bus = self.bus.clone();
        let delay = self.delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = bus.send(message);
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PageMessage> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use qualshift_core::quality::Command;

    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let transport = SimTransport::new();
        let mut rx = transport.subscribe();

        transport
            .publish(PageMessage::control(Command::IncreaseQuality))
            .unwrap();

        let message = rx.recv().await.unwrap();
        assert!(message.is_ours());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_errors() {
        let transport = SimTransport::new();
        let result = transport.publish(PageMessage::control(Command::IncreaseQuality));
        assert!(matches!(result, Err(RelayError::TransportClosed)));
    }
}
