//! Network reachability tracking.
//!
//! `NetworkMonitor` keeps the latest known reachability in a watch channel.
//! A probing monitor refreshes it by opening a TCP connection to a probe
//! address on a fixed interval; a manual monitor is fed by whoever owns the
//! platform's path notifications (or by tests).
//!
//! The reading can be stale by the time a caller acts on it. Controllers
//! treat a fetch that fails after an "available" reading like an offline
//! read and fall back to the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default probe target (a public anycast resolver on the HTTPS port)
const DEFAULT_PROBE_ADDRESS: &str = "1.1.1.1:443";

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 2;

/// Process-wide monitor, created on first use and alive until exit
static SHARED: OnceLock<Arc<NetworkMonitor>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// `host:port` to connect to
    pub address: String,
    pub interval_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_PROBE_ADDRESS.to_string(),
            interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug)]
pub struct NetworkMonitor {
    /// `None` until the first reading arrives
    status: watch::Sender<Option<bool>>,
    probe: Option<ProbeConfig>,
    started: AtomicBool,
}

impl NetworkMonitor {
    /// A monitor that probes `probe.address` once `start_monitoring` is called.
    pub fn probing(probe: ProbeConfig) -> Arc<Self> {
        let (status, _) = watch::channel(None);
        Arc::new(Self {
            status,
            probe: Some(probe),
            started: AtomicBool::new(false),
        })
    }

    /// A monitor driven only through `set_available`.
    pub fn manual(available: bool) -> Arc<Self> {
        let (status, _) = watch::channel(Some(available));
        Arc::new(Self {
            status,
            probe: None,
            started: AtomicBool::new(false),
        })
    }

    /// The process-wide monitor. The first caller's probe config wins.
    pub fn shared(probe: ProbeConfig) -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Self::probing(probe)))
    }

    /// Begin observing reachability. Calling it again is a no-op.
    ///
    /// Must be called from within a Tokio runtime for probing monitors.
    pub fn start_monitoring(self: &Arc<Self>) {
        let Some(probe) = self.probe.clone() else {
            return;
        };
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No async runtime, network monitoring not started");
            self.started.store(false, Ordering::SeqCst);
            return;
        }

        info!(address = %probe.address, interval_secs = probe.interval_secs, "Starting network monitoring");
        let monitor = Arc::downgrade(self);
        tokio::spawn(async move {
            let interval = Duration::from_secs(probe.interval_secs.max(1));
            loop {
                let reachable = probe_once(&probe).await;
                match monitor.upgrade() {
                    Some(monitor) => monitor.set_available(reachable),
                    None => break,
                }
                tokio::time::sleep(interval).await;
            }
            debug!("Network monitor dropped, probe loop finished");
        });
    }

    pub fn is_monitoring(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Latest known status; `false` until the first reading.
    pub fn is_available(&self) -> bool {
        self.status.borrow().unwrap_or(false)
    }

    /// Current status, waiting for the first probe result if monitoring has
    /// started but nothing has been observed yet.
    pub async fn check_availability(&self) -> bool {
        if self.status.borrow().is_none() && self.is_monitoring() {
            let mut rx = self.status.subscribe();
            let status = rx.wait_for(Option::is_some).await.map(|status| *status);
            if let Ok(status) = status {
                return status.unwrap_or(false);
            }
        }
        self.is_available()
    }

    pub fn set_available(&self, available: bool) {
        let changed = self.status.send_if_modified(|status| {
            if *status == Some(available) {
                false
            } else {
                *status = Some(available);
                true
            }
        });
        if changed {
            info!(available, "Network status changed");
        }
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<Option<bool>> {
        self.status.subscribe()
    }
}

async fn probe_once(probe: &ProbeConfig) -> bool {
    let timeout = Duration::from_secs(probe.connect_timeout_secs.max(1));
    match tokio::time::timeout(timeout, TcpStream::connect(&probe.address)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(address = %probe.address, error = %e, "Probe connection failed");
            false
        }
        Err(_) => {
            debug!(address = %probe.address, "Probe connection timed out");
            false
        }
    }
}
