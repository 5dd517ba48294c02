//! Cooperative shutdown flag with an interruptible sleep.
//!
//! SIGINT/SIGTERM set the flag through `signal-hook`; the poll loop sleeps in
//! short ticks and re-checks it, so a stop request is honoured within
//! `SHUTDOWN_CHECK_MS` even in the middle of a 12h wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::constants::SHUTDOWN_CHECK_MS;

#[derive(Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register SIGINT (and SIGTERM on unix) to request shutdown.
    pub fn install_signal_handlers(&self) -> std::io::Result<()> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, self.requested.clone())?;
        #[cfg(unix)]
        signal_hook::flag::register(signal_hook::consts::SIGTERM, self.requested.clone())?;
        Ok(())
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    /// Sleep up to `duration`. Returns `true` if shutdown was requested
    /// (before or during the wait), `false` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let tick = Duration::from_millis(SHUTDOWN_CHECK_MS);
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(tick.min(deadline - now));
        }
    }
}
