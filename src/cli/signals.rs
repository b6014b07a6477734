//! Signal handling for the recording run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Sets a shared stop flag on SIGINT or SIGTERM
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a handler that sets an existing flag, such as the
    /// orchestrator's stop flag
    pub fn with_flag(shutdown: Arc<AtomicBool>) -> Self {
        Self { shutdown }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Setup signal handlers
    #[cfg(unix)]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        for (kind, name) in [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ] {
            let shutdown = Arc::clone(&self.shutdown);
            let mut stream = signal(kind)?;
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    tracing::info!("Received {}, stopping", name);
                    shutdown.store(true, Ordering::SeqCst);
                }
            });
        }

        Ok(())
    }

    /// Setup signal handlers
    #[cfg(not(unix))]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                shutdown.store(true, Ordering::SeqCst);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = ShutdownSignal::with_flag(Arc::clone(&flag));
        assert!(!signal.is_shutdown());

        flag.store(true, Ordering::SeqCst);
        assert!(signal.is_shutdown());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_sets_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = ShutdownSignal::with_flag(Arc::clone(&flag));
        signal.setup().await.unwrap();

        nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM).unwrap();
        for _ in 0..50 {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(signal.is_shutdown());
    }
}
