//! Signal handling for graceful shutdown
//!
//! CTRL-C and SIGTERM cancel a [`CancellationToken`]. The pool's dispatch
//! loop watches that token, so a signal stops admission while fetches that
//! already hold a slot still finish and publish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels a token when the process is asked to stop
#[derive(Debug, Clone)]
pub struct SignalHandler {
    cancel: CancellationToken,
    interrupted: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the background task that waits for CTRL-C or SIGTERM
    ///
    /// The task also ends quietly when the token is cancelled for any
    /// other reason.
    pub fn setup(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        let interrupted = Arc::clone(&self.interrupted);

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ctrl_c => {
                    info!("Received Ctrl+C, stopping admission");
                },
                _ = terminate => {
                    info!("Received terminate signal, stopping admission");
                },
            }

            interrupted.store(true, Ordering::SeqCst);
            cancel.cancel();
        })
    }

    /// Whether a signal, rather than normal completion, cancelled the token
    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}
