//! Shutdown signal handling

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Fires once when SIGINT or SIGTERM arrives
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Manual trigger for a [`ShutdownSignal`]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.sender.send(true);
    }
}

impl ShutdownSignal {
    /// Unwired signal plus the trigger that fires it
    pub fn channel() -> (ShutdownTrigger, Self) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownTrigger { sender }, Self { receiver })
    }

    /// Listen for SIGINT (Ctrl+C) and SIGTERM (systemd stop)
    pub fn listen() -> Result<Self, std::io::Error> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let (trigger, shutdown) = Self::channel();

        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => {}
                _ = sigterm.recv() => {}
            }
            trigger.trigger();
        });

        Ok(shutdown)
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until shutdown is requested
    pub async fn wait(&mut self) {
        // Trigger dropped without firing
        if self.receiver.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
