//! Shutdown coordination
//!
//! The `exit` command, end of input and SIGINT/SIGTERM all funnel into one
//! [`ShutdownCoordinator`]. The first trigger marks the client as closing and
//! runs the registered finalizers; later triggers only wait for that teardown.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What started the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    ExitCommand,
    EndOfInput,
    Signal(&'static str),
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::ExitCommand => f.write_str("exit command"),
            ShutdownReason::EndOfInput => f.write_str("end of input"),
            ShutdownReason::Signal(name) => f.write_str(name),
        }
    }
}

type Finalizer = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

struct Inner {
    closing: CancellationToken,
    done: CancellationToken,
    fired: AtomicBool,
    reason: OnceLock<ShutdownReason>,
    finalizers: Mutex<Vec<Finalizer>>,
    signals: Mutex<Option<JoinHandle<()>>>,
}

/// Runs the client teardown exactly once, whatever triggers it
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                closing: CancellationToken::new(),
                done: CancellationToken::new(),
                fired: AtomicBool::new(false),
                reason: OnceLock::new(),
                finalizers: Mutex::new(Vec::new()),
                signals: Mutex::new(None),
            }),
        }
    }

    /// Register a teardown step. Steps run in registration order.
    pub fn on_shutdown<F, Fut>(&self, finalizer: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Ok(mut finalizers) = self.inner.finalizers.lock() {
            finalizers.push(Box::new(move || finalizer().boxed()));
        }
    }

    /// Whether a shutdown has been triggered
    pub fn is_closing(&self) -> bool {
        self.inner.closing.is_cancelled()
    }

    /// Token cancelled as soon as a shutdown is triggered
    pub fn closing(&self) -> CancellationToken {
        self.inner.closing.clone()
    }

    /// Reason of the first trigger
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.inner.reason.get().copied()
    }

    /// Wait until the teardown has finished
    pub async fn completed(&self) {
        self.inner.done.cancelled().await
    }

    /// Trigger the shutdown and wait for the teardown to finish.
    ///
    /// Returns `true` for the call that actually ran the teardown.
    pub async fn shutdown(&self, reason: ShutdownReason) -> bool {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already triggered, ignoring {}", reason);
            self.completed().await;
            return false;
        }

        info!("Shutting down ({})", reason);
        let _ = self.inner.reason.set(reason);
        self.inner.closing.cancel();

        if let Some(listener) = self.inner.signals.lock().ok().and_then(|mut s| s.take()) {
            listener.abort();
        }

        let finalizers = self
            .inner
            .finalizers
            .lock()
            .map(|mut finalizers| std::mem::take(&mut *finalizers))
            .unwrap_or_default();
        for finalizer in finalizers {
            finalizer().await;
        }

        self.inner.done.cancel();
        true
    }

    /// Trigger the shutdown without waiting for it
    pub fn trigger(&self, reason: ShutdownReason) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.shutdown(reason).await;
        });
    }

    /// Listen for SIGINT and SIGTERM (ctrl-c only off unix) and trigger the
    /// shutdown on the first one
    pub fn listen_for_signals(&self) {
        let coordinator = self.clone();
        let closing = self.closing();

        let listener = tokio::spawn(async move {
            tokio::select! {
                _ = closing.cancelled() => {}
                name = wait_for_signal() => {
                    if let Some(name) = name {
                        info!("{} received, initiating shutdown", name);
                        coordinator.trigger(ShutdownReason::Signal(name));
                    }
                }
            }
        });

        if let Ok(mut signals) = self.inner.signals.lock() {
            if let Some(previous) = signals.replace(listener) {
                previous.abort();
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Option<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sigint) => sigint,
        Err(e) => {
            warn!("Failed to install SIGINT handler: {}", e);
            return None;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            return None;
        }
    };

    tokio::select! {
        _ = sigint.recv() => Some("SIGINT"),
        _ = sigterm.recv() => Some("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Option<&'static str> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some("SIGINT"),
        Err(e) => {
            warn!("Failed to install Ctrl+C handler: {}", e);
            None
        }
    }
}
