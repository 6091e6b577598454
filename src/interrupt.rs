//! A user interrupt that in-flight requests can wait on.
//!
//! A signal handler calls [`Interrupt::trigger`] from any thread.  Code that is
//! blocked on the network races its future against [`Interrupt::triggered`], so
//! a silent server cannot hold the user hostage until the next byte arrives.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::{Error, Result};

/// Message carried by the abort error an interrupt produces.
pub const INTERRUPTED: &str = "interrupted by user";

/// A cloneable, resettable interrupt flag with async wakeup.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    /// Creates an untriggered interrupt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the interrupt and wake every waiter.
    pub fn trigger(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Lower the interrupt before starting the next request.
    pub fn reset(&self) {
        self.inner.flag.store(false, Ordering::SeqCst);
    }

    /// Returns true if the interrupt has been raised since the last reset.
    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once the interrupt is raised.
    pub async fn triggered(&self) {
        loop {
            // Register before checking so a trigger in between is not lost.
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// Await `fut` unless `interrupt` is raised first, in which case `fut` is
/// dropped and an abort error is returned.
///
/// # Errors
///
/// Returns the error of `fut`, or [`Error::Abort`] when interrupted.
pub async fn interruptible<T, F>(fut: F, interrupt: Option<&Interrupt>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(interrupt) = interrupt else {
        return fut.await;
    };
    tokio::select! {
        biased;
        () = interrupt.triggered() => Err(Error::abort(INTERRUPTED)),
        result = fut => result,
    }
}
