use crate::CoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Flags of every token handed to [`install_signal_handler`] that is still
/// alive.
static WATCHED: Mutex<Vec<Weak<AtomicBool>>> = Mutex::new(Vec::new());
static HANDLER: OnceLock<Result<(), String>> = OnceLock::new();

/// Cancellation flag plus optional deadline for one compilation.
///
/// Clones share the flag, so a token handed to a signal handler or another
/// thread cancels every holder.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now. A timeout too large to represent as an
    /// instant leaves the token without a deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CoreError::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Cancel `token` on the next Ctrl-C.
///
/// One process-wide handler is registered on first use and cancels every
/// live token passed here. A Ctrl-C that finds nothing left to cancel exits
/// with status 130.
pub fn install_signal_handler(token: &CancelToken) -> Result<(), CoreError> {
    HANDLER
        .get_or_init(|| ctrlc::set_handler(on_interrupt).map_err(|e| e.to_string()))
        .clone()
        .map_err(CoreError::SignalHandler)?;

    let mut watched = watched();
    watched.retain(|flag| flag.strong_count() > 0);
    watched.push(Arc::downgrade(&token.cancelled));
    Ok(())
}

fn on_interrupt() {
    if cancel_watched() == 0 {
        std::process::exit(130);
    }
    eprintln!("\ncancellation requested, aborting compilation...");
}

/// Cancel every live watched token; returns how many were not already
/// cancelled.
fn cancel_watched() -> usize {
    watched()
        .iter()
        .filter_map(Weak::upgrade)
        .filter(|flag| !flag.swap(true, Ordering::SeqCst))
        .count()
}

fn watched() -> MutexGuard<'static, Vec<Weak<AtomicBool>>> {
    WATCHED.lock().unwrap_or_else(PoisonError::into_inner)
}
