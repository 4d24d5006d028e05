//! Per-thread handle to the symbolization backend
//!
//! The backend is built lazily on first use and at most once: rebuilding its
//! state on the same thread is not supported, so a failed construction leaves
//! the handle permanently unavailable instead of retrying.

use log::{info, warn};

use super::SymbolBackend;
use crate::domain::BacktraceError;

type Loader<B> = Box<dyn FnOnce() -> Result<B, BacktraceError>>;

enum HandleState<B> {
    Uninitialized(Loader<B>),
    Ready(B),
    Unavailable(BacktraceError),
    /// Only observable if a loader panics mid-construction
    Poisoned,
}

/// Lazily-initialized symbolization backend
pub struct SymbolHandle<B> {
    state: HandleState<B>,
}

impl<B: SymbolBackend> SymbolHandle<B> {
    /// Create a handle that will build its backend with `loader` on first use
    pub fn new(loader: impl FnOnce() -> Result<B, BacktraceError> + 'static) -> Self {
        Self { state: HandleState::Uninitialized(Box::new(loader)) }
    }

    /// Create a handle around an already constructed backend
    pub fn ready(backend: B) -> Self {
        Self { state: HandleState::Ready(backend) }
    }

    /// Build the backend if this is the first call.
    ///
    /// # Errors
    /// Returns the construction error on the call that performed a failing
    /// construction. Every later call succeeds as a no-op, whether or not the
    /// backend is usable; check [`SymbolHandle::backend`] for that.
    pub fn ensure_initialized(&mut self) -> Result<(), BacktraceError> {
        if !matches!(self.state, HandleState::Uninitialized(_)) {
            return Ok(());
        }

        let HandleState::Uninitialized(loader) =
            std::mem::replace(&mut self.state, HandleState::Poisoned)
        else {
            return Ok(());
        };

        match loader() {
            Ok(backend) => {
                info!("Symbolization backend initialized");
                self.state = HandleState::Ready(backend);
                Ok(())
            }
            Err(e) => {
                warn!("Symbolization backend unavailable: {e}");
                self.state = HandleState::Unavailable(e.clone());
                Err(e)
            }
        }
    }

    /// The backend, if it was constructed successfully
    pub fn backend(&self) -> Option<&B> {
        match &self.state {
            HandleState::Ready(backend) => Some(backend),
            _ => None,
        }
    }

    /// The construction error, if construction failed
    pub fn error(&self) -> Option<&BacktraceError> {
        match &self.state {
            HandleState::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true once construction has been attempted.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, HandleState::Uninitialized(_))
    }
}
