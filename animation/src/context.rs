use std::sync::Arc;

use parking_lot::Mutex;

use crate::{ExclusivityDirectory, Ticker};

/// An execution context, for example one per connected participant and one for the authoritative
/// host.
///
/// Clocks started in a context run on its active ticker. Contexts sharing an
/// [`ExclusivityDirectory`] cancel each other's animations when they start one with the same id.
#[derive(Debug, Clone)]
pub struct AnimationContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    name: String,
    directory: ExclusivityDirectory,
    ticker: Mutex<Option<Ticker>>,
}

impl AnimationContext {
    pub fn new(name: impl Into<String>, directory: ExclusivityDirectory) -> Self {
        Self {
            inner: ContextInner {
                name: name.into(),
                directory,
                ticker: None.into(),
            }
            .into(),
        }
    }

    /// Designate `ticker` as the active ticker of this context.
    pub fn activate(&self, ticker: Ticker) {
        *self.inner.ticker.lock() = Some(ticker);
    }

    pub fn deactivate(&self) -> Option<Ticker> {
        self.inner.ticker.lock().take()
    }

    pub fn active_ticker(&self) -> Option<Ticker> {
        self.inner.ticker.lock().clone()
    }

    pub fn directory(&self) -> &ExclusivityDirectory {
        &self.inner.directory
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}
