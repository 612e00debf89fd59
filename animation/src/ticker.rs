//! The per execution context scheduler.
//!
//! A [`Ticker`] holds the running clocks of one context and advances them once per frame. It only
//! wants frames while clocks or next frame callbacks are pending, and tells the host through a
//! [`FrameSignal`] when that changes.

use std::{
    fmt, mem,
    sync::{Arc, Weak},
};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::Clock;

/// The host's per-frame update subscription.
pub trait FrameSignal: Send + Sync {
    /// The ticker wants [`Ticker::update`] to be called every frame from now on.
    fn connect(&self);
    /// The ticker is idle, frames can stop.
    fn disconnect(&self);
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Clone)]
pub struct Ticker {
    inner: Arc<Mutex<TickerInner>>,
}

#[derive(Debug, Clone)]
pub(crate) struct WeakTicker(Weak<Mutex<TickerInner>>);

impl WeakTicker {
    pub fn upgrade(&self) -> Option<Ticker> {
        self.0.upgrade().map(|inner| Ticker { inner })
    }
}

struct TickerInner {
    clocks: Vec<Registration>,
    /// Some registrations are marked as removed and wait for compaction.
    needs_compaction: bool,
    next_frame: Vec<Callback>,
    /// Inside [`Ticker::update`].
    updating: bool,
    subscribed: bool,
    signal: Option<Arc<dyn FrameSignal>>,
}

struct Registration {
    clock: Clock,
    removed: bool,
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Ticker")
            .field("clocks", &inner.clocks.len())
            .field("next_frame", &inner.next_frame.len())
            .field("subscribed", &inner.subscribed)
            .finish()
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self::from_signal(None)
    }

    pub fn with_signal(signal: impl FrameSignal + 'static) -> Self {
        Self::from_signal(Some(Arc::new(signal)))
    }

    fn from_signal(signal: Option<Arc<dyn FrameSignal>>) -> Self {
        Self {
            inner: Mutex::new(TickerInner {
                clocks: Vec::new(),
                needs_compaction: false,
                next_frame: Vec::new(),
                updating: false,
                subscribed: false,
                signal,
            })
            .into(),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakTicker {
        WeakTicker(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn add_clock(&self, clock: &Clock) {
        let connect = {
            let mut inner = self.inner.lock();
            match inner.clocks.iter_mut().find(|r| r.clock.ptr_eq(clock)) {
                Some(registration) => registration.removed = false,
                None => inner.clocks.push(Registration {
                    clock: clock.clone(),
                    removed: false,
                }),
            }
            inner.subscribe()
        };
        if let Some(signal) = connect {
            signal.connect();
        }
    }

    /// Removes the clock. Does nothing if it is not registered.
    ///
    /// While an update pass runs, the clock is only marked and compacted at the end of the pass.
    pub fn remove_clock(&self, clock: &Clock) {
        let disconnect = {
            let mut inner = self.inner.lock();
            if let Some(registration) = inner
                .clocks
                .iter_mut()
                .find(|r| !r.removed && r.clock.ptr_eq(clock))
            {
                registration.removed = true;
                inner.needs_compaction = true;
            }
            if inner.updating {
                return;
            }
            inner.compact();
            inner.unsubscribe_if_idle()
        };
        if let Some(signal) = disconnect {
            signal.disconnect();
        }
    }

    /// Run `callback` at the start of the next update pass.
    ///
    /// Callbacks scheduled while a pass runs its callbacks are deferred to the following pass.
    pub fn next_frame(&self, callback: impl FnOnce() + Send + 'static) {
        let connect = {
            let mut inner = self.inner.lock();
            inner.next_frame.push(Box::new(callback));
            inner.subscribe()
        };
        if let Some(signal) = connect {
            signal.connect();
        }
    }

    /// The per-frame update pass.
    ///
    /// Runs all pending next frame callbacks, then ticks every registered clock with `delta`
    /// seconds.
    pub fn update(&self, delta: f64) {
        let delta = if delta.is_finite() && delta >= 0.0 {
            delta
        } else {
            warn!("Ignoring invalid frame delta {delta}");
            0.0
        };

        let callbacks = {
            let mut inner = self.inner.lock();
            inner.updating = true;
            mem::take(&mut inner.next_frame)
        };

        for callback in callbacks {
            callback();
        }

        let clocks: Vec<Clock> = self
            .inner
            .lock()
            .clocks
            .iter()
            .filter(|r| !r.removed)
            .map(|r| r.clock.clone())
            .collect();

        for clock in clocks {
            // The response is mirrored by the clock removing itself.
            let _ = clock.tick(delta);
        }

        let disconnect = {
            let mut inner = self.inner.lock();
            inner.updating = false;
            inner.compact();
            inner.unsubscribe_if_idle()
        };
        if let Some(signal) = disconnect {
            signal.disconnect();
        }
    }

    /// Number of registered clocks.
    pub fn clock_count(&self) -> usize {
        self.inner
            .lock()
            .clocks
            .iter()
            .filter(|r| !r.removed)
            .count()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.inner.lock().next_frame.len()
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.lock().subscribed
    }

    pub fn wants_frames(&self) -> bool {
        let inner = self.inner.lock();
        inner.clocks.iter().any(|r| !r.removed) || !inner.next_frame.is_empty()
    }
}

impl TickerInner {
    fn compact(&mut self) {
        if mem::take(&mut self.needs_compaction) {
            self.clocks.retain(|r| !r.removed);
        }
    }

    /// Returns the signal to connect if this subscribes.
    #[must_use]
    fn subscribe(&mut self) -> Option<Arc<dyn FrameSignal>> {
        if self.subscribed {
            return None;
        }
        self.subscribed = true;
        debug!("Ticker subscribed to frames");
        self.signal.clone()
    }

    /// Returns the signal to disconnect if this unsubscribes.
    #[must_use]
    fn unsubscribe_if_idle(&mut self) -> Option<Arc<dyn FrameSignal>> {
        if !self.subscribed || !self.clocks.is_empty() || !self.next_frame.is_empty() {
            return None;
        }
        self.subscribed = false;
        debug!("Ticker idle, unsubscribed from frames");
        self.signal.clone()
    }
}
