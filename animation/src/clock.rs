//! The state machine driving exactly one tween: iterations, delays, yoyo and pause.

use std::{fmt, mem, sync::Arc};

use anyhow::{Result, anyhow, ensure};
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::{
    AnimationContext, CancelToken, Completion, ExclusivityDirectory, TimeSource, Tween,
    completion::{Completer, completion},
    ticker::WeakTicker,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Iterations {
    Count(u32),
    /// Runs until stopped or canceled.
    Infinite,
}

impl Default for Iterations {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl From<u32> for Iterations {
    fn from(count: u32) -> Self {
        Self::Count(count)
    }
}

impl Iterations {
    fn exhausted(self) -> bool {
        self == Iterations::Count(0)
    }

    fn decremented(self) -> Self {
        match self {
            Iterations::Count(n) => Iterations::Count(n.saturating_sub(1)),
            Iterations::Infinite => Iterations::Infinite,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClockConfig {
    pub iterations: Iterations,
    /// Seconds to wait before every iteration, including the first.
    pub iteration_delay: f64,
    /// Reverse the direction at the end of each iteration instead of starting over.
    pub yoyo: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            iterations: Iterations::default(),
            iteration_delay: 0.0,
            yoyo: false,
        }
    }
}

impl ClockConfig {
    pub fn with_iterations(self, iterations: impl Into<Iterations>) -> Self {
        Self {
            iterations: iterations.into(),
            ..self
        }
    }

    pub fn with_iteration_delay(self, iteration_delay: f64) -> Self {
        Self {
            iteration_delay,
            ..self
        }
    }

    pub fn with_yoyo(self, yoyo: bool) -> Self {
        Self { yoyo, ..self }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickResponse {
    Continue,
    Stop,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    /// Stopped, waiting for the next tick to tear down.
    Stopping,
}

/// Drives a tween over time.
///
/// A clock and its tween are bound for the clock's lifetime. Clock control methods may be called
/// from the tween's callbacks, but a clock must not be started from within its own tween.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<ClockInner>,
}

struct ClockInner {
    source: TimeSource,
    config: ClockConfig,
    duration: f64,
    canceled: CancelToken,
    state: Mutex<ClockState>,
    tween: Mutex<Box<dyn Tween>>,
}

#[derive(Debug)]
struct ClockState {
    phase: Phase,
    paused: bool,
    direction: Direction,
    iterations_remaining: Iterations,
    clock_time: f64,
    delay_time: f64,
    /// The loop begin hook fired for the current iteration.
    iteration_begun: bool,
    completer: Option<Completer>,
    ticker: Option<WeakTicker>,
    directory: Option<ExclusivityDirectory>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("source", &self.inner.source)
            .field("config", &self.inner.config)
            .field("duration", &self.inner.duration)
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

impl Clock {
    pub fn new(tween: impl Tween + 'static, config: ClockConfig) -> Result<Self> {
        Self::from_boxed(Box::new(tween), config)
    }

    pub fn from_boxed(mut tween: Box<dyn Tween>, config: ClockConfig) -> Result<Self> {
        ensure!(
            config.iteration_delay.is_finite() && config.iteration_delay >= 0.0,
            "Iteration delay must be finite and not negative, got {}",
            config.iteration_delay
        );
        let source = TimeSource::new();
        tween.set_time_source(source)?;

        Ok(Self {
            inner: ClockInner {
                source,
                config,
                duration: tween.duration(),
                canceled: tween.cancel_token(),
                state: Mutex::new(ClockState {
                    phase: Phase::Idle,
                    paused: false,
                    direction: Direction::Forward,
                    iterations_remaining: config.iterations,
                    clock_time: 0.0,
                    delay_time: 0.0,
                    iteration_begun: false,
                    completer: None,
                    ticker: None,
                    directory: None,
                }),
                tween: Mutex::new(tween),
            }
            .into(),
        })
    }

    /// Start or restart the clock in `context`.
    ///
    /// The returned completion resolves when the iterations are exhausted or the clock is
    /// stopped. It fails if `context` has no active ticker.
    pub fn start(&self, context: &AnimationContext) -> Completion {
        let (completer, completion) = completion();
        self.start_with(context, completer);
        completion
    }

    pub(crate) fn start_with(&self, context: &AnimationContext, completer: Completer) {
        let Some(ticker) = context.active_ticker() else {
            warn!(
                "{} started in context `{}` without an active ticker",
                self.inner.source,
                context.name()
            );
            completer.fail(anyhow!("No active ticker in context `{}`", context.name()));
            return;
        };

        let (previous_completer, previous_ticker, previous_directory) = {
            let mut state = self.inner.state.lock();
            let registered = state.phase != Phase::Idle;
            let previous = (
                state.completer.take(),
                state.ticker.take().filter(|_| registered),
                state.directory.take().filter(|_| registered),
            );

            state.phase = Phase::Running;
            state.paused = false;
            state.iterations_remaining = self.inner.config.iterations;
            state.clock_time = match state.direction {
                Direction::Forward => 0.0,
                Direction::Backward => self.inner.duration,
            };
            state.delay_time = self.inner.config.iteration_delay;
            state.iteration_begun = false;
            state.completer = Some(completer);
            state.ticker = Some(ticker.downgrade());
            state.directory = Some(context.directory().clone());
            previous
        };

        // Restarted while still registered.
        if let Some(previous) = previous_completer {
            previous.complete();
        }
        if let Some(previous) = previous_ticker.and_then(|t| t.upgrade()) {
            if !previous.ptr_eq(&ticker) {
                previous.remove_clock(self);
            }
        }

        ticker.add_clock(self);

        let mut tween = self.inner.tween.lock();
        if let Some(previous) = previous_directory {
            tween.time_source_stop(&previous);
        }
        tween.time_source_start(context.directory());
    }

    /// Freezes progress without altering any counters. Only effective while running.
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Running {
            state.paused = true;
        }
    }

    pub fn resume(&self) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Running {
            state.paused = false;
        }
    }

    /// Stops the clock. Teardown and completion happen on the next tick.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Running {
            state.phase = Phase::Stopping;
            state.paused = false;
        }
    }

    /// Flips the direction and returns the new one.
    pub fn reverse(&self) -> Direction {
        let mut state = self.inner.state.lock();
        state.direction = state.direction.reversed();
        state.direction
    }

    /// Cancels the tween. The clock finishes on its next advancing tick.
    pub fn cancel(&self) {
        self.inner.canceled.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.is_canceled()
    }

    pub fn direction(&self) -> Direction {
        self.inner.state.lock().direction
    }

    /// The current, unclamped, clock time.
    pub fn time_code(&self) -> f64 {
        self.inner.state.lock().clock_time
    }

    pub fn iterations_remaining(&self) -> Iterations {
        self.inner.state.lock().iterations_remaining
    }

    pub fn duration(&self) -> f64 {
        self.inner.duration
    }

    pub fn config(&self) -> ClockConfig {
        self.inner.config
    }

    pub fn time_source(&self) -> TimeSource {
        self.inner.source
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Advance by `delta` seconds.
    pub fn tick(&self, delta: f64) -> TickResponse {
        let (time_code, begin) = {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Idle => return TickResponse::Stop,
                Phase::Stopping => {
                    let begun = state.iteration_begun;
                    drop(state);
                    return self.finish(begun);
                }
                Phase::Running => {}
            }
            if state.paused {
                return TickResponse::Continue;
            }
            if state.iterations_remaining.exhausted() {
                drop(state);
                return self.finish(false);
            }

            state.delay_time -= delta;
            if state.delay_time > 0.0 {
                return TickResponse::Continue;
            }

            // Canceled before the iteration began, it never begins.
            if !state.iteration_begun && self.inner.canceled.is_canceled() {
                drop(state);
                return self.finish(false);
            }

            state.clock_time += state.direction.sign() * delta;
            let begin = !mem::replace(&mut state.iteration_begun, true);
            (state.clock_time, begin)
        };

        {
            let mut tween = self.inner.tween.lock();
            if begin {
                tween.loop_begin();
            }
            tween.update(time_code);
        }

        let canceled = self.inner.canceled.is_canceled();
        {
            let mut state = self.inner.state.lock();
            // Stopped from within the tween, the next tick tears down.
            if state.phase != Phase::Running {
                return TickResponse::Continue;
            }
            let reached = match state.direction {
                Direction::Forward => state.clock_time >= self.inner.duration,
                Direction::Backward => state.clock_time <= 0.0,
            };
            if !reached && !canceled {
                return TickResponse::Continue;
            }
            state.iteration_begun = false;
        }

        self.inner.tween.lock().loop_end();

        let mut state = self.inner.state.lock();
        if state.phase != Phase::Running {
            return TickResponse::Continue;
        }
        state.iterations_remaining = state.iterations_remaining.decremented();
        if canceled || state.iterations_remaining.exhausted() {
            drop(state);
            return self.finish(false);
        }

        if self.inner.config.yoyo {
            state.direction = state.direction.reversed();
        }
        state.clock_time = match state.direction {
            Direction::Forward => 0.0,
            Direction::Backward => self.inner.duration,
        };
        state.delay_time = self.inner.config.iteration_delay;
        trace!(
            "{} next iteration {:?}, {:?} remaining",
            self.inner.source, state.direction, state.iterations_remaining
        );
        TickResponse::Continue
    }

    /// Leave the directory, resolve the completion and deregister from the ticker.
    fn finish(&self, loop_end: bool) -> TickResponse {
        if loop_end {
            self.inner.tween.lock().loop_end();
        }

        let (completer, ticker, directory) = {
            let mut state = self.inner.state.lock();
            state.phase = Phase::Idle;
            state.paused = false;
            state.iteration_begun = false;
            (
                state.completer.take(),
                state.ticker.take(),
                state.directory.take(),
            )
        };

        if let Some(directory) = directory {
            self.inner.tween.lock().time_source_stop(&directory);
        }
        debug!("{} completed", self.inner.source);
        if let Some(completer) = completer {
            completer.complete();
        }
        if let Some(ticker) = ticker.and_then(|t| t.upgrade()) {
            ticker.remove_clock(self);
        }
        TickResponse::Stop
    }
}
