use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Result, bail, ensure};
use derive_more::Display;
use uuid::Uuid;

use crate::{BoundInterpolator, Easing, ExclusivityDirectory, Interpolatable, Property};

/// Identity of an animation, used only to cancel animations that race for the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct TweenId(Arc<str>);

impl TweenId {
    pub fn generate() -> Self {
        Uuid::new_v4().to_string().into()
    }
}

impl From<&str> for TweenId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for TweenId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

/// Identity of the clock driving a tween.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
#[display("time source {_0}")]
pub struct TimeSource(Uuid);

impl TimeSource {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Shared cancellation flag of a tween. Once canceled, it stays canceled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub type Hook = Box<dyn FnMut() + Send>;

/// State shared by all tweens: identity, timing, cancellation and the time source attachment.
pub struct TweenCore {
    id: TweenId,
    duration: f64,
    easing: Easing,
    canceled: CancelToken,
    time_source: Option<TimeSource>,
    on_loop_begin: Option<Hook>,
    on_loop_end: Option<Hook>,
}

impl fmt::Debug for TweenCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenCore")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("canceled", &self.canceled.is_canceled())
            .field("time_source", &self.time_source)
            .finish()
    }
}

impl TweenCore {
    pub fn new(duration: f64, easing: Easing) -> Result<Self> {
        ensure!(
            duration.is_finite(),
            "Tween duration must be finite, got {duration}"
        );
        ensure!(
            duration >= 0.0,
            "Tween duration must not be negative, got {duration}"
        );
        Ok(Self {
            id: TweenId::generate(),
            duration,
            easing,
            canceled: CancelToken::default(),
            time_source: None,
            on_loop_begin: None,
            on_loop_end: None,
        })
    }

    pub fn id(&self) -> &TweenId {
        &self.id
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub(crate) fn canceled(&self) -> &CancelToken {
        &self.canceled
    }

    /// The eased progress at `time_code`, which is clamped into `[0, duration]` first.
    ///
    /// A zero duration tween is always complete.
    pub fn progress(&self, time_code: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.easing.apply(1.0);
        }
        let time_code = time_code.clamp(0.0, self.duration);
        self.easing.apply(time_code / self.duration)
    }

    pub(crate) fn attach(&mut self, source: TimeSource) -> Result<()> {
        if let Some(attached) = self.time_source {
            bail!(
                "Tween `{}` is already attached to {attached}, refusing {source}",
                self.id
            );
        }
        self.time_source = Some(source);
        Ok(())
    }

    pub(crate) fn register(&self, directory: &ExclusivityDirectory) {
        match self.time_source {
            Some(source) => directory.register(&self.id, source, self.canceled.clone()),
            None => log::warn!("Tween `{}` started without a time source", self.id),
        }
    }

    pub(crate) fn unregister(&self, directory: &ExclusivityDirectory) {
        directory.unregister(&self.id, &self.canceled);
    }

    pub(crate) fn loop_begin(&mut self) {
        if let Some(hook) = &mut self.on_loop_begin {
            hook();
        }
    }

    pub(crate) fn loop_end(&mut self) {
        if let Some(hook) = &mut self.on_loop_end {
            hook();
        }
    }
}

/// The atomic unit of animation.
///
/// Implementors provide [`apply_percent_complete`](Tween::apply_percent_complete) and access to
/// their [`TweenCore`]. Composite tweens override the time source and loop methods to fan out to
/// their children in addition to the core's own behavior.
pub trait Tween: Send {
    fn core(&self) -> &TweenCore;
    fn core_mut(&mut self) -> &mut TweenCore;

    /// Apply the effect for an eased progress ratio. The ratio may leave `[0, 1]`.
    fn apply_percent_complete(&mut self, ratio: f64);

    fn id(&self) -> &TweenId {
        &self.core().id
    }

    fn duration(&self) -> f64 {
        self.core().duration
    }

    fn is_canceled(&self) -> bool {
        self.core().canceled.is_canceled()
    }

    fn cancel_token(&self) -> CancelToken {
        self.core().canceled.clone()
    }

    /// Idempotent. Subsequent updates are no-ops.
    fn cancel(&mut self) {
        self.core().canceled.cancel();
    }

    fn time_source(&self) -> Option<TimeSource> {
        self.core().time_source
    }

    /// Attach the driving time source. Fails if one is already attached.
    fn set_time_source(&mut self, source: TimeSource) -> Result<()> {
        self.core_mut().attach(source)
    }

    fn time_source_start(&mut self, directory: &ExclusivityDirectory) {
        self.core().register(directory);
    }

    fn time_source_stop(&mut self, directory: &ExclusivityDirectory) {
        self.core().unregister(directory);
    }

    fn loop_begin(&mut self) {
        self.core_mut().loop_begin();
    }

    fn loop_end(&mut self) {
        self.core_mut().loop_end();
    }

    fn update(&mut self, time_code: f64) {
        if self.is_canceled() {
            return;
        }
        let ratio = self.core().progress(time_code);
        self.apply_percent_complete(ratio);
    }

    fn with_id(mut self, id: impl Into<TweenId>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().id = id.into();
        self
    }

    fn on_loop_begin(mut self, hook: impl FnMut() + Send + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().on_loop_begin = Some(Box::new(hook));
        self
    }

    fn on_loop_end(mut self, hook: impl FnMut() + Send + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().on_loop_end = Some(Box::new(hook));
        self
    }
}

/// A tween that hands each eased ratio to an apply function.
pub struct BasicTween {
    core: TweenCore,
    apply: Box<dyn FnMut(f64) + Send>,
}

impl fmt::Debug for BasicTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicTween")
            .field("core", &self.core)
            .finish()
    }
}

impl BasicTween {
    pub fn new(
        duration: f64,
        easing: Easing,
        apply: impl FnMut(f64) + Send + 'static,
    ) -> Result<Self> {
        Ok(Self {
            core: TweenCore::new(duration, easing)?,
            apply: Box::new(apply),
        })
    }

    /// Interpolate between the bound values and write the result into `property`.
    pub fn property<T: Interpolatable>(
        property: impl Property<T>,
        interpolator: BoundInterpolator<T>,
        duration: f64,
        easing: Easing,
    ) -> Result<Self> {
        Self::new(duration, easing, move |ratio| {
            property.set(interpolator.at(ratio))
        })
    }
}

impl Tween for BasicTween {
    fn core(&self) -> &TweenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TweenCore {
        &mut self.core
    }

    fn apply_percent_complete(&mut self, ratio: f64) {
        (self.apply)(ratio)
    }
}
