//! One-shot property animations.
//!
//! ```ignore
//! let done = animate(opacity.clone(), 1.0)
//!     .over(0.3)
//!     .with(Easing::CubicOut)
//!     .start(&context)?;
//! ```

use anyhow::{Result, anyhow, ensure};

use crate::{
    AnimationContext, BasicTween, Clock, ClockConfig, Completion, Easing, Interpolatable,
    InterpolatorBuilder, Property, Tween, TweenId, completion::completion,
};

/// Animate `property` from its current value to `target`.
pub fn animate<T, P>(property: P, target: T) -> PropertyAnimation<T, P>
where
    T: Interpolatable,
    P: Property<T>,
{
    PropertyAnimation {
        property,
        target,
        duration: 0.0,
        easing: Easing::default(),
        id: None,
        config: ClockConfig::default(),
    }
}

#[derive(Debug)]
pub struct PropertyAnimation<T, P> {
    property: P,
    target: T,
    duration: f64,
    easing: Easing,
    id: Option<TweenId>,
    config: ClockConfig,
}

impl<T, P> PropertyAnimation<T, P>
where
    T: Interpolatable,
    P: Property<T>,
{
    pub fn over(self, duration: f64) -> Self {
        Self { duration, ..self }
    }

    pub fn with(self, easing: Easing) -> Self {
        Self { easing, ..self }
    }

    pub fn id(self, id: impl Into<TweenId>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    pub fn clock(self, config: ClockConfig) -> Self {
        Self { config, ..self }
    }

    /// Schedules the animation to start at the beginning of the next frame of `context`.
    ///
    /// The start value is read from the property at that time. Invalid durations fail right away,
    /// a missing ticker fails the returned completion.
    pub fn start(self, context: &AnimationContext) -> Result<Completion> {
        ensure!(
            self.duration.is_finite() && self.duration >= 0.0,
            "Animation duration must be finite and not negative, got {}",
            self.duration
        );
        let Some(ticker) = context.active_ticker() else {
            return Ok(Completion::failed(anyhow!(
                "No active ticker in context `{}`",
                context.name()
            )));
        };

        let (completer, completion) = completion();
        let context = context.clone();
        ticker.next_frame(move || match self.into_clock() {
            Ok(clock) => clock.start_with(&context, completer),
            Err(e) => completer.fail(e),
        });
        Ok(completion)
    }

    fn into_clock(self) -> Result<Clock> {
        let mut interpolator = InterpolatorBuilder::new();
        interpolator.bind(self.property.get(), self.target)?;
        let mut tween = BasicTween::property(
            self.property,
            interpolator.build()?,
            self.duration,
            self.easing,
        )?;
        if let Some(id) = self.id {
            tween = tween.with_id(id);
        }
        Clock::new(tween, self.config)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;
    use crate::{ExclusivityDirectory, SharedValue, Ticker};
    use tempo_geometry::{Color, Vector3};

    fn setup() -> (Ticker, AnimationContext) {
        let ticker = Ticker::new();
        let context = AnimationContext::new("client", ExclusivityDirectory::new());
        context.activate(ticker.clone());
        (ticker, context)
    }

    #[test]
    fn animates_from_the_current_value_on_the_next_frame() {
        let (ticker, context) = setup();
        let value = SharedValue::new(2.0);
        let mut completion = animate(value.clone(), 10.0)
            .over(1.0)
            .start(&context)
            .unwrap();

        // Changed before the animation started, this becomes the start value.
        value.set(0.0);
        assert_eq!(ticker.pending_callbacks(), 1);
        assert_eq!(ticker.clock_count(), 0);

        ticker.update(0.5);
        assert_eq!(value.get(), 5.0);
        assert!((&mut completion).now_or_never().is_none());

        ticker.update(0.5);
        assert_eq!(value.get(), 10.0);
        assert!(completion.now_or_never().unwrap().is_ok());
        assert!(!ticker.is_subscribed());
    }

    #[test]
    fn animates_vectors_and_colors() {
        let (ticker, context) = setup();
        let position = SharedValue::new(Vector3::ZERO);
        let color = SharedValue::new(Color::BLACK);
        let _a = animate(position.clone(), Vector3::new(2.0, 4.0, 6.0))
            .over(2.0)
            .start(&context)
            .unwrap();
        let _b = animate(color.clone(), Color::WHITE)
            .over(2.0)
            .start(&context)
            .unwrap();

        ticker.update(1.0);
        assert_eq!(position.get(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(color.get(), Color::rgb(0.5, 0.5, 0.5));
    }

    #[test]
    fn invalid_duration_fails_immediately() {
        let (ticker, context) = setup();
        let result = animate(SharedValue::new(0.0), 1.0)
            .over(f64::NAN)
            .start(&context);
        assert!(result.is_err());
        assert_eq!(ticker.pending_callbacks(), 0);
    }

    #[test]
    fn missing_ticker_fails_the_completion() {
        let context = AnimationContext::new("detached", ExclusivityDirectory::new());
        let completion = animate(SharedValue::new(0.0), 1.0)
            .over(1.0)
            .start(&context)
            .unwrap();
        assert!(completion.now_or_never().unwrap().is_err());
    }
}
