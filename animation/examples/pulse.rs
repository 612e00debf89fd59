//! Drives a ticker at 60 frames per second and logs a pulsing scale and a color fade.
//!
//! Run with `RUST_LOG=debug` to see the scheduler at work.

use anyhow::Result;
use log::info;
use tempo_animation::{
    AnimationContext, BasicTween, BoundInterpolator, Clock, ClockConfig, Easing,
    ExclusivityDirectory, Property, SharedValue, Ticker, Timeline, animate,
};
use tempo_geometry::Color;

const FRAME: f64 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::init();

    let ticker = Ticker::new();
    let context = AnimationContext::new("host", ExclusivityDirectory::new());
    context.activate(ticker.clone());

    let scale = SharedValue::new(1.0);
    let grow = BasicTween::property(
        scale.clone(),
        BoundInterpolator::new(1.0, 1.5),
        0.4,
        Easing::BackOut,
    )?;
    let settle = BasicTween::property(
        scale.clone(),
        BoundInterpolator::new(1.5, 1.0),
        0.3,
        Easing::QuadraticIn,
    )?;
    let pulse = Timeline::builder()
        .add(0.0, grow)
        .add(0.4, settle)
        .with_id("pulse")
        .create()?;

    let clock = Clock::new(
        pulse,
        ClockConfig::default()
            .with_iterations(3)
            .with_iteration_delay(0.1),
    )?;
    let _pulsing = clock.start(&context);

    let color = SharedValue::new(Color::BLACK);
    let _fading = animate(color.clone(), Color::rgb_u32(0x3080ff))
        .over(1.5)
        .with(Easing::SineInOut)
        .start(&context)?;

    let mut frame = 0;
    while ticker.wants_frames() {
        ticker.update(FRAME);
        frame += 1;
        if frame % 6 == 0 {
            info!("frame {frame:>3}: scale {:.3}, color {:?}", scale.get(), color.get());
        }
    }
    info!("idle after {frame} frames");
    Ok(())
}
