//! Property tweening: easing, interpolation, clocks, timelines and per context tickers.

mod animate;
mod clock;
mod completion;
mod context;
mod directory;
mod easing;
mod interpolatable;
mod interpolator;
mod property;
mod ticker;
mod timeline;
mod tween;

pub use animate::*;
pub use clock::*;
pub use completion::Completion;
pub use context::*;
pub use directory::*;
pub use easing::*;
pub use interpolatable::*;
pub use interpolator::*;
pub use property::*;
pub use ticker::{FrameSignal, Ticker};
pub use timeline::*;
pub use tween::*;
