use anyhow::{Result, bail};

use crate::Interpolatable;

/// Collects the bounds of an interpolation once and turns them into a ratio-only function.
///
/// Bounds can be bound exactly once. A second [`bind`](Self::bind) is a programming error and
/// fails instead of silently replacing the bounds.
#[derive(Debug)]
pub struct InterpolatorBuilder<T> {
    bounds: Option<(T, T)>,
}

impl<T> Default for InterpolatorBuilder<T> {
    fn default() -> Self {
        Self { bounds: None }
    }
}

impl<T: Interpolatable> InterpolatorBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, start: T, end: T) -> Result<&mut Self> {
        if self.bounds.is_some() {
            bail!("Interpolator bounds are already bound");
        }
        self.bounds = Some((start, end));
        Ok(self)
    }

    pub fn is_bound(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Result<(&T, &T)> {
        match &self.bounds {
            Some((start, end)) => Ok((start, end)),
            None => bail!("Interpolator bounds were read before they were bound"),
        }
    }

    pub fn build(self) -> Result<BoundInterpolator<T>> {
        let Some((start, end)) = self.bounds else {
            bail!("Interpolator was built before its bounds were bound");
        };
        Ok(BoundInterpolator { start, end })
    }
}

/// An interpolation with fixed bounds.
#[derive(Debug, Clone)]
pub struct BoundInterpolator<T> {
    start: T,
    end: T,
}

impl<T: Interpolatable> BoundInterpolator<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> &T {
        &self.start
    }

    pub fn end(&self) -> &T {
        &self.end
    }

    pub fn at(&self, ratio: f64) -> T {
        T::interpolate(&self.start, &self.end, ratio)
    }
}
