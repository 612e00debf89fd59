//! Easing curves mapping a progress ratio in `[0, 1]` to an output ratio.
//!
//! Every built-in curve maps `0` to `0` and `1` to `1`. Inputs outside `[0, 1]` are clamped, but
//! outputs may leave `[0, 1]`: the elastic and back families overshoot on purpose.
//!
//! Curves adapted from: <https://github.com/pistondevelopers/interpolation> version 0.3.0

use std::f64::consts::{FRAC_PI_2, PI};

#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, Default)]
pub enum Easing {
    #[default]
    Linear,

    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,

    CubicIn,
    CubicOut,
    CubicInOut,

    QuarticIn,
    QuarticOut,
    QuarticInOut,

    QuinticIn,
    QuinticOut,
    QuinticInOut,

    SineIn,
    SineOut,
    SineInOut,

    CircularIn,
    CircularOut,
    CircularInOut,

    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,

    ElasticIn,
    ElasticOut,
    ElasticInOut,

    BackIn,
    BackOut,
    BackInOut,

    BounceIn,
    BounceOut,
    BounceInOut,

    /// A caller supplied curve. It is invoked with the unclamped ratio.
    Custom(fn(f64) -> f64),
}

impl Easing {
    pub fn apply(self, ratio: f64) -> f64 {
        use Easing::*;

        let p = ratio.clamp(0.0, 1.0);
        match self {
            Linear => p,

            QuadraticIn => p * p,
            QuadraticOut => -(p * (p - 2.0)),
            QuadraticInOut => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    (-2.0 * p * p) + (4.0 * p) - 1.0
                }
            }

            CubicIn => p * p * p,
            CubicOut => {
                let f = p - 1.0;
                f * f * f + 1.0
            }
            CubicInOut => {
                if p < 0.5 {
                    4.0 * p * p * p
                } else {
                    let f = (2.0 * p) - 2.0;
                    0.5 * f * f * f + 1.0
                }
            }

            QuarticIn => p * p * p * p,
            QuarticOut => {
                let f = p - 1.0;
                f * f * f * (1.0 - p) + 1.0
            }
            QuarticInOut => {
                if p < 0.5 {
                    8.0 * p * p * p * p
                } else {
                    let f = p - 1.0;
                    -8.0 * f * f * f * f + 1.0
                }
            }

            QuinticIn => p * p * p * p * p,
            QuinticOut => {
                let f = p - 1.0;
                f * f * f * f * f + 1.0
            }
            QuinticInOut => {
                if p < 0.5 {
                    16.0 * p * p * p * p * p
                } else {
                    let f = (2.0 * p) - 2.0;
                    0.5 * f * f * f * f * f + 1.0
                }
            }

            SineIn => ((p - 1.0) * FRAC_PI_2).sin() + 1.0,
            SineOut => (p * FRAC_PI_2).sin(),
            SineInOut => 0.5 * (1.0 - (p * PI).cos()),

            CircularIn => 1.0 - (1.0 - (p * p)).sqrt(),
            CircularOut => ((2.0 - p) * p).sqrt(),
            CircularInOut => {
                if p < 0.5 {
                    0.5 * (1.0 - (1.0 - 4.0 * (p * p)).sqrt())
                } else {
                    0.5 * ((-((2.0 * p) - 3.0) * ((2.0 * p) - 1.0)).sqrt() + 1.0)
                }
            }

            ExponentialIn => {
                if p <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * (p - 1.0))
                }
            }
            ExponentialOut => {
                if p >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * p)
                }
            }
            ExponentialInOut => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else if p < 0.5 {
                    0.5 * 2f64.powf((20.0 * p) - 10.0)
                } else {
                    -0.5 * 2f64.powf((-20.0 * p) + 10.0) + 1.0
                }
            }

            ElasticIn => elastic_in(p),
            ElasticOut => elastic_out(p),
            ElasticInOut => {
                if p < 0.5 {
                    0.5 * elastic_in(2.0 * p)
                } else {
                    0.5 * elastic_out(2.0 * p - 1.0) + 0.5
                }
            }

            BackIn => back_in(p),
            BackOut => 1.0 - back_in(1.0 - p),
            BackInOut => {
                if p < 0.5 {
                    0.5 * back_in(2.0 * p)
                } else {
                    0.5 * (1.0 - back_in(1.0 - (2.0 * p - 1.0))) + 0.5
                }
            }

            BounceIn => 1.0 - bounce_out(1.0 - p),
            BounceOut => bounce_out(p),
            BounceInOut => {
                if p < 0.5 {
                    0.5 * (1.0 - bounce_out(1.0 - p * 2.0))
                } else {
                    0.5 * bounce_out(p * 2.0 - 1.0) + 0.5
                }
            }

            Custom(f) => f(ratio),
        }
    }

    /// All built-in curves, useful for exhaustive checks.
    pub const BUILT_IN: [Easing; 31] = {
        use Easing::*;
        [
            Linear,
            QuadraticIn,
            QuadraticOut,
            QuadraticInOut,
            CubicIn,
            CubicOut,
            CubicInOut,
            QuarticIn,
            QuarticOut,
            QuarticInOut,
            QuinticIn,
            QuinticOut,
            QuinticInOut,
            SineIn,
            SineOut,
            SineInOut,
            CircularIn,
            CircularOut,
            CircularInOut,
            ExponentialIn,
            ExponentialOut,
            ExponentialInOut,
            ElasticIn,
            ElasticOut,
            ElasticInOut,
            BackIn,
            BackOut,
            BackInOut,
            BounceIn,
            BounceOut,
            BounceInOut,
        ]
    };
}

fn elastic_in(p: f64) -> f64 {
    (13.0 * FRAC_PI_2 * p).sin() * 2f64.powf(10.0 * (p - 1.0))
}

fn elastic_out(p: f64) -> f64 {
    (-13.0 * FRAC_PI_2 * (p + 1.0)).sin() * 2f64.powf(-10.0 * p) + 1.0
}

fn back_in(p: f64) -> f64 {
    p * p * p - p * (p * PI).sin()
}

fn bounce_out(p: f64) -> f64 {
    if p < 4.0 / 11.0 {
        (121.0 * p * p) / 16.0
    } else if p < 8.0 / 11.0 {
        (363.0 / 40.0 * p * p) - (99.0 / 10.0 * p) + 17.0 / 5.0
    } else if p < 9.0 / 10.0 {
        (4356.0 / 361.0 * p * p) - (35442.0 / 1805.0 * p) + 16061.0 / 1805.0
    } else {
        (54.0 / 5.0 * p * p) - (513.0 / 25.0 * p) + 268.0 / 25.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn built_in_curves_are_anchored_at_both_ends() {
        for easing in Easing::BUILT_IN {
            assert_abs_diff_eq!(easing.apply(0.0), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(easing.apply(1.0), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn inputs_outside_the_unit_interval_are_clamped() {
        for easing in Easing::BUILT_IN {
            assert_abs_diff_eq!(easing.apply(-0.5), easing.apply(0.0), epsilon = 1e-12);
            assert_abs_diff_eq!(easing.apply(1.5), easing.apply(1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn overshooting_curves_leave_the_unit_interval() {
        let overshoots = |easing: Easing| {
            (1..100)
                .map(|i| easing.apply(i as f64 / 100.0))
                .any(|v| !(0.0..=1.0).contains(&v))
        };
        assert!(overshoots(Easing::ElasticOut));
        assert!(overshoots(Easing::BackIn));
        assert!(!overshoots(Easing::CubicInOut));
    }

    #[test]
    fn custom_curve_sees_the_raw_ratio() {
        let easing = Easing::Custom(|r| r * 2.0);
        assert_eq!(easing.apply(1.5), 3.0);
    }
}
