#![forbid(unsafe_code)]

//! Timing curves.
//!
//! The eased curves are the standard cubic Bézier timing functions with
//! endpoints fixed at `(0, 0)` and `(1, 1)`:
//!
//! | Curve | Control points |
//! |-------|----------------|
//! | `EaseIn` | `(0.42, 0.0)`, `(1.0, 1.0)` |
//! | `EaseOut` | `(0.0, 0.0)`, `(0.58, 1.0)` |
//! | `EaseInOut` | `(0.42, 0.0)`, `(0.58, 1.0)` |

/// Animation timing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Curve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 40;
const EPSILON: f64 = 1e-7;

impl Curve {
    /// Bézier control points `(x1, y1, x2, y2)`.
    #[must_use]
    pub const fn control_points(self) -> (f64, f64, f64, f64) {
        match self {
            Self::Linear => (0.0, 0.0, 1.0, 1.0),
            Self::EaseIn => (0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => (0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => (0.42, 0.0, 0.58, 1.0),
        }
    }

    /// Map linear progress `t` in `[0, 1]` to eased progress.
    ///
    /// Input outside `[0, 1]` is clamped.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            _ => {
                let (x1, y1, x2, y2) = self.control_points();
                let s = solve_parameter(t, x1, x2);
                bezier(s, y1, y2)
            }
        }
    }
}

/// One coordinate of a cubic Bézier with `P0 = 0` and `P3 = 1`.
fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

fn bezier_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * p1 + 6.0 * u * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Find the curve parameter whose x coordinate is `x`.
fn solve_parameter(x: f64, x1: f64, x2: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let error = bezier(s, x1, x2) - x;
        if error.abs() < EPSILON {
            return s;
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= error / slope;
    }

    // x(s) is monotonic for control x in [0, 1]; bisection always converges.
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier(s, x1, x2);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Curve; 4] = [Curve::Linear, Curve::EaseIn, Curve::EaseOut, Curve::EaseInOut];

    #[test]
    fn endpoints_are_fixed() {
        for curve in ALL {
            assert!(curve.apply(0.0).abs() < 1e-6, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6, "{curve:?} at 1");
        }
    }

    #[test]
    fn linear_is_identity() {
        assert_eq!(Curve::Linear.apply(0.25), 0.25);
    }

    #[test]
    fn ease_in_starts_slow_and_ease_out_starts_fast() {
        assert!(Curve::EaseIn.apply(0.25) < 0.25);
        assert!(Curve::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let a = Curve::EaseInOut.apply(0.3);
        let b = Curve::EaseInOut.apply(0.7);
        assert!((a + b - 1.0).abs() < 1e-4);
        assert!((Curve::EaseInOut.apply(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Curve::EaseIn.apply(-3.0), Curve::EaseIn.apply(0.0));
        assert_eq!(Curve::EaseOut.apply(7.0), Curve::EaseOut.apply(1.0));
        assert_eq!(Curve::Linear.apply(f64::NAN), 0.0);
    }

    proptest! {
        #[test]
        fn curves_are_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for curve in ALL {
                prop_assert!(curve.apply(lo) <= curve.apply(hi) + 1e-6);
            }
        }
    }
}
