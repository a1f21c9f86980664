//! Small numerical helpers: a sortable float and polynomial root finding.

use arrayvec::ArrayVec;
use kurbo::common::solve_cubic;

/// A wrapper for `f64` that implements `Ord`.
///
/// This is only used for sorting parameters and angles that we have already
/// checked to be finite, so it orders by [`f64::total_cmp`] and doesn't bother
/// with any NaN handling.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl CheapOrderedFloat {
    /// Unwraps the float.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(x: f64) -> Self {
        CheapOrderedFloat(x)
    }
}

impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Evaluates `c0 + c1 x + c2 x^2 + c3 x^3`.
pub(crate) fn eval_cubic(c0: f64, c1: f64, c2: f64, c3: f64, x: f64) -> f64 {
    ((c3 * x + c2) * x + c1) * x + c0
}

// Tries to solve a cubic, but only looks for accurate solutions in the interval [0.0, 1.0].
//
// This doesn't actually filter out solutions outside that interval, it only
// makes some tweaks for better numerical stability inside it.
pub(crate) fn solve_cubic_in_unit_interval(c0: f64, c1: f64, c2: f64, c3: f64) -> ArrayVec<f64, 3> {
    // For t in the unit interval, a leading coefficient that is tiny compared to
    // the others changes the value of the cubic by much less than the error we'd
    // get from the badly-conditioned cubic formula, so drop it. The original
    // coefficients come back in for the Newton polish below.
    let mut new_c3 = c3;
    let mut new_c2 = c2;
    if c3.abs() < c2.abs().max(c1.abs()).max(c0.abs()) / 1e7 {
        new_c3 = 0.0;
        if c2.abs() < c1.abs().max(c0.abs()) / 1e7 {
            new_c2 = 0.0;
        }
    }
    let mut roots = solve_cubic(c0, c1, new_c2, new_c3);

    for x in &mut roots {
        let mut val = eval_cubic(c0, c1, c2, c3, *x);
        let mut deriv = (3.0 * c3 * *x + 2.0 * c2) * *x + c1;
        for _ in 0..3 {
            if val.abs() <= 1e-14 || deriv == 0.0 {
                break;
            }

            // Near a double root the Newton step blows up even though the value
            // is already tiny, so never move by more than sqrt(|val|).
            let step = val / deriv;
            let step = step.abs().min(val.abs().sqrt()).copysign(step);
            *x -= step;

            val = eval_cubic(c0, c1, c2, c3, *x);
            deriv = (3.0 * c3 * *x + 2.0 * c2) * *x + c1;
        }
    }
    roots
}

/// Finds the roots of `c0 + c1 t + c2 t^2 + c3 t^3` in `[0, 1]`.
///
/// Roots that fall outside the interval by at most `slop` are clamped onto it,
/// so that intersections at curve endpoints aren't lost to rounding. The roots
/// are sorted and deduplicated.
pub(crate) fn unit_roots(c0: f64, c1: f64, c2: f64, c3: f64, slop: f64) -> ArrayVec<f64, 3> {
    let mut ret: ArrayVec<f64, 3> = solve_cubic_in_unit_interval(c0, c1, c2, c3)
        .into_iter()
        .filter(|t| t.is_finite() && *t >= -slop && *t <= 1.0 + slop)
        .map(|t| t.clamp(0.0, 1.0))
        .collect();
    ret.sort_by(f64::total_cmp);
    let mut deduped = ArrayVec::new();
    for t in ret {
        if deduped.last() != Some(&t) {
            deduped.push(t);
        }
    }
    deduped
}

/// Solves the 2x2 linear system `[a b] x = r` (with `a`, `b` as columns).
///
/// Returns `None` if the system is too close to singular.
pub(crate) fn solve_2x2(a: kurbo::Vec2, b: kurbo::Vec2, r: kurbo::Vec2) -> Option<(f64, f64)> {
    let det = a.cross(b);
    let scale = a.hypot() * b.hypot();
    if det.abs() <= scale * 1e-12 || !det.is_finite() {
        return None;
    }
    Some((r.cross(b) / det, a.cross(r) / det))
}
