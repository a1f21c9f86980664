//! Detecting curves that run along each other.

use arrayvec::ArrayVec;

use super::{Hit, IntersectionKind};
use crate::curve::Curve;

const SAMPLES: usize = 8;

/// Looks for a stretch where `a` and `b` stay within `eps` of each other.
///
/// At least two of the four endpoints must lie on the other curve; those
/// bound the stretch, which is then sampled from both sides to rule out
/// curves that merely meet at two points. Since edges are monotonic, two edges
/// can share at most one such stretch.
pub(crate) fn find_run(a: &Curve, b: &Curve, eps: f64) -> Option<Hit> {
    let accuracy = 0.1 * eps;
    let mut ends: ArrayVec<(f64, f64), 4> = ArrayVec::new();
    for ta in [0.0, 1.0] {
        let (tb, dist) = b.nearest(a.point_at(ta), accuracy);
        if dist <= eps {
            ends.push((ta, tb));
        }
    }
    for tb in [0.0, 1.0] {
        let (ta, dist) = a.nearest(b.point_at(tb), accuracy);
        if dist <= eps {
            ends.push((ta, tb));
        }
    }
    if ends.len() < 2 {
        return None;
    }

    // The two ends that are furthest apart along `a`.
    let (lo, hi) = ends.iter().fold((ends[0], ends[0]), |(lo, hi), &e| {
        (
            if e.0 < lo.0 { e } else { lo },
            if e.0 > hi.0 { e } else { hi },
        )
    });
    if (a.point_at(lo.0) - a.point_at(hi.0)).hypot() <= eps
        || (b.point_at(lo.1) - b.point_at(hi.1)).hypot() <= eps
    {
        return None;
    }

    let tol = 2.0 * eps;
    for i in 1..SAMPLES {
        let f = i as f64 / SAMPLES as f64;
        let ta = lo.0 + (hi.0 - lo.0) * f;
        if b.nearest(a.point_at(ta), accuracy).1 > tol {
            return None;
        }
        let tb = lo.1 + (hi.1 - lo.1) * f;
        if a.nearest(b.point_at(tb), accuracy).1 > tol {
            return None;
        }
    }

    Some(Hit {
        ta: lo.0,
        tb: lo.1,
        kind: IntersectionKind::Coincident {
            ta_end: hi.0,
            tb_end: hi.1,
        },
    })
}

#[cfg(test)]
mod tests {
    use kurbo::{CubicBez, Line, ParamCurve};

    use super::*;

    #[test]
    fn overlapping_pieces_of_one_cubic() {
        let c = CubicBez::new((0.0, 0.0), (1.0, 2.0), (3.0, 3.0), (4.0, 3.5));
        let a: Curve = c.subsegment(0.0..0.6).into();
        let b: Curve = c.subsegment(0.4..1.0).into();
        let hit = find_run(&a, &b, 1e-9).unwrap();
        let IntersectionKind::Coincident { ta_end, tb_end } = hit.kind else {
            panic!("not coincident");
        };
        assert!((a.point_at(hit.ta) - c.eval(0.4)).hypot() < 1e-7);
        assert!((a.point_at(ta_end) - c.eval(0.6)).hypot() < 1e-7);
        assert!(hit.tb.abs() < 1e-6);
        assert!((b.point_at(tb_end) - c.eval(0.6)).hypot() < 1e-7);
    }

    #[test]
    fn same_endpoints_different_paths() {
        let a: Curve = Line::new((0.0, 0.0), (3.0, 0.0)).into();
        let b: Curve = CubicBez::new((0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)).into();
        assert!(find_run(&a, &b, 1e-9).is_none());
    }

    #[test]
    fn touching_at_one_point() {
        let a: Curve = Line::new((0.0, 0.0), (1.0, 0.0)).into();
        let b: Curve = Line::new((1.0, 0.0), (2.0, 1.0)).into();
        assert!(find_run(&a, &b, 1e-9).is_none());
    }
}
