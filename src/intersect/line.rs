//! Closed-form intersections involving a line.

use arrayvec::ArrayVec;
use kurbo::Line;

use super::Hit;
use crate::{curve::Curve, num::unit_roots};

/// Intersects two lines.
///
/// Parallel lines have no intersections here; collinear overlaps are found by
/// the coincidence check, and touching endpoints by the endpoint check.
pub(crate) fn line_line(a: Line, b: Line, eps: f64) -> Vec<Hit> {
    let da = a.p1 - a.p0;
    let db = b.p1 - b.p0;
    let (len_a, len_b) = (da.hypot(), db.hypot());
    let denom = da.cross(db);
    if len_a == 0.0 || len_b == 0.0 || denom.abs() <= f64::EPSILON * len_a * len_b {
        return Vec::new();
    }

    let w = b.p0 - a.p0;
    let s = w.cross(db) / denom;
    let t = w.cross(da) / denom;
    let (slop_s, slop_t) = (eps / len_a, eps / len_b);
    if (-slop_s..=1.0 + slop_s).contains(&s) && (-slop_t..=1.0 + slop_t).contains(&t) {
        vec![Hit::crossing(s.clamp(0.0, 1.0), t.clamp(0.0, 1.0))]
    } else {
        Vec::new()
    }
}

/// Intersects a line with a curve, returning parameters on the line first.
///
/// The signed distance from the line is a polynomial along the curve (for a
/// conic, its numerator is), so the crossings are the roots of that
/// polynomial. Places where the distance has a local extremum within `eps` of
/// zero are reported too, since those are near-tangencies that rounding could
/// otherwise lose.
pub(crate) fn line_curve(l: Line, c: &Curve, eps: f64, slop: f64) -> Vec<Hit> {
    let d = l.p1 - l.p0;
    let len = d.hypot();
    if len == 0.0 {
        return Vec::new();
    }
    let n = d / len;
    let dist = |p: kurbo::Point| n.cross(p - l.p0);

    // Power-basis coefficients of the (numerator of the) distance.
    let (c0, c1, c2, c3) = match *c {
        Curve::Line(m) => {
            let (y0, y1) = (dist(m.p0), dist(m.p1));
            (y0, y1 - y0, 0.0, 0.0)
        }
        Curve::Quad(q) => {
            let (y0, y1, y2) = (dist(q.p0), dist(q.p1), dist(q.p2));
            (y0, 2.0 * (y1 - y0), y0 - 2.0 * y1 + y2, 0.0)
        }
        Curve::Conic(k) => {
            let (y0, y1, y2) = (dist(k.p0), dist(k.p1), dist(k.p2));
            let w = k.weight;
            (y0, 2.0 * (w * y1 - y0), y0 - 2.0 * w * y1 + y2, 0.0)
        }
        Curve::Cubic(cb) => {
            let (y0, y1, y2, y3) = (dist(cb.p0), dist(cb.p1), dist(cb.p2), dist(cb.p3));
            (
                y0,
                3.0 * (y1 - y0),
                3.0 * (y2 - 2.0 * y1 + y0),
                y3 - 3.0 * y2 + 3.0 * y1 - y0,
            )
        }
    };

    let mut params: ArrayVec<f64, 6> = unit_roots(c0, c1, c2, c3, slop).into_iter().collect();
    for t in unit_roots(c1, 2.0 * c2, 3.0 * c3, 0.0, 0.0) {
        if dist(c.point_at(t)).abs() <= eps {
            params.push(t);
        }
    }

    let slop_s = eps / len;
    params
        .into_iter()
        .filter_map(|t| {
            let s = (c.point_at(t) - l.p0).dot(n) / len;
            (-slop_s..=1.0 + slop_s)
                .contains(&s)
                .then(|| Hit::crossing(s.clamp(0.0, 1.0), t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use kurbo::{CubicBez, Point};

    use super::*;

    #[test]
    fn parallel() {
        let a = Line::new((0.0, 0.0), (1.0, 0.0));
        let b = Line::new((0.0, 1.0), (1.0, 1.0));
        assert!(line_line(a, b, 1e-9).is_empty());
    }

    #[test]
    fn barely_missing() {
        let a = Line::new((0.0, 0.0), (1.0, 0.0));
        let b = Line::new((1.0 + 1e-3, -1.0), (1.0 + 1e-3, 1.0));
        assert!(line_line(a, b, 1e-9).is_empty());
        // Within tolerance, the hit is clamped onto the end.
        let hits = line_line(a, b, 1e-2);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ta, 1.0);
    }

    #[test]
    fn cubic_crossings() {
        // An S-shaped cubic crosses the x axis three times.
        let c: Curve = CubicBez::new((0.0, -1.0), (1.0, 3.0), (2.0, -3.0), (3.0, 1.0)).into();
        let l = Line::new((-1.0, 0.0), (4.0, 0.0));
        let hits = line_curve(l, &c, 1e-9, 1e-9);
        assert_eq!(hits.len(), 3);
        for h in hits {
            let p = c.point_at(h.tb);
            assert!(p.y.abs() < 1e-9);
            assert!((l.p0.lerp(l.p1, h.ta) - p).hypot() < 1e-9);
        }
    }

    #[test]
    fn conic_crossing() {
        let k = crate::curve::Conic::new((1.0, 0.0), (1.0, 1.0), (0.0, 1.0), std::f64::consts::FRAC_1_SQRT_2);
        let l = Line::new((0.0, 0.0), (1.0, 1.0));
        let hits = line_curve(l, &k.into(), 1e-9, 1e-9);
        assert_eq!(hits.len(), 1);
        let r = std::f64::consts::FRAC_1_SQRT_2;
        assert!((k.eval(hits[0].tb) - Point::new(r, r)).hypot() < 1e-12);
    }
}
