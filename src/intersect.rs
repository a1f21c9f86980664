//! Finding where edges meet.
//!
//! Candidate pairs come from a sweep over the edges' bounding boxes. Each pair
//! is first checked for coincidence (the two edges running along each other),
//! then handed to a solver that depends on the kinds of curve involved: closed
//! forms for lines, fat-line clipping for polynomial curves, and bounding-box
//! subdivision when a conic is involved. Every candidate is polished with a
//! few Newton steps, and near-duplicates are merged.

use kurbo::{Point, Rect, Vec2};

use crate::{
    curve::Curve,
    edges::{EdgeIdx, Edges},
    num::{solve_2x2, CheapOrderedFloat},
    options::OpOptions,
    Error,
};

mod clip;
mod coincident;
mod line;

/// What happens at an intersection.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum IntersectionKind {
    /// The edges cross transversally.
    Crossing,
    /// The edges meet with (nearly) the same tangent direction.
    Tangent,
    /// The edges run along each other, from the intersection's parameters up
    /// to these ones.
    Coincident {
        /// The end of the coincident run on the first edge.
        ta_end: f64,
        /// The end of the coincident run on the second edge.
        tb_end: f64,
    },
}

/// A point where two edges meet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Intersection {
    /// The first edge.
    pub a: EdgeIdx,
    /// The parameter on the first edge.
    pub ta: f64,
    /// The second edge.
    pub b: EdgeIdx,
    /// The parameter on the second edge.
    pub tb: f64,
    /// The meeting point.
    pub point: Point,
    /// What happens there.
    pub kind: IntersectionKind,
}

/// The intersections, indexed by [`IntersectionIdx`].
#[derive(Clone)]
pub struct IntersectionVec<T> {
    inner: Vec<T>,
}
impl_typed_vec!(IntersectionVec, IntersectionIdx, "i");

/// All the intersections between the edges of an operation.
#[derive(Clone, Debug, Default)]
pub struct IntersectionTable {
    records: IntersectionVec<Intersection>,
}

impl IntersectionTable {
    /// Iterates over the intersections.
    pub fn iter(&self) -> impl Iterator<Item = (IntersectionIdx, &Intersection)> + '_ {
        self.records.iter()
    }

    /// The number of intersections.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Are there no intersections at all?
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::ops::Index<IntersectionIdx> for IntersectionTable {
    type Output = Intersection;

    fn index(&self, index: IntersectionIdx) -> &Self::Output {
        &self.records[index]
    }
}

/// An intersection between two curves, in terms of their parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hit {
    pub ta: f64,
    pub tb: f64,
    pub kind: IntersectionKind,
}

impl Hit {
    pub(crate) fn crossing(ta: f64, tb: f64) -> Hit {
        Hit {
            ta,
            tb,
            kind: IntersectionKind::Crossing,
        }
    }

    fn swapped(self) -> Hit {
        let kind = match self.kind {
            IntersectionKind::Coincident { ta_end, tb_end } => IntersectionKind::Coincident {
                ta_end: tb_end,
                tb_end: ta_end,
            },
            k => k,
        };
        Hit {
            ta: self.tb,
            tb: self.ta,
            kind,
        }
    }
}

// The intersection search for one pair of curves ran out of budget.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Exhausted {
    pub steps: usize,
    pub near: Point,
}

impl From<Exhausted> for Error {
    fn from(e: Exhausted) -> Self {
        Error::Convergence {
            steps: e.steps,
            near: e.near,
        }
    }
}

/// Do two rectangles overlap, after inflating by `eps`? Touching counts.
pub(crate) fn boxes_overlap(a: Rect, b: Rect, eps: f64) -> bool {
    a.x0 <= b.x1 + eps && b.x0 <= a.x1 + eps && a.y0 <= b.y1 + eps && b.y0 <= a.y1 + eps
}

// Neighboring monotonic edges whose boxes only touch along a line can only
// meet at their shared endpoint, which is already a vertex.
fn only_share_endpoint(edges: &Edges, a: EdgeIdx, b: EdgeIdx) -> bool {
    if !edges.are_contour_neighbors(a, b) {
        return false;
    }
    let (ra, rb) = (edges[a].bbox, edges[b].bbox);
    let w = ra.x1.min(rb.x1) - ra.x0.max(rb.x0);
    let h = ra.y1.min(rb.y1) - ra.y0.max(rb.y0);
    let thin_x = w <= 0.0 && !(ra.width() == 0.0 && rb.width() == 0.0);
    let thin_y = h <= 0.0 && !(ra.height() == 0.0 && rb.height() == 0.0);
    thin_x || thin_y
}

/// Finds all the intersections between edges.
pub fn find_intersections(edges: &Edges, opts: &OpOptions) -> Result<IntersectionTable, Error> {
    let eps = opts.point_tolerance;
    let mut order: Vec<EdgeIdx> = edges.indices().collect();
    order.sort_by_key(|&e| CheapOrderedFloat::from(edges[e].bbox.x0));

    let mut table = IntersectionTable::default();
    let mut active: Vec<EdgeIdx> = Vec::new();
    let mut pairs = 0;
    for &e in &order {
        let bbox = edges[e].bbox;
        active.retain(|&other| edges[other].bbox.x1 + eps >= bbox.x0);
        for &other in &active {
            if !boxes_overlap(edges[other].bbox, bbox, eps) {
                continue;
            }
            let (a, b) = if other < e { (other, e) } else { (e, other) };
            if only_share_endpoint(edges, a, b) {
                continue;
            }
            pairs += 1;
            let hits = intersect_curves(&edges[a].curve, &edges[b].curve, opts).map_err(|e| {
                log::warn!("gave up intersecting {a:?} and {b:?} after {} steps", e.steps);
                e
            })?;
            for hit in hits {
                table.records.push(Intersection {
                    a,
                    ta: hit.ta,
                    b,
                    tb: hit.tb,
                    point: edges[a].curve.point_at(hit.ta),
                    kind: hit.kind,
                });
            }
        }
        active.push(e);
    }

    for x in edges.self_crossings() {
        table.records.push(Intersection {
            a: x.first,
            ta: x.first_t,
            b: x.second,
            tb: x.second_t,
            point: edges[x.first].curve.point_at(x.first_t),
            kind: IntersectionKind::Crossing,
        });
    }

    log::debug!(
        "{} candidate pairs, {} intersections",
        pairs,
        table.records.len()
    );
    Ok(table)
}

/// Finds the intersections between two curves.
///
/// The hits are sorted by the parameter on `a`. A coincident run is reported
/// as a single hit.
pub(crate) fn intersect_curves(a: &Curve, b: &Curve, opts: &OpOptions) -> Result<Vec<Hit>, Exhausted> {
    let eps = opts.point_tolerance;
    if let Some(run) = coincident::find_run(a, b, eps) {
        return Ok(vec![run]);
    }

    let mut candidates = match (a, b) {
        (Curve::Line(la), Curve::Line(lb)) => line::line_line(*la, *lb, eps),
        (Curve::Line(la), other) => line::line_curve(*la, other, eps, opts.param_tolerance),
        (other, Curve::Line(lb)) => line::line_curve(*lb, other, eps, opts.param_tolerance)
            .into_iter()
            .map(Hit::swapped)
            .collect(),
        _ => match (a.to_cubic(), b.to_cubic()) {
            (Some(ca), Some(cb)) => clip::clip_cubics(ca, cb, opts)?,
            _ => clip::subdivide(a, b, opts)?,
        },
    };
    for c in &mut candidates {
        let (ta, tb) = refine(a, b, c.ta, c.tb);
        c.ta = ta;
        c.tb = tb;
    }

    // Endpoints that lie on the other curve.
    let accuracy = 0.1 * eps;
    for ta in [0.0, 1.0] {
        let (tb, dist) = b.nearest(a.point_at(ta), accuracy);
        if dist <= eps {
            candidates.push(Hit::crossing(ta, tb));
        }
    }
    for tb in [0.0, 1.0] {
        let (ta, dist) = a.nearest(b.point_at(tb), accuracy);
        if dist <= eps {
            candidates.push(Hit::crossing(ta, tb));
        }
    }

    let mut hits = merge_hits(a, b, candidates, eps);
    for h in &mut hits {
        h.kind = classify(a, b, h.ta, h.tb, opts.tangent_tolerance);
    }
    Ok(hits)
}

// Snaps parameters within `slop` of the ends of the unit interval onto them.
fn snap(t: f64, slop: f64) -> f64 {
    if t <= slop {
        0.0
    } else if t >= 1.0 - slop {
        1.0
    } else {
        t
    }
}

/// Polishes an approximate intersection with Newton's method on `a(s) - b(t)`.
///
/// Steps that don't reduce the distance are rejected, so this never makes
/// things worse.
pub(crate) fn refine(a: &Curve, b: &Curve, ta: f64, tb: f64) -> (f64, f64) {
    let residual = |s: f64, t: f64| (a.point_at(s) - b.point_at(t)).hypot();
    let (mut s, mut t) = (ta, tb);
    let mut res = residual(s, t);
    for _ in 0..8 {
        if res == 0.0 {
            break;
        }
        let f = a.point_at(s) - b.point_at(t);
        let Some((ds, dt)) = solve_2x2(a.derivative_at(s), -b.derivative_at(t), -f) else {
            break;
        };
        let (ns, nt) = ((s + ds).clamp(0.0, 1.0), (t + dt).clamp(0.0, 1.0));
        let new_res = residual(ns, nt);
        if new_res.is_nan() || new_res >= res {
            break;
        }
        (s, t, res) = (ns, nt, new_res);
    }
    (s, t)
}

fn tangent_at(c: &Curve, t: f64) -> Vec2 {
    let d = c.derivative_at(t);
    if d.hypot2() > 0.0 {
        d
    } else if t < 0.5 {
        c.start_tangent()
    } else {
        c.end_tangent()
    }
}

/// Decides whether two curves cross or touch at the given parameters.
pub(crate) fn classify(a: &Curve, b: &Curve, ta: f64, tb: f64, tolerance: f64) -> IntersectionKind {
    let da = tangent_at(a, ta);
    let db = tangent_at(b, tb);
    let norm = da.hypot() * db.hypot();
    if norm == 0.0 || (da.cross(db) / norm).abs() <= tolerance {
        IntersectionKind::Tangent
    } else {
        IntersectionKind::Crossing
    }
}

// Merges candidates that are the same point on both curves, keeping the one
// with the smallest residual.
fn merge_hits(a: &Curve, b: &Curve, mut candidates: Vec<Hit>, eps: f64) -> Vec<Hit> {
    let residual = |h: &Hit| (a.point_at(h.ta) - b.point_at(h.tb)).hypot();
    candidates.retain(|h| h.ta.is_finite() && h.tb.is_finite() && residual(h) <= 2.0 * eps);
    for h in &mut candidates {
        h.ta = snap(h.ta, 1e-12);
        h.tb = snap(h.tb, 1e-12);
    }
    candidates.sort_by_key(|h| CheapOrderedFloat::from(residual(h)));

    let mut ret: Vec<Hit> = Vec::with_capacity(candidates.len());
    for h in candidates {
        let (pa, pb) = (a.point_at(h.ta), b.point_at(h.tb));
        let dup = ret.iter().any(|kept| {
            (a.point_at(kept.ta) - pa).hypot() <= eps && (b.point_at(kept.tb) - pb).hypot() <= eps
        });
        if !dup {
            ret.push(h);
        }
    }
    ret.sort_by_key(|h| CheapOrderedFloat::from(h.ta));
    ret
}

#[cfg(test)]
mod tests {
    use kurbo::{CubicBez, Line, QuadBez};

    use super::*;
    use crate::{curve::Conic, path::Path};

    fn opts() -> OpOptions {
        OpOptions::default()
    }

    #[test]
    fn crossing_lines() {
        let a: Curve = Line::new((0.0, 0.0), (2.0, 2.0)).into();
        let b: Curve = Line::new((0.0, 2.0), (2.0, 0.0)).into();
        let hits = intersect_curves(&a, &b, &opts()).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].ta - 0.5).abs() < 1e-12);
        assert!((hits[0].tb - 0.5).abs() < 1e-12);
        assert_eq!(hits[0].kind, IntersectionKind::Crossing);
    }

    #[test]
    fn touching_endpoints() {
        let a: Curve = Line::new((0.0, 0.0), (1.0, 0.0)).into();
        let b: Curve = Line::new((1.0, 0.0), (1.0, 1.0)).into();
        let hits = intersect_curves(&a, &b, &opts()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].ta, hits[0].tb), (1.0, 0.0));
    }

    #[test]
    fn cubic_cubic() {
        // Two arches crossing each other twice.
        let a: Curve = CubicBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 2.0), (3.0, 0.0)).into();
        let b: Curve = CubicBez::new((0.0, 1.0), (1.0, -1.0), (2.0, -1.0), (3.0, 1.0)).into();
        let hits = intersect_curves(&a, &b, &opts()).unwrap();
        assert_eq!(hits.len(), 2);
        for h in &hits {
            assert!((a.point_at(h.ta) - b.point_at(h.tb)).hypot() < 1e-9);
            assert_eq!(h.kind, IntersectionKind::Crossing);
        }
        // By symmetry, they're mirror images about x = 1.5.
        let (p, q) = (a.point_at(hits[0].ta), a.point_at(hits[1].ta));
        assert!((p.x + q.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn quad_line_tangent() {
        let q: Curve = QuadBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0)).into();
        let l: Curve = Line::new((0.0, 1.0), (2.0, 1.0)).into();
        let hits = intersect_curves(&l, &q, &opts()).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].tb - 0.5).abs() < 1e-6);
        assert_eq!(hits[0].kind, IntersectionKind::Tangent);
    }

    #[test]
    fn conic_cubic() {
        let k: Curve = Conic::new((1.0, 0.0), (1.0, 1.0), (0.0, 1.0), std::f64::consts::FRAC_1_SQRT_2).into();
        let c: Curve = CubicBez::new((0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (1.5, 1.5)).into();
        let hits = intersect_curves(&k, &c, &opts()).unwrap();
        assert_eq!(hits.len(), 1);
        let p = k.point_at(hits[0].ta);
        let r = std::f64::consts::FRAC_1_SQRT_2;
        assert!((p - Point::new(r, r)).hypot() < 1e-7);
    }

    #[test]
    fn coincident_lines() {
        let a: Curve = Line::new((0.0, 0.0), (4.0, 0.0)).into();
        let b: Curve = Line::new((3.0, 0.0), (1.0, 0.0)).into();
        let hits = intersect_curves(&a, &b, &opts()).unwrap();
        assert_eq!(hits.len(), 1);
        let h = hits[0];
        assert_eq!(
            h.kind,
            IntersectionKind::Coincident {
                ta_end: 0.75,
                tb_end: 0.0
            }
        );
        assert_eq!((h.ta, h.tb), (0.25, 1.0));
    }

    #[test]
    fn whole_table() {
        // Two overlapping squares meet at two points.
        let mut a = Path::new();
        a.move_to((0.0, 0.0)).line_to((2.0, 0.0)).line_to((2.0, 2.0)).line_to((0.0, 2.0)).close();
        let mut b = Path::new();
        b.move_to((1.0, 1.0)).line_to((3.0, 1.0)).line_to((3.0, 3.0)).line_to((1.0, 3.0)).close();
        let edges = Edges::from_paths(&a, Some(&b), &opts());
        let table = find_intersections(&edges, &opts()).unwrap();
        let mut points: Vec<_> = table
            .iter()
            .filter(|(_, x)| edges[x.a].operand != edges[x.b].operand)
            .map(|(_, x)| (x.point.x, x.point.y))
            .collect();
        points.sort_by(|p, q| p.partial_cmp(q).unwrap());
        assert_eq!(points, vec![(1.0, 2.0), (2.0, 1.0)]);
    }

    #[test]
    fn budget() {
        let a: Curve = CubicBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 2.0), (3.0, 0.0)).into();
        let b: Curve = CubicBez::new((0.0, 1.0), (1.0, -1.0), (2.0, -1.0), (3.0, 1.0)).into();
        let stingy = OpOptions {
            max_clip_steps: 1,
            ..opts()
        };
        assert!(intersect_curves(&a, &b, &stingy).is_err());
    }
}
