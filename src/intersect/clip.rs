//! Iterative curve-curve intersection: fat-line clipping for polynomial
//! curves, and plain bounding-box subdivision for everything else.
//!
//! Both run over an explicit work list of pairs of sub-curves, so that deep
//! searches can't overflow the stack and are bounded by
//! [`OpOptions::max_clip_steps`] and [`OpOptions::max_clip_depth`].

use kurbo::{CubicBez, Line, ParamCurve, ParamCurveExtrema, ParamCurveNearest, Point, Rect, Vec2};

use super::{boxes_overlap, line::line_line, Exhausted, Hit};
use crate::{curve::Curve, options::OpOptions};

type Domain = (f64, f64);

fn at(dom: Domain, t: f64) -> f64 {
    dom.0 + (dom.1 - dom.0) * t
}

fn mid(dom: Domain) -> f64 {
    0.5 * (dom.0 + dom.1)
}

fn is_small(r: Rect, eps: f64) -> bool {
    r.width() <= eps && r.height() <= eps
}

fn diagonal(r: Rect) -> f64 {
    r.width().hypot(r.height())
}

/// The band around a curve's chord that contains its control polygon.
struct FatLine {
    origin: Point,
    normal: Vec2,
    d_min: f64,
    d_max: f64,
}

impl FatLine {
    /// Returns `None` if the chord is too short to give a useful direction.
    fn new(c: &CubicBez, eps: f64) -> Option<FatLine> {
        let chord = c.p3 - c.p0;
        let len = chord.hypot();
        if len <= eps {
            return None;
        }
        let normal = Vec2::new(-chord.y, chord.x) / len;
        let d1 = normal.dot(c.p1 - c.p0);
        let d2 = normal.dot(c.p2 - c.p0);
        Some(FatLine {
            origin: c.p0,
            normal,
            d_min: 0f64.min(d1).min(d2) - eps,
            d_max: 0f64.max(d1).max(d2) + eps,
        })
    }

    /// The range of parameters of `c` that might be inside this band, or
    /// `None` if `c` certainly misses it.
    ///
    /// The graph of the distance from the chord is a cubic Bézier function
    /// with control values `d_i` at `t = i / 3`, so it lies in the convex hull
    /// of those four points. The hull's intersection with the band is convex,
    /// and its extreme parameters are attained either at a control point inside
    /// the band or where a segment between two control points crosses the
    /// band's boundary.
    fn clip(&self, c: &CubicBez) -> Option<Domain> {
        let d = [c.p0, c.p1, c.p2, c.p3].map(|p| self.normal.dot(p - self.origin));
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for i in 0..4 {
            let ti = i as f64 / 3.0;
            if d[i] >= self.d_min && d[i] <= self.d_max {
                lo = lo.min(ti);
                hi = hi.max(ti);
            }
            for j in (i + 1)..4 {
                let tj = j as f64 / 3.0;
                for bound in [self.d_min, self.d_max] {
                    if (d[i] - bound) * (d[j] - bound) < 0.0 {
                        let t = ti + (tj - ti) * (bound - d[i]) / (d[j] - d[i]);
                        lo = lo.min(t);
                        hi = hi.max(t);
                    }
                }
            }
        }
        (lo <= hi).then_some((lo.max(0.0), hi.min(1.0)))
    }
}

// Intersects two pieces that are both straight to within `eps`, by
// intersecting their chords. If the chords are parallel and within `eps` of one
// another, the pieces are touching tangentially and we report the middle.
//
// The returned parameters are the pieces' own.
fn flat_hits(a: &Curve, b: &Curve, eps: f64) -> Vec<(f64, f64)> {
    let la = Line::new(a.start(), a.end());
    let lb = Line::new(b.start(), b.end());
    let hits = line_line(la, lb, eps);
    let mut out = Vec::with_capacity(hits.len().max(1));
    if hits.is_empty() {
        let m = la.eval(0.5);
        let n = lb.nearest(m, eps);
        if n.distance_sq.sqrt() <= eps {
            let (ta, _) = a.nearest(m, 0.1 * eps);
            let (tb, _) = b.nearest(lb.eval(n.t), 0.1 * eps);
            out.push((ta, tb));
        }
    }
    for h in hits {
        // Chord parameters aren't curve parameters, so project back.
        let (ta, _) = a.nearest(la.eval(h.ta), 0.1 * eps);
        let (tb, _) = b.nearest(lb.eval(h.tb), 0.1 * eps);
        out.push((ta, tb));
    }
    out
}

/// Finds approximate intersections of two cubics by fat-line clipping.
///
/// Each step clips each curve against the other's fat line. When that fails
/// to shrink either parameter range by at least 20%, the larger curve is
/// split in half instead.
pub(crate) fn clip_cubics(a: CubicBez, b: CubicBez, opts: &OpOptions) -> Result<Vec<Hit>, Exhausted> {
    let eps = opts.point_tolerance;
    let mut out = Vec::new();
    let mut work = vec![(a, (0.0, 1.0), b, (0.0, 1.0), 0u32)];
    let mut steps = 0;

    while let Some((mut ca, mut da, mut cb, mut db, depth)) = work.pop() {
        steps += 1;
        if steps > opts.max_clip_steps || depth > opts.max_clip_depth {
            return Err(Exhausted {
                steps,
                near: ca.eval(0.5),
            });
        }

        let (ba, bb) = (ca.bounding_box(), cb.bounding_box());
        if !boxes_overlap(ba, bb, eps) {
            continue;
        }
        if is_small(ba, eps) && is_small(bb, eps) {
            out.push(Hit::crossing(mid(da), mid(db)));
            continue;
        }
        let (curve_a, curve_b) = (Curve::from(ca), Curve::from(cb));
        if curve_a.is_line_like(eps) && curve_b.is_line_like(eps) {
            for (ta, tb) in flat_hits(&curve_a, &curve_b, eps) {
                out.push(Hit::crossing(at(da, ta), at(db, tb)));
            }
            continue;
        }

        let (old_a, old_b) = (da.1 - da.0, db.1 - db.0);
        if let Some(fat) = FatLine::new(&cb, eps) {
            let Some((t0, t1)) = fat.clip(&ca) else {
                continue;
            };
            da = (at(da, t0), at(da, t1));
            ca = ca.subsegment(t0..t1);
        }
        if let Some(fat) = FatLine::new(&ca, eps) {
            let Some((t0, t1)) = fat.clip(&cb) else {
                continue;
            };
            db = (at(db, t0), at(db, t1));
            cb = cb.subsegment(t0..t1);
        }

        let shrunk = (da.1 - da.0) < 0.8 * old_a || (db.1 - db.0) < 0.8 * old_b;
        if shrunk {
            work.push((ca, da, cb, db, depth));
        } else if diagonal(ca.bounding_box()) >= diagonal(cb.bounding_box()) {
            let m = mid(da);
            work.push((ca.subsegment(0.0..0.5), (da.0, m), cb, db, depth + 1));
            work.push((ca.subsegment(0.5..1.0), (m, da.1), cb, db, depth + 1));
        } else {
            let m = mid(db);
            work.push((ca, da, cb.subsegment(0.0..0.5), (db.0, m), depth + 1));
            work.push((ca, da, cb.subsegment(0.5..1.0), (m, db.1), depth + 1));
        }
    }
    Ok(out)
}

/// Finds approximate intersections of any two curves by splitting whichever
/// is larger until the pieces are flat or tiny.
///
/// Pieces are always cut from the original curves, so that their parameters
/// can be mapped back exactly even for conics, whose pieces are
/// reparametrized.
pub(crate) fn subdivide(a: &Curve, b: &Curve, opts: &OpOptions) -> Result<Vec<Hit>, Exhausted> {
    let eps = opts.point_tolerance;
    let mut out = Vec::new();
    let mut work = vec![((0.0, 1.0), (0.0, 1.0), 0u32)];
    let mut steps = 0;

    while let Some((da, db, depth)) = work.pop() {
        steps += 1;
        if steps > opts.max_clip_steps || depth > 2 * opts.max_clip_depth {
            return Err(Exhausted {
                steps,
                near: a.point_at(mid(da)),
            });
        }

        let (ca, cb) = (a.subsegment(da.0..da.1), b.subsegment(db.0..db.1));
        let (ba, bb) = (ca.bounding_box(), cb.bounding_box());
        if !boxes_overlap(ba, bb, eps) {
            continue;
        }
        if is_small(ba, eps) && is_small(bb, eps) {
            out.push(Hit::crossing(mid(da), mid(db)));
            continue;
        }
        if ca.is_line_like(eps) && cb.is_line_like(eps) {
            for (ta, tb) in flat_hits(&ca, &cb, eps) {
                out.push(Hit::crossing(
                    a.param_of_subsegment(da.0..da.1, ta),
                    b.param_of_subsegment(db.0..db.1, tb),
                ));
            }
            continue;
        }

        if diagonal(ba) >= diagonal(bb) {
            let m = mid(da);
            work.push(((da.0, m), db, depth + 1));
            work.push(((m, da.1), db, depth + 1));
        } else {
            let m = mid(db);
            work.push((da, (db.0, m), depth + 1));
            work.push((da, (m, db.1), depth + 1));
        }
    }
    Ok(out)
}
