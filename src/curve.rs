//! Curve primitives: lines, quadratics, conics and cubics.
//!
//! The polynomial curves are `kurbo`'s; [`Conic`] fills in the rational case.
//! [`Curve`] is a closed sum over the four, and everything downstream matches
//! on it exhaustively.

use std::ops::Range;

use arrayvec::ArrayVec;
use kurbo::{
    CubicBez, Line, ParamCurve, ParamCurveArea, ParamCurveDeriv, ParamCurveExtrema,
    ParamCurveNearest, PathEl, Point, QuadBez, Rect, Vec2,
};

mod conic;

pub use conic::Conic;

/// One of the two coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The horizontal axis.
    X,
    /// The vertical axis.
    Y,
}

impl Axis {
    /// Picks out this axis's coordinate of a point.
    pub fn of(self, p: Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// Picks out this axis's coordinate of a vector.
    pub fn of_vec(self, v: Vec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// The other axis.
    pub fn flip(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// A parametric curve over `t` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Curve {
    /// A line segment.
    Line(Line),
    /// A quadratic Bézier.
    Quad(QuadBez),
    /// A rational quadratic Bézier.
    Conic(Conic),
    /// A cubic Bézier.
    Cubic(CubicBez),
}

impl From<Line> for Curve {
    fn from(l: Line) -> Self {
        Curve::Line(l)
    }
}

impl From<QuadBez> for Curve {
    fn from(q: QuadBez) -> Self {
        Curve::Quad(q)
    }
}

impl From<Conic> for Curve {
    fn from(c: Conic) -> Self {
        Curve::Conic(c)
    }
}

impl From<CubicBez> for Curve {
    fn from(c: CubicBez) -> Self {
        Curve::Cubic(c)
    }
}

impl Curve {
    /// The point at `t = 0`.
    pub fn start(&self) -> Point {
        match self {
            Curve::Line(l) => l.p0,
            Curve::Quad(q) => q.p0,
            Curve::Conic(c) => c.p0,
            Curve::Cubic(c) => c.p0,
        }
    }

    /// The point at `t = 1`.
    pub fn end(&self) -> Point {
        match self {
            Curve::Line(l) => l.p1,
            Curve::Quad(q) => q.p2,
            Curve::Conic(c) => c.p2,
            Curve::Cubic(c) => c.p3,
        }
    }

    /// Evaluates the curve.
    pub fn point_at(&self, t: f64) -> Point {
        match self {
            Curve::Line(l) => l.eval(t),
            Curve::Quad(q) => q.eval(t),
            Curve::Conic(c) => c.eval(t),
            Curve::Cubic(c) => c.eval(t),
        }
    }

    /// The derivative with respect to `t`.
    pub fn derivative_at(&self, t: f64) -> Vec2 {
        match self {
            Curve::Line(l) => l.p1 - l.p0,
            Curve::Quad(q) => q.deriv().eval(t).to_vec2(),
            Curve::Conic(c) => c.deriv(t),
            Curve::Cubic(c) => c.deriv().eval(t).to_vec2(),
        }
    }

    /// Splits the curve in two at `t`. The halves share the split point exactly.
    ///
    /// Conic halves are put back in standard form, which changes their
    /// parametrization; see [`Curve::param_of_subsegment`].
    pub fn split_at(&self, t: f64) -> (Curve, Curve) {
        let (a, b): (Curve, Curve) = match self {
            Curve::Line(l) => (l.subsegment(0.0..t).into(), l.subsegment(t..1.0).into()),
            Curve::Quad(q) => (q.subsegment(0.0..t).into(), q.subsegment(t..1.0).into()),
            Curve::Conic(c) => {
                let (a, b) = c.split(t);
                (a.into(), b.into())
            }
            Curve::Cubic(c) => (c.subsegment(0.0..t).into(), c.subsegment(t..1.0).into()),
        };
        let mid = self.point_at(t);
        (
            a.with_endpoints(self.start(), mid),
            b.with_endpoints(mid, self.end()),
        )
    }

    /// The piece of this curve between two parameters.
    pub fn subsegment(&self, range: Range<f64>) -> Curve {
        match self {
            Curve::Line(l) => l.subsegment(range).into(),
            Curve::Quad(q) => q.subsegment(range).into(),
            Curve::Conic(c) => c.subsegment(range).into(),
            Curve::Cubic(c) => c.subsegment(range).into(),
        }
    }

    /// Maps the parameter `s` of `self.subsegment(range)` back to a parameter
    /// of `self`. This is linear except for conics.
    pub fn param_of_subsegment(&self, range: Range<f64>, s: f64) -> f64 {
        match self {
            Curve::Conic(c) => c.param_of_subsegment(range, s),
            _ => range.start + (range.end - range.start) * s,
        }
    }

    /// Maps a parameter `t` of `self` to the matching parameter of
    /// `self.subsegment(range)`.
    pub fn param_in_subsegment(&self, range: Range<f64>, t: f64) -> f64 {
        match self {
            Curve::Conic(c) => c.param_in_subsegment(range, t),
            _ => (t - range.start) / (range.end - range.start),
        }
    }

    /// The same curve with its endpoints moved.
    ///
    /// We use this to snap curves onto shared vertices; the moves are tiny, so
    /// the control points are left alone.
    pub fn with_endpoints(&self, start: Point, end: Point) -> Curve {
        match *self {
            Curve::Line(_) => Line::new(start, end).into(),
            Curve::Quad(q) => QuadBez::new(start, q.p1, end).into(),
            Curve::Conic(c) => Conic::new(start, c.p1, end, c.weight).into(),
            Curve::Cubic(c) => CubicBez::new(start, c.p1, c.p2, end).into(),
        }
    }

    /// A tight axis-aligned bounding box.
    pub fn bounding_box(&self) -> Rect {
        match self {
            Curve::Line(l) => l.bounding_box(),
            Curve::Quad(q) => q.bounding_box(),
            Curve::Conic(c) => c.bounding_box(),
            Curve::Cubic(c) => c.bounding_box(),
        }
    }

    /// The control points, starting with the start point and ending with the end point.
    pub fn control_points(&self) -> ArrayVec<Point, 4> {
        let mut ret = ArrayVec::new();
        match *self {
            Curve::Line(l) => ret.extend([l.p0, l.p1]),
            Curve::Quad(q) => ret.extend([q.p0, q.p1, q.p2]),
            Curve::Conic(c) => ret.extend([c.p0, c.p1, c.p2]),
            Curve::Cubic(c) => ret.extend([c.p0, c.p1, c.p2, c.p3]),
        }
        ret
    }

    /// The same curve, traversed in the other direction.
    pub fn reverse(&self) -> Curve {
        match *self {
            Curve::Line(l) => Line::new(l.p1, l.p0).into(),
            Curve::Quad(q) => QuadBez::new(q.p2, q.p1, q.p0).into(),
            Curve::Conic(c) => c.reverse().into(),
            Curve::Cubic(c) => CubicBez::new(c.p3, c.p2, c.p1, c.p0).into(),
        }
    }

    /// Parameters strictly inside `(0, 1)` where `x` or `y` has a local extremum, sorted.
    pub fn extrema(&self) -> ArrayVec<f64, 4> {
        match self {
            Curve::Line(_) => ArrayVec::new(),
            Curve::Quad(q) => q.extrema().into_iter().collect(),
            Curve::Conic(c) => c.extrema(),
            Curve::Cubic(c) => c.extrema().into_iter().collect(),
        }
    }

    /// Finds the parameter of the closest point on the curve to `p`, along with
    /// the distance (not squared) to it.
    pub fn nearest(&self, p: Point, accuracy: f64) -> (f64, f64) {
        let (t, dist_sq) = match self {
            Curve::Line(l) => {
                let n = l.nearest(p, accuracy);
                (n.t, n.distance_sq)
            }
            Curve::Quad(q) => {
                let n = q.nearest(p, accuracy);
                (n.t, n.distance_sq)
            }
            Curve::Conic(c) => c.nearest(p, accuracy),
            Curve::Cubic(c) => {
                let n = c.nearest(p, accuracy);
                (n.t, n.distance_sq)
            }
        };
        (t, dist_sq.sqrt())
    }

    /// The signed area swept between this curve and the origin.
    ///
    /// Summed over a closed contour, this is the contour's signed area:
    /// positive when it runs counter-clockwise in a y-up frame.
    pub fn signed_area(&self) -> f64 {
        match self {
            Curve::Line(l) => l.signed_area(),
            Curve::Quad(q) => q.signed_area(),
            Curve::Conic(c) => c.signed_area(),
            Curve::Cubic(c) => c.signed_area(),
        }
    }

    /// The direction the curve leaves its start point.
    ///
    /// If the first control points coincide (so the derivative vanishes), we
    /// look further along the control polygon.
    pub fn start_tangent(&self) -> Vec2 {
        let pts = self.control_points();
        pts.iter()
            .skip(1)
            .map(|p| *p - pts[0])
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or(Vec2::ZERO)
    }

    /// The direction the curve travels as it arrives at its end point.
    pub fn end_tangent(&self) -> Vec2 {
        let pts = self.control_points();
        let last = pts[pts.len() - 1];
        pts.iter()
            .rev()
            .skip(1)
            .map(|p| last - *p)
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or(Vec2::ZERO)
    }

    /// Does the whole curve fit in a disc of radius `eps` around its start?
    pub fn is_degenerate(&self, eps: f64) -> bool {
        let start = self.start();
        self.control_points()
            .iter()
            .all(|p| (*p - start).hypot() <= eps)
    }

    /// Are all the control points within `eps` of the chord?
    ///
    /// For such a curve the image is (up to `eps`) a segment, although the
    /// parametrization may not be uniform and may even double back.
    pub fn is_line_like(&self, eps: f64) -> bool {
        let (start, end) = (self.start(), self.end());
        let chord = end - start;
        let len = chord.hypot();
        if len <= eps {
            return self.is_degenerate(eps);
        }
        self.control_points()
            .iter()
            .all(|p| (chord.cross(*p - start) / len).abs() <= eps)
    }

    /// The curve as a cubic, if it is polynomial.
    ///
    /// Degree raising keeps the parametrization, so parameters on the cubic are
    /// parameters on the original.
    pub fn to_cubic(&self) -> Option<CubicBez> {
        match *self {
            Curve::Line(l) => Some(CubicBez::new(
                l.p0,
                l.p0.lerp(l.p1, 1.0 / 3.0),
                l.p0.lerp(l.p1, 2.0 / 3.0),
                l.p1,
            )),
            Curve::Quad(q) => Some(q.raise()),
            Curve::Conic(_) => None,
            Curve::Cubic(c) => Some(c),
        }
    }

    /// Finds where a cubic crosses itself.
    ///
    /// Returns the two parameters `s < t` with `point_at(s) == point_at(t)`, if
    /// both are inside `[0, 1]`. Lines, quadratics and conics never self-intersect.
    pub fn self_intersection(&self) -> Option<(f64, f64)> {
        let Curve::Cubic(c) = self else {
            return None;
        };
        let (p0, p1, p2, p3) = (c.p0.to_vec2(), c.p1.to_vec2(), c.p2.to_vec2(), c.p3.to_vec2());
        // Power basis: a t^3 + b t^2 + c t + d.
        let a = -p0 + p1 * 3.0 - p2 * 3.0 + p3;
        let b = p0 * 3.0 - p1 * 6.0 + p2 * 3.0;
        let cc = (p1 - p0) * 3.0;

        // B(s) - B(t) = (s - t) (a (s^2 + st + t^2) + b (s + t) + c), so with
        // u = s + t and v = st we need a (u^2 - v) + b u + c = 0. Crossing with
        // `a` eliminates v.
        let ab = a.cross(b);
        let scale = a.hypot() * b.hypot();
        if ab.abs() <= scale * 1e-12 || ab == 0.0 {
            return None;
        }
        let u = -a.cross(cc) / ab;
        let v = if a.x.abs() >= a.y.abs() {
            u * u + (b.x * u + cc.x) / a.x
        } else {
            u * u + (b.y * u + cc.y) / a.y
        };
        let disc = u * u - 4.0 * v;
        if disc.is_nan() || disc <= 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let s = 0.5 * (u - root);
        let t = 0.5 * (u + root);
        if s < 0.0 || t > 1.0 || t - s <= 1e-9 {
            return None;
        }
        let size = self.bounding_box().size();
        if (self.point_at(s) - self.point_at(t)).hypot() > 1e-6 * (size.width + size.height) {
            return None;
        }
        Some((s, t))
    }

    /// The parameter where a curve that's monotonic along `axis` reaches the
    /// coordinate `value`.
    ///
    /// `value` should lie between the endpoint coordinates; otherwise the
    /// nearer endpoint's parameter is returned.
    pub fn monotonic_t_at(&self, axis: Axis, value: f64) -> f64 {
        let a0 = axis.of(self.start());
        let a1 = axis.of(self.end());
        if a0 == a1 {
            return 0.0;
        }
        let increasing = a1 > a0;
        let (mut lo, mut hi) = (0.0f64, 1.0f64);
        for _ in 0..64 {
            let mid = 0.5 * (lo + hi);
            let v = axis.of(self.point_at(mid));
            if (v < value) == increasing {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= f64::EPSILON {
                break;
            }
        }
        0.5 * (lo + hi)
    }

    /// The path element that draws this curve from its start point.
    ///
    /// Conics have no `kurbo` equivalent, so they come out as several quadratics.
    pub fn to_path_els(&self) -> ArrayVec<PathEl, 8> {
        let mut ret = ArrayVec::new();
        match *self {
            Curve::Line(l) => ret.push(PathEl::LineTo(l.p1)),
            Curve::Quad(q) => ret.push(PathEl::QuadTo(q.p1, q.p2)),
            Curve::Conic(c) => {
                ret.extend(c.to_quads(3).into_iter().map(|q| PathEl::QuadTo(q.p1, q.p2)))
            }
            Curve::Cubic(c) => ret.push(PathEl::CurveTo(c.p1, c.p2, c.p3)),
        }
        ret
    }

    /// Are all the control points finite?
    pub fn is_finite(&self) -> bool {
        let weight_ok = match self {
            Curve::Conic(c) => c.weight.is_finite() && c.weight > 0.0,
            _ => true,
        };
        weight_ok && self.control_points().iter().all(|p| p.is_finite())
    }

    /// Are any of the control points NaN?
    pub fn is_nan(&self) -> bool {
        let weight_nan = match self {
            Curve::Conic(c) => c.weight.is_nan(),
            _ => false,
        };
        weight_nan || self.control_points().iter().any(|p| p.is_nan())
    }
}
