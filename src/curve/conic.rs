use arrayvec::ArrayVec;
use kurbo::{Point, QuadBez, Rect, Vec2};

/// A rational quadratic Bézier curve.
///
/// With `weight == 1` this is an ordinary quadratic; smaller weights give
/// elliptical arcs and larger weights hyperbolic ones. Weights must be positive,
/// which keeps the curve inside the triangle of its control points.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Conic {
    /// The start point.
    pub p0: Point,
    /// The control point.
    pub p1: Point,
    /// The end point.
    pub p2: Point,
    /// The weight of the control point.
    pub weight: f64,
}

// A control point in homogeneous coordinates: (x w, y w, w).
#[derive(Clone, Copy)]
struct Homogeneous {
    x: f64,
    y: f64,
    w: f64,
}

impl Homogeneous {
    fn new(p: Point, w: f64) -> Self {
        Homogeneous {
            x: p.x * w,
            y: p.y * w,
            w,
        }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Homogeneous {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            w: self.w + (other.w - self.w) * t,
        }
    }

    fn project(self) -> Point {
        Point::new(self.x / self.w, self.y / self.w)
    }
}

// Turns three homogeneous control points back into a conic in standard form
// (end weights equal to one).
fn from_homogeneous(a: Homogeneous, b: Homogeneous, c: Homogeneous) -> Conic {
    Conic {
        p0: a.project(),
        p1: b.project(),
        p2: c.project(),
        weight: b.w / (a.w * c.w).sqrt(),
    }
}

// Nodes and weights of 5-point Gauss-Legendre quadrature on [-1, 1].
const GAUSS_5: [(f64, f64); 5] = [
    (0.0, 0.568_888_888_888_888_9),
    (-0.538_469_310_105_683, 0.478_628_670_499_366_5),
    (0.538_469_310_105_683, 0.478_628_670_499_366_5),
    (-0.906_179_845_938_664, 0.236_926_885_056_189_1),
    (0.906_179_845_938_664, 0.236_926_885_056_189_1),
];

impl Conic {
    /// Creates a new conic.
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>, weight: f64) -> Self {
        Conic {
            p0: p0.into(),
            p1: p1.into(),
            p2: p2.into(),
            weight,
        }
    }

    fn denominator(&self, t: f64) -> f64 {
        let mt = 1.0 - t;
        mt * mt + 2.0 * self.weight * t * mt + t * t
    }

    fn numerator(&self, t: f64) -> Vec2 {
        let mt = 1.0 - t;
        self.p0.to_vec2() * (mt * mt)
            + self.p1.to_vec2() * (2.0 * self.weight * t * mt)
            + self.p2.to_vec2() * (t * t)
    }

    /// Evaluates the conic at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        (self.numerator(t) / self.denominator(t)).to_point()
    }

    /// The derivative with respect to `t`.
    pub fn deriv(&self, t: f64) -> Vec2 {
        let w = self.weight;
        let mt = 1.0 - t;
        let n = self.numerator(t);
        let d = self.denominator(t);
        let dn = self.p0.to_vec2() * (-2.0 * mt)
            + self.p1.to_vec2() * (2.0 * w * (1.0 - 2.0 * t))
            + self.p2.to_vec2() * (2.0 * t);
        let dd = -2.0 * mt + 2.0 * w * (1.0 - 2.0 * t) + 2.0 * t;
        (dn * d - n * dd) / (d * d)
    }

    /// Splits the conic in two at `t`.
    pub fn split(&self, t: f64) -> (Conic, Conic) {
        let a = Homogeneous::new(self.p0, 1.0);
        let b = Homogeneous::new(self.p1, self.weight);
        let c = Homogeneous::new(self.p2, 1.0);
        let ab = a.lerp(b, t);
        let bc = b.lerp(c, t);
        let mid = ab.lerp(bc, t);
        (from_homogeneous(a, ab, mid), from_homogeneous(mid, bc, c))
    }

    // The blossom of the homogeneous curve: `blossom(t, t)` is the point at
    // `t`, and `blossom(s, t)` is the control point of the piece on `s..t`.
    fn blossom(&self, s: f64, t: f64) -> Homogeneous {
        let a = Homogeneous::new(self.p0, 1.0);
        let b = Homogeneous::new(self.p1, self.weight);
        let c = Homogeneous::new(self.p2, 1.0);
        a.lerp(b, s).lerp(b.lerp(c, s), t)
    }

    /// The part of this conic between two parameters.
    ///
    /// The piece is in standard form, so its parameter is not a linear
    /// function of this conic's; see [`Conic::param_of_subsegment`].
    pub fn subsegment(&self, range: std::ops::Range<f64>) -> Conic {
        let (s, t) = (range.start, range.end);
        from_homogeneous(self.blossom(s, s), self.blossom(s, t), self.blossom(t, t))
    }

    // Putting a piece in standard form substitutes `u = k s / (1 - s + k s)`
    // for its linear parameter `u`, where `k^2` is the ratio of its end weights.
    fn subsegment_ratio(&self, range: &std::ops::Range<f64>) -> f64 {
        (self.denominator(range.start) / self.denominator(range.end)).sqrt()
    }

    /// Maps the parameter `s` of `self.subsegment(range)` to a parameter of `self`.
    pub fn param_of_subsegment(&self, range: std::ops::Range<f64>, s: f64) -> f64 {
        let k = self.subsegment_ratio(&range);
        let u = k * s / (1.0 - s + k * s);
        range.start + (range.end - range.start) * u
    }

    /// Maps a parameter `t` of `self` to the parameter of `self.subsegment(range)`.
    pub fn param_in_subsegment(&self, range: std::ops::Range<f64>, t: f64) -> f64 {
        let k = self.subsegment_ratio(&range);
        let u = (t - range.start) / (range.end - range.start);
        u / (k * (1.0 - u) + u)
    }

    /// The parameters (strictly inside `(0, 1)`) where either coordinate has
    /// a local extremum.
    pub fn extrema(&self) -> ArrayVec<f64, 4> {
        let mut ret = ArrayVec::new();
        for (a, b, c) in [
            (self.p0.x, self.p1.x, self.p2.x),
            (self.p0.y, self.p1.y, self.p2.y),
        ] {
            // The derivative of the coordinate vanishes where
            // (w - 1) p20 t^2 + (p20 - 2 w p10) t + w p10 = 0.
            let p20 = c - a;
            let p10 = b - a;
            let w = self.weight;
            let roots = crate::num::solve_cubic_in_unit_interval(
                w * p10,
                p20 - 2.0 * w * p10,
                (w - 1.0) * p20,
                0.0,
            );
            for t in roots {
                if t > 0.0 && t < 1.0 && ret.len() < 4 {
                    ret.push(t);
                }
            }
        }
        ret.sort_by(f64::total_cmp);
        ret
    }

    /// A tight axis-aligned bounding box.
    pub fn bounding_box(&self) -> Rect {
        let mut rect = Rect::from_points(self.p0, self.p2);
        for t in self.extrema() {
            rect = rect.union_pt(self.eval(t));
        }
        rect
    }

    /// Finds the parameter of the point on this conic closest to `p`, and the
    /// squared distance to it.
    pub fn nearest(&self, p: Point, accuracy: f64) -> (f64, f64) {
        const SAMPLES: usize = 16;
        let dist = |t: f64| (self.eval(t) - p).hypot2();
        let (mut best_t, mut best_d) = (0.0, dist(0.0));
        for i in 1..=SAMPLES {
            let t = i as f64 / SAMPLES as f64;
            let d = dist(t);
            if d < best_d {
                best_t = t;
                best_d = d;
            }
        }

        // Golden-section search around the best sample.
        let step = 1.0 / SAMPLES as f64;
        let (mut lo, mut hi) = ((best_t - step).max(0.0), (best_t + step).min(1.0));
        let phi = 0.5 * (5f64.sqrt() - 1.0);
        while hi - lo > accuracy.max(1e-12) {
            let m1 = hi - phi * (hi - lo);
            let m2 = lo + phi * (hi - lo);
            if dist(m1) < dist(m2) {
                hi = m2;
            } else {
                lo = m1;
            }
        }
        let t = 0.5 * (lo + hi);
        let d = dist(t);
        if d < best_d {
            (t, d)
        } else {
            (best_t, best_d)
        }
    }

    /// The signed area between the curve and the origin (Green's theorem).
    pub fn signed_area(&self) -> f64 {
        const PIECES: usize = 8;
        let mut sum = 0.0;
        for i in 0..PIECES {
            let a = i as f64 / PIECES as f64;
            let half = 0.5 / PIECES as f64;
            let mid = a + half;
            for (x, w) in GAUSS_5 {
                let t = mid + half * x;
                let p = self.eval(t);
                let d = self.deriv(t);
                sum += w * half * (p.x * d.y - p.y * d.x);
            }
        }
        0.5 * sum
    }

    /// The same conic, traversed backwards.
    pub fn reverse(&self) -> Conic {
        Conic {
            p0: self.p2,
            p1: self.p1,
            p2: self.p0,
            weight: self.weight,
        }
    }

    /// Approximates this conic with `2^pow2` quadratic Béziers.
    ///
    /// Each piece keeps the control points of the corresponding sub-conic,
    /// which is accurate once the pieces are short.
    pub fn to_quads(&self, pow2: u32) -> Vec<QuadBez> {
        let mut pieces = vec![*self];
        for _ in 0..pow2 {
            pieces = pieces
                .into_iter()
                .flat_map(|c| {
                    let (a, b) = c.split(0.5);
                    [a, b]
                })
                .collect();
        }
        pieces
            .into_iter()
            .map(|c| QuadBez::new(c.p0, c.p1, c.p2))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_circle() -> Conic {
        Conic::new((1.0, 0.0), (1.0, 1.0), (0.0, 1.0), std::f64::consts::FRAC_1_SQRT_2)
    }

    #[test]
    fn quarter_circle_is_round() {
        let c = quarter_circle();
        for i in 0..=10 {
            let p = c.eval(i as f64 / 10.0);
            assert!((p.to_vec2().hypot() - 1.0).abs() < 1e-12);
        }
        // The segments joining the ends to the origin are radial, so this is
        // the area of the quarter disc.
        assert!((c.signed_area() - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn split_rejoins() {
        let c = Conic::new((0.0, 0.0), (3.0, 5.0), (6.0, 1.0), 2.5);
        let (a, b) = c.split(0.3);
        assert!((a.p2 - c.eval(0.3)).hypot() < 1e-12);
        assert!((b.p0 - c.eval(0.3)).hypot() < 1e-12);
        // The halves are reparametrized, but they trace the same curve.
        let ta = c.param_of_subsegment(0.0..0.3, 0.5);
        let tb = c.param_of_subsegment(0.3..1.0, 0.5);
        assert!(0.0 < ta && ta < 0.3 && 0.3 < tb && tb < 1.0);
        assert!((a.eval(0.5) - c.eval(ta)).hypot() < 1e-9);
        assert!((b.eval(0.5) - c.eval(tb)).hypot() < 1e-9);

        let sub = c.subsegment(0.2..0.7);
        assert!((sub.p0 - c.eval(0.2)).hypot() < 1e-12);
        assert!((sub.p2 - c.eval(0.7)).hypot() < 1e-12);
    }

    #[test]
    fn subsegment_params_round_trip() {
        let c = Conic::new((0.0, 0.0), (3.0, 5.0), (6.0, 1.0), 2.5);
        for range in [0.2..0.7, 0.0..0.4, 0.55..1.0] {
            let sub = c.subsegment(range.clone());
            for i in 0..=8 {
                let s = i as f64 / 8.0;
                let t = c.param_of_subsegment(range.clone(), s);
                assert!(range.start - 1e-12 <= t && t <= range.end + 1e-12);
                assert!((sub.eval(s) - c.eval(t)).hypot() < 1e-9);
                assert!((c.param_in_subsegment(range.clone(), t) - s).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn derivative_matches_difference_quotient() {
        let c = Conic::new((0.0, 0.0), (3.0, 5.0), (6.0, 1.0), 0.4);
        let h = 1e-6;
        for t in [0.1, 0.5, 0.9] {
            let approx = (c.eval(t + h) - c.eval(t - h)) / (2.0 * h);
            assert!((approx - c.deriv(t)).hypot() < 1e-5);
        }
    }

    #[test]
    fn bbox_contains_samples() {
        let c = Conic::new((0.0, 0.0), (3.0, 5.0), (6.0, -1.0), 3.0);
        let bbox = c.bounding_box().inflate(1e-9, 1e-9);
        for i in 0..=100 {
            assert!(bbox.contains(c.eval(i as f64 / 100.0)));
        }
        assert!(bbox.y1 > 1.0);
    }

    #[test]
    fn nearest_on_circle() {
        let c = quarter_circle();
        let (t, d) = c.nearest(Point::new(2.0, 2.0), 1e-12);
        let p = c.eval(t);
        assert!((p.x - p.y).abs() < 1e-6);
        assert!((d.sqrt() - (8f64.sqrt() - 1.0)).abs() < 1e-6);
    }
}
