//! Winding numbers on either side of every span.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use kurbo::Point;

use crate::{
    curve::Axis,
    spans::{Span, SpanIdx, SpanVec, Spans, VertexIdx},
};

/// We support boolean operations, so a "winding number" for us is two winding
/// numbers, one for each shape.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default, serde::Serialize)]
pub struct WindingNumber {
    /// The winding number of the first shape.
    pub shape_a: i32,
    /// The winding number of the second shape.
    pub shape_b: i32,
}

impl WindingNumber {
    /// Are both winding numbers zero?
    pub fn is_zero(self) -> bool {
        self.shape_a == 0 && self.shape_b == 0
    }
}

impl std::fmt::Debug for WindingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}a + {}b", self.shape_a, self.shape_b)
    }
}

impl Add for WindingNumber {
    type Output = WindingNumber;

    fn add(self, rhs: WindingNumber) -> WindingNumber {
        WindingNumber {
            shape_a: self.shape_a + rhs.shape_a,
            shape_b: self.shape_b + rhs.shape_b,
        }
    }
}

impl AddAssign for WindingNumber {
    fn add_assign(&mut self, rhs: WindingNumber) {
        *self = *self + rhs;
    }
}

impl Neg for WindingNumber {
    type Output = WindingNumber;

    fn neg(self) -> WindingNumber {
        WindingNumber {
            shape_a: -self.shape_a,
            shape_b: -self.shape_b,
        }
    }
}

impl Sub for WindingNumber {
    type Output = WindingNumber;

    fn sub(self, rhs: WindingNumber) -> WindingNumber {
        self + (-rhs)
    }
}

impl Mul<i32> for WindingNumber {
    type Output = WindingNumber;

    fn mul(self, rhs: i32) -> WindingNumber {
        WindingNumber {
            shape_a: self.shape_a * rhs,
            shape_b: self.shape_b * rhs,
        }
    }
}

/// The winding numbers just to the left and just to the right of a span,
/// looking along its direction.
///
/// For a span that came from a single input curve they differ by one in one
/// of the shapes. Once coincident spans are merged, they can differ by more.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default, serde::Serialize)]
pub struct SpanWindings {
    /// The winding number on the left.
    pub left: WindingNumber,
    /// The winding number on the right.
    pub right: WindingNumber,
}

impl SpanWindings {
    /// A span's winding numbers are trivial if they're the same on both sides.
    /// In this case, the span is invisible to the topology of the sets.
    pub fn is_trivial(&self) -> bool {
        self.left == self.right
    }

    /// The winding numbers as seen when walking the span backwards.
    pub fn flipped(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

impl std::fmt::Debug for SpanWindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} | {:?}", self.left, self.right)
    }
}

/// Spans together with the winding numbers on both their sides.
#[derive(Clone, Debug)]
pub struct WindingGraph {
    spans: Spans,
    sides: SpanVec<SpanWindings>,
}

impl WindingGraph {
    /// Labels every live span with its winding numbers.
    ///
    /// From the middle of each span we cast a ray to infinity, counting the
    /// signed crossings with all the other spans. The ray runs along whichever
    /// axis is more transverse to the span, so that it leaves the span cleanly.
    /// The crossings give the winding number on the side the ray leaves from,
    /// and the span's own contribution gives the other side.
    pub fn compute(spans: Spans) -> WindingGraph {
        let mut sides = SpanVec::with_capacity(spans.len());
        for (idx, span) in spans.iter() {
            let w = if span.is_live() {
                span_windings(&spans, idx, span)
            } else {
                SpanWindings::default()
            };
            sides.push(w);
        }
        let ret = WindingGraph { spans, sides };
        ret.check_vertices();
        ret
    }

    /// The spans.
    pub fn spans(&self) -> &Spans {
        &self.spans
    }

    /// The winding numbers on either side of a span.
    pub fn windings(&self, idx: SpanIdx) -> SpanWindings {
        self.sides[idx]
    }

    /// The vertices where the windings of angularly adjacent spans disagree.
    ///
    /// Going around a vertex counter-clockwise, the region after one span must
    /// be the region before the next one. Spans leaving a vertex in the same
    /// direction can't be ordered reliably, so they aren't compared.
    pub fn inconsistent_vertices(&self) -> Vec<VertexIdx> {
        let mut ret = Vec::new();
        for (v, incident) in self.spans.live_incidence().iter() {
            let mut around: Vec<(f64, WindingNumber, WindingNumber)> = incident
                .iter()
                .map(|&s| {
                    let span = &self.spans[s];
                    // Looking out from the vertex, the counter-clockwise side
                    // of a span that ends here is its right side.
                    let w = if span.start == v {
                        self.sides[s]
                    } else {
                        self.sides[s].flipped()
                    };
                    (span.leaving(v).atan2(), w.right, w.left)
                })
                .collect();
            around.sort_by(|x, y| x.0.total_cmp(&y.0));
            let n = around.len();
            let consistent = (0..n).all(|i| {
                let (angle, _, ccw) = around[i];
                let (next_angle, cw, _) = around[(i + 1) % n];
                (next_angle - angle).abs() <= 1e-6 || ccw == cw
            });
            if !consistent {
                ret.push(v);
            }
        }
        ret
    }

    fn check_vertices(&self) {
        if !cfg!(feature = "slow-asserts") && !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let bad = self.inconsistent_vertices();
        if !bad.is_empty() {
            log::debug!("inconsistent windings around {bad:?}");
        }
        #[cfg(feature = "slow-asserts")]
        assert!(bad.is_empty(), "inconsistent windings around {bad:?}");
    }
}

fn span_windings(spans: &Spans, idx: SpanIdx, span: &Span) -> SpanWindings {
    let mid = span.curve.point_at(0.5);
    let mut d = span.curve.derivative_at(0.5);
    if d.hypot2() == 0.0 {
        d = span.curve.end() - span.curve.start();
    }

    // A horizontal ray (towards -x) is indexed by y, and a vertical ray
    // (towards -y) by x.
    let axis = if d.y.abs() >= d.x.abs() { Axis::Y } else { Axis::X };
    let ray = ray_winding(spans, idx, mid, axis);
    let ray_on_left = match axis {
        Axis::Y => d.y > 0.0,
        Axis::X => d.x < 0.0,
    };
    let left = if ray_on_left { ray } else { ray + span.wind };
    SpanWindings {
        left,
        right: left - span.wind,
    }
}

// The winding number just beside `from`, on the side where the coordinate
// other than `axis` decreases.
fn ray_winding(spans: &Spans, skip: SpanIdx, from: Point, axis: Axis) -> WindingNumber {
    let across = axis.flip();
    let c = axis.of(from);
    let mut ret = WindingNumber::default();
    for (idx, other) in spans.live() {
        if idx == skip {
            continue;
        }
        let (c0, c1) = (axis.of(other.curve.start()), axis.of(other.curve.end()));
        // Half-open, so that a ray through a vertex counts the spans on one
        // side of it only.
        if !(c0.min(c1) <= c && c < c0.max(c1)) {
            continue;
        }
        let (lo, hi) = match across {
            Axis::X => (other.bbox.x0, other.bbox.x1),
            Axis::Y => (other.bbox.y0, other.bbox.y1),
        };
        let limit = across.of(from);
        if lo >= limit {
            continue;
        }
        if hi >= limit {
            let t = other.curve.monotonic_t_at(axis, c);
            if across.of(other.curve.point_at(t)) >= limit {
                continue;
            }
        }
        // A counter-clockwise contour runs down its left side and along
        // (towards +x) its bottom.
        let positive = match axis {
            Axis::Y => c1 < c0,
            Axis::X => c1 > c0,
        };
        ret += if positive { other.wind } else { -other.wind };
    }
    ret
}
