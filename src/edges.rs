//! Input curves, cut into monotonic edges.
//!
//! Every curve of both operands (including the implicit closing line of each
//! contour) is split at its horizontal and vertical extrema, so that each edge
//! is monotonic in both `x` and `y`. Pieces too small to matter are dropped.
//! Each edge remembers which input curve it came from and which parameter
//! range of that curve it covers, so that the output can be re-joined.

use kurbo::Rect;

use crate::{curve::Curve, options::OpOptions, path::Path};

/// Which operand of a boolean operation a curve belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Operand {
    /// The first operand (or the only one, when simplifying).
    A,
    /// The second operand.
    B,
}

/// The input curves, indexed by [`SourceIdx`].
#[derive(Clone)]
pub struct SourceVec<T> {
    inner: Vec<T>,
}
impl_typed_vec!(SourceVec, SourceIdx, "src");

/// The edges, indexed by [`EdgeIdx`].
#[derive(Clone)]
pub struct EdgeVec<T> {
    inner: Vec<T>,
}
impl_typed_vec!(EdgeVec, EdgeIdx, "e");

/// A monotonic piece of an input curve.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Edge {
    /// The geometry. Its endpoints are shared bit-for-bit with the
    /// neighboring edges of the same contour.
    pub curve: Curve,
    /// The operand this edge came from.
    pub operand: Operand,
    /// The input curve this edge came from.
    pub source: SourceIdx,
    /// The parameters on the input curve where this edge starts and ends.
    pub source_range: (f64, f64),
    /// The bounding box of `curve`.
    pub bbox: Rect,
    /// The next edge along the same contour.
    pub contour_next: EdgeIdx,
}

/// A place where a cubic crosses itself.
///
/// The two parameters are on two different edges, because edges are monotonic.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct SelfCrossing {
    /// The edge containing the earlier parameter.
    pub first: EdgeIdx,
    /// The parameter on `first`.
    pub first_t: f64,
    /// The edge containing the later parameter.
    pub second: EdgeIdx,
    /// The parameter on `second`.
    pub second_t: f64,
}

/// An arena of edges.
///
/// Edges are indexed by [`EdgeIdx`] and can be retrieved by indexing (i.e. with square brackets).
#[derive(Clone, Debug, Default)]
pub struct Edges {
    edges: EdgeVec<Edge>,
    sources: SourceVec<Curve>,
    self_crossings: Vec<SelfCrossing>,
}

impl Edges {
    /// Builds the edges of one or two operands.
    pub fn from_paths(a: &Path, b: Option<&Path>, opts: &OpOptions) -> Edges {
        let mut ret = Edges::default();
        ret.add_path(a, Operand::A, opts.point_tolerance);
        if let Some(b) = b {
            ret.add_path(b, Operand::B, opts.point_tolerance);
        }
        ret
    }

    /// The number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Are there no edges at all?
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All the valid edge handles.
    pub fn indices(&self) -> impl Iterator<Item = EdgeIdx> + 'static {
        self.edges.indices()
    }

    /// Iterates over the edges with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeIdx, &Edge)> + '_ {
        self.edges.iter()
    }

    /// The input curve with the given handle.
    pub fn source(&self, idx: SourceIdx) -> &Curve {
        &self.sources[idx]
    }

    /// All the input curves.
    pub fn sources(&self) -> &SourceVec<Curve> {
        &self.sources
    }

    /// The places where an input cubic crosses itself.
    pub fn self_crossings(&self) -> &[SelfCrossing] {
        &self.self_crossings
    }

    /// Are `a` and `b` neighbors along a contour?
    pub fn are_contour_neighbors(&self, a: EdgeIdx, b: EdgeIdx) -> bool {
        self[a].contour_next == b || self[b].contour_next == a
    }

    fn add_path(&mut self, path: &Path, operand: Operand, eps: f64) {
        for contour in path.contours() {
            let first = self.edges.len();
            for curve in contour.closed_curves() {
                if curve.is_degenerate(eps) {
                    continue;
                }
                let source = self.sources.push(curve);
                self.add_monotonic_pieces(curve, source, operand, eps);
            }

            // Link the contour into a cycle.
            let last = self.edges.len();
            if first == last {
                continue;
            }
            let indices: Vec<EdgeIdx> = self.edges.indices().skip(first).collect();
            for (i, &idx) in indices.iter().enumerate() {
                self.edges[idx].contour_next = indices[(i + 1) % indices.len()];
            }
        }
    }

    fn add_monotonic_pieces(&mut self, curve: Curve, source: SourceIdx, operand: Operand, eps: f64) {
        // Drop extrema that would make a piece shorter than `eps`, so the
        // remaining cuts are all well separated.
        let mut cuts = vec![(0.0, curve.start())];
        for t in curve.extrema() {
            let p = curve.point_at(t);
            let prev = cuts[cuts.len() - 1].1;
            if (p - prev).hypot() > eps && (p - curve.end()).hypot() > eps {
                cuts.push((t, p));
            }
        }
        cuts.push((1.0, curve.end()));

        let first = self.edges.len();
        for pair in cuts.windows(2) {
            let ((t0, p0), (t1, p1)) = (pair[0], pair[1]);
            let piece = if t0 == 0.0 && t1 == 1.0 {
                curve
            } else {
                curve.subsegment(t0..t1).with_endpoints(p0, p1)
            };
            let idx = self.edges.push(Edge {
                curve: piece,
                operand,
                source,
                source_range: (t0, t1),
                bbox: piece.bounding_box(),
                contour_next: EdgeVec::<Edge>::idx(self.edges.len() + 1),
            });
            debug_assert!(idx.index() + 1 == self.edges.len());
        }

        if let Some((s, t)) = curve.self_intersection() {
            let find = |u: f64| {
                (first..self.edges.len())
                    .map(EdgeVec::<Edge>::idx)
                    .find(|&e| self.edges[e].source_range.0 <= u && u <= self.edges[e].source_range.1)
            };
            if let (Some(e0), Some(e1)) = (find(s), find(t)) {
                let local = |e: EdgeIdx, u: f64| {
                    let (r0, r1) = self.edges[e].source_range;
                    curve.param_in_subsegment(r0..r1, u).clamp(0.0, 1.0)
                };
                if e0 != e1 {
                    self.self_crossings.push(SelfCrossing {
                        first: e0,
                        first_t: local(e0, s),
                        second: e1,
                        second_t: local(e1, t),
                    });
                }
            }
        }
    }

    /// The bounding box of all the edges.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.edges.values().map(|e| e.bbox).reduce(|a, b| a.union(b))
    }
}

impl std::ops::Index<EdgeIdx> for Edges {
    type Output = Edge;

    fn index(&self, index: EdgeIdx) -> &Self::Output {
        &self.edges[index]
    }
}
