//! Cutting edges into spans.
//!
//! A span is a piece of an edge between two consecutive cut points, where the
//! cut points are the edge's endpoints and its intersections. Cut points that
//! are within the point tolerance of one another are merged into a single
//! vertex, and every span is snapped so that it starts and ends exactly on its
//! vertices. Spans therefore only meet at their endpoints, apart from spans
//! that run along each other; those are merged into one span that carries the
//! winding contributions of all of them.

use std::collections::BTreeMap;

use kurbo::{Point, Rect, Vec2};

use crate::{
    curve::Curve,
    edges::{EdgeIdx, EdgeVec, Edges, Operand, SourceIdx, SourceVec},
    intersect::{IntersectionKind, IntersectionTable},
    num::CheapOrderedFloat,
    options::OpOptions,
    winding::WindingNumber,
    Error,
};

/// The vertices, indexed by [`VertexIdx`].
#[derive(Clone)]
pub struct VertexVec<T> {
    inner: Vec<T>,
}
impl_typed_vec!(VertexVec, VertexIdx, "v");

/// The spans, indexed by [`SpanIdx`].
#[derive(Clone)]
pub struct SpanVec<T> {
    inner: Vec<T>,
}
impl_typed_vec!(SpanVec, SpanIdx, "s");

/// A piece of an edge that meets other spans only at its endpoints.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Span {
    /// The geometry, with endpoints exactly on the vertices.
    pub curve: Curve,
    /// The edge this span came from.
    pub edge: EdgeIdx,
    /// The input curve this span came from.
    pub source: SourceIdx,
    /// The parameters on the input curve where this span starts and ends.
    pub source_range: (f64, f64),
    /// The vertex at the start.
    pub start: VertexIdx,
    /// The vertex at the end.
    pub end: VertexIdx,
    /// The bounding box of `curve`.
    pub bbox: Rect,
    /// How much the winding numbers jump when crossing this span from its
    /// right to its left.
    ///
    /// This starts out as one for the span's operand, but merging coincident
    /// spans adds up their contributions. A span whose contribution is zero is
    /// invisible.
    pub wind: WindingNumber,
}

impl Span {
    /// Does this span separate regions with different winding numbers?
    pub fn is_live(&self) -> bool {
        !self.wind.is_zero()
    }

    /// The direction this span heads in as it leaves `v`, which must be one of
    /// its endpoints.
    pub fn leaving(&self, v: VertexIdx) -> Vec2 {
        if v == self.start {
            self.curve.start_tangent()
        } else {
            debug_assert_eq!(v, self.end);
            -self.curve.end_tangent()
        }
    }
}

/// The vertices and spans of an operation.
#[derive(Clone, Debug, Default)]
pub struct Spans {
    vertices: VertexVec<Point>,
    spans: SpanVec<Span>,
    sources: SourceVec<Curve>,
}

// A disjoint-set forest over cut points. Roots are always the smallest index
// in their set.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }
}

impl Spans {
    /// Cuts the edges at their intersections.
    pub fn cut(edges: &Edges, table: &IntersectionTable, opts: &OpOptions) -> Result<Spans, Error> {
        let eps = opts.point_tolerance;

        // Every cut point gets an id. The edge endpoints come first, so that
        // they're the representatives of their vertices and input points
        // survive unchanged.
        let mut points: Vec<Point> = Vec::with_capacity(2 * edges.len() + 2 * table.len());
        let mut cuts: EdgeVec<Vec<(f64, usize)>> = EdgeVec::with_capacity(edges.len());
        for (_, edge) in edges.iter() {
            points.push(edge.curve.start());
            points.push(edge.curve.end());
            cuts.push(vec![(0.0, points.len() - 2), (1.0, points.len() - 1)]);
        }
        let mut add_cut = |e: EdgeIdx, t: f64, p: Point, cuts: &mut EdgeVec<Vec<(f64, usize)>>| {
            points.push(p);
            cuts[e].push((t, points.len() - 1));
        };
        for (_, x) in table.iter() {
            add_cut(x.a, x.ta, x.point, &mut cuts);
            add_cut(x.b, x.tb, x.point, &mut cuts);
            if let IntersectionKind::Coincident { ta_end, tb_end } = x.kind {
                let end = edges[x.a].curve.point_at(ta_end);
                add_cut(x.a, ta_end, end, &mut cuts);
                add_cut(x.b, tb_end, end, &mut cuts);
            }
        }

        let vertex_of = cluster_points(&points, eps);
        let mut ret = Spans {
            sources: edges.sources().clone(),
            ..Spans::default()
        };
        let mut vertex_ids: Vec<Option<VertexIdx>> = vec![None; points.len()];
        let mut vertex = |root: usize, ret: &mut Spans| -> VertexIdx {
            *vertex_ids[root].get_or_insert_with(|| ret.vertices.push(points[root]))
        };

        for (e, edge) in edges.iter() {
            let mut edge_cuts = std::mem::take(&mut cuts[e]);
            edge_cuts.sort_by_key(|&(t, id)| (CheapOrderedFloat::from(t), id));

            // Consecutive cuts at the same vertex collapse into one.
            let mut groups: Vec<(f64, f64, VertexIdx)> = Vec::with_capacity(edge_cuts.len());
            for (t, id) in edge_cuts {
                let v = vertex(vertex_of[id], &mut ret);
                match groups.last_mut() {
                    Some(last) if last.2 == v => last.1 = t,
                    _ => groups.push((t, t, v)),
                }
            }

            let wind = match edge.operand {
                Operand::A => WindingNumber {
                    shape_a: 1,
                    shape_b: 0,
                },
                Operand::B => WindingNumber {
                    shape_a: 0,
                    shape_b: 1,
                },
            };
            for pair in groups.windows(2) {
                let ((_, t0, v0), (t1, _, v1)) = (pair[0], pair[1]);
                let (p0, p1) = (ret.vertices[v0], ret.vertices[v1]);
                let curve = if t0 <= 0.0 && t1 >= 1.0 {
                    edge.curve.with_endpoints(p0, p1)
                } else {
                    edge.curve.subsegment(t0..t1).with_endpoints(p0, p1)
                };
                let (r0, r1) = edge.source_range;
                let source = edges.source(edge.source);
                ret.spans.push(Span {
                    curve,
                    edge: e,
                    source: edge.source,
                    source_range: (
                        source.param_of_subsegment(r0..r1, t0),
                        source.param_of_subsegment(r0..r1, t1),
                    ),
                    start: v0,
                    end: v1,
                    bbox: curve.bounding_box(),
                    wind,
                });
                if ret.spans.len() > opts.max_spans {
                    log::warn!("more than {} spans", opts.max_spans);
                    return Err(Error::TooManySpans {
                        limit: opts.max_spans,
                    });
                }
            }
        }

        ret.merge_coincident(eps);
        log::debug!(
            "{} vertices, {} spans ({} live)",
            ret.vertices.len(),
            ret.spans.len(),
            ret.spans.values().filter(|s| s.is_live()).count()
        );
        Ok(ret)
    }

    // Spans with the same endpoints that stay close to each other are the same
    // piece of the plane boundary. Fold them into the first one.
    fn merge_coincident(&mut self, eps: f64) {
        let mut by_ends: BTreeMap<(VertexIdx, VertexIdx), Vec<SpanIdx>> = BTreeMap::new();
        for (idx, span) in self.spans.iter() {
            let key = (span.start.min(span.end), span.start.max(span.end));
            by_ends.entry(key).or_default().push(idx);
        }

        let mut absorbed = SpanVec::with_capacity(self.spans.len());
        for _ in self.spans.indices() {
            absorbed.push(false);
        }
        for group in by_ends.values().filter(|g| g.len() > 1) {
            for (i, &keep) in group.iter().enumerate() {
                if absorbed[keep] {
                    continue;
                }
                for &other in &group[(i + 1)..] {
                    if absorbed[other] || !self.coincide(keep, other, 4.0 * eps) {
                        continue;
                    }
                    let w = self.spans[other].wind;
                    let w = if self.spans[other].start == self.spans[keep].start {
                        w
                    } else {
                        -w
                    };
                    self.spans[keep].wind += w;
                    self.spans[other].wind = WindingNumber::default();
                    absorbed[other] = true;
                    log::trace!("merged {other:?} into {keep:?}");
                }
            }
        }
    }

    fn coincide(&self, a: SpanIdx, b: SpanIdx, tol: f64) -> bool {
        let (ca, cb) = (&self.spans[a].curve, &self.spans[b].curve);
        let accuracy = 0.1 * tol;
        [0.25, 0.5, 0.75]
            .into_iter()
            .all(|t| ca.nearest(cb.point_at(t), accuracy).1 <= tol)
            && cb.nearest(ca.point_at(0.5), accuracy).1 <= tol
    }

    /// The input curve with the given handle.
    pub fn source(&self, idx: SourceIdx) -> &Curve {
        &self.sources[idx]
    }

    /// The position of a vertex.
    pub fn vertex(&self, idx: VertexIdx) -> Point {
        self.vertices[idx]
    }

    /// The number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates over all the spans, including dead ones.
    pub fn iter(&self) -> impl Iterator<Item = (SpanIdx, &Span)> + '_ {
        self.spans.iter()
    }

    /// Iterates over the spans with a non-zero winding contribution.
    pub fn live(&self) -> impl Iterator<Item = (SpanIdx, &Span)> + '_ {
        self.spans.iter().filter(|(_, s)| s.is_live())
    }

    /// For each vertex, the live spans that start or end there.
    pub fn live_incidence(&self) -> VertexVec<Vec<SpanIdx>> {
        let mut ret = VertexVec::with_capacity(self.vertices.len());
        for _ in self.vertices.indices() {
            ret.push(Vec::new());
        }
        for (idx, span) in self.live() {
            ret[span.start].push(idx);
            ret[span.end].push(idx);
        }
        ret
    }

    /// The number of spans, including dead ones.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Are there no spans at all?
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Draws the live spans, colored by operand, with their vertices.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{Circle, Path as SvgPath};

        let Some(bbox) = self.spans.values().map(|s| s.bbox).reduce(|a, b| a.union(b)) else {
            return svg::Document::new();
        };
        let stroke = 0.002 * bbox.width().max(bbox.height()).max(1e-6);
        let margin = 10.0 * stroke;
        let mut doc = svg::Document::new().set(
            "viewBox",
            (
                bbox.x0 - margin,
                bbox.y0 - margin,
                bbox.width() + 2.0 * margin,
                bbox.height() + 2.0 * margin,
            ),
        );
        for (idx, span) in self.live() {
            let mut bez = kurbo::BezPath::new();
            bez.move_to(span.curve.start());
            for el in span.curve.to_path_els() {
                bez.push(el);
            }
            let color = match (span.wind.shape_a != 0, span.wind.shape_b != 0) {
                (true, true) => "purple",
                (true, false) => "red",
                _ => "blue",
            };
            doc = doc.add(
                SvgPath::new()
                    .set("id", format!("{idx:?}"))
                    .set("d", bez.to_svg())
                    .set("stroke", color)
                    .set("stroke-width", stroke)
                    .set("fill", "none"),
            );
        }
        for p in self.vertices.values() {
            doc = doc.add(
                Circle::new()
                    .set("cx", p.x)
                    .set("cy", p.y)
                    .set("r", 2.0 * stroke)
                    .set("fill", "black"),
            );
        }
        doc
    }
}

impl std::ops::Index<SpanIdx> for Spans {
    type Output = Span;

    fn index(&self, index: SpanIdx) -> &Self::Output {
        &self.spans[index]
    }
}

// Groups points that are within `eps` of one another (transitively), and
// returns the representative of each point's group.
fn cluster_points(points: &[Point], eps: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| CheapOrderedFloat::from(points[i].x));

    let mut uf = UnionFind::new(points.len());
    for (k, &i) in order.iter().enumerate() {
        for &j in &order[(k + 1)..] {
            if points[j].x - points[i].x > eps {
                break;
            }
            if (points[j] - points[i]).hypot() <= eps {
                uf.union(i, j);
            }
        }
    }
    (0..points.len()).map(|i| uf.find(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{intersect::find_intersections, path::Path};

    fn square(x0: f64, y0: f64, size: f64, ccw: bool) -> Path {
        let mut pts = vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
        ];
        if !ccw {
            pts.reverse();
        }
        let mut p = Path::new();
        p.move_to(pts[0]);
        for q in &pts[1..] {
            p.line_to(*q);
        }
        p.close();
        p
    }

    fn spans_of(a: &Path, b: Option<&Path>) -> Spans {
        let opts = OpOptions::default();
        let edges = Edges::from_paths(a, b, &opts);
        let table = find_intersections(&edges, &opts).unwrap();
        Spans::cut(&edges, &table, &opts).unwrap()
    }

    #[test]
    fn crossing_squares() {
        let spans = spans_of(&square(0.0, 0.0, 2.0, true), Some(&square(1.0, 1.0, 2.0, true)));
        // Each square has two of its sides cut in half.
        assert_eq!(spans.len(), 12);
        assert_eq!(spans.vertex_count(), 10);
        for (_, s) in spans.iter() {
            assert_eq!(s.curve.start(), spans.vertex(s.start));
            assert_eq!(s.curve.end(), spans.vertex(s.end));
        }
    }

    #[test]
    fn near_points_merge() {
        let a = square(0.0, 0.0, 1.0, true);
        // A triangle whose tip almost touches the right side of the square.
        let tip = Point::new(1.0 + 1e-12, 0.5);
        let mut b = Path::new();
        b.move_to(tip).line_to((2.0, 0.0)).line_to((2.0, 1.0)).close();
        let spans = spans_of(&a, Some(&b));

        // The square's right side is cut at the tip, and the cut point
        // merges with the tip itself.
        assert_eq!(spans.vertex_count(), 7);
        assert_eq!(spans.len(), 8);
        let at_tip = spans
            .iter()
            .filter(|(_, s)| s.curve.end() == tip || s.curve.start() == tip)
            .count();
        assert_eq!(at_tip, 4);
    }

    #[test]
    fn shared_side_merges() {
        // The clockwise square on the right runs up the shared side, just
        // like the counter-clockwise one on the left.
        let spans = spans_of(&square(0.0, 0.0, 1.0, true), Some(&square(1.0, 0.0, 1.0, false)));
        let shared: Vec<_> = spans
            .live()
            .filter(|(_, s)| s.bbox.x0 == 1.0 && s.bbox.x1 == 1.0)
            .collect();
        assert_eq!(shared.len(), 1);
        let w = shared[0].1.wind;
        assert_eq!((w.shape_a.abs(), w.shape_b.abs()), (1, 1));
        assert_eq!(w.shape_a, w.shape_b);

        // With the same orientation they run in opposite directions.
        let spans = spans_of(&square(0.0, 0.0, 1.0, true), Some(&square(1.0, 0.0, 1.0, true)));
        let shared: Vec<_> = spans
            .live()
            .filter(|(_, s)| s.bbox.x0 == 1.0 && s.bbox.x1 == 1.0)
            .collect();
        assert_eq!(shared.len(), 1);
        let w = shared[0].1.wind;
        assert_eq!((w.shape_a.abs(), w.shape_b.abs()), (1, 1));
        assert_eq!(w.shape_a, -w.shape_b);
    }

    #[test]
    fn doubled_contour_is_invisible() {
        let mut a = square(0.0, 0.0, 1.0, true);
        let b = square(0.0, 0.0, 1.0, false);
        for c in b.contours() {
            a.push_contour(c.clone());
        }
        let spans = spans_of(&a, None);
        assert_eq!(spans.live().count(), 0);
    }

    #[test]
    fn span_budget() {
        let opts = OpOptions {
            max_spans: 3,
            ..OpOptions::default()
        };
        let a = square(0.0, 0.0, 1.0, true);
        let edges = Edges::from_paths(&a, None, &opts);
        let table = find_intersections(&edges, &opts).unwrap();
        assert_eq!(
            Spans::cut(&edges, &table, &opts).unwrap_err(),
            Error::TooManySpans { limit: 3 }
        );
    }
}
