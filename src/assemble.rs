//! Walking the kept spans into closed contours.

use std::f64::consts::TAU;

use kurbo::{Point, Vec2};

use crate::{
    curve::Curve,
    edges::SourceIdx,
    operator::Selection,
    path::{Contour, Path},
    spans::{SpanIdx, Spans, VertexIdx, VertexVec},
    winding::WindingGraph,
    Error, FillType,
};

// Tangent angles closer than this are considered tied.
const ANGLE_TOLERANCE: f64 = 1e-9;

/// A kept span, oriented the way the output walks it.
#[derive(Clone, Copy, Debug)]
struct Directed {
    span: SpanIdx,
    reversed: bool,
    from: VertexIdx,
    to: VertexIdx,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Kept,
    InProgress,
    Done,
}

impl Directed {
    fn curve(&self, spans: &Spans) -> Curve {
        let c = spans[self.span].curve;
        if self.reversed {
            c.reverse()
        } else {
            c
        }
    }

    // The parameters on the input curve where this walk starts and ends.
    fn source_params(&self, spans: &Spans) -> (SourceIdx, f64, f64) {
        let span = &spans[self.span];
        let (r0, r1) = span.source_range;
        if self.reversed {
            (span.source, r1, r0)
        } else {
            (span.source, r0, r1)
        }
    }
}

/// Joins the selected spans into the output path.
///
/// Each contour is walked with the region it bounds on its left. At a vertex
/// where several kept spans leave, the walk takes the sharpest left turn,
/// which is the smallest clockwise rotation from the direction it came from.
/// Contours that touch at a vertex are therefore split apart there instead of
/// crossing over.
pub fn assemble(graph: &WindingGraph, selection: &Selection) -> Result<Path, Error> {
    let spans = graph.spans();
    let directed: Vec<Directed> = selection
        .kept
        .iter()
        .map(|&(span, reversed)| {
            let s = &spans[span];
            let (from, to) = if reversed {
                (s.end, s.start)
            } else {
                (s.start, s.end)
            };
            Directed {
                span,
                reversed,
                from,
                to,
            }
        })
        .collect();

    let mut outgoing = VertexVec::with_capacity(spans.vertex_count());
    for _ in 0..spans.vertex_count() {
        outgoing.push(Vec::new());
    }
    for (i, d) in directed.iter().enumerate() {
        outgoing[d.from].push(i);
    }

    let mut state = vec![State::Kept; directed.len()];
    let fill_type = if selection.inverse {
        FillType::InverseEvenOdd
    } else {
        FillType::EvenOdd
    };
    let mut ret = Path::with_fill_type(fill_type);

    for first in 0..directed.len() {
        if state[first] != State::Kept {
            continue;
        }
        state[first] = State::InProgress;
        let mut walk = vec![first];
        let mut current = first;
        loop {
            let at = directed[current].to;
            let candidates = outgoing[at]
                .iter()
                .copied()
                .filter(|&j| state[j] == State::Kept || j == first);
            let Some(next) = choose_next(spans, &directed, current, candidates) else {
                return Err(Error::Topology {
                    at: spans.vertex(at),
                });
            };
            if next == first {
                break;
            }
            state[next] = State::InProgress;
            walk.push(next);
            current = next;
        }

        for &i in &walk {
            state[i] = State::Done;
        }
        log::trace!("contour of {} spans", walk.len());
        let walk: Vec<Directed> = walk.into_iter().map(|i| directed[i]).collect();
        if let Some(contour) = Contour::from_curves(rejoin(spans, &walk), true) {
            ret.push_contour(contour);
        }
    }

    log::debug!(
        "assembled {} contours from {} spans",
        ret.contours().len(),
        directed.len()
    );
    Ok(ret)
}

// The clockwise rotation taking `from` to `to`, in [0, 2π).
fn clockwise_angle(from: Vec2, to: Vec2) -> f64 {
    let ccw = from.cross(to).atan2(from.dot(to));
    if ccw > 0.0 {
        TAU - ccw
    } else {
        -ccw
    }
}

// A point on a span at distance `dist` from `v` (or its far end, if it is
// shorter than that). Spans are monotonic in both coordinates, so the distance
// from either end grows along the span.
fn look_ahead(spans: &Spans, d: &Directed, dist: f64) -> Point {
    let c = d.curve(spans);
    let v = c.start();
    if (c.end() - v).hypot() <= dist {
        return c.end();
    }
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..48 {
        let mid = 0.5 * (lo + hi);
        if (c.point_at(mid) - v).hypot() < dist {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    c.point_at(hi)
}

fn choose_next(
    spans: &Spans,
    directed: &[Directed],
    incoming: usize,
    candidates: impl Iterator<Item = usize>,
) -> Option<usize> {
    let candidates: Vec<usize> = candidates.collect();
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }

    let inc = &directed[incoming];
    let at = spans.vertex(inc.to);
    let back = -inc.curve(spans).end_tangent();
    let chord = |d: &Directed| {
        let s = &spans[d.span];
        (s.curve.end() - s.curve.start()).hypot()
    };
    let dist = candidates
        .iter()
        .map(|&j| chord(&directed[j]))
        .fold(chord(inc), f64::min)
        * 0.5;
    let back_ahead = look_ahead(
        spans,
        &Directed {
            span: inc.span,
            reversed: !inc.reversed,
            from: inc.to,
            to: inc.from,
        },
        dist,
    ) - at;

    // Each candidate gets its tangent angle and the angle to a point at
    // a common distance along it. That point breaks exact tangent ties.
    let keyed: Vec<(usize, f64, f64)> = candidates
        .into_iter()
        .map(|j| {
            let d = &directed[j];
            let tangent = clockwise_angle(back, d.curve(spans).start_tangent());
            let ahead = clockwise_angle(back_ahead, look_ahead(spans, d, dist) - at);
            (j, tangent, ahead)
        })
        .collect();

    let tied_with_back = |a: f64| a <= ANGLE_TOLERANCE || a >= TAU - ANGLE_TOLERANCE;
    keyed
        .into_iter()
        .reduce(|best, cand| {
            let use_ahead = (best.1 - cand.1).abs() <= ANGLE_TOLERANCE
                || tied_with_back(best.1)
                || tied_with_back(cand.1);
            let better = if use_ahead {
                cand.2 < best.2
            } else {
                cand.1 < best.1
            };
            if better {
                cand
            } else {
                best
            }
        })
        .map(|(j, _, _)| j)
}

// Turns a closed walk into curves, merging consecutive spans that are
// contiguous pieces of the same input curve back into one piece.
fn rejoin(spans: &Spans, walk: &[Directed]) -> Vec<Curve> {
    let mut runs: Vec<Vec<Directed>> = Vec::new();
    for d in walk {
        match runs.last_mut() {
            Some(run) if continues(spans, run[run.len() - 1], *d) => run.push(*d),
            _ => runs.push(vec![*d]),
        }
    }
    // The walk starts at an arbitrary span, so the last run may continue
    // into the first.
    if runs.len() > 1 {
        let first_start = runs[0][0];
        if let Some(last) = runs.last() {
            if continues(spans, last[last.len() - 1], first_start) {
                if let Some(mut last) = runs.pop() {
                    last.append(&mut runs[0]);
                    runs[0] = last;
                }
            }
        }
    }

    runs.iter().map(|run| run_curve(spans, run)).collect()
}

fn continues(spans: &Spans, prev: Directed, next: Directed) -> bool {
    let (src_a, _, end_a) = prev.source_params(spans);
    let (src_b, start_b, _) = next.source_params(spans);
    src_a == src_b && prev.reversed == next.reversed && (end_a - start_b).abs() <= 1e-9
}

fn run_curve(spans: &Spans, run: &[Directed]) -> Curve {
    let (first, last) = (run[0], run[run.len() - 1]);
    if run.len() == 1 {
        return first.curve(spans);
    }
    let (src, t0, _) = first.source_params(spans);
    let (_, _, t1) = last.source_params(spans);
    let start = spans.vertex(first.from);
    let end = spans.vertex(last.to);
    let source = spans.source(src);
    if t0 <= t1 {
        source.subsegment(t0..t1).with_endpoints(start, end)
    } else {
        source.subsegment(t1..t0).reverse().with_endpoints(start, end)
    }
}
