#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod assemble;
mod builder;
pub mod curve;
pub mod edges;
pub mod intersect;
mod num;
pub mod operator;
mod options;
mod path;
pub mod spans;
pub mod winding;

#[cfg(feature = "generators")]
pub mod generators;

pub use builder::OpBuilder;
pub use curve::{Conic, Curve};
pub use num::CheapOrderedFloat;
pub use options::OpOptions;
pub use path::{bits, Contour, ParseError, Path};

use operator::Operation;

/// How to decide whether a point is inside a path, given its winding number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillType {
    /// The point is inside if its winding number is non-zero.
    #[default]
    Winding,
    /// The point is inside if its winding number is odd.
    EvenOdd,
    /// The point is inside if its winding number is zero.
    InverseWinding,
    /// The point is inside if its winding number is even.
    InverseEvenOdd,
}

impl FillType {
    /// Is this one of the inverse fill types?
    pub fn is_inverse(self) -> bool {
        matches!(self, FillType::InverseWinding | FillType::InverseEvenOdd)
    }

    /// The same rule with the inside and outside swapped.
    pub fn toggle_inverse(self) -> FillType {
        match self {
            FillType::Winding => FillType::InverseWinding,
            FillType::EvenOdd => FillType::InverseEvenOdd,
            FillType::InverseWinding => FillType::Winding,
            FillType::InverseEvenOdd => FillType::EvenOdd,
        }
    }

    /// The fill type with the inverse flag cleared.
    pub fn non_inverse(self) -> FillType {
        if self.is_inverse() {
            self.toggle_inverse()
        } else {
            self
        }
    }

    /// Is a point with this winding number inside?
    pub fn inside(self, winding: i32) -> bool {
        let inside = match self.non_inverse() {
            FillType::EvenOdd => winding % 2 != 0,
            _ => winding != 0,
        };
        inside != self.is_inverse()
    }

    fn name(self) -> &'static str {
        match self {
            FillType::Winding => "winding",
            FillType::EvenOdd => "evenodd",
            FillType::InverseWinding => "inverse-winding",
            FillType::InverseEvenOdd => "inverse-evenodd",
        }
    }
}

impl std::fmt::Display for FillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The string wasn't the name of a fill type or operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown name {0:?}")]
pub struct UnknownName(pub String);

impl std::str::FromStr for FillType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            FillType::Winding,
            FillType::EvenOdd,
            FillType::InverseWinding,
            FillType::InverseEvenOdd,
        ]
        .into_iter()
        .find(|f| f.name() == s)
        .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    /// A point is in the union of two sets if it is in either one.
    Union,
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the difference of two sets if it is in the first but not the second.
    Difference,
    /// A point is in the reverse difference of two sets if it is in the second but not the first.
    ReverseDifference,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Xor,
}

impl BinaryOp {
    /// All the operations.
    pub const ALL: [BinaryOp; 5] = [
        BinaryOp::Union,
        BinaryOp::Intersection,
        BinaryOp::Difference,
        BinaryOp::ReverseDifference,
        BinaryOp::Xor,
    ];

    /// Combines membership in the two operands.
    pub fn apply(self, in_a: bool, in_b: bool) -> bool {
        match self {
            BinaryOp::Union => in_a || in_b,
            BinaryOp::Intersection => in_a && in_b,
            BinaryOp::Difference => in_a && !in_b,
            BinaryOp::ReverseDifference => !in_a && in_b,
            BinaryOp::Xor => in_a != in_b,
        }
    }

    fn name(self) -> &'static str {
        match self {
            BinaryOp::Union => "union",
            BinaryOp::Intersection => "intersection",
            BinaryOp::Difference => "difference",
            BinaryOp::ReverseDifference => "reverse-difference",
            BinaryOp::Xor => "xor",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BinaryOp {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinaryOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

/// The ways a boolean operation can fail.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// At least one of the inputs was infinite.
    #[error("one of the inputs was infinite")]
    Infinity,
    /// At least one of the inputs was not a number.
    #[error("one of the inputs had a NaN")]
    NaN,
    /// The search for the intersections between two curves ran out of budget.
    #[error("the intersection search gave up after {steps} steps near {near:?}")]
    Convergence {
        /// The number of steps taken.
        steps: usize,
        /// A point near the curves that were being intersected.
        near: kurbo::Point,
    },
    /// The inputs were cut into too many pieces.
    #[error("the operation needed more than {limit} spans")]
    TooManySpans {
        /// The limit that was exceeded (see [`OpOptions::max_spans`]).
        limit: usize,
    },
    /// The kept pieces of the inputs didn't join up into closed contours.
    #[error("an output contour could not be closed at {at:?}")]
    Topology {
        /// The vertex where the contour broke off.
        at: kurbo::Point,
    },
}

/// Computes a boolean operation between two paths.
///
/// Each path is filled according to its own [`FillType`]. The output has
/// non-overlapping contours with the inside on the left (in a y-up frame) and an
/// even-odd fill type, which is inverse if the operation applied to the inverse
/// flags of the inputs is true.
pub fn op(a: &Path, b: &Path, op: BinaryOp) -> Result<Path, Error> {
    let opts = OpOptions::for_paths([a, b]);
    op_with_options(a, b, op, &opts)
}

/// Like [`op`], but with explicit tolerances.
pub fn op_with_options(a: &Path, b: &Path, op: BinaryOp, opts: &OpOptions) -> Result<Path, Error> {
    a.validate()?;
    b.validate()?;
    run(a, Some(b), Operation::Binary(op), opts)
}

/// Rewrites a path into non-overlapping contours with an even-odd fill type
/// that cover the same region.
pub fn simplify(path: &Path) -> Result<Path, Error> {
    let opts = OpOptions::for_paths([path]);
    simplify_with_options(path, &opts)
}

/// Like [`simplify`], but with explicit tolerances.
pub fn simplify_with_options(path: &Path, opts: &OpOptions) -> Result<Path, Error> {
    path.validate()?;
    run(path, None, Operation::Simplify, opts)
}

fn run(a: &Path, b: Option<&Path>, operation: Operation, opts: &OpOptions) -> Result<Path, Error> {
    let edges = edges::Edges::from_paths(a, b, opts);
    log::debug!(
        "{operation:?}: {} edges, point tolerance {:e}",
        edges.len(),
        opts.point_tolerance
    );
    let table = intersect::find_intersections(&edges, opts)?;
    let spans = spans::Spans::cut(&edges, &table, opts)?;
    #[cfg(feature = "debug-svg")]
    if let Some(out) = &opts.debug_svg {
        if let Err(e) = svg::save(out, &spans.dump_svg()) {
            log::warn!("failed to write {}: {e}", out.display());
        }
    }
    let graph = winding::WindingGraph::compute(spans);
    let fill_b = b.map_or(FillType::EvenOdd, Path::fill_type);
    let selection = operator::select(&graph, a.fill_type(), fill_b, operation);
    assemble::assemble(&graph, &selection)
}
