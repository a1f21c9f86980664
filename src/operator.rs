//! Deciding which spans bound the result, and which way they run.

use crate::{
    spans::SpanIdx,
    winding::{WindingGraph, WindingNumber},
    BinaryOp, FillType,
};

/// What to compute from the winding numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A boolean operation between two paths.
    Binary(BinaryOp),
    /// The region of a single path, under its own fill type.
    Simplify,
}

impl Operation {
    /// Is a point with these winding numbers in the result?
    pub fn inside(self, fill_a: FillType, fill_b: FillType, w: WindingNumber) -> bool {
        match self {
            Operation::Binary(op) => op.apply(fill_a.inside(w.shape_a), fill_b.inside(w.shape_b)),
            Operation::Simplify => fill_a.inside(w.shape_a),
        }
    }

    /// Does the result contain the point at infinity?
    ///
    /// Far away, both winding numbers are zero, so only the inverse flags matter.
    pub fn is_inverse(self, fill_a: FillType, fill_b: FillType) -> bool {
        self.inside(fill_a, fill_b, WindingNumber::default())
    }
}

/// The spans that make up the boundary of the result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    /// The kept spans, each with a flag saying whether it should be walked
    /// backwards.
    ///
    /// Walked in the right direction, each span has the region described by
    /// the output contours on its left. That's the result itself, or its
    /// complement if `inverse` is set.
    pub kept: Vec<(SpanIdx, bool)>,
    /// Whether the result contains the point at infinity.
    pub inverse: bool,
}

/// Picks out the spans with the result on exactly one side.
pub fn select(graph: &WindingGraph, fill_a: FillType, fill_b: FillType, op: Operation) -> Selection {
    let inverse = op.is_inverse(fill_a, fill_b);
    let mut kept = Vec::new();
    for (idx, _) in graph.spans().live() {
        let w = graph.windings(idx);
        if w.is_trivial() {
            continue;
        }
        let left = op.inside(fill_a, fill_b, w.left);
        let right = op.inside(fill_a, fill_b, w.right);
        if left != right {
            let reversed = left == inverse;
            log::trace!("keeping {idx:?} ({w:?}), reversed: {reversed}");
            kept.push((idx, reversed));
        }
    }
    log::debug!("{op:?} kept {} spans, inverse: {inverse}", kept.len());
    Selection { kept, inverse }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wn(shape_a: i32, shape_b: i32) -> WindingNumber {
        WindingNumber { shape_a, shape_b }
    }

    // For a span from one operand, with the other operand's winding number
    // fixed at `other`, is the span on the boundary of the result? Every
    // combination of "this operand's span has the inside on its left/right"
    // and "the other operand is in/out here" is checked against the table of
    // which edges of each operand survive each operation.
    #[test]
    fn active_edges() {
        use BinaryOp::*;
        // (op, span from a?, other inside?, expected)
        let table = [
            (Difference, true, false, true),
            (Difference, true, true, false),
            (Difference, false, false, false),
            (Difference, false, true, true),
            (Intersection, true, false, false),
            (Intersection, true, true, true),
            (Intersection, false, false, false),
            (Intersection, false, true, true),
            (Union, true, false, true),
            (Union, true, true, false),
            (Union, false, false, true),
            (Union, false, true, false),
            (Xor, true, false, true),
            (Xor, true, true, true),
            (Xor, false, false, true),
            (Xor, false, true, true),
            (ReverseDifference, true, false, false),
            (ReverseDifference, true, true, true),
            (ReverseDifference, false, false, true),
            (ReverseDifference, false, true, false),
        ];
        let fill = FillType::Winding;
        for (op, from_a, other_in, expected) in table {
            let other = i32::from(other_in);
            let (left, right) = if from_a {
                (wn(1, other), wn(0, other))
            } else {
                (wn(other, 1), wn(other, 0))
            };
            let op = Operation::Binary(op);
            let kept = op.inside(fill, fill, left) != op.inside(fill, fill, right);
            assert_eq!(kept, expected, "{op:?}, from a: {from_a}, other inside: {other_in}");
        }
    }

    #[test]
    fn orientation() {
        let fill = FillType::EvenOdd;
        let op = Operation::Binary(BinaryOp::Difference);
        // A span of b with the inside of b on its left, inside a: in the
        // result, the inside is on its right.
        assert!(op.inside(fill, fill, wn(1, 0)));
        assert!(!op.inside(fill, fill, wn(1, 1)));
        assert!(!op.is_inverse(fill, fill));
        assert!(Operation::Binary(BinaryOp::Union).is_inverse(FillType::InverseWinding, fill));
        assert!(!Operation::Binary(BinaryOp::Intersection).is_inverse(FillType::InverseWinding, fill));
        assert!(Operation::Simplify.is_inverse(FillType::InverseEvenOdd, fill));
    }

    #[test]
    fn simplify_uses_only_a() {
        let op = Operation::Simplify;
        let fill = FillType::Winding;
        assert!(op.inside(fill, FillType::InverseWinding, wn(2, 0)));
        assert!(!op.inside(fill, FillType::InverseWinding, wn(0, 5)));
    }
}
