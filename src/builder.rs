//! Accumulating many operands into one result.

use crate::{op_with_options, path::Path, BinaryOp, Error, OpOptions};

/// Applies a sequence of boolean operations, left to right.
///
/// The accumulated result starts out empty, so the first operand is usually
/// added with [`BinaryOp::Union`].
///
/// ```
/// use pathops::{BinaryOp, OpBuilder, Path};
///
/// let mut builder = OpBuilder::new();
/// for x in [0.0, 1.0, 2.0] {
///     let mut square = Path::new();
///     square
///         .move_to((x, 0.0))
///         .line_to((x + 1.0, 0.0))
///         .line_to((x + 1.0, 1.0))
///         .line_to((x, 1.0))
///         .close();
///     builder.add(square, BinaryOp::Union);
/// }
/// let strip = builder.resolve().unwrap();
/// assert!((strip.area() - 3.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct OpBuilder {
    operands: Vec<(Path, BinaryOp)>,
    options: Option<OpOptions>,
}

impl OpBuilder {
    /// A builder with no operands, whose tolerances are picked from the
    /// operands when resolving.
    pub fn new() -> OpBuilder {
        OpBuilder::default()
    }

    /// A builder that resolves with fixed tolerances.
    pub fn with_options(options: OpOptions) -> OpBuilder {
        OpBuilder {
            operands: Vec::new(),
            options: Some(options),
        }
    }

    /// Queues `op` to be applied to the result so far and `path`.
    pub fn add(&mut self, path: Path, op: BinaryOp) -> &mut Self {
        self.operands.push((path, op));
        self
    }

    /// The number of queued operands.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Are there no queued operands?
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Applies all the queued operations.
    ///
    /// Resolving an empty builder gives the empty path.
    pub fn resolve(&self) -> Result<Path, Error> {
        let options = match &self.options {
            Some(o) => o.clone(),
            None => OpOptions::for_paths(self.operands.iter().map(|(p, _)| p)),
        };
        let mut acc = Path::with_fill_type(crate::FillType::EvenOdd);
        for (i, (path, op)) in self.operands.iter().enumerate() {
            acc = op_with_options(&acc, path, *op, &options)?;
            log::trace!("after operand {i} ({op}): {} contours", acc.contours().len());
        }
        Ok(acc)
    }
}
