use kurbo::{PathEl, Rect};
use pathops::{BinaryOp, FillType, Path};
use tiny_skia::{FillRule, Mask, PathBuilder, Transform};

/// Converts a path to `tiny-skia`'s representation (in single precision).
///
/// Returns `None` for a path with no curves.
pub fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.to_bez_path().elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// A square grid of pixels covering some rectangle of the plane.
#[derive(Clone, Copy, Debug)]
pub struct Raster {
    size: u32,
    transform: Transform,
}

impl Raster {
    /// A `size` by `size` raster covering `rect`, plus a margin.
    pub fn fitting(rect: Rect, size: u32) -> Raster {
        let extent = rect.width().max(rect.height()).max(1e-6);
        let margin = 0.05 * extent;
        let scale = size as f64 / (extent + 2.0 * margin);
        let tx = (margin - rect.x0) * scale;
        let ty = (margin - rect.y0) * scale;
        Raster {
            size,
            transform: Transform::from_row(
                scale as f32,
                0.0,
                0.0,
                scale as f32,
                tx as f32,
                ty as f32,
            ),
        }
    }

    /// Which pixel centers are inside `path`, according to its fill type.
    pub fn coverage(&self, path: &Path) -> Vec<bool> {
        let n = (self.size * self.size) as usize;
        let inverse = path.fill_type().is_inverse();
        let Some(mut mask) = Mask::new(self.size, self.size) else {
            return vec![inverse; n];
        };
        if let Some(sp) = to_skia_path(path) {
            let rule = match path.fill_type().non_inverse() {
                FillType::EvenOdd => FillRule::EvenOdd,
                _ => FillRule::Winding,
            };
            mask.fill_path(&sp, rule, false, self.transform);
        }
        mask.data().iter().map(|&v| (v >= 128) != inverse).collect()
    }
}

/// How well the output of an operation matches the operation applied pixel
/// by pixel to rasterized inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    /// The number of pixels where the output disagrees.
    pub mismatched: usize,
    /// The number of pixels compared.
    pub total: usize,
}

/// Rasterizes the operands and the output, and counts disagreements.
///
/// With `op` set to `None`, `result` is compared against `a` alone (as for a
/// simplification).
pub fn compare_op(a: &Path, b: Option<&Path>, op: Option<BinaryOp>, result: &Path, size: u32) -> Comparison {
    match (b, op) {
        (Some(b), Some(op)) => compare_sequence(&[(a, BinaryOp::Union), (b, op)], result, size),
        _ => compare_sequence(&[(a, BinaryOp::Union)], result, size),
    }
}

/// Like [`compare_op`], but for a whole sequence of operations applied in
/// turn to an initially empty region.
pub fn compare_sequence(operands: &[(&Path, BinaryOp)], result: &Path, size: u32) -> Comparison {
    let bbox = operands
        .iter()
        .map(|(p, _)| *p)
        .chain(Some(result))
        .filter_map(Path::bounding_box)
        .reduce(|r, s| r.union(s))
        .unwrap_or(Rect::new(0.0, 0.0, 1.0, 1.0));
    let raster = Raster::fitting(bbox, size);

    let cr = raster.coverage(result);
    let mut expected = vec![false; cr.len()];
    for (path, op) in operands {
        let c = raster.coverage(path);
        for (e, c) in expected.iter_mut().zip(c) {
            *e = op.apply(*e, c);
        }
    }
    let mismatched = expected.iter().zip(&cr).filter(|(e, r)| e != r).count();
    Comparison {
        mismatched,
        total: cr.len(),
    }
}

/// Draws some paths on top of each other, each filled in its own color.
pub fn svg_document(paths: &[(&Path, &str)]) -> svg::Document {
    let bbox = paths
        .iter()
        .filter_map(|(p, _)| p.bounding_box())
        .reduce(|r, s| r.union(s))
        .unwrap_or(Rect::new(0.0, 0.0, 1.0, 1.0));
    let margin = 0.05 * bbox.width().max(bbox.height());
    let mut doc = svg::Document::new().set(
        "viewBox",
        (
            bbox.x0 - margin,
            bbox.y0 - margin,
            bbox.width() + 2.0 * margin,
            bbox.height() + 2.0 * margin,
        ),
    );
    for (path, color) in paths {
        let rule = match path.fill_type().non_inverse() {
            FillType::EvenOdd => "evenodd",
            _ => "nonzero",
        };
        doc = doc.add(
            svg::node::element::Path::new()
                .set("d", path.to_bez_path().to_svg())
                .set("fill", *color)
                .set("fill-opacity", 0.5)
                .set("fill-rule", rule),
        );
    }
    doc
}
