//! Utilities for generating examples, benchmarks, and test cases.

use kurbo::Point;

use crate::{path::Path, FillType};

fn polygon(path: &mut Path, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    path.close();
}

/// Generate a bunch of squares, arranged in a grid.
///
/// The bottom-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated up by `slant`.
fn squares((x0, y0): (f64, f64), size: f64, offset: f64, slant: f64, count: usize) -> Path {
    let mut ret = Path::with_fill_type(FillType::EvenOdd);
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            polygon(
                &mut ret,
                &[
                    Point::new(x, y),
                    Point::new(x + size, y + slant),
                    Point::new(x + size, y + size + slant),
                    Point::new(x, y + size),
                ],
            );
        }
    }
    ret
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// ┌────┐ ┌────┐ ┌────┐
/// │    │ │    │ │    │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │    │ │    │ │    │
/// └────┘ └────┘ └────┘
/// ```
///
/// We return the pattern in two parts: the outer collection of `n x n`
/// non-overlapping squares, and the inner collection of `(n - 1) x (n - 1)`
/// non-overlapping squares.
pub fn checkerboard(n: usize) -> (Path, Path) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 0.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 0.0, n.saturating_sub(1)),
    )
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
pub fn slanted_checkerboard(n: usize) -> (Path, Path) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 1.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 1.0, n.saturating_sub(1)),
    )
}

/// The first path is a bunch of long, skinny parallelograms going from
/// bottom-left to top-right. The second has them going from bottom-right to
/// top-left, so that every one of the first crosses every one of the second.
pub fn slanties(n: usize) -> (Path, Path) {
    let h = 20.0 * n as f64;

    let mut even = Path::with_fill_type(FillType::EvenOdd);
    let mut odd = Path::with_fill_type(FillType::EvenOdd);
    for i in 0..n {
        let x_off = 20.0 * i as f64;
        polygon(
            &mut even,
            &[
                Point::new(x_off, 0.0),
                Point::new(x_off + 10.0, 0.0),
                Point::new(x_off + h + 10.0, h),
                Point::new(x_off + h, h),
            ],
        );
        polygon(
            &mut odd,
            &[
                Point::new(x_off + h, 0.0),
                Point::new(x_off + h + 10.0, 0.0),
                Point::new(x_off + 10.0, h),
                Point::new(x_off, h),
            ],
        );
    }

    (even, odd)
}

/// Generate an `n` by `n` grid of circles (each made of four cubics), and a
/// second grid shifted by half a radius so that every circle of the second
/// crosses up to four circles of the first.
pub fn circles(n: usize) -> (Path, Path) {
    let grid = |shift: f64| {
        let mut ret = Path::with_fill_type(FillType::Winding);
        for i in 0..n {
            for j in 0..n {
                let center = Point::new(40.0 * i as f64 + shift, 40.0 * j as f64 + shift);
                let circle = kurbo::Circle::new(center, 25.0);
                let bez = kurbo::Shape::to_path(&circle, 1e-3);
                for c in Path::from_bez_path(&bez, FillType::Winding).contours() {
                    ret.push_contour(c.clone());
                }
            }
        }
        ret
    };
    (grid(0.0), grid(20.0))
}
