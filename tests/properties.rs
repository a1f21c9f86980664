use kurbo::{Arc, BezPath, PathEl, Point, Vec2};
use pathops::{op, simplify, BinaryOp, Error, FillType, Path};
use proptest::prelude::*;

const RASTER: u32 = 128;
const MAX_MISMATCHED: usize = 24;

// How many pixels of `q` disagree with `p`.
fn mismatched(p: &Path, q: &Path) -> usize {
    pathops_util::compare_op(p, None, None, q, RASTER).mismatched
}

fn assert_closed(p: &Path) {
    for c in p.contours() {
        assert!(c.is_closed());
        assert!(c.closing_line().is_none());
    }
}

fn polygon(fill_type: FillType, points: &[(f64, f64)]) -> Path {
    let mut p = Path::with_fill_type(fill_type);
    p.move_to(points[0]);
    for &q in &points[1..] {
        p.line_to(q);
    }
    p.close();
    p
}

// A piece of an annulus around the origin, with angles measured in degrees
// (in a y-down frame, so -90 is straight up).
fn sector(r0: f64, r1: f64, from: f64, to: f64) -> Path {
    let (a0, a1) = (from.to_radians(), to.to_radians());
    let at = |r: f64, a: f64| Point::new(r * a.cos(), r * a.sin());
    let mut bez = BezPath::new();
    bez.move_to(at(r0, a0));
    bez.line_to(at(r1, a0));
    let arc = |r: f64, start_angle: f64, sweep_angle: f64| Arc {
        center: Point::ZERO,
        radii: Vec2::new(r, r),
        start_angle,
        sweep_angle,
        x_rotation: 0.0,
    };
    let outer = arc(r1, a0, a1 - a0);
    bez.extend(outer.append_iter(1e-3));
    bez.line_to(at(r0, a1));
    let inner = arc(r0, a1, a0 - a1);
    bez.extend(inner.append_iter(1e-3));
    bez.close_path();
    Path::from_bez_path(&bez, FillType::EvenOdd)
}

// A blob with curved sides, and a rectangle cutting through it.
fn curvy_pair() -> (Path, Path) {
    let a: Path = "winding M 0 0 C 10 -5 20 5 30 0 Q 35 15 30 30 C 20 35 10 25 0 30 K -10 15 0 0 1.5 Z"
        .parse()
        .unwrap();
    let b = polygon(
        FillType::Winding,
        &[(10.0, -10.0), (22.0, -8.0), (21.0, 40.0), (9.0, 41.0)],
    );
    (a, b)
}

#[test]
fn commutativity() {
    let (a, b) = curvy_pair();
    for o in [BinaryOp::Union, BinaryOp::Intersection, BinaryOp::Xor] {
        let ab = op(&a, &b, o).unwrap();
        let ba = op(&b, &a, o).unwrap();
        assert_closed(&ab);
        assert!(mismatched(&ab, &ba) <= MAX_MISMATCHED, "{o}");
        assert!((ab.area() - ba.area()).abs() < 1e-6 * a.area().abs());
    }
    let diff = op(&a, &b, BinaryOp::Difference).unwrap();
    let rev = op(&b, &a, BinaryOp::ReverseDifference).unwrap();
    assert!(mismatched(&diff, &rev) <= MAX_MISMATCHED);
}

#[test]
fn de_morgan() {
    let (a, b) = curvy_pair();
    let inter = op(&a, &b, BinaryOp::Intersection).unwrap();
    let diff = op(&a, &b, BinaryOp::Difference).unwrap();
    let rev = op(&a, &b, BinaryOp::ReverseDifference).unwrap();

    let back_to_a = op(&diff, &inter, BinaryOp::Union).unwrap();
    assert!(mismatched(&a, &back_to_a) <= MAX_MISMATCHED);
    let back_to_b = op(&rev, &inter, BinaryOp::Union).unwrap();
    assert!(mismatched(&b, &back_to_b) <= MAX_MISMATCHED);

    let tol = 1e-6 * a.area().abs();
    assert!((diff.area() + inter.area() - a.area().abs()).abs() < tol);
    assert!((rev.area() + inter.area() - b.area().abs()).abs() < tol);
}

#[test]
fn xor_decomposition() {
    let (a, b) = curvy_pair();
    let xor = op(&a, &b, BinaryOp::Xor).unwrap();
    let union = op(&a, &b, BinaryOp::Union).unwrap();
    let inter = op(&a, &b, BinaryOp::Intersection).unwrap();
    let decomposed = op(&union, &inter, BinaryOp::Difference).unwrap();
    assert!(mismatched(&xor, &decomposed) <= MAX_MISMATCHED);
    assert!((xor.area() - (union.area() - inter.area())).abs() < 1e-6 * union.area());
}

#[test]
fn operand_with_itself() {
    // A self-intersecting bowtie with a sliver of a triangle hanging off one corner.
    let mut a = polygon(FillType::Winding, &[(0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 4.0)]);
    a.move_to((4.0, 4.0)).line_to((5.0, 5.0)).line_to((5.0, 5.001)).close();

    let union = op(&a, &a, BinaryOp::Union).unwrap();
    let inter = op(&a, &a, BinaryOp::Intersection).unwrap();
    let diff = op(&a, &a, BinaryOp::Difference).unwrap();
    assert_closed(&union);
    assert_closed(&inter);
    assert!(mismatched(&a, &union) <= MAX_MISMATCHED);
    assert!(mismatched(&a, &inter) <= MAX_MISMATCHED);
    assert!((union.area() - 8.0).abs() < 1e-3);
    assert!(diff.is_empty());
    assert!(op(&a, &a, BinaryOp::Xor).unwrap().is_empty());
}

#[test]
fn simplify_figure_eight() {
    let eight = polygon(FillType::EvenOdd, &[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
    let out = simplify(&eight).unwrap();
    assert_eq!(out.contours().len(), 2);
    assert!(out.contours().iter().all(|c| c.area() > 0.0));
    assert!((out.area() - 2.0).abs() < 1e-9);
}

#[test]
fn simplify_overlapping_squares() {
    let mut p = polygon(FillType::Winding, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
    p.move_to((1.0, 1.0)).line_to((3.0, 1.0)).line_to((3.0, 3.0)).line_to((1.0, 3.0)).close();
    let out = simplify(&p).unwrap();
    assert_eq!(out.contours().len(), 1);
    assert_eq!(out.contours()[0].curves().len(), 8);
    assert!((out.area() - 7.0).abs() < 1e-9);

    // Under even-odd, the overlap is a hole touching the outline at two corners.
    p.set_fill_type(FillType::EvenOdd);
    let out = simplify(&p).unwrap();
    assert!((out.area() - 6.0).abs() < 1e-9);
    assert!(mismatched(&p, &out) <= MAX_MISMATCHED);
}

#[test]
fn overlapping_sectors_union() {
    // Two pieces of rings, outlined by line segments and cubic arcs.
    let a = sector(60.0, 83.0, -90.0, -60.0);
    let b = sector(50.0, 75.0, -70.0, -30.0);
    let out = op(&a, &b, BinaryOp::Union).unwrap();
    assert_closed(&out);
    assert_eq!(out.contours().len(), 1);
    let cmp = pathops_util::compare_op(&a, Some(&b), Some(BinaryOp::Union), &out, RASTER);
    assert!(cmp.mismatched <= MAX_MISMATCHED, "{cmp:?}");
}

#[test]
fn nearly_coincident_arcs() {
    // The outer arcs lie on the same circle but are split differently, so
    // they agree only up to the error of the cubic approximation.
    let a = sector(60.0, 83.0, -90.0, -60.0);
    let b = sector(60.0, 83.0, -75.0, -40.0);
    match op(&a, &b, BinaryOp::Union) {
        Ok(out) => {
            assert_closed(&out);
            let cmp = pathops_util::compare_op(&a, Some(&b), Some(BinaryOp::Union), &out, RASTER);
            assert!(cmp.mismatched <= MAX_MISMATCHED, "{cmp:?}");
        }
        Err(Error::Convergence { .. } | Error::Topology { .. }) => {}
        Err(e) => panic!("unexpected {e}"),
    }
}

// Rounds every coordinate to single precision.
fn to_f32(p: &Path) -> Path {
    let r = |q: Point| Point::new(q.x as f32 as f64, q.y as f32 as f64);
    let bez: BezPath = p
        .to_bez_path()
        .iter()
        .map(|el| match el {
            PathEl::MoveTo(q) => PathEl::MoveTo(r(q)),
            PathEl::LineTo(q) => PathEl::LineTo(r(q)),
            PathEl::QuadTo(q0, q1) => PathEl::QuadTo(r(q0), r(q1)),
            PathEl::CurveTo(q0, q1, q2) => PathEl::CurveTo(r(q0), r(q1), r(q2)),
            PathEl::ClosePath => PathEl::ClosePath,
        })
        .collect();
    Path::from_bez_path(&bez, p.fill_type())
}

#[test]
fn adjacent_wedges_union() {
    // Two even-odd pieces of a ring, each starting with a move to the inner
    // circle and a line out to the outer one. The second starts where the
    // first ends, up to the last bit or so of the single-precision coordinates.
    let a = to_f32(&sector(60.0, 83.0, -90.0, -60.0));
    let b = to_f32(&sector(60.0, 83.0, -60.000001, -30.0));

    let out = op(&a, &b, BinaryOp::Union).unwrap();
    assert_closed(&out);
    assert_eq!(out.contours().len(), 1);
    assert!((out.area() - (a.area().abs() + b.area().abs())).abs() < 1e-3 * out.area());
    let cmp = pathops_util::compare_op(&a, Some(&b), Some(BinaryOp::Union), &out, RASTER);
    assert!(cmp.mismatched <= MAX_MISMATCHED, "{cmp:?}");
}

#[test]
fn heavy_conic_against_band() {
    // The conic has an interior x extremum and an interior y extremum, so its
    // middle monotonic piece starts and ends strictly inside it.
    let a: Path = "winding M 0 0 K 10 10 -2 6 3 Z".parse().unwrap();
    let b = polygon(FillType::Winding, &[(-5.0, 2.0), (15.0, 2.0), (15.0, 4.0), (-5.0, 4.0)]);
    let area_a = a.area().abs();

    let mut areas = Vec::new();
    for o in [
        BinaryOp::Union,
        BinaryOp::Intersection,
        BinaryOp::Difference,
        BinaryOp::ReverseDifference,
        BinaryOp::Xor,
    ] {
        let out = op(&a, &b, o).unwrap();
        assert_closed(&out);
        let cmp = pathops_util::compare_op(&a, Some(&b), Some(o), &out, RASTER);
        assert!(cmp.mismatched <= MAX_MISMATCHED, "{o}: {cmp:?}");
        areas.push(out.area());
    }
    let [union, inter, diff, _, xor] = areas[..] else {
        unreachable!()
    };
    let tol = 1e-6 * area_a;
    assert!((diff + inter - area_a).abs() < tol);
    assert!((union + inter - area_a - 40.0).abs() < tol);
    assert!((xor - (union - inter)).abs() < tol);
}

fn triangle() -> impl Strategy<Value = Path> {
    prop::array::uniform6(-10.0f64..10.0).prop_map(|[x0, y0, x1, y1, x2, y2]| {
        polygon(FillType::Winding, &[(x0, y0), (x1, y1), (x2, y2)])
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn area_identities(a in triangle(), b in triangle()) {
        let (area_a, area_b) = (a.area().abs(), b.area().abs());
        prop_assume!(area_a > 1e-2 && area_b > 1e-2);
        let union = op(&a, &b, BinaryOp::Union).unwrap();
        let inter = op(&a, &b, BinaryOp::Intersection).unwrap();
        let diff = op(&a, &b, BinaryOp::Difference).unwrap();
        let xor = op(&a, &b, BinaryOp::Xor).unwrap();

        let tol = 1e-6 * (area_a + area_b);
        prop_assert!((diff.area() + inter.area() - area_a).abs() < tol);
        prop_assert!((union.area() - (area_a + area_b - inter.area())).abs() < tol);
        prop_assert!((xor.area() - (union.area() - inter.area())).abs() < tol);
    }
}

#[derive(Clone, Debug)]
enum Side {
    Line,
    Quad(Point),
    Conic(Point, f64),
    Cubic(Point, Point),
}

fn coord() -> impl Strategy<Value = Point> {
    (-10.0f64..10.0, -10.0f64..10.0).prop_map(|(x, y)| Point::new(x, y))
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Line),
        coord().prop_map(Side::Quad),
        (coord(), 0.2f64..4.0).prop_map(|(p, w)| Side::Conic(p, w)),
        // Random cubics often loop around on themselves.
        (coord(), coord()).prop_map(|(p, q)| Side::Cubic(p, q)),
    ]
}

// Three corners, joined by random lines and curves.
fn curved_triangle() -> impl Strategy<Value = Path> {
    (prop::array::uniform3(coord()), prop::array::uniform3(side())).prop_map(|(corners, sides)| {
        let mut p = Path::with_fill_type(FillType::Winding);
        p.move_to(corners[0]);
        for (i, side) in sides.iter().enumerate() {
            let to = corners[(i + 1) % 3];
            match *side {
                Side::Line => p.line_to(to),
                Side::Quad(c) => p.quad_to(c, to),
                Side::Conic(c, w) => p.conic_to(c, to, w),
                Side::Cubic(c0, c1) => p.cubic_to(c0, c1, to),
            };
        }
        p.close();
        p
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn curved_area_identities(a in curved_triangle(), b in curved_triangle()) {
        let areas = || -> Result<[f64; 6], Error> {
            Ok([
                simplify(&a)?.area(),
                simplify(&b)?.area(),
                op(&a, &b, BinaryOp::Union)?.area(),
                op(&a, &b, BinaryOp::Intersection)?.area(),
                op(&a, &b, BinaryOp::Difference)?.area(),
                op(&a, &b, BinaryOp::Xor)?.area(),
            ])
        };
        // Giving up is allowed, as long as it's reported.
        let Ok([area_a, area_b, union, inter, diff, xor]) = areas() else {
            return Ok(());
        };

        let tol = 1e-4 * (1.0 + area_a + area_b);
        prop_assert!((diff + inter - area_a).abs() < tol);
        prop_assert!((union + inter - area_a - area_b).abs() < tol);
        prop_assert!((xor - (union - inter)).abs() < tol);
    }
}
