//! Utilities for fuzz and/or property testing using `arbitrary`.
//!
//! The generators lean towards the inputs that make boolean operations hard:
//! coordinates that differ in their last few bits, curves that share
//! endpoints or tangents, and curves that lie on top of one another.

use arbitrary::Unstructured;
use kurbo::{CubicBez, Line, ParamCurve, Point, QuadBez};

use crate::{
    curve::{Conic, Curve},
    path::Path,
    BinaryOp, FillType,
};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be a few single
/// precision ulps away from another float.
pub fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-4..=4)?;
        let bits = (orig as f32).to_bits() as i64 + ulps as i64;
        let nudged = f32::from_bits(bits.clamp(0, u32::MAX as i64) as u32) as f64;
        if nudged.is_finite() {
            return Ok(nudged.clamp(start, end));
        }
    }
    float_in_range(start, end, u)
}

/// Generate a point with both coordinates in `[-size, size]`, rounded to
/// single precision.
pub fn point(size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    let x = float_in_range(-size, size, u)? as f32;
    let y = float_in_range(-size, size, u)? as f32;
    Ok(Point::new(x as f64, y as f64))
}

/// Generate a point that has a chance of being very close to `orig`.
pub fn another_point(orig: Point, size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        another_float_in_range(orig.x, -size, size, u)?,
        another_float_in_range(orig.y, -size, size, u)?,
    ))
}

/// Generate an arbitrary curve starting at `start`.
pub fn curve_from(start: Point, size: f64, u: &mut Unstructured<'_>) -> Result<Curve, arbitrary::Error> {
    let kind: u8 = u.int_in_range(0..=3)?;
    let p1 = another_point(start, size, u)?;
    Ok(match kind {
        0 => Line::new(start, p1).into(),
        1 => QuadBez::new(start, p1, point(size, u)?).into(),
        2 => {
            let weight = float_in_range(0.1, 4.0, u)?;
            Conic::new(start, p1, point(size, u)?, weight).into()
        }
        _ => {
            let p2 = point(size, u)?;
            CubicBez::new(start, p1, another_point(p2, size, u)?, point(size, u)?).into()
        }
    })
}

/// Generate a curve that has a chance of overlapping `first`, sharing one of
/// its endpoints, or sharing its start tangent.
pub fn another_curve(first: &Curve, size: f64, u: &mut Unstructured<'_>) -> Result<Curve, arbitrary::Error> {
    let how: u8 = u.int_in_range(0..=3)?;
    match how {
        // A piece of `first` itself.
        0 => {
            let t0 = float_in_range(0.0, 1.0, u)?;
            let t1 = float_in_range(0.0, 1.0, u)?;
            if (t1 - t0).abs() < 1e-3 {
                return Ok(*first);
            }
            Ok(first.subsegment(t0.min(t1)..t0.max(t1)))
        }
        1 => curve_from(first.start(), size, u),
        2 => {
            let c = curve_from(point(size, u)?, size, u)?;
            Ok(c.with_endpoints(c.start(), first.end()))
        }
        _ => {
            let c = curve_from(first.start(), size, u)?;
            match (first, c) {
                (Curve::Cubic(f), Curve::Cubic(mut g)) => {
                    g.p1 = f.p1;
                    Ok(g.into())
                }
                _ => Ok(c),
            }
        }
    }
}

/// Generate a path with a few contours of a few curves each.
pub fn path(size: f64, u: &mut Unstructured<'_>) -> Result<Path, arbitrary::Error> {
    let mut ret = Path::with_fill_type(fill_type(u)?);
    let contours = u.int_in_range(1..=3)?;
    for _ in 0..contours {
        let start = point(size, u)?;
        ret.move_to(start);
        let curves = u.int_in_range(1..=4)?;
        let mut p = start;
        for _ in 0..curves {
            let c = curve_from(p, size, u)?;
            push_curve(&mut ret, &c);
            p = c.end();
        }
        ret.close();
    }
    Ok(ret)
}

/// Generate a second path, whose curves are biased towards touching or
/// overlapping the curves of `first`.
pub fn another_path(first: &Path, size: f64, u: &mut Unstructured<'_>) -> Result<Path, arbitrary::Error> {
    let firsts: Vec<Curve> = first
        .contours()
        .iter()
        .flat_map(|c| c.curves().iter().copied())
        .collect();
    let mut ret = Path::with_fill_type(fill_type(u)?);
    let contours = u.int_in_range(1..=2)?;
    for _ in 0..contours {
        let curves = u.int_in_range(1..=4)?;
        let mut started = false;
        let mut p = Point::ZERO;
        for _ in 0..curves {
            let related: bool = u.arbitrary()?;
            let c = if related && !firsts.is_empty() {
                let i = u.choose_index(firsts.len())?;
                another_curve(&firsts[i], size, u)?
            } else {
                curve_from(if started { p } else { point(size, u)? }, size, u)?
            };
            let c = if started { c.with_endpoints(p, c.end()) } else { c };
            if !started {
                ret.move_to(c.start());
                started = true;
            }
            push_curve(&mut ret, &c);
            p = c.end();
        }
        ret.close();
    }
    Ok(ret)
}

/// Generate a fill type.
pub fn fill_type(u: &mut Unstructured<'_>) -> Result<FillType, arbitrary::Error> {
    Ok(*u.choose(&[
        FillType::Winding,
        FillType::EvenOdd,
        FillType::InverseWinding,
        FillType::InverseEvenOdd,
    ])?)
}

/// Generate a boolean operation.
pub fn binary_op(u: &mut Unstructured<'_>) -> Result<BinaryOp, arbitrary::Error> {
    Ok(*u.choose(&BinaryOp::ALL)?)
}

fn push_curve(p: &mut Path, c: &Curve) {
    match *c {
        Curve::Line(l) => p.line_to(l.p1),
        Curve::Quad(q) => p.quad_to(q.p1, q.p2),
        Curve::Conic(k) => p.conic_to(k.p1, k.p2, k.weight),
        Curve::Cubic(c) => p.cubic_to(c.p1, c.p2, c.p3),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{op, simplify, Error};

    fn check(result: Result<Path, Error>) {
        match result {
            Ok(p) => {
                for c in p.contours() {
                    assert!(c.is_closed());
                    assert!(c.closing_line().is_none());
                }
            }
            // Hard inputs may give up, but only in the ways that are reported.
            Err(Error::Convergence { .. } | Error::Topology { .. } | Error::TooManySpans { .. }) => {}
            Err(e) => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn ops_close_their_contours() {
        arbtest::arbtest(|u| {
            let a = path(100.0, u)?;
            let b = another_path(&a, 100.0, u)?;
            check(op(&a, &b, binary_op(u)?));
            Ok(())
        });
    }

    #[test]
    fn simplify_closes_its_contours() {
        arbtest::arbtest(|u| {
            let a = path(100.0, u)?;
            check(simplify(&a));
            Ok(())
        });
    }

    #[test]
    fn nudged_floats_stay_close() {
        arbtest::arbtest(|u| {
            let x = float_in_range(-10.0, 10.0, u)?;
            let y = another_float_in_range(x, -10.0, 10.0, u)?;
            assert!((-10.0..=10.0).contains(&y));
            Ok(())
        });
    }
}
