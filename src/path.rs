//! Path outlines: contours of curves, plus a fill type.

use kurbo::{BezPath, CubicBez, Line, PathEl, Point, QuadBez, Rect};

use crate::{
    curve::{Conic, Curve},
    Error, FillType,
};

/// Converts the bit pattern of an IEEE-754 single precision float to an `f64`.
///
/// The conversion is exact, so paths built from bit patterns keep every last
/// mantissa bit (including denormals).
pub fn bits(b: u32) -> f64 {
    f32::from_bits(b) as f64
}

/// A chain of curves, each starting where the previous one ended.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Contour {
    start: Point,
    curves: Vec<Curve>,
    closed: bool,
}

impl Contour {
    /// Creates a contour from a chain of curves.
    ///
    /// Curve endpoints are not checked: the caller is responsible for each
    /// curve starting where the previous one ended.
    pub fn from_curves(curves: Vec<Curve>, closed: bool) -> Option<Contour> {
        let start = curves.first()?.start();
        Some(Contour {
            start,
            curves,
            closed,
        })
    }

    /// The point where this contour starts.
    pub fn start(&self) -> Point {
        self.start
    }

    /// The point where the last curve ends.
    pub fn end(&self) -> Point {
        self.curves.last().map_or(self.start, Curve::end)
    }

    /// The curves in this contour, not including any implicit closing line.
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Was this contour explicitly closed?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The line joining the end back to the start, if they differ.
    ///
    /// Open and closed contours are both filled as though they were closed,
    /// so every contour has one of these unless it already ends at its start.
    pub fn closing_line(&self) -> Option<Line> {
        let end = self.end();
        (end != self.start).then(|| Line::new(end, self.start))
    }

    /// The curves, followed by the closing line.
    pub fn closed_curves(&self) -> impl Iterator<Item = Curve> + '_ {
        self.curves
            .iter()
            .copied()
            .chain(self.closing_line().map(Curve::Line))
    }

    /// The signed area enclosed by this contour (counter-clockwise in a y-up
    /// frame is positive).
    pub fn area(&self) -> f64 {
        self.closed_curves().map(|c| c.signed_area()).sum()
    }
}

/// A path outline: a sequence of contours and the rule for filling them.
///
/// Paths are built with the usual verbs. As with most 2D APIs, drawing after a
/// `close` starts a new contour at the start of the closed one.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path {
    fill_type: FillType,
    contours: Vec<Contour>,
    // The point that the next drawing verb starts from, if there is no open contour.
    #[serde(skip)]
    pending_move: Option<Point>,
}

impl Path {
    /// An empty path with the default (`Winding`) fill type.
    pub fn new() -> Path {
        Path::default()
    }

    /// An empty path with the given fill type.
    pub fn with_fill_type(fill_type: FillType) -> Path {
        Path {
            fill_type,
            ..Path::default()
        }
    }

    /// Starts a new contour.
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.pending_move = Some(p.into());
        self
    }

    fn current_point(&self) -> Point {
        if let Some(p) = self.pending_move {
            return p;
        }
        self.contours.last().map_or(Point::ZERO, |c| {
            if c.closed {
                c.start
            } else {
                c.end()
            }
        })
    }

    fn push_curve(&mut self, c: Curve) {
        let open_contour = self.pending_move.is_none()
            && self.contours.last().is_some_and(|c| !c.closed);
        if !open_contour {
            let start = self.current_point();
            self.pending_move = None;
            self.contours.push(Contour {
                start,
                curves: Vec::new(),
                closed: false,
            });
        }
        if let Some(contour) = self.contours.last_mut() {
            contour.curves.push(c);
        }
    }

    /// Adds a line from the current point.
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p0 = self.current_point();
        self.push_curve(Line::new(p0, p.into()).into());
        self
    }

    /// Adds a quadratic Bézier from the current point.
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let p0 = self.current_point();
        self.push_curve(QuadBez::new(p0, p1.into(), p2.into()).into());
        self
    }

    /// Adds a conic (rational quadratic) from the current point.
    pub fn conic_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>, weight: f64) -> &mut Self {
        let p0 = self.current_point();
        self.push_curve(Conic::new(p0, p1, p2, weight).into());
        self
    }

    /// Adds a cubic Bézier from the current point.
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let p0 = self.current_point();
        self.push_curve(CubicBez::new(p0, p1.into(), p2.into(), p3.into()).into());
        self
    }

    /// Closes the current contour.
    pub fn close(&mut self) -> &mut Self {
        if self.pending_move.is_none() {
            if let Some(c) = self.contours.last_mut() {
                c.closed = true;
            }
        }
        self
    }

    /// Sets the fill type.
    pub fn set_fill_type(&mut self, fill_type: FillType) -> &mut Self {
        self.fill_type = fill_type;
        self
    }

    /// The fill type.
    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    /// Removes all contours and restores the default fill type.
    pub fn reset(&mut self) -> &mut Self {
        *self = Path::default();
        self
    }

    /// Appends a whole contour.
    pub fn push_contour(&mut self, contour: Contour) {
        self.pending_move = None;
        self.contours.push(contour);
    }

    /// The contours of this path.
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Does this path have no curves at all?
    ///
    /// Note that an empty path with an inverse fill type covers the whole plane.
    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.curves.is_empty())
    }

    /// The bounding box of all the curves, or `None` for an empty path.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.contours
            .iter()
            .flat_map(|c| c.curves.iter())
            .map(Curve::bounding_box)
            .reduce(|a, b| a.union(b))
    }

    /// The signed area of the path, counting each contour with its orientation.
    ///
    /// For the output of a boolean operation (whose contours never overlap,
    /// and whose holes run opposite to their outer boundaries) this is the
    /// area of the filled region. The fill type is ignored.
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::area).sum()
    }

    /// The total number of curves, excluding implicit closing lines.
    pub fn curve_count(&self) -> usize {
        self.contours.iter().map(|c| c.curves.len()).sum()
    }

    /// Checks that every coordinate is finite.
    ///
    /// A conic weight that is not positive is reported as [`Error::Infinity`].
    pub fn validate(&self) -> Result<(), Error> {
        let curves = || self.contours.iter().flat_map(|c| c.curves.iter());
        if curves().any(Curve::is_nan) {
            return Err(Error::NaN);
        }
        if !curves().all(Curve::is_finite) {
            return Err(Error::Infinity);
        }
        Ok(())
    }

    /// Converts a `kurbo` path.
    pub fn from_bez_path(bez: &BezPath, fill_type: FillType) -> Path {
        let mut ret = Path::with_fill_type(fill_type);
        for el in bez.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    ret.move_to(p);
                }
                PathEl::LineTo(p) => {
                    ret.line_to(p);
                }
                PathEl::QuadTo(p1, p2) => {
                    ret.quad_to(p1, p2);
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    ret.cubic_to(p1, p2, p3);
                }
                PathEl::ClosePath => {
                    ret.close();
                }
            }
        }
        ret
    }

    /// Converts to a `kurbo` path. Conics are approximated by quadratics, and
    /// the fill type is dropped.
    pub fn to_bez_path(&self) -> BezPath {
        let mut ret = BezPath::new();
        for c in &self.contours {
            ret.move_to(c.start);
            for curve in &c.curves {
                for el in curve.to_path_els() {
                    ret.push(el);
                }
            }
            if c.closed {
                ret.close_path();
            }
        }
        ret
    }
}

/// An error from parsing the text form of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A token that isn't a verb, a fill type, or where a number was expected.
    #[error("unexpected token {token:?} at byte {offset}")]
    UnexpectedToken {
        /// The offending token.
        token: String,
        /// Its byte offset.
        offset: usize,
    },
    /// A number that doesn't parse.
    #[error("invalid number {token:?} at byte {offset}")]
    InvalidNumber {
        /// The offending token.
        token: String,
        /// Its byte offset.
        offset: usize,
    },
    /// The input ended in the middle of a verb's coordinates.
    #[error("the input ended before all the coordinates of {verb:?}")]
    MissingCoordinates {
        /// The verb whose coordinates were cut short.
        verb: String,
    },
}

fn tokens(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .map(move |tok| (tok.as_ptr() as usize - s.as_ptr() as usize, tok))
}

fn parse_number(offset: usize, tok: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        token: tok.to_owned(),
        offset,
    };
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        if hex.len() != 8 {
            return Err(invalid());
        }
        u32::from_str_radix(hex, 16)
            .map(bits)
            .map_err(|_| invalid())
    } else {
        tok.parse::<f64>().map_err(|_| invalid())
    }
}

impl std::str::FromStr for Path {
    type Err = ParseError;

    /// Parses the text form of a path.
    ///
    /// The syntax is a whitespace- (or comma-) separated list of tokens: an
    /// optional fill type (`evenodd`, `winding`, `inverse-evenodd`,
    /// `inverse-winding`) followed by verbs `M x y`, `L x y`, `Q x1 y1 x y`,
    /// `K x1 y1 x y w`, `C x1 y1 x2 y2 x y` and `Z`. A number is either a
    /// decimal float or `0x` followed by the eight hex digits of an `f32` bit
    /// pattern.
    fn from_str(s: &str) -> Result<Path, ParseError> {
        let mut path = Path::new();
        let mut toks = tokens(s).peekable();

        if let Some((_, tok)) = toks.peek() {
            if let Ok(fill) = tok.parse::<FillType>() {
                path.set_fill_type(fill);
                toks.next();
            }
        }

        while let Some((offset, verb)) = toks.next() {
            let arity = match verb {
                "M" | "L" => 2,
                "Q" => 4,
                "K" => 5,
                "C" => 6,
                "Z" => 0,
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        token: verb.to_owned(),
                        offset,
                    })
                }
            };
            let mut nums = [0.0; 6];
            for num in nums.iter_mut().take(arity) {
                let (offset, tok) = toks.next().ok_or_else(|| ParseError::MissingCoordinates {
                    verb: verb.to_owned(),
                })?;
                *num = parse_number(offset, tok)?;
            }
            let [a, b, c, d, e, f] = nums;
            match verb {
                "M" => path.move_to((a, b)),
                "L" => path.line_to((a, b)),
                "Q" => path.quad_to((a, b), (c, d)),
                "K" => path.conic_to((a, b), (c, d), e),
                "C" => path.cubic_to((a, b), (c, d), (e, f)),
                _ => path.close(),
            };
        }
        Ok(path)
    }
}

// Writes a coordinate. In alternate mode, values that are exactly
// representable as `f32` are written as bit patterns.
fn write_num(f: &mut std::fmt::Formatter<'_>, x: f64) -> std::fmt::Result {
    if f.alternate() && (x as f32) as f64 == x {
        write!(f, " 0x{:08x}", (x as f32).to_bits())
    } else {
        write!(f, " {x:?}")
    }
}

fn write_point(f: &mut std::fmt::Formatter<'_>, p: Point) -> std::fmt::Result {
    write_num(f, p.x)?;
    write_num(f, p.y)
}

impl std::fmt::Display for Path {
    /// Writes the text form accepted by [`str::parse`].
    ///
    /// With the alternate flag (`{:#}`), coordinates that are exact `f32`s are
    /// written as bit patterns, so the text round-trips bit-exactly.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fill_type)?;
        for c in &self.contours {
            write!(f, " M")?;
            write_point(f, c.start)?;
            for curve in &c.curves {
                match *curve {
                    Curve::Line(l) => {
                        write!(f, " L")?;
                        write_point(f, l.p1)?;
                    }
                    Curve::Quad(q) => {
                        write!(f, " Q")?;
                        write_point(f, q.p1)?;
                        write_point(f, q.p2)?;
                    }
                    Curve::Conic(k) => {
                        write!(f, " K")?;
                        write_point(f, k.p1)?;
                        write_point(f, k.p2)?;
                        write_num(f, k.weight)?;
                    }
                    Curve::Cubic(cb) => {
                        write!(f, " C")?;
                        write_point(f, cb.p1)?;
                        write_point(f, cb.p2)?;
                        write_point(f, cb.p3)?;
                    }
                }
            }
            if c.closed {
                write!(f, " Z")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn builder_contours() {
        let mut p = Path::new();
        p.move_to((0.0, 0.0))
            .line_to((1.0, 0.0))
            .line_to((1.0, 1.0))
            .close()
            .line_to((0.0, 1.0))
            .close();
        assert_eq!(p.contours().len(), 2);
        // Drawing after a close starts from the closed contour's start.
        assert_eq!(p.contours()[1].start(), Point::new(0.0, 0.0));
        assert!(p.contours().iter().all(Contour::is_closed));
        assert_eq!(p.curve_count(), 3);
    }

    #[test]
    fn move_without_draw_is_dropped() {
        let mut p = Path::new();
        p.move_to((5.0, 5.0)).move_to((0.0, 0.0)).line_to((1.0, 0.0));
        assert_eq!(p.contours().len(), 1);
        assert_eq!(p.contours()[0].start(), Point::ZERO);
        p.move_to((3.0, 3.0));
        assert_eq!(p.contours().len(), 1);
    }

    #[test]
    fn open_contours_are_filled_closed() {
        let mut p = Path::new();
        p.move_to((0.0, 0.0)).line_to((2.0, 0.0)).line_to((2.0, 2.0));
        let c = &p.contours()[0];
        assert!(!c.is_closed());
        assert_eq!(c.closing_line(), Some(Line::new((2.0, 2.0), (0.0, 0.0))));
        assert!((p.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_everything() {
        let mut p = Path::with_fill_type(FillType::InverseEvenOdd);
        p.move_to((0.0, 0.0)).line_to((1.0, 0.0));
        p.reset();
        assert!(p.is_empty());
        assert_eq!(p.fill_type(), FillType::Winding);
    }

    #[test]
    fn validation() {
        let mut p = Path::new();
        p.move_to((0.0, 0.0)).line_to((f64::INFINITY, 0.0));
        assert_matches!(p.validate(), Err(Error::Infinity));

        let mut p = Path::new();
        p.move_to((0.0, 0.0)).cubic_to((1.0, 1.0), (f64::NAN, 0.0), (2.0, 0.0));
        assert_matches!(p.validate(), Err(Error::NaN));

        let mut p = Path::new();
        p.move_to((0.0, 0.0)).conic_to((1.0, 1.0), (2.0, 0.0), -1.0);
        assert_matches!(p.validate(), Err(Error::Infinity));
    }

    #[test]
    fn parse_bits() {
        let p: Path = "evenodd M 0x00000000 0xc2700000 L 0 -83 Z".parse().unwrap();
        assert_eq!(p.fill_type(), FillType::EvenOdd);
        assert_eq!(p.contours()[0].start(), Point::new(0.0, -60.0));
        assert_eq!(p.contours()[0].end(), Point::new(0.0, -83.0));
        assert_eq!(bits(0x3f800000), 1.0);
        // The smallest positive denormal survives.
        assert_eq!(bits(1), f32::from_bits(1) as f64);
        assert!(bits(1) > 0.0);
    }

    #[test]
    fn parse_errors() {
        assert_matches!(
            "M 0 0 X 1".parse::<Path>(),
            Err(ParseError::UnexpectedToken { offset: 6, .. })
        );
        assert_matches!(
            "M 0 0x123".parse::<Path>(),
            Err(ParseError::InvalidNumber { offset: 4, .. })
        );
        assert_matches!(
            "M 0 0 C 1 1 2".parse::<Path>(),
            Err(ParseError::MissingCoordinates { .. })
        );
    }

    #[test]
    fn display_round_trip() {
        let mut p = Path::with_fill_type(FillType::InverseWinding);
        p.move_to((bits(0x3e58775b), -60.0))
            .cubic_to((0.1, 0.2), (bits(0x00000001), 3.0), (4.0, 5.0))
            .conic_to((1.0, 1.0), (0.0, 1.0), 0.5)
            .close()
            .move_to((7.0, 7.0))
            .quad_to((8.0, 9.0), (10.0, 7.0));

        let plain: Path = p.to_string().parse().unwrap();
        assert_eq!(plain, p);
        let hex = format!("{p:#}");
        assert!(hex.contains("0x3e58775b"));
        let from_hex: Path = hex.parse().unwrap();
        assert_eq!(from_hex, p);
    }

    #[test]
    fn display_format() {
        let p: Path = "evenodd M 0 0 L 1.5 0 Q 1.5 0.1 0 1 Z".parse().unwrap();
        insta::assert_snapshot!(p.to_string(), @"evenodd M 0.0 0.0 L 1.5 0.0 Q 1.5 0.1 0.0 1.0 Z");
        insta::assert_snapshot!(
            format!("{p:#}"),
            @"evenodd M 0x00000000 0x00000000 L 0x3fc00000 0x00000000 Q 0x3fc00000 0.1 0x00000000 0x3f800000 Z"
        );
    }

    #[test]
    fn bez_path_conversion() {
        let bez = BezPath::from_svg("M0,0 L10,0 Q10,10 0,10 Z M20,20 C21,21 22,21 23,20").unwrap();
        let p = Path::from_bez_path(&bez, FillType::EvenOdd);
        assert_eq!(p.contours().len(), 2);
        assert_eq!(p.to_bez_path(), bez);
    }
}
