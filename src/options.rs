//! Tolerances and budgets.

use crate::path::Path;

/// Knobs controlling the numerical behavior of a boolean operation.
///
/// [`OpOptions::for_paths`] picks tolerances suited to the inputs; the
/// `Default` is tuned for coordinates of order one.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OpOptions {
    /// Points closer than this are the same point. Intersections are merged,
    /// curves shorter than this are dropped, and curves that stay within this
    /// distance of one another are coincident.
    pub point_tolerance: f64,
    /// Curve parameters this close to `0` or `1` are snapped to the endpoint.
    pub param_tolerance: f64,
    /// Intersections where the sine of the angle between the two tangents is
    /// below this are flagged as tangent.
    pub tangent_tolerance: f64,
    /// The maximum number of times a curve may be subdivided while searching
    /// for intersections with one other curve.
    pub max_clip_depth: u32,
    /// The maximum number of steps of the intersection search for one pair of curves.
    pub max_clip_steps: usize,
    /// The maximum number of spans that one operation may create.
    pub max_spans: usize,
    /// Where to draw the spans of each operation, for debugging.
    #[cfg(feature = "debug-svg")]
    pub debug_svg: Option<std::path::PathBuf>,
}

// Inputs are typically single-precision, so points that agree to within a few
// f32 ulps (relative to the size of the input) are treated as equal.
const RELATIVE_TOLERANCE: f64 = f32::EPSILON as f64 * 8.0;
const MIN_TOLERANCE: f64 = 1e-9;

impl Default for OpOptions {
    fn default() -> Self {
        OpOptions {
            point_tolerance: RELATIVE_TOLERANCE,
            param_tolerance: 1e-9,
            tangent_tolerance: 1e-6,
            max_clip_depth: 64,
            max_clip_steps: 1 << 14,
            max_spans: 1 << 20,
            #[cfg(feature = "debug-svg")]
            debug_svg: None,
        }
    }
}

impl OpOptions {
    /// Options with a point tolerance scaled to the magnitude of the input coordinates.
    pub fn for_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> OpOptions {
        let m = paths
            .into_iter()
            .filter_map(Path::bounding_box)
            .map(|b| b.x0.abs().max(b.x1.abs()).max(b.y0.abs()).max(b.y1.abs()))
            .fold(0.0, f64::max);
        OpOptions::for_magnitude(m)
    }

    /// Options with a point tolerance suited to coordinates of magnitude `m`.
    pub fn for_magnitude(m: f64) -> OpOptions {
        let point_tolerance = if m.is_finite() {
            (m * RELATIVE_TOLERANCE).max(MIN_TOLERANCE)
        } else {
            RELATIVE_TOLERANCE
        };
        OpOptions {
            point_tolerance,
            ..OpOptions::default()
        }
    }
}
