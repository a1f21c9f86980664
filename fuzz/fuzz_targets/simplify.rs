#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use pathops::Error;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(a) = pathops::arbitrary::path(1e3, &mut u) else {
        return;
    };

    match pathops::simplify(&a) {
        Ok(out) => {
            assert_eq!(out.fill_type().is_inverse(), a.fill_type().is_inverse());
            for c in out.contours() {
                assert!(c.is_closed());
                assert!(c.closing_line().is_none());
            }
            // Simplifying twice changes nothing but the contour order.
            if let Ok(again) = pathops::simplify(&out) {
                let scale = out.bounding_box().map_or(1.0, |r| r.area().max(1.0));
                assert!((again.area() - out.area()).abs() <= 1e-6 * scale);
            }
        }
        Err(Error::Convergence { .. } | Error::Topology { .. } | Error::TooManySpans { .. }) => {}
        Err(e) => panic!("{e} for {a:#}"),
    }
});
