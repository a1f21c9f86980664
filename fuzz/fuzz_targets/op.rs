#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use pathops::Error;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(a) = pathops::arbitrary::path(1e3, &mut u) else {
        return;
    };
    let Ok(b) = pathops::arbitrary::another_path(&a, 1e3, &mut u) else {
        return;
    };
    let Ok(op) = pathops::arbitrary::binary_op(&mut u) else {
        return;
    };

    match pathops::op(&a, &b, op) {
        Ok(out) => {
            assert_eq!(
                out.fill_type().is_inverse(),
                op.apply(a.fill_type().is_inverse(), b.fill_type().is_inverse())
            );
            for c in out.contours() {
                assert!(c.is_closed());
                assert!(c.closing_line().is_none());
            }
        }
        Err(Error::Convergence { .. } | Error::Topology { .. } | Error::TooManySpans { .. }) => {}
        Err(e) => panic!("{e} for {a:#} {op} {b:#}"),
    }
});
