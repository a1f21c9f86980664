#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use pathops::{edges::Edges, intersect::find_intersections, OpOptions};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(a) = pathops::arbitrary::path(1e3, &mut u) else {
        return;
    };
    let Ok(b) = pathops::arbitrary::another_path(&a, 1e3, &mut u) else {
        return;
    };

    let opts = OpOptions::for_paths([&a, &b]);
    let edges = Edges::from_paths(&a, Some(&b), &opts);
    let Ok(table) = find_intersections(&edges, &opts) else {
        return;
    };
    // Intersection points get snapped to nearby endpoints, so allow a few
    // tolerances of slop.
    let slop = 64.0 * opts.point_tolerance;
    for (_, x) in table.iter() {
        let pa = edges[x.a].curve.point_at(x.ta);
        let pb = edges[x.b].curve.point_at(x.tb);
        assert!((pa - x.point).hypot() <= slop, "{x:?} is off the first edge");
        assert!((pb - x.point).hypot() <= slop, "{x:?} is off the second edge");
    }
});
