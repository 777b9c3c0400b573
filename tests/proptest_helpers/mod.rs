#![allow(dead_code)]

use labelprep::ir::{BBoxXYXY, Pixel};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Tolerance after a 6-decimal round trip, in pixels.
pub fn eps_pixels(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-6
}

pub fn arb_image_size() -> impl Strategy<Value = (u32, u32)> {
    (2u32..=4096, 2u32..=4096)
}

/// Integer-cornered, well-formed boxes inside a `width x height` image.
pub fn arb_bbox_within(width: u32, height: u32) -> BoxedStrategy<BBoxXYXY<Pixel>> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>())
        .prop_map(move |(sx, sy, sw, sh)| {
            let xmin = sx % (width - 1);
            let ymin = sy % (height - 1);
            let xmax = xmin + 1 + (sw % (width - xmin));
            let ymax = ymin + 1 + (sh % (height - ymin));
            BBoxXYXY::from_xyxy(xmin as f64, ymin as f64, xmax as f64, ymax as f64)
        })
        .boxed()
}

/// Populations of distinct, file-name-like ids.
pub fn arb_population(max_len: usize) -> BoxedStrategy<Vec<String>> {
    proptest::collection::btree_set(
        proptest::string::string_regex("[a-z0-9_]{1,12}").expect("valid id regex"),
        0..=max_len,
    )
    .prop_map(|ids| ids.into_iter().collect())
    .boxed()
}
