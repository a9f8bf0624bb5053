#![allow(dead_code)]

use deeppcb2yolo::ir::{AnnotationLine, DefectClass};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Pixel tolerance after a six-decimal label round trip.
pub fn eps_yolo(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-6
}

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

pub fn arb_defect_class() -> BoxedStrategy<DefectClass> {
    prop::sample::select(DefectClass::ALL.to_vec()).boxed()
}

/// An image size together with an ordered annotation line inside it.
pub fn arb_line_within_image() -> BoxedStrategy<((u32, u32), AnnotationLine)> {
    (2u32..=4096, 2u32..=4096)
        .prop_flat_map(|(width, height)| {
            (
                Just((width, height)),
                arb_defect_class(),
                any::<(u32, u32, u32, u32)>(),
            )
        })
        .prop_map(|((width, height), class, (sx, sy, sw, sh))| {
            let x1 = sx % (width - 1);
            let y1 = sy % (height - 1);
            let x2 = x1 + 1 + (sw % (width - x1));
            let y2 = y1 + 1 + (sh % (height - y1));
            let line = AnnotationLine {
                x1: x1 as i64,
                y1: y1 as i64,
                x2: x2.min(width) as i64,
                y2: y2.min(height) as i64,
                class,
            };
            ((width, height), line)
        })
        .boxed()
}

/// Text shaped like a raw annotation line, valid or not.
pub fn arb_annotation_text() -> BoxedStrategy<String> {
    let token = prop_oneof![
        (-100_000i64..100_000).prop_map(|v| v.to_string()),
        (0i64..=8).prop_map(|v| v.to_string()),
        proptest::string::string_regex("[a-z.\\-]{0,4}").expect("valid token regex"),
    ];
    let separator = prop_oneof![Just(" "), Just(","), Just(", "), Just("\t")];

    proptest::collection::vec((token, separator), 0..8)
        .prop_map(|parts| {
            parts
                .into_iter()
                .map(|(token, sep)| format!("{token}{sep}"))
                .collect::<String>()
        })
        .boxed()
}
