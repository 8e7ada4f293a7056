// Property-based tests for identifier normalization and verdict dominance.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use serde_json::json;
use shipcheck_engine::evidence::overall_status;
use shipcheck_engine::model::Priority;
use shipcheck_engine::normalize::*;
use shipcheck_engine::{CheckStatus, OverallStatus, SourceKind, ValidationCheck};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Pass),
        Just(CheckStatus::Warning),
        Just(CheckStatus::Fail),
        Just(CheckStatus::Info),
    ]
}

/// Text that looks like OCR output: mostly identifier-ish, sometimes junk.
fn arb_noise() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[A-Za-z0-9 -]{0,16}",
        1 => r"\PC{0,12}",
        1 => Just(String::new()),
    ]
}

// ---------------------------------------------------------------------------
// Scalar normalizers
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn board_serial_gains_prefix(s in r"[0-9]{5}-[0-9]{4}") {
        let normalized = normalize_board_serial(&s);
        let expected = format!("VGN-{s}");
        prop_assert_eq!(normalized.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn board_serial_dashless_and_lowercase(a in r"[0-9]{5}", b in r"[0-9]{4}") {
        let expected = format!("VGN-{a}-{b}");
        prop_assert_eq!(normalize_board_serial(&format!("vgn{a}{b}")), Some(expected.clone()));
        prop_assert_eq!(normalize_board_serial(&format!("  {a}{b} ")), Some(expected));
    }

    #[test]
    fn unit_serial_gains_prefix(s in r"[0-9]{4}") {
        prop_assert_eq!(normalize_unit_serial(&s), Some(format!("INF-{s}")));
    }

    #[test]
    fn job_number_is_idempotent(s in r"[0-9]{5}") {
        let once = normalize_job_number(&s).unwrap();
        prop_assert_eq!(&once, &s);
        prop_assert_eq!(normalize_job_number(&once), Some(once.clone()));
    }

    #[test]
    fn canonical_values_are_fixed_points(
        board in r"VGN-[0-9]{5}-[0-9]{4}",
        unit in r"INF-[0-9]{4}",
        part in r"[A-Z]{3,5}-[A-Z0-9]{1,4}(-[0-9]{2})?",
        rev in r"[A-Z][0-9]?",
    ) {
        prop_assert_eq!(normalize_board_serial(&board), Some(board.clone()));
        prop_assert_eq!(normalize_unit_serial(&unit), Some(unit.clone()));
        prop_assert_eq!(normalize_part_number(&part), Some(part.clone()));
        prop_assert_eq!(normalize_revision(&rev), Some(rev.clone()));
    }

    #[test]
    fn normalizers_are_idempotent(raw in arb_noise()) {
        if let Some(once) = normalize_board_serial(&raw) {
            prop_assert_eq!(normalize_board_serial(&once), Some(once.clone()));
        }
        if let Some(once) = normalize_unit_serial(&raw) {
            prop_assert_eq!(normalize_unit_serial(&once), Some(once.clone()));
        }
        if let Some(once) = normalize_part_number(&raw) {
            prop_assert_eq!(normalize_part_number(&once), Some(once.clone()));
        }
        if let Some(once) = normalize_job_number(&raw) {
            prop_assert_eq!(normalize_job_number(&once), Some(once.clone()));
        }
    }

    #[test]
    fn normalizer_total_on_noise(
        job in arb_noise(),
        unit in arb_noise(),
        serials in prop::collection::vec(arb_noise(), 0..4),
        parts in prop::collection::vec(arb_noise(), 0..4),
    ) {
        let bag = json!({
            "job_number": job,
            "unit_serial": unit,
            "board_serials": serials,
            "part_numbers": parts,
        });
        let bag = bag.as_object().unwrap();
        let record = Normalizer::new().normalize_extracted_data(bag, SourceKind::Traveler);
        for serial in &record.board_serials {
            prop_assert!(serial.starts_with("VGN-") && serial.len() == 14);
        }
        for unit in &record.unit_serials {
            prop_assert!(unit.starts_with("INF-") && unit.len() == 8);
        }
        for job in &record.job_numbers {
            prop_assert_eq!(job.len(), 5);
        }
    }
}

// ---------------------------------------------------------------------------
// Record-level idempotence
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn renormalizing_a_record_is_a_no_op(
        job in r"(Job )?[0-9]{5}",
        unit in r"(INF-?|inf)?[0-9]{4}",
        serials in prop::collection::vec(r"(VGN-?)?[0-9]{5}-?[0-9]{4}", 0..4),
        parts in prop::collection::vec(r"[a-zA-Z]{3,5}-[0-9]{2,4}", 0..4),
    ) {
        let normalizer = Normalizer::new();
        let first_bag = json!({
            "job_number": job,
            "unit_serial": unit,
            "board_serials": serials,
            "part_numbers": parts,
        });
        let first = normalizer.normalize_extracted_data(first_bag.as_object().unwrap(), SourceKind::Image);

        let second_bag = json!({
            "job_numbers": first.job_numbers,
            "unit_serial": first.unit_serials.iter().next(),
            "board_serials": first.board_serials,
            "part_numbers": first.part_numbers,
        });
        let second = normalizer.normalize_extracted_data(second_bag.as_object().unwrap(), SourceKind::Image);

        prop_assert_eq!(&second.job_numbers, &first.job_numbers);
        prop_assert_eq!(&second.unit_serials, &first.unit_serials);
        prop_assert_eq!(&second.board_serials, &first.board_serials);
        prop_assert_eq!(&second.part_numbers, &first.part_numbers);
        prop_assert!(second.normalization_applied.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Verdict dominance
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn overall_status_dominance(statuses in prop::collection::vec(arb_status(), 0..12), strict in any::<bool>()) {
        let checks: Vec<ValidationCheck> = statuses
            .iter()
            .map(|s| ValidationCheck::new(1, "t", *s, Priority::Moderate, "m"))
            .collect();
        let any_fail = statuses.contains(&CheckStatus::Fail);
        let any_warn = statuses.contains(&CheckStatus::Warning);
        let expected = if any_fail || (strict && any_warn) {
            OverallStatus::Fail
        } else if any_warn {
            OverallStatus::Warning
        } else {
            OverallStatus::Pass
        };
        prop_assert_eq!(overall_status(&checks, strict), expected);
    }
}
