//! Tests for block field validation.

use block_engine::validator::{validate_new_block, ValidationLimits};
use block_engine::{BlockError, BlockKind, ClockTime, Coverage, ErrorKind, NewBlock};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn vacation(start: NaiveDate, end: NaiveDate) -> NewBlock {
    NewBlock::full_day("shop-1", BlockKind::Vacation, start, end, "Summer", "owner")
}

fn field_of(err: BlockError) -> &'static str {
    match err {
        BlockError::Validation { field, .. } => field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// ── Dates ───────────────────────────────────────────────────────────────────

#[test]
fn end_before_start_is_rejected() {
    let input = vacation(date(2025, 6, 5), date(2025, 6, 1));
    let err = validate_new_block(&input, &ValidationLimits::default()).unwrap_err();
    assert_eq!(field_of(err), "end_date");
}

#[test]
fn single_day_block_is_accepted() {
    let input = vacation(date(2025, 6, 1), date(2025, 6, 1));
    let draft = validate_new_block(&input, &ValidationLimits::default()).unwrap();
    assert_eq!(draft.start_date, draft.end_date);
    assert_eq!(draft.coverage, Coverage::FullDay);
}

// ── Reason ──────────────────────────────────────────────────────────────────

#[test]
fn blank_reason_is_rejected() {
    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.reason = "   ".into();
    let err = validate_new_block(&input, &ValidationLimits::default()).unwrap_err();
    assert_eq!(field_of(err), "reason");
}

#[test]
fn reason_length_limit_counts_characters() {
    let limits = ValidationLimits::default();

    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.reason = "ñ".repeat(500);
    assert!(
        validate_new_block(&input, &limits).is_ok(),
        "500 multi-byte characters are within the limit"
    );

    input.reason = "a".repeat(501);
    let err = validate_new_block(&input, &limits).unwrap_err();
    assert_eq!(field_of(err), "reason");
}

#[test]
fn reason_is_trimmed() {
    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.reason = "  Family trip \n".into();
    let draft = validate_new_block(&input, &ValidationLimits::default()).unwrap();
    assert_eq!(draft.reason, "Family trip");
}

#[test]
fn custom_reason_limit_applies() {
    let limits = ValidationLimits {
        max_reason_chars: 5,
    };
    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.reason = "closed".into();
    assert!(validate_new_block(&input, &limits).is_err());
}

// ── Tenant & staff ──────────────────────────────────────────────────────────

#[test]
fn blank_tenant_is_an_isolation_violation() {
    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.tenant_id = " ".into();
    let err = validate_new_block(&input, &ValidationLimits::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TenantIsolation);
}

#[test]
fn blank_staff_means_shop_wide() {
    let mut input = vacation(date(2025, 6, 1), date(2025, 6, 2));
    input.staff_id = Some("".into());
    let draft = validate_new_block(&input, &ValidationLimits::default()).unwrap();
    assert!(draft.staff_id.is_none());
}

// ── Partial-day times ───────────────────────────────────────────────────────

#[test]
fn partial_day_requires_both_times() {
    let limits = ValidationLimits::default();

    let mut input = vacation(date(2025, 7, 1), date(2025, 7, 1));
    input.is_full_day = false;
    input.end_time = Some("16:00".into());
    assert_eq!(
        field_of(validate_new_block(&input, &limits).unwrap_err()),
        "start_time"
    );

    input.start_time = Some("14:00".into());
    input.end_time = None;
    assert_eq!(
        field_of(validate_new_block(&input, &limits).unwrap_err()),
        "end_time"
    );
}

#[test]
fn partial_day_rejects_malformed_times() {
    let limits = ValidationLimits::default();
    for (start, end, field) in [
        ("9:00", "16:00", "start_time"),
        ("24:00", "16:00", "start_time"),
        ("14:00", "16:60", "end_time"),
        ("14:00", "4pm", "end_time"),
    ] {
        let input = vacation(date(2025, 7, 1), date(2025, 7, 1)).between(start, end);
        let err = validate_new_block(&input, &limits).unwrap_err();
        assert_eq!(field_of(err), field, "{start}-{end}");
    }
}

#[test]
fn partial_day_times_are_parsed() {
    let input = vacation(date(2025, 7, 1), date(2025, 7, 1)).between("14:00", "16:30");
    let draft = validate_new_block(&input, &ValidationLimits::default()).unwrap();
    assert_eq!(
        draft.coverage,
        Coverage::Partial {
            start_time: ClockTime::from_hm(14, 0).unwrap(),
            end_time: ClockTime::from_hm(16, 30).unwrap(),
        }
    );
}

#[test]
fn full_day_ignores_supplied_times() {
    let mut input = vacation(date(2025, 7, 1), date(2025, 7, 1));
    input.start_time = Some("not a time".into());
    input.end_time = Some("also not".into());
    let draft = validate_new_block(&input, &ValidationLimits::default()).unwrap();
    assert_eq!(draft.coverage, Coverage::FullDay);
}

#[test]
fn inverted_partial_times_are_not_rejected() {
    // Known gap: start/end ordering is not validated.
    let input = vacation(date(2025, 7, 1), date(2025, 7, 1)).between("16:00", "14:00");
    assert!(validate_new_block(&input, &ValidationLimits::default()).is_ok());
}

// ── Kind ────────────────────────────────────────────────────────────────────

#[test]
fn unknown_kind_fails_to_parse() {
    let err = "SICK".parse::<BlockKind>().unwrap_err();
    assert_eq!(field_of(err), "kind");
    assert_eq!("emergency".parse::<BlockKind>().unwrap(), BlockKind::Emergency);
}

#[test]
fn kind_deserializes_with_the_same_rule_as_parsing() {
    for raw in ["\"HOLIDAY\"", "\"holiday\"", "\"Holiday\""] {
        let kind: BlockKind = serde_json::from_str(raw).unwrap();
        assert_eq!(kind, BlockKind::Holiday, "{raw}");
        assert_eq!(raw.trim_matches('"').parse::<BlockKind>().unwrap(), kind);
    }
    assert!(serde_json::from_str::<BlockKind>("\"SICK\"").is_err());
    assert_eq!(
        serde_json::to_string(&BlockKind::Holiday).unwrap(),
        "\"HOLIDAY\""
    );
}
