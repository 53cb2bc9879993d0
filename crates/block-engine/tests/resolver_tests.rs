//! Tests for day/hour containment and staff scope resolution.

use block_engine::resolver::{applies_to_staff, blocks_date_time, find_blocking, is_blocked};
use block_engine::{
    BlockDraft, BlockId, BlockKind, BlockQuery, BlockRecord, ClockTime, Coverage, StaffId,
    TenantId,
};
use chrono::{NaiveDate, Utc};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(raw: &str) -> ClockTime {
    ClockTime::parse(raw, "time").unwrap()
}

fn record(
    staff: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
    coverage: Coverage,
) -> BlockRecord {
    let draft = BlockDraft {
        tenant_id: TenantId::parse("shop-1", "test").unwrap(),
        staff_id: staff.map(StaffId::new),
        kind: BlockKind::Vacation,
        start_date: start,
        end_date: end,
        coverage,
        reason: "test".into(),
        created_by: "owner".into(),
    };
    BlockRecord::from_draft(draft, BlockId::new_random(), Utc::now())
}

fn partial(start: &str, end: &str) -> Coverage {
    Coverage::Partial {
        start_time: time(start),
        end_time: time(end),
    }
}

// ── Day containment ─────────────────────────────────────────────────────────

#[test]
fn day_range_is_inclusive_on_both_ends() {
    let r = record(None, date(2025, 6, 1), date(2025, 6, 5), Coverage::FullDay);

    assert!(!blocks_date_time(&r, date(2025, 5, 31), None));
    assert!(blocks_date_time(&r, date(2025, 6, 1), None));
    assert!(blocks_date_time(&r, date(2025, 6, 3), None));
    assert!(blocks_date_time(&r, date(2025, 6, 5), None));
    assert!(!blocks_date_time(&r, date(2025, 6, 6), None));
}

#[test]
fn full_day_block_covers_every_time() {
    let r = record(None, date(2025, 6, 1), date(2025, 6, 1), Coverage::FullDay);
    for t in ["00:00", "12:00", "23:59"] {
        assert!(blocks_date_time(&r, date(2025, 6, 1), Some(time(t))), "{t}");
    }
}

#[test]
fn inactive_block_never_blocks() {
    let mut r = record(None, date(2025, 6, 1), date(2025, 6, 5), Coverage::FullDay);
    r.deactivate(Utc::now());

    assert!(!blocks_date_time(&r, date(2025, 6, 3), None));
    assert!(!blocks_date_time(&r, date(2025, 6, 3), Some(time("10:00"))));
}

// ── Hour containment ────────────────────────────────────────────────────────

#[test]
fn partial_block_end_minute_is_open() {
    let r = record(None, date(2025, 7, 1), date(2025, 7, 1), partial("14:00", "16:00"));

    assert!(!blocks_date_time(&r, date(2025, 7, 1), Some(time("13:59"))));
    assert!(blocks_date_time(&r, date(2025, 7, 1), Some(time("14:00"))));
    assert!(blocks_date_time(&r, date(2025, 7, 1), Some(time("15:00"))));
    assert!(!blocks_date_time(&r, date(2025, 7, 1), Some(time("16:00"))));
}

#[test]
fn partial_block_without_query_time_blocks_the_day() {
    let r = record(None, date(2025, 7, 1), date(2025, 7, 1), partial("14:00", "16:00"));
    assert!(blocks_date_time(&r, date(2025, 7, 1), None));
    assert!(!blocks_date_time(&r, date(2025, 7, 2), None));
}

#[test]
fn partial_block_repeats_on_each_day_of_range() {
    let r = record(None, date(2025, 7, 1), date(2025, 7, 3), partial("09:00", "10:00"));
    for day in 1..=3 {
        assert!(blocks_date_time(&r, date(2025, 7, day), Some(time("09:30"))));
        assert!(!blocks_date_time(&r, date(2025, 7, day), Some(time("10:30"))));
    }
}

#[test]
fn inverted_partial_block_only_blocks_timeless_queries() {
    // Known gap: an inverted window is accepted and contains no minute.
    let r = record(None, date(2025, 7, 1), date(2025, 7, 1), partial("16:00", "14:00"));
    assert!(!blocks_date_time(&r, date(2025, 7, 1), Some(time("15:00"))));
    assert!(blocks_date_time(&r, date(2025, 7, 1), None));
}

// ── Staff scope ─────────────────────────────────────────────────────────────

#[test]
fn shop_wide_block_applies_to_everyone() {
    let r = record(None, date(2025, 6, 1), date(2025, 6, 1), Coverage::FullDay);
    assert!(applies_to_staff(&r, None));
    assert!(applies_to_staff(&r, Some(&StaffId::new("barberA"))));
}

#[test]
fn staff_block_applies_only_to_that_staff_member() {
    let r = record(Some("B1"), date(2025, 6, 1), date(2025, 6, 1), Coverage::FullDay);
    assert!(applies_to_staff(&r, Some(&StaffId::new("B1"))));
    assert!(!applies_to_staff(&r, Some(&StaffId::new("B2"))));
    assert!(!applies_to_staff(&r, None));
}

// ── Aggregates ──────────────────────────────────────────────────────────────

#[test]
fn find_blocking_returns_first_matching_record() {
    let other_staff = record(Some("B2"), date(2025, 7, 1), date(2025, 7, 1), Coverage::FullDay);
    let afternoon = record(Some("B1"), date(2025, 7, 1), date(2025, 7, 1), partial("14:00", "16:00"));
    let records = vec![other_staff, afternoon.clone()];

    let query = BlockQuery::on(date(2025, 7, 1))
        .at(time("15:00"))
        .for_staff(StaffId::new("B1"));
    assert_eq!(find_blocking(&records, &query), Some(&afternoon));

    let morning = BlockQuery::on(date(2025, 7, 1))
        .at(time("10:00"))
        .for_staff(StaffId::new("B1"));
    assert!(!is_blocked(&records, &morning));
}

#[test]
fn empty_record_list_blocks_nothing() {
    assert!(!is_blocked(&[], &BlockQuery::on(date(2025, 1, 1))));
}
