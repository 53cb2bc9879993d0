//! Decide whether a block closes a given point in time.
//!
//! Two granularities are checked independently:
//! - days: the record's `[start_date, end_date]` range is closed on both ends
//! - hours: a partial-day block covers `[start_time, end_time)`; the end
//!   minute itself is open
//!
//! A partial-day block queried without a time counts as blocking: a caller
//! who names no time is asking about the whole day.

use chrono::NaiveDate;

use crate::record::{BlockRecord, ClockTime, Coverage, StaffId};

/// A point to test against a set of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockQuery {
    pub date: NaiveDate,
    pub time: Option<ClockTime>,
    /// `None` asks about the shop as a whole: only shop-wide blocks match.
    pub staff_id: Option<StaffId>,
}

impl BlockQuery {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            time: None,
            staff_id: None,
        }
    }

    pub fn at(mut self, time: ClockTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn for_staff(mut self, staff_id: StaffId) -> Self {
        self.staff_id = Some(staff_id);
        self
    }
}

/// Day containment, refined by hour containment when a time is given.
///
/// Inactive records never block.
pub fn blocks_date_time(record: &BlockRecord, date: NaiveDate, time: Option<ClockTime>) -> bool {
    if !record.active {
        return false;
    }
    if date < record.start_date || date > record.end_date {
        return false;
    }
    match (record.coverage, time) {
        (Coverage::FullDay, _) => true,
        (Coverage::Partial { .. }, None) => true,
        (Coverage::Partial { .. }, Some(time)) => blocks_hour(record, time),
    }
}

/// Hour containment: `start <= time < end` in minutes since midnight.
///
/// Full-day records contain every time. An inverted partial range
/// (`start >= end`) contains none.
pub fn blocks_hour(record: &BlockRecord, time: ClockTime) -> bool {
    match record.coverage {
        Coverage::FullDay => true,
        Coverage::Partial {
            start_time,
            end_time,
        } => {
            let query = time.minutes_since_midnight();
            start_time.minutes_since_midnight() <= query
                && query < end_time.minutes_since_midnight()
        }
    }
}

/// Shop-wide records apply to every staff member; staff records only to
/// the same staff member.
pub fn applies_to_staff(record: &BlockRecord, staff_id: Option<&StaffId>) -> bool {
    match &record.staff_id {
        None => true,
        Some(owner) => staff_id == Some(owner),
    }
}

/// Return the first record that closes the query point, if any.
pub fn find_blocking<'a>(records: &'a [BlockRecord], query: &BlockQuery) -> Option<&'a BlockRecord> {
    records.iter().find(|record| {
        applies_to_staff(record, query.staff_id.as_ref())
            && blocks_date_time(record, query.date, query.time)
    })
}

/// True if any record closes the query point.
pub fn is_blocked(records: &[BlockRecord], query: &BlockQuery) -> bool {
    find_blocking(records, query).is_some()
}
