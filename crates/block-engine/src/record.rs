//! The block entity: an exception period that closes a tenant, or one staff
//! member of a tenant, over a range of calendar days.
//!
//! Raw caller input arrives as a [`NewBlock`]. It only becomes a
//! [`BlockDraft`] after passing [`crate::validator::validate_new_block`], and a
//! [`BlockRecord`] once a repository has assigned an id and timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BlockError;
use crate::validator;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of the owning business. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse a tenant id supplied by the request layer.
    ///
    /// A blank id fails with [`BlockError::TenantIsolation`]: the operation
    /// must abort rather than run unscoped.
    pub fn parse(raw: &str, operation: &'static str) -> Result<Self, BlockError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            tracing::warn!(operation, "tenant-scoped operation invoked without a tenant");
            return Err(BlockError::TenantIsolation { operation });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = BlockError;

    /// Used when loading stored records: a blank id is a data error.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BlockError::validation(
                "tenant_id",
                "stored record has a blank tenant id",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single staff member within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Blank input means "no staff member", i.e. shop-wide scope.
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record identifier, assigned at persistence time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for BlockId {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| BlockError::validation("id", format!("'{s}' is not a block id: {e}")))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Why the period is closed. Closed enumeration.
///
/// Written upper-case; parsed and deserialized case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum BlockKind {
    Vacation,
    Holiday,
    Emergency,
    Other,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Vacation,
        BlockKind::Holiday,
        BlockKind::Emergency,
        BlockKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Vacation => "VACATION",
            BlockKind::Holiday => "HOLIDAY",
            BlockKind::Emergency => "EMERGENCY",
            BlockKind::Other => "OTHER",
        }
    }
}

impl FromStr for BlockKind {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                BlockError::validation(
                    "kind",
                    format!("'{s}' is not one of VACATION, HOLIDAY, EMERGENCY, OTHER"),
                )
            })
    }
}

impl TryFrom<String> for BlockKind {
    type Error = BlockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Intraday extent
// ---------------------------------------------------------------------------

/// A wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    /// Parse a strict zero-padded 24-hour `HH:MM` string.
    pub fn parse(raw: &str, field: &'static str) -> Result<Self, BlockError> {
        if !validator::is_valid_time_format(raw) {
            return Err(BlockError::validation(
                field,
                format!("'{raw}' is not a 24-hour HH:MM time"),
            ));
        }
        let bytes = raw.as_bytes();
        let digit = |i: usize| u16::from(bytes[i] - b'0');
        let hours = digit(0) * 10 + digit(1);
        let minutes = digit(3) * 10 + digit(4);
        Ok(Self {
            minutes: hours * 60 + minutes,
        })
    }

    /// Build from an hour and minute; `None` when out of range.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self {
            minutes: hour * 60 + minute,
        })
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.minutes
    }
}

impl TryFrom<String> for ClockTime {
    type Error = BlockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value, "time")
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

/// How much of each day in the date range a block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "coverage", rename_all = "snake_case")]
pub enum Coverage {
    FullDay,
    /// `[start_time, end_time)` on every day of the range.
    /// `start_time < end_time` is not enforced.
    Partial {
        start_time: ClockTime,
        end_time: ClockTime,
    },
}

impl Coverage {
    pub fn is_full_day(&self) -> bool {
        matches!(self, Coverage::FullDay)
    }
}

// ---------------------------------------------------------------------------
// Input, draft, record
// ---------------------------------------------------------------------------

/// Raw fields for a block, as supplied by the request layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlock {
    pub tenant_id: String,
    /// `None` or blank means the block applies to the whole shop.
    pub staff_id: Option<String>,
    pub kind: BlockKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_full_day: bool,
    /// `HH:MM`; only read when `is_full_day` is false.
    pub start_time: Option<String>,
    /// `HH:MM`; only read when `is_full_day` is false.
    pub end_time: Option<String>,
    pub reason: String,
    pub created_by: String,
}

impl NewBlock {
    /// A shop-wide, full-day block.
    pub fn full_day(
        tenant_id: impl Into<String>,
        kind: BlockKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            staff_id: None,
            kind,
            start_date,
            end_date,
            is_full_day: true,
            start_time: None,
            end_time: None,
            reason: reason.into(),
            created_by: created_by.into(),
        }
    }

    /// Restrict the block to one staff member.
    pub fn for_staff(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    /// Restrict the block to `[start, end)` on each day of the range.
    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.is_full_day = false;
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }
}

/// A validated block that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDraft {
    pub tenant_id: TenantId,
    pub staff_id: Option<StaffId>,
    pub kind: BlockKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub coverage: Coverage,
    pub reason: String,
    pub created_by: String,
}

/// A persisted block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub tenant_id: TenantId,
    pub staff_id: Option<StaffId>,
    pub kind: BlockKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub coverage: Coverage,
    pub reason: String,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlockRecord {
    /// Materialize a draft. New records are always active.
    pub fn from_draft(draft: BlockDraft, id: BlockId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            tenant_id: draft.tenant_id,
            staff_id: draft.staff_id,
            kind: draft.kind,
            start_date: draft.start_date,
            end_date: draft.end_date,
            coverage: draft.coverage,
            reason: draft.reason,
            active: true,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_full_day(&self) -> bool {
        self.coverage.is_full_day()
    }

    pub fn is_shop_wide(&self) -> bool {
        self.staff_id.is_none()
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.updated_at = now;
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }

    /// The raw field view of this record, used to re-validate after a patch.
    pub fn to_new_block(&self) -> NewBlock {
        let (start_time, end_time) = match self.coverage {
            Coverage::FullDay => (None, None),
            Coverage::Partial {
                start_time,
                end_time,
            } => (Some(start_time.to_string()), Some(end_time.to_string())),
        };
        NewBlock {
            tenant_id: self.tenant_id.to_string(),
            staff_id: self.staff_id.as_ref().map(|s| s.to_string()),
            kind: self.kind,
            start_date: self.start_date,
            end_date: self.end_date,
            is_full_day: self.is_full_day(),
            start_time,
            end_time,
            reason: self.reason.clone(),
            created_by: self.created_by.clone(),
        }
    }

    /// Overwrite the validated fields of this record with `draft`.
    /// Identity, tenant, author, activity and creation time are kept.
    pub(crate) fn apply_draft(&mut self, draft: BlockDraft, now: DateTime<Utc>) {
        self.staff_id = draft.staff_id;
        self.kind = draft.kind;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.coverage = draft.coverage;
        self.reason = draft.reason;
        self.updated_at = now;
    }
}

/// Partial update of a block. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockPatch {
    /// `Some(Some(id))` = assign, `Some(None)` = make shop-wide, `None` = no change.
    pub staff_id: Option<Option<String>>,
    pub kind: Option<BlockKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_full_day: Option<bool>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

impl BlockPatch {
    pub fn is_empty(&self) -> bool {
        self.staff_id.is_none()
            && self.kind.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.is_full_day.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.reason.is_none()
    }

    /// Apply this patch on top of raw fields.
    pub fn apply_to(self, base: &mut NewBlock) {
        if let Some(staff_id) = self.staff_id {
            base.staff_id = staff_id;
        }
        if let Some(kind) = self.kind {
            base.kind = kind;
        }
        if let Some(start_date) = self.start_date {
            base.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            base.end_date = end_date;
        }
        if let Some(is_full_day) = self.is_full_day {
            base.is_full_day = is_full_day;
        }
        if let Some(start_time) = self.start_time {
            base.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            base.end_time = Some(end_time);
        }
        if let Some(reason) = self.reason {
            base.reason = reason;
        }
    }
}
