//! Persistence abstraction for blocks.
//!
//! Every operation takes a [`TenantId`], so an unscoped query cannot be
//! expressed. Implementations are expected to index
//! `(tenant, start_date, end_date)`, `(tenant, staff, active)` and
//! `(tenant, active, start_date)`; see [`crate::memory`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{BlockDraft, BlockId, BlockKind, BlockRecord, StaffId, TenantId};

/// Optional filters for tenant listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFilter {
    pub active: Option<bool>,
    pub kind: Option<BlockKind>,
    /// Exact match on the record's staff member; shop-wide records do not match.
    pub staff_id: Option<StaffId>,
}

impl BlockFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn inactive() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_staff(mut self, staff_id: StaffId) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    pub fn matches(&self, record: &BlockRecord) -> bool {
        self.active.is_none_or(|active| record.active == active)
            && self.kind.is_none_or(|kind| record.kind == kind)
            && self
                .staff_id
                .as_ref()
                .is_none_or(|staff| record.staff_id.as_ref() == Some(staff))
    }
}

/// Overlap between a record's day range and `[query_start, query_end]`.
///
/// A record matches when its start falls inside the window, its end falls
/// inside the window, or it encompasses the whole window.
pub fn overlaps_range(record: &BlockRecord, query_start: NaiveDate, query_end: NaiveDate) -> bool {
    let inside = |day: NaiveDate| query_start <= day && day <= query_end;
    inside(record.start_date)
        || inside(record.end_date)
        || (record.start_date <= query_start && record.end_date >= query_end)
}

/// Whether a record's day range contains `day`.
pub fn overlaps_day(record: &BlockRecord, day: NaiveDate) -> bool {
    record.start_date <= day && record.end_date >= day
}

/// Staff scoping for calendar queries: with no staff every block matches;
/// with a staff id, that staff member's blocks and shop-wide blocks match.
pub fn in_staff_scope(record: &BlockRecord, staff_id: Option<&StaffId>) -> bool {
    match (staff_id, &record.staff_id) {
        (None, _) | (_, None) => true,
        (Some(query), Some(owner)) => query == owner,
    }
}

/// Sort order for every listing: by day range, then creation.
pub(crate) fn sort_records(records: &mut [BlockRecord]) {
    records.sort_by(|a, b| {
        (a.start_date, a.end_date, a.created_at, a.id).cmp(&(
            b.start_date,
            b.end_date,
            b.created_at,
            b.id,
        ))
    });
}

/// Tenant-scoped block storage.
///
/// Listings are ordered by `start_date`, then `end_date`, then creation time.
pub trait BlockRepository: Send + Sync {
    /// Insert a validated draft, assigning its id and timestamps.
    fn save(&self, draft: BlockDraft) -> Result<BlockRecord>;

    fn find_by_id(&self, tenant_id: &TenantId, id: BlockId) -> Result<Option<BlockRecord>>;

    fn find_by_tenant(&self, tenant_id: &TenantId, filter: &BlockFilter)
        -> Result<Vec<BlockRecord>>;

    /// Active records whose day range overlaps `[start, end]`
    /// (see [`overlaps_range`]), scoped by [`in_staff_scope`].
    fn find_by_date_range(
        &self,
        tenant_id: &TenantId,
        start: NaiveDate,
        end: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>>;

    /// Active records whose day range contains `date`, scoped by
    /// [`in_staff_scope`].
    fn find_active_by_date(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>>;

    /// Replace the validated fields of a record.
    ///
    /// # Errors
    /// [`crate::BlockError::NotFound`] if no record matches id and tenant.
    fn update(&self, tenant_id: &TenantId, id: BlockId, draft: BlockDraft) -> Result<BlockRecord>;

    /// Set `active = false`. Records are never erased.
    ///
    /// # Errors
    /// [`crate::BlockError::NotFound`] if no record matches id and tenant.
    fn soft_delete(&self, tenant_id: &TenantId, id: BlockId) -> Result<()>;

    /// Set `active = true` on a soft-deleted record.
    ///
    /// # Errors
    /// [`crate::BlockError::NotFound`] if no record matches id and tenant.
    fn reactivate(&self, tenant_id: &TenantId, id: BlockId) -> Result<BlockRecord>;

    fn count_by_tenant(&self, tenant_id: &TenantId, filter: &BlockFilter) -> Result<usize>;
}
