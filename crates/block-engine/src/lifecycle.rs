//! Block use cases: create, update, soft delete, reactivate, listings and
//! the booking conflict check.
//!
//! Tenant ids arrive as raw strings from the request layer. A blank tenant
//! aborts the operation with [`BlockError::TenantIsolation`] before any
//! storage is touched.

use chrono::{DateTime, NaiveDate};
use tracing::{info, warn};

use crate::error::{BlockError, Result};
use crate::record::{BlockId, BlockPatch, BlockRecord, ClockTime, NewBlock, StaffId, TenantId};
use crate::repository::{BlockFilter, BlockRepository};
use crate::resolver::{self, BlockQuery};
use crate::tenant::TenantDirectory;
use crate::validator::{validate_new_block, ValidationLimits};

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
/// A timestamp contributes only its calendar date, in its own offset.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            BlockError::validation("date", format!("'{raw}' is not a YYYY-MM-DD date"))
        })
}

/// Parse an `HH:MM` query time.
pub fn parse_time(raw: &str) -> Result<ClockTime> {
    ClockTime::parse(raw.trim(), "time")
}

/// Orchestrates block use cases over an injected repository and tenant
/// directory.
pub struct BlockLifecycleManager<R: BlockRepository, T: TenantDirectory> {
    repository: R,
    tenants: T,
    limits: ValidationLimits,
}

impl<R: BlockRepository, T: TenantDirectory> BlockLifecycleManager<R, T> {
    pub fn new(repository: R, tenants: T) -> Self {
        Self::with_limits(repository, tenants, ValidationLimits::default())
    }

    pub fn with_limits(repository: R, tenants: T, limits: ValidationLimits) -> Self {
        Self {
            repository,
            tenants,
            limits,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Validate and persist a new, active block.
    ///
    /// # Errors
    /// - [`BlockError::TenantIsolation`] for a blank tenant.
    /// - [`BlockError::NotFound`] if the tenant does not exist.
    /// - [`BlockError::Validation`] for invalid fields.
    pub fn create(&self, input: NewBlock) -> Result<BlockRecord> {
        let tenant_id = TenantId::parse(&input.tenant_id, "create block")?;
        if !self.tenants.exists(&tenant_id) {
            warn!(tenant_id = %tenant_id, "block rejected for unknown tenant");
            return Err(BlockError::NotFound {
                entity: "tenant",
                id: tenant_id.to_string(),
            });
        }
        let draft = validate_new_block(&input, &self.limits)?;
        let record = self.repository.save(draft)?;
        info!(
            tenant_id = %record.tenant_id,
            block_id = %record.id,
            kind = %record.kind,
            start = %record.start_date,
            end = %record.end_date,
            staff_id = ?record.staff_id,
            "block created"
        );
        Ok(record)
    }

    pub fn get(&self, tenant_id: &str, id: BlockId) -> Result<BlockRecord> {
        let tenant_id = TenantId::parse(tenant_id, "get block")?;
        self.repository
            .find_by_id(&tenant_id, id)?
            .ok_or_else(|| BlockError::block_not_found(id))
    }

    /// Apply `patch` and re-validate the merged block with the creation rules.
    pub fn update(&self, tenant_id: &str, id: BlockId, patch: BlockPatch) -> Result<BlockRecord> {
        let tenant_id = TenantId::parse(tenant_id, "update block")?;
        let current = self
            .repository
            .find_by_id(&tenant_id, id)?
            .ok_or_else(|| BlockError::block_not_found(id))?;
        if patch.is_empty() {
            return Ok(current);
        }
        let mut fields = current.to_new_block();
        patch.apply_to(&mut fields);
        let draft = validate_new_block(&fields, &self.limits)?;
        let record = self.repository.update(&tenant_id, id, draft)?;
        info!(tenant_id = %tenant_id, block_id = %id, "block updated");
        Ok(record)
    }

    /// Soft delete: the record stays, inactive.
    pub fn delete(&self, tenant_id: &str, id: BlockId) -> Result<()> {
        let tenant_id = TenantId::parse(tenant_id, "delete block")?;
        self.repository.soft_delete(&tenant_id, id)?;
        info!(tenant_id = %tenant_id, block_id = %id, "block deactivated");
        Ok(())
    }

    pub fn reactivate(&self, tenant_id: &str, id: BlockId) -> Result<BlockRecord> {
        let tenant_id = TenantId::parse(tenant_id, "reactivate block")?;
        let record = self.repository.reactivate(&tenant_id, id)?;
        info!(tenant_id = %tenant_id, block_id = %id, "block reactivated");
        Ok(record)
    }

    pub fn list(&self, tenant_id: &str, filter: &BlockFilter) -> Result<Vec<BlockRecord>> {
        let tenant_id = TenantId::parse(tenant_id, "list blocks")?;
        self.repository.find_by_tenant(&tenant_id, filter)
    }

    pub fn count(&self, tenant_id: &str, filter: &BlockFilter) -> Result<usize> {
        let tenant_id = TenantId::parse(tenant_id, "count blocks")?;
        self.repository.count_by_tenant(&tenant_id, filter)
    }

    /// Active blocks overlapping `[start, end]`. With a staff id, that staff
    /// member's blocks plus shop-wide blocks.
    ///
    /// # Errors
    /// [`BlockError::Validation`] when `start` is after `end`.
    pub fn list_by_date_range(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        staff_id: Option<&str>,
    ) -> Result<Vec<BlockRecord>> {
        let tenant_id = TenantId::parse(tenant_id, "list blocks by date range")?;
        if start > end {
            return Err(BlockError::validation(
                "end_date",
                format!("query end {end} is before query start {start}"),
            ));
        }
        let staff_id = StaffId::from_optional(staff_id);
        self.repository
            .find_by_date_range(&tenant_id, start, end, staff_id.as_ref())
    }

    /// Active blocks whose day range contains `date`.
    pub fn list_active_on_date(
        &self,
        tenant_id: &str,
        date: NaiveDate,
        staff_id: Option<&str>,
    ) -> Result<Vec<BlockRecord>> {
        let tenant_id = TenantId::parse(tenant_id, "list blocks on date")?;
        let staff_id = StaffId::from_optional(staff_id);
        self.repository
            .find_active_by_date(&tenant_id, date, staff_id.as_ref())
    }

    /// The first block that closes `date` (and `time`, if given) for the
    /// staff member, or for the whole shop when no staff id is given.
    pub fn blocking_record(
        &self,
        tenant_id: &str,
        staff_id: Option<&str>,
        date: NaiveDate,
        time: Option<ClockTime>,
    ) -> Result<Option<BlockRecord>> {
        let candidates = self.list_active_on_date(tenant_id, date, staff_id)?;
        let query = BlockQuery {
            date,
            time,
            staff_id: StaffId::from_optional(staff_id),
        };
        Ok(resolver::find_blocking(&candidates, &query).cloned())
    }

    /// Whether a booking at this point would fall inside a block.
    ///
    /// The check and a later booking are not atomic; uniqueness of
    /// bookings belongs to the reservation store.
    pub fn is_blocked(
        &self,
        tenant_id: &str,
        staff_id: Option<&str>,
        date: NaiveDate,
        time: Option<ClockTime>,
    ) -> Result<bool> {
        Ok(self
            .blocking_record(tenant_id, staff_id, date, time)?
            .is_some())
    }
}
