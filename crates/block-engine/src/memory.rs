//! In-memory [`BlockRepository`] with ordered secondary indexes.
//!
//! Records live in a hash map keyed by id. Three ordered sets mirror the
//! indexes a database deployment would declare:
//!
//! - `window`: `(tenant, start_date, end_date, id)` for overlap queries
//! - `staff`: `(tenant, staff, active, id)` for per-staff listings
//! - `activity`: `(tenant, active, start_date, id)` for active/inactive listings
//!
//! Overlap queries scan `window` from the tenant's first entry up to the
//! query end, so blocks starting after the window are never visited.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BlockError, Result};
use crate::record::{BlockDraft, BlockId, BlockRecord, StaffId, TenantId};
use crate::repository::{
    in_staff_scope, overlaps_day, overlaps_range, sort_records, BlockFilter, BlockRepository,
};

const MIN_ID: BlockId = BlockId::from_uuid(Uuid::from_u128(0));
const MAX_ID: BlockId = BlockId::from_uuid(Uuid::from_u128(u128::MAX));

type WindowKey = (TenantId, NaiveDate, NaiveDate, BlockId);
type StaffKey = (TenantId, Option<StaffId>, bool, BlockId);
type ActivityKey = (TenantId, bool, NaiveDate, BlockId);

#[derive(Debug, Default)]
struct Store {
    records: HashMap<BlockId, BlockRecord>,
    window: BTreeSet<WindowKey>,
    staff: BTreeSet<StaffKey>,
    activity: BTreeSet<ActivityKey>,
}

impl Store {
    fn insert(&mut self, record: BlockRecord) {
        self.window.insert(window_key(&record));
        self.staff.insert(staff_key(&record));
        self.activity.insert(activity_key(&record));
        self.records.insert(record.id, record);
    }

    fn unindex(&mut self, record: &BlockRecord) {
        self.window.remove(&window_key(record));
        self.staff.remove(&staff_key(record));
        self.activity.remove(&activity_key(record));
    }

    /// Apply `change` to a tenant's record, keeping the indexes in step.
    fn modify<F>(&mut self, tenant_id: &TenantId, id: BlockId, change: F) -> Result<BlockRecord>
    where
        F: FnOnce(&mut BlockRecord),
    {
        let mut record = match self.records.get(&id) {
            Some(record) if &record.tenant_id == tenant_id => record.clone(),
            _ => return Err(BlockError::block_not_found(id)),
        };
        self.unindex(&record);
        change(&mut record);
        self.insert(record.clone());
        Ok(record)
    }

    fn collect<'a>(&self, ids: impl Iterator<Item = &'a BlockId>) -> Vec<BlockRecord> {
        ids.filter_map(|id| self.records.get(id)).cloned().collect()
    }

    fn window_range(&self, tenant_id: &TenantId, last_start: NaiveDate) -> Vec<BlockRecord> {
        let range: RangeInclusive<WindowKey> = (
            tenant_id.clone(),
            NaiveDate::MIN,
            NaiveDate::MIN,
            MIN_ID,
        )
            ..=(tenant_id.clone(), last_start, NaiveDate::MAX, MAX_ID);
        self.collect(self.window.range(range).map(|(_, _, _, id)| id))
    }

    fn by_tenant(&self, tenant_id: &TenantId, filter: &BlockFilter) -> Vec<BlockRecord> {
        let candidates = match (&filter.staff_id, filter.active) {
            (Some(staff), Some(active)) => {
                let key = |id| (tenant_id.clone(), Some(staff.clone()), active, id);
                self.collect(self.staff.range(key(MIN_ID)..=key(MAX_ID)).map(|k| &k.3))
            }
            (None, Some(active)) => {
                let key = |day, id| (tenant_id.clone(), active, day, id);
                self.collect(
                    self.activity
                        .range(key(NaiveDate::MIN, MIN_ID)..=key(NaiveDate::MAX, MAX_ID))
                        .map(|k| &k.3),
                )
            }
            _ => self.window_range(tenant_id, NaiveDate::MAX),
        };
        let mut records: Vec<BlockRecord> =
            candidates.into_iter().filter(|r| filter.matches(r)).collect();
        sort_records(&mut records);
        records
    }
}

fn window_key(record: &BlockRecord) -> WindowKey {
    (
        record.tenant_id.clone(),
        record.start_date,
        record.end_date,
        record.id,
    )
}

fn staff_key(record: &BlockRecord) -> StaffKey {
    (
        record.tenant_id.clone(),
        record.staff_id.clone(),
        record.active,
        record.id,
    )
}

fn activity_key(record: &BlockRecord) -> ActivityKey {
    (
        record.tenant_id.clone(),
        record.active,
        record.start_date,
        record.id,
    )
}

/// Thread-safe in-memory block store.
#[derive(Debug, Default)]
pub struct InMemoryBlockRepository {
    store: RwLock<Store>,
}

impl InMemoryBlockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already persisted records, keeping their ids.
    pub fn from_records(records: impl IntoIterator<Item = BlockRecord>) -> Self {
        let mut store = Store::default();
        for record in records {
            store.insert(record);
        }
        Self {
            store: RwLock::new(store),
        }
    }

    /// Every record of every tenant, in listing order.
    pub fn snapshot(&self) -> Vec<BlockRecord> {
        let mut records: Vec<BlockRecord> = self.store.read().records.values().cloned().collect();
        sort_records(&mut records);
        records
    }

    pub fn len(&self) -> usize {
        self.store.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockRepository for InMemoryBlockRepository {
    fn save(&self, draft: BlockDraft) -> Result<BlockRecord> {
        let record = BlockRecord::from_draft(draft, BlockId::new_random(), Utc::now());
        self.store.write().insert(record.clone());
        Ok(record)
    }

    fn find_by_id(&self, tenant_id: &TenantId, id: BlockId) -> Result<Option<BlockRecord>> {
        let store = self.store.read();
        Ok(store
            .records
            .get(&id)
            .filter(|record| &record.tenant_id == tenant_id)
            .cloned())
    }

    fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
        filter: &BlockFilter,
    ) -> Result<Vec<BlockRecord>> {
        let records = self.store.read().by_tenant(tenant_id, filter);
        debug!(tenant_id = %tenant_id, ?filter, found = records.len(), "listed blocks");
        Ok(records)
    }

    fn find_by_date_range(
        &self,
        tenant_id: &TenantId,
        start: NaiveDate,
        end: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>> {
        // The encompassing clause admits records starting up to `start`.
        let last_start = start.max(end);
        let mut records: Vec<BlockRecord> = self
            .store
            .read()
            .window_range(tenant_id, last_start)
            .into_iter()
            .filter(|r| r.active && overlaps_range(r, start, end) && in_staff_scope(r, staff_id))
            .collect();
        sort_records(&mut records);
        debug!(
            tenant_id = %tenant_id,
            %start,
            %end,
            staff_id = ?staff_id,
            found = records.len(),
            "date range query"
        );
        Ok(records)
    }

    fn find_active_by_date(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>> {
        let mut records: Vec<BlockRecord> = self
            .store
            .read()
            .window_range(tenant_id, date)
            .into_iter()
            .filter(|r| r.active && overlaps_day(r, date) && in_staff_scope(r, staff_id))
            .collect();
        sort_records(&mut records);
        debug!(tenant_id = %tenant_id, %date, found = records.len(), "single day query");
        Ok(records)
    }

    fn update(&self, tenant_id: &TenantId, id: BlockId, draft: BlockDraft) -> Result<BlockRecord> {
        let now = Utc::now();
        self.store
            .write()
            .modify(tenant_id, id, |record| record.apply_draft(draft, now))
    }

    fn soft_delete(&self, tenant_id: &TenantId, id: BlockId) -> Result<()> {
        let now = Utc::now();
        self.store
            .write()
            .modify(tenant_id, id, |record| record.deactivate(now))
            .map(|_| ())
    }

    fn reactivate(&self, tenant_id: &TenantId, id: BlockId) -> Result<BlockRecord> {
        let now = Utc::now();
        self.store
            .write()
            .modify(tenant_id, id, |record| record.activate(now))
    }

    fn count_by_tenant(&self, tenant_id: &TenantId, filter: &BlockFilter) -> Result<usize> {
        Ok(self.store.read().by_tenant(tenant_id, filter).len())
    }
}
