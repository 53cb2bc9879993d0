//! # block-engine
//!
//! Multi-tenant schedule blocking for appointment booking.
//!
//! A block closes a business, or one staff member of a business, for a range
//! of calendar days: a vacation, a public holiday, an emergency closure. A
//! block may cover whole days or the same `HH:MM` window on each day. The
//! engine stores blocks per tenant, answers calendar range queries, and tells
//! a booking flow whether a given date and time is closed.
//!
//! ## Modules
//!
//! - [`record`] — the block entity, typed ids, `HH:MM` times
//! - [`validator`] — pure field validation
//! - [`resolver`] — does a block close a date/time for a staff member?
//! - [`repository`] — tenant-scoped storage trait and overlap predicates
//! - [`memory`] — indexed in-memory repository
//! - [`file_store`] — JSON-file repository
//! - [`tenant`] — tenant existence lookup
//! - [`lifecycle`] — use cases over an injected repository
//! - [`error`] — Error types

pub mod error;
pub mod file_store;
pub mod lifecycle;
pub mod memory;
pub mod record;
pub mod repository;
pub mod resolver;
pub mod tenant;
pub mod validator;

pub use error::{BlockError, ErrorKind};
pub use file_store::FileBlockRepository;
pub use lifecycle::{parse_date, parse_time, BlockLifecycleManager};
pub use memory::InMemoryBlockRepository;
pub use record::{
    BlockDraft, BlockId, BlockKind, BlockPatch, BlockRecord, ClockTime, Coverage, NewBlock,
    StaffId, TenantId,
};
pub use repository::{BlockFilter, BlockRepository};
pub use resolver::{find_blocking, is_blocked, BlockQuery};
pub use tenant::{StaticTenantDirectory, TenantDirectory};
pub use validator::ValidationLimits;
