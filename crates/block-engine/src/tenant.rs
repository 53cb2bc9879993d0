//! Tenant lookup consumed by block creation.

use std::collections::HashSet;

use crate::record::TenantId;

/// Answers whether a tenant exists. Implemented by whatever owns tenants.
pub trait TenantDirectory: Send + Sync {
    fn exists(&self, tenant_id: &TenantId) -> bool;
}

/// A fixed set of known tenants.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    tenants: HashSet<TenantId>,
}

impl StaticTenantDirectory {
    /// Blank entries are skipped.
    pub fn new<I, S>(tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tenants = tenants
            .into_iter()
            .filter(|raw| !raw.as_ref().trim().is_empty())
            .filter_map(|raw| TenantId::parse(raw.as_ref(), "register tenant").ok())
            .collect();
        Self { tenants }
    }

    pub fn insert(&mut self, tenant_id: TenantId) {
        self.tenants.insert(tenant_id);
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl TenantDirectory for StaticTenantDirectory {
    fn exists(&self, tenant_id: &TenantId) -> bool {
        self.tenants.contains(tenant_id)
    }
}
