//! Narrow read interfaces over the tables owned by the CRUD services.
//!
//! Each trait answers one question and returns raw candidate rows; activity
//! filtering against the decision instant is done by the callers in `grants` and
//! `groups`. An empty result is a normal outcome, an `Err` is an infrastructure
//! failure and is propagated unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{
    DriverAssignment, GroupId, GroupMembership, GroupNesting, ResponsibleAssignment, RoleAssignment,
    SelectionId, UserId, VehicleAcl, VehicleId, VehicleSelection,
};

mod memory;

pub use memory::{MemoryStore, Snapshot};

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_assignments(&self, user: &UserId) -> StoreResult<Vec<RoleAssignment>>;
}

#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn driver_assignments(&self, user: &UserId, vehicle: &VehicleId) -> StoreResult<Vec<DriverAssignment>>;
}

#[async_trait]
pub trait ResponsibleStore: Send + Sync {
    /// All responsible rows for a vehicle, any user, in store order.
    async fn responsible_assignments(&self, vehicle: &VehicleId) -> StoreResult<Vec<ResponsibleAssignment>>;
}

#[async_trait]
pub trait AclStore: Send + Sync {
    async fn acls_for_user(&self, user: &UserId) -> StoreResult<Vec<VehicleAcl>>;
    async fn acls_for_groups(&self, groups: &[GroupId]) -> StoreResult<Vec<VehicleAcl>>;
}

#[async_trait]
pub trait GroupMembershipStore: Send + Sync {
    async fn memberships(&self, user: &UserId) -> StoreResult<Vec<GroupMembership>>;
}

#[async_trait]
pub trait GroupNestingStore: Send + Sync {
    /// Edges whose child is `group`, in store order.
    async fn parent_edges(&self, group: &GroupId) -> StoreResult<Vec<GroupNesting>>;
}

#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn selection(&self, id: &SelectionId) -> StoreResult<Option<VehicleSelection>>;
}

/// One handle per lookup. Cloning is cheap; pass it into the checker at construction.
#[derive(Clone)]
pub struct StoreSet {
    pub roles: Arc<dyn RoleStore>,
    pub drivers: Arc<dyn DriverStore>,
    pub responsibles: Arc<dyn ResponsibleStore>,
    pub acls: Arc<dyn AclStore>,
    pub memberships: Arc<dyn GroupMembershipStore>,
    pub nesting: Arc<dyn GroupNestingStore>,
    pub selections: Arc<dyn SelectionStore>,
}

impl StoreSet {
    /// Wire every lookup to the same backend.
    pub fn uniform<S>(backend: Arc<S>) -> Self
    where
        S: RoleStore
            + DriverStore
            + ResponsibleStore
            + AclStore
            + GroupMembershipStore
            + GroupNestingStore
            + SelectionStore
            + 'static,
    {
        Self {
            roles: backend.clone(),
            drivers: backend.clone(),
            responsibles: backend.clone(),
            acls: backend.clone(),
            memberships: backend.clone(),
            nesting: backend.clone(),
            selections: backend,
        }
    }
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet").finish_non_exhaustive()
    }
}
