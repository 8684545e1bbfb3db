//! In-process store backing every lookup from plain vectors. Used by tests, the
//! CLI, and any host that loads a snapshot of the assignment tables.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AclStore, DriverStore, GroupMembershipStore, GroupNestingStore, ResponsibleStore, RoleStore, SelectionStore,
};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    AclSubject, DriverAssignment, GroupId, GroupMembership, GroupNesting, ResponsibleAssignment, RoleAssignment,
    SelectionId, UserId, VehicleAcl, VehicleId, VehicleSelection,
};

/// Serializable dump of every table the core reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Snapshot {
    pub role_assignments: Vec<RoleAssignment>,
    pub driver_assignments: Vec<DriverAssignment>,
    pub responsible_assignments: Vec<ResponsibleAssignment>,
    pub vehicle_acls: Vec<VehicleAcl>,
    pub vehicle_selections: Vec<VehicleSelection>,
    pub group_memberships: Vec<GroupMembership>,
    pub group_nesting: Vec<GroupNesting>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { tables: RwLock::new(snapshot) }
    }

    pub fn from_snapshot_json(s: &str) -> StoreResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(s)
            .map_err(|e| StoreError::corrupt("snapshot", e.to_string()))?;
        debug!(
            target: "fleet_authz::store",
            "memory store loaded: roles={} drivers={} responsibles={} acls={} selections={} memberships={} nesting={}",
            snapshot.role_assignments.len(),
            snapshot.driver_assignments.len(),
            snapshot.responsible_assignments.len(),
            snapshot.vehicle_acls.len(),
            snapshot.vehicle_selections.len(),
            snapshot.group_memberships.len(),
            snapshot.group_nesting.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_snapshot_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::unavailable(format!("read {}: {}", path.display(), e)))?;
        Self::from_snapshot_json(&text)
    }

    pub fn snapshot(&self) -> Snapshot { self.tables.read().clone() }

    pub fn insert_role_assignment(&self, row: RoleAssignment) { self.tables.write().role_assignments.push(row); }
    pub fn insert_driver_assignment(&self, row: DriverAssignment) { self.tables.write().driver_assignments.push(row); }
    pub fn insert_responsible_assignment(&self, row: ResponsibleAssignment) {
        self.tables.write().responsible_assignments.push(row);
    }
    pub fn insert_acl(&self, row: VehicleAcl) { self.tables.write().vehicle_acls.push(row); }
    pub fn insert_group_membership(&self, row: GroupMembership) { self.tables.write().group_memberships.push(row); }
    pub fn insert_group_nesting(&self, row: GroupNesting) { self.tables.write().group_nesting.push(row); }

    /// Insert or replace a selection by id.
    pub fn upsert_selection(&self, sel: VehicleSelection) {
        let mut t = self.tables.write();
        t.vehicle_selections.retain(|s| s.id != sel.id);
        t.vehicle_selections.push(sel);
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn role_assignments(&self, user: &UserId) -> StoreResult<Vec<RoleAssignment>> {
        let t = self.tables.read();
        Ok(t.role_assignments.iter().filter(|r| &r.user_id == user).cloned().collect())
    }
}

#[async_trait]
impl DriverStore for MemoryStore {
    async fn driver_assignments(&self, user: &UserId, vehicle: &VehicleId) -> StoreResult<Vec<DriverAssignment>> {
        let t = self.tables.read();
        Ok(t.driver_assignments
            .iter()
            .filter(|r| &r.user_id == user && &r.vehicle_id == vehicle)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResponsibleStore for MemoryStore {
    async fn responsible_assignments(&self, vehicle: &VehicleId) -> StoreResult<Vec<ResponsibleAssignment>> {
        let t = self.tables.read();
        Ok(t.responsible_assignments.iter().filter(|r| &r.vehicle_id == vehicle).cloned().collect())
    }
}

#[async_trait]
impl AclStore for MemoryStore {
    async fn acls_for_user(&self, user: &UserId) -> StoreResult<Vec<VehicleAcl>> {
        let t = self.tables.read();
        Ok(t.vehicle_acls
            .iter()
            .filter(|a| matches!(&a.subject, AclSubject::User(u) if u == user))
            .cloned()
            .collect())
    }

    async fn acls_for_groups(&self, groups: &[GroupId]) -> StoreResult<Vec<VehicleAcl>> {
        if groups.is_empty() { return Ok(Vec::new()); }
        let t = self.tables.read();
        Ok(t.vehicle_acls
            .iter()
            .filter(|a| matches!(&a.subject, AclSubject::UserGroup(g) if groups.contains(g)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GroupMembershipStore for MemoryStore {
    async fn memberships(&self, user: &UserId) -> StoreResult<Vec<GroupMembership>> {
        let t = self.tables.read();
        Ok(t.group_memberships.iter().filter(|m| &m.user_id == user).cloned().collect())
    }
}

#[async_trait]
impl GroupNestingStore for MemoryStore {
    async fn parent_edges(&self, group: &GroupId) -> StoreResult<Vec<GroupNesting>> {
        let t = self.tables.read();
        Ok(t.group_nesting.iter().filter(|n| &n.child_group_id == group).cloned().collect())
    }
}

#[async_trait]
impl SelectionStore for MemoryStore {
    async fn selection(&self, id: &SelectionId) -> StoreResult<Option<VehicleSelection>> {
        let t = self.tables.read();
        Ok(t.vehicle_selections.iter().find(|s| &s.id == id).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
