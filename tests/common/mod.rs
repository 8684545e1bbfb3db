//! Shared fixtures: a memory-backed world pinned to 2024-03-01T12:00Z and store
//! doubles that fail or stall on demand.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use fleet_authz::model::*;
use fleet_authz::store::*;
use fleet_authz::{AccessChecker, AccessConfig, FixedClock, PermissionLevel, Role, StoreError, StoreResult};

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap() }
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }
pub fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() }

pub fn user(id: &str) -> UserId { UserId::new(id) }
pub fn vehicle(id: &str) -> VehicleId { VehicleId::new(id) }

pub struct World {
    pub store: Arc<MemoryStore>,
}

impl World {
    pub fn new() -> Self { Self { store: Arc::new(MemoryStore::new()) } }

    pub fn checker(&self) -> AccessChecker { self.checker_with(AccessConfig::default()) }

    pub fn checker_with(&self, config: AccessConfig) -> AccessChecker {
        AccessChecker::new(self.stores(), config).with_clock(Arc::new(FixedClock(now())))
    }

    pub fn stores(&self) -> StoreSet { StoreSet::uniform(self.store.clone()) }

    pub fn role(&self, u: &str, role: Role, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> &Self {
        self.store.insert_role_assignment(RoleAssignment { user_id: user(u), role, start_time: start, end_time: end });
        self
    }

    pub fn driver(&self, u: &str, v: &str, start: NaiveDate, end: Option<NaiveDate>) -> &Self {
        self.store.insert_driver_assignment(DriverAssignment {
            user_id: user(u),
            vehicle_id: vehicle(v),
            start_date: start,
            end_date: end,
        });
        self
    }

    pub fn responsible(&self, u: &str, v: &str, ceco: &str, start: NaiveDate, end: Option<NaiveDate>) -> &Self {
        self.store.insert_responsible_assignment(ResponsibleAssignment {
            user_id: user(u),
            vehicle_id: vehicle(v),
            start_date: start,
            end_date: end,
            cost_center: ceco.to_string(),
        });
        self
    }

    pub fn selection(&self, id: &str, vehicles: &[&str], ranges: &[(&str, &str)]) -> &Self {
        self.store.upsert_selection(VehicleSelection {
            id: SelectionId::new(id),
            name: None,
            vehicles: vehicles.iter().map(|v| vehicle(v)).collect(),
            cost_center_ranges: ranges.iter().map(|(s, e)| CostCenterRange::new(*s, *e)).collect(),
        });
        self
    }

    pub fn user_acl(&self, u: &str, permission: PermissionLevel, sel: &str, end: Option<DateTime<Utc>>) -> &Self {
        self.acl(AclSubject::User(user(u)), permission, sel, end)
    }

    pub fn group_acl(&self, g: &str, permission: PermissionLevel, sel: &str, end: Option<DateTime<Utc>>) -> &Self {
        self.acl(AclSubject::UserGroup(GroupId::new(g)), permission, sel, end)
    }

    fn acl(&self, subject: AclSubject, permission: PermissionLevel, sel: &str, end: Option<DateTime<Utc>>) -> &Self {
        self.store.insert_acl(VehicleAcl {
            id: None,
            subject,
            permission,
            vehicle_selection_id: SelectionId::new(sel),
            start_time: ts(2024, 1, 1),
            end_time: end,
        });
        self
    }

    pub fn member(&self, u: &str, g: &str) -> &Self {
        self.store.insert_group_membership(GroupMembership {
            user_id: user(u),
            group_id: GroupId::new(g),
            start_time: ts(2024, 1, 1),
            end_time: None,
        });
        self
    }

    pub fn nest(&self, child: &str, parent: &str) -> &Self {
        self.store.insert_group_nesting(GroupNesting {
            parent_group_id: GroupId::new(parent),
            child_group_id: GroupId::new(child),
            start_time: ts(2024, 1, 1),
            end_time: None,
        });
        self
    }
}

/// Every lookup fails as if the database were unreachable.
pub struct DownStore;

fn down<T>() -> StoreResult<T> { Err(StoreError::unavailable("connection refused")) }

#[async_trait]
impl RoleStore for DownStore {
    async fn role_assignments(&self, _: &UserId) -> StoreResult<Vec<RoleAssignment>> { down() }
}
#[async_trait]
impl DriverStore for DownStore {
    async fn driver_assignments(&self, _: &UserId, _: &VehicleId) -> StoreResult<Vec<DriverAssignment>> { down() }
}
#[async_trait]
impl ResponsibleStore for DownStore {
    async fn responsible_assignments(&self, _: &VehicleId) -> StoreResult<Vec<ResponsibleAssignment>> { down() }
}
#[async_trait]
impl AclStore for DownStore {
    async fn acls_for_user(&self, _: &UserId) -> StoreResult<Vec<VehicleAcl>> { down() }
    async fn acls_for_groups(&self, _: &[GroupId]) -> StoreResult<Vec<VehicleAcl>> { down() }
}
#[async_trait]
impl GroupMembershipStore for DownStore {
    async fn memberships(&self, _: &UserId) -> StoreResult<Vec<GroupMembership>> { down() }
}
#[async_trait]
impl GroupNestingStore for DownStore {
    async fn parent_edges(&self, _: &GroupId) -> StoreResult<Vec<GroupNesting>> { down() }
}
#[async_trait]
impl SelectionStore for DownStore {
    async fn selection(&self, _: &SelectionId) -> StoreResult<Option<VehicleSelection>> { down() }
}

/// Role lookup that never answers in time.
pub struct StalledRoles;

#[async_trait]
impl RoleStore for StalledRoles {
    async fn role_assignments(&self, _: &UserId) -> StoreResult<Vec<RoleAssignment>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// Backend whose queries ignore the subject: every driver row for the vehicle and
/// every ACL row come back, whoever asked.
pub struct LooseStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl RoleStore for LooseStore {
    async fn role_assignments(&self, _: &UserId) -> StoreResult<Vec<RoleAssignment>> {
        Ok(self.inner.snapshot().role_assignments)
    }
}
#[async_trait]
impl DriverStore for LooseStore {
    async fn driver_assignments(&self, _: &UserId, v: &VehicleId) -> StoreResult<Vec<DriverAssignment>> {
        Ok(self.inner.snapshot().driver_assignments.into_iter().filter(|r| &r.vehicle_id == v).collect())
    }
}
#[async_trait]
impl AclStore for LooseStore {
    async fn acls_for_user(&self, _: &UserId) -> StoreResult<Vec<VehicleAcl>> {
        Ok(self.inner.snapshot().vehicle_acls)
    }
    async fn acls_for_groups(&self, _: &[GroupId]) -> StoreResult<Vec<VehicleAcl>> {
        Ok(self.inner.snapshot().vehicle_acls)
    }
}
#[async_trait]
impl GroupMembershipStore for LooseStore {
    async fn memberships(&self, _: &UserId) -> StoreResult<Vec<GroupMembership>> {
        Ok(self.inner.snapshot().group_memberships)
    }
}

/// Role lookup that yields to the runtime once before answering.
pub struct YieldingRoles(pub Vec<RoleAssignment>);

#[async_trait]
impl RoleStore for YieldingRoles {
    async fn role_assignments(&self, _: &UserId) -> StoreResult<Vec<RoleAssignment>> {
        tokio::task::yield_now().await;
        Ok(self.0.clone())
    }
}
