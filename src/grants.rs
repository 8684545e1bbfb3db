//! Grant source readers. Each lookup reads one store and keeps only the rows active
//! at the decision instant; store failures are tagged with their stage and propagated.

use chrono::{DateTime, Utc};

use crate::error::{AccessError, AccessResult, Stage};
use crate::model::{AclSubject, GroupId, ResponsibleAssignment, UserId, VehicleAcl, VehicleId};
use crate::permission::Role;
use crate::store::StoreSet;
use crate::time_window::{active_at, Windowed};

#[derive(Clone, Debug)]
pub struct GrantSources {
    stores: StoreSet,
}

impl GrantSources {
    pub fn new(stores: StoreSet) -> Self { Self { stores } }

    pub fn stores(&self) -> &StoreSet { &self.stores }

    pub async fn has_active_role(&self, user: &UserId, role: Role, at: DateTime<Utc>) -> AccessResult<bool> {
        let rows = self.stores.roles.role_assignments(user).await
            .map_err(|e| AccessError::store(Stage::Roles, e))?;
        let held = active_at(&rows, &at).any(|r| &r.user_id == user && r.role == role);
        Ok(held)
    }

    /// Driver assignments are date-granular; `at` is reduced to its UTC date.
    pub async fn is_current_driver(&self, user: &UserId, vehicle: &VehicleId, at: DateTime<Utc>) -> AccessResult<bool> {
        let rows = self.stores.drivers.driver_assignments(user, vehicle).await
            .map_err(|e| AccessError::store(Stage::Driver, e))?;
        let today = at.date_naive();
        let current = rows
            .iter()
            .any(|r| &r.user_id == user && &r.vehicle_id == vehicle && r.is_active_at(&today));
        Ok(current)
    }

    pub async fn is_current_responsible(&self, user: &UserId, vehicle: &VehicleId, at: DateTime<Utc>) -> AccessResult<bool> {
        let rows = self.active_responsibles(vehicle, at).await?;
        let current = rows.iter().any(|r| &r.user_id == user);
        Ok(current)
    }

    /// Cost center of the vehicle's current responsible. With overlapping rows the
    /// latest start wins; equal starts keep store order.
    pub async fn current_cost_center(&self, vehicle: &VehicleId, at: DateTime<Utc>) -> AccessResult<Option<String>> {
        let rows = self.active_responsibles(vehicle, at).await?;
        let mut current: Option<&ResponsibleAssignment> = None;
        for r in rows.iter() {
            match current {
                Some(c) if c.start_date >= r.start_date => {}
                _ => current = Some(r),
            }
        }
        Ok(current.map(|r| r.cost_center.clone()))
    }

    async fn active_responsibles(&self, vehicle: &VehicleId, at: DateTime<Utc>) -> AccessResult<Vec<ResponsibleAssignment>> {
        let rows = self.stores.responsibles.responsible_assignments(vehicle).await
            .map_err(|e| AccessError::store(Stage::Responsible, e))?;
        let today = at.date_naive();
        Ok(rows.into_iter().filter(|r| &r.vehicle_id == vehicle && r.is_active_at(&today)).collect())
    }

    /// Active ACLs whose subject is `user` itself. Rows for other subjects are dropped
    /// even if the store returns them.
    pub async fn find_direct_acls(&self, user: &UserId, at: DateTime<Utc>) -> AccessResult<Vec<VehicleAcl>> {
        let rows = self.stores.acls.acls_for_user(user).await
            .map_err(|e| AccessError::store(Stage::Acl, e))?;
        Ok(rows
            .into_iter()
            .filter(|a| matches!(&a.subject, AclSubject::User(u) if u == user))
            .filter(|a| a.is_active_at(&at))
            .collect())
    }

    /// Active ACLs held by one of `groups`.
    pub async fn find_group_acls(&self, groups: &[GroupId], at: DateTime<Utc>) -> AccessResult<Vec<VehicleAcl>> {
        if groups.is_empty() { return Ok(Vec::new()); }
        let rows = self.stores.acls.acls_for_groups(groups).await
            .map_err(|e| AccessError::store(Stage::Acl, e))?;
        Ok(rows
            .into_iter()
            .filter(|a| matches!(&a.subject, AclSubject::UserGroup(g) if groups.contains(g)))
            .filter(|a| a.is_active_at(&at))
            .collect())
    }
}
