//! Access decision engine.
//!
//! Stages run in a fixed order and stop at the first grant that satisfies the
//! requirement: admin role, current driver, current responsible, then ACLs (direct
//! first, then the user's effective groups). Every read goes through `GrantSources`,
//! `GroupResolver` or the selection store; none of them write.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult, Stage};
use crate::grants::GrantSources;
use crate::groups::GroupResolver;
use crate::model::{AclSubject, GroupId, SelectionId, UserId, VehicleAcl, VehicleId, VehicleSelection};
use crate::permission::{PermissionLevel, Role};
use crate::selection::vehicle_in_selection;
use crate::store::{SelectionStore, StoreSet};

/// What is being asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckOptions {
    Vehicle {
        #[serde(rename = "vehicleId")]
        vehicle_id: VehicleId,
        permission: PermissionLevel,
    },
    Role { role: Role },
}

impl CheckOptions {
    pub fn vehicle<V: Into<VehicleId>>(vehicle_id: V, permission: PermissionLevel) -> Self {
        CheckOptions::Vehicle { vehicle_id: vehicle_id.into(), permission }
    }

    pub fn role(role: Role) -> Self { CheckOptions::Role { role } }
}

impl Display for CheckOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOptions::Vehicle { vehicle_id, permission } => write!(f, "vehicle={} permission={}", vehicle_id, permission),
            CheckOptions::Role { role } => write!(f, "role={}", role),
        }
    }
}

/// Grant source that settled a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DecisionReason {
    Admin,
    CurrentDriver,
    CurrentResponsible,
    DirectAcl { selection: SelectionId, permission: PermissionLevel },
    GroupAcl { group: GroupId, selection: SelectionId, permission: PermissionLevel },
    RoleHeld,
    NoGrant,
}

impl Display for DecisionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionReason::Admin => f.write_str("admin"),
            DecisionReason::CurrentDriver => f.write_str("current_driver"),
            DecisionReason::CurrentResponsible => f.write_str("current_responsible"),
            DecisionReason::DirectAcl { selection, permission } => {
                write!(f, "direct_acl selection={} permission={}", selection, permission)
            }
            DecisionReason::GroupAcl { group, selection, permission } => {
                write!(f, "group_acl group={} selection={} permission={}", group, selection, permission)
            }
            DecisionReason::RoleHeld => f.write_str("role_held"),
            DecisionReason::NoGrant => f.write_str("no_grant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allow: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self { Self { allow: true, reason } }
    fn deny() -> Self { Self { allow: false, reason: DecisionReason::NoGrant } }
}

/// Shared handle for request code. Holds no per-decision state, so one instance can
/// serve concurrent decisions.
#[derive(Clone)]
pub struct AccessChecker {
    grants: GrantSources,
    groups: GroupResolver,
    selections: Arc<dyn SelectionStore>,
    clock: Arc<dyn Clock>,
    config: AccessConfig,
}

impl AccessChecker {
    pub fn new(stores: StoreSet, config: AccessConfig) -> Self {
        let config = config.normalized();
        Self {
            groups: GroupResolver::new(stores.clone(), config.group_nesting),
            selections: stores.selections.clone(),
            grants: GrantSources::new(stores),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AccessConfig { &self.config }
    pub fn grants(&self) -> &GrantSources { &self.grants }
    pub fn groups(&self) -> &GroupResolver { &self.groups }

    /// Single entry point for request middleware.
    pub async fn check_user_permission(&self, user: &UserId, options: &CheckOptions) -> AccessResult<bool> {
        Ok(self.evaluate(user, options).await?.allow)
    }

    pub async fn check_vehicle_permission(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
        required: PermissionLevel,
    ) -> AccessResult<bool> {
        let options = CheckOptions::Vehicle { vehicle_id: vehicle.clone(), permission: required };
        self.check_user_permission(user, &options).await
    }

    pub async fn check_role(&self, user: &UserId, role: Role) -> AccessResult<bool> {
        self.check_user_permission(user, &CheckOptions::Role { role }).await
    }

    /// Like `check_user_permission` but returns the grant source that decided.
    pub async fn evaluate(&self, user: &UserId, options: &CheckOptions) -> AccessResult<Decision> {
        self.evaluate_at(user, options, self.clock.now()).await
    }

    /// Evaluate against an explicit reference instant.
    pub async fn evaluate_at(&self, user: &UserId, options: &CheckOptions, at: DateTime<Utc>) -> AccessResult<Decision> {
        let outcome = match self.config.decision_timeout_ms {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), self.dispatch(user, options, at)).await {
                Ok(res) => res,
                Err(_) => Err(AccessError::Timeout { after_ms: ms }),
            },
            None => self.dispatch(user, options, at).await,
        };
        match &outcome {
            Ok(decision) if self.config.audit_decisions => {
                info!(
                    target: "fleet_authz::audit",
                    "access user={} {} at={} allow={} reason={}",
                    user, options, at.to_rfc3339(), decision.allow, decision.reason
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(target: "fleet_authz::checker", "access check failed user={} {}: {}", user, options, e);
            }
        }
        outcome
    }

    async fn dispatch(&self, user: &UserId, options: &CheckOptions, at: DateTime<Utc>) -> AccessResult<Decision> {
        if user.is_empty() {
            return Err(AccessError::MissingIdentifier { field: "user_id" });
        }
        match options {
            CheckOptions::Vehicle { vehicle_id, permission } => {
                self.evaluate_vehicle(user, vehicle_id, *permission, at).await
            }
            CheckOptions::Role { role } => {
                if self.grants.has_active_role(user, *role, at).await? {
                    Ok(Decision::allow(DecisionReason::RoleHeld))
                } else {
                    Ok(Decision::deny())
                }
            }
        }
    }

    async fn evaluate_vehicle(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
        required: PermissionLevel,
        at: DateTime<Utc>,
    ) -> AccessResult<Decision> {
        if vehicle.is_empty() {
            return Err(AccessError::MissingIdentifier { field: "vehicle_id" });
        }

        if self.grants.has_active_role(user, Role::Admin, at).await? {
            debug!(target: "fleet_authz::checker", "admin override user={} vehicle={}", user, vehicle);
            return Ok(Decision::allow(DecisionReason::Admin));
        }

        // A driver assignment carries DRIVER, so it can only settle requirements up to it
        if PermissionLevel::Driver.grants_at_least(required) && self.grants.is_current_driver(user, vehicle, at).await? {
            debug!(target: "fleet_authz::checker", "current driver user={} vehicle={}", user, vehicle);
            return Ok(Decision::allow(DecisionReason::CurrentDriver));
        }

        if self.grants.is_current_responsible(user, vehicle, at).await? {
            debug!(target: "fleet_authz::checker", "current responsible user={} vehicle={}", user, vehicle);
            return Ok(Decision::allow(DecisionReason::CurrentResponsible));
        }

        let cost_center = self.grants.current_cost_center(vehicle, at).await?;
        let mut selections: HashMap<SelectionId, Option<VehicleSelection>> = HashMap::new();

        let direct = self.grants.find_direct_acls(user, at).await?;
        if let Some(acl) = self.first_matching_acl(&direct, vehicle, cost_center.as_deref(), required, &mut selections).await? {
            return Ok(Decision::allow(DecisionReason::DirectAcl {
                selection: acl.vehicle_selection_id.clone(),
                permission: acl.permission,
            }));
        }

        let groups: Vec<GroupId> = self.groups.effective_groups(user, at).await?.into_iter().collect();
        let via_groups = self.grants.find_group_acls(&groups, at).await?;
        if let Some(acl) = self.first_matching_acl(&via_groups, vehicle, cost_center.as_deref(), required, &mut selections).await? {
            // find_group_acls only keeps group subjects
            if let AclSubject::UserGroup(group) = &acl.subject {
                return Ok(Decision::allow(DecisionReason::GroupAcl {
                    group: group.clone(),
                    selection: acl.vehicle_selection_id.clone(),
                    permission: acl.permission,
                }));
            }
        }

        debug!(
            target: "fleet_authz::checker",
            "no grant user={} vehicle={} required={} direct_acls={} groups={} group_acls={} ceco={:?}",
            user, vehicle, required, direct.len(), groups.len(), via_groups.len(), cost_center
        );
        Ok(Decision::deny())
    }

    /// First ACL strong enough for `required` whose selection covers the vehicle.
    /// Selections are fetched at most once per decision.
    async fn first_matching_acl<'a>(
        &self,
        acls: &'a [VehicleAcl],
        vehicle: &VehicleId,
        cost_center: Option<&str>,
        required: PermissionLevel,
        selections: &mut HashMap<SelectionId, Option<VehicleSelection>>,
    ) -> AccessResult<Option<&'a VehicleAcl>> {
        for acl in acls.iter().filter(|a| a.permission.grants_at_least(required)) {
            if !selections.contains_key(&acl.vehicle_selection_id) {
                let sel = self.selections.selection(&acl.vehicle_selection_id).await
                    .map_err(|e| AccessError::store(Stage::Selection, e))?;
                if sel.is_none() {
                    warn!(
                        target: "fleet_authz::checker",
                        "acl references unknown selection {}; skipped", acl.vehicle_selection_id
                    );
                }
                selections.insert(acl.vehicle_selection_id.clone(), sel);
            }
            let covered = selections
                .get(&acl.vehicle_selection_id)
                .and_then(|s| s.as_ref())
                .map_or(false, |s| vehicle_in_selection(vehicle, cost_center, s));
            if covered {
                return Ok(Some(acl));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for AccessChecker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessChecker").field("config", &self.config).finish_non_exhaustive()
    }
}
