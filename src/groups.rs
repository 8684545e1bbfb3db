//! Effective group resolution: direct active memberships plus every ancestor
//! reachable through active nesting edges.

use std::collections::{BTreeSet, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::NestingMode;
use crate::error::{AccessError, AccessResult, Stage};
use crate::model::{GroupId, UserId};
use crate::store::StoreSet;
use crate::time_window::Windowed;

#[derive(Clone, Debug)]
pub struct GroupResolver {
    stores: StoreSet,
    mode: NestingMode,
}

impl GroupResolver {
    pub fn new(stores: StoreSet, mode: NestingMode) -> Self { Self { stores, mode } }

    pub fn mode(&self) -> NestingMode { self.mode }

    /// Breadth-first walk over parent edges. The visited set bounds the walk to one
    /// visit per group, so cyclic nesting data terminates.
    pub async fn effective_groups(&self, user: &UserId, at: DateTime<Utc>) -> AccessResult<BTreeSet<GroupId>> {
        let memberships = self.stores.memberships.memberships(user).await
            .map_err(|e| AccessError::store(Stage::Groups, e))?;

        let mut visited: HashSet<GroupId> = HashSet::new();
        let mut queue: VecDeque<GroupId> = VecDeque::new();
        for m in memberships.iter().filter(|m| &m.user_id == user && m.is_active_at(&at)) {
            if visited.insert(m.group_id.clone()) {
                queue.push_back(m.group_id.clone());
            }
        }
        let direct = visited.len();

        while let Some(group) = queue.pop_front() {
            let edges = self.stores.nesting.parent_edges(&group).await
                .map_err(|e| AccessError::store(Stage::Groups, e))?;
            let mut parents = edges.iter().filter(|e| e.child_group_id == group && e.is_active_at(&at));
            let followed: Vec<&GroupId> = match self.mode {
                NestingMode::AllParents => parents.map(|e| &e.parent_group_id).collect(),
                NestingMode::FirstParent => parents.next().map(|e| &e.parent_group_id).into_iter().collect(),
            };
            for parent in followed {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                } else {
                    debug!(target: "fleet_authz::groups", "group {} already visited (from {})", parent, group);
                }
            }
        }

        debug!(
            target: "fleet_authz::groups",
            "effective groups user={} direct={} total={} mode={:?}",
            user, direct, visited.len(), self.mode
        );
        Ok(visited.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod groups_tests;
