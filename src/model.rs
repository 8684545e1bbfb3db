//! Records read by the access-control core. Owned and written by the CRUD services;
//! the core only reads them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::permission::{PermissionLevel, Role};
use crate::time_window::Windowed;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(s: S) -> Self { $name(s.into()) }
            pub fn as_str(&self) -> &str { &self.0 }
            pub fn is_empty(&self) -> bool { self.0.is_empty() }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self { $name(s.to_string()) }
        }
    };
}

string_id!(UserId);
string_id!(VehicleId);
string_id!(GroupId);
string_id!(SelectionId);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role: Role,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverAssignment {
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponsibleAssignment {
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// CECO of the vehicle while this responsible is in charge. Stored as text.
    pub cost_center: String,
}

/// Who an ACL row is granted to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclSubject {
    User(UserId),
    UserGroup(GroupId),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleAcl {
    #[serde(default)]
    pub id: Option<String>,
    pub subject: AclSubject,
    pub permission: PermissionLevel,
    pub vehicle_selection_id: SelectionId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Inclusive CECO range; bounds are stored as text and parsed at match time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostCenterRange {
    pub start_ceco: String,
    pub end_ceco: String,
}

impl CostCenterRange {
    pub fn new<S: Into<String>>(start: S, end: S) -> Self {
        Self { start_ceco: start.into(), end_ceco: end.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleSelection {
    pub id: SelectionId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vehicles: Vec<VehicleId>,
    #[serde(default)]
    pub cost_center_ranges: Vec<CostCenterRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMembership {
    pub user_id: UserId,
    pub group_id: GroupId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Nesting edge: `child_group_id` inherits everything granted to `parent_group_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupNesting {
    pub parent_group_id: GroupId,
    pub child_group_id: GroupId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

macro_rules! windowed {
    ($ty:ty, $instant:ty, $start:ident, $end:ident) => {
        impl Windowed for $ty {
            type Instant = $instant;
            fn window_start(&self) -> &$instant { &self.$start }
            fn window_end(&self) -> Option<&$instant> { self.$end.as_ref() }
        }
    };
}

windowed!(RoleAssignment, DateTime<Utc>, start_time, end_time);
windowed!(DriverAssignment, NaiveDate, start_date, end_date);
windowed!(ResponsibleAssignment, NaiveDate, start_date, end_date);
windowed!(VehicleAcl, DateTime<Utc>, start_time, end_time);
windowed!(GroupMembership, DateTime<Utc>, start_time, end_time);
windowed!(GroupNesting, DateTime<Utc>, start_time, end_time);
