//! Permission lattice and platform roles.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Vehicle permission levels, totally ordered by weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Read,
    Maintainer,
    Driver,
    Full,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::Read,
        PermissionLevel::Maintainer,
        PermissionLevel::Driver,
        PermissionLevel::Full,
    ];

    pub fn weight(self) -> u8 {
        match self {
            PermissionLevel::Read => 1,
            PermissionLevel::Maintainer => 2,
            PermissionLevel::Driver => 3,
            PermissionLevel::Full => 4,
        }
    }

    /// True when holding `self` satisfies a requirement of `required`.
    pub fn grants_at_least(self, required: PermissionLevel) -> bool {
        self.weight() >= required.weight()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Read => "READ",
            PermissionLevel::Maintainer => "MAINTAINER",
            PermissionLevel::Driver => "DRIVER",
            PermissionLevel::Full => "FULL",
        }
    }
}

impl Display for PermissionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseLevelError {
    kind: &'static str,
    value: String,
}

impl FromStr for PermissionLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionLevel::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLevelError { kind: "permission level", value: s.to_string() })
    }
}

/// Platform roles held through time-bounded role assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ParseLevelError { kind: "role", value: s.to_string() }),
        }
    }
}
