use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_GROUP_NESTING: &str = "FLEET_AUTHZ_GROUP_NESTING";
pub const ENV_DECISION_TIMEOUT_MS: &str = "FLEET_AUTHZ_DECISION_TIMEOUT_MS";
pub const ENV_AUDIT: &str = "FLEET_AUTHZ_AUDIT";

/// How parent edges are followed when expanding a user's groups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// Union of every active parent edge (full ancestor closure).
    #[default]
    AllParents,
    /// Only the first active parent edge per group, in store order.
    FirstParent,
}

impl std::str::FromStr for NestingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_parents" | "all" => Ok(NestingMode::AllParents),
            "first_parent" | "first" => Ok(NestingMode::FirstParent),
            other => Err(ConfigError::InvalidValue { key: ENV_GROUP_NESTING, value: other.to_string() }),
        }
    }
}

/// Settings for the access checker. Every field has a default so partial JSON works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccessConfig {
    pub group_nesting: NestingMode,
    /// Upper bound for a whole decision, reads included. None = unbounded.
    pub decision_timeout_ms: Option<u64>,
    /// Emit one info line per decision on the audit target.
    pub audit_decisions: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            group_nesting: NestingMode::AllParents,
            decision_timeout_ms: None,
            audit_decisions: false,
        }
    }
}

impl AccessConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let cfg: AccessConfig = serde_json::from_str(s)?;
        Ok(cfg.normalized())
    }

    /// A zero timeout means no bound, whichever loader produced it.
    pub fn normalized(mut self) -> Self {
        if self.decision_timeout_ms == Some(0) {
            self.decision_timeout_ms = None;
        }
        self
    }

    /// Defaults overridden by `FLEET_AUTHZ_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = AccessConfig::default();
        if let Some(v) = lookup(ENV_GROUP_NESTING) {
            cfg.group_nesting = v.parse()?;
        }
        if let Some(v) = lookup(ENV_DECISION_TIMEOUT_MS) {
            let ms = v.trim().parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue { key: ENV_DECISION_TIMEOUT_MS, value: v.clone() })?;
            cfg.decision_timeout_ms = Some(ms);
        }
        if let Some(v) = lookup(ENV_AUDIT) {
            cfg.audit_decisions = parse_bool(&v)
                .ok_or(ConfigError::InvalidValue { key: ENV_AUDIT, value: v.clone() })?;
        }
        Ok(cfg.normalized())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
