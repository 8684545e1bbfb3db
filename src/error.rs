//! Error model for the access-control core.
//! Store failures, caller contract violations and configuration problems are kept
//! apart so request middleware can map them without inspecting messages.

use thiserror::Error;

/// Failure reported by a grant store. Never a business outcome: an empty result is
/// "no grant", an `Err` is an infrastructure problem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

impl StoreError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self { StoreError::Unavailable(msg.into()) }
    pub fn corrupt<S: Into<String>>(table: &'static str, detail: S) -> Self {
        StoreError::Corrupt { table, detail: detail.into() }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: backend errors surface as unavailability
        StoreError::Unavailable(format!("{:#}", err))
    }
}

/// Stage of a decision that performed a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Roles,
    Driver,
    Responsible,
    Acl,
    Groups,
    Selection,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Roles => "roles",
            Stage::Driver => "driver",
            Stage::Responsible => "responsible",
            Stage::Acl => "acl",
            Stage::Groups => "groups",
            Stage::Selection => "selection",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("missing required identifier: {field}")]
    MissingIdentifier { field: &'static str },
    #[error("store read failed during {stage} stage: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StoreError,
    },
    #[error("access decision timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AccessError {
    pub fn store(stage: Stage, source: StoreError) -> Self { AccessError::Store { stage, source } }

    pub fn code_str(&self) -> &'static str {
        match self {
            AccessError::MissingIdentifier { .. } => "missing_identifier",
            AccessError::Store { source: StoreError::Unavailable(_), .. } => "store_unavailable",
            AccessError::Store { source: StoreError::Corrupt { .. }, .. } => "store_corrupt",
            AccessError::Timeout { .. } => "timeout",
            AccessError::Config(_) => "config_error",
        }
    }

    /// Map to HTTP status code for the middleware that owns the request.
    pub fn http_status(&self) -> u16 {
        match self {
            AccessError::MissingIdentifier { .. } => 400,
            AccessError::Store { source: StoreError::Unavailable(_), .. } => 503,
            AccessError::Store { .. } => 500,
            AccessError::Timeout { .. } => 504,
            AccessError::Config(_) => 500,
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;
pub type StoreResult<T> = Result<T, StoreError>;
