//! Vehicle access-control decision core.
//!
//! Answers one question per call: may this user act on this vehicle at this
//! permission level (or: does this user hold this role right now). Grants come from
//! role assignments, driver and responsible assignments, and direct or group ACLs
//! over vehicle selections. The core reads through the traits in [`store`] and never
//! writes.

pub mod error;
pub mod time_window;
pub mod permission;
pub mod model;
pub mod clock;
pub mod config;
pub mod store;
pub mod grants;
pub mod groups;
pub mod selection;
pub mod checker;

pub use checker::{AccessChecker, CheckOptions, Decision, DecisionReason};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AccessConfig, NestingMode};
pub use error::{AccessError, AccessResult, ConfigError, Stage, StoreError, StoreResult};
pub use permission::{PermissionLevel, Role};
pub use store::{MemoryStore, Snapshot, StoreSet};
