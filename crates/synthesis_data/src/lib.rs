//! Plain data shared by the synthesis simulation: grid geometry, identifiers,
//! trait definitions, agent snapshots and the persisted fusion process record.
//!
//! Everything here derives `serde` so a host save system can persist it. No
//! behaviour beyond small accessors lives in this crate.

pub mod data;

pub use data::*;
