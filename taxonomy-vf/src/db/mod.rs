//! Database queries for the verification service
//!
//! Schema creation lives in taxonomy-common; this module holds the queries
//! the verifier runs: pending-tag reads and compare-and-set decision writes,
//! schedule management, and catalog upserts for the refresh tasks.

pub mod catalog;
pub mod schedules;
pub mod skill_tags;
