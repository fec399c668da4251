//! Database access layer shared by the taxonomy services
//!
//! Schema creation and default-settings seeding live in [`init`]; entity
//! structs in [`models`]; the key-value settings store in [`settings`].
//! Query helpers specific to one service live in that service's crate.

pub mod init;
pub mod models;
pub mod settings;

pub use init::init_database;
