//! Read-model for the MedChain patient records application.
//!
//! Existence of records and doctors is decided by the medical-records
//! contract; names, filenames and descriptions live in a real-time document
//! store. This crate merges the two into the views the application renders
//! and drives the page-level workflows through explicit collaborator ports:
//!
//! - [`reconcile`]: pure merges with defaults for missing metadata.
//! - [`ports`]: chain, metadata store, upload gateway and wallet traits.
//! - [`patient`], [`admin`], [`doctor`]: fetch, merge and write actions.
//! - [`application`]: the doctor verification lifecycle.
//! - `testutils` (feature `testutils`): in-memory collaborators.

pub mod admin;
pub mod application;
pub mod config;
pub mod doctor;
pub mod errors;
pub mod events;
pub mod patient;
pub mod ports;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;


pub use config::{Config, ConfigError};
pub use errors::{Error, ErrorCategory, ExternalError, Result, Service};
pub use session::Session;
pub use types::*;

/// Wall-clock milliseconds since the UNIX epoch, as stored in `uploadedAt`
/// and `createdAt`.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
