//! Doctor application lifecycle: `pending → verified | rejected`.

use crate::errors::{Error, Result};
use crate::types::{DoctorMeta, DoctorProfile, DoctorStatus};

impl DoctorStatus {
    /// Verified and rejected applications admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DoctorStatus::Pending)
    }

    /// Validates a move to `to` and returns the new status.
    pub fn transition(self, to: DoctorStatus) -> Result<DoctorStatus> {
        match (self, to) {
            (DoctorStatus::Pending, DoctorStatus::Verified)
            | (DoctorStatus::Pending, DoctorStatus::Rejected) => Ok(to),
            (from, to) => Err(Error::InvalidTransition { from, to }),
        }
    }
}

/// An application may be (re)submitted only while none exists or the
/// existing one is still pending.
pub fn check_submission(existing: Option<&DoctorMeta>) -> Result<()> {
    match existing.and_then(|meta| meta.status) {
        Some(status) if status.is_terminal() => Err(Error::ApplicationClosed(status)),
        _ => Ok(()),
    }
}

impl DoctorProfile {
    /// Every field is required.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if self.profession.trim().is_empty() {
            return Err(Error::MissingField("profession"));
        }
        if self.hospital.trim().is_empty() {
            return Err(Error::MissingField("hospital"));
        }
        Ok(())
    }
}
