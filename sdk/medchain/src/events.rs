use crate::types::{Address, ContentHash, DoctorStatus};

/// Tracing target for completed write actions.
pub const EVENT_TARGET: &str = "medchain::events";

pub fn publish_record_added(account: &Address, cid: &ContentHash, member_id: &str) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "REC_ADD",
        account = %account,
        cid = %cid,
        member_id,
        "record added"
    );
}

pub fn publish_member_added(account: &Address, member_id: &str, auto_created: bool) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "MBR_ADD",
        account = %account,
        member_id,
        auto_created,
        "member added"
    );
}

pub fn publish_member_updated(account: &Address, member_id: &str) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "MBR_UPD",
        account = %account,
        member_id,
        "member updated"
    );
}

pub fn publish_access_granted(patient: &Address, doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "ACC_GRT",
        patient = %patient,
        doctor = %doctor,
        "doctor access granted"
    );
}

pub fn publish_access_revoked(patient: &Address, doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "ACC_REV",
        patient = %patient,
        doctor = %doctor,
        "doctor access revoked"
    );
}

pub fn publish_doctor_registered(admin: &Address, doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "DOC_REG",
        admin = %admin,
        doctor = %doctor,
        "doctor registered on chain"
    );
}

pub fn publish_doctor_removed(admin: &Address, doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "DOC_REM",
        admin = %admin,
        doctor = %doctor,
        "doctor removed from chain"
    );
}

pub fn publish_application_reviewed(admin: &Address, application_id: &str, status: DoctorStatus) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "APP_REV",
        admin = %admin,
        application_id,
        status = status.as_str(),
        "doctor application reviewed"
    );
}

pub fn publish_application_submitted(doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "APP_SUB",
        doctor = %doctor,
        "doctor application submitted"
    );
}

pub fn publish_profile_updated(doctor: &Address) {
    tracing::info!(
        target: EVENT_TARGET,
        topic = "PRF_UPD",
        doctor = %doctor,
        "doctor profile updated"
    );
}
