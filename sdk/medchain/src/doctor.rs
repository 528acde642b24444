//! Doctor-side pages: verification application and profile maintenance.
//!
//! These only touch the metadata store; on-chain registration is the
//! admin's job.

use crate::application::check_submission;
use crate::errors::{Error, Result};
use crate::events;
use crate::ports::MetadataStore;
use crate::store;
use crate::types::{Address, DoctorMeta, DoctorProfile, DoctorStatus};
use chrono::{DateTime, SecondsFormat, Utc};

/// The stored application of `account`, if any. A disconnected wallet has none.
pub async fn application_status<S: MetadataStore>(
    store: &S,
    account: Option<&Address>,
) -> Result<Option<DoctorMeta>> {
    match account {
        Some(account) => Ok(store::read_doctor(store, account).await?),
        None => Ok(None),
    }
}

/// Submits (or, while still pending, resubmits) an application.
pub async fn submit_application<S: MetadataStore>(
    store: &S,
    account: Option<&Address>,
    profile: &DoctorProfile,
    now: DateTime<Utc>,
) -> Result<DoctorMeta> {
    let account = account.ok_or(Error::WalletNotConnected)?;
    profile.validate()?;

    let existing = store::read_doctor(store, account).await?;
    check_submission(existing.as_ref())?;

    let application = DoctorMeta {
        name: Some(profile.name.clone()),
        profession: Some(profile.profession.clone()),
        hospital: Some(profile.hospital.clone()),
        wallet_address: Some(account.key()),
        status: Some(DoctorStatus::Pending),
        created_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    };
    store::write_doctor(store, account, &application).await?;
    events::publish_application_submitted(account);
    Ok(application)
}

/// Profile form values; blank when nothing is stored yet.
pub async fn load_profile<S: MetadataStore>(store: &S, account: &Address) -> Result<DoctorProfile> {
    let meta = store::read_doctor(store, account).await?.unwrap_or_default();
    Ok(DoctorProfile {
        name: meta.name.unwrap_or_default(),
        profession: meta.profession.unwrap_or_default(),
        hospital: meta.hospital.unwrap_or_default(),
    })
}

/// Updates name, profession and hospital. Status and wallet are untouched.
pub async fn update_profile<S: MetadataStore>(
    store: &S,
    account: Option<&Address>,
    profile: &DoctorProfile,
) -> Result<()> {
    let account = account.ok_or(Error::WalletNotConnected)?;
    profile.validate()?;
    store::update_doctor(store, &account.key(), profile).await?;
    events::publish_profile_updated(account);
    Ok(())
}
