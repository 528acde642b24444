//! Admin panel: doctor registry and application review.

use crate::errors::{Error, Result};
use crate::events;
use crate::ports::{ChainClient, MetadataStore, PendingTx};
use crate::session::Session;
use crate::store;
use crate::types::{Address, DoctorApplication, DoctorStatus};
use serde::Serialize;

/// On-chain registry and the applications awaiting review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminOverview {
    pub registered: Vec<Address>,
    pub pending: Vec<DoctorApplication>,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: DoctorStatus,
}

/// A session whose account has been checked against the contract admin.
///
/// Only [`AdminPanel::open`] constructs one, so every action below runs on
/// behalf of the admin.
pub struct AdminPanel<'a, C, S> {
    session: Session<'a, C, S>,
}

impl<'a, C: ChainClient, S: MetadataStore> AdminPanel<'a, C, S> {
    /// Fails with [`Error::NotAuthorized`] unless the session account is the
    /// contract admin (compared case-insensitively).
    pub async fn open(session: Session<'a, C, S>) -> Result<Self> {
        let admin = session.chain().admin().await?;
        if admin != *session.account() {
            tracing::warn!(account = %session.account(), "admin panel refused");
            return Err(Error::NotAuthorized);
        }
        Ok(Self { session })
    }

    pub fn account(&self) -> &Address {
        self.session.account()
    }

    pub async fn load(&self) -> Result<AdminOverview> {
        let (registered, pending) = tokio::try_join!(
            self.session.chain().all_doctor_addresses(),
            store::pending_applications(self.session.store())
        )?;
        Ok(AdminOverview {
            registered,
            pending,
        })
    }

    /// Current status of an application; the stored document wins over the
    /// caller's copy.
    async fn current_status(&self, application: &DoctorApplication) -> Result<DoctorStatus> {
        let stored = store::read_doctor_by_id(self.session.store(), &application.id).await?;
        Ok(stored
            .and_then(|meta| meta.status)
            .or(application.meta.status)
            .unwrap_or(DoctorStatus::Pending))
    }

    /// Registers the applicant on chain (unless already registered) and marks
    /// the application verified.
    pub async fn verify(&self, application: &DoctorApplication) -> Result<()> {
        let wallet = application
            .meta
            .wallet_address
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .map(Address::from)
            .ok_or(Error::MissingField("wallet address"))?;
        let next = self
            .current_status(application)
            .await?
            .transition(DoctorStatus::Verified)?;

        let chain = self.session.chain();
        if !chain.is_doctor_registered(&wallet).await? {
            chain.register_doctor(&wallet).await?.wait().await?;
            events::publish_doctor_registered(self.account(), &wallet);
        }

        store::update_doctor(
            self.session.store(),
            &application.id,
            &StatusUpdate { status: next },
        )
        .await?;
        events::publish_application_reviewed(self.account(), &application.id, next);
        Ok(())
    }

    /// Marks a pending application rejected. No chain call is made.
    pub async fn reject(&self, application: &DoctorApplication) -> Result<()> {
        let next = self
            .current_status(application)
            .await?
            .transition(DoctorStatus::Rejected)?;
        store::update_doctor(
            self.session.store(),
            &application.id,
            &StatusUpdate { status: next },
        )
        .await?;
        events::publish_application_reviewed(self.account(), &application.id, next);
        Ok(())
    }

    pub async fn register_doctor(&self, doctor: &Address) -> Result<()> {
        if doctor.is_empty() {
            return Err(Error::MissingField("doctor address"));
        }
        self.session
            .chain()
            .register_doctor(doctor)
            .await?
            .wait()
            .await?;
        events::publish_doctor_registered(self.account(), doctor);
        Ok(())
    }

    pub async fn remove_doctor(&self, doctor: &Address) -> Result<()> {
        self.session
            .chain()
            .remove_doctor(doctor)
            .await?
            .wait()
            .await?;
        events::publish_doctor_removed(self.account(), doctor);
        Ok(())
    }
}
