//! Interfaces of the external collaborators.
//!
//! The read-model never owns chain, store, gateway or wallet state; every
//! workflow receives these handles explicitly. All calls are single-threaded
//! futures, so none of the traits require `Send`.

use crate::errors::ExternalError;
use crate::types::{Address, ContentHash, UploadFile, UploadResult};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub type ExternalResult<T> = Result<T, ExternalError>;

/// Receipt of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: String,
}

/// Handle returned by a chain write. Reads that depend on the write are only
/// trustworthy after `wait` resolves.
#[allow(async_fn_in_trait)]
pub trait PendingTx {
    async fn wait(self) -> ExternalResult<TxReceipt>;
}

/// Medical-records contract, bound to the signing account.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    type Tx: PendingTx;

    async fn admin(&self) -> ExternalResult<Address>;

    async fn my_record_hashes(&self, account: &Address) -> ExternalResult<Vec<ContentHash>>;

    async fn all_doctor_addresses(&self) -> ExternalResult<Vec<Address>>;

    /// Whether `doctor` is approved by the signing account.
    async fn is_doctor_approved(&self, doctor: &Address) -> ExternalResult<bool>;

    async fn is_doctor_registered(&self, doctor: &Address) -> ExternalResult<bool>;

    async fn add_record(&self, cid: &ContentHash) -> ExternalResult<Self::Tx>;

    async fn register_doctor(&self, doctor: &Address) -> ExternalResult<Self::Tx>;

    async fn remove_doctor(&self, doctor: &Address) -> ExternalResult<Self::Tx>;

    async fn approve_doctor(&self, doctor: &Address) -> ExternalResult<Self::Tx>;

    async fn revoke_doctor(&self, doctor: &Address) -> ExternalResult<Self::Tx>;

    /// Approval flags for a set of doctors.
    ///
    /// The default issues one lookup per address, in order. Clients with a
    /// multicall or batch endpoint should override it.
    async fn approvals(&self, doctors: &[Address]) -> ExternalResult<HashMap<Address, bool>> {
        let mut out = HashMap::with_capacity(doctors.len());
        for doctor in doctors {
            let approved = self.is_doctor_approved(doctor).await?;
            out.insert(doctor.clone(), approved);
        }
        Ok(out)
    }
}

/// Real-time JSON document store addressed by `/`-separated key paths.
#[allow(async_fn_in_trait)]
pub trait MetadataStore {
    async fn get(&self, path: &str) -> ExternalResult<Option<Value>>;

    /// Replaces the document at `path`.
    async fn set(&self, path: &str, value: Value) -> ExternalResult<()>;

    /// Shallow-merges `fields` into the object at `path`, creating it if absent.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> ExternalResult<()>;

    /// Stores `value` under a freshly generated child key of `path`.
    async fn push(&self, path: &str, value: Value) -> ExternalResult<String>;

    /// Children of `path` whose `field` equals `value`.
    async fn query_eq(
        &self,
        path: &str,
        field: &str,
        value: &Value,
    ) -> ExternalResult<Vec<(String, Value)>>;
}

/// Content-addressed pinning gateway.
#[allow(async_fn_in_trait)]
pub trait UploadGateway {
    async fn upload(&self, file: &UploadFile) -> ExternalResult<UploadResult>;
}

/// Injected wallet provider.
#[allow(async_fn_in_trait)]
pub trait Wallet {
    /// Currently exposed account, without prompting.
    async fn current_account(&self) -> ExternalResult<Option<Address>>;

    /// Prompts for account access and returns the first account.
    async fn connect(&self) -> ExternalResult<Address>;

    /// Resolves on the provider's next account switch with the newly exposed
    /// account, or `None` once every account has been disconnected.
    async fn next_account_change(&self) -> ExternalResult<Option<Address>>;
}
