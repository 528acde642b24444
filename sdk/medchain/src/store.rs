//! Typed access to the metadata store.
//!
//! Documents are decoded leniently: a mistyped field reads as absent, and
//! only an entry that is not an object is logged and skipped. The merges
//! then fall back to their defaults.

use crate::errors::ExternalError;
use crate::ports::{ExternalResult, MetadataStore};
use crate::types::{
    Address, ContentHash, DoctorApplication, DoctorMeta, DoctorStatus, Member, MemberUpdate,
    RecordMeta,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key paths of the documents this crate reads and writes.
pub mod paths {
    use crate::types::{Address, ContentHash};

    pub const DOCTORS: &str = "doctors";

    pub fn doctor(address: &Address) -> String {
        format!("{DOCTORS}/{}", address.key())
    }

    pub fn doctor_by_id(id: &str) -> String {
        format!("{DOCTORS}/{id}")
    }

    pub fn members(account: &Address) -> String {
        format!("users/{}/members", account.key())
    }

    pub fn member(account: &Address, id: &str) -> String {
        format!("{}/{id}", members(account))
    }

    pub fn records(account: &Address) -> String {
        format!("users/{}/records", account.key())
    }

    pub fn record(account: &Address, cid: &ContentHash) -> String {
        format!("{}/{cid}", records(account))
    }
}

/// Decodes one stored document. Only a value that is not a JSON object is
/// rejected; field-level mismatches are absorbed by the type's decoders.
fn decode<T: DeserializeOwned>(path: &str, key: &str, raw: Value) -> Option<T> {
    if !raw.is_object() {
        tracing::warn!(path, key, "skipping metadata entry that is not an object");
        return None;
    }
    match serde_json::from_value::<T>(raw) {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!(path, key, error = %err, "skipping malformed metadata entry");
            None
        }
    }
}

fn children<T: DeserializeOwned>(path: &str, root: Option<Value>) -> Vec<(String, T)> {
    let Some(Value::Object(entries)) = root else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, raw)| decode(path, &key, raw).map(|doc| (key, doc)))
        .collect()
}

fn to_document<T: Serialize>(value: &T) -> ExternalResult<Value> {
    serde_json::to_value(value).map_err(|e| ExternalError::metadata(e.to_string()))
}

fn to_fields<T: Serialize>(value: &T) -> ExternalResult<Map<String, Value>> {
    match to_document(value)? {
        Value::Object(fields) => Ok(fields),
        _ => Ok(Map::new()),
    }
}

// ── Members ──────────────────────────────────────────────────────────────────

/// Members of `account`, ordered by store key.
pub async fn read_members<S: MetadataStore>(
    store: &S,
    account: &Address,
) -> ExternalResult<Vec<Member>> {
    let path = paths::members(account);
    let root = store.get(&path).await?;
    Ok(children::<Member>(&path, root)
        .into_iter()
        .map(|(id, mut member)| {
            member.id = id;
            member
        })
        .collect())
}

/// Pushes a new member document and returns its generated id.
pub async fn create_member<S: MetadataStore>(
    store: &S,
    account: &Address,
    member: &Member,
) -> ExternalResult<String> {
    store
        .push(&paths::members(account), to_document(member)?)
        .await
}

pub async fn update_member<S: MetadataStore>(
    store: &S,
    account: &Address,
    id: &str,
    update: &MemberUpdate,
) -> ExternalResult<()> {
    store
        .update(&paths::member(account, id), to_fields(update)?)
        .await
}

// ── Records ──────────────────────────────────────────────────────────────────

pub async fn read_record_meta<S: MetadataStore>(
    store: &S,
    account: &Address,
) -> ExternalResult<HashMap<ContentHash, RecordMeta>> {
    let path = paths::records(account);
    let root = store.get(&path).await?;
    Ok(children::<RecordMeta>(&path, root)
        .into_iter()
        .map(|(key, meta)| (ContentHash::new(key), meta))
        .collect())
}

pub async fn write_record_meta<S: MetadataStore>(
    store: &S,
    account: &Address,
    cid: &ContentHash,
    meta: &RecordMeta,
) -> ExternalResult<()> {
    store
        .set(&paths::record(account, cid), to_document(meta)?)
        .await
}

// ── Doctors ──────────────────────────────────────────────────────────────────

/// Every doctor profile, keyed by lower-cased store key.
pub async fn read_doctor_directory<S: MetadataStore>(
    store: &S,
) -> ExternalResult<HashMap<String, DoctorMeta>> {
    let root = store.get(paths::DOCTORS).await?;
    Ok(children::<DoctorMeta>(paths::DOCTORS, root)
        .into_iter()
        .map(|(key, meta)| (key.to_ascii_lowercase(), meta))
        .collect())
}

async fn read_doctor_at<S: MetadataStore>(
    store: &S,
    path: &str,
) -> ExternalResult<Option<DoctorMeta>> {
    Ok(store
        .get(path)
        .await?
        .and_then(|raw| decode(path, "", raw)))
}

pub async fn read_doctor<S: MetadataStore>(
    store: &S,
    address: &Address,
) -> ExternalResult<Option<DoctorMeta>> {
    read_doctor_at(store, &paths::doctor(address)).await
}

/// Reads an application by its store key, exactly as [`update_doctor`]
/// addresses it.
pub async fn read_doctor_by_id<S: MetadataStore>(
    store: &S,
    id: &str,
) -> ExternalResult<Option<DoctorMeta>> {
    read_doctor_at(store, &paths::doctor_by_id(id)).await
}

/// Applications whose status is `pending`.
pub async fn pending_applications<S: MetadataStore>(
    store: &S,
) -> ExternalResult<Vec<DoctorApplication>> {
    let status = Value::String(DoctorStatus::Pending.as_str().to_string());
    let rows = store.query_eq(paths::DOCTORS, "status", &status).await?;
    let root = Value::Object(rows.into_iter().collect());
    Ok(children::<DoctorMeta>(paths::DOCTORS, Some(root))
        .into_iter()
        .map(|(id, meta)| DoctorApplication { id, meta })
        .collect())
}

pub async fn write_doctor<S: MetadataStore>(
    store: &S,
    address: &Address,
    meta: &DoctorMeta,
) -> ExternalResult<()> {
    store.set(&paths::doctor(address), to_document(meta)?).await
}

pub async fn update_doctor<S: MetadataStore, T: Serialize>(
    store: &S,
    id: &str,
    fields: &T,
) -> ExternalResult<()> {
    store
        .update(&paths::doctor_by_id(id), to_fields(fields)?)
        .await
}
