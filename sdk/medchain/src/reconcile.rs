//! Reconciliation of chain-authoritative identifiers with store metadata.
//!
//! The chain decides which records and doctors exist; the metadata store only
//! decorates them. Absent or partial metadata is a normal case resolved by
//! defaults, never an error.

use crate::types::{
    Address, ContentHash, Doctor, DoctorMeta, Member, Record, RecordMeta, UNASSIGNED_MEMBER,
    UNKNOWN_DOCTOR_NAME, UNKNOWN_FIELD, UNKNOWN_FILE_NAME, UNKNOWN_FILE_TYPE,
};
use std::collections::HashMap;
use std::future::Future;

/// Treats blank strings the same as missing values.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

fn or_default(value: Option<&String>, default: &str) -> String {
    present(value).unwrap_or(default).to_string()
}

/// Builds the display record for one chain hash.
pub fn record_from_meta(cid: &ContentHash, meta: Option<&RecordMeta>, now: u64) -> Record {
    let meta = meta.cloned().unwrap_or_default();
    Record {
        cid: cid.clone(),
        member_id: or_default(meta.member_id.as_ref(), UNASSIGNED_MEMBER),
        file_name: or_default(meta.file_name.as_ref(), UNKNOWN_FILE_NAME),
        file_type: or_default(meta.file_type.as_ref(), UNKNOWN_FILE_TYPE),
        uploaded_at: meta.uploaded_at.filter(|ts| *ts > 0).unwrap_or(now),
        description: meta.description.unwrap_or_default(),
    }
}

/// Joins the chain's record hashes with their metadata, newest first.
///
/// Only hashes in `chain_hashes` appear in the output; metadata for any other
/// hash is ignored. Hashes without metadata are legacy records and get
/// placeholder fields with `uploaded_at = now`. Equal timestamps keep chain
/// order.
pub fn merge_records(
    chain_hashes: &[ContentHash],
    metadata: &HashMap<ContentHash, RecordMeta>,
    now: u64,
) -> Vec<Record> {
    let mut merged: Vec<Record> = chain_hashes
        .iter()
        .map(|cid| {
            let meta = metadata.get(cid);
            if meta.is_none() {
                tracing::debug!(cid = %cid, "legacy record without metadata");
            }
            record_from_meta(cid, meta, now)
        })
        .collect();
    merged.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    merged
}

/// Joins the on-chain doctor registry with approval flags and profiles.
///
/// The output has exactly one row per chain address, in chain order.
/// Profiles are matched on the lower-cased address. A doctor with no profile
/// renders as "Unknown Doctor"; blank fields of a matched profile render as
/// "Unknown". A missing approval flag reads as not approved.
pub fn merge_doctors(
    chain_doctors: &[Address],
    approvals: &HashMap<Address, bool>,
    metadata_by_address: &HashMap<String, DoctorMeta>,
) -> Vec<Doctor> {
    chain_doctors
        .iter()
        .map(|address| {
            let is_approved = approvals.get(address).copied().unwrap_or(false);
            match metadata_by_address.get(&address.key()) {
                Some(meta) => Doctor {
                    address: address.clone(),
                    name: or_default(meta.name.as_ref(), UNKNOWN_FIELD),
                    profession: or_default(meta.profession.as_ref(), UNKNOWN_FIELD),
                    hospital: or_default(meta.hospital.as_ref(), UNKNOWN_FIELD),
                    is_approved,
                    status: meta.status,
                },
                None => Doctor {
                    address: address.clone(),
                    name: UNKNOWN_DOCTOR_NAME.to_string(),
                    profession: UNKNOWN_FIELD.to_string(),
                    hospital: UNKNOWN_FIELD.to_string(),
                    is_approved,
                    status: None,
                },
            }
        })
        .collect()
}

/// Guarantees the list holds a Self member.
///
/// When no member has relation `Self`, the default profile is handed to
/// `create`, which persists it and returns the new id; the stored member is
/// appended. If a Self member already exists `create` is not called.
pub async fn ensure_self_member<F, Fut, E>(
    mut members: Vec<Member>,
    now: u64,
    create: F,
) -> Result<Vec<Member>, E>
where
    F: FnOnce(Member) -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    if members.iter().any(|m| m.relation.is_self()) {
        return Ok(members);
    }
    let mut profile = Member::default_self(now);
    profile.id = create(profile.clone()).await?;
    members.push(profile);
    Ok(members)
}

/// Records attributed to `member_id`, in their existing order.
pub fn filter_by_member<'a>(records: &'a [Record], member_id: &str) -> Vec<&'a Record> {
    records.iter().filter(|r| r.member_id == member_id).collect()
}

/// Case-insensitive substring search over name, hospital and profession.
pub fn search_doctors<'a>(doctors: &'a [Doctor], query: &str) -> Vec<&'a Doctor> {
    let needle = query.to_lowercase();
    doctors
        .iter()
        .filter(|d| {
            d.name.to_lowercase().contains(&needle)
                || d.hospital.to_lowercase().contains(&needle)
                || d.profession.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Name shown next to a record in the activity feed.
pub fn member_label(record: &Record, members: &[Member]) -> String {
    match members.iter().find(|m| m.id == record.member_id) {
        Some(member) => member.name.clone(),
        None if record.member_id == UNASSIGNED_MEMBER => "Unassigned".to_string(),
        None => "Unknown".to_string(),
    }
}

/// Shortens an address to `0x1234...abcd`.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
