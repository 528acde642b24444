//! Patient dashboard: records, family members and doctor access.

use crate::errors::{Error, ExternalError, Result};
use crate::events;
use crate::ports::{ChainClient, MetadataStore, PendingTx, UploadGateway};
use crate::reconcile::{
    ensure_self_member, filter_by_member, member_label, merge_doctors, merge_records,
    record_from_meta, search_doctors,
};
use crate::session::Session;
use crate::store;
use crate::types::{
    Address, Doctor, Member, MemberUpdate, NewMember, Record, RecordMeta, Relation, UploadFile,
    DEFAULT_UPLOAD_TYPE, UNASSIGNED_MEMBER,
};

/// Everything the dashboard renders for one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub account: Address,
    pub members: Vec<Member>,
    pub records: Vec<Record>,
    pub doctors: Vec<Doctor>,
}

impl Dashboard {
    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    /// Timeline of a single member.
    pub fn member_records(&self, member_id: &str) -> Vec<&Record> {
        filter_by_member(&self.records, member_id)
    }

    /// Activity feed: every record with the name of its member.
    pub fn activity(&self) -> Vec<(&Record, String)> {
        self.records
            .iter()
            .map(|r| (r, member_label(r, &self.members)))
            .collect()
    }

    pub fn search_doctors(&self, query: &str) -> Vec<&Doctor> {
        search_doctors(&self.doctors, query)
    }

    /// Member preselected in the upload form.
    pub fn default_upload_member(&self) -> Option<&str> {
        self.members.first().map(|m| m.id.as_str())
    }
}

/// Loads members, records and doctors concurrently.
pub async fn load_dashboard<C, S>(session: &Session<'_, C, S>, now: u64) -> Result<Dashboard>
where
    C: ChainClient,
    S: MetadataStore,
{
    let (members, records, doctors) = tokio::try_join!(
        load_members(session, now),
        load_records(session, now),
        load_doctors(session)
    )?;
    Ok(Dashboard {
        account: session.account().clone(),
        members,
        records,
        doctors,
    })
}

/// Members of the account, creating the Self profile on first load.
pub async fn load_members<C, S>(session: &Session<'_, C, S>, now: u64) -> Result<Vec<Member>>
where
    C: ChainClient,
    S: MetadataStore,
{
    let store = session.store();
    let account = session.account();
    let members = store::read_members(store, account).await?;
    let members = ensure_self_member(members, now, move |profile| async move {
        let id = store::create_member(store, account, &profile).await?;
        events::publish_member_added(account, &id, true);
        Ok::<_, ExternalError>(id)
    })
    .await?;
    Ok(members)
}

/// Chain record hashes joined with their metadata, newest first.
pub async fn load_records<C, S>(session: &Session<'_, C, S>, now: u64) -> Result<Vec<Record>>
where
    C: ChainClient,
    S: MetadataStore,
{
    let account = session.account();
    let (hashes, metadata) = tokio::try_join!(
        session.chain().my_record_hashes(account),
        store::read_record_meta(session.store(), account)
    )?;
    Ok(merge_records(&hashes, &metadata, now))
}

/// Registered doctors with this patient's approval flags and their profiles.
pub async fn load_doctors<C, S>(session: &Session<'_, C, S>) -> Result<Vec<Doctor>>
where
    C: ChainClient,
    S: MetadataStore,
{
    let chain = session.chain();
    let (addresses, directory) = tokio::try_join!(
        chain.all_doctor_addresses(),
        store::read_doctor_directory(session.store())
    )?;
    let approvals = chain.approvals(&addresses).await?;
    Ok(merge_doctors(&addresses, &approvals, &directory))
}

pub async fn add_member<C, S>(
    session: &Session<'_, C, S>,
    form: NewMember,
    now: u64,
) -> Result<Member>
where
    C: ChainClient,
    S: MetadataStore,
{
    if form.name.trim().is_empty() {
        return Err(Error::MissingField("name"));
    }
    if form.relation.trim().is_empty() {
        return Err(Error::MissingField("relation"));
    }
    let mut member = Member {
        id: String::new(),
        name: form.name,
        relation: Relation::from(form.relation),
        age: form.age,
        location: form.location,
        created_at: now,
    };
    member.id = store::create_member(session.store(), session.account(), &member).await?;
    events::publish_member_added(session.account(), &member.id, false);
    Ok(member)
}

pub async fn edit_member<C, S>(
    session: &Session<'_, C, S>,
    member_id: &str,
    update: &MemberUpdate,
) -> Result<()>
where
    C: ChainClient,
    S: MetadataStore,
{
    if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(Error::MissingField("name"));
    }
    store::update_member(session.store(), session.account(), member_id, update).await?;
    events::publish_member_updated(session.account(), member_id);
    Ok(())
}

/// Upload form contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: Option<UploadFile>,
    /// Target member; `None` or blank files the record as unassigned.
    pub member_id: Option<String>,
    pub description: String,
}

/// Uploads a file, registers its hash on chain, then stores its metadata.
///
/// The metadata write happens only after the chain transaction is mined.
pub async fn upload_record<C, S, G>(
    session: &Session<'_, C, S>,
    gateway: &G,
    request: UploadRequest,
    now: u64,
) -> Result<Record>
where
    C: ChainClient,
    S: MetadataStore,
    G: UploadGateway,
{
    let file = request.file.ok_or(Error::NoFileSelected)?;

    let uploaded = gateway.upload(&file).await?;
    let cid = match uploaded.cid {
        Some(cid) if uploaded.success => cid,
        _ => return Err(Error::UploadRejected),
    };

    let tx = session.chain().add_record(&cid).await?;
    tx.wait().await?;

    let member_id = request
        .member_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| UNASSIGNED_MEMBER.to_string());
    let file_type = file
        .content_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_TYPE.to_string());
    let meta = RecordMeta {
        cid: Some(cid.clone()),
        member_id: Some(member_id),
        file_name: Some(file.name),
        file_type: Some(file_type),
        uploaded_at: Some(now),
        description: Some(request.description),
    };
    store::write_record_meta(session.store(), session.account(), &cid, &meta).await?;

    let record = record_from_meta(&cid, Some(&meta), now);
    events::publish_record_added(session.account(), &cid, &record.member_id);
    Ok(record)
}

/// Grants access to an unapproved doctor or revokes it from an approved one.
/// Returns the new approval state.
pub async fn toggle_doctor_access<C, S>(session: &Session<'_, C, S>, doctor: &Doctor) -> Result<bool>
where
    C: ChainClient,
    S: MetadataStore,
{
    let chain = session.chain();
    if doctor.is_approved {
        chain.revoke_doctor(&doctor.address).await?.wait().await?;
        events::publish_access_revoked(session.account(), &doctor.address);
    } else {
        chain.approve_doctor(&doctor.address).await?.wait().await?;
        events::publish_access_granted(session.account(), &doctor.address);
    }
    Ok(!doctor.is_approved)
}
