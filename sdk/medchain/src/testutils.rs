//! In-memory collaborators for tests and fuzzing.
//!
//! Everything is single-threaded: shared state lives behind `Rc<RefCell<_>>`
//! and no borrow is held across an `.await`.

use crate::errors::ExternalError;
use crate::ports::{
    ChainClient, ExternalResult, MetadataStore, PendingTx, TxReceipt, UploadGateway, Wallet,
};
use crate::types::{Address, ContentHash, UploadFile, UploadResult};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tokio::sync::{mpsc, Mutex};

// ── Chain ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ChainState {
    admin: Option<Address>,
    doctors: Vec<Address>,
    records: HashMap<Address, Vec<ContentHash>>,
    /// (patient, doctor) pairs.
    approvals: HashSet<(Address, Address)>,
    tx_count: u64,
    read_failure: Option<String>,
    write_failure: Option<String>,
    calls: Vec<String>,
}

impl ChainState {
    fn read(&mut self, call: &str) -> ExternalResult<()> {
        self.calls.push(call.to_string());
        match &self.read_failure {
            Some(msg) => Err(ExternalError::chain(msg.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
enum ChainOp {
    AddRecord(ContentHash),
    RegisterDoctor(Address),
    RemoveDoctor(Address),
    ApproveDoctor(Address),
    RevokeDoctor(Address),
}

/// Shared ledger; hand out per-account clients with [`InMemoryChain::signer`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryChain {
    state: Rc<RefCell<ChainState>>,
}

impl InMemoryChain {
    pub fn new(admin: impl Into<Address>) -> Self {
        let chain = Self::default();
        chain.state.borrow_mut().admin = Some(admin.into());
        chain
    }

    pub fn signer(&self, account: impl Into<Address>) -> ChainHandle {
        ChainHandle {
            state: Rc::clone(&self.state),
            caller: account.into(),
        }
    }

    /// Seeds a doctor without going through a transaction.
    pub fn seed_doctor(&self, doctor: impl Into<Address>) {
        self.state.borrow_mut().doctors.push(doctor.into());
    }

    /// Seeds record hashes for `patient` without going through a transaction.
    pub fn seed_records<I, H>(&self, patient: impl Into<Address>, hashes: I)
    where
        I: IntoIterator<Item = H>,
        H: Into<ContentHash>,
    {
        self.state
            .borrow_mut()
            .records
            .entry(patient.into())
            .or_default()
            .extend(hashes.into_iter().map(Into::into));
    }

    pub fn seed_approval(&self, patient: impl Into<Address>, doctor: impl Into<Address>) {
        self.state
            .borrow_mut()
            .approvals
            .insert((patient.into(), doctor.into()));
    }

    pub fn fail_reads(&self, message: &str) {
        self.state.borrow_mut().read_failure = Some(message.to_string());
    }

    pub fn fail_writes(&self, message: &str) {
        self.state.borrow_mut().write_failure = Some(message.to_string());
    }

    pub fn records_of(&self, patient: &Address) -> Vec<ContentHash> {
        self.state
            .borrow()
            .records
            .get(patient)
            .cloned()
            .unwrap_or_default()
    }

    pub fn doctors(&self) -> Vec<Address> {
        self.state.borrow().doctors.clone()
    }

    pub fn is_approved(&self, patient: &Address, doctor: &Address) -> bool {
        self.state
            .borrow()
            .approvals
            .contains(&(patient.clone(), doctor.clone()))
    }

    /// Names of every client call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == name)
            .count()
    }
}

/// Chain client signing as `caller`.
#[derive(Clone, Debug)]
pub struct ChainHandle {
    state: Rc<RefCell<ChainState>>,
    caller: Address,
}

impl ChainHandle {
    fn submit(&self, call: &str, op: ChainOp) -> ExternalResult<InMemoryTx> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call.to_string());
        if let Some(msg) = &state.write_failure {
            return Err(ExternalError::chain(msg.clone()));
        }
        state.tx_count += 1;
        Ok(InMemoryTx {
            state: Rc::clone(&self.state),
            caller: self.caller.clone(),
            hash: format!("0x{:064x}", state.tx_count),
            op,
        })
    }
}

/// Transaction applied to the ledger when awaited.
#[derive(Debug)]
pub struct InMemoryTx {
    state: Rc<RefCell<ChainState>>,
    caller: Address,
    hash: String,
    op: ChainOp,
}

impl InMemoryTx {
    fn apply(&self) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let is_admin = state.admin.as_ref() == Some(&self.caller);
        match &self.op {
            ChainOp::AddRecord(cid) => {
                state
                    .records
                    .entry(self.caller.clone())
                    .or_default()
                    .push(cid.clone());
            }
            ChainOp::RegisterDoctor(doctor) => {
                if !is_admin {
                    return Err("Only admin can perform this action".into());
                }
                if state.doctors.contains(doctor) {
                    return Err("Doctor already registered".into());
                }
                state.doctors.push(doctor.clone());
            }
            ChainOp::RemoveDoctor(doctor) => {
                if !is_admin {
                    return Err("Only admin can perform this action".into());
                }
                let before = state.doctors.len();
                state.doctors.retain(|d| d != doctor);
                if state.doctors.len() == before {
                    return Err("Doctor not registered".into());
                }
                state.approvals.retain(|(_, d)| d != doctor);
            }
            ChainOp::ApproveDoctor(doctor) => {
                if !state.doctors.contains(doctor) {
                    return Err("Not a registered doctor".into());
                }
                state
                    .approvals
                    .insert((self.caller.clone(), doctor.clone()));
            }
            ChainOp::RevokeDoctor(doctor) => {
                state
                    .approvals
                    .remove(&(self.caller.clone(), doctor.clone()));
            }
        }
        Ok(())
    }
}

impl PendingTx for InMemoryTx {
    async fn wait(self) -> ExternalResult<TxReceipt> {
        self.apply()
            .map_err(|reason| ExternalError::chain(format!("execution reverted: {reason}")))?;
        Ok(TxReceipt { hash: self.hash })
    }
}

impl ChainClient for ChainHandle {
    type Tx = InMemoryTx;

    async fn admin(&self) -> ExternalResult<Address> {
        let mut state = self.state.borrow_mut();
        state.read("admin")?;
        state
            .admin
            .clone()
            .ok_or_else(|| ExternalError::chain("contract not initialized"))
    }

    async fn my_record_hashes(&self, account: &Address) -> ExternalResult<Vec<ContentHash>> {
        let mut state = self.state.borrow_mut();
        state.read("getMyRecords")?;
        Ok(state.records.get(account).cloned().unwrap_or_default())
    }

    async fn all_doctor_addresses(&self) -> ExternalResult<Vec<Address>> {
        let mut state = self.state.borrow_mut();
        state.read("getAllDoctors")?;
        Ok(state.doctors.clone())
    }

    async fn is_doctor_approved(&self, doctor: &Address) -> ExternalResult<bool> {
        let mut state = self.state.borrow_mut();
        state.read("isDoctorApproved")?;
        Ok(state
            .approvals
            .contains(&(self.caller.clone(), doctor.clone())))
    }

    async fn is_doctor_registered(&self, doctor: &Address) -> ExternalResult<bool> {
        let mut state = self.state.borrow_mut();
        state.read("isDoctor")?;
        Ok(state.doctors.contains(doctor))
    }

    async fn add_record(&self, cid: &ContentHash) -> ExternalResult<InMemoryTx> {
        self.submit("addRecord", ChainOp::AddRecord(cid.clone()))
    }

    async fn register_doctor(&self, doctor: &Address) -> ExternalResult<InMemoryTx> {
        self.submit("registerDoctor", ChainOp::RegisterDoctor(doctor.clone()))
    }

    async fn remove_doctor(&self, doctor: &Address) -> ExternalResult<InMemoryTx> {
        self.submit("removeDoctor", ChainOp::RemoveDoctor(doctor.clone()))
    }

    async fn approve_doctor(&self, doctor: &Address) -> ExternalResult<InMemoryTx> {
        self.submit("approveDoctor", ChainOp::ApproveDoctor(doctor.clone()))
    }

    async fn revoke_doctor(&self, doctor: &Address) -> ExternalResult<InMemoryTx> {
        self.submit("revokeDoctor", ChainOp::RevokeDoctor(doctor.clone()))
    }
}

// ── Metadata store ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StoreState {
    root: Value,
    next_key: u64,
    failure: Option<String>,
    writes: usize,
}

impl StoreState {
    fn check(&self) -> ExternalResult<()> {
        match &self.failure {
            Some(msg) => Err(ExternalError::metadata(msg.clone())),
            None => Ok(()),
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let mut cur = root;
    for seg in segments(path) {
        cur = cur.as_object()?.get(seg)?;
    }
    if cur.is_null() {
        None
    } else {
        Some(cur)
    }
}

fn slot<'v>(root: &'v mut Value, path: &str) -> &'v mut Value {
    let mut cur = root;
    for seg in segments(path) {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        let Value::Object(map) = cur else {
            unreachable!("slot was just replaced by an object")
        };
        cur = map.entry(seg.to_string()).or_insert(Value::Null);
    }
    cur
}

/// JSON document tree with push keys that sort in insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Rc<RefCell<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw document, bypassing the write counter.
    pub fn seed(&self, path: &str, value: Value) {
        *slot(&mut self.state.borrow_mut().root, path) = value;
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        lookup(&self.state.borrow().root, path).cloned()
    }

    pub fn fail_with(&self, message: &str) {
        self.state.borrow_mut().failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.state.borrow_mut().failure = None;
    }

    /// Number of successful `set`/`update`/`push` calls.
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }
}

impl MetadataStore for InMemoryStore {
    async fn get(&self, path: &str) -> ExternalResult<Option<Value>> {
        let state = self.state.borrow();
        state.check()?;
        Ok(lookup(&state.root, path).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> ExternalResult<()> {
        let mut state = self.state.borrow_mut();
        state.check()?;
        *slot(&mut state.root, path) = value;
        state.writes += 1;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> ExternalResult<()> {
        let mut state = self.state.borrow_mut();
        state.check()?;
        let target = slot(&mut state.root, path);
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(map) = target {
            map.extend(fields);
        }
        state.writes += 1;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> ExternalResult<String> {
        let mut state = self.state.borrow_mut();
        state.check()?;
        state.next_key += 1;
        let key = format!("-N{:012}", state.next_key);
        *slot(&mut state.root, &format!("{path}/{key}")) = value;
        state.writes += 1;
        Ok(key)
    }

    async fn query_eq(
        &self,
        path: &str,
        field: &str,
        value: &Value,
    ) -> ExternalResult<Vec<(String, Value)>> {
        let state = self.state.borrow();
        state.check()?;
        let Some(Value::Object(children)) = lookup(&state.root, path) else {
            return Ok(Vec::new());
        };
        Ok(children
            .iter()
            .filter(|(_, child)| child.get(field) == Some(value))
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect())
    }
}

// ── Upload gateway ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GatewayState {
    reject: bool,
    failure: Option<String>,
    uploads: usize,
}

/// Gateway issuing deterministic content hashes.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGateway {
    state: Rc<RefCell<GatewayState>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsequent uploads report `success: false`.
    pub fn reject_uploads(&self) {
        self.state.borrow_mut().reject = true;
    }

    pub fn fail_with(&self, message: &str) {
        self.state.borrow_mut().failure = Some(message.to_string());
    }

    pub fn uploads(&self) -> usize {
        self.state.borrow().uploads
    }

    pub fn cid_for(file: &UploadFile) -> ContentHash {
        let mut hasher = DefaultHasher::new();
        file.name.hash(&mut hasher);
        file.bytes.hash(&mut hasher);
        ContentHash::new(format!("bafk{:016x}", hasher.finish()))
    }
}

impl UploadGateway for InMemoryGateway {
    async fn upload(&self, file: &UploadFile) -> ExternalResult<UploadResult> {
        let mut state = self.state.borrow_mut();
        if let Some(msg) = &state.failure {
            return Err(ExternalError::upload(msg.clone()));
        }
        state.uploads += 1;
        if state.reject {
            return Ok(UploadResult {
                success: false,
                cid: None,
            });
        }
        Ok(UploadResult {
            success: true,
            cid: Some(Self::cid_for(file)),
        })
    }
}

// ── Wallet ───────────────────────────────────────────────────────────────────

/// Wallet whose account can be switched from the test. Each switch is
/// queued for [`Wallet::next_account_change`].
#[derive(Clone, Debug)]
pub struct InMemoryWallet {
    account: Rc<RefCell<Option<Address>>>,
    notify: mpsc::UnboundedSender<Option<Address>>,
    changes: Rc<Mutex<mpsc::UnboundedReceiver<Option<Address>>>>,
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        let (notify, changes) = mpsc::unbounded_channel();
        Self {
            account: Rc::default(),
            notify,
            changes: Rc::new(Mutex::new(changes)),
        }
    }
}

impl InMemoryWallet {
    pub fn connected(account: impl Into<Address>) -> Self {
        let wallet = Self::default();
        *wallet.account.borrow_mut() = Some(account.into());
        wallet
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Simulates the user picking another account (or disconnecting).
    pub fn switch_account(&self, account: Option<Address>) {
        *self.account.borrow_mut() = account.clone();
        // Receiver is owned by `self`.
        let _ = self.notify.send(account);
    }
}

impl Wallet for InMemoryWallet {
    async fn current_account(&self) -> ExternalResult<Option<Address>> {
        Ok(self.account.borrow().clone())
    }

    async fn connect(&self) -> ExternalResult<Address> {
        self.account
            .borrow()
            .clone()
            .ok_or_else(|| ExternalError::wallet("User rejected the request."))
    }

    async fn next_account_change(&self) -> ExternalResult<Option<Address>> {
        let mut changes = self.changes.lock().await;
        changes
            .recv()
            .await
            .ok_or_else(|| ExternalError::wallet("wallet provider closed"))
    }
}
