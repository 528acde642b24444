#![allow(dead_code)]

use medchain::testutils::{ChainHandle, InMemoryChain, InMemoryGateway, InMemoryStore};
use medchain::{Address, Session, UploadFile};
use serde_json::json;

pub const ADMIN: &str = "0xAD00000000000000000000000000000000000001";
pub const PATIENT: &str = "0x5a7E000000000000000000000000000000000002";
pub const DOCTOR_A: &str = "0xD0C000000000000000000000000000000000000A";
pub const DOCTOR_B: &str = "0xD0C000000000000000000000000000000000000B";

pub struct TestContext {
    pub chain: InMemoryChain,
    pub store: InMemoryStore,
    pub gateway: InMemoryGateway,
    pub patient: ChainHandle,
    pub admin: ChainHandle,
}

impl TestContext {
    pub fn patient_session(&self) -> Session<'_, ChainHandle, InMemoryStore> {
        Session::new(Address::from(PATIENT), &self.patient, &self.store)
    }

    pub fn admin_session(&self) -> Session<'_, ChainHandle, InMemoryStore> {
        Session::new(Address::from(ADMIN), &self.admin, &self.store)
    }
}

/// Fresh ledger with `ADMIN` as contract admin and empty collaborators.
pub fn setup_test_env() -> TestContext {
    let chain = InMemoryChain::new(ADMIN);
    let patient = chain.signer(PATIENT);
    let admin = chain.signer(ADMIN);
    TestContext {
        chain,
        store: InMemoryStore::new(),
        gateway: InMemoryGateway::new(),
        patient,
        admin,
    }
}

/// Stores a doctor profile document under the lower-cased address.
pub fn seed_doctor_profile(
    ctx: &TestContext,
    address: &str,
    name: &str,
    profession: &str,
    hospital: &str,
    status: &str,
) {
    ctx.store.seed(
        &format!("doctors/{}", address.to_ascii_lowercase()),
        json!({
            "name": name,
            "profession": profession,
            "hospital": hospital,
            "walletAddress": address.to_ascii_lowercase(),
            "status": status,
            "createdAt": "2026-01-01T00:00:00.000Z"
        }),
    );
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: name.as_bytes().to_vec(),
    }
}
