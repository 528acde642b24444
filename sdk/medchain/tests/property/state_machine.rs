//! Property-based state machine tests for doctor onboarding and access.
//!
//! Random sequences of doctor submissions, admin reviews, registry edits and
//! patient access toggles are replayed against the in-memory collaborators
//! and checked step by step against a simple model.
//!
//! Invariants tested:
//! - `verified` and `rejected` never change once reached
//! - Submissions are accepted only while no decision has been made
//! - Verifying an application leaves the doctor registered on chain
//! - The patient's approval flag flips on every toggle and is cleared when
//!   the doctor is removed

use medchain::admin::AdminPanel;
use medchain::doctor::{application_status, submit_application};
use medchain::patient::{load_doctors, toggle_doctor_access};
use medchain::testutils::{ChainHandle, InMemoryChain, InMemoryStore};
use medchain::{Address, DoctorApplication, DoctorMeta, DoctorProfile, DoctorStatus, Error, Session};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{HashMap, HashSet};

// ── Helpers ───────────────────────────────────────────────────────────────────

const ADMIN: &str = "0xAD00000000000000000000000000000000000001";
const PATIENT: &str = "0x5a7E000000000000000000000000000000000002";
const DOCTORS: [&str; 3] = [
    "0xD0C000000000000000000000000000000000000A",
    "0xD0C000000000000000000000000000000000000B",
    "0xD0C000000000000000000000000000000000000C",
];

#[derive(Arbitrary, Clone, Copy, Debug)]
enum Action {
    Submit(u8),
    Verify(u8),
    Reject(u8),
    Register(u8),
    Remove(u8),
    Toggle(u8),
}

#[derive(Default)]
struct Model {
    status: HashMap<usize, DoctorStatus>,
    registered: HashSet<usize>,
    approved: HashSet<usize>,
}

fn doctor(slot: u8) -> (usize, Address) {
    let index = usize::from(slot) % DOCTORS.len();
    (index, Address::from(DOCTORS[index]))
}

fn application(address: &Address, status: DoctorStatus) -> DoctorApplication {
    DoctorApplication {
        id: address.key(),
        meta: DoctorMeta {
            wallet_address: Some(address.key()),
            status: Some(status),
            ..DoctorMeta::default()
        },
    }
}

fn profile(index: usize) -> DoctorProfile {
    DoctorProfile {
        name: format!("Dr. {index}"),
        profession: "Radiologist".into(),
        hospital: "St. Nicholas".into(),
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

async fn step(
    action: Action,
    model: &mut Model,
    chain: &InMemoryChain,
    store: &InMemoryStore,
    admin: &AdminPanel<'_, ChainHandle, InMemoryStore>,
    patient: &Session<'_, ChainHandle, InMemoryStore>,
) -> Result<(), TestCaseError> {
    match action {
        Action::Submit(slot) => {
            let (i, address) = doctor(slot);
            let result = submit_application(store, Some(&address), &profile(i), chrono::Utc::now()).await;
            match model.status.get(&i).copied() {
                Some(closed @ (DoctorStatus::Verified | DoctorStatus::Rejected)) => {
                    prop_assert_eq!(result.err(), Some(Error::ApplicationClosed(closed)));
                }
                _ => {
                    prop_assert!(result.is_ok());
                    model.status.insert(i, DoctorStatus::Pending);
                }
            }
        }
        Action::Verify(slot) | Action::Reject(slot) => {
            let (i, address) = doctor(slot);
            let Some(current) = model.status.get(&i).copied() else {
                return Ok(());
            };
            let (result, target) = if matches!(action, Action::Verify(_)) {
                let app = application(&address, DoctorStatus::Pending);
                (admin.verify(&app).await, DoctorStatus::Verified)
            } else {
                let app = application(&address, DoctorStatus::Pending);
                (admin.reject(&app).await, DoctorStatus::Rejected)
            };
            if current == DoctorStatus::Pending {
                prop_assert!(result.is_ok());
                model.status.insert(i, target);
                if target == DoctorStatus::Verified {
                    model.registered.insert(i);
                }
            } else {
                prop_assert_eq!(
                    result.err(),
                    Some(Error::InvalidTransition { from: current, to: target })
                );
            }
        }
        Action::Register(slot) => {
            let (i, address) = doctor(slot);
            let result = admin.register_doctor(&address).await;
            prop_assert_eq!(result.is_ok(), model.registered.insert(i));
        }
        Action::Remove(slot) => {
            let (i, address) = doctor(slot);
            let result = admin.remove_doctor(&address).await;
            prop_assert_eq!(result.is_ok(), model.registered.remove(&i));
            model.approved.remove(&i);
        }
        Action::Toggle(slot) => {
            let (i, address) = doctor(slot);
            let doctors = load_doctors(patient).await.unwrap();
            let Some(row) = doctors.iter().find(|d| d.address == address) else {
                prop_assert!(!model.registered.contains(&i));
                return Ok(());
            };
            prop_assert_eq!(row.is_approved, model.approved.contains(&i));
            let now_approved = toggle_doctor_access(patient, row).await.unwrap();
            prop_assert_eq!(now_approved, !row.is_approved);
            if now_approved {
                model.approved.insert(i);
            } else {
                model.approved.remove(&i);
            }
        }
    }

    for (i, raw) in DOCTORS.iter().enumerate() {
        let address = Address::from(*raw);
        let stored = application_status(store, Some(&address))
            .await
            .unwrap()
            .and_then(|meta| meta.status);
        prop_assert_eq!(stored, model.status.get(&i).copied());
        prop_assert_eq!(chain.doctors().contains(&address), model.registered.contains(&i));
        prop_assert_eq!(
            chain.is_approved(&Address::from(PATIENT), &address),
            model.approved.contains(&i)
        );
    }
    Ok(())
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    /// Every action sequence keeps chain, store and model in agreement.
    #[test]
    fn prop_onboarding_sequences_consistent(actions in prop::collection::vec(any::<Action>(), 1..24)) {
        let chain = InMemoryChain::new(ADMIN);
        let store = InMemoryStore::new();
        let admin_client = chain.signer(ADMIN);
        let patient_client = chain.signer(PATIENT);

        block_on(async {
            let admin = AdminPanel::open(Session::new(Address::from(ADMIN), &admin_client, &store))
                .await
                .unwrap();
            let patient = Session::new(Address::from(PATIENT), &patient_client, &store);
            let mut model = Model::default();
            for action in actions {
                step(action, &mut model, &chain, &store, &admin, &patient).await?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Decided applications keep their status through any later review.
    #[test]
    fn prop_decisions_are_final(
        first_verify in any::<bool>(),
        later in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let chain = InMemoryChain::new(ADMIN);
        let store = InMemoryStore::new();
        let admin_client = chain.signer(ADMIN);
        let address = Address::from(DOCTORS[0]);

        let final_status = block_on(async {
            submit_application(&store, Some(&address), &profile(0), chrono::Utc::now())
                .await
                .unwrap();
            let admin = AdminPanel::open(Session::new(Address::from(ADMIN), &admin_client, &store))
                .await
                .unwrap();
            let app = application(&address, DoctorStatus::Pending);
            if first_verify {
                admin.verify(&app).await.unwrap();
            } else {
                admin.reject(&app).await.unwrap();
            }
            for verify in later {
                let result = if verify {
                    admin.verify(&app).await
                } else {
                    admin.reject(&app).await
                };
                assert!(matches!(result, Err(Error::InvalidTransition { .. })));
            }
            application_status(&store, Some(&address))
                .await
                .unwrap()
                .and_then(|meta| meta.status)
        });

        let expected = if first_verify {
            DoctorStatus::Verified
        } else {
            DoctorStatus::Rejected
        };
        prop_assert_eq!(final_status, Some(expected));
        prop_assert_eq!(chain.doctors().contains(&address), first_verify);
    }
}
