#![no_main]

use libfuzzer_sys::fuzz_target;
use medchain::reconcile::ensure_self_member;
use medchain::store::{paths, read_members};
use medchain::testutils::InMemoryStore;
use medchain::Address;
use std::cell::Cell;
use std::convert::Infallible;

// Arbitrary JSON under the members path must never make the read side fail
// or panic, and a stored Self member is never shadowed by a new one.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    // Any object child whose relation is exactly "Self" must be recognised,
    // whatever its other fields hold.
    let stored_self = value.as_object().is_some_and(|children| {
        children
            .values()
            .any(|child| child.is_object() && child["relation"] == "Self")
    });
    let account = Address::from("0x5a7E000000000000000000000000000000000002");
    let store = InMemoryStore::new();
    store.seed(&paths::members(&account), value);

    let runtime = tokio_runtime();
    runtime.block_on(async {
        let members = read_members(&store, &account).await.expect("store is healthy");
        let created = Cell::new(false);
        let members = ensure_self_member(members, 1, |_| {
            created.set(true);
            async { Ok::<_, Infallible>("-Nself".to_string()) }
        })
        .await
        .expect("creator cannot fail");
        assert!(members.iter().any(|m| m.relation.is_self()));
        if stored_self {
            assert!(!created.get(), "stored Self member was not recognised");
        }
    });
});

fn tokio_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}
