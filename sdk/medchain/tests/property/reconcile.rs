//! Property-based tests for the record and doctor merges.
//!
//! Invariants tested:
//! - `merge_records` yields exactly one record per chain hash, nothing else
//! - Hashes without metadata always carry the placeholder fields and `now`
//! - Output is always sorted by `uploaded_at`, newest first
//! - `merge_doctors` yields one row per chain address, in chain order
//! - An empty search returns every doctor; any search returns a subset

use medchain::reconcile::{filter_by_member, merge_doctors, merge_records, search_doctors};
use medchain::{
    Address, ContentHash, DoctorMeta, RecordMeta, UNASSIGNED_MEMBER, UNKNOWN_DOCTOR_NAME,
    UNKNOWN_FILE_NAME, UNKNOWN_FILE_TYPE,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// ── Helpers ───────────────────────────────────────────────────────────────────

const NOW: u64 = 1_700_000_000_000;

fn cid(n: u16) -> ContentHash {
    ContentHash::new(format!("bafy{n:04x}"))
}

fn address(n: u8) -> Address {
    Address::from(format!("0x{n:040X}"))
}

fn meta_for(n: u16, uploaded_at: u64, member: u8) -> RecordMeta {
    RecordMeta {
        cid: Some(cid(n)),
        member_id: Some(format!("member-{}", member % 3)),
        file_name: Some(format!("file-{n}.pdf")),
        file_type: Some("application/pdf".into()),
        uploaded_at: Some(uploaded_at),
        description: Some(String::new()),
    }
}

/// Distinct chain hashes, each optionally paired with metadata, plus stray
/// metadata for hashes the chain never returned.
fn scenario() -> impl Strategy<Value = (Vec<ContentHash>, HashMap<ContentHash, RecordMeta>)> {
    (
        prop::collection::btree_map(0u16..512, prop::option::of((1u64..NOW, any::<u8>())), 0..24),
        prop::collection::vec((512u16..1024, 1u64..NOW), 0..6),
    )
        .prop_map(|(chain, stray)| {
            let mut metadata = HashMap::new();
            let hashes = chain
                .iter()
                .map(|(n, meta)| {
                    if let Some((ts, member)) = meta {
                        metadata.insert(cid(*n), meta_for(*n, *ts, *member));
                    }
                    cid(*n)
                })
                .collect();
            for (n, ts) in stray {
                metadata.insert(cid(n), meta_for(n, ts, 0));
            }
            (hashes, metadata)
        })
}

fn doctor_meta(name: &str) -> DoctorMeta {
    DoctorMeta {
        name: Some(name.to_string()),
        profession: Some("Surgeon".into()),
        hospital: Some("General".into()),
        ..DoctorMeta::default()
    }
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    /// Every chain hash appears exactly once and nothing else appears.
    #[test]
    fn prop_merge_records_matches_chain((hashes, metadata) in scenario()) {
        let merged = merge_records(&hashes, &metadata, NOW);

        prop_assert_eq!(merged.len(), hashes.len());
        let merged_ids: HashSet<_> = merged.iter().map(|r| r.cid.clone()).collect();
        let chain_ids: HashSet<_> = hashes.iter().cloned().collect();
        prop_assert_eq!(merged_ids, chain_ids);
    }

    /// Legacy hashes always get placeholder fields stamped with `now`.
    #[test]
    fn prop_legacy_records_use_placeholders((hashes, metadata) in scenario()) {
        let merged = merge_records(&hashes, &metadata, NOW);

        for record in merged.iter().filter(|r| !metadata.contains_key(&r.cid)) {
            prop_assert_eq!(record.file_name.as_str(), UNKNOWN_FILE_NAME);
            prop_assert_eq!(record.file_type.as_str(), UNKNOWN_FILE_TYPE);
            prop_assert_eq!(record.member_id.as_str(), UNASSIGNED_MEMBER);
            prop_assert_eq!(record.uploaded_at, NOW);
            prop_assert!(record.description.is_empty());
        }
    }

    /// Records are always ordered newest first.
    #[test]
    fn prop_merge_records_sorted_desc((hashes, metadata) in scenario()) {
        let merged = merge_records(&hashes, &metadata, NOW);
        for pair in merged.windows(2) {
            prop_assert!(pair[0].uploaded_at >= pair[1].uploaded_at);
        }
    }

    /// Per-member filters partition the merged list.
    #[test]
    fn prop_member_filters_partition((hashes, metadata) in scenario()) {
        let merged = merge_records(&hashes, &metadata, NOW);
        let members = ["member-0", "member-1", "member-2", UNASSIGNED_MEMBER];

        let total: usize = members
            .iter()
            .map(|m| filter_by_member(&merged, m).len())
            .sum();
        prop_assert_eq!(total, merged.len());
    }

    /// One row per chain address, in chain order, with defaults for unknown profiles.
    #[test]
    fn prop_merge_doctors_one_row_per_address(
        registry in prop::collection::btree_set(any::<u8>(), 0..16),
        profiled in prop::collection::vec(any::<u8>(), 0..16),
        approved in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let chain: Vec<Address> = registry.iter().map(|n| address(*n)).collect();
        let directory: HashMap<String, DoctorMeta> = profiled
            .iter()
            .map(|n| (address(*n).key(), doctor_meta(&format!("Dr. {n}"))))
            .collect();
        let approvals: HashMap<Address, bool> =
            approved.iter().map(|n| (address(*n), true)).collect();

        let doctors = merge_doctors(&chain, &approvals, &directory);

        prop_assert_eq!(doctors.len(), chain.len());
        for (doctor, addr) in doctors.iter().zip(&chain) {
            prop_assert_eq!(&doctor.address, addr);
            prop_assert_eq!(doctor.is_approved, approvals.contains_key(addr));
            if !directory.contains_key(&addr.key()) {
                prop_assert_eq!(doctor.name.as_str(), UNKNOWN_DOCTOR_NAME);
            }
        }
    }

    /// An empty query returns all doctors; any query returns a subset.
    #[test]
    fn prop_search_is_subset(
        registry in prop::collection::btree_set(any::<u8>(), 0..16),
        query in "[a-zA-Z. ]{0,6}",
    ) {
        let chain: Vec<Address> = registry.iter().map(|n| address(*n)).collect();
        let directory: HashMap<String, DoctorMeta> = registry
            .iter()
            .map(|n| (address(*n).key(), doctor_meta(&format!("Dr. {n}"))))
            .collect();
        let doctors = merge_doctors(&chain, &HashMap::new(), &directory);

        prop_assert_eq!(search_doctors(&doctors, "").len(), doctors.len());
        let hits = search_doctors(&doctors, &query);
        prop_assert!(hits.len() <= doctors.len());
        let upper = search_doctors(&doctors, &query.to_uppercase());
        prop_assert_eq!(hits.len(), upper.len());
    }
}
