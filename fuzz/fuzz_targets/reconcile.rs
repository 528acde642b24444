#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use medchain::reconcile::{merge_doctors, merge_records, search_doctors};
use medchain::{Address, ContentHash, DoctorMeta, RecordMeta, UNKNOWN_FILE_NAME};
use std::collections::{HashMap, HashSet};

#[derive(Arbitrary, Debug)]
pub struct FuzzInput {
    hashes: Vec<u8>,
    metadata: Vec<(u8, Option<String>, Option<u64>)>,
    doctors: Vec<u8>,
    profiles: Vec<(u8, Option<String>)>,
    query: String,
    now: u64,
}

fn cid(n: u8) -> ContentHash {
    ContentHash::new(format!("bafy{n:02x}"))
}

fn address(n: u8) -> Address {
    Address::from(format!("0x{n:040x}"))
}

fuzz_target!(|input: FuzzInput| {
    // The chain never reports the same hash twice.
    let mut seen = HashSet::new();
    let hashes: Vec<ContentHash> = input
        .hashes
        .iter()
        .filter(|n| seen.insert(**n))
        .map(|n| cid(*n))
        .collect();

    let metadata: HashMap<ContentHash, RecordMeta> = input
        .metadata
        .into_iter()
        .map(|(n, file_name, uploaded_at)| {
            let meta = RecordMeta {
                file_name,
                uploaded_at,
                ..RecordMeta::default()
            };
            (cid(n), meta)
        })
        .collect();

    let records = merge_records(&hashes, &metadata, input.now);
    assert_eq!(records.len(), hashes.len());
    for pair in records.windows(2) {
        assert!(pair[0].uploaded_at >= pair[1].uploaded_at);
    }
    for record in &records {
        assert!(hashes.contains(&record.cid));
        assert!(!record.file_name.is_empty());
        if !metadata.contains_key(&record.cid) {
            assert_eq!(record.file_name, UNKNOWN_FILE_NAME);
            assert_eq!(record.uploaded_at, input.now);
        }
    }

    let chain: Vec<Address> = input.doctors.iter().map(|n| address(*n)).collect();
    let directory: HashMap<String, DoctorMeta> = input
        .profiles
        .into_iter()
        .map(|(n, name)| {
            let meta = DoctorMeta {
                name,
                ..DoctorMeta::default()
            };
            (address(n).key(), meta)
        })
        .collect();

    let doctors = merge_doctors(&chain, &HashMap::new(), &directory);
    assert_eq!(doctors.len(), chain.len());
    assert!(doctors.iter().all(|d| !d.is_approved && !d.name.is_empty()));
    assert!(search_doctors(&doctors, &input.query).len() <= doctors.len());
});
