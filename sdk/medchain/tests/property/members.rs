//! Property-based tests for Self-member provisioning.
//!
//! Invariants tested:
//! - After `ensure_self_member` the list always contains exactly one `Self`
//!   member when it started with none
//! - The creator runs only when no `Self` member exists
//! - Existing members are never dropped or reordered
//! - Only the exact relation string `"Self"` counts

use medchain::reconcile::ensure_self_member;
use medchain::{Member, Relation, SELF_PROFILE_NAME};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cell::Cell;
use std::convert::Infallible;

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Arbitrary, Clone, Debug)]
enum RelationSeed {
    SelfExact,
    SelfLower,
    SelfPadded,
    Spouse,
    Child,
    Parent,
    Sibling,
    Other,
    Blank,
}

impl RelationSeed {
    fn relation(&self) -> Relation {
        Relation::from(match self {
            RelationSeed::SelfExact => "Self",
            RelationSeed::SelfLower => "self",
            RelationSeed::SelfPadded => " Self",
            RelationSeed::Spouse => "Spouse",
            RelationSeed::Child => "Child",
            RelationSeed::Parent => "Parent",
            RelationSeed::Sibling => "Sibling",
            RelationSeed::Other => "Other",
            RelationSeed::Blank => "",
        })
    }
}

fn member(index: usize, seed: &RelationSeed) -> Member {
    Member {
        id: format!("-M{index:04}"),
        name: format!("Member {index}"),
        relation: seed.relation(),
        age: String::new(),
        location: String::new(),
        created_at: index as u64,
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    /// The creator is called exactly when no exact `Self` relation exists.
    #[test]
    fn prop_self_member_created_once(
        seeds in prop::collection::vec(any::<RelationSeed>(), 0..8),
        now in 1u64..=u64::from(u32::MAX),
    ) {
        let members: Vec<Member> = seeds.iter().enumerate().map(|(i, s)| member(i, s)).collect();
        let had_self = seeds.iter().any(|s| matches!(s, RelationSeed::SelfExact));
        let calls = Cell::new(0u32);

        let result = block_on(ensure_self_member(members.clone(), now, |profile| {
            calls.set(calls.get() + 1);
            let relation = profile.relation.clone();
            async move {
                assert_eq!(relation, Relation::Myself);
                Ok::<_, Infallible>("-Nself".to_string())
            }
        }))
        .unwrap();

        prop_assert_eq!(calls.get(), u32::from(!had_self));
        prop_assert_eq!(&result[..members.len()], &members[..]);
        prop_assert!(result.iter().any(|m| m.relation.is_self()));

        if had_self {
            prop_assert_eq!(result.len(), members.len());
        } else {
            let created = result.last().unwrap();
            prop_assert_eq!(result.len(), members.len() + 1);
            prop_assert_eq!(created.id.as_str(), "-Nself");
            prop_assert_eq!(created.name.as_str(), SELF_PROFILE_NAME);
            prop_assert_eq!(created.created_at, now);
        }
    }

    /// Running the provisioning twice never creates a second Self member.
    #[test]
    fn prop_self_member_idempotent(seeds in prop::collection::vec(any::<RelationSeed>(), 0..8)) {
        let members: Vec<Member> = seeds.iter().enumerate().map(|(i, s)| member(i, s)).collect();

        let once = block_on(ensure_self_member(members, 1, |_| async {
            Ok::<_, Infallible>("-Nself".to_string())
        }))
        .unwrap();
        let twice = block_on(ensure_self_member(once.clone(), 2, |_| async {
            Ok::<_, Infallible>("-Nother".to_string())
        }))
        .unwrap();

        prop_assert_eq!(once, twice);
    }
}
