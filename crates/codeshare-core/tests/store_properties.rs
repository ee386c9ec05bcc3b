//! Property tests for the session store.

#![allow(clippy::unwrap_used, clippy::panic)]

use codeshare_core::{
    SessionId, SessionStore, ShareError, ShareRequest, StoreConfig, dispatch,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const T0: u64 = 1_700_000_000_000;

fn config(ttl_ms: u64) -> StoreConfig {
    StoreConfig {
        ttl_ms,
        ..StoreConfig::default()
    }
}

proptest! {
    #[test]
    fn created_ids_are_unique_and_well_formed(seed in any::<u64>(), count in 1usize..200) {
        let mut store = SessionStore::with_seed(StoreConfig::default(), seed);
        let mut seen = BTreeSet::new();

        for _ in 0..count {
            let id = store.create(String::new(), T0).unwrap();
            prop_assert!(SessionId::is_well_formed(id.as_str()));
            prop_assert!(seen.insert(id));
        }
        prop_assert_eq!(store.len(), count);
    }

    #[test]
    fn get_returns_last_written(writes in prop::collection::vec(".{0,64}", 1..20)) {
        let mut store = SessionStore::with_seed(StoreConfig::default(), 3);
        let id = store.create(String::new(), T0).unwrap();

        for (step, content) in writes.iter().enumerate() {
            let now = T0 + step as u64;
            let request = ShareRequest::update(id.as_str(), content.clone());
            let resp = dispatch(&mut store, request, now);
            prop_assert!(resp.is_ok());
        }

        let last = writes.last().cloned().unwrap_or_default();
        prop_assert_eq!(store.get(id.as_str(), T0 + 100), Ok(last.as_str()));
    }

    #[test]
    fn session_survives_while_accessed_within_ttl(
        ttl in 10u64..10_000,
        gaps in prop::collection::vec(0u64..10_000, 1..30),
    ) {
        let mut store = SessionStore::with_seed(config(ttl), 5);
        let id = store.create("x".into(), T0).unwrap();
        let mut now = T0;

        for gap in gaps {
            let gap = gap % ttl;
            now += gap;
            prop_assert!(store.heartbeat(id.as_str(), now).is_ok());
        }

        prop_assert!(matches!(
            store.get(id.as_str(), now + ttl),
            Err(ShareError::SessionNotFound(_))
        ));
    }

    #[test]
    fn sweep_never_removes_live_sessions(
        ages in prop::collection::vec(0u64..2_000, 1..50),
    ) {
        let ttl = 1_000;
        let mut store = SessionStore::with_seed(config(ttl), 11);
        let now = T0 + 2_000;

        for age in &ages {
            store.create(String::new(), now - age).unwrap();
        }

        let expected_expired = ages.iter().filter(|age| **age >= ttl).count();
        prop_assert_eq!(store.sweep_expired(now), expected_expired);
        prop_assert_eq!(store.len(), ages.len() - expected_expired);
    }
}
