//! Property-based tests for the interner.

use proptest::prelude::*;
use tessera_core::{Interner, RawValue};

/// Strategy for values drawn from both namespaces, with overlap between them.
fn raw_value_strategy() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        (-50i64..50).prop_map(RawValue::from),
        (-50i64..50).prop_map(|n| RawValue::from(n.to_string())),
        "[a-z]{1,4}".prop_map(RawValue::from),
    ]
}

proptest! {
    /// reverse(intern(v)) == v, and repeated interning is stable.
    #[test]
    fn intern_reverse_roundtrip(values in prop::collection::vec(raw_value_strategy(), 1..200)) {
        let mut interner = Interner::new();
        let ids: Vec<_> = values.iter().map(|v| interner.intern(v.clone())).collect();
        for (value, &id) in values.iter().zip(&ids) {
            prop_assert_eq!(interner.reverse(id), value);
            prop_assert_eq!(interner.get(value), Some(id));
        }
        for (value, &id) in values.iter().zip(&ids) {
            prop_assert_eq!(interner.intern(value.clone()), id);
        }
    }

    /// n interns followed by n releases frees the value and its id.
    #[test]
    fn release_after_n_references(value in raw_value_strategy(), n in 1usize..20) {
        let mut interner = Interner::new();
        let keep = interner.intern("__keep__");
        let mut id = None;
        for _ in 0..n {
            id = Some(interner.intern(value.clone()));
        }
        let id = id.unwrap();
        prop_assert_eq!(interner.ref_count(id) as usize, n);

        for i in 0..n {
            prop_assert_eq!(interner.get(&value), Some(id), "released early at {}", i);
            interner.release(id);
        }
        prop_assert_eq!(interner.get(&value), None);
        prop_assert_eq!(interner.try_reverse(id), None);

        // The freed id is the next one handed out
        let reused = interner.intern("__fresh__");
        prop_assert_eq!(reused, id);
        prop_assert_ne!(reused, keep);
    }

    /// Live value count matches the distinct values still referenced.
    #[test]
    fn len_tracks_live_values(values in prop::collection::vec(raw_value_strategy(), 1..100)) {
        let mut interner = Interner::new();
        let ids: Vec<_> = values.iter().map(|v| interner.intern(v.clone())).collect();
        let distinct: std::collections::HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(interner.len(), distinct.len());

        for &id in &ids {
            interner.release(id);
        }
        prop_assert!(interner.is_empty());
    }
}
