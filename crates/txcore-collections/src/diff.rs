//! Bulk diff computation
//!
//! Removal by predicate runs in two phases over the store:
//! 1. Evaluate the predicate on every element and record a match mask. The
//!    store is only read here, so a panicking predicate leaves it intact.
//! 2. If anything matched, split the store into survivors and removed
//!    values, both in their original relative order.

use std::mem;

/// Remove every element matching `predicate` from `store`.
///
/// Returns the removed elements in original order. `store` is untouched
/// when nothing matches.
pub fn extract_matching<T, F>(store: &mut Vec<T>, mut predicate: F) -> Vec<T>
where
    F: FnMut(&T) -> bool,
{
    let mask: Vec<bool> = store.iter().map(&mut predicate).collect();
    let matched = mask.iter().filter(|m| **m).count();
    if matched == 0 {
        return Vec::new();
    }

    let mut survivors = Vec::with_capacity(store.len() - matched);
    let mut removed = Vec::with_capacity(matched);
    for (item, hit) in mem::take(store).into_iter().zip(mask) {
        if hit {
            removed.push(item);
        } else {
            survivors.push(item);
        }
    }
    *store = survivors;
    removed
}

/// Remove every element equal to some value in `values`
pub fn extract_members<T: PartialEq>(store: &mut Vec<T>, values: &[T]) -> Vec<T> {
    extract_matching(store, |item| values.contains(item))
}

/// Remove every element not equal to any value in `values`
pub fn extract_non_members<T: PartialEq>(store: &mut Vec<T>, values: &[T]) -> Vec<T> {
    extract_matching(store, |item| !values.contains(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_matching_preserves_order() {
        let mut store = vec![5, 1, 8, 2, 9, 3];
        let removed = extract_matching(&mut store, |x| *x > 4);
        assert_eq!(removed, vec![5, 8, 9]);
        assert_eq!(store, vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_matching_no_match() {
        let mut store = vec![1, 2, 3];
        let capacity = store.capacity();
        let removed = extract_matching(&mut store, |x| *x > 10);
        assert!(removed.is_empty());
        assert_eq!(store, vec![1, 2, 3]);
        assert_eq!(store.capacity(), capacity);
    }

    #[test]
    fn test_panicking_predicate_leaves_store() {
        let mut store = vec![1, 2, 3];
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            extract_matching(&mut store, |x| {
                if *x == 3 {
                    panic!("predicate failure");
                }
                true
            })
        }));
        assert!(result.is_err());
        assert_eq!(store, vec![1, 2, 3]);
    }

    #[test]
    fn test_members_use_value_equality() {
        let mut store = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let removed = extract_members(&mut store, &["a".to_string()]);
        assert_eq!(removed, vec!["a".to_string(), "a".to_string()]);
        assert_eq!(store, vec!["b".to_string()]);

        let mut store = vec![1, 2, 3, 2];
        let removed = extract_non_members(&mut store, &[2]);
        assert_eq!(removed, vec![1, 3]);
        assert_eq!(store, vec![2, 2]);
    }

    proptest! {
        #[test]
        fn prop_partition_is_exact(values in proptest::collection::vec(0u8..50, 0..64), pivot in 0u8..50) {
            let mut store = values.clone();
            let removed = extract_matching(&mut store, |x| *x < pivot);

            let expected_removed: Vec<u8> = values.iter().copied().filter(|x| *x < pivot).collect();
            let expected_kept: Vec<u8> = values.iter().copied().filter(|x| *x >= pivot).collect();
            prop_assert_eq!(removed, expected_removed);
            prop_assert_eq!(store, expected_kept);
        }
    }
}
