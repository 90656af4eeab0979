//! End-to-end scenarios
//!
//! Each scenario drives a fresh list through a short script and returns a
//! `ScenarioResult`; `run_all_scenarios` runs the whole set.

use std::sync::Arc;

use txcore_collections::{ListChange, ListConfig, ListError, ObservableList};

use crate::{ChangeRecorder, PanickingListener};

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of one scenario
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl ScenarioResult {
    fn check(name: &'static str, passed: bool, detail: impl Into<String>) -> Self {
        ScenarioResult {
            name,
            passed,
            detail: detail.into(),
        }
    }
}

fn observed<T: Clone + Send + 'static>() -> (ObservableList<T>, Arc<ChangeRecorder<T>>) {
    let list = ObservableList::new();
    let recorder = Arc::new(ChangeRecorder::new());
    list.add_listener(&recorder);
    (list, recorder)
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// append, append, insert, remove, predicate removal
pub fn scenario_walkthrough() -> ScenarioResult {
    let (list, recorder) = observed::<i32>();

    let steps = list
        .push(1)
        .and_then(|_| list.push(2))
        .and_then(|_| list.insert(1, 9))
        .and_then(|_| list.remove(0).map(|_| ()))
        .and_then(|_| list.remove_where(|x| *x > 5).map(|_| ()));

    let expected = vec![
        ListChange::Added(1),
        ListChange::Added(2),
        ListChange::Inserted { index: 1, item: 9 },
        ListChange::Removed(1),
        ListChange::removal(vec![9]),
    ];
    let changes = recorder.take();
    let store = list.to_vec();
    ScenarioResult::check(
        "walkthrough",
        steps.is_ok() && store == vec![2] && changes == expected,
        format!("store {store:?}, changes {changes:?}"),
    )
}

/// `replace_all` reports the full prior store even when contents overlap
pub fn scenario_replace_overlap() -> ScenarioResult {
    let (list, recorder) = observed::<&'static str>();
    let ok = list.extend(["a", "b", "c"]).is_ok() && list.replace_all(["c", "a"]).is_ok();

    let last = recorder.changes().pop();
    let expected = ListChange::Bulk {
        added: vec!["c", "a"],
        removed: vec!["a", "b", "c"],
    };
    ScenarioResult::check(
        "replace-overlap",
        ok && last.as_ref() == Some(&expected) && list.to_vec() == vec!["c", "a"],
        format!("last change {last:?}"),
    )
}

/// Failed and no-op operations leave the store and the listeners untouched
pub fn scenario_rejections_are_silent() -> ScenarioResult {
    let (list, recorder) = observed::<u8>();
    let seeded = list.extend([1, 2, 3]).is_ok();
    recorder.take();

    let index_error = matches!(list.remove(3), Err(ListError::IndexOutOfBounds { .. }));
    let nothing_matched = list.remove_where(|x| *x == 0) == Ok(0);
    let changes = recorder.take();
    ScenarioResult::check(
        "rejections-silent",
        seeded && index_error && nothing_matched && changes.is_empty() && list.len() == 3,
        format!("changes {changes:?}"),
    )
}

/// A panicking listener neither stops delivery nor undoes the mutation
pub fn scenario_listener_panic_isolated() -> ScenarioResult {
    let list = ObservableList::with_config(ListConfig::strict());
    let panicking = Arc::new(PanickingListener::always());
    let recorder = Arc::new(ChangeRecorder::new());
    list.add_listener(&panicking);
    list.add_listener(&recorder);

    let result = list.push(5u16);
    let reported = matches!(&result, Err(err) if err.is_committed());
    ScenarioResult::check(
        "listener-panic-isolated",
        reported && list.to_vec() == vec![5] && recorder.take() == vec![ListChange::Added(5)],
        format!("result {result:?}"),
    )
}

/// Snapshots taken before a mutation never change afterwards
pub fn scenario_snapshot_isolation() -> ScenarioResult {
    let list = ObservableList::from(vec![1u64, 2, 3]);
    let frozen = list.as_unmodifiable();
    let ok = list.replace_all([7, 8]).is_ok() && list.push(9).is_ok();
    ScenarioResult::check(
        "snapshot-isolation",
        ok && *frozen == [1, 2, 3] && list.to_vec() == vec![7, 8, 9],
        format!("frozen {frozen:?}"),
    )
}

/// Run every scenario
pub fn run_all_scenarios() -> Vec<ScenarioResult> {
    vec![
        scenario_walkthrough(),
        scenario_replace_overlap(),
        scenario_rejections_are_silent(),
        scenario_listener_panic_isolated(),
        scenario_snapshot_isolation(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_scenarios_pass() {
        for result in run_all_scenarios() {
            assert!(result.passed, "{}: {}", result.name, result.detail);
        }
    }

    #[derive(Clone, Debug)]
    enum Step {
        Push(i16),
        Insert(usize, i16),
        Set(usize, i16),
        Remove(usize),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            any::<i16>().prop_map(Step::Push),
            (0usize..12, any::<i16>()).prop_map(|(i, v)| Step::Insert(i, v)),
            (0usize..12, any::<i16>()).prop_map(|(i, v)| Step::Set(i, v)),
            (0usize..12).prop_map(Step::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_single_item_sequence_matches_vec(steps in proptest::collection::vec(step(), 0..64)) {
            let list = ObservableList::new();
            let mut model: Vec<i16> = Vec::new();

            for step in steps {
                match step {
                    Step::Push(v) => {
                        prop_assert!(list.push(v).is_ok());
                        model.push(v);
                    }
                    Step::Insert(i, v) => {
                        let ok = list.insert(i, v).is_ok();
                        prop_assert_eq!(ok, i <= model.len());
                        if ok {
                            model.insert(i, v);
                        }
                    }
                    Step::Set(i, v) => {
                        let result = list.set(i, v);
                        prop_assert_eq!(result.is_ok(), i < model.len());
                        if let Ok(old) = result {
                            prop_assert_eq!(old, model[i]);
                            model[i] = v;
                        }
                    }
                    Step::Remove(i) => {
                        let result = list.remove(i);
                        prop_assert_eq!(result.is_ok(), i < model.len());
                        if let Ok(removed) = result {
                            prop_assert_eq!(removed, model.remove(i));
                        }
                    }
                }
            }

            prop_assert_eq!(list.to_vec(), model);
        }

        #[test]
        fn prop_remove_where_is_exact(values in proptest::collection::vec(0u32..100, 0..48), pivot in 0u32..100) {
            let (list, recorder) = observed::<u32>();
            prop_assert!(list.extend(values.clone()).is_ok());
            recorder.take();

            let removed = list.remove_where(|v| *v >= pivot).unwrap();
            let matched: Vec<u32> = values.iter().copied().filter(|v| *v >= pivot).collect();
            let kept: Vec<u32> = values.iter().copied().filter(|v| *v < pivot).collect();

            prop_assert_eq!(removed, matched.len());
            prop_assert_eq!(list.to_vec(), kept);
            let changes = recorder.take();
            if matched.is_empty() {
                prop_assert!(changes.is_empty());
            } else {
                prop_assert_eq!(changes, vec![ListChange::removal(matched)]);
            }
        }

        #[test]
        fn prop_replace_all_reports_prior_store(before in proptest::collection::vec(any::<u8>(), 0..24), after in proptest::collection::vec(any::<u8>(), 0..24)) {
            let (list, recorder) = observed::<u8>();
            prop_assert!(list.extend(before.clone()).is_ok());
            recorder.take();

            prop_assert!(list.replace_all(after.clone()).is_ok());
            prop_assert_eq!(recorder.take(), vec![ListChange::Bulk { added: after.clone(), removed: before }]);
            prop_assert_eq!(list.to_vec(), after);
        }

        #[test]
        fn prop_duplicate_registration_doubles_delivery(values in proptest::collection::vec(any::<i8>(), 1..16)) {
            let list = ObservableList::new();
            let recorder = Arc::new(ChangeRecorder::<i8>::new());
            list.add_listener(&recorder);
            list.add_listener(&recorder);

            for v in &values {
                prop_assert!(list.push(*v).is_ok());
            }

            let expected: Vec<ListChange<i8>> = values
                .iter()
                .flat_map(|v| [ListChange::Added(*v), ListChange::Added(*v)])
                .collect();
            prop_assert_eq!(recorder.take(), expected);
        }

        #[test]
        fn prop_insert_then_get(values in proptest::collection::vec(any::<i32>(), 0..16), index in 0usize..16, value in any::<i32>()) {
            let list = ObservableList::from(values.clone());
            let index = index.min(values.len());
            prop_assert!(list.insert(index, value).is_ok());
            prop_assert_eq!(list.get(index), Ok(value));
        }
    }
}
