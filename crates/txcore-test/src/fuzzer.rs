//! Operation fuzzer - model-based testing for observable lists
//!
//! Generates seeded random operation sequences (out-of-range indices
//! included) and applies each one to an `ObservableList<u32>` and to a
//! plain `Vec<u32>` model. After every step it checks:
//! - Same success/failure outcome
//! - Same contents
//! - The change the list dispatched is the one the model predicts
//! - Failed and no-op operations dispatch nothing

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use txcore_collections::{ListChange, ObservableList};

use crate::ChangeRecorder;

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of operations to generate
    pub op_count: usize,
    /// Values are drawn from `0..value_range`
    pub value_range: u32,
    /// Longest batch for bulk operations
    pub max_batch: usize,
    /// Probability that an index falls outside the list (0.0 - 1.0)
    pub bad_index_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            op_count: 1000,
            value_range: 64,
            max_batch: 6,
            bad_index_prob: 0.1,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            op_count: 200,
            value_range: 16,
            max_batch: 4,
            bad_index_prob: 0.1,
            seed: 42,
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            op_count: 20000,
            value_range: 256,
            max_batch: 12,
            bad_index_prob: 0.2,
            seed: 42,
        }
    }
}

/// One generated list operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListOp {
    Push(u32),
    Insert(usize, u32),
    Set(usize, u32),
    Remove(usize),
    Clear,
    Extend(Vec<u32>),
    InsertAll(usize, Vec<u32>),
    ReplaceAll(Vec<u32>),
    RemoveAbove(u32),
    RetainBelow(u32),
    RemoveItem(u32),
    RemoveAll(Vec<u32>),
    RetainAll(Vec<u32>),
}

impl ListOp {
    /// Apply to the list; true on success
    pub fn apply(&self, list: &ObservableList<u32>) -> bool {
        match self {
            ListOp::Push(v) => list.push(*v).is_ok(),
            ListOp::Insert(i, v) => list.insert(*i, *v).is_ok(),
            ListOp::Set(i, v) => list.set(*i, *v).is_ok(),
            ListOp::Remove(i) => list.remove(*i).is_ok(),
            ListOp::Clear => list.clear().is_ok(),
            ListOp::Extend(vs) => list.extend(vs.iter().copied()).is_ok(),
            ListOp::InsertAll(i, vs) => list.insert_all(*i, vs.iter().copied()).is_ok(),
            ListOp::ReplaceAll(vs) => list.replace_all(vs.iter().copied()).is_ok(),
            ListOp::RemoveAbove(p) => list.remove_where(|x| x > p).is_ok(),
            ListOp::RetainBelow(p) => list.retain(|x| x < p).is_ok(),
            ListOp::RemoveItem(v) => list.remove_item(v).is_ok(),
            ListOp::RemoveAll(vs) => list.remove_all(vs).is_ok(),
            ListOp::RetainAll(vs) => list.retain_all(vs).is_ok(),
        }
    }

    /// Apply to the model.
    ///
    /// Returns `Err(())` where the list must reject the operation, otherwise
    /// the change the list must dispatch (`None` for a silent no-op).
    #[allow(clippy::result_unit_err)]
    pub fn apply_model(&self, model: &mut Vec<u32>) -> Result<Option<ListChange<u32>>, ()> {
        let change = match self {
            ListOp::Push(v) => {
                model.push(*v);
                ListChange::Added(*v)
            }
            ListOp::Insert(i, v) => {
                if *i > model.len() {
                    return Err(());
                }
                model.insert(*i, *v);
                ListChange::Inserted { index: *i, item: *v }
            }
            ListOp::Set(i, v) => {
                let slot = model.get_mut(*i).ok_or(())?;
                let old = std::mem::replace(slot, *v);
                ListChange::Updated {
                    index: *i,
                    old,
                    new: *v,
                }
            }
            ListOp::Remove(i) => {
                if *i >= model.len() {
                    return Err(());
                }
                ListChange::Removed(model.remove(*i))
            }
            ListOp::Clear => {
                model.clear();
                ListChange::Cleared
            }
            ListOp::Extend(vs) => {
                model.extend_from_slice(vs);
                ListChange::addition(vs.clone())
            }
            ListOp::InsertAll(i, vs) => {
                if *i > model.len() {
                    return Err(());
                }
                for (offset, v) in vs.iter().enumerate() {
                    model.insert(*i + offset, *v);
                }
                ListChange::addition(vs.clone())
            }
            ListOp::ReplaceAll(vs) => {
                let removed = std::mem::replace(model, vs.clone());
                ListChange::Bulk {
                    added: vs.clone(),
                    removed,
                }
            }
            ListOp::RemoveAbove(p) => return Ok(model_extract(model, |x| x > p)),
            ListOp::RetainBelow(p) => return Ok(model_extract(model, |x| x >= p)),
            ListOp::RemoveItem(v) => {
                let Some(index) = model.iter().position(|x| x == v) else {
                    return Ok(None);
                };
                ListChange::Removed(model.remove(index))
            }
            ListOp::RemoveAll(vs) => return Ok(model_extract(model, |x| vs.contains(x))),
            ListOp::RetainAll(vs) => return Ok(model_extract(model, |x| !vs.contains(x))),
        };
        Ok(Some(change))
    }
}

/// Straightforward removal used as the reference for bulk diffs
fn model_extract(model: &mut Vec<u32>, matches: impl Fn(&u32) -> bool) -> Option<ListChange<u32>> {
    let removed: Vec<u32> = model.iter().copied().filter(|x| matches(x)).collect();
    if removed.is_empty() {
        return None;
    }
    model.retain(|x| !matches(x));
    Some(ListChange::removal(removed))
}

/// A step where list and model disagreed
#[derive(Clone, Debug)]
pub struct Mismatch {
    pub step: usize,
    pub op: ListOp,
    pub detail: String,
}

/// Fuzzing results
#[derive(Clone, Debug, Default)]
pub struct FuzzReport {
    pub ops_applied: usize,
    /// Operations rejected with an index error (as predicted)
    pub rejected: usize,
    /// Operations that changed nothing and dispatched nothing
    pub silent: usize,
    pub notifications: usize,
    pub mismatches: Vec<Mismatch>,
}

impl FuzzReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Model-checking fuzzer for `ObservableList<u32>`
pub struct OpFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl OpFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        OpFuzzer { config, rng }
    }

    fn value(&mut self) -> u32 {
        self.rng.gen_range(0..self.config.value_range.max(1))
    }

    fn batch(&mut self) -> Vec<u32> {
        let len = self.rng.gen_range(0..=self.config.max_batch);
        (0..len).map(|_| self.value()).collect()
    }

    /// Index for element access (`end = len`) or insertion (`end = len + 1`)
    fn index(&mut self, end: usize) -> usize {
        if end == 0 || self.rng.gen_bool(self.config.bad_index_prob) {
            end + self.rng.gen_range(0..4)
        } else {
            self.rng.gen_range(0..end)
        }
    }

    /// Generate the next operation for a list of length `len`
    pub fn generate(&mut self, len: usize) -> ListOp {
        match self.rng.gen_range(0..13) {
            0 | 1 => ListOp::Push(self.value()),
            2 => ListOp::Insert(self.index(len + 1), self.value()),
            3 => ListOp::Set(self.index(len), self.value()),
            4 => ListOp::Remove(self.index(len)),
            5 => {
                // Keep clears rare so lists grow
                if self.rng.gen_bool(0.2) {
                    ListOp::Clear
                } else {
                    ListOp::Push(self.value())
                }
            }
            6 => ListOp::Extend(self.batch()),
            7 => ListOp::InsertAll(self.index(len + 1), self.batch()),
            8 => ListOp::ReplaceAll(self.batch()),
            9 => ListOp::RemoveAbove(self.value()),
            10 => ListOp::RetainBelow(self.value()),
            11 => ListOp::RemoveItem(self.value()),
            _ => {
                if self.rng.gen_bool(0.5) {
                    ListOp::RemoveAll(self.batch())
                } else {
                    ListOp::RetainAll(self.batch())
                }
            }
        }
    }

    /// Run the configured number of operations
    pub fn run(&mut self) -> FuzzReport {
        let list = ObservableList::<u32>::new();
        let recorder = Arc::new(ChangeRecorder::<u32>::new());
        list.add_listener(&recorder);

        let mut model: Vec<u32> = Vec::new();
        let mut report = FuzzReport::default();

        for step in 0..self.config.op_count {
            let op = self.generate(model.len());
            let ok = op.apply(&list);
            let expected = op.apply_model(&mut model);
            let dispatched = recorder.take();
            report.ops_applied += 1;
            report.notifications += dispatched.len();

            let mut problems: Vec<String> = Vec::new();
            match expected {
                Err(()) => {
                    report.rejected += 1;
                    if ok {
                        problems.push("list accepted an operation the model rejects".into());
                    }
                    if !dispatched.is_empty() {
                        problems.push(format!("rejected operation dispatched {dispatched:?}"));
                    }
                }
                Ok(change) => {
                    if !ok {
                        problems.push("list rejected a valid operation".into());
                    }
                    if change.is_none() {
                        report.silent += 1;
                    }
                    let expected: Vec<ListChange<u32>> = change.into_iter().collect();
                    if dispatched != expected {
                        problems.push(format!("dispatched {dispatched:?}, expected {expected:?}"));
                    }
                }
            }
            report
                .mismatches
                .extend(problems.into_iter().map(|detail| Mismatch {
                    step,
                    op: op.clone(),
                    detail,
                }));

            let actual = list.to_vec();
            if actual != model {
                report.mismatches.push(Mismatch {
                    step,
                    op,
                    detail: format!("store {actual:?} diverged from model {model:?}"),
                });
                // Everything after this point would be noise
                break;
            }
        }

        report
    }
}

/// Run the fuzzer with a configuration
pub fn fuzz_observable_list(config: FuzzerConfig) -> FuzzReport {
    OpFuzzer::new(config).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_fuzzing() {
        let report = fuzz_observable_list(FuzzerConfig::light());
        assert!(report.is_consistent(), "{:?}", report.mismatches);
        assert_eq!(report.ops_applied, 200);
    }

    #[test]
    fn test_default_fuzzing_hits_every_outcome() {
        let report = fuzz_observable_list(FuzzerConfig::default());
        assert!(report.is_consistent(), "{:?}", report.mismatches);
        assert!(report.rejected > 0);
        assert!(report.silent > 0);
        assert!(report.notifications > 0);
    }

    #[test]
    fn test_several_seeds() {
        for seed in 1..=8 {
            let config = FuzzerConfig {
                seed,
                ..FuzzerConfig::light()
            };
            let report = fuzz_observable_list(config);
            assert!(report.is_consistent(), "seed {seed}: {:?}", report.mismatches);
        }
    }

    #[test]
    fn test_model_rejects_bad_indices() {
        let mut model = vec![1, 2];
        assert_eq!(ListOp::Set(2, 0).apply_model(&mut model), Err(()));
        assert_eq!(ListOp::Remove(5).apply_model(&mut model), Err(()));
        assert_eq!(ListOp::Insert(3, 0).apply_model(&mut model), Err(()));
        assert_eq!(
            ListOp::Insert(2, 3).apply_model(&mut model),
            Ok(Some(ListChange::Inserted { index: 2, item: 3 }))
        );
        assert_eq!(model, vec![1, 2, 3]);
    }
}
