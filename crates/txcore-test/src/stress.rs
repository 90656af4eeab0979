//! Concurrency stress runs
//!
//! Several threads hammer one `ObservableList` while counting listeners
//! tally what was dispatched. At the end the store and the tallies must
//! account for every operation that reported success.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use txcore_collections::{ListConfig, Listener, ObservableList};

/// Stress run configuration
#[derive(Clone, Debug)]
pub struct StressConfig {
    /// Mutating threads
    pub threads: usize,
    /// Operations per thread
    pub ops_per_thread: usize,
    /// Counting listeners attached to the list
    pub listeners: usize,
    /// Random seed (each thread derives its own)
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        StressConfig {
            threads: 8,
            ops_per_thread: 500,
            listeners: 2,
            seed: 42,
        }
    }
}

impl StressConfig {
    /// Quick run for unit tests
    pub fn light() -> Self {
        StressConfig {
            threads: 4,
            ops_per_thread: 100,
            listeners: 1,
            seed: 42,
        }
    }

    /// Long run with heavy fan-out
    pub fn heavy() -> Self {
        StressConfig {
            threads: 16,
            ops_per_thread: 5000,
            listeners: 8,
            seed: 42,
        }
    }

    pub fn total_ops(&self) -> usize {
        self.threads * self.ops_per_thread
    }
}

/// Listener that counts elements it saw added and removed
#[derive(Debug, Default)]
pub struct CountingListener {
    pub added: AtomicUsize,
    pub removed: AtomicUsize,
    pub bulk_updates: AtomicUsize,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }

    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn bulk_updates(&self) -> usize {
        self.bulk_updates.load(Ordering::SeqCst)
    }
}

impl<T> Listener<T> for CountingListener {
    fn on_item_added(&self, _item: &T) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn on_item_inserted(&self, _index: usize, _item: &T) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn on_item_removed(&self, _item: &T) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_bulk_update(&self, added: &[T], removed: &[T]) {
        self.bulk_updates.fetch_add(1, Ordering::SeqCst);
        self.added.fetch_add(added.len(), Ordering::SeqCst);
        self.removed.fetch_add(removed.len(), Ordering::SeqCst);
    }
}

/// Stress run results
#[derive(Clone, Debug, Default)]
pub struct StressReport {
    pub elapsed: Duration,
    /// Elements the threads successfully added
    pub added: usize,
    /// Elements the threads successfully removed
    pub removed: usize,
    /// Mutations that committed as one bulk update
    pub bulk_updates: usize,
    pub final_len: usize,
    /// Per-listener (added, removed) tallies
    pub listener_tallies: Vec<(usize, usize)>,
    pub violations: Vec<String>,
}

impl StressReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn ops_per_sec(&self, total_ops: usize) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

fn attach_counters(list: &ObservableList<u64>, count: usize) -> Vec<Arc<CountingListener>> {
    (0..count)
        .map(|_| {
            let counter = Arc::new(CountingListener::new());
            list.add_listener(&counter);
            counter
        })
        .collect()
}

fn check_tallies(report: &mut StressReport, counters: &[Arc<CountingListener>]) {
    for (i, counter) in counters.iter().enumerate() {
        let tally = (counter.added(), counter.removed());
        if tally != (report.added, report.removed) {
            report.violations.push(format!(
                "listener {i} saw {tally:?}, threads performed ({}, {})",
                report.added, report.removed
            ));
        }
        if counter.bulk_updates() != report.bulk_updates {
            report.violations.push(format!(
                "listener {i} saw {} bulk updates, threads performed {}",
                counter.bulk_updates(),
                report.bulk_updates
            ));
        }
        report.listener_tallies.push(tally);
    }
}

/// Every thread appends distinct values; nothing else mutates.
///
/// The final store must hold exactly those values, in any order.
pub fn run_append_stress(config: &StressConfig) -> StressReport {
    let list = ObservableList::with_config(
        ListConfig::strict()
            .with_label("append-stress")
            .with_capacity(config.total_ops()),
    );
    let counters = attach_counters(&list, config.listeners);
    let mut report = StressReport::default();

    let start = Instant::now();
    let failures = AtomicUsize::new(0);
    thread::scope(|scope| {
        for t in 0..config.threads {
            let list = &list;
            let failures = &failures;
            let per_thread = config.ops_per_thread;
            scope.spawn(move || {
                for i in 0..per_thread {
                    let value = (t * per_thread + i) as u64;
                    if list.push(value).is_err() {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });
    report.elapsed = start.elapsed();

    let failures = failures.load(Ordering::SeqCst);
    if failures > 0 {
        report.violations.push(format!("{failures} pushes failed"));
    }

    let values = list.to_vec();
    report.added = config.total_ops();
    report.final_len = values.len();
    if values.len() != config.total_ops() {
        report.violations.push(format!(
            "expected {} elements, found {}",
            config.total_ops(),
            values.len()
        ));
    }
    let distinct: HashSet<u64> = values.iter().copied().collect();
    let expected: HashSet<u64> = (0..config.total_ops() as u64).collect();
    if distinct != expected {
        report
            .violations
            .push("store does not hold exactly the appended values".to_string());
    }

    check_tallies(&mut report, &counters);
    report
}

/// Threads mix appends, index removals, predicate removals, and reads.
///
/// Every successful removal must be matched by a dispatched removal, and the
/// final length must equal appends minus removals.
pub fn run_mixed_stress(config: &StressConfig) -> StressReport {
    let list: ObservableList<u64> =
        ObservableList::with_config(ListConfig::strict().with_label("mixed-stress"));
    let counters = attach_counters(&list, config.listeners);
    let mut report = StressReport::default();

    let added = AtomicUsize::new(0);
    let removed = AtomicUsize::new(0);
    let bulk_updates = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);

    let start = Instant::now();
    thread::scope(|scope| {
        for t in 0..config.threads {
            let list = &list;
            let added = &added;
            let removed = &removed;
            let bulk_updates = &bulk_updates;
            let errors = &errors;
            let per_thread = config.ops_per_thread;
            let seed = config.seed.wrapping_add(t as u64);
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for i in 0..per_thread {
                    let value = (t * per_thread + i) as u64;
                    match rng.gen_range(0..10) {
                        0..=4 => {
                            if list.push(value).is_ok() {
                                added.fetch_add(1, Ordering::SeqCst);
                            } else {
                                errors.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        5 | 6 => {
                            // Racing threads may empty the list first;
                            // an index error is then the expected outcome
                            if list.remove(0).is_ok() {
                                removed.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        7 => {
                            let modulus: u64 = rng.gen_range(7..13);
                            match list.remove_where(|v| *v % modulus == 0) {
                                Ok(0) => {}
                                Ok(n) => {
                                    removed.fetch_add(n, Ordering::SeqCst);
                                    bulk_updates.fetch_add(1, Ordering::SeqCst);
                                }
                                Err(_) => {
                                    errors.fetch_add(1, Ordering::SeqCst);
                                }
                            }
                        }
                        _ => {
                            let len = list.len();
                            if len > 0 {
                                // May race with a removal; only a panic would be a bug
                                let _ = list.get(rng.gen_range(0..len));
                            }
                            let _ = list.as_unmodifiable();
                        }
                    }
                }
            });
        }
    });
    report.elapsed = start.elapsed();

    report.added = added.load(Ordering::SeqCst);
    report.removed = removed.load(Ordering::SeqCst);
    report.bulk_updates = bulk_updates.load(Ordering::SeqCst);
    report.final_len = list.len();

    let errors = errors.load(Ordering::SeqCst);
    if errors > 0 {
        report.violations.push(format!("{errors} operations failed"));
    }
    if report.final_len + report.removed != report.added {
        report.violations.push(format!(
            "lost update: added {}, removed {}, final len {}",
            report.added, report.removed, report.final_len
        ));
    }

    check_tallies(&mut report, &counters);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_stress_light() {
        let config = StressConfig::light();
        let report = run_append_stress(&config);
        assert!(report.passed(), "{:?}", report.violations);
        assert_eq!(report.final_len, config.total_ops());
        assert_eq!(report.listener_tallies, vec![(config.total_ops(), 0)]);
    }

    #[test]
    fn test_append_stress_default() {
        let report = run_append_stress(&StressConfig::default());
        assert!(report.passed(), "{:?}", report.violations);
        assert_eq!(report.listener_tallies.len(), 2);
    }

    #[test]
    fn test_mixed_stress() {
        let report = run_mixed_stress(&StressConfig::default());
        assert!(report.passed(), "{:?}", report.violations);
        assert!(report.added > 0);
        assert!(report.bulk_updates > 0);
    }

    #[test]
    fn test_ops_per_sec() {
        let report = StressReport {
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(report.ops_per_sec(100), 50.0);
        assert_eq!(StressReport::default().ops_per_sec(100), 0.0);
    }
}
