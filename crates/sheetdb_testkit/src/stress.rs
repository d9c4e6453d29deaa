//! Stress tests for sheetdb.
//!
//! These helpers drive many operations through one database handle,
//! sequentially or from several threads, and report throughput.

use crate::fixtures::Person;
use sheetdb_core::{CoreResult, Database};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Number of rows seeded before read and mixed tests.
    pub seed_rows: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            seed_rows: 100,
        }
    }
}

fn tally(result: CoreResult<()>, successful: &mut usize, failed: &mut usize) {
    match result {
        Ok(()) => *successful += 1,
        Err(_) => *failed += 1,
    }
}

fn seed(db: &Database, rows: usize) -> CoreResult<()> {
    let people = db.table::<Person>()?;
    people.create_table()?;
    let mut batch: Vec<Person> = (0..rows).map(|i| Person::new(format!("seed_{i}"))).collect();
    people.add_range(&mut batch)?;
    Ok(())
}

/// Adds one person per operation.
pub fn stress_sequential_adds(db: &Database, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    let people = match db.table::<Person>() {
        Ok(people) => people,
        Err(_) => return StressTestResult::new(0, config.operations, start.elapsed()),
    };
    let _ = people.create_table();

    for i in 0..config.operations {
        let result = people.add(Person::new(format!("p{i}"))).map(|_| ());
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Cycles through add, get, update and delete against a seeded table.
pub fn stress_mixed_operations(db: &Database, config: &StressConfig) -> StressTestResult {
    if seed(db, config.seed_rows).is_err() {
        return StressTestResult::new(0, config.operations, Duration::ZERO);
    }
    let people = match db.table::<Person>() {
        Ok(people) => people,
        Err(_) => return StressTestResult::new(0, config.operations, Duration::ZERO),
    };

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;
    let rows = config.seed_rows.max(1) as i64;

    for i in 0..config.operations {
        let id = (i as i64 % rows) + 1;
        let result = match i % 4 {
            0 => people.add(Person::new(format!("m{i}"))).map(|_| ()),
            1 => people.get(id).map(|_| ()),
            2 => {
                let mut p = Person::new(format!("u{i}"));
                p.id = id;
                people.update(&p).map(|_| ())
            }
            _ => people.delete_by_key(id).map(|_| ()),
        };
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Adds people from several threads through one shared handle.
pub fn stress_concurrent_adds(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    let people = match db.table::<Person>() {
        Ok(people) => people,
        Err(_) => return StressTestResult::new(0, config.operations, Duration::ZERO),
    };
    let _ = people.create_table();

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let people = Arc::clone(&people);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    match people.add(Person::new(format!("t{t}_{i}"))) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Reads the seeded table from several threads.
pub fn stress_concurrent_reads(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    if seed(&db, config.seed_rows).is_err() {
        return StressTestResult::new(0, config.operations, Duration::ZERO);
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);
    let rows = config.seed_rows.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let id = ((t * ops_per_thread + i) % rows) as i64 + 1;
                    let found = db
                        .table::<Person>()
                        .and_then(|people| people.get(id));
                    match found {
                        Ok(Some(_)) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestDatabase;
    use std::collections::HashSet;

    fn small() -> StressConfig {
        StressConfig {
            operations: 40,
            threads: 4,
            seed_rows: 10,
        }
    }

    #[test]
    fn sequential_adds_all_succeed() {
        let test_db = TestDatabase::memory();
        let result = stress_sequential_adds(&test_db, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(test_db.table::<Person>().unwrap().count().unwrap(), 40);
    }

    #[test]
    fn mixed_operations_all_succeed() {
        let test_db = TestDatabase::memory();
        let result = stress_mixed_operations(&test_db, &small());
        assert_eq!(result.total_ops, 40);
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn concurrent_adds_allocate_unique_ids() {
        let test_db = TestDatabase::memory();
        let db = Arc::new(test_db.db);
        let result = stress_concurrent_adds(Arc::clone(&db), &small());
        assert_eq!(result.failed_ops, 0);

        let ids: HashSet<i64> = db
            .table::<Person>()
            .unwrap()
            .query()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids.len(), 40);
        assert_eq!(ids.iter().max(), Some(&40));
    }

    #[test]
    fn concurrent_reads_find_seeded_rows() {
        let test_db = TestDatabase::memory();
        let result = stress_concurrent_reads(Arc::new(test_db.db), &small());
        assert_eq!(result.successful_ops, 40);
    }
}
