//! Sequential budget numbers in the form `PRES-{YYYY}{MM}-{counter}`.

use chrono::Datelike;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};

pub const DEFAULT_COUNTER_SEED: u64 = 1000;
pub const BUDGET_NUMBER_PREFIX: &str = "PRES";

/// Hands out unique, strictly increasing budget numbers for the lifetime of the process.
///
/// The counter starts at the seed and every call increments it once before
/// formatting, so the first number issued is `seed + 1`. Nothing is persisted:
/// a restart begins again from the seed.
pub struct BudgetNumberGenerator {
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl BudgetNumberGenerator {
    pub fn new(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            counter: AtomicU64::new(seed),
            clock,
        }
    }

    pub fn with_system_clock(seed: u64) -> Self {
        Self::new(seed, Arc::new(SystemClock))
    }

    /// Issue the next budget number.
    pub fn next(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.clock.now();
        format!(
            "{}-{:04}{:02}-{}",
            BUDGET_NUMBER_PREFIX,
            now.year(),
            now.month(),
            sequence
        )
    }

    /// Last counter value handed out (the seed if none yet).
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for BudgetNumberGenerator {
    fn default() -> Self {
        Self::with_system_clock(DEFAULT_COUNTER_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::clock::FixedClock;
    use std::collections::HashSet;

    fn generator(seed: u64) -> BudgetNumberGenerator {
        let clock = FixedClock::parse("2026-03-05T10:00:00+00:00").unwrap();
        BudgetNumberGenerator::new(seed, Arc::new(clock))
    }

    fn sequence_of(number: &str) -> u64 {
        number.rsplit('-').next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_first_number_follows_seed() {
        let numbers = generator(DEFAULT_COUNTER_SEED);
        assert_eq!(numbers.next(), "PRES-202603-1001");
        assert_eq!(numbers.next(), "PRES-202603-1002");
        assert_eq!(numbers.current(), 1002);
    }

    #[test]
    fn test_sequential_numbers_strictly_increase() {
        let numbers = generator(0);
        let issued: Vec<u64> = (0..50).map(|_| sequence_of(&numbers.next())).collect();
        assert!(issued.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_isolated_generators_do_not_share_state() {
        let a = generator(10);
        let b = generator(10);
        assert_eq!(a.next(), b.next());
    }

    #[test]
    fn test_concurrent_threads_never_duplicate() {
        let numbers = Arc::new(generator(DEFAULT_COUNTER_SEED));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let numbers = numbers.clone();
                std::thread::spawn(move || (0..250).map(|_| numbers.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "duplicate budget number issued");
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(numbers.current(), DEFAULT_COUNTER_SEED + 2000);
    }
}
