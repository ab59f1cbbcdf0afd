use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use presupuesto_server::budget::clock::{Clock, FixedClock};
use presupuesto_server::budget::numbering::BudgetNumberGenerator;

fn generator(seed: u64) -> Arc<BudgetNumberGenerator> {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::parse("2026-01-31T23:59:59+00:00").unwrap());
    Arc::new(BudgetNumberGenerator::new(seed, clock))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_unique_numbers() {
    let numbers = generator(1000);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let numbers = numbers.clone();
            tokio::spawn(async move { (0..20).map(|_| numbers.next()).collect::<Vec<_>>() })
        })
        .collect();

    let mut seen = HashSet::new();
    for task in tasks {
        for number in task.await.unwrap() {
            assert!(seen.insert(number.clone()), "duplicate {number}");
        }
    }

    assert_eq!(seen.len(), 1000);
    assert_eq!(numbers.current(), 2000);
    assert!(seen.contains("PRES-202601-1001"));
    assert!(seen.contains("PRES-202601-2000"));
}

#[test]
fn test_number_format() {
    let pattern = Regex::new(r"^PRES-\d{6}-\d+$").unwrap();
    let numbers = generator(0);

    for _ in 0..5 {
        let number = numbers.next();
        assert!(pattern.is_match(&number), "{number}");
    }
}

#[test]
fn test_seed_is_configurable() {
    let numbers = generator(41);
    assert_eq!(numbers.next(), "PRES-202601-42");
}
