//! Timing with the real monotonic clock.

use crate::filter::CategoryFilter;
use crate::platform::{StepClock, sleep_ms};
use crate::registry::{Registry, TestEntry};
use crate::runner::tests::helpers::init_tracing;
use crate::runner::{Runner, RunnerConfig};

#[test]
fn sleeping_test_reports_at_least_its_sleep() {
    init_tracing();

    let registry = Registry::new(vec![TestEntry::new("sleepy", "slow", || {
        sleep_ms(50);
        0
    })]);
    let report = Runner::new(RunnerConfig { ansi: false })
        .run_to(&registry, &CategoryFilter::default(), &mut Vec::new())
        .unwrap();

    assert!(report.outcomes[0].elapsed_ms >= 50);
    assert!(report.elapsed_ms >= report.outcomes[0].elapsed_ms);
}

#[test]
fn total_covers_every_test() {
    init_tracing();

    let registry = Registry::new(vec![
        TestEntry::new("a", "", || {
            sleep_ms(20);
            0
        }),
        TestEntry::new("b", "", || {
            sleep_ms(20);
            0
        }),
    ]);
    let report = Runner::new(RunnerConfig { ansi: false })
        .run_to(&registry, &CategoryFilter::default(), &mut Vec::new())
        .unwrap();

    let sum: u64 = report.outcomes.iter().map(|o| o.elapsed_ms).sum();
    assert!(report.elapsed_ms >= sum);
    assert!(report.elapsed_ms >= 40);
}

#[test]
fn step_clock_gives_exact_durations() {
    init_tracing();

    let registry = Registry::new(vec![TestEntry::new("a", "", || 0)]);
    let runner = Runner::with_clock(RunnerConfig { ansi: false }, StepClock::new(1_000, 250));
    let report = runner
        .run_to(&registry, &CategoryFilter::default(), &mut Vec::new())
        .unwrap();

    assert_eq!(report.outcomes[0].elapsed_ms, 250);
    assert_eq!(report.elapsed_ms, 750);
}
