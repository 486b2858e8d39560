use ewe_practical::adversarial::{deadlock, starvation, DeadlockOutcome};
use ewe_practical::demos::once;
use ewe_practical::Transcript;
use ewe_practical_tests::quick_config;
use foundation_sync::Fault;
use serial_test::serial;
use tracing_test::traced_test;

/// WHY: Crossed lock order is the deadlock hazard
/// WHAT: The bounded join reports Hung instead of returning
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_deadlock_is_observed_as_hang() {
    let config = quick_config();
    let outcome = deadlock(&config, &Transcript::capture()).unwrap();
    match outcome {
        DeadlockOutcome::Hung { waited } => assert!(waited >= config.deadlock_budget),
        DeadlockOutcome::Completed => panic!("crossed lock order completed"),
    }
}

/// WHY: The starvation asymmetry is scheduler dependent in size, not direction
/// WHAT: Over three runs greedy always finishes more loops than polite
#[test]
#[serial]
#[traced_test]
fn test_greedy_beats_polite_repeatedly() {
    let config = quick_config();
    for _ in 0..3 {
        let report = starvation(&config, &Transcript::capture()).unwrap();
        assert!(report.greedy > report.polite, "{report:?}");
    }
    assert!(logs_contain("starvation run finished"));
}

#[test]
#[ntest::timeout(5000)]
fn test_once_reentry_reported_as_fault() {
    let fault = once::once_deadlock(&quick_config(), &Transcript::capture()).unwrap();
    assert_eq!(fault, Some(Fault::ReentrantOnce));
}
