use ewe_practical::demos::{channels, closures, pool, selects};
use ewe_practical::{run_all, Demo, Transcript};
use ewe_practical_tests::quick_config;

/// WHY: `--all` must finish on its own
/// WHAT: Every safe demonstration runs to completion with the quick settings
#[test]
#[ntest::timeout(60000)]
fn test_every_safe_demo_completes() {
    let transcript = Transcript::capture();
    run_all(Demo::safe(), &quick_config(), &transcript).unwrap();

    assert!(transcript.contains("(true): Hello channels!"));
    assert!(transcript.contains("(false): 0"));
    assert!(transcript.contains("1 2 3 4 5"));
    assert!(transcript.contains("Done receiving!"));
    assert!(transcript.contains("Timed out."));
    assert!(transcript.contains("Count is 1"));
    assert!(transcript.contains("Count: 1"));
    assert!(transcript.contains("Arithmetic complete."));
    assert_eq!(transcript.count("Creating new instance."), 2);
}

#[test]
#[ntest::timeout(10000)]
fn test_channel_demos_outcomes() {
    let config = quick_config();
    let transcript = Transcript::capture();

    assert_eq!(
        channels::range_channel(&config, &transcript).unwrap(),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(channels::unblock_all(&config, &transcript).unwrap(), 5);
    assert_eq!(
        channels::channel_ownership(&config, &transcript).unwrap(),
        vec![0, 1, 2, 3, 4]
    );
}

/// WHY: The capture hazard must stay observable
/// WHAT: Shared-slot tasks agree on the last value, by-value tasks differ
#[test]
#[ntest::timeout(10000)]
fn test_closure_capture_contrast() {
    let config = quick_config();
    let shared = closures::closure_shared_slot(&config, &Transcript::capture()).unwrap();
    assert!(shared.iter().all(|seen| seen == "good day"));

    let mut own = closures::closure_by_value(&config, &Transcript::capture()).unwrap();
    own.sort();
    own.dedup();
    assert_eq!(own.len(), 3);
}

#[test]
#[ntest::timeout(10000)]
fn test_select_demos_with_quick_config() {
    let config = quick_config();
    let fairness = selects::select_fairness(&config, &Transcript::capture()).unwrap();
    assert_eq!(fairness.first + fairness.second, config.select_iterations);
    assert!(selects::select_timeout(&config, &Transcript::capture()).unwrap());
    assert!(selects::select_work_loop(&config, &Transcript::capture()).unwrap() > 0);
}

#[test]
#[ntest::timeout(30000)]
fn test_pool_load_reuses() {
    let load = pool::pool_load(&quick_config(), &Transcript::capture()).unwrap();
    assert_eq!(load.jobs, 10_000);
    assert!(load.created < load.jobs / 10, "{load:?}");
}
