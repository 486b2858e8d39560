use std::time::{Duration, Instant};

use foundation_sync::{produce, Channel, Receiver, Selector};

enum Merged {
    Left(Option<i32>),
    Right(Option<i32>),
}

/// WHY: Dropping a finished channel out of a select is the usual merge loop
/// WHAT: Two producers are merged completely by nulling each arm on close
#[test]
#[ntest::timeout(10000)]
fn test_merge_until_both_closed() {
    let evens = produce(0, |sender| {
        for i in (0..100).step_by(2) {
            sender.send(i);
        }
    })
    .unwrap();
    let odds = produce(0, |sender| {
        for i in (1..100).step_by(2) {
            sender.send(i);
        }
    })
    .unwrap();

    let mut left: Option<&Receiver<i32>> = Some(&evens);
    let mut right: Option<&Receiver<i32>> = Some(&odds);
    let mut merged = Vec::new();

    while left.is_some() || right.is_some() {
        let event = Selector::new()
            .recv_maybe(left, Merged::Left)
            .recv_maybe(right, Merged::Right)
            .wait();
        match event {
            Merged::Left(Some(value)) | Merged::Right(Some(value)) => merged.push(value),
            Merged::Left(None) => left = None,
            Merged::Right(None) => right = None,
        }
    }

    merged.sort_unstable();
    assert_eq!(merged, (0..100).collect::<Vec<_>>());
}

/// WHY: Timeout is a first-class outcome, not an error
/// WHAT: A value arriving after the timeout stays in the channel
#[test]
#[ntest::timeout(5000)]
fn test_timeout_leaves_late_value_for_next_receive() {
    let channel = Channel::<u8>::new(1);
    let start = Instant::now();

    let timed_out = Selector::new()
        .recv(channel.as_receiver(), |_| false)
        .timeout(Duration::from_millis(25), || true)
        .wait();
    assert!(timed_out);
    assert!(start.elapsed() >= Duration::from_millis(25));

    channel.send(4);
    assert_eq!(channel.receive(), Some(4));
}

/// WHY: Fairness holds for channels carrying values, not only closed ones
/// WHAT: Two always-full buffered channels are both picked often
#[test]
fn test_fairness_between_full_channels() {
    let first = Channel::new(1);
    let second = Channel::new(1);
    let mut counts = [0usize; 2];

    for _ in 0..1000 {
        let _ = first.try_send(0usize);
        let _ = second.try_send(1usize);
        let picked = Selector::new()
            .recv(first.as_receiver(), |v| v)
            .recv(second.as_receiver(), |v| v)
            .wait();
        if let Some(index) = picked {
            counts[index] += 1;
        }
    }

    assert!(counts[0] > 350 && counts[1] > 350, "{counts:?}");
}
