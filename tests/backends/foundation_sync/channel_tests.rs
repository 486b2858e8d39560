use foundation_sync::{produce, spawn, Channel, Fault, TryReceiveError};
use ewe_practical_tests::fault_raised_by;

/// WHY: Closing must keep every buffered value and nothing more
/// WHAT: For several buffer sizes exactly k receives succeed, then None forever
#[test]
fn test_close_drains_exactly_buffered_values() {
    for k in [0usize, 1, 5, 16] {
        let channel = Channel::new(16);
        for i in 0..k {
            channel.send(i);
        }
        channel.close();

        let drained: Vec<usize> = channel.iter().collect();
        assert_eq!(drained, (0..k).collect::<Vec<_>>());
        assert_eq!(channel.receive_ok(), (0, false));
        assert_eq!(channel.try_receive(), Err(TryReceiveError::Closed));
    }
}

/// WHY: One producer and one consumer see values in send order
/// WHAT: 1000 values arrive in order over rendezvous and buffered channels
#[test]
#[ntest::timeout(10000)]
fn test_order_preserved_per_pair() {
    for capacity in [0, 3] {
        let values = produce(capacity, |sender| {
            for i in 0..1000u32 {
                sender.send(i);
            }
        })
        .unwrap();

        let received: Vec<u32> = values.into_iter().collect();
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }
}

/// WHY: Owner-closes composes into pipelines of producer stages
/// WHAT: generate -> square -> sum gives the sum of squares
#[test]
#[ntest::timeout(10000)]
fn test_pipeline_of_owned_channels() {
    let numbers = produce(0, |sender| {
        for i in 1..=10u64 {
            sender.send(i);
        }
    })
    .unwrap();

    let squares = produce(0, move |sender| {
        for n in &numbers {
            sender.send(n * n);
        }
    })
    .unwrap();

    let total: u64 = squares.iter().sum();
    assert_eq!(total, 385);
}

#[test]
fn test_send_after_close_is_a_fault() {
    let channel = Channel::<u8>::new(2);
    let sender = channel.sender();
    channel.close();

    assert_eq!(fault_raised_by(|| sender.send(1)), Some(Fault::SendOnClosedChannel));
    assert_eq!(fault_raised_by(|| channel.close()), Some(Fault::CloseOfClosedChannel));
}

/// WHY: A value handed over a channel is owned by exactly one receiver
/// WHAT: Heap values moved through 8 consumers are all received once
#[test]
#[ntest::timeout(10000)]
fn test_values_received_exactly_once() {
    let channel = Channel::new(0);
    let consumers: Vec<_> = (0..8)
        .map(|i| {
            let receiver = channel.receiver();
            spawn(format!("consumer-{i}"), move || receiver.iter().collect::<Vec<String>>())
                .unwrap()
        })
        .collect();

    for i in 0..2000 {
        channel.send(format!("value-{i}"));
    }
    channel.close();

    let mut all: Vec<String> = consumers
        .into_iter()
        .flat_map(|consumer| consumer.join().unwrap())
        .collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 2000);
}
