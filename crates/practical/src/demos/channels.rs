//! Channel basics: hand-off, reading a closed channel, ranging until close,
//! releasing many tasks with one close, buffering, and the owner-closes
//! factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use foundation_sync::{produce, spawn, Channel, RunOnDrop, WaitGroup};

use crate::error::{join_task, PracticalResult};
use crate::{PracticalConfig, Transcript};

/// One task sends a greeting on an unbuffered channel; the caller prints it
/// with the receive flag.
pub fn hello_channel(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<(String, bool)> {
    let strings = Channel::<String>::unbuffered();
    let sender = strings.sender();
    let greeter = spawn("greeter", move || {
        sender.send(String::from("Hello channels!"));
    })?;

    let (salutation, ok) = strings.receive_ok();
    transcript.line(format!("({ok}): {salutation}"));
    join_task(greeter)?;
    Ok((salutation, ok))
}

/// Receiving from a closed, empty channel yields the zero value and `false`.
pub fn closed_channel(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<(i32, bool)> {
    let integers = Channel::<i32>::unbuffered();
    integers.close();

    let (integer, ok) = integers.receive_ok();
    transcript.line(format!("({ok}): {integer}"));
    Ok((integer, ok))
}

/// A producer sends 1 through 5 and closes; the consumer ranges to the end.
pub fn range_channel(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<i32>> {
    let integers = Channel::unbuffered();
    let values = integers.receiver();

    let producer = spawn("range-producer", move || {
        let _close = RunOnDrop::new(|| integers.close());
        for i in 1..=5 {
            integers.send(i);
        }
    })?;

    let received: Vec<i32> = values.iter().collect();
    let line: Vec<String> = received.iter().map(ToString::to_string).collect();
    transcript.line(line.join(" "));
    join_task(producer)?;
    Ok(received)
}

/// Five tasks park on a `begin` channel; closing it releases all of them at
/// once. Returns how many tasks began.
pub fn unblock_all(_config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<usize> {
    const TASKS: usize = 5;

    let begin = Channel::<()>::unbuffered();
    let wg = Arc::new(WaitGroup::new());
    let begun = Arc::new(AtomicUsize::new(0));

    // Closing on every exit path keeps already started tasks from parking forever.
    let release = RunOnDrop::new(|| begin.close());

    wg.add(TASKS);
    for i in 0..TASKS {
        let gate = begin.receiver();
        let wg = Arc::clone(&wg);
        let begun = Arc::clone(&begun);
        let transcript = transcript.clone();
        spawn(format!("begin-{i}"), move || {
            let _done = wg.defer_done();
            // `begin` never carries a value; this returns once it is closed.
            let _ = gate.receive();
            begun.fetch_add(1, Ordering::SeqCst);
            transcript.line(format!("{i} has begun"));
        })?;
    }

    transcript.line("Unblocking tasks...");
    drop(release);
    wg.wait();
    Ok(begun.load(Ordering::SeqCst))
}

/// A capacity-4 channel lets the producer run ahead of the consumer.
pub fn buffered_channel(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<i32>> {
    let integers = Channel::new(4);
    let values = integers.receiver();
    let log = transcript.clone();

    let producer = spawn("buffered-producer", move || {
        let _close = RunOnDrop::new(|| integers.close());
        let _done = RunOnDrop::new(|| log.line("Producer Done."));
        for i in 0..5 {
            log.line(format!("Sending: {i}"));
            integers.send(i);
        }
    })?;

    let mut received = Vec::new();
    for value in &values {
        transcript.line(format!("Received {value}."));
        received.push(value);
    }
    join_task(producer)?;
    Ok(received)
}

/// The factory owns and closes the channel; the caller only ever holds the
/// read side.
pub fn channel_ownership(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<i32>> {
    let results = produce(5, |sender| {
        for i in 0..5 {
            sender.send(i);
        }
    })?;

    let mut received = Vec::new();
    for value in &results {
        transcript.line(format!("Received: {value}"));
        received.push(value);
    }
    transcript.line("Done receiving!");
    Ok(received)
}
