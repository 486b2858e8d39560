use std::io;

use super::{Channel, Receiver, Sender};
use crate::drops::RunOnDrop;
use crate::tasks;

/// Creates a channel, hands its write side to `producer` on a new task and
/// returns only the read side.
///
/// The producing task owns the channel and closes it when `producer`
/// returns or unwinds, so consumers can always range over the receiver to
/// completion.
///
/// # Errors
///
/// Returns the spawn error if the producing task could not be started.
pub fn produce<T, F>(capacity: usize, producer: F) -> io::Result<Receiver<T>>
where
    T: Send + 'static,
    F: FnOnce(&Sender<T>) + Send + 'static,
{
    let channel = Channel::new(capacity);
    let receiver = channel.receiver();

    tasks::spawn("producer", move || {
        let _close = RunOnDrop::new(|| channel.close());
        producer(channel.as_sender());
    })?;

    Ok(receiver)
}
