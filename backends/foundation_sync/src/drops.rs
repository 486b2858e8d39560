/// `RunOnDrop` runs a function when it gets dropped, the toolkit's
/// equivalent of a deferred call: the owner of a channel uses it to close
/// the channel on every exit path, including unwinding.
pub struct RunOnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> RunOnDrop<F> {
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }

    /// Drops the guard without running the function.
    pub fn cancel(mut self) {
        self.0.take();
    }
}

impl<F: FnOnce()> Drop for RunOnDrop<F> {
    fn drop(&mut self) {
        if let Some(cb) = self.0.take() {
            cb();
        }
    }
}
