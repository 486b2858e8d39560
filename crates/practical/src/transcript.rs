//! Line sink shared by a demonstration and the tasks it starts.

use std::sync::Arc;

use foundation_sync::Mutex;

struct Inner {
    echo: bool,
    lines: Mutex<Vec<String>>,
}

/// `Transcript` collects the human-readable lines a demonstration prints.
///
/// Cloning is cheap and every clone writes into the same transcript, so a
/// demonstration hands clones to its tasks. [`Transcript::stdout`] also
/// echoes each line to standard output as it is written.
#[derive(Clone)]
pub struct Transcript {
    inner: Arc<Inner>,
}

impl Transcript {
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_echo(true)
    }

    #[must_use]
    pub fn capture() -> Self {
        Self::with_echo(false)
    }

    fn with_echo(echo: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                echo,
                lines: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        let mut lines = self.inner.lines.lock();
        // Printed under the lock so stdout order matches the recorded order.
        if self.inner.echo {
            println!("{line}");
        }
        lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.inner.lines.lock().clone()
    }

    /// How many lines equal `expected`.
    #[must_use]
    pub fn count(&self, expected: &str) -> usize {
        self.inner
            .lines
            .lock()
            .iter()
            .filter(|line| line.as_str() == expected)
            .count()
    }

    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        self.count(expected) > 0
    }
}

impl core::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transcript")
            .field("echo", &self.inner.echo)
            .field("lines", &self.inner.lines.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_lines() {
        let transcript = Transcript::capture();
        let other = transcript.clone();
        transcript.line("one");
        other.line(String::from("two"));
        assert_eq!(transcript.lines(), vec!["one", "two"]);
        assert!(other.contains("one"));
        assert_eq!(other.count("three"), 0);
    }
}
