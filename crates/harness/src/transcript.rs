//! Diagnostic output shared by every worker thread.
//!
//! Lines are serialized by the transcript's own mutex, never the queue's, so
//! workers do not hold the queue lock while doing IO.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

enum Sink {
    Silent,
    Writer(Mutex<Box<dyn Write + Send>>),
    Memory(Mutex<Vec<String>>),
}

/// `Transcript` serializes whole lines coming from many threads onto one
/// output. Cloning shares the same sink.
#[derive(Clone)]
pub struct Transcript {
    sink: Arc<Sink>,
}

// the transcript only ever holds text, a panicked writer leaves nothing to repair
fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Transcript {
    #[must_use]
    pub fn stdout() -> Self {
        Self::from_writer(std::io::stdout())
    }

    #[must_use]
    pub fn silent() -> Self {
        Self {
            sink: Arc::new(Sink::Silent),
        }
    }

    /// Keeps every line in memory; read them back with [`Transcript::lines`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sink: Arc::new(Sink::Memory(Mutex::new(Vec::new()))),
        }
    }

    #[must_use]
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Arc::new(Sink::Writer(Mutex::new(Box::new(writer)))),
        }
    }

    /// Writes `message` as one uninterrupted line and mirrors it as a
    /// `tracing` debug event.
    pub fn line<S: AsRef<str>>(&self, message: S) {
        let message = message.as_ref();
        mtqueue_logs::debug!("{}", message);

        match self.sink.as_ref() {
            Sink::Silent => {}
            Sink::Memory(lines) => relock(lines).push(message.to_owned()),
            Sink::Writer(writer) => {
                let mut writer = relock(writer);
                if let Err(err) = writeln!(writer, "{message}").and_then(|()| writer.flush()) {
                    mtqueue_logs::warn!("failed to write transcript line: {}", err);
                }
            }
        }
    }

    /// Lines recorded so far by an in-memory transcript; empty otherwise.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self.sink.as_ref() {
            Sink::Memory(lines) => relock(lines).clone(),
            _ => Vec::new(),
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::silent()
    }
}

impl core::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.sink.as_ref() {
            Sink::Silent => "silent",
            Sink::Writer(_) => "writer",
            Sink::Memory(_) => "memory",
        };
        f.debug_struct("Transcript").field("sink", &kind).finish()
    }
}
