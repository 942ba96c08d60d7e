// src/output/sink.rs

//! Where the supervisor's terminal output goes.
//!
//! Child output normally flows straight to stdout through a [`DirectSink`].
//! While a restart is still inside its stability window the supervisor swaps
//! in a [`BufferingSink`], so a crash can be compared against the previous one
//! before anything is shown.

use std::borrow::Cow;
use std::io::{self, Write};

/// A destination for raw output bytes.
pub trait OutputSink: Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Writes straight through to a real writer (stdout in production).
pub struct DirectSink {
    out: Box<dyn Write + Send>,
}

impl DirectSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl OutputSink for DirectSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()
    }
}

/// Accumulates output in memory.
#[derive(Debug, Default)]
pub struct BufferingSink {
    buf: Vec<u8>,
}

impl BufferingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Lossy UTF-8 view of everything accumulated so far.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl OutputSink for BufferingSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

/// The supervisor's swappable reference to the active sink.
///
/// The direct sink always exists; the buffering sink is present only while
/// buffering is active and is handed back when direct output is restored.
pub struct SinkSwitch {
    direct: Box<dyn OutputSink>,
    buffer: Option<BufferingSink>,
}

impl SinkSwitch {
    pub fn new(direct: impl OutputSink + 'static) -> Self {
        Self {
            direct: Box::new(direct),
            buffer: None,
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.buffer.is_some()
    }

    /// Route subsequent writes through a fresh accumulator.
    pub fn start_buffering(&mut self) {
        self.buffer = Some(BufferingSink::new());
    }

    /// Route subsequent writes to the direct sink again and return whatever
    /// was accumulated (an empty buffer if buffering was not active).
    pub fn restore_direct(&mut self) -> BufferingSink {
        self.buffer.take().unwrap_or_default()
    }

    /// The currently active sink.
    pub fn active(&mut self) -> &mut dyn OutputSink {
        match self.buffer.as_mut() {
            Some(buffer) => buffer,
            None => self.direct.as_mut(),
        }
    }

    /// The real output, bypassing any active buffer.
    pub fn direct(&mut self) -> &mut dyn OutputSink {
        self.direct.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_go_to_the_buffer_while_buffering() {
        let out = Shared::default();
        let mut sinks = SinkSwitch::new(DirectSink::new(out.clone()));

        sinks.active().write_bytes(b"one ").unwrap();
        sinks.start_buffering();
        sinks.active().write_bytes(b"two").unwrap();
        sinks.direct().write_bytes(b"three ").unwrap();

        assert_eq!(out.0.lock().unwrap().as_slice(), b"one three ");

        let buffered = sinks.restore_direct();
        assert_eq!(buffered.text(), "two");
        assert!(!sinks.is_buffering());

        sinks.active().write_bytes(b"four").unwrap();
        assert_eq!(out.0.lock().unwrap().as_slice(), b"one three four");
    }

    #[test]
    fn restoring_without_buffering_yields_nothing() {
        let mut sinks = SinkSwitch::new(DirectSink::new(io::sink()));
        assert!(sinks.restore_direct().is_empty());
    }
}
