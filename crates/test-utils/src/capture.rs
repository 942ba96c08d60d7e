use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Cloneable in-memory writer standing in for stdout.
///
/// Hand one clone to `DirectSink::new` and keep another to inspect what the
/// supervisor printed.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    /// Return everything captured so far and start over.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.inner.lock().unwrap());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
