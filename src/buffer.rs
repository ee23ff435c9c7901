//! Pending-line queue used while buffering is enabled.

use std::collections::VecDeque;
use std::io::{self, Write};

/// Default number of lines held before the logger drains automatically.
pub const DEFAULT_BUFFER_CAPACITY: usize = 250;

/// FIFO of complete lines waiting to be written.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: VecDeque<String>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the back.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    /// Remove and return the oldest line.
    pub fn pop(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    /// Drop every pending line without writing it.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write every pending line to `sink` in order, then flush it.
    ///
    /// A line that fails to write is lost but the drain carries on with the
    /// rest; the first error is returned once the buffer is empty.
    pub fn drain_all<W: Write>(&mut self, sink: &mut W) -> io::Result<usize> {
        let mut written = 0;
        let mut first_err: Option<io::Error> = None;

        while let Some(line) = self.pop() {
            match sink.write_all(line.as_bytes()) {
                Ok(()) => written += 1,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }

        if let Err(e) = sink.flush() {
            first_err.get_or_insert(e);
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}
