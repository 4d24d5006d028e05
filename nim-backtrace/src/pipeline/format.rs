//! Backtrace text rendering
//!
//! Each record becomes one `"{filename}({line}) {function}\n"` line. Lines are
//! emitted in reverse capture order, so the outermost call comes first and the
//! innermost last, as the host runtime prints its own stack traces.

use std::fmt::{self, Write as _};

use crate::domain::DebugRecord;

/// Growable buffer for rendering one line at a time
///
/// Starts from a capacity guess and doubles whenever a line does not fit.
/// Correctness never depends on the guess.
#[derive(Debug)]
pub struct LineBuffer {
    buf: String,
    capacity: usize,
}

impl LineBuffer {
    /// Create a buffer with an initial capacity guess (at least 1 byte)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: String::with_capacity(capacity), capacity }
    }

    /// Current logical capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Format `args` into the buffer if it fits the current capacity.
    ///
    /// # Errors
    /// Returns the required byte length when the output does not fit; the
    /// buffer contents are unspecified until a call succeeds.
    pub fn format_into(&mut self, args: fmt::Arguments<'_>) -> Result<usize, usize> {
        self.buf.clear();
        let mut writer = BoundedWriter { buf: &mut self.buf, limit: self.capacity, required: 0 };
        // BoundedWriter never fails, the only error source is a Display impl
        let _ = writer.write_fmt(args);
        let required = writer.required;
        if required <= self.capacity {
            Ok(required)
        } else {
            Err(required)
        }
    }

    /// Double the capacity until `required` bytes fit
    fn grow_to(&mut self, required: usize) {
        while self.capacity < required {
            self.capacity = self.capacity.saturating_mul(2);
        }
        self.buf.reserve(self.capacity);
    }

    /// Render one record as a newline-terminated line
    pub fn render(&mut self, record: &DebugRecord) -> &str {
        loop {
            match self.format_into(format_args!("{record}\n")) {
                Ok(_) => return &self.buf,
                Err(required) => self.grow_to(required),
            }
        }
    }
}

/// Writes while the output fits, counts the full length regardless
struct BoundedWriter<'a> {
    buf: &'a mut String,
    limit: usize,
    required: usize,
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let fits = self.required + s.len() <= self.limit;
        let overflowed = self.required > self.buf.len();
        self.required += s.len();
        if fits && !overflowed {
            self.buf.push_str(s);
        }
        Ok(())
    }
}

/// Scratch storage reused across backtraces on one thread
#[derive(Debug)]
pub struct Renderer {
    line: LineBuffer,
    /// Rendered lines, back to back, in capture order
    lines: String,
    /// Byte length of each rendered line
    lengths: Vec<usize>,
}

impl Renderer {
    #[must_use]
    pub fn new(initial_line_size: usize) -> Self {
        Self {
            line: LineBuffer::with_capacity(initial_line_size),
            lines: String::new(),
            lengths: Vec::new(),
        }
    }

    /// Render `records` (capture order) into one string, outermost first.
    ///
    /// The returned string is allocated at its exact final length.
    pub fn render(&mut self, records: &[DebugRecord]) -> String {
        self.lines.clear();
        self.lengths.clear();

        for record in records {
            let line = self.line.render(record);
            self.lines.push_str(line);
            self.lengths.push(line.len());
        }

        let total: usize = self.lengths.iter().sum();
        let mut output = String::with_capacity(total);
        let mut end = self.lines.len();
        for &len in self.lengths.iter().rev() {
            output.push_str(&self.lines[end - len..end]);
            end -= len;
        }
        debug_assert_eq!(output.len(), total);

        self.lines.clear();
        self.lengths.clear();
        output
    }
}
