//! Human-readable output stream for the runtime.
//!
//! Everything the runtime prints for the operator (banner, step descriptions,
//! mixin stdout/stderr, warnings) goes through a [`Console`]. The console owns
//! an explicit [`Redactor`]: every known sensitive value is replaced with the
//! mask before any byte reaches the underlying writer. The runtime refreshes
//! the redaction set before each step so values that become known mid-action
//! (sensitive step outputs) are masked from that step onwards.

use std::borrow::Cow;
use std::io::{self, Write};

/// Default replacement for sensitive values.
pub const DEFAULT_MASK: &str = "*******";

/// The set of values that must never be printed.
#[derive(Debug, Clone)]
pub struct Redactor {
    /// Sorted longest first so a value containing another is masked whole.
    values: Vec<String>,
    mask: String,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(DEFAULT_MASK)
    }
}

impl Redactor {
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            values: Vec::new(),
            mask: mask.into(),
        }
    }

    /// Replace the redaction set. Empty values are ignored.
    pub fn set_sensitive_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        values.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        values.dedup();
        self.values = values;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mask every sensitive value in `text`.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.values.iter().any(|v| text.contains(v.as_str())) {
            return Cow::Borrowed(text);
        }

        let mut redacted = text.to_string();
        for value in &self.values {
            if redacted.contains(value.as_str()) {
                redacted = redacted.replace(value.as_str(), &self.mask);
            }
        }
        Cow::Owned(redacted)
    }
}

/// Redacting writer pair for operator-facing output.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    redactor: Redactor,
}

impl Console {
    /// Console writing to the process stdout/stderr.
    pub fn stdio(mask: &str) -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()), mask)
    }

    pub fn with_writers(out: Box<dyn Write>, err: Box<dyn Write>, mask: &str) -> Self {
        Self {
            out,
            err,
            redactor: Redactor::new(mask),
        }
    }

    /// Hand over the current set of values that need masking.
    pub fn set_sensitive_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.redactor.set_sensitive_values(values);
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// Write a line to the output stream.
    pub fn println(&mut self, message: &str) {
        let line = self.redactor.redact(message);
        // Console write errors never affect the action result.
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }

    /// Write a line to the error stream.
    pub fn eprintln(&mut self, message: &str) {
        let line = self.redactor.redact(message);
        let _ = writeln!(self.err, "{}", line);
        let _ = self.err.flush();
    }

    /// Forward raw bytes captured from a mixin's stdout.
    pub fn write_out(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let text = self.redactor.redact(&text);
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    /// Forward raw bytes captured from a mixin's stderr.
    pub fn write_err(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let text = self.redactor.redact(&text);
        let _ = self.err.write_all(text.as_bytes());
        let _ = self.err.flush();
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("redacted_values", &self.redactor.len())
            .finish()
    }
}
