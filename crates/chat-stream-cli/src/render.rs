use std::io::{self, Write};

/// Prints a growing reply by writing only the part not yet shown.
///
/// Updates carry the whole text so far. Write errors are kept and reported by
/// [`SuffixPrinter::finish`], since the update callback cannot return them.
pub struct SuffixPrinter<W: Write> {
    out: W,
    shown: usize,
    error: Option<io::Error>,
}

impl<W: Write> SuffixPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: 0,
            error: None,
        }
    }

    pub fn update(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        let suffix = text.get(self.shown..).unwrap_or_default();
        if suffix.is_empty() {
            return;
        }
        match self
            .out
            .write_all(suffix.as_bytes())
            .and_then(|()| self.out.flush())
        {
            Ok(()) => self.shown = text.len(),
            Err(err) => self.error = Some(err),
        }
    }

    /// Writes whatever of `text` is still unseen plus a trailing newline.
    pub fn finish(mut self, text: &str) -> io::Result<W> {
        self.update(text);
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(self.out)
    }
}
