/// Running full text of one reply.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    text: String,
    deltas: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a delta and returns the updated full text, or `None` when the
    /// delta was empty and nothing changed.
    pub fn push(&mut self, delta: &str) -> Option<&str> {
        if delta.is_empty() {
            return None;
        }
        self.text.push_str(delta);
        self.deltas += 1;
        Some(&self.text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of non-empty deltas merged so far.
    pub fn delta_count(&self) -> u64 {
        self.deltas
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
