//! Parameter placeholder naming.

/// Produces `@p0`, `@p1`, … for one command batch.
#[derive(Debug, Clone)]
pub struct ParameterNameGenerator {
    prefix: String,
    next: usize,
}

impl Default for ParameterNameGenerator {
    fn default() -> Self {
        Self::with_prefix("@p")
    }
}

impl ParameterNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the form `{prefix}{n}`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Get the next parameter name.
    pub fn generate_next(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }

    /// Number of names handed out so far.
    pub fn count(&self) -> usize {
        self.next
    }

    /// Start numbering from zero again.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
