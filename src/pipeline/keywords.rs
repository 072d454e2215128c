//! Trigger-phrase matching.

/// Ordered, lowercased trigger phrases. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    phrases: Vec<String>,
}

impl KeywordSet {
    /// Lowercases every phrase and drops blank ones; order is kept.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if the body contains any phrase, ignoring case.
    pub fn matches(&self, body: &str) -> bool {
        if body.is_empty() {
            return false;
        }
        let body = body.to_lowercase();
        self.phrases.iter().any(|p| body.contains(p.as_str()))
    }
}
