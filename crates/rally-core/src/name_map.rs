//! Static display-name map applied when a rally is resumed.
//!
//! File format: one `old:new` pair per line, split on the first colon.
//! Blank lines and lines starting with `#` are skipped.

use std::path::Path;

/// An ordered list of textual substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMap {
    pairs: Vec<(String, String)>,
}

impl NameMap {
    pub fn parse(content: &str) -> Self {
        let pairs = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(':'))
            .map(|(old, new)| (old.trim().to_string(), new.trim().to_string()))
            .filter(|(old, _)| !old.is_empty())
            .collect();
        Self { pairs }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Apply every substitution, in file order.
    pub fn apply(&self, text: &str) -> String {
        self.pairs
            .iter()
            .fold(text.to_string(), |acc, (old, new)| acc.replace(old.as_str(), new))
    }
}
