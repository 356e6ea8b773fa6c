use regex::Regex;
use regex::RegexBuilder;

use crate::error::Result;
use crate::error::WalkerError;

/// Compiles `pattern` the way every pattern in the walker is matched:
/// unanchored and case-insensitive.
pub fn compile_case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| WalkerError::invalid_pattern(pattern, err))
}

/// Decides which traversed paths are collected.
///
/// A path is accepted iff it matches at least one include pattern and none
/// of the exclude patterns. With no include patterns nothing is accepted.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathMatcher {
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = include
            .into_iter()
            .map(|pattern| compile_case_insensitive(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let exclude = exclude
            .into_iter()
            .map(|pattern| compile_case_insensitive(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.include.iter().any(|re| re.is_match(path)) && !self.is_excluded(path)
    }

    /// Excluded paths are neither collected nor, for directories, descended
    /// into.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(path))
    }
}
