//! Soft Warnings
//!
//! Failures that did not abort the test are recorded here as they are
//! reported. [`SoftWarnings::verify`] turns them into one error at test end,
//! so a run can surface every mismatch instead of only the first.

use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single recorded warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftWarning {
    /// Message describing the failure
    pub message: String,
    /// Target locator, in display form
    pub locator: Option<String>,
    /// Index of this warning in the sequence
    pub index: usize,
}

impl SoftWarning {
    /// Create a new warning
    #[must_use]
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            locator: None,
            index,
        }
    }

    /// Set the locator the warning refers to
    #[must_use]
    pub fn with_locator(mut self, locator: &Locator) -> Self {
        self.locator = Some(locator.to_string());
        self
    }
}

/// Ordered collector of soft warnings
#[derive(Debug, Clone, Default)]
pub struct SoftWarnings {
    warnings: Vec<SoftWarning>,
}

impl SoftWarnings {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn record(&mut self, message: impl Into<String>, locator: Option<&Locator>) {
        let warning = SoftWarning::new(message, self.warnings.len());
        let warning = match locator {
            Some(locator) => warning.with_locator(locator),
            None => warning,
        };
        self.warnings.push(warning);
    }

    /// All warnings in recording order
    #[must_use]
    pub fn warnings(&self) -> &[SoftWarning] {
        &self.warnings
    }

    /// Number of warnings
    #[must_use]
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Check if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Fail if any warning was recorded
    ///
    /// # Errors
    ///
    /// Returns an error listing every warning message
    pub fn verify(&self) -> Result<(), SoftAssertionError> {
        if self.warnings.is_empty() {
            Ok(())
        } else {
            Err(SoftAssertionError::new(&self.warnings))
        }
    }

    /// Drop all recorded warnings
    pub fn clear(&mut self) {
        self.warnings.clear();
    }
}

/// Error type for collected soft warnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftAssertionError {
    /// All warning messages
    pub failures: Vec<String>,
    /// Number of warnings
    pub count: usize,
}

impl SoftAssertionError {
    /// Create a new error from warnings
    #[must_use]
    pub fn new(warnings: &[SoftWarning]) -> Self {
        Self {
            failures: warnings.iter().map(|w| w.message.clone()).collect(),
            count: warnings.len(),
        }
    }
}

impl fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} soft failure(s) recorded:", self.count)?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {failure}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftAssertionError {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let warnings = SoftWarnings::new();
        assert!(warnings.is_empty());
        assert!(warnings.verify().is_ok());
    }

    #[test]
    fn test_record_keeps_order_and_index() {
        let mut warnings = SoftWarnings::new();
        warnings.record("first", None);
        warnings.record("second", Some(&Locator::id("x")));
        let all = warnings.warnings();
        assert_eq!(all[0].index, 0);
        assert_eq!(all[1].index, 1);
        assert_eq!(all[1].locator.as_deref(), Some("By.Id: x"));
    }

    #[test]
    fn test_verify_lists_every_warning() {
        let mut warnings = SoftWarnings::new();
        warnings.record("Title is not correct", None);
        warnings.record("Element \"By.Id: x\" not found.", None);
        let err = warnings.verify().unwrap_err();
        assert_eq!(err.count, 2);
        let text = err.to_string();
        assert!(text.starts_with("2 soft failure(s) recorded:"));
        assert!(text.contains("  1. Title is not correct"));
        assert!(text.contains("  2. Element"));
    }

    #[test]
    fn test_clear() {
        let mut warnings = SoftWarnings::new();
        warnings.record("x", None);
        warnings.clear();
        assert!(warnings.verify().is_ok());
    }
}
