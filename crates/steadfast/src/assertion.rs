//! Assertion results and soft warning collection.

pub mod soft;

pub use soft::{SoftAssertionError, SoftWarning, SoftWarnings};

/// Result of a verification call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Pass or fail depending on `condition`
    #[must_use]
    pub fn check(condition: bool, message: impl Into<String>) -> Self {
        if condition {
            Self::pass(message)
        } else {
            Self::fail(message)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_and_fail() {
        assert!(AssertionResult::pass("ok").passed);
        let failed = AssertionResult::fail("Title is not correct");
        assert!(!failed.passed);
        assert_eq!(failed.message, "Title is not correct");
    }

    #[test]
    fn test_check() {
        assert!(AssertionResult::check(true, "x").passed);
        assert!(!AssertionResult::check(false, "x").passed);
    }
}
