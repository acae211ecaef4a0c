//! Failure classification and the report-then-propagate policy.
//!
//! ```text
//! SessionError ──classify──► InteractionFailureKind
//!                                   │
//!                     report (screenshot, entry, soft warning)
//!                                   │
//!                 propagate ─┬─ continue_on_failure ─► Ok(Failed { .. })
//!                            └─ otherwise ───────────► Err(InteractionError)
//! ```
//!
//! Reporting always happens; only propagation is caller-controlled.

use crate::locator::Locator;
use crate::reporter::{Journal, ReportEntry, Severity};
use crate::session::{FailureTag, Session, SessionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// FAILURE KINDS
// =============================================================================

/// Closed taxonomy of interaction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionFailureKind {
    /// Locator matched nothing
    NotFound,
    /// Element present but cannot receive the action
    NotInteractable,
    /// Element reference invalidated since lookup
    Stale,
    /// Another element occludes the target
    ClickIntercepted,
    /// Wait deadline exceeded
    Timeout,
    /// Anything else
    Unknown,
}

impl InteractionFailureKind {
    /// All kinds, in declaration order
    pub const ALL: [Self; 6] = [
        Self::NotFound,
        Self::NotInteractable,
        Self::Stale,
        Self::ClickIntercepted,
        Self::Timeout,
        Self::Unknown,
    ];

    /// Human-readable template; `{locator}` is substituted by [`Self::describe`]
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            Self::NotFound => "Element \"{locator}\" not found.",
            Self::NotInteractable => "Element \"{locator}\" is not interactable.",
            Self::Stale => "Element \"{locator}\" is stale.",
            Self::ClickIntercepted => "Element \"{locator}\" click was intercepted.",
            Self::Timeout => "Wait for element \"{locator}\" timed out.",
            Self::Unknown => "Interaction with element \"{locator}\" failed.",
        }
    }

    /// Render the template for a locator
    #[must_use]
    pub fn describe(&self, locator: &Locator) -> String {
        self.template().replace("{locator}", &locator.to_string())
    }

    /// Severity when the caller keeps going
    #[must_use]
    pub const fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Severity under the given options: escalates to `Fail` when the
    /// failure will abort the caller
    #[must_use]
    pub const fn severity(&self, options: &InteractionOptions) -> Severity {
        if options.continue_on_failure {
            self.default_severity()
        } else {
            Severity::Fail
        }
    }
}

impl fmt::Display for InteractionFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NotFound",
            Self::NotInteractable => "NotInteractable",
            Self::Stale => "Stale",
            Self::ClickIntercepted => "ClickIntercepted",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

// =============================================================================
// OPTIONS AND OUTCOMES
// =============================================================================

/// Per-call reporting and propagation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionOptions {
    /// Write an `Info` entry for each successful step
    pub log_step: bool,
    /// Capture a screenshot when a failure is reported
    pub capture_screenshot: bool,
    /// Swallow classified failures and return `Failed` instead of an error
    pub continue_on_failure: bool,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl InteractionOptions {
    /// Log steps, capture screenshots, abort on failure
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            log_step: true,
            capture_screenshot: true,
            continue_on_failure: false,
        }
    }

    /// Log steps, capture screenshots, continue past failures
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            continue_on_failure: true,
            ..Self::strict()
        }
    }

    /// No step entries and no screenshots; failures still reported and abort
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            log_step: false,
            capture_screenshot: false,
            continue_on_failure: false,
        }
    }

    /// Set step logging
    #[must_use]
    pub const fn with_log_step(mut self, log_step: bool) -> Self {
        self.log_step = log_step;
        self
    }

    /// Set screenshot capture
    #[must_use]
    pub const fn with_screenshot(mut self, capture_screenshot: bool) -> Self {
        self.capture_screenshot = capture_screenshot;
        self
    }

    /// Set continue-on-failure
    #[must_use]
    pub const fn with_continue(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }
}

/// Result of one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The action completed; read actions carry the value read
    Success {
        /// Value read, if the action was a read
        value: Option<String>,
    },
    /// The action failed and the failure was swallowed
    Failed {
        /// Classified failure kind
        kind: InteractionFailureKind,
        /// Detail from the session error
        detail: String,
    },
}

impl InteractionOutcome {
    /// Successful outcome without a value
    #[must_use]
    pub const fn success() -> Self {
        Self::Success { value: None }
    }

    /// Check if the outcome is a success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Failure kind, if failed
    #[must_use]
    pub const fn failure_kind(&self) -> Option<InteractionFailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Value read by a successful read action
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Success { value } => value.as_deref(),
            Self::Failed { .. } => None,
        }
    }
}

/// A classified failure that aborts the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure on {locator}: {source}")]
pub struct InteractionError {
    /// Classified kind
    pub kind: InteractionFailureKind,
    /// Target locator
    pub locator: Locator,
    /// Original session error
    #[source]
    pub source: SessionError,
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Maps session failures to kinds and applies the failure policy
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    /// Classify a session error. Total over [`FailureTag`].
    #[must_use]
    pub const fn classify(error: &SessionError) -> InteractionFailureKind {
        match error.tag {
            FailureTag::NoSuchElement => InteractionFailureKind::NotFound,
            FailureTag::ElementNotInteractable | FailureTag::InvalidElementState => {
                InteractionFailureKind::NotInteractable
            }
            FailureTag::StaleElementReference => InteractionFailureKind::Stale,
            FailureTag::ElementClickIntercepted => InteractionFailureKind::ClickIntercepted,
            FailureTag::Timeout | FailureTag::ScriptTimeout => InteractionFailureKind::Timeout,
            FailureTag::InvalidSelector
            | FailureTag::JavascriptError
            | FailureTag::NoSuchWindow
            | FailureTag::Other => InteractionFailureKind::Unknown,
        }
    }

    /// Report a classified failure.
    ///
    /// The screenshot (unless suppressed) is captured before the entry that
    /// references it is written; a soft warning is recorded last.
    pub fn report<S: Session>(
        journal: &mut Journal,
        session: &S,
        kind: InteractionFailureKind,
        locator: &Locator,
        detail: &str,
        options: &InteractionOptions,
    ) {
        let message = kind.describe(locator);
        tracing::warn!(%locator, %kind, detail, "interaction failed");

        let entry = ReportEntry::new(kind.severity(options), &message)
            .with_locator(locator)
            .with_detail("Error", detail);
        Self::report_mismatch(journal, session, entry, message, Some(locator), options);
    }

    /// Report a verification mismatch through the same path as failures.
    /// Page-level checks (title, URL) pass no locator.
    pub fn report_mismatch<S: Session>(
        journal: &mut Journal,
        session: &S,
        entry: ReportEntry,
        warning: impl Into<String>,
        locator: Option<&Locator>,
        options: &InteractionOptions,
    ) {
        let entry = if options.capture_screenshot {
            match journal.capture(session) {
                Some(path) => entry.with_artifact(path),
                None => entry,
            }
        } else {
            entry
        };
        journal.log(entry);
        journal.warn(warning, locator);
    }

    /// Decide whether a reported failure aborts the caller
    pub fn propagate(
        kind: InteractionFailureKind,
        locator: &Locator,
        error: SessionError,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        if options.continue_on_failure {
            tracing::debug!(%locator, %kind, "continuing past failure");
            Ok(InteractionOutcome::Failed {
                kind,
                detail: error.to_string(),
            })
        } else {
            Err(InteractionError {
                kind,
                locator: locator.clone(),
                source: error,
            })
        }
    }

    /// Classify, report and propagate in one step
    pub fn handle<S: Session>(
        journal: &mut Journal,
        session: &S,
        locator: &Locator,
        error: SessionError,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        let kind = Self::classify(&error);
        Self::report(journal, session, kind, locator, &error.to_string(), options);
        Self::propagate(kind, locator, error, options)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockSession;
    use crate::reporter::MemoryReport;

    mod classify_tests {
        use super::*;

        fn kind_of(tag: FailureTag) -> InteractionFailureKind {
            FailureClassifier::classify(&SessionError::new(tag, "x"))
        }

        #[test]
        fn test_known_tags() {
            assert_eq!(kind_of(FailureTag::NoSuchElement), InteractionFailureKind::NotFound);
            assert_eq!(
                kind_of(FailureTag::ElementNotInteractable),
                InteractionFailureKind::NotInteractable
            );
            assert_eq!(
                kind_of(FailureTag::InvalidElementState),
                InteractionFailureKind::NotInteractable
            );
            assert_eq!(kind_of(FailureTag::StaleElementReference), InteractionFailureKind::Stale);
            assert_eq!(
                kind_of(FailureTag::ElementClickIntercepted),
                InteractionFailureKind::ClickIntercepted
            );
            assert_eq!(kind_of(FailureTag::Timeout), InteractionFailureKind::Timeout);
            assert_eq!(kind_of(FailureTag::ScriptTimeout), InteractionFailureKind::Timeout);
        }

        #[test]
        fn test_unrecognized_defaults_to_unknown() {
            for tag in [
                FailureTag::InvalidSelector,
                FailureTag::JavascriptError,
                FailureTag::NoSuchWindow,
                FailureTag::Other,
            ] {
                assert_eq!(kind_of(tag), InteractionFailureKind::Unknown);
            }
        }
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn test_describe_substitutes_locator() {
            let text = InteractionFailureKind::ClickIntercepted.describe(&Locator::id("go"));
            assert_eq!(text, "Element \"By.Id: go\" click was intercepted.");
        }

        #[test]
        fn test_every_template_names_the_locator() {
            for kind in InteractionFailureKind::ALL {
                assert!(kind.template().contains("{locator}"), "{kind}");
            }
        }

        #[test]
        fn test_severity_escalates_when_aborting() {
            for kind in InteractionFailureKind::ALL {
                assert_eq!(kind.default_severity(), Severity::Warning);
                assert_eq!(kind.severity(&InteractionOptions::lenient()), Severity::Warning);
                assert_eq!(kind.severity(&InteractionOptions::strict()), Severity::Fail);
            }
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_presets() {
            let strict = InteractionOptions::strict();
            assert!(strict.log_step && strict.capture_screenshot && !strict.continue_on_failure);
            assert!(InteractionOptions::lenient().continue_on_failure);
            let quiet = InteractionOptions::quiet();
            assert!(!quiet.log_step && !quiet.capture_screenshot);
            assert_eq!(InteractionOptions::default(), strict);
        }

        #[test]
        fn test_builders() {
            let opts = InteractionOptions::strict()
                .with_continue(true)
                .with_screenshot(false)
                .with_log_step(false);
            assert!(opts.continue_on_failure);
            assert!(!opts.capture_screenshot);
            assert!(!opts.log_step);
        }
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_propagate_aborts_by_default() {
            let locator = Locator::id("x");
            let error = SessionError::new(FailureTag::StaleElementReference, "gone");
            let result = FailureClassifier::propagate(
                InteractionFailureKind::Stale,
                &locator,
                error.clone(),
                &InteractionOptions::strict(),
            );
            let err = result.unwrap_err();
            assert_eq!(err.kind, InteractionFailureKind::Stale);
            assert_eq!(err.source, error);
        }

        #[test]
        fn test_propagate_swallows_when_continuing() {
            let locator = Locator::id("x");
            let error = SessionError::new(FailureTag::StaleElementReference, "gone");
            let outcome = FailureClassifier::propagate(
                InteractionFailureKind::Stale,
                &locator,
                error,
                &InteractionOptions::lenient(),
            )
            .unwrap();
            assert_eq!(outcome.failure_kind(), Some(InteractionFailureKind::Stale));
            assert!(!outcome.is_success());
        }

        #[test]
        fn test_handle_reports_before_propagating() {
            let report = MemoryReport::new();
            let mut journal = Journal::new(report.clone());
            let session = MockSession::new();
            let locator = Locator::id("x");

            let result = FailureClassifier::handle(
                &mut journal,
                &session,
                &locator,
                SessionError::no_such_element(&locator),
                &InteractionOptions::strict(),
            );

            assert!(result.is_err());
            let entries = report.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].severity, Severity::Fail);
            assert_eq!(entries[0].message, "Element \"By.Id: x\" not found.");
            assert_eq!(journal.warnings().count(), 1);
        }

        #[test]
        fn test_lenient_failure_is_warning_entry() {
            let report = MemoryReport::new();
            let mut journal = Journal::new(report.clone());
            let session = MockSession::new();
            let locator = Locator::id("x");

            let outcome = FailureClassifier::handle(
                &mut journal,
                &session,
                &locator,
                SessionError::new(FailureTag::ElementNotInteractable, "hidden"),
                &InteractionOptions::lenient(),
            )
            .unwrap();

            assert_eq!(outcome.failure_kind(), Some(InteractionFailureKind::NotInteractable));
            assert_eq!(report.entries()[0].severity, Severity::Warning);
        }
    }
}
