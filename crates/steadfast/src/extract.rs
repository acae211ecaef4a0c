//! State Extraction
//!
//! Reads attribute or text state from an element and normalizes it for
//! comparison. Values are read fresh on every call; the raw reading is kept
//! next to the normalized one and is never modified.

use crate::classify::{FailureClassifier, InteractionOptions};
use crate::locator::Locator;
use crate::reporter::Journal;
use crate::session::{ElementRef, Session, SessionError};
use crate::wait::{find_with_wait, WaitSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// =============================================================================
// ATTRIBUTE KINDS
// =============================================================================

/// Which piece of element state to read
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// `name` attribute
    Name,
    /// `value` attribute
    Value,
    /// `href` attribute
    Href,
    /// `disabled` attribute
    Disabled,
    /// `class` attribute
    Class,
    /// `selected` attribute
    Selected,
    /// `checked` attribute
    Checked,
    /// Rendered text, not a DOM attribute
    Text,
    /// Any other attribute, by name
    Other(String),
}

impl AttributeKind {
    /// DOM attribute name; `None` for [`AttributeKind::Text`]
    #[must_use]
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Self::Name => Some("name"),
            Self::Value => Some("value"),
            Self::Href => Some("href"),
            Self::Disabled => Some("disabled"),
            Self::Class => Some("class"),
            Self::Selected => Some("selected"),
            Self::Checked => Some("checked"),
            Self::Text => None,
            Self::Other(name) => Some(name),
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("Name"),
            Self::Value => f.write_str("Value"),
            Self::Href => f.write_str("Href"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Class => f.write_str("Class"),
            Self::Selected => f.write_str("Selected"),
            Self::Checked => f.write_str("Checked"),
            Self::Text => f.write_str("Text"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

#[allow(clippy::expect_used)]
fn whitespace_runs() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Text transforms applied before comparison.
///
/// Applied in the order collapse, trim, case-fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalization {
    /// Strip leading and trailing whitespace
    pub trim: bool,
    /// Replace every whitespace run with one space
    pub collapse_whitespace: bool,
    /// Lowercase (opt-in only)
    pub case_fold: bool,
}

impl Normalization {
    /// No transforms
    #[must_use]
    pub const fn none() -> Self {
        Self {
            trim: false,
            collapse_whitespace: false,
            case_fold: false,
        }
    }

    /// Trim only
    #[must_use]
    pub const fn trimmed() -> Self {
        Self {
            trim: true,
            ..Self::none()
        }
    }

    /// Collapse and trim
    #[must_use]
    pub const fn collapsed() -> Self {
        Self {
            trim: true,
            collapse_whitespace: true,
            case_fold: false,
        }
    }

    /// Set case folding
    #[must_use]
    pub const fn with_case_fold(mut self, case_fold: bool) -> Self {
        self.case_fold = case_fold;
        self
    }

    /// Apply the transforms to `input`
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        let mut text = if self.collapse_whitespace {
            whitespace_runs().replace_all(input, " ").into_owned()
        } else {
            input.to_string()
        };
        if self.trim {
            text = text.trim().to_string();
        }
        if self.case_fold {
            text = text.to_lowercase();
        }
        text
    }
}

// =============================================================================
// EXTRACTED VALUE
// =============================================================================

/// Raw and normalized readings of one piece of element state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedValue {
    raw: Option<String>,
    normalized: Option<String>,
}

impl ExtractedValue {
    /// Build from a raw reading; the normalized form is derived here only
    #[must_use]
    pub fn new(raw: Option<String>, normalization: &Normalization) -> Self {
        let normalized = raw.as_deref().map(|r| normalization.apply(r));
        Self { raw, normalized }
    }

    /// Nothing was read
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            raw: None,
            normalized: None,
        }
    }

    /// Raw value; `None` means absent, which differs from `Some("")`
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Normalized value
    #[must_use]
    pub fn normalized(&self) -> Option<&str> {
        self.normalized.as_deref()
    }

    /// Normalized value, with absence read as `""`
    #[must_use]
    pub fn normalized_or_empty(&self) -> &str {
        self.normalized().unwrap_or_default()
    }

    /// Check if a value was read
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.raw.is_some()
    }
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Read one piece of state from a resolved element
pub fn read_raw<S: Session + ?Sized>(
    session: &S,
    element: &ElementRef,
    kind: &AttributeKind,
) -> Result<Option<String>, SessionError> {
    match kind.attribute_name() {
        Some(name) => session.attribute(element, name),
        None => session.text(element).map(Some),
    }
}

/// Reads element state, reporting lookup failures instead of propagating them
pub struct StateExtractor<'a, S: Session> {
    session: &'a S,
    journal: &'a mut Journal,
    wait: WaitSpec,
}

impl<S: Session> fmt::Debug for StateExtractor<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateExtractor")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Session> StateExtractor<'a, S> {
    /// Create an extractor with the default wait
    pub fn new(session: &'a S, journal: &'a mut Journal) -> Self {
        Self {
            session,
            journal,
            wait: WaitSpec::default(),
        }
    }

    /// Set how long to wait for the element
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitSpec) -> Self {
        self.wait = wait;
        self
    }

    /// Read `kind` from the element at `locator`.
    ///
    /// A missing or unreadable element is reported as a classified failure
    /// at warning level and yields [`ExtractedValue::absent`]. The failure is
    /// never propagated, whatever `options.continue_on_failure` says.
    pub fn extract(
        &mut self,
        locator: &Locator,
        kind: &AttributeKind,
        normalization: &Normalization,
        options: &InteractionOptions,
    ) -> ExtractedValue {
        let raw = find_with_wait(self.session, locator, self.wait)
            .and_then(|element| read_raw(self.session, &element, kind));
        match raw {
            Ok(raw) => {
                tracing::debug!(%locator, %kind, present = raw.is_some(), "extracted state");
                ExtractedValue::new(raw, normalization)
            }
            Err(error) => {
                let failure = FailureClassifier::classify(&error);
                FailureClassifier::report(
                    self.journal,
                    self.session,
                    failure,
                    locator,
                    &error.to_string(),
                    &options.with_continue(true),
                );
                ExtractedValue::absent()
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
