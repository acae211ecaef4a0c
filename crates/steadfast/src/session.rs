//! Browser session collaborator.
//!
//! Steadfast does not drive a browser itself. It consumes a [`Session`]: any
//! WebDriver client (or the [`crate::mock::MockSession`] used in tests) that can
//! resolve locators and act on element references. Every fallible call returns a
//! [`SessionError`] tagged with a closed [`FailureTag`], which is what failure
//! classification matches on.

use crate::locator::Locator;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Script that scrolls an element to the vertical middle of the viewport
pub const SCROLL_INTO_MIDDLE_SCRIPT: &str = "var viewPortHeight = Math.max(document.documentElement.clientHeight, window.innerHeight || 0);\
var elementTop = arguments[0].getBoundingClientRect().top;\
window.scrollBy(0, elementTop-(viewPortHeight/2));";

/// Script that clicks its first argument from page JavaScript
pub const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Script that sets the `value` attribute of its first argument
pub const SET_VALUE_SCRIPT: &str = "arguments[0].setAttribute('value', arguments[1]);";

/// Script that reloads the page bypassing the cache
pub const HARD_RELOAD_SCRIPT: &str = "location.reload(true);";

/// Opaque handle to a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Session-scoped element identifier
    pub id: String,
}

impl ElementRef {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Closed set of failure tags a session reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureTag {
    /// Locator matched nothing
    NoSuchElement,
    /// Element cannot receive the interaction
    ElementNotInteractable,
    /// Element is in a state that forbids the operation (e.g. disabled)
    InvalidElementState,
    /// Element reference invalidated by a DOM mutation
    StaleElementReference,
    /// Another element would receive the click
    ElementClickIntercepted,
    /// Operation or wait deadline exceeded
    Timeout,
    /// Script execution deadline exceeded
    ScriptTimeout,
    /// Malformed locator
    InvalidSelector,
    /// Page script threw
    JavascriptError,
    /// Window was closed
    NoSuchWindow,
    /// Anything else
    Other,
}

impl FailureTag {
    /// Map a W3C WebDriver error code (e.g. `"no such element"`) to a tag
    #[must_use]
    pub fn from_w3c_code(code: &str) -> Self {
        match code {
            "no such element" => Self::NoSuchElement,
            "element not interactable" => Self::ElementNotInteractable,
            "invalid element state" => Self::InvalidElementState,
            "stale element reference" => Self::StaleElementReference,
            "element click intercepted" => Self::ElementClickIntercepted,
            "timeout" => Self::Timeout,
            "script timeout" => Self::ScriptTimeout,
            "invalid selector" => Self::InvalidSelector,
            "javascript error" => Self::JavascriptError,
            "no such window" => Self::NoSuchWindow,
            _ => Self::Other,
        }
    }

    /// W3C error code for this tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoSuchElement => "no such element",
            Self::ElementNotInteractable => "element not interactable",
            Self::InvalidElementState => "invalid element state",
            Self::StaleElementReference => "stale element reference",
            Self::ElementClickIntercepted => "element click intercepted",
            Self::Timeout => "timeout",
            Self::ScriptTimeout => "script timeout",
            Self::InvalidSelector => "invalid selector",
            Self::JavascriptError => "javascript error",
            Self::NoSuchWindow => "no such window",
            Self::Other => "unknown error",
        }
    }
}

impl fmt::Display for FailureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure returned by a [`Session`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{tag}: {message}")]
pub struct SessionError {
    /// Failure tag
    pub tag: FailureTag,
    /// Driver-supplied detail
    pub message: String,
}

impl SessionError {
    /// Create a new session error
    #[must_use]
    pub fn new(tag: FailureTag, message: impl Into<String>) -> Self {
        Self {
            tag,
            message: message.into(),
        }
    }

    /// A `no such element` error for a locator
    #[must_use]
    pub fn no_such_element(locator: &Locator) -> Self {
        Self::new(
            FailureTag::NoSuchElement,
            format!("Unable to locate element: {locator}"),
        )
    }

    /// A timeout error
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureTag::Timeout, message)
    }
}

/// Operations Steadfast needs from a live browser session.
///
/// Implementations wrap a concrete WebDriver client. The session is owned by
/// one test at a time and is never shared across threads, so methods take
/// `&self` and implementations are free to use interior mutability.
pub trait Session {
    /// Resolve the first element matching a locator
    fn find_element(&self, locator: &Locator) -> Result<ElementRef, SessionError>;

    /// Resolve all elements matching a locator (empty when none match)
    fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, SessionError>;

    /// Navigate the current window to a URL
    fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Reload the current page
    fn refresh(&self) -> Result<(), SessionError>;

    /// Current page URL
    fn current_url(&self) -> Result<String, SessionError>;

    /// Current page title
    fn title(&self) -> Result<String, SessionError>;

    /// Run a script with an optional element bound to `arguments[0]`
    /// and extra string arguments bound from `arguments[1]` on.
    fn execute_script(
        &self,
        script: &str,
        element: Option<&ElementRef>,
        args: &[&str],
    ) -> Result<serde_json::Value, SessionError>;

    /// Set the implicit element lookup timeout
    fn set_implicit_timeout(&self, timeout: Duration) -> Result<(), SessionError>;

    /// Native click
    fn click(&self, element: &ElementRef) -> Result<(), SessionError>;

    /// Type text into an element
    fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), SessionError>;

    /// Clear an editable element
    fn clear(&self, element: &ElementRef) -> Result<(), SessionError>;

    /// Read a DOM attribute; `None` when the attribute is absent
    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, SessionError>;

    /// Rendered text of an element
    fn text(&self, element: &ElementRef) -> Result<String, SessionError>;

    /// Whether the element is displayed
    fn is_displayed(&self, element: &ElementRef) -> Result<bool, SessionError>;

    /// Select the `<option>` with the given visible text in a `<select>`
    fn select_by_visible_text(&self, element: &ElementRef, text: &str)
        -> Result<(), SessionError>;

    /// Visible text of every `<option>` of a `<select>`, in DOM order
    fn option_texts(&self, element: &ElementRef) -> Result<Vec<String>, SessionError>;

    /// Move the pointer over an element
    fn hover(&self, element: &ElementRef) -> Result<(), SessionError>;

    /// Press on `source`, move to `target` and release
    fn drag_and_drop(&self, source: &ElementRef, target: &ElementRef) -> Result<(), SessionError>;

    /// Full page screenshot as base64-encoded PNG (the WebDriver wire form)
    fn screenshot_base64(&self) -> Result<String, SessionError>;

    /// Full page screenshot as decoded PNG bytes
    fn screenshot_png(&self) -> Result<Vec<u8>, SessionError> {
        let encoded = self.screenshot_base64()?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SessionError::new(FailureTag::Other, format!("invalid screenshot payload: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod failure_tag_tests {
        use super::*;

        #[test]
        fn test_w3c_codes_round_trip() {
            for tag in [
                FailureTag::NoSuchElement,
                FailureTag::ElementNotInteractable,
                FailureTag::StaleElementReference,
                FailureTag::ElementClickIntercepted,
                FailureTag::Timeout,
                FailureTag::JavascriptError,
            ] {
                assert_eq!(FailureTag::from_w3c_code(tag.as_str()), tag);
            }
        }

        #[test]
        fn test_unknown_code_is_other() {
            assert_eq!(FailureTag::from_w3c_code("unsupported operation"), FailureTag::Other);
        }
    }

    mod session_error_tests {
        use super::*;

        #[test]
        fn test_display() {
            let err = SessionError::no_such_element(&Locator::id("missing"));
            assert_eq!(
                err.to_string(),
                "no such element: Unable to locate element: By.Id: missing"
            );
        }

        #[test]
        fn test_timeout_constructor() {
            let err = SessionError::timeout("waited 3s");
            assert_eq!(err.tag, FailureTag::Timeout);
        }
    }
}
