//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable strategy + value pair. It is created by page
//! objects and consumed by every other component; its `Display` form
//! (`By.XPath: //input[@name='email']`) is the key used in logs and reports.
//!
//! # Design Philosophy
//!
//! - **Immutable**: no setters; derived locators are new values
//! - **Value Equality**: two locators are equal iff strategy and value match
//! - **Serializable**: locators can live in YAML page maps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to find an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// XPath expression
    XPath,
    /// CSS selector (e.g., "button.primary")
    Css,
    /// `id` attribute
    Id,
    /// `name` attribute
    Name,
    /// Single class name
    ClassName,
    /// Tag name
    TagName,
    /// Exact link text
    LinkText,
    /// Partial link text
    PartialLinkText,
}

impl Strategy {
    /// Name used in the `By.<Name>` display form
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::XPath => "XPath",
            Self::Css => "CssSelector",
            Self::Id => "Id",
            Self::Name => "Name",
            Self::ClassName => "ClassName",
            Self::TagName => "TagName",
            Self::LinkText => "LinkText",
            Self::PartialLinkText => "PartialLinkText",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A strategy + value pair identifying one element in a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    value: String,
}

impl Locator {
    /// Create a locator from a strategy and value
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Create a CSS selector locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// Create an `id` locator
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Create a `name` locator
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    /// Create a class name locator
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Create a tag name locator
    #[must_use]
    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, value)
    }

    /// Create a link text locator
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    /// Create a partial link text locator
    #[must_use]
    pub fn partial_link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::PartialLinkText, value)
    }

    /// Locator for the `<option>` with the given visible text under a `<select>` XPath.
    #[must_use]
    pub fn dropdown_option(select_xpath: &str, option_text: &str) -> Self {
        Self::xpath(format!(
            "{select_xpath}/child::option[text()={}]",
            xpath_literal(option_text)
        ))
    }

    /// Locator for the `<option>` with the given visible text under `<select id=...>`.
    #[must_use]
    pub fn dropdown_option_by_id(select_id: &str, option_text: &str) -> Self {
        Self::dropdown_option(
            &format!("//select[@id={}]", xpath_literal(select_id)),
            option_text,
        )
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the raw value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Translate into a W3C WebDriver `(using, value)` pair.
    ///
    /// W3C only knows css, xpath, link text, partial link text and tag name;
    /// `Id`, `Name` and `ClassName` are rewritten as CSS selectors.
    #[must_use]
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self.strategy {
            Strategy::XPath => ("xpath", self.value.clone()),
            Strategy::Css => ("css selector", self.value.clone()),
            Strategy::Id => ("css selector", format!("[id={:?}]", self.value)),
            Strategy::Name => ("css selector", format!("[name={:?}]", self.value)),
            Strategy::ClassName => ("css selector", format!(".{}", self.value)),
            Strategy::TagName => ("tag name", self.value.clone()),
            Strategy::LinkText => ("link text", self.value.clone()),
            Strategy::PartialLinkText => ("partial link text", self.value.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.strategy, self.value)
    }
}

/// Quote a string as an XPath 1.0 literal, falling back to `concat()` when
/// it contains both quote kinds.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
