//! Page Object Model Support
//!
//! Page objects own the locators for one page and name the element whose
//! visibility means "ready". [`crate::driver::Driver::open_page`] navigates,
//! waits for that element, then checks the URL against the page's pattern.

use crate::locator::Locator;
use crate::result::{SteadfastError, SteadfastResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default page load timeout in seconds
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;

/// A page or component in the UI.
///
/// # Example
///
/// ```ignore
/// struct ContactPage;
///
/// impl ContactPage {
///     fn email() -> Locator {
///         Locator::xpath("//input[@name='email']")
///     }
/// }
///
/// impl PageObject for ContactPage {
///     fn url_pattern(&self) -> &str {
///         "/contact"
///     }
///
///     fn ready_locator(&self) -> Locator {
///         Self::email()
///     }
/// }
/// ```
pub trait PageObject {
    /// URL path pattern for this page (e.g. `/contact`, `/users/:id`)
    fn url_pattern(&self) -> &str;

    /// Element that is visible once the page is ready
    fn ready_locator(&self) -> Locator;

    /// Seconds to wait for the ready element
    fn load_timeout_secs(&self) -> u64 {
        DEFAULT_LOAD_TIMEOUT_SECS
    }

    /// Page name for logs and reports
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Named locators for one page, typically loaded from YAML:
///
/// ```yaml
/// name: Contact
/// url_pattern: /contact
/// ready: email
/// locators:
///   email: { strategy: x_path, value: "//input[@name='email']" }
///   submit: { strategy: css, value: "button[type=submit]" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMap {
    name: String,
    url_pattern: String,
    ready: String,
    #[serde(default = "default_load_timeout")]
    load_timeout_secs: u64,
    locators: BTreeMap<String, Locator>,
}

const fn default_load_timeout() -> u64 {
    DEFAULT_LOAD_TIMEOUT_SECS
}

impl PageMap {
    /// Create a map whose ready element is `ready`
    #[must_use]
    pub fn new(name: impl Into<String>, url_pattern: impl Into<String>, ready: (&str, Locator)) -> Self {
        let mut locators = BTreeMap::new();
        locators.insert(ready.0.to_string(), ready.1);
        Self {
            name: name.into(),
            url_pattern: url_pattern.into(),
            ready: ready.0.to_string(),
            load_timeout_secs: DEFAULT_LOAD_TIMEOUT_SECS,
            locators,
        }
    }

    /// Parse from YAML and check the ready element is defined
    pub fn from_yaml_str(yaml: &str) -> SteadfastResult<Self> {
        let map: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| SteadfastError::config(format!("Failed to parse page map: {e}")))?;
        if !map.locators.contains_key(&map.ready) {
            return Err(SteadfastError::config(format!(
                "page map {:?} names ready locator {:?} but does not define it",
                map.name, map.ready
            )));
        }
        Ok(map)
    }

    /// Add a named locator
    #[must_use]
    pub fn with_locator(mut self, name: impl Into<String>, locator: Locator) -> Self {
        self.locators.insert(name.into(), locator);
        self
    }

    /// Look up a locator by name
    pub fn locator(&self, name: &str) -> SteadfastResult<&Locator> {
        self.locators.get(name).ok_or_else(|| {
            SteadfastError::config(format!("page {:?} has no locator named {name:?}", self.name))
        })
    }

    /// All locator names, sorted
    #[must_use]
    pub fn locator_names(&self) -> Vec<&str> {
        self.locators.keys().map(String::as_str).collect()
    }
}

impl PageObject for PageMap {
    fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    fn ready_locator(&self) -> Locator {
        self.locators
            .get(&self.ready)
            .cloned()
            .unwrap_or_else(|| Locator::id(self.ready.clone()))
    }

    fn load_timeout_secs(&self) -> u64 {
        self.load_timeout_secs
    }

    fn page_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// URL MATCHING
// =============================================================================

/// URL path matcher for page patterns
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

/// Path portion of a URL: no scheme, host, query or fragment
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = if url.contains("://") {
        rest.find('/').map_or("", |i| &rest[i..])
    } else {
        rest
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl UrlMatcher {
    /// Create a matcher.
    ///
    /// Patterns support literal segments (`/login`), wildcards (`/users/*`)
    /// and named parameters (`/users/:id`).
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = segments(pattern)
            .into_iter()
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a full URL or path matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let url_segments = segments(url_path(url));
        url_segments.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(&url_segments)
                .all(|(segment, actual)| match segment {
                    UrlSegment::Literal(lit) => lit == actual,
                    UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
                })
    }

    /// Extract named parameters from a matching URL
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        self.segments
            .iter()
            .zip(segments(url_path(url)))
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), value.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
