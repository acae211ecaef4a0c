//! Verification call sites.
//!
//! Every assertion here is soft: a match writes a `Pass` entry (when step
//! logging is on), a mismatch writes a `Fail` entry with expected and actual
//! values, captures a screenshot and records a soft warning. Nothing is
//! propagated; call [`Driver::verify`] at the end of the test.

use crate::assertion::AssertionResult;
use crate::classify::FailureClassifier;
use crate::collection::compare;
use crate::driver::{is_checked, Driver};
use crate::extract::{AttributeKind, Normalization};
use crate::locator::Locator;
use crate::reporter::{ReportEntry, Severity};
use crate::session::Session;
use crate::wait::{find_with_wait, Condition, WaitSpec};

/// Outcome of one comparison, before it is reported
struct Check<'l> {
    locator: Option<&'l Locator>,
    passed: bool,
    message: String,
    details: Vec<(&'static str, String)>,
    lists: Vec<(&'static str, Vec<String>)>,
}

impl<'l> Check<'l> {
    fn new(locator: Option<&'l Locator>, passed: bool, message: String) -> Self {
        Self {
            locator,
            passed,
            message,
            details: Vec::new(),
            lists: Vec::new(),
        }
    }

    fn expected_actual(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.details.push(("Expected", expected.into()));
        self.details.push(("Actual", actual.into()));
        self
    }

    fn detail(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.details.push((label, value.into()));
        self
    }

    fn list(mut self, label: &'static str, items: &[&str]) -> Self {
        self.lists
            .push((label, items.iter().map(ToString::to_string).collect()));
        self
    }
}

fn state(flag: bool, on: &str, off: &str) -> String {
    let word = if flag { on } else { off };
    word.to_string()
}

impl<S: Session> Driver<S> {
    fn conclude(&mut self, check: Check<'_>) -> AssertionResult {
        let options = self.options();
        let severity = if check.passed {
            Severity::Pass
        } else {
            Severity::Fail
        };
        let mut entry = ReportEntry::new(severity, &check.message);
        if let Some(locator) = check.locator {
            entry = entry.with_locator(locator);
        }
        for (label, value) in check.details {
            entry = entry.with_detail(label, value);
        }
        for (label, items) in check.lists {
            entry = entry.with_list(label, items);
        }

        if check.passed {
            tracing::debug!(message = %check.message, "verification passed");
            if options.log_step {
                self.journal.log(entry);
            }
        } else {
            tracing::warn!(message = %check.message, "verification failed");
            FailureClassifier::report_mismatch(
                &mut self.journal,
                &self.session,
                entry,
                check.message.clone(),
                check.locator,
                &options,
            );
        }
        AssertionResult::check(check.passed, check.message)
    }

    fn observe(&self, locator: &Locator, condition: Condition, expected: bool) -> bool {
        let spec = if expected {
            self.config.default_wait
        } else {
            WaitSpec::once()
        };
        self.wait_for(locator, condition, spec).unwrap_or(false)
    }

    /// Assert the element's displayed state
    pub fn assert_visible(&mut self, locator: &Locator, expected: bool) -> AssertionResult {
        let visible = self.observe(locator, Condition::Visible, expected);
        let message = if visible == expected {
            format!("Element is {} as expected", state(visible, "visible", "not visible"))
        } else {
            format!("Element is {}", state(visible, "visible", "not visible"))
        };
        self.conclude(
            Check::new(Some(locator), visible == expected, message).expected_actual(
                state(expected, "visible", "not visible"),
                state(visible, "visible", "not visible"),
            ),
        )
    }

    /// Assert whether any element matches
    pub fn assert_present(&mut self, locator: &Locator, expected: bool) -> AssertionResult {
        let present = self.observe(locator, Condition::Present, expected);
        let message = if present == expected {
            format!("Element is {} as expected", state(present, "present", "not present"))
        } else {
            format!("Element is {}", state(present, "present", "not present"))
        };
        self.conclude(
            Check::new(Some(locator), present == expected, message).expected_actual(
                state(expected, "present", "not present"),
                state(present, "present", "not present"),
            ),
        )
    }

    /// Assert an attribute value. An absent attribute compares as `""`; the
    /// expected value is normalized the same way as the actual one.
    pub fn assert_attribute(
        &mut self,
        locator: &Locator,
        kind: &AttributeKind,
        expected: &str,
        normalization: &Normalization,
    ) -> AssertionResult {
        let value = self.extract(locator, kind, normalization);
        let actual = value.normalized_or_empty().to_string();
        let expected = normalization.apply(expected);
        let passed = actual == expected;
        let message = if passed {
            format!("Element attribute {kind} value is correct")
        } else {
            format!("Element attribute {kind} value is not correct")
        };
        self.conclude(Check::new(Some(locator), passed, message).expected_actual(expected, actual))
    }

    /// Assert the rendered text equals `expected` after normalization
    pub fn assert_text(
        &mut self,
        locator: &Locator,
        expected: &str,
        normalization: &Normalization,
    ) -> AssertionResult {
        let value = self.extract(locator, &AttributeKind::Text, normalization);
        let actual = value.normalized_or_empty().to_string();
        let expected = normalization.apply(expected);
        let passed = actual == expected;
        let message = if passed {
            "Text of the element is correct".to_string()
        } else {
            "Text of the element is not correct".to_string()
        };
        self.conclude(Check::new(Some(locator), passed, message).expected_actual(expected, actual))
    }

    /// Assert the collapsed rendered text contains `expected`. With
    /// `case_fold`, both sides are lowercased.
    pub fn assert_contains_text(
        &mut self,
        locator: &Locator,
        expected: &str,
        case_fold: bool,
    ) -> AssertionResult {
        let normalization = Normalization::collapsed().with_case_fold(case_fold);
        let value = self.extract(locator, &AttributeKind::Text, &normalization);
        let actual = value.normalized_or_empty().to_string();
        let expected = normalization.apply(expected);
        let passed = value.is_present() && actual.contains(&expected);
        let message = if passed {
            "Element text contains the expected value".to_string()
        } else {
            "Element text does not contain the expected value".to_string()
        };
        self.conclude(Check::new(Some(locator), passed, message).expected_actual(expected, actual))
    }

    /// Assert a checkbox or radio state
    pub fn assert_checked(&mut self, locator: &Locator, expected: bool) -> AssertionResult {
        let value = self.extract(locator, &AttributeKind::Checked, &Normalization::trimmed());
        let checked = is_checked(value.normalized());
        let message = if checked == expected {
            format!("Element is {} as expected", state(checked, "CHECKED", "NOT CHECKED"))
        } else {
            format!("Element is {}", state(checked, "CHECKED", "NOT CHECKED"))
        };
        self.conclude(
            Check::new(Some(locator), checked == expected, message).expected_actual(
                state(expected, "CHECKED", "NOT CHECKED"),
                state(checked, "CHECKED", "NOT CHECKED"),
            ),
        )
    }

    /// Assert the page title
    pub fn assert_title(&mut self, expected: &str) -> AssertionResult {
        let check = match self.session.title() {
            Ok(title) => {
                let passed = title == expected;
                let message = if passed {
                    "Title is correct"
                } else {
                    "Title is not correct"
                };
                Check::new(None, passed, message.to_string()).expected_actual(expected, title)
            }
            Err(error) => Check::new(None, false, "Page title could not be read".to_string())
                .detail("Error", error.to_string()),
        };
        self.conclude(check)
    }

    /// Assert the current URL contains `expected`, so a query string or
    /// fragment on the live URL does not fail the check
    pub fn assert_url(&mut self, expected: &str) -> AssertionResult {
        let check = match self.session.current_url() {
            Ok(url) => {
                let passed = url.contains(expected);
                let message = if passed {
                    "URL is correct"
                } else {
                    "URL is not correct"
                };
                Check::new(None, passed, message.to_string()).expected_actual(expected, url)
            }
            Err(error) => Check::new(None, false, "Current URL could not be read".to_string())
                .detail("Error", error.to_string()),
        };
        self.conclude(check)
    }

    /// Assert that the option with `option_text` under the `<select>` at
    /// `select_xpath` is selected
    pub fn assert_dropdown_selected(&mut self, select_xpath: &str, option_text: &str) -> AssertionResult {
        let option = Locator::dropdown_option(select_xpath, option_text);
        let value = self.extract(&option, &AttributeKind::Selected, &Normalization::trimmed());
        let selected = is_checked(value.normalized());
        let message = if selected {
            format!("Option '{option_text}' is selected")
        } else {
            format!("Option '{option_text}' is not selected")
        };
        self.conclude(Check::new(Some(&option), selected, message))
    }

    /// Assert the option texts of a `<select>`. Unordered comparison sorts
    /// both sides; empty options count but are not rendered.
    ///
    /// An unreadable dropdown is reported at warning level and fails the
    /// check without propagating.
    pub fn assert_dropdown_contents<I>(
        &mut self,
        locator: &Locator,
        expected: I,
        order_sensitive: bool,
    ) -> AssertionResult
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let options = self.options().with_continue(true);
        let texts = find_with_wait(&self.session, locator, self.config.default_wait)
            .and_then(|element| self.session.option_texts(&element));
        let actual = match texts {
            Ok(texts) => texts,
            Err(error) => {
                let kind = FailureClassifier::classify(&error);
                FailureClassifier::report(
                    &mut self.journal,
                    &self.session,
                    kind,
                    locator,
                    &error.to_string(),
                    &options,
                );
                return AssertionResult::fail(kind.describe(locator));
            }
        };

        let diff = compare(expected, actual, order_sensitive);
        let check = if diff.equal() {
            Check::new(Some(locator), true, "Dropdown contents are as expected".to_string())
                .list("Expected", &diff.rendered_expected())
        } else {
            Check::new(Some(locator), false, "Dropdown contents are not as expected".to_string())
                .list("Expected", &diff.rendered_expected())
                .list("Actual", &diff.rendered_actual())
                .detail("Missing", diff.missing().join(", "))
                .detail("Unexpected", diff.unexpected().join(", "))
        };
        self.conclude(check)
    }
}
