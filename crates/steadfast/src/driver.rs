//! Driver - Test-Facing Facade
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Driver<S: Session>                                                   │
//! │                                                                       │
//! │  owns: Session · Journal (sink, capture, warnings) · Config · Plan    │
//! │                                                                       │
//! │  click / send_keys / select / read ──► ActionExecutor::perform        │
//! │  drag_and_drop / set_value_by_script ► session + classify             │
//! │  wait_for_element / is_visible     ──► wait()                         │
//! │  extract                           ──► StateExtractor::extract        │
//! │  assert_*                          ──► extract / compare + report     │
//! │  finish / verify                   ──► Test ended entry, SoftWarnings │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One driver serves one test and owns its session exclusively.

use crate::action::{Action, ActionExecutor, ClickPlan};
use crate::capture::ArtifactCapture;
use crate::classify::{FailureClassifier, InteractionError, InteractionOptions, InteractionOutcome};
use crate::config::SteadfastConfig;
use crate::extract::{AttributeKind, ExtractedValue, Normalization, StateExtractor};
use crate::locator::Locator;
use crate::page_object::{PageObject, UrlMatcher};
use crate::reporter::{Journal, ReportEntry, ReportSink, Severity};
use crate::result::SteadfastResult;
use crate::session::{Session, SessionError, HARD_RELOAD_SCRIPT, SET_VALUE_SCRIPT};
use crate::wait::{find_with_wait, wait, Condition, WaitSpec};
use std::fmt;

/// Test-facing entry point over a [`Session`]
pub struct Driver<S: Session> {
    pub(crate) session: S,
    pub(crate) journal: Journal,
    pub(crate) config: SteadfastConfig,
    plan: ClickPlan,
}

impl<S: Session> fmt::Debug for Driver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("journal", &self.journal)
            .field("config", &self.config)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl<S: Session> Driver<S> {
    /// Create a driver with default configuration and no screenshots
    pub fn new(session: S, sink: impl ReportSink + 'static) -> Self {
        Self {
            session,
            journal: Journal::new(sink),
            config: SteadfastConfig::default(),
            plan: ClickPlan::default(),
        }
    }

    /// Create a driver from configuration, capturing screenshots under the
    /// configured report directory
    pub fn from_config(session: S, sink: impl ReportSink + 'static, config: SteadfastConfig) -> Self {
        let capture = config.screenshot_capture();
        Self::new(session, sink).with_config(config).with_capture(capture)
    }

    /// Attach an artifact capture
    #[must_use]
    pub fn with_capture(self, capture: impl ArtifactCapture + 'static) -> Self {
        let Self {
            session,
            journal,
            config,
            plan,
        } = self;
        Self {
            session,
            journal: journal.with_capture(capture),
            config,
            plan,
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: SteadfastConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the click plan
    #[must_use]
    pub fn with_click_plan(mut self, plan: ClickPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Underlying session
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Journal (sink, capture, soft warnings)
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Active configuration
    pub const fn config(&self) -> &SteadfastConfig {
        &self.config
    }

    /// Default interaction options from the configuration
    pub const fn options(&self) -> InteractionOptions {
        self.config.options
    }

    /// Push the configured implicit timeout to the session
    pub fn apply_timeouts(&self) -> SteadfastResult<()> {
        if let Some(timeout) = self.config.implicit_timeout() {
            self.session.set_implicit_timeout(timeout)?;
            tracing::debug!(timeout_secs = timeout.as_secs(), "implicit timeout set");
        }
        Ok(())
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Perform an action with explicit options
    pub fn perform(
        &mut self,
        locator: &Locator,
        action: &Action,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        ActionExecutor::new(&self.session, &mut self.journal)
            .with_plan(self.plan.clone())
            .with_wait(self.config.default_wait)
            .perform(locator, action, options)
    }

    /// Click with the default options
    pub fn click(&mut self, locator: &Locator) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::Click, &options)
    }

    /// Clear the field, then type `text` in one call
    pub fn send_keys(
        &mut self,
        locator: &Locator,
        text: &str,
    ) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::type_text(text), &options)
    }

    /// Clear the field, then type one character at a time
    pub fn type_slowly(
        &mut self,
        locator: &Locator,
        text: &str,
    ) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        let action = Action::SendKeys {
            text: text.to_string(),
            clear_first: true,
            typing: self.config.slow_typing(),
        };
        self.perform(locator, &action, &options)
    }

    /// Choose a dropdown option by visible text
    pub fn select(
        &mut self,
        locator: &Locator,
        text: &str,
    ) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::SelectByVisibleText(text.to_string()), &options)
    }

    /// Read element state; the value is trimmed and `None` when absent
    pub fn read(
        &mut self,
        locator: &Locator,
        kind: AttributeKind,
    ) -> Result<Option<String>, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::ReadAttribute(kind), &options)
            .map(|outcome| outcome.value().map(str::to_string))
    }

    /// Clear an editable element
    pub fn clear(&mut self, locator: &Locator) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::Clear, &options)
    }

    /// Move the pointer over an element
    pub fn hover(&mut self, locator: &Locator) -> Result<InteractionOutcome, InteractionError> {
        let options = self.options();
        self.perform(locator, &Action::Hover, &options)
    }

    /// Bring a checkbox to `check`, clicking only when its state differs
    pub fn update_checkbox(
        &mut self,
        locator: &Locator,
        check: bool,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        let current = self.perform(
            locator,
            &Action::ReadAttribute(AttributeKind::Checked),
            &options.with_log_step(false),
        )?;
        if !current.is_success() {
            return Ok(current);
        }
        if is_checked(current.value()) == check {
            tracing::debug!(%locator, check, "checkbox already in requested state");
            return Ok(InteractionOutcome::success());
        }
        self.perform(locator, &Action::Click, options)
    }

    /// Set the `value` attribute from page script, bypassing key events
    pub fn set_value_by_script(
        &mut self,
        locator: &Locator,
        value: &str,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        let result = find_with_wait(&self.session, locator, self.config.default_wait).and_then(
            |element| {
                self.session
                    .execute_script(SET_VALUE_SCRIPT, Some(&element), &[value])
            },
        );
        match result {
            Ok(_) => {
                if options.log_step {
                    self.journal.log(
                        ReportEntry::info("Value was set on the element by script")
                            .with_locator(locator)
                            .with_detail("Value", value),
                    );
                }
                Ok(InteractionOutcome::success())
            }
            Err(error) => {
                FailureClassifier::handle(&mut self.journal, &self.session, locator, error, options)
            }
        }
    }

    /// Drag `source` onto `target`. A failure to resolve either element is
    /// blamed on that element; a failed drop is blamed on `source`.
    pub fn drag_and_drop(
        &mut self,
        source: &Locator,
        target: &Locator,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        let wait = self.config.default_wait;
        let result = find_with_wait(&self.session, source, wait)
            .map_err(|error| (source, error))
            .and_then(|from| {
                find_with_wait(&self.session, target, wait)
                    .map(|to| (from, to))
                    .map_err(|error| (target, error))
            })
            .and_then(|(from, to)| {
                self.session
                    .drag_and_drop(&from, &to)
                    .map_err(|error| (source, error))
            });
        match result {
            Ok(()) => {
                tracing::info!(%source, %target, "dragged and dropped");
                if options.log_step {
                    self.journal.log(
                        ReportEntry::info("Dragged and dropped the element")
                            .with_locator(source)
                            .with_detail("Target", target.to_string()),
                    );
                }
                Ok(InteractionOutcome::success())
            }
            Err((blamed, error)) => {
                FailureClassifier::handle(&mut self.journal, &self.session, blamed, error, options)
            }
        }
    }

    /// Navigate to a URL
    pub fn go_to(&mut self, url: &str) -> SteadfastResult<()> {
        if self.config.options.log_step {
            self.journal
                .log(ReportEntry::info("Navigating to URL").with_detail("URL", url));
        }
        tracing::info!(url, "navigating");
        if let Err(error) = self.session.navigate(url) {
            self.journal.log(
                ReportEntry::fail("Navigation failed")
                    .with_detail("URL", url)
                    .with_detail("Error", error.to_string()),
            );
            return Err(error.into());
        }
        Ok(())
    }

    /// Reload the current page. A hard reload runs `location.reload(true)`
    /// from page script to bypass the cache.
    pub fn refresh(&mut self, hard: bool) -> SteadfastResult<()> {
        if self.config.options.log_step {
            self.journal
                .log(ReportEntry::info("Refreshing page").with_detail("Hard", hard.to_string()));
        }
        tracing::info!(hard, "refreshing");
        let result = if hard {
            self.session
                .execute_script(HARD_RELOAD_SCRIPT, None, &[])
                .map(|_| ())
        } else {
            self.session.refresh()
        };
        if let Err(error) = result {
            self.journal.log(
                ReportEntry::fail("Refresh failed")
                    .with_detail("Hard", hard.to_string())
                    .with_detail("Error", error.to_string()),
            );
            return Err(error.into());
        }
        Ok(())
    }

    /// Navigate to `url`, wait for the page's ready element, then check the
    /// URL against the page's pattern. A URL mismatch is a soft failure.
    pub fn open_page<P: PageObject + ?Sized>(
        &mut self,
        url: &str,
        page: &P,
    ) -> SteadfastResult<InteractionOutcome> {
        self.go_to(url)?;
        let spec = WaitSpec::new(page.load_timeout_secs())
            .with_poll_interval(self.config.default_wait.poll_interval_ms);
        let options = self.options();
        let outcome = self.wait_for_element(&page.ready_locator(), spec, &options)?;
        if !outcome.is_success() {
            return Ok(outcome);
        }

        let current = self.session.current_url()?;
        if UrlMatcher::new(page.url_pattern()).matches(&current) {
            if options.log_step {
                self.journal.log(
                    ReportEntry::info(format!("Opened page {}", page.page_name()))
                        .with_detail("URL", current),
                );
            }
        } else {
            let message = format!(
                "Page {} URL does not match {}",
                page.page_name(),
                page.url_pattern()
            );
            let entry = ReportEntry::fail(&message)
                .with_detail("Expected", page.url_pattern())
                .with_detail("Actual", current);
            FailureClassifier::report_mismatch(
                &mut self.journal,
                &self.session,
                entry,
                message,
                None,
                &options,
            );
        }
        Ok(outcome)
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Poll a built-in condition
    pub fn wait_for(
        &self,
        locator: &Locator,
        condition: Condition,
        spec: WaitSpec,
    ) -> Result<bool, SessionError> {
        wait(&self.session, locator, |s, l| condition.check(s, l), spec)
    }

    /// Wait for an element to be visible; a timeout is a classified
    /// `Timeout` failure
    pub fn wait_for_element(
        &mut self,
        locator: &Locator,
        spec: WaitSpec,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        let error = match self.wait_for(locator, Condition::Visible, spec) {
            Ok(true) => return Ok(InteractionOutcome::success()),
            Ok(false) => SessionError::timeout(format!(
                "{locator} not visible after {} seconds",
                spec.timeout_secs
            )),
            Err(error) => error,
        };
        FailureClassifier::handle(&mut self.journal, &self.session, locator, error, options)
    }

    /// Whether the element becomes visible within `timeout_secs`. Never reports.
    pub fn is_visible(&self, locator: &Locator, timeout_secs: u64) -> bool {
        let spec = WaitSpec::new(timeout_secs)
            .with_poll_interval(self.config.default_wait.poll_interval_ms);
        self.wait_for(locator, Condition::Visible, spec)
            .unwrap_or(false)
    }

    /// Whether at least one element matches right now. Never reports.
    pub fn is_present(&self, locator: &Locator) -> bool {
        self.session
            .find_elements(locator)
            .is_ok_and(|elements| !elements.is_empty())
    }

    // =========================================================================
    // STATE AND LIFECYCLE
    // =========================================================================

    /// Read and normalize element state; absence is reported, not propagated
    pub fn extract(
        &mut self,
        locator: &Locator,
        kind: &AttributeKind,
        normalization: &Normalization,
    ) -> ExtractedValue {
        let options = self.options();
        StateExtractor::new(&self.session, &mut self.journal)
            .with_wait(self.config.default_wait)
            .extract(locator, kind, normalization, &options)
    }

    /// Write the closing entry: `Pass` when no soft warning was recorded
    pub fn finish(&self) -> Severity {
        let status = if self.journal.warnings().is_empty() {
            Severity::Pass
        } else {
            Severity::Fail
        };
        self.journal.finish_test(status);
        status
    }

    /// Fail if any soft warning was recorded during the test
    pub fn verify(&self) -> SteadfastResult<()> {
        self.journal.warnings().verify()?;
        Ok(())
    }
}

/// Whether a `checked`/`selected` attribute reading means "on"
pub(crate) fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case("false"))
}
