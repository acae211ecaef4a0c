//! Action Execution
//!
//! Performs one interaction against an element:
//!
//! ```text
//! resolve (wait for presence)
//!    │
//!    ├── scroll into the middle of the viewport (best-effort)
//!    │
//!    ├── act ── Click: ClickPlan steps, e.g. native → script
//!    │          SendKeys: clear?, bulk or per-character typing
//!    │          Select / Read / Clear / Hover
//!    │
//!    ├── Ok  ─► Info entry (if log_step) ─► Success { value }
//!    └── Err ─► FailureClassifier::handle (report, then propagate)
//! ```

use crate::classify::{FailureClassifier, InteractionError, InteractionFailureKind, InteractionOptions, InteractionOutcome};
use crate::extract::{read_raw, AttributeKind, Normalization};
use crate::locator::Locator;
use crate::reporter::{Journal, ReportEntry};
use crate::session::{ElementRef, FailureTag, Session, SessionError, SCRIPT_CLICK, SCROLL_INTO_MIDDLE_SCRIPT};
use crate::wait::{find_with_wait, WaitSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default per-character typing delay (200ms)
pub const DEFAULT_TYPING_DELAY_MS: u64 = 200;

// =============================================================================
// ACTIONS
// =============================================================================

/// How text is submitted to a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Typing {
    /// Whole value in one call
    #[default]
    Bulk,
    /// One character per call, re-resolving the element each time
    PerCharacter {
        /// Pause after each character, in milliseconds
        delay_ms: u64,
    },
}

impl Typing {
    /// Per-character typing with the default delay
    #[must_use]
    pub const fn slow() -> Self {
        Self::PerCharacter {
            delay_ms: DEFAULT_TYPING_DELAY_MS,
        }
    }
}

/// One interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Click the element
    Click,
    /// Type text
    SendKeys {
        /// Text to type
        text: String,
        /// Clear the field first
        clear_first: bool,
        /// Submission mode
        typing: Typing,
    },
    /// Choose a dropdown option by its visible text
    SelectByVisibleText(String),
    /// Read element state; the value is trimmed
    ReadAttribute(AttributeKind),
    /// Clear an editable element
    Clear,
    /// Move the pointer over the element
    Hover,
}

impl Action {
    /// Bulk typing that clears the field first
    #[must_use]
    pub fn type_text(text: impl Into<String>) -> Self {
        Self::SendKeys {
            text: text.into(),
            clear_first: true,
            typing: Typing::Bulk,
        }
    }

    /// Short operation name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::SendKeys { .. } => "send_keys",
            Self::SelectByVisibleText(_) => "select",
            Self::ReadAttribute(_) => "read_attribute",
            Self::Clear => "clear",
            Self::Hover => "hover",
        }
    }

    /// Report message written when the action succeeds
    #[must_use]
    pub fn success_message(&self) -> String {
        match self {
            Self::Click => "Clicked on the element".to_string(),
            Self::SendKeys { .. } => "Text value was entered to the element".to_string(),
            Self::SelectByVisibleText(_) => "Text value was selected from a dropdown".to_string(),
            Self::ReadAttribute(kind) => format!("Obtained value from element by attribute {kind}"),
            Self::Clear => "Cleared the element".to_string(),
            Self::Hover => "Hovering over the element".to_string(),
        }
    }

    const fn scrolls(&self) -> bool {
        matches!(self, Self::Click | Self::SendKeys { .. } | Self::Clear)
    }
}

// =============================================================================
// CLICK PLAN
// =============================================================================

/// Mechanism used for one click attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickMechanism {
    /// WebDriver element click
    Native,
    /// `arguments[0].click()` from page script
    Script,
}

impl fmt::Display for ClickMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Script => f.write_str("script"),
        }
    }
}

/// Which failures of a step fall through to the next step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recovery {
    /// Any failure
    Any,
    /// Only these kinds
    Kinds(Vec<InteractionFailureKind>),
    /// None; the step's error is final
    Nothing,
}

impl Recovery {
    /// Check if a failure of `kind` moves on to the next step
    #[must_use]
    pub fn covers(&self, kind: InteractionFailureKind) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.contains(&kind),
            Self::Nothing => false,
        }
    }
}

/// One click attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickStep {
    /// Mechanism
    pub mechanism: ClickMechanism,
    /// Failures that fall through to the next step
    pub recovers: Recovery,
}

impl ClickStep {
    /// Create a step
    #[must_use]
    pub const fn new(mechanism: ClickMechanism, recovers: Recovery) -> Self {
        Self {
            mechanism,
            recovers,
        }
    }
}

/// Ordered click attempts. The last step's error is always final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickPlan {
    steps: Vec<ClickStep>,
}

impl Default for ClickPlan {
    /// Native click, then one script click on any failure
    fn default() -> Self {
        Self::new(vec![
            ClickStep::new(ClickMechanism::Native, Recovery::Any),
            ClickStep::new(ClickMechanism::Script, Recovery::Nothing),
        ])
    }
}

impl ClickPlan {
    /// Create a plan from explicit steps
    #[must_use]
    pub const fn new(steps: Vec<ClickStep>) -> Self {
        Self { steps }
    }

    /// Native click with no fallback
    #[must_use]
    pub fn native_only() -> Self {
        Self::new(vec![ClickStep::new(ClickMechanism::Native, Recovery::Nothing)])
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[ClickStep] {
        &self.steps
    }
}

// =============================================================================
// EXECUTOR
// =============================================================================

/// Performs actions and routes their failures through the classifier
pub struct ActionExecutor<'a, S: Session> {
    session: &'a S,
    journal: &'a mut Journal,
    plan: ClickPlan,
    wait: WaitSpec,
}

impl<S: Session> fmt::Debug for ActionExecutor<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("plan", &self.plan)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Session> ActionExecutor<'a, S> {
    /// Create an executor with the default click plan and wait
    pub fn new(session: &'a S, journal: &'a mut Journal) -> Self {
        Self {
            session,
            journal,
            plan: ClickPlan::default(),
            wait: WaitSpec::default(),
        }
    }

    /// Set the click plan
    #[must_use]
    pub fn with_plan(mut self, plan: ClickPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Set how long to wait for the element
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitSpec) -> Self {
        self.wait = wait;
        self
    }

    /// Perform `action` on the element at `locator`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure unless `options.continue_on_failure`
    /// is set. The failure is reported either way.
    pub fn perform(
        &mut self,
        locator: &Locator,
        action: &Action,
        options: &InteractionOptions,
    ) -> Result<InteractionOutcome, InteractionError> {
        tracing::debug!(%locator, action = action.name(), "performing action");

        let result = find_with_wait(self.session, locator, self.wait)
            .and_then(|element| self.act(locator, &element, action));

        match result {
            Ok(value) => {
                tracing::info!(%locator, action = action.name(), "action completed");
                if options.log_step {
                    self.log_success(locator, action, value.as_deref());
                }
                Ok(InteractionOutcome::Success { value })
            }
            Err(error) => {
                FailureClassifier::handle(self.journal, self.session, locator, error, options)
            }
        }
    }

    fn act(
        &self,
        locator: &Locator,
        element: &ElementRef,
        action: &Action,
    ) -> Result<Option<String>, SessionError> {
        if action.scrolls() {
            self.scroll_into_view(locator, element);
        }
        match action {
            Action::Click => self.click(locator, element).map(|()| None),
            Action::SendKeys {
                text,
                clear_first,
                typing,
            } => {
                if *clear_first {
                    self.session.clear(element)?;
                }
                self.type_text(locator, element, text, *typing).map(|()| None)
            }
            Action::SelectByVisibleText(text) => {
                self.session.select_by_visible_text(element, text).map(|()| None)
            }
            Action::ReadAttribute(kind) => read_raw(self.session, element, kind)
                .map(|raw| raw.map(|r| Normalization::trimmed().apply(&r))),
            Action::Clear => self.session.clear(element).map(|()| None),
            Action::Hover => self.session.hover(element).map(|()| None),
        }
    }

    fn scroll_into_view(&self, locator: &Locator, element: &ElementRef) {
        if let Err(error) = self
            .session
            .execute_script(SCROLL_INTO_MIDDLE_SCRIPT, Some(element), &[])
        {
            tracing::warn!(%locator, %error, "scroll into view failed, continuing");
        }
    }

    fn click(&self, locator: &Locator, element: &ElementRef) -> Result<(), SessionError> {
        let mut steps = self.plan.steps().iter().peekable();
        while let Some(step) = steps.next() {
            let attempt = match step.mechanism {
                ClickMechanism::Native => self.session.click(element),
                ClickMechanism::Script => self
                    .session
                    .execute_script(SCRIPT_CLICK, Some(element), &[])
                    .map(|_| ()),
            };
            let error = match attempt {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };
            let kind = FailureClassifier::classify(&error);
            if steps.peek().is_none() || !step.recovers.covers(kind) {
                return Err(error);
            }
            tracing::debug!(%locator, mechanism = %step.mechanism, %error, "click failed, falling back");
        }
        Err(SessionError::new(FailureTag::Other, "click plan has no steps"))
    }

    fn type_text(
        &self,
        locator: &Locator,
        element: &ElementRef,
        text: &str,
        typing: Typing,
    ) -> Result<(), SessionError> {
        match typing {
            Typing::Bulk => self.session.send_keys(element, text),
            Typing::PerCharacter { delay_ms } => {
                let delay = Duration::from_millis(delay_ms);
                for ch in text.chars() {
                    let element = self.session.find_element(locator)?;
                    self.session.send_keys(&element, ch.encode_utf8(&mut [0; 4]))?;
                    std::thread::sleep(delay);
                }
                Ok(())
            }
        }
    }

    fn log_success(&self, locator: &Locator, action: &Action, value: Option<&str>) {
        let entry = ReportEntry::info(action.success_message()).with_locator(locator);
        let entry = match (action, value) {
            (Action::SendKeys { text, .. }, _) | (Action::SelectByVisibleText(text), _) => {
                entry.with_detail("Value", text.as_str())
            }
            (Action::ReadAttribute(_), Some(value)) => entry.with_detail("Value", value),
            _ => entry,
        };
        self.journal.log(entry);
    }
}

// =============================================================================
// TESTS
// =============================================================================
