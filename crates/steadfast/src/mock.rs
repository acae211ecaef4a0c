//! Scriptable in-memory [`Session`] for tests.
//!
//! Elements are registered per locator with a small amount of behaviour
//! (visibility, checkbox state, dropdown options, typed value). Failures can be
//! queued per operation with [`MockSession::fail_next`], and every call is
//! journaled so tests can assert on ordering.

use crate::locator::Locator;
use crate::session::{
    ElementRef, FailureTag, Session, SessionError, HARD_RELOAD_SCRIPT, SCRIPT_CLICK,
    SET_VALUE_SCRIPT,
};
use base64::Engine;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Session operation, used to script failures and inspect calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    /// `find_element`
    Find,
    /// `find_elements`
    FindAll,
    /// `navigate`
    Navigate,
    /// `refresh`
    Refresh,
    /// `current_url`
    CurrentUrl,
    /// `title`
    Title,
    /// `execute_script` with any script other than a click
    Script,
    /// `execute_script` with the script click
    ScriptClick,
    /// `set_implicit_timeout`
    ImplicitTimeout,
    /// native `click`
    Click,
    /// `send_keys`
    SendKeys,
    /// `clear`
    Clear,
    /// `attribute`
    Attribute,
    /// `text`
    Text,
    /// `is_displayed`
    Displayed,
    /// `select_by_visible_text`
    Select,
    /// `option_texts`
    Options,
    /// `hover`
    Hover,
    /// `drag_and_drop`
    DragAndDrop,
    /// `screenshot_base64`
    Screenshot,
}

/// One journaled call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Operation
    pub op: MockOp,
    /// Locator, element id, script or argument, depending on the op
    pub detail: String,
}

/// Behaviour of one mock element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    hidden: bool,
    stale: bool,
    not_interactable: bool,
    intercepted: bool,
    text: String,
    attributes: BTreeMap<String, String>,
    checked: Option<bool>,
    options: Vec<String>,
    selected: Option<String>,
    clicks: usize,
    hovered: bool,
    drops: usize,
}

impl MockElement {
    /// A visible, interactable element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element is present but not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Every operation on the element reports a stale reference
    #[must_use]
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    /// Native click and typing fail as not interactable
    #[must_use]
    pub fn not_interactable(mut self) -> Self {
        self.not_interactable = true;
        self
    }

    /// Native click is intercepted; the script click still lands
    #[must_use]
    pub fn intercepted(mut self) -> Self {
        self.intercepted = true;
        self
    }

    /// Rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// DOM attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Checkbox with the given initial state; clicks toggle it
    #[must_use]
    pub fn checkbox(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// `<select>` with the given option texts
    #[must_use]
    pub fn with_options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Current `value` attribute
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.attributes.get("value").map(String::as_str)
    }

    /// Checkbox state, if the element is a checkbox
    #[must_use]
    pub const fn is_checked(&self) -> Option<bool> {
        self.checked
    }

    /// Option chosen by `select_by_visible_text`
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Clicks that landed (native or script)
    #[must_use]
    pub const fn clicks(&self) -> usize {
        self.clicks
    }

    /// Whether the pointer was moved over the element
    #[must_use]
    pub const fn hovered(&self) -> bool {
        self.hovered
    }

    /// Elements dropped onto this one
    #[must_use]
    pub const fn drops(&self) -> usize {
        self.drops
    }

    fn toggle(&mut self) {
        self.clicks += 1;
        if let Some(checked) = self.checked.as_mut() {
            *checked = !*checked;
        }
    }

    fn ensure_interactable(&self) -> Result<(), SessionError> {
        if self.not_interactable || self.hidden {
            Err(SessionError::new(
                FailureTag::ElementNotInteractable,
                "element not interactable",
            ))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
struct MockSlot {
    element: MockElement,
    available_at: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    locators: HashMap<Locator, String>,
    slots: HashMap<String, MockSlot>,
    failures: Vec<(MockOp, SessionError)>,
    calls: Vec<MockCall>,
    url: String,
    title: String,
    reloads: usize,
    implicit_timeout: Option<Duration>,
}

/// In-memory browser session
#[derive(Debug, Default)]
pub struct MockSession {
    state: RefCell<MockState>,
}

impl MockSession {
    /// Bytes returned by the mock screenshot (a PNG signature)
    pub const SCREENSHOT_PNG: &'static [u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// Empty session at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let session = Self::default();
        session.state.borrow_mut().url = "about:blank".to_string();
        session
    }

    /// Register an element
    #[must_use]
    pub fn with_element(self, locator: Locator, element: MockElement) -> Self {
        self.insert(locator, element, Duration::ZERO);
        self
    }

    /// Register an element that only becomes findable after `delay`
    #[must_use]
    pub fn with_element_after(self, locator: Locator, element: MockElement, delay: Duration) -> Self {
        self.insert(locator, element, delay);
        self
    }

    /// Set the page title
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.state.borrow_mut().title = title.into();
        self
    }

    /// Set the current URL
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.state.borrow_mut().url = url.into();
        self
    }

    /// Register or replace an element on a live session
    pub fn insert(&self, locator: Locator, element: MockElement, delay: Duration) {
        let mut state = self.state.borrow_mut();
        let id = match state.locators.get(&locator) {
            Some(id) => id.clone(),
            None => {
                let id = format!("element-{}", state.slots.len() + 1);
                state.locators.insert(locator, id.clone());
                id
            }
        };
        state.slots.insert(
            id,
            MockSlot {
                element,
                available_at: Instant::now() + delay,
            },
        );
    }

    /// Make a registered element stale, as if the DOM node was replaced
    pub fn detach(&self, locator: &Locator) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.locators.get(locator).cloned() {
            if let Some(slot) = state.slots.get_mut(&id) {
                slot.element.stale = true;
            }
        }
    }

    /// Fail the next call of `op` with `error`. Queued failures for the same
    /// op are consumed in order.
    pub fn fail_next(&self, op: MockOp, error: SessionError) {
        self.state.borrow_mut().failures.push((op, error));
    }

    /// Every call so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Operations of every call so far
    #[must_use]
    pub fn ops(&self) -> Vec<MockOp> {
        self.state.borrow().calls.iter().map(|c| c.op).collect()
    }

    /// Number of calls of `op`
    #[must_use]
    pub fn count(&self, op: MockOp) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .count()
    }

    /// Snapshot of the element registered under `locator`
    #[must_use]
    pub fn element(&self, locator: &Locator) -> Option<MockElement> {
        let state = self.state.borrow();
        let id = state.locators.get(locator)?;
        state.slots.get(id).map(|slot| slot.element.clone())
    }

    /// Page reloads, native or by script
    #[must_use]
    pub fn reloads(&self) -> usize {
        self.state.borrow().reloads
    }

    /// Last implicit timeout set
    #[must_use]
    pub fn implicit_timeout(&self) -> Option<Duration> {
        self.state.borrow().implicit_timeout
    }

    fn begin(&self, op: MockOp, detail: impl Into<String>) -> Result<(), SessionError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall {
            op,
            detail: detail.into(),
        });
        match state.failures.iter().position(|(o, _)| *o == op) {
            Some(pos) => Err(state.failures.remove(pos).1),
            None => Ok(()),
        }
    }

    fn on_element<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut MockElement) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut state = self.state.borrow_mut();
        let slot = state.slots.get_mut(&element.id).ok_or_else(|| {
            SessionError::new(
                FailureTag::StaleElementReference,
                "element is not attached to the page document",
            )
        })?;
        if slot.element.stale {
            return Err(SessionError::new(
                FailureTag::StaleElementReference,
                "stale element reference: element is not attached to the page document",
            ));
        }
        f(&mut slot.element)
    }
}

impl Session for MockSession {
    fn find_element(&self, locator: &Locator) -> Result<ElementRef, SessionError> {
        self.begin(MockOp::Find, locator.to_string())?;
        let state = self.state.borrow();
        let id = state
            .locators
            .get(locator)
            .ok_or_else(|| SessionError::no_such_element(locator))?;
        match state.slots.get(id) {
            Some(slot) if Instant::now() >= slot.available_at => Ok(ElementRef::new(id.clone())),
            _ => Err(SessionError::no_such_element(locator)),
        }
    }

    fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, SessionError> {
        self.begin(MockOp::FindAll, locator.to_string())?;
        let state = self.state.borrow();
        Ok(state
            .locators
            .get(locator)
            .filter(|id| {
                state
                    .slots
                    .get(*id)
                    .is_some_and(|slot| Instant::now() >= slot.available_at)
            })
            .map(|id| vec![ElementRef::new(id.clone())])
            .unwrap_or_default())
    }

    fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.begin(MockOp::Navigate, url)?;
        self.state.borrow_mut().url = url.to_string();
        Ok(())
    }

    fn refresh(&self) -> Result<(), SessionError> {
        let url = self.state.borrow().url.clone();
        self.begin(MockOp::Refresh, url)?;
        self.state.borrow_mut().reloads += 1;
        Ok(())
    }

    fn current_url(&self) -> Result<String, SessionError> {
        self.begin(MockOp::CurrentUrl, "")?;
        Ok(self.state.borrow().url.clone())
    }

    fn title(&self) -> Result<String, SessionError> {
        self.begin(MockOp::Title, "")?;
        Ok(self.state.borrow().title.clone())
    }

    fn execute_script(
        &self,
        script: &str,
        element: Option<&ElementRef>,
        args: &[&str],
    ) -> Result<serde_json::Value, SessionError> {
        let op = if script == SCRIPT_CLICK {
            MockOp::ScriptClick
        } else {
            MockOp::Script
        };
        self.begin(op, script)?;
        let Some(element) = element else {
            if script == HARD_RELOAD_SCRIPT {
                self.state.borrow_mut().reloads += 1;
            }
            return Ok(serde_json::Value::Null);
        };
        self.on_element(element, |e| {
            if op == MockOp::ScriptClick {
                e.toggle();
            } else if script == SET_VALUE_SCRIPT {
                let value = args.first().copied().unwrap_or_default();
                e.attributes.insert("value".to_string(), value.to_string());
            }
            Ok(serde_json::Value::Null)
        })
    }

    fn set_implicit_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.begin(MockOp::ImplicitTimeout, format!("{}ms", timeout.as_millis()))?;
        self.state.borrow_mut().implicit_timeout = Some(timeout);
        Ok(())
    }

    fn click(&self, element: &ElementRef) -> Result<(), SessionError> {
        self.begin(MockOp::Click, element.id.as_str())?;
        self.on_element(element, |e| {
            e.ensure_interactable()?;
            if e.intercepted {
                return Err(SessionError::new(
                    FailureTag::ElementClickIntercepted,
                    "element click intercepted: other element would receive the click",
                ));
            }
            e.toggle();
            Ok(())
        })
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), SessionError> {
        self.begin(MockOp::SendKeys, text)?;
        self.on_element(element, |e| {
            e.ensure_interactable()?;
            e.attributes
                .entry("value".to_string())
                .or_default()
                .push_str(text);
            Ok(())
        })
    }

    fn clear(&self, element: &ElementRef) -> Result<(), SessionError> {
        self.begin(MockOp::Clear, element.id.as_str())?;
        self.on_element(element, |e| {
            e.ensure_interactable()?;
            e.attributes.insert("value".to_string(), String::new());
            Ok(())
        })
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, SessionError> {
        self.begin(MockOp::Attribute, name)?;
        self.on_element(element, |e| {
            if name == "checked" {
                if let Some(checked) = e.checked {
                    return Ok(checked.then(|| "true".to_string()));
                }
            }
            Ok(e.attributes.get(name).cloned())
        })
    }

    fn text(&self, element: &ElementRef) -> Result<String, SessionError> {
        self.begin(MockOp::Text, element.id.as_str())?;
        self.on_element(element, |e| Ok(if e.hidden { String::new() } else { e.text.clone() }))
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, SessionError> {
        self.begin(MockOp::Displayed, element.id.as_str())?;
        self.on_element(element, |e| Ok(!e.hidden))
    }

    fn select_by_visible_text(&self, element: &ElementRef, text: &str) -> Result<(), SessionError> {
        self.begin(MockOp::Select, text)?;
        self.on_element(element, |e| {
            if e.options.iter().any(|o| o == text) {
                e.selected = Some(text.to_string());
                Ok(())
            } else {
                Err(SessionError::new(
                    FailureTag::NoSuchElement,
                    format!("Cannot locate option with text: {text}"),
                ))
            }
        })
    }

    fn option_texts(&self, element: &ElementRef) -> Result<Vec<String>, SessionError> {
        self.begin(MockOp::Options, element.id.as_str())?;
        self.on_element(element, |e| Ok(e.options.clone()))
    }

    fn hover(&self, element: &ElementRef) -> Result<(), SessionError> {
        self.begin(MockOp::Hover, element.id.as_str())?;
        self.on_element(element, |e| {
            e.hovered = true;
            Ok(())
        })
    }

    fn drag_and_drop(&self, source: &ElementRef, target: &ElementRef) -> Result<(), SessionError> {
        self.begin(MockOp::DragAndDrop, format!("{} -> {}", source.id, target.id))?;
        self.on_element(source, |e| e.ensure_interactable())?;
        self.on_element(target, |e| {
            e.drops += 1;
            Ok(())
        })
    }

    fn screenshot_base64(&self) -> Result<String, SessionError> {
        self.begin(MockOp::Screenshot, "")?;
        Ok(base64::engine::general_purpose::STANDARD.encode(Self::SCREENSHOT_PNG))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_registered_and_missing() {
        let locator = Locator::id("q");
        let session = MockSession::new().with_element(locator.clone(), MockElement::new());
        assert!(session.find_element(&locator).is_ok());
        let err = session.find_element(&Locator::id("nope")).unwrap_err();
        assert_eq!(err.tag, FailureTag::NoSuchElement);
        assert!(session.find_elements(&Locator::id("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_fail_next_is_consumed_once() {
        let locator = Locator::id("q");
        let session = MockSession::new().with_element(locator.clone(), MockElement::new());
        session.fail_next(MockOp::Find, SessionError::new(FailureTag::Other, "flaky"));
        assert!(session.find_element(&locator).is_err());
        assert!(session.find_element(&locator).is_ok());
        assert_eq!(session.count(MockOp::Find), 2);
    }

    #[test]
    fn test_checkbox_toggles_on_click() {
        let locator = Locator::id("agree");
        let session =
            MockSession::new().with_element(locator.clone(), MockElement::new().checkbox(false));
        let element = session.find_element(&locator).unwrap();
        assert_eq!(session.attribute(&element, "checked").unwrap(), None);
        session.click(&element).unwrap();
        assert_eq!(
            session.attribute(&element, "checked").unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_detach_makes_element_stale() {
        let locator = Locator::id("row");
        let session = MockSession::new().with_element(locator.clone(), MockElement::new());
        let element = session.find_element(&locator).unwrap();
        session.detach(&locator);
        let err = session.text(&element).unwrap_err();
        assert_eq!(err.tag, FailureTag::StaleElementReference);
    }

    #[test]
    fn test_screenshot_png_decodes() {
        let session = MockSession::new();
        assert_eq!(session.screenshot_png().unwrap(), MockSession::SCREENSHOT_PNG);
    }
}
