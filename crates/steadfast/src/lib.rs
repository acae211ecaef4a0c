//! Steadfast: resilient WebDriver element interactions
//!
//! Steadfast wraps a WebDriver session with waits, click fallbacks and a
//! failure taxonomy, and correlates every interaction and verification with
//! a report entry (plus a screenshot when something goes wrong).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   STEADFAST Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Driver     │    │ Action     │    │ Session    │            │
//! │   │ (calls &   │───►│ Executor / │───►│ (WebDriver │            │
//! │   │  asserts)  │    │ WaitEngine │    │  or mock)  │            │
//! │   └─────┬──────┘    └─────┬──────┘    └────────────┘            │
//! │         │                 │ SessionError                        │
//! │         ▼                 ▼                                     │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Soft       │◄───│ Failure    │───►│ ReportSink │            │
//! │   │ warnings   │    │ Classifier │    │ + capture  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let report = HtmlReport::new("Contact form", "target/steadfast");
//! let mut driver = Driver::from_config(session, report.clone(), SteadfastConfig::default());
//!
//! driver.go_to("https://example.test/contact")?;
//! driver.send_keys(&Locator::name("email"), "jane@example.test")?;
//! driver.click(&Locator::css("button[type=submit]"))?;
//! driver.assert_contains_text(&Locator::class_name("notice"), "Thank you", true);
//!
//! driver.finish();
//! report.write("target/steadfast/report.html")?;
//! driver.verify()?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod action;
mod assertion;
mod capture;
#[allow(clippy::missing_const_for_fn)]
mod classify;
mod collection;
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod extract;
mod locator;
/// Tracing subscriber setup for test binaries
pub mod logging;
/// In-memory session for tests
pub mod mock;
mod page_object;
#[allow(clippy::format_push_string, clippy::needless_raw_string_hashes)]
mod reporter;
mod result;
mod session;
mod verification;
mod wait;

pub use action::{
    Action, ActionExecutor, ClickMechanism, ClickPlan, ClickStep, Recovery, Typing,
    DEFAULT_TYPING_DELAY_MS,
};
pub use assertion::{AssertionResult, SoftAssertionError, SoftWarning, SoftWarnings};
pub use capture::{ArtifactCapture, ScreenshotCapture};
pub use classify::{
    FailureClassifier, InteractionError, InteractionFailureKind, InteractionOptions,
    InteractionOutcome,
};
pub use collection::{compare, render_html_list, CollectionDiff};
pub use config::{SteadfastConfig, CONTINUE_ENV, REPORT_DIR_ENV, TIMEOUT_ENV};
pub use driver::Driver;
pub use extract::{read_raw, AttributeKind, ExtractedValue, Normalization, StateExtractor};
pub use locator::{Locator, Strategy};
pub use mock::{MockElement, MockSession};
pub use page_object::{PageMap, PageObject, UrlMatcher, DEFAULT_LOAD_TIMEOUT_SECS};
pub use reporter::{
    FanOut, HtmlReport, Journal, MemoryReport, ReportEntry, ReportSink, ReportSummary, Severity,
    TracingReport,
};
pub use result::{SteadfastError, SteadfastResult};
pub use session::{
    ElementRef, FailureTag, Session, SessionError, HARD_RELOAD_SCRIPT, SCRIPT_CLICK,
    SCROLL_INTO_MIDDLE_SCRIPT, SET_VALUE_SCRIPT,
};
pub use wait::{
    element_present, element_visible, find_with_wait, wait, Condition, WaitSpec,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_SECS,
};
