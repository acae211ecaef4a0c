//! End-to-end flows against the in-memory session
//!
//! A contact form is opened, filled and verified; failures must leave a
//! screenshot on disk, a report entry pointing at it and a soft warning, in
//! that order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use steadfast::{
    Driver, FanOut, HtmlReport, InteractionFailureKind, InteractionOptions, Locator, MemoryReport,
    MockElement, MockSession, PageMap, PageObject, Severity, SteadfastConfig, SteadfastError,
    WaitSpec,
};

struct ContactPage;

impl ContactPage {
    fn email() -> Locator {
        Locator::xpath("//input[@name='email']")
    }

    fn agree() -> Locator {
        Locator::id("agree")
    }

    fn submit() -> Locator {
        Locator::css("button[type=submit]")
    }

    fn notice() -> Locator {
        Locator::class_name("notice")
    }
}

impl PageObject for ContactPage {
    fn url_pattern(&self) -> &str {
        "/contact"
    }

    fn ready_locator(&self) -> Locator {
        Self::email()
    }

    fn load_timeout_secs(&self) -> u64 {
        0
    }
}

fn contact_session() -> MockSession {
    MockSession::new()
        .with_title("Contact Us")
        .with_element(ContactPage::email(), MockElement::new())
        .with_element(ContactPage::agree(), MockElement::new().checkbox(false))
        .with_element(ContactPage::submit(), MockElement::new().intercepted())
        .with_element(
            ContactPage::notice(),
            MockElement::new().with_text("  Thank you for\n contacting us. "),
        )
}

fn config(report_dir: &Path, options: InteractionOptions) -> SteadfastConfig {
    SteadfastConfig {
        default_wait: WaitSpec::once(),
        report_dir: report_dir.to_path_buf(),
        screenshot_prefix: "ContactTests".to_string(),
        options,
        typing_delay_ms: 1,
        ..SteadfastConfig::default()
    }
}

fn screenshots(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir.join("screenshots")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn test_contact_form_passes() {
    let dir = tempfile::tempdir().unwrap();
    let report = HtmlReport::new("Contact form", dir.path());
    let mut driver = Driver::from_config(
        contact_session(),
        report.clone(),
        config(dir.path(), InteractionOptions::strict()),
    );

    let opened = driver
        .open_page("https://example.test/contact", &ContactPage)
        .unwrap();
    assert!(opened.is_success());

    driver
        .send_keys(&ContactPage::email(), "jane@example.test")
        .unwrap();
    driver
        .update_checkbox(&ContactPage::agree(), true, &InteractionOptions::strict())
        .unwrap();
    driver.click(&ContactPage::submit()).unwrap();

    assert!(driver
        .assert_contains_text(&ContactPage::notice(), "thank you for contacting", true)
        .passed);
    assert!(driver.assert_title("Contact Us").passed);
    assert!(driver.assert_checked(&ContactPage::agree(), true).passed);

    assert_eq!(driver.finish(), Severity::Pass);
    assert!(driver.verify().is_ok());

    let session = driver.session();
    assert_eq!(
        session.element(&ContactPage::email()).unwrap().value(),
        Some("jane@example.test")
    );
    assert_eq!(session.element(&ContactPage::agree()).unwrap().is_checked(), Some(true));
    assert!(screenshots(dir.path()).is_empty());

    let summary = report.summary();
    assert_eq!(summary.fail, 0);
    assert_eq!(summary.warning, 0);
    assert!(summary.pass >= 3);
}

// ============================================================================
// Soft failures
// ============================================================================

#[test]
fn test_soft_failures_are_correlated_with_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let html = HtmlReport::new("Contact form", dir.path());
    let memory = MemoryReport::new();
    let mut driver = Driver::from_config(
        contact_session(),
        FanOut::new().with(html.clone()).with(memory.clone()),
        config(dir.path(), InteractionOptions::lenient()),
    );

    driver
        .open_page("https://example.test/contact", &ContactPage)
        .unwrap();

    let title = driver.assert_title("Home");
    assert!(!title.passed);

    let missing = driver.click(&Locator::id("reset")).unwrap();
    assert_eq!(missing.failure_kind(), Some(InteractionFailureKind::NotFound));

    // Each failure wrote its screenshot before the entry that references it
    let shots = screenshots(dir.path());
    assert_eq!(shots.len(), 2);
    let failures: Vec<_> = memory
        .entries()
        .into_iter()
        .filter(|e| e.severity.is_problem())
        .collect();
    assert_eq!(failures.len(), 2);
    for entry in &failures {
        let artifact = entry.artifact.as_ref().expect("failure has a screenshot");
        assert!(artifact.exists());
        assert!(artifact
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("ContactTests-"));
    }
    assert_eq!(failures[0].severity, Severity::Fail);
    assert_eq!(failures[0].detail("Actual"), Some("Contact Us"));
    assert_eq!(failures[1].severity, Severity::Warning);

    let warnings = driver.journal().warnings().warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].message, "Title is not correct");
    assert_eq!(warnings[1].message, "Element \"By.Id: reset\" not found.");

    assert_eq!(driver.finish(), Severity::Fail);
    match driver.verify() {
        Err(SteadfastError::SoftAssertions(error)) => assert_eq!(error.count, 2),
        other => panic!("expected soft assertion failure, got {other:?}"),
    }

    let path = dir.path().join("report.html");
    html.write(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Title is not correct"));
    assert!(written.contains("href=\"screenshots/ContactTests-"));
    assert!(written.contains("Test ended with Fail"));
}

#[test]
fn test_strict_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryReport::new();
    let mut driver = Driver::from_config(
        contact_session(),
        memory.clone(),
        config(dir.path(), InteractionOptions::strict()),
    );

    let error = driver.click(&Locator::id("reset")).unwrap_err();
    assert_eq!(error.kind, InteractionFailureKind::NotFound);
    assert_eq!(error.locator, Locator::id("reset"));

    let entries = memory.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Fail);
    assert!(entries[0].artifact.is_some());
}

#[test]
fn test_quiet_failure_leaves_no_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryReport::new();
    let quiet = InteractionOptions::quiet().with_continue(true);
    let mut driver = Driver::from_config(
        contact_session(),
        memory.clone(),
        config(dir.path(), quiet),
    );

    let outcome = driver.click(&Locator::id("reset")).unwrap();
    assert!(!outcome.is_success());
    assert!(screenshots(dir.path()).is_empty());
    assert_eq!(memory.len(), 1);
    assert!(memory.entries()[0].artifact.is_none());
}

// ============================================================================
// Page maps
// ============================================================================

#[test]
fn test_page_map_url_mismatch_is_soft() {
    let page = PageMap::from_yaml_str(
        r#"
name: Contact
url_pattern: /contact
ready: email
load_timeout_secs: 0
locators:
  email: { strategy: x_path, value: "//input[@name='email']" }
"#,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryReport::new();
    let mut driver = Driver::from_config(
        contact_session(),
        memory.clone(),
        config(dir.path(), InteractionOptions::lenient()),
    );

    let outcome = driver.open_page("https://example.test/about", &page).unwrap();
    assert!(outcome.is_success());
    assert_eq!(driver.journal().warnings().count(), 1);
    let failure = memory.with_severity(Severity::Fail).pop().unwrap();
    assert_eq!(failure.detail("Expected"), Some("/contact"));
    assert_eq!(failure.detail("Actual"), Some("https://example.test/about"));
    assert!(failure.artifact.is_some());

    let email = page.locator("email").unwrap().clone();
    assert!(driver.assert_visible(&email, true).passed);
}
