//! Reporter - Step Journal and Report Sinks
//!
//! Every interaction and verification writes chronological entries to a
//! [`ReportSink`]. The [`Journal`] bundles the sink with the screenshot
//! capture and the soft warning collector so that a failure produces, in
//! order: the artifact, the entry that references it, then the warning.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Journal                                                           │
//! │   ├── ReportSink ──► MemoryReport | HtmlReport | TracingReport     │
//! │   │                  FanOut(sinks...)                              │
//! │   ├── ArtifactCapture ──► ScreenshotCapture (PNG on disk)          │
//! │   └── SoftWarnings (collect now, fail at verify())                 │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use crate::assertion::SoftWarnings;
use crate::capture::ArtifactCapture;
use crate::collection::render_html_list;
use crate::locator::Locator;
use crate::result::SteadfastResult;
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// =============================================================================
// ENTRIES
// =============================================================================

/// Severity of a report entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational step
    Info,
    /// Verification passed
    Pass,
    /// Soft failure
    Warning,
    /// Hard failure or failed verification
    Fail,
    /// Skipped
    Skip,
}

impl Severity {
    /// Lowercase label used in rendered reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Pass => "pass",
            Self::Warning => "warning",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }

    /// Check if the severity marks a problem
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        matches!(self, Self::Warning | Self::Fail)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "Info",
            Self::Pass => "Pass",
            Self::Warning => "Warning",
            Self::Fail => "Fail",
            Self::Skip => "Skip",
        };
        f.write_str(name)
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Severity
    pub severity: Severity,
    /// Headline message
    pub message: String,
    /// Target locator, in display form
    pub locator: Option<String>,
    /// Labelled detail lines (e.g. `Value`, `Actual`, `Expected`)
    pub details: Vec<(String, String)>,
    /// Labelled item lists, rendered as lists by the HTML sink
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<(String, Vec<String>)>,
    /// Screenshot or other artifact referenced by this entry
    pub artifact: Option<PathBuf>,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
}

impl ReportEntry {
    /// Create an entry
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            locator: None,
            details: Vec::new(),
            lists: Vec::new(),
            artifact: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an `Info` entry
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Create a `Pass` entry
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Severity::Pass, message)
    }

    /// Create a `Fail` entry
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Severity::Fail, message)
    }

    /// Attach the target locator
    #[must_use]
    pub fn with_locator(mut self, locator: &Locator) -> Self {
        self.locator = Some(locator.to_string());
        self
    }

    /// Append a labelled detail line
    #[must_use]
    pub fn with_detail(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((label.into(), value.into()));
        self
    }

    /// Append a labelled list of items
    #[must_use]
    pub fn with_list<I, T>(mut self, label: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.lists
            .push((label.into(), items.into_iter().map(Into::into).collect()));
        self
    }

    /// Attach an artifact path
    #[must_use]
    pub fn with_artifact(mut self, path: PathBuf) -> Self {
        self.artifact = Some(path);
        self
    }

    /// Look up a detail by label
    #[must_use]
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a list by label
    #[must_use]
    pub fn list(&self, label: &str) -> Option<&[String]> {
        self.lists
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, items)| items.as_slice())
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Receives report entries in the order they are emitted
pub trait ReportSink {
    /// Append one entry
    fn log(&self, entry: ReportEntry);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory append-only report. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryReport {
    entries: Arc<Mutex<Vec<ReportEntry>>>,
}

impl MemoryReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries
    #[must_use]
    pub fn entries(&self) -> Vec<ReportEntry> {
        lock(&self.entries).clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Check if no entries were written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Entries with the given severity
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<ReportEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    /// Serialize all entries as pretty JSON
    pub fn to_json(&self) -> SteadfastResult<String> {
        Ok(serde_json::to_string_pretty(&*lock(&self.entries))?)
    }
}

impl ReportSink for MemoryReport {
    fn log(&self, entry: ReportEntry) {
        lock(&self.entries).push(entry);
    }
}

/// Forwards entries to `tracing` at a severity-mapped level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReport;

impl ReportSink for TracingReport {
    fn log(&self, entry: ReportEntry) {
        let locator = entry.locator.as_deref().unwrap_or("-");
        match entry.severity {
            Severity::Fail => tracing::error!(target: "steadfast::report", locator, "{}", entry.message),
            Severity::Warning => tracing::warn!(target: "steadfast::report", locator, "{}", entry.message),
            Severity::Info | Severity::Pass | Severity::Skip => {
                tracing::info!(target: "steadfast::report", locator, severity = %entry.severity, "{}", entry.message);
            }
        }
    }
}

/// Forwards each entry to several sinks, in order
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanOut {
    /// Create an empty fan-out
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    #[must_use]
    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ReportSink for FanOut {
    fn log(&self, entry: ReportEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.log(entry.clone());
            }
            last.log(entry);
        }
    }
}

// =============================================================================
// HTML REPORT
// =============================================================================

/// Per-severity entry counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Info entries
    pub info: usize,
    /// Pass entries
    pub pass: usize,
    /// Warning entries
    pub warning: usize,
    /// Fail entries
    pub fail: usize,
    /// Skip entries
    pub skip: usize,
}

impl ReportSummary {
    /// Total entries
    #[must_use]
    pub const fn total(&self) -> usize {
        self.info + self.pass + self.warning + self.fail + self.skip
    }
}

#[derive(Debug)]
struct HtmlState {
    title: String,
    report_dir: PathBuf,
    entries: Vec<ReportEntry>,
}

/// Self-contained HTML report. Clones share the same entries, so one clone
/// can be handed to a [`Journal`] while another renders at test end.
#[derive(Debug, Clone)]
pub struct HtmlReport {
    state: Arc<Mutex<HtmlState>>,
}

impl HtmlReport {
    /// Create a report whose artifact links are made relative to `report_dir`
    #[must_use]
    pub fn new(title: impl Into<String>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HtmlState {
                title: title.into(),
                report_dir: report_dir.into(),
                entries: Vec::new(),
            })),
        }
    }

    /// Count entries by severity
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let state = lock(&self.state);
        let mut summary = ReportSummary::default();
        for entry in &state.entries {
            match entry.severity {
                Severity::Info => summary.info += 1,
                Severity::Pass => summary.pass += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Fail => summary.fail += 1,
                Severity::Skip => summary.skip += 1,
            }
        }
        summary
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let summary = self.summary();
        let state = lock(&self.state);
        let mut html = String::new();

        html.push_str(r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>"#);
        html.push_str(&escape_html(&state.title));
        html.push_str(r#"</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .entry { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .entry.info { background: #e3f2fd; border-left: 4px solid #2196f3; }
        .entry.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .entry.warning { background: #fff3e0; border-left: 4px solid #ff9800; }
        .entry.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .entry.skip { background: #eeeeee; border-left: 4px solid #9e9e9e; }
        .entry.fail code, .entry.warning code { color: #d32f2f; }
        .list ul { margin: 2px 0 6px 0; }
        pre { margin: 6px 0; white-space: pre-wrap; }
        .time { color: #757575; font-size: 0.85em; }
    </style>
</head>
<body>
"#);

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <p>{} entries: {} pass, {} fail, {} warning, {} info, {} skip</p>
</div>
"#,
            escape_html(&state.title),
            summary.total(),
            summary.pass,
            summary.fail,
            summary.warning,
            summary.info,
            summary.skip
        ));

        for entry in &state.entries {
            html.push_str(&format!(
                r#"<div class="entry {}">
    <span class="time">{}</span> <strong>{}</strong>
"#,
                entry.severity.label(),
                entry.timestamp.format("%H:%M:%S%.3f"),
                escape_html(&entry.message)
            ));

            let mut lines = Vec::new();
            if let Some(locator) = &entry.locator {
                lines.push(format!("Locator: {}", escape_html(locator)));
            }
            for (label, value) in &entry.details {
                lines.push(format!("{}: {}", escape_html(label), escape_html(value)));
            }
            if !lines.is_empty() {
                html.push_str(&format!(
                    "    <pre lang='json'><code>{}</code></pre>\n",
                    lines.join("<br>")
                ));
            }

            for (label, items) in &entry.lists {
                let items: Vec<&str> = items.iter().map(String::as_str).collect();
                html.push_str(&format!(
                    "    <div class=\"list\">{}:{}</div>\n",
                    escape_html(label),
                    render_html_list(&items)
                ));
            }

            if let Some(artifact) = &entry.artifact {
                let link = artifact
                    .strip_prefix(&state.report_dir)
                    .unwrap_or(artifact)
                    .display()
                    .to_string();
                html.push_str(&format!(
                    "    <p>Screenshot: <a href=\"{0}\">{0}</a><br><img src=\"{0}\" alt=\"screenshot\" width=\"480\"></p>\n",
                    escape_html(&link)
                ));
            }

            html.push_str("</div>\n");
        }

        html.push_str(
            r#"
<footer>
    <p>Generated by Steadfast</p>
</footer>
</body>
</html>
"#,
        );

        html
    }

    /// Render and write the report to `output_path`
    pub fn write(&self, output_path: &Path) -> SteadfastResult<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, self.render_html())?;
        Ok(())
    }
}

impl ReportSink for HtmlReport {
    fn log(&self, entry: ReportEntry) {
        lock(&self.state).entries.push(entry);
    }
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// =============================================================================
// JOURNAL
// =============================================================================

/// Report sink, screenshot capture and soft warnings for one test
pub struct Journal {
    sink: Box<dyn ReportSink>,
    capture: Option<Box<dyn ArtifactCapture>>,
    warnings: SoftWarnings,
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("capture", &self.capture.is_some())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl Journal {
    /// Create a journal without screenshot capture
    #[must_use]
    pub fn new(sink: impl ReportSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            capture: None,
            warnings: SoftWarnings::new(),
        }
    }

    /// Attach an artifact capture
    #[must_use]
    pub fn with_capture(mut self, capture: impl ArtifactCapture + 'static) -> Self {
        self.capture = Some(Box::new(capture));
        self
    }

    /// Append an entry
    pub fn log(&self, entry: ReportEntry) {
        self.sink.log(entry);
    }

    /// Capture an artifact. Best-effort: `None` when no capture is attached
    /// or the capture failed.
    pub fn capture<S: Session>(&self, session: &S) -> Option<PathBuf> {
        self.capture.as_ref()?.capture(session)
    }

    /// Record a soft warning
    pub fn warn(&mut self, message: impl Into<String>, locator: Option<&Locator>) {
        self.warnings.record(message, locator);
    }

    /// Collected soft warnings
    #[must_use]
    pub const fn warnings(&self) -> &SoftWarnings {
        &self.warnings
    }

    /// Write the closing entry for a test
    pub fn finish_test(&self, status: Severity) {
        self.log(ReportEntry::new(status, format!("Test ended with {status}")));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod entry_tests {
        use super::*;

        #[test]
        fn test_builders() {
            let entry = ReportEntry::info("Clicked on the element")
                .with_locator(&Locator::id("go"))
                .with_detail("Value", "42");
            assert_eq!(entry.severity, Severity::Info);
            assert_eq!(entry.locator.as_deref(), Some("By.Id: go"));
            assert_eq!(entry.detail("Value"), Some("42"));
            assert_eq!(entry.detail("Missing"), None);
        }

        #[test]
        fn test_lists() {
            let entry = ReportEntry::fail("mismatch").with_list("Expected", ["A", "B"]);
            assert_eq!(entry.list("Expected"), Some(&["A".to_string(), "B".to_string()][..]));
            assert_eq!(entry.list("Actual"), None);
            assert!(entry.details.is_empty());
        }

        #[test]
        fn test_severity_problem() {
            assert!(Severity::Fail.is_problem());
            assert!(Severity::Warning.is_problem());
            assert!(!Severity::Pass.is_problem());
        }
    }

    mod memory_report_tests {
        use super::*;

        #[test]
        fn test_preserves_order_across_clones() {
            let report = MemoryReport::new();
            let writer = report.clone();
            writer.log(ReportEntry::info("first"));
            writer.log(ReportEntry::fail("second"));
            writer.log(ReportEntry::pass("third"));
            let messages: Vec<_> = report.entries().into_iter().map(|e| e.message).collect();
            assert_eq!(messages, vec!["first", "second", "third"]);
            assert_eq!(report.with_severity(Severity::Fail).len(), 1);
        }

        #[test]
        fn test_to_json() {
            let report = MemoryReport::new();
            report.log(ReportEntry::info("hello").with_detail("Value", "x"));
            let json = report.to_json().unwrap();
            assert!(json.contains("\"message\": \"hello\""));
            assert!(json.contains("\"Info\""));
        }
    }

    mod fan_out_tests {
        use super::*;

        #[test]
        fn test_every_sink_receives_entries() {
            let a = MemoryReport::new();
            let b = MemoryReport::new();
            let fan = FanOut::new().with(a.clone()).with(b.clone()).with(TracingReport);
            fan.log(ReportEntry::info("step"));
            assert_eq!(a.len(), 1);
            assert_eq!(b.len(), 1);
        }

        #[test]
        fn test_empty_fan_out_is_noop() {
            FanOut::new().log(ReportEntry::info("dropped"));
        }
    }

    mod html_report_tests {
        use super::*;

        #[test]
        fn test_render_escapes_and_links_relative() {
            let report = HtmlReport::new("Contact <Suite>", "/tmp/reports");
            report.log(
                ReportEntry::fail("Element \"By.Id: x\" not found.")
                    .with_locator(&Locator::xpath("//a[@x='<b>']"))
                    .with_artifact(PathBuf::from("/tmp/reports/shot-1.png")),
            );
            report.log(ReportEntry::pass("Title is correct"));

            let html = report.render_html();
            assert!(html.contains("Contact &lt;Suite&gt;"));
            assert!(html.contains("&lt;b&gt;"));
            assert!(html.contains("href=\"shot-1.png\""));
            assert!(html.contains("class=\"entry fail\""));
            assert!(html.contains("2 entries: 1 pass, 1 fail"));
        }

        #[test]
        fn test_lists_render_as_markup() {
            let report = HtmlReport::new("s", ".");
            report.log(
                ReportEntry::fail("Dropdown contents are not as expected")
                    .with_list("Expected", ["Canada", "Trinidad & Tobago"])
                    .with_list("Actual", ["Peru"]),
            );
            let html = report.render_html();
            assert!(html.contains(
                "<div class=\"list\">Expected:<ul><li>Canada</li><li>Trinidad &amp; Tobago</li></ul></div>"
            ));
            assert!(html.contains("Actual:<ul><li>Peru</li></ul>"));
            assert!(!html.contains("&lt;ul&gt;"));
            assert!(!html.contains("&amp;amp;"));
        }

        #[test]
        fn test_summary_counts() {
            let report = HtmlReport::new("s", ".");
            report.log(ReportEntry::info("a"));
            report.log(ReportEntry::info("b"));
            report.log(ReportEntry::new(Severity::Warning, "c"));
            let summary = report.summary();
            assert_eq!(summary.info, 2);
            assert_eq!(summary.warning, 1);
            assert_eq!(summary.total(), 3);
        }

        #[test]
        fn test_write_creates_parent_dirs() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("report.html");
            let report = HtmlReport::new("suite", dir.path());
            report.log(ReportEntry::info("step"));
            report.write(&path).unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert!(written.starts_with("<!DOCTYPE html>"));
        }
    }

    mod journal_tests {
        use super::*;
        use crate::mock::MockSession;

        #[test]
        fn test_capture_without_capturer_is_none() {
            let journal = Journal::new(MemoryReport::new());
            assert!(journal.capture(&MockSession::new()).is_none());
        }

        #[test]
        fn test_finish_test_entry() {
            let report = MemoryReport::new();
            let journal = Journal::new(report.clone());
            journal.finish_test(Severity::Pass);
            assert_eq!(report.entries()[0].message, "Test ended with Pass");
        }

        #[test]
        fn test_warnings_accumulate() {
            let mut journal = Journal::new(MemoryReport::new());
            journal.warn("one", None);
            journal.warn("two", Some(&Locator::id("x")));
            assert_eq!(journal.warnings().count(), 2);
        }
    }
}
