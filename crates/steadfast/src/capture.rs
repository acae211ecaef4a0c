//! Screenshot artifacts attached to failure entries.

use crate::session::Session;
use std::path::{Path, PathBuf};

/// Produces an artifact for a failure report.
///
/// Capture is best-effort: a failure is logged and yields `None`, it never
/// escalates past the reporter.
pub trait ArtifactCapture {
    /// Capture an artifact, returning its path on success
    fn capture(&self, session: &dyn Session) -> Option<PathBuf>;
}

/// Writes PNG screenshots to `<dir>/<prefix>-<uuid>.png`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotCapture {
    dir: PathBuf,
    prefix: String,
}

impl ScreenshotCapture {
    /// Create a capture writing into `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}-{}.png", self.prefix, uuid::Uuid::new_v4()))
    }

    fn try_capture(&self, session: &dyn Session) -> Result<PathBuf, String> {
        let png = session.screenshot_png().map_err(|e| e.to_string())?;
        std::fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
        let path = self.next_path();
        std::fs::write(&path, png).map_err(|e| e.to_string())?;
        Ok(path)
    }
}

impl ArtifactCapture for ScreenshotCapture {
    fn capture(&self, session: &dyn Session) -> Option<PathBuf> {
        match self.try_capture(session) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "screenshot captured");
                Some(path)
            }
            Err(error) => {
                tracing::warn!(dir = %self.dir.display(), %error, "screenshot capture failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockOp, MockSession};
    use crate::session::{FailureTag, SessionError};

    #[test]
    fn test_writes_png_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let shots = dir.path().join("shots");
        let capture = ScreenshotCapture::new(&shots, "ContactTests-submit");
        let session = MockSession::new();

        let path = capture.capture(&session).unwrap();
        assert!(path.starts_with(&shots));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ContactTests-submit-"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), MockSession::SCREENSHOT_PNG);
    }

    #[test]
    fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let capture = ScreenshotCapture::new(dir.path(), "t");
        let session = MockSession::new();
        let a = capture.capture(&session).unwrap();
        let b = capture.capture(&session).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_failure_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let capture = ScreenshotCapture::new(dir.path(), "t");
        let session = MockSession::new();
        session.fail_next(
            MockOp::Screenshot,
            SessionError::new(FailureTag::NoSuchWindow, "window closed"),
        );
        assert!(capture.capture(&session).is_none());
    }
}
