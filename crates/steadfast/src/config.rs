//! Run configuration, loaded from YAML with environment overrides.
//!
//! ```yaml
//! default_wait:
//!   timeout_secs: 15
//!   poll_interval_ms: 100
//! report_dir: target/steadfast
//! screenshot_prefix: ContactTests
//! options:
//!   continue_on_failure: true
//! ```

use crate::action::{Typing, DEFAULT_TYPING_DELAY_MS};
use crate::capture::ScreenshotCapture;
use crate::classify::InteractionOptions;
use crate::result::{SteadfastError, SteadfastResult};
use crate::wait::WaitSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `default_wait.timeout_secs`
pub const TIMEOUT_ENV: &str = "STEADFAST_TIMEOUT";
/// Overrides `report_dir`
pub const REPORT_DIR_ENV: &str = "STEADFAST_REPORT_DIR";
/// Overrides `options.continue_on_failure`
pub const CONTINUE_ENV: &str = "STEADFAST_CONTINUE";

/// Settings shared by every interaction of a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadfastConfig {
    /// Wait used to resolve elements before acting
    pub default_wait: WaitSpec,
    /// Implicit lookup timeout pushed to the session (0 disables it)
    pub implicit_timeout_secs: u64,
    /// Directory for reports and screenshots
    pub report_dir: PathBuf,
    /// File name prefix for screenshots
    pub screenshot_prefix: String,
    /// Default interaction options
    pub options: InteractionOptions,
    /// Delay between characters for slow typing
    pub typing_delay_ms: u64,
}

impl Default for SteadfastConfig {
    fn default() -> Self {
        Self {
            default_wait: WaitSpec::default(),
            implicit_timeout_secs: 0,
            report_dir: PathBuf::from("reports"),
            screenshot_prefix: "screenshot".to_string(),
            options: InteractionOptions::default(),
            typing_delay_ms: DEFAULT_TYPING_DELAY_MS,
        }
    }
}

impl SteadfastConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> SteadfastResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| SteadfastError::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_path(path: &Path) -> SteadfastResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `STEADFAST_*` environment overrides
    pub fn with_env_overrides(self) -> SteadfastResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> SteadfastResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.default_wait.timeout_secs = raw.trim().parse().map_err(|_| {
                SteadfastError::config(format!("{TIMEOUT_ENV} must be whole seconds, got {raw:?}"))
            })?;
        }
        if let Some(raw) = lookup(REPORT_DIR_ENV) {
            self.report_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup(CONTINUE_ENV) {
            self.options.continue_on_failure = parse_flag(&raw).ok_or_else(|| {
                SteadfastError::config(format!("{CONTINUE_ENV} must be true or false, got {raw:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check invariants the loaders cannot express in types
    pub fn validate(&self) -> SteadfastResult<()> {
        if self.report_dir.as_os_str().is_empty() {
            return Err(SteadfastError::config("report_dir must not be empty"));
        }
        if self.screenshot_prefix.is_empty()
            || self.screenshot_prefix.contains(['/', '\\'])
        {
            return Err(SteadfastError::config(format!(
                "screenshot_prefix must be a non-empty file name, got {:?}",
                self.screenshot_prefix
            )));
        }
        Ok(())
    }

    /// Implicit timeout, if enabled
    #[must_use]
    pub fn implicit_timeout(&self) -> Option<Duration> {
        (self.implicit_timeout_secs > 0).then(|| Duration::from_secs(self.implicit_timeout_secs))
    }

    /// Slow typing mode with the configured delay
    #[must_use]
    pub const fn slow_typing(&self) -> Typing {
        Typing::PerCharacter {
            delay_ms: self.typing_delay_ms,
        }
    }

    /// Screenshot capture writing under `<report_dir>/screenshots`
    #[must_use]
    pub fn screenshot_capture(&self) -> ScreenshotCapture {
        ScreenshotCapture::new(self.report_dir.join("screenshots"), self.screenshot_prefix.clone())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SteadfastConfig::default();
            assert_eq!(config.default_wait, WaitSpec::default());
            assert_eq!(config.typing_delay_ms, 200);
            assert!(config.implicit_timeout().is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_partial_yaml() {
            let config = SteadfastConfig::from_yaml_str(
                "default_wait:\n  timeout_secs: 15\nscreenshot_prefix: ContactTests\noptions:\n  continue_on_failure: true\n",
            )
            .unwrap();
            assert_eq!(config.default_wait.timeout_secs, 15);
            assert_eq!(config.default_wait.poll_interval_ms, 50);
            assert_eq!(config.screenshot_prefix, "ContactTests");
            assert!(config.options.continue_on_failure);
            assert!(config.options.log_step);
        }

        #[test]
        fn test_invalid_yaml() {
            let err = SteadfastConfig::from_yaml_str("default_wait: [").unwrap_err();
            assert!(matches!(err, SteadfastError::Config { .. }));
        }

        #[test]
        fn test_invalid_prefix() {
            let err = SteadfastConfig::from_yaml_str("screenshot_prefix: a/b").unwrap_err();
            assert!(err.to_string().contains("screenshot_prefix"));
        }

        #[test]
        fn test_from_path() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("steadfast.yaml");
            std::fs::write(&path, "implicit_timeout_secs: 3\n").unwrap();
            let config = SteadfastConfig::from_path(&path).unwrap();
            assert_eq!(config.implicit_timeout(), Some(Duration::from_secs(3)));
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let err = SteadfastConfig::from_path(Path::new("/nonexistent/steadfast.yaml")).unwrap_err();
            assert!(matches!(err, SteadfastError::Io(_)));
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_overrides_apply() {
            let config = SteadfastConfig::default()
                .with_overrides_from(lookup(&[
                    (TIMEOUT_ENV, "30"),
                    (REPORT_DIR_ENV, "/tmp/out"),
                    (CONTINUE_ENV, "yes"),
                ]))
                .unwrap();
            assert_eq!(config.default_wait.timeout_secs, 30);
            assert_eq!(config.report_dir, PathBuf::from("/tmp/out"));
            assert!(config.options.continue_on_failure);
        }

        #[test]
        fn test_no_overrides_is_identity() {
            let config = SteadfastConfig::default().with_overrides_from(lookup(&[])).unwrap();
            assert_eq!(config, SteadfastConfig::default());
        }

        #[test]
        fn test_bad_timeout() {
            let err = SteadfastConfig::default()
                .with_overrides_from(lookup(&[(TIMEOUT_ENV, "soon")]))
                .unwrap_err();
            assert!(err.to_string().contains(TIMEOUT_ENV));
        }

        #[test]
        fn test_bad_flag() {
            assert!(SteadfastConfig::default()
                .with_overrides_from(lookup(&[(CONTINUE_ENV, "maybe")]))
                .is_err());
        }
    }

    #[test]
    fn test_screenshot_capture_dir() {
        let config = SteadfastConfig {
            report_dir: PathBuf::from("out"),
            ..SteadfastConfig::default()
        };
        assert_eq!(config.screenshot_capture().dir(), Path::new("out/screenshots"));
        assert_eq!(config.slow_typing(), Typing::PerCharacter { delay_ms: 200 });
    }
}
