//! Configuration for the provenance core
//!
//! TOML-based settings for renderer navigation timing, where geometry is
//! fetched from, and the viewer tab policy. Every field has a default, so an
//! empty file is a valid configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared_types::DocumentId;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceConfig {
    /// PDF renderer readiness polling and highlight timing
    #[serde(default)]
    pub navigation: NavigationConfig,
    /// Geometry source locations
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Viewer tab selection
    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl ProvenanceConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use provenance_core::config::ProvenanceConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ProvenanceConfig::from_file("provenance.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Readiness polling and highlight timing for the PDF renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Delay between readiness checks (default: 100ms)
    #[serde(
        rename = "retry_interval_ms",
        with = "duration_ms",
        default = "default_retry_interval"
    )]
    pub retry_interval: Duration,
    /// Delay between page navigation and the text highlight request (default: 250ms)
    #[serde(
        rename = "highlight_delay_ms",
        with = "duration_ms",
        default = "default_highlight_delay"
    )]
    pub highlight_delay: Duration,
    /// Readiness checks before navigation is abandoned (default: 50)
    #[serde(default = "default_max_ready_checks")]
    pub max_ready_checks: u32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            retry_interval: default_retry_interval(),
            highlight_delay: default_highlight_delay(),
            max_ready_checks: default_max_ready_checks(),
        }
    }
}

fn default_retry_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_highlight_delay() -> Duration {
    Duration::from_millis(250)
}

fn default_max_ready_checks() -> u32 {
    50
}

/// Where recognition geometry comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// URL for the browser fetch source; `{document_id}` is substituted
    #[serde(default = "default_url_template")]
    pub url_template: String,
    /// Directory of `<document_id>.json` layout files for the file source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_dir: Option<PathBuf>,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            layout_dir: None,
        }
    }
}

impl GeometryConfig {
    pub fn url_for(&self, document_id: &DocumentId) -> String {
        self.url_template
            .replace("{document_id}", document_id.as_str())
    }
}

fn default_url_template() -> String {
    "/api/documents/{document_id}/layout".to_string()
}

/// Viewer tab selection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Default to the image surface when both a PDF and an image exist
    #[serde(default)]
    pub prefer_image_over_pdf: bool,
}

/// Serde module for serializing/deserializing Duration as milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
