//! Client configuration and per-tool options.
//!
//! [`ClientConfig`] describes how to reach the processing service and is
//! shared by every workflow opened against it. It is built through
//! [`ClientConfigBuilder`], which validates the result.
//!
//! [`ToolOptions`] holds the form widgets of a tool page (compression level,
//! output format, split mode). Only the fields relevant to the active
//! [`crate::variant::Variant`] are sent.

use crate::error::DeskError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Service root used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";

/// Connection settings for the processing service.
///
/// # Example
/// ```rust
/// use pdfdesk::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://tools.example.com/pdf")
///     .request_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url.as_str(), "https://tools.example.com/pdf/");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root. Always ends with `/` so endpoint joins keep any path prefix.
    pub base_url: Url,

    /// Upper bound on every request, including the body transfer. Default: 120 s.
    pub request_timeout: Duration,

    /// Parallel fetches when saving results with [`crate::download::save_all`]. Default: 4.
    pub download_concurrency: usize,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            download_concurrency: 4,
            user_agent: format!("pdfdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Absolute URL of a service path such as `/api/merge` or `/uploads/x.pdf`.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, DeskError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| DeskError::InvalidConfig(format!("cannot join '{path}': {e}")))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    request_timeout: Duration,
    download_concurrency: usize,
    user_agent: String,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    pub fn download_concurrency(mut self, n: usize) -> Self {
        self.download_concurrency = n.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DeskError> {
        let raw = self.base_url.trim();
        let mut url = Url::parse(raw)
            .map_err(|e| DeskError::InvalidConfig(format!("base URL '{raw}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DeskError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        if self.request_timeout.is_zero() {
            return Err(DeskError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        Ok(ClientConfig {
            base_url: url,
            request_timeout: self.request_timeout,
            download_concurrency: self.download_concurrency,
            user_agent: self.user_agent,
        })
    }
}

// ── Tool options ─────────────────────────────────────────────────────────

/// Compression strength for the compress tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Lossless clean-up only.
    Low,
    /// Images re-encoded at quality 75. (default)
    #[default]
    Medium,
    /// Quality 50.
    High,
    /// Quality 25.
    UltraHigh,
}

impl CompressionLevel {
    /// Value of the `level` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
            CompressionLevel::UltraHigh => "ultra_high",
        }
    }
}

/// Target format for the image converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Value of the `format` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

/// How the split tool cuts the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// One output file per page. (default)
    #[default]
    AllPages,
    /// One output file per entry of `page_ranges`, e.g. `"1-3, 5, 7-9"`.
    CustomRanges,
}

impl SplitMode {
    /// Value of the `split_option` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitMode::AllPages => "all_pages",
            SplitMode::CustomRanges => "custom_ranges",
        }
    }
}

macro_rules! wire_enum_text {
    ($ty:ty, $what:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = DeskError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| DeskError::InvalidConfig(format!(
                        concat!("unknown ", $what, " '{}'"),
                        s
                    )))
            }
        }
    };
}

wire_enum_text!(
    CompressionLevel,
    "compression level",
    [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
        CompressionLevel::UltraHigh,
    ]
);
wire_enum_text!(
    ImageFormat,
    "image format",
    [ImageFormat::Jpg, ImageFormat::Png, ImageFormat::Webp]
);
wire_enum_text!(
    SplitMode,
    "split mode",
    [SplitMode::AllPages, SplitMode::CustomRanges]
);

/// Form widgets of a tool page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOptions {
    pub compression_level: CompressionLevel,
    pub output_format: ImageFormat,
    pub split_mode: SplitMode,
    /// Free-text range list; required (non-blank) when `split_mode` is `CustomRanges`.
    pub page_ranges: String,
}
