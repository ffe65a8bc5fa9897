//! Request and response types for the conversion service.
//!
//! These types are framework-agnostic: the HTTP integration maps them onto
//! headers and bodies, the service functions produce them.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`PdfOptions`] | Page setup passed to the browser's print call |
//! | [`PdfResponse`] | A finished PDF plus its download filename |
//! | [`HealthResponse`] | JSON payload of `GET /health` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filename offered to clients in `Content-Disposition`.
pub const DEFAULT_FILENAME: &str = "output.pdf";

/// Page margin on every side, in inches.
pub const DEFAULT_MARGIN_INCHES: f64 = 0.4;

// ============================================================================
// PdfOptions
// ============================================================================

/// Page setup for a conversion.
///
/// The defaults produce portrait pages with 0.4 inch margins, let the
/// document's CSS `@page` rule choose the paper size, and skip background
/// graphics.
///
/// # Examples
///
/// ```rust
/// use md2pdf_server::PdfOptions;
///
/// let options = PdfOptions::default();
/// assert!(!options.landscape);
/// assert_eq!(options.margin_inches, 0.4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    /// Landscape orientation.
    pub landscape: bool,

    /// Print background colors and images.
    pub print_background: bool,

    /// Margin applied to all four sides, in inches.
    pub margin_inches: f64,

    /// Honor `@page { size: ... }` from the document.
    pub prefer_css_page_size: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            landscape: false,
            print_background: false,
            margin_inches: DEFAULT_MARGIN_INCHES,
            prefer_css_page_size: true,
        }
    }
}

// ============================================================================
// PdfResponse
// ============================================================================

/// A generated PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfResponse {
    /// Raw PDF bytes, exactly as the browser produced them.
    pub data: Vec<u8>,

    /// Suggested download filename.
    pub filename: String,
}

impl PdfResponse {
    /// Wrap PDF bytes with the default filename.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: DEFAULT_FILENAME.to_string(),
        }
    }

    /// Value for the `Content-Disposition` header. Always a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }

    /// Size of the PDF in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

// ============================================================================
// HealthResponse
// ============================================================================

/// Body of `GET /health`.
///
/// The endpoint reports `"ok"` whenever the HTTP server is up, including
/// while the browser is unavailable; `chrome_initialized` says whether a
/// conversion would find a live browser.
///
/// ```json
/// {
///   "status": "ok",
///   "chrome_initialized": true,
///   "last_used": "2026-10-19T08:15:30.120Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,

    /// Whether a validated browser is installed.
    pub chrome_initialized: bool,

    /// Last time the browser was used, RFC 3339. `null` if never.
    pub last_used: Option<DateTime<Utc>>,
}

impl HealthResponse {
    /// Health payload for the given pool state.
    pub fn new(chrome_initialized: bool, last_used: Option<DateTime<Utc>>) -> Self {
        Self {
            status: "ok".to_string(),
            chrome_initialized,
            last_used,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
