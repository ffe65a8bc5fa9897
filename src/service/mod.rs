//! Framework-agnostic conversion service.
//!
//! Everything an HTTP handler needs to turn a Markdown body into a PDF,
//! without depending on any web framework. Handlers stay thin: they map
//! bodies and [`ConversionError`](crate::ConversionError)s onto HTTP, the
//! service does the rest.
//!
//! | Item | Purpose | Blocking? |
//! |------|---------|-----------|
//! | [`markdown::render`] | Markdown → HTML | No |
//! | [`convert_markdown_to_pdf`] | Markdown → PDF | ⚠️ Yes |
//! | [`convert_markdown_to_pdf_async`] | Same, with a deadline | No |
//! | [`health_status`] | `GET /health` payload | No |
//!
//! # Example
//!
//! ```rust,ignore
//! use md2pdf_server::service::convert_markdown_to_pdf_async;
//!
//! let timeout = pool.config().conversion_timeout;
//! let pdf = convert_markdown_to_pdf_async(pool.clone(), body.to_vec(), timeout).await?;
//! assert!(pdf.data.starts_with(b"%PDF-"));
//! ```

pub mod markdown;
mod pdf;
mod types;

pub use pdf::{convert_markdown_to_pdf, convert_markdown_to_pdf_async, health_status, html_data_url};
pub use types::{DEFAULT_FILENAME, DEFAULT_MARGIN_INCHES, HealthResponse, PdfOptions, PdfResponse};
