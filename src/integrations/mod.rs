//! Web framework integrations.
//!
//! | Framework | Feature Flag | Module |
//! |-----------|--------------|--------|
//! | Axum | `axum-integration` | `axum` |
//!
//! The handlers are thin: they map bodies and errors onto HTTP and call
//! into [`service`](crate::service).

#[cfg(feature = "axum-integration")]
pub mod axum;
