//! Traits at the seam between the pool and the external browser.
//!
//! - [`Healthcheck`]: smoke test / liveness check
//! - [`BrowserProcess`]: the process handle itself (print, terminate)
//!
//! The pool only ever talks to these traits, which is what lets the tests
//! substitute [`MockBrowserFactory`](crate::factory::mock::MockBrowserFactory)
//! for a real Chrome.

mod healthcheck;
mod process;

pub use healthcheck::Healthcheck;
pub use process::BrowserProcess;
