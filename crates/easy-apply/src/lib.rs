//! Job search screening and Easy Apply automation over a WebDriver session.
//!
//! The crate is organised the same way the binary wires it together: `config`
//! and `telemetry` form the ambient layer, `browser` is the seam to the remote
//! browser, and `workflows::apply` holds the session orchestrator and the
//! components it drives.

pub mod browser;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
