//! Metapackage for the NeoBank workspace.
//!
//! Re-exports the member crates so the end-to-end tests in `tests/` can
//! drive the whole stack through one dependency.

pub use account_service;
pub use api_gateway;
pub use common;
pub use identity_service;
