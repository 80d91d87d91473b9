//! Core data types, season classification and station rollups for the
//! ridership dashboard.
//!
//! Everything here is pure and synchronous; loading lives in `ride-data`
//! and presentation in `ride-dash`.

pub mod format;
pub mod rollups;
pub mod season;
pub mod types;

pub use format::*;
pub use rollups::*;
pub use season::*;
pub use types::*;
