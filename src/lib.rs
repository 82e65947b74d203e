//! # FX Seasonality Workspace
//!
//! Umbrella crate re-exporting the two workspace members:
//!
//! - [`fx_stats`]: sample summaries, t-tests, one-way ANOVA and the
//!   optimizer used for GARCH fits
//! - [`fx_seasonality`]: session partitioning, the three session tests,
//!   annotation and the supporting simulation, GARCH, bootstrap and
//!   hour-of-day tools
//!
//! ## Example
//!
//! ```
//! use fx_seasonality_workspace::seasonality::{Session, SessionLayout};
//!
//! let layout = SessionLayout::default();
//! assert_eq!(layout.session_of(9), Some(Session::Domestic));
//! assert_eq!(layout.session_of(23), Some(Session::NonUs));
//! ```

pub use fx_seasonality as seasonality;
pub use fx_stats as stats;

/// Version of the seasonality crate bundled in this workspace
pub fn version() -> &'static str {
    fx_seasonality::VERSION
}
