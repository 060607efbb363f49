#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation types shared by the server and CLI.
//!
//! Pages describe maps as [`MapView`]s of `GeoJSON` [`MapLayer`]s whose
//! features carry their own style and popup, charts as [`BarChart`]s, and
//! tables as [`DataTable`]s that double as CSV downloads.

pub mod chart;
pub mod color;
pub mod layer;
pub mod style;
pub mod table;

pub use chart::{Bar, BarChart};
pub use color::{LinearColormap, NO_DATA_COLOR, Ramp};
pub use layer::{MapLayer, MapView, fit_bounds, popup};
pub use style::{MarkerStyle, PolygonStyle, system_marker};
pub use table::{DataTable, cell, write_csv};

/// Errors that can occur while rendering output.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
