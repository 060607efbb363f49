#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the NJ Safe Drinking Water tools.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while spinners redraw. [`Spinner`] shows progress
//! while a page is fetched, and [`prompt_region`] asks for an area of
//! interest interactively.

use std::time::Duration;

use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use nj_sdwa_models::{BoundingBox, Region, RegionRequest};

pub use indicatif::MultiProgress;

/// A spinner shown while a page is being built.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Adds a ticking spinner with `message` to `multi`.
    #[must_use]
    pub fn start(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Stops the spinner, leaving `message` in its place.
    pub fn finish(self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Stops the spinner and removes it from the terminal.
    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // already set in tests

    log::set_max_level(level);

    multi
}

/// Ways to describe an area at the prompt.
const REGION_KINDS: &[&str] = &[
    "Default box (northern New Jersey)",
    "Bounding box",
    "Point and radius",
];

fn check_range(value: f64, limit: f64, name: &str) -> Result<(), String> {
    if value.is_finite() && value.abs() < limit {
        Ok(())
    } else {
        Err(format!("{name} must be between -{limit} and {limit}"))
    }
}

fn check_radius(km: f64) -> Result<(), String> {
    if km.is_finite() && km > 0.0 {
        Ok(())
    } else {
        Err("Radius must be a positive number of kilometers".to_string())
    }
}

/// Asks which area to look at.
///
/// # Errors
///
/// Returns a [`dialoguer::Error`] if the terminal cannot be read.
pub fn prompt_region() -> Result<RegionRequest, dialoguer::Error> {
    let kind = Select::new()
        .with_prompt("Which area?")
        .items(REGION_KINDS)
        .default(0)
        .interact()?;

    match kind {
        1 => {
            let bbox: BoundingBox = Input::new()
                .with_prompt("Bounding box (west,south,east,north)")
                .interact_text()?;
            Ok(RegionRequest::BoundingBox { bbox })
        }
        2 => {
            let lat: f64 = Input::new()
                .with_prompt("Latitude")
                .validate_with(|v: &f64| check_range(*v, 90.0, "Latitude"))
                .interact_text()?;
            let lng: f64 = Input::new()
                .with_prompt("Longitude")
                .validate_with(|v: &f64| check_range(*v, 180.0, "Longitude"))
                .interact_text()?;
            let radius_km: f64 = Input::new()
                .with_prompt("Radius (km)")
                .default(10.0)
                .validate_with(|v: &f64| check_radius(*v))
                .interact_text()?;
            Ok(RegionRequest::Point {
                lat,
                lng,
                radius_km: Some(radius_km),
            })
        }
        _ => Ok(RegionRequest::BoundingBox {
            bbox: Region::default_box().bounding_box(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_must_be_off_the_poles() {
        assert!(check_range(40.9, 90.0, "Latitude").is_ok());
        assert!(check_range(90.0, 90.0, "Latitude").is_err());
        assert!(check_range(-120.0, 90.0, "Latitude").is_err());
        assert!(check_range(f64::NAN, 90.0, "Latitude").is_err());
    }

    #[test]
    fn radius_must_be_positive() {
        assert!(check_radius(10.0).is_ok());
        assert!(check_radius(0.0).is_err());
        assert!(check_radius(-1.0).is_err());
        assert!(check_radius(f64::INFINITY).is_err());
    }
}
