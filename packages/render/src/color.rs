//! Linear color ramps for choropleths and count-colored markers.

use serde::Serialize;

/// Fill for features without a value.
pub const NO_DATA_COLOR: &str = "#d3d3d3";

/// Five-class sequential `ColorBrewer` ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ramp {
    Reds,
    Blues,
    Greens,
}

impl Ramp {
    /// Stops from lightest to darkest.
    #[must_use]
    pub const fn stops(self) -> [&'static str; 5] {
        match self {
            Self::Reds => ["#fee5d9", "#fcae91", "#fb6a4a", "#de2d26", "#a50f15"],
            Self::Blues => ["#eff3ff", "#bdd7e7", "#6baed6", "#3182bd", "#08519c"],
            Self::Greens => ["#edf8e9", "#bae4b3", "#74c476", "#31a354", "#006d2c"],
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reds => "Reds_05",
            Self::Blues => "Blues_05",
            Self::Greens => "Greens_05",
        }
    }
}

fn parse_hex(hex: &str) -> [u8; 3] {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    [channel(1), channel(3), channel(5)]
}

/// A ramp stretched over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearColormap {
    pub name: &'static str,
    pub ramp: Ramp,
    pub min: f64,
    pub max: f64,
    pub stops: [&'static str; 5],
}

impl LinearColormap {
    #[must_use]
    pub const fn new(ramp: Ramp, min: f64, max: f64) -> Self {
        Self {
            name: ramp.name(),
            ramp,
            min,
            max,
            stops: ramp.stops(),
        }
    }

    /// Scales `ramp` to the finite values in `values`. With no finite
    /// values the range is `[0, 0]`.
    #[must_use]
    pub fn scaled<I>(ramp: Ramp, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let (min, max) = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| {
                Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })
            .unwrap_or((0.0, 0.0));
        Self::new(ramp, min, max)
    }

    /// Hex color for `value`, interpolated between the two nearest stops.
    ///
    /// Values outside the range are clamped. A degenerate range maps every
    /// value to the lightest stop. Missing and `NaN` values get
    /// [`NO_DATA_COLOR`].
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn color(&self, value: Option<f64>) -> String {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            return NO_DATA_COLOR.to_string();
        };

        let span = self.max - self.min;
        if span <= 0.0 {
            return self.stops[0].to_string();
        }

        let t = ((value - self.min) / span).clamp(0.0, 1.0);
        let position = t * (self.stops.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = (lower + 1).min(self.stops.len() - 1);
        let fraction = position - lower as f64;

        let from = parse_hex(self.stops[lower]);
        let to = parse_hex(self.stops[upper]);
        let mix = |i: usize| {
            (f64::from(to[i]) - f64::from(from[i]))
                .mul_add(fraction, f64::from(from[i]))
                .round() as u8
        };
        format!("#{:02x}{:02x}{:02x}", mix(0), mix(1), mix(2))
    }
}
