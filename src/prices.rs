//! Price series construction: daily profile resampling and horizon tiling.

use serde::Deserialize;

use crate::error::ConfigError;

/// Hourly reference price profile (arbitrary currency units).
pub const REFERENCE_DAILY_PROFILE: [f64; 24] = [
    1.0, 1.0, 1.0, 1.0, 8.0, 9.0, 8.0, 8.0, 6.0, 5.0, 4.0, 4.0, 5.0, 5.0, 6.0, 6.0, 7.0, 10.0,
    12.0, 7.0, 5.0, 3.0, 2.0, 1.0,
];

/// Price appended after the last step. Only read as `price[T]` by the cost
/// of the final control step.
pub const TERMINAL_PRICE: f64 = 0.0;

/// How a resampled day is repeated over a horizon that is not a whole
/// number of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTiling {
    /// The horizon must be a multiple of `steps_per_day`.
    #[default]
    Strict,
    /// The final partial day is the prefix of the resampled day.
    Wrap,
}

/// Ordered prices for steps `0..=T`; the last entry is [`TERMINAL_PRICE`]
/// unless an explicit series was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    values: Vec<f64>,
}

impl PriceSeries {
    /// Resamples `profile` onto one day of `steps_per_day` points, repeats it
    /// over `horizon` steps, and appends the terminal price.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the profile is too short or contains a
    /// negative/non-finite price, if `steps_per_day` is zero, or if
    /// `tiling` is [`PriceTiling::Strict`] and `horizon` is not a multiple
    /// of `steps_per_day`.
    pub fn from_daily_profile(
        profile: &[f64],
        horizon: usize,
        steps_per_day: usize,
        tiling: PriceTiling,
    ) -> Result<Self, ConfigError> {
        if profile.len() < 2 {
            return Err(ConfigError::new(
                "prices.daily_profile",
                "needs at least 2 points",
            ));
        }
        check_prices("prices.daily_profile", profile)?;
        if steps_per_day == 0 {
            return Err(ConfigError::new("horizon.steps_per_day", "must be > 0"));
        }
        if tiling == PriceTiling::Strict && horizon % steps_per_day != 0 {
            return Err(ConfigError::new(
                "horizon.steps",
                format!(
                    "{horizon} is not a multiple of steps_per_day ({steps_per_day}); \
                     use tiling = \"wrap\" to allow a partial final day"
                ),
            ));
        }

        let day = resample_linear(profile, steps_per_day);
        let mut values = Vec::with_capacity(horizon + 1);
        while values.len() < horizon {
            let take = (horizon - values.len()).min(day.len());
            values.extend_from_slice(&day[..take]);
        }
        values.push(TERMINAL_PRICE);
        Ok(Self { values })
    }

    /// Uses `values` verbatim as the `T + 1` prices of a `horizon`-step plan.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the length is not `horizon + 1` or any
    /// price is negative or non-finite.
    pub fn from_values(values: Vec<f64>, horizon: usize) -> Result<Self, ConfigError> {
        if values.len() != horizon + 1 {
            return Err(ConfigError::new(
                "prices.series",
                format!(
                    "expected {} entries (horizon + 1), got {}",
                    horizon + 1,
                    values.len()
                ),
            ));
        }
        check_prices("prices.series", &values)?;
        Ok(Self { values })
    }

    /// Number of control steps `T` covered by this series.
    pub fn horizon(&self) -> usize {
        self.values.len() - 1
    }

    /// Price effective at step `t` (`0..=T`).
    pub fn at(&self, t: usize) -> f64 {
        self.values[t]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Linear interpolation of `profile` (knots at `0, 1, .., len - 1`) onto
/// `points` evenly spaced samples covering `[0, len - 1]` inclusive.
pub fn resample_linear(profile: &[f64], points: usize) -> Vec<f64> {
    match (profile.len(), points) {
        (0, _) | (_, 0) => return Vec::new(),
        (1, _) | (_, 1) => return vec![profile[0]; points],
        _ => {}
    }

    let last_knot = (profile.len() - 1) as f64;
    let denom = (points - 1) as f64;
    (0..points)
        .map(|k| {
            let x = k as f64 * last_knot / denom;
            let i = (x.floor() as usize).min(profile.len() - 2);
            let frac = x - i as f64;
            profile[i] + frac * (profile[i + 1] - profile[i])
        })
        .collect()
}

fn check_prices(field: &str, prices: &[f64]) -> Result<(), ConfigError> {
    match prices.iter().position(|p| !p.is_finite() || *p < 0.0) {
        Some(i) => Err(ConfigError::new(
            format!("{field}[{i}]"),
            format!("must be finite and >= 0, got {}", prices[i]),
        )),
        None => Ok(()),
    }
}
