//! Scenario data: the price and presence series for one planning horizon.

use crate::config::FleetConfig;
use crate::error::ConfigError;
use crate::presence::PresenceSchedule;
use crate::prices::PriceSeries;

/// Prices (`T + 1`) and presence flags (`N x T`) for one horizon.
#[derive(Debug, Clone)]
pub struct ScenarioData {
    prices: PriceSeries,
    presence: PresenceSchedule,
}

impl ScenarioData {
    /// Pairs a price series with a presence schedule.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the two cover different horizons.
    pub fn new(prices: PriceSeries, presence: PresenceSchedule) -> Result<Self, ConfigError> {
        if prices.horizon() != presence.horizon() {
            return Err(ConfigError::new(
                "horizon.steps",
                format!(
                    "price series covers {} steps but presence covers {}",
                    prices.horizon(),
                    presence.horizon()
                ),
            ));
        }
        Ok(Self { prices, presence })
    }

    /// Builds both series from configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` hit while building prices or presence.
    pub fn from_config(cfg: &FleetConfig) -> Result<Self, ConfigError> {
        let steps = cfg.horizon.steps;
        let prices = match &cfg.prices.series {
            Some(series) => PriceSeries::from_values(series.clone(), steps)?,
            None => PriceSeries::from_daily_profile(
                &cfg.prices.daily_profile,
                steps,
                cfg.horizon.steps_per_day,
                cfg.horizon.tiling,
            )?,
        };
        let windows: Vec<_> = cfg.vehicles.iter().map(|v| v.presence.clone()).collect();
        let presence = PresenceSchedule::from_windows(steps, &windows)?;
        Self::new(prices, presence)
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn presence(&self) -> &PresenceSchedule {
        &self.presence
    }

    pub fn horizon(&self) -> usize {
        self.presence.horizon()
    }

    pub fn vehicles(&self) -> usize {
        self.presence.vehicles()
    }
}
