//! TOML-based fleet configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::AbsenceModel;
use crate::presence::PresenceWindow;
use crate::prices::{PriceTiling, REFERENCE_DAILY_PROFILE};

/// Top-level planner configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`FleetConfig::from_toml_file`] or use
/// [`FleetConfig::baseline`] for the built-in default. The fleet size `N`
/// is the number of `[[vehicles]]` entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Planning horizon and price tiling.
    #[serde(default)]
    pub horizon: HorizonConfig,
    /// Cost weights and dynamics gain.
    #[serde(default)]
    pub cost: CostConfig,
    /// Fleet-wide power cap.
    #[serde(default)]
    pub grid: GridConfig,
    /// Price profile or explicit series.
    #[serde(default)]
    pub prices: PriceConfig,
    /// Solver limits.
    #[serde(default)]
    pub solver: SolverConfig,
    /// One entry per vehicle.
    #[serde(default = "default_vehicles")]
    pub vehicles: Vec<VehicleConfig>,
}

/// Planning horizon and price tiling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HorizonConfig {
    /// Number of control steps `T` (must be > 0).
    pub steps: usize,
    /// Steps per simulated day; the daily price profile is resampled onto this grid.
    pub steps_per_day: usize,
    /// Whether `steps` must be a whole number of days.
    pub tiling: PriceTiling,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            steps: 144,
            steps_per_day: 144,
            tiling: PriceTiling::Strict,
        }
    }
}

impl HorizonConfig {
    /// Duration of one step in hours.
    pub fn dt_hours(&self) -> f64 {
        24.0 / self.steps_per_day as f64
    }
}

/// Cost weights and dynamics gain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    /// State-deviation weight β (diagonal of `Q`).
    pub beta: f64,
    /// Control-influence gain γ (diagonal of `B`).
    pub gamma: f64,
    /// State transition of a vehicle while it is absent.
    pub absence: AbsenceModel,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            beta: 0.001,
            gamma: 1.0,
            absence: AbsenceModel::Hold,
        }
    }
}

/// Fleet-wide power cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum summed charging power per step (`u_tot_max`).
    pub fleet_max_power: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            fleet_max_power: 0.03,
        }
    }
}

/// Price profile or explicit series.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Hourly reference profile (24 values).
    pub daily_profile: Vec<f64>,
    /// Explicit `steps + 1` prices; overrides `daily_profile` when set.
    pub series: Option<Vec<f64>>,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            daily_profile: REFERENCE_DAILY_PROFILE.to_vec(),
            series: None,
        }
    }
}

/// Solver limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Interior-point iteration limit.
    pub max_iterations: u32,
    /// Wall-clock limit in seconds.
    pub time_limit_secs: f64,
    /// Absolute/relative gap and feasibility tolerance.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            time_limit_secs: 30.0,
            tolerance: 1e-8,
        }
    }
}

/// Per-vehicle parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleConfig {
    /// State of charge at step 0 (0.0–1.0).
    pub initial_soc: f64,
    /// Per-step charging power cap (`u_max`).
    pub max_power: f64,
    /// Connected windows; omitted means present for the whole horizon.
    pub presence: Option<Vec<PresenceWindow>>,
    /// Required state of charge at the end of the horizon.
    pub min_final_soc: Option<f64>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            initial_soc: 0.0,
            max_power: 0.1,
            presence: None,
            min_final_soc: None,
        }
    }
}

fn default_vehicles() -> Vec<VehicleConfig> {
    vec![VehicleConfig::default(); 4]
}

impl FleetConfig {
    /// Returns the baseline scenario: four empty vehicles over one day at
    /// 10-minute resolution, vehicle 1 arriving for the last 50 steps.
    pub fn baseline() -> Self {
        let mut vehicles = default_vehicles();
        vehicles[1].presence = Some(vec![PresenceWindow::new(94, 144)]);
        Self {
            horizon: HorizonConfig::default(),
            cost: CostConfig::default(),
            grid: GridConfig::default(),
            prices: PriceConfig::default(),
            solver: SolverConfig::default(),
            vehicles,
        }
    }

    /// Returns the early-departure preset: vehicle 1 leaves for the final
    /// 50 steps and must have reached 40% by then.
    pub fn early_departure() -> Self {
        let mut vehicles = default_vehicles();
        vehicles[1] = VehicleConfig {
            presence: Some(vec![PresenceWindow::new(0, 94)]),
            min_final_soc: Some(0.4),
            ..VehicleConfig::default()
        };
        Self {
            vehicles,
            ..Self::baseline()
        }
    }

    /// Returns the two-day preset: the daily profile tiled over 288 steps
    /// with a looser fleet cap.
    pub fn two_day() -> Self {
        Self {
            horizon: HorizonConfig {
                steps: 288,
                ..HorizonConfig::default()
            },
            grid: GridConfig {
                fleet_max_power: 0.05,
            },
            vehicles: vec![
                VehicleConfig {
                    initial_soc: 0.2,
                    ..VehicleConfig::default()
                },
                VehicleConfig::default(),
                VehicleConfig {
                    presence: Some(vec![
                        PresenceWindow::new(0, 48),
                        PresenceWindow::new(144, 192),
                    ]),
                    ..VehicleConfig::default()
                },
                VehicleConfig {
                    initial_soc: 0.5,
                    max_power: 0.05,
                    ..VehicleConfig::default()
                },
            ],
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "early_departure", "two_day"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "early_departure" => Ok(Self::early_departure()),
            "two_day" => Ok(Self::two_day()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Number of vehicles `N`.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Initial state of charge of every vehicle, in index order.
    pub fn initial_soc(&self) -> Vec<f64> {
        self.vehicles.iter().map(|v| v.initial_soc).collect()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let h = &self.horizon;

        if h.steps == 0 {
            errors.push(ConfigError::new("horizon.steps", "must be > 0"));
        }
        if h.steps_per_day == 0 {
            errors.push(ConfigError::new("horizon.steps_per_day", "must be > 0"));
        } else if self.prices.series.is_none()
            && h.tiling == PriceTiling::Strict
            && h.steps % h.steps_per_day != 0
        {
            errors.push(ConfigError::new(
                "horizon.steps",
                format!(
                    "must be a multiple of horizon.steps_per_day ({}) with tiling = \"strict\"",
                    h.steps_per_day
                ),
            ));
        }

        let c = &self.cost;
        if !c.beta.is_finite() || c.beta < 0.0 {
            errors.push(ConfigError::new("cost.beta", "must be finite and >= 0"));
        }
        if !c.gamma.is_finite() || c.gamma <= 0.0 {
            errors.push(ConfigError::new("cost.gamma", "must be finite and > 0"));
        }

        let g = &self.grid;
        if !g.fleet_max_power.is_finite() || g.fleet_max_power < 0.0 {
            errors.push(ConfigError::new(
                "grid.fleet_max_power",
                "must be finite and >= 0",
            ));
        }

        let p = &self.prices;
        match &p.series {
            Some(series) => {
                if series.len() != h.steps + 1 {
                    errors.push(ConfigError::new(
                        "prices.series",
                        format!("must have horizon.steps + 1 = {} entries", h.steps + 1),
                    ));
                }
                if series.iter().any(|x| !x.is_finite() || *x < 0.0) {
                    errors.push(ConfigError::new(
                        "prices.series",
                        "all prices must be finite and >= 0",
                    ));
                }
            }
            None => {
                if p.daily_profile.len() != 24 {
                    errors.push(ConfigError::new(
                        "prices.daily_profile",
                        format!("must have 24 hourly values, got {}", p.daily_profile.len()),
                    ));
                }
                if p.daily_profile.iter().any(|x| !x.is_finite() || *x < 0.0) {
                    errors.push(ConfigError::new(
                        "prices.daily_profile",
                        "all prices must be finite and >= 0",
                    ));
                }
            }
        }

        let s = &self.solver;
        if s.max_iterations == 0 {
            errors.push(ConfigError::new("solver.max_iterations", "must be > 0"));
        }
        if !s.time_limit_secs.is_finite() || s.time_limit_secs <= 0.0 {
            errors.push(ConfigError::new(
                "solver.time_limit_secs",
                "must be finite and > 0",
            ));
        } else if Duration::try_from_secs_f64(s.time_limit_secs).is_err() {
            errors.push(ConfigError::new(
                "solver.time_limit_secs",
                "too large to represent as a duration",
            ));
        }
        if !s.tolerance.is_finite() || s.tolerance <= 0.0 {
            errors.push(ConfigError::new("solver.tolerance", "must be finite and > 0"));
        }

        if self.vehicles.is_empty() {
            errors.push(ConfigError::new("vehicles", "must not be empty"));
        }
        for (i, v) in self.vehicles.iter().enumerate() {
            if !(0.0..=1.0).contains(&v.initial_soc) {
                errors.push(ConfigError::new(
                    format!("vehicles[{i}].initial_soc"),
                    "must be in [0.0, 1.0]",
                ));
            }
            if !v.max_power.is_finite() || v.max_power < 0.0 {
                errors.push(ConfigError::new(
                    format!("vehicles[{i}].max_power"),
                    "must be finite and >= 0",
                ));
            }
            if v.min_final_soc.is_some_and(|t| !(0.0..=1.0).contains(&t)) {
                errors.push(ConfigError::new(
                    format!("vehicles[{i}].min_final_soc"),
                    "must be in [0.0, 1.0]",
                ));
            }
            for (k, w) in v.presence.iter().flatten().enumerate() {
                if w.start >= w.end {
                    errors.push(ConfigError::new(
                        format!("vehicles[{i}].presence[{k}]"),
                        "start must be < end",
                    ));
                } else if w.end > h.steps {
                    errors.push(ConfigError::new(
                        format!("vehicles[{i}].presence[{k}]"),
                        "end must be <= horizon.steps",
                    ));
                }
            }
        }

        errors
    }
}
