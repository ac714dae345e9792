//! Top-level planning entry point: scenario data, model, and QP solve in one call chain.

use std::time::Duration;

use tracing::info;

use crate::config::FleetConfig;
use crate::error::PlanError;
use crate::model::{CostWeights, Dynamics};
use crate::prices::PriceSeries;
use crate::scenario::ScenarioData;
use crate::solver::{ChargeLimits, ChargingQp, SolverSettings};
use crate::types::VehicleSeries;

/// Optimal open-loop charging plan over the full horizon.
#[derive(Debug, Clone)]
pub struct ChargingPlan {
    /// State of charge, `N x (T + 1)`.
    pub soc: VehicleSeries<f64>,
    /// Charging power, `N x T`.
    pub power: VehicleSeries<f64>,
    /// Price series the plan was optimized against (`T + 1`).
    pub prices: PriceSeries,
    /// Objective value including the constant state-deviation terms.
    pub objective: f64,
    pub iterations: u32,
    pub solve_time: Duration,
}

impl ChargingPlan {
    pub fn vehicles(&self) -> usize {
        self.soc.vehicles()
    }

    /// Number of control steps `T`.
    pub fn steps(&self) -> usize {
        self.power.len()
    }

    /// Summed charging power of the fleet at `step`.
    pub fn fleet_power(&self, step: usize) -> f64 {
        self.power.column_sum(step)
    }
}

/// Built model for one configuration; plans from any initial state.
///
/// Everything is derived from the configuration at construction and never
/// mutated, so one planner can be reused for several initial states.
#[derive(Debug, Clone)]
pub struct ChargingPlanner {
    data: ScenarioData,
    dynamics: Dynamics,
    costs: CostWeights,
    limits: ChargeLimits,
    settings: SolverSettings,
}

impl ChargingPlanner {
    /// Validates `cfg` and builds scenario data and model matrices.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Configuration`] listing every validation error.
    pub fn from_config(cfg: &FleetConfig) -> Result<Self, PlanError> {
        let errors = cfg.validate();
        if !errors.is_empty() {
            return Err(PlanError::Configuration(errors));
        }

        let data = ScenarioData::from_config(cfg)?;
        let dynamics = Dynamics::build(data.presence(), cfg.cost.gamma, cfg.cost.absence);
        let costs = CostWeights::build(data.prices(), data.presence(), cfg.cost.beta);
        let limits = ChargeLimits {
            max_power: cfg.vehicles.iter().map(|v| v.max_power).collect(),
            fleet_max_power: cfg.grid.fleet_max_power,
            min_final_soc: cfg.vehicles.iter().map(|v| v.min_final_soc).collect(),
        };

        Ok(Self {
            data,
            dynamics,
            costs,
            limits,
            settings: SolverSettings::from(&cfg.solver),
        })
    }

    /// Solves for the optimal plan starting from `initial_soc` (length `N`,
    /// values in `[0, 1]`).
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Configuration`] for a bad initial state (the solver
    /// is not invoked), otherwise the solver's typed failure.
    pub fn plan(&self, initial_soc: &[f64]) -> Result<ChargingPlan, PlanError> {
        info!(
            vehicles = self.data.vehicles(),
            steps = self.data.horizon(),
            "planning fleet charging"
        );
        let qp = ChargingQp::new(
            &self.dynamics,
            &self.costs,
            self.data.presence(),
            &self.limits,
        );
        let solution = qp.solve(initial_soc, &self.settings)?;
        let objective = self.costs.evaluate(&solution.soc, &solution.power);
        info!(objective, "plan ready");

        Ok(ChargingPlan {
            soc: solution.soc,
            power: solution.power,
            prices: self.data.prices().clone(),
            objective,
            iterations: solution.iterations,
            solve_time: solution.solve_time,
        })
    }

    pub fn data(&self) -> &ScenarioData {
        &self.data
    }

    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    pub fn costs(&self) -> &CostWeights {
        &self.costs
    }
}

/// Builds a planner from `cfg` and plans from the configured initial states.
///
/// # Errors
///
/// See [`ChargingPlanner::from_config`] and [`ChargingPlanner::plan`].
pub fn plan_from_config(cfg: &FleetConfig) -> Result<ChargingPlan, PlanError> {
    ChargingPlanner::from_config(cfg)?.plan(&cfg.initial_soc())
}
