//! Model-predictive charging schedule for an electric vehicle fleet.
//!
//! One open-loop solve over the full horizon: scenario data (prices and
//! presence) feeds a diagonal time-varying model, which is assembled into a
//! convex QP and solved to optimality or a typed failure.

pub mod config;
pub mod error;
/// Trajectory export for external visualization.
pub mod io;
/// Dynamics and cost matrices.
pub mod model;
pub mod planner;
pub mod presence;
pub mod prices;
pub mod report;
pub mod scenario;
/// Charging QP assembly and solve.
pub mod solver;
pub mod telemetry;
pub mod types;

pub use config::FleetConfig;
pub use error::{ConfigError, PlanError, SolverFailure};
pub use planner::{ChargingPlan, ChargingPlanner, plan_from_config};
