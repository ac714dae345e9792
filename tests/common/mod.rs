//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use ev_mpc::config::{FleetConfig, VehicleConfig};
use ev_mpc::planner::ChargingPlan;

/// Numerical slack for interior-point solutions.
pub const EPS: f64 = 1e-6;

/// Baseline preset with every vehicle present for the whole horizon.
pub fn all_present_baseline() -> FleetConfig {
    let mut cfg = FleetConfig::baseline();
    for v in &mut cfg.vehicles {
        v.presence = None;
    }
    cfg
}

/// One vehicle, explicit prices, `beta = gamma = 1`, caps of 1.
///
/// Horizon is `prices.len() - 1` steps.
pub fn single_vehicle(prices: Vec<f64>) -> FleetConfig {
    let steps = prices.len() - 1;
    let mut cfg = FleetConfig::baseline();
    cfg.horizon.steps = steps;
    cfg.horizon.steps_per_day = steps;
    cfg.cost.beta = 1.0;
    cfg.cost.gamma = 1.0;
    cfg.grid.fleet_max_power = 1.0;
    cfg.prices.series = Some(prices);
    cfg.vehicles = vec![VehicleConfig {
        initial_soc: 0.0,
        max_power: 1.0,
        presence: None,
        min_final_soc: None,
    }];
    cfg
}

/// Asserts that summed fleet power stays within `cap` at every step.
pub fn assert_fleet_cap(plan: &ChargingPlan, cap: f64) {
    for t in 0..plan.steps() {
        let fleet = plan.fleet_power(t);
        assert!(
            fleet <= cap + EPS,
            "fleet power {fleet} exceeds cap {cap} at t={t}"
        );
    }
}

/// Asserts `0 <= u[t]_i <= min(u_max_i, 1 - x[t]_i)` at every step.
pub fn assert_power_bounds(plan: &ChargingPlan, max_power: &[f64]) {
    for i in 0..plan.vehicles() {
        for t in 0..plan.steps() {
            let u = plan.power.get(i, t);
            let headroom = 1.0 - plan.soc.get(i, t);
            assert!(u >= -EPS, "negative power {u} for vehicle {i} at t={t}");
            assert!(
                u <= max_power[i].min(headroom) + EPS,
                "power {u} for vehicle {i} at t={t} exceeds min(u_max={}, 1-x={headroom})",
                max_power[i]
            );
        }
    }
}

/// Asserts every state stays within `[0, 1]`.
pub fn assert_soc_in_unit_interval(plan: &ChargingPlan) {
    for i in 0..plan.vehicles() {
        for (t, x) in plan.soc.row(i).iter().enumerate() {
            assert!(
                (-EPS..=1.0 + EPS).contains(x),
                "soc {x} out of range for vehicle {i} at t={t}"
            );
        }
    }
}
