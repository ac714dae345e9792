//! End-to-end planning scenarios with known outcomes.

mod common;

use common::EPS;
use ev_mpc::config::{FleetConfig, VehicleConfig};
use ev_mpc::error::PlanError;
use ev_mpc::planner::{ChargingPlanner, plan_from_config};
use ev_mpc::prices::PriceTiling;
use ev_mpc::report::PlanReport;

fn assert_soc_row(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (t, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-4, "t={t}: got {a}, expected {e}");
    }
}

#[test]
fn single_vehicle_unit_prices() {
    let plan = plan_from_config(&common::single_vehicle(vec![1.0, 1.0, 1.0])).expect("solves");
    assert_soc_row(plan.soc.row(0), &[0.0, 0.6, 0.8]);
    assert_soc_row(plan.power.row(0), &[0.6, 0.2]);
    assert!((plan.objective - 0.6).abs() < 1e-4);
}

#[test]
fn free_energy_fills_the_battery_immediately() {
    let plan = plan_from_config(&common::single_vehicle(vec![0.0, 0.0, 0.0])).expect("solves");
    assert_soc_row(plan.soc.row(0), &[0.0, 1.0, 1.0]);
    assert!(plan.power.get(0, 1).abs() < 1e-4);
}

#[test]
fn zero_fleet_cap_forbids_charging() {
    let mut cfg = common::single_vehicle(vec![1.0, 1.0, 1.0]);
    cfg.grid.fleet_max_power = 0.0;
    let plan = plan_from_config(&cfg).expect("solves");
    assert_soc_row(plan.soc.row(0), &[0.0, 0.0, 0.0]);

    let report = PlanReport::from_plan(&plan, cfg.grid.fleet_max_power);
    assert_eq!(report.fleet_cap_violations, 0);
    assert!(report.energy_delivered.abs() < EPS);
}

#[test]
fn out_of_range_initial_state_is_rejected_before_solving() {
    let cfg = common::single_vehicle(vec![1.0, 1.0, 1.0]);
    let planner = ChargingPlanner::from_config(&cfg).expect("valid");

    let err = planner.plan(&[1.5]).expect_err("x0 > 1");
    assert!(matches!(err, PlanError::Configuration(_)));
    assert_eq!(err.config_errors().len(), 1);

    let err = planner.plan(&[0.1, 0.2]).expect_err("wrong length");
    assert!(matches!(err, PlanError::Configuration(_)));
}

#[test]
fn configured_out_of_range_initial_state_fails_validation() {
    let mut cfg = FleetConfig::baseline();
    cfg.vehicles[0].initial_soc = -0.1;
    let err = plan_from_config(&cfg).expect_err("invalid");
    assert!(
        err.config_errors()
            .iter()
            .any(|e| e.field.contains("initial_soc"))
    );
}

#[test]
fn unreachable_final_soc_is_infeasible() {
    let mut cfg = common::single_vehicle(vec![1.0, 1.0, 1.0]);
    cfg.vehicles[0].max_power = 0.1;
    cfg.vehicles[0].min_final_soc = Some(0.9);
    let err = plan_from_config(&cfg).expect_err("cannot reach 0.9 in two steps");
    assert!(
        matches!(err, PlanError::InfeasibleProblem { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn iteration_budget_exhaustion_times_out() {
    let mut cfg = FleetConfig::baseline();
    cfg.solver.max_iterations = 1;
    let err = plan_from_config(&cfg).expect_err("one iteration is never enough");
    assert!(
        matches!(err, PlanError::SolverTimeout { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn every_preset_solves_within_caps() {
    for name in FleetConfig::PRESETS {
        let cfg = FleetConfig::from_preset(name).expect("known preset");
        let plan = plan_from_config(&cfg).unwrap_or_else(|e| panic!("{name}: {e}"));
        let report = PlanReport::from_plan(&plan, cfg.grid.fleet_max_power);
        assert_eq!(report.fleet_cap_violations, 0, "{name}");
        assert!(report.peak_fleet_power <= cfg.grid.fleet_max_power + EPS, "{name}");
        assert_eq!(plan.steps(), cfg.horizon.steps, "{name}");
    }
}

#[test]
fn early_departure_meets_its_final_requirement() {
    let cfg = FleetConfig::early_departure();
    let plan = plan_from_config(&cfg).expect("solves");
    let before_leaving = plan.soc.get(1, 94);
    assert!(before_leaving >= 0.4 - EPS, "left with {before_leaving}");
    assert!((plan.soc.get(1, 144) - before_leaving).abs() < EPS);
}

#[test]
fn strict_tiling_rejects_partial_day() {
    let mut cfg = FleetConfig::baseline();
    cfg.horizon.steps = 100;
    let err = ChargingPlanner::from_config(&cfg).expect_err("100 is not a multiple of 144");
    assert!(
        err.config_errors()
            .iter()
            .any(|e| e.field == "horizon.steps")
    );

    cfg.horizon.tiling = PriceTiling::Wrap;
    cfg.vehicles[1].presence = None;
    let plan = plan_from_config(&cfg).expect("wrap accepts a partial day");
    assert_eq!(plan.prices.as_slice().len(), 101);
}

#[test]
fn explicit_series_overrides_profile() {
    let mut cfg = common::single_vehicle(vec![5.0, 0.0, 5.0, 0.0]);
    cfg.vehicles[0].max_power = 0.5;
    let plan = plan_from_config(&cfg).expect("solves");
    assert_eq!(plan.prices.as_slice(), &[5.0, 0.0, 5.0, 0.0]);
    // R[t] = price[t + 1]^2, so steps 0 and 2 are free and step 1 is dear.
    assert!(plan.power.get(0, 1) < plan.power.get(0, 0));
    assert!(plan.power.get(0, 1) < 0.05);
}

#[test]
fn toml_scenario_round_trips_into_a_plan() {
    let cfg = FleetConfig::from_toml_str(
        r#"
        [horizon]
        steps = 4
        steps_per_day = 4

        [cost]
        beta = 1.0

        [grid]
        fleet_max_power = 0.2

        [prices]
        series = [1.0, 2.0, 3.0, 4.0, 5.0]

        [[vehicles]]
        initial_soc = 0.1
        max_power = 0.15

        [[vehicles]]
        presence = [{ start = 2, end = 4 }]
        "#,
    )
    .expect("parses");
    assert_eq!(cfg.vehicle_count(), 2);

    let plan = plan_from_config(&cfg).expect("solves");
    common::assert_fleet_cap(&plan, 0.2);
    common::assert_power_bounds(&plan, &[0.15, VehicleConfig::default().max_power]);
    assert!(plan.power.get(1, 0).abs() < EPS);
    assert!(plan.power.get(1, 1).abs() < EPS);
}

#[test]
fn unrepresentable_time_limit_is_a_configuration_error() {
    let mut cfg = FleetConfig::baseline();
    cfg.solver.time_limit_secs = 1e20;
    let err = plan_from_config(&cfg).expect_err("time limit overflows a duration");
    assert!(
        err.config_errors()
            .iter()
            .any(|e| e.field == "solver.time_limit_secs"),
        "unexpected error: {err}"
    );
}
