//! Structural properties every optimal plan must satisfy.

mod common;

use common::EPS;
use ev_mpc::config::{FleetConfig, VehicleConfig};
use ev_mpc::model::AbsenceModel;
use ev_mpc::planner::{ChargingPlanner, plan_from_config};
use ev_mpc::presence::PresenceWindow;
use ev_mpc::prices::PriceTiling;
use rand::{Rng, SeedableRng, rngs::StdRng};

#[test]
fn all_present_trajectory_is_monotone() {
    let cfg = common::all_present_baseline();
    let plan = plan_from_config(&cfg).expect("baseline solves");

    for i in 0..plan.vehicles() {
        let row = plan.soc.row(i);
        for t in 0..plan.steps() {
            assert!(
                row[t + 1] >= row[t] - EPS,
                "vehicle {i} discharged at t={t}: {} -> {}",
                row[t],
                row[t + 1]
            );
        }
        assert!(row[plan.steps()] > 0.0, "vehicle {i} never charged");
    }
}

#[test]
fn baseline_respects_every_cap() {
    let cfg = FleetConfig::baseline();
    let plan = plan_from_config(&cfg).expect("baseline solves");
    let max_power: Vec<f64> = cfg.vehicles.iter().map(|v| v.max_power).collect();

    assert_eq!(plan.soc.vehicles(), 4);
    assert_eq!(plan.soc.len(), 145);
    common::assert_fleet_cap(&plan, cfg.grid.fleet_max_power);
    common::assert_power_bounds(&plan, &max_power);
    common::assert_soc_in_unit_interval(&plan);
}

#[test]
fn late_arrival_does_not_charge_before_arriving() {
    let plan = plan_from_config(&FleetConfig::baseline()).expect("baseline solves");
    for t in 0..94 {
        assert!(plan.power.get(1, t).abs() < EPS);
        assert!(plan.soc.get(1, t + 1).abs() < EPS);
    }
}

#[test]
fn vehicle_absent_whole_horizon_is_frozen() {
    let mut cfg = FleetConfig::baseline();
    cfg.vehicles[2] = VehicleConfig {
        initial_soc: 0.35,
        presence: Some(vec![]),
        ..VehicleConfig::default()
    };
    let plan = plan_from_config(&cfg).expect("solves");

    for t in 0..=plan.steps() {
        assert!(
            (plan.soc.get(2, t) - 0.35).abs() < EPS,
            "absent vehicle moved to {} at t={t}",
            plan.soc.get(2, t)
        );
    }
    for t in 0..plan.steps() {
        assert!(plan.power.get(2, t).abs() < EPS);
    }
}

#[test]
fn reset_absence_drops_departed_vehicle_to_zero() {
    let mut cfg = FleetConfig::early_departure();
    cfg.cost.absence = AbsenceModel::Reset;
    cfg.vehicles[1].min_final_soc = None;
    let plan = plan_from_config(&cfg).expect("solves");
    for t in 95..=plan.steps() {
        assert!(plan.soc.get(1, t).abs() < EPS);
    }
}

#[test]
fn solved_trajectory_follows_the_dynamics() {
    let cfg = FleetConfig::two_day();
    let planner = ChargingPlanner::from_config(&cfg).expect("valid");
    let x0 = cfg.initial_soc();
    let plan = planner.plan(&x0).expect("solves");

    let replay = planner.dynamics().simulate(&x0, &plan.power);
    for i in 0..plan.vehicles() {
        for t in 0..=plan.steps() {
            assert!(
                (replay.get(i, t) - plan.soc.get(i, t)).abs() < 1e-5,
                "vehicle {i} t={t}: replay {} vs plan {}",
                replay.get(i, t),
                plan.soc.get(i, t)
            );
        }
    }
}

#[test]
fn objective_matches_reported_trajectories() {
    let cfg = FleetConfig::baseline();
    let planner = ChargingPlanner::from_config(&cfg).expect("valid");
    let plan = planner.plan(&cfg.initial_soc()).expect("solves");
    let recomputed = planner.costs().evaluate(&plan.soc, &plan.power);
    assert!((plan.objective - recomputed).abs() < 1e-12);
}

#[test]
fn planning_from_a_supplied_state_never_discharges() {
    let cfg = common::all_present_baseline();
    let planner = ChargingPlanner::from_config(&cfg).expect("valid");
    let x0 = [0.0, 0.25, 0.5, 1.0];
    let plan = planner.plan(&x0).expect("solves");
    for (i, start) in x0.iter().enumerate() {
        assert!((plan.soc.get(i, 0) - start).abs() < EPS);
        assert!(plan.soc.get(i, 144) >= start - EPS);
    }
    for t in 0..plan.steps() {
        assert!(plan.power.get(3, t).abs() < EPS, "full vehicle charged at t={t}");
    }
}

fn random_config(rng: &mut StdRng) -> FleetConfig {
    let vehicles = rng.random_range(1..=4);
    let steps = rng.random_range(4..=16);
    let mut cfg = FleetConfig::baseline();
    cfg.horizon.steps = steps;
    cfg.horizon.steps_per_day = 24;
    cfg.horizon.tiling = PriceTiling::Wrap;
    cfg.cost.beta = rng.random_range(0.01..1.0);
    cfg.cost.gamma = rng.random_range(0.5..=1.0);
    cfg.grid.fleet_max_power = rng.random_range(0.01..0.5);
    cfg.prices.series = Some((0..=steps).map(|_| rng.random_range(0.0..10.0)).collect());
    cfg.vehicles = (0..vehicles)
        .map(|_| {
            let start = rng.random_range(0..steps);
            let end = rng.random_range(start + 1..=steps);
            VehicleConfig {
                initial_soc: rng.random_range(0.0..=1.0),
                max_power: rng.random_range(0.01..0.5),
                presence: if rng.random_bool(0.5) {
                    None
                } else {
                    Some(vec![PresenceWindow::new(start, end)])
                },
                min_final_soc: None,
            }
        })
        .collect();
    cfg
}

#[test]
fn random_scenarios_satisfy_constraints() {
    let mut rng = StdRng::seed_from_u64(7);
    for case in 0..20 {
        let cfg = random_config(&mut rng);
        let errors = cfg.validate();
        assert!(errors.is_empty(), "case {case} invalid: {errors:?}");

        let planner = ChargingPlanner::from_config(&cfg).expect("valid");
        let x0 = cfg.initial_soc();
        let plan = planner
            .plan(&x0)
            .unwrap_or_else(|e| panic!("case {case} failed: {e}"));
        let max_power: Vec<f64> = cfg.vehicles.iter().map(|v| v.max_power).collect();

        common::assert_fleet_cap(&plan, cfg.grid.fleet_max_power);
        common::assert_power_bounds(&plan, &max_power);
        common::assert_soc_in_unit_interval(&plan);

        let presence = planner.data().presence();
        for i in 0..plan.vehicles() {
            for t in 0..plan.steps() {
                if !presence.is_present(i, t) {
                    assert!(
                        plan.power.get(i, t).abs() < EPS,
                        "case {case}: absent vehicle {i} charged at t={t}"
                    );
                }
            }
        }
    }
}
