//! Post-hoc summary of a charging plan.

use std::fmt;
use std::time::Duration;

use crate::planner::ChargingPlan;

/// Slack allowed on cap checks for interior-point solutions.
pub const CAP_TOLERANCE: f64 = 1e-6;

/// Aggregate indicators derived from a complete plan.
///
/// Computed post-hoc from the plan's trajectories so reported numbers always
/// agree with the data that would be exported.
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Optimal objective value.
    pub objective: f64,
    /// Total charging power applied over the horizon (sum of `u`).
    pub energy_delivered: f64,
    /// Energy cost `sum_t price[t] * sum_i u[t]_i`.
    pub energy_cost: f64,
    /// Largest summed fleet power at any step.
    pub peak_fleet_power: f64,
    /// Steps where the fleet power exceeds `fleet_max_power` beyond tolerance.
    pub fleet_cap_violations: usize,
    /// State of charge of each vehicle at step `T`.
    pub final_soc: Vec<f64>,
    pub iterations: u32,
    pub solve_time: Duration,
}

impl PlanReport {
    /// Computes every indicator from `plan` checked against `fleet_max_power`.
    pub fn from_plan(plan: &ChargingPlan, fleet_max_power: f64) -> Self {
        let mut energy_delivered = 0.0;
        let mut energy_cost = 0.0;
        let mut peak = 0.0_f64;
        let mut violations = 0;

        for t in 0..plan.steps() {
            let fleet = plan.fleet_power(t);
            energy_delivered += fleet;
            energy_cost += plan.prices.at(t) * fleet;
            peak = peak.max(fleet);
            if fleet > fleet_max_power + CAP_TOLERANCE {
                violations += 1;
            }
        }

        let last = plan.steps();
        Self {
            objective: plan.objective,
            energy_delivered,
            energy_cost,
            peak_fleet_power: peak,
            fleet_cap_violations: violations,
            final_soc: (0..plan.vehicles()).map(|i| plan.soc.get(i, last)).collect(),
            iterations: plan.iterations,
            solve_time: plan.solve_time,
        }
    }

    /// Mean state of charge across the fleet at step `T`.
    pub fn mean_final_soc(&self) -> f64 {
        if self.final_soc.is_empty() {
            return 0.0;
        }
        self.final_soc.iter().sum::<f64>() / self.final_soc.len() as f64
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Plan Report ---")?;
        writeln!(f, "Objective:             {:.6}", self.objective)?;
        writeln!(f, "Energy delivered:      {:.4}", self.energy_delivered)?;
        writeln!(f, "Energy cost:           {:.4}", self.energy_cost)?;
        writeln!(f, "Peak fleet power:      {:.4}", self.peak_fleet_power)?;
        writeln!(f, "Fleet cap violations:  {}", self.fleet_cap_violations)?;
        for (i, soc) in self.final_soc.iter().enumerate() {
            writeln!(f, "Final SOC vehicle {i}:   {:.1}%", soc * 100.0)?;
        }
        writeln!(f, "Mean final SOC:        {:.1}%", self.mean_final_soc() * 100.0)?;
        write!(
            f,
            "Solver:                {} iterations in {:.1} ms",
            self.iterations,
            self.solve_time.as_secs_f64() * 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PriceSeries;
    use crate::types::VehicleSeries;

    fn make_plan() -> ChargingPlan {
        ChargingPlan {
            soc: VehicleSeries::from_rows(vec![vec![0.0, 0.5, 0.7], vec![0.2, 0.2, 0.5]])
                .expect("rectangular"),
            power: VehicleSeries::from_rows(vec![vec![0.5, 0.2], vec![0.0, 0.3]])
                .expect("rectangular"),
            prices: PriceSeries::from_values(vec![2.0, 4.0, 0.0], 2).expect("valid"),
            objective: 1.25,
            iterations: 9,
            solve_time: Duration::from_millis(3),
        }
    }

    #[test]
    fn aggregates_fleet_power() {
        let r = PlanReport::from_plan(&make_plan(), 0.5);
        assert!((r.energy_delivered - 1.0).abs() < 1e-12);
        // 2.0 * 0.5 + 4.0 * 0.5
        assert!((r.energy_cost - 3.0).abs() < 1e-12);
        assert!((r.peak_fleet_power - 0.5).abs() < 1e-12);
        assert_eq!(r.fleet_cap_violations, 0);
        assert_eq!(r.final_soc, vec![0.7, 0.5]);
        assert!((r.mean_final_soc() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn counts_cap_violations() {
        let r = PlanReport::from_plan(&make_plan(), 0.4);
        assert_eq!(r.fleet_cap_violations, 2);
    }

    #[test]
    fn display_lists_every_vehicle() {
        let s = PlanReport::from_plan(&make_plan(), 0.5).to_string();
        assert!(s.contains("Final SOC vehicle 0"));
        assert!(s.contains("Final SOC vehicle 1"));
        assert!(s.contains("Mean final SOC:        60.0%"));
    }
}
