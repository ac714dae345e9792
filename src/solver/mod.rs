//! QP solver adapter.
//!
//! Assembles the finite-horizon charging problem
//!
//! ```text
//! minimize    sum_t (1 - x[t+1])' Q[t] (1 - x[t+1]) + u[t]' R[t] u[t]
//! subject to  x[t+1] = A[t] x[t] + B[t] u[t]
//!             0 <= u[t] <= 1 - x[t],  u[t] <= u_max,  sum_i u[t]_i <= u_tot_max
//!             0 <= x[t+1] <= 1,  x[T] >= min_final_soc,  x[0] = x0
//! ```
//!
//! as a sparse conic program and solves it with Clarabel. Every matrix is
//! diagonal, so each vehicle contributes a handful of scalar rows per step and
//! the fleet-wide power cap is the only row coupling vehicles.

mod layout;
mod sparse;

use std::time::{Duration, Instant};

use clarabel::algebra::CscMatrix;
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::{ConfigError, PlanError, SolverFailure};
use crate::model::{CostWeights, Dynamics};
use crate::presence::PresenceSchedule;
use crate::types::VehicleSeries;

use layout::VariableLayout;
use sparse::{RowBlock, TripletMatrix, stack_rows};

/// Power caps and charging requirements.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeLimits {
    /// Per-vehicle per-step power cap (`u_max`).
    pub max_power: Vec<f64>,
    /// Fleet-wide per-step power cap (`u_tot_max`).
    pub fleet_max_power: f64,
    /// Optional lower bound on each vehicle's state of charge at step `T`.
    pub min_final_soc: Vec<Option<f64>>,
}

impl ChargeLimits {
    /// Same cap for every vehicle and no final-SOC requirements.
    pub fn uniform(vehicles: usize, max_power: f64, fleet_max_power: f64) -> Self {
        Self {
            max_power: vec![max_power; vehicles],
            fleet_max_power,
            min_final_soc: vec![None; vehicles],
        }
    }
}

/// Iteration and wall-clock limits for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub max_iterations: u32,
    pub time_limit: Duration,
    /// Gap and feasibility tolerance.
    pub tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self::from(&SolverConfig::default())
    }
}

impl From<&SolverConfig> for SolverSettings {
    fn from(cfg: &SolverConfig) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            // validated configs always convert; anything else runs unbounded
            time_limit: Duration::try_from_secs_f64(cfg.time_limit_secs)
                .unwrap_or(Duration::MAX),
            tolerance: cfg.tolerance,
        }
    }
}

/// Optimal trajectories returned by a successful solve.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// State of charge, `N x (T + 1)`, with `x[0]` equal to the initial state.
    pub soc: VehicleSeries<f64>,
    /// Charging power, `N x T`.
    pub power: VehicleSeries<f64>,
    pub iterations: u32,
    pub solve_time: Duration,
}

/// The charging QP for one model, ready to be solved from any initial state.
#[derive(Debug, Clone, Copy)]
pub struct ChargingQp<'a> {
    dynamics: &'a Dynamics,
    costs: &'a CostWeights,
    presence: &'a PresenceSchedule,
    limits: &'a ChargeLimits,
}

/// Assembled conic form: `min 1/2 z'Pz + q'z  s.t.  Az + s = b`, with the
/// first `equalities` rows of `s` in the zero cone and the rest nonnegative.
struct ConicForm {
    p: CscMatrix<f64>,
    q: Vec<f64>,
    a: CscMatrix<f64>,
    b: Vec<f64>,
    equalities: usize,
    inequalities: usize,
}

impl<'a> ChargingQp<'a> {
    /// # Panics
    ///
    /// Panics if the model components disagree on fleet size or horizon.
    pub fn new(
        dynamics: &'a Dynamics,
        costs: &'a CostWeights,
        presence: &'a PresenceSchedule,
        limits: &'a ChargeLimits,
    ) -> Self {
        assert_eq!(dynamics.vehicles(), costs.vehicles(), "fleet size");
        assert_eq!(dynamics.vehicles(), presence.vehicles(), "fleet size");
        assert_eq!(dynamics.vehicles(), limits.max_power.len(), "fleet size");
        assert_eq!(dynamics.vehicles(), limits.min_final_soc.len(), "fleet size");
        assert_eq!(dynamics.horizon(), costs.horizon(), "horizon");
        assert_eq!(dynamics.horizon(), presence.horizon(), "horizon");
        Self {
            dynamics,
            costs,
            presence,
            limits,
        }
    }

    fn vehicles(&self) -> usize {
        self.dynamics.vehicles()
    }

    fn steps(&self) -> usize {
        self.dynamics.horizon()
    }

    /// Solves the QP from `initial_soc` and returns the optimal trajectories.
    ///
    /// # Errors
    ///
    /// - [`PlanError::Configuration`] if `initial_soc` has the wrong length
    ///   or leaves `[0, 1]`; the solver is not invoked.
    /// - [`PlanError::InfeasibleProblem`], [`PlanError::SolverFailure`] or
    ///   [`PlanError::SolverTimeout`] for any status other than solved.
    pub fn solve(
        &self,
        initial_soc: &[f64],
        settings: &SolverSettings,
    ) -> Result<QpSolution, PlanError> {
        check_initial_soc(initial_soc, self.vehicles())?;

        let layout = VariableLayout::new(self.vehicles(), self.steps());
        let form = self.assemble(&layout, initial_soc);
        debug!(
            variables = layout.len(),
            equalities = form.equalities,
            inequalities = form.inequalities,
            p_nnz = form.p.nzval.len(),
            a_nnz = form.a.nzval.len(),
            "assembled charging QP"
        );

        let (z, iterations, solve_time) = run_clarabel(&form, settings)?;
        info!(
            iterations,
            elapsed_ms = solve_time.as_millis() as u64,
            "charging QP solved"
        );

        let (soc, power) = self.extract(&layout, initial_soc, &z);
        Ok(QpSolution {
            soc,
            power,
            iterations,
            solve_time,
        })
    }

    /// Whether `u[step]_vehicle` is forced to zero: the vehicle is absent,
    /// a cap is zero, or it starts full.
    fn power_pinned(&self, vehicle: usize, step: usize, initial_soc: &[f64]) -> bool {
        !self.presence.is_present(vehicle, step)
            || self.limits.max_power[vehicle] == 0.0
            || self.limits.fleet_max_power == 0.0
            || (step == 0 && initial_soc[vehicle] >= 1.0)
    }

    fn assemble(&self, layout: &VariableLayout, x0: &[f64]) -> ConicForm {
        let n = layout.len();
        let (vehicles, steps) = (self.vehicles(), self.steps());

        let mut p = TripletMatrix::new(n, n);
        let mut q = vec![0.0; n];
        for i in 0..vehicles {
            for t in 0..steps {
                let qw = self.costs.state(i, t);
                let x = layout.soc(i, t + 1);
                // (1 - x)^2 * qw = qw x^2 - 2 qw x + qw; constant dropped
                p.push(x, x, 2.0 * qw);
                q[x] = -2.0 * qw;
                let u = layout.power(i, t);
                p.push(u, u, 2.0 * self.costs.control(i, t));
            }
        }

        let mut eq = RowBlock::default();
        let mut ineq = RowBlock::default();
        for t in 0..steps {
            let mut fleet_row = Vec::with_capacity(vehicles);
            for i in 0..vehicles {
                let a = self.dynamics.transition(i, t);
                let b = self.dynamics.influence(i, t);
                let x_next = layout.soc(i, t + 1);
                let u = layout.power(i, t);

                // x[t+1] - A x[t] - B u[t] = 0, with x[0] moved to the right-hand side
                if t == 0 {
                    eq.push_row(vec![(x_next, 1.0), (u, -b)], a * x0[i]);
                } else {
                    let x = layout.soc(i, t);
                    eq.push_row(vec![(x_next, 1.0), (x, -a), (u, -b)], 0.0);
                }

                if self.power_pinned(i, t, x0) {
                    eq.push_row(vec![(u, 1.0)], 0.0);
                } else {
                    ineq.push_row(vec![(u, -1.0)], 0.0);
                    if t == 0 {
                        ineq.push_row(vec![(u, 1.0)], 1.0 - x0[i]);
                    } else {
                        ineq.push_row(vec![(u, 1.0), (layout.soc(i, t), 1.0)], 1.0);
                    }
                    ineq.push_row(vec![(u, 1.0)], self.limits.max_power[i]);
                    fleet_row.push((u, 1.0));
                }

                ineq.push_row(vec![(x_next, 1.0)], 1.0);
                ineq.push_row(vec![(x_next, -1.0)], 0.0);
            }
            if !fleet_row.is_empty() {
                ineq.push_row(fleet_row, self.limits.fleet_max_power);
            }
        }
        if steps > 0 {
            for (i, target) in self.limits.min_final_soc.iter().enumerate() {
                if let Some(target) = target {
                    ineq.push_row(vec![(layout.soc(i, steps), -1.0)], -target);
                }
            }
        }

        let (a, b) = stack_rows(&[&eq, &ineq], n);
        ConicForm {
            p: p.into_csc(),
            q,
            a,
            b,
            equalities: eq.len(),
            inequalities: ineq.len(),
        }
    }

    fn extract(
        &self,
        layout: &VariableLayout,
        x0: &[f64],
        z: &[f64],
    ) -> (VehicleSeries<f64>, VehicleSeries<f64>) {
        let (vehicles, steps) = (self.vehicles(), self.steps());
        let mut soc = VehicleSeries::filled(vehicles, steps + 1, 0.0);
        let mut power = VehicleSeries::filled(vehicles, steps, 0.0);
        for i in 0..vehicles {
            soc.set(i, 0, x0[i]);
            for t in 0..steps {
                soc.set(i, t + 1, z[layout.soc(i, t + 1)]);
                power.set(i, t, z[layout.power(i, t)]);
            }
        }
        (soc, power)
    }
}

fn check_initial_soc(initial_soc: &[f64], vehicles: usize) -> Result<(), PlanError> {
    if initial_soc.len() != vehicles {
        return Err(ConfigError::new(
            "initial_soc",
            format!("expected {vehicles} values, got {}", initial_soc.len()),
        )
        .into());
    }
    let errors: Vec<_> = initial_soc
        .iter()
        .enumerate()
        .filter(|(_, x)| !(0.0..=1.0).contains(*x))
        .map(|(i, x)| {
            ConfigError::new(format!("initial_soc[{i}]"), format!("{x} not in [0.0, 1.0]"))
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlanError::Configuration(errors))
    }
}

fn run_clarabel(
    form: &ConicForm,
    settings: &SolverSettings,
) -> Result<(Vec<f64>, u32, Duration), PlanError> {
    use clarabel::solver::*;

    let solver_settings = DefaultSettingsBuilder::default()
        .verbose(false)
        .max_iter(settings.max_iterations)
        .time_limit(settings.time_limit.as_secs_f64())
        .tol_gap_abs(settings.tolerance)
        .tol_gap_rel(settings.tolerance)
        .tol_feas(settings.tolerance)
        .build()
        .map_err(|e| SolverFailure::InvalidSetup(e.to_string()))?;

    let cones = [
        SupportedConeT::ZeroConeT(form.equalities),
        SupportedConeT::NonnegativeConeT(form.inequalities),
    ];

    let start = Instant::now();
    let mut solver =
        DefaultSolver::new(&form.p, &form.q, &form.a, &form.b, &cones, solver_settings)
            .map_err(|e| SolverFailure::InvalidSetup(format!("{e:?}")))?;
    solver.solve();
    let elapsed = start.elapsed();

    let status = &solver.solution.status;
    let iterations = solver.solution.iterations;
    if let Err(e) = check_status(status, iterations, elapsed) {
        warn!(?status, iterations, error = %e, "charging QP not solved");
        return Err(e);
    }
    Ok((solver.solution.x.clone(), iterations, elapsed))
}

/// Maps a terminal solver status to success or a typed failure.
fn check_status(
    status: &clarabel::solver::SolverStatus,
    iterations: u32,
    elapsed: Duration,
) -> Result<(), PlanError> {
    use clarabel::solver::SolverStatus;

    match status {
        SolverStatus::Solved => Ok(()),
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            Err(PlanError::InfeasibleProblem {
                status: format!("{status:?}"),
            })
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            Err(SolverFailure::Unbounded.into())
        }
        SolverStatus::MaxIterations | SolverStatus::MaxTime => Err(PlanError::SolverTimeout {
            iterations,
            elapsed,
        }),
        SolverStatus::AlmostSolved => Err(SolverFailure::ReducedAccuracy.into()),
        SolverStatus::NumericalError => Err(SolverFailure::NumericalError.into()),
        SolverStatus::InsufficientProgress => Err(SolverFailure::InsufficientProgress.into()),
        other => Err(SolverFailure::Unexpected(format!("{other:?}")).into()),
    }
}
