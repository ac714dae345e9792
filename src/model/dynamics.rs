use serde::Deserialize;

use crate::presence::PresenceSchedule;
use crate::types::VehicleSeries;

/// State transition applied to a vehicle while it is absent.
///
/// Either way the vehicle's row of `A` is exactly the present row or exactly
/// gated, and its `B` row is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceModel {
    /// `A` keeps its identity entry: the state of charge is frozen.
    #[default]
    Hold,
    /// `A` is multiplied by the presence flag: the state drops to zero.
    Reset,
}

/// Diagonals of `A[t]` (state transition) and `B[t]` (control influence)
/// for every vehicle and step.
///
/// `x[t+1]_i = A[t]_ii * x[t]_i + B[t]_ii * u[t]_i`
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamics {
    transition: VehicleSeries<f64>,
    influence: VehicleSeries<f64>,
}

impl Dynamics {
    /// Starts from `A = I` and `B = gain * I` at every step, then gates each
    /// vehicle's entries by its presence flag.
    pub fn build(presence: &PresenceSchedule, gain: f64, absence: AbsenceModel) -> Self {
        let flags = presence.flags();
        let transition = flags.map(|i, t, _| match absence {
            AbsenceModel::Hold => 1.0,
            AbsenceModel::Reset => presence.gate(i, t),
        });
        let influence = flags.map(|i, t, _| gain * presence.gate(i, t));
        Self {
            transition,
            influence,
        }
    }

    pub fn vehicles(&self) -> usize {
        self.transition.vehicles()
    }

    pub fn horizon(&self) -> usize {
        self.transition.len()
    }

    /// `A[t]_ii`.
    pub fn transition(&self, vehicle: usize, step: usize) -> f64 {
        self.transition.get(vehicle, step)
    }

    /// `B[t]_ii`.
    pub fn influence(&self, vehicle: usize, step: usize) -> f64 {
        self.influence.get(vehicle, step)
    }

    /// Applies one step of the dynamics to the whole fleet.
    pub fn step(&self, step: usize, soc: &[f64], power: &[f64]) -> Vec<f64> {
        soc.iter()
            .zip(power)
            .enumerate()
            .map(|(i, (x, u))| self.transition(i, step) * x + self.influence(i, step) * u)
            .collect()
    }

    /// Rolls the model forward from `initial` under `power` (`N x T`),
    /// returning the `N x (T + 1)` state trajectory.
    ///
    /// # Panics
    ///
    /// Panics if `initial` or `power` do not match the model's shape.
    pub fn simulate(&self, initial: &[f64], power: &VehicleSeries<f64>) -> VehicleSeries<f64> {
        assert_eq!(initial.len(), self.vehicles(), "initial state length");
        assert_eq!(power.vehicles(), self.vehicles(), "power rows");
        assert_eq!(power.len(), self.horizon(), "power steps");

        let mut soc = VehicleSeries::filled(self.vehicles(), self.horizon() + 1, 0.0);
        let mut x = initial.to_vec();
        for (i, x0) in x.iter().enumerate() {
            soc.set(i, 0, *x0);
        }
        for t in 0..self.horizon() {
            x = self.step(t, &x, &power.column(t));
            for (i, xi) in x.iter().enumerate() {
                soc.set(i, t + 1, *xi);
            }
        }
        soc
    }
}
