use crate::presence::PresenceSchedule;
use crate::prices::PriceSeries;
use crate::types::VehicleSeries;

/// Diagonals of `Q[t]` (penalty on `1 - x[t+1]`) and `R[t]` (penalty on
/// `u[t]`) for every vehicle and step.
#[derive(Debug, Clone, PartialEq)]
pub struct CostWeights {
    state: VehicleSeries<f64>,
    control: VehicleSeries<f64>,
}

impl CostWeights {
    /// `Q[t]_ii = beta` and `R[t]_ii = price[t + 1]^2`, both zeroed where the
    /// vehicle is absent.
    ///
    /// The control cost of step `t` looks one step ahead, so `R[T - 1]` reads
    /// the terminal price.
    ///
    /// # Panics
    ///
    /// Panics if `prices` does not cover the presence horizon.
    pub fn build(prices: &PriceSeries, presence: &PresenceSchedule, beta: f64) -> Self {
        assert_eq!(prices.horizon(), presence.horizon(), "price/presence horizon");
        let flags = presence.flags();
        let state = flags.map(|i, t, _| beta * presence.gate(i, t));
        let control = flags.map(|i, t, _| {
            let p = prices.at(t + 1);
            p * p * presence.gate(i, t)
        });
        Self { state, control }
    }

    /// `Q[t]_ii`.
    pub fn state(&self, vehicle: usize, step: usize) -> f64 {
        self.state.get(vehicle, step)
    }

    /// `R[t]_ii`.
    pub fn control(&self, vehicle: usize, step: usize) -> f64 {
        self.control.get(vehicle, step)
    }

    pub fn vehicles(&self) -> usize {
        self.state.vehicles()
    }

    pub fn horizon(&self) -> usize {
        self.state.len()
    }

    /// Objective value `sum_t (1 - x[t+1])' Q[t] (1 - x[t+1]) + u[t]' R[t] u[t]`
    /// of a state trajectory (`N x (T + 1)`) and power schedule (`N x T`).
    pub fn evaluate(&self, soc: &VehicleSeries<f64>, power: &VehicleSeries<f64>) -> f64 {
        let mut total = 0.0;
        for i in 0..self.vehicles() {
            for t in 0..self.horizon() {
                let gap = 1.0 - soc.get(i, t + 1);
                let u = power.get(i, t);
                total += self.state(i, t) * gap * gap + self.control(i, t) * u * u;
            }
        }
        total
    }
}
