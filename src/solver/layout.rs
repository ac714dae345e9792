/// Position of each decision variable in the solver's vector `z`.
///
/// `z = [x[1], .., x[T], u[0], .., u[T-1]]` with each block holding the `N`
/// vehicles in index order. `x[0]` is fixed and never a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VariableLayout {
    vehicles: usize,
    steps: usize,
}

impl VariableLayout {
    pub(crate) fn new(vehicles: usize, steps: usize) -> Self {
        Self { vehicles, steps }
    }

    /// Index of `x[step]_vehicle`, for `step` in `1..=T`.
    pub(crate) fn soc(&self, vehicle: usize, step: usize) -> usize {
        debug_assert!(step >= 1 && step <= self.steps && vehicle < self.vehicles);
        (step - 1) * self.vehicles + vehicle
    }

    /// Index of `u[step]_vehicle`, for `step` in `0..T`.
    pub(crate) fn power(&self, vehicle: usize, step: usize) -> usize {
        debug_assert!(step < self.steps && vehicle < self.vehicles);
        self.vehicles * self.steps + step * self.vehicles + vehicle
    }

    pub(crate) fn len(&self) -> usize {
        2 * self.vehicles * self.steps
    }
}
