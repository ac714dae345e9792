//! Core planner types: per-vehicle time series shared by every stage.

/// A fleet-wide time series stored as one row per vehicle.
///
/// All model matrices in this crate are diagonal, so a `T`-step sequence of
/// `N x N` diagonal matrices is held as `N` rows of `T` scalars. The same
/// container carries presence flags, state-of-charge trajectories and
/// charging power schedules.
///
/// # Examples
///
/// ```
/// use ev_mpc::types::VehicleSeries;
///
/// let mut soc = VehicleSeries::filled(2, 3, 0.0);
/// soc.set(1, 2, 0.5);
/// assert_eq!(soc.get(1, 2), 0.5);
/// assert_eq!(soc.column(2), vec![0.0, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSeries<T> {
    vehicles: usize,
    len: usize,
    values: Vec<T>,
}

impl<T: Copy> VehicleSeries<T> {
    /// Creates a series with every entry set to `value`.
    pub fn filled(vehicles: usize, len: usize, value: T) -> Self {
        Self {
            vehicles,
            len,
            values: vec![value; vehicles * len],
        }
    }

    /// Builds a series from per-vehicle rows.
    ///
    /// Returns `None` if the rows do not all have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let vehicles = rows.len();
        let len = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != len) {
            return None;
        }
        Some(Self {
            vehicles,
            len,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of vehicles (rows).
    pub fn vehicles(&self) -> usize {
        self.vehicles
    }

    /// Number of time steps (columns).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the series has no time steps.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value for `vehicle` at `step`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, vehicle: usize, step: usize) -> T {
        self.values[self.index(vehicle, step)]
    }

    /// Overwrites the value for `vehicle` at `step`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn set(&mut self, vehicle: usize, step: usize, value: T) {
        let idx = self.index(vehicle, step);
        self.values[idx] = value;
    }

    /// Full time series of one vehicle.
    pub fn row(&self, vehicle: usize) -> &[T] {
        let start = vehicle * self.len;
        &self.values[start..start + self.len]
    }

    /// Iterates over vehicle rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.vehicles).map(move |v| self.row(v))
    }

    /// Values of every vehicle at one step (the diagonal at that step).
    pub fn column(&self, step: usize) -> Vec<T> {
        (0..self.vehicles).map(|v| self.get(v, step)).collect()
    }

    /// Applies `f(vehicle, step, value)` to every entry.
    pub fn map<U: Copy>(&self, mut f: impl FnMut(usize, usize, T) -> U) -> VehicleSeries<U> {
        let mut values = Vec::with_capacity(self.values.len());
        for v in 0..self.vehicles {
            for t in 0..self.len {
                values.push(f(v, t, self.get(v, t)));
            }
        }
        VehicleSeries {
            vehicles: self.vehicles,
            len: self.len,
            values,
        }
    }

    fn index(&self, vehicle: usize, step: usize) -> usize {
        assert!(
            vehicle < self.vehicles && step < self.len,
            "index ({vehicle}, {step}) out of range for {}x{} series",
            self.vehicles,
            self.len
        );
        vehicle * self.len + step
    }
}

impl VehicleSeries<f64> {
    /// Sum over the fleet at one step.
    pub fn column_sum(&self, step: usize) -> f64 {
        (0..self.vehicles).map(|v| self.get(v, step)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_has_requested_shape() {
        let s = VehicleSeries::filled(4, 145, 1.0_f64);
        assert_eq!(s.vehicles(), 4);
        assert_eq!(s.len(), 145);
        assert_eq!(s.rows().count(), 4);
        assert!(s.rows().all(|r| r.len() == 145));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(VehicleSeries::from_rows(ragged).is_none());
    }

    #[test]
    fn rows_and_columns_agree() {
        let s = VehicleSeries::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .expect("rows are rectangular");
        assert_eq!(s.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(s.column(1), vec![2.0, 5.0]);
        assert_eq!(s.column_sum(2), 9.0);
    }

    #[test]
    fn map_sees_indices() {
        let s = VehicleSeries::filled(2, 2, 1.0_f64);
        let m = s.map(|v, t, x| x * (v * 10 + t) as f64);
        assert_eq!(m.row(0), &[0.0, 1.0]);
        assert_eq!(m.row(1), &[10.0, 11.0]);
    }

    #[test]
    #[should_panic]
    fn get_out_of_range_panics() {
        let s = VehicleSeries::filled(1, 1, false);
        s.get(0, 1);
    }
}
