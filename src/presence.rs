//! Vehicle presence: which steps each vehicle is plugged in and controllable.

use std::ops::Range;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::VehicleSeries;

/// Half-open step interval `[start, end)` during which a vehicle is plugged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceWindow {
    /// First connected step (inclusive).
    pub start: usize,
    /// First disconnected step (exclusive).
    pub end: usize,
}

impl PresenceWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn validate(&self, field: &str, horizon: usize) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::new(field, "start must be < end"));
        }
        if self.end > horizon {
            return Err(ConfigError::new(
                field,
                format!("end ({}) must be <= horizon.steps ({horizon})", self.end),
            ));
        }
        Ok(())
    }
}

/// Binary presence flags, one row of `T` steps per vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceSchedule {
    flags: VehicleSeries<bool>,
}

impl PresenceSchedule {
    /// Every vehicle present at every step.
    pub fn all_present(vehicles: usize, horizon: usize) -> Self {
        Self {
            flags: VehicleSeries::filled(vehicles, horizon, true),
        }
    }

    /// Builds flags from per-vehicle windows.
    ///
    /// `None` means the vehicle is present for the whole horizon; an empty
    /// list means it is never present. Overlapping windows are merged.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an empty or out-of-horizon window.
    pub fn from_windows(
        horizon: usize,
        windows: &[Option<Vec<PresenceWindow>>],
    ) -> Result<Self, ConfigError> {
        let mut flags = VehicleSeries::filled(windows.len(), horizon, false);
        for (vehicle, entry) in windows.iter().enumerate() {
            let Some(list) = entry else {
                for t in 0..horizon {
                    flags.set(vehicle, t, true);
                }
                continue;
            };
            for (k, w) in list.iter().enumerate() {
                w.validate(&format!("vehicles[{vehicle}].presence[{k}]"), horizon)?;
                for t in w.start..w.end {
                    flags.set(vehicle, t, true);
                }
            }
        }
        Ok(Self { flags })
    }

    /// Marks `vehicle` absent over `steps` (clamped to the horizon).
    pub fn with_absence(mut self, vehicle: usize, steps: Range<usize>) -> Self {
        for t in steps.start..steps.end.min(self.horizon()) {
            self.flags.set(vehicle, t, false);
        }
        self
    }

    pub fn vehicles(&self) -> usize {
        self.flags.vehicles()
    }

    pub fn horizon(&self) -> usize {
        self.flags.len()
    }

    pub fn is_present(&self, vehicle: usize, step: usize) -> bool {
        self.flags.get(vehicle, step)
    }

    /// Presence as a `0.0`/`1.0` gate for multiplying model entries.
    pub fn gate(&self, vehicle: usize, step: usize) -> f64 {
        if self.is_present(vehicle, step) { 1.0 } else { 0.0 }
    }

    /// Number of steps `vehicle` is plugged in.
    pub fn present_steps(&self, vehicle: usize) -> usize {
        self.flags.row(vehicle).iter().filter(|p| **p).count()
    }

    pub fn flags(&self) -> &VehicleSeries<bool> {
        &self.flags
    }
}
