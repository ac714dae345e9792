//! Time-varying diagonal model: dynamics (`A`, `B`) and cost (`Q`, `R`).

/// State-deviation and control penalty weights.
pub mod cost;
/// State transition and control influence per step.
pub mod dynamics;

pub use cost::CostWeights;
pub use dynamics::{AbsenceModel, Dynamics};
