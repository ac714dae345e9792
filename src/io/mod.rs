/// CSV export of planned trajectories.
pub mod export;
