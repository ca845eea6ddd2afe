//! Simple Temporal Network — labelled time points, integer distance bounds,
//! interval-level queries, and the solver boundary.

pub mod network;
pub mod queries;
pub mod solver;

pub use network::{Bound, Stn, StnOptions, DEFAULT_MAX_TIMEPOINTS};
pub use solver::{FloydWarshallSolver, SolverOutcome, StnSolver, DEFAULT_SOLVER_TIMEOUT};
