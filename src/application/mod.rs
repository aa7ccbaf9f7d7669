// Application layer: the MILP adapter and its persistence

pub mod milp_solver;
pub mod persistence;
pub mod status;

pub use milp_solver::MilpSolver;
pub use persistence::{ReloadReport, SolverData, VariableRecord, SOLVER_DATA_VERSION};
pub use status::status_from_quality;
