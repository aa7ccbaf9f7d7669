// Domain layer: modeling vocabulary, expressions and the native model
pub mod domain;

// Application layer: the adapter driving model construction and solving
pub mod application;

// Infrastructure layer: settings, logging and model file formats
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverEngine
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Domain, FileFormat, NativeModel, NativeVariable, Solution, SolutionStatus, SolverBackend,
    SolverConfig, SolverEngine, SolverError, SolverQuality, Term, Variable,
};

pub use application::{MilpSolver, ReloadReport, SolverData};

pub use infrastructure::{LoggingConfig, MilpSolverSettings};

pub use solver::{DomainMapper, HighsEngine, SolverFactory};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcEngine;
