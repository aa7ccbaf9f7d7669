// Engine adapters: concrete implementations of SolverEngine, plus the
// mapping of abstract domains onto native variable types

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc_solver;
pub mod domain_mapper;
pub mod factory;
pub mod highs_solver;

#[cfg(feature = "coin_cbc")]
pub use coin_cbc_solver::CoinCbcEngine;
pub use domain_mapper::{BoundConstraint, DomainMapper, DomainMapping};
pub use factory::SolverFactory;
pub use highs_solver::HighsEngine;
