use crate::domain::{
    solver_service::{Result, SolverEngine},
    value_objects::SolverBackend,
};
#[cfg(not(feature = "coin_cbc"))]
use crate::domain::solver_service::SolverError;
use crate::solver::HighsEngine;
use std::sync::Arc;

/// Factory for creating engine instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create an engine for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverEngine>> {
        match backend {
            SolverBackend::Auto | SolverBackend::Highs => Ok(Arc::new(HighsEngine::new())),
            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Ok(Arc::new(crate::solver::CoinCbcEngine::new())),
            #[cfg(not(feature = "coin_cbc"))]
            SolverBackend::CoinCbc => Err(SolverError::SolverNotAvailable(format!(
                "{} (enable the `coin_cbc` feature)",
                backend
            ))),
        }
    }

    /// Get the default engine (HiGHS)
    pub fn default_engine() -> Arc<dyn SolverEngine> {
        Arc::new(HighsEngine::new())
    }
}
