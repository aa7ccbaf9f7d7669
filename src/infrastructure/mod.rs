// Infrastructure: settings, logging and model file formats

pub mod formats;
pub mod logging;
pub mod settings;

pub use logging::LoggingConfig;
pub use settings::MilpSolverSettings;
