// Domain module: modeling concepts, native model and engine contract

pub mod expression;
pub mod models;
pub mod solver_service;
pub mod value_objects;
pub mod variable;

pub use expression::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
pub use variable::*;
