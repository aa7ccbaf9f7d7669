// Domain value objects representing core modeling concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract numeric domain of a variable, as seen by the modeling layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// x ∈ {0, 1}
    BinaryInteger,
    BinaryConstantInteger,
    /// x ∈ ℕ
    PositiveOrZeroInteger,
    PositiveOrZeroConstantInteger,
    /// x ∈ ℤ
    AnyInteger,
    AnyConstantInteger,
    /// x ∈ ℝ, x >= 0
    PositiveOrZeroReal,
    PositiveOrZeroConstantReal,
    /// x ∈ ℝ
    AnyReal,
    AnyConstantReal,
}

impl Domain {
    pub const ALL: [Domain; 10] = [
        Domain::BinaryInteger,
        Domain::BinaryConstantInteger,
        Domain::PositiveOrZeroInteger,
        Domain::PositiveOrZeroConstantInteger,
        Domain::AnyInteger,
        Domain::AnyConstantInteger,
        Domain::PositiveOrZeroReal,
        Domain::PositiveOrZeroConstantReal,
        Domain::AnyReal,
        Domain::AnyConstantReal,
    ];

    pub fn is_constant(self) -> bool {
        matches!(
            self,
            Domain::BinaryConstantInteger
                | Domain::PositiveOrZeroConstantInteger
                | Domain::AnyConstantInteger
                | Domain::PositiveOrZeroConstantReal
                | Domain::AnyConstantReal
        )
    }

    /// Non-constant counterpart of this domain
    pub fn base(self) -> Domain {
        match self {
            Domain::BinaryConstantInteger => Domain::BinaryInteger,
            Domain::PositiveOrZeroConstantInteger => Domain::PositiveOrZeroInteger,
            Domain::AnyConstantInteger => Domain::AnyInteger,
            Domain::PositiveOrZeroConstantReal => Domain::PositiveOrZeroReal,
            Domain::AnyConstantReal => Domain::AnyReal,
            other => other,
        }
    }

    pub fn is_binary(self) -> bool {
        self.base() == Domain::BinaryInteger
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self.base(),
            Domain::BinaryInteger | Domain::PositiveOrZeroInteger | Domain::AnyInteger
        )
    }

    pub fn is_nonnegative(self) -> bool {
        matches!(
            self.base(),
            Domain::BinaryInteger | Domain::PositiveOrZeroInteger | Domain::PositiveOrZeroReal
        )
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Variable type understood by the native engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    /// Integer restricted to {0, 1}
    Boolean,
    /// Integer range [0, ∞)
    NonnegativeInteger,
    /// Real range [0, ∞)
    NonnegativeReal,
    /// Unrestricted integer
    Integer,
    /// Unrestricted real
    Real,
}

impl NativeType {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            NativeType::Boolean | NativeType::NonnegativeInteger | NativeType::Integer
        )
    }

    pub fn bounds(self) -> (f64, f64) {
        match self {
            NativeType::Boolean => (0.0, 1.0),
            NativeType::NonnegativeInteger | NativeType::NonnegativeReal => (0.0, f64::INFINITY),
            NativeType::Integer | NativeType::Real => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (≤)
    LessOrEqual,
    /// Greater than or equal (≥)
    GreaterOrEqual,
    /// Equal (=)
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessOrEqual => write!(f, "<="),
            Relation::GreaterOrEqual => write!(f, ">="),
            Relation::Equal => write!(f, "=="),
        }
    }
}

/// Direction of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Minimize,
    Maximize,
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::Minimize => write!(f, "Minimize"),
            GoalKind::Maximize => write!(f, "Maximize"),
        }
    }
}

/// Raw classification of a solve outcome, as reported by the native engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverQuality {
    Optimal,
    LocalOptimal,
    Feasible,
    Infeasible,
    InfeasibleOrUnbounded,
    LocalInfeasible,
    Unbounded,
    Unknown,
}

/// Canonical status of a solved model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Found feasible solution (may not be optimal)
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Engine reported nothing more specific
    Unknown,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Feasible => write!(f, "Feasible"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Textual model format used when saving the native model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Fixed-column MPS
    Mps,
    /// Free-format MPS, the only format accepted when loading
    #[default]
    FreeMps,
    /// Stochastic MPS (core, time and stoch sections)
    Smps,
    /// Optimization Modeling Language
    Oml,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Mps => write!(f, "MPS"),
            FileFormat::FreeMps => write!(f, "Free MPS"),
            FileFormat::Smps => write!(f, "SMPS"),
            FileFormat::Oml => write!(f, "OML"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Automatically select best solver
    #[default]
    Auto,
    /// HiGHS
    Highs,
    /// COIN-OR CBC
    CoinCbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}
