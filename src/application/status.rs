use crate::domain::value_objects::{SolutionStatus, SolverQuality};

/// Map the engine's solution quality onto the canonical status
pub fn status_from_quality(quality: SolverQuality) -> SolutionStatus {
    match quality {
        SolverQuality::Infeasible
        | SolverQuality::InfeasibleOrUnbounded
        | SolverQuality::LocalInfeasible => SolutionStatus::Infeasible,
        SolverQuality::Unbounded => SolutionStatus::Unbounded,
        SolverQuality::Optimal | SolverQuality::LocalOptimal => SolutionStatus::Optimal,
        SolverQuality::Feasible => SolutionStatus::Feasible,
        SolverQuality::Unknown => SolutionStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_mapping() {
        let expected = [
            (SolverQuality::Infeasible, SolutionStatus::Infeasible),
            (SolverQuality::InfeasibleOrUnbounded, SolutionStatus::Infeasible),
            (SolverQuality::LocalInfeasible, SolutionStatus::Infeasible),
            (SolverQuality::Unbounded, SolutionStatus::Unbounded),
            (SolverQuality::Optimal, SolutionStatus::Optimal),
            (SolverQuality::LocalOptimal, SolutionStatus::Optimal),
            (SolverQuality::Feasible, SolutionStatus::Feasible),
            (SolverQuality::Unknown, SolutionStatus::Unknown),
        ];
        for (quality, status) in expected {
            assert_eq!(status_from_quality(quality), status, "{:?}", quality);
        }
    }
}
