// HiGHS Engine Adapter
// Implements the SolverEngine interface for HiGHS
// Translates the native model into a HiGHS row problem and back

use crate::domain::{
    models::{NativeModel, Solution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverEngine},
    value_objects::{GoalKind, Relation, SolverQuality},
};
use highs::{Col, HighsModelStatus, Model, RowProblem, Sense, SolvedModel};
use std::time::Instant;
use tracing::{debug, warn};

pub struct HighsEngine;

impl HighsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Tolerance used to accept a point returned by an interrupted solve
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Translate a HiGHS model status
///
/// Limit stops keep their incumbent when it satisfies the model.
fn quality_from_status(status: HighsModelStatus, has_feasible_point: bool) -> SolverQuality {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolverQuality::Optimal,
        HighsModelStatus::Infeasible => SolverQuality::Infeasible,
        HighsModelStatus::UnboundedOrInfeasible => SolverQuality::InfeasibleOrUnbounded,
        HighsModelStatus::Unbounded => SolverQuality::Unbounded,
        HighsModelStatus::ReachedTimeLimit
        | HighsModelStatus::ReachedIterationLimit
        | HighsModelStatus::ObjectiveBound
        | HighsModelStatus::ObjectiveTarget => {
            if has_feasible_point {
                SolverQuality::Feasible
            } else {
                SolverQuality::Unknown
            }
        }
        HighsModelStatus::NotSet
        | HighsModelStatus::LoadError
        | HighsModelStatus::ModelError
        | HighsModelStatus::PresolveError
        | HighsModelStatus::SolveError
        | HighsModelStatus::PostsolveError
        | HighsModelStatus::Unknown => SolverQuality::Unknown,
    }
}

impl HighsEngine {
    /// Translate the native model into a configured HiGHS model
    fn build(&self, model: &NativeModel, config: &SolverConfig) -> Model {
        let goal = model.goals().first();
        let mut pb = RowProblem::default();
        let mut columns: Vec<Col> = Vec::with_capacity(model.decisions().len());

        // Add decisions; the goal becomes the column costs
        for (index, decision) in model.decisions().iter().enumerate() {
            let cost = goal.map(|g| g.expression.coefficient(index)).unwrap_or(0.0);
            let col = if decision.integer {
                pb.add_integer_column(cost, decision.lower..=decision.upper)
            } else {
                pb.add_column(cost, decision.lower..=decision.upper)
            };
            columns.push(col);
        }

        // Add constraints
        for constraint in model.constraints() {
            let row: Vec<(Col, f64)> = constraint
                .expression
                .terms()
                .map(|(index, coefficient)| (columns[index], coefficient))
                .collect();

            match constraint.relation {
                Relation::LessOrEqual => {
                    pb.add_row(..=constraint.rhs, &row);
                }
                Relation::GreaterOrEqual => {
                    pb.add_row(constraint.rhs.., &row);
                }
                Relation::Equal => {
                    pb.add_row(constraint.rhs..=constraint.rhs, &row);
                }
            }
        }

        let sense = match goal.map(|g| g.kind) {
            Some(GoalKind::Minimize) => Sense::Minimise,
            _ => Sense::Maximise,
        };

        let mut highs_model = pb.optimise(sense);
        highs_model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit {
            highs_model.set_option("time_limit", limit);
        }
        if let Some(gap) = config.gap_tolerance {
            highs_model.set_option("mip_rel_gap", gap);
        }
        highs_model
    }

    /// Read status and values back from a finished HiGHS run
    fn translate(&self, model: &NativeModel, solved: &SolvedModel, solve_time: f64) -> Solution {
        let statistics = SolverStatistics::for_model(model, solve_time);
        let status = solved.status();

        let values = solved.get_solution().columns().to_vec();
        let has_feasible_point = model.admits(&values, FEASIBILITY_TOLERANCE);
        let quality = quality_from_status(status, has_feasible_point);
        debug!(?status, ?quality, solve_time_ms = solve_time, "HiGHS finished");

        let solution = Solution::new(quality, model.epoch()).with_statistics(statistics);
        match quality {
            SolverQuality::Optimal | SolverQuality::Feasible => {
                let objective = model
                    .goals()
                    .first()
                    .map(|g| g.expression.evaluate(&values));
                solution.with_values(values, objective)
            }
            _ => solution,
        }
    }
}

impl SolverEngine for HighsEngine {
    fn solve(&self, model: &NativeModel, config: &SolverConfig) -> Result<Solution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();
        let goal = model.goals().first();
        if model.goals().len() > 1 {
            warn!(
                goals = model.goals().len(),
                "HiGHS optimizes the first goal only; remaining goals are ignored"
            );
        }

        // Handle empty model
        if model.decisions().is_empty() {
            let objective = goal.map(|g| g.expression.constant);
            let infeasible = model.constraints().iter().any(|c| !holds(c.relation, 0.0, c.rhs));
            let quality = if infeasible {
                SolverQuality::Infeasible
            } else {
                SolverQuality::Optimal
            };
            return Ok(Solution::new(quality, model.epoch()).with_values(Vec::new(), objective));
        }

        let solved = self.build(model, config).solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        Ok(self.translate(model, &solved, solve_time))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

fn holds(relation: Relation, lhs: f64, rhs: f64) -> bool {
    match relation {
        Relation::LessOrEqual => lhs <= rhs,
        Relation::GreaterOrEqual => lhs >= rhs,
        Relation::Equal => lhs == rhs,
    }
}
