// COIN-OR CBC Engine Adapter
// Implements the SolverEngine interface through good_lp's coin_cbc backend

use crate::domain::{
    models::{NativeModel, Solution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverEngine, SolverError},
    value_objects::{GoalKind, Relation, SolverQuality},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolutionStatus as GoodLpStatus, SolverModel,
    Variable as GoodLpVariable,
};
use std::time::Instant;
use tracing::{debug, warn};

/// Tolerance used to accept an incumbent from a limit stop
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

pub struct CoinCbcEngine;

impl CoinCbcEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverEngine for CoinCbcEngine {
    fn solve(&self, model: &NativeModel, config: &SolverConfig) -> Result<Solution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();
        let goal = model.goals().first();
        if model.goals().len() > 1 {
            warn!(
                goals = model.goals().len(),
                "CBC optimizes the first goal only; remaining goals are ignored"
            );
        }

        // Build variables using good_lp
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(model.decisions().len());

        for decision in model.decisions() {
            let mut definition = variable().min(decision.lower).max(decision.upper);
            if decision.integer {
                definition = definition.integer();
            }
            lp_variables.push(vars.add(definition));
        }

        let to_expression = |expression: &crate::domain::LinearExpr| -> Expression {
            let mut result: Expression = expression.constant.into();
            for (index, coefficient) in expression.terms() {
                result += coefficient * lp_variables[index];
            }
            result
        };

        let objective = goal
            .map(|g| to_expression(&g.expression))
            .unwrap_or_else(|| 0.into());
        let mut lp_model = match goal.map(|g| g.kind) {
            Some(GoalKind::Minimize) => vars.minimise(objective).using(coin_cbc::coin_cbc),
            _ => vars.maximise(objective).using(coin_cbc::coin_cbc),
        };
        if !config.verbose {
            lp_model.set_parameter("log", "0");
        }
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("seconds", &limit.to_string());
        }

        // Build constraints
        for constraint in model.constraints() {
            let lhs = to_expression(&constraint.expression);
            lp_model = match constraint.relation {
                Relation::LessOrEqual => lp_model.with(lhs.leq(constraint.rhs)),
                Relation::GreaterOrEqual => lp_model.with(lhs.geq(constraint.rhs)),
                Relation::Equal => lp_model.with(lhs.eq(constraint.rhs)),
            };
        }

        // Solve the problem
        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);
        debug!(solve_time_ms = solve_time, "CBC finished");

        match solution_result {
            Ok(sol) => {
                let values: Vec<f64> = lp_variables.iter().map(|&var| sol.value(var)).collect();
                let quality = match sol.status() {
                    GoodLpStatus::Optimal => SolverQuality::Optimal,
                    // Stopped on a limit; keep the incumbent only if it holds
                    _ if model.admits(&values, FEASIBILITY_TOLERANCE) => SolverQuality::Feasible,
                    _ => SolverQuality::Unknown,
                };
                debug!(status = ?sol.status(), ?quality, "CBC solution");
                let solution = Solution::new(quality, model.epoch()).with_statistics(statistics);
                if quality == SolverQuality::Unknown {
                    return Ok(solution);
                }
                let objective = goal.map(|g| g.expression.evaluate(&values));
                Ok(solution.with_values(values, objective))
            }
            Err(ResolutionError::Infeasible) => {
                Ok(Solution::new(SolverQuality::Infeasible, model.epoch()).with_statistics(statistics))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(Solution::new(SolverQuality::Unbounded, model.epoch()).with_statistics(statistics))
            }
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
