use super::expression::{DecisionId, LinearExpr};
use super::solver_service::{Result, SolverError};
use super::value_objects::{GoalKind, NativeType, Relation, SolverBackend, SolverQuality};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decision variable of the native model
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub name: String,
    pub integer: bool,
    pub lower: f64,
    pub upper: f64,
}

impl Decision {
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        let (lower, upper) = native_type.bounds();
        Self {
            name: name.into(),
            integer: native_type.is_integer(),
            lower,
            upper,
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Native type matching the bounds exactly, if any
    pub fn native_type(&self) -> Option<NativeType> {
        let candidates: &[NativeType] = if self.integer {
            &[
                NativeType::Boolean,
                NativeType::NonnegativeInteger,
                NativeType::Integer,
            ]
        } else {
            &[NativeType::NonnegativeReal, NativeType::Real]
        };
        candidates
            .iter()
            .copied()
            .find(|t| t.bounds() == (self.lower, self.upper))
    }
}

/// Named linear constraint `expression relation rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expression: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

/// Named goal of the native model
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub name: String,
    pub kind: GoalKind,
    pub expression: LinearExpr,
    /// Textual form captured when the goal was registered
    pub text: String,
}

/// Native model: decisions, constraints and goals of one session
#[derive(Debug, Clone, Default)]
pub struct NativeModel {
    name: String,
    epoch: u32,
    decisions: Vec<Decision>,
    decisions_by_name: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    constraint_names: HashMap<String, usize>,
    goals: Vec<Goal>,
}

impl NativeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Remove everything; handles issued before this call become stale
    pub fn clear(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Replace the contents with another model, starting a new epoch
    pub fn replace_with(&mut self, other: NativeModel) {
        let epoch = self.epoch.wrapping_add(1);
        *self = NativeModel { epoch, ..other };
    }

    pub fn add_decision(&mut self, decision: Decision) -> Result<DecisionId> {
        if self.decisions_by_name.contains_key(&decision.name) {
            return Err(SolverError::DuplicateDecision(decision.name));
        }
        let index = self.decisions.len();
        self.decisions_by_name.insert(decision.name.clone(), index);
        self.decisions.push(decision);
        Ok(DecisionId {
            epoch: self.epoch,
            index,
        })
    }

    pub fn decision(&self, id: DecisionId) -> Option<&Decision> {
        if id.epoch != self.epoch {
            return None;
        }
        self.decisions.get(id.index)
    }

    pub fn decision_id(&self, name: &str) -> Option<DecisionId> {
        self.decisions_by_name.get(name).map(|&index| DecisionId {
            epoch: self.epoch,
            index,
        })
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn num_integer_decisions(&self) -> usize {
        self.decisions.iter().filter(|d| d.integer).count()
    }

    /// Add `lhs relation rhs`, moving every constant to the right-hand side
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinearExpr,
        relation: Relation,
        rhs: LinearExpr,
    ) -> Result<()> {
        let name = name.into();
        if self.has_row(&name) {
            return Err(SolverError::DuplicateConstraint(name));
        }
        let mut expression = lhs;
        expression.add_assign(&rhs.scaled(-1.0));
        let rhs = -expression.constant;
        expression.constant = 0.0;

        self.constraint_names.insert(name.clone(), self.constraints.len());
        self.constraints.push(Constraint {
            name,
            expression,
            relation,
            rhs,
        });
        Ok(())
    }

    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraint_names.contains_key(name)
    }

    /// Goals and constraints share one row namespace in model files
    pub fn has_row(&self, name: &str) -> bool {
        self.has_constraint(name) || self.goal(name).is_some()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn add_goal(
        &mut self,
        name: impl Into<String>,
        kind: GoalKind,
        expression: LinearExpr,
        text: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        if self.has_row(&name) {
            return Err(SolverError::DuplicateGoal(name));
        }
        self.goals.push(Goal {
            name,
            kind,
            expression,
            text: text.into(),
        });
        Ok(())
    }

    pub fn goal(&self, name: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.name == name)
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Whether `values` satisfies bounds, integrality and every constraint
    /// within `tolerance`
    pub fn admits(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.decisions.len() {
            return false;
        }
        let within_bounds = self.decisions.iter().zip(values).all(|(decision, &value)| {
            value.is_finite()
                && value >= decision.lower - tolerance
                && value <= decision.upper + tolerance
                && (!decision.integer || (value - value.round()).abs() <= tolerance)
        });
        within_bounds
            && self.constraints.iter().all(|constraint| {
                let lhs = constraint.expression.evaluate(values);
                match constraint.relation {
                    Relation::LessOrEqual => lhs <= constraint.rhs + tolerance,
                    Relation::GreaterOrEqual => lhs >= constraint.rhs - tolerance,
                    Relation::Equal => (lhs - constraint.rhs).abs() <= tolerance,
                }
            })
    }

    /// Render a linear expression using decision names, e.g. `2 * x - y + 3`
    pub fn describe(&self, expression: &LinearExpr) -> String {
        let mut text = String::new();
        for (index, coefficient) in expression.terms() {
            let name = self
                .decisions
                .get(index)
                .map(|d| d.name.as_str())
                .unwrap_or("?");
            let magnitude = coefficient.abs();
            if text.is_empty() {
                if coefficient < 0.0 {
                    text.push('-');
                }
            } else if coefficient < 0.0 {
                text.push_str(" - ");
            } else {
                text.push_str(" + ");
            }
            if magnitude != 1.0 {
                text.push_str(&format!("{} * ", magnitude));
            }
            text.push_str(name);
        }

        if text.is_empty() {
            return format!("{}", expression.constant);
        }
        if expression.constant > 0.0 {
            text.push_str(&format!(" + {}", expression.constant));
        } else if expression.constant < 0.0 {
            text.push_str(&format!(" - {}", -expression.constant));
        }
        text
    }
}

/// Configuration for the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Seconds
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            verbose: false,
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
}

impl SolverStatistics {
    pub fn for_model(model: &NativeModel, solve_time_ms: f64) -> Self {
        Self {
            solve_time_ms,
            num_variables: model.decisions().len() as u32,
            num_constraints: model.constraints().len() as u32,
            num_integer_vars: model.num_integer_decisions() as u32,
        }
    }
}

/// Solution retained after a solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub quality: SolverQuality,
    /// One value per decision column; empty when the engine found no point
    pub values: Vec<f64>,
    pub objective_value: Option<f64>,
    /// Epoch of the model the solution was computed for
    pub epoch: u32,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(quality: SolverQuality, epoch: u32) -> Self {
        Self {
            quality,
            values: Vec::new(),
            objective_value: None,
            epoch,
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_values(mut self, values: Vec<f64>, objective_value: Option<f64>) -> Self {
        self.values = values;
        self.objective_value = objective_value;
        self
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> (NativeModel, DecisionId, DecisionId) {
        let mut model = NativeModel::new();
        let x = model
            .add_decision(Decision::new("x", NativeType::NonnegativeInteger))
            .unwrap();
        let y = model
            .add_decision(Decision::new("y", NativeType::Real))
            .unwrap();
        (model, x, y)
    }

    #[test]
    fn test_duplicate_decision_rejected() {
        let (mut model, _, _) = sample_model();
        let result = model.add_decision(Decision::new("x", NativeType::Real));
        assert!(matches!(result, Err(SolverError::DuplicateDecision(name)) if name == "x"));
    }

    #[test]
    fn test_constraint_moves_constants_right() {
        let (mut model, x, _) = sample_model();
        let mut lhs = LinearExpr::column(x.index());
        lhs.constant = 2.0;
        model
            .add_constraint("c_0", lhs, Relation::LessOrEqual, LinearExpr::constant(10.0))
            .unwrap();

        let constraint = &model.constraints()[0];
        assert_eq!(constraint.rhs, 8.0);
        assert_eq!(constraint.expression.constant, 0.0);
        assert!(model.has_constraint("c_0"));
        assert!(matches!(
            model.add_constraint("c_0", LinearExpr::default(), Relation::Equal, LinearExpr::default()),
            Err(SolverError::DuplicateConstraint(_))
        ));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let (mut model, x, _) = sample_model();
        assert!(model.decision(x).is_some());
        model.clear();
        assert!(model.decision(x).is_none());
        assert!(model.decisions().is_empty());
        assert_eq!(model.epoch(), 1);
    }

    #[test]
    fn test_replace_with_bumps_epoch() {
        let (mut model, _, _) = sample_model();
        let (other, _, _) = sample_model();
        model.replace_with(other);
        assert_eq!(model.epoch(), 1);
        assert_eq!(model.decision_id("y").map(|id| id.epoch()), Some(1));
    }

    #[test]
    fn test_native_type_from_bounds() {
        assert_eq!(
            Decision::new("b", NativeType::Boolean).native_type(),
            Some(NativeType::Boolean)
        );
        assert_eq!(
            Decision::new("r", NativeType::Real)
                .with_bounds(1.0, 2.0)
                .native_type(),
            None
        );
    }

    #[test]
    fn test_describe() {
        let (model, x, y) = sample_model();
        let mut expr = LinearExpr::column(x.index()).scaled(2.0);
        expr.add_term(y.index(), -1.0);
        expr.constant = 3.0;
        assert_eq!(model.describe(&expr), "2 * x - y + 3");
        assert_eq!(model.describe(&LinearExpr::constant(0.0)), "0");
        assert_eq!(model.describe(&LinearExpr::column(y.index()).scaled(-1.0)), "-y");
    }

    #[test]
    fn test_duplicate_goal_rejected() {
        let (mut model, x, _) = sample_model();
        model
            .add_goal("g", GoalKind::Maximize, LinearExpr::column(x.index()), "x")
            .unwrap();
        assert!(matches!(
            model.add_goal("g", GoalKind::Maximize, LinearExpr::default(), "0"),
            Err(SolverError::DuplicateGoal(_))
        ));
        assert_eq!(model.goal("g").map(|g| g.text.as_str()), Some("x"));
    }

    #[test]
    fn test_goals_and_constraints_share_names() {
        let (mut model, x, _) = sample_model();
        model
            .add_constraint("c_0", LinearExpr::column(x.index()), Relation::LessOrEqual, LinearExpr::constant(1.0))
            .unwrap();
        assert!(matches!(
            model.add_goal("c_0", GoalKind::Maximize, LinearExpr::column(x.index()), "x"),
            Err(SolverError::DuplicateGoal(name)) if name == "c_0"
        ));

        model
            .add_goal("profit", GoalKind::Maximize, LinearExpr::column(x.index()), "x")
            .unwrap();
        assert!(model.has_row("profit"));
        assert!(matches!(
            model.add_constraint("profit", LinearExpr::default(), Relation::Equal, LinearExpr::default()),
            Err(SolverError::DuplicateConstraint(_))
        ));
    }

    #[test]
    fn test_admits_checks_bounds_integrality_and_rows() {
        let (mut model, x, y) = sample_model();
        let mut sum = LinearExpr::column(x.index());
        sum.add_term(y.index(), 1.0);
        model
            .add_constraint("c_0", sum, Relation::LessOrEqual, LinearExpr::constant(10.0))
            .unwrap();

        assert!(model.admits(&[3.0, 7.0], 1e-6));
        assert!(model.admits(&[3.0, -5.5], 1e-6));
        assert!(!model.admits(&[3.5, 1.0], 1e-6));
        assert!(!model.admits(&[-1.0, 1.0], 1e-6));
        assert!(!model.admits(&[4.0, 7.0], 1e-6));
        assert!(!model.admits(&[3.0], 1e-6));
    }
}
