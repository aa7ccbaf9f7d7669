// MILP adapter
// Realizes abstract variables, algebra, constraints and goals on the native
// model owned by this instance, and drives the engine

use super::status::status_from_quality;
use crate::domain::{
    expression::Term,
    models::{Decision, NativeModel, Solution},
    solver_service::{Result, SolverEngine, SolverError},
    value_objects::{Domain, GoalKind, Relation, SolutionStatus},
    variable::{InstanceId, NativeVariable, Variable},
};
use crate::infrastructure::settings::MilpSolverSettings;
use crate::solver::{DomainMapper, SolverFactory};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Adapter between the modeling layer and a native engine
///
/// Each instance owns its native model. Variables carry the id of the
/// instance that created them and are rejected by any other instance.
pub struct MilpSolver {
    pub(super) instance: InstanceId,
    pub(super) settings: MilpSolverSettings,
    pub(super) mapper: DomainMapper,
    pub(super) engine: Arc<dyn SolverEngine>,
    pub(super) model: NativeModel,
    pub(super) variables: HashMap<String, Variable>,
    pub(super) constraint_index: u64,
    pub(super) variable_index: u64,
    pub(super) solution: Option<Solution>,
}

impl MilpSolver {
    /// Create an adapter with the engine selected by the settings
    pub fn new(settings: MilpSolverSettings) -> Result<Self> {
        settings.validate()?;
        let engine = SolverFactory::create_from_backend(settings.solver.backend)?;
        Ok(Self::with_model(settings, engine, NativeModel::new()))
    }

    pub fn with_engine(settings: MilpSolverSettings, engine: Arc<dyn SolverEngine>) -> Self {
        Self::with_model(settings, engine, NativeModel::new())
    }

    /// Attach to an existing native model
    ///
    /// With `recreate_model_at_start` the model is cleared first. Otherwise it
    /// is kept as is and the constraint counter starts after its constraints;
    /// its decisions are not registered as variables.
    pub fn with_model(
        settings: MilpSolverSettings,
        engine: Arc<dyn SolverEngine>,
        mut model: NativeModel,
    ) -> Self {
        if settings.recreate_model_at_start {
            model.clear();
        }
        let mapper = DomainMapper::new(settings.fix_broken_ranges);
        let instance = InstanceId::next();
        info!(
            %instance,
            engine = engine.name(),
            fix_broken_ranges = settings.fix_broken_ranges,
            "Created MILP solver"
        );

        Self {
            instance,
            constraint_index: model.constraints().len() as u64,
            variable_index: 0,
            settings,
            mapper,
            engine,
            model,
            variables: HashMap::new(),
            solution: None,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    pub fn settings(&self) -> &MilpSolverSettings {
        &self.settings
    }

    pub fn model(&self) -> &NativeModel {
        &self.model
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Next index used for `c_<index>` constraint names
    pub fn constraint_index(&self) -> u64 {
        self.constraint_index
    }

    /// Next index used for `v__<index>` variable names
    pub fn variable_index(&self) -> u64 {
        self.variable_index
    }

    fn check_owner(&self, variable: &impl NativeVariable) -> Result<()> {
        if variable.owner() != self.instance {
            return Err(SolverError::ForeignVariable(variable.name().to_string()));
        }
        Ok(())
    }

    fn next_variable_name(&mut self) -> String {
        let name = format!("v__{}", self.variable_index);
        self.variable_index += 1;
        name
    }

    fn next_constraint_name(&mut self) -> String {
        // Goals and loaded models may already use some of the generated names
        loop {
            let name = format!("c_{}", self.constraint_index);
            self.constraint_index += 1;
            if !self.model.has_row(&name) {
                return name;
            }
        }
    }

    // Constants

    pub fn lift_int_constant(&mut self, value: i64, domain: Domain) -> Variable {
        self.lift_real_constant(value as f64, domain)
    }

    pub fn lift_real_constant(&mut self, value: f64, domain: Domain) -> Variable {
        let name = self.next_variable_name();
        Variable::expression(self.instance, name, domain, Term::literal(value))
    }

    // Leaves

    /// Bind a fresh native decision and register it under `name`
    pub fn create_named(&mut self, name: &str, domain: Domain) -> Result<Variable> {
        if self.variables.contains_key(name) {
            return Err(SolverError::DuplicateVariable(name.to_string()));
        }

        let mapping = self.mapper.map(domain);
        let decision = self
            .model
            .add_decision(Decision::new(name, mapping.native_type))?;
        let variable = Variable::leaf(self.instance, name.to_string(), domain, decision);

        for bound in &mapping.bounds {
            self.add_relation(variable.term(), bound.relation, &Term::literal(bound.bound))?;
        }

        debug!(
            name,
            %domain,
            native_type = ?mapping.native_type,
            bounds = mapping.bounds.len(),
            "Created variable"
        );
        self.variables.insert(name.to_string(), variable.clone());
        Ok(variable)
    }

    pub fn create_anonymous(&mut self, domain: Domain) -> Result<Variable> {
        let name = self.next_variable_name();
        self.create_named(&name, domain)
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| SolverError::VariableNotFound(name.to_string()))
    }

    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Registered variables, in no particular order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    // Combinators

    fn combine(&mut self, term: Term, domain: Domain) -> Variable {
        let name = self.next_variable_name();
        Variable::expression(self.instance, name, domain, term)
    }

    pub fn sum(
        &mut self,
        first: &impl NativeVariable,
        second: &impl NativeVariable,
        domain: Domain,
    ) -> Result<Variable> {
        self.check_owner(first)?;
        self.check_owner(second)?;
        Ok(self.combine(Term::sum(first.term(), second.term()), domain))
    }

    pub fn negate(&mut self, variable: &impl NativeVariable, domain: Domain) -> Result<Variable> {
        self.check_owner(variable)?;
        Ok(self.combine(Term::negate(variable.term()), domain))
    }

    pub fn scale_multiply(
        &mut self,
        variable: &impl NativeVariable,
        constant: &impl NativeVariable,
        domain: Domain,
    ) -> Result<Variable> {
        self.check_owner(variable)?;
        self.check_owner(constant)?;
        Ok(self.combine(Term::scale_multiply(variable.term(), constant.term()), domain))
    }

    pub fn scale_divide(
        &mut self,
        variable: &impl NativeVariable,
        constant: &impl NativeVariable,
        domain: Domain,
    ) -> Result<Variable> {
        self.check_owner(variable)?;
        self.check_owner(constant)?;
        Ok(self.combine(Term::scale_divide(variable.term(), constant.term()), domain))
    }

    // Constraints and goals

    fn add_relation(&mut self, lhs: &Term, relation: Relation, rhs: &Term) -> Result<()> {
        let epoch = self.model.epoch();
        let lhs = lhs.linearize(epoch)?;
        let rhs = rhs.linearize(epoch)?;
        let name = self.next_constraint_name();
        debug!(constraint = %name, %relation, "Added constraint");
        self.model.add_constraint(name, lhs, relation, rhs)
    }

    fn set_relation(
        &mut self,
        variable: &impl NativeVariable,
        relation: Relation,
        bound: &impl NativeVariable,
    ) -> Result<()> {
        self.check_owner(variable)?;
        self.check_owner(bound)?;
        self.add_relation(variable.term(), relation, bound.term())
    }

    pub fn set_less_or_equal(
        &mut self,
        variable: &impl NativeVariable,
        bound: &impl NativeVariable,
    ) -> Result<()> {
        self.set_relation(variable, Relation::LessOrEqual, bound)
    }

    pub fn set_greater_or_equal(
        &mut self,
        variable: &impl NativeVariable,
        bound: &impl NativeVariable,
    ) -> Result<()> {
        self.set_relation(variable, Relation::GreaterOrEqual, bound)
    }

    pub fn set_equal(
        &mut self,
        variable: &impl NativeVariable,
        bound: &impl NativeVariable,
    ) -> Result<()> {
        self.set_relation(variable, Relation::Equal, bound)
    }

    /// Register a goal to maximize; negate the objective to minimize
    pub fn add_goal(&mut self, name: &str, objective: &impl NativeVariable) -> Result<()> {
        self.check_owner(objective)?;
        let expression = objective.term().linearize(self.model.epoch())?;
        let text = objective.term().to_string();
        debug!(goal = name, expression = %text, "Added goal");
        self.model
            .add_goal(name, GoalKind::Maximize, expression, text)
    }

    pub fn goal_expression(&self, name: &str) -> Result<&str> {
        self.model
            .goal(name)
            .map(|g| g.text.as_str())
            .ok_or_else(|| SolverError::GoalNotFound(name.to_string()))
    }

    // Solving

    /// Run the engine and retain its solution
    pub fn solve(&mut self) -> Result<SolutionStatus> {
        info!(
            engine = self.engine.name(),
            decisions = self.model.decisions().len(),
            constraints = self.model.constraints().len(),
            goals = self.model.goals().len(),
            "Solving model"
        );
        let solution = self.engine.solve(&self.model, &self.settings.solver)?;
        let status = status_from_quality(solution.quality);
        info!(
            %status,
            solve_time_ms = solution.statistics.solve_time_ms,
            objective = ?solution.objective_value,
            "Solve finished"
        );
        self.solution = Some(solution);
        Ok(status)
    }

    pub fn value(&self, variable: &impl NativeVariable) -> Result<f64> {
        self.check_owner(variable)?;
        let solution = self.solution.as_ref().ok_or(SolverError::NotSolved)?;
        variable.term().evaluate(&solution.values, solution.epoch)
    }

    pub fn status(&self) -> Result<SolutionStatus> {
        self.solution
            .as_ref()
            .map(|s| status_from_quality(s.quality))
            .ok_or(SolverError::NotSolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SolverConfig, SolverQuality};

    /// Engine reporting a fixed quality and fixed column values
    struct FixedEngine {
        quality: SolverQuality,
        values: Vec<f64>,
    }

    impl SolverEngine for FixedEngine {
        fn solve(&self, model: &NativeModel, _config: &SolverConfig) -> Result<Solution> {
            Ok(Solution::new(self.quality, model.epoch()).with_values(self.values.clone(), None))
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn supports_mip(&self) -> bool {
            true
        }
    }

    fn solver_with(quality: SolverQuality, values: Vec<f64>) -> MilpSolver {
        MilpSolver::with_engine(
            MilpSolverSettings::default(),
            Arc::new(FixedEngine { quality, values }),
        )
    }

    #[test]
    fn test_create_named_registers_leaf() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        for (i, domain) in Domain::ALL.into_iter().enumerate() {
            let name = format!("x{}", i);
            let variable = solver.create_named(&name, domain).unwrap();
            assert_eq!(variable.name(), name);
            assert_eq!(variable.domain(), domain);
            let decision = variable.decision().unwrap();
            assert_eq!(solver.model().decision(decision).unwrap().name, name);
            assert!(solver.find_variable(&name).is_some());
        }
        assert!(solver.model().constraints().is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        solver.create_named("x", Domain::AnyReal).unwrap();
        assert!(matches!(
            solver.create_named("x", Domain::AnyInteger),
            Err(SolverError::DuplicateVariable(name)) if name == "x"
        ));
    }

    #[test]
    fn test_anonymous_names_never_reused() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        let first = solver.create_anonymous(Domain::AnyReal).unwrap();
        let constant = solver.lift_int_constant(3, Domain::AnyConstantInteger);
        let second = solver.create_anonymous(Domain::AnyReal).unwrap();
        assert_eq!(first.name(), "v__0");
        assert_eq!(constant.name(), "v__1");
        assert_eq!(second.name(), "v__2");
        assert_eq!(constant.constant_value(), Some(3.0));
        assert!(constant.decision().is_none());
    }

    #[test]
    fn test_combinators_have_no_decision() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        let x = solver.create_named("x", Domain::AnyReal).unwrap();
        let two = solver.lift_real_constant(2.0, Domain::AnyConstantReal);
        let results = [
            solver.sum(&x, &two, Domain::AnyReal).unwrap(),
            solver.negate(&x, Domain::AnyReal).unwrap(),
            solver.scale_multiply(&x, &two, Domain::AnyReal).unwrap(),
            solver.scale_divide(&x, &two, Domain::AnyReal).unwrap(),
        ];
        for result in &results {
            assert!(result.decision().is_none());
            assert!(solver.find_variable(result.name()).is_none());
        }
        assert_eq!(results[0].term().to_string(), "x + 2");
    }

    #[test]
    fn test_foreign_variables_rejected() {
        let mut first = solver_with(SolverQuality::Optimal, vec![]);
        let mut second = solver_with(SolverQuality::Optimal, vec![]);
        let x = first.create_named("x", Domain::AnyReal).unwrap();
        let y = second.create_named("y", Domain::AnyReal).unwrap();

        assert!(matches!(
            second.sum(&x, &y, Domain::AnyReal),
            Err(SolverError::ForeignVariable(name)) if name == "x"
        ));
        assert!(matches!(
            second.set_less_or_equal(&y, &x),
            Err(SolverError::ForeignVariable(_))
        ));
        assert!(matches!(
            second.add_goal("g", &x),
            Err(SolverError::ForeignVariable(_))
        ));
    }

    #[test]
    fn test_constraint_names_shared_counter() {
        let settings = MilpSolverSettings::default().with_fix_broken_ranges(true);
        let mut solver = MilpSolver::with_engine(
            settings,
            Arc::new(FixedEngine {
                quality: SolverQuality::Optimal,
                values: vec![],
            }),
        );
        let b = solver.create_named("b", Domain::BinaryInteger).unwrap();
        let ten = solver.lift_int_constant(10, Domain::AnyConstantInteger);
        solver.set_less_or_equal(&b, &ten).unwrap();
        solver.set_equal(&b, &ten).unwrap();

        let names: Vec<&str> = solver
            .model()
            .constraints()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["c_0", "c_1", "c_2", "c_3"]);
        assert_eq!(solver.constraint_index(), 4);
    }

    #[test]
    fn test_nonlinear_constraint_rejected_without_consuming_name() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        let x = solver.create_named("x", Domain::AnyReal).unwrap();
        let y = solver.create_named("y", Domain::AnyReal).unwrap();
        let product = solver.scale_multiply(&x, &y, Domain::AnyReal).unwrap();
        let zero = solver.lift_int_constant(0, Domain::AnyConstantInteger);

        assert!(matches!(
            solver.set_greater_or_equal(&product, &zero),
            Err(SolverError::NonLinear(_))
        ));
        assert_eq!(solver.constraint_index(), 0);
        assert!(solver.model().constraints().is_empty());
    }

    #[test]
    fn test_goal_expression() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        let x = solver.create_named("x", Domain::AnyReal).unwrap();
        let y = solver.create_named("y", Domain::AnyReal).unwrap();
        let sum = solver.sum(&x, &y, Domain::AnyReal).unwrap();
        solver.add_goal("total", &sum).unwrap();

        assert_eq!(solver.goal_expression("total").unwrap(), "x + y");
        assert_eq!(solver.model().goal("total").unwrap().kind, GoalKind::Maximize);
        assert!(matches!(
            solver.goal_expression("missing"),
            Err(SolverError::GoalNotFound(_))
        ));
    }

    #[test]
    fn test_status_before_solve_is_usage_error() {
        let mut solver = solver_with(SolverQuality::Optimal, vec![]);
        assert!(matches!(solver.status(), Err(SolverError::NotSolved)));
        let x = solver.create_named("x", Domain::AnyReal).unwrap();
        assert!(matches!(solver.value(&x), Err(SolverError::NotSolved)));
    }

    #[test]
    fn test_status_follows_engine_quality() {
        for (quality, status) in [
            (SolverQuality::Feasible, SolutionStatus::Feasible),
            (SolverQuality::LocalOptimal, SolutionStatus::Optimal),
            (SolverQuality::LocalInfeasible, SolutionStatus::Infeasible),
            (SolverQuality::Unknown, SolutionStatus::Unknown),
        ] {
            let mut solver = solver_with(quality, vec![]);
            assert_eq!(solver.solve().unwrap(), status);
            assert_eq!(solver.status().unwrap(), status);
        }
    }

    #[test]
    fn test_values_of_combinators() {
        let mut solver = solver_with(SolverQuality::Feasible, vec![3.0, 4.0]);
        let x = solver.create_named("x", Domain::AnyReal).unwrap();
        let y = solver.create_named("y", Domain::AnyReal).unwrap();
        let sum = solver.sum(&x, &y, Domain::AnyReal).unwrap();
        let negated = solver.negate(&x, Domain::AnyReal).unwrap();
        let two = solver.lift_int_constant(2, Domain::AnyConstantInteger);
        let halved = solver.scale_divide(&y, &two, Domain::AnyReal).unwrap();
        solver.solve().unwrap();

        assert_eq!(solver.value(&sum).unwrap(), 7.0);
        assert_eq!(solver.value(&negated).unwrap(), -3.0);
        assert_eq!(solver.value(&halved).unwrap(), 2.0);
        assert_eq!(solver.value(&two).unwrap(), 2.0);
    }

    #[test]
    fn test_value_without_solution_point() {
        let mut solver = solver_with(SolverQuality::Infeasible, vec![]);
        let x = solver.create_named("x", Domain::AnyInteger).unwrap();
        solver.solve().unwrap();
        assert!(matches!(
            solver.value(&x),
            Err(SolverError::UnresolvedValue(name)) if name == "x"
        ));
    }

    #[test]
    fn test_keep_existing_model() {
        let mut model = NativeModel::new();
        model
            .add_decision(Decision::new("z", crate::domain::NativeType::Real))
            .unwrap();
        model
            .add_constraint(
                "c_0",
                crate::domain::LinearExpr::column(0),
                Relation::LessOrEqual,
                crate::domain::LinearExpr::constant(1.0),
            )
            .unwrap();

        let engine = Arc::new(FixedEngine {
            quality: SolverQuality::Optimal,
            values: vec![],
        });
        let kept = MilpSolver::with_model(
            MilpSolverSettings::default().with_recreate_model_at_start(false),
            engine.clone(),
            model.clone(),
        );
        assert_eq!(kept.model().decisions().len(), 1);
        assert_eq!(kept.constraint_index(), 1);

        let fresh = MilpSolver::with_model(MilpSolverSettings::default(), engine, model);
        assert!(fresh.model().decisions().is_empty());
        assert_eq!(fresh.constraint_index(), 0);
    }
}
