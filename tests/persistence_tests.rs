use milpbridge::{
    Domain, FileFormat, MilpSolver, MilpSolverSettings, NativeVariable, SolutionStatus,
    SolverError,
};
use std::fs;
use tempfile::TempDir;

fn solver() -> MilpSolver {
    MilpSolver::new(MilpSolverSettings::default()).unwrap()
}

/// x, y >= 0 integers with x + y <= 10, maximizing x + y
fn build_bounded_sum(solver: &mut MilpSolver) {
    let x = solver.create_named("x", Domain::PositiveOrZeroInteger).unwrap();
    let y = solver.create_named("y", Domain::PositiveOrZeroInteger).unwrap();
    let sum = solver.sum(&x, &y, Domain::PositiveOrZeroInteger).unwrap();
    let ten = solver.lift_int_constant(10, Domain::PositiveOrZeroConstantInteger);
    solver.set_less_or_equal(&sum, &ten).unwrap();
    solver.add_goal("total", &sum).unwrap();
}

fn solved_total(solver: &mut MilpSolver) -> f64 {
    assert_eq!(solver.solve().unwrap(), SolutionStatus::Optimal);
    let x = solver.variable("x").unwrap().clone();
    let y = solver.variable("y").unwrap().clone();
    let sum = solver.sum(&x, &y, Domain::PositiveOrZeroInteger).unwrap();
    solver.value(&sum).unwrap()
}

#[test]
fn test_reload_same_solver() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.mps");

    let mut solver = solver();
    build_bounded_sum(&mut solver);
    let x_before = solver.variable("x").unwrap().clone();
    solver.save_model_to_file(&path).unwrap();

    let report = solver.load_model(&path).unwrap();
    assert!(report.is_lossless());
    assert_eq!(report.rebound, ["x", "y"]);

    assert!((solved_total(&mut solver) - 10.0).abs() < 1e-6);
    assert!(matches!(
        solver.value(&x_before),
        Err(SolverError::StaleVariable(name)) if name == "x"
    ));
}

#[test]
fn test_reload_into_fresh_solver() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.mps");
    let data_path = dir.path().join("solver.json");

    let mut original = solver();
    build_bounded_sum(&mut original);
    original.save_model_to_file(&model_path).unwrap();
    original.save_solver_data_to_file(&data_path).unwrap();

    let mut restored = solver();
    let report = restored
        .load_model_from_files(&model_path, &data_path)
        .unwrap();

    assert!(report.is_lossless());
    assert_eq!(restored.variables().count(), 2);
    assert_eq!(restored.variable_index(), original.variable_index());
    assert_eq!(restored.constraint_index(), original.constraint_index());
    assert_eq!(
        restored.variable("x").unwrap().domain(),
        Domain::PositiveOrZeroInteger
    );
    assert_eq!(restored.goal_expression("total").unwrap(), "x + y");
    assert!((solved_total(&mut restored) - 10.0).abs() < 1e-6);
}

#[test]
fn test_generated_names_not_reused_after_reload() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.mps");
    let data_path = dir.path().join("solver.json");

    let mut original = solver();
    build_bounded_sum(&mut original);
    original.create_anonymous(Domain::AnyReal).unwrap();
    original.save_model_to_file(&model_path).unwrap();
    original.save_solver_data_to_file(&data_path).unwrap();

    let mut restored = solver();
    restored
        .load_model_from_files(&model_path, &data_path)
        .unwrap();
    let fresh = restored.create_anonymous(Domain::AnyReal).unwrap();
    assert!(restored.find_variable(fresh.name()).is_some());
    assert_eq!(restored.variables().count(), 4);

    let x = restored.variable("x").unwrap().clone();
    let one = restored.lift_int_constant(1, Domain::AnyConstantInteger);
    restored.set_greater_or_equal(&x, &one).unwrap();
    let names: Vec<&str> = restored
        .model()
        .constraints()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["c_0", "c_1"]);
}

#[test]
fn test_reload_reports_dropped_variables() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.mps");

    let mut solver = solver();
    build_bounded_sum(&mut solver);
    solver.save_model_to_file(&path).unwrap();
    solver.create_named("late", Domain::AnyReal).unwrap();

    let report = solver.load_model(&path).unwrap();
    assert_eq!(report.dropped, ["late"]);
    assert!(!report.is_lossless());
    assert!(solver.find_variable("late").is_none());
    assert_eq!(solver.model().decisions().len(), 2);
}

#[test]
fn test_save_every_format() {
    let dir = TempDir::new().unwrap();
    let mut solver = solver();
    build_bounded_sum(&mut solver);

    for (format, file) in [
        (FileFormat::Mps, "model.mps"),
        (FileFormat::FreeMps, "model.free.mps"),
        (FileFormat::Smps, "model.smps"),
        (FileFormat::Oml, "model.oml"),
    ] {
        let path = dir.path().join(file);
        solver.save_model_to_file_as(format, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.is_empty(), "{} produced no output", format);
    }

    let oml = fs::read_to_string(dir.path().join("model.oml")).unwrap();
    assert!(oml.contains("Maximize[total -> x + y]"));
}

#[test]
fn test_configured_format_used_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.oml");
    let settings = MilpSolverSettings::default().with_model_format(FileFormat::Oml);
    let mut solver = MilpSolver::new(settings).unwrap();
    build_bounded_sum(&mut solver);

    solver.save_model_to_file(&path).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("Model["));
}

#[test]
fn test_incompatible_solver_data_file() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.mps");
    let data_path = dir.path().join("solver.json");

    let mut solver = solver();
    build_bounded_sum(&mut solver);
    solver.save_model_to_file(&model_path).unwrap();
    fs::write(
        &data_path,
        r#"{"version": 2, "constraint_index": 0, "variable_index": 0, "variables": []}"#,
    )
    .unwrap();

    assert!(matches!(
        solver.load_model_from_files(&model_path, &data_path),
        Err(SolverError::IncompatibleSolverData { found: 2, expected: 1 })
    ));
    // The failed load leaves the model untouched
    assert_eq!(solver.model().decisions().len(), 2);
}

#[test]
fn test_missing_model_file() {
    let dir = TempDir::new().unwrap();
    let mut solver = solver();
    assert!(matches!(
        solver.load_model(dir.path().join("absent.mps")),
        Err(SolverError::Io(_))
    ));
}

#[test]
fn test_goal_named_like_generated_constraint_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.mps");

    let mut solver = solver();
    let x = solver.create_named("x", Domain::PositiveOrZeroInteger).unwrap();
    let ten = solver.lift_int_constant(10, Domain::PositiveOrZeroConstantInteger);
    solver.add_goal("c_0", &x).unwrap();
    solver.set_less_or_equal(&x, &ten).unwrap();
    solver.save_model_to_file(&path).unwrap();

    let report = solver.load_model(&path).unwrap();
    assert!(report.is_lossless());
    assert!(solver.model().goal("c_0").is_some());
    assert!(solver.model().has_constraint("c_1"));

    assert_eq!(solver.solve().unwrap(), SolutionStatus::Optimal);
    let x = solver.variable("x").unwrap().clone();
    assert!((solver.value(&x).unwrap() - 10.0).abs() < 1e-6);
}
