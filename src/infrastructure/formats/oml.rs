// OML writer
// Decisions are grouped by domain, goals keep their registered direction

use super::check_name;
use crate::domain::{
    models::{Decision, NativeModel},
    solver_service::Result,
    value_objects::NativeType,
};
use std::io::Write;

fn oml_number(value: f64) -> String {
    if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn oml_domain(decision: &Decision) -> String {
    match decision.native_type() {
        Some(NativeType::Boolean) => "Booleans".to_string(),
        Some(NativeType::Integer) => "Integers".to_string(),
        Some(NativeType::Real) => "Reals".to_string(),
        _ => {
            let set = if decision.integer { "Integers" } else { "Reals" };
            format!(
                "{}[{}, {}]",
                set,
                oml_number(decision.lower),
                oml_number(decision.upper)
            )
        }
    }
}

pub fn write_oml<W: Write>(model: &NativeModel, out: &mut W) -> Result<()> {
    let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
    for decision in model.decisions() {
        check_name(&decision.name)?;
        let domain = oml_domain(decision);
        match groups.iter_mut().find(|(d, _)| *d == domain) {
            Some((_, names)) => names.push(decision.name.as_str()),
            None => groups.push((domain, vec![decision.name.as_str()])),
        }
    }

    let mut sections: Vec<String> = groups
        .into_iter()
        .map(|(domain, names)| format!("  Decisions[{}, {}]", domain, names.join(", ")))
        .collect();

    if !model.constraints().is_empty() {
        let mut lines = Vec::with_capacity(model.constraints().len());
        for constraint in model.constraints() {
            check_name(&constraint.name)?;
            lines.push(format!(
                "    {} -> {} {} {}",
                constraint.name,
                model.describe(&constraint.expression),
                constraint.relation,
                oml_number(constraint.rhs)
            ));
        }
        sections.push(format!("  Constraints[\n{}\n  ]", lines.join(",\n")));
    }

    if !model.goals().is_empty() {
        let mut lines = Vec::with_capacity(model.goals().len());
        for goal in model.goals() {
            check_name(&goal.name)?;
            lines.push(format!(
                "    {}[{} -> {}]",
                goal.kind,
                goal.name,
                model.describe(&goal.expression)
            ));
        }
        sections.push(format!("  Goals[\n{}\n  ]", lines.join(",\n")));
    }

    writeln!(out, "Model[")?;
    if !sections.is_empty() {
        writeln!(out, "{}", sections.join(",\n"))?;
    }
    writeln!(out, "]")?;
    Ok(())
}
