// MPS reader and writer
// Writes fixed-column and free MPS; reads free MPS only

use super::check_name;
use crate::domain::{
    models::{Decision, NativeModel},
    solver_service::{Result, SolverError},
    value_objects::{GoalKind, NativeType, Relation},
    LinearExpr,
};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Values at or beyond this magnitude are read as infinite
const MPS_INFINITY: f64 = 1e30;

/// 0-based start columns of fields 2..6 in fixed MPS
const FIXED_FIELD_STARTS: [usize; 5] = [4, 14, 24, 39, 49];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpsStyle {
    Fixed,
    Free,
}

pub(crate) fn model_name(model: &NativeModel) -> &str {
    if model.name().is_empty() {
        "MODEL"
    } else {
        model.name()
    }
}

pub(crate) fn write_fields<W: Write>(
    out: &mut W,
    style: MpsStyle,
    code: &str,
    fields: &[&str],
) -> Result<()> {
    let mut line = match style {
        MpsStyle::Fixed => format!(" {:<2}", code),
        MpsStyle::Free if code.is_empty() => "   ".to_string(),
        MpsStyle::Free => format!(" {}", code),
    };
    for (position, field) in fields.iter().enumerate() {
        match style {
            MpsStyle::Fixed => {
                let start = FIXED_FIELD_STARTS[position];
                if line.len() < start {
                    line.push_str(&" ".repeat(start - line.len()));
                } else {
                    // Overlong field, keep the line tokenizable
                    line.push(' ');
                }
            }
            MpsStyle::Free => line.push(' '),
        }
        line.push_str(field);
    }
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

pub fn write_mps<W: Write>(model: &NativeModel, style: MpsStyle, out: &mut W) -> Result<()> {
    for name in model
        .decisions()
        .iter()
        .map(|d| d.name.as_str())
        .chain(model.constraints().iter().map(|c| c.name.as_str()))
        .chain(model.goals().iter().map(|g| g.name.as_str()))
    {
        check_name(name)?;
    }

    let kind = model.goals().first().map(|g| g.kind);
    if model.goals().iter().any(|g| Some(g.kind) != kind) {
        return Err(SolverError::UnsupportedModel(
            "MPS holds a single objective sense, goals mix Maximize and Minimize".to_string(),
        ));
    }

    writeln!(out, "NAME          {}", model_name(model))?;
    if kind == Some(GoalKind::Maximize) {
        writeln!(out, "OBJSENSE")?;
        writeln!(out, "    MAX")?;
    }

    // Rows
    writeln!(out, "ROWS")?;
    for goal in model.goals() {
        write_fields(out, style, "N", &[goal.name.as_str()])?;
    }
    for constraint in model.constraints() {
        let code = match constraint.relation {
            Relation::LessOrEqual => "L",
            Relation::GreaterOrEqual => "G",
            Relation::Equal => "E",
        };
        write_fields(out, style, code, &[constraint.name.as_str()])?;
    }

    // Column-major view of goal and constraint coefficients
    let mut entries: Vec<Vec<(&str, f64)>> = vec![Vec::new(); model.decisions().len()];
    let rows = model
        .goals()
        .iter()
        .map(|g| (g.name.as_str(), &g.expression))
        .chain(
            model
                .constraints()
                .iter()
                .map(|c| (c.name.as_str(), &c.expression)),
        );
    for (row, expression) in rows {
        for (index, coefficient) in expression.terms() {
            entries[index].push((row, coefficient));
        }
    }

    writeln!(out, "COLUMNS")?;
    let mut in_integer_block = false;
    let mut markers = 0;
    for (decision, column_entries) in model.decisions().iter().zip(&entries) {
        if decision.integer != in_integer_block {
            let marker = if decision.integer { "'INTORG'" } else { "'INTEND'" };
            let marker_name = format!("MARKER{}", markers);
            write_fields(out, style, "", &[marker_name.as_str(), "'MARKER'", marker])?;
            markers += 1;
            in_integer_block = decision.integer;
        }
        if column_entries.is_empty() {
            write_fields(out, style, "", &[decision.name.as_str()])?;
        }
        for &(row, coefficient) in column_entries {
            let value = coefficient.to_string();
            write_fields(out, style, "", &[decision.name.as_str(), row, value.as_str()])?;
        }
    }
    if in_integer_block {
        let marker_name = format!("MARKER{}", markers);
        write_fields(out, style, "", &[marker_name.as_str(), "'MARKER'", "'INTEND'"])?;
    }

    writeln!(out, "RHS")?;
    for goal in model.goals() {
        if goal.expression.constant != 0.0 {
            let value = (-goal.expression.constant).to_string();
            write_fields(out, style, "", &["RHS", goal.name.as_str(), value.as_str()])?;
        }
    }
    for constraint in model.constraints() {
        if constraint.rhs != 0.0 {
            let value = constraint.rhs.to_string();
            write_fields(out, style, "", &["RHS", constraint.name.as_str(), value.as_str()])?;
        }
    }

    writeln!(out, "BOUNDS")?;
    for decision in model.decisions() {
        write_bounds(out, style, decision)?;
    }

    writeln!(out, "ENDATA")?;
    Ok(())
}

fn write_bounds<W: Write>(out: &mut W, style: MpsStyle, decision: &Decision) -> Result<()> {
    let name = decision.name.as_str();
    match decision.native_type() {
        Some(NativeType::Boolean) => write_fields(out, style, "BV", &["BND", name]),
        Some(NativeType::NonnegativeInteger) | Some(NativeType::NonnegativeReal) => {
            write_fields(out, style, "PL", &["BND", name])
        }
        Some(NativeType::Integer) | Some(NativeType::Real) => {
            write_fields(out, style, "FR", &["BND", name])
        }
        None if decision.lower == decision.upper => {
            let value = decision.lower.to_string();
            write_fields(out, style, "FX", &["BND", name, value.as_str()])
        }
        None => {
            if decision.lower == f64::NEG_INFINITY {
                write_fields(out, style, "MI", &["BND", name])?;
            } else if decision.lower != 0.0 {
                let value = decision.lower.to_string();
                write_fields(out, style, "LO", &["BND", name, value.as_str()])?;
            }
            if decision.upper != f64::INFINITY {
                let value = decision.upper.to_string();
                write_fields(out, style, "UP", &["BND", name, value.as_str()])?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Bounds,
    End,
}

#[derive(Debug, Clone, Copy)]
enum RowKind {
    Objective,
    Constraint(Relation),
}

#[derive(Debug)]
struct ParsedColumn {
    name: String,
    integer: bool,
    lower: f64,
    upper: f64,
    entries: Vec<(usize, f64)>,
}

struct MpsParser {
    line: usize,
    section: Section,
    name: String,
    maximize: bool,
    integer_block: bool,
    rows: Vec<(String, RowKind)>,
    row_index: HashMap<String, usize>,
    columns: Vec<ParsedColumn>,
    column_index: HashMap<String, usize>,
    rhs: HashMap<usize, f64>,
}

/// Parse a free MPS model
pub fn read_free_mps<R: BufRead>(reader: R) -> Result<NativeModel> {
    let mut parser = MpsParser::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        parser.line = number + 1;
        parser.feed(&line)?;
        if parser.section == Section::End {
            break;
        }
    }
    parser.finish()
}

impl MpsParser {
    fn new() -> Self {
        Self {
            line: 0,
            section: Section::Header,
            name: String::new(),
            maximize: false,
            integer_block: false,
            rows: Vec::new(),
            row_index: HashMap::new(),
            columns: Vec::new(),
            column_index: HashMap::new(),
            rhs: HashMap::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> SolverError {
        SolverError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn number(&self, token: &str) -> Result<f64> {
        let value: f64 = token
            .parse()
            .map_err(|_| self.error(format!("invalid number '{}'", token)))?;
        Ok(if value >= MPS_INFINITY {
            f64::INFINITY
        } else if value <= -MPS_INFINITY {
            f64::NEG_INFINITY
        } else {
            value
        })
    }

    fn feed(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() || line.starts_with('*') {
            return Ok(());
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if !line.starts_with(char::is_whitespace) {
            return self.section_header(&tokens);
        }
        match self.section {
            Section::ObjSense => self.sense(tokens[0]),
            Section::Rows => self.row(&tokens),
            Section::Columns => self.column(&tokens),
            Section::Rhs => self.rhs(&tokens),
            Section::Bounds => self.bound(&tokens),
            Section::Header | Section::End => Err(self.error("data line outside of a section")),
        }
    }

    fn section_header(&mut self, tokens: &[&str]) -> Result<()> {
        match tokens[0].to_ascii_uppercase().as_str() {
            "NAME" => {
                self.name = tokens[1..].join(" ");
                self.section = Section::Header;
            }
            "OBJSENSE" => {
                self.section = Section::ObjSense;
                if let Some(sense) = tokens.get(1) {
                    self.sense(sense)?;
                }
            }
            "ROWS" => self.section = Section::Rows,
            "COLUMNS" => self.section = Section::Columns,
            "RHS" => self.section = Section::Rhs,
            "BOUNDS" => self.section = Section::Bounds,
            "ENDATA" => self.section = Section::End,
            "RANGES" => return Err(self.error("RANGES section is not supported")),
            other => return Err(self.error(format!("unknown section '{}'", other))),
        }
        Ok(())
    }

    fn sense(&mut self, token: &str) -> Result<()> {
        self.maximize = match token.to_ascii_uppercase().as_str() {
            "MAX" | "MAXIMIZE" => true,
            "MIN" | "MINIMIZE" => false,
            other => return Err(self.error(format!("unknown objective sense '{}'", other))),
        };
        Ok(())
    }

    fn row(&mut self, tokens: &[&str]) -> Result<()> {
        let [kind, name] = tokens else {
            return Err(self.error("row lines need a type and a name"));
        };
        let kind = match kind.to_ascii_uppercase().as_str() {
            "N" => RowKind::Objective,
            "L" => RowKind::Constraint(Relation::LessOrEqual),
            "G" => RowKind::Constraint(Relation::GreaterOrEqual),
            "E" => RowKind::Constraint(Relation::Equal),
            other => return Err(self.error(format!("unknown row type '{}'", other))),
        };
        if self.row_index.contains_key(*name) {
            return Err(self.error(format!("duplicate row '{}'", name)));
        }
        self.row_index.insert(name.to_string(), self.rows.len());
        self.rows.push((name.to_string(), kind));
        Ok(())
    }

    fn row_of(&self, name: &str) -> Result<usize> {
        self.row_index
            .get(name)
            .copied()
            .ok_or_else(|| self.error(format!("unknown row '{}'", name)))
    }

    fn column(&mut self, tokens: &[&str]) -> Result<()> {
        if tokens.len() >= 3 && tokens[1] == "'MARKER'" {
            match tokens[2] {
                "'INTORG'" => self.integer_block = true,
                "'INTEND'" => self.integer_block = false,
                other => return Err(self.error(format!("unknown marker {}", other))),
            }
            return Ok(());
        }

        let name = tokens[0];
        let index = match self.column_index.get(name) {
            Some(&index) => index,
            None => {
                let index = self.columns.len();
                self.column_index.insert(name.to_string(), index);
                self.columns.push(ParsedColumn {
                    name: name.to_string(),
                    integer: self.integer_block,
                    lower: 0.0,
                    upper: f64::INFINITY,
                    entries: Vec::new(),
                });
                index
            }
        };

        let pairs = &tokens[1..];
        if pairs.len() % 2 != 0 {
            return Err(self.error(format!("column '{}' has an unpaired entry", name)));
        }
        for pair in pairs.chunks(2) {
            let row = self.row_of(pair[0])?;
            let value = self.number(pair[1])?;
            self.columns[index].entries.push((row, value));
        }
        Ok(())
    }

    fn rhs(&mut self, tokens: &[&str]) -> Result<()> {
        // The set name is optional in free MPS
        let pairs = if tokens.len() % 2 == 1 {
            &tokens[1..]
        } else {
            tokens
        };
        for pair in pairs.chunks(2) {
            let row = self.row_of(pair[0])?;
            let value = self.number(pair[1])?;
            self.rhs.insert(row, value);
        }
        Ok(())
    }

    fn bound(&mut self, tokens: &[&str]) -> Result<()> {
        let kind = tokens[0].to_ascii_uppercase();
        let rest = &tokens[1..];
        let needs_value = !matches!(kind.as_str(), "FR" | "MI" | "PL" | "BV");

        let (column, value) = match (needs_value, rest.len()) {
            (true, 3) => (rest[1], Some(rest[2])),
            (true, 2) => (rest[0], Some(rest[1])),
            (false, 3) => (rest[1], Some(rest[2])),
            (false, 2) if self.column_index.contains_key(rest[1]) => (rest[1], None),
            (false, 2) => (rest[0], Some(rest[1])),
            (false, 1) => (rest[0], None),
            _ => return Err(self.error(format!("malformed {} bound", kind))),
        };
        let index = *self
            .column_index
            .get(column)
            .ok_or_else(|| self.error(format!("bound on unknown column '{}'", column)))?;
        let value = match value {
            Some(token) => Some(self.number(token)?),
            None => None,
        };
        let value_or_error = |this: &Self| {
            value.ok_or_else(|| this.error(format!("{} bound needs a value", kind)))
        };

        match kind.as_str() {
            "UP" | "UI" => {
                let upper = value_or_error(self)?;
                let parsed = &mut self.columns[index];
                parsed.upper = upper;
                if upper < 0.0 && parsed.lower == 0.0 {
                    parsed.lower = f64::NEG_INFINITY;
                }
                if kind == "UI" {
                    parsed.integer = true;
                }
            }
            "LO" | "LI" => {
                let lower = value_or_error(self)?;
                let parsed = &mut self.columns[index];
                parsed.lower = lower;
                if kind == "LI" {
                    parsed.integer = true;
                }
            }
            "FX" => {
                let fixed = value_or_error(self)?;
                let parsed = &mut self.columns[index];
                parsed.lower = fixed;
                parsed.upper = fixed;
            }
            "FR" => {
                let parsed = &mut self.columns[index];
                parsed.lower = f64::NEG_INFINITY;
                parsed.upper = f64::INFINITY;
            }
            "MI" => self.columns[index].lower = f64::NEG_INFINITY,
            "PL" => self.columns[index].upper = f64::INFINITY,
            "BV" => {
                let parsed = &mut self.columns[index];
                parsed.integer = true;
                parsed.lower = 0.0;
                parsed.upper = 1.0;
            }
            other => return Err(self.error(format!("unknown bound type '{}'", other))),
        }
        Ok(())
    }

    fn finish(self) -> Result<NativeModel> {
        let mut model = NativeModel::new().with_name(self.name);
        let mut expressions: Vec<LinearExpr> = vec![LinearExpr::default(); self.rows.len()];

        for (index, column) in self.columns.into_iter().enumerate() {
            for (row, value) in column.entries {
                expressions[row].add_term(index, value);
            }
            let decision = Decision {
                name: column.name,
                integer: column.integer,
                lower: column.lower,
                upper: column.upper,
            };
            model.add_decision(decision)?;
        }

        let kind = if self.maximize {
            GoalKind::Maximize
        } else {
            GoalKind::Minimize
        };
        for (row, ((name, row_kind), mut expression)) in
            self.rows.into_iter().zip(expressions).enumerate()
        {
            let rhs = self.rhs.get(&row).copied().unwrap_or(0.0);
            match row_kind {
                RowKind::Objective => {
                    expression.constant = -rhs;
                    let text = model.describe(&expression);
                    model.add_goal(name, kind, expression, text)?;
                }
                RowKind::Constraint(relation) => {
                    model.add_constraint(name, expression, relation, LinearExpr::constant(rhs))?;
                }
            }
        }
        Ok(model)
    }
}
