// Native expression tree and its linear form
// Terms are immutable; combinators share their operands instead of copying them

use super::solver_service::{Result, SolverError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Handle of a native decision
///
/// The epoch identifies the generation of the native model the decision lives
/// in. Handles of a cleared or replaced model never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionId {
    pub(crate) epoch: u32,
    pub(crate) index: usize,
}

impl DecisionId {
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Algebraic expression over native decisions
///
/// Chains built by repeated `sum` calls grow one level per call, so every
/// walk over the tree (linearization, evaluation, display, equality and drop)
/// uses an explicit stack instead of recursion.
#[derive(Clone)]
pub enum Term {
    Literal(f64),
    Leaf { id: DecisionId, name: Arc<str> },
    Sum(Arc<Term>, Arc<Term>),
    Negate(Arc<Term>),
    ScaleMultiply(Arc<Term>, Arc<Term>),
    ScaleDivide(Arc<Term>, Arc<Term>),
}

enum Step<'a> {
    Visit(&'a Term),
    Combine(&'a Term),
}

enum Piece<'a> {
    Visit(&'a Term, u8),
    Text(&'static str),
}

impl Term {
    pub fn literal(value: f64) -> Self {
        Term::Literal(value)
    }

    pub fn leaf(id: DecisionId, name: &str) -> Self {
        Term::Leaf {
            id,
            name: Arc::from(name),
        }
    }

    pub fn sum(first: &Term, second: &Term) -> Self {
        Term::Sum(Arc::new(first.clone()), Arc::new(second.clone()))
    }

    pub fn negate(term: &Term) -> Self {
        Term::Negate(Arc::new(term.clone()))
    }

    pub fn scale_multiply(term: &Term, constant: &Term) -> Self {
        Term::ScaleMultiply(Arc::new(term.clone()), Arc::new(constant.clone()))
    }

    pub fn scale_divide(term: &Term, constant: &Term) -> Self {
        Term::ScaleDivide(Arc::new(term.clone()), Arc::new(constant.clone()))
    }

    fn operands(&self) -> (Option<&Term>, Option<&Term>) {
        match self {
            Term::Literal(_) | Term::Leaf { .. } => (None, None),
            Term::Negate(term) => (Some(&**term), None),
            Term::Sum(first, second)
            | Term::ScaleMultiply(first, second)
            | Term::ScaleDivide(first, second) => (Some(&**first), Some(&**second)),
        }
    }

    /// Push the operands of a combinator, first operand on top
    fn schedule<'a>(&'a self, steps: &mut Vec<Step<'a>>) {
        steps.push(Step::Combine(self));
        let (first, second) = self.operands();
        if let Some(second) = second {
            steps.push(Step::Visit(second));
        }
        if let Some(first) = first {
            steps.push(Step::Visit(first));
        }
    }

    /// Flatten the tree into a linear expression over decision columns
    pub fn linearize(&self, epoch: u32) -> Result<LinearExpr> {
        let mut steps = vec![Step::Visit(self)];
        let mut results: Vec<LinearExpr> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Term::Literal(value)) => results.push(LinearExpr::constant(*value)),
                Step::Visit(Term::Leaf { id, name }) => {
                    if id.epoch != epoch {
                        return Err(SolverError::StaleVariable(name.to_string()));
                    }
                    results.push(LinearExpr::column(id.index));
                }
                Step::Visit(term) => term.schedule(&mut steps),
                Step::Combine(term) => {
                    let combined = match term {
                        Term::Negate(_) => pop(&mut results)?.scaled(-1.0),
                        Term::Sum(..) => {
                            let second = pop(&mut results)?;
                            let first = pop(&mut results)?;
                            // Merge the smaller side into the larger one
                            let (mut larger, smaller) = if first.len() >= second.len() {
                                (first, second)
                            } else {
                                (second, first)
                            };
                            larger.add_assign(&smaller);
                            larger
                        }
                        Term::ScaleMultiply(..) => {
                            let right = pop(&mut results)?;
                            let left = pop(&mut results)?;
                            if right.is_constant() {
                                left.scaled(right.constant)
                            } else if left.is_constant() {
                                right.scaled(left.constant)
                            } else {
                                return Err(SolverError::NonLinear(term.to_string()));
                            }
                        }
                        Term::ScaleDivide(..) => {
                            let divisor = pop(&mut results)?;
                            let dividend = pop(&mut results)?;
                            if !divisor.is_constant() {
                                return Err(SolverError::NonLinear(term.to_string()));
                            }
                            if divisor.constant == 0.0 {
                                return Err(SolverError::DivisionByZero(term.to_string()));
                            }
                            dividend.scaled(1.0 / divisor.constant)
                        }
                        Term::Literal(_) | Term::Leaf { .. } => continue,
                    };
                    results.push(combined);
                }
            }
        }
        pop(&mut results)
    }

    /// Evaluate the tree against the column values of a solution
    pub fn evaluate(&self, values: &[f64], epoch: u32) -> Result<f64> {
        let mut steps = vec![Step::Visit(self)];
        let mut results: Vec<f64> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Term::Literal(value)) => results.push(*value),
                Step::Visit(Term::Leaf { id, name }) => {
                    if id.epoch != epoch {
                        return Err(SolverError::StaleVariable(name.to_string()));
                    }
                    let value = values
                        .get(id.index)
                        .copied()
                        .ok_or_else(|| SolverError::UnresolvedValue(name.to_string()))?;
                    results.push(value);
                }
                Step::Visit(term) => term.schedule(&mut steps),
                Step::Combine(term) => {
                    let combined = match term {
                        Term::Negate(_) => -pop(&mut results)?,
                        Term::Sum(..) | Term::ScaleMultiply(..) | Term::ScaleDivide(..) => {
                            let second = pop(&mut results)?;
                            let first = pop(&mut results)?;
                            match term {
                                Term::Sum(..) => first + second,
                                Term::ScaleMultiply(..) => first * second,
                                _ => first / second,
                            }
                        }
                        Term::Literal(_) | Term::Leaf { .. } => continue,
                    };
                    results.push(combined);
                }
            }
        }
        pop(&mut results)
    }

    fn precedence(&self) -> u8 {
        match self {
            Term::Sum(..) => 1,
            Term::ScaleMultiply(..) | Term::ScaleDivide(..) => 2,
            Term::Literal(value) if value.is_sign_negative() => 2,
            Term::Negate(_) => 3,
            Term::Literal(_) | Term::Leaf { .. } => 4,
        }
    }

    fn has_operands(&self) -> bool {
        !matches!(self, Term::Literal(_) | Term::Leaf { .. })
    }

    /// Move the uniquely owned operands out of their `Arc`s
    fn detach_operands(&mut self, detached: &mut Vec<Term>) {
        let mut take = |operand: &mut Arc<Term>| {
            if let Some(inner) = Arc::get_mut(operand) {
                if inner.has_operands() {
                    detached.push(std::mem::replace(inner, Term::Literal(0.0)));
                }
            }
        };
        match self {
            Term::Literal(_) | Term::Leaf { .. } => {}
            Term::Negate(term) => take(term),
            Term::Sum(first, second)
            | Term::ScaleMultiply(first, second)
            | Term::ScaleDivide(first, second) => {
                take(first);
                take(second);
            }
        }
    }
}

fn pop<T>(results: &mut Vec<T>) -> Result<T> {
    results
        .pop()
        .ok_or_else(|| SolverError::ExecutionFailed("unbalanced expression walk".to_string()))
}

impl Drop for Term {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        self.detach_operands(&mut detached);
        while let Some(mut term) = detached.pop() {
            // Operands are detached first, so dropping `term` stays shallow
            term.detach_operands(&mut detached);
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            match (left, right) {
                (Term::Literal(a), Term::Literal(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Term::Leaf { id: a, name: m }, Term::Leaf { id: b, name: n }) => {
                    if a != b || m != n {
                        return false;
                    }
                }
                (Term::Negate(a), Term::Negate(b)) => pending.push((&**a, &**b)),
                (Term::Sum(a, b), Term::Sum(c, d))
                | (Term::ScaleMultiply(a, b), Term::ScaleMultiply(c, d))
                | (Term::ScaleDivide(a, b), Term::ScaleDivide(c, d)) => {
                    if !(Arc::ptr_eq(a, c) && Arc::ptr_eq(b, d)) {
                        pending.push((&**a, &**c));
                        pending.push((&**b, &**d));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Term").field(&format_args!("{}", self)).finish()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Visit(self, 0)];
        while let Some(piece) = pieces.pop() {
            let (term, min_precedence) = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Visit(term, min_precedence) => (term, min_precedence),
            };
            if term.precedence() < min_precedence {
                f.write_str("(")?;
                pieces.push(Piece::Text(")"));
            }
            match term {
                Term::Literal(value) => write!(f, "{}", value)?,
                Term::Leaf { name, .. } => f.write_str(name)?,
                Term::Negate(operand) => {
                    f.write_str("-")?;
                    pieces.push(Piece::Visit(&**operand, 3));
                }
                Term::Sum(first, second) => {
                    pieces.push(Piece::Visit(&**second, 1));
                    pieces.push(Piece::Text(" + "));
                    pieces.push(Piece::Visit(&**first, 1));
                }
                Term::ScaleMultiply(operand, constant) => {
                    pieces.push(Piece::Visit(&**constant, 3));
                    pieces.push(Piece::Text(" * "));
                    pieces.push(Piece::Visit(&**operand, 2));
                }
                Term::ScaleDivide(operand, constant) => {
                    pieces.push(Piece::Visit(&**constant, 3));
                    pieces.push(Piece::Text(" / "));
                    pieces.push(Piece::Visit(&**operand, 2));
                }
            }
        }
        Ok(())
    }
}

/// Linear expression: sum of coefficient * column plus a constant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    coefficients: BTreeMap<usize, f64>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn constant(value: f64) -> Self {
        Self {
            coefficients: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn column(index: usize) -> Self {
        let mut expr = Self::default();
        expr.add_term(index, 1.0);
        expr
    }

    pub fn add_term(&mut self, index: usize, coefficient: f64) {
        let entry = self.coefficients.entry(index).or_insert(0.0);
        *entry += coefficient;
        if *entry == 0.0 {
            self.coefficients.remove(&index);
        }
    }

    pub fn add_assign(&mut self, other: &LinearExpr) {
        for (&index, &coefficient) in &other.coefficients {
            self.add_term(index, coefficient);
        }
        self.constant += other.constant;
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        if factor == 0.0 {
            return Self::default();
        }
        for coefficient in self.coefficients.values_mut() {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self
    }

    pub fn is_constant(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficient(&self, index: usize) -> f64 {
        self.coefficients.get(&index).copied().unwrap_or(0.0)
    }

    /// Non-zero (column, coefficient) pairs in column order
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients.iter().map(|(&index, &coefficient)| (index, coefficient))
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty() && self.constant == 0.0
    }

    /// Value of the expression for the given column values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms()
            .map(|(index, coefficient)| coefficient * values.get(index).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}
