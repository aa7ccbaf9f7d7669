// Modeling-layer variable backed by a native term

use super::expression::{DecisionId, Term};
use super::value_objects::Domain;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Identity of the solver instance that created a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        InstanceId(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the adapter needs from a variable: its native term and native leaf
pub trait NativeVariable {
    fn name(&self) -> &str;

    fn domain(&self) -> Domain;

    fn term(&self) -> &Term;

    /// Native decision, present only for model leaves
    fn decision(&self) -> Option<DecisionId>;

    fn owner(&self) -> InstanceId;
}

#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    domain: Domain,
    constant_value: Option<f64>,
    term: Term,
    decision: Option<DecisionId>,
    owner: InstanceId,
}

impl Variable {
    /// Leaf bound to a native decision
    pub(crate) fn leaf(owner: InstanceId, name: String, domain: Domain, decision: DecisionId) -> Self {
        let term = Term::leaf(decision, &name);
        Self {
            name,
            domain,
            constant_value: None,
            term,
            decision: Some(decision),
            owner,
        }
    }

    /// Pure expression without a native decision
    pub(crate) fn expression(owner: InstanceId, name: String, domain: Domain, term: Term) -> Self {
        let constant_value = match term {
            Term::Literal(value) => Some(value),
            _ => None,
        };
        Self {
            name,
            domain,
            constant_value,
            term,
            decision: None,
            owner,
        }
    }

    pub(crate) fn with_constant_value(mut self, value: Option<f64>) -> Self {
        self.constant_value = value;
        self
    }

    pub fn constant_value(&self) -> Option<f64> {
        self.constant_value
    }

    pub fn is_leaf(&self) -> bool {
        self.decision.is_some()
    }
}

impl NativeVariable for Variable {
    fn name(&self) -> &str {
        &self.name
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    fn term(&self) -> &Term {
        &self.term
    }

    fn decision(&self) -> Option<DecisionId> {
        self.decision
    }

    fn owner(&self) -> InstanceId {
        self.owner
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) = {}", self.name, self.domain, self.term)
    }
}
