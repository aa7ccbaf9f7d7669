// Domain Mapper
// Translates abstract domains into native variable types and, when native
// ranges cannot be trusted, into explicit bound constraints

use crate::domain::value_objects::{Domain, NativeType, Relation};

/// Supplementary constraint `value relation bound` on a fresh decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundConstraint {
    pub relation: Relation,
    pub bound: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainMapping {
    pub native_type: NativeType,
    pub bounds: Vec<BoundConstraint>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainMapper {
    fix_broken_ranges: bool,
}

impl DomainMapper {
    pub fn new(fix_broken_ranges: bool) -> Self {
        Self { fix_broken_ranges }
    }

    pub fn map(&self, domain: Domain) -> DomainMapping {
        if !self.fix_broken_ranges {
            let native_type = match domain {
                Domain::BinaryInteger | Domain::BinaryConstantInteger => NativeType::Boolean,
                Domain::PositiveOrZeroInteger | Domain::PositiveOrZeroConstantInteger => {
                    NativeType::NonnegativeInteger
                }
                Domain::PositiveOrZeroReal | Domain::PositiveOrZeroConstantReal => {
                    NativeType::NonnegativeReal
                }
                Domain::AnyInteger | Domain::AnyConstantInteger => NativeType::Integer,
                Domain::AnyReal | Domain::AnyConstantReal => NativeType::Real,
            };
            return DomainMapping {
                native_type,
                bounds: Vec::new(),
            };
        }

        // Only the two unrestricted types; ranges become constraints
        let base = domain.base();
        let native_type = if base.is_integer() {
            NativeType::Integer
        } else {
            NativeType::Real
        };
        let mut bounds = Vec::new();
        if base.is_nonnegative() {
            bounds.push(BoundConstraint {
                relation: Relation::GreaterOrEqual,
                bound: 0.0,
            });
        }
        if base.is_binary() {
            bounds.push(BoundConstraint {
                relation: Relation::LessOrEqual,
                bound: 1.0,
            });
        }

        DomainMapping {
            native_type,
            bounds,
        }
    }
}
