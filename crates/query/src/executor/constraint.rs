//! Comparison constraints and negated scans.

use crate::executor::scan::{ApplyInput, Field, Scan};
use crate::prefix::{Prefix, Register};
use crate::store::Pattern;
use core::cmp::Ordering;
use tessera_core::{Identity, Interner, RawValue};

/// Comparison operator of a [`Constraint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    /// Returns true if `ordering` satisfies this operator.
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::Less => ordering == Ordering::Less,
            Comparison::LessOrEqual => ordering != Ordering::Greater,
            Comparison::Greater => ordering == Ordering::Greater,
            Comparison::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

/// A filter over two resolved fields of a complete prefix.
///
/// Equality compares interned ids, so numbers and strings never equal each
/// other. Ordering operators compare numbers numerically and strings
/// lexicographically; mixed or unordered pairs (NaN) never satisfy them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Constraint {
    op: Comparison,
    left: Field,
    right: Field,
}

impl Constraint {
    /// Creates a new constraint.
    pub fn new(op: Comparison, left: Field, right: Field) -> Self {
        Self { op, left, right }
    }

    /// Returns the operator.
    pub fn op(&self) -> Comparison {
        self.op
    }

    /// Returns the two operand fields.
    pub fn fields(&self) -> [Field; 2] {
        [self.left, self.right]
    }

    /// Iterates over the registers this constraint reads.
    pub fn registers(&self) -> impl Iterator<Item = Register> {
        [self.left, self.right].into_iter().filter_map(|f| f.register())
    }

    /// Tests the constraint under `prefix`. Unresolved operands fail.
    pub fn test(&self, prefix: &Prefix, interner: &Interner) -> bool {
        let (Some(left), Some(right)) = (self.left.resolve(prefix), self.right.resolve(prefix)) else {
            return false;
        };
        match self.op {
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
            op => {
                let ordering = match (interner.try_reverse(left), interner.try_reverse(right)) {
                    (Some(RawValue::Number(a)), Some(RawValue::Number(b))) => a.partial_cmp(b),
                    (Some(RawValue::String(a)), Some(RawValue::String(b))) => Some(a.cmp(b)),
                    _ => None,
                };
                ordering.map_or(false, |ordering| op.accepts(ordering))
            }
        }
    }
}

/// A pattern that must have no present match.
///
/// Its variables must all be bound by the positive scans of the same join;
/// `Field::Ignore` positions match anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotScan {
    scan: Scan,
}

impl NotScan {
    /// Creates a new negated pattern.
    pub fn new(entity: Field, attribute: Field, value: Field, context: Field) -> Self {
        Self {
            scan: Scan::new(entity, attribute, value, context),
        }
    }

    /// Creates a negated pattern over any context.
    pub fn eav(entity: Field, attribute: Field, value: Field) -> Self {
        Self::new(entity, attribute, value, Field::Ignore)
    }

    /// Returns the underlying pattern.
    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    /// Iterates over the registers this pattern reads.
    pub fn registers(&self) -> impl Iterator<Item = Register> + '_ {
        self.scan.registers()
    }

    /// Resolves the pattern against a complete prefix.
    pub fn resolve(&self, prefix: &Prefix) -> Pattern {
        self.scan.resolve(prefix)
    }

    /// Binds this pattern's registers from `identity`; see [`Scan::apply_input`].
    pub fn seed(&self, identity: &Identity, prefix: &mut Prefix) -> bool {
        self.scan.apply_input(identity, prefix) == ApplyInput::Bound
    }
}
