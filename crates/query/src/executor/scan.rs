//! Scan patterns and single-fact binding.

use crate::prefix::{Prefix, Register};
use crate::store::Pattern;
use tessera_core::{Id, Identity};

/// One position of a scan or output template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Must equal this id.
    Constant(Id),
    /// Bound to (or binds) a register.
    Variable(Register),
    /// Matches anything and binds nothing.
    Ignore,
}

impl Field {
    /// Returns the value this field requires under `prefix`, if any.
    #[inline]
    pub fn resolve(&self, prefix: &Prefix) -> Option<Id> {
        match *self {
            Field::Constant(id) => Some(id),
            Field::Variable(register) => prefix.get(register),
            Field::Ignore => None,
        }
    }

    /// Returns the register this field refers to.
    #[inline]
    pub fn register(&self) -> Option<Register> {
        match *self {
            Field::Variable(register) => Some(register),
            _ => None,
        }
    }
}

impl From<Id> for Field {
    fn from(id: Id) -> Self {
        Field::Constant(id)
    }
}

/// Outcome of binding a scan against a single fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyInput {
    /// A constant field disagrees with the fact; the scan does not apply.
    NotApplicable,
    /// Every register was bound consistently.
    Bound,
    /// A register would need two different values.
    Conflict,
}

impl ApplyInput {
    /// Returns false only for a binding conflict.
    ///
    /// A scan the fact does not apply to is a skip, not a rejection.
    #[inline]
    pub fn is_ok(self) -> bool {
        !matches!(self, ApplyInput::Conflict)
    }
}

/// A pattern over the (entity, attribute, value, context) positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scan {
    fields: [Field; 4],
}

impl Scan {
    /// Creates a new scan.
    pub fn new(entity: Field, attribute: Field, value: Field, context: Field) -> Self {
        Self {
            fields: [entity, attribute, value, context],
        }
    }

    /// Creates a scan over any context.
    pub fn eav(entity: Field, attribute: Field, value: Field) -> Self {
        Self::new(entity, attribute, value, Field::Ignore)
    }

    /// Returns the fields in (entity, attribute, value, context) order.
    #[inline]
    pub fn fields(&self) -> &[Field; 4] {
        &self.fields
    }

    /// Iterates over the registers this scan refers to.
    pub fn registers(&self) -> impl Iterator<Item = Register> + '_ {
        self.fields.iter().filter_map(Field::register)
    }

    /// Resolves every field against `prefix`; unbound registers and ignored
    /// fields resolve to `None`.
    pub fn resolve(&self, prefix: &Prefix) -> Pattern {
        [
            self.fields[0].resolve(prefix),
            self.fields[1].resolve(prefix),
            self.fields[2].resolve(prefix),
            self.fields[3].resolve(prefix),
        ]
    }

    /// Binds this scan's registers from `identity`.
    ///
    /// Constant fields are checked first; any mismatch returns
    /// `NotApplicable` without touching `prefix`. Registers already bound
    /// (including by an earlier field of this scan) must agree with the
    /// fact. On `Conflict` the prefix may be partially extended and should be
    /// discarded.
    pub fn apply_input(&self, identity: &Identity, prefix: &mut Prefix) -> ApplyInput {
        let values = identity.to_array();
        for (field, &value) in self.fields.iter().zip(values.iter()) {
            if let Field::Constant(id) = *field {
                if id != value {
                    return ApplyInput::NotApplicable;
                }
            }
        }
        for (field, &value) in self.fields.iter().zip(values.iter()) {
            if let Field::Variable(register) = *field {
                match prefix.get(register) {
                    Some(bound) if bound != value => return ApplyInput::Conflict,
                    Some(_) => {}
                    None => prefix.bind(register, value),
                }
            }
        }
        ApplyInput::Bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const TAG: Id = 10;
    const PERSON: Id = 11;

    fn tag_scan() -> Scan {
        Scan::eav(Field::Variable(0), Field::Constant(TAG), Field::Constant(PERSON))
    }

    #[test]
    fn test_resolve() {
        let scan = Scan::new(Field::Variable(0), Field::Constant(TAG), Field::Variable(1), Field::Ignore);
        let mut prefix = Prefix::new(2);
        assert_eq!(scan.resolve(&prefix), [None, Some(TAG), None, None]);
        prefix.bind(1, 99);
        assert_eq!(scan.resolve(&prefix), [None, Some(TAG), Some(99), None]);
    }

    #[test]
    fn test_apply_input_binds() {
        let mut prefix = Prefix::new(1);
        let result = tag_scan().apply_input(&Identity::new(1, TAG, PERSON, 0), &mut prefix);
        assert_eq!(result, ApplyInput::Bound);
        assert_eq!(prefix.get(0), Some(1));
    }

    #[test]
    fn test_apply_input_not_applicable() {
        let mut prefix = Prefix::new(1);
        let result = tag_scan().apply_input(&Identity::new(1, TAG, 12, 0), &mut prefix);
        assert_eq!(result, ApplyInput::NotApplicable);
        assert!(result.is_ok());
        assert_eq!(prefix.get(0), None);
    }

    #[test]
    fn test_apply_input_conflict_with_seed() {
        let mut prefix = Prefix::new(1);
        prefix.bind(0, 2);
        let result = tag_scan().apply_input(&Identity::new(1, TAG, PERSON, 0), &mut prefix);
        assert_eq!(result, ApplyInput::Conflict);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_repeated_register_must_agree() {
        let scan = Scan::eav(Field::Variable(0), Field::Constant(TAG), Field::Variable(0));
        let mut prefix = Prefix::new(1);
        assert_eq!(scan.apply_input(&Identity::new(5, TAG, 5, 0), &mut prefix), ApplyInput::Bound);
        let mut prefix = Prefix::new(1);
        assert_eq!(scan.apply_input(&Identity::new(5, TAG, 6, 0), &mut prefix), ApplyInput::Conflict);
    }

    #[test]
    fn test_registers() {
        let scan = Scan::new(Field::Variable(2), Field::Constant(1), Field::Variable(0), Field::Ignore);
        assert_eq!(scan.registers().collect::<Vec<_>>(), [2, 0]);
    }
}
