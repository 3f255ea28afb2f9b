//! Validated query blocks.

use crate::executor::{Constraint, Derivation, Field, GenericJoin, NotScan, Scan};
use crate::prefix::{Prefix, Register};
use crate::store::FactStore;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use tessera_core::{Error, Identity, Interner, Multiplicity, Result, Round};

/// A fact template projected from a complete prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Output {
    fields: [Field; 4],
}

impl Output {
    /// Creates a new output template.
    pub fn new(entity: Field, attribute: Field, value: Field, context: Field) -> Self {
        Self {
            fields: [entity, attribute, value, context],
        }
    }

    /// Returns the fields in (entity, attribute, value, context) order.
    pub fn fields(&self) -> &[Field; 4] {
        &self.fields
    }

    /// Builds the identity described by this template under `prefix`.
    pub fn project(&self, prefix: &Prefix) -> Result<Identity> {
        let mut values = [0; 4];
        for (slot, field) in values.iter_mut().zip(self.fields.iter()) {
            *slot = match *field {
                Field::Constant(id) => id,
                Field::Variable(register) => prefix
                    .get(register)
                    .ok_or_else(|| Error::unbound_register(register))?,
                Field::Ignore => {
                    return Err(Error::invalid_plan("output fields cannot be ignored"));
                }
            };
        }
        Ok(Identity::from(values))
    }
}

/// A named conjunctive query with the facts it derives.
#[derive(Clone, Debug)]
pub struct Block {
    name: String,
    join: GenericJoin,
    outputs: Vec<Output>,
    register_count: usize,
}

impl Block {
    /// Creates a block after checking that it is well formed.
    ///
    /// A block needs at least one scan, its outputs may not contain
    /// `Field::Ignore`, and every register an output uses must be bound by
    /// some scan.
    pub fn new(name: impl Into<String>, scans: Vec<Scan>, outputs: Vec<Output>) -> Result<Self> {
        let name = name.into();
        if scans.is_empty() {
            return Err(Error::invalid_plan(format!("block `{}` has no scans", name)));
        }

        let bound: HashSet<Register> = scans.iter().flat_map(Scan::registers).collect();
        for output in &outputs {
            for field in output.fields() {
                match *field {
                    Field::Ignore => {
                        return Err(Error::invalid_plan(format!(
                            "block `{}` has an output with an ignored field",
                            name
                        )));
                    }
                    Field::Variable(register) if !bound.contains(&register) => {
                        return Err(Error::unbound_register(register));
                    }
                    _ => {}
                }
            }
        }

        let register_count = bound.iter().max().map_or(0, |&r| r + 1);
        Ok(Self {
            name,
            join: GenericJoin::new(scans),
            outputs,
            register_count,
        })
    }

    /// Adds comparison constraints over registers the scans bind.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Result<Self> {
        for constraint in &constraints {
            if constraint.fields().contains(&Field::Ignore) {
                return Err(Error::invalid_plan(format!(
                    "block `{}` has a constraint with an ignored operand",
                    self.name
                )));
            }
            self.check_bound(constraint.registers())?;
        }
        self.join = self.join.with_constraints(constraints);
        Ok(self)
    }

    /// Adds negated patterns over registers the scans bind.
    pub fn with_negations(mut self, negations: Vec<NotScan>) -> Result<Self> {
        for negation in &negations {
            self.check_bound(negation.registers())?;
        }
        self.join = self.join.with_negations(negations);
        Ok(self)
    }

    fn check_bound(&self, mut registers: impl Iterator<Item = Register>) -> Result<()> {
        match registers.find(|&r| !self.binds(r)) {
            Some(register) => Err(Error::unbound_register(register)),
            None => Ok(()),
        }
    }

    /// Returns the block name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the join evaluating this block's scans.
    pub fn join(&self) -> &GenericJoin {
        &self.join
    }

    /// Returns the output templates.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Returns the prefix size needed to hold every register.
    pub fn register_count(&self) -> usize {
        self.register_count
    }

    /// Returns true if some scan binds `register`.
    pub fn binds(&self, register: Register) -> bool {
        self.join.scans().iter().any(|s| s.registers().any(|r| r == register))
    }

    /// Returns an empty prefix sized for this block.
    pub fn empty_prefix(&self) -> Prefix {
        Prefix::new(self.register_count)
    }

    /// Evaluates the block against the facts present at the latest round.
    pub fn exec(&self, store: &FactStore, interner: &Interner) -> Vec<Prefix> {
        self.join.exec(store, interner, &self.empty_prefix())
    }

    /// Evaluates the block's full round-by-round history.
    pub fn derivations(&self, store: &FactStore, interner: &Interner) -> Vec<Derivation> {
        self.join.derivations(store, interner, &self.empty_prefix())
    }

    /// Returns the derivations gained or lost when `identity` received the
    /// presence step `(round, count)`, already applied to `store`.
    pub fn apply_input(
        &self,
        store: &FactStore,
        interner: &Interner,
        identity: &Identity,
        round: Round,
        count: Multiplicity,
    ) -> Vec<Derivation> {
        self.join
            .apply_input(store, interner, identity, round, count, &self.empty_prefix())
    }

    /// Projects every output template from a complete prefix.
    pub fn project(&self, prefix: &Prefix) -> Result<Vec<Identity>> {
        self.outputs.iter().map(|o| o.project(prefix)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn scan() -> Scan {
        Scan::eav(Field::Variable(0), Field::Constant(1), Field::Variable(2))
    }

    #[test]
    fn test_block_register_count() {
        let block = Block::new("b", vec![scan()], vec![]).unwrap();
        assert_eq!(block.register_count(), 3);
        assert!(block.binds(2));
        assert!(!block.binds(1));
        assert_eq!(block.name(), "b");
    }

    #[test]
    fn test_block_rejects_unbound_output() {
        let output = Output::new(Field::Variable(5), Field::Constant(1), Field::Constant(2), Field::Constant(0));
        let err = Block::new("b", vec![scan()], vec![output]).unwrap_err();
        assert_eq!(err, Error::unbound_register(5));
    }

    #[test]
    fn test_block_rejects_empty_and_ignored() {
        assert!(matches!(Block::new("empty", vec![], vec![]), Err(Error::InvalidPlan { .. })));
        let output = Output::new(Field::Variable(0), Field::Ignore, Field::Constant(2), Field::Constant(0));
        assert!(matches!(
            Block::new("b", vec![scan()], vec![output]),
            Err(Error::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_block_checks_constraint_and_negation_registers() {
        use crate::executor::Comparison;

        let block = Block::new("b", vec![scan()], vec![]).unwrap();
        let unbound = Constraint::new(Comparison::Less, Field::Variable(0), Field::Variable(1));
        assert_eq!(
            block.clone().with_constraints(vec![unbound]).unwrap_err(),
            Error::unbound_register(1)
        );
        let ignored = Constraint::new(Comparison::Less, Field::Variable(0), Field::Ignore);
        assert!(matches!(
            block.clone().with_constraints(vec![ignored]),
            Err(Error::InvalidPlan { .. })
        ));
        let negation = NotScan::eav(Field::Variable(4), Field::Constant(3), Field::Ignore);
        assert_eq!(
            block.clone().with_negations(vec![negation]).unwrap_err(),
            Error::unbound_register(4)
        );

        let ok = Constraint::new(Comparison::NotEqual, Field::Variable(0), Field::Variable(2));
        let block = block
            .with_constraints(vec![ok])
            .and_then(|b| b.with_negations(vec![NotScan::eav(Field::Variable(2), Field::Constant(3), Field::Ignore)]))
            .unwrap();
        assert_eq!(block.join().constraints().len(), 1);
        assert_eq!(block.join().negations().len(), 1);
    }

    #[test]
    fn test_project() {
        let output = Output::new(Field::Variable(2), Field::Constant(9), Field::Variable(0), Field::Constant(0));
        let block = Block::new("b", vec![scan()], vec![output]).unwrap();
        let prefix = Prefix::from_values([4, 0, 6]);
        assert_eq!(block.project(&prefix).unwrap(), vec![Identity::new(6, 9, 4, 0)]);
        assert_eq!(
            output.project(&Prefix::new(3)),
            Err(Error::unbound_register(2))
        );
    }
}
