//! Grouped aggregates fed by join results.
//!
//! An `AggregateNode` receives every complete prefix a block gains or loses.
//! Members (group registers followed by projection registers) are passed
//! through their own distinct index, so the aggregate kind only sees one
//! `add` per member that becomes present and one `remove` per member that
//! stops being present. Each presence correction is folded in at its own
//! round and reported as its own update.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tessera_core::{Error, Id, Interner, Multiplicity, RawValue, Result, Round};
use tessera_incremental::{Aggregate, Delta, DistinctIndex};
use tessera_query::{Prefix, Register};

/// A change in one group's aggregate value.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateUpdate {
    /// Name of the aggregate node
    pub aggregate: String,
    /// Group key values, in group register order
    pub group: Vec<Id>,
    /// Round of the presence correction that caused the change
    pub round: Round,
    /// Value before the change; `None` if the group did not exist
    pub previous: Option<RawValue>,
    /// Value after the change; `None` if the group became empty
    pub current: Option<RawValue>,
}

/// Object-safe view of an aggregate node, independent of its kind.
pub trait GroupAggregate {
    /// Returns the node name.
    fn name(&self) -> &str;

    /// Returns every register the node reads.
    fn registers(&self) -> Vec<Register>;

    /// Feeds one derivation of a complete prefix with weight `count`.
    fn apply(
        &mut self,
        interner: &Interner,
        prefix: &Prefix,
        round: Round,
        count: Multiplicity,
        out: &mut Vec<AggregateUpdate>,
    ) -> Result<()>;

    /// Returns the current value for `group`.
    fn result(&self, group: &[Id]) -> Option<RawValue>;

    /// Returns the number of non-empty groups.
    fn group_count(&self) -> usize;
}

#[derive(Clone, Debug)]
struct Group<S> {
    state: S,
    members: usize,
}

/// Maintains an aggregate of kind `A` per group.
pub struct AggregateNode<A: Aggregate> {
    name: String,
    aggregate: A,
    group_len: usize,
    /// Group registers followed by projection registers.
    key_registers: Vec<Register>,
    /// Position of each argument within the member key.
    arg_positions: Vec<usize>,
    members: DistinctIndex<Vec<Id>>,
    groups: HashMap<Vec<Id>, Group<A::State>>,
    scratch: Vec<Delta<Vec<Id>>>,
}

impl<A: Aggregate> AggregateNode<A> {
    /// Creates a node grouping by `group`, distinguishing members by
    /// `group` plus `projection`, and passing `args` to the aggregate.
    ///
    /// Every argument register must be a group or projection register.
    pub fn new(
        name: impl Into<String>,
        aggregate: A,
        group: Vec<Register>,
        projection: Vec<Register>,
        args: Vec<Register>,
    ) -> Result<Self> {
        let name = name.into();
        let group_len = group.len();
        let key_registers: Vec<Register> = group.into_iter().chain(projection).collect();

        let mut arg_positions = Vec::with_capacity(args.len());
        for register in &args {
            match key_registers.iter().position(|r| r == register) {
                Some(position) => arg_positions.push(position),
                None => {
                    return Err(Error::invalid_plan(format!(
                        "aggregate `{}` argument register {} is neither grouped nor projected",
                        name, register
                    )));
                }
            }
        }
        if arg_positions.len() < A::NUMERIC_ARGS {
            return Err(Error::invalid_plan(format!(
                "aggregate `{}` ({}) needs {} argument(s), got {}",
                name,
                aggregate.name(),
                A::NUMERIC_ARGS,
                arg_positions.len()
            )));
        }

        Ok(Self {
            name,
            aggregate,
            group_len,
            key_registers,
            arg_positions,
            members: DistinctIndex::new(),
            groups: HashMap::new(),
            scratch: Vec::new(),
        })
    }

    /// Returns the group registers.
    pub fn group_registers(&self) -> &[Register] {
        &self.key_registers[..self.group_len]
    }

    /// Returns the projection registers.
    pub fn projection_registers(&self) -> &[Register] {
        &self.key_registers[self.group_len..]
    }

    fn resolve_args(&self, interner: &Interner, member: &[Id]) -> Result<Vec<RawValue>> {
        let mut args = Vec::with_capacity(self.arg_positions.len());
        for (ix, &position) in self.arg_positions.iter().enumerate() {
            let id = member[position];
            let value = interner.resolve(id)?;
            if ix < A::NUMERIC_ARGS && !value.is_number() {
                return Err(Error::not_a_number(id));
            }
            args.push(value.clone());
        }
        Ok(args)
    }

    /// Applies one member presence correction to its group.
    fn fold(
        &mut self,
        group_key: &[Id],
        args: &[RawValue],
        round: Round,
        count: Multiplicity,
        out: &mut Vec<AggregateUpdate>,
    ) {
        let previous = self
            .groups
            .get(group_key)
            .map(|g| self.aggregate.get_result(&g.state));

        let current = if count > 0 {
            let group = self
                .groups
                .entry(group_key.to_vec())
                .or_insert_with(|| Group {
                    state: self.aggregate.new_result_state(),
                    members: 0,
                });
            group.state = self.aggregate.add(group.state.clone(), args);
            group.members += 1;
            Some(self.aggregate.get_result(&group.state))
        } else {
            match self.groups.get_mut(group_key) {
                Some(group) if group.members > 1 => {
                    group.state = self.aggregate.remove(group.state.clone(), args);
                    group.members -= 1;
                    Some(self.aggregate.get_result(&group.state))
                }
                Some(_) => {
                    self.groups.remove(group_key);
                    None
                }
                None => None,
            }
        };

        tracing::trace!(aggregate = %self.name, round, count, "aggregate update");
        out.push(AggregateUpdate {
            aggregate: self.name.clone(),
            group: group_key.to_vec(),
            round,
            previous,
            current,
        });
    }
}

impl<A: Aggregate> GroupAggregate for AggregateNode<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn registers(&self) -> Vec<Register> {
        self.key_registers.clone()
    }

    fn apply(
        &mut self,
        interner: &Interner,
        prefix: &Prefix,
        round: Round,
        count: Multiplicity,
        out: &mut Vec<AggregateUpdate>,
    ) -> Result<()> {
        let mut member = Vec::with_capacity(self.key_registers.len());
        for &register in &self.key_registers {
            member.push(prefix.get(register).ok_or_else(|| Error::unbound_register(register))?);
        }

        let args = match self.resolve_args(interner, &member) {
            Ok(args) => args,
            // A non-numeric member was never admitted; its retraction is a no-op.
            Err(Error::NotANumber { .. }) if count < 0 => return Ok(()),
            Err(err) => return Err(err),
        };

        self.scratch.clear();
        self.members.distinct(member.clone(), round, count, &mut self.scratch);
        if self.scratch.is_empty() {
            return Ok(());
        }
        // Additions first, so the member count never drops below zero.
        let mut corrections = core::mem::take(&mut self.scratch);
        corrections.sort_by_key(|d| (d.count < 0, d.round));

        let group_key = &member[..self.group_len];
        for correction in &corrections {
            self.fold(group_key, &args, correction.round, correction.count, out);
        }
        self.scratch = corrections;
        Ok(())
    }

    fn result(&self, group: &[Id]) -> Option<RawValue> {
        self.groups
            .get(group)
            .map(|g| self.aggregate.get_result(&g.state))
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use tessera_incremental::{Count, Sum};

    struct Fixture {
        interner: Interner,
        team: Id,
        alice: Id,
        bob: Id,
        ten: Id,
        five: Id,
    }

    fn fixture() -> Fixture {
        let mut interner = Interner::new();
        let team = interner.intern("team");
        let alice = interner.intern("alice");
        let bob = interner.intern("bob");
        let ten = interner.intern(10);
        let five = interner.intern(5);
        Fixture {
            interner,
            team,
            alice,
            bob,
            ten,
            five,
        }
    }

    #[test]
    fn test_sum_per_group() {
        let f = fixture();
        // registers: 0 = group, 1 = member, 2 = amount
        let mut node = AggregateNode::new("total", Sum, vec![0], vec![1, 2], vec![2]).unwrap();
        let mut out = Vec::new();

        node.apply(&f.interner, &Prefix::from_values([f.team, f.alice, f.ten]), 1, 1, &mut out).unwrap();
        node.apply(&f.interner, &Prefix::from_values([f.team, f.bob, f.five]), 1, 1, &mut out).unwrap();
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(15)));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].previous, None);
        assert_eq!(out[1].previous, Some(RawValue::from(10)));

        node.apply(&f.interner, &Prefix::from_values([f.team, f.alice, f.ten]), 1, -1, &mut out).unwrap();
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(5)));
    }

    #[test]
    fn test_duplicate_derivations_are_one_member() {
        let f = fixture();
        let mut node = AggregateNode::new("members", Count, vec![0], vec![1], vec![]).unwrap();
        let mut out = Vec::new();
        let prefix = Prefix::from_values([f.team, f.alice]);

        node.apply(&f.interner, &prefix, 1, 1, &mut out).unwrap();
        node.apply(&f.interner, &prefix, 1, 1, &mut out).unwrap();
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(1)));
        assert_eq!(out.len(), 1);

        node.apply(&f.interner, &prefix, 1, -1, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        node.apply(&f.interner, &prefix, 1, -1, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].current, None);
        assert_eq!(node.group_count(), 0);
    }

    #[test]
    fn test_updates_carry_correction_rounds() {
        let f = fixture();
        let mut node = AggregateNode::new("members", Count, vec![0], vec![1], vec![]).unwrap();
        let mut out = Vec::new();
        let prefix = Prefix::from_values([f.team, f.alice]);

        // Retracted at round 3 before it is ever asserted.
        node.apply(&f.interner, &prefix, 3, -1, &mut out).unwrap();
        assert!(out.is_empty());

        // Asserted at round 1: present during [1, 3), one update per round.
        node.apply(&f.interner, &prefix, 1, 1, &mut out).unwrap();
        let rounds: Vec<(Round, Option<RawValue>)> = out.iter().map(|u| (u.round, u.current.clone())).collect();
        assert_eq!(rounds, vec![(1, Some(RawValue::from(1))), (3, None)]);
        assert_eq!(node.group_count(), 0);
    }

    #[test]
    fn test_additions_fold_before_removals() {
        let f = fixture();
        let mut node = AggregateNode::new("members", Count, vec![0], vec![1], vec![]).unwrap();
        let mut out = Vec::new();
        let alice = Prefix::from_values([f.team, f.alice]);
        let bob = Prefix::from_values([f.team, f.bob]);

        node.apply(&f.interner, &bob, 1, 1, &mut out).unwrap();
        node.apply(&f.interner, &alice, 1, 1, &mut out).unwrap();
        node.apply(&f.interner, &alice, 3, -1, &mut out).unwrap();
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(1)));
        out.clear();

        // Withdrawing alice at 2 moves her exit from 3 to 2: one observation
        // yields -1 at round 2 and +1 at round 3.
        node.apply(&f.interner, &alice, 2, -1, &mut out).unwrap();
        let updates: Vec<(Round, Option<RawValue>)> = out.iter().map(|u| (u.round, u.current.clone())).collect();
        assert_eq!(
            updates,
            vec![(3, Some(RawValue::from(2))), (2, Some(RawValue::from(1)))]
        );
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(1)));
    }

    #[test]
    fn test_argument_must_be_grouped_or_projected() {
        let result = AggregateNode::new("bad", Sum, vec![0], vec![1], vec![2]);
        assert!(matches!(result, Err(Error::InvalidPlan { .. })));
        let result = AggregateNode::new("bad", Sum, vec![0], vec![1], vec![]);
        assert!(matches!(result, Err(Error::InvalidPlan { .. })));
    }

    #[test]
    fn test_non_numeric_argument() {
        let f = fixture();
        let mut node = AggregateNode::new("total", Sum, vec![0], vec![1], vec![1]).unwrap();
        let mut out = Vec::new();
        let err = node
            .apply(&f.interner, &Prefix::from_values([f.team, f.alice]), 1, 1, &mut out)
            .unwrap_err();
        assert_eq!(err, Error::not_a_number(f.alice));
    }

    #[test]
    fn test_non_numeric_rejected_then_retracted() {
        let f = fixture();
        let mut node = AggregateNode::new("total", Sum, vec![0], vec![1], vec![1]).unwrap();
        let mut out = Vec::new();
        let bad = Prefix::from_values([f.team, f.alice]);
        let good = Prefix::from_values([f.team, f.ten]);

        node.apply(&f.interner, &good, 1, 1, &mut out).unwrap();
        assert!(node.apply(&f.interner, &bad, 1, 1, &mut out).is_err());
        node.apply(&f.interner, &bad, 2, -1, &mut out).unwrap();

        // The rejected member left no trace in the group.
        assert_eq!(out.len(), 1);
        assert_eq!(node.result(&[f.team]), Some(RawValue::from(10)));
        node.apply(&f.interner, &good, 2, -1, &mut out).unwrap();
        assert_eq!(node.group_count(), 0);
    }

    #[test]
    fn test_unbound_register() {
        let f = fixture();
        let mut node = AggregateNode::new("members", Count, vec![0], vec![3], vec![]).unwrap();
        let mut out = Vec::new();
        let err = node
            .apply(&f.interner, &Prefix::from_values([f.team]), 1, 1, &mut out)
            .unwrap_err();
        assert_eq!(err, Error::unbound_register(3));
        assert_eq!(node.group_registers(), &[0]);
        assert_eq!(node.projection_registers(), &[3]);
    }
}
