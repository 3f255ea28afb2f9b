//! Evaluation sessions.

use crate::aggregate::{AggregateNode, GroupAggregate};
use crate::commit::CommitResult;
use crate::config::EvaluationConfig;
use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use tessera_core::{Change, Error, Id, Identity, Interner, RawValue, Result};
use tessera_incremental::{Aggregate, Delta, DistinctIndex};
use tessera_query::{Block, FactStore, Prefix};

/// An aggregate node attached to the block that feeds it.
struct AttachedAggregate {
    block: usize,
    node: Box<dyn GroupAggregate>,
}

/// One evaluation session.
///
/// Owns the interner, the fact store, the registered blocks and aggregate
/// nodes, and the distinct indexes for input and derived facts. Commits run
/// to completion one at a time.
pub struct Evaluation {
    config: EvaluationConfig,
    interner: Interner,
    store: FactStore,
    blocks: Vec<Block>,
    aggregates: Vec<AttachedAggregate>,
    inputs: DistinctIndex<Identity>,
    distinct: DistinctIndex<Identity>,
    scratch: Vec<Delta<Identity>>,
}

impl Evaluation {
    /// Creates a new session.
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: FactStore::with_min_keys(config.index_min_keys),
            config,
            interner: Interner::new(),
            blocks: Vec::new(),
            aggregates: Vec::new(),
            inputs: DistinctIndex::new(),
            distinct: DistinctIndex::new(),
            scratch: Vec::new(),
        })
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Returns the interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns the interner for encoding or releasing values.
    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    /// Interns a raw value.
    pub fn intern(&mut self, value: impl Into<RawValue>) -> Id {
        self.interner.intern(value)
    }

    /// Registers a block. Block names must be unique.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if self.block_index(block.name()).is_some() {
            return Err(Error::invalid_plan(format!(
                "block `{}` is already registered",
                block.name()
            )));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Returns the block called `name`.
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name() == name)
    }

    fn block_index(&self, name: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.name() == name)
    }

    /// Attaches an aggregate node to the block called `block`.
    ///
    /// Every register the node reads must be bound by that block.
    pub fn add_aggregate<A>(&mut self, block: &str, node: AggregateNode<A>) -> Result<()>
    where
        A: Aggregate + 'static,
    {
        let index = self
            .block_index(block)
            .ok_or_else(|| Error::invalid_plan(format!("no block named `{}`", block)))?;
        if let Some(register) = node.registers().into_iter().find(|&r| !self.blocks[index].binds(r)) {
            return Err(Error::unbound_register(register));
        }
        if self.aggregates.iter().any(|a| a.node.name() == node.name()) {
            return Err(Error::invalid_plan(format!(
                "aggregate `{}` is already registered",
                node.name()
            )));
        }
        self.aggregates.push(AttachedAggregate {
            block: index,
            node: Box::new(node),
        });
        Ok(())
    }

    /// Returns the current value of aggregate `name` for `group`.
    pub fn aggregate_result(&self, name: &str, group: &[Id]) -> Option<RawValue> {
        self.aggregates
            .iter()
            .find(|a| a.node.name() == name)
            .and_then(|a| a.node.result(group))
    }

    /// Applies a batch of input changes, in order.
    ///
    /// Each change is first passed through the input distinct index, which
    /// turns it into presence corrections at the rounds where the input
    /// starts or stops being present. Every correction updates the fact
    /// store, and every block derives the prefixes it gained or lost at each
    /// round. Their outputs are emitted as derived changes in the input's
    /// transaction, passed through the derived distinct index, and the
    /// prefixes are fed to the block's aggregate nodes.
    ///
    /// The result does not depend on the order changes arrive in, only on
    /// the rounds they carry.
    ///
    /// An error aborts the commit; changes applied before it stay applied.
    pub fn commit(&mut self, changes: Vec<Change>) -> Result<CommitResult> {
        let inputs = changes.len();
        let mut result = CommitResult::new();

        for change in changes {
            let identity = change.identity();
            self.scratch.clear();
            self.inputs
                .distinct(identity, change.round, change.count, &mut self.scratch);
            let corrections = core::mem::take(&mut self.scratch);

            for correction in &corrections {
                self.store.apply(&identity, correction.round, correction.count);
                for (block_ix, block) in self.blocks.iter().enumerate() {
                    let derived = block.apply_input(
                        &self.store,
                        &self.interner,
                        &identity,
                        correction.round,
                        correction.count,
                    );
                    for derivation in derived {
                        for output in block.project(&derivation.prefix)? {
                            result.derived.push(Change::from_identity(
                                output,
                                change.transaction,
                                derivation.round,
                                derivation.count,
                            ));
                            self.distinct.distinct(
                                output,
                                derivation.round,
                                derivation.count,
                                &mut result.distinct,
                            );
                        }
                        for attached in self.aggregates.iter_mut().filter(|a| a.block == block_ix) {
                            attached.node.apply(
                                &self.interner,
                                &derivation.prefix,
                                derivation.round,
                                derivation.count,
                                &mut result.aggregates,
                            )?;
                        }
                    }
                }
            }
            result.inputs.extend(corrections.iter().cloned());
            self.scratch = corrections;
        }

        tracing::debug!(
            inputs,
            corrections = result.inputs.len(),
            derived = result.derived.len(),
            distinct = result.distinct.len(),
            aggregates = result.aggregates.len(),
            "evaluation commit"
        );
        Ok(result)
    }

    /// Evaluates `block` against the facts present at the latest round.
    pub fn query(&self, block: &Block) -> Vec<Prefix> {
        block.exec(&self.store, &self.interner)
    }

    /// Returns the fact store.
    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Returns every fact present at the latest round, in EAVC order.
    pub fn facts(&self) -> Vec<Identity> {
        self.store.facts()
    }

    /// Returns the distinct index over input facts.
    pub fn input_index(&self) -> &DistinctIndex<Identity> {
        &self.inputs
    }

    /// Returns the distinct index over derived facts.
    pub fn distinct_index(&self) -> &DistinctIndex<Identity> {
        &self.distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use tessera_core::Round;
    use tessera_incremental::{Count, DeltaBatchExt, Sum};
    use tessera_query::{Field, Output, Scan};

    fn session() -> Evaluation {
        Evaluation::new(EvaluationConfig::new().with_index_min_keys(2)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let result = Evaluation::new(EvaluationConfig::new().with_index_min_keys(0));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_duplicate_block_name() {
        let mut eval = session();
        let scan = Scan::eav(Field::Variable(0), Field::Constant(1), Field::Ignore);
        eval.add_block(Block::new("b", vec![scan], vec![]).unwrap()).unwrap();
        let err = eval.add_block(Block::new("b", vec![scan], vec![]).unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan { .. }));
        assert!(eval.block("b").is_some());
    }

    #[test]
    fn test_aggregate_registers_checked() {
        let mut eval = session();
        let scan = Scan::eav(Field::Variable(0), Field::Constant(1), Field::Ignore);
        eval.add_block(Block::new("b", vec![scan], vec![]).unwrap()).unwrap();

        let node = AggregateNode::new("n", Count, vec![0], vec![4], vec![]).unwrap();
        assert_eq!(eval.add_aggregate("b", node).unwrap_err(), Error::unbound_register(4));

        let node = AggregateNode::new("n", Count, vec![0], vec![], vec![]).unwrap();
        assert!(matches!(eval.add_aggregate("missing", node), Err(Error::InvalidPlan { .. })));
    }

    #[test]
    fn test_commit_counts_members() {
        let mut eval = session();
        let tag = eval.intern("tag");
        let person = eval.intern("person");
        let e1 = eval.intern("e1");
        let e2 = eval.intern("e2");

        let scan = Scan::eav(Field::Variable(0), Field::Constant(tag), Field::Variable(1));
        let output = Output::new(Field::Variable(1), Field::Constant(tag), Field::Variable(0), Field::Constant(0));
        eval.add_block(Block::new("by-tag", vec![scan], vec![output]).unwrap()).unwrap();
        let node = AggregateNode::new("tagged", Count, vec![1], vec![0], vec![]).unwrap();
        eval.add_aggregate("by-tag", node).unwrap();

        let result = eval
            .commit(vec![
                Change::new(e1, tag, person, 0, 1, 1, 1),
                Change::new(e2, tag, person, 0, 1, 1, 1),
            ])
            .unwrap();
        assert_eq!(result.derived.len(), 2);
        assert_eq!(result.added().len(), 2);
        assert_eq!(eval.aggregate_result("tagged", &[person]), Some(RawValue::from(2)));

        let result = eval.commit(vec![Change::new(e1, tag, person, 0, 2, 1, -1)]).unwrap();
        assert_eq!(result.removed(), vec![Identity::new(person, tag, e1, 0)]);
        assert_eq!(eval.aggregate_result("tagged", &[person]), Some(RawValue::from(1)));
        assert_eq!(eval.facts().len(), 1);
    }

    #[test]
    fn test_unchanged_presence_derives_nothing() {
        let mut eval = session();
        let scan = Scan::eav(Field::Variable(0), Field::Constant(1), Field::Ignore);
        let output = Output::new(Field::Variable(0), Field::Constant(2), Field::Constant(3), Field::Constant(0));
        eval.add_block(Block::new("b", vec![scan], vec![output]).unwrap()).unwrap();

        let first = eval.commit(vec![Change::new(5, 1, 9, 0, 1, 1, 1)]).unwrap();
        assert_eq!(first.derived.len(), 1);
        let second = eval.commit(vec![Change::new(5, 1, 9, 0, 2, 1, 1)]).unwrap();
        assert!(second.is_empty());
    }

    fn copy_block(eval: &mut Evaluation) {
        let scan = Scan::eav(Field::Variable(0), Field::Constant(1), Field::Ignore);
        let output = Output::new(Field::Variable(0), Field::Constant(2), Field::Constant(3), Field::Constant(0));
        eval.add_block(Block::new("b", vec![scan], vec![output]).unwrap()).unwrap();
    }

    #[test]
    fn test_arrival_order_does_not_change_output() {
        let run = |rounds: [Round; 2]| {
            let mut eval = session();
            copy_block(&mut eval);
            let mut distinct = Vec::new();
            for round in rounds {
                let result = eval.commit(vec![Change::new(5, 1, 9, 0, 1, round, 1)]).unwrap();
                distinct.extend(result.distinct);
            }
            distinct.consolidate()
        };

        let expected = vec![Delta::insert(Identity::new(5, 2, 3, 0), 1)];
        assert_eq!(run([3, 1]), expected);
        assert_eq!(run([1, 3]), expected);
    }

    #[test]
    fn test_late_input_moves_derivation_earlier() {
        let mut eval = session();
        copy_block(&mut eval);
        eval.commit(vec![Change::new(5, 1, 9, 0, 1, 3, 1)]).unwrap();
        let result = eval.commit(vec![Change::new(5, 1, 9, 0, 2, 1, 1)]).unwrap();

        let derived = Identity::new(5, 2, 3, 0);
        assert_eq!(result.inputs, vec![Delta::insert(Identity::new(5, 1, 9, 0), 1), Delta::delete(Identity::new(5, 1, 9, 0), 3)]);
        assert_eq!(result.consolidated(), vec![Delta::insert(derived, 1), Delta::delete(derived, 3)]);
        assert!(eval.distinct_index().is_present(&derived, 1));
        assert!(eval.input_index().is_present(&Identity::new(5, 1, 9, 0), 2));
    }

    #[test]
    fn test_non_numeric_member_then_retraction() {
        let mut eval = session();
        let score = eval.intern("score");
        let (e1, e2) = (eval.intern("e1"), eval.intern("e2"));
        let (seven, high) = (eval.intern(7), eval.intern("high"));

        let scan = Scan::eav(Field::Variable(0), Field::Constant(score), Field::Variable(1));
        eval.add_block(Block::new("scores", vec![scan], vec![]).unwrap()).unwrap();
        let node = AggregateNode::new("total", Sum, vec![], vec![0, 1], vec![1]).unwrap();
        eval.add_aggregate("scores", node).unwrap();

        eval.commit(vec![Change::new(e1, score, seven, 0, 1, 1, 1)]).unwrap();
        let err = eval.commit(vec![Change::new(e2, score, high, 0, 2, 1, 1)]).unwrap_err();
        assert_eq!(err, Error::not_a_number(high));

        let result = eval.commit(vec![Change::new(e2, score, high, 0, 3, 1, -1)]).unwrap();
        assert!(result.aggregates.is_empty());
        assert_eq!(eval.aggregate_result("total", &[]), Some(RawValue::from(7)));
        assert_eq!(eval.facts(), vec![Identity::new(e1, score, seven, 0)]);
    }
}
