//! Fact and identity types.
//!
//! A `Change` is the atomic unit of data: an identity observed within a
//! transaction at a round, weighted by a signed multiplicity. Absence is
//! never stored explicitly; an identity is present while its accumulated
//! count is positive.

use crate::interner::Id;

/// Transaction identifier.
pub type TransactionId = u64;

/// Logical sub-step within a transaction's evaluation.
pub type Round = u32;

/// Signed occurrence count: positive inserts, negative retracts.
pub type Multiplicity = i32;

/// The (entity, attribute, value, context) quadruple a fact is about.
///
/// Ordered lexicographically in field order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub entity: Id,
    pub attribute: Id,
    pub value: Id,
    pub context: Id,
}

impl Identity {
    /// Creates a new identity.
    #[inline]
    pub fn new(entity: Id, attribute: Id, value: Id, context: Id) -> Self {
        Self {
            entity,
            attribute,
            value,
            context,
        }
    }

    /// Returns the fields as an array in (entity, attribute, value, context) order.
    #[inline]
    pub fn to_array(self) -> [Id; 4] {
        [self.entity, self.attribute, self.value, self.context]
    }

    /// Returns the field at `position` (0 = entity .. 3 = context).
    #[inline]
    pub fn field(&self, position: usize) -> Id {
        self.to_array()[position]
    }
}

impl From<[Id; 4]> for Identity {
    fn from(fields: [Id; 4]) -> Self {
        Self::new(fields[0], fields[1], fields[2], fields[3])
    }
}

impl From<Identity> for [Id; 4] {
    fn from(identity: Identity) -> Self {
        identity.to_array()
    }
}

/// A fact observation with provenance and multiplicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Change {
    pub entity: Id,
    pub attribute: Id,
    pub value: Id,
    pub context: Id,
    pub transaction: TransactionId,
    pub round: Round,
    pub count: Multiplicity,
}

impl Change {
    /// Creates a new change.
    #[inline]
    pub fn new(
        entity: Id,
        attribute: Id,
        value: Id,
        context: Id,
        transaction: TransactionId,
        round: Round,
        count: Multiplicity,
    ) -> Self {
        Self {
            entity,
            attribute,
            value,
            context,
            transaction,
            round,
            count,
        }
    }

    /// Creates a change for an identity.
    #[inline]
    pub fn from_identity(
        identity: Identity,
        transaction: TransactionId,
        round: Round,
        count: Multiplicity,
    ) -> Self {
        Self::new(
            identity.entity,
            identity.attribute,
            identity.value,
            identity.context,
            transaction,
            round,
            count,
        )
    }

    /// Returns the identity this change is about.
    #[inline]
    pub fn identity(&self) -> Identity {
        Identity::new(self.entity, self.attribute, self.value, self.context)
    }

    /// Returns a copy with a different count.
    #[inline]
    pub fn with_count(&self, count: Multiplicity) -> Self {
        Self { count, ..*self }
    }

    /// Returns a copy with the count negated.
    #[inline]
    pub fn negated(&self) -> Self {
        self.with_count(-self.count)
    }

    /// Returns true if this is an insertion (count > 0).
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.count > 0
    }

    /// Returns true if this is a retraction (count < 0).
    #[inline]
    pub fn is_retract(&self) -> bool {
        self.count < 0
    }
}
