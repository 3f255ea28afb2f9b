//! Reference-counted value interner.
//!
//! The interner maps raw values to compact `Id`s and back. Every call to
//! `intern` takes a reference; `release` gives one back. When the last
//! reference goes away the value is forgotten in both directions and its id
//! is pushed onto a free list for reuse.

use crate::error::{Error, Result};
use crate::value::{number_bits, RawValue};
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;

/// Compact identifier substituted for a raw value.
pub type Id = u32;

/// Bidirectional, reference-counted mapping between raw values and ids.
///
/// Owned by an evaluation session and passed by reference; there is no
/// global instance.
#[derive(Clone, Debug, Default)]
pub struct Interner {
    /// String namespace.
    strings: HashMap<String, Id>,
    /// Number namespace, keyed by canonical bit pattern.
    numbers: HashMap<u64, Id>,
    /// Reverse mapping; `None` marks a free slot.
    values: Vec<Option<RawValue>>,
    /// Outstanding references per id.
    ref_counts: Vec<u32>,
    /// Released ids available for reuse.
    free_list: Vec<Id>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a value, returning its id and taking one reference.
    pub fn intern(&mut self, value: impl Into<RawValue>) -> Id {
        let value = value.into();
        if let Some(id) = self.get(&value) {
            self.ref_counts[id as usize] += 1;
            return id;
        }

        let id = self.alloc_id();
        match &value {
            RawValue::String(s) => {
                self.strings.insert(s.clone(), id);
            }
            RawValue::Number(n) => {
                self.numbers.insert(number_bits(*n), id);
            }
        }
        self.values[id as usize] = Some(value);
        self.ref_counts[id as usize] = 1;
        id
    }

    /// Interns a string.
    #[inline]
    pub fn intern_str(&mut self, value: &str) -> Id {
        self.intern(value)
    }

    /// Interns a number.
    #[inline]
    pub fn intern_number(&mut self, value: f64) -> Id {
        self.intern(value)
    }

    /// Looks up a value without allocating or taking a reference.
    pub fn get(&self, value: &RawValue) -> Option<Id> {
        match value {
            RawValue::String(s) => self.strings.get(s.as_str()).copied(),
            RawValue::Number(n) => self.numbers.get(&number_bits(*n)).copied(),
        }
    }

    /// Returns the value for an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not currently allocated. Callers only reverse ids
    /// they obtained from this interner and still hold a reference to.
    pub fn reverse(&self, id: Id) -> &RawValue {
        match self.try_reverse(id) {
            Some(value) => value,
            None => panic!("Interner::reverse called with unallocated id {}", id),
        }
    }

    /// Returns the value for an id, or None if the id is free or was never issued.
    pub fn try_reverse(&self, id: Id) -> Option<&RawValue> {
        self.values.get(id as usize).and_then(|v| v.as_ref())
    }

    /// Returns the value for an id as a `Result`.
    pub fn resolve(&self, id: Id) -> Result<&RawValue> {
        self.try_reverse(id).ok_or(Error::unknown_id(id))
    }

    /// Drops one reference to `id`, freeing it when none remain.
    ///
    /// Releasing an id that is not allocated is a no-op.
    pub fn release(&mut self, id: Id) {
        let ix = id as usize;
        match self.ref_counts.get_mut(ix) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return,
        }
        if self.ref_counts[ix] > 0 {
            return;
        }

        if let Some(value) = self.values[ix].take() {
            match value {
                RawValue::String(s) => {
                    self.strings.remove(s.as_str());
                }
                RawValue::Number(n) => {
                    self.numbers.remove(&number_bits(n));
                }
            }
        }
        self.free_list.push(id);
        tracing::trace!(id, "interner: id released");
    }

    /// Returns the number of outstanding references to `id`.
    pub fn ref_count(&self, id: Id) -> u32 {
        self.ref_counts.get(id as usize).copied().unwrap_or(0)
    }

    /// Returns the number of live values.
    pub fn len(&self) -> usize {
        self.strings.len() + self.numbers.len()
    }

    /// Returns true if no values are interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc_id(&mut self) -> Id {
        if let Some(id) = self.free_list.pop() {
            tracing::trace!(id, "interner: reusing freed id");
            return id;
        }
        let id = self.values.len() as Id;
        self.values.push(None);
        self.ref_counts.push(0);
        id
    }
}
