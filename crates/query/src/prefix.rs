//! Variable bindings accumulated during a join.

use alloc::vec::Vec;
use tessera_core::Id;

/// Offset of a variable within a [`Prefix`].
pub type Register = usize;

/// An ordered, growable sequence of register bindings.
///
/// Slot `r` holds the value bound to register `r`, or `None` while it is
/// still unbound. Reading past the end yields `None`; binding past the end
/// grows the prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    slots: Vec<Option<Id>>,
}

impl Prefix {
    /// Creates a prefix with `size` unbound registers.
    pub fn new(size: usize) -> Self {
        Self {
            slots: alloc::vec![None; size],
        }
    }

    /// Creates a fully bound prefix from values in register order.
    pub fn from_values(values: impl IntoIterator<Item = Id>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Returns the value bound to `register`.
    #[inline]
    pub fn get(&self, register: Register) -> Option<Id> {
        self.slots.get(register).copied().flatten()
    }

    /// Returns true if `register` is bound.
    #[inline]
    pub fn is_bound(&self, register: Register) -> bool {
        self.get(register).is_some()
    }

    /// Binds `register` to `value`, growing the prefix if needed.
    pub fn bind(&mut self, register: Register, value: Id) {
        if register >= self.slots.len() {
            self.slots.resize(register + 1, None);
        }
        self.slots[register] = Some(value);
    }

    /// Clears the binding of `register`.
    pub fn unbind(&mut self, register: Register) {
        if let Some(slot) = self.slots.get_mut(register) {
            *slot = None;
        }
    }

    /// Returns the number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the prefix has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of bound registers.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns the raw slots.
    pub fn as_slice(&self) -> &[Option<Id>] {
        &self.slots
    }

    /// Resolves `registers` in order, or `None` if any of them is unbound.
    pub fn values_of(&self, registers: &[Register]) -> Option<Vec<Id>> {
        registers.iter().map(|&r| self.get(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_bind_grows() {
        let mut prefix = Prefix::new(1);
        assert_eq!(prefix.get(0), None);
        assert_eq!(prefix.get(5), None);
        prefix.bind(3, 42);
        assert_eq!(prefix.len(), 4);
        assert_eq!(prefix.get(3), Some(42));
        assert!(!prefix.is_bound(1));
        assert_eq!(prefix.bound_count(), 1);
    }

    #[test]
    fn test_unbind() {
        let mut prefix = Prefix::from_values([1, 2]);
        prefix.unbind(0);
        prefix.unbind(9);
        assert_eq!(prefix.as_slice(), &[None, Some(2)]);
    }

    #[test]
    fn test_values_of() {
        let prefix = Prefix::from_values([10, 20, 30]);
        assert_eq!(prefix.values_of(&[2, 0]), Some(vec![30, 10]));
        assert_eq!(prefix.values_of(&[3]), None);
    }
}
