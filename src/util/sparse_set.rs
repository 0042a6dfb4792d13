use alloc::{vec, vec::Vec};

/// A sparse set of small integers with constant time clearing.
///
/// This is the scratch-side "marker set" used during one end-of-data pass:
/// the roles already handled by a dependency walk and the sub-automaton
/// queues triggered by the end-anchored literal scan. Both are cleared at the
/// start of a pass, which is why constant time clearing matters: the number
/// of roles in a program can be large while the number marked in any one pass
/// is usually tiny.
///
/// The data structure is based on: https://research.swtch.com/sparse
/// Note though that we don't actually use uninitialized memory. A scratch
/// space is reused across calls, so the initial allocation cost is bearable.
#[derive(Clone)]
pub(crate) struct SparseSet {
    /// The number of elements currently in this set.
    len: usize,
    /// Dense contains the values in the order in which they were inserted.
    dense: Vec<u32>,
    /// Sparse maps values to their location in dense.
    ///
    /// A value is in the set if and only if
    /// sparse[value] < len && value == dense[sparse[value]].
    sparse: Vec<u32>,
}

impl SparseSet {
    /// Create a new sparse set with the given capacity. Values inserted must
    /// be strictly less than the capacity.
    pub(crate) fn new(capacity: usize) -> SparseSet {
        let mut set = SparseSet { len: 0, dense: vec![], sparse: vec![] };
        set.resize(capacity);
        set
    }

    /// Resizes this sparse set to have the new capacity given.
    ///
    /// This set is automatically cleared.
    pub(crate) fn resize(&mut self, new_capacity: usize) {
        assert!(
            new_capacity <= core::u32::MAX as usize,
            "sparse set capacity cannot exceed {:?}",
            core::u32::MAX
        );
        self.clear();
        self.dense.resize(new_capacity, 0);
        self.sparse.resize(new_capacity, 0);
    }

    /// Returns the capacity of this set.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Returns the number of elements in this set.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Insert the value into this set and return true if it was not
    /// previously in this set.
    ///
    /// This panics if the value is not less than the capacity of this set.
    #[inline]
    pub(crate) fn insert(&mut self, value: usize) -> bool {
        if self.contains(value) {
            return false;
        }
        let i = self.len();
        assert!(
            value < self.capacity(),
            "{:?} exceeds capacity of {:?}",
            value,
            self.capacity(),
        );
        self.dense[i] = value as u32;
        self.sparse[value] = i as u32;
        self.len += 1;
        true
    }

    /// Returns true if and only if this set contains the given value.
    ///
    /// Values outside the capacity of this set are never contained in it.
    #[inline]
    pub(crate) fn contains(&self, value: usize) -> bool {
        match self.sparse.get(value) {
            None => false,
            Some(&i) => {
                let i = i as usize;
                i < self.len() && self.dense[i] as usize == value
            }
        }
    }

    /// Clear this set such that it has no members.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns an iterator over the values in this set, in insertion order.
    pub(crate) fn iter(&self) -> SparseSetIter<'_> {
        SparseSetIter(self.dense[..self.len()].iter())
    }

    /// Returns the heap memory usage, in bytes, used by this sparse set.
    pub(crate) fn memory_usage(&self) -> usize {
        2 * self.dense.len() * core::mem::size_of::<u32>()
    }
}

impl core::fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let elements: Vec<usize> = self.iter().collect();
        f.debug_tuple("SparseSet").field(&elements).finish()
    }
}

/// An iterator over all elements in a sparse set.
#[derive(Debug)]
pub(crate) struct SparseSetIter<'a>(core::slice::Iter<'a, u32>);

impl<'a> Iterator for SparseSetIter<'a> {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        self.0.next().map(|&value| value as usize)
    }
}
