/*!
A fixed capacity bit set for the flags persisted per stream.
*/

use alloc::{vec, vec::Vec};

/// A fixed capacity bit set with ascending iteration.
///
/// This is the representation of persisted per-stream flags: the roles that
/// are currently on and the sub-automata that are currently active. Unlike
/// [`SparseSet`](crate::util::sparse_set::SparseSet), iteration yields
/// members in ascending order, which is the order the end-of-data pass walks
/// them in.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Multibit {
    len: usize,
    words: Vec<u64>,
}

impl Multibit {
    /// Create an empty set that can hold the values `0..len`.
    pub fn new(len: usize) -> Multibit {
        Multibit { len, words: vec![0; (len + 63) / 64] }
    }

    /// Returns the number of values this set can hold.
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Add the given value. This panics if the value is out of bounds.
    pub fn set(&mut self, i: usize) {
        assert!(i < self.len, "bit {} out of bounds for {}", i, self.len);
        self.words[i / 64] |= 1 << (i % 64);
    }

    /// Remove the given value. This panics if the value is out of bounds.
    pub fn unset(&mut self, i: usize) {
        assert!(i < self.len, "bit {} out of bounds for {}", i, self.len);
        self.words[i / 64] &= !(1 << (i % 64));
    }

    /// Returns true if and only if the given value is in this set. Values
    /// out of bounds are never in the set.
    pub fn contains(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1 << (i % 64)) != 0
    }

    /// Remove every value from this set.
    pub fn clear(&mut self) {
        for w in self.words.iter_mut() {
            *w = 0;
        }
    }

    /// Returns true if and only if no value is in this set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns the smallest member strictly greater than `after`, or the
    /// smallest member when `after` is `None`.
    pub fn next(&self, after: Option<usize>) -> Option<usize> {
        let start = match after {
            None => 0,
            Some(i) => i.checked_add(1)?,
        };
        if start >= self.len {
            return None;
        }
        let mut wi = start / 64;
        let mut word = self.words[wi] & (!0u64 << (start % 64));
        loop {
            if word != 0 {
                let i = wi * 64 + word.trailing_zeros() as usize;
                return if i < self.len { Some(i) } else { None };
            }
            wi += 1;
            if wi >= self.words.len() {
                return None;
            }
            word = self.words[wi];
        }
    }

    /// Returns an iterator over the members of this set in ascending order.
    pub fn iter(&self) -> MultibitIter<'_> {
        MultibitIter { set: self, last: None, done: false }
    }
}

impl core::fmt::Debug for Multibit {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// An ascending iterator over the members of a [`Multibit`].
#[derive(Debug)]
pub struct MultibitIter<'a> {
    set: &'a Multibit,
    last: Option<usize>,
    done: bool,
}

impl<'a> Iterator for MultibitIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        match self.set.next(self.last) {
            None => {
                self.done = true;
                None
            }
            Some(i) => {
                self.last = Some(i);
                Some(i)
            }
        }
    }
}
