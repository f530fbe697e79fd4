/*
 * @file bitset.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 * Based on the bit set from compressed_map, copyright 2020-2022 Rambus Inc., MIT license.
 *
 * Fixed-capacity bit sets, used for the dense part of each key's row.
 */

/** A set of integers in `0..capacity`, packed into words. */
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitSet {
    capacity: usize,
    set: Vec<u64>
}

impl BitSet {
    /** Initialize an empty set */
    pub fn with_capacity(capacity:usize) -> Self {
        BitSet { capacity, set : vec![0; (capacity+63)/64] }
    }

    /**
     * Create a set from little-endian words.  Bits at or above `capacity`
     * are dropped, and missing words are taken to be zero.
     */
    pub fn from_words(capacity:usize, words:&[u64]) -> Self {
        let mut ret = Self::with_capacity(capacity);
        for (dst,src) in ret.set.iter_mut().zip(words) { *dst = *src; }
        if capacity % 64 != 0 {
            if let Some(last) = ret.set.last_mut() {
                *last &= (1u64 << (capacity % 64)) - 1;
            }
        }
        ret
    }

    /** The number of possible members, i.e. the length as a bit vector */
    pub fn capacity(&self) -> usize { self.capacity }

    /** Set a bit in the set */
    #[inline(always)]
    pub fn insert(&mut self, x:usize) {
        debug_assert!(x < self.capacity);
        self.set[x/64] |= 1<<(x%64);
    }

    /** Remove a bit in the set */
    #[inline(always)]
    pub fn remove(&mut self, x:usize) {
        self.set[x/64] &= !(1<<(x%64));
    }

    /** Check a bit in the set */
    #[inline(always)]
    pub fn contains(&self, x:usize) -> bool {
        x/64 < self.set.len() && (self.set[x/64] & 1<<(x%64)) != 0
    }

    /** Number of members */
    pub fn len(&self) -> usize {
        let mut ret = 0;
        for x in &self.set { ret += x.count_ones() as usize };
        ret
    }

    pub fn is_empty(&self) -> bool { self.set.iter().all(|x| *x == 0) }

    /** Iterate over the members, in increasing order */
    pub fn iter(&self) -> BitSetIterator<'_> {
        BitSetIterator { set: &self, offset:0, cur:0 }
    }
}

pub struct BitSetIterator<'a> {
    set: &'a BitSet,
    offset: usize,
    cur: u64
}

impl <'a> Iterator for BitSetIterator<'a> {
    type Item = usize;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cur != 0 {
                let ret = self.cur.trailing_zeros() as usize + (self.offset-1)*64;
                self.cur &= self.cur-1;
                debug_assert!(self.set.contains(ret));
                return Some(ret);
            } else if self.offset >= self.set.set.len() {
                return None;
            } else {
                self.cur = self.set.set[self.offset];
                self.offset += 1;
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use crate::linalg::bitset::BitSet;
    use rand::{Rng,thread_rng};

    #[test]
    fn test_bitset() {
        for _ in 0..100 {
            let capacity = thread_rng().gen_range(1..300);
            let mut set = BitSet::with_capacity(capacity);
            let mut members = Vec::new();
            for i in 0..capacity {
                if thread_rng().gen::<bool>() {
                    set.insert(i);
                    members.push(i);
                }
            }
            assert_eq!(set.len(), members.len());
            assert_eq!(set.iter().collect::<Vec<_>>(), members);
            for i in 0..capacity {
                assert_eq!(set.contains(i), members.contains(&i));
            }
            assert!(!set.contains(capacity+64));

            for i in members.iter() { set.remove(*i); }
            assert!(set.is_empty());
            assert_eq!(set, BitSet::with_capacity(capacity));
        }
    }

    #[test]
    fn test_from_words() {
        for capacity in [0usize,1,24,63,64,65,128,130] {
            let words = [!0u64; 3];
            let set = BitSet::from_words(capacity, &words);
            assert_eq!(set.capacity(), capacity);
            assert_eq!(set.len(), capacity);
            assert_eq!(set.iter().collect::<Vec<_>>(), (0..capacity).collect::<Vec<_>>());
        }

        let set = BitSet::from_words(100, &[0b1010]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1,3]);
    }
}
