/*
 * @file hashing.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Hashing keys to positions: a few distinct "sparse" positions in the left
 * segment, plus a pseudorandom "dense" bit vector over the right segment.
 */

use crate::linalg::bitset::BitSet;
use core::hash::{Hash,Hasher};
use rand::RngCore;
use rand::rngs::OsRng;
use siphasher::sip128::{Hasher128, SipHasher13};

type PositionHasher = SipHasher13;

/** A key for the SipHash13 hash function. */
pub type HashKey = [u8; 16];

/** Most sparse positions any cuckoo scheme uses */
pub const MAX_SPARSE_NUM : usize = 3;

/** Domain separator for the hash */
#[derive(Hash)]
enum WhyHashing {
    SparsePositions,
    DenseBits,
    BinAssignment,
    BloomPositions,
    DerivingNewKey
}

/** Start a hash of `k` for a particular purpose */
fn hasher_for<K:Hash+?Sized>(hash_key: &HashKey, why: WhyHashing, k: &K) -> PositionHasher {
    let mut h = PositionHasher::new_with_key(hash_key);
    why.hash(&mut h);
    k.hash(&mut h);
    h
}

/** Map a uniform 64-bit word to `0..n` by multiplying and shifting */
#[inline(always)]
fn reduce(word:u64, n:usize) -> usize {
    ((word as u128 * n as u128) >> 64) as usize
}

/**
 * Utility: either generate fresh hash keys, or derive them from an existing
 * key and the try number.
 */
pub fn choose_keys(base_key: Option<HashKey>, try_num: usize, count: usize) -> Vec<HashKey> {
    (0..count).map(|i| match base_key {
        None => {
            let mut key = [0u8; 16];
            OsRng.fill_bytes(&mut key);
            key
        },
        Some(key) => {
            let h = hasher_for(&key, WhyHashing::DerivingNewKey, &(try_num, i));
            let hash = h.finish128();
            let mut ret = [0u8; 16];
            ret[0..8] .copy_from_slice(&hash.h1.to_le_bytes());
            ret[8..16].copy_from_slice(&hash.h2.to_le_bytes());
            ret
        }
    }).collect()
}

/**
 * Position generator for the cuckoo schemes.
 *
 * Each key gets `sparse_num` (2 or 3) distinct positions in `0..lm`, and
 * a dense bit vector of length `rm`.  Both are pure functions of the key
 * and the hash key.
 */
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct PositionGenerator {
    hash_key: HashKey,
    pub sparse_num: usize,
    pub lm: usize,
    pub rm: usize,
}

impl PositionGenerator {
    pub fn new(hash_key: HashKey, sparse_num: usize, lm: usize, rm: usize) -> Self {
        debug_assert!(sparse_num == 2 || sparse_num == 3);
        debug_assert!(lm >= sparse_num);
        PositionGenerator { hash_key, sparse_num, lm, rm }
    }

    /** The distinct sparse positions of a key, in `0..lm` */
    pub fn sparse_positions<K:Hash+?Sized>(&self, k: &K) -> [usize; MAX_SPARSE_NUM] {
        let hash = hasher_for(&self.hash_key, WhyHashing::SparsePositions, k).finish128();
        let w0 = hash.h1;
        let w1 = hash.h2;
        let w2 = hash.h1.wrapping_add(hash.h2).rotate_left(39) ^ hash.h2;

        let a = reduce(w0, self.lm);
        let mut b = reduce(w1, self.lm-1);
        if b >= a { b += 1; }
        if self.sparse_num == 2 {
            return [a, b, usize::MAX];
        }

        /* Skip over both earlier picks, smallest first */
        let (lo, hi) = if a < b { (a,b) } else { (b,a) };
        let mut c = reduce(w2, self.lm-2);
        if c >= lo { c += 1; }
        if c >= hi { c += 1; }
        [a, b, c]
    }

    /** The dense bit vector of a key, of length `rm` */
    pub fn dense_bits<K:Hash+?Sized>(&self, k: &K) -> BitSet {
        let mut words = Vec::with_capacity((self.rm+127)/128 * 2);
        for block in 0..(self.rm+127)/128 {
            let mut h = hasher_for(&self.hash_key, WhyHashing::DenseBits, k);
            block.hash(&mut h);
            let hash = h.finish128();
            words.push(hash.h1);
            words.push(hash.h2);
        }
        BitSet::from_words(self.rm, &words)
    }
}

/**
 * Assign keys to one of `bins` bins.
 */
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct BinHasher {
    hash_key: HashKey,
    pub bins: usize,
}

impl BinHasher {
    pub fn new(hash_key: HashKey, bins: usize) -> Self {
        debug_assert!(bins > 0);
        BinHasher { hash_key, bins }
    }

    pub fn bin<K:Hash+?Sized>(&self, k: &K) -> usize {
        reduce(hasher_for(&self.hash_key, WhyHashing::BinAssignment, k).finish(), self.bins)
    }
}

/**
 * Draw `count` distinct positions in `0..range` for a garbled Bloom filter.
 * Requires `count <= range`.
 */
pub fn bloom_positions<K:Hash+?Sized>(hash_key: &HashKey, count: usize, range: usize, k: &K) -> Vec<usize> {
    debug_assert!(count <= range);
    let mut ret : Vec<usize> = Vec::with_capacity(count);
    let mut counter = 0u64;
    while ret.len() < count {
        let mut h = hasher_for(hash_key, WhyHashing::BloomPositions, k);
        counter.hash(&mut h);
        counter += 1;
        let hash = h.finish128();
        for word in [hash.h1, hash.h2] {
            let pos = reduce(word, range);
            if ret.len() < count && !ret.contains(&pos) { ret.push(pos); }
        }
    }
    ret
}

/**
 * Hashed rows of a batch of keys, stored flat and indexed by the key's
 * position in the batch.
 */
pub struct KeyRows {
    pub sparse_num: usize,
    positions: Vec<usize>,
    dense: Vec<BitSet>,
}

impl KeyRows {
    /** Collect rows from (sparse positions, dense bits) pairs, in key order */
    pub fn from_rows<I>(sparse_num: usize, rows: I) -> Self
    where I: IntoIterator<Item=([usize; MAX_SPARSE_NUM], BitSet)> {
        let iter = rows.into_iter();
        let (lower,_) = iter.size_hint();
        let mut positions = Vec::with_capacity(lower*sparse_num);
        let mut dense = Vec::with_capacity(lower);
        for (sparse,bits) in iter {
            positions.extend_from_slice(&sparse[..sparse_num]);
            dense.push(bits);
        }
        KeyRows { sparse_num, positions, dense }
    }

    pub fn len(&self) -> usize { self.dense.len() }

    pub fn is_empty(&self) -> bool { self.dense.is_empty() }

    /** The sparse positions of key number `id` */
    #[inline(always)]
    pub fn positions(&self, id: usize) -> &[usize] {
        &self.positions[id*self.sparse_num .. (id+1)*self.sparse_num]
    }

    /** The dense bits of key number `id` */
    #[inline(always)]
    pub fn dense(&self, id: usize) -> &BitSet { &self.dense[id] }
}
