/*
 * @file gbf.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Garbled Bloom filters.
 */

use crate::dokvs::{Dokvs,SparseDokvs};
use crate::error::{Error,Result};
use crate::gct::ceil8;
use crate::hashing::{HashKey,bloom_positions};
use crate::linalg::bitset::BitSet;
use crate::module::ValueModule;
use crate::parallel::map_maybe_parallel;
use core::hash::Hash;
use core::marker::PhantomData;
use rand::{CryptoRng,Rng};

/** Number of positions per key */
pub const GBF_HASH_NUM : usize = 40;

/** Storage size of a garbled Bloom filter for `n` keys: n*40/ln 2, rounded up to 8 */
pub fn gbf_size(n:usize) -> usize {
    let m = (n as f64 * GBF_HASH_NUM as f64 / core::f64::consts::LN_2).ceil() as usize;
    ceil8(m.max(GBF_HASH_NUM))
}

/**
 * A garbled Bloom filter.
 *
 * Each key reads GBF_HASH_NUM distinct slots and decodes to their sum.
 * Keys are inserted one at a time: each one claims a slot that no earlier
 * key has touched, so there is no linear system to solve.
 */
#[derive(Clone,Debug)]
pub struct GarbledBloomFilter<K,M> {
    n: usize,
    m: usize,
    hash_key: HashKey,
    module: M,
    parallel_encode: bool,
    _phantom: PhantomData<K>,
}

impl <K:Hash+Sync, M:ValueModule> GarbledBloomFilter<K,M> {
    /** Number of hash keys required */
    pub const HASH_KEY_NUM : usize = 1;

    pub fn new(n:usize, hash_keys:&[HashKey], module:M) -> Result<Self> {
        if hash_keys.len() != Self::HASH_KEY_NUM {
            return Err(Error::invalid(format!("expected {} hash key, got {}",
                Self::HASH_KEY_NUM, hash_keys.len())));
        }
        Ok(GarbledBloomFilter {
            n,
            m: gbf_size(n),
            hash_key: hash_keys[0],
            module,
            parallel_encode: false,
            _phantom: PhantomData,
        })
    }

    fn positions(&self, key:&K) -> Vec<usize> {
        bloom_positions(&self.hash_key, GBF_HASH_NUM, self.m, key)
    }

    fn encode_entries<R:Rng+?Sized>(
        &self,
        entries: &[(&K, &M::Elem)],
        doubly_encode: bool,
        rng: &mut R
    ) -> Result<Vec<M::Elem>> {
        if entries.len() > self.n {
            return Err(Error::TooManyEntries { entries: entries.len(), capacity: self.n });
        }
        let module = &self.module;
        let positions = map_maybe_parallel(entries, self.parallel_encode, |(k,_)| self.positions(*k));

        let mut storage : Vec<Option<M::Elem>> = vec![None; self.m];
        for (key_index, ((_,value), pos)) in entries.iter().zip(positions.iter()).enumerate() {
            let reserved = match pos.iter().find(|p| storage[**p].is_none()) {
                Some(p) => *p,
                None => return Err(Error::NoEmptySlot { key_index })
            };
            let mut inner = (*value).clone();
            for &p in pos.iter() {
                if p == reserved { continue; }
                if storage[p].is_none() { storage[p] = Some(module.random(rng)); }
                if let Some(filled) = &storage[p] { inner = module.sub(&inner, filled); }
            }
            storage[reserved] = Some(inner);
        }

        Ok(storage.into_iter().map(|slot| match slot {
            Some(x) => x,
            None if doubly_encode => module.random(rng),
            None => module.zero()
        }).collect())
    }
}

impl <K:Hash+Sync, M:ValueModule> Dokvs<K,M> for GarbledBloomFilter<K,M> {
    fn n(&self) -> usize { self.n }
    fn m(&self) -> usize { self.m }
    fn set_parallel_encode(&mut self, parallel:bool) { self.parallel_encode = parallel; }
    fn parallel_encode(&self) -> bool { self.parallel_encode }

    fn encode_with_rng<'a, I, R>(&self, entries:I, doubly_encode:bool, rng:&mut R) -> Result<Vec<M::Elem>>
    where I: IntoIterator<Item=(&'a K, &'a M::Elem)>, K: 'a, M::Elem: 'a, R: Rng + CryptoRng + ?Sized {
        let entries : Vec<(&K, &M::Elem)> = entries.into_iter().collect();
        self.encode_entries(&entries, doubly_encode, rng)
    }

    fn decode(&self, storage:&[M::Elem], key:&K) -> Result<M::Elem> {
        if storage.len() != self.m {
            return Err(Error::StorageLength { expected: self.m, actual: storage.len() });
        }
        Ok(self.module.sum(self.positions(key).iter().map(|p| &storage[*p])))
    }
}

impl <K:Hash+Sync, M:ValueModule> SparseDokvs<K,M> for GarbledBloomFilter<K,M> {
    fn sparse_position_range(&self) -> usize { self.m }
    fn sparse_position_num(&self) -> usize { GBF_HASH_NUM }
    fn sparse_positions(&self, key:&K) -> Vec<usize> { self.positions(key) }
    fn dense_position_range(&self) -> usize { 0 }
    fn binary_dense_positions(&self, _key:&K) -> BitSet { BitSet::with_capacity(0) }
}
