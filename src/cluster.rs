/*
 * @file cluster.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Clustered garbled cuckoo tables: hash keys into independent bins, encode
 * each bin with its own table, and lay the bins' storage out side by side.
 */

use crate::dokvs::{Dokvs,SparseDokvs};
use crate::error::{Error,Result};
use crate::gct::{GarbledCuckooTable,GctKind,STAT_SEC};
use crate::hashing::{BinHasher,HashKey};
use crate::linalg::bitset::BitSet;
use crate::module::ValueModule;
use crate::parallel::map_maybe_parallel;
use core::fmt::Debug;
use core::hash::Hash;
use core::marker::PhantomData;
use rand::{CryptoRng,Rng,SeedableRng};
use rand::rngs::StdRng;

/** Expected number of keys per bin when the bin number isn't given */
pub const DEFAULT_EXPECT_BIN_SIZE : usize = 1 << 14;

/** Default number of bins for `n` keys */
pub fn default_bin_num(n:usize) -> usize {
    ((n + DEFAULT_EXPECT_BIN_SIZE - 1) / DEFAULT_EXPECT_BIN_SIZE).max(1)
}

/**
 * Capacity of each bin so that, when `n` keys are thrown into `bin_num`
 * bins, any bin overflows with probability about 2^-STAT_SEC.
 *
 * Chernoff-style bound: mu + sqrt(2 mu t) + t, where mu = n/bin_num and
 * t = STAT_SEC ln 2 + ln bin_num.
 */
pub fn max_bin_size(n:usize, bin_num:usize) -> usize {
    if bin_num <= 1 { return n; }
    let mu = n as f64 / bin_num as f64;
    let t = STAT_SEC as f64 * core::f64::consts::LN_2 + (bin_num as f64).ln();
    let bound = (mu + (2.0*mu*t).sqrt() + t).ceil() as usize;
    bound.min(n)
}

/**
 * Where the bins' segments go in the combined storage.
 */
pub trait ClusterLayout: Copy + Clone + Debug + Default + Send + Sync {
    /** Offsets of bin `bin`'s sparse and dense segments */
    fn offsets(bin:usize, bin_num:usize, bin_lm:usize, bin_rm:usize) -> (usize,usize);
}

/** Each bin's storage, whole, one bin after another */
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq)]
pub struct Naive;

/** All of the bins' sparse segments, then all of their dense segments */
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq)]
pub struct SparseClustered;

impl ClusterLayout for Naive {
    fn offsets(bin:usize, _bin_num:usize, bin_lm:usize, bin_rm:usize) -> (usize,usize) {
        let start = bin * (bin_lm + bin_rm);
        (start, start + bin_lm)
    }
}

impl ClusterLayout for SparseClustered {
    fn offsets(bin:usize, bin_num:usize, bin_lm:usize, bin_rm:usize) -> (usize,usize) {
        (bin * bin_lm, bin_num * bin_lm + bin * bin_rm)
    }
}

/**
 * A garbled cuckoo table split into bins.
 *
 * The first hash key assigns keys to bins; the second keys every bin's
 * table.  All bins have the same size.
 */
#[derive(Clone,Debug)]
pub struct ClusterGct<K,M,L> {
    n: usize,
    bins: BinHasher,
    bin_n: usize,
    table: GarbledCuckooTable<K,M>,
    parallel_encode: bool,
    _layout: PhantomData<L>,
}

impl <K:Hash+Sync, M:ValueModule, L:ClusterLayout> ClusterGct<K,M,L> {
    /** Number of hash keys required */
    pub const HASH_KEY_NUM : usize = 2;

    /** Create a clustered table for up to `n` keys, with the default number of bins */
    pub fn new(kind:GctKind, n:usize, hash_keys:&[HashKey], module:M) -> Result<Self> {
        Self::with_bin_num(kind, n, default_bin_num(n), hash_keys, module)
    }

    /** Create a clustered table for up to `n` keys in `bin_num` bins */
    pub fn with_bin_num(kind:GctKind, n:usize, bin_num:usize, hash_keys:&[HashKey], module:M) -> Result<Self> {
        if hash_keys.len() != Self::HASH_KEY_NUM {
            return Err(Error::invalid(format!("expected {} hash keys, got {}",
                Self::HASH_KEY_NUM, hash_keys.len())));
        }
        if bin_num == 0 {
            return Err(Error::invalid("bin number must be positive"));
        }
        let bin_n = max_bin_size(n, bin_num);
        let table = GarbledCuckooTable::new(kind, bin_n, &hash_keys[1..], module)?;
        Ok(ClusterGct {
            n,
            bins: BinHasher::new(hash_keys[0], bin_num),
            bin_n,
            table,
            parallel_encode: false,
            _layout: PhantomData,
        })
    }

    pub fn bin_num(&self) -> usize { self.bins.bins }

    /** Capacity of each bin */
    pub fn bin_n(&self) -> usize { self.bin_n }

    /** Which bin a key lands in */
    pub fn bin_of(&self, key:&K) -> usize { self.bins.bin(key) }

    fn offsets(&self, bin:usize) -> (usize,usize) {
        L::offsets(bin, self.bin_num(), self.table.lm(), self.table.rm())
    }

    /** Positions of a key in the combined storage: (sparse slots, dense slots) */
    pub fn positions(&self, key:&K) -> (Vec<usize>, Vec<usize>) {
        let (sparse_off, dense_off) = self.offsets(self.bin_of(key));
        let sparse = self.table.sparse_positions(key).into_iter().map(|p| sparse_off + p).collect();
        let dense = self.table.binary_dense_positions(key).iter().map(|j| dense_off + j).collect();
        (sparse, dense)
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

        let bin_num = self.bin_num();
        let mut bins = vec![Vec::new(); bin_num];
        for entry in entries { bins[self.bin_of(entry.0)].push(*entry); }
        let max_load = bins.iter().map(|b| b.len()).max().unwrap_or(0);
        tracing::debug!(bins = bin_num, max_load, capacity = self.bin_n, "assigned keys to bins");
        for (bin, contents) in bins.iter().enumerate() {
            if contents.len() > self.bin_n {
                return Err(Error::BinOverflow { bin, entries: contents.len(), capacity: self.bin_n });
            }
        }

        /* Each bin gets its own generator, so bins can run concurrently */
        let seeds : Vec<(usize,[u8;32])> = (0..bin_num).map(|b| (b, rng.gen())).collect();
        let table = &self.table;
        let encoded = map_maybe_parallel(&seeds, self.parallel_encode, |(bin, seed)| {
            let mut bin_rng = StdRng::from_seed(*seed);
            table.encode_entries(&bins[*bin], doubly_encode, &mut bin_rng)
        });

        let (lm, rm) = (table.lm(), table.rm());
        let mut storage = vec![table.module().zero(); self.m()];
        for (bin, bin_storage) in encoded.into_iter().enumerate() {
            let bin_storage = bin_storage?;
            let (sparse_off, dense_off) = self.offsets(bin);
            storage[sparse_off..sparse_off+lm].clone_from_slice(&bin_storage[..lm]);
            storage[dense_off..dense_off+rm].clone_from_slice(&bin_storage[lm..]);
        }
        Ok(storage)
    }
}

impl <K:Hash+Sync, M:ValueModule, L:ClusterLayout> Dokvs<K,M> for ClusterGct<K,M,L> {
    fn n(&self) -> usize { self.n }
    fn m(&self) -> usize { self.bin_num() * self.table.m() }

    /** Parallel encoding runs the bins concurrently, each one sequential inside */
    fn set_parallel_encode(&mut self, parallel:bool) { self.parallel_encode = parallel; }
    fn parallel_encode(&self) -> bool { self.parallel_encode }

    fn encode_with_rng<'a, I, R>(&self, entries:I, doubly_encode:bool, rng:&mut R) -> Result<Vec<M::Elem>>
    where I: IntoIterator<Item=(&'a K, &'a M::Elem)>, K: 'a, M::Elem: 'a, R: Rng + CryptoRng + ?Sized {
        let entries : Vec<(&K, &M::Elem)> = entries.into_iter().collect();
        self.encode_entries(&entries, doubly_encode, rng)
    }

    fn decode(&self, storage:&[M::Elem], key:&K) -> Result<M::Elem> {
        if storage.len() != self.m() {
            return Err(Error::StorageLength { expected: self.m(), actual: storage.len() });
        }
        let (sparse, dense) = self.positions(key);
        Ok(self.table.module().sum(sparse.iter().chain(dense.iter()).map(|p| &storage[*p])))
    }
}

/**
 * With the sparse segments clustered together, the combined storage is
 * again a sparse segment followed by a dense one.
 */
impl <K:Hash+Sync, M:ValueModule> SparseDokvs<K,M> for ClusterGct<K,M,SparseClustered> {
    fn sparse_position_range(&self) -> usize { self.bin_num() * self.table.lm() }
    fn sparse_position_num(&self) -> usize { self.table.sparse_position_num() }
    fn sparse_positions(&self, key:&K) -> Vec<usize> { self.positions(key).0 }
    fn dense_position_range(&self) -> usize { self.bin_num() * self.table.rm() }

    fn binary_dense_positions(&self, key:&K) -> BitSet {
        let rm = self.table.rm();
        let offset = self.bin_of(key) * rm;
        let mut ret = BitSet::with_capacity(self.dense_position_range());
        for j in self.table.binary_dense_positions(key).iter() { ret.insert(offset + j); }
        ret
    }
}
