/*
 * @file gct.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Garbled cuckoo tables.
 *
 * Storage is `lm` sparse slots followed by `rm` dense slots.  A key decodes
 * to the sum of its 2 or 3 sparse slots plus the dense slots selected by its
 * dense bit vector.  Encoding peels the cuckoo graph, solves the leftover
 * core together with the dense slots, and then fills in the peeled keys in
 * reverse order.
 */

use crate::cuckoo::{find_core,PeelStrategy,Peeling};
use crate::dokvs::{Dokvs,SparseDokvs};
use crate::error::{Error,Result};
use crate::hashing::{HashKey,KeyRows,PositionGenerator};
use crate::linalg::bitset::BitSet;
use crate::linalg::solver::{LinearSystem,SolveMode};
use crate::module::ValueModule;
use crate::parallel::map_maybe_parallel;
use ark_std::{One,Zero};
use core::hash::Hash;
use core::marker::PhantomData;
use rand::{CryptoRng,Rng};

/** Statistical security parameter for the dense segment */
pub const STAT_SEC : usize = 40;

/** Round up to a multiple of 8 */
pub(crate) fn ceil8(x:usize) -> usize { (x+7) / 8 * 8 }

/** ceil(log2(n)), with log2(0) = log2(1) = 0 */
fn ceil_log2(n:usize) -> usize {
    if n <= 1 { 0 } else { (usize::BITS - (n-1).leading_zeros()) as usize }
}

/** Default size of the dense segment for `n` keys */
pub fn default_dense_range(n:usize) -> usize {
    ceil8(ceil_log2(n) + STAT_SEC)
}

/** Which cuckoo scheme, and how to peel it. */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub enum GctKind {
    /** Two sparse positions, parallel edges collapsed before peeling */
    H2TwoCore,
    /** Two sparse positions, plain degree-1 peeling */
    H2Singleton,
    /** Three sparse positions, plain degree-1 peeling */
    H3Singleton,
}

impl GctKind {
    pub fn sparse_num(self) -> usize {
        match self {
            GctKind::H2TwoCore | GctKind::H2Singleton => 2,
            GctKind::H3Singleton => 3,
        }
    }

    pub(crate) fn strategy(self) -> PeelStrategy {
        match self {
            GctKind::H2TwoCore => PeelStrategy::TwoCore,
            _ => PeelStrategy::Singleton,
        }
    }

    /** Default size of the sparse segment for `n` keys: 2.4n or 1.3n */
    pub fn default_sparse_range(self, n:usize) -> usize {
        let lm = match self.sparse_num() {
            2 => (12*n + 4) / 5,
            _ => (13*n + 9) / 10,
        };
        ceil8(lm).max(8)
    }
}

/**
 * A garbled cuckoo table for keys `K`, storing elements of the
 * value module `M`.
 */
#[derive(Clone,Debug)]
pub struct GarbledCuckooTable<K,M> {
    kind: GctKind,
    n: usize,
    positions: PositionGenerator,
    module: M,
    parallel_encode: bool,
    _phantom: PhantomData<K>,
}

impl <K:Hash+Sync, M:ValueModule> GarbledCuckooTable<K,M> {
    /** Number of hash keys required */
    pub const HASH_KEY_NUM : usize = 1;

    /** Create a table for up to `n` keys, with the default segment sizes */
    pub fn new(kind:GctKind, n:usize, hash_keys:&[HashKey], module:M) -> Result<Self> {
        Self::with_sizes(kind, n, kind.default_sparse_range(n), default_dense_range(n), hash_keys, module)
    }

    /** Create a table for up to `n` keys with explicit segment sizes `lm` and `rm` */
    pub fn with_sizes(kind:GctKind, n:usize, lm:usize, rm:usize, hash_keys:&[HashKey], module:M) -> Result<Self> {
        if hash_keys.len() != Self::HASH_KEY_NUM {
            return Err(Error::invalid(format!("expected {} hash key, got {}",
                Self::HASH_KEY_NUM, hash_keys.len())));
        }
        if lm < kind.sparse_num() {
            return Err(Error::invalid(format!("lm = {} is too small for {} distinct positions",
                lm, kind.sparse_num())));
        }
        let m = lm + rm;
        if m % 8 != 0 {
            return Err(Error::invalid(format!("m = {} is not a multiple of 8", m)));
        }
        if m < n {
            return Err(Error::invalid(format!("m = {} is less than n = {}", m, n)));
        }
        Ok(GarbledCuckooTable {
            kind,
            n,
            positions: PositionGenerator::new(hash_keys[0], kind.sparse_num(), lm, rm),
            module,
            parallel_encode: false,
            _phantom: PhantomData,
        })
    }

    pub fn kind(&self) -> GctKind { self.kind }
    pub fn lm(&self) -> usize { self.positions.lm }
    pub fn rm(&self) -> usize { self.positions.rm }
    pub fn module(&self) -> &M { &self.module }

    /** Hash every key to its row */
    pub(crate) fn key_rows(&self, keys:&[&K]) -> KeyRows {
        let gen = &self.positions;
        let rows = map_maybe_parallel(keys, self.parallel_encode,
            |k| (gen.sparse_positions(*k), gen.dense_bits(*k)));
        KeyRows::from_rows(gen.sparse_num, rows)
    }

    /** Fill a slot that no key constrains */
    fn padding<R:Rng+?Sized>(&self, doubly_encode:bool, rng:&mut R) -> M::Elem {
        if doubly_encode { self.module.random(rng) } else { self.module.zero() }
    }

    /**
     * Solve for the core vertices and the dense segment.  Core vertex values
     * are written into `sparse`; the dense values are returned.
     */
    fn solve_core<R:Rng+?Sized>(
        &self,
        rows: &KeyRows,
        values: &[&M::Elem],
        peeling: &Peeling,
        sparse: &mut [Option<M::Elem>],
        doubly_encode: bool,
        rng: &mut R
    ) -> Result<Vec<M::Elem>> {
        let (lm, rm) = (self.lm(), self.rm());
        let module = &self.module;
        let equations = peeling.core_keys.len() + peeling.parallel.len();
        if equations == 0 {
            return Ok((0..rm).map(|_| self.padding(doubly_encode, rng)).collect());
        }

        let d = peeling.core_vertices.len();
        let columns = d + rm;
        if equations > columns {
            return Err(Error::NoSolution { reason: "core too large", rows: equations, columns });
        }

        let mut column_of = vec![usize::MAX; lm];
        for (i,v) in peeling.core_vertices.iter().enumerate() { column_of[*v] = i; }

        let one = M::Scalar::one();
        let mut system = LinearSystem::<M>::new(columns);
        for &key in peeling.core_keys.iter() {
            let mut row = vec![M::Scalar::zero(); columns];
            for &v in rows.positions(key) { row[column_of[v]] = one; }
            for j in rows.dense(key).iter() { row[d+j] = one; }
            system.push_row(row, values[key].clone());
        }
        for &(dup, rep) in peeling.parallel.iter() {
            let mut row = vec![M::Scalar::zero(); columns];
            for j in rows.dense(dup).iter() { row[d+j] += one; }
            for j in rows.dense(rep).iter() { row[d+j] -= one; }
            system.push_row(row, module.sub(values[dup], values[rep]));
        }

        let mode = if doubly_encode { SolveMode::Full } else { SolveMode::Free };
        let mut solution = system.solve(module, mode, rng)?;
        let dense = solution.split_off(d);
        for (v,x) in peeling.core_vertices.iter().zip(solution) { sparse[*v] = Some(x); }
        Ok(dense)
    }

    /**
     * Replay the peeling stack from the top, solving each key for its
     * still-empty slot.
     */
    fn back_substitute<R:Rng+?Sized>(
        &self,
        rows: &KeyRows,
        values: &[&M::Elem],
        peeling: &Peeling,
        sparse: &mut [Option<M::Elem>],
        dense: &[M::Elem],
        rng: &mut R
    ) {
        let module = &self.module;
        for edge in peeling.stack.iter().rev() {
            let key = edge.key;
            let positions = rows.positions(key);
            let mut inner = module.sub(values[key], &module.sum(rows.dense(key).iter().map(|j| &dense[j])));

            let target = if sparse[edge.vertex].is_none() {
                edge.vertex
            } else {
                match positions.iter().find(|p| sparse[**p].is_none()) {
                    Some(p) => *p,
                    None => panic!("internal inconsistency: every slot of peeled key {} is already filled", key)
                }
            };

            for &p in positions {
                if p == target { continue; }
                if sparse[p].is_none() {
                    /* Structurally free: any value works */
                    sparse[p] = Some(module.random(rng));
                }
                if let Some(filled) = &sparse[p] {
                    inner = module.sub(&inner, filled);
                }
            }
            sparse[target] = Some(inner);
        }
    }

    /** Encode a batch of entries.  The keys must be distinct. */
    pub(crate) fn encode_entries<R:Rng+?Sized>(
        &self,
        entries: &[(&K, &M::Elem)],
        doubly_encode: bool,
        rng: &mut R
    ) -> Result<Vec<M::Elem>> {
        if entries.len() > self.n {
            return Err(Error::TooManyEntries { entries: entries.len(), capacity: self.n });
        }
        let keys : Vec<&K> = entries.iter().map(|(k,_)| *k).collect();
        let values : Vec<&M::Elem> = entries.iter().map(|(_,v)| *v).collect();
        let rows = self.key_rows(&keys);
        let peeling = find_core(&rows, self.lm(), self.kind.strategy());

        let mut sparse : Vec<Option<M::Elem>> = vec![None; self.lm()];
        let dense = self.solve_core(&rows, &values, &peeling, &mut sparse, doubly_encode, rng)?;
        self.back_substitute(&rows, &values, &peeling, &mut sparse, &dense, rng);

        let mut storage = Vec::with_capacity(self.m());
        for slot in sparse {
            storage.push(match slot {
                Some(x) => x,
                None => self.padding(doubly_encode, rng)
            });
        }
        storage.extend(dense);
        Ok(storage)
    }
}

impl <K:Hash+Sync, M:ValueModule> Dokvs<K,M> for GarbledCuckooTable<K,M> {
    fn n(&self) -> usize { self.n }
    fn m(&self) -> usize { self.lm() + self.rm() }
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
        let module = &self.module;
        let lm = self.lm();
        let sparse = self.positions.sparse_positions(key);
        let mut ret = module.sum(sparse[..self.kind.sparse_num()].iter().map(|p| &storage[*p]));
        for j in self.positions.dense_bits(key).iter() {
            ret = module.add(&ret, &storage[lm+j]);
        }
        Ok(ret)
    }
}

impl <K:Hash+Sync, M:ValueModule> SparseDokvs<K,M> for GarbledCuckooTable<K,M> {
    fn sparse_position_range(&self) -> usize { self.lm() }
    fn sparse_position_num(&self) -> usize { self.kind.sparse_num() }
    fn sparse_positions(&self, key:&K) -> Vec<usize> {
        self.positions.sparse_positions(key)[..self.kind.sparse_num()].to_vec()
    }
    fn dense_position_range(&self) -> usize { self.rm() }
    fn binary_dense_positions(&self, key:&K) -> BitSet { self.positions.dense_bits(key) }
}

/**************************************************************************
 * Tests
 **************************************************************************/
