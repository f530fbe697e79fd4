/*
 * @file dokvs.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * The oblivious key-value store interface, parameters, and a builder that
 * retries with fresh hash keys.
 */

use crate::cluster::{ClusterGct,Naive,SparseClustered};
use crate::error::{Error,Result};
use crate::gbf::GarbledBloomFilter;
use crate::gct::{GarbledCuckooTable,GctKind};
use crate::hashing::{HashKey,choose_keys};
use crate::linalg::bitset::BitSet;
use crate::module::ValueModule;
use bincode::{Encode,Decode};
use core::hash::Hash;
use rand::{CryptoRng,Rng,SeedableRng};
use rand::rngs::StdRng;

/**
 * A doubly-oblivious key-value store.
 *
 * Encoding maps up to `n()` distinct (key,value) pairs to `m()` storage
 * elements.  Decoding a key reads a key-determined set of storage slots
 * and adds them up.  On a key that was encoded, it returns that key's value;
 * on any other key it returns something arbitrary.
 */
pub trait Dokvs<K, M:ValueModule> {
    /** Maximum number of entries */
    fn n(&self) -> usize;

    /** Length of the storage */
    fn m(&self) -> usize;

    /** n/m */
    fn rate(&self) -> f64 { self.n() as f64 / self.m() as f64 }

    /** Only affects performance */
    fn set_parallel_encode(&mut self, parallel:bool);
    fn parallel_encode(&self) -> bool;

    /**
     * Encode the entries, drawing randomness from `rng`.
     *
     * The keys must be distinct, so a `&HashMap` or `&BTreeMap` is a good
     * thing to pass.  With `doubly_encode`, every slot of the result is
     * uniformly random subject to decoding correctly; without it, slots
     * that no key needs are zero.
     */
    fn encode_with_rng<'a, I, R>(&self, entries:I, doubly_encode:bool, rng:&mut R) -> Result<Vec<M::Elem>>
    where I: IntoIterator<Item=(&'a K, &'a M::Elem)>, K: 'a, M::Elem: 'a, R: Rng + CryptoRng + ?Sized;

    /** Encode the entries, with a freshly seeded generator */
    fn encode<'a, I>(&self, entries:I, doubly_encode:bool) -> Result<Vec<M::Elem>>
    where I: IntoIterator<Item=(&'a K, &'a M::Elem)>, K: 'a, M::Elem: 'a {
        self.encode_with_rng(entries, doubly_encode, &mut StdRng::from_entropy())
    }

    /** Decode a key.  Fails only if the storage has the wrong length. */
    fn decode(&self, storage:&[M::Elem], key:&K) -> Result<M::Elem>;
}

/**
 * A store whose storage is a sparse segment followed by a dense segment.
 * A key decodes to the sum of its sparse positions, plus the dense slots
 * selected by its binary dense positions.
 */
pub trait SparseDokvs<K, M:ValueModule> : Dokvs<K,M> {
    fn sparse_position_range(&self) -> usize;
    fn sparse_position_num(&self) -> usize;

    /** Distinct positions in `0..sparse_position_range()` */
    fn sparse_positions(&self, key:&K) -> Vec<usize>;

    fn dense_position_range(&self) -> usize;

    /** Bit vector of length `dense_position_range()` */
    fn binary_dense_positions(&self, key:&K) -> BitSet;
}

/** Every kind of store this crate builds */
#[derive(Copy,Clone,PartialEq,Eq,Debug,Hash,Encode,Decode)]
pub enum DokvsType {
    H2TwoCoreGct,
    H2SingletonGct,
    H3SingletonGct,
    H2NaiveClusterGct,
    H2SparseClusterGct,
    H3NaiveClusterGct,
    H3SparseClusterGct,
    Gbf,
}

impl DokvsType {
    pub const ALL : [DokvsType; 8] = [
        DokvsType::H2TwoCoreGct, DokvsType::H2SingletonGct, DokvsType::H3SingletonGct,
        DokvsType::H2NaiveClusterGct, DokvsType::H2SparseClusterGct,
        DokvsType::H3NaiveClusterGct, DokvsType::H3SparseClusterGct,
        DokvsType::Gbf,
    ];

    /** How many hash keys a store of this type needs */
    pub fn hash_key_num(self) -> usize {
        match self {
            DokvsType::H2NaiveClusterGct | DokvsType::H2SparseClusterGct
            | DokvsType::H3NaiveClusterGct | DokvsType::H3SparseClusterGct => 2,
            _ => 1,
        }
    }

    /** The cuckoo scheme underlying this type, if any */
    pub fn gct_kind(self) -> Option<GctKind> {
        match self {
            DokvsType::H2TwoCoreGct | DokvsType::H2NaiveClusterGct | DokvsType::H2SparseClusterGct
                => Some(GctKind::H2TwoCore),
            DokvsType::H2SingletonGct => Some(GctKind::H2Singleton),
            DokvsType::H3SingletonGct | DokvsType::H3NaiveClusterGct | DokvsType::H3SparseClusterGct
                => Some(GctKind::H3Singleton),
            DokvsType::Gbf => None,
        }
    }
}

/**
 * Everything needed to rebuild a store: the encoder ships this to the
 * decoder alongside the storage.
 */
#[derive(Clone,PartialEq,Eq,Debug,Encode,Decode)]
pub struct DokvsParams {
    pub kind: DokvsType,
    pub n: usize,
    pub hash_keys: Vec<HashKey>,
}

impl DokvsParams {
    pub fn new(kind:DokvsType, n:usize, hash_keys:Vec<HashKey>) -> Self {
        DokvsParams { kind, n, hash_keys }
    }

    /** Parameters with fresh random hash keys */
    pub fn random(kind:DokvsType, n:usize) -> Self {
        Self::new(kind, n, choose_keys(None, 0, kind.hash_key_num()))
    }
}

/** Standard bincode config: fixed-width little-endian integers */
pub const STD_BINCODE_CONFIG : bincode::config::Configuration<bincode::config::LittleEndian, bincode::config::Fixint>
    = bincode::config::standard().with_fixed_int_encoding();

/** Any of the stores, chosen at runtime */
#[derive(Clone,Debug)]
pub enum AnyDokvs<K,M> {
    Gct(GarbledCuckooTable<K,M>),
    NaiveCluster(ClusterGct<K,M,Naive>),
    SparseCluster(ClusterGct<K,M,SparseClustered>),
    Gbf(GarbledBloomFilter<K,M>),
}

macro_rules! dispatch {
    ($self:expr, $x:ident => $body:expr) => {
        match $self {
            AnyDokvs::Gct($x) => $body,
            AnyDokvs::NaiveCluster($x) => $body,
            AnyDokvs::SparseCluster($x) => $body,
            AnyDokvs::Gbf($x) => $body,
        }
    }
}

impl <K:Hash+Sync, M:ValueModule> AnyDokvs<K,M> {
    /** Build the store described by `params` */
    pub fn new(params:&DokvsParams, module:M) -> Result<Self> {
        let (kind, n, keys) = (params.kind, params.n, &params.hash_keys[..]);
        if keys.len() != kind.hash_key_num() {
            return Err(Error::invalid(format!("{:?} needs {} hash keys, got {}",
                kind, kind.hash_key_num(), keys.len())));
        }
        Ok(match (kind, kind.gct_kind()) {
            (DokvsType::Gbf, _) | (_, None) =>
                AnyDokvs::Gbf(GarbledBloomFilter::new(n, keys, module)?),
            (DokvsType::H2NaiveClusterGct | DokvsType::H3NaiveClusterGct, Some(gct)) =>
                AnyDokvs::NaiveCluster(ClusterGct::new(gct, n, keys, module)?),
            (DokvsType::H2SparseClusterGct | DokvsType::H3SparseClusterGct, Some(gct)) =>
                AnyDokvs::SparseCluster(ClusterGct::new(gct, n, keys, module)?),
            (_, Some(gct)) =>
                AnyDokvs::Gct(GarbledCuckooTable::new(gct, n, keys, module)?),
        })
    }
}

impl <K:Hash+Sync, M:ValueModule> Dokvs<K,M> for AnyDokvs<K,M> {
    fn n(&self) -> usize { dispatch!(self, x => x.n()) }
    fn m(&self) -> usize { dispatch!(self, x => x.m()) }
    fn set_parallel_encode(&mut self, parallel:bool) { dispatch!(self, x => x.set_parallel_encode(parallel)) }
    fn parallel_encode(&self) -> bool { dispatch!(self, x => x.parallel_encode()) }

    fn encode_with_rng<'a, I, R>(&self, entries:I, doubly_encode:bool, rng:&mut R) -> Result<Vec<M::Elem>>
    where I: IntoIterator<Item=(&'a K, &'a M::Elem)>, K: 'a, M::Elem: 'a, R: Rng + CryptoRng + ?Sized {
        dispatch!(self, x => x.encode_with_rng(entries, doubly_encode, rng))
    }

    fn decode(&self, storage:&[M::Elem], key:&K) -> Result<M::Elem> {
        dispatch!(self, x => x.decode(storage, key))
    }
}

/**
 * Options to build a store.  Intended to be constructed
 * with `BuildOptions::default()`.
 */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub struct BuildOptions {
    /**
     * How many times to try encoding?
     *
     * Each try fails only with negligible probability, so this mostly
     * bounds the damage from an adversarially chosen `key_gen`.
     *
     * Default: 16.
     */
    pub max_tries: usize,

    /**
     * In-out-parameter from build.
     *
     * On which try did the build succeed?  If passed in
     * as nonzero, the counter starts here.
     */
    pub try_num: usize,

    /**
     * Optional hash key to make building deterministic.
     * If a key is given, then the actual keys used will be
     * derived from that key and from `try_num`.
     * If omitted, fresh random keys will be selected for
     * each try.
     *
     * Default: `None`.
     */
    pub key_gen: Option<HashKey>,

    /** Default: true. */
    pub doubly_encode: bool,

    /** Default: false. */
    pub parallel_encode: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            max_tries: 16,
            try_num: 0,
            key_gen: None,
            doubly_encode: true,
            parallel_encode: false,
        }
    }
}

/**
 * Build a store of type `kind` for up to `n` keys and encode `entries`
 * into it, re-keying after negligible-probability failures.
 *
 * Returns the store, whose parameters can be recovered with
 * [`AnyDokvs::new`] on the same hash keys, together with its storage.
 */
pub fn encode_with_retries<'a, K, M, I, R>(
    kind: DokvsType,
    n: usize,
    module: &M,
    entries: I,
    options: &mut BuildOptions,
    rng: &mut R
) -> Result<(DokvsParams, AnyDokvs<K,M>, Vec<M::Elem>)>
where K: Hash + Sync + 'a, M: ValueModule, M::Elem: 'a,
      I: IntoIterator<Item=(&'a K, &'a M::Elem)>, R: Rng + CryptoRng + ?Sized {
    let entries : Vec<(&K, &M::Elem)> = entries.into_iter().collect();
    let mut last_err = None;
    for try_num in options.try_num..options.max_tries {
        let params = DokvsParams::new(kind, n, choose_keys(options.key_gen, try_num, kind.hash_key_num()));
        let mut dokvs = AnyDokvs::new(&params, module.clone())?;
        dokvs.set_parallel_encode(options.parallel_encode);
        match dokvs.encode_with_rng(entries.iter().copied(), options.doubly_encode, rng) {
            Ok(storage) => {
                options.try_num = try_num;
                return Ok((params, dokvs, storage));
            },
            Err(e) if e.is_retryable() => {
                tracing::warn!(?kind, n, try_num, error = %e, "encoding failed, re-keying");
                last_err = Some(e);
            },
            Err(e) => return Err(e)
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => Err(Error::invalid(format!("no tries left: try_num = {}, max_tries = {}",
            options.try_num, options.max_tries)))
    }
}

#[cfg(test)]
mod tests {
    use crate::dokvs::{AnyDokvs,BuildOptions,Dokvs,DokvsParams,DokvsType,STD_BINCODE_CONFIG,encode_with_retries};
    use crate::error::Error;
    use crate::module::{FieldModule,GroupModule,ValueModule};
    use ark_bls12_381::{Fr,G1Projective};
    use rand::{Rng,SeedableRng,thread_rng};
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn random_map<M:ValueModule>(module:&M, size:usize) -> HashMap<u64,M::Elem> {
        let mut rng = thread_rng();
        let mut map = HashMap::new();
        while map.len() < size { map.insert(rng.gen::<u64>(), module.random(&mut rng)); }
        map
    }

    #[test]
    fn test_params_bincode() {
        for kind in DokvsType::ALL {
            let params = DokvsParams::random(kind, 1234);
            assert_eq!(params.hash_keys.len(), kind.hash_key_num());
            let bytes = bincode::encode_to_vec(&params, STD_BINCODE_CONFIG).unwrap();
            let (decoded, len) : (DokvsParams, usize) = bincode::decode_from_slice(&bytes, STD_BINCODE_CONFIG).unwrap();
            assert_eq!(len, bytes.len());
            assert_eq!(decoded, params);
        }
    }

    #[test]
    fn test_wrong_key_count() {
        let module = FieldModule::<Fr>::new();
        for kind in DokvsType::ALL {
            let params = DokvsParams::new(kind, 10, vec![[0u8;16]; 3]);
            assert!(matches!(AnyDokvs::<u64,_>::new(&params, module.clone()), Err(Error::InvalidParameters{..})));
        }
    }

    /** The decoder rebuilds the store from serialized parameters */
    fn check_all_types<M:ValueModule>(module:&M) {
        let n = 300;
        let map = random_map(module, n);
        let mut rng = StdRng::seed_from_u64(n as u64);
        for kind in DokvsType::ALL {
            let mut options = BuildOptions::default();
            let (params, encoder, storage) = encode_with_retries(kind, n, module, &map, &mut options, &mut rng).unwrap();
            assert_eq!(encoder.n(), n);
            assert_eq!(storage.len(), encoder.m());
            assert_eq!(encoder.m() % 8, 0);
            assert!(encoder.rate() > 0.0 && encoder.rate() <= 1.0);

            let bytes = bincode::encode_to_vec(&params, STD_BINCODE_CONFIG).unwrap();
            let (params, _) : (DokvsParams, usize) = bincode::decode_from_slice(&bytes, STD_BINCODE_CONFIG).unwrap();
            let decoder = AnyDokvs::<u64,M>::new(&params, module.clone()).unwrap();
            assert_eq!(decoder.m(), encoder.m());
            for (k,v) in map.iter() { assert_eq!(decoder.decode(&storage, k).unwrap(), *v); }
        }
    }

    #[test]
    fn test_all_types_field() {
        check_all_types(&FieldModule::<Fr>::new());
    }

    #[test]
    fn test_all_types_group() {
        check_all_types(&GroupModule::<G1Projective>::new());
    }

    #[test]
    fn test_deterministic_keys() {
        let module = FieldModule::<Fr>::new();
        let map = random_map(&module, 100);
        let mut options = BuildOptions { key_gen: Some([3u8;16]), parallel_encode: true, ..BuildOptions::default() };
        let (params_a, _, _) = encode_with_retries(DokvsType::H3SparseClusterGct, 100, &module, &map, &mut options, &mut thread_rng()).unwrap();
        let try_a = options.try_num;
        let (params_b, _, _) = encode_with_retries(DokvsType::H3SparseClusterGct, 100, &module, &map, &mut options, &mut thread_rng()).unwrap();
        assert_eq!(options.try_num, try_a);
        assert_eq!(params_a, params_b);
    }

    #[test]
    fn test_retry_errors() {
        let module = FieldModule::<Fr>::new();
        let map = random_map(&module, 20);

        /* Not retryable */
        let mut options = BuildOptions::default();
        assert!(matches!(encode_with_retries(DokvsType::H2TwoCoreGct, 10, &module, &map, &mut options, &mut thread_rng()),
            Err(Error::TooManyEntries{..})));

        /* Retryable every time: a repeated key in a Bloom filter */
        let v = module.random(&mut thread_rng());
        let entries = [(&5u64, &v), (&5u64, &v)];
        let mut options = BuildOptions { max_tries: 3, ..BuildOptions::default() };
        assert!(matches!(encode_with_retries(DokvsType::Gbf, 10, &module, entries.iter().copied(), &mut options, &mut thread_rng()),
            Err(Error::NoEmptySlot{ key_index: 1 })));

        let mut options = BuildOptions { try_num: 4, max_tries: 4, ..BuildOptions::default() };
        assert!(matches!(encode_with_retries(DokvsType::Gbf, 10, &module, &map, &mut options, &mut thread_rng()),
            Err(Error::InvalidParameters{..})));
    }

    #[test]
    fn test_options_default() {
        let options = BuildOptions::default();
        assert_eq!(options.max_tries, 16);
        assert_eq!(options.try_num, 0);
        assert!(options.key_gen.is_none());
        assert!(options.doubly_encode);
        assert!(!options.parallel_encode);
    }
}
