/*!
 * Doubly-oblivious key-value stores.
 *
 * This crate encodes a map from keys `K` to values into a flat storage array
 * of `m` elements.  Decoding a key reads a small set of storage slots which
 * depends only on the key and public hash keys, and adds them up.  Like the
 * maps in a cuckoo filter, the storage does not contain the keys: decoding a
 * key that wasn't encoded returns something arbitrary.
 *
 * The stores are *doubly oblivious*: with `doubly_encode` set, the storage is
 * uniformly random subject to decoding correctly.  This makes them a building
 * block for private set intersection and similar protocols, where one party
 * sends the storage to the other.
 *
 * # Value modules
 *
 * Storage elements can live in any [`ValueModule`]: a prime field
 * ([`FieldModule`]) or a prime-order elliptic curve group acted on by its
 * scalar field ([`GroupModule`]).  Encoding only adds, subtracts and scales
 * elements by field coefficients, so the same engine works for both.
 *
 * # Garbled cuckoo tables
 *
 * The main structure is the [`GarbledCuckooTable`].  Its storage is a sparse
 * segment of `lm` slots followed by a dense segment of `rm` slots.  Each key
 * hashes to 2 or 3 distinct sparse slots and a pseudorandom subset of the
 * dense slots.  Encoding builds the cuckoo hypergraph of the keys' sparse
 * slots and peels off keys that have a slot to themselves.  What's left (the
 * 2-core) is solved as a linear system together with the dense segment, and
 * the peeled keys are then filled back in, most recently peeled first.
 *
 * For two sparse slots, the [`GctKind::H2TwoCore`] scheme also collapses keys
 * that share both slots, solving them through the dense segment.
 *
 * # Other stores
 *
 * * [`ClusterGct`] hashes keys into bins and encodes each bin with its own
 *   table.  With the `threading` feature the bins are encoded in parallel.
 *   The bins' storage is either laid out one bin after another ([`Naive`]), or
 *   with all the sparse segments first ([`SparseClustered`]).
 * * [`GarbledBloomFilter`] gives each key 40 slots and inserts keys one at a
 *   time, with no linear algebra.  It's simple but much larger.
 *
 * [`AnyDokvs`] wraps all of these, built from [`DokvsParams`], and
 * [`encode_with_retries`] picks fresh hash keys until an encoding succeeds.
 *
 * # Failure
 *
 * Encoding is probabilistic.  With the default sizes it fails only with
 * negligible probability, returning an error that reports
 * [`Error::is_retryable`].  The remedy is new hash keys.  Encoding the same
 * key twice will fail on every try.
 *
 * # Serialization
 *
 * [`DokvsParams`] implements [`Encode`](bincode::enc::Encode) and
 * [`Decode`](bincode::de::Decode), so that the decoding side can rebuild the
 * store.  Please use [`STD_BINCODE_CONFIG`] when calling `bincode`'s
 * serializers.  The storage itself is a `Vec` of module elements and is
 * serialized however the calling protocol likes.
 */

pub mod cluster;
pub mod dokvs;
pub mod error;
pub mod gbf;
pub mod gct;
pub mod hashing;
pub mod module;

mod cuckoo;
mod linalg;
mod parallel;

pub use cluster::{ClusterGct,ClusterLayout,Naive,SparseClustered};
pub use dokvs::{AnyDokvs,BuildOptions,Dokvs,DokvsParams,DokvsType,SparseDokvs,STD_BINCODE_CONFIG,encode_with_retries};
pub use error::{Error,Result};
pub use gbf::GarbledBloomFilter;
pub use gct::{GarbledCuckooTable,GctKind};
pub use hashing::HashKey;
pub use linalg::bitset::BitSet;
pub use module::{FieldModule,GroupModule,ValueModule};
