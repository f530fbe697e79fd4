/**
 * @file mod.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Linear algebra for the 2-core: bit sets for the dense rows, and
 * Gaussian elimination over a prime field with right-hand sides in
 * any module over that field.
 */
pub mod bitset;
pub mod solver;
