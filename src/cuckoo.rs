/*
 * @file cuckoo.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Cuckoo hypergraphs and 2-core finding by peeling.
 */

use crate::hashing::KeyRows;
use std::collections::HashMap;

/**
 * How to strip the cuckoo graph down to its core.
 *
 * Both strategies produce a correct encoding; they differ in how much
 * ends up in the linear system.
 */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub enum PeelStrategy {
    /** Only remove edges that have a degree-1 vertex. */
    Singleton,

    /**
     * Two-position graphs only: additionally collapse parallel edges
     * (2-cycles) before peeling.  Each duplicate of a position pair becomes a
     * dense-only equation relative to the first key with that pair, and the
     * graph keeps only that first key.
     */
    TwoCore,
}

/** A key removed by peeling, together with the vertex that freed it. */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub struct PeeledEdge {
    pub key: usize,
    /** Degree-1 vertex at removal time: no later edge touches it */
    pub vertex: usize,
}

/** Result of peeling a cuckoo graph. */
#[derive(Clone,Debug,Default)]
pub struct Peeling {
    /** Peeled keys, in removal order.  Replayed from the top. */
    pub stack: Vec<PeeledEdge>,

    /** Keys whose edges survive peeling */
    pub core_keys: Vec<usize>,

    /** Vertices touched by the core keys, sorted */
    pub core_vertices: Vec<usize>,

    /** (duplicate, representative) pairs of parallel edges */
    pub parallel: Vec<(usize,usize)>,
}

/** Hypergraph on `0..vertices` with one edge per key. */
pub struct CuckooGraph<'a> {
    rows: &'a KeyRows,
    incident: Vec<Vec<usize>>,
    degree: Vec<u32>,
    removed: Vec<bool>,
}

impl <'a> CuckooGraph<'a> {
    /** Insert an edge for each key not in `skip` */
    fn build(rows: &'a KeyRows, vertices: usize, skip: &[bool]) -> Self {
        let mut incident = vec![Vec::new(); vertices];
        let mut degree = vec![0u32; vertices];
        for key in 0..rows.len() {
            if skip[key] { continue; }
            for &v in rows.positions(key) {
                incident[v].push(key);
                degree[v] += 1;
            }
        }
        CuckooGraph { rows, incident, degree, removed: skip.to_vec() }
    }

    /** Repeatedly remove edges that have a degree-1 vertex */
    fn peel(&mut self, stack: &mut Vec<PeeledEdge>) {
        let mut queue : Vec<usize> = (0..self.degree.len())
            .filter(|v| self.degree[*v] == 1).collect();

        while let Some(v) = queue.pop() {
            if self.degree[v] != 1 { continue; }
            let key = match self.incident[v].iter().find(|e| !self.removed[**e]) {
                Some(key) => *key,
                None => continue
            };
            self.removed[key] = true;
            stack.push(PeeledEdge { key, vertex: v });
            for &u in self.rows.positions(key) {
                self.degree[u] -= 1;
                if self.degree[u] == 1 { queue.push(u); }
            }
        }
    }

    /** The edges and vertices left over */
    fn core(&self) -> (Vec<usize>, Vec<usize>) {
        let core_keys : Vec<usize> = (0..self.rows.len()).filter(|k| !self.removed[*k]).collect();
        let core_vertices = (0..self.degree.len()).filter(|v| self.degree[*v] > 0).collect();
        (core_keys, core_vertices)
    }
}

/**
 * Find the core of the cuckoo graph of `rows` over `vertices` vertices.
 */
pub fn find_core(rows: &KeyRows, vertices: usize, strategy: PeelStrategy) -> Peeling {
    let mut skip = vec![false; rows.len()];
    let mut parallel = Vec::new();

    if strategy == PeelStrategy::TwoCore {
        debug_assert_eq!(rows.sparse_num, 2);
        let mut first_with_pair = HashMap::with_capacity(rows.len());
        for key in 0..rows.len() {
            let p = rows.positions(key);
            let pair = if p[0] < p[1] { (p[0],p[1]) } else { (p[1],p[0]) };
            match first_with_pair.get(&pair) {
                Some(&rep) => {
                    skip[key] = true;
                    parallel.push((key,rep));
                },
                None => { first_with_pair.insert(pair, key); }
            }
        }
    }

    let mut graph = CuckooGraph::build(rows, vertices, &skip);
    let mut stack = Vec::with_capacity(rows.len());
    graph.peel(&mut stack);
    let (core_keys, core_vertices) = graph.core();

    tracing::debug!(keys = rows.len(), peeled = stack.len(), core_keys = core_keys.len(),
        core_vertices = core_vertices.len(), parallel = parallel.len(), "peeled cuckoo graph");

    Peeling { stack, core_keys, core_vertices, parallel }
}
