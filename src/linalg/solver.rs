/*
 * @file solver.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Gaussian elimination over a prime field F, where the right-hand side
 * lives in an F-module.  Only add/sub/scalar_mul are ever applied to the
 * right-hand side.
 */

use crate::error::{Error,Result};
use crate::module::ValueModule;
use ark_ff::Field;
use ark_std::{Zero,One};
use rand::Rng;

/** How to assign the unknowns that the system leaves free. */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub enum SolveMode {
    /** Every free unknown gets a fresh uniformly random value */
    Full,
    /** Free unknowns are set to zero */
    Free,
}

/**
 * A linear system `lhs * x = rhs`, built up one equation at a time.
 * Coefficients are in the module's scalar field.
 */
pub struct LinearSystem<M:ValueModule> {
    pub columns: usize,
    lhs: Vec<Vec<M::Scalar>>,
    rhs: Vec<M::Elem>,
}

impl <M:ValueModule> LinearSystem<M> {
    pub fn new(columns:usize) -> Self {
        LinearSystem { columns, lhs: Vec::new(), rhs: Vec::new() }
    }

    /** Append the equation `row * x = value` */
    pub fn push_row(&mut self, row: Vec<M::Scalar>, value: M::Elem) {
        debug_assert_eq!(row.len(), self.columns);
        self.lhs.push(row);
        self.rhs.push(value);
    }

    /**
     * Solve the system, returning one value per column.
     *
     * Fails if the system is inconsistent.  Systems with more equations than
     * unknowns are rejected up front, since they are inconsistent with
     * overwhelming probability.
     */
    pub fn solve<R:Rng+?Sized>(self, module:&M, mode:SolveMode, rng:&mut R) -> Result<Vec<M::Elem>> {
        let LinearSystem { columns, mut lhs, mut rhs } = self;
        let rows = lhs.len();
        if rows > columns {
            return Err(Error::NoSolution { reason: "more equations than unknowns", rows, columns });
        }

        /* Reduce to row-reduced echelon form */
        let mut pivots = Vec::with_capacity(rows);
        let mut rank = 0;
        for col in 0..columns {
            if rank == rows { break; }
            let found = (rank..rows).find(|r| !lhs[*r][col].is_zero());
            let r = match found { Some(r) => r, None => continue };
            lhs.swap(rank, r);
            rhs.swap(rank, r);

            let inv = match lhs[rank][col].inverse() { Some(inv) => inv, None => continue };
            if !inv.is_one() {
                for x in lhs[rank][col..].iter_mut() { *x *= inv; }
                rhs[rank] = module.scalar_mul(&rhs[rank], &inv);
            }

            let (pivot_row, pivot_value) = (lhs[rank].clone(), rhs[rank].clone());
            for r2 in 0..rows {
                if r2 == rank { continue; }
                let factor = lhs[r2][col];
                if factor.is_zero() { continue; }
                for (x,p) in lhs[r2][col..].iter_mut().zip(&pivot_row[col..]) {
                    *x -= factor * p;
                }
                rhs[r2] = module.sub(&rhs[r2], &module.scalar_mul(&pivot_value, &factor));
            }
            pivots.push(col);
            rank += 1;
        }
        tracing::trace!(rows, columns, rank, "eliminated core system");

        /* Rows past the rank are all zero on the left */
        if rhs[rank..].iter().any(|y| !module.is_zero(y)) {
            return Err(Error::NoSolution { reason: "inconsistent system", rows, columns });
        }

        /* Assign the free unknowns, then back out the pivots */
        let mut is_pivot = vec![false; columns];
        for p in &pivots { is_pivot[*p] = true; }
        let mut solution: Vec<M::Elem> = (0..columns).map(|c| {
            if is_pivot[c] || mode == SolveMode::Free { module.zero() }
            else { module.random(rng) }
        }).collect();

        for (r,&p) in pivots.iter().enumerate() {
            let mut value = rhs[r].clone();
            if mode == SolveMode::Full {
                for c in (p+1)..columns {
                    if is_pivot[c] || lhs[r][c].is_zero() { continue; }
                    value = module.sub(&value, &module.scalar_mul(&solution[c], &lhs[r][c]));
                }
            }
            solution[p] = value;
        }
        Ok(solution)
    }
}

/**************************************************************************
 * Tests
 **************************************************************************/

#[cfg(test)]
mod tests {
    use crate::linalg::solver::{LinearSystem,SolveMode};
    use crate::module::{FieldModule,GroupModule,ValueModule};
    use crate::error::Error;
    use ark_bls12_381::{Fr,G1Projective};
    use ark_std::{One,Zero};
    use rand::{Rng,thread_rng};

    /** Random 0/1 matrix */
    fn random_rows(rows:usize, cols:usize) -> Vec<Vec<Fr>> {
        (0..rows).map(|_| (0..cols).map(|_|
            if thread_rng().gen::<bool>() { Fr::one() } else { Fr::zero() }
        ).collect()).collect()
    }

    fn apply<M:ValueModule>(module:&M, row:&[M::Scalar], x:&[M::Elem]) -> M::Elem {
        let mut ret = module.zero();
        for (a,v) in row.iter().zip(x) {
            ret = module.add(&ret, &module.scalar_mul(v,a));
        }
        ret
    }

    fn check_solve<M:ValueModule<Scalar=Fr>>(module:&M) {
        let mut rng = thread_rng();
        for rows in 0..12usize {
            for cols in rows..rows+6 {
                let lhs = random_rows(rows, cols);
                let values : Vec<M::Elem> = (0..rows).map(|_| module.random(&mut rng)).collect();
                for mode in [SolveMode::Full, SolveMode::Free] {
                    let mut system = LinearSystem::<M>::new(cols);
                    for (row,v) in lhs.iter().zip(&values) { system.push_row(row.clone(), v.clone()); }
                    match system.solve(module, mode, &mut rng) {
                        Ok(x) => {
                            assert_eq!(x.len(), cols);
                            for (row,v) in lhs.iter().zip(&values) {
                                assert_eq!(apply(module,row,&x), *v);
                            }
                        },
                        Err(Error::NoSolution{..}) => {
                            /* Random 0/1 matrices are sometimes singular */
                        },
                        Err(e) => panic!("unexpected error {}", e)
                    }
                }
            }
        }
    }

    #[test]
    fn test_solve_field() {
        check_solve(&FieldModule::<Fr>::new());
    }

    #[test]
    fn test_solve_group() {
        check_solve(&GroupModule::<G1Projective>::new());
    }

    /** Rank-deficient but consistent systems still solve */
    #[test]
    fn test_dependent_rows() {
        let module = FieldModule::<Fr>::new();
        let mut rng = thread_rng();
        let one = Fr::one();
        let zero = Fr::zero();
        let a = Fr::from(5u64);
        let b = Fr::from(7u64);
        let mut system = LinearSystem::<FieldModule<Fr>>::new(3);
        system.push_row(vec![one, one, zero], a);
        system.push_row(vec![zero, one, one], b);
        system.push_row(vec![one, zero, -one], a-b);
        let x = system.solve(&module, SolveMode::Full, &mut rng).unwrap();
        assert_eq!(x[0]+x[1], a);
        assert_eq!(x[1]+x[2], b);
    }

    #[test]
    fn test_inconsistent() {
        let module = FieldModule::<Fr>::new();
        let mut rng = thread_rng();
        let one = Fr::one();
        let mut system = LinearSystem::<FieldModule<Fr>>::new(2);
        system.push_row(vec![one, one], Fr::from(1u64));
        system.push_row(vec![one, one], Fr::from(2u64));
        assert!(matches!(system.solve(&module, SolveMode::Free, &mut rng),
            Err(Error::NoSolution{ reason: "inconsistent system", .. })));

        let mut system = LinearSystem::<FieldModule<Fr>>::new(1);
        system.push_row(vec![one], Fr::from(1u64));
        system.push_row(vec![one], Fr::from(1u64));
        assert!(matches!(system.solve(&module, SolveMode::Free, &mut rng),
            Err(Error::NoSolution{ reason: "more equations than unknowns", .. })));
    }

    /** Free mode leaves every non-pivot unknown at zero */
    #[test]
    fn test_free_mode_zeros() {
        let module = FieldModule::<Fr>::new();
        let mut rng = thread_rng();
        let one = Fr::one();
        let zero = Fr::zero();
        let mut system = LinearSystem::<FieldModule<Fr>>::new(4);
        system.push_row(vec![one, zero, one, one], Fr::from(9u64));
        let x = system.solve(&module, SolveMode::Free, &mut rng).unwrap();
        assert_eq!(x, vec![Fr::from(9u64), zero, zero, zero]);
    }
}
