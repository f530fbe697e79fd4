/*
 * @file module.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Value modules: the algebraic domain that storage entries live in.
 */

use ark_ec::PrimeGroup;
use ark_ff::PrimeField;
use core::fmt::Debug;
use core::marker::PhantomData;
use rand::Rng;

/**
 * A module over a prime field.
 *
 * Storage entries are elements of the module.  Encoding needs to add,
 * subtract and sample them, and the core solver additionally scales them
 * by field elements.  Two elements are never multiplied together, so a
 * group acted on by its scalar field works just as well as the field itself.
 */
pub trait ValueModule: Clone + Send + Sync {
    /** The coefficient field. */
    type Scalar: PrimeField;

    /** Elements stored in the table. */
    type Elem: Clone + PartialEq + Debug + Send + Sync;

    fn zero(&self) -> Self::Elem;
    fn is_zero(&self, a: &Self::Elem) -> bool;
    fn add(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn sub(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn neg(&self, a: &Self::Elem) -> Self::Elem;

    /** Multiply an element by a coefficient */
    fn scalar_mul(&self, a: &Self::Elem, s: &Self::Scalar) -> Self::Elem;

    /** A uniformly random element */
    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Elem;

    /** A uniformly random nonzero element */
    fn random_nonzero<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Elem {
        loop {
            let x = self.random(rng);
            if !self.is_zero(&x) { return x; }
        }
    }

    /** Sum up a sequence of elements */
    fn sum<'a, I>(&self, items: I) -> Self::Elem
    where I: IntoIterator<Item = &'a Self::Elem>, Self::Elem: 'a {
        items.into_iter().fold(self.zero(), |acc, x| self.add(&acc, x))
    }
}

/** A prime field, as a module over itself. */
#[derive(Debug)]
pub struct FieldModule<F> {
    _phantom: PhantomData<F>,
}

impl <F> FieldModule<F> {
    pub fn new() -> Self { FieldModule { _phantom: PhantomData } }
}

impl <F> Default for FieldModule<F> {
    fn default() -> Self { Self::new() }
}

impl <F> Clone for FieldModule<F> {
    fn clone(&self) -> Self { Self::new() }
}

impl <F: PrimeField> ValueModule for FieldModule<F> {
    type Scalar = F;
    type Elem = F;

    fn zero(&self) -> F { F::zero() }
    fn is_zero(&self, a: &F) -> bool { a.is_zero() }
    fn add(&self, a: &F, b: &F) -> F { *a + b }
    fn sub(&self, a: &F, b: &F) -> F { *a - b }
    fn neg(&self, a: &F) -> F { -*a }
    fn scalar_mul(&self, a: &F, s: &F) -> F { *a * s }
    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> F { F::rand(rng) }
}

/**
 * A group of prime order, e.g. an elliptic curve, as a module over its
 * scalar field.
 */
#[derive(Debug)]
pub struct GroupModule<G> {
    _phantom: PhantomData<G>,
}

impl <G> GroupModule<G> {
    pub fn new() -> Self { GroupModule { _phantom: PhantomData } }
}

impl <G> Default for GroupModule<G> {
    fn default() -> Self { Self::new() }
}

impl <G> Clone for GroupModule<G> {
    fn clone(&self) -> Self { Self::new() }
}

impl <G: PrimeGroup> ValueModule for GroupModule<G> {
    type Scalar = G::ScalarField;
    type Elem = G;

    fn zero(&self) -> G { G::zero() }
    fn is_zero(&self, a: &G) -> bool { a.is_zero() }
    fn add(&self, a: &G, b: &G) -> G { *a + b }
    fn sub(&self, a: &G, b: &G) -> G { *a - b }
    fn neg(&self, a: &G) -> G { -*a }
    fn scalar_mul(&self, a: &G, s: &G::ScalarField) -> G { *a * s }
    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> G { G::rand(rng) }
}

#[cfg(test)]
mod tests {
    use crate::module::{FieldModule,GroupModule,ValueModule};
    use ark_bls12_381::{Fr,G1Projective};
    use ark_ec::PrimeGroup;
    use ark_std::{UniformRand,One};
    use rand::thread_rng;

    /** add/sub/neg are consistent, and scalar_mul is linear */
    fn check_module<M: ValueModule>(module: &M) {
        let mut rng = thread_rng();
        for _ in 0..20 {
            let a = module.random(&mut rng);
            let b = module.random_nonzero(&mut rng);
            assert!(!module.is_zero(&b));
            let s = M::Scalar::rand(&mut rng);
            let t = M::Scalar::rand(&mut rng);

            assert_eq!(module.sub(&module.add(&a,&b), &b), a);
            assert!(module.is_zero(&module.add(&a, &module.neg(&a))));
            assert_eq!(module.add(&a, &module.zero()), a);
            assert_eq!(module.sum([&a, &b, &a]), module.add(&module.add(&a,&a),&b));

            let lhs = module.scalar_mul(&module.add(&a,&b), &s);
            let rhs = module.add(&module.scalar_mul(&a,&s), &module.scalar_mul(&b,&s));
            assert_eq!(lhs, rhs);

            let lhs = module.scalar_mul(&a, &(s+t));
            let rhs = module.add(&module.scalar_mul(&a,&s), &module.scalar_mul(&a,&t));
            assert_eq!(lhs, rhs);
            assert_eq!(module.scalar_mul(&a, &M::Scalar::one()), a);
        }
    }

    #[test]
    fn test_field_module() {
        check_module(&FieldModule::<Fr>::new());
    }

    #[test]
    fn test_group_module() {
        let module = GroupModule::<G1Projective>::new();
        check_module(&module);
        let g = G1Projective::generator();
        assert_eq!(module.scalar_mul(&g, &Fr::from(3u64)), g+g+g);
    }
}
