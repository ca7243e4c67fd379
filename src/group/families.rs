//! Common permutation group families and the wreath product.
//! Orders are known in closed form, so chains are built by random Schreier-Sims stopping
//! at the known order.
use crate::group::schreier_sims::ChainOptions;
use crate::group::{factorial, PermGroup};
use crate::permutable::{Perm, PermSet};
use itertools::Itertools;
use num_bigint::BigUint;

impl PermGroup {
    fn with_known_order(degree: usize, generators: Vec<Perm>, order: BigUint) -> Self {
        Self::build(degree, PermSet::from(generators), &ChainOptions::random(Some(order)))
    }

    pub fn symmetric(degree: usize) -> Self {
        assert!(degree > 0);
        if degree == 1 {
            return Self::trivial(1);
        }
        Self::with_known_order(degree, vec![
            Perm::transposition(degree, 0, 1),
            Perm::from_cycles(degree, [(0..degree).collect_vec()]),
        ], factorial(degree))
    }

    pub fn cyclic(degree: usize) -> Self {
        assert!(degree > 0);
        if degree == 1 {
            return Self::trivial(1);
        }
        Self::with_known_order(degree, vec![Perm::from_cycles(degree, [(0..degree).collect_vec()])], BigUint::from(degree))
    }

    pub fn alternating(degree: usize) -> Self {
        assert!(degree > 0);
        if degree <= 2 {
            return Self::trivial(degree);
        }
        let generators = (2..degree).map(|i| Perm::from_cycles(degree, [[0, 1, i]])).collect();
        Self::with_known_order(degree, generators, factorial(degree) / 2u32)
    }

    /// Symmetry group of the regular n-gon, of order 2n. For n = 1 and n = 2 this is the
    /// group generated by one, respectively two disjoint transpositions.
    pub fn dihedral(n: usize) -> Self {
        assert!(n > 0);
        match n {
            1 => Self::with_known_order(2, vec![Perm::transposition(2, 0, 1)], BigUint::from(2u32)),
            2 => Self::with_known_order(4, vec![Perm::transposition(4, 0, 1), Perm::transposition(4, 2, 3)], BigUint::from(4u32)),
            _ => {
                let rotation = Perm::from((0..n).map(|i| (i + 1) % n).collect_vec());
                let reflection = Perm::from((0..n).map(|i| (n - i) % n).collect_vec());
                Self::with_known_order(n, vec![rotation, reflection], BigUint::from(2 * n))
            }
        }
    }

    /// Wreath product with self acting within blocks and top permuting the blocks.
    /// A trivial factor yields the other factor unchanged.
    pub fn wreath_product(&self, top: &PermGroup) -> Self {
        if self.is_trivial() {
            return top.clone();
        }
        if top.is_trivial() {
            return self.clone();
        }

        let mut base_generators = self.generators().clone();
        let mut top_generators = top.generators().clone();
        base_generators.minimize_degree();
        top_generators.minimize_degree();
        let block = base_generators.degree();
        let blocks = top_generators.degree();
        let degree = block * blocks;

        let mut generators = vec![];
        for i in 0..blocks {
            generators.extend(base_generators.iter().map(|g| g.shifted(block * i).extended(degree)));
        }
        for g in &top_generators {
            let cycles = g.cycles();
            let lifted = (0..block).flat_map(|k| cycles.iter().
                map(move |c| c.iter().map(|x| x * block + k).collect_vec())).collect_vec();
            generators.push(Perm::from_cycles(degree, lifted));
        }

        Self::with_known_order(degree, generators, self.wreath_product_order(top))
    }

    /// |self|^(top's largest moved point + 1) * |top|
    pub fn wreath_product_order(&self, top: &PermGroup) -> BigUint {
        if self.is_trivial() {
            return top.order().clone();
        }
        if top.is_trivial() {
            return self.order().clone();
        }
        let blocks = top.largest_moved_point().expect("non-trivial group moves a point") + 1;
        self.order().pow(blocks as u32) * top.order()
    }
}
