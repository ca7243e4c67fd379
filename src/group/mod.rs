//! Permutation groups represented by stabilizer chains.
use crate::error::{Error, Result};
use crate::group::chain::{Elements, StabilizerChain};
use crate::group::schreier_sims::ChainOptions;
use crate::permutable::{Perm, PermSet};
use itertools::Itertools;
use num_bigint::BigUint;
use num_traits::One;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod chain;
pub mod families;
pub mod orbit;
pub mod schreier_sims;

/// Permutation group on the points 0..degree. Immutable once constructed; the order is
/// derived from the stabilizer chain once.
#[derive(Clone, Debug)]
pub struct PermGroup {
    degree: usize,
    generators: PermSet,
    chain: StabilizerChain,
    order: BigUint,
}

impl PermGroup {
    /// Group generated by the given permutations, with a deterministically verified chain.
    pub fn new(degree: usize, generators: impl Into<PermSet>) -> Result<Self> {
        Self::with_options(degree, generators, &ChainOptions::default())
    }

    pub fn with_options(degree: usize, generators: impl Into<PermSet>, options: &ChainOptions) -> Result<Self> {
        if degree == 0 {
            return Err(Error::ZeroDegree);
        }
        let generators = generators.into();
        if let Some(g) = generators.iter().find(|g| g.degree() != degree) {
            return Err(Error::DegreeMismatch { expected: degree, found: g.degree() });
        }
        Ok(Self::build(degree, generators, options))
    }

    pub(crate) fn build(degree: usize, generators: PermSet, options: &ChainOptions) -> Self {
        let generators = generators.without_identities();
        let chain = StabilizerChain::new(degree, &generators, options);
        let order = chain.order();
        Self { degree, generators, chain, order }
    }

    pub fn trivial(degree: usize) -> Self {
        assert!(degree > 0);
        Self { degree, generators: PermSet::new(), chain: StabilizerChain::trivial(degree), order: BigUint::one() }
    }

    pub fn degree(&self) -> usize { self.degree }

    pub fn order(&self) -> &BigUint { &self.order }

    /// Non-identity generators the group was constructed from.
    pub fn generators(&self) -> &PermSet { &self.generators }

    pub fn chain(&self) -> &StabilizerChain { &self.chain }

    pub fn contains(&self, p: &Perm) -> bool {
        assert_eq!(p.degree(), self.degree, "element must have the same degree as the group");
        self.chain.strips_completely(p)
    }

    pub fn random_element<R: Rng + ?Sized>(&self, rng: &mut R) -> Perm {
        self.chain.random_element(rng)
    }

    /// Uniformly random element for the given seed.
    pub fn sample(&self, seed: u64) -> Perm {
        self.random_element(&mut Pcg64Mcg::seed_from_u64(seed))
    }

    /// Lazily iterates over all group elements, each exactly once.
    pub fn iter(&self) -> Elements {
        self.chain.elements()
    }

    pub fn is_trivial(&self) -> bool { self.order.is_one() }

    pub fn orbit(&self, x: usize) -> Vec<usize> {
        orbit::orbit(x, &self.generators)
    }

    pub fn orbits(&self) -> Vec<Vec<usize>> {
        orbit::orbit_partition(self.degree, &self.generators)
    }

    pub fn is_transitive(&self) -> bool {
        orbit::orbit(0, &self.generators.with_inverses()).len() == self.degree
    }

    pub fn is_symmetric(&self) -> bool {
        self.degree == 1 || self.order == factorial(self.degree)
    }

    pub fn is_alternating(&self) -> bool {
        match self.degree {
            1 => false,
            2 => self.is_trivial(),
            n => self.order == factorial(n) / 2u32,
        }
    }

    /// Symmetric on the set of points it moves, all other points being fixed.
    pub fn is_shifted_symmetric(&self) -> bool {
        self.order == factorial(self.generators.support_len())
    }

    /// Alternating on the set of points it moves, all other points being fixed.
    pub fn is_shifted_alternating(&self) -> bool {
        let support = self.generators.support_len();
        support >= 3 && self.order == factorial(support) / 2u32
    }

    pub fn largest_moved_point(&self) -> Option<usize> {
        self.generators.largest_moved_point()
    }

    pub fn smallest_moved_point(&self) -> Option<usize> {
        self.generators.smallest_moved_point()
    }
}

pub fn factorial(n: usize) -> BigUint {
    (1..=n).map(BigUint::from).product()
}

impl PartialEq for PermGroup {
    /// Equal orders and every generator of the other group being a member of this one.
    fn eq(&self, other: &Self) -> bool {
        assert_eq!(self.degree, other.degree, "comparing permutation groups of different degree");
        self.order == other.order && other.generators.iter().all(|g| self.contains(g))
    }
}

impl Eq for PermGroup {}

impl<'a> IntoIterator for &'a PermGroup {
    type Item = Perm;
    type IntoIter = Elements;
    fn into_iter(self) -> Elements { self.iter() }
}

impl Display for PermGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "degree {}, order {}: [{}]", self.degree, self.order, self.generators.iter().join(", "))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::permutable::{FHashSet, Permutable};
    use rand::seq::SliceRandom;
    use std::collections::VecDeque;

    /// All elements of the group generated by the given permutations, by breadth-first closure.
    pub fn brute_force_closure(generators: &PermSet, degree: usize) -> FHashSet<Perm> {
        let identity = Perm::identity(degree);
        let mut seen = FHashSet::default();
        seen.insert(identity.clone());
        let mut queue = VecDeque::from([identity]);
        while let Some(p) = queue.pop_front() {
            for g in generators {
                let q = g * &p;
                if seen.insert(q.clone()) {
                    queue.push_back(q);
                }
            }
        }
        seen
    }

    /// Generating sets mixing full random permutations with short random cycles,
    /// so that small subgroups show up as well as (almost) symmetric ones.
    pub fn random_generators(degree: usize, count: usize, seed: u64) -> PermSet {
        let rng = &mut Pcg64Mcg::seed_from_u64(seed);
        let mut points = (0..degree).collect_vec();
        (0..count).map(|_| {
            points.shuffle(rng);
            if rng.gen_bool(0.5) {
                Perm::from(points.clone())
            } else {
                let len = rng.gen_range(2..=3).min(degree);
                Perm::from_cycles(degree, [&points[..len]])
            }
        }).collect()
    }

    fn symmetric4() -> PermGroup {
        PermGroup::new(4, vec![Perm::from_cycles(4, [[0, 1]]), Perm::from_cycles(4, [[0, 1, 2, 3]])]).unwrap()
    }

    #[test]
    fn symmetric4_scenario() {
        let g = symmetric4();
        assert_eq!(g.order(), &BigUint::from(24u32));
        assert!(g.contains(&Perm::identity(4)));
        let elements = g.iter().collect_vec();
        assert_eq!(elements.len(), 24);
        assert_eq!(elements.iter().unique().count(), 24);
        assert!(elements.iter().all(|p| p.degree() == 4 && g.contains(p)));
        assert!(g.is_symmetric());
        assert!(!g.is_alternating());
        assert!(g.is_transitive());
    }

    #[test]
    fn invalid_construction() {
        assert_eq!(PermGroup::new(0, PermSet::new()).unwrap_err(), Error::ZeroDegree);
        assert_eq!(PermGroup::new(3, vec![Perm::identity(4)]).unwrap_err(),
                   Error::DegreeMismatch { expected: 3, found: 4 });
    }

    #[test]
    fn trivial_group() {
        let g = PermGroup::new(3, vec![Perm::identity(3)]).unwrap();
        assert!(g.is_trivial());
        assert!(g.generators().is_empty());
        assert_eq!(g.iter().collect_vec(), vec![Perm::identity(3)]);
        assert_eq!(g.sample(0), Perm::identity(3));
        assert!(!g.is_transitive());
        assert!(g.is_shifted_symmetric());
        assert_eq!(g, PermGroup::trivial(3));
        assert!(PermGroup::trivial(1).is_transitive());
    }

    #[test]
    #[should_panic]
    fn contains_rejects_other_degree() {
        symmetric4().contains(&Perm::identity(5));
    }

    #[test]
    fn membership_matches_brute_force_closure() {
        for degree in 1..=7 {
            let all = (0..degree).permutations(degree).map(Perm::from).collect_vec();
            for seed in 0..4 {
                let generators = random_generators(degree, 2, seed * 7 + degree as u64);
                let closure = brute_force_closure(&generators, degree);
                let g = PermGroup::new(degree, generators.clone()).unwrap();
                assert_eq!(g.order(), &BigUint::from(closure.len()));
                assert!(generators.iter().all(|p| g.contains(p)));
                for p in &all {
                    assert_eq!(g.contains(p), closure.contains(p), "degree {degree}, seed {seed}, {p}");
                }
            }
        }
    }

    #[test]
    fn iteration_yields_every_element_once() {
        for seed in 0..10 {
            let generators = random_generators(6, 2, seed);
            let closure = brute_force_closure(&generators, 6);
            let g = PermGroup::new(6, generators).unwrap();
            let elements: FHashSet<_> = g.iter().collect();
            assert_eq!(elements.len(), g.iter().count());
            assert_eq!(elements, closure);
        }
    }

    #[test]
    fn iteration_can_stop_early() {
        let g = PermGroup::symmetric(12);
        assert_eq!(g.iter().take(5).count(), 5);
    }

    #[test]
    fn random_elements_are_uniform() {
        let g = symmetric4();
        let elements = g.iter().collect_vec();
        let samples_per_element = 1000;
        let rng = &mut Pcg64Mcg::seed_from_u64(42);
        let mut counts = vec![0usize; elements.len()];
        for _ in 0..samples_per_element * elements.len() {
            let p = g.random_element(rng);
            counts[elements.iter().position(|e| e == &p).unwrap()] += 1;
        }
        let expected = samples_per_element as f64;
        let chi_squared: f64 = counts.iter().map(|&c| (c as f64 - expected).powi(2) / expected).sum();
        // 23 degrees of freedom, p = 0.0001:
        assert!(chi_squared < 55., "chi squared {chi_squared} too large");
    }

    #[test]
    fn equality() {
        let a = symmetric4();
        let b = PermGroup::new(4, vec![
            Perm::from_cycles(4, [[0, 1]]), Perm::from_cycles(4, [[1, 2]]), Perm::from_cycles(4, [[2, 3]])]).unwrap();
        assert_eq!(a, b);
        let c = PermGroup::new(4, vec![Perm::from_cycles(4, [[0, 1, 2, 3]])]).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn shifted_predicates() {
        let sym = PermGroup::new(6, vec![Perm::from_cycles(6, [[1, 3]]), Perm::from_cycles(6, [[1, 3, 5]])]).unwrap();
        assert!(!sym.is_symmetric());
        assert!(sym.is_shifted_symmetric());
        assert!(!sym.is_transitive());
        assert_eq!(sym.largest_moved_point(), Some(5));
        assert_eq!(sym.smallest_moved_point(), Some(1));

        let alt = PermGroup::new(7, vec![Perm::from_cycles(7, [[2, 4, 6]]), Perm::from_cycles(7, [[4, 6, 5]])]).unwrap();
        assert!(alt.is_shifted_alternating());
        assert!(!alt.is_shifted_symmetric());
        assert!(!alt.is_alternating());
    }

    #[test]
    fn orbits() {
        let g = PermGroup::new(5, vec![Perm::from_cycles(5, [[0, 3]])]).unwrap();
        assert_eq!(g.orbits().len(), 4);
        assert_eq!(g.orbit(3).into_iter().sorted().collect_vec(), vec![0, 3]);
    }

    #[test]
    fn display() {
        let g = PermGroup::new(3, vec![Perm::from_cycles(3, [[0, 1, 2]])]).unwrap();
        assert_eq!(g.to_string(), "degree 3, order 3: [(0 1 2)]");
    }

    #[test]
    fn acts_on_points() {
        let g = symmetric4();
        let p = g.sample(3);
        assert_eq!(2usize.permuted(&p), p.apply(2));
    }
}
