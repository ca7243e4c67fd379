//! Schreier-Sims construction of stabilizer chains, deterministic and randomized.
use crate::group::chain::StabilizerChain;
use crate::permutable::{Perm, PermSet};
use itertools::Itertools;
use num_bigint::BigUint;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Construction {
    /// Sifts all Schreier generators. Always yields a complete chain.
    #[default]
    Deterministic,
    /// Sifts random group elements until the known order is reached, or otherwise until
    /// enough consecutive elements sift completely, followed by deterministic verification.
    Random,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainOptions {
    pub construction: Construction,
    /// Points to use as the start of the base, in this order.
    pub base: Vec<usize>,
    /// Order of the generated group if known upfront, used to stop random construction early.
    pub known_order: Option<BigUint>,
    /// Number of consecutive completely sifting random elements after which random
    /// construction stops.
    pub random_witnesses: usize,
    pub seed: u64,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self { construction: Construction::Deterministic, base: vec![], known_order: None, random_witnesses: 32, seed: 0 }
    }
}

impl ChainOptions {
    pub fn random(known_order: Option<BigUint>) -> Self {
        Self { construction: Construction::Random, known_order, ..Self::default() }
    }
}

impl StabilizerChain {
    pub fn new(degree: usize, generators: &PermSet, options: &ChainOptions) -> Self {
        let generators = generators.clone().without_identities();
        let mut chain = Self::initial(degree, &generators, &options.base);
        if generators.is_empty() {
            return chain;
        }

        match options.construction {
            Construction::Deterministic => chain.schreier_sims(),
            Construction::Random => {
                let rng = &mut Pcg64Mcg::seed_from_u64(options.seed);
                let certain = chain.schreier_sims_random(&generators, options, rng);
                if !certain {
                    chain.schreier_sims();
                }
            }
        }

        debug!(degree, base = ?chain.base(), order = %chain.order(), "built stabilizer chain");
        chain
    }

    /// Base extended such that no generator fixes all base points, with generators
    /// distributed to the levels whose base prefix they fix.
    fn initial(degree: usize, generators: &PermSet, base_prefix: &[usize]) -> Self {
        let mut base = base_prefix.iter().cloned().unique().collect_vec();
        assert!(base.iter().all(|&b| b < degree), "base points must be smaller than the degree {degree}");
        for g in generators {
            if base.iter().all(|&b| g.apply(b) == b) {
                base.push(g.smallest_moved_point().expect("identity generators are removed"));
            }
        }

        let mut chain = Self::trivial(degree);
        for (i, &b) in base.iter().enumerate() {
            let fixing = generators.iter().
                filter(|g| base[..i].iter().all(|&c| g.apply(c) == c)).
                cloned().collect();
            chain.push_level(b, fixing);
        }
        chain
    }

    /// Completes the chain by sifting Schreier generators, deepest level first.
    /// Any non-sifting residue is added as a strong generator and processing resumes at the
    /// deepest level it was added to.
    pub(crate) fn schreier_sims(&mut self) {
        let mut i = self.levels.len();
        while i > 0 {
            let level = i - 1;
            match self.missing_generator(level) {
                Some((h, stop)) => {
                    trace!(level, stop, residue = %h, "adding strong generator");
                    self.extend(h, level + 1, stop);
                    i = stop + 1;
                }
                None => i -= 1,
            }
        }
    }

    /// First Schreier generator of the given level that does not sift through the deeper levels,
    /// with the residue and the level where sifting stopped.
    fn missing_generator(&self, level: usize) -> Option<(Perm, usize)> {
        let l = &self.levels[level];
        for &b in l.orbit() {
            let u_b = l.tree().transversal(b);
            for s in l.generators() {
                let s_u_b = s * &u_b;
                let schreier_generator = &l.tree().inverse_transversal(s.apply(b)) * &s_u_b;
                if schreier_generator.is_identity() {
                    continue;
                }
                let (h, stop) = self.sift(&schreier_generator, level + 1);
                if stop < self.levels.len() || !h.is_identity() {
                    return Some((h, stop));
                }
            }
        }
        None
    }

    /// Adds a residue to levels from..=stop, appending a new base point first if it passed
    /// every level.
    fn extend(&mut self, h: Perm, from: usize, stop: usize) {
        if stop == self.levels.len() {
            let point = h.smallest_moved_point().expect("residue must not be the identity");
            self.push_level(point, vec![]);
        }
        debug_assert!(self.levels[..stop].iter().all(|l| h.apply(l.base()) == l.base()));
        for l in from..=stop {
            self.levels[l].add_generator(h.clone());
        }
    }

    /// Returns true if the result is known to be complete, i.e. if the known order was reached.
    fn schreier_sims_random<R: Rng>(&mut self, generators: &PermSet, options: &ChainOptions, rng: &mut R) -> bool {
        let mut randomizer = ProductReplacement::new(generators, rng);
        let mut consecutive = 0;
        let max_consecutive = match options.known_order {
            Some(_) => options.random_witnesses.max(1) * 16,
            None => options.random_witnesses,
        };
        loop {
            if let Some(known_order) = &options.known_order {
                if &self.order() >= known_order {
                    return true;
                }
            }
            if consecutive >= max_consecutive {
                if options.known_order.is_some() {
                    warn!(order = %self.order(), "random schreier-sims did not reach the known order");
                }
                return false;
            }

            let g = randomizer.next(rng);
            let (h, stop) = self.sift(&g, 0);
            if stop < self.levels.len() || !h.is_identity() {
                consecutive = 0;
                self.extend(h, 1.min(stop), stop);
            } else {
                consecutive += 1;
            }
        }
    }
}

/// Product replacement with an accumulator ("rattle"), producing nearly uniformly
/// distributed random elements of the group generated by a set of permutations.
pub struct ProductReplacement {
    state: Vec<Perm>,
    accumulator: Perm,
}

impl ProductReplacement {
    const MIN_STATE: usize = 10;
    const WARMUP: usize = 50;

    pub fn new<R: Rng>(generators: &PermSet, rng: &mut R) -> Self {
        generators.assert_not_empty();
        let len = generators.len().max(Self::MIN_STATE);
        let state = generators.iter().cycle().take(len).cloned().collect();
        let mut out = Self { state, accumulator: Perm::identity(generators.degree()) };
        for _ in 0..Self::WARMUP {
            out.next(rng);
        }
        out
    }

    pub fn next<R: Rng>(&mut self, rng: &mut R) -> Perm {
        let s = rng.gen_range(0..self.state.len());
        let mut t = rng.gen_range(0..self.state.len() - 1);
        if t >= s {
            t += 1;
        }
        let factor = if rng.gen() { self.state[t].clone() } else { self.state[t].inverse() };
        self.state[s] = if rng.gen() { &self.state[s] * &factor } else { &factor * &self.state[s] };
        self.accumulator = &self.accumulator * &self.state[s];
        self.accumulator.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::tests::{brute_force_closure, random_generators};

    #[test]
    fn symmetric4() {
        let generators = PermSet::from(vec![Perm::from_cycles(4, [[0, 1]]), Perm::from_cycles(4, [[0, 1, 2, 3]])]);
        let chain = StabilizerChain::new(4, &generators, &ChainOptions::default());
        assert_eq!(chain.order(), BigUint::from(24u32));
        for g in &generators {
            assert!(chain.strips_completely(g));
        }
    }

    #[test]
    fn base_prefix_is_respected() {
        let generators = PermSet::from(vec![Perm::from_cycles(5, [[0, 1, 2, 3, 4]]), Perm::from_cycles(5, [[0, 1]])]);
        let options = ChainOptions { base: vec![4, 2], ..ChainOptions::default() };
        let chain = StabilizerChain::new(5, &generators, &options);
        assert_eq!(&chain.base()[..2], &[4, 2]);
        assert_eq!(chain.order(), BigUint::from(120u32));
    }

    #[test]
    fn order_matches_brute_force_closure() {
        for degree in 1..=6 {
            for seed in 0..8 {
                let generators = random_generators(degree, 1 + seed as usize % 3, seed);
                let closure = brute_force_closure(&generators, degree);
                let chain = StabilizerChain::new(degree, &generators, &ChainOptions::default());
                assert_eq!(chain.order(), BigUint::from(closure.len()), "degree {degree}, seed {seed}");
            }
        }
    }

    #[test]
    fn random_construction_with_known_order() {
        let generators = PermSet::from(vec![Perm::from_cycles(6, [[0, 1]]), Perm::from_cycles(6, [[0, 1, 2, 3, 4, 5]])]);
        let options = ChainOptions::random(Some(BigUint::from(720u32)));
        let chain = StabilizerChain::new(6, &generators, &options);
        assert_eq!(chain.order(), BigUint::from(720u32));
    }

    #[test]
    fn unreachable_known_order_falls_back_to_verification() {
        let generators = PermSet::from(vec![Perm::from_cycles(5, [[0, 1, 2]]), Perm::from_cycles(5, [[2, 3, 4]])]);
        let chain = StabilizerChain::new(5, &generators, &ChainOptions::random(Some(BigUint::from(120u32))));
        assert_eq!(chain.order(), BigUint::from(60u32));
        assert!(!chain.strips_completely(&Perm::from_cycles(5, [[0, 1]])));
    }

    #[test]
    fn strong_generators_fix_preceding_base_points() {
        for seed in 0..8 {
            let generators = random_generators(6, 2, seed);
            for options in [ChainOptions::default(), ChainOptions { seed, ..ChainOptions::random(None) }] {
                let chain = StabilizerChain::new(6, &generators, &options);
                let base = chain.base();
                for (i, level) in chain.levels().iter().enumerate() {
                    for g in level.generators() {
                        assert!(base[..i].iter().all(|&b| g.apply(b) == b), "seed {seed}, level {i}");
                    }
                }
            }
        }
    }

    #[test]
    fn random_construction_without_known_order_is_verified() {
        for seed in 0..5 {
            let generators = random_generators(7, 2, seed);
            let deterministic = StabilizerChain::new(7, &generators, &ChainOptions::default());
            let random = StabilizerChain::new(7, &generators, &ChainOptions { random_witnesses: 2, seed, ..ChainOptions::random(None) });
            assert_eq!(random.order(), deterministic.order());
        }
    }

    #[test]
    fn product_replacement_stays_in_group() {
        let generators = PermSet::from(vec![Perm::from_cycles(6, [[0, 1, 2]]), Perm::from_cycles(6, [[3, 4]])]);
        let chain = StabilizerChain::new(6, &generators, &ChainOptions::default());
        let rng = &mut Pcg64Mcg::seed_from_u64(0);
        let mut pr = ProductReplacement::new(&generators, rng);
        for _ in 0..100 {
            assert!(chain.strips_completely(&pr.next(rng)));
        }
    }
}
