//! Stabilizer chains, i.e. bases and strong generating sets.
//! See D. Holt et al.: Handbook of Computational Group Theory, ch. 4.
use crate::group::orbit::traverse;
use crate::permutable::{Perm, PermSet};
use num_bigint::BigUint;
use rand::Rng;

/// Schreier tree spanning the orbit of a root point. Each non-root orbit point records the
/// label (generator) that reaches it from its parent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchreierTree {
    root: usize,
    orbit: Vec<usize>,
    edges: Vec<Option<usize>>,
    labels: Vec<Perm>,
    inverse_labels: Vec<Perm>,
}

impl SchreierTree {
    pub fn new(root: usize, degree: usize, labels: &[Perm]) -> Self {
        let mut edges = vec![None; degree];
        let orbit = traverse(root, labels, |new, _, label| edges[new] = Some(label));
        Self {
            root,
            orbit,
            edges,
            labels: labels.to_vec(),
            inverse_labels: labels.iter().map(Perm::inverse).collect(),
        }
    }

    pub fn root(&self) -> usize { self.root }

    /// Orbit of the root in discovery order, starting with the root.
    pub fn orbit(&self) -> &[usize] { &self.orbit }

    pub fn contains(&self, x: usize) -> bool {
        x == self.root || self.edges[x].is_some()
    }

    /// Element mapping the root to x, composed from the labels along the path from x to the root.
    pub fn transversal(&self, mut x: usize) -> Perm {
        assert!(self.contains(x), "{x} is not in the orbit of {}", self.root);
        let mut out = Perm::identity(self.edges.len());
        while let Some(label) = self.edges[x] {
            out = &out * &self.labels[label];
            x = self.inverse_labels[label].apply(x);
        }
        out
    }

    /// Inverse of transversal(x), without inverting.
    pub fn inverse_transversal(&self, mut x: usize) -> Perm {
        assert!(self.contains(x), "{x} is not in the orbit of {}", self.root);
        let mut out = Perm::identity(self.edges.len());
        while let Some(label) = self.edges[x] {
            out = &self.inverse_labels[label] * &out;
            x = self.inverse_labels[label].apply(x);
        }
        out
    }
}

/// One level of a stabilizer chain: a base point, the strong generators fixing all previous
/// base points and the Schreier tree of the base point's orbit under them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Level {
    generators: Vec<Perm>,
    tree: SchreierTree,
}

impl Level {
    pub fn new(base: usize, degree: usize, generators: Vec<Perm>) -> Self {
        let tree = SchreierTree::new(base, degree, &generators);
        Self { generators, tree }
    }

    pub fn base(&self) -> usize { self.tree.root() }

    pub fn generators(&self) -> &[Perm] { &self.generators }

    pub fn orbit(&self) -> &[usize] { self.tree.orbit() }

    pub fn tree(&self) -> &SchreierTree { &self.tree }

    /// The generator must fix all base points of the preceding levels. It usually moves this
    /// level's base point.
    pub(crate) fn add_generator(&mut self, g: Perm) {
        self.generators.push(g);
        self.tree = SchreierTree::new(self.base(), self.tree.edges.len(), &self.generators);
    }
}

/// Stabilizer chain as an indexed sequence of levels. Level i describes the pointwise
/// stabilizer of the first i base points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StabilizerChain {
    pub(crate) degree: usize,
    pub(crate) levels: Vec<Level>,
}

impl StabilizerChain {
    /// Chain of the trivial group.
    pub fn trivial(degree: usize) -> Self {
        Self { degree, levels: vec![] }
    }

    pub fn degree(&self) -> usize { self.degree }

    pub fn levels(&self) -> &[Level] { &self.levels }

    pub fn len(&self) -> usize { self.levels.len() }

    pub fn is_empty(&self) -> bool { self.levels.is_empty() }

    pub fn base(&self) -> Vec<usize> {
        self.levels.iter().map(Level::base).collect()
    }

    pub fn orbit(&self, level: usize) -> &[usize] { self.levels[level].orbit() }

    pub fn transversal(&self, level: usize, x: usize) -> Perm {
        self.levels[level].tree.transversal(x)
    }

    /// Transversal elements of a level in orbit order, starting with the identity.
    pub fn transversals(&self, level: usize) -> Vec<Perm> {
        let tree = &self.levels[level].tree;
        tree.orbit().iter().map(|&x| tree.transversal(x)).collect()
    }

    pub fn strong_generators(&self) -> PermSet {
        self.levels.iter().flat_map(|l| l.generators.iter().cloned()).collect()
    }

    /// Group order, the product of all level orbit sizes.
    pub fn order(&self) -> BigUint {
        self.levels.iter().map(|l| BigUint::from(l.orbit().len())).product()
    }

    /// Sifts p through the levels from the given one on. Returns the residue and the level
    /// at which sifting stopped, which is self.len() if it passed every level.
    pub fn sift(&self, p: &Perm, from_level: usize) -> (Perm, usize) {
        assert_eq!(p.degree(), self.degree, "sifted permutation must match chain degree");
        let mut h = p.clone();
        for (i, level) in self.levels.iter().enumerate().skip(from_level) {
            let image = h.apply(level.base());
            if !level.tree.contains(image) {
                return (h, i);
            }
            h = &level.tree.inverse_transversal(image) * &h;
        }
        (h, self.levels.len())
    }

    /// Membership test: p is a group element iff it sifts to the identity.
    pub fn strips_completely(&self, p: &Perm) -> bool {
        let (h, level) = self.sift(p, 0);
        level == self.levels.len() && h.is_identity()
    }

    /// Uniformly random group element, one uniformly chosen transversal element per level.
    pub fn random_element<R: Rng + ?Sized>(&self, rng: &mut R) -> Perm {
        let mut out = Perm::identity(self.degree);
        for level in &self.levels {
            let orbit = level.orbit();
            let x = orbit[rng.gen_range(0..orbit.len())];
            out = &out * &level.tree.transversal(x);
        }
        out
    }

    /// All group elements, each exactly once.
    pub fn elements(&self) -> Elements {
        Elements::new(self)
    }

    pub(crate) fn push_level(&mut self, base: usize, generators: Vec<Perm>) {
        debug_assert!(!self.base().contains(&base));
        self.levels.push(Level::new(base, self.degree, generators));
    }
}

/// Odometer over the cartesian product of all level transversals. Level 0 moves fastest.
/// The element for indices (i_0, .., i_k) is u_0[i_0] * .. * u_k[i_k].
#[derive(Clone, Debug)]
pub struct Elements {
    degree: usize,
    transversals: Vec<Vec<Perm>>,
    state: Vec<usize>,
    done: bool,
}

impl Elements {
    fn new(chain: &StabilizerChain) -> Self {
        let transversals: Vec<_> = (0..chain.len()).map(|i| chain.transversals(i)).collect();
        Self { degree: chain.degree, state: vec![0; transversals.len()], transversals, done: false }
    }

    fn current(&self) -> Perm {
        self.transversals.iter().zip(&self.state).
            fold(Perm::identity(self.degree), |acc, (t, &i)| &acc * &t[i])
    }

    fn advance(&mut self) {
        for (i, t) in self.transversals.iter().enumerate() {
            self.state[i] += 1;
            if self.state[i] < t.len() {
                return;
            }
            self.state[i] = 0;
        }
        self.done = true;
    }
}

impl Iterator for Elements {
    type Item = Perm;

    fn next(&mut self) -> Option<Perm> {
        if self.done {
            return None;
        }
        let out = self.current();
        self.advance();
        Some(out)
    }
}
