//! Permutations and the objects they act on.
use fxhash::FxBuildHasher;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Mul;

pub mod graph;
pub mod perm_set;

pub use perm_set::PermSet;

pub(crate) type FBuildHasher = FxBuildHasher;
pub(crate) type FHashMap<K, V> = HashMap<K, V, FBuildHasher>;
pub(crate) type FHashSet<K> = HashSet<K, FBuildHasher>;

/// An object that permutations act on. Points, vectors of points and task allocations
/// are permuted by mapping every point they contain.
pub trait Permutable: Clone {
    /// The image of the object under the given permutation.
    fn permuted(&self, p: &Perm) -> Self;
}

impl Permutable for usize {
    fn permuted(&self, p: &Perm) -> Self { p.apply(*self) }
}

impl<T: Permutable> Permutable for Vec<T> {
    fn permuted(&self, p: &Perm) -> Self {
        self.iter().map(|x| x.permuted(p)).collect()
    }
}

/// Permutation of the points 0..degree, densely represented by its image array.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Perm(pub Vec<usize>);

impl From<Vec<usize>> for Perm {
    fn from(images: Vec<usize>) -> Self {
        debug_assert!(images.iter().all(|&x| x < images.len()));
        debug_assert_eq!(images.iter().unique().count(), images.len());
        Self(images)
    }
}

impl Perm {
    pub fn identity(degree: usize) -> Self {
        Self((0..degree).collect())
    }

    /// Product of the given cycles, the first cycle being applied first.
    pub fn from_cycles<C: AsRef<[usize]>>(degree: usize, cycles: impl IntoIterator<Item=C>) -> Self {
        let mut out = Self::identity(degree);
        for cycle in cycles {
            let cycle = cycle.as_ref();
            let mut images = (0..degree).collect_vec();
            for (&x, &y) in cycle.iter().circular_tuple_windows() {
                assert!(x < degree && y < degree, "cycle point out of range for degree {degree}");
                images[x] = y;
            }
            out = &Perm(images) * &out;
        }
        out
    }

    pub fn transposition(degree: usize, i: usize, j: usize) -> Self {
        let mut out = Self::identity(degree);
        out.0.swap(i, j);
        out
    }

    pub fn degree(&self) -> usize { self.0.len() }

    #[inline]
    pub fn apply(&self, i: usize) -> usize { self.0[i] }

    pub fn iter(&self) -> impl ExactSizeIterator<Item=usize> + '_ {
        self.0.iter().cloned()
    }

    pub fn inverse(&self) -> Self {
        let mut out = vec![0; self.degree()];
        for (i, &x) in self.0.iter().enumerate() {
            out[x] = i;
        }
        Self(out)
    }

    pub fn is_identity(&self) -> bool {
        self.iter().enumerate().all(|(i, x)| i == x)
    }

    pub fn moved_points(&self) -> impl Iterator<Item=usize> + '_ {
        self.iter().enumerate().filter(|(i, x)| i != x).map(|(i, _)| i)
    }

    pub fn largest_moved_point(&self) -> Option<usize> {
        self.moved_points().last()
    }

    pub fn smallest_moved_point(&self) -> Option<usize> {
        self.moved_points().next()
    }

    /// Non-trivial cycles, each starting with its smallest point, ordered by that point.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.degree()];
        let mut out = vec![];
        for start in 0..self.degree() {
            if seen[start] || self.apply(start) == start {
                continue;
            }
            let mut cycle = vec![start];
            seen[start] = true;
            let mut x = self.apply(start);
            while x != start {
                seen[x] = true;
                cycle.push(x);
                x = self.apply(x);
            }
            out.push(cycle);
        }
        out
    }

    /// Same permutation on a larger set of points, fixing all new points.
    pub fn extended(&self, degree: usize) -> Self {
        assert!(degree >= self.degree());
        Self(self.iter().chain(self.degree()..degree).collect())
    }

    /// Embeds this permutation into points offset..offset + degree, fixing 0..offset.
    pub fn shifted(&self, offset: usize) -> Self {
        Self((0..offset).chain(self.iter().map(|x| x + offset)).collect())
    }

    /// Restriction to the points 0..degree, which must be mapped onto themselves.
    pub fn restricted(&self, degree: usize) -> Self {
        let images = self.0[..degree].to_vec();
        assert!(images.iter().all(|&x| x < degree), "restriction to {degree} points is not closed");
        Self(images)
    }
}

impl Mul<&Perm> for &Perm {
    type Output = Perm;

    /// Composition, applying rhs first.
    fn mul(self, rhs: &Perm) -> Perm {
        assert_eq!(self.degree(), rhs.degree());
        Perm(rhs.iter().map(|x| self.apply(x)).collect())
    }
}

impl Mul<Perm> for Perm {
    type Output = Perm;

    fn mul(self, rhs: Perm) -> Perm { &self * &rhs }
}

impl Mul<usize> for &Perm {
    type Output = usize;

    fn mul(self, rhs: usize) -> usize { self.apply(rhs) }
}

impl<P: Permutable> Mul<&P> for &Perm {
    type Output = P;

    fn mul(self, rhs: &P) -> P { rhs.permuted(self) }
}

impl Display for Perm {
    /// Cycle notation, "()" for the identity.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let cycles = self.cycles();
        if cycles.is_empty() {
            return write!(f, "()");
        }
        for cycle in cycles {
            write!(f, "({})", cycle.iter().join(" "))?;
        }
        Ok(())
    }
}
