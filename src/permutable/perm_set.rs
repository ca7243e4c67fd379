use crate::permutable::Perm;
use itertools::Itertools;
use std::ops::Deref;

/// Ordered set of permutations of equal degree, typically a generating set.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PermSet(Vec<Perm>);

impl Deref for PermSet {
    type Target = [Perm];
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl FromIterator<Perm> for PermSet {
    fn from_iter<T: IntoIterator<Item=Perm>>(iter: T) -> Self {
        let mut out = Self::default();
        out.extend(iter);
        out
    }
}

impl Extend<Perm> for PermSet {
    fn extend<T: IntoIterator<Item=Perm>>(&mut self, iter: T) {
        for p in iter {
            self.insert(p);
        }
    }
}

impl From<Vec<Perm>> for PermSet {
    fn from(perms: Vec<Perm>) -> Self { perms.into_iter().collect() }
}

impl IntoIterator for PermSet {
    type Item = Perm;
    type IntoIter = std::vec::IntoIter<Perm>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a PermSet {
    type Item = &'a Perm;
    type IntoIter = std::slice::Iter<'a, Perm>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl PermSet {
    pub fn new() -> Self { Self::default() }

    /// Degree shared by all elements. Panics on an empty set.
    pub fn degree(&self) -> usize {
        self.assert_not_empty();
        self.0[0].degree()
    }

    pub fn assert_not_empty(&self) {
        assert!(!self.is_empty(), "permutation set must not be empty");
    }

    /// Returns true if the permutation was inserted, false if it was already present.
    pub fn insert(&mut self, p: Perm) -> bool {
        if let Some(first) = self.0.first() {
            assert_eq!(first.degree(), p.degree(), "permutations in a set must have equal degree");
        }
        if self.0.contains(&p) {
            return false;
        }
        self.0.push(p);
        true
    }

    pub fn union(mut self, other: PermSet) -> Self {
        self.extend(other);
        self
    }

    /// Set closed under inversion, each inverse following its permutation.
    pub fn with_inverses(&self) -> Self {
        self.iter().flat_map(|p| [p.clone(), p.inverse()]).collect()
    }

    pub fn without_identities(self) -> Self {
        Self(self.0.into_iter().filter(|p| !p.is_identity()).collect())
    }

    /// True if every element is the identity, including for an empty set.
    pub fn is_trivial(&self) -> bool {
        self.iter().all(Perm::is_identity)
    }

    pub fn largest_moved_point(&self) -> Option<usize> {
        self.iter().filter_map(Perm::largest_moved_point).max()
    }

    pub fn smallest_moved_point(&self) -> Option<usize> {
        self.iter().filter_map(Perm::smallest_moved_point).min()
    }

    /// Number of points moved by at least one element.
    pub fn support_len(&self) -> usize {
        self.iter().flat_map(Perm::moved_points).unique().count()
    }

    /// Drops fixed trailing points so the degree is one past the largest moved point.
    pub fn minimize_degree(&mut self) {
        let degree = self.largest_moved_point().map_or(1, |x| x + 1);
        self.0 = self.0.iter().map(|p| p.restricted(degree)).unique().collect();
    }

    pub fn extended(&self, degree: usize) -> Self {
        Self(self.iter().map(|p| p.extended(degree)).collect())
    }

    pub fn shifted(&self, offset: usize) -> Self {
        Self(self.iter().map(|p| p.shifted(offset)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_skips_duplicates() {
        let mut set = PermSet::new();
        assert!(set.insert(Perm::from(vec![1, 0, 2])));
        assert!(!set.insert(Perm::from(vec![1, 0, 2])));
        assert!(set.insert(Perm::identity(3)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.degree(), 3);
        assert!(!set.is_trivial());
        assert_eq!(set.clone().without_identities().len(), 1);
    }

    #[test]
    #[should_panic]
    fn insert_rejects_other_degree() {
        let mut set = PermSet::from(vec![Perm::identity(3)]);
        set.insert(Perm::identity(4));
    }

    #[test]
    fn with_inverses() {
        let set = PermSet::from(vec![Perm::from_cycles(4, [[0, 1, 2]]), Perm::from_cycles(4, [[0, 1]])]);
        let closed = set.with_inverses();
        assert_eq!(closed.len(), 3);
        for p in closed.iter() {
            assert!(closed.contains(&p.inverse()));
        }
    }

    #[test]
    fn minimize_degree() {
        let mut set = PermSet::from(vec![Perm::from_cycles(7, [[1, 3]]), Perm::from_cycles(7, [[0, 2]])]);
        set.minimize_degree();
        assert_eq!(set.degree(), 4);
        assert_eq!(set.largest_moved_point(), Some(3));
        assert_eq!(set.smallest_moved_point(), Some(0));
        assert_eq!(set.support_len(), 4);

        let mut trivial = PermSet::from(vec![Perm::identity(5)]);
        trivial.minimize_degree();
        assert_eq!(trivial.degree(), 1);
    }
}
