//! Orbits of points and of permutable objects under a set of generators.
use crate::permutable::{FHashSet, Perm, Permutable};
use std::collections::VecDeque;
use std::hash::Hash;

/// Orbit of a point under the group generated by the given permutations, in discovery order.
pub fn orbit(x: usize, generators: &[Perm]) -> Vec<usize> {
    traverse(x, generators, |_, _, _| {})
}

/// Breadth-first closure of x under the generators. Calls visit(new, from, generator_index)
/// for every newly reached point, where new = generators[generator_index] * from.
pub fn traverse(x: usize, generators: &[Perm], mut visit: impl FnMut(usize, usize, usize)) -> Vec<usize> {
    let mut out = vec![x];
    let Some(first) = generators.first() else { return out; };
    let mut in_orbit = vec![false; first.degree()];
    in_orbit[x] = true;

    let mut i = 0;
    while let Some(&y) = out.get(i) {
        for (g_index, g) in generators.iter().enumerate() {
            let z = g.apply(y);
            if !in_orbit[z] {
                in_orbit[z] = true;
                out.push(z);
                visit(z, y, g_index);
            }
        }
        i += 1;
    }
    out
}

/// Partition of all points 0..degree into orbits, ordered by their smallest point.
pub fn orbit_partition(degree: usize, generators: &[Perm]) -> Vec<Vec<usize>> {
    let mut orbit_ids: Vec<Option<usize>> = vec![None; degree];
    let mut out: Vec<Vec<usize>> = vec![];
    let mut assigned = 0;
    for start in 0..degree {
        if assigned == degree {
            break;
        }
        if orbit_ids[start].is_some() {
            continue;
        }
        let id = out.len();
        let orbit = orbit(start, generators);
        for &y in &orbit {
            orbit_ids[y] = Some(id);
        }
        assigned += orbit.len();
        out.push(orbit);
    }
    out
}

/// Lazy orbit of an arbitrary object, yielding the start object first and then every newly
/// discovered image in breadth-first order. Allows consumers to stop early.
pub struct ObjectOrbit<'a, T, F> {
    generators: &'a [Perm],
    action: F,
    seen: FHashSet<T>,
    queue: VecDeque<T>,
}

impl<'a, T: Clone + Eq + Hash, F: Fn(&T, &Perm) -> T> ObjectOrbit<'a, T, F> {
    pub fn new(x: T, generators: &'a [Perm], action: F) -> Self {
        let mut seen = FHashSet::default();
        seen.insert(x.clone());
        Self { generators, action, seen, queue: VecDeque::from([x]) }
    }

    pub fn num_seen(&self) -> usize { self.seen.len() }
}

impl<'a, T: Clone + Eq + Hash, F: Fn(&T, &Perm) -> T> Iterator for ObjectOrbit<'a, T, F> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let current = self.queue.pop_front()?;
        for g in self.generators {
            let next = (self.action)(&current, g);
            if self.seen.insert(next.clone()) {
                self.queue.push_back(next);
            }
        }
        Some(current)
    }
}

/// Orbit of a permutable object under the natural action.
pub fn object_orbit<T: Permutable + Eq + Hash>(x: T, generators: &[Perm]) -> ObjectOrbit<'_, T, fn(&T, &Perm) -> T> {
    ObjectOrbit::new(x, generators, T::permuted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn orbit_without_generators() {
        assert_eq!(orbit(2, &[]), vec![2]);
        assert_eq!(orbit(2, &[Perm::identity(4)]), vec![2]);
    }

    #[test]
    fn orbit_of_point() {
        let generators = [Perm::from_cycles(6, [[0, 1, 2]]), Perm::from_cycles(6, [[2, 3]])];
        let o = orbit(0, &generators);
        assert_eq!(o[0], 0);
        assert_eq!(o.into_iter().sorted().collect_vec(), vec![0, 1, 2, 3]);
        assert_eq!(orbit(4, &generators), vec![4]);
    }

    #[test]
    fn traverse_records_schreier_edges() {
        let generators = [Perm::from_cycles(5, [[0, 1, 2, 3]])];
        let mut edges = vec![];
        let o = traverse(0, &generators, |new, from, g| edges.push((new, from, g)));
        assert_eq!(o, vec![0, 1, 2, 3]);
        assert_eq!(edges, vec![(1, 0, 0), (2, 1, 0), (3, 2, 0)]);
    }

    #[test]
    fn partition() {
        let generators = [Perm::from_cycles(7, [[0, 4]]), Perm::from_cycles(7, [[1, 5, 6]])];
        let p = orbit_partition(7, &generators);
        let sorted = p.iter().map(|o| o.iter().cloned().sorted().collect_vec()).collect_vec();
        assert_eq!(sorted, vec![vec![0, 4], vec![1, 5, 6], vec![2], vec![3]]);
        assert_eq!(orbit_partition(3, &[]), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn orbit_of_vectors() {
        let generators = [Perm::from_cycles(3, [[0, 1, 2]])];
        let o = object_orbit(vec![2, 0, 1], &generators).collect_vec();
        assert_eq!(o.len(), 3);
        assert_eq!(o[0], vec![2, 0, 1]);
        assert!(o.contains(&vec![0, 1, 2]));
        assert!(o.contains(&vec![1, 2, 0]));
    }
}
