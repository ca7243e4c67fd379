//! Automorphism groups of processor/channel topologies.
use crate::error::{Error, Result};
use crate::group::PermGroup;
use crate::permutable::graph::{EdgeLabelledGraph, EdgeType};
use crate::permutable::PermSet;
use crate::repr::task_orbits::{TaskAllocation, TaskOrbits};
use crate::repr::ReprOptions;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub mod backtrack;
#[cfg(feature = "nauty")]
pub mod nauty;
pub mod topology;

pub use backtrack::Backtrack;
#[cfg(feature = "nauty")]
pub use nauty::Nauty;
pub use topology::ArchGraph;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AutomorphismOptions {
    /// Shifts all generators such that the graph's nodes occupy the points offset..offset + n.
    pub offset: usize,
    /// Treat a directed graph as undirected. Only valid if every edge has a reverse edge
    /// with the same label.
    pub effectively_undirected: bool,
}

/// Oracle computing generators of the automorphism group of a node- and edge-labelled graph.
/// Automorphisms must preserve node labels, edges, edge directions and edge labels.
pub trait AutomorphismProvider {
    /// Generators of the automorphism group on the points 0..offset + graph.len().
    /// The empty set stands for the trivial group, including for the empty graph.
    fn automorphisms<Ty: EdgeType>(&self, graph: &EdgeLabelledGraph<Ty>, options: &AutomorphismOptions) -> Result<PermSet>;
}

/// Lazily computed automorphism group, invalidated on every structural change of its topology.
#[derive(Debug, Default)]
pub struct AutomorphismCache {
    group: Mutex<Option<Arc<PermGroup>>>,
}

impl AutomorphismCache {
    /// The cached group, computing it with the given function if the cache is invalid.
    pub fn get_or_update(&self, update: impl FnOnce() -> Result<PermGroup>) -> Result<Arc<PermGroup>> {
        let mut group = self.group.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(g) = group.as_ref() {
            return Ok(g.clone());
        }
        let g = Arc::new(update()?);
        debug!(degree = g.degree(), order = %g.order(), "updated automorphisms");
        *group = Some(g.clone());
        Ok(g)
    }

    pub fn invalidate(&self) {
        *self.group.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_valid(&self) -> bool {
        self.group.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl Clone for AutomorphismCache {
    fn clone(&self) -> Self {
        Self { group: Mutex::new(self.group.lock().unwrap_or_else(PoisonError::into_inner).clone()) }
    }
}

/// A system of processors connected by channels whose symmetries reduce the space of task
/// allocations.
pub trait Topology {
    fn num_processors(&self) -> Result<usize> {
        Err(Error::NotImplemented("num_processors"))
    }

    fn num_channels(&self) -> Result<usize> {
        Err(Error::NotImplemented("num_channels"))
    }

    /// Computes the automorphism group from scratch.
    fn update_automorphisms(&self) -> Result<PermGroup> {
        Err(Error::NotImplemented("update_automorphisms"))
    }

    fn automorphism_cache(&self) -> &AutomorphismCache;

    /// The automorphism group, computed on first request after construction or invalidation.
    fn automorphisms(&self) -> Result<Arc<PermGroup>> {
        self.automorphism_cache().get_or_update(|| self.update_automorphisms())
    }

    fn invalidate_automorphisms(&self) {
        self.automorphism_cache().invalidate()
    }

    /// Representative of the allocation's equivalence class under the automorphism group.
    fn repr(&self, allocation: &TaskAllocation, options: &ReprOptions, orbits: Option<&mut TaskOrbits>) -> Result<TaskAllocation> {
        Ok(self.automorphisms()?.repr(allocation, options, orbits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutable::Perm;
    use num_bigint::BigUint;
    use std::cell::Cell;

    #[derive(Default)]
    struct Fixed {
        cache: AutomorphismCache,
        updates: Cell<usize>,
    }

    impl Topology for Fixed {
        fn update_automorphisms(&self) -> Result<PermGroup> {
            self.updates.set(self.updates.get() + 1);
            PermGroup::new(3, vec![Perm::from_cycles(3, [[0, 1, 2]])])
        }

        fn automorphism_cache(&self) -> &AutomorphismCache { &self.cache }
    }

    #[derive(Default)]
    struct Unknown {
        cache: AutomorphismCache,
    }

    impl Topology for Unknown {
        fn automorphism_cache(&self) -> &AutomorphismCache { &self.cache }
    }

    #[test]
    fn automorphisms_are_cached_until_invalidated() {
        let t = Fixed::default();
        assert!(!t.automorphism_cache().is_valid());
        assert_eq!(t.automorphisms().unwrap().order(), &BigUint::from(3u32));
        t.automorphisms().unwrap();
        assert_eq!(t.updates.get(), 1);
        t.invalidate_automorphisms();
        assert!(!t.automorphism_cache().is_valid());
        t.automorphisms().unwrap();
        assert_eq!(t.updates.get(), 2);
    }

    #[test]
    fn repr_uses_automorphisms() {
        let t = Fixed::default();
        let repr = t.repr(&TaskAllocation::from(vec![2, 0, 1]), &ReprOptions::default(), None).unwrap();
        assert_eq!(repr, TaskAllocation::from(vec![0, 1, 2]));
    }

    #[test]
    fn defaults_are_not_implemented() {
        let t = Unknown::default();
        assert_eq!(t.num_processors(), Err(Error::NotImplemented("num_processors")));
        assert_eq!(t.num_channels(), Err(Error::NotImplemented("num_channels")));
        assert_eq!(t.automorphisms().unwrap_err(), Error::NotImplemented("update_automorphisms"));
        assert!(!t.automorphism_cache().is_valid());
    }
}
