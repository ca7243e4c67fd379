use crate::aut::{AutomorphismCache, AutomorphismOptions, AutomorphismProvider, Backtrack, Topology};
use crate::error::{Error, Result};
use crate::group::schreier_sims::ChainOptions;
use crate::group::PermGroup;
use crate::permutable::graph::{Directed, EdgeLabelledGraph};
use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};

pub type ProcessorType = usize;
pub type ChannelType = usize;

/// Processors (nodes labelled by processor type) connected by channels (edges labelled by
/// channel type). Undirected architectures store every channel in both directions.
/// Every mutation invalidates the cached automorphism group.
#[derive(Clone, Debug)]
pub struct ArchGraph<A: AutomorphismProvider = Backtrack> {
    graph: EdgeLabelledGraph<Directed>,
    directed: bool,
    processor_types: Vec<String>,
    channel_types: Vec<String>,
    provider: A,
    chain_options: ChainOptions,
    cache: AutomorphismCache,
}

impl ArchGraph {
    pub fn new(directed: bool) -> Self {
        Self::with_provider(directed, Backtrack::default())
    }
}

impl<A: AutomorphismProvider> ArchGraph<A> {
    pub fn with_provider(directed: bool, provider: A) -> Self {
        Self {
            graph: EdgeLabelledGraph::empty(vec![]),
            directed,
            processor_types: vec![],
            channel_types: vec![],
            provider,
            chain_options: ChainOptions::default(),
            cache: AutomorphismCache::default(),
        }
    }

    /// Options used to build the stabilizer chain of the automorphism group.
    pub fn set_chain_options(&mut self, options: ChainOptions) {
        self.chain_options = options;
        self.invalidate_automorphisms();
    }

    pub fn new_processor_type(&mut self, name: impl Into<String>) -> ProcessorType {
        self.processor_types.push(name.into());
        self.processor_types.len() - 1
    }

    pub fn new_channel_type(&mut self, name: impl Into<String>) -> ChannelType {
        self.channel_types.push(name.into());
        self.channel_types.len() - 1
    }

    /// Returns the index of the new processor.
    pub fn add_processor(&mut self, pt: ProcessorType) -> usize {
        assert!(pt < self.processor_types.len(), "unknown processor type {pt}");
        self.invalidate_automorphisms();
        self.graph.push_node(pt)
    }

    pub fn add_processors(&mut self, n: usize, pt: ProcessorType) -> Vec<usize> {
        (0..n).map(|_| self.add_processor(pt)).collect()
    }

    /// Connects two processors, in both directions unless the architecture is directed.
    /// Returns the type of the channel it replaces, if any.
    pub fn add_channel(&mut self, from: usize, to: usize, ct: ChannelType) -> Option<ChannelType> {
        assert!(ct < self.channel_types.len(), "unknown channel type {ct}");
        assert!(from < self.graph.len() && to < self.graph.len(), "unknown processor in channel ({from}, {to})");
        self.invalidate_automorphisms();
        let out = self.graph.insert_edge((from, to), ct);
        if !self.directed && from != to {
            self.graph.insert_edge((to, from), ct);
        }
        out
    }

    /// Connects all pairs of processors, including every processor to itself.
    pub fn fully_connect(&mut self, ct: ChannelType) {
        for i in 0..self.graph.len() {
            for j in 0..self.graph.len() {
                if self.directed || i <= j {
                    self.add_channel(i, j, ct);
                }
            }
        }
    }

    /// Connects every processor to itself.
    pub fn self_connect(&mut self, ct: ChannelType) {
        for i in 0..self.graph.len() {
            self.add_channel(i, i, ct);
        }
    }

    pub fn directed(&self) -> bool { self.directed }

    /// Directed, and some channel has no reverse channel of the same type.
    pub fn effectively_directed(&self) -> bool {
        self.directed && !self.graph.is_effectively_undirected()
    }

    pub fn graph(&self) -> &EdgeLabelledGraph<Directed> { &self.graph }

    pub fn processor_types(&self) -> &[String] { &self.processor_types }

    pub fn channel_types(&self) -> &[String] { &self.channel_types }
}

impl<A: AutomorphismProvider> Topology for ArchGraph<A> {
    fn num_processors(&self) -> Result<usize> {
        Ok(self.graph.len())
    }

    fn num_channels(&self) -> Result<usize> {
        let directed_edges = self.graph.num_edges();
        Ok(if self.directed { directed_edges } else { (directed_edges + self.graph.num_selfloops()) / 2 })
    }

    fn update_automorphisms(&self) -> Result<PermGroup> {
        if self.graph.is_empty() {
            return Err(Error::ZeroDegree);
        }
        let options = AutomorphismOptions { offset: 0, effectively_undirected: !self.effectively_directed() };
        let generators = self.provider.automorphisms(&self.graph, &options)?;
        PermGroup::with_options(self.graph.len(), generators, &self.chain_options)
    }

    fn automorphism_cache(&self) -> &AutomorphismCache { &self.cache }
}

impl<A: AutomorphismProvider> Display for ArchGraph<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.graph.is_empty() {
            return write!(f, "empty architecture graph");
        }
        writeln!(f, "processors:")?;
        for (i, (pt, _)) in self.graph.nodes.iter().enumerate() {
            writeln!(f, "  {i}: {}", self.processor_types[*pt])?;
        }
        writeln!(f, "channels:")?;
        for ((i, j), ct) in self.graph.edges().into_iter().sorted_unstable() {
            if self.directed || i <= j {
                writeln!(f, "  {i} {} {j}: {}", if self.directed { "->" } else { "--" }, self.channel_types[ct])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::task_orbits::{TaskAllocation, TaskOrbits};
    use crate::repr::ReprOptions;
    use num_bigint::BigUint;

    fn ring(n: usize) -> ArchGraph {
        let mut ag = ArchGraph::new(false);
        let pt = ag.new_processor_type("P");
        let ct = ag.new_channel_type("L");
        ag.add_processors(n, pt);
        for i in 0..n {
            ag.add_channel(i, (i + 1) % n, ct);
        }
        ag
    }

    #[test]
    fn counts() {
        let ag = ring(4);
        assert_eq!(ag.num_processors(), Ok(4));
        assert_eq!(ag.num_channels(), Ok(4));
        assert!(!ag.directed());
        assert!(!ag.effectively_directed());
    }

    #[test]
    fn mutations_invalidate_automorphisms() {
        let mut ag = ring(4);
        assert_eq!(ag.automorphisms().unwrap().order(), &BigUint::from(8u32));
        assert!(ag.automorphism_cache().is_valid());

        let other = ag.new_processor_type("Q");
        let p = ag.add_processor(other);
        assert!(!ag.automorphism_cache().is_valid());
        assert_eq!(ag.automorphisms().unwrap().order(), &BigUint::from(8u32));

        ag.add_channel(p, 0, 0);
        assert!(!ag.automorphism_cache().is_valid());
        assert_eq!(ag.automorphisms().unwrap().order(), &BigUint::from(2u32));
    }

    #[test]
    fn directed_architectures() {
        let mut ag = ArchGraph::new(true);
        let pt = ag.new_processor_type("P");
        let ct = ag.new_channel_type("L");
        ag.add_processors(3, pt);
        ag.add_channel(0, 1, ct);
        ag.add_channel(1, 0, ct);
        assert!(ag.directed());
        assert!(!ag.effectively_directed());
        assert_eq!(ag.num_channels(), Ok(2));
        ag.add_channel(1, 2, ct);
        assert!(ag.effectively_directed());
        assert!(ag.automorphisms().unwrap().is_trivial());
    }

    #[test]
    fn fully_connected_is_symmetric() {
        let mut ag = ArchGraph::new(false);
        let pt = ag.new_processor_type("P");
        let ct = ag.new_channel_type("L");
        ag.add_processors(5, pt);
        ag.fully_connect(ct);
        assert_eq!(ag.num_channels(), Ok(15));
        assert_eq!(ag.graph().num_selfloops(), 5);
        assert!(ag.automorphisms().unwrap().is_symmetric());
        ag.self_connect(ct);
        assert_eq!(ag.num_channels(), Ok(15));
        assert!(ag.automorphisms().unwrap().is_symmetric());
    }

    #[test]
    fn fully_connected_directed() {
        let mut ag = ArchGraph::new(true);
        let pt = ag.new_processor_type("P");
        let ct = ag.new_channel_type("L");
        ag.add_processors(4, pt);
        ag.fully_connect(ct);
        assert_eq!(ag.num_channels(), Ok(16));
        assert!(!ag.effectively_directed());
        assert!(ag.automorphisms().unwrap().is_symmetric());
    }

    #[test]
    fn empty_architecture_has_no_group() {
        assert_eq!(ArchGraph::new(false).automorphisms().unwrap_err(), Error::ZeroDegree);
    }

    #[test]
    fn repr_of_ring_allocations() {
        let ag = ring(4);
        let mut orbits = TaskOrbits::default();
        for allocation in (0..2).map(|_| 0..4).multi_cartesian_product() {
            ag.repr(&TaskAllocation::from(allocation), &ReprOptions::default(), Some(&mut orbits)).unwrap();
        }
        // Pairs of processors on a square: equal, adjacent or opposite, ordered pairs.
        assert_eq!(orbits.num_orbits(), 3);
        assert!(orbits.is_repr(&TaskAllocation::from(vec![0, 1])));
        assert!(orbits.is_repr(&TaskAllocation::from(vec![0, 2])));
    }

    #[test]
    fn display_empty() {
        let mut ag = ArchGraph::new(false);
        ag.new_processor_type("P");
        assert_eq!(ag.to_string(), "empty architecture graph");
    }

    #[test]
    fn display() {
        let mut ag = ring(3);
        ag.new_processor_type("Q");
        assert_eq!(ag.to_string(), "processors:\n  0: P\n  1: P\n  2: P\nchannels:\n  0 -- 1: L\n  0 -- 2: L\n  1 -- 2: L\n");
    }
}
