use crate::permutable::{FBuildHasher, FHashMap, Perm, Permutable};
use itertools::Itertools;
use rayon::prelude::*;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, Hash, Hasher};
use std::marker::PhantomData;

pub type EdgeIndex = (usize, usize);
pub type Edge<E = ()> = (EdgeIndex, E);
pub type NeighborMap<E> = FHashMap<usize, E>;

/// Node and edge labels, such as processor and channel types.
pub trait Label: Clone + Debug + Eq + Hash + Ord + Send + Sync {}

impl<T: Clone + Debug + Eq + Hash + Ord + Send + Sync> Label for T {}

/// Marker type for a directed graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directed {}

/// Marker type for an undirected graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Undirected {}

/// A graph's edge type determines whether it has directed edges or not.
pub trait EdgeType: Clone + Debug + Eq + Send + Sync {
    fn is_directed() -> bool;
}

impl EdgeType for Directed {
    #[inline]
    fn is_directed() -> bool {
        true
    }
}

impl EdgeType for Undirected {
    #[inline]
    fn is_directed() -> bool {
        false
    }
}

/// Graph with node and edge labels. Undirected edges are stored in both directions.
#[derive(Clone, Eq, PartialEq)]
pub struct Graph<N: Label = (), E: Label = (), Ty: EdgeType = Directed> {
    pub nodes: Vec<(N, NeighborMap<E>)>,
    pub phantom: PhantomData<Ty>,
}

pub type DiGraph<N = (), E = ()> = Graph<N, E, Directed>;
pub type UnGraph<N = (), E = ()> = Graph<N, E, Undirected>;
/// A graph with natural numbers as node labels.
pub type NodeLabelledGraph<Ty = Directed> = Graph<usize, (), Ty>;
/// A graph with natural numbers as edge and node labels, like a processor/channel topology.
pub type EdgeLabelledGraph<Ty = Directed> = Graph<usize, usize, Ty>;

impl<N: Label, E: Label> DiGraph<N, E> {
    pub fn into_undirected(self) -> UnGraph<N, E> {
        self.nodes.into()
    }

    /// True if every edge has a reverse edge with the same label.
    pub fn is_effectively_undirected(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, (_, ne))|
            ne.iter().all(|(j, l)| self.nodes[*j].1.get(&i) == Some(l)))
    }
}

impl<N: Label, E: Label, Ty: EdgeType> From<Vec<(N, NeighborMap<E>)>> for Graph<N, E, Ty> {
    fn from(nodes: Vec<(N, NeighborMap<E>)>) -> Self {
        let out = Self { nodes, phantom: PhantomData };
        if !Ty::is_directed() {
            out.verify_is_undirected();
        }
        out
    }
}

impl<N: Label, E: Label, Ty: EdgeType> Graph<N, E, Ty> {
    fn verify_is_undirected(&self) {
        debug_assert!(self.nodes.iter().enumerate().all(|(i, (_, ne))|
            ne.iter().all(|(j, l)| self.nodes[*j].1.get(&i) == Some(l))));
    }

    pub fn empty(nodes: impl IntoIterator<Item=N>) -> Self {
        nodes.into_iter().map(|n| (n, NeighborMap::default())).collect_vec().into()
    }

    pub fn new(nodes: impl IntoIterator<Item=N>, edges: impl IntoIterator<Item=Edge<E>>) -> Self {
        let mut x = Self::empty(nodes);
        for (e, l) in edges {
            assert!(x.insert_edge(e, l).is_none(), "Duplicate edge {:?}", e);
        }
        x
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Appends a node without edges, returning its index.
    pub fn push_node(&mut self, n: N) -> usize {
        self.nodes.push((n, NeighborMap::default()));
        self.nodes.len() - 1
    }

    pub fn edges(&self) -> Vec<Edge<E>> {
        if Ty::is_directed() {
            self.directed_edges().collect()
        } else {
            self.directed_edges().filter(|&((i, j), _)| i <= j).collect()
        }
    }

    /// Returns the previous label of the edge, if any.
    pub fn insert_edge(&mut self, (i, j): EdgeIndex, e: E) -> Option<E> {
        let out = self.insert_directed_edge((i, j), e.clone());
        if !Ty::is_directed() && i != j {
            assert_eq!(out, self.insert_directed_edge((j, i), e));
        }
        out
    }

    pub fn edge(&self, (i, j): EdgeIndex) -> Option<&E> {
        self.nodes[i].1.get(&j)
    }

    pub fn has_edge(&self, (i, j): &EdgeIndex) -> bool {
        self.nodes[*i].1.contains_key(j)
    }

    fn insert_directed_edge(&mut self, (i, j): EdgeIndex, e: E) -> Option<E> {
        assert!(j < self.len());
        self.nodes[i].1.insert(j, e)
    }

    pub fn directed_edges(&self) -> impl Iterator<Item=Edge<E>> + '_ {
        self.nodes.iter().enumerate().flat_map(|(i, (_, ne))|
            ne.iter().map(move |(&j, l)| ((i, j), l.clone())))
    }

    pub fn node_labels(&self) -> impl ExactSizeIterator<Item=N> + '_ {
        self.nodes.iter().map(|(n, _)| n.clone())
    }

    pub fn degrees(&self) -> impl Iterator<Item=usize> + '_ {
        self.nodes.iter().map(|(_, ne)| ne.len())
    }

    pub fn num_edges(&self) -> usize {
        let e = self.degrees().sum();
        if Ty::is_directed() { e } else { (e + self.num_selfloops()) / 2 }
    }

    pub fn num_selfloops(&self) -> usize {
        self.nodes.iter().enumerate().filter(|(i, (_, ne))| ne.contains_key(i)).count()
    }

    /// Incoming neighbors of every node with the labels of the incoming edges.
    pub fn in_neighbors(&self) -> Vec<NeighborMap<E>> {
        let mut out = vec![NeighborMap::default(); self.len()];
        for ((i, j), l) in self.directed_edges() {
            out[j].insert(i, l);
        }
        out
    }
}

impl<N: Label, E: Label, Ty: EdgeType> Permutable for Graph<N, E, Ty> {
    /// Node i of the result is node p^-1(i) of self, with all edges relabelled accordingly.
    fn permuted(&self, p: &Perm) -> Self {
        assert_eq!(self.len(), p.degree());
        let mut nodes = vec![None; self.len()];
        for (i, (n, ne)) in self.nodes.iter().enumerate() {
            nodes[p.apply(i)] = Some((n.clone(), ne.iter().map(|(&j, l)| (p.apply(j), l.clone())).collect()));
        }
        nodes.into_iter().flatten().collect_vec().into()
    }
}

impl<N: Label, E: Label, Ty: EdgeType> Debug for Graph<N, E, Ty> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let edges = self.edges();

        fn universal_label<S: Label>(items: impl IntoIterator<Item=S>) -> Option<S> {
            let mut iter = items.into_iter();
            let first = iter.next()?;
            iter.all(|x| x == first).then_some(first)
        }

        let nodes_str = if let Some(label) = universal_label(self.node_labels()) {
            format!("all {:?}", label)
        } else {
            format!("{:?}", self.node_labels().collect_vec())
        };
        let sorted_edges = edges.iter().cloned().sorted_unstable().collect_vec();
        let edges_str = if let Some(label) = universal_label(edges.iter().map(|(_, l)| l.clone())) {
            format!("all {:?} at {:?}", label, sorted_edges.iter().map(|(e, _)| *e).collect_vec())
        } else {
            format!("{:?}", sorted_edges)
        };

        write!(f, "N={}: {nodes_str}, E={}{}: {edges_str}", self.len(), edges.len(), if Ty::is_directed() { "" } else { "u" })
    }
}

/// Color refinement, also known as the 1-dimensional Weisfeiler-Leman algorithm.
/// Node colors are invariant under automorphisms: an automorphism only maps nodes onto
/// nodes of equal color.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColorRefinement {
    /// Upper bound on the number of refinement rounds. Refinement also stops once the
    /// number of colors no longer grows.
    pub max_rounds: usize,
}

impl Default for ColorRefinement {
    fn default() -> Self { Self { max_rounds: usize::MAX } }
}

impl ColorRefinement {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    /// Node colors, starting from node labels and refined by the colors and edge labels of
    /// outgoing and incoming neighbors.
    pub fn colors<N: Label, E: Label, Ty: EdgeType>(&self, x: &Graph<N, E, Ty>) -> Vec<usize> {
        let incoming = x.in_neighbors();
        let mut hashes = (0..x.len()).into_par_iter().
            map(|i| Self::get_hash((&x.nodes[i].0, x.nodes[i].1.len(), incoming[i].len()))).collect::<Vec<_>>();
        let mut num_colors = hashes.iter().unique().count();
        for _ in 0..self.max_rounds.min(x.len()) {
            let next = Self::convolve(x, &incoming, &hashes);
            let next_num_colors = next.iter().unique().count();
            hashes = next;
            if next_num_colors == num_colors {
                break;
            }
            num_colors = next_num_colors;
        }
        hashes
    }

    fn convolve<N: Label, E: Label, Ty: EdgeType>(x: &Graph<N, E, Ty>, incoming: &[NeighborMap<E>], hashes: &[usize]) -> Vec<usize> {
        hashes.par_iter().enumerate().map(|(i, h)| {
            let out = x.nodes[i].1.iter().map(|(ne, e)| (hashes[*ne], e)).sorted_unstable().collect_vec();
            let inc = incoming[i].iter().map(|(ne, e)| (hashes[*ne], e)).sorted_unstable().collect_vec();
            Self::get_hash((h, out, inc))
        }).collect()
    }

    pub fn get_hash(obj: impl Hash) -> usize {
        let mut hasher = FBuildHasher::default().build_hasher();
        obj.hash(&mut hasher);
        hasher.finish() as usize
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Cycle of n processors of type 0 connected by channels of type 0.
    pub fn ring(n: usize) -> EdgeLabelledGraph<Undirected> {
        Graph::new(vec![0; n], (0..n).map(|i| ((i, (i + 1) % n), 0)))
    }

    #[test]
    fn undirected_edges() {
        let g = ring(4);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.edges().len(), 4);
        assert_eq!(g.edge((1, 0)), Some(&0));
        assert_eq!(format!("{:?}", g), "N=4: all 0, E=4u: all 0 at [(0, 1), (0, 3), (1, 2), (2, 3)]");
    }

    #[test]
    fn effectively_undirected() {
        let mut g = DiGraph::<usize, usize>::new(vec![0, 0], [((0, 1), 3), ((1, 0), 3)]);
        assert!(g.is_effectively_undirected());
        assert_eq!(g.clone().into_undirected().num_edges(), 1);
        g.insert_edge((1, 0), 4);
        assert!(!g.is_effectively_undirected());
        g.insert_edge((1, 1), 4);
        assert_eq!(g.num_selfloops(), 1);
    }

    #[test]
    fn permuted_graph() {
        let g = DiGraph::<usize, usize>::new(vec![7, 8, 9], [((0, 1), 1), ((1, 2), 2)]);
        let p = Perm::from_cycles(3, [[0, 1, 2]]);
        let h = g.permuted(&p);
        assert_eq!(h.node_labels().collect_vec(), vec![9, 7, 8]);
        assert_eq!(h.edge((1, 2)), Some(&1));
        assert_eq!(h.edge((2, 0)), Some(&2));
        assert_eq!(h.num_edges(), 2);
        assert_eq!(ring(5).permuted(&p.extended(5)).num_edges(), 5);
    }

    #[test]
    fn refined_colors_separate_path_ends() {
        let path = UnGraph::<usize, usize>::new(vec![0; 4], [((0, 1), 0), ((1, 2), 0), ((2, 3), 0)]);
        let c = ColorRefinement::default().colors(&path);
        assert_eq!(c[0], c[3]);
        assert_eq!(c[1], c[2]);
        assert_ne!(c[0], c[1]);
        assert_eq!(ColorRefinement::default().colors(&ring(6)).iter().unique().count(), 1);
    }

    #[test]
    fn refined_colors_follow_edge_direction() {
        let g = DiGraph::<usize, usize>::new(vec![0; 3], [((0, 1), 0), ((1, 2), 0)]);
        assert_eq!(ColorRefinement::new(1).colors(&g).iter().unique().count(), 3);
    }
}
