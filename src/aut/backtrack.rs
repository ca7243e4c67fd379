//! Automorphisms by backtracking search within refined color classes.
use crate::aut::{AutomorphismOptions, AutomorphismProvider};
use crate::error::Result;
use crate::group::orbit::orbit;
use crate::permutable::graph::{ColorRefinement, EdgeLabelledGraph, EdgeType, NeighborMap};
use crate::permutable::{Perm, PermSet};
use itertools::Itertools;
use tracing::{debug, trace};

/// Pure Rust automorphism provider. For every point i, from the last to the first, searches one
/// automorphism fixing 0..i pointwise and mapping i to w, for each w of i's color not yet known
/// to be in i's orbit. The results form a strong generating set relative to the base 0..n.
///
/// Edges are always compared in both directions, so effectively undirected graphs need no
/// special treatment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Backtrack {
    pub refinement: ColorRefinement,
}

impl AutomorphismProvider for Backtrack {
    fn automorphisms<Ty: EdgeType>(&self, graph: &EdgeLabelledGraph<Ty>, options: &AutomorphismOptions) -> Result<PermSet> {
        let n = graph.len();
        let mut generators: Vec<Perm> = vec![];
        if n > 1 {
            let search = Search::new(graph, self.refinement.colors(graph));
            for i in (0..n).rev() {
                let mut in_orbit = reached(i, n, &generators);
                for w in i + 1..n {
                    if in_orbit[w] || search.colors[w] != search.colors[i] {
                        continue;
                    }
                    if let Some(p) = search.find(i, w) {
                        trace!(level = i, image = w, generator = %p, "found automorphism");
                        generators.push(p);
                        in_orbit = reached(i, n, &generators);
                    }
                }
            }
        }
        debug!(nodes = n, generators = generators.len(), "backtracking automorphisms");
        Ok(PermSet::from(generators).shifted(options.offset))
    }
}

fn reached(x: usize, degree: usize, generators: &[Perm]) -> Vec<bool> {
    let mut out = vec![false; degree];
    for y in orbit(x, generators) {
        out[y] = true;
    }
    out
}

struct Search<'a, Ty: EdgeType> {
    graph: &'a EdgeLabelledGraph<Ty>,
    incoming: Vec<NeighborMap<usize>>,
    colors: Vec<usize>,
}

/// Partial bijection built up during the search.
struct Partial {
    image: Vec<Option<usize>>,
    preimage: Vec<Option<usize>>,
}

impl<'a, Ty: EdgeType> Search<'a, Ty> {
    fn new(graph: &'a EdgeLabelledGraph<Ty>, colors: Vec<usize>) -> Self {
        Self { graph, incoming: graph.in_neighbors(), colors }
    }

    /// Automorphism fixing 0..i and mapping i to w, if any.
    fn find(&self, i: usize, w: usize) -> Option<Perm> {
        let n = self.graph.len();
        let order = self.order(i);
        let mut partial = Partial { image: vec![None; n], preimage: vec![None; n] };
        let forced = |v: usize| if v < i { Some(v) } else if v == i { Some(w) } else { None };
        if !self.extend(&order, 0, &forced, &mut partial) {
            return None;
        }
        Some(Perm::from(partial.image.into_iter().flatten().collect_vec()))
    }

    /// Nodes 0..=i first, then repeatedly the node with the most already ordered neighbors.
    fn order(&self, i: usize) -> Vec<usize> {
        let n = self.graph.len();
        let mut out = (0..=i).collect_vec();
        let mut placed = vec![false; n];
        let mut links = vec![0usize; n];
        for &v in &out {
            self.place(v, &mut placed, &mut links);
        }
        while out.len() < n {
            let Some(v) = (0..n).filter(|&v| !placed[v]).max_by_key(|&v| (links[v], std::cmp::Reverse(v))) else { break; };
            self.place(v, &mut placed, &mut links);
            out.push(v);
        }
        out
    }

    fn place(&self, v: usize, placed: &mut [bool], links: &mut [usize]) {
        placed[v] = true;
        for &u in self.graph.nodes[v].1.keys().chain(self.incoming[v].keys()) {
            links[u] += 1;
        }
    }

    fn extend(&self, order: &[usize], k: usize, forced: &impl Fn(usize) -> Option<usize>, partial: &mut Partial) -> bool {
        let Some(&v) = order.get(k) else { return true; };
        for c in self.candidates(v, forced, partial) {
            if partial.preimage[c].is_some() || self.colors[c] != self.colors[v] || !self.consistent(v, c, partial) {
                continue;
            }
            partial.image[v] = Some(c);
            partial.preimage[c] = Some(v);
            if self.extend(order, k + 1, forced, partial) {
                return true;
            }
            partial.image[v] = None;
            partial.preimage[c] = None;
        }
        false
    }

    /// Images of v compatible with an already mapped neighbor, or all nodes if there is none.
    fn candidates(&self, v: usize, forced: &impl Fn(usize) -> Option<usize>, partial: &Partial) -> Vec<usize> {
        if let Some(c) = forced(v) {
            return vec![c];
        }
        let out = &self.graph.nodes[v].1;
        if let Some(u) = out.keys().find_map(|&u| partial.image[u]) {
            return self.incoming[u].keys().cloned().sorted_unstable().collect();
        }
        if let Some(u) = self.incoming[v].keys().find_map(|&u| partial.image[u]) {
            return self.graph.nodes[u].1.keys().cloned().sorted_unstable().collect();
        }
        (0..self.graph.len()).collect()
    }

    /// Whether mapping v to c preserves all edges between v and mapped nodes, in both directions.
    fn consistent(&self, v: usize, c: usize, partial: &Partial) -> bool {
        let edge = |(i, j): (usize, usize)| self.graph.edge((i, j));
        if edge((v, v)) != edge((c, c)) {
            return false;
        }
        let out = &self.graph.nodes;
        out[v].1.iter().all(|(&u, l)| partial.image[u].map_or(true, |pu| edge((c, pu)) == Some(l))) &&
            self.incoming[v].iter().all(|(&u, l)| partial.image[u].map_or(true, |pu| edge((pu, c)) == Some(l))) &&
            out[c].1.iter().all(|(&x, l)| partial.preimage[x].map_or(true, |u| edge((v, u)) == Some(l))) &&
            self.incoming[c].iter().all(|(&x, l)| partial.preimage[x].map_or(true, |u| edge((u, v)) == Some(l)))
    }
}
