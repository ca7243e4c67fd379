//! Automorphisms computed by nauty (sparse mode).
use crate::aut::{AutomorphismOptions, AutomorphismProvider};
use crate::error::{Error, Result};
use crate::permutable::graph::{Directed, EdgeLabelledGraph, EdgeType, NodeLabelledGraph};
use crate::permutable::{Perm, PermSet};
use itertools::Itertools;
use nauty_Traces_sys::{nauty_check, optionblk, sparsenauty, statsblk, SparseGraph, FALSE, NAUTYVERSIONID, SETWORDSNEEDED, WORDSIZE};
use std::cell::RefCell;
use std::os::raw::c_int;
use tracing::debug;

/// Automorphism provider backed by nauty. Channel types are handled by inserting a node per
/// channel, labelled by its type, and truncating the resulting generators to the processors.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Nauty;

impl AutomorphismProvider for Nauty {
    fn automorphisms<Ty: EdgeType>(&self, graph: &EdgeLabelledGraph<Ty>, options: &AutomorphismOptions) -> Result<PermSet> {
        let n = graph.len();
        if n <= 1 {
            return Ok(PermSet::new());
        }
        let directed = Ty::is_directed() && !options.effectively_undirected;
        let extended = with_edges_as_nodes(graph, directed);
        let generators = node_labelled_automorphisms(&extended, directed)?.into_iter().
            map(|g| truncated(&g, n)).
            filter(|g| !g.is_identity()).collect::<PermSet>();
        debug!(nodes = n, auxiliary_nodes = extended.len() - n, generators = generators.len(), "nauty automorphisms");
        Ok(generators.shifted(options.offset))
    }
}

/// Equivalent node-labelled graph where every edge is replaced by a node labelled with the
/// edge label, shifted past all node labels. Edges in both directions with the same label
/// share one node.
fn with_edges_as_nodes<Ty: EdgeType>(graph: &EdgeLabelledGraph<Ty>, directed: bool) -> NodeLabelledGraph<Directed> {
    let edge_label_shift = graph.node_labels().max().unwrap_or(0) + 1;
    let mut extended = NodeLabelledGraph::<Directed>::empty(graph.node_labels());
    let link = |extended: &mut NodeLabelledGraph<Directed>, i: usize, j: usize| {
        extended.insert_edge((i, j), ());
        if !directed {
            extended.insert_edge((j, i), ());
        }
    };
    for ((i, j), e) in graph.directed_edges().sorted_unstable() {
        let is_undirected = graph.edge((j, i)) == Some(&e);
        if is_undirected && i > j {
            continue;
        }
        let new_node = extended.push_node(edge_label_shift + e);
        link(&mut extended, i, new_node);
        if directed {
            link(&mut extended, new_node, j);
        }
        if is_undirected && i != j {
            link(&mut extended, j, new_node);
            if directed {
                link(&mut extended, new_node, i);
            }
        }
    }
    extended
}

fn truncated(p: &Perm, n: usize) -> Perm {
    let images = p.iter().take(n).collect_vec();
    assert!(images.iter().all(|&i| i < n), "automorphism maps a processor to a channel");
    Perm::from(images)
}

fn to_nauty(graph: &NodeLabelledGraph<Directed>) -> SparseGraph {
    let d = graph.degrees().map(|x| x as i32).collect_vec();
    let v = d.iter().map(|d| *d as usize).scan(0, |acc, d| {
        let out = Some(*acc);
        *acc += d;
        out
    }).collect();
    // Sorted neighbors make the generators nauty returns deterministic.
    let e = graph.nodes.iter().map(|(_, ne)| ne.keys().map(|i| *i as i32).sorted_unstable().collect_vec()).concat();
    SparseGraph { v, d, e }
}

/// Generators of the automorphisms of the unlabelled graph respecting the partition induced by
/// node labels.
fn node_labelled_automorphisms(graph: &NodeLabelledGraph<Directed>, directed: bool) -> Result<Vec<Perm>> {
    let n = graph.len();
    let n_c = c_int::try_from(n).map_err(|_| Error::Backend(format!("graph with {n} nodes is too large for nauty")))?;

    let (mut lab, mut ptn): (Vec<c_int>, Vec<c_int>) = (0..n).into_group_map_by(|&i| graph.nodes[i].0).
        into_iter().sorted_unstable_by_key(|(label, _)| *label).
        flat_map(|(_, cell)| {
            let len = cell.len();
            cell.into_iter().enumerate().map(move |(k, x)| (x as c_int, if k + 1 == len { 0 } else { 1 }))
        }).unzip();
    let mut orbits = vec![0; n];

    unsafe {
        nauty_check(WORDSIZE as c_int, SETWORDSNEEDED(n) as c_int, n_c, NAUTYVERSIONID as c_int);
    }

    thread_local! {
        /// Collect generators via static C callback function:
        static GENERATORS: RefCell<Vec<Perm>> = RefCell::new(vec![]);
    }
    extern "C" fn push_generator(_ordinal: c_int, perm: *mut c_int, _orbits: *mut c_int,
                                 _numorbits: c_int, _stabnode: c_int, n: c_int) {
        let generator = Perm::from((0..n).map(|i| unsafe { *perm.offset(i as isize) } as usize).collect_vec());
        GENERATORS.with(|g| g.borrow_mut().push(generator));
    }

    let sg = &mut to_nauty(graph);
    let options = &mut if directed { optionblk::default_sparse_digraph() } else { optionblk::default_sparse() };
    options.getcanon = FALSE;
    options.defaultptn = FALSE;
    options.userautomproc = Some(push_generator);
    let stats = &mut statsblk::default();
    unsafe {
        sparsenauty(&mut sg.into(), lab.as_mut_ptr(), ptn.as_mut_ptr(), orbits.as_mut_ptr(),
                    options, stats, std::ptr::null_mut());
    }
    if stats.errstatus != 0 {
        return Err(Error::Backend(format!("nauty error status {}", stats.errstatus)));
    }

    Ok(GENERATORS.with(|g| std::mem::take(&mut *g.borrow_mut())))
}
