//! Benchmark reducing all task allocations on a group's points to orbit representatives.
use crate::aut::{ArchGraph, Topology};
use crate::group::schreier_sims::{ChainOptions, Construction};
use crate::group::PermGroup;
use crate::repr::{ReprMethod, ReprOptions, TaskAllocation, TaskOrbits};
use clap::Parser;
use itertools::Itertools;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io::{stdout, Write};
use std::str::FromStr;
use timeit::timeit_loops;
use tracing::info;

macro_rules! print_flush {
    ( $($t:tt)* ) => {
        {
            print!($($t)*);
            stdout().flush().unwrap();
        }
    }
}

#[derive(Clone, Debug, Parser, PartialEq)]
pub struct Config {
    /// Number of tasks per allocation. All degree^tasks allocations are reduced.
    #[arg(short = 'k', long, default_value_t = 3)]
    pub tasks: usize,

    /// Canonicalization strategy: auto, iterate, local-search or orbits.
    #[arg(short, long, default_value = "auto")]
    pub method: ReprMethod,

    /// Canonicalize sequentially, matching known representatives. By default, allocations are
    /// canonicalized in parallel without consulting the orbits and inserted afterwards.
    #[arg(long)]
    pub sequential: bool,

    /// Build stabilizer chains with random Schreier-Sims followed by verification.
    #[arg(long)]
    pub random: bool,

    /// Seed for random Schreier-Sims.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(short, long)]
    /// Number of threads to use for parallelism. By default, the number of logical CPUs is used.
    pub threads: Option<usize>,
}

impl Config {
    fn chain_options(&self) -> ChainOptions {
        let construction = if self.random { Construction::Random } else { Construction::Deterministic };
        ChainOptions { construction, seed: self.seed, ..ChainOptions::default() }
    }
}

/// Group to benchmark. Parsed from 'sym:n', 'cyc:n', 'alt:n', 'dih:n', the automorphisms of a
/// ring or fully connected architecture 'ring:n' and 'full:n', or wreath products 'a~b' of these,
/// evaluated from left to right.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupSpec {
    Symmetric(usize),
    Cyclic(usize),
    Alternating(usize),
    Dihedral(usize),
    Ring(usize),
    FullyConnected(usize),
    Wreath(Box<GroupSpec>, Box<GroupSpec>),
}

impl FromStr for GroupSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((lhs, rhs)) = s.rsplit_once('~') {
            return Ok(Self::Wreath(Box::new(lhs.parse()?), Box::new(rhs.parse()?)));
        }
        let (family, n) = s.split_once(':').ok_or_else(|| format!("expected '<family>:<n>', got '{s}'"))?;
        let n = n.parse::<usize>().map_err(|e| format!("invalid size in '{s}': {e}"))?;
        if n == 0 {
            return Err(format!("size must be positive in '{s}'"));
        }
        match family {
            "sym" => Ok(Self::Symmetric(n)),
            "cyc" => Ok(Self::Cyclic(n)),
            "alt" => Ok(Self::Alternating(n)),
            "dih" => Ok(Self::Dihedral(n)),
            "ring" => Ok(Self::Ring(n)),
            "full" => Ok(Self::FullyConnected(n)),
            _ => Err(format!("unknown group family '{family}'")),
        }
    }
}

impl Display for GroupSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symmetric(n) => write!(f, "sym:{n}"),
            Self::Cyclic(n) => write!(f, "cyc:{n}"),
            Self::Alternating(n) => write!(f, "alt:{n}"),
            Self::Dihedral(n) => write!(f, "dih:{n}"),
            Self::Ring(n) => write!(f, "ring:{n}"),
            Self::FullyConnected(n) => write!(f, "full:{n}"),
            Self::Wreath(lhs, rhs) => write!(f, "{lhs}~{rhs}"),
        }
    }
}

impl GroupSpec {
    pub fn group(&self, options: &ChainOptions) -> crate::error::Result<PermGroup> {
        Ok(match self {
            Self::Symmetric(n) => PermGroup::symmetric(*n),
            Self::Cyclic(n) => PermGroup::cyclic(*n),
            Self::Alternating(n) => PermGroup::alternating(*n),
            Self::Dihedral(n) => PermGroup::dihedral(*n),
            Self::Ring(n) | Self::FullyConnected(n) => {
                let mut ag = ArchGraph::new(false);
                ag.set_chain_options(options.clone());
                let pt = ag.new_processor_type("P");
                let ct = ag.new_channel_type("L");
                ag.add_processors(*n, pt);
                if let Self::Ring(_) = self {
                    for i in 0..*n {
                        if i != (i + 1) % n {
                            ag.add_channel(i, (i + 1) % n, ct);
                        }
                    }
                } else {
                    ag.fully_connect(ct);
                }
                ag.automorphisms()?.as_ref().clone()
            }
            Self::Wreath(lhs, rhs) => lhs.group(options)?.wreath_product(&rhs.group(options)?),
        })
    }
}

pub struct Benchmark {
    pub groups: Vec<GroupSpec>,
    pub config: Config,
}

impl Benchmark {
    pub fn timed_run(&self) -> crate::error::Result<()> {
        let mut result = Ok(());
        let time = timeit_loops!(1, { result = self.run(); });
        println!("Finished in {time:.1}s.");
        result
    }

    pub fn run(&self) -> crate::error::Result<()> {
        if let Some(threads) = self.config.threads {
            if let Err(e) = ThreadPoolBuilder::new().num_threads(threads).build_global() {
                info!("keeping existing thread pool: {e}");
            }
        }
        println!("group degree order allocations orbits build_sec repr_sec");
        for spec in &self.groups {
            self.run_group(spec)?;
        }
        Ok(())
    }

    fn run_group(&self, spec: &GroupSpec) -> crate::error::Result<()> {
        print_flush!("{spec} ");
        let mut group = None;
        let build_sec = timeit_loops!(1, { group = Some(spec.group(&self.config.chain_options())); });
        let group = group.expect("group is built by the timed closure")?;
        print_flush!("{} {} ", group.degree(), group.order());

        let allocations = all_allocations(group.degree(), self.config.tasks);
        let mut orbits = TaskOrbits::new();
        let repr_sec = timeit_loops!(1, { orbits = self.reduce(&group, &allocations); });
        println!("{} {} {build_sec} {repr_sec}", allocations.len(), orbits.num_orbits());
        Ok(())
    }

    /// Orbits of all given allocations.
    pub fn reduce(&self, group: &PermGroup, allocations: &[TaskAllocation]) -> TaskOrbits {
        let options = ReprOptions::new(self.config.method);
        let mut orbits = TaskOrbits::new();
        if self.config.sequential {
            for a in allocations {
                group.repr(a, &options, Some(&mut orbits));
            }
        } else {
            let reprs = allocations.par_iter().map(|a| group.repr(a, &options, None)).collect::<Vec<_>>();
            orbits.insert_all(reprs);
        }
        orbits
    }
}

/// All allocations of the given number of tasks onto processors 0..degree, in lexicographic order.
pub fn all_allocations(degree: usize, tasks: usize) -> Vec<TaskAllocation> {
    if tasks == 0 {
        return vec![TaskAllocation::default()];
    }
    (0..tasks).map(|_| 0..degree).multi_cartesian_product().map(TaskAllocation::from).collect()
}
