//! Canonical representatives of task allocations under a permutation group.
use crate::group::orbit::ObjectOrbit;
use crate::group::PermGroup;
use std::str::FromStr;
use tracing::trace;

pub mod task_orbits;

pub use task_orbits::{TaskAllocation, TaskOrbits};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ReprMethod {
    /// Minimum over all group elements. Exact.
    #[default]
    Iterate,
    /// Greedy descent using the generators and their inverses. May stop at a local minimum.
    LocalSearch,
    /// Minimum over the orbit explored with the generators. Exact.
    Orbits,
}

impl ReprMethod {
    pub const AUTO: Self = Self::Iterate;
}

impl FromStr for ReprMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::AUTO),
            "iterate" => Ok(Self::Iterate),
            "local-search" => Ok(Self::LocalSearch),
            "orbits" => Ok(Self::Orbits),
            _ => Err(format!("unknown repr method '{s}', expected auto, iterate, local-search or orbits")),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReprOptions {
    pub method: ReprMethod,
    /// The group acts on processors offset..offset + degree.
    pub offset: usize,
    /// Return any candidate that is already a representative in the supplied orbits.
    pub match_reprs: bool,
}

impl Default for ReprOptions {
    fn default() -> Self {
        Self { method: ReprMethod::AUTO, offset: 0, match_reprs: true }
    }
}

impl ReprOptions {
    pub fn new(method: ReprMethod) -> Self {
        Self { method, ..Self::default() }
    }
}

fn is_repr(known: Option<&TaskOrbits>, allocation: &TaskAllocation) -> bool {
    known.is_some_and(|o| o.is_repr(allocation))
}

impl PermGroup {
    /// Representative of the allocation's equivalence class. If orbits are supplied, the
    /// result is inserted into them.
    pub fn repr(&self, allocation: &TaskAllocation, options: &ReprOptions, mut orbits: Option<&mut TaskOrbits>) -> TaskAllocation {
        let known = if options.match_reprs { orbits.as_deref() } else { None };
        let out = if is_repr(known, allocation) {
            allocation.clone()
        } else {
            match options.method {
                ReprMethod::Iterate => self.min_elem_iterate(allocation, options.offset, known),
                ReprMethod::LocalSearch => self.min_elem_local_search(allocation, options.offset, known),
                ReprMethod::Orbits => self.min_elem_orbits(allocation, options.offset, known),
            }
        };
        trace!(%allocation, repr = %out, method = ?options.method, "repr");
        if let Some(orbits) = orbits.as_deref_mut() {
            orbits.insert(out.clone());
        }
        out
    }

    fn min_elem_iterate(&self, allocation: &TaskAllocation, offset: usize, known: Option<&TaskOrbits>) -> TaskAllocation {
        let mut min = allocation.clone();
        for g in self.iter() {
            let candidate = allocation.permuted_with_offset(&g, offset);
            if is_repr(known, &candidate) {
                return candidate;
            }
            if candidate < min {
                min = candidate;
            }
        }
        min
    }

    fn min_elem_local_search(&self, allocation: &TaskAllocation, offset: usize, known: Option<&TaskOrbits>) -> TaskAllocation {
        let generators = self.generators().with_inverses();
        let mut current = allocation.clone();
        loop {
            let mut improved = false;
            for g in &generators {
                let candidate = current.permuted_with_offset(g, offset);
                if is_repr(known, &candidate) {
                    return candidate;
                }
                if candidate < current {
                    current = candidate;
                    improved = true;
                }
            }
            if !improved {
                return current;
            }
        }
    }

    fn min_elem_orbits(&self, allocation: &TaskAllocation, offset: usize, known: Option<&TaskOrbits>) -> TaskAllocation {
        let orbit = ObjectOrbit::new(allocation.clone(), self.generators(), |a: &TaskAllocation, g| a.permuted_with_offset(g, offset));
        let mut min = allocation.clone();
        for candidate in orbit {
            if is_repr(known, &candidate) {
                return candidate;
            }
            if candidate < min {
                min = candidate;
            }
        }
        min
    }
}
