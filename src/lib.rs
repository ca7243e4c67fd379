pub mod aut;
pub mod error;
pub mod group;
pub mod permutable;
pub mod repr;

pub use aut::{ArchGraph, AutomorphismOptions, AutomorphismProvider, Topology};
pub use error::{Error, Result};
pub use group::PermGroup;
pub use permutable::{Perm, PermSet, Permutable};
pub use repr::{ReprMethod, ReprOptions, TaskAllocation, TaskOrbits};

#[cfg(any(test, feature = "bench"))]
pub mod bench;
