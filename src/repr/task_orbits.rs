use crate::permutable::{FHashMap, Perm, Permutable};
use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Task i runs on processor self[i]. Ordered lexicographically.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TaskAllocation(pub Vec<usize>);

impl From<Vec<usize>> for TaskAllocation {
    fn from(processors: Vec<usize>) -> Self { Self(processors) }
}

impl Deref for TaskAllocation {
    type Target = [usize];
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl TaskAllocation {
    /// Image under p acting on the processors offset..offset + p.degree(), i.e. processor x in
    /// that window is mapped to p(x - offset) + offset. Processors outside the window are unchanged.
    pub fn permuted_with_offset(&self, p: &Perm, offset: usize) -> Self {
        let window = offset..offset + p.degree();
        Self(self.iter().map(|&x| if window.contains(&x) { p.apply(x - offset) + offset } else { x }).collect())
    }
}

impl Permutable for TaskAllocation {
    fn permuted(&self, p: &Perm) -> Self {
        self.permuted_with_offset(p, 0)
    }
}

impl Display for TaskAllocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().join(", "))
    }
}

/// Representatives of task allocation equivalence classes, with class ids assigned in order of
/// first insertion starting at 0. Grows monotonically.
#[derive(Clone, Debug, Default)]
pub struct TaskOrbits {
    ids: FHashMap<TaskAllocation, usize>,
    reprs: Vec<TaskAllocation>,
}

impl TaskOrbits {
    pub fn new() -> Self { Self::default() }

    /// Returns whether the representative starts a new orbit, and its class id.
    pub fn insert(&mut self, repr: TaskAllocation) -> (bool, usize) {
        if let Some(&id) = self.ids.get(&repr) {
            return (false, id);
        }
        let id = self.reprs.len();
        self.ids.insert(repr.clone(), id);
        self.reprs.push(repr);
        (true, id)
    }

    pub fn insert_all(&mut self, reprs: impl IntoIterator<Item=TaskAllocation>) {
        for repr in reprs {
            self.insert(repr);
        }
    }

    pub fn is_repr(&self, allocation: &TaskAllocation) -> bool {
        self.ids.contains_key(allocation)
    }

    pub fn class(&self, repr: &TaskAllocation) -> Option<usize> {
        self.ids.get(repr).cloned()
    }

    pub fn num_orbits(&self) -> usize { self.reprs.len() }

    /// Representatives in class id order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskAllocation> {
        self.reprs.iter()
    }
}

impl PartialEq for TaskOrbits {
    /// Equal sets of representatives, regardless of class ids.
    fn eq(&self, other: &Self) -> bool {
        self.num_orbits() == other.num_orbits() && self.reprs.iter().all(|r| other.is_repr(r))
    }
}

impl Eq for TaskOrbits {}

impl Extend<TaskAllocation> for TaskOrbits {
    fn extend<T: IntoIterator<Item=TaskAllocation>>(&mut self, iter: T) {
        self.insert_all(iter)
    }
}

impl FromIterator<TaskAllocation> for TaskOrbits {
    fn from_iter<T: IntoIterator<Item=TaskAllocation>>(iter: T) -> Self {
        let mut out = Self::default();
        out.insert_all(iter);
        out
    }
}

impl<'a> IntoIterator for &'a TaskOrbits {
    type Item = &'a TaskAllocation;
    type IntoIter = std::slice::Iter<'a, TaskAllocation>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
