//! Event heap ordered by fire time, then topological rank.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

/// One pending step of a project.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Event {
    pub t: f64,
    pub rank: usize,
    /// Index into the state's project list.
    pub project: usize,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t
            .total_cmp(&other.t)
            .then(self.rank.cmp(&other.rank))
            .then(self.project.cmp(&other.project))
    }
}

/// Ranks and pending events, valid until the next registration.
#[derive(Debug, Default)]
pub(crate) struct Schedule {
    ranks: HashMap<usize, usize>,
    heap: BinaryHeap<Reverse<Event>>,
}

impl Schedule {
    pub fn new(ranks: HashMap<usize, usize>) -> Self {
        Self {
            ranks,
            heap: BinaryHeap::new(),
        }
    }

    pub fn rank_of(&self, project: usize) -> usize {
        self.ranks.get(&project).copied().unwrap_or(usize::MAX)
    }

    pub fn push(&mut self, t: f64, project: usize) {
        let rank = self.rank_of(project);
        self.heap.push(Reverse(Event { t, rank, project }));
    }

    pub fn peek(&self) -> Option<Event> {
        self.heap.peek().map(|Reverse(ev)| *ev)
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(ev)| ev)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_by_time_then_rank() {
        let ranks = HashMap::from([(0, 2), (1, 0), (2, 1)]);
        let mut s = Schedule::new(ranks);
        s.push(1.0, 0);
        s.push(1.0, 1);
        s.push(0.5, 0);
        s.push(1.0, 2);
        let order: Vec<(f64, usize)> = std::iter::from_fn(|| s.pop())
            .map(|ev| (ev.t, ev.project))
            .collect();
        assert_eq!(order, vec![(0.5, 0), (1.0, 1), (1.0, 2), (1.0, 0)]);
    }
}
