//! Dependency digraph and deterministic project ranking.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::error::{GraphError, GraphResult};

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepNode {
    Series(String),
    Project(String),
}

impl DepNode {
    pub fn name(&self) -> &str {
        match self {
            DepNode::Series(name) | DepNode::Project(name) => name,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, DepNode::Project(_))
    }
}

/// Projects and series linked by write and `current`-read edges.
///
/// `latest` reads never appear here, so feedback loops through `latest`
/// reads leave the graph acyclic.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<DepNode, ()>,
    projects: HashMap<String, NodeIndex>,
    series: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&mut self, name: &str) -> GraphResult<NodeIndex> {
        if self.projects.contains_key(name) {
            return Err(GraphError::DuplicateNode {
                kind: "project",
                name: name.to_string(),
            });
        }
        let ix = self.graph.add_node(DepNode::Project(name.to_string()));
        self.projects.insert(name.to_string(), ix);
        Ok(ix)
    }

    pub fn add_series(&mut self, name: &str) -> GraphResult<NodeIndex> {
        if self.series.contains_key(name) {
            return Err(GraphError::DuplicateNode {
                kind: "series",
                name: name.to_string(),
            });
        }
        let ix = self.graph.add_node(DepNode::Series(name.to_string()));
        self.series.insert(name.to_string(), ix);
        Ok(ix)
    }

    fn project_ix(&self, name: &str) -> GraphResult<NodeIndex> {
        self.projects
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                kind: "project",
                name: name.to_string(),
            })
    }

    fn series_ix(&self, name: &str) -> GraphResult<NodeIndex> {
        self.series
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                kind: "series",
                name: name.to_string(),
            })
    }

    /// Edge `project → series`.
    pub fn add_writer(&mut self, project: &str, series: &str) -> GraphResult<()> {
        let p = self.project_ix(project)?;
        let s = self.series_ix(series)?;
        trace!(project, series, "write edge");
        self.graph.update_edge(p, s, ());
        Ok(())
    }

    /// Edge `series → project`.
    pub fn add_current_reader(&mut self, series: &str, project: &str) -> GraphResult<()> {
        let s = self.series_ix(series)?;
        let p = self.project_ix(project)?;
        trace!(project, series, "current-read edge");
        self.graph.update_edge(s, p, ());
        Ok(())
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `a` must step before `b` at a shared instant.
    pub fn depends_on(&self, b: &str, a: &str) -> bool {
        let (Ok(a), Ok(b)) = (self.project_ix(a), self.project_ix(b)) else {
            return false;
        };
        petgraph::algo::has_path_connecting(&self.graph, a, b, None)
    }

    /// Strongly connected components that form cycles, as node names.
    fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n))
            })
            .map(|mut scc| {
                scc.sort();
                scc.into_iter()
                    .map(|n| self.graph[n].name().to_string())
                    .collect()
            })
            .collect()
    }

    /// Project names in topological order.
    ///
    /// Kahn's algorithm over the whole graph; among ready nodes the one added
    /// first wins, so equal inputs give equal orders.
    pub fn project_order(&self) -> GraphResult<Vec<String>> {
        if let Some(members) = self.cycles().into_iter().next() {
            return Err(GraphError::CycleDetected { members });
        }

        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.projects.len());
        while let Some(Reverse(n)) = ready.pop() {
            if let DepNode::Project(name) = &self.graph[n] {
                order.push(name.clone());
            }
            for m in self.graph.neighbors_directed(n, Direction::Outgoing) {
                let deg = &mut in_degree[m.index()];
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse(m));
                }
            }
        }

        debug!(
            projects = order.len(),
            series = self.series.len(),
            edges = self.graph.edge_count(),
            "ranked dependency graph"
        );
        Ok(order)
    }

    /// Topological rank of every project.
    pub fn project_ranks(&self) -> GraphResult<HashMap<String, usize>> {
        Ok(self
            .project_order()?
            .into_iter()
            .enumerate()
            .map(|(rank, name)| (name, rank))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        g.add_project("P3").unwrap();
        g.add_project("P2").unwrap();
        g.add_project("P1").unwrap();
        g.add_series("q").unwrap();
        g.add_series("r").unwrap();
        g.add_writer("P1", "q").unwrap();
        g.add_current_reader("q", "P2").unwrap();
        g.add_writer("P2", "r").unwrap();
        g.add_current_reader("r", "P3").unwrap();
        g
    }

    #[test]
    fn writers_rank_before_current_readers() {
        let g = chain();
        assert_eq!(g.project_order().unwrap(), vec!["P1", "P2", "P3"]);
        assert!(g.depends_on("P3", "P1"));
        assert!(!g.depends_on("P1", "P3"));
    }

    #[test]
    fn independent_projects_keep_insertion_order() {
        let mut g = DependencyGraph::new();
        for name in ["c", "a", "b"] {
            g.add_project(name).unwrap();
        }
        assert_eq!(g.project_order().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn current_cycle_is_reported() {
        let mut g = DependencyGraph::new();
        g.add_project("A").unwrap();
        g.add_project("B").unwrap();
        g.add_series("x").unwrap();
        g.add_series("y").unwrap();
        g.add_writer("A", "x").unwrap();
        g.add_current_reader("x", "B").unwrap();
        g.add_writer("B", "y").unwrap();
        g.add_current_reader("y", "A").unwrap();

        let err = g.project_order().unwrap_err();
        let GraphError::CycleDetected { members } = err else {
            panic!("expected cycle");
        };
        assert_eq!(members.len(), 4);
        assert!(members.contains(&"A".to_string()));
        assert!(members.contains(&"y".to_string()));
    }

    #[test]
    fn reading_own_output_currently_is_a_cycle() {
        let mut g = DependencyGraph::new();
        g.add_project("A").unwrap();
        g.add_series("x").unwrap();
        g.add_writer("A", "x").unwrap();
        g.add_current_reader("x", "A").unwrap();
        assert!(matches!(
            g.project_order(),
            Err(GraphError::CycleDetected { .. })
        ));
    }

    #[test]
    fn duplicate_and_unknown_nodes() {
        let mut g = DependencyGraph::new();
        g.add_project("A").unwrap();
        assert!(matches!(
            g.add_project("A"),
            Err(GraphError::DuplicateNode { .. })
        ));
        assert!(matches!(
            g.add_writer("A", "nope"),
            Err(GraphError::UnknownNode { kind: "series", .. })
        ));
    }

    #[test]
    fn repeated_edges_collapse() {
        let mut g = chain();
        g.add_writer("P1", "q").unwrap();
        assert_eq!(g.edge_count(), 4);
    }
}
