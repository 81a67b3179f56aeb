//! pz-graph: the read/write dependency digraph between projects and series.
//!
//! Nodes are projects and series; edges run writer → series and
//! series → current reader. Projects are ranked by a deterministic
//! topological sort and any `current`-read cycle is reported explicitly.

pub mod error;
pub mod graph;

pub use error::{GraphError, GraphResult};
pub use graph::{DepNode, DependencyGraph};
