//! # Search Graph
//!
//! Append-only record of the beam search's expansion, kept for post-hoc
//! analysis. Not rendered by this crate —
//! graph *visualisation* is out of scope — but the data structure itself
//! is part of the core's contract.

/// A single state reached during the beam search.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// This node's id.
    pub id: usize,
    /// The parent node's id, or `None` for the root.
    pub parent: Option<usize>,
    /// Depth from the root.
    pub depth: u32,
    /// Cumulative actual gain along the path to this node.
    pub cumulative_gain: i64,
    /// Predicted total score (`cumulative_gain + discount · look-ahead`).
    pub predicted_score: f64,
}

/// An edge between two search-graph nodes, labelled with the pattern
/// applied and its immediate gain.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    /// The originating node id.
    pub from: usize,
    /// The resulting node id.
    pub to: usize,
    /// The pattern text applied along this edge.
    pub pattern: String,
    /// The immediate gain of applying it.
    pub gain: i64,
}

/// The full append-only record of a beam search run.
#[derive(Debug, Clone, Default)]
pub struct SearchGraph {
    /// Every node reached, in creation order.
    pub nodes: Vec<GraphNode>,
    /// Every edge recorded, in creation order.
    pub edges: Vec<GraphEdge>,
    /// Maximum depth reached by any node.
    pub max_depth: u32,
    /// Node ids on the best path found, root to terminal.
    pub best_path: Vec<usize>,
}

impl SearchGraph {
    /// Create an empty graph with just the root node recorded.
    pub fn with_root() -> Self {
        let root = GraphNode {
            id: 0,
            parent: None,
            depth: 0,
            cumulative_gain: 0,
            predicted_score: 0.0,
        };
        SearchGraph {
            nodes: vec![root],
            edges: Vec::new(),
            max_depth: 0,
            best_path: vec![0],
        }
    }

    /// Record a new node reached from `parent` by applying `pattern` for
    /// `gain` additional bytes.
    ///
    /// ## Arguments
    /// * `parent` - the id of the state this one was expanded from.
    /// * `depth` - the new node's depth.
    /// * `cumulative_gain` - cumulative actual gain along the path.
    /// * `predicted_score` - the node's predicted total score.
    /// * `pattern` - the pattern applied along the new edge.
    /// * `gain` - the immediate gain of that pattern.
    ///
    /// ## Returns
    /// The new node's id.
    pub fn add_node(
        &mut self,
        parent: usize,
        depth: u32,
        cumulative_gain: i64,
        predicted_score: f64,
        pattern: &str,
        gain: i64,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            parent: Some(parent),
            depth,
            cumulative_gain,
            predicted_score,
        });
        self.edges.push(GraphEdge {
            from: parent,
            to: id,
            pattern: pattern.to_string(),
            gain,
        });
        self.max_depth = self.max_depth.max(depth);
        id
    }

    /// Reconstruct the path from the root to `terminal`, and record it
    /// as the best path.
    ///
    /// ## Arguments
    /// * `terminal` - the id of the best terminal node found.
    pub fn set_best_path(
        &mut self,
        terminal: usize,
    ) {
        let mut path = Vec::new();
        let mut cur = Some(terminal);
        while let Some(id) = cur {
            path.push(id);
            cur = self.nodes[id].parent;
        }
        path.reverse();
        self.best_path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_root_and_add_node() {
        let mut graph = SearchGraph::with_root();
        let child = graph.add_node(0, 1, 5, 4.5, "abc", 5);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.max_depth, 1);
        graph.set_best_path(child);
        assert_eq!(graph.best_path, vec![0, child]);
    }
}
