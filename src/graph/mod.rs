//! Graph view of a live network: a petgraph representation with role tags
//! per vertex, and Graphviz rendering with one shape per role. Built
//! entirely through the read-only inspection surface of [`Net`].
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::net::{ArcKind, Net, NodeId, Role, Weight};

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub path: String,
    pub label: String,
    pub role: Role,
    pub tokens: Option<Weight>,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphEdge {
    pub weight: Option<Weight>,
}

/// Flattened node/edge representation of one network scope, nested
/// sub-networks included.
pub struct NetworkGraph {
    pub graph: DiGraph<GraphNode, GraphEdge>,
}

impl NetworkGraph {
    pub fn from_net(net: &Net, scope: NodeId) -> Self {
        let mut graph = DiGraph::new();
        let mut index: IndexMap<NodeId, NodeIndex> = IndexMap::new();
        let mut arcs: Vec<NodeId> = Vec::new();
        Self::descend(net, scope, &mut graph, &mut index, &mut arcs);

        // Arcs may span network boundaries, so edges are resolved only
        // after every vertex in scope is registered.
        for arc in arcs {
            let (Some(source), Some(sink)) = (net.source(arc), net.sink(arc)) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (index.get(&source), index.get(&sink)) else {
                continue;
            };
            let weight = match net.arc_kind(arc) {
                Some(ArcKind::Weighted(weight)) => Some(weight),
                _ => None,
            };
            graph.add_edge(from, to, GraphEdge { weight });
        }
        Self { graph }
    }

    fn descend(
        net: &Net,
        network: NodeId,
        graph: &mut DiGraph<GraphNode, GraphEdge>,
        index: &mut IndexMap<NodeId, NodeIndex>,
        arcs: &mut Vec<NodeId>,
    ) {
        for place in net.places(network) {
            let idx = graph.add_node(GraphNode {
                path: net.path(place),
                label: net.name(place).to_string(),
                role: Role::Place,
                tokens: net.place(place).map(|data| data.tokens),
            });
            index.insert(place, idx);
        }
        for transition in net.transitions(network) {
            let idx = graph.add_node(GraphNode {
                path: net.path(transition),
                label: net.name(transition).to_string(),
                role: Role::Transition,
                tokens: None,
            });
            index.insert(transition, idx);
        }
        arcs.extend(net.arcs(network));
        for sub in net.networks(network) {
            let idx = graph.add_node(GraphNode {
                path: net.path(sub),
                label: net.name(sub).to_string(),
                role: Role::Network,
                tokens: None,
            });
            index.insert(sub, idx);
            Self::descend(net, sub, graph, index, arcs);
        }
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph tokenflow {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let (shape, fill) = match node.role {
                Role::Place => ("ellipse", "#e3f2fd"),
                Role::Transition => ("box", "#ffe0b2"),
                _ => ("doubleoctagon", "#e8f5e9"),
            };
            let label = match node.tokens {
                Some(tokens) => format!("{}\\n{}", escape_label(&node.label), tokens),
                None => escape_label(&node.label),
            };
            let _ = writeln!(
                &mut dot,
                "    n{} [label=\"{}\", shape={}, style=filled, fillcolor=\"{}\"];",
                idx.index(),
                label,
                shape,
                fill
            );
        }

        for edge in self.graph.edge_references() {
            let from = edge.source().index();
            let to = edge.target().index();
            match edge.weight().weight {
                Some(weight) if weight > 1 => {
                    let _ = writeln!(&mut dot, "    n{from} -> n{to} [label=\"{weight}\"];");
                }
                _ => {
                    let _ = writeln!(&mut dot, "    n{from} -> n{to};");
                }
            }
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }

    /// Paths of every vertex carrying the given role, in construction order.
    pub fn paths_with_role(&self, role: Role) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].role == role)
            .map(|idx| self.graph[idx].path.as_str())
            .collect_vec()
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
