// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Immutable per-request trust graph with petgraph backing for algorithms

use crate::error::{EngineError, Result};
use crate::source::AvatarResolver;
use crate::types::{Diagnostic, Edge, Node, NodeId, NodeKind, ORG_PREFIX, PERSON_PREFIX};
use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// The trust graph for one request
///
/// Nodes are keyed by canonical id. Edges keep their own direction; edges
/// whose provenance is symmetric (explicit connections) are walkable both
/// ways in the backing graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    /// Traversal graph; node weights are node ids, edge weights index `edges`
    #[serde(skip)]
    graph: DiGraph<String, usize>,
    /// Map from node ID to node index
    #[serde(skip)]
    node_indices: HashMap<String, NodeIndex>,
    /// Ids of edges already added
    #[serde(skip)]
    edge_ids: HashSet<String>,
    /// All nodes by id
    nodes: BTreeMap<String, Node>,
    /// All edges, in insertion order
    edges: Vec<Edge>,
    /// Degrade-and-continue decisions taken while building
    diagnostics: Vec<Diagnostic>,
    /// When the snapshot was assembled
    built_at: DateTime<Utc>,
}

impl Default for GraphSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSnapshot {
    /// Create a new empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            edge_ids: HashSet::new(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            diagnostics: Vec::new(),
            built_at: Utc::now(),
        }
    }

    /// Assemble a snapshot from nodes and edges
    ///
    /// Fails on a duplicate node id or an edge whose endpoint is missing.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut snapshot = Self::new();
        for node in nodes {
            snapshot.add_node(node)?;
        }
        for edge in edges {
            snapshot.add_edge(edge)?;
        }
        Ok(snapshot)
    }

    /// Add a node; a second node with the same id is an invariant violation
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.node_indices.contains_key(&node.id) {
            return Err(EngineError::InvariantViolation(format!(
                "duplicate node id {}",
                node.id
            )));
        }
        let idx = self.graph.add_node(node.id.clone());
        self.node_indices.insert(node.id.clone(), idx);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Add an edge to the graph
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        // Verify both endpoints exist
        let from_idx = *self.node_indices.get(&edge.source).ok_or_else(|| {
            EngineError::InvariantViolation(format!("edge {} source not found: {}", edge.id, edge.source))
        })?;
        let to_idx = *self.node_indices.get(&edge.target).ok_or_else(|| {
            EngineError::InvariantViolation(format!("edge {} target not found: {}", edge.id, edge.target))
        })?;

        if !self.edge_ids.insert(edge.id.clone()) {
            return Ok(()); // Idempotent
        }

        let position = self.edges.len();
        self.graph.add_edge(from_idx, to_idx, position);
        if edge.provenance.kind.is_symmetric() {
            self.graph.add_edge(to_idx, from_idx, position);
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Record a diagnostic
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get a node by ID
    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes of one kind, ordered by id
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// All edges
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Diagnostics collected while building
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// When the snapshot was built
    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Get edges from a specific node
    #[must_use]
    pub fn edges_from(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source == id).collect()
    }

    /// Get edges to a specific node
    #[must_use]
    pub fn edges_to(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target == id).collect()
    }

    /// Walkable steps out of `id`: `(neighbor id, edge)`, sorted by neighbor
    /// id then edge id
    #[must_use]
    pub fn steps_from(&self, id: &str) -> Vec<(&str, &Edge)> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut steps: Vec<(&str, &Edge)> = self
            .graph
            .edges(idx)
            .map(|e| (self.graph[e.target()].as_str(), &self.edges[*e.weight()]))
            .collect();
        steps.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        steps
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a caller-supplied target to a node id
    ///
    /// Accepts a node id, a bare user id, or a raw organization name. The
    /// name part of an `org:` id is normalized before the lookup.
    #[must_use]
    pub fn resolve_id(&self, target: &str) -> Option<String> {
        let target = target.trim();
        if self.contains(target) {
            return Some(target.to_string());
        }
        if let Some(name) = target.strip_prefix(ORG_PREFIX) {
            return Some(NodeId::organization(name)).filter(|id| self.contains(id));
        }
        if let Some(user) = target.strip_prefix(PERSON_PREFIX) {
            return Some(NodeId::person(user)).filter(|id| self.contains(id));
        }
        [NodeId::person(target), NodeId::organization(target)]
            .into_iter()
            .find(|id| self.contains(id))
    }

    /// Resolve every node's image reference to a URL
    #[must_use]
    pub fn image_urls(&self, resolver: &dyn AvatarResolver) -> BTreeMap<String, String> {
        self.nodes
            .values()
            .filter_map(|n| {
                let url = resolver.resolve(n.image_ref.as_ref()?)?;
                Some((n.id.clone(), url))
            })
            .collect()
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph trust {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [style=rounded];\n\n");

        // Add nodes
        for node in self.nodes.values() {
            let shape = match node.kind {
                NodeKind::Person => "ellipse",
                NodeKind::Organization => "box",
            };
            let label = if node.review_count > 0 {
                format!("{}\\n{} review(s), {:.1}", escape(&node.display_name), node.review_count, node.aggregate_strength)
            } else {
                escape(&node.display_name)
            };
            dot.push_str(&format!("  \"{}\" [label=\"{}\", shape={}];\n", escape(&node.id), label, shape));
        }

        dot.push('\n');

        // Add edges
        for edge in &self.edges {
            let dir = if edge.provenance.kind.is_symmetric() { ", dir=both" } else { "" };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{} {:.1}\"{}];\n",
                escape(&edge.source),
                escape(&edge.target),
                edge.category,
                edge.strength,
                dir
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
