// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Referral path search
//!
//! Dijkstra over edge costs `1 / max(strength, epsilon)`: the cheapest path
//! is the most trusted one. Alternatives are found by re-running the search
//! with every edge of the already-found paths penalized. When the penalized
//! search still returns a known route, that route is penalized again, up to
//! [`MAX_REPEAT_PENALTIES`] times per alternative.

use crate::graph::GraphSnapshot;
use crate::types::{Edge, Hop, Path};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Floor applied to strengths before inverting them into costs
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Cost multiplier for edges already used by an earlier path
pub const DEFAULT_PENALTY_FACTOR: f64 = 1000.0;

/// Re-penalizations of a repeated route before giving up on an alternative
pub const MAX_REPEAT_PENALTIES: usize = 8;

/// Costs closer than this are treated as equal and tie-broken by node id
const COST_TOLERANCE: f64 = 1e-9;

/// Path search tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Strength floor for cost computation
    pub epsilon: f64,
    /// Multiplier applied to edges of already-found paths
    pub penalty_factor: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
        }
    }
}

/// Traversal cost of an edge with the given strength
#[must_use]
pub fn edge_cost(strength: f64, epsilon: f64) -> f64 {
    1.0 / strength.max(epsilon)
}

/// Find up to `max_paths` structurally distinct routes with default tuning
#[must_use]
pub fn find_paths(graph: &GraphSnapshot, source: &str, target: &str, max_paths: usize) -> Vec<Path> {
    find_paths_with(graph, source, target, max_paths, SearchParams::default())
}

/// Find up to `max_paths` structurally distinct routes
///
/// An unknown source or target, `source == target`, or an unreachable
/// target all give an empty list.
#[must_use]
pub fn find_paths_with(
    graph: &GraphSnapshot,
    source: &str,
    target: &str,
    max_paths: usize,
    params: SearchParams,
) -> Vec<Path> {
    if max_paths == 0 || source == target || !graph.contains(source) || !graph.contains(target) {
        return Vec::new();
    }

    let mut penalties: HashMap<String, f64> = HashMap::new();
    let mut found: Vec<Path> = Vec::new();
    let mut repeats = 0;

    while found.len() < max_paths {
        let Some(path) = shortest_path(graph, source, target, params, &penalties) else {
            break;
        };
        penalize(&mut penalties, &path, params.penalty_factor);

        if found.iter().any(|p| p.nodes == path.nodes) {
            repeats += 1;
            if repeats > MAX_REPEAT_PENALTIES || params.penalty_factor <= 1.0 {
                tracing::trace!("No further distinct route from {} to {}", source, target);
                break;
            }
            continue;
        }
        repeats = 0;
        found.push(path);
    }

    tracing::debug!("Found {} route(s) from {} to {}", found.len(), source, target);
    found
}

fn penalize(penalties: &mut HashMap<String, f64>, path: &Path, factor: f64) {
    for hop in &path.hops {
        let penalty = penalties.entry(hop.edge_id.clone()).or_insert(1.0);
        *penalty = (*penalty * factor).min(f64::MAX);
    }
}

/// State for Dijkstra priority queue
#[derive(Clone, Copy)]
struct State<'a> {
    cost: f64,
    node: &'a str,
}

impl PartialEq for State<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State<'_> {}

impl Ord for State<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; equal costs pop the smaller node id first
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for State<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn shortest_path(
    graph: &GraphSnapshot,
    source: &str,
    target: &str,
    params: SearchParams,
    penalties: &HashMap<String, f64>,
) -> Option<Path> {
    let mut dist: HashMap<&str, f64> = HashMap::new();
    let mut parent: HashMap<&str, (&str, &Edge)> = HashMap::new();
    let mut settled: HashSet<&str> = HashSet::new();
    let mut heap = BinaryHeap::new();

    let source = graph.get_node(source)?.id.as_str();
    dist.insert(source, 0.0);
    heap.push(State { cost: 0.0, node: source });

    while let Some(State { cost, node }) = heap.pop() {
        if !settled.insert(node) {
            continue;
        }
        if node == target {
            return Some(reconstruct(source, target, &parent, params.epsilon));
        }

        for (next, edge) in graph.steps_from(node) {
            if settled.contains(next) {
                continue;
            }
            let penalty = penalties.get(&edge.id).copied().unwrap_or(1.0);
            let next_cost = cost + edge_cost(edge.strength, params.epsilon) * penalty;
            let best = dist.get(next).copied().unwrap_or(f64::INFINITY);

            if next_cost < best - COST_TOLERANCE {
                dist.insert(next, next_cost);
                parent.insert(next, (node, edge));
                heap.push(State { cost: next_cost, node: next });
            } else if (next_cost - best).abs() <= COST_TOLERANCE {
                // Equal cost: prefer the predecessor with the smaller id
                let replace = parent
                    .get(next)
                    .map_or(true, |(prev, prev_edge)| (node, edge.id.as_str()) < (*prev, prev_edge.id.as_str()));
                if replace {
                    parent.insert(next, (node, edge));
                }
            }
        }
    }

    None
}

fn reconstruct(
    source: &str,
    target: &str,
    parent: &HashMap<&str, (&str, &Edge)>,
    epsilon: f64,
) -> Path {
    let mut hops = Vec::new();
    let mut current = target;
    while current != source {
        let Some(&(prev, edge)) = parent.get(current) else {
            break;
        };
        hops.push(Hop {
            from: prev.to_string(),
            to: current.to_string(),
            edge_id: edge.id.clone(),
            strength: edge.strength,
            category: edge.category,
            provenance: edge.provenance.kind,
        });
        current = prev;
    }
    hops.reverse();

    let mut nodes = Vec::with_capacity(hops.len() + 1);
    nodes.push(source.to_string());
    nodes.extend(hops.iter().map(|h| h.to.clone()));
    let cost = hops.iter().map(|h| edge_cost(h.strength, epsilon)).sum();

    Path { nodes, hops, cost }
}
