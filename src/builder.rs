// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph construction from fetched records
//!
//! The builder is pure: every record it needs has already been fetched into
//! [`GraphInputs`]. Directory lookups go through a [`Directory`] whose
//! failures have been folded into "not found".

use crate::error::Result;
use crate::graph::GraphSnapshot;
use crate::merge::{OrganizationMerger, ReviewCandidate};
use crate::resolver::{self, RawRecord};
use crate::source::{Connection, Directory};
use crate::types::{
    clamp_strength, Category, CategoryCode, Diagnostic, Edge, ImageRef, Node, NodeId, Provenance,
    ProvenanceKind,
};
use std::collections::HashMap;

/// The requesting user and their own evaluations
#[derive(Debug, Clone, Default)]
pub struct RequesterRecords {
    /// Requesting user id
    pub user_id: String,
    /// Display name, defaults to the user id
    pub display_name: Option<String>,
    /// Avatar reference
    pub avatar_ref: Option<ImageRef>,
    /// Raw evaluation records
    pub evaluations: Vec<RawRecord>,
}

/// One connection and that person's evaluations
#[derive(Debug, Clone)]
pub struct ConnectionRecords {
    /// The connection
    pub connection: Connection,
    /// Their evaluations; `None` when the fetch failed
    pub evaluations: Option<Vec<RawRecord>>,
}

/// Everything the builder consumes for one request
#[derive(Debug, Clone, Default)]
pub struct GraphInputs {
    /// The requesting user
    pub requester: RequesterRecords,
    /// First-degree connections, in connection-list order
    pub connections: Vec<ConnectionRecords>,
}

/// Builds a [`GraphSnapshot`] scoped to one requesting user
pub struct GraphBuilder<'d> {
    directory: &'d dyn Directory,
    filter: Option<CategoryCode>,
}

impl<'d> GraphBuilder<'d> {
    /// Create a builder over a directory
    #[must_use]
    pub fn new(directory: &'d dyn Directory) -> Self {
        Self { directory, filter: None }
    }

    /// Keep only review edges of one category
    #[must_use]
    pub fn with_filter(mut self, filter: Option<CategoryCode>) -> Self {
        self.filter = filter;
        self
    }

    /// Build the snapshot
    ///
    /// Malformed records degrade into diagnostics. The only error is a broken
    /// node-id invariant, which indicates a defect rather than bad input.
    pub fn build(&self, inputs: GraphInputs) -> Result<GraphSnapshot> {
        let GraphInputs { requester, connections } = inputs;
        let requester_id = NodeId::person(&requester.user_id);
        let mut snapshot = GraphSnapshot::new();
        let mut diagnostics = Vec::new();

        snapshot.add_node(Node::person(
            &requester.user_id,
            requester.display_name.clone().unwrap_or_else(|| requester.user_id.clone()),
            requester.avatar_ref.clone(),
        ))?;

        let connections = collapse_connections(&requester.user_id, connections, &mut diagnostics);
        let mut person_edges = Vec::with_capacity(connections.len());
        for entry in &connections {
            let conn = &entry.connection;
            snapshot.add_node(Node::person(
                &conn.other_user_id,
                conn.display_name.clone().unwrap_or_else(|| conn.other_user_id.clone()),
                conn.avatar_ref.clone(),
            ))?;
            person_edges.push(Edge::new(
                requester_id.clone(),
                NodeId::person(&conn.other_user_id),
                Category::Unset.code(),
                conn.connection_strength,
                Provenance {
                    kind: ProvenanceKind::Connection,
                    reviewer_id: requester_id.clone(),
                    record_id: None,
                },
            ));
        }

        // Own reviews first, then each connection's in list order
        let mut merger = OrganizationMerger::new(self.directory, self.filter);
        offer_reviews(
            &mut merger,
            &requester_id,
            ProvenanceKind::OwnReview,
            &requester.evaluations,
            &mut diagnostics,
        );
        for entry in &connections {
            let reviewer_id = NodeId::person(&entry.connection.other_user_id);
            match &entry.evaluations {
                Some(records) => offer_reviews(
                    &mut merger,
                    &reviewer_id,
                    ProvenanceKind::ConnectionReview,
                    records,
                    &mut diagnostics,
                ),
                None => {
                    diagnostics.push(Diagnostic::new(reviewer_id, "source_unavailable:evaluations"));
                }
            }
        }

        let (organizations, merge_diagnostics) = merger.finish();
        diagnostics.extend(merge_diagnostics);

        for org in &organizations {
            snapshot.add_node(org.node.clone())?;
        }
        for edge in person_edges {
            snapshot.add_edge(edge)?;
        }
        for edge in organizations.into_iter().flat_map(|org| org.edges) {
            snapshot.add_edge(edge)?;
        }
        for diagnostic in diagnostics {
            snapshot.push_diagnostic(diagnostic);
        }

        tracing::debug!(
            "Built trust graph for {}: {} nodes, {} edges, {} diagnostics",
            requester_id,
            snapshot.node_count(),
            snapshot.edge_count(),
            snapshot.diagnostics().len()
        );
        Ok(snapshot)
    }
}

/// Collapse duplicate connection records to one logical edge per person
///
/// The first record fixes the position; strength is the strongest recorded.
fn collapse_connections(
    requester: &str,
    connections: Vec<ConnectionRecords>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ConnectionRecords> {
    let mut collapsed: Vec<ConnectionRecords> = Vec::with_capacity(connections.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for mut entry in connections {
        let other = entry.connection.other_user_id.trim().to_string();
        if other.is_empty() {
            diagnostics.push(Diagnostic::new(NodeId::person(requester), "connection_without_user"));
            continue;
        }
        if other == requester.trim() {
            diagnostics.push(Diagnostic::new(NodeId::person(requester), "self_connection"));
            continue;
        }
        entry.connection.other_user_id = other.clone();
        entry.connection.connection_strength = clamp_strength(entry.connection.connection_strength);

        match seen.get(&other) {
            Some(&position) => {
                let kept = &mut collapsed[position];
                kept.connection.connection_strength = kept
                    .connection
                    .connection_strength
                    .max(entry.connection.connection_strength);
                if kept.connection.display_name.is_none() {
                    kept.connection.display_name = entry.connection.display_name;
                }
                if kept.connection.avatar_ref.is_none() {
                    kept.connection.avatar_ref = entry.connection.avatar_ref;
                }
                if kept.evaluations.is_none() {
                    kept.evaluations = entry.evaluations;
                }
                diagnostics.push(Diagnostic::new(NodeId::person(&other), "duplicate_connection"));
            }
            None => {
                seen.insert(other, collapsed.len());
                collapsed.push(entry);
            }
        }
    }
    collapsed
}

fn offer_reviews(
    merger: &mut OrganizationMerger<'_>,
    reviewer_id: &str,
    kind: ProvenanceKind,
    records: &[RawRecord],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (position, record) in records.iter().enumerate() {
        let record_id = resolver::resolve_record_id(record);
        let subject = record_id
            .clone()
            .unwrap_or_else(|| format!("{reviewer_id}#{position}"));

        let name = resolver::resolve_organization_name(record);
        let Some(raw_name) = name.value else {
            diagnostics.push(Diagnostic::new(subject, format!("missing_organization;{}", name.reason)));
            continue;
        };

        let category = resolver::resolve_category(record);
        if !category.is_match() {
            tracing::debug!("Category unresolved for {}: {}", subject, category.reason);
            diagnostics.push(Diagnostic::new(subject.clone(), format!("category;{}", category.reason)));
        }
        let strength = resolver::resolve_strength(record);
        if !strength.is_match() {
            diagnostics.push(Diagnostic::new(subject.clone(), format!("strength;{}", strength.reason)));
        }

        merger.offer(ReviewCandidate {
            reviewer_id: reviewer_id.to_string(),
            raw_name,
            category: category.value,
            strength: strength.value,
            kind,
            record_id,
            logo_ref: resolver::resolve_logo_ref(record).map(ImageRef),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EmptyDirectory;
    use crate::types::NodeKind;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<RawRecord> {
        values.into_iter().map(RawRecord::from).collect()
    }

    fn inputs() -> GraphInputs {
        GraphInputs {
            requester: RequesterRecords {
                user_id: "alice".into(),
                display_name: Some("Alice".into()),
                avatar_ref: None,
                evaluations: records(vec![
                    json!({ "id": "ev-1", "companyName": "Acme Inc.", "relType": "partner", "rating": 4 }),
                    json!({ "id": "ev-2", "rating": 2 }),
                ]),
            },
            connections: vec![
                ConnectionRecords {
                    connection: Connection::new("bob", 4.0),
                    evaluations: Some(records(vec![
                        json!({ "company": { "name": "acme inc" }, "relationship": 3, "score": "5" }),
                        json!({ "companyName": "Globex", "relType": "投資家", "rating": 3 }),
                    ])),
                },
                ConnectionRecords {
                    connection: Connection::new("carol", 2.0),
                    evaluations: None,
                },
            ],
        }
    }

    #[test]
    fn test_build_scoped_graph() {
        let graph = GraphBuilder::new(&EmptyDirectory).build(inputs()).unwrap();

        assert_eq!(graph.nodes_of_kind(NodeKind::Person).count(), 3);
        assert_eq!(graph.nodes_of_kind(NodeKind::Organization).count(), 2);

        let acme = graph.get_node("org:acme").unwrap();
        assert_eq!(acme.display_name, "Acme Inc.");
        assert_eq!(acme.reviewers.len(), 2);
        assert_eq!(acme.reviewers[0].reviewer_id, "person:alice");
        assert_eq!(acme.reviewers[1].reviewer_id, "person:bob");

        // 2 connection edges + 3 review edges
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn test_bad_records_degrade_into_diagnostics() {
        let graph = GraphBuilder::new(&EmptyDirectory).build(inputs()).unwrap();
        let reasons: Vec<_> = graph
            .diagnostics()
            .iter()
            .map(|d| (d.subject.as_str(), d.reason.as_str()))
            .collect();

        assert!(reasons.iter().any(|(s, r)| *s == "ev-2" && r.starts_with("missing_organization")));
        assert!(reasons.contains(&("person:carol", "source_unavailable:evaluations")));
        assert!(reasons.contains(&("org:globex", "synthetic_organization")));
    }

    #[test]
    fn test_own_review_provenance_and_record_id() {
        let graph = GraphBuilder::new(&EmptyDirectory).build(inputs()).unwrap();
        let own = graph
            .edges()
            .iter()
            .find(|e| e.provenance.kind == ProvenanceKind::OwnReview)
            .unwrap();
        assert_eq!(own.source, "person:alice");
        assert_eq!(own.target, "org:acme");
        assert_eq!(own.provenance.record_id.as_deref(), Some("ev-1"));
        assert_eq!(own.strength, 4.0);
    }

    #[test]
    fn test_filter_keeps_connections() {
        let graph = GraphBuilder::new(&EmptyDirectory)
            .with_filter(Some(Category::InvestmentTarget.code()))
            .build(inputs())
            .unwrap();

        assert!(graph.get_node("org:acme").is_none());
        assert!(graph.get_node("org:globex").is_some());
        assert_eq!(graph.nodes_of_kind(NodeKind::Person).count(), 3);
    }

    #[test]
    fn test_duplicate_and_self_connections_collapse() {
        let mut input = inputs();
        input.connections.push(ConnectionRecords {
            connection: Connection::new(" bob ", 5.0),
            evaluations: Some(vec![]),
        });
        input.connections.push(ConnectionRecords {
            connection: Connection::new("alice", 5.0),
            evaluations: Some(vec![]),
        });

        let graph = GraphBuilder::new(&EmptyDirectory).build(input).unwrap();
        let to_bob: Vec<_> = graph.edges_to("person:bob");
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].strength, 5.0);
        assert!(graph.diagnostics().iter().any(|d| d.reason == "self_connection"));
        assert!(graph.diagnostics().iter().any(|d| d.reason == "duplicate_connection"));
    }
}
