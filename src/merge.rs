// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Organization deduplication with multi-reviewer aggregation
//!
//! Review candidates are offered in arrival order (the requesting user's own
//! reviews first, then each connection's in connection-list order). The first
//! candidate for a canonical id seeds the node's display metadata; later ones
//! only add to its reviewer list.

use crate::source::Directory;
use crate::types::{
    CategoryCode, DirectoryInfo, Edge, ImageRef, Node, NodeId, Provenance, ProvenanceKind,
    ReviewerContribution, Diagnostic,
};
use std::collections::HashMap;

/// A resolved review, not yet merged
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCandidate {
    /// Person id of the reviewer
    pub reviewer_id: String,
    /// Organization name as written in the record
    pub raw_name: String,
    /// Resolved category
    pub category: CategoryCode,
    /// Resolved strength
    pub strength: f64,
    /// Own review or a connection's review
    pub kind: ProvenanceKind,
    /// Upstream record id
    pub record_id: Option<String>,
    /// Logo reference carried on the record
    pub logo_ref: Option<ImageRef>,
}

/// One merged organization and the edges pointing at it
#[derive(Debug, Clone, PartialEq)]
pub struct MergedOrganization {
    /// The organization node
    pub node: Node,
    /// One edge per contributing reviewer
    pub edges: Vec<Edge>,
}

/// What happened to an offered candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Dropped by the category filter
    Filtered,
    /// Created a new organization node
    Seeded,
    /// Added a reviewer to an existing node
    Contributed,
    /// The reviewer had already contributed to this node
    DuplicateReviewer,
}

/// Folds review candidates into one node per canonical organization id
pub struct OrganizationMerger<'d> {
    directory: &'d dyn Directory,
    filter: Option<CategoryCode>,
    merged: Vec<MergedOrganization>,
    index: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'d> OrganizationMerger<'d> {
    /// Create a merger; `filter` keeps only candidates of that category
    #[must_use]
    pub fn new(directory: &'d dyn Directory, filter: Option<CategoryCode>) -> Self {
        Self {
            directory,
            filter,
            merged: Vec::new(),
            index: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Offer one candidate
    pub fn offer(&mut self, candidate: ReviewCandidate) -> MergeOutcome {
        if self.filter.is_some_and(|wanted| wanted != candidate.category) {
            tracing::trace!(
                "Filtered review by {} of {} ({})",
                candidate.reviewer_id,
                candidate.raw_name,
                candidate.category
            );
            return MergeOutcome::Filtered;
        }

        let id = NodeId::organization(&candidate.raw_name);
        let (position, outcome) = match self.index.get(&id) {
            Some(&position) => (position, MergeOutcome::Contributed),
            None => {
                let node = self.seed_node(&id, &candidate);
                self.merged.push(MergedOrganization { node, edges: Vec::new() });
                self.index.insert(id.clone(), self.merged.len() - 1);
                (self.merged.len() - 1, MergeOutcome::Seeded)
            }
        };

        let entry = &mut self.merged[position];
        if entry.node.reviewers.iter().any(|r| r.reviewer_id == candidate.reviewer_id) {
            self.diagnostics.push(Diagnostic::new(
                id,
                format!("duplicate_review:{}", candidate.reviewer_id),
            ));
            return MergeOutcome::DuplicateReviewer;
        }

        entry.node.reviewers.push(ReviewerContribution {
            reviewer_id: candidate.reviewer_id.clone(),
            strength: candidate.strength,
            category: candidate.category,
        });
        refresh_aggregates(&mut entry.node);
        entry.edges.push(Edge::new(
            candidate.reviewer_id.clone(),
            id,
            candidate.category,
            candidate.strength,
            Provenance {
                kind: candidate.kind,
                reviewer_id: candidate.reviewer_id,
                record_id: candidate.record_id,
            },
        ));
        outcome
    }

    fn seed_node(&mut self, id: &str, candidate: &ReviewCandidate) -> Node {
        let mut node = Node::organization(&candidate.raw_name);
        debug_assert_eq!(node.id, id);

        match self.directory.lookup(&candidate.raw_name) {
            Some(record) => {
                node.synthetic = false;
                node.image_ref = record.logo_ref.or_else(|| candidate.logo_ref.clone());
                node.directory = Some(DirectoryInfo {
                    registered_name: record.name,
                    display_name: record.display_name,
                    industry: record.industry,
                    website: record.website,
                    location: record.location,
                });
            }
            None => {
                tracing::debug!("No directory entry for {}, using synthetic node", candidate.raw_name);
                node.image_ref = candidate.logo_ref.clone();
                self.diagnostics
                    .push(Diagnostic::new(id, "synthetic_organization"));
            }
        }
        node
    }

    /// Number of distinct organizations so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Whether nothing has been merged yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Merged organizations in seeding order, plus diagnostics
    #[must_use]
    pub fn finish(self) -> (Vec<MergedOrganization>, Vec<Diagnostic>) {
        (self.merged, self.diagnostics)
    }
}

#[allow(clippy::cast_precision_loss)]
fn refresh_aggregates(node: &mut Node) {
    node.review_count = node.reviewers.len();
    node.aggregate_strength = if node.reviewers.is_empty() {
        0.0
    } else {
        node.reviewers.iter().map(|r| r.strength).sum::<f64>() / node.reviewers.len() as f64
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EmptyDirectory, OrganizationRecord};
    use crate::types::Category;

    fn candidate(reviewer: &str, name: &str, category: Category, strength: f64) -> ReviewCandidate {
        ReviewCandidate {
            reviewer_id: NodeId::person(reviewer),
            raw_name: name.into(),
            category: category.code(),
            strength,
            kind: ProvenanceKind::ConnectionReview,
            record_id: None,
            logo_ref: None,
        }
    }

    #[test]
    fn test_same_canonical_name_merges_with_both_reviewers() {
        let mut merger = OrganizationMerger::new(&EmptyDirectory, None);
        assert_eq!(merger.offer(candidate("alice", "Acme Inc.", Category::Partner, 4.0)), MergeOutcome::Seeded);
        assert_eq!(merger.offer(candidate("bob", "acme inc", Category::Friend, 2.0)), MergeOutcome::Contributed);

        let (merged, _) = merger.finish();
        assert_eq!(merged.len(), 1);
        let org = &merged[0];
        assert_eq!(org.node.id, "org:acme");
        assert_eq!(org.node.reviewers.len(), 2);
        assert_eq!(org.node.review_count, 2);
        assert!((org.node.aggregate_strength - 3.0).abs() < 1e-9);
        assert_eq!(org.edges.len(), 2);
    }

    #[test]
    fn test_first_arrival_keeps_display_name() {
        let mut merger = OrganizationMerger::new(&EmptyDirectory, None);
        merger.offer(candidate("alice", "ACME inc", Category::Partner, 4.0));
        merger.offer(candidate("bob", "Acme Inc.", Category::Partner, 4.0));

        let (merged, _) = merger.finish();
        assert_eq!(merged[0].node.display_name, "ACME inc");
    }

    #[test]
    fn test_filter_applies_before_merge() {
        let mut merger = OrganizationMerger::new(&EmptyDirectory, Some(Category::InvestmentTarget.code()));
        assert_eq!(merger.offer(candidate("alice", "Acme", Category::Partner, 4.0)), MergeOutcome::Filtered);
        merger.offer(candidate("bob", "Acme", Category::InvestmentTarget, 3.0));

        let (merged, _) = merger.finish();
        assert_eq!(merged.len(), 1);
        let reviewers: Vec<_> = merged[0].node.reviewers.iter().map(|r| r.reviewer_id.as_str()).collect();
        assert_eq!(reviewers, vec!["person:bob"]);
    }

    #[test]
    fn test_duplicate_reviewer_dropped_with_diagnostic() {
        let mut merger = OrganizationMerger::new(&EmptyDirectory, None);
        merger.offer(candidate("alice", "Acme", Category::Partner, 4.0));
        assert_eq!(
            merger.offer(candidate("alice", "ACME Inc", Category::Friend, 1.0)),
            MergeOutcome::DuplicateReviewer
        );

        let (merged, diagnostics) = merger.finish();
        assert_eq!(merged[0].node.reviewers.len(), 1);
        assert_eq!(merged[0].node.reviewers[0].strength, 4.0);
        assert!(diagnostics.iter().any(|d| d.reason == "duplicate_review:person:alice"));
    }

    #[test]
    fn test_directory_seeds_metadata() {
        let mut directory = HashMap::new();
        directory.insert(
            "acme".to_string(),
            OrganizationRecord {
                name: "Acme Incorporated".into(),
                display_name: Some("ACME".into()),
                logo_ref: Some(ImageRef("logo-acme".into())),
                industry: Some("Anvils".into()),
                ..OrganizationRecord::default()
            },
        );
        let mut merger = OrganizationMerger::new(&directory, None);
        merger.offer(candidate("alice", "Acme Inc.", Category::Partner, 4.0));
        merger.offer(candidate("bob", "Globex", Category::Partner, 4.0));

        let (merged, diagnostics) = merger.finish();
        let acme = &merged[0].node;
        assert!(!acme.synthetic);
        assert_eq!(acme.image_ref, Some(ImageRef("logo-acme".into())));
        let info = acme.directory.as_ref().unwrap();
        assert_eq!(info.industry.as_deref(), Some("Anvils"));
        assert_eq!(info.registered_name, "Acme Incorporated");
        assert_eq!(info.display_name.as_deref(), Some("ACME"));
        // the node keeps the first-arrival name
        assert_eq!(acme.display_name, "Acme Inc.");

        let globex = &merged[1].node;
        assert!(globex.synthetic);
        assert!(globex.directory.is_none());
        assert!(diagnostics
            .iter()
            .any(|d| d.subject == "org:globex" && d.reason == "synthetic_organization"));
    }
}
