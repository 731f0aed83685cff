// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Trustroute library - trust graph and referral routing engine
//!
//! This crate collects loosely-shaped relationship records (evaluations,
//! connections, directory entries), folds them into one weighted graph of
//! people and organizations, and ranks multi-hop introduction routes from a
//! requesting user to a target.
//!
//! The pipeline, leaf first:
//!
//! raw records → [`resolver`] → [`normalize`] → [`builder`] → [`merge`]
//! → [`graph::GraphSnapshot`] → [`pathfind`] → [`rank`]
//!
//! [`engine::TrustEngine`] wires the pipeline to a [`source::RecordSource`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod graph;
pub mod merge;
pub mod normalize;
pub mod pathfind;
pub mod rank;
pub mod resolver;
pub mod source;

pub use error::{EngineError, Result, SourceError};

/// Core data types shared by every stage of the engine
pub mod types {
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::fmt;

    /// Upper bound of the trust strength scale
    pub const MAX_STRENGTH: f64 = 5.0;
    /// Lower bound of the trust strength scale
    pub const MIN_STRENGTH: f64 = 0.0;

    /// Clamp a raw strength into `[MIN_STRENGTH, MAX_STRENGTH]`
    #[must_use]
    pub fn clamp_strength(value: f64) -> f64 {
        if value.is_nan() {
            return MIN_STRENGTH;
        }
        value.clamp(MIN_STRENGTH, MAX_STRENGTH)
    }

    // =========================================================================
    // Node Identity
    // =========================================================================

    /// Prefix of person node ids
    pub const PERSON_PREFIX: &str = "person:";
    /// Prefix of organization node ids
    pub const ORG_PREFIX: &str = "org:";

    /// Node id helpers
    pub struct NodeId;

    impl NodeId {
        /// Id of a person node: `person:<user id>`
        #[must_use]
        pub fn person(user_id: &str) -> String {
            format!("{PERSON_PREFIX}{}", user_id.trim())
        }

        /// Id of an organization node: `org:<canonical name>`
        #[must_use]
        pub fn organization(raw_name: &str) -> String {
            format!("{ORG_PREFIX}{}", crate::normalize::normalize(raw_name))
        }
    }

    /// Kind of vertex in the trust graph
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum NodeKind {
        /// A user of the platform
        Person,
        /// A company or other organization
        Organization,
    }

    /// Opaque reference handed to an external avatar/logo resolver
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ImageRef(pub String);

    // =========================================================================
    // Relationship Category
    // =========================================================================

    /// Known relationship classes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Category {
        /// No category recorded
        Unset,
        /// Loose acquaintance
        Acquaintance,
        /// Vendor or client relationship
        VendorClient,
        /// Business partner
        Partner,
        /// Investment target (or investor)
        InvestmentTarget,
        /// Shareholder
        Shareholder,
        /// Friend
        Friend,
    }

    impl Category {
        /// Every known category, in code order
        pub const ALL: [Self; 7] = [
            Self::Unset,
            Self::Acquaintance,
            Self::VendorClient,
            Self::Partner,
            Self::InvestmentTarget,
            Self::Shareholder,
            Self::Friend,
        ];

        /// Stable numeric code
        #[must_use]
        pub fn code(self) -> CategoryCode {
            CategoryCode(match self {
                Self::Unset => 0,
                Self::Acquaintance => 1,
                Self::VendorClient => 2,
                Self::Partner => 3,
                Self::InvestmentTarget => 4,
                Self::Shareholder => 5,
                Self::Friend => 6,
            })
        }

        /// Short machine label
        #[must_use]
        pub fn label(self) -> &'static str {
            match self {
                Self::Unset => "unset",
                Self::Acquaintance => "acquaintance",
                Self::VendorClient => "vendor_client",
                Self::Partner => "partner",
                Self::InvestmentTarget => "investment_target",
                Self::Shareholder => "shareholder",
                Self::Friend => "friend",
            }
        }
    }

    /// Category code as carried on edges
    ///
    /// Codes outside the known range are kept verbatim so that categories
    /// introduced upstream later are not folded into [`Category::Unset`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CategoryCode(pub i64);

    impl CategoryCode {
        /// Code assigned when nothing could be resolved
        pub const UNASSIGNED: Self = Self(0);

        /// The known category behind this code, if any
        #[must_use]
        pub fn known(self) -> Option<Category> {
            Category::ALL.into_iter().find(|c| c.code() == self)
        }
    }

    impl From<Category> for CategoryCode {
        fn from(category: Category) -> Self {
            category.code()
        }
    }

    impl fmt::Display for CategoryCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.known() {
                Some(c) => f.write_str(c.label()),
                None => write!(f, "code:{}", self.0),
            }
        }
    }

    // =========================================================================
    // Edge (Relationship)
    // =========================================================================

    /// Where an edge came from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ProvenanceKind {
        /// The requesting user's own evaluation
        OwnReview,
        /// An evaluation written by one of the requesting user's connections
        ConnectionReview,
        /// An explicit person-to-person connection
        Connection,
    }

    impl ProvenanceKind {
        /// Whether this edge may be walked in both directions
        #[must_use]
        pub fn is_symmetric(self) -> bool {
            matches!(self, Self::Connection)
        }
    }

    /// Attribution of an edge to its source record
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Provenance {
        /// Which collection produced the edge
        pub kind: ProvenanceKind,
        /// Person id of the contributing reviewer / connection holder
        pub reviewer_id: String,
        /// Upstream record id, when the record carried one
        pub record_id: Option<String>,
    }

    /// Directed relation from a reviewer or connection holder to a target
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Edge {
        /// Content-hash ID: edge:<hash of (source, target, provenance)>
        pub id: String,
        /// Source node ID
        pub source: String,
        /// Target node ID
        pub target: String,
        /// Relationship class, used for filtering only
        pub category: CategoryCode,
        /// Trust magnitude in `[MIN_STRENGTH, MAX_STRENGTH]`
        pub strength: f64,
        /// Source record attribution
        pub provenance: Provenance,
    }

    impl Edge {
        /// Build an edge with a deterministic id
        #[must_use]
        pub fn new(
            source: impl Into<String>,
            target: impl Into<String>,
            category: CategoryCode,
            strength: f64,
            provenance: Provenance,
        ) -> Self {
            let source = source.into();
            let target = target.into();
            let id = Self::generate_id(&source, &target, &provenance);
            Self {
                id,
                source,
                target,
                category,
                strength: clamp_strength(strength),
                provenance,
            }
        }

        /// Generate a deterministic ID for an edge
        #[must_use]
        pub fn generate_id(source: &str, target: &str, provenance: &Provenance) -> String {
            let mut hasher = Sha256::new();
            hasher.update(source.as_bytes());
            hasher.update([0]);
            hasher.update(target.as_bytes());
            hasher.update([0]);
            hasher.update(format!("{:?}", provenance.kind).as_bytes());
            hasher.update(provenance.reviewer_id.as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("edge:{}", &hash[..16])
        }
    }

    // =========================================================================
    // Node
    // =========================================================================

    /// One reviewer's contribution to a merged organization node
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReviewerContribution {
        /// Person id of the reviewer
        pub reviewer_id: String,
        /// Strength the reviewer gave
        pub strength: f64,
        /// Category the reviewer recorded
        pub category: CategoryCode,
    }

    /// Fields copied from an organization directory record
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DirectoryInfo {
        /// Name the directory registers the organization under
        pub registered_name: String,
        /// Directory's preferred display name, when it has one
        pub display_name: Option<String>,
        /// Industry classification
        pub industry: Option<String>,
        /// Public website
        pub website: Option<String>,
        /// Location / headquarters
        pub location: Option<String>,
    }

    /// A person or organization vertex
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Node {
        /// Canonical id (see [`NodeId`])
        pub id: String,
        /// Person or organization
        pub kind: NodeKind,
        /// Name as first seen, original casing
        pub display_name: String,
        /// Avatar or logo reference, never decoded here
        pub image_ref: Option<ImageRef>,
        /// Number of distinct reviewers
        pub review_count: usize,
        /// Mean strength over all reviewers
        pub aggregate_strength: f64,
        /// Per-reviewer attribution
        #[serde(default)]
        pub reviewers: Vec<ReviewerContribution>,
        /// Directory data, absent for synthetic nodes and people
        pub directory: Option<DirectoryInfo>,
        /// True when no directory record backed this organization
        #[serde(default)]
        pub synthetic: bool,
    }

    impl Node {
        /// A person node with no review data
        #[must_use]
        pub fn person(user_id: &str, display_name: impl Into<String>, image_ref: Option<ImageRef>) -> Self {
            Self {
                id: NodeId::person(user_id),
                kind: NodeKind::Person,
                display_name: display_name.into(),
                image_ref,
                review_count: 0,
                aggregate_strength: 0.0,
                reviewers: Vec::new(),
                directory: None,
                synthetic: false,
            }
        }

        /// A bare organization node keyed by its normalized name
        #[must_use]
        pub fn organization(raw_name: &str) -> Self {
            Self {
                id: NodeId::organization(raw_name),
                kind: NodeKind::Organization,
                display_name: crate::normalize::display_name(raw_name),
                image_ref: None,
                review_count: 0,
                aggregate_strength: 0.0,
                reviewers: Vec::new(),
                directory: None,
                synthetic: true,
            }
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// A degrade-and-continue decision taken while building a graph
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Diagnostic {
        /// What the diagnostic is about (record id, user id, organization)
        pub subject: String,
        /// Machine-readable reason
        pub reason: String,
    }

    impl Diagnostic {
        /// Create a diagnostic
        #[must_use]
        pub fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
            Self {
                subject: subject.into(),
                reason: reason.into(),
            }
        }
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// One traversed edge of a path
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Hop {
        /// Node the hop leaves
        pub from: String,
        /// Node the hop reaches
        pub to: String,
        /// Edge id walked
        pub edge_id: String,
        /// Edge strength
        pub strength: f64,
        /// Edge category
        pub category: CategoryCode,
        /// Edge provenance kind
        pub provenance: ProvenanceKind,
    }

    /// A route found by the path finder, before ranking
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Path {
        /// Node ids from source to target
        pub nodes: Vec<String>,
        /// Edges walked, `nodes.len() - 1` of them
        pub hops: Vec<Hop>,
        /// Unpenalized traversal cost
        pub cost: f64,
    }

    impl Path {
        /// Number of edges in the path
        #[must_use]
        pub fn hop_count(&self) -> usize {
            self.hops.len()
        }
    }

    /// A path annotated with ranking scores
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RankedPath {
        /// 1-based position after ranking
        pub rank: usize,
        /// True for the top route only
        pub recommended: bool,
        /// The underlying route
        pub path: Path,
        /// Number of edges
        pub hop_count: usize,
        /// Mean edge strength
        pub total_strength: f64,
        /// `best hop count / hop count`, in `(0, 1]`
        pub efficiency: f64,
        /// Heuristic success estimate in `[0, 1]`
        pub success_probability: f64,
        /// Heuristic elapsed time estimate
        pub estimated_days: u32,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::engine::TrustEngine;
    pub use crate::error::{EngineError, Result, SourceError};
    pub use crate::graph::GraphSnapshot;
    pub use crate::source::RecordSource;
    pub use crate::types::*;
}
