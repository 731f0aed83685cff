// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Engine façade over a [`RecordSource`]
//!
//! Each call fetches what it needs, builds a fresh [`GraphSnapshot`], and
//! drops it afterwards. Nothing is cached between calls.

use crate::builder::{ConnectionRecords, GraphBuilder, GraphInputs, RequesterRecords};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::GraphSnapshot;
use crate::pathfind;
use crate::rank;
use crate::source::{Directory, OrganizationRecord, RecordSource};
use crate::types::{CategoryCode, NodeId, RankedPath};
use std::collections::HashSet;

/// Trust graph and referral routing over one record source
pub struct TrustEngine<S: RecordSource> {
    source: S,
    config: EngineConfig,
}

impl<S: RecordSource> TrustEngine<S> {
    /// Create an engine with default tuning
    pub fn new(source: S) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    /// Create an engine with explicit tuning
    pub fn with_config(source: S, config: EngineConfig) -> Self {
        Self { source, config }
    }

    /// Active tuning
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying record source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Build the trust graph scoped to `user_id`
    ///
    /// `filter` keeps only review edges of one category; person nodes and
    /// connection edges are always present.
    pub fn build_trust_graph(&self, user_id: &str, filter: Option<CategoryCode>) -> Result<GraphSnapshot> {
        let inputs = self.gather(user_id)?;
        let directory = SourceDirectory { source: &self.source };
        GraphBuilder::new(&directory).with_filter(filter).build(inputs)
    }

    /// Ranked introduction routes from `user_id` to `target`
    ///
    /// `target` may be a node id, a bare user id, or an organization name. An
    /// unknown or unreachable target gives an empty list. `max_paths` defaults
    /// to the configured count and is capped at the configured limit.
    pub fn find_referral_routes(
        &self,
        user_id: &str,
        target: &str,
        max_paths: Option<usize>,
    ) -> Result<Vec<RankedPath>> {
        let graph = self.build_trust_graph(user_id, None)?;
        let Some(target_id) = graph.resolve_id(target) else {
            tracing::debug!("Target {} not in graph for {}", target, user_id);
            return Ok(Vec::new());
        };

        let requested = max_paths.unwrap_or(self.config.default_max_paths);
        let max_paths = requested.min(self.config.max_paths_limit);
        if requested > max_paths {
            tracing::debug!("Capping requested routes from {} to {}", requested, max_paths);
        }

        let paths = pathfind::find_paths_with(
            &graph,
            &NodeId::person(user_id),
            &target_id,
            max_paths,
            self.config.search,
        );
        Ok(rank::rank_with(paths, &self.config.ranking))
    }

    /// Fetch every record a graph build needs
    ///
    /// The requester's own evaluations and connection list are required; a
    /// single connection's evaluations are not.
    pub fn gather(&self, user_id: &str) -> Result<GraphInputs> {
        let evaluations = self
            .source
            .own_evaluations(user_id)
            .map_err(|reason| unavailable("evaluations", user_id, reason))?;
        let connections = self
            .source
            .active_connections(user_id)
            .map_err(|reason| unavailable("connections", user_id, reason))?;

        let (display_name, avatar_ref) = match self.source.user_profile(user_id) {
            Some((name, avatar)) => (Some(name), avatar),
            None => (None, None),
        };

        let mut fetched: HashSet<String> = HashSet::new();
        let connections = connections
            .into_iter()
            .map(|mut connection| {
                let other = connection.other_user_id.trim().to_string();
                connection.other_user_id.clone_from(&other);
                // duplicates, blanks and self-links are collapsed by the builder
                if other.is_empty() || other == user_id.trim() || !fetched.insert(other.clone()) {
                    return ConnectionRecords { connection, evaluations: None };
                }

                if connection.display_name.is_none() {
                    if let Some((name, avatar)) = self.source.user_profile(&other) {
                        connection.display_name = Some(name);
                        connection.avatar_ref = connection.avatar_ref.or(avatar);
                    }
                }
                let evaluations = match self.source.own_evaluations(&other) {
                    Ok(records) => Some(records),
                    Err(e) => {
                        tracing::warn!("Evaluations for connection {} unavailable: {}", other, e);
                        None
                    }
                };
                ConnectionRecords { connection, evaluations }
            })
            .collect();

        Ok(GraphInputs {
            requester: RequesterRecords {
                user_id: user_id.to_string(),
                display_name,
                avatar_ref,
                evaluations,
            },
            connections,
        })
    }
}

fn unavailable(source_name: &'static str, user_id: &str, reason: crate::error::SourceError) -> EngineError {
    tracing::warn!("{} unavailable for {}: {}", source_name, user_id, reason);
    EngineError::SourceUnavailable {
        source_name,
        user_id: user_id.to_string(),
        reason,
    }
}

/// Folds directory failures into "not found"
struct SourceDirectory<'s, S: RecordSource> {
    source: &'s S,
}

impl<S: RecordSource> Directory for SourceDirectory<'_, S> {
    fn lookup(&self, raw_name: &str) -> Option<OrganizationRecord> {
        match self.source.organization_directory(raw_name) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Directory lookup for {} failed: {}", raw_name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::resolver::RawRecord;
    use crate::source::Connection;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapSource {
        evaluations: HashMap<String, Vec<serde_json::Value>>,
        connections: HashMap<String, Vec<Connection>>,
        broken_evaluations: Vec<String>,
        broken_connections: bool,
        broken_directory: bool,
        fetched: RefCell<Vec<String>>,
    }

    impl RecordSource for MapSource {
        fn own_evaluations(&self, user_id: &str) -> std::result::Result<Vec<RawRecord>, SourceError> {
            self.fetched.borrow_mut().push(user_id.to_string());
            if self.broken_evaluations.iter().any(|u| u == user_id) {
                return Err(SourceError::Unavailable("down".into()));
            }
            Ok(self
                .evaluations
                .get(user_id)
                .map(|v| v.iter().cloned().map(RawRecord::from).collect())
                .unwrap_or_default())
        }

        fn active_connections(&self, user_id: &str) -> std::result::Result<Vec<Connection>, SourceError> {
            if self.broken_connections {
                return Err(SourceError::Unavailable("down".into()));
            }
            Ok(self.connections.get(user_id).cloned().unwrap_or_default())
        }

        fn organization_directory(
            &self,
            _name: &str,
        ) -> std::result::Result<Option<OrganizationRecord>, SourceError> {
            if self.broken_directory {
                return Err(SourceError::Malformed("bad payload".into()));
            }
            Ok(None)
        }
    }

    fn source() -> MapSource {
        let mut source = MapSource::default();
        source
            .connections
            .insert("alice".into(), vec![Connection::new("bob", 4.0), Connection::new("carol", 2.0)]);
        source.evaluations.insert(
            "bob".into(),
            vec![json!({ "companyName": "AcmeCorp", "relType": "partner", "rating": 5 })],
        );
        source.evaluations.insert(
            "carol".into(),
            vec![json!({ "companyName": "AcmeCorp", "relType": "friend", "rating": 1 })],
        );
        source
    }

    #[test]
    fn test_routes_ranked_best_first() {
        let engine = TrustEngine::new(source());
        let routes = engine.find_referral_routes("alice", "AcmeCorp", Some(3)).unwrap();

        assert_eq!(routes.len(), 2);
        assert!(routes[0].recommended);
        assert_eq!(routes[0].path.nodes, vec!["person:alice", "person:bob", "org:acmecorp"]);
        assert_eq!(routes[1].path.nodes[1], "person:carol");
    }

    #[test]
    fn test_unknown_target_is_empty() {
        let engine = TrustEngine::new(source());
        assert!(engine.find_referral_routes("alice", "Globex", None).unwrap().is_empty());
    }

    #[test]
    fn test_max_paths_capped_by_config() {
        let config = EngineConfig {
            max_paths_limit: 1,
            ..EngineConfig::default()
        };
        let engine = TrustEngine::with_config(source(), config);
        let routes = engine.find_referral_routes("alice", "org:acmecorp", Some(5)).unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_requester_failures_propagate() {
        let mut broken = source();
        broken.broken_connections = true;
        let err = TrustEngine::new(broken).build_trust_graph("alice", None).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { source_name: "connections", .. }));

        let mut broken = source();
        broken.broken_evaluations.push("alice".into());
        let err = TrustEngine::new(broken).build_trust_graph("alice", None).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { source_name: "evaluations", .. }));
    }

    #[test]
    fn test_connection_failures_degrade() {
        let mut partial = source();
        partial.broken_evaluations.push("carol".into());
        partial.broken_directory = true;

        let graph = TrustEngine::new(partial).build_trust_graph("alice", None).unwrap();
        let acme = graph.get_node("org:acmecorp").unwrap();
        assert_eq!(acme.reviewers.len(), 1);
        assert!(acme.synthetic);
        assert!(graph
            .diagnostics()
            .iter()
            .any(|d| d.subject == "person:carol" && d.reason == "source_unavailable:evaluations"));
    }

    #[test]
    fn test_each_connection_fetched_once() {
        let mut source = source();
        source.connections.insert(
            "alice".into(),
            vec![
                Connection::new(" bob ", 2.0),
                Connection::new("bob", 4.0),
                Connection::new("carol", 2.0),
                Connection::new("alice", 5.0),
                Connection::new("  ", 1.0),
            ],
        );
        let engine = TrustEngine::new(source);
        let inputs = engine.gather("alice").unwrap();

        assert_eq!(*engine.source().fetched.borrow(), vec!["alice", "bob", "carol"]);
        assert_eq!(inputs.connections[0].connection.other_user_id, "bob");
        assert!(inputs.connections[0].evaluations.is_some());

        // the duplicate still collapses to the strongest link
        let graph = engine.build_trust_graph("alice", None).unwrap();
        let link = graph
            .edges_from("person:alice")
            .into_iter()
            .find(|e| e.target == "person:bob")
            .unwrap();
        assert_eq!(link.strength, 4.0);
        assert_eq!(graph.get_node("org:acmecorp").unwrap().reviewers.len(), 2);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let engine = TrustEngine::new(source());
        let first = engine.find_referral_routes("alice", "AcmeCorp", Some(3)).unwrap();
        let second = engine.find_referral_routes("alice", "AcmeCorp", Some(3)).unwrap();
        assert_eq!(first, second);
    }
}
