// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! In-memory record source loaded from JSON
//!
//! ```json
//! {
//!   "users": {
//!     "alice": { "display_name": "Alice", "connections": [{ "other_user_id": "bob", "connection_strength": 4 }] },
//!     "bob": { "evaluations": [{ "companyName": "Acme", "relType": "partner", "rating": 5 }] }
//!   },
//!   "directory": [{ "name": "Acme Inc.", "industry": "Anvils" }],
//!   "unavailable": ["evaluations:carol"]
//! }
//! ```
//!
//! Connections are symmetric: listing bob under alice also connects bob to
//! alice. Entries in `unavailable` make the matching call fail, which is how
//! tests exercise degraded sources. They take the form `evaluations:<user>`,
//! `connections:<user>` or `directory`.

use crate::error::SourceError;
use crate::normalize;
use crate::resolver::RawRecord;
use crate::source::{Connection, OrganizationRecord, RecordSource};
use crate::types::ImageRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// One user in a fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureUser {
    /// Display name
    pub display_name: Option<String>,
    /// Avatar reference
    pub avatar_ref: Option<ImageRef>,
    /// Raw evaluation records written by this user
    pub evaluations: Vec<RawRecord>,
    /// Connections declared by this user
    pub connections: Vec<Connection>,
}

/// A [`RecordSource`] backed by an in-memory fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSource {
    /// Users by id
    pub users: BTreeMap<String, FixtureUser>,
    /// Organization directory
    pub directory: Vec<OrganizationRecord>,
    /// Calls that should fail
    pub unavailable: Vec<String>,
}

impl FixtureSource {
    /// Parse a fixture from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))
    }

    /// Parse a fixture from a reader
    pub fn from_reader(reader: impl Read) -> Result<Self, SourceError> {
        serde_json::from_reader(reader).map_err(|e| SourceError::Malformed(e.to_string()))
    }

    fn check(&self, key: &str) -> Result<(), SourceError> {
        if self.unavailable.iter().any(|u| u == key) {
            return Err(SourceError::Unavailable(format!("fixture marks {key} unavailable")));
        }
        Ok(())
    }
}

impl RecordSource for FixtureSource {
    fn own_evaluations(&self, user_id: &str) -> Result<Vec<RawRecord>, SourceError> {
        self.check(&format!("evaluations:{user_id}"))?;
        Ok(self
            .users
            .get(user_id)
            .map(|u| u.evaluations.clone())
            .unwrap_or_default())
    }

    fn active_connections(&self, user_id: &str) -> Result<Vec<Connection>, SourceError> {
        self.check(&format!("connections:{user_id}"))?;

        let mut connections: Vec<Connection> = self
            .users
            .get(user_id)
            .map(|u| u.connections.clone())
            .unwrap_or_default();

        // Reverse direction of connections declared by others
        for (other_id, other) in &self.users {
            if other_id == user_id || connections.iter().any(|c| &c.other_user_id == other_id) {
                continue;
            }
            if let Some(declared) = other.connections.iter().find(|c| c.other_user_id == user_id) {
                connections.push(Connection::new(other_id.clone(), declared.connection_strength));
            }
        }
        Ok(connections)
    }

    fn organization_directory(&self, name: &str) -> Result<Option<OrganizationRecord>, SourceError> {
        self.check("directory")?;
        let wanted = normalize::normalize(name);
        Ok(self
            .directory
            .iter()
            .find(|record| normalize::normalize(&record.name) == wanted)
            .cloned())
    }

    fn user_profile(&self, user_id: &str) -> Option<(String, Option<ImageRef>)> {
        let user = self.users.get(user_id)?;
        let name = user.display_name.clone().unwrap_or_else(|| user_id.to_string());
        Some((name, user.avatar_ref.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "users": {
            "alice": {
                "display_name": "Alice",
                "connections": [{ "other_user_id": "bob", "connection_strength": 4 }]
            },
            "bob": {
                "evaluations": [{ "companyName": "Acme Inc.", "relType": "partner", "rating": 5 }]
            },
            "carol": {
                "connections": [{ "other_user_id": "alice", "connection_strength": 2 }]
            }
        },
        "directory": [{ "name": "ACME Incorporated", "industry": "Anvils" }],
        "unavailable": ["evaluations:carol"]
    }"#;

    #[test]
    fn test_connections_are_symmetric() {
        let source = FixtureSource::from_json_str(FIXTURE).unwrap();

        let alice: Vec<_> = source
            .active_connections("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.other_user_id)
            .collect();
        assert_eq!(alice, vec!["bob", "carol"]);

        let bob = source.active_connections("bob").unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].other_user_id, "alice");
        assert_eq!(bob[0].connection_strength, 4.0);
    }

    #[test]
    fn test_directory_matches_canonical_name() {
        let source = FixtureSource::from_json_str(FIXTURE).unwrap();
        let record = source.organization_directory("acme inc").unwrap().unwrap();
        assert_eq!(record.industry.as_deref(), Some("Anvils"));
        assert!(source.organization_directory("Globex").unwrap().is_none());
    }

    #[test]
    fn test_unavailable_entries_fail() {
        let source = FixtureSource::from_json_str(FIXTURE).unwrap();
        assert!(matches!(
            source.own_evaluations("carol"),
            Err(SourceError::Unavailable(_))
        ));
        assert_eq!(source.own_evaluations("bob").unwrap().len(), 1);
        assert!(source.own_evaluations("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_profile_falls_back_to_id() {
        let source = FixtureSource::from_json_str(FIXTURE).unwrap();
        assert_eq!(source.user_profile("alice").unwrap().0, "Alice");
        assert_eq!(source.user_profile("bob").unwrap().0, "bob");
        assert!(source.user_profile("zed").is_none());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            FixtureSource::from_json_str("{ \"users\": 3 }"),
            Err(SourceError::Malformed(_))
        ));
    }
}
