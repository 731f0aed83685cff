// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Inbound contracts: where the engine's records come from
//!
//! The engine owns no storage. Adapters implement [`RecordSource`] over
//! whatever holds evaluations, connections and the organization directory.
//! All calls are blocking; timeouts and retries belong to the adapter.

use crate::error::SourceError;
use crate::resolver::RawRecord;
use crate::types::{clamp_strength, ImageRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An active, symmetric connection between the requesting user and another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The other user's id
    pub other_user_id: String,
    /// Trust strength of the connection itself
    #[serde(default)]
    pub connection_strength: f64,
    /// The other user's display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// The other user's avatar reference
    #[serde(default)]
    pub avatar_ref: Option<ImageRef>,
}

impl Connection {
    /// Create a connection with no profile data
    #[must_use]
    pub fn new(other_user_id: impl Into<String>, connection_strength: f64) -> Self {
        Self {
            other_user_id: other_user_id.into(),
            connection_strength: clamp_strength(connection_strength),
            display_name: None,
            avatar_ref: None,
        }
    }
}

/// An organization directory entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Registered name
    pub name: String,
    /// Preferred display name, if it differs from `name`
    #[serde(default)]
    pub display_name: Option<String>,
    /// Logo reference for the external resolver
    #[serde(default)]
    pub logo_ref: Option<ImageRef>,
    /// Industry classification
    #[serde(default)]
    pub industry: Option<String>,
    /// Public website
    #[serde(default)]
    pub website: Option<String>,
    /// Location / headquarters
    #[serde(default)]
    pub location: Option<String>,
}

/// The three inbound data feeds the builder consumes
pub trait RecordSource {
    /// Raw, schema-drifted evaluation records written by `user_id`
    fn own_evaluations(&self, user_id: &str) -> Result<Vec<RawRecord>, SourceError>;

    /// Active connections of `user_id`
    fn active_connections(&self, user_id: &str) -> Result<Vec<Connection>, SourceError>;

    /// Directory entry for a raw organization name, `None` when unknown
    fn organization_directory(&self, name: &str) -> Result<Option<OrganizationRecord>, SourceError>;

    /// Display name and avatar of a user, when the source knows them
    fn user_profile(&self, _user_id: &str) -> Option<(String, Option<ImageRef>)> {
        None
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn own_evaluations(&self, user_id: &str) -> Result<Vec<RawRecord>, SourceError> {
        (**self).own_evaluations(user_id)
    }

    fn active_connections(&self, user_id: &str) -> Result<Vec<Connection>, SourceError> {
        (**self).active_connections(user_id)
    }

    fn organization_directory(&self, name: &str) -> Result<Option<OrganizationRecord>, SourceError> {
        (**self).organization_directory(name)
    }

    fn user_profile(&self, user_id: &str) -> Option<(String, Option<ImageRef>)> {
        (**self).user_profile(user_id)
    }
}

/// Directory lookups as seen by the graph builder
///
/// Lookup failures are already folded into `None` at this level.
pub trait Directory {
    /// Directory entry for a raw organization name
    fn lookup(&self, raw_name: &str) -> Option<OrganizationRecord>;
}

/// A directory keyed by canonical organization name
impl Directory for HashMap<String, OrganizationRecord> {
    fn lookup(&self, raw_name: &str) -> Option<OrganizationRecord> {
        self.get(&crate::normalize::normalize(raw_name)).cloned()
    }
}

/// A directory that knows nothing; every organization becomes synthetic
pub struct EmptyDirectory;

impl Directory for EmptyDirectory {
    fn lookup(&self, _raw_name: &str) -> Option<OrganizationRecord> {
        None
    }
}

/// Turns an opaque image reference into a URL
pub trait AvatarResolver {
    /// URL for `reference`, `None` when it cannot be resolved
    fn resolve(&self, reference: &ImageRef) -> Option<String>;
}

/// Resolves references by substituting them into a URL template
///
/// The template must contain `{ref}`.
#[derive(Debug, Clone)]
pub struct TemplateAvatarResolver {
    template: String,
}

impl TemplateAvatarResolver {
    /// Create a resolver; `None` when the template lacks `{ref}`
    #[must_use]
    pub fn new(template: impl Into<String>) -> Option<Self> {
        let template = template.into();
        template.contains("{ref}").then_some(Self { template })
    }
}

impl AvatarResolver for TemplateAvatarResolver {
    fn resolve(&self, reference: &ImageRef) -> Option<String> {
        if reference.0.trim().is_empty() {
            return None;
        }
        Some(self.template.replace("{ref}", reference.0.trim()))
    }
}
