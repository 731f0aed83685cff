// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the trust engine
//!
//! Malformed individual records never surface here; they degrade into
//! [`crate::types::Diagnostic`] entries. Only whole-source unavailability and
//! broken graph invariants are errors.

use thiserror::Error;

/// Failure reported by a record source adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The backing store could not be reached
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the payload was unusable as a whole
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors returned by the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// A source required for the request failed, as distinct from returning no data
    #[error("{source_name} unavailable for {user_id}: {reason}")]
    SourceUnavailable {
        /// Which inbound contract failed
        source_name: &'static str,
        /// User the fetch was made for
        user_id: String,
        /// Adapter failure
        reason: SourceError,
    },

    /// A graph invariant was broken (duplicate node id, dangling edge)
    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenient Result type using [`EngineError`]
pub type Result<T> = std::result::Result<T, EngineError>;
