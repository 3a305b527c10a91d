// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use thiserror::Error;

use crate::models::NodeId;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Node #{0} not found")]
    NodeNotFound(NodeId),

    #[error("Link #{from} -> #{to} not found")]
    LinkNotFound { from: NodeId, to: NodeId },

    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Malformed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Projection failed: {0}")]
    Projection(String),

    #[error("{0} is out of range")]
    OutOfRange(String),
}

/// Reasons an operation was refused without anything being wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    SelfLoop,
    DuplicateLink,
    EmptyProfileName,
    DuplicateProfile,
    LastProfile,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::SelfLoop => "a node cannot flow into itself",
            Rejection::DuplicateLink => "a link between these nodes already exists",
            Rejection::EmptyProfileName => "profile name is empty",
            Rejection::DuplicateProfile => "profile already exists",
            Rejection::LastProfile => "at least one profile must remain",
        };
        f.write_str(msg)
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Rejected(r) => Some(*r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(v) => Outcome::Done(f(v)),
            Outcome::Rejected(r) => Outcome::Rejected(r),
        }
    }
}
