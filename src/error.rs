use std::path::PathBuf;

use thiserror::Error;

use crate::models::TopicId;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the CLI and the syllabus editing API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid group snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("topic '{0}' already exists in the syllabus")]
    DuplicateTopic(TopicId),

    #[error("unit '{unit}' in subject '{subject}' has no concepts")]
    EmptyUnit { subject: String, unit: String },

    #[error("learner '{0}' has no progress in this group")]
    LearnerNotFound(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invite code '{0}' does not match this group")]
    InvalidInviteCode(String),

    #[error("group file {0} already exists")]
    GroupExists(PathBuf),
}

/// Problems in a group snapshot that the engine works around instead of failing on.
///
/// These are logged while classifying and collected by [`crate::snapshot::diagnose`]
/// so a dashboard can still render from imperfect data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("malformed syllabus: {0}")]
    MalformedSyllabus(String),

    #[error("unresolved topic reference '{reference}' in {source_kind}")]
    UnresolvedTopicReference {
        reference: String,
        source_kind: String,
    },

    #[error("invalid total concept count {0}, treating as zero")]
    InvalidTotal(i64),

    #[error("duplicate topic '{0}' in syllabus")]
    DuplicateTopic(TopicId),
}
