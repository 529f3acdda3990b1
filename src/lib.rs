//! Study progress engine for groups working through a shared syllabus.
//!
//! [`syllabus::flatten`] turns the subject/unit/concept tree into an ordered
//! topic list, [`priority::classify`] labels each topic for one learner, and
//! [`leaderboard::aggregate`] ranks the group. All three are pure functions
//! over in-memory snapshots.

pub mod config;
pub mod error;
pub mod group;
pub mod history;
pub mod leaderboard;
pub mod models;
pub mod priority;
pub mod snapshot;
pub mod syllabus;

pub use error::{Error, Issue, Result};
pub use group::NewResource;
pub use history::History;
pub use leaderboard::aggregate;
pub use models::{
    CompletionNotice, HistoryEntry, LearnerProgress, ProgressStat, Resource, Subject, Syllabus, Test,
    Tier, TopicId, Unit,
};
pub use priority::{classify, Classifier, PriorityMap};
pub use snapshot::GroupSnapshot;
pub use syllabus::flatten;
