//! Group documents as handed to the engine by the storage layer.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Issue, Result};
use crate::leaderboard::aggregate;
use crate::models::{LearnerProgress, ProgressStat, Resource, Syllabus, Test, TopicId};
use crate::priority::{resolve_reference, Classifier, PriorityMap};
use crate::syllabus::flatten;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub invite_code: String,
    #[serde(default)]
    pub syllabus: Syllabus,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub progress: Vec<LearnerProgress>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub pending_resources: Vec<Resource>,
}

impl GroupSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: GroupSnapshot = serde_json::from_str(&raw)?;
        info!(
            group = %snapshot.name,
            learners = snapshot.progress.len(),
            tests = snapshot.tests.len(),
            "loaded group snapshot"
        );
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty JSON. The file is replaced in one rename,
    /// so a failed write leaves the previous contents in place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let write_err = |source: std::io::Error| Error::Write {
            path: path.to_path_buf(),
            source,
        };
        std::fs::write(&tmp, raw).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)?;
        info!(group = %self.name, path = %path.display(), "saved group snapshot");
        Ok(())
    }

    pub fn topics(&self) -> Vec<TopicId> {
        flatten(&self.syllabus)
    }

    pub fn learner(&self, username: &str) -> Result<&LearnerProgress> {
        self.progress
            .iter()
            .find(|p| p.username == username)
            .ok_or_else(|| Error::LearnerNotFound(username.to_string()))
    }

    /// Tiers for one learner. A learner with no record yet has finished nothing.
    pub fn priorities(
        &self,
        username: &str,
        classifier: &Classifier,
        now: DateTime<Utc>,
    ) -> PriorityMap {
        let empty = LearnerProgress::new(username);
        let learner = self.learner(username).unwrap_or(&empty);
        classifier.classify(&self.topics(), &self.tests, &learner.history, now)
    }

    pub fn leaderboard(&self) -> Vec<ProgressStat> {
        let total = i64::try_from(self.syllabus.total_concepts()).unwrap_or(i64::MAX);
        aggregate(&self.progress, total)
    }
}

/// Everything in the snapshot the engine had to work around.
pub fn diagnose(snapshot: &GroupSnapshot) -> Vec<Issue> {
    let mut issues = snapshot.syllabus.issues();
    let topics = snapshot.topics();
    let known: HashSet<&TopicId> = topics.iter().collect();

    for test in &snapshot.tests {
        for reference in &test.covered_topics {
            if resolve_reference(test, reference, &topics).is_empty() {
                issues.push(Issue::UnresolvedTopicReference {
                    reference: reference.clone(),
                    source_kind: format!("test '{}'", test.name),
                });
            }
        }
    }

    for learner in &snapshot.progress {
        for topic in learner.history.topics() {
            if !known.contains(topic) {
                issues.push(Issue::UnresolvedTopicReference {
                    reference: topic.to_string(),
                    source_kind: format!("history of '{}'", learner.username),
                });
            }
        }
    }

    for issue in &issues {
        warn!(group = %snapshot.name, "{issue}");
    }

    issues
}
