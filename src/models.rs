use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::history::History;

const KEY_SEPARATOR: &str = "||";

/// Identifies one concept within a group's syllabus.
///
/// The key is composed from the subject, unit and concept names, so history
/// recorded against an older syllabus still resolves after the syllabus grows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(subject: &str, unit: &str, concept: &str) -> Self {
        TopicId(format!(
            "{subject}{sep}{unit}{sep}{concept}",
            sep = KEY_SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Older records used `subject-unit-concept` keys
    pub fn concept_name(&self) -> &str {
        if self.0.contains(KEY_SEPARATOR) {
            self.0.rsplit(KEY_SEPARATOR).next().unwrap_or(&self.0)
        } else {
            self.0.rsplit('-').next().unwrap_or(&self.0)
        }
    }

    pub fn subject_name(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, KEY_SEPARATOR);
        let subject = parts.next()?;
        // A key without both separators has no subject segment
        parts.next()?;
        parts.next()?;
        Some(subject)
    }
}

impl From<String> for TopicId {
    fn from(s: String) -> Self {
        TopicId(s)
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        TopicId(s.to_string())
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub concepts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// A group's syllabus: subjects, each holding units of concepts, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Syllabus {
    pub subjects: Vec<Subject>,
}

// Urgency labels, most pressing first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Critical,
    High,
    RevisionOld,
    RevisionRecent,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::High => "high",
            Tier::RevisionOld => "revision-old",
            Tier::RevisionRecent => "revision-recent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Tier::Critical),
            "high" => Some(Tier::High),
            "revision-old" | "revision_old" => Some(Tier::RevisionOld),
            "revision-recent" | "revision_recent" => Some(Tier::RevisionRecent),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Critical => "Critical",
            Tier::High => "High",
            Tier::RevisionOld => "Revise (old)",
            Tier::RevisionRecent => "Revise (recent)",
        }
    }

    /// Position in a study plan; lower is studied first.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Critical => 0,
            Tier::High => 1,
            Tier::RevisionOld => 2,
            Tier::RevisionRecent => 3,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled assessment for the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    pub date: NaiveDate,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    // Topic keys, or bare concept names resolved against the syllabus
    #[serde(default)]
    pub covered_topics: Vec<String>,
    #[serde(default)]
    pub portion: Option<String>,
}

impl Test {
    pub fn portion_label(&self) -> String {
        match &self.portion {
            Some(p) if !p.trim().is_empty() => p.clone(),
            _ if !self.covered_topics.is_empty() => self.covered_topics.join(", "),
            _ => "Full Syllabus".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "concept")]
    pub topic: TopicId,
    pub at: DateTime<Utc>,
}

/// One learner's completions within a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerProgress {
    pub username: String,
    #[serde(default)]
    pub history: History,
}

impl LearnerProgress {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            history: History::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStat {
    pub username: String,
    pub count: usize,
    pub percentage: f64,
}

/// Published to a group's members once a completion has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub username: String,
    pub topic: String,
}

impl CompletionNotice {
    pub fn new(username: &str, topic: &TopicId) -> Self {
        Self {
            username: username.to_string(),
            topic: topic.concept_name().to_string(),
        }
    }
}

/// A study resource shared with a group. New submissions wait in the pending
/// queue until the group approves or rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
