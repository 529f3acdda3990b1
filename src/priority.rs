//! Urgency classification for a learner's topics.
//!
//! Every topic in the flattened syllabus receives exactly one [`Tier`]:
//!
//! 1. Topics covered by a test due within the urgent window become
//!    `critical` when unfinished and `revision-old` when finished.
//! 2. Remaining unfinished topics, in syllabus order, are split at the
//!    midpoint: the earlier half is `critical`, the later half `high`.
//! 3. Remaining finished topics, in completion order, are split the same
//!    way: the earlier half is `revision-old`, the later half `revision-recent`.
//!
//! The first rule to assign a tier wins.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::history::History;
use crate::models::{Test, Tier, TopicId};

pub const DEFAULT_URGENT_WINDOW_DAYS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

pub type PriorityMap = HashMap<TopicId, Tier>;

/// Splits into the first `len / 2` items and the rest.
///
/// With an odd count the extra item lands in the second half.
pub fn split_at_midpoint<T>(items: &[T]) -> (&[T], &[T]) {
    items.split_at(items.len() / 2)
}

/// Whole days from `now` until midnight UTC of `date`, rounded down.
pub fn days_until(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Topics matched by one covered reference of `test`.
///
/// A reference is either a full topic key or a bare concept name. Bare names
/// match every topic with that concept name, limited to the test's subject
/// when one is set.
pub fn resolve_reference(test: &Test, reference: &str, topics: &[TopicId]) -> Vec<TopicId> {
    if topics.iter().any(|t| t.as_str() == reference) {
        return vec![TopicId::from(reference)];
    }

    topics
        .iter()
        .filter(|t| t.concept_name() == reference)
        .filter(|t| match &test.subject_name {
            Some(subject) => t.subject_name() == Some(subject.as_str()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Maps all of a test's covered references onto syllabus topics, dropping
/// references that match nothing.
pub fn resolve_covered(test: &Test, topics: &[TopicId]) -> Vec<TopicId> {
    let mut resolved = Vec::new();

    for reference in &test.covered_topics {
        let matches = resolve_reference(test, reference, topics);
        if matches.is_empty() {
            debug!(test = %test.name, reference = %reference, "ignoring unresolved test topic");
        }
        resolved.extend(matches);
    }

    resolved
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    pub urgent_window_days: i64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            urgent_window_days: DEFAULT_URGENT_WINDOW_DAYS,
        }
    }
}

impl Classifier {
    pub fn new(urgent_window_days: i64) -> Self {
        Self { urgent_window_days }
    }

    pub fn is_urgent(&self, test: &Test, now: DateTime<Utc>) -> bool {
        let days = days_until(test.date, now);
        (0..=self.urgent_window_days).contains(&days)
    }

    /// Topics covered by tests inside the urgent window.
    pub fn urgent_topics(
        &self,
        topics: &[TopicId],
        tests: &[Test],
        now: DateTime<Utc>,
    ) -> HashSet<TopicId> {
        tests
            .iter()
            .filter(|t| self.is_urgent(t, now))
            .flat_map(|t| resolve_covered(t, topics))
            .collect()
    }

    pub fn classify(
        &self,
        topics: &[TopicId],
        tests: &[Test],
        history: &History,
        now: DateTime<Utc>,
    ) -> PriorityMap {
        let known: HashSet<&TopicId> = topics.iter().collect();
        let urgent = self.urgent_topics(topics, tests, now);
        let mut map = PriorityMap::with_capacity(known.len());

        for topic in topics.iter().filter(|t| urgent.contains(*t)) {
            let tier = if history.contains(topic) {
                Tier::RevisionOld
            } else {
                Tier::Critical
            };
            map.entry(topic.clone()).or_insert(tier);
        }

        let unfinished: Vec<&TopicId> = topics
            .iter()
            .filter(|t| !history.contains(t) && !urgent.contains(*t))
            .collect();
        let (earlier, later) = split_at_midpoint(&unfinished);
        assign(&mut map, earlier, Tier::Critical);
        assign(&mut map, later, Tier::High);

        let mut finished = Vec::with_capacity(history.len());
        for topic in history.topics() {
            if !known.contains(topic) {
                debug!(topic = %topic, "ignoring completion outside the syllabus");
            } else if !urgent.contains(topic) {
                finished.push(topic);
            }
        }
        let (older, recent) = split_at_midpoint(&finished);
        assign(&mut map, older, Tier::RevisionOld);
        assign(&mut map, recent, Tier::RevisionRecent);

        debug!(
            topics = known.len(),
            urgent = urgent.len(),
            unfinished = unfinished.len(),
            finished = finished.len(),
            "classified topics"
        );

        map
    }
}

fn assign(map: &mut PriorityMap, topics: &[&TopicId], tier: Tier) {
    for topic in topics {
        map.entry((*topic).clone()).or_insert(tier);
    }
}

/// Classifies with the default seven day urgent window.
pub fn classify(
    topics: &[TopicId],
    tests: &[Test],
    history: &History,
    now: DateTime<Utc>,
) -> PriorityMap {
    Classifier::default().classify(topics, tests, history, now)
}

/// Orders topics for study: by tier, then by syllabus position.
pub fn study_order(topics: &[TopicId], map: &PriorityMap) -> Vec<(TopicId, Tier)> {
    let mut seen = HashSet::new();
    let mut plan: Vec<(TopicId, Tier)> = topics
        .iter()
        .filter(|t| seen.insert(*t))
        .filter_map(|t| map.get(t).map(|tier| (t.clone(), *tier)))
        .collect();

    plan.sort_by_key(|(_, tier)| tier.rank());
    plan
}
