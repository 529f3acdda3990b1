use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Issue, Result};
use crate::models::{Subject, Syllabus, TopicId, Unit};

/// Lists every topic in syllabus order: subjects, then units, then concepts.
///
/// Positions in this sequence decide which unfinished work counts as earlier.
pub fn flatten(syllabus: &Syllabus) -> Vec<TopicId> {
    syllabus
        .subjects
        .iter()
        .flat_map(|sub| {
            sub.units.iter().flat_map(move |unit| {
                unit.concepts
                    .iter()
                    .map(move |concept| TopicId::new(&sub.subject_name, &unit.unit_name, concept))
            })
        })
        .collect()
}

/// Splits a comma separated list of concepts, dropping blank items.
pub fn parse_concepts_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Syllabus {
    pub fn total_concepts(&self) -> usize {
        self.subjects
            .iter()
            .flat_map(|s| &s.units)
            .map(|u| u.concepts.len())
            .sum()
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.subject_name == name)
    }

    pub fn units_for_subject(&self, name: &str) -> &[Unit] {
        self.subject(name).map(|s| s.units.as_slice()).unwrap_or(&[])
    }

    /// Appends a unit to the named subject, creating the subject at the end if needed.
    ///
    /// Rejects the whole unit if any concept would produce a topic key that
    /// already exists, or if two concepts in the new unit collide.
    pub fn add_unit(&mut self, subject: &str, unit: &str, concepts: Vec<String>) -> Result<()> {
        if concepts.is_empty() {
            return Err(Error::EmptyUnit {
                subject: subject.to_string(),
                unit: unit.to_string(),
            });
        }

        let mut existing: HashSet<TopicId> = flatten(self).into_iter().collect();
        for concept in &concepts {
            let id = TopicId::new(subject, unit, concept);
            if !existing.insert(id.clone()) {
                return Err(Error::DuplicateTopic(id));
            }
        }

        let new_unit = Unit {
            unit_name: unit.to_string(),
            concepts,
        };

        match self.subjects.iter_mut().find(|s| s.subject_name == subject) {
            Some(sub) => sub.units.push(new_unit),
            None => {
                debug!(subject, "creating subject");
                self.subjects.push(Subject {
                    subject_name: subject.to_string(),
                    units: vec![new_unit],
                });
            }
        }

        Ok(())
    }

    /// Topic keys declared more than once, in first-seen order.
    pub fn duplicate_topics(&self) -> Vec<TopicId> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for id in flatten(self) {
            if !seen.insert(id.clone()) && reported.insert(id.clone()) {
                duplicates.push(id);
            }
        }

        duplicates
    }

    /// Structural problems that flattening tolerates but an editor should fix.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (i, sub) in self.subjects.iter().enumerate() {
            if sub.subject_name.trim().is_empty() {
                issues.push(Issue::MalformedSyllabus(format!(
                    "subject #{} has no name",
                    i + 1
                )));
            }
            if sub.units.is_empty() {
                issues.push(Issue::MalformedSyllabus(format!(
                    "subject '{}' has no units",
                    sub.subject_name
                )));
            }
            for (j, unit) in sub.units.iter().enumerate() {
                if unit.unit_name.trim().is_empty() {
                    issues.push(Issue::MalformedSyllabus(format!(
                        "unit #{} of subject '{}' has no name",
                        j + 1,
                        sub.subject_name
                    )));
                }
            }
        }

        issues.extend(self.duplicate_topics().into_iter().map(Issue::DuplicateTopic));
        issues
    }
}
