use tracing::warn;

use crate::error::Issue;
use crate::models::{LearnerProgress, ProgressStat};

/// Percentage of `total` rounded to one decimal place, or 0 when there is nothing to complete.
///
/// Exact halves round to even, so 1 of 16 is 6.2.
pub fn percentage(count: usize, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = count as f64 / total as f64 * 100.0;
    (ratio * 10.0).round_ties_even() / 10.0
}

/// Ranks learners by completed topics, highest first.
///
/// Learners with equal counts keep their input order. A negative total is
/// treated as zero.
pub fn aggregate(learners: &[LearnerProgress], total: i64) -> Vec<ProgressStat> {
    if total < 0 {
        warn!("{}", Issue::InvalidTotal(total));
    }

    let mut stats: Vec<ProgressStat> = learners
        .iter()
        .map(|p| {
            let count = p.history.len();
            ProgressStat {
                username: p.username.clone(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    // sort_by is stable, ties stay in input order
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopicId;
    use chrono::{TimeZone, Utc};

    fn learner(name: &str, completed: usize) -> LearnerProgress {
        let mut progress = LearnerProgress::new(name);
        for i in 0..completed {
            let at = Utc.with_ymd_and_hms(2026, 2, 1, 8, i as u32, 0).unwrap();
            progress
                .history
                .insert(TopicId::new("Math", "Algebra", &format!("c{i}")), at);
        }
        progress
    }

    fn names(stats: &[ProgressStat]) -> Vec<&str> {
        stats.iter().map(|s| s.username.as_str()).collect()
    }

    mod percentage_tests {
        use super::*;

        #[test]
        fn rounds_to_one_decimal() {
            assert_eq!(percentage(1, 3), 33.3);
            assert_eq!(percentage(2, 3), 66.7);
        }

        #[test]
        fn halves_round_to_even() {
            assert_eq!(percentage(1, 16), 6.2);
            assert_eq!(percentage(1, 80), 1.2);
            assert_eq!(percentage(3, 16), 18.8);
        }

        #[test]
        fn whole_numbers() {
            assert_eq!(percentage(7, 10), 70.0);
            assert_eq!(percentage(10, 10), 100.0);
        }

        #[test]
        fn zero_total_is_zero() {
            assert_eq!(percentage(5, 0), 0.0);
        }

        #[test]
        fn negative_total_is_zero() {
            assert_eq!(percentage(5, -3), 0.0);
        }
    }

    mod aggregate_tests {
        use super::*;

        #[test]
        fn ranks_by_count_with_stable_ties() {
            let learners = vec![learner("X", 4), learner("Y", 7), learner("Z", 7)];
            let stats = aggregate(&learners, 10);

            assert_eq!(names(&stats), vec!["Y", "Z", "X"]);
            assert_eq!(stats[0].percentage, 70.0);
            assert_eq!(stats[1].percentage, 70.0);
            assert_eq!(stats[2].percentage, 40.0);
            assert_eq!(stats[2].count, 4);
        }

        #[test]
        fn zero_total_gives_zero_percent() {
            let learners = vec![learner("X", 3), learner("Y", 0)];
            let stats = aggregate(&learners, 0);
            assert!(stats.iter().all(|s| s.percentage == 0.0));
            assert_eq!(stats[0].count, 3);
        }

        #[test]
        fn negative_total_treated_as_zero() {
            let stats = aggregate(&[learner("X", 2)], -4);
            assert_eq!(stats[0].percentage, 0.0);
        }

        #[test]
        fn empty_group() {
            assert!(aggregate(&[], 10).is_empty());
        }

        #[test]
        fn toggled_topic_counts_once() {
            let mut progress = learner("X", 2);
            let topic = TopicId::new("Math", "Algebra", "c0");
            let at = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
            progress.history.set_completed(topic.clone(), false, at);
            progress.history.set_completed(topic, true, at);

            let stats = aggregate(&[progress], 4);
            assert_eq!(stats[0].count, 2);
            assert_eq!(stats[0].percentage, 50.0);
        }

        #[test]
        fn aggregate_is_idempotent() {
            let learners = vec![learner("A", 1), learner("B", 3), learner("C", 3)];
            let first = aggregate(&learners, 9);
            let second = aggregate(&learners, 9);
            assert_eq!(first, second);
        }

        #[test]
        fn inputs_are_not_mutated() {
            let learners = vec![learner("A", 1), learner("B", 3)];
            let before = learners.clone();
            let _ = aggregate(&learners, 5);
            assert_eq!(learners, before);
        }

        #[test]
        fn one_more_completion_never_lowers_percentage() {
            for total in [1, 3, 7, 10, 33] {
                for done in 0..total as usize {
                    let lower = aggregate(&[learner("A", done)], total)[0].percentage;
                    let higher = aggregate(&[learner("A", done + 1)], total)[0].percentage;
                    assert!(higher >= lower, "{done}/{total}");
                }
            }
        }
    }
}
