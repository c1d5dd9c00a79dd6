//! Enrollment progress arithmetic, kept free of I/O.

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};

/// Adds `lesson_id` to the completed set and drops ids that are no longer
/// lessons of the course. Order of first completion is preserved.
pub fn fold_completed_lesson(completed: &[i32], lesson_id: i32, course_lessons: &[i32]) -> Vec<i32> {
    let mut folded: Vec<i32> = Vec::with_capacity(completed.len() + 1);
    for id in completed.iter().copied().chain(std::iter::once(lesson_id)) {
        if course_lessons.contains(&id) && !folded.contains(&id) {
            folded.push(id);
        }
    }
    folded
}

/// Drops ids that are no longer lessons of the course.
pub fn retain_course_lessons(completed: &[i32], course_lessons: &[i32]) -> Vec<i32> {
    completed
        .iter()
        .copied()
        .filter(|id| course_lessons.contains(id))
        .collect()
}

/// `completed / total * 100`, clamped to [0, 100] and rounded to two places.
/// A course without lessons is at 0.
pub fn completion_percentage(completed: usize, total: usize) -> BigDecimal {
    if total == 0 {
        return BigDecimal::from(0);
    }
    let completed = completed.min(total);
    let ratio = BigDecimal::from(completed as u64 * 100) / BigDecimal::from(total as u64);
    ratio.with_scale_round(2, RoundingMode::HalfUp)
}

pub fn is_complete(progress: &BigDecimal) -> bool {
    *progress >= BigDecimal::from(100)
}

/// The first time progress reaches 100 stamps `now`; an existing stamp is kept.
pub fn resolve_completed_at(
    existing: Option<DateTime<Utc>>,
    progress: &BigDecimal,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match existing {
        Some(at) => Some(at),
        None if is_complete(progress) => Some(now),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn decimal(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("decimal")
    }

    #[test]
    fn test_removed_lesson_leaves_remaining_set_complete() {
        // Three of four done, then the unfinished fourth lesson is deleted.
        let completed = retain_course_lessons(&[10, 11, 12], &[10, 11, 12]);
        let progress = completion_percentage(completed.len(), 3);
        assert_eq!(completed, vec![10, 11, 12]);
        assert_eq!(progress, decimal("100.00"));

        let completed = retain_course_lessons(&[10, 13, 11], &[10, 11, 12]);
        assert_eq!(completed, vec![10, 11]);
        assert_eq!(completion_percentage(completed.len(), 3), decimal("66.67"));
    }

    #[test]
    fn test_fold_adds_and_deduplicates() {
        let lessons = [10, 11, 12, 13];
        let set = fold_completed_lesson(&[], 10, &lessons);
        assert_eq!(set, vec![10]);

        let set = fold_completed_lesson(&set, 12, &lessons);
        assert_eq!(set, vec![10, 12]);

        let again = fold_completed_lesson(&set, 12, &lessons);
        assert_eq!(again, vec![10, 12]);
    }

    #[test]
    fn test_fold_drops_lessons_no_longer_in_course() {
        let set = fold_completed_lesson(&[10, 99, 10], 11, &[10, 11]);
        assert_eq!(set, vec![10, 11]);
    }

    #[test]
    fn test_percentage_of_k_over_n() {
        assert_eq!(completion_percentage(3, 4), decimal("75"));
        assert_eq!(completion_percentage(4, 4), decimal("100"));
        assert_eq!(completion_percentage(1, 3), decimal("33.33"));
        assert_eq!(completion_percentage(2, 3), decimal("66.67"));
    }

    #[test]
    fn test_percentage_with_zero_lessons_is_zero() {
        assert_eq!(completion_percentage(0, 0), decimal("0"));
        assert_eq!(completion_percentage(5, 0), decimal("0"));
    }

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(completion_percentage(7, 4), decimal("100"));
    }

    #[test]
    fn test_completed_at_is_set_once() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);

        assert_eq!(resolve_completed_at(None, &decimal("75"), now), None);
        assert_eq!(resolve_completed_at(None, &decimal("100"), now), Some(now));
        assert_eq!(
            resolve_completed_at(Some(earlier), &decimal("100"), now),
            Some(earlier)
        );
        assert_eq!(
            resolve_completed_at(Some(earlier), &decimal("50"), now),
            Some(earlier)
        );
    }

    #[test]
    fn test_four_lesson_scenario() {
        let lessons = [1, 2, 3, 4];
        let mut set = Vec::new();
        let mut completed_at = None;
        let now = Utc::now();

        for lesson in [1, 2, 3] {
            set = fold_completed_lesson(&set, lesson, &lessons);
            let progress = completion_percentage(set.len(), lessons.len());
            completed_at = resolve_completed_at(completed_at, &progress, now);
        }
        assert_eq!(completion_percentage(set.len(), lessons.len()), decimal("75"));
        assert!(completed_at.is_none());

        set = fold_completed_lesson(&set, 2, &lessons);
        assert_eq!(set.len(), 3);

        set = fold_completed_lesson(&set, 4, &lessons);
        let progress = completion_percentage(set.len(), lessons.len());
        completed_at = resolve_completed_at(completed_at, &progress, now);
        assert_eq!(progress, decimal("100"));
        assert_eq!(completed_at, Some(now));
    }
}
