use crate::models::{Delta, Snapshot};

/// Entries of `current` whose id is absent from `previous`
///
/// Walks `current` in order and stops once `max` entries are collected. An
/// empty `previous` yields an empty delta: the first successful poll only
/// seeds state and must not announce the whole list as new.
pub fn compute_delta(previous: &Snapshot, current: &Snapshot, max: usize) -> Delta {
    if previous.is_empty() {
        return Delta::empty();
    }

    let seen = previous.ids();
    let entries = current
        .entries()
        .iter()
        .filter(|entry| !seen.contains(&entry.id))
        .take(max)
        .cloned()
        .collect();

    Delta::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrendingEntry;

    fn snapshot(ids: &[u64]) -> Snapshot {
        Snapshot::new(
            ids.iter()
                .map(|id| TrendingEntry::new(*id, format!("Movie {}", id)))
                .collect(),
        )
    }

    #[test]
    fn test_identical_snapshots_have_no_delta() {
        let a = snapshot(&[1, 2, 3, 4]);
        assert!(compute_delta(&a, &a, 3).is_empty());
    }

    #[test]
    fn test_reordering_is_not_a_delta() {
        let previous = snapshot(&[1, 2, 3]);
        let current = snapshot(&[3, 1, 2]);
        assert!(compute_delta(&previous, &current, 3).is_empty());
    }

    #[test]
    fn test_first_poll_is_suppressed() {
        let current = snapshot(&[1, 2, 3]);
        assert!(compute_delta(&Snapshot::default(), &current, 3).is_empty());
    }

    #[test]
    fn test_new_entries_in_current_order() {
        let previous = snapshot(&[1, 2]);
        let current = snapshot(&[5, 1, 4, 2]);
        assert_eq!(compute_delta(&previous, &current, 3).ids(), vec![5, 4]);
    }

    #[test]
    fn test_truncates_to_first_max_entries() {
        let previous = snapshot(&[1]);
        let current = snapshot(&[1, 9, 8, 7, 6, 5]);
        assert_eq!(compute_delta(&previous, &current, 3).ids(), vec![9, 8, 7]);
    }

    #[test]
    fn test_dropped_entries_do_not_matter() {
        let previous = snapshot(&[1, 2, 3]);
        let current = snapshot(&[1]);
        assert!(compute_delta(&previous, &current, 3).is_empty());
    }

    #[test]
    fn test_end_to_end_example() {
        let previous = Snapshot::new(vec![TrendingEntry::new(1, "A")]);
        let current = Snapshot::new(vec![
            TrendingEntry::new(1, "A"),
            TrendingEntry::new(2, "B"),
            TrendingEntry::new(3, "C"),
        ]);

        let delta = compute_delta(&previous, &current, 3);
        assert_eq!(
            delta.entries(),
            &[TrendingEntry::new(2, "B"), TrendingEntry::new(3, "C")]
        );
    }
}
