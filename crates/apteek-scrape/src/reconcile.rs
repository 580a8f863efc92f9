//! Merge freshly parsed candidates against the stored rows for a chain.

use std::collections::HashMap;

use apteek_core::Pharmacy;

/// Decide, per candidate, between insert, update-in-place and skip.
///
/// Stored rows are indexed by natural id. A candidate without a match is a
/// fresh insert (surrogate id left at 0). A candidate whose `modified_at`
/// is strictly later than the matched row's inherits that row's surrogate
/// id and becomes an update. Anything else is dropped: the strict
/// greater-than comparison makes equal timestamps a no-op and protects
/// against a source briefly serving stale data.
pub fn reconcile(candidates: Vec<Pharmacy>, existing: &[Pharmacy]) -> Vec<Pharmacy> {
    let by_natural_id: HashMap<i64, &Pharmacy> =
        existing.iter().map(|p| (p.natural_id, p)).collect();

    candidates
        .into_iter()
        .filter_map(|mut candidate| match by_natural_id.get(&candidate.natural_id) {
            None => Some(candidate),
            Some(stored) if candidate.modified_at > stored.modified_at => {
                candidate.id = stored.id;
                Some(candidate)
            }
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apteek_core::Chain;
    use chrono::{TimeZone, Utc};

    fn candidate(natural_id: i64, modified_minute: u32) -> Pharmacy {
        let mut p = Pharmacy::new(Chain::Apotheka);
        p.natural_id = natural_id;
        p.name = format!("Apteek {natural_id}");
        p.modified_at = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, modified_minute, 0)
            .unwrap();
        p
    }

    fn stored(id: i64, natural_id: i64, modified_minute: u32) -> Pharmacy {
        let mut p = candidate(natural_id, modified_minute);
        p.id = id;
        p
    }

    #[test]
    fn unmatched_candidate_is_an_insert() {
        let out = reconcile(vec![candidate(1, 0)], &[stored(10, 2, 0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 0);
        assert_eq!(out[0].natural_id, 1);
    }

    #[test]
    fn newer_candidate_inherits_stored_surrogate_id() {
        let out = reconcile(vec![candidate(1, 30)], &[stored(10, 1, 0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 10);
    }

    #[test]
    fn equal_timestamps_favor_no_write() {
        let out = reconcile(vec![candidate(1, 15)], &[stored(10, 1, 15)]);
        assert!(out.is_empty());
    }

    #[test]
    fn older_candidate_is_dropped() {
        let out = reconcile(vec![candidate(1, 0)], &[stored(10, 1, 30)]);
        assert!(out.is_empty());
    }

    #[test]
    fn identical_batch_against_prior_run_persists_nothing() {
        let batch = vec![candidate(1, 5), candidate(2, 6)];
        let first = reconcile(batch.clone(), &[]);
        assert_eq!(first.len(), 2);

        // Pretend the first run was persisted with surrogate ids assigned.
        let stored: Vec<Pharmacy> = first
            .into_iter()
            .enumerate()
            .map(|(i, mut p)| {
                p.id = i as i64 + 1;
                p
            })
            .collect();

        let second = reconcile(batch, &stored);
        assert!(second.is_empty());
    }

    #[test]
    fn mixed_batch_splits_into_insert_and_update() {
        let existing = vec![stored(42, 1, 0)];
        let out = reconcile(vec![candidate(1, 30), candidate(2, 30)], &existing);
        assert_eq!(out.len(), 2);
        let update = out.iter().find(|p| p.natural_id == 1).unwrap();
        let insert = out.iter().find(|p| p.natural_id == 2).unwrap();
        assert_eq!(update.id, 42);
        assert_eq!(insert.id, 0);
    }
}
