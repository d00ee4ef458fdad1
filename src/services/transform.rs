//! Position transformation against the operation history.
//!
//! A client computes positions against the version it last saw. Before such a
//! position is applied, every operation accepted since that version is folded
//! over it, once and in arrival order. This is a single linear pass and does
//! not give the convergence guarantees of a full OT scheme; three-way
//! interleavings can still diverge from what each author intended.

use crate::services::document_store::{AppliedOp, HistoryEntry};

/// Map `position`, written against `client_version`, onto the coordinate space
/// of `version`. The result is clamped to `[0, content_len]` unless the client
/// was already current, in which case the position is returned untouched.
pub fn transform_position<'a, I>(
    history: I,
    position: usize,
    client_version: u64,
    version: u64,
    content_len: usize,
) -> usize
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    if client_version >= version {
        return position;
    }

    let transformed = history
        .into_iter()
        .filter(|entry| entry.version > client_version && entry.version <= version)
        .fold(position, |running, entry| shift(running, &entry.op));

    transformed.min(content_len)
}

fn shift(running: usize, op: &AppliedOp) -> usize {
    match *op {
        AppliedOp::Insert { position, length } if position <= running => running + length,
        AppliedOp::Delete { position, length } if position < running => {
            running - length.min(running - position)
        }
        // The position sat inside text that was removed; pin it to the cut.
        AppliedOp::Delete { position, length } if position < running + length => position,
        _ => running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(version: u64, op: AppliedOp) -> HistoryEntry {
        HistoryEntry { version, op, issuer: "test".to_string(), applied_at: Utc::now() }
    }

    fn insert(position: usize, length: usize) -> AppliedOp {
        AppliedOp::Insert { position, length }
    }

    fn delete(position: usize, length: usize) -> AppliedOp {
        AppliedOp::Delete { position, length }
    }

    #[test]
    fn identity_when_client_is_current() {
        let history = vec![entry(1, insert(0, 5))];
        assert_eq!(transform_position(&history, 3, 1, 1, 10), 3);
        assert_eq!(transform_position(&history, 3, 7, 1, 10), 3);
        // No clamping either: the caller decides what to do with it.
        assert_eq!(transform_position(&history, 99, 1, 1, 10), 99);
    }

    #[test]
    fn earlier_insert_pushes_position_forward() {
        let history = vec![entry(1, insert(2, 4))];
        assert_eq!(transform_position(&history, 5, 0, 1, 20), 9);
        // Insert at the same point also shifts.
        assert_eq!(transform_position(&history, 2, 0, 1, 20), 6);
        // Insert after the position leaves it alone.
        assert_eq!(transform_position(&history, 1, 0, 1, 20), 1);
    }

    #[test]
    fn earlier_delete_pulls_position_back() {
        let history = vec![entry(1, delete(2, 3))];
        assert_eq!(transform_position(&history, 10, 0, 1, 20), 7);
        // Delete covering the position only pulls back to its start.
        assert_eq!(transform_position(&history, 3, 0, 1, 20), 2);
    }

    #[test]
    fn delete_starting_ahead_within_reach_pins_to_its_start() {
        let history = vec![entry(1, delete(6, 10))];
        assert_eq!(transform_position(&history, 4, 0, 1, 20), 6);
        // Starting exactly at the position is a no-op.
        assert_eq!(transform_position(&history, 6, 0, 1, 20), 6);
        // Out of reach.
        let far = vec![entry(1, delete(30, 2))];
        assert_eq!(transform_position(&far, 4, 0, 1, 40), 4);
    }

    #[test]
    fn only_entries_after_client_version_are_folded() {
        let history = vec![entry(1, insert(0, 100)), entry(2, insert(0, 3)), entry(3, AppliedOp::Replace)];
        assert_eq!(transform_position(&history, 5, 1, 3, 200), 8);
        assert_eq!(transform_position(&history, 5, 0, 3, 200), 108);
    }

    #[test]
    fn result_is_clamped_to_content_length() {
        let history = vec![entry(1, insert(0, 50))];
        assert_eq!(transform_position(&history, 10, 0, 1, 20), 20);
    }

    #[test]
    fn folds_in_arrival_order() {
        // Insert 3 chars at 0, then delete 5 chars starting at 1.
        let history = vec![entry(1, insert(0, 3)), entry(2, delete(1, 5))];
        // 4 -> 7 after the insert, then 7 - min(5, 6) = 2.
        assert_eq!(transform_position(&history, 4, 0, 2, 50), 2);
    }
}
