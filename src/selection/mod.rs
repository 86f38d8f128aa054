use serde::Serialize;

use crate::{
    errors::ValidationError,
    models::{Session, SessionId},
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
}

/// Sessions a teacher has picked, in the order they were picked.
///
/// The order is the priority order used at submission time, so removal never
/// reshuffles the remaining entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<SessionId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of a selectable session.
    ///
    /// Full and unavailable sessions are refused with
    /// [`ValidationError::SessionUnavailable`] and the set is left as it was.
    pub fn toggle(&mut self, session: &Session) -> Result<ToggleOutcome, ValidationError> {
        if !session.is_selectable() {
            return Err(ValidationError::SessionUnavailable {
                session_id: session.id,
            });
        }

        match self.position(session.id) {
            Some(index) => {
                self.order.remove(index);
                Ok(ToggleOutcome::Deselected)
            }
            None => {
                self.order.push(session.id);
                Ok(ToggleOutcome::Selected)
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Drops `session_ids`; whatever remains keeps its relative order.
    pub fn remove_all(&mut self, session_ids: &[SessionId]) {
        self.order.retain(|id| !session_ids.contains(id));
    }

    pub fn is_selected(&self, session: &Session) -> bool {
        self.contains(session.id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.position(session_id).is_some()
    }

    pub fn ordered_ids(&self) -> &[SessionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn position(&self, session_id: SessionId) -> Option<usize> {
        self.order.iter().position(|id| *id == session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;
    use crate::test_support::session;
    use std::collections::HashMap;

    #[test]
    fn full_and_unavailable_sessions_are_refused() {
        let mut selection = SelectionSet::new();
        let full = session(1, SessionStatus::Full, true);
        let closed = session(2, SessionStatus::Available, false);

        for _ in 0..3 {
            assert_eq!(
                selection.toggle(&full),
                Err(ValidationError::SessionUnavailable { session_id: 1 })
            );
            assert!(selection.toggle(&closed).is_err());
        }
        assert!(!selection.is_selected(&full));
        assert!(!selection.is_selected(&closed));
        assert!(selection.is_empty());
    }

    #[test]
    fn saturated_and_cancelled_remain_selectable_when_available() {
        let mut selection = SelectionSet::new();
        assert_eq!(
            selection.toggle(&session(1, SessionStatus::Saturated, true)),
            Ok(ToggleOutcome::Selected)
        );
        assert_eq!(
            selection.toggle(&session(2, SessionStatus::Cancelled, true)),
            Ok(ToggleOutcome::Selected)
        );
    }

    #[test]
    fn membership_follows_toggle_parity() {
        let sessions = [
            session(1, SessionStatus::Available, true),
            session(2, SessionStatus::Available, true),
            session(3, SessionStatus::Full, true),
            session(4, SessionStatus::Saturated, true),
        ];
        let script = [0usize, 1, 0, 2, 3, 1, 1, 0, 2, 3, 3];

        let mut selection = SelectionSet::new();
        let mut counts: HashMap<SessionId, usize> = HashMap::new();
        for index in script {
            let target = &sessions[index];
            let _ = selection.toggle(target);
            *counts.entry(target.id).or_default() += 1;
        }

        for target in &sessions {
            let odd = counts.get(&target.id).copied().unwrap_or(0) % 2 == 1;
            assert_eq!(selection.is_selected(target), odd && target.is_selectable());
        }
    }

    #[test]
    fn insertion_order_survives_unrelated_toggles() {
        let a = session(10, SessionStatus::Available, true);
        let b = session(20, SessionStatus::Available, true);
        let c = session(30, SessionStatus::Available, true);
        let d = session(40, SessionStatus::Available, true);

        let mut selection = SelectionSet::new();
        selection.toggle(&a).unwrap();
        selection.toggle(&d).unwrap();
        selection.toggle(&b).unwrap();
        selection.toggle(&d).unwrap();
        selection.toggle(&c).unwrap();
        selection.toggle(&d).unwrap();
        selection.toggle(&d).unwrap();

        assert_eq!(selection.ordered_ids(), &[10, 20, 30]);
    }

    #[test]
    fn removal_keeps_remaining_order_and_reinsert_goes_last() {
        let a = session(1, SessionStatus::Available, true);
        let b = session(2, SessionStatus::Available, true);
        let c = session(3, SessionStatus::Available, true);

        let mut selection = SelectionSet::new();
        for s in [&a, &b, &c] {
            selection.toggle(s).unwrap();
        }
        assert_eq!(selection.toggle(&a), Ok(ToggleOutcome::Deselected));
        assert_eq!(selection.ordered_ids(), &[2, 3]);
        selection.toggle(&a).unwrap();
        assert_eq!(selection.ordered_ids(), &[2, 3, 1]);

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn remove_all_keeps_entries_it_was_not_given() {
        let mut selection = SelectionSet::new();
        for id in [4, 1, 7, 2] {
            selection.toggle(&session(id, SessionStatus::Available, true)).unwrap();
        }

        selection.remove_all(&[1, 2, 99]);
        assert_eq!(selection.ordered_ids(), &[4, 7]);
    }
}
