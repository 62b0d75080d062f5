use crate::backend::SlotStore;
use crate::error::SchedulingError;
use crate::types::{Slot, SlotId, SlotState};
use tracing::{info, warn};

/// A state change of a single slot: the precondition it needs and the values it
/// writes. Stores evaluate both in one atomic step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTransition {
    /// `Open -> Reserved`
    Reserve { candidate_name: String },
    /// `Reserved -> CheckedIn`
    CheckIn,
    /// `Reserved | CheckedIn -> Open`
    Cancel,
}

impl SlotTransition {
    pub fn permits(&self, slot: &Slot) -> bool {
        match self {
            Self::Reserve { .. } => !slot.reserved,
            Self::CheckIn => slot.reserved && !slot.checked_in,
            Self::Cancel => slot.reserved,
        }
    }

    pub fn apply(&self, slot: &mut Slot) {
        match self {
            Self::Reserve { candidate_name } => {
                slot.reserved = true;
                slot.candidate_name = Some(candidate_name.clone());
                slot.checked_in = false;
            }
            Self::CheckIn => slot.checked_in = true,
            Self::Cancel => {
                slot.reserved = false;
                slot.candidate_name = None;
                slot.checked_in = false;
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Reserve { .. } => "reserve",
            Self::CheckIn => "check-in",
            Self::Cancel => "cancel",
        }
    }

    /// Explains why the transition did not match `current`.
    ///
    /// If `current` would be accepted, the slot changed between the conditional
    /// update and the follow-up read; the transition's state at the time of the
    /// update is then reported.
    fn conflict(&self, current: &Slot) -> SchedulingError {
        let id = current.id;
        match (self, current.state()) {
            (Self::Reserve { .. }, _) => SchedulingError::AlreadyReserved(id),
            (Self::CheckIn, SlotState::CheckedIn) => SchedulingError::AlreadyCheckedIn(id),
            (Self::CheckIn, _) => SchedulingError::NotReserved(id),
            (Self::Cancel, _) => SchedulingError::NotReserved(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotLifecycle<S> {
    store: S,
}

impl<S: SlotStore> SlotLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn reserve(&self, id: SlotId, candidate_name: &str) -> Result<Slot, SchedulingError> {
        let candidate_name = candidate_name.trim();
        if candidate_name.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "Candidate name is required".into(),
            ));
        }
        self.transition(
            id,
            SlotTransition::Reserve {
                candidate_name: candidate_name.to_string(),
            },
        )
    }

    pub fn check_in(&self, id: SlotId) -> Result<Slot, SchedulingError> {
        self.transition(id, SlotTransition::CheckIn)
    }

    pub fn cancel(&self, id: SlotId) -> Result<Slot, SchedulingError> {
        self.transition(id, SlotTransition::Cancel)
    }

    fn transition(&self, id: SlotId, transition: SlotTransition) -> Result<Slot, SchedulingError> {
        if let Some(slot) = self.store.update_slot_if(id, &transition)? {
            info!(slot_id = id, transition = transition.name(), "Slot updated");
            return Ok(slot);
        }

        // The update matched nothing. Only now read the slot to tell the caller why.
        let err = match self.store.slot(id)? {
            Some(current) => transition.conflict(&current),
            None => SchedulingError::SlotNotFound(id),
        };
        warn!(slot_id = id, transition = transition.name(), %err, "Slot transition rejected");
        Err(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::local_store::LocalStore;
    use chrono::Utc;
    use std::sync::Barrier;
    use test_case::test_case;

    fn lifecycle_with_open_slot(id: SlotId) -> (SlotLifecycle<LocalStore>, LocalStore) {
        let store = LocalStore::default();
        store
            .insert_slot(&Slot::open(id, Some("B1".into()), Utc::now()))
            .unwrap();
        (SlotLifecycle::new(store.clone()), store)
    }

    #[test]
    fn test_reserve_open_slot_then_repeat() {
        let (lifecycle, store) = lifecycle_with_open_slot(1);

        let slot = lifecycle.reserve(1, "Tom").unwrap();
        assert!(slot.reserved);
        assert_eq!(slot.candidate_name.as_deref(), Some("Tom"));
        assert!(!slot.checked_in);

        assert_eq!(
            lifecycle.reserve(1, "Tom").unwrap_err(),
            SchedulingError::AlreadyReserved(1)
        );
        assert_eq!(store.slot(1).unwrap().unwrap(), slot);
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace only")]
    fn test_reserve_requires_candidate_name(name: &str) {
        let (lifecycle, store) = lifecycle_with_open_slot(1);

        let err = lifecycle.reserve(1, name).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidInput(_)));
        assert_eq!(store.slot(1).unwrap().unwrap().state(), SlotState::Open);
    }

    #[test]
    fn test_reserve_trims_candidate_name() {
        let (lifecycle, _) = lifecycle_with_open_slot(1);
        let slot = lifecycle.reserve(1, "  Ada ").unwrap();
        assert_eq!(slot.candidate_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_unknown_slot_is_not_found() {
        let (lifecycle, _) = lifecycle_with_open_slot(1);

        assert_eq!(
            lifecycle.reserve(42, "Tom").unwrap_err(),
            SchedulingError::SlotNotFound(42)
        );
        assert_eq!(
            lifecycle.check_in(42).unwrap_err(),
            SchedulingError::SlotNotFound(42)
        );
        assert_eq!(
            lifecycle.cancel(42).unwrap_err(),
            SchedulingError::SlotNotFound(42)
        );
    }

    #[test]
    fn test_check_in_open_slot_fails_without_mutation() {
        let (lifecycle, store) = lifecycle_with_open_slot(1);
        let before = store.slot(1).unwrap().unwrap();

        assert_eq!(
            lifecycle.check_in(1).unwrap_err(),
            SchedulingError::NotReserved(1)
        );
        assert_eq!(store.slot(1).unwrap().unwrap(), before);
    }

    #[test]
    fn test_check_in_twice() {
        let (lifecycle, store) = lifecycle_with_open_slot(1);
        lifecycle.reserve(1, "Tom").unwrap();

        let slot = lifecycle.check_in(1).unwrap();
        assert_eq!(slot.state(), SlotState::CheckedIn);

        assert_eq!(
            lifecycle.check_in(1).unwrap_err(),
            SchedulingError::AlreadyCheckedIn(1)
        );
        assert_eq!(store.slot(1).unwrap().unwrap(), slot);
    }

    #[test]
    fn test_cancel_checked_in_then_reserve_again() {
        let (lifecycle, _) = lifecycle_with_open_slot(1);
        lifecycle.reserve(1, "Tom").unwrap();
        lifecycle.check_in(1).unwrap();

        let slot = lifecycle.cancel(1).unwrap();
        assert_eq!(slot.state(), SlotState::Open);
        assert_eq!(slot.candidate_name, None);
        assert!(!slot.checked_in);

        let slot = lifecycle.reserve(1, "Peter").unwrap();
        assert_eq!(slot.state(), SlotState::Reserved);
        assert_eq!(slot.candidate_name.as_deref(), Some("Peter"));
        assert!(!slot.checked_in);
    }

    #[test]
    fn test_cancel_open_slot() {
        let (lifecycle, _) = lifecycle_with_open_slot(1);
        assert_eq!(
            lifecycle.cancel(1).unwrap_err(),
            SchedulingError::NotReserved(1)
        );
    }

    #[test]
    fn test_concurrent_reservations_have_one_winner() {
        const CONTENDERS: usize = 8;

        for _ in 0..20 {
            let (lifecycle, store) = lifecycle_with_open_slot(7);
            let barrier = Barrier::new(CONTENDERS);

            let results: Vec<(String, Result<Slot, SchedulingError>)> =
                std::thread::scope(|scope| {
                    let handles: Vec<_> = (0..CONTENDERS)
                        .map(|i| {
                            let lifecycle = &lifecycle;
                            let barrier = &barrier;
                            scope.spawn(move || {
                                let name = format!("Candidate {i}");
                                barrier.wait();
                                let result = lifecycle.reserve(7, &name);
                                (name, result)
                            })
                        })
                        .collect();
                    handles.into_iter().map(|h| h.join().unwrap()).collect()
                });

            let winners: Vec<&String> = results
                .iter()
                .filter(|(_, result)| result.is_ok())
                .map(|(name, _)| name)
                .collect();
            assert_eq!(winners.len(), 1);
            for (_, result) in results.iter().filter(|(_, result)| result.is_err()) {
                assert_eq!(
                    result.clone().unwrap_err(),
                    SchedulingError::AlreadyReserved(7)
                );
            }

            let slot = store.slot(7).unwrap().unwrap();
            assert_eq!(slot.candidate_name.as_ref(), Some(winners[0]));
        }
    }

    #[test_case(SlotState::Open, SchedulingError::AlreadyReserved(1); "reserve raced by cancel")]
    #[test_case(SlotState::Reserved, SchedulingError::AlreadyReserved(1); "reserve raced by reserve")]
    fn test_reserve_conflict_explanation(current: SlotState, expected: SchedulingError) {
        let mut slot = Slot::open(1, None, Utc::now());
        if current != SlotState::Open {
            SlotTransition::Reserve {
                candidate_name: "Tom".into(),
            }
            .apply(&mut slot);
        }
        let transition = SlotTransition::Reserve {
            candidate_name: "Peter".into(),
        };
        assert_eq!(transition.conflict(&slot), expected);
    }
}
