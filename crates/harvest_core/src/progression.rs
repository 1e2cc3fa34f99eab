//! Progression engine: experience accumulation and the level-up curve.

use crate::error::{GameError, Result};
use crate::ledger::LedgerDb;
use crate::models::{ExperienceResult, UserId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Growth factor applied to the experience threshold on every level-up.
const THRESHOLD_GROWTH: f64 = 1.5;

#[derive(Clone)]
pub struct ProgressionEngine {
    ledger: Arc<Mutex<LedgerDb>>,
}

impl ProgressionEngine {
    pub fn new(ledger: Arc<Mutex<LedgerDb>>) -> Self {
        Self { ledger }
    }

    /// Add `amount` experience, rolling overflow into level-ups.
    ///
    /// The threshold grows by `floor(threshold * 1.5)` at each step. The
    /// curve is iterative on purpose, so the per-level rounding compounds
    /// exactly. After the update `experience < experience_to_next` always
    /// holds.
    pub fn add_experience(&self, user: UserId, amount: i64) -> Result<ExperienceResult> {
        let ledger = self.ledger.lock();
        let current = ledger
            .user_by_id(user)?
            .ok_or_else(|| GameError::NotFound(format!("user {user}")))?;

        let previous_level = current.level;
        let mut level = current.level;
        let mut experience = current.experience + amount;
        let mut threshold = current.experience_to_next;

        while experience >= threshold {
            level += 1;
            experience -= threshold;
            threshold = (threshold as f64 * THRESHOLD_GROWTH).floor() as i64;
        }

        ledger.set_progression(user, level, experience, threshold)?;

        Ok(ExperienceResult {
            previous_level,
            level,
            leveled_up: level > previous_level,
            experience,
            experience_to_next: threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ProgressionEngine, Arc<Mutex<LedgerDb>>, UserId) {
        let db = LedgerDb::open_in_memory().unwrap();
        let user = db.insert_user("alice", "h").unwrap();
        let ledger = Arc::new(Mutex::new(db));
        (ProgressionEngine::new(Arc::clone(&ledger)), ledger, user)
    }

    #[test]
    fn test_small_grant_does_not_level() {
        let (progression, _ledger, user) = setup();

        let result = progression.add_experience(user, 40).unwrap();
        assert_eq!(result.previous_level, 1);
        assert_eq!(result.level, 1);
        assert!(!result.leveled_up);
        assert_eq!(result.experience, 40);
        assert_eq!(result.experience_to_next, 100);
    }

    #[test]
    fn test_overflow_rolls_into_level_up() {
        let (progression, ledger, user) = setup();

        // Level 1, 90/100 exp; +20 crosses the threshold once.
        ledger.lock().set_progression(user, 1, 90, 100).unwrap();
        let result = progression.add_experience(user, 20).unwrap();

        assert_eq!(result.previous_level, 1);
        assert_eq!(result.level, 2);
        assert!(result.leveled_up);
        assert_eq!(result.experience, 10);
        assert_eq!(result.experience_to_next, 150);
    }

    #[test]
    fn test_large_grant_crosses_multiple_levels() {
        let (progression, _ledger, user) = setup();

        // 100 + 150 = 250 spent on two level-ups, 10 left over; the
        // threshold compounds 100 -> 150 -> 225.
        let result = progression.add_experience(user, 260).unwrap();
        assert_eq!(result.level, 3);
        assert_eq!(result.experience, 10);
        assert_eq!(result.experience_to_next, 225);
    }

    #[test]
    fn test_split_grants_equal_one_grant() {
        let (progression, ledger, user) = setup();

        progression.add_experience(user, 10).unwrap();
        let split = progression.add_experience(user, 15).unwrap();

        let db = LedgerDb::open_in_memory().unwrap();
        let other = db.insert_user("bob", "h").unwrap();
        let single = ProgressionEngine::new(Arc::new(Mutex::new(db)))
            .add_experience(other, 25)
            .unwrap();

        assert_eq!(split.level, single.level);
        assert_eq!(split.experience, single.experience);
        assert_eq!(split.experience_to_next, single.experience_to_next);

        let stored = ledger.lock().user_by_id(user).unwrap().unwrap();
        assert_eq!(stored.experience, 25);
    }

    #[test]
    fn test_missing_user() {
        let (progression, _ledger, _user) = setup();
        let err = progression.add_experience(UserId(404), 10).unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
    }
}
