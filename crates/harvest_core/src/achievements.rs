//! Achievement engine.
//!
//! Evaluates a user's cumulative stats against the achievement catalog and
//! grants one-time rewards. Two update strategies coexist and are both
//! kept on purpose:
//!
//! - incremental: progress accumulates the observed value on every
//!   evaluation (sale totals, level checks);
//! - absolute: progress is set to the live resource quantity, and the
//!   write is skipped when neither the value nor the completion bit would
//!   change (collect checks).
//!
//! Each candidate's progress write plus reward grant is one transaction of
//! its own. Completion is terminal: a completed achievement never re-enters
//! the candidate set, so a reward can never be granted twice.

use crate::error::Result;
use crate::ledger::{q, LedgerDb};
use crate::models::{Achievement, AchievementKind, CompletedAchievement, ProductId, UserId};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Transaction;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AchievementEngine {
    ledger: Arc<Mutex<LedgerDb>>,
}

impl AchievementEngine {
    pub fn new(ledger: Arc<Mutex<LedgerDb>>) -> Self {
        Self { ledger }
    }

    /// Incremental evaluation: add `observed` to every matching candidate's
    /// progress and complete those that reach their objective.
    ///
    /// Used by the sell check (observed = lifetime units sold) and the
    /// level check (observed = current level): the aggregate feeds a
    /// running counter, it is not compared absolutely.
    pub fn evaluate(
        &self,
        user: UserId,
        kind: AchievementKind,
        product: Option<ProductId>,
        observed: i64,
    ) -> Result<Vec<CompletedAchievement>> {
        let mut ledger = self.ledger.lock();
        let pending = ledger.pending_achievements(user, kind, product)?;

        let mut completed_now = Vec::new();
        for achievement in pending {
            let completed = ledger.with_tx(|tx| {
                let existing = q::progress_for(tx, user, achievement.id)?;
                let progress = existing.as_ref().map_or(0, |row| row.progress) + observed;
                let completed = progress >= achievement.objective;
                let completed_at = if completed { Some(Utc::now()) } else { None };

                match existing {
                    None => q::insert_progress(
                        tx,
                        user,
                        achievement.id,
                        progress,
                        completed,
                        completed_at,
                    )?,
                    Some(_) => q::update_progress(
                        tx,
                        user,
                        achievement.id,
                        progress,
                        completed,
                        completed_at,
                    )?,
                }
                if completed {
                    grant_rewards(tx, user, &achievement)?;
                }
                Ok(completed.then_some(progress))
            })?;

            if let Some(progress) = completed {
                info!("user {user} completed achievement '{}'", achievement.name);
                completed_now.push(CompletedAchievement {
                    achievement,
                    progress,
                });
            }
        }
        Ok(completed_now)
    }

    /// Absolute evaluation for collect achievements of one product:
    /// progress is set to the current total quantity. Skips the write
    /// entirely when the stored value would not change and completion
    /// would not newly become true, so repeated checks against an unmoved
    /// quantity are free.
    pub fn check_collect(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Vec<CompletedAchievement>> {
        let mut ledger = self.ledger.lock();
        let quantity = match ledger.resource(user, product)? {
            Some(balance) => balance.quantity,
            None => return Ok(Vec::new()),
        };
        let pending = ledger.pending_achievements(user, AchievementKind::Collect, Some(product))?;

        let mut completed_now = Vec::new();
        for achievement in pending {
            let completed = ledger.with_tx(|tx| {
                let existing = q::progress_for(tx, user, achievement.id)?;
                let completed = quantity >= achievement.objective;
                let completed_at = if completed { Some(Utc::now()) } else { None };

                match existing {
                    None => q::insert_progress(
                        tx,
                        user,
                        achievement.id,
                        quantity,
                        completed,
                        completed_at,
                    )?,
                    Some(row) => {
                        if row.progress == quantity && !(completed && !row.completed) {
                            // Nothing moved; skip the write and the grant.
                            return Ok(None);
                        }
                        q::update_progress(
                            tx,
                            user,
                            achievement.id,
                            quantity,
                            completed,
                            completed_at,
                        )?;
                    }
                }
                if completed {
                    grant_rewards(tx, user, &achievement)?;
                }
                Ok(completed.then_some(quantity))
            })?;

            if let Some(progress) = completed {
                info!("user {user} completed achievement '{}'", achievement.name);
                completed_now.push(CompletedAchievement {
                    achievement,
                    progress,
                });
            }
        }
        Ok(completed_now)
    }

    /// Sell check: incremental evaluation against the lifetime sum of sold
    /// units. No sales, no evaluation.
    pub fn check_sales(&self, user: UserId) -> Result<Vec<CompletedAchievement>> {
        let total_sold = self.ledger.lock().total_units_sold(user)?;
        if total_sold == 0 {
            return Ok(Vec::new());
        }
        self.evaluate(user, AchievementKind::Sell, None, total_sold)
    }

    /// Level check: incremental evaluation against the current level.
    /// Unknown users evaluate to nothing.
    pub fn check_level(&self, user: UserId) -> Result<Vec<CompletedAchievement>> {
        let level = match self.ledger.lock().user_by_id(user)? {
            Some(row) => row.level,
            None => return Ok(Vec::new()),
        };
        self.evaluate(user, AchievementKind::Level, None, level)
    }

    /// Full re-sync: collect checks for every product the user has ever
    /// touched, then the sell check, then the level check. Returns the
    /// union of newly-completed achievements.
    pub fn evaluate_all(&self, user: UserId) -> Result<Vec<CompletedAchievement>> {
        let touched = self.ledger.lock().touched_products(user)?;

        let mut completed = Vec::new();
        for product in touched {
            completed.extend(self.check_collect(user, product)?);
        }
        completed.extend(self.check_sales(user)?);
        completed.extend(self.check_level(user)?);
        Ok(completed)
    }
}

/// Credit the achievement's rewards, each component only when positive.
fn grant_rewards(tx: &Transaction<'_>, user: UserId, achievement: &Achievement) -> Result<()> {
    if achievement.coin_reward > 0 {
        q::add_coins(tx, user, achievement.coin_reward)?;
    }
    if achievement.point_reward > 0 {
        q::add_ranking_points(tx, user, achievement.point_reward)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_reference_data;

    fn setup() -> (AchievementEngine, Arc<Mutex<LedgerDb>>, UserId) {
        let db = LedgerDb::open_in_memory().unwrap();
        seed_reference_data(&db).unwrap();
        let user = db.insert_user("alice", "h").unwrap();
        let ledger = Arc::new(Mutex::new(db));
        (AchievementEngine::new(Arc::clone(&ledger)), ledger, user)
    }

    fn trigo(ledger: &Arc<Mutex<LedgerDb>>) -> ProductId {
        ledger.lock().product_by_name("trigo").unwrap().unwrap().id
    }

    #[test]
    fn test_collect_check_tracks_live_quantity() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);

        ledger.lock().add_resource_quantity(user, trigo, 4).unwrap();
        assert!(achievements.check_collect(user, trigo).unwrap().is_empty());

        // Progress mirrors the quantity, it is not a running delta.
        let first = seeded_trigo_starter(&ledger);
        let progress = ledger.lock().progress_for(user, first).unwrap().unwrap();
        assert_eq!(progress.progress, 4);

        ledger.lock().add_resource_quantity(user, trigo, 3).unwrap();
        achievements.check_collect(user, trigo).unwrap();
        let progress = ledger.lock().progress_for(user, first).unwrap().unwrap();
        assert_eq!(progress.progress, 7);
    }

    fn seeded_trigo_starter(ledger: &Arc<Mutex<LedgerDb>>) -> crate::models::AchievementId {
        let trigo = ledger.lock().product_by_name("trigo").unwrap().unwrap().id;
        ledger
            .lock()
            .pending_achievements(UserId(0), AchievementKind::Collect, Some(trigo))
            .unwrap()
            .into_iter()
            .find(|a| a.name == "Agricultor Iniciante")
            .unwrap()
            .id
    }

    #[test]
    fn test_collect_completion_grants_once() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);

        ledger.lock().add_resource_quantity(user, trigo, 10).unwrap();
        let completed = achievements.check_collect(user, trigo).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].achievement.name, "Agricultor Iniciante");
        assert_eq!(completed[0].progress, 10);

        let after_first = ledger.lock().user_by_id(user).unwrap().unwrap();
        assert_eq!(after_first.coins, 5);
        assert_eq!(after_first.ranking_points, 10);

        // Re-evaluation is a no-op: the achievement left the pending set.
        let again = achievements.check_collect(user, trigo).unwrap();
        assert!(again.is_empty());
        let after_second = ledger.lock().user_by_id(user).unwrap().unwrap();
        assert_eq!(after_second.coins, 5);
        assert_eq!(after_second.ranking_points, 10);
    }

    #[test]
    fn test_collect_completion_stamps_time() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);
        let starter = seeded_trigo_starter(&ledger);

        ledger.lock().add_resource_quantity(user, trigo, 12).unwrap();
        achievements.check_collect(user, trigo).unwrap();

        let progress = ledger.lock().progress_for(user, starter).unwrap().unwrap();
        assert!(progress.completed);
        assert!(progress.completed_at.is_some());
    }

    #[test]
    fn test_unchanged_quantity_skips_progress_write() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);
        let starter = seeded_trigo_starter(&ledger);

        ledger.lock().add_resource_quantity(user, trigo, 4).unwrap();
        achievements.check_collect(user, trigo).unwrap();
        let before = ledger.lock().progress_for(user, starter).unwrap().unwrap();

        achievements.check_collect(user, trigo).unwrap();
        let after = ledger.lock().progress_for(user, starter).unwrap().unwrap();
        assert_eq!(before.progress, after.progress);
        assert!(!after.completed);
    }

    #[test]
    fn test_sell_check_accumulates_lifetime_totals() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);

        {
            let ledger = ledger.lock();
            ledger.add_resource_quantity(user, trigo, 30).unwrap();
            ledger.insert_sale(user, trigo, 15, 30).unwrap();
        }
        assert!(achievements.check_sales(user).unwrap().is_empty());

        // The second evaluation adds the new lifetime total on top of the
        // stored counter (15 + 20 >= 20) and completes the starter
        // achievement.
        ledger.lock().insert_sale(user, trigo, 5, 10).unwrap();
        let completed = achievements.check_sales(user).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].achievement.name, "Comerciante Iniciante");

        let profile = ledger.lock().user_by_id(user).unwrap().unwrap();
        assert_eq!(profile.coins, 10);
        assert_eq!(profile.ranking_points, 20);
    }

    #[test]
    fn test_no_sales_no_evaluation() {
        let (achievements, _ledger, user) = setup();
        assert!(achievements.check_sales(user).unwrap().is_empty());
    }

    #[test]
    fn test_level_check_completes_threshold_achievements() {
        let (achievements, ledger, user) = setup();

        ledger.lock().set_progression(user, 5, 0, 100).unwrap();
        let completed = achievements.check_level(user).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].achievement.name, "Novato");

        // Completed achievements never re-enter the candidate set.
        let again = achievements.check_level(user).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_evaluate_all_unions_newly_completed() {
        let (achievements, ledger, user) = setup();
        let trigo = trigo(&ledger);

        {
            let ledger = ledger.lock();
            ledger.add_resource_quantity(user, trigo, 10).unwrap();
            ledger.insert_sale(user, trigo, 20, 40).unwrap();
            ledger.set_progression(user, 5, 0, 100).unwrap();
        }

        let completed = achievements.evaluate_all(user).unwrap();
        let names: Vec<&str> = completed
            .iter()
            .map(|c| c.achievement.name.as_str())
            .collect();
        assert!(names.contains(&"Agricultor Iniciante"));
        assert!(names.contains(&"Comerciante Iniciante"));
        assert!(names.contains(&"Novato"));
    }
}
