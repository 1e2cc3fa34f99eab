//! Game service: the composition root the HTTP layer talks to.
//!
//! Wires the engines together per player action: the economy mutates the
//! ledger, progression grants experience (possibly leveling up), the
//! achievement engine re-evaluates the affected categories, and the
//! aggregated result goes back to the caller. Product names are resolved
//! to typed identifiers here, once; the engines only ever see `ProductId`.

use crate::achievements::AchievementEngine;
use crate::api::{
    AchievementsResponse, CollectResponse, EvaluateResponse, LoginResponse, RankingResponse,
    RegisterResponse, ResourcesResponse, SellAllResponse, SellResponse, UpgradeResponse,
};
use crate::auth::AuthService;
use crate::economy::EconomyEngine;
use crate::error::{GameError, Result};
use crate::ledger::LedgerDb;
use crate::leaderboard::Leaderboard;
use crate::models::{Product, UserId};
use crate::progression::ProgressionEngine;
use parking_lot::Mutex;
use std::sync::Arc;

/// Experience granted per collect action.
const COLLECT_EXPERIENCE: i64 = 1;
/// Experience granted per production upgrade.
const UPGRADE_EXPERIENCE: i64 = 5;

/// Default leaderboard size when the caller does not pass a limit.
pub const DEFAULT_RANKING_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct GameService {
    ledger: Arc<Mutex<LedgerDb>>,
    economy: EconomyEngine,
    progression: ProgressionEngine,
    achievements: AchievementEngine,
    leaderboard: Leaderboard,
    auth: AuthService,
}

impl GameService {
    pub fn new(ledger: LedgerDb) -> Self {
        let ledger = Arc::new(Mutex::new(ledger));
        Self {
            economy: EconomyEngine::new(Arc::clone(&ledger)),
            progression: ProgressionEngine::new(Arc::clone(&ledger)),
            achievements: AchievementEngine::new(Arc::clone(&ledger)),
            leaderboard: Leaderboard::new(Arc::clone(&ledger)),
            auth: AuthService::new(Arc::clone(&ledger)),
            ledger,
        }
    }

    fn resolve_product(&self, name: &str) -> Result<Product> {
        self.ledger
            .lock()
            .product_by_name(name)?
            .ok_or_else(|| GameError::NotFound(format!("product '{name}'")))
    }

    pub fn register(&self, username: &str, password: &str) -> Result<RegisterResponse> {
        let user_id = self.auth.register(username, password)?;
        Ok(RegisterResponse {
            user_id,
            message: "Utilizador registado com sucesso!".into(),
        })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let user = self.auth.login(username, password)?;
        Ok(LoginResponse { user: user.into() })
    }

    /// Collect one yield, then run the collect-achievement check, grant
    /// experience, and re-check level achievements if a level-up happened.
    pub fn collect(&self, user: UserId, product_name: &str) -> Result<CollectResponse> {
        let product = self.resolve_product(product_name)?;
        let outcome = self.economy.collect(user, product.id)?;

        let mut completed = self.achievements.check_collect(user, product.id)?;
        let experience = self.progression.add_experience(user, COLLECT_EXPERIENCE)?;
        if experience.leveled_up {
            completed.extend(self.achievements.check_level(user)?);
        }

        Ok(CollectResponse {
            message: format!("Você obteve {} {}!", outcome.amount_gained, product.name),
            quantity: outcome.quantity,
            amount_gained: outcome.amount_gained,
            experience,
            completed_achievements: completed,
        })
    }

    /// Sell part of a balance; experience is half the quantity sold,
    /// rounded down.
    pub fn sell(&self, user: UserId, product_name: &str, quantity: i64) -> Result<SellResponse> {
        let product = self.resolve_product(product_name)?;
        let sale = self.economy.sell(user, product.id, quantity)?;

        let mut completed = self.achievements.check_sales(user)?;
        let experience = self.progression.add_experience(user, quantity / 2)?;
        if experience.leveled_up {
            completed.extend(self.achievements.check_level(user)?);
        }

        Ok(SellResponse {
            message: format!(
                "Você vendeu {} {} por {} moedas!",
                sale.quantity, product.name, sale.total_value
            ),
            sale,
            experience,
            completed_achievements: completed,
        })
    }

    /// Sell every held balance. No experience and no achievement checks;
    /// the bulk path is economy-only.
    pub fn sell_all(&self, user: UserId) -> Result<SellAllResponse> {
        let total_value = self.economy.sell_all(user)?;
        Ok(SellAllResponse { total_value })
    }

    pub fn upgrade_production(&self, user: UserId, product_name: &str) -> Result<UpgradeResponse> {
        let product = self.resolve_product(product_name)?;
        let upgrade = self.economy.upgrade_production(user, product.id)?;

        let experience = self.progression.add_experience(user, UPGRADE_EXPERIENCE)?;
        let completed = if experience.leveled_up {
            self.achievements.check_level(user)?
        } else {
            Vec::new()
        };

        Ok(UpgradeResponse {
            message: format!(
                "Produção de {} melhorada para nível {}!",
                product.name, upgrade.new_level
            ),
            upgrade,
            experience,
            completed_achievements: completed,
        })
    }

    pub fn resources(&self, user: UserId) -> Result<ResourcesResponse> {
        Ok(ResourcesResponse {
            resources: self.economy.resources(user)?,
        })
    }

    pub fn achievements_overview(&self, user: UserId) -> Result<AchievementsResponse> {
        Ok(AchievementsResponse {
            achievements: self.ledger.lock().achievements_with_progress(user)?,
        })
    }

    /// Periodic/manual full re-sync of every achievement category.
    pub fn evaluate_achievements(&self, user: UserId) -> Result<EvaluateResponse> {
        Ok(EvaluateResponse {
            completed_achievements: self.achievements.evaluate_all(user)?,
        })
    }

    pub fn ranking(&self, limit: Option<i64>) -> Result<RankingResponse> {
        let limit = limit.unwrap_or(DEFAULT_RANKING_LIMIT).max(1);
        Ok(RankingResponse {
            entries: self.leaderboard.top(limit)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_reference_data;

    fn setup() -> (GameService, UserId) {
        let db = LedgerDb::open_in_memory().unwrap();
        seed_reference_data(&db).unwrap();
        let service = GameService::new(db);
        let user = service.register("alice", "segredo123").unwrap().user_id;
        (service, user)
    }

    #[test]
    fn test_collect_flow_grants_experience() {
        let (service, user) = setup();

        let response = service.collect(user, "trigo").unwrap();
        assert_eq!(response.message, "Você obteve 1 trigo!");
        assert_eq!(response.quantity, 1);
        assert_eq!(response.experience.experience, 1);
        assert!(!response.experience.leveled_up);
    }

    #[test]
    fn test_collect_unknown_product() {
        let (service, user) = setup();
        assert!(matches!(
            service.collect(user, "petroleo").unwrap_err(),
            GameError::NotFound(_)
        ));
    }

    #[test]
    fn test_sell_grants_half_quantity_as_experience() {
        let (service, user) = setup();
        for _ in 0..5 {
            service.collect(user, "trigo").unwrap();
        }

        let response = service.sell(user, "trigo", 5).unwrap();
        assert_eq!(response.sale.total_value, 10);
        assert_eq!(response.message, "Você vendeu 5 trigo por 10 moedas!");
        // 5 from collects, floor(5 * 0.5) from the sale.
        assert_eq!(response.experience.experience, 7);
    }

    #[test]
    fn test_level_up_triggers_level_achievement_check() {
        let (service, user) = setup();

        // Climb to level 5 in one collect: level 4 with 99/100 exp.
        {
            let ledger = service.ledger.lock();
            ledger.set_progression(user, 4, 99, 100).unwrap();
        }
        let response = service.collect(user, "trigo").unwrap();
        assert!(response.experience.leveled_up);
        assert_eq!(response.experience.level, 5);

        let names: Vec<&str> = response
            .completed_achievements
            .iter()
            .map(|c| c.achievement.name.as_str())
            .collect();
        assert!(names.contains(&"Novato"), "level-5 achievement completes");
    }

    #[test]
    fn test_upgrade_flow() {
        let (service, user) = setup();
        service.collect(user, "trigo").unwrap();
        service.ledger.lock().add_coins(user, 50).unwrap();

        let response = service.upgrade_production(user, "trigo").unwrap();
        assert_eq!(response.upgrade.cost, 50);
        assert_eq!(response.upgrade.new_level, 2);
        assert_eq!(
            response.message,
            "Produção de trigo melhorada para nível 2!"
        );
        assert_eq!(response.experience.experience, 6, "1 collect + 5 upgrade");
    }

    #[test]
    fn test_ranking_defaults_limit() {
        let (service, _user) = setup();
        let ranking = service.ranking(None).unwrap();
        assert_eq!(ranking.entries.len(), 1);
    }
}
