//! Domain types for the game ledger and engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a product (collectible resource type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

/// Identifier of an achievement definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered player with their economic and progression state.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub coins: i64,
    pub ranking_points: i64,
    pub level: i64,
    pub experience: i64,
    pub experience_to_next: i64,
    pub created_at: DateTime<Utc>,
}

/// Product categories. Every product belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Agriculture,
    Mining,
    Forestry,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Agriculture => "agriculture",
            ProductCategory::Mining => "mining",
            ProductCategory::Forestry => "forestry",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agriculture" => Some(ProductCategory::Agriculture),
            "mining" => Some(ProductCategory::Mining),
            "forestry" => Some(ProductCategory::Forestry),
            _ => None,
        }
    }
}

/// Static reference data: a collectible resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: ProductCategory,
    /// Coins credited per unit sold.
    pub unit_value: i64,
    pub description: String,
}

/// Per-(user, product) holdings, joined with the product's reference data.
///
/// Created lazily the first time a user touches a product. Quantity never
/// goes negative; the economy engine checks before every decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBalance {
    pub product_id: ProductId,
    pub name: String,
    pub category: ProductCategory,
    pub unit_value: i64,
    pub description: String,
    pub quantity: i64,
    /// Units yielded by a single collect action.
    pub production_level: i64,
    pub speed: i64,
}

/// One line of the append-only sales ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub total_value: i64,
    pub sold_at: DateTime<Utc>,
}

/// What an achievement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Collect,
    Sell,
    Level,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::Collect => "collect",
            AchievementKind::Sell => "sell",
            AchievementKind::Level => "level",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "collect" => Some(AchievementKind::Collect),
            "sell" => Some(AchievementKind::Sell),
            "level" => Some(AchievementKind::Level),
            _ => None,
        }
    }
}

/// Achievement grouping shown to the player. Adds `General` for
/// achievements not tied to a product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Agriculture,
    Mining,
    Forestry,
    General,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::Agriculture => "agriculture",
            AchievementCategory::Mining => "mining",
            AchievementCategory::Forestry => "forestry",
            AchievementCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agriculture" => Some(AchievementCategory::Agriculture),
            "mining" => Some(AchievementCategory::Mining),
            "forestry" => Some(AchievementCategory::Forestry),
            "general" => Some(AchievementCategory::General),
            _ => None,
        }
    }
}

/// Static achievement definition, seeded once and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub kind: AchievementKind,
    /// Target product; `None` means the check is category-agnostic.
    pub product_id: Option<ProductId>,
    /// Progress value required for completion.
    pub objective: i64,
    pub coin_reward: i64,
    pub point_reward: i64,
    pub icon: String,
}

/// Per-(user, achievement) progress row.
#[derive(Debug, Clone)]
pub struct AchievementProgress {
    pub progress: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// An achievement that transitioned to completed during an evaluation,
/// together with the progress value that completed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedAchievement {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub progress: i64,
}

/// An achievement definition joined with one user's progress, for the
/// achievements screen. Users without a progress row show zero progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementOverview {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub product_name: Option<String>,
    pub progress: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of an experience grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceResult {
    pub previous_level: i64,
    pub level: i64,
    pub leveled_up: bool,
    pub experience: i64,
    pub experience_to_next: i64,
}

/// One row of the leaderboard projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub user_id: UserId,
    pub username: String,
    pub level: i64,
    pub ranking_points: i64,
}
