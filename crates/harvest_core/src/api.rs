//! JSON schemas for the Harvest API.
//!
//! Shared between the daemon's handlers and the CLI client so both sides
//! agree on the wire shapes.

use crate::economy::{SaleOutcome, UpgradeOutcome};
use crate::models::{
    AchievementOverview, CompletedAchievement, ExperienceResult, RankingEntry, ResourceBalance,
    User, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player profile as exposed over the wire. Never carries the password
/// hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub coins: i64,
    pub ranking_points: i64,
    pub level: i64,
    pub experience: i64,
    pub experience_to_next: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            coins: user.coins,
            ranking_points: user.ranking_points,
            level: user.level,
            experience: user.experience,
            experience_to_next: user.experience_to_next,
            created_at: user.created_at,
        }
    }
}

/// Request to register a new player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Response to a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub message: String,
}

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
}

/// Request to collect one yield of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectRequest {
    pub user_id: UserId,
    pub product: String,
}

/// Response to a collect action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectResponse {
    pub message: String,
    /// Quantity held after the collect.
    pub quantity: i64,
    pub amount_gained: i64,
    pub experience: ExperienceResult,
    pub completed_achievements: Vec<CompletedAchievement>,
}

/// Request to sell part of a balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellRequest {
    pub user_id: UserId,
    pub product: String,
    pub quantity: i64,
}

/// Response to a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellResponse {
    pub message: String,
    pub sale: SaleOutcome,
    pub experience: ExperienceResult,
    pub completed_achievements: Vec<CompletedAchievement>,
}

/// Request to sell every held resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellAllRequest {
    pub user_id: UserId,
}

/// Response to a sell-all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellAllResponse {
    pub total_value: i64,
}

/// Request to upgrade a product's production level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeRequest {
    pub user_id: UserId,
    pub product: String,
}

/// Response to a production upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeResponse {
    pub message: String,
    pub upgrade: UpgradeOutcome,
    pub experience: ExperienceResult,
    pub completed_achievements: Vec<CompletedAchievement>,
}

/// Request to list a user's resource balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesRequest {
    pub user_id: UserId,
}

/// Response listing a user's resource balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesResponse {
    pub resources: Vec<ResourceBalance>,
}

/// Request to list the achievement catalog with a user's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsRequest {
    pub user_id: UserId,
}

/// Response listing the achievement catalog with the user's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementOverview>,
}

/// Request for a full achievement re-sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub user_id: UserId,
}

/// Response to an achievement re-sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub completed_achievements: Vec<CompletedAchievement>,
}

/// Leaderboard response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResponse {
    pub entries: Vec<RankingEntry>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
