//! Terminal rendering for daemon responses.

use harvest_core::api::{
    AchievementsResponse, CollectResponse, EvaluateResponse, HealthResponse, LoginResponse,
    RankingResponse, RegisterResponse, ResourcesResponse, SellAllResponse, SellResponse,
    UpgradeResponse,
};
use harvest_core::models::CompletedAchievement;
use owo_colors::OwoColorize;

fn print_completed(completed: &[CompletedAchievement]) {
    for item in completed {
        println!(
            "  {} {} (+{} moedas, +{} pontos)",
            "🏆".yellow(),
            item.achievement.name.bold(),
            item.achievement.coin_reward,
            item.achievement.point_reward
        );
    }
}

fn print_level_up(previous: i64, level: i64) {
    if level > previous {
        println!("  {} Subiste para o nível {}!", "⭐".yellow(), level.bold());
    }
}

pub fn register(response: &RegisterResponse) {
    println!("{} {}", "✓".green(), response.message);
    println!("  id: {}", response.user_id);
}

pub fn login(response: &LoginResponse) {
    let user = &response.user;
    println!("{} Bem-vindo, {}!", "✓".green(), user.username.bold());
    println!(
        "  nível {} · {}/{} exp · {} moedas · {} pontos",
        user.level, user.experience, user.experience_to_next, user.coins, user.ranking_points
    );
}

pub fn collect(response: &CollectResponse) {
    println!("{} {}", "✓".green(), response.message);
    println!("  em posse: {}", response.quantity);
    print_level_up(
        response.experience.previous_level,
        response.experience.level,
    );
    print_completed(&response.completed_achievements);
}

pub fn sell(response: &SellResponse) {
    println!("{} {}", "✓".green(), response.message);
    print_level_up(
        response.experience.previous_level,
        response.experience.level,
    );
    print_completed(&response.completed_achievements);
}

pub fn sell_all(response: &SellAllResponse) {
    println!(
        "{} Vendeste tudo por {} moedas.",
        "✓".green(),
        response.total_value.bold()
    );
}

pub fn upgrade(response: &UpgradeResponse) {
    println!("{} {}", "✓".green(), response.message);
    println!("  custo: {} moedas", response.upgrade.cost);
    print_level_up(
        response.experience.previous_level,
        response.experience.level,
    );
    print_completed(&response.completed_achievements);
}

pub fn resources(response: &ResourcesResponse) {
    if response.resources.is_empty() {
        println!("Ainda não tens recursos.");
        return;
    }
    for balance in &response.resources {
        println!(
            "  {:<10} {:>6} ({}, nível {}, {} moedas/unidade)",
            balance.name.bold(),
            balance.quantity,
            balance.category.as_str(),
            balance.production_level,
            balance.unit_value
        );
    }
}

pub fn achievements(response: &AchievementsResponse) {
    for item in &response.achievements {
        let mark = if item.completed {
            "✓".green().to_string()
        } else {
            "·".to_string()
        };
        println!(
            "  {} {:<24} {:>4}/{:<4} {}",
            mark,
            item.achievement.name,
            item.progress.min(item.achievement.objective),
            item.achievement.objective,
            item.achievement.description.dimmed()
        );
    }
}

pub fn evaluate(response: &EvaluateResponse) {
    if response.completed_achievements.is_empty() {
        println!("Nenhuma conquista nova.");
        return;
    }
    print_completed(&response.completed_achievements);
}

pub fn ranking(response: &RankingResponse) {
    for (position, entry) in response.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<16} nível {:<3} {} pontos",
            position + 1,
            entry.username.bold(),
            entry.level,
            entry.ranking_points
        );
    }
}

pub fn health(response: &HealthResponse) {
    println!(
        "{} harvestd {} · up {}s",
        "✓".green(),
        response.version,
        response.uptime_seconds
    );
}
