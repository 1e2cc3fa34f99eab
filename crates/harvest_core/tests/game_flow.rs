//! End-to-end walk through the game flows against a seeded ledger.

use harvest_core::models::UserId;
use harvest_core::seed::seed_reference_data;
use harvest_core::{GameError, GameService, LedgerDb};

fn new_game() -> GameService {
    let db = LedgerDb::open_in_memory().unwrap();
    seed_reference_data(&db).unwrap();
    GameService::new(db)
}

fn new_player(service: &GameService, name: &str) -> UserId {
    service.register(name, "segredo123").unwrap().user_id
}

#[test]
fn trigo_collect_and_sell_scenario() {
    let service = new_game();
    let user = new_player(&service, "alice");

    // Five collects at production level 1.
    let mut last_quantity = 0;
    for _ in 0..5 {
        last_quantity = service.collect(user, "trigo").unwrap().quantity;
    }
    assert_eq!(last_quantity, 5);

    // Selling all five: unit value 2 -> 10 coins, balance emptied.
    let sale = service.sell(user, "trigo", 5).unwrap();
    assert_eq!(sale.sale.total_value, 10);

    let resources = service.resources(user).unwrap().resources;
    let trigo = resources.iter().find(|r| r.name == "trigo").unwrap();
    assert_eq!(trigo.quantity, 0);

    let profile = service.login("alice", "segredo123").unwrap().user;
    assert_eq!(profile.coins, 10);
}

#[test]
fn agricultor_iniciante_completes_exactly_once() {
    let service = new_game();
    let user = new_player(&service, "alice");

    // Nine collects: the 10-trigo achievement is still pending.
    for _ in 0..9 {
        let response = service.collect(user, "trigo").unwrap();
        assert!(response
            .completed_achievements
            .iter()
            .all(|c| c.achievement.name != "Agricultor Iniciante"));
    }

    // The tenth collect crosses the objective: +5 coins, +10 points.
    let response = service.collect(user, "trigo").unwrap();
    let starter = response
        .completed_achievements
        .iter()
        .find(|c| c.achievement.name == "Agricultor Iniciante")
        .expect("achievement completes on reaching 10");
    assert_eq!(starter.progress, 10);

    let profile = service.login("alice", "segredo123").unwrap().user;
    assert_eq!(profile.coins, 5);
    assert_eq!(profile.ranking_points, 10);

    // Repeated evaluation never grants again.
    let resync = service.evaluate_achievements(user).unwrap();
    assert!(resync
        .completed_achievements
        .iter()
        .all(|c| c.achievement.name != "Agricultor Iniciante"));
    let profile = service.login("alice", "segredo123").unwrap().user;
    assert_eq!(profile.coins, 5);
    assert_eq!(profile.ranking_points, 10);
}

#[test]
fn selling_more_than_held_fails_cleanly() {
    let service = new_game();
    let user = new_player(&service, "alice");

    service.collect(user, "ouro").unwrap();
    let err = service.sell(user, "ouro", 3).unwrap_err();
    assert!(matches!(err, GameError::InsufficientResource { .. }));

    let resources = service.resources(user).unwrap().resources;
    assert_eq!(resources[0].quantity, 1, "balance untouched after failure");
    let profile = service.login("alice", "segredo123").unwrap().user;
    assert_eq!(profile.coins, 0, "coins untouched after failure");
}

#[test]
fn sell_all_empties_every_balance() {
    let service = new_game();
    let user = new_player(&service, "alice");

    for _ in 0..4 {
        service.collect(user, "madeira").unwrap();
    }
    for _ in 0..2 {
        service.collect(user, "diamante").unwrap();
    }

    let response = service.sell_all(user).unwrap();
    assert_eq!(response.total_value, 4 * 3 + 2 * 25);

    let resources = service.resources(user).unwrap().resources;
    assert!(resources.iter().all(|r| r.quantity == 0));
}

#[test]
fn upgrade_cost_table_and_funding() {
    let service = new_game();
    let user = new_player(&service, "alice");
    service.collect(user, "batata").unwrap();

    // Not enough coins for the first upgrade.
    assert!(matches!(
        service.upgrade_production(user, "batata").unwrap_err(),
        GameError::InsufficientFunds {
            required: 50,
            ..
        }
    ));

    // Fund three upgrades (50 + 75 + 112) by selling a pile of diamante.
    for _ in 0..10 {
        service.collect(user, "diamante").unwrap();
    }
    let earned = service.sell_all(user).unwrap().total_value;
    assert!(earned >= 50 + 75 + 112);

    for expected_cost in [50, 75, 112] {
        let upgrade = service.upgrade_production(user, "batata").unwrap();
        assert_eq!(upgrade.upgrade.cost, expected_cost);
    }

    // Production level 4 now: one collect yields 4 units.
    let response = service.collect(user, "batata").unwrap();
    assert_eq!(response.amount_gained, 4);
}

#[test]
fn achievements_overview_lists_catalog_with_progress() {
    let service = new_game();
    let user = new_player(&service, "alice");

    for _ in 0..3 {
        service.collect(user, "trigo").unwrap();
    }
    let overview = service.achievements_overview(user).unwrap().achievements;
    assert_eq!(overview.len(), 15, "full catalog is always listed");

    let starter = overview
        .iter()
        .find(|a| a.achievement.name == "Agricultor Iniciante")
        .unwrap();
    assert_eq!(starter.progress, 3);
    assert!(!starter.completed);
    assert_eq!(starter.product_name.as_deref(), Some("trigo"));
}

#[test]
fn leaderboard_ranks_by_points_then_level() {
    let service = new_game();
    let alice = new_player(&service, "alice");
    let bruno = new_player(&service, "bruno");

    // Alice completes the 10-trigo achievement (+10 ranking points).
    for _ in 0..10 {
        service.collect(alice, "trigo").unwrap();
    }
    let _ = bruno;

    let ranking = service.ranking(Some(10)).unwrap().entries;
    assert_eq!(ranking[0].username, "alice");
    assert_eq!(ranking[0].ranking_points, 10);
}
