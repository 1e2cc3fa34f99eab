//! Reference-data seeding.
//!
//! Products and achievement definitions are static catalogs created once at
//! initialization and read-only afterwards. Seeding is idempotent: each
//! catalog is only inserted when its table is empty.

use crate::error::{GameError, Result};
use crate::ledger::LedgerDb;
use crate::models::{AchievementCategory, AchievementKind, ProductCategory, ProductId};
use std::collections::HashMap;
use tracing::info;

use AchievementCategory as Ac;
use AchievementKind as Ak;
use ProductCategory as Pc;

const PRODUCTS: &[(&str, ProductCategory, i64, &str)] = &[
    ("trigo", Pc::Agriculture, 2, "Trigo dourado e nutritivo"),
    ("milho", Pc::Agriculture, 3, "Milho amarelo e saboroso"),
    ("batata", Pc::Agriculture, 4, "Batata da terra para refeições"),
    ("ferro", Pc::Mining, 5, "Minério de ferro resistente"),
    ("ouro", Pc::Mining, 10, "Minério de ouro valioso"),
    ("diamante", Pc::Mining, 25, "Diamante raro e brilhante"),
    ("madeira", Pc::Forestry, 3, "Madeira robusta para construção"),
    ("resina", Pc::Forestry, 5, "Resina natural para cola"),
    ("folhas", Pc::Forestry, 2, "Folhas verdes para decoração"),
];

// name, description, category, kind, target product, objective,
// coin reward, point reward, icon
type AchievementRow = (
    &'static str,
    &'static str,
    AchievementCategory,
    AchievementKind,
    Option<&'static str>,
    i64,
    i64,
    i64,
    &'static str,
);

const ACHIEVEMENTS: &[AchievementRow] = &[
    ("Agricultor Iniciante", "Colhe 10 trigos", Ac::Agriculture, Ak::Collect, Some("trigo"), 10, 5, 10, "trigo.png"),
    ("Agricultor Experiente", "Colhe 200 trigos", Ac::Agriculture, Ak::Collect, Some("trigo"), 200, 100, 20, "trigo.png"),
    ("Agricultor de Milho", "Colhe 25 milhos", Ac::Agriculture, Ak::Collect, Some("milho"), 25, 10, 15, "milho.png"),
    ("Rei da Batata", "Colhe 200 batatas", Ac::Agriculture, Ak::Collect, Some("batata"), 200, 100, 20, "batata.png"),
    ("Mineiro Iniciante", "Minera 10 ferros", Ac::Mining, Ak::Collect, Some("ferro"), 10, 10, 15, "ferro.png"),
    ("Caçador de Ouro", "Minera 200 ouros", Ac::Mining, Ak::Collect, Some("ouro"), 200, 100, 30, "ouro.png"),
    ("Minerador de Diamantes", "Minera 5 diamantes", Ac::Mining, Ak::Collect, Some("diamante"), 5, 50, 50, "diamante.png"),
    ("Lenhador Iniciante", "Apanha 15 madeiras", Ac::Forestry, Ak::Collect, Some("madeira"), 15, 8, 12, "madeira.png"),
    ("Coletor de Resina", "Apanha 10 resinas", Ac::Forestry, Ak::Collect, Some("resina"), 10, 15, 20, "resina.png"),
    ("Guardião da Floresta", "Apanha 200 folhas", Ac::Forestry, Ak::Collect, Some("folhas"), 200, 100, 15, "folhas.png"),
    ("Comerciante Iniciante", "Vende 20 recursos", Ac::General, Ak::Sell, None, 20, 10, 20, "moedas.png"),
    ("Comerciante Experiente", "Vende 200 recursos", Ac::General, Ak::Sell, None, 200, 100, 40, "moedas.png"),
    ("Novato", "Alcança o nível 5", Ac::General, Ak::Level, None, 5, 25, 30, "nivel.png"),
    ("Experiente", "Alcança o nível 10", Ac::General, Ak::Level, None, 10, 50, 60, "nivel.png"),
    ("Mestre", "Alcança o nível 20", Ac::General, Ak::Level, None, 20, 100, 120, "nivel.png"),
];

/// Seed the product and achievement catalogs if they are missing.
pub fn seed_reference_data(ledger: &LedgerDb) -> Result<()> {
    let mut products_by_name: HashMap<String, ProductId> = ledger
        .products()?
        .into_iter()
        .map(|p| (p.name, p.id))
        .collect();

    if ledger.product_count()? == 0 {
        for (name, category, unit_value, description) in PRODUCTS {
            let id = ledger.insert_product(name, *category, *unit_value, description)?;
            products_by_name.insert((*name).to_string(), id);
        }
        info!("Seeded {} products", PRODUCTS.len());
    }

    if ledger.achievement_count()? == 0 {
        for (name, description, category, kind, product, objective, coins, points, icon) in
            ACHIEVEMENTS
        {
            let product_id = match product {
                Some(p) => Some(*products_by_name.get(*p).ok_or_else(|| {
                    GameError::NotFound(format!("seed references unknown product '{p}'"))
                })?),
                None => None,
            };
            ledger.insert_achievement(
                name, description, *category, *kind, product_id, *objective, *coins, *points,
                icon,
            )?;
        }
        info!("Seeded {} achievements", ACHIEVEMENTS.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let db = LedgerDb::open_in_memory().unwrap();

        seed_reference_data(&db).unwrap();
        assert_eq!(db.product_count().unwrap(), 9);
        assert_eq!(db.achievement_count().unwrap(), 15);

        seed_reference_data(&db).unwrap();
        assert_eq!(db.product_count().unwrap(), 9);
        assert_eq!(db.achievement_count().unwrap(), 15);
    }

    #[test]
    fn test_seed_links_collect_achievements_to_products() {
        let db = LedgerDb::open_in_memory().unwrap();
        seed_reference_data(&db).unwrap();

        let trigo = db.product_by_name("trigo").unwrap().unwrap();
        assert_eq!(trigo.unit_value, 2);

        let pending = db
            .pending_achievements(crate::models::UserId(1), AchievementKind::Collect, Some(trigo.id))
            .unwrap();
        assert_eq!(pending.len(), 2, "two trigo collect achievements");
    }
}
