//! SQLite-backed ledger store.
//!
//! Persistent records for users, products, per-user resource balances, the
//! append-only sales log and achievement progress. Pure storage: every
//! business rule (validation, cost curves, reward grants) lives in the
//! engines, which compose the primitive statements below: directly for
//! single-statement operations, or through [`LedgerDb::with_tx`] when
//! several writes must land atomically.

use crate::error::{GameError, Result};
use crate::models::{
    Achievement, AchievementCategory, AchievementId, AchievementKind, AchievementOverview,
    AchievementProgress, Product, ProductCategory, ProductId, RankingEntry, ResourceBalance,
    SaleRecord, User, UserId,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use tracing::info;

/// Default ledger database path for the daemon.
pub const LEDGER_DB_PATH: &str = "/var/lib/harvestd/ledger.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    coins INTEGER NOT NULL DEFAULT 0,
    ranking_points INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    experience INTEGER NOT NULL DEFAULT 0,
    experience_to_next INTEGER NOT NULL DEFAULT 100,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    unit_value INTEGER NOT NULL DEFAULT 1,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL DEFAULT 0,
    production_level INTEGER NOT NULL DEFAULT 1,
    speed INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, product_id)
);

CREATE INDEX IF NOT EXISTS idx_resources_user ON resources(user_id);

CREATE TABLE IF NOT EXISTS sales (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL,
    total_value INTEGER NOT NULL,
    sold_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_user ON sales(user_id);

CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    kind TEXT NOT NULL,
    product_id INTEGER REFERENCES products(id),
    objective INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0,
    point_reward INTEGER NOT NULL DEFAULT 0,
    icon TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS achievement_progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    achievement_id INTEGER NOT NULL REFERENCES achievements(id),
    progress INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    UNIQUE(user_id, achievement_id)
);

CREATE INDEX IF NOT EXISTS idx_progress_user ON achievement_progress(user_id);

CREATE INDEX IF NOT EXISTS idx_users_ranking ON users(ranking_points DESC, level DESC);
"#;

/// Connection wrapper owning the game's persistent state.
pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Open or create the ledger at a specific path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_new = !path.exists();

        let conn = Connection::open(path)?;
        Self::init(&conn)?;

        if is_new {
            info!("Created ledger database at {}", path.display());
        }
        Ok(Self { conn })
    }

    /// Open an in-memory ledger. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        // WAL for better concurrent readers; foreign keys are off by
        // default in SQLite.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)
    }

    /// Run `f` inside a transaction: commit on success, roll back on any
    /// error so no partial write is ever observable.
    pub fn with_tx<T>(&mut self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ---- users ----

    pub fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId> {
        q::insert_user(&self.conn, username, password_hash)
    }

    pub fn user_by_id(&self, user: UserId) -> Result<Option<User>> {
        Ok(q::user_by_id(&self.conn, user)?)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(q::user_by_username(&self.conn, username)?)
    }

    pub fn add_coins(&self, user: UserId, amount: i64) -> Result<()> {
        Ok(q::add_coins(&self.conn, user, amount)?)
    }

    pub fn add_ranking_points(&self, user: UserId, amount: i64) -> Result<()> {
        Ok(q::add_ranking_points(&self.conn, user, amount)?)
    }

    pub fn set_progression(
        &self,
        user: UserId,
        level: i64,
        experience: i64,
        experience_to_next: i64,
    ) -> Result<()> {
        Ok(q::set_progression(
            &self.conn,
            user,
            level,
            experience,
            experience_to_next,
        )?)
    }

    // ---- products ----

    pub fn insert_product(
        &self,
        name: &str,
        category: ProductCategory,
        unit_value: i64,
        description: &str,
    ) -> Result<ProductId> {
        Ok(q::insert_product(
            &self.conn,
            name,
            category,
            unit_value,
            description,
        )?)
    }

    pub fn product_count(&self) -> Result<i64> {
        Ok(q::count(&self.conn, "products")?)
    }

    pub fn product_by_id(&self, product: ProductId) -> Result<Option<Product>> {
        Ok(q::product_by_id(&self.conn, product)?)
    }

    pub fn product_by_name(&self, name: &str) -> Result<Option<Product>> {
        Ok(q::product_by_name(&self.conn, name)?)
    }

    pub fn products(&self) -> Result<Vec<Product>> {
        Ok(q::products(&self.conn)?)
    }

    // ---- resources ----

    /// Create the (user, product) balance row with zero quantity and
    /// production level 1 if the user has never touched this product.
    pub fn create_resource_if_absent(&self, user: UserId, product: ProductId) -> Result<()> {
        Ok(q::create_resource_if_absent(&self.conn, user, product)?)
    }

    pub fn resource(&self, user: UserId, product: ProductId) -> Result<Option<ResourceBalance>> {
        Ok(q::resource(&self.conn, user, product)?)
    }

    pub fn resources_for_user(&self, user: UserId) -> Result<Vec<ResourceBalance>> {
        Ok(q::resources_for_user(&self.conn, user)?)
    }

    pub fn add_resource_quantity(
        &self,
        user: UserId,
        product: ProductId,
        amount: i64,
    ) -> Result<()> {
        Ok(q::add_resource_quantity(&self.conn, user, product, amount)?)
    }

    /// Products the user has a balance row for, in insertion order.
    pub fn touched_products(&self, user: UserId) -> Result<Vec<ProductId>> {
        Ok(q::touched_products(&self.conn, user)?)
    }

    // ---- sales ----

    pub fn insert_sale(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i64,
        total_value: i64,
    ) -> Result<()> {
        Ok(q::insert_sale(&self.conn, user, product, quantity, total_value)?)
    }

    pub fn total_units_sold(&self, user: UserId) -> Result<i64> {
        Ok(q::total_units_sold(&self.conn, user)?)
    }

    pub fn sales_for_user(&self, user: UserId) -> Result<Vec<SaleRecord>> {
        Ok(q::sales_for_user(&self.conn, user)?)
    }

    // ---- achievements ----

    #[allow(clippy::too_many_arguments)]
    pub fn insert_achievement(
        &self,
        name: &str,
        description: &str,
        category: AchievementCategory,
        kind: AchievementKind,
        product: Option<ProductId>,
        objective: i64,
        coin_reward: i64,
        point_reward: i64,
        icon: &str,
    ) -> Result<AchievementId> {
        Ok(q::insert_achievement(
            &self.conn,
            name,
            description,
            category,
            kind,
            product,
            objective,
            coin_reward,
            point_reward,
            icon,
        )?)
    }

    pub fn achievement_count(&self) -> Result<i64> {
        Ok(q::count(&self.conn, "achievements")?)
    }

    /// Achievement definitions of the given kind and product scope that the
    /// user has not completed yet.
    pub fn pending_achievements(
        &self,
        user: UserId,
        kind: AchievementKind,
        product: Option<ProductId>,
    ) -> Result<Vec<Achievement>> {
        Ok(q::pending_achievements(&self.conn, user, kind, product)?)
    }

    pub fn progress_for(
        &self,
        user: UserId,
        achievement: AchievementId,
    ) -> Result<Option<AchievementProgress>> {
        Ok(q::progress_for(&self.conn, user, achievement)?)
    }

    /// Every achievement definition joined with this user's progress,
    /// ordered by category, completion, then objective.
    pub fn achievements_with_progress(&self, user: UserId) -> Result<Vec<AchievementOverview>> {
        Ok(q::achievements_with_progress(&self.conn, user)?)
    }

    // ---- ranking ----

    pub fn top_ranking(&self, limit: i64) -> Result<Vec<RankingEntry>> {
        Ok(q::top_ranking(&self.conn, limit)?)
    }
}

/// Primitive statements, usable on the plain connection or inside a
/// transaction (`Transaction` derefs to `Connection`).
pub(crate) mod q {
    use super::*;

    fn bad_column(idx: usize, message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
    }

    fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: UserId(row.get(0)?),
            username: row.get(1)?,
            password_hash: row.get(2)?,
            coins: row.get(3)?,
            ranking_points: row.get(4)?,
            level: row.get(5)?,
            experience: row.get(6)?,
            experience_to_next: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    const USER_COLUMNS: &str = "id, username, password_hash, coins, ranking_points, \
                                level, experience, experience_to_next, created_at";

    pub fn insert_user(
        conn: &Connection,
        username: &str,
        password_hash: &str,
    ) -> Result<UserId> {
        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now()],
        )
        .map_err(|err| match err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                GameError::Conflict(format!("username '{username}' is already registered"))
            }
            other => GameError::Storage(other),
        })?;
        Ok(UserId(conn.last_insert_rowid()))
    }

    pub fn user_by_id(conn: &Connection, user: UserId) -> rusqlite::Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user.0],
            user_from_row,
        )
        .optional()
    }

    pub fn user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
    }

    pub fn add_coins(conn: &Connection, user: UserId, amount: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE users SET coins = coins + ?1 WHERE id = ?2",
            params![amount, user.0],
        )?;
        Ok(())
    }

    pub fn add_ranking_points(
        conn: &Connection,
        user: UserId,
        amount: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE users SET ranking_points = ranking_points + ?1 WHERE id = ?2",
            params![amount, user.0],
        )?;
        Ok(())
    }

    pub fn set_progression(
        conn: &Connection,
        user: UserId,
        level: i64,
        experience: i64,
        experience_to_next: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE users SET level = ?1, experience = ?2, experience_to_next = ?3 WHERE id = ?4",
            params![level, experience, experience_to_next, user.0],
        )?;
        Ok(())
    }

    fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
        let category: String = row.get(2)?;
        Ok(Product {
            id: ProductId(row.get(0)?),
            name: row.get(1)?,
            category: ProductCategory::parse(&category)
                .ok_or_else(|| bad_column(2, format!("unknown product category: {category}")))?,
            unit_value: row.get(3)?,
            description: row.get(4)?,
        })
    }

    pub fn insert_product(
        conn: &Connection,
        name: &str,
        category: ProductCategory,
        unit_value: i64,
        description: &str,
    ) -> rusqlite::Result<ProductId> {
        conn.execute(
            "INSERT INTO products (name, category, unit_value, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, category.as_str(), unit_value, description],
        )?;
        Ok(ProductId(conn.last_insert_rowid()))
    }

    pub fn product_by_id(
        conn: &Connection,
        product: ProductId,
    ) -> rusqlite::Result<Option<Product>> {
        conn.query_row(
            "SELECT id, name, category, unit_value, description FROM products WHERE id = ?1",
            params![product.0],
            product_from_row,
        )
        .optional()
    }

    pub fn product_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Product>> {
        conn.query_row(
            "SELECT id, name, category, unit_value, description FROM products WHERE name = ?1",
            params![name],
            product_from_row,
        )
        .optional()
    }

    pub fn products(conn: &Connection) -> rusqlite::Result<Vec<Product>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, category, unit_value, description
             FROM products ORDER BY category, unit_value",
        )?;
        let rows = stmt.query_map([], product_from_row)?;
        rows.collect()
    }

    pub fn count(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
    }

    fn resource_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResourceBalance> {
        let category: String = row.get(2)?;
        Ok(ResourceBalance {
            product_id: ProductId(row.get(0)?),
            name: row.get(1)?,
            category: ProductCategory::parse(&category)
                .ok_or_else(|| bad_column(2, format!("unknown product category: {category}")))?,
            unit_value: row.get(3)?,
            description: row.get(4)?,
            quantity: row.get(5)?,
            production_level: row.get(6)?,
            speed: row.get(7)?,
        })
    }

    const RESOURCE_SELECT: &str = "SELECT p.id, p.name, p.category, p.unit_value, p.description,
                    r.quantity, r.production_level, r.speed
             FROM resources r
             JOIN products p ON r.product_id = p.id";

    pub fn create_resource_if_absent(
        conn: &Connection,
        user: UserId,
        product: ProductId,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO resources (user_id, product_id, quantity, production_level, updated_at)
             VALUES (?1, ?2, 0, 1, ?3)",
            params![user.0, product.0, Utc::now()],
        )?;
        Ok(())
    }

    pub fn resource(
        conn: &Connection,
        user: UserId,
        product: ProductId,
    ) -> rusqlite::Result<Option<ResourceBalance>> {
        conn.query_row(
            &format!("{RESOURCE_SELECT} WHERE r.user_id = ?1 AND r.product_id = ?2"),
            params![user.0, product.0],
            resource_from_row,
        )
        .optional()
    }

    pub fn resources_for_user(
        conn: &Connection,
        user: UserId,
    ) -> rusqlite::Result<Vec<ResourceBalance>> {
        let mut stmt =
            conn.prepare(&format!("{RESOURCE_SELECT} WHERE r.user_id = ?1 ORDER BY p.id"))?;
        let rows = stmt.query_map(params![user.0], resource_from_row)?;
        rows.collect()
    }

    pub fn add_resource_quantity(
        conn: &Connection,
        user: UserId,
        product: ProductId,
        amount: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO resources (user_id, product_id, quantity, production_level, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(user_id, product_id)
             DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at",
            params![user.0, product.0, amount, Utc::now()],
        )?;
        Ok(())
    }

    pub fn deduct_resource_quantity(
        conn: &Connection,
        user: UserId,
        product: ProductId,
        amount: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE resources SET quantity = quantity - ?1, updated_at = ?2
             WHERE user_id = ?3 AND product_id = ?4",
            params![amount, Utc::now(), user.0, product.0],
        )?;
        Ok(())
    }

    pub fn increment_production_level(
        conn: &Connection,
        user: UserId,
        product: ProductId,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE resources SET production_level = production_level + 1, updated_at = ?1
             WHERE user_id = ?2 AND product_id = ?3",
            params![Utc::now(), user.0, product.0],
        )?;
        Ok(())
    }

    pub fn touched_products(conn: &Connection, user: UserId) -> rusqlite::Result<Vec<ProductId>> {
        let mut stmt =
            conn.prepare("SELECT product_id FROM resources WHERE user_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![user.0], |row| Ok(ProductId(row.get(0)?)))?;
        rows.collect()
    }

    pub fn insert_sale(
        conn: &Connection,
        user: UserId,
        product: ProductId,
        quantity: i64,
        total_value: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO sales (user_id, product_id, quantity, total_value, sold_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.0, product.0, quantity, total_value, Utc::now()],
        )?;
        Ok(())
    }

    pub fn total_units_sold(conn: &Connection, user: UserId) -> rusqlite::Result<i64> {
        conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales WHERE user_id = ?1",
            params![user.0],
            |row| row.get(0),
        )
    }

    pub fn sales_for_user(conn: &Connection, user: UserId) -> rusqlite::Result<Vec<SaleRecord>> {
        let mut stmt = conn.prepare(
            "SELECT user_id, product_id, quantity, total_value, sold_at
             FROM sales WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user.0], |row| {
            Ok(SaleRecord {
                user_id: UserId(row.get(0)?),
                product_id: ProductId(row.get(1)?),
                quantity: row.get(2)?,
                total_value: row.get(3)?,
                sold_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    fn achievement_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Achievement> {
        let category: String = row.get(3)?;
        let kind: String = row.get(4)?;
        Ok(Achievement {
            id: AchievementId(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            category: AchievementCategory::parse(&category)
                .ok_or_else(|| bad_column(3, format!("unknown achievement category: {category}")))?,
            kind: AchievementKind::parse(&kind)
                .ok_or_else(|| bad_column(4, format!("unknown achievement kind: {kind}")))?,
            product_id: row.get::<_, Option<i64>>(5)?.map(ProductId),
            objective: row.get(6)?,
            coin_reward: row.get(7)?,
            point_reward: row.get(8)?,
            icon: row.get(9)?,
        })
    }

    const ACHIEVEMENT_COLUMNS: &str = "id, name, description, category, kind, product_id, \
                                       objective, coin_reward, point_reward, icon";

    #[allow(clippy::too_many_arguments)]
    pub fn insert_achievement(
        conn: &Connection,
        name: &str,
        description: &str,
        category: AchievementCategory,
        kind: AchievementKind,
        product: Option<ProductId>,
        objective: i64,
        coin_reward: i64,
        point_reward: i64,
        icon: &str,
    ) -> rusqlite::Result<AchievementId> {
        conn.execute(
            "INSERT INTO achievements
                 (name, description, category, kind, product_id, objective,
                  coin_reward, point_reward, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                name,
                description,
                category.as_str(),
                kind.as_str(),
                product.map(|p| p.0),
                objective,
                coin_reward,
                point_reward,
                icon
            ],
        )?;
        Ok(AchievementId(conn.last_insert_rowid()))
    }

    pub fn pending_achievements(
        conn: &Connection,
        user: UserId,
        kind: AchievementKind,
        product: Option<ProductId>,
    ) -> rusqlite::Result<Vec<Achievement>> {
        let sql = format!(
            "SELECT a.{}
             FROM achievements a
             LEFT JOIN achievement_progress ap
               ON a.id = ap.achievement_id AND ap.user_id = ?1
             WHERE a.kind = ?2
               AND (ap.completed IS NULL OR ap.completed = 0)
               AND {}",
            ACHIEVEMENT_COLUMNS.replace(", ", ", a."),
            match product {
                Some(_) => "a.product_id = ?3",
                None => "a.product_id IS NULL",
            }
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = match product {
            Some(product) => stmt.query_map(
                params![user.0, kind.as_str(), product.0],
                achievement_from_row,
            )?,
            None => stmt.query_map(params![user.0, kind.as_str()], achievement_from_row)?,
        };
        rows.collect()
    }

    pub fn progress_for(
        conn: &Connection,
        user: UserId,
        achievement: AchievementId,
    ) -> rusqlite::Result<Option<AchievementProgress>> {
        conn.query_row(
            "SELECT progress, completed, completed_at
             FROM achievement_progress WHERE user_id = ?1 AND achievement_id = ?2",
            params![user.0, achievement.0],
            |row| {
                Ok(AchievementProgress {
                    progress: row.get(0)?,
                    completed: row.get(1)?,
                    completed_at: row.get(2)?,
                })
            },
        )
        .optional()
    }

    pub fn insert_progress(
        conn: &Connection,
        user: UserId,
        achievement: AchievementId,
        progress: i64,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO achievement_progress
                 (user_id, achievement_id, progress, completed, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.0, achievement.0, progress, completed, completed_at],
        )?;
        Ok(())
    }

    pub fn update_progress(
        conn: &Connection,
        user: UserId,
        achievement: AchievementId,
        progress: i64,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE achievement_progress
             SET progress = ?1, completed = ?2, completed_at = ?3
             WHERE user_id = ?4 AND achievement_id = ?5",
            params![progress, completed, completed_at, user.0, achievement.0],
        )?;
        Ok(())
    }

    pub fn achievements_with_progress(
        conn: &Connection,
        user: UserId,
    ) -> rusqlite::Result<Vec<AchievementOverview>> {
        let sql = format!(
            "SELECT a.{}, p.name,
                    COALESCE(ap.progress, 0), COALESCE(ap.completed, 0), ap.completed_at
             FROM achievements a
             LEFT JOIN products p ON a.product_id = p.id
             LEFT JOIN achievement_progress ap
               ON a.id = ap.achievement_id AND ap.user_id = ?1
             ORDER BY a.category, COALESCE(ap.completed, 0) DESC, a.objective",
            ACHIEVEMENT_COLUMNS.replace(", ", ", a."),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user.0], |row| {
            Ok(AchievementOverview {
                achievement: achievement_from_row(row)?,
                product_name: row.get(10)?,
                progress: row.get(11)?,
                completed: row.get(12)?,
                completed_at: row.get(13)?,
            })
        })?;
        rows.collect()
    }

    pub fn top_ranking(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<RankingEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, username, level, ranking_points
             FROM users ORDER BY ranking_points DESC, level DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(RankingEntry {
                user_id: UserId(row.get(0)?),
                username: row.get(1)?,
                level: row.get(2)?,
                ranking_points: row.get(3)?,
            })
        })?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let db = LedgerDb::open_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.product_count().unwrap(), 0);

        // Reopening an existing file must not fail or wipe anything.
        drop(db);
        let db = LedgerDb::open_at(&path).unwrap();
        assert_eq!(db.achievement_count().unwrap(), 0);
    }

    #[test]
    fn test_user_roundtrip() {
        let db = LedgerDb::open_in_memory().unwrap();
        let id = db.insert_user("alice", "$argon2id$stub").unwrap();

        let user = db.user_by_id(id).unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.coins, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.experience_to_next, 100);

        assert!(db.user_by_username("alice").unwrap().is_some());
        assert!(db.user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let db = LedgerDb::open_in_memory().unwrap();
        db.insert_user("alice", "h1").unwrap();

        let err = db.insert_user("alice", "h2").unwrap_err();
        assert!(matches!(err, GameError::Conflict(_)));
    }

    #[test]
    fn test_resource_upsert_accumulates() {
        let db = LedgerDb::open_in_memory().unwrap();
        let user = db.insert_user("alice", "h").unwrap();
        let product = db
            .insert_product("trigo", ProductCategory::Agriculture, 2, "Trigo dourado")
            .unwrap();

        db.add_resource_quantity(user, product, 3).unwrap();
        db.add_resource_quantity(user, product, 4).unwrap();

        let balance = db.resource(user, product).unwrap().unwrap();
        assert_eq!(balance.quantity, 7);
        assert_eq!(balance.production_level, 1);
    }

    #[test]
    fn test_create_resource_if_absent_is_idempotent() {
        let db = LedgerDb::open_in_memory().unwrap();
        let user = db.insert_user("alice", "h").unwrap();
        let product = db
            .insert_product("ferro", ProductCategory::Mining, 5, "")
            .unwrap();

        db.create_resource_if_absent(user, product).unwrap();
        db.add_resource_quantity(user, product, 10).unwrap();
        // Second call must not reset quantity.
        db.create_resource_if_absent(user, product).unwrap();

        let balance = db.resource(user, product).unwrap().unwrap();
        assert_eq!(balance.quantity, 10);
    }

    #[test]
    fn test_with_tx_rolls_back_on_error() {
        let mut db = LedgerDb::open_in_memory().unwrap();
        let user = db.insert_user("alice", "h").unwrap();

        let result: Result<()> = db.with_tx(|tx| {
            q::add_coins(tx, user, 100)?;
            Err(GameError::InvalidArgument("forced failure".into()))
        });
        assert!(result.is_err());

        let coins = db.user_by_id(user).unwrap().unwrap().coins;
        assert_eq!(coins, 0, "coin credit must roll back with the transaction");
    }

    #[test]
    fn test_pending_achievements_scoping() {
        let db = LedgerDb::open_in_memory().unwrap();
        let user = db.insert_user("alice", "h").unwrap();
        let trigo = db
            .insert_product("trigo", ProductCategory::Agriculture, 2, "")
            .unwrap();

        let scoped = db
            .insert_achievement(
                "Agricultor Iniciante",
                "Colhe 10 trigos",
                AchievementCategory::Agriculture,
                AchievementKind::Collect,
                Some(trigo),
                10,
                5,
                10,
                "trigo.png",
            )
            .unwrap();
        db.insert_achievement(
            "Comerciante Iniciante",
            "Vende 20 recursos",
            AchievementCategory::General,
            AchievementKind::Sell,
            None,
            20,
            10,
            20,
            "moedas.png",
        )
        .unwrap();

        let collect = db
            .pending_achievements(user, AchievementKind::Collect, Some(trigo))
            .unwrap();
        assert_eq!(collect.len(), 1);
        assert_eq!(collect[0].id, scoped);

        let sell = db
            .pending_achievements(user, AchievementKind::Sell, None)
            .unwrap();
        assert_eq!(sell.len(), 1);

        // A completed achievement drops out of the pending set.
        q::insert_progress(
            &db.conn,
            user,
            scoped,
            10,
            true,
            Some(Utc::now()),
        )
        .unwrap();
        let collect = db
            .pending_achievements(user, AchievementKind::Collect, Some(trigo))
            .unwrap();
        assert!(collect.is_empty());
    }

    #[test]
    fn test_top_ranking_orders_by_points_then_level() {
        let db = LedgerDb::open_in_memory().unwrap();
        let a = db.insert_user("a", "h").unwrap();
        let b = db.insert_user("b", "h").unwrap();
        let c = db.insert_user("c", "h").unwrap();

        db.add_ranking_points(a, 50).unwrap();
        db.add_ranking_points(b, 50).unwrap();
        db.set_progression(b, 7, 0, 100).unwrap();
        db.add_ranking_points(c, 80).unwrap();

        let top = db.top_ranking(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].username, "c");
        assert_eq!(top[1].username, "b", "level breaks the points tie");
    }
}
