//! Economy engine: collect, sell and production-upgrade operations.
//!
//! Every multi-field mutation (sell, upgrade) runs inside one ledger
//! transaction; a user's coin balance and resource quantity can never
//! diverge from a half-applied operation. Collect is a single atomic
//! increment and needs no explicit transaction.

use crate::error::{GameError, Result};
use crate::ledger::{q, LedgerDb};
use crate::models::{ProductId, ResourceBalance, UserId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Base cost of the first production upgrade.
const UPGRADE_BASE_COST: f64 = 50.0;

/// Cost of upgrading production from `level` to `level + 1`:
/// `floor(50 * 1.5^(level - 1))`.
pub fn upgrade_cost(level: i64) -> i64 {
    (UPGRADE_BASE_COST * 1.5f64.powi((level - 1) as i32)).floor() as i64
}

/// Result of a collect action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectOutcome {
    /// Units added by this collect (the production level).
    pub amount_gained: i64,
    /// Quantity held after the collect.
    pub quantity: i64,
}

/// Result of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub quantity: i64,
    pub total_value: i64,
}

/// Result of a production upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeOutcome {
    pub previous_level: i64,
    pub new_level: i64,
    pub cost: i64,
}

/// Stateless service over the shared ledger handle.
#[derive(Clone)]
pub struct EconomyEngine {
    ledger: Arc<Mutex<LedgerDb>>,
}

impl EconomyEngine {
    pub fn new(ledger: Arc<Mutex<LedgerDb>>) -> Self {
        Self { ledger }
    }

    /// Collect one yield of `product`: the balance row is created lazily
    /// and `production_level` units are added. No upper bound.
    pub fn collect(&self, user: UserId, product: ProductId) -> Result<CollectOutcome> {
        let ledger = self.ledger.lock();

        if ledger.product_by_id(product)?.is_none() {
            return Err(GameError::NotFound(format!("product {product}")));
        }
        ledger.create_resource_if_absent(user, product)?;
        let balance = ledger
            .resource(user, product)?
            .ok_or_else(|| GameError::NotFound(format!("resource for product {product}")))?;

        let gained = balance.production_level;
        ledger.add_resource_quantity(user, product, gained)?;

        Ok(CollectOutcome {
            amount_gained: gained,
            quantity: balance.quantity + gained,
        })
    }

    /// Sell `quantity` units of `product`: decrement the balance, credit
    /// the coins and append the sale record, all three or none.
    pub fn sell(&self, user: UserId, product: ProductId, quantity: i64) -> Result<SaleOutcome> {
        if quantity <= 0 {
            return Err(GameError::InvalidArgument(
                "sale quantity must be positive".into(),
            ));
        }

        let mut ledger = self.ledger.lock();
        ledger.with_tx(|tx| {
            let product_row = q::product_by_id(tx, product)?
                .ok_or_else(|| GameError::NotFound(format!("product {product}")))?;
            let held = q::resource(tx, user, product)?.map_or(0, |r| r.quantity);
            if held < quantity {
                return Err(GameError::InsufficientResource {
                    available: held,
                    requested: quantity,
                });
            }

            let total_value = quantity * product_row.unit_value;
            q::deduct_resource_quantity(tx, user, product, quantity)?;
            q::add_coins(tx, user, total_value)?;
            q::insert_sale(tx, user, product, quantity, total_value)?;

            Ok(SaleOutcome {
                quantity,
                total_value,
            })
        })
    }

    /// Sell every balance with a positive quantity, each sale as its own
    /// transaction. An item failure is logged and skipped; earlier sales
    /// stay committed.
    pub fn sell_all(&self, user: UserId) -> Result<i64> {
        let balances = self.ledger.lock().resources_for_user(user)?;

        let mut total_value = 0;
        for balance in balances.iter().filter(|b| b.quantity > 0) {
            match self.sell(user, balance.product_id, balance.quantity) {
                Ok(outcome) => total_value += outcome.total_value,
                Err(err) => {
                    warn!("sell-all: skipping {} for user {user}: {err}", balance.name);
                }
            }
        }
        Ok(total_value)
    }

    /// Upgrade the production level of `product` by one, debiting the
    /// upgrade cost. Debit and level bump are one transaction.
    pub fn upgrade_production(&self, user: UserId, product: ProductId) -> Result<UpgradeOutcome> {
        let mut ledger = self.ledger.lock();
        ledger.with_tx(|tx| {
            let balance = q::resource(tx, user, product)?
                .ok_or_else(|| GameError::NotFound(format!("resource for product {product}")))?;
            let cost = upgrade_cost(balance.production_level);

            let coins = q::user_by_id(tx, user)?
                .ok_or_else(|| GameError::NotFound(format!("user {user}")))?
                .coins;
            if coins < cost {
                return Err(GameError::InsufficientFunds {
                    available: coins,
                    required: cost,
                });
            }

            q::add_coins(tx, user, -cost)?;
            q::increment_production_level(tx, user, product)?;

            Ok(UpgradeOutcome {
                previous_level: balance.production_level,
                new_level: balance.production_level + 1,
                cost,
            })
        })
    }

    /// All balances of a user, joined with product reference data.
    pub fn resources(&self, user: UserId) -> Result<Vec<ResourceBalance>> {
        self.ledger.lock().resources_for_user(user)
    }
}
