//! Leaderboard: read-only ranked projection of users.

use crate::error::Result;
use crate::ledger::LedgerDb;
use crate::models::RankingEntry;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct Leaderboard {
    ledger: Arc<Mutex<LedgerDb>>,
}

impl Leaderboard {
    pub fn new(ledger: Arc<Mutex<LedgerDb>>) -> Self {
        Self { ledger }
    }

    /// Top `limit` users by ranking points, level breaking ties.
    pub fn top(&self, limit: i64) -> Result<Vec<RankingEntry>> {
        self.ledger.lock().top_ranking(limit)
    }
}
