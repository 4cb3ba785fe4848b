//! Usage/Tier Gate — model permissions and day-scoped usage quotas.
//!
//! Quota policy is static configuration, not computed. Counters are advisory:
//! read-modify-write without cross-process locking, fail-open on store errors.
//! The store is injected (`Arc<dyn UsageStore>`) so server deployments can
//! swap the in-memory default without touching the gate logic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::transform::types::Model;

/// Fixed demo premium keys, merged with `PREMIUM_KEYS` from the environment.
/// Plain set membership — no cryptographic verification.
const DEMO_PREMIUM_KEYS: &[&str] = &["premium_demo_2024", "dev_premium_123", "early_access_key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    Free,
    Premium,
}

/// Resolves the caller's tier from an optional premium key.
/// Fails open to `Free` on a missing or unknown key.
pub fn resolve_tier(premium_key: Option<&str>, configured_keys: &[String]) -> UserTier {
    match premium_key {
        Some(key)
            if DEMO_PREMIUM_KEYS.contains(&key)
                || configured_keys.iter().any(|k| k == key) =>
        {
            UserTier::Premium
        }
        _ => UserTier::Free,
    }
}

/// The tier a model belongs to. Free-tier models are usable by anyone.
pub fn model_tier(model: Model) -> UserTier {
    match model {
        Model::Gpt4oMini => UserTier::Free,
        Model::Gpt4o => UserTier::Premium,
    }
}

pub fn can_use_model(model: Model, tier: UserTier) -> bool {
    match model_tier(model) {
        UserTier::Free => true,
        UserTier::Premium => tier == UserTier::Premium,
    }
}

/// Daily quota for (tier, model). `None` means the combination is not served.
pub fn usage_limit(tier: UserTier, model: Model) -> Option<u32> {
    match (tier, model) {
        (UserTier::Free, Model::Gpt4oMini) => Some(5),
        (UserTier::Free, Model::Gpt4o) => None,
        (UserTier::Premium, Model::Gpt4oMini) => Some(50),
        (UserTier::Premium, Model::Gpt4o) => Some(10),
    }
}

/// One day's usage for a model. The counter resets implicitly when the stored
/// date no longer matches today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub used: u32,
}

/// Result of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCheck {
    pub can_use: bool,
    pub remaining: u32,
    pub limit: u32,
}

/// Persistence seam for usage counters.
/// Implementations must be cheap to clone behind an `Arc`.
pub trait UsageStore: Send + Sync {
    fn load(&self, model: Model) -> Result<Option<UsageRecord>>;
    fn store(&self, model: Model, record: UsageRecord) -> Result<()>;
}

/// Default store: a process-local map. Counters do not survive restarts,
/// which matches the advisory nature of the quota.
#[derive(Default)]
pub struct InMemoryUsageStore {
    records: Mutex<HashMap<Model, UsageRecord>>,
}

impl UsageStore for InMemoryUsageStore {
    fn load(&self, model: Model) -> Result<Option<UsageRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("usage store lock poisoned"))?;
        Ok(records.get(&model).copied())
    }

    fn store(&self, model: Model, record: UsageRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("usage store lock poisoned"))?;
        records.insert(model, record);
        Ok(())
    }
}

/// The gate itself: quota checks and increments against the injected store.
#[derive(Clone)]
pub struct UsageGate {
    store: Arc<dyn UsageStore>,
}

impl UsageGate {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Returns today's remaining budget for (tier, model).
    /// An unreadable store counts as zero usage (fail open).
    pub fn check(&self, model: Model, tier: UserTier) -> UsageCheck {
        let Some(limit) = usage_limit(tier, model) else {
            return UsageCheck {
                can_use: false,
                remaining: 0,
                limit: 0,
            };
        };

        let used = self.used_today(model);
        let remaining = limit.saturating_sub(used);

        UsageCheck {
            can_use: remaining > 0,
            remaining,
            limit,
        }
    }

    /// Increments today's counter for the model, resetting to 1 if the stored
    /// date differs from today. Store failures are logged, never surfaced.
    pub fn record_use(&self, model: Model) {
        let today = Utc::now().date_naive();
        let used = self.used_today(model) + 1;
        let record = UsageRecord { date: today, used };
        if let Err(e) = self.store.store(model, record) {
            warn!("Failed to persist usage for {}: {e}", model.as_str());
        }
    }

    fn used_today(&self, model: Model) -> u32 {
        let today = Utc::now().date_naive();
        match self.store.load(model) {
            Ok(Some(record)) if record.date == today => record.used,
            Ok(_) => 0,
            Err(e) => {
                warn!("Usage store unreadable for {} ({e}); treating as zero", model.as_str());
                0
            }
        }
    }
}
