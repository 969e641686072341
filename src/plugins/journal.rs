//! The care journal: one facade over storage, quotas and audits.
//!
//! Entries are `Pending` as a [`NewEntry`] and `Persisted` as a [`JournalEntry`]
//! once `record_action` returns. There is no path from `Persisted` to anything else.

use crate::core::config::{self, QuotaConfig};
use crate::core::entry::{ActionKind, JournalEntry, NewEntry};
use crate::core::error::ArboristError;
use crate::core::gateway::{Collection, StorageGateway};
use crate::core::store::Store;
use crate::plugins::audit::{AuditEngine, DailyAnomaly, OrderingReport, WeeklyAnomaly};
use crate::plugins::quota::QuotaEngine;
use chrono::{DateTime, Utc};

/// Number of entries `last` shows when no count is given.
pub const DEFAULT_LAST_N: usize = 10;

pub struct Journal {
    gateway: StorageGateway,
    config: QuotaConfig,
}

impl Journal {
    pub fn new(gateway: StorageGateway, config: QuotaConfig) -> Result<Self, ArboristError> {
        config.validate()?;
        Ok(Self { gateway, config })
    }

    /// Journal for `store`, with limits from its `arborist.toml` when present.
    pub fn open(store: &Store) -> Result<Self, ArboristError> {
        let loaded = config::load_config(&store.root)?;
        Self::new(StorageGateway::new(store), loaded.quota)
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    pub fn gateway(&self) -> &StorageGateway {
        &self.gateway
    }

    fn quota(&self) -> QuotaEngine<'_> {
        QuotaEngine::new(&self.gateway, &self.config)
    }

    fn audit(&self) -> AuditEngine<'_> {
        AuditEngine::new(&self.gateway, &self.config)
    }

    /// Persist one care action in the collection owned by `kind`.
    pub fn record_action(
        &self,
        kind: ActionKind,
        entry: &NewEntry,
    ) -> Result<JournalEntry, ArboristError> {
        self.gateway.insert(Collection::for_kind(kind), entry)
    }

    pub fn water_quota(&self, read_at: DateTime<Utc>) -> Result<f64, ArboristError> {
        self.quota().remaining_water(read_at)
    }

    pub fn cut_quota(&self, read_at: DateTime<Utc>) -> Result<i64, ArboristError> {
        self.quota().remaining_cuts(read_at)
    }

    pub fn audit_ordering(&self) -> Result<OrderingReport, ArboristError> {
        self.audit().detect_ordering_anomalies()
    }

    pub fn audit_water(&self) -> Result<Vec<DailyAnomaly>, ArboristError> {
        self.audit().detect_water_anomalies()
    }

    pub fn audit_cuts(&self) -> Result<Vec<WeeklyAnomaly>, ArboristError> {
        self.audit().detect_cut_anomalies()
    }

    /// The `n` most recently inserted entries for `kind`, newest first.
    pub fn last_n(&self, kind: ActionKind, n: usize) -> Result<Vec<JournalEntry>, ArboristError> {
        self.gateway.find_last(Collection::for_kind(kind), n)
    }

    /// Like [`Journal::last_n`], with the action given by name ("cut" or "water").
    pub fn last_n_by_name(
        &self,
        action: &str,
        n: usize,
    ) -> Result<Vec<JournalEntry>, ArboristError> {
        self.last_n(action.parse()?, n)
    }
}
