//! Per-quarter resolution of the topic forest across the storage tiers.
//!
//! A quarter's forest comes from the first tier that has it:
//!
//! 1. the local cache, keyed by quarter;
//! 2. the published snapshot `data/<quarter>/queue.json` from the remote
//!    source, copied into the local cache on success;
//! 3. on the initial load only, the pre-quarter legacy record, copied into the
//!    quarter's cache slot (the legacy record itself is kept);
//! 4. otherwise an empty forest.
//!
//! Every failure along the way (missing key, corrupt JSON, unreachable or
//! erroring remote) reads as "not here" and moves on to the next tier.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::remote::RemoteSource;
use crate::{Forest, Quarter, Result, Storage, Topic};

/// Cache key of the single, unpartitioned record written before quarters existed.
pub const LEGACY_KEY: &str = "research-queue-data";
/// Cache key of the view layer's expanded-node set.
pub const EXPANDED_KEY: &str = "research-expanded";
/// Remote path of the published quarter index.
pub const INDEX_PATH: &str = "data/index.json";

/// The tier a forest was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    LocalCache,
    RemoteSnapshot,
    LegacyMigration,
    Empty,
}

/// Quarters published by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterIndex {
    pub quarters: Vec<Quarter>,
}

impl QuarterIndex {
    fn current_only() -> Self {
        Self {
            quarters: vec![Quarter::current()],
        }
    }
}

/// Loads and saves quarter forests over a local [`Storage`] and a read-only
/// [`RemoteSource`].
pub struct PersistenceResolver {
    storage: Storage,
    remote: Box<dyn RemoteSource>,
    initial_quarter: Quarter,
}

impl PersistenceResolver {
    /// Creates a resolver whose initial quarter is the current one.
    pub fn new(storage: Storage, remote: impl RemoteSource + 'static) -> Self {
        Self {
            storage,
            remote: Box::new(remote),
            initial_quarter: Quarter::current(),
        }
    }

    /// Overrides the quarter activated at startup (and eligible for legacy migration).
    #[must_use]
    pub fn with_initial_quarter(mut self, quarter: Quarter) -> Self {
        self.initial_quarter = quarter;
        self
    }

    pub fn initial_quarter(&self) -> Quarter {
        self.initial_quarter
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Resolves `quarter` through the cache and remote tiers.
    pub async fn load(&self, quarter: Quarter) -> Forest {
        self.load_with_tier(quarter).await.0
    }

    /// Like [`load`](Self::load), also reporting which tier answered.
    pub async fn load_with_tier(&self, quarter: Quarter) -> (Forest, ResolutionTier) {
        let resolved = self.resolve(quarter, false).await;
        debug!("resolved quarter {quarter} from {:?}", resolved.1);
        resolved
    }

    /// Resolves the initial quarter, falling back to the legacy record when
    /// neither the cache nor the remote has it.
    pub async fn load_initial(&self) -> (Forest, ResolutionTier) {
        let quarter = self.initial_quarter;
        let resolved = self.resolve(quarter, true).await;
        debug!("resolved initial quarter {quarter} from {:?}", resolved.1);
        resolved
    }

    async fn resolve(&self, quarter: Quarter, allow_legacy: bool) -> (Forest, ResolutionTier) {
        if let Some(topics) = self.read_cached(quarter) {
            return (topics, ResolutionTier::LocalCache);
        }

        if let Some(topics) = self.fetch_snapshot(quarter).await {
            self.write_back(quarter, &topics);
            return (topics, ResolutionTier::RemoteSnapshot);
        }

        if allow_legacy {
            if let Some(topics) = self.read_forest(LEGACY_KEY) {
                info!(
                    "migrating {} legacy topic(s) into quarter {quarter}",
                    topics.len()
                );
                self.write_back(quarter, &topics);
                return (topics, ResolutionTier::LegacyMigration);
            }
        }

        (Vec::new(), ResolutionTier::Empty)
    }

    /// Writes `topics` to the local cache slot of `quarter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ResearchQueueError::Database`] if the write fails.
    pub fn save(&self, quarter: Quarter, topics: &[Topic]) -> Result<()> {
        let json = serde_json::to_string(topics)?;
        self.storage.set(&quarter.storage_key(), &json)
    }

    /// Reads the published quarter index; absent or unusable means "just the
    /// current quarter".
    pub async fn load_index(&self) -> QuarterIndex {
        let body = match self.remote.fetch(INDEX_PATH).await {
            Ok(Some(body)) => body,
            Ok(None) => return QuarterIndex::current_only(),
            Err(e) => {
                debug!("quarter index unavailable: {e}");
                return QuarterIndex::current_only();
            }
        };

        let tokens = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(mut map)) => match map.remove("quarters") {
                Some(Value::Array(tokens)) => tokens,
                _ => return QuarterIndex::current_only(),
            },
            Ok(_) => return QuarterIndex::current_only(),
            Err(e) => {
                warn!("quarter index is not valid JSON: {e}");
                return QuarterIndex::current_only();
            }
        };

        let quarters: Vec<Quarter> = tokens
            .iter()
            .filter_map(|token| match token.as_str().map(Quarter::parse) {
                Some(Ok(quarter)) => Some(quarter),
                _ => {
                    warn!("skipping unreadable quarter {token} in index");
                    None
                }
            })
            .collect();

        if quarters.is_empty() {
            QuarterIndex::current_only()
        } else {
            QuarterIndex { quarters }
        }
    }

    /// The persisted expanded-node set; missing or corrupt reads as empty.
    pub fn load_expanded(&self) -> HashSet<String> {
        match self.storage.get(EXPANDED_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw)
                .map(|ids| ids.into_iter().collect())
                .unwrap_or_default(),
            Ok(None) => HashSet::new(),
            Err(e) => {
                warn!("failed to read expanded topics: {e}");
                HashSet::new()
            }
        }
    }

    pub fn save_expanded(&self, expanded: &HashSet<String>) -> Result<()> {
        let mut ids: Vec<&String> = expanded.iter().collect();
        ids.sort();
        self.storage
            .set(EXPANDED_KEY, &serde_json::to_string(&ids)?)
    }

    fn read_cached(&self, quarter: Quarter) -> Option<Forest> {
        self.read_forest(&quarter.storage_key())
    }

    fn read_forest(&self, key: &str) -> Option<Forest> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("failed to read cache key {key}: {e}");
                return None;
            }
        };
        match serde_json::from_str::<Forest>(&raw) {
            Ok(topics) => Some(topics),
            Err(e) => {
                warn!("ignoring corrupt cache entry {key}: {e}");
                None
            }
        }
    }

    async fn fetch_snapshot(&self, quarter: Quarter) -> Option<Forest> {
        let path = quarter.snapshot_path();
        let body = match self.remote.fetch(&path).await {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                debug!("snapshot {path} unavailable: {e}");
                return None;
            }
        };
        match published_topics(&body) {
            Some(topics) => Some(topics),
            None => {
                warn!("ignoring unreadable snapshot {path}");
                None
            }
        }
    }

    fn write_back(&self, quarter: Quarter, topics: &[Topic]) {
        if let Err(e) = self.save(quarter, topics) {
            warn!("failed to cache quarter {quarter}: {e}");
        }
    }
}

/// `topics` of a published snapshot; a snapshot object without `topics` is empty.
fn published_topics(body: &str) -> Option<Forest> {
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(mut map) => match map.remove("topics") {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(topics) => serde_json::from_value(topics).ok(),
        },
        _ => None,
    }
}
