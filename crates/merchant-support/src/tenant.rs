//! Tenant Resolution
//!
//! Maps `(platform, channelId)` to the tenant scope of a request. Lookups hit
//! an immutable [`MappingSnapshot`] behind an atomically swapped pointer;
//! the writer rebuilds the snapshot off the hot path on a timer, compares
//! content hashes, and only swaps + notifies dependents when something
//! actually changed. Readers never observe a partially updated snapshot.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;
use crate::model::{Platform, TenantContext, TenantId};

/// One row of the backing configuration store: a channel bound to a tenant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub platform: Platform,
    pub channel_id: String,
    pub tenant_id: TenantId,
    pub display_name: String,
}

impl ChannelBinding {
    pub fn new(
        platform: Platform,
        channel_id: impl Into<String>,
        tenant_id: TenantId,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
            tenant_id,
            display_name: display_name.into(),
        }
    }
}

/// Backing configuration store for the channel-to-tenant mapping.
///
/// Pull-refreshed by the resolver; implementations wrap whatever relational
/// store holds the mapping table.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Load every channel binding
    async fn load_bindings(&self) -> Result<Vec<ChannelBinding>>;
}

/// In-memory mapping store (for tests and demos)
pub struct StaticMappingStore {
    bindings: std::sync::RwLock<Vec<ChannelBinding>>,
}

impl StaticMappingStore {
    pub fn new(bindings: Vec<ChannelBinding>) -> Self {
        Self {
            bindings: std::sync::RwLock::new(bindings),
        }
    }

    /// Replace the stored bindings (next refresh picks them up)
    pub fn set_bindings(&self, bindings: Vec<ChannelBinding>) {
        *self.bindings.write().unwrap() = bindings;
    }
}

#[async_trait]
impl MappingStore for StaticMappingStore {
    async fn load_bindings(&self) -> Result<Vec<ChannelBinding>> {
        Ok(self.bindings.read().unwrap().clone())
    }
}

/// Immutable, fully built copy of the mapping table.
///
/// A channel bound to several related tenants resolves to one context with
/// all their ids and a deduplicated merged display name.
#[derive(Debug)]
pub struct MappingSnapshot {
    entries: HashMap<(Platform, String), TenantContext>,
    content_hash: u64,
}

impl MappingSnapshot {
    /// Build a snapshot from raw bindings
    pub fn build(mut bindings: Vec<ChannelBinding>) -> Self {
        // Canonical order first: the content hash must not depend on the
        // store's row order, and merge output must be stable.
        bindings.sort_by(|a, b| {
            (a.platform, &a.channel_id, a.tenant_id).cmp(&(b.platform, &b.channel_id, b.tenant_id))
        });

        let mut hasher = DefaultHasher::new();
        for binding in &bindings {
            binding.platform.hash(&mut hasher);
            binding.channel_id.hash(&mut hasher);
            binding.tenant_id.hash(&mut hasher);
            binding.display_name.hash(&mut hasher);
        }
        let content_hash = hasher.finish();

        let mut entries: HashMap<(Platform, String), TenantContext> = HashMap::new();
        for binding in bindings {
            let key = (binding.platform, binding.channel_id.clone());
            let entry = entries.entry(key).or_insert_with(|| TenantContext {
                tenant_ids: Vec::new(),
                display_name: String::new(),
                platform: binding.platform,
                channel_id: binding.channel_id.clone(),
            });

            if !entry.tenant_ids.contains(&binding.tenant_id) {
                entry.tenant_ids.push(binding.tenant_id);
            }

            let already_named = entry
                .display_name
                .split(" / ")
                .any(|name| name.eq_ignore_ascii_case(&binding.display_name));
            if !already_named {
                if !entry.display_name.is_empty() {
                    entry.display_name.push_str(" / ");
                }
                entry.display_name.push_str(&binding.display_name);
            }
        }

        Self {
            entries,
            content_hash,
        }
    }

    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Look up the context bound to a channel
    pub fn lookup(&self, platform: Platform, channel_id: &str) -> Option<&TenantContext> {
        self.entries.get(&(platform, channel_id.to_string()))
    }

    /// Hash of the canonical binding list, for change suppression
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolver over the current snapshot, with timer-driven refresh
pub struct TenantResolver {
    store: Arc<dyn MappingStore>,
    snapshot: ArcSwap<MappingSnapshot>,
    changes: watch::Sender<u64>,
}

impl TenantResolver {
    /// Create with an empty snapshot; call [`Self::refresh`] to load
    pub fn new(store: Arc<dyn MappingStore>) -> Self {
        let snapshot = MappingSnapshot::empty();
        let (changes, _) = watch::channel(snapshot.content_hash());
        Self {
            store,
            snapshot: ArcSwap::from_pointee(snapshot),
            changes,
        }
    }

    /// Create and load the initial snapshot
    pub async fn with_initial_load(store: Arc<dyn MappingStore>) -> Result<Self> {
        let resolver = Self::new(store);
        resolver.refresh().await?;
        Ok(resolver)
    }

    /// Resolve a channel to its tenant context, derived fresh from the
    /// current snapshot. `None` means the channel is unmapped and the caller
    /// must short-circuit with its refusal message.
    pub fn resolve(&self, platform: Platform, channel_id: &str) -> Option<TenantContext> {
        self.snapshot.load().lookup(platform, channel_id).cloned()
    }

    /// Rebuild the snapshot from the backing store. Swaps and notifies only
    /// when the content hash changed; returns whether a swap happened.
    pub async fn refresh(&self) -> Result<bool> {
        let bindings = self.store.load_bindings().await?;
        let next = MappingSnapshot::build(bindings);

        if next.content_hash() == self.snapshot.load().content_hash() {
            tracing::debug!("mapping snapshot unchanged, skipping swap");
            return Ok(false);
        }

        let hash = next.content_hash();
        let channels = next.len();
        self.snapshot.store(Arc::new(next));
        let _ = self.changes.send(hash);
        tracing::info!(channels, "mapping snapshot swapped");
        Ok(true)
    }

    /// Subscribe to snapshot changes (receives the new content hash)
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Spawn the background refresh timer
    pub fn spawn_refresh(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let resolver = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; skip it, construction already
            // decided the initial state.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = resolver.refresh().await {
                    tracing::warn!("mapping refresh failed: {}", e);
                }
            }
        })
    }

    /// Number of mapped channels in the current snapshot
    pub fn mapped_channels(&self) -> usize {
        self.snapshot.load().len()
    }
}
