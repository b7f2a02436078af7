//! Names of existing resources, per workgroup and resource kind.
//!
//! Filled by one listing per `(workgroup, kind)` the first time a creation
//! checks for duplicates, then kept up to date by the creations and
//! renames of the session. Never evicted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::checker::IsogeoUuid;
use crate::models::ResourceKind;

type ScopeKey = (IsogeoUuid, ResourceKind);

#[derive(Debug, Default)]
struct Scope {
    populated: OnceCell<()>,
    names: Mutex<HashMap<String, IsogeoUuid>>,
}

impl Scope {
    fn insert(&self, key: String, id: IsogeoUuid) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, id);
    }

    /// Replace every key of `id` with `key`.
    fn rename(&self, key: String, id: IsogeoUuid) {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        names.retain(|_, known| *known != id);
        names.insert(key, id);
    }

    fn get(&self, key: &str) -> Option<IsogeoUuid> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }
}

#[derive(Debug, Default)]
pub struct NameCache {
    scopes: Mutex<HashMap<ScopeKey, Arc<Scope>>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn scope(&self, workgroup: IsogeoUuid, kind: ResourceKind) -> Arc<Scope> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((workgroup, kind))
            .or_default()
            .clone()
    }

    pub fn is_populated(&self, workgroup: IsogeoUuid, kind: ResourceKind) -> bool {
        self.scope(workgroup, kind).populated.initialized()
    }

    /// Run `loader` once for the scope and store the names it returns.
    ///
    /// Concurrent callers wait for the running load. A failed load leaves
    /// the scope empty so the next call tries again.
    pub async fn ensure_populated<F, Fut, E>(
        &self,
        workgroup: IsogeoUuid,
        kind: ResourceKind,
        loader: F,
    ) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<(String, IsogeoUuid)>, E>>,
    {
        let scope = self.scope(workgroup, kind);
        scope
            .populated
            .get_or_try_init(|| async {
                let entries = loader().await?;
                debug!(%workgroup, %kind, count = entries.len(), "name cache populated");
                for (key, id) in entries {
                    scope.insert(key, id);
                }
                Ok::<(), E>(())
            })
            .await?;
        Ok(())
    }

    pub fn lookup_by_name(
        &self,
        workgroup: IsogeoUuid,
        kind: ResourceKind,
        name: &str,
    ) -> Option<IsogeoUuid> {
        self.scope(workgroup, kind).get(name)
    }

    pub fn record_created(
        &self,
        workgroup: IsogeoUuid,
        kind: ResourceKind,
        name: impl Into<String>,
        id: IsogeoUuid,
    ) {
        self.scope(workgroup, kind).insert(name.into(), id);
    }

    /// Record the new uniqueness key of an updated resource. Its previous
    /// key no longer resolves.
    pub fn record_renamed(
        &self,
        workgroup: IsogeoUuid,
        kind: ResourceKind,
        name: impl Into<String>,
        id: IsogeoUuid,
    ) {
        self.scope(workgroup, kind).rename(name.into(), id);
    }

    /// Store the names of a full listing and mark the scope as populated.
    pub fn record_listing(
        &self,
        workgroup: IsogeoUuid,
        kind: ResourceKind,
        entries: impl IntoIterator<Item = (String, IsogeoUuid)>,
    ) {
        let scope = self.scope(workgroup, kind);
        for (key, id) in entries {
            scope.insert(key, id);
        }
        // already set when a loader ran first, the names are merged anyway
        let _ = scope.populated.set(());
    }
}
