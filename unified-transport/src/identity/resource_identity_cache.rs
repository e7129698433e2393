/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Single-flight name -> identity cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Outcome of one resolution attempt that did not yield an identity.
enum Miss<E> {
    Absent,
    Failed(E),
}

/// Resource name -> identity entries, populated on first successful resolution and never
/// evicted.
///
/// Concurrent resolutions of the same unseen name share one in-flight lookup. Absence and
/// failures are not cached, so a later call resolves again.
pub(crate) struct ResourceIdentityCache<V> {
    entries: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> ResourceIdentityCache<V>
where
    V: Clone + Send + Sync,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, name: &str) -> Arc<OnceCell<V>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Returns the cached identity, or runs `resolve` once for all concurrent callers.
    ///
    /// `resolve` returns `Ok(None)` when the resource does not exist.
    pub(crate) async fn get_or_resolve<F, Fut, E>(
        &self,
        name: &str,
        resolve: F,
    ) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        let slot = self.slot(name).await;

        let resolved = slot
            .get_or_try_init(move || async move {
                match resolve().await {
                    Ok(Some(identity)) => Ok(identity),
                    Ok(None) => Err(Miss::Absent),
                    Err(err) => Err(Miss::Failed(err)),
                }
            })
            .await;

        match resolved {
            Ok(identity) => Ok(Some(identity.clone())),
            Err(Miss::Absent) => Ok(None),
            Err(Miss::Failed(err)) => Err(err),
        }
    }

    /// Force-inserts a known mapping, replacing any earlier entry.
    pub(crate) async fn seed(&self, name: &str, identity: V) {
        let mut entries = self.entries.lock().await;
        entries.insert(name.to_string(), Arc::new(OnceCell::new_with(Some(identity))));
    }

    #[cfg(test)]
    pub(crate) async fn peek(&self, name: &str) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.get(name).and_then(|slot| slot.get().cloned())
    }
}
