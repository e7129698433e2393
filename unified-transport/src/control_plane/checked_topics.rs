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

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Topic identifiers whose subscribers were already policy-validated by one transport.
///
/// Each topic has one slot. Concurrent callers for the same topic wait on the sweep in flight,
/// so none of them proceeds before it finished. A failed sweep leaves the slot empty and the
/// next caller runs it again. Entries are never evicted.
#[derive(Default)]
pub(crate) struct CheckedTopicSet {
    topics: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl CheckedTopicSet {
    async fn slot(&self, topic_arn: &str) -> Arc<OnceCell<()>> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic_arn.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Runs `sweep` unless `topic_arn` was already checked, waiting for a sweep in flight.
    ///
    /// Returns `true` when this call ran the sweep that checked the topic.
    pub(crate) async fn check_once<F, Fut, E>(&self, topic_arn: &str, sweep: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let slot = self.slot(topic_arn).await;
        if slot.initialized() {
            return Ok(false);
        }

        let mut swept = false;
        slot.get_or_try_init(|| {
            swept = true;
            sweep()
        })
        .await?;
        Ok(swept)
    }
}
