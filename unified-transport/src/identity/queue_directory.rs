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

//! Queue name -> identity resolution.

use crate::addressing::address::{Address, AddressKind, ServiceKind};
use crate::error::TransportError;
use crate::identity::resource_identity_cache::ResourceIdentityCache;
use crate::observability::events;
use crate::services::{QueueIdentity, QueueService};
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "queue_directory";

/// Resolves queue addresses to their locator URL and identifier.
///
/// Bare names are cached by name. Identifiers and URLs are cached by their full form and only
/// resolve when the queue found by name carries that exact identity, so a queue of the same name
/// in another account never answers for it.
pub(crate) struct QueueDirectory {
    queues: Arc<dyn QueueService>,
    cache: ResourceIdentityCache<QueueIdentity>,
}

impl QueueDirectory {
    pub(crate) fn new(queues: Arc<dyn QueueService>) -> Self {
        Self {
            queues,
            cache: ResourceIdentityCache::new(),
        }
    }

    pub(crate) fn service(&self) -> &Arc<dyn QueueService> {
        &self.queues
    }

    /// Returns the queue's identity, creating the queue first when allowed and absent.
    ///
    /// `Ok(None)` means the queue does not exist and was not created. Addresses that name the
    /// topic service are rejected with [`TransportError::UnsupportedDestination`].
    pub(crate) async fn resolve(
        &self,
        address: &Address,
        create_if_absent: bool,
    ) -> Result<Option<QueueIdentity>, TransportError> {
        if address.service() == ServiceKind::Topic {
            return Err(TransportError::UnsupportedDestination {
                address: address.to_string(),
                service: ServiceKind::Topic,
            });
        }

        let name = address.resource_id();
        let key = address.full_identity().unwrap_or(name);
        let queues = &self.queues;

        self.cache
            .get_or_resolve(key, || async move {
                let existing = queues
                    .get_queue_identity(name)
                    .await
                    .map_err(|err| TransportError::remote("get queue identity", err))?;
                if let Some(identity) = existing {
                    return Ok(Self::matching(address, identity));
                }

                if !create_if_absent {
                    debug!(
                        event = events::IDENTITY_LOOKUP_MISS,
                        component = COMPONENT,
                        queue = %address,
                        "queue does not exist"
                    );
                    return Ok(None);
                }

                queues
                    .create_queue(name)
                    .await
                    .map_err(|err| TransportError::remote("create queue", err))?;
                let created = queues
                    .get_queue_identity(name)
                    .await
                    .map_err(|err| TransportError::remote("get queue identity", err))?;

                info!(
                    event = events::IDENTITY_CREATED,
                    component = COMPONENT,
                    queue = name,
                    "created queue"
                );
                Ok(created.and_then(|identity| Self::matching(address, identity)))
            })
            .await
    }

    /// Keeps `identity` only if it is the queue `address` names.
    fn matching(address: &Address, identity: QueueIdentity) -> Option<QueueIdentity> {
        let matches = match (address.kind(), address.full_identity()) {
            (AddressKind::FullyQualifiedId, Some(arn)) => identity.arn == arn,
            (AddressKind::LocatorUrl, Some(url)) => {
                identity.url.trim_end_matches('/') == url.trim_end_matches('/')
            }
            _ => true,
        };

        if !matches {
            debug!(
                event = events::IDENTITY_LOOKUP_MISS,
                component = COMPONENT,
                queue = %address,
                found = identity.arn.as_str(),
                "queue of that name has a different identity"
            );
            return None;
        }
        Some(identity)
    }

    /// Caches `identity` under `name` and under its identifier and URL.
    pub(crate) async fn seed(&self, name: &str, identity: QueueIdentity) {
        debug!(
            event = events::IDENTITY_CACHE_SEEDED,
            component = COMPONENT,
            queue = name,
            arn = identity.arn.as_str(),
            "seeded queue identity"
        );
        self.cache.seed(&identity.arn, identity.clone()).await;
        self.cache.seed(&identity.url, identity.clone()).await;
        self.cache.seed(name, identity).await;
    }
}
