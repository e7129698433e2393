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

//! Topic name -> identifier resolution.

use crate::addressing::address::{Address, AddressKind, ServiceKind};
use crate::error::TransportError;
use crate::identity::resource_identity_cache::ResourceIdentityCache;
use crate::observability::events;
use crate::options::CreateTopicsOptions;
use crate::services::TopicService;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "topic_directory";

pub(crate) struct TopicDirectory {
    topics: Arc<dyn TopicService>,
    cache: ResourceIdentityCache<String>,
    topic_attributes: HashMap<String, String>,
    page_limit: usize,
    warned_on_lookup: AtomicBool,
}

impl TopicDirectory {
    pub(crate) fn new(
        topics: Arc<dyn TopicService>,
        create_topics: &CreateTopicsOptions,
        page_limit: usize,
    ) -> Self {
        Self {
            topics,
            cache: ResourceIdentityCache::new(),
            topic_attributes: create_topics.topic_attributes(),
            page_limit,
            warned_on_lookup: AtomicBool::new(false),
        }
    }

    pub(crate) fn service(&self) -> &Arc<dyn TopicService> {
        &self.topics
    }

    /// Returns the topic identifier for `address`, creating the topic when allowed and absent.
    ///
    /// Identifier addresses are returned as-is without a remote call. Addresses that name the
    /// queue service, and locator URLs, are rejected with
    /// [`TransportError::UnsupportedDestination`].
    pub(crate) async fn resolve(
        &self,
        address: &Address,
        create_if_absent: bool,
    ) -> Result<Option<String>, TransportError> {
        match (address.kind(), address.service()) {
            (AddressKind::LocatorUrl, service) | (_, service @ ServiceKind::Queue) => {
                Err(TransportError::UnsupportedDestination {
                    address: address.to_string(),
                    service,
                })
            }
            (AddressKind::FullyQualifiedId, _) => {
                Ok(address.full_identity().map(str::to_string))
            }
            (AddressKind::Unqualified, _) => {
                self.resolve_name(address.resource_id(), create_if_absent)
                    .await
            }
        }
    }

    async fn resolve_name(
        &self,
        name: &str,
        create_if_absent: bool,
    ) -> Result<Option<String>, TransportError> {
        self.cache
            .get_or_resolve(name, || async move {
                if !self.warned_on_lookup.swap(true, Ordering::Relaxed) {
                    warn!(
                        event = events::IDENTITY_LOOKUP_SCAN,
                        component = COMPONENT,
                        topic = name,
                        "resolving topics by name scans every topic; use topic identifiers where possible"
                    );
                }

                let found = self
                    .topics
                    .find_topic_by_name(name, self.page_limit)
                    .await
                    .map_err(|err| TransportError::remote("list topics", err))?;
                if found.is_some() {
                    return Ok(found);
                }

                if !create_if_absent {
                    debug!(
                        event = events::IDENTITY_LOOKUP_MISS,
                        component = COMPONENT,
                        topic = name,
                        "topic does not exist"
                    );
                    return Ok(None);
                }

                let topic_arn = self
                    .topics
                    .create_topic(name, &self.topic_attributes)
                    .await
                    .map_err(|err| TransportError::remote("create topic", err))?;
                info!(
                    event = events::IDENTITY_CREATED,
                    component = COMPONENT,
                    topic = name,
                    arn = topic_arn.as_str(),
                    "created topic"
                );
                Ok(Some(topic_arn))
            })
            .await
    }

    pub(crate) async fn seed(&self, name: &str, topic_arn: String) {
        debug!(
            event = events::IDENTITY_CACHE_SEEDED,
            component = COMPONENT,
            topic = name,
            arn = topic_arn.as_str(),
            "seeded topic identifier"
        );
        self.cache.seed(name, topic_arn).await;
    }
}

#[cfg(test)]
mod tests {
    use super::TopicDirectory;
    use crate::addressing::address::{Address, ServiceKind};
    use crate::error::TransportError;
    use crate::options::CreateTopicsOptions;
    use crate::test_support::{queue_arn, queue_url, topic_arn, FakeTopics};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn directory(topics: Arc<FakeTopics>) -> TopicDirectory {
        TopicDirectory::new(topics, &CreateTopicsOptions::default(), 1000)
    }

    #[tokio::test]
    async fn identifier_needs_no_remote_call() {
        let topics = Arc::new(FakeTopics::default());
        let directory = directory(topics.clone());
        let address = Address::parse(&topic_arn("orders")).unwrap();

        let resolved = directory.resolve(&address, false).await.unwrap();

        assert_eq!(resolved, Some(topic_arn("orders")));
        assert_eq!(topics.listings.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn name_lookup_is_cached_after_first_hit() {
        let topics = Arc::new(FakeTopics::with_topics(&["orders"]));
        let directory = directory(topics.clone());
        let address = Address::unqualified("orders");

        for _ in 0..3 {
            let resolved = directory.resolve(&address, false).await.unwrap();
            assert_eq!(resolved, Some(topic_arn("orders")));
        }

        assert_eq!(topics.listings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_topic_is_created_only_when_allowed() {
        let topics = Arc::new(FakeTopics::default());
        let directory = directory(topics.clone());
        let address = Address::unqualified("orders");

        assert_eq!(directory.resolve(&address, false).await.unwrap(), None);
        assert_eq!(topics.creates.load(Ordering::SeqCst), 0);

        let created = directory.resolve(&address, true).await.unwrap();
        assert_eq!(created, Some(topic_arn("orders")));
        assert_eq!(topics.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn queue_shaped_addresses_are_rejected() {
        let directory = directory(Arc::new(FakeTopics::default()));

        for raw in [queue_arn("billing"), queue_url("billing")] {
            let address = Address::parse(&raw).unwrap();
            let result = directory.resolve(&address, true).await;
            assert!(matches!(
                result,
                Err(TransportError::UnsupportedDestination {
                    service: ServiceKind::Queue,
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn listing_failure_surfaces_as_remote_failure() {
        let topics = Arc::new(FakeTopics::default());
        topics.fail_with(503);
        let directory = directory(topics);

        let result = directory.resolve(&Address::unqualified("orders"), true).await;

        assert!(matches!(
            result,
            Err(TransportError::RemoteOperationFailed { source, .. }) if source.status_code == 503
        ));
    }
}
