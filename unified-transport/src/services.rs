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

//! Contracts of the two consumed cloud services.
//!
//! Implementations are thin request/response adapters. They never retry and never cache;
//! both concerns are owned elsewhere (retries by the remote-call boundary, caching by the
//! identity layer of this crate).

use crate::addressing::arn::Arn;
use crate::observability::events;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::warn;

const COMPONENT: &str = "topic_service";

/// Subscription protocol for queue-service endpoints.
pub const QUEUE_PROTOCOL: &str = "sqs";
/// Queue attribute holding the resource policy document.
pub const POLICY_ATTRIBUTE: &str = "Policy";
/// Subscription attribute that delivers the published payload without a notification wrapper.
pub const RAW_MESSAGE_DELIVERY_ATTRIBUTE: &str = "RawMessageDelivery";
pub const FIFO_TOPIC_ATTRIBUTE: &str = "FifoTopic";
pub const CONTENT_BASED_DEDUPLICATION_ATTRIBUTE: &str = "ContentBasedDeduplication";

/// Non-success response of a remote call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceError {
    /// Remote status code; `0` when the failure was detected locally, e.g. a listing that
    /// never terminated.
    pub status_code: u16,
    pub request_id: Option<String>,
    pub message: String,
}

impl ServiceError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            request_id: None,
            message: message.into(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "status code: {}; request id: {}; {}",
            self.status_code,
            self.request_id.as_deref().unwrap_or("none"),
            self.message
        )
    }
}

impl Error for ServiceError {}

/// Both identities of one queue.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueueIdentity {
    /// Locator URL, used for queue operations.
    pub url: String,
    /// Fully-qualified identifier, used for subscriptions and policies.
    pub arn: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceivedMessage {
    pub body: String,
    pub receipt_handle: String,
}

/// One subscription of a topic as reported by the topic service.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Subscription {
    pub topic_arn: String,
    pub endpoint: String,
    pub protocol: String,
    /// Remote handle; only used to remove or configure the subscription.
    pub handle: String,
}

/// One page of a paged listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait QueueService: Send + Sync {
    /// Creates the queue, or returns the existing one's URL. Idempotent.
    async fn create_queue(&self, name: &str) -> Result<String, ServiceError>;

    /// Exact-match lookup by name. `Ok(None)` when no such queue exists.
    async fn get_queue_identity(&self, name: &str) -> Result<Option<QueueIdentity>, ServiceError>;

    async fn send(&self, queue_url: &str, body: &str) -> Result<(), ServiceError>;

    async fn receive(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, ServiceError>;

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str)
        -> Result<(), ServiceError>;

    async fn delete_queue(&self, queue_url: &str) -> Result<(), ServiceError>;

    async fn get_policy_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, ServiceError>;

    /// Replaces the given attributes as a whole; there is no conditional-write guard.
    async fn set_policy_attributes(
        &self,
        queue_url: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait TopicService: Send + Sync {
    /// Creates the topic, or returns the existing one's identifier. Idempotent.
    async fn create_topic(
        &self,
        name: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<String, ServiceError>;

    async fn list_topics(&self, next_token: Option<&str>) -> Result<Page<String>, ServiceError>;

    /// Publishes and returns the remote message id. Success says nothing about delivery.
    async fn publish(&self, topic_arn: &str, payload: &str) -> Result<String, ServiceError>;

    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
        next_token: Option<&str>,
    ) -> Result<Page<Subscription>, ServiceError>;

    /// Subscribes `endpoint`; identical (topic, protocol, endpoint) calls return the same handle.
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, ServiceError>;

    async fn unsubscribe(&self, handle: &str) -> Result<(), ServiceError>;

    async fn set_subscription_attribute(
        &self,
        handle: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ServiceError>;

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ServiceError>;

    /// Finds a topic identifier by exact name.
    ///
    /// The default walks every page of [`TopicService::list_topics`], which is O(number of
    /// topics). It stops with `Ok(None)` when the listing does not make progress or exceeds
    /// `page_limit`, so it always terminates and never reports a partial scan as a match.
    /// Adapters with a native by-name lookup should override it.
    async fn find_topic_by_name(
        &self,
        name: &str,
        page_limit: usize,
    ) -> Result<Option<String>, ServiceError> {
        let mut next_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        for _ in 0..page_limit {
            let page = self.list_topics(next_token.as_deref()).await?;

            if let Some(topic_arn) = page
                .items
                .into_iter()
                .find(|topic_arn| topic_name_of(topic_arn) == Some(name))
            {
                return Ok(Some(topic_arn));
            }

            match page.next_token {
                None => return Ok(None),
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    warn!(
                        event = events::TOPIC_LISTING_TRUNCATED,
                        component = COMPONENT,
                        topic = name,
                        token = %token,
                        "topic listing repeated a page token"
                    );
                    return Ok(None);
                }
                Some(token) => next_token = Some(token),
            }
        }

        warn!(
            event = events::TOPIC_LISTING_TRUNCATED,
            component = COMPONENT,
            topic = name,
            page_limit,
            "topic listing exceeded the page limit"
        );
        Ok(None)
    }
}

/// Name part of a topic identifier, `None` when it is not an identifier.
pub(crate) fn topic_name_of(topic_arn: &str) -> Option<&str> {
    Arn::from_str(topic_arn)
        .ok()
        .and_then(|_| topic_arn.rsplit(':').next())
}
