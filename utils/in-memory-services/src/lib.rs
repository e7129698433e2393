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

//! In-process emulation of the queue and topic services.
//!
//! [`InMemoryCloud`] implements both [`QueueService`] and [`TopicService`] over shared state.
//! Topic fan-out honours queue resource policies the way the real services do: a delivery the
//! queue's policy does not allow is dropped while the publish still succeeds. That makes the
//! silent-loss condition observable in tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use unified_transport::{
    Page, PolicyDocument, PolicyStatement, QueueIdentity, QueueService, ReceivedMessage,
    ServiceError, Subscription, TopicService, POLICY_ATTRIBUTE, QUEUE_PROTOCOL,
    RAW_MESSAGE_DELIVERY_ATTRIBUTE,
};
use uuid::Uuid;

pub const REGION: &str = "us-east-1";
pub const ACCOUNT_ID: &str = "000000000000";
const DEFAULT_PAGE_SIZE: usize = 100;

const COMPONENT: &str = "in_memory_cloud";

pub fn queue_url(name: &str) -> String {
    format!("https://sqs.{REGION}.amazonaws.com/{ACCOUNT_ID}/{name}")
}

pub fn queue_arn(name: &str) -> String {
    format!("arn:aws:sqs:{REGION}:{ACCOUNT_ID}:{name}")
}

pub fn topic_arn(name: &str) -> String {
    format!("arn:aws:sns:{REGION}:{ACCOUNT_ID}:{name}")
}

struct QueueState {
    arn: String,
    attributes: HashMap<String, String>,
    /// `(receipt handle, body)` in arrival order.
    messages: VecDeque<(String, String)>,
    policy_writes: usize,
}

struct TopicState {
    attributes: HashMap<String, String>,
}

struct SubscriptionState {
    topic_arn: String,
    endpoint: String,
    protocol: String,
    attributes: HashMap<String, String>,
}

#[derive(Default)]
struct CloudState {
    /// Keyed by queue name.
    queues: BTreeMap<String, QueueState>,
    /// Keyed by topic identifier.
    topics: BTreeMap<String, TopicState>,
    /// Keyed by subscription handle.
    subscriptions: BTreeMap<String, SubscriptionState>,
    /// Operation name -> status code returned until cleared.
    failures: HashMap<String, u16>,
    dropped_deliveries: usize,
    policy_read_delay: Option<Duration>,
}

impl CloudState {
    fn check(&self, operation: &str) -> Result<(), ServiceError> {
        match self.failures.get(operation) {
            Some(status_code) => Err(error(
                *status_code,
                &format!("injected failure for {operation}"),
            )),
            None => Ok(()),
        }
    }

    fn queue_by_url(&mut self, url: &str) -> Result<&mut QueueState, ServiceError> {
        let name = url.rsplit('/').next().unwrap_or_default();
        match self.queues.get_mut(name) {
            Some(queue) if queue_url(name) == url => Ok(queue),
            _ => Err(error(
                400,
                &format!("AWS.SimpleQueueService.NonExistentQueue: {url}"),
            )),
        }
    }

    fn deliver(&mut self, topic_arn: &str, message_id: &str, payload: &str) {
        let deliveries: Vec<(String, bool)> = self
            .subscriptions
            .values()
            .filter(|subscription| {
                subscription.topic_arn == topic_arn && subscription.protocol == QUEUE_PROTOCOL
            })
            .map(|subscription| {
                let raw = subscription
                    .attributes
                    .get(RAW_MESSAGE_DELIVERY_ATTRIBUTE)
                    .is_some_and(|value| value.eq_ignore_ascii_case("true"));
                (subscription.endpoint.clone(), raw)
            })
            .collect();

        for (endpoint, raw) in deliveries {
            let name = endpoint.rsplit(':').next().unwrap_or_default();
            let Some(queue) = self.queues.get_mut(name).filter(|queue| queue.arn == endpoint) else {
                self.dropped_deliveries += 1;
                debug!(
                    component = COMPONENT,
                    endpoint = endpoint.as_str(),
                    "dropping delivery to missing queue"
                );
                continue;
            };

            if !allows_delivery(queue, topic_arn) {
                self.dropped_deliveries += 1;
                debug!(
                    component = COMPONENT,
                    endpoint = endpoint.as_str(),
                    topic = topic_arn,
                    "queue policy refuses delivery; dropping"
                );
                continue;
            }

            let body = if raw {
                payload.to_string()
            } else {
                json!({
                    "Type": "Notification",
                    "MessageId": message_id,
                    "TopicArn": topic_arn,
                    "Message": payload,
                })
                .to_string()
            };
            queue.messages.push_back((Uuid::new_v4().to_string(), body));
        }
    }
}

fn allows_delivery(queue: &QueueState, topic_arn: &str) -> bool {
    queue
        .attributes
        .get(POLICY_ATTRIBUTE)
        .and_then(|policy| PolicyDocument::from_json(policy).ok())
        .is_some_and(|policy| {
            policy.contains(&PolicyStatement::allow_topic_delivery(&queue.arn, topic_arn))
        })
}

fn error(status_code: u16, message: &str) -> ServiceError {
    ServiceError::new(status_code, message).with_request_id(Uuid::new_v4().to_string())
}

fn page_of<T: Clone>(
    items: Vec<T>,
    next_token: Option<&str>,
    page_size: usize,
) -> Result<Page<T>, ServiceError> {
    let start = match next_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| error(400, &format!("invalid next token '{token}'")))?,
        None => 0,
    };
    let end = (start + page_size).min(items.len());
    let next_token = (end < items.len()).then(|| end.to_string());

    Ok(Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        next_token,
    })
}

/// One region of one account, holding both services.
pub struct InMemoryCloud {
    state: Mutex<CloudState>,
    page_size: usize,
}

impl Default for InMemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Listings return at most `page_size` items per page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(CloudState::default()),
            page_size: page_size.max(1),
        }
    }

    /// Makes every later call of `operation` fail with `status_code` until cleared.
    ///
    /// `operation` is the trait method name, e.g. `"publish"`.
    pub async fn inject_failure(&self, operation: &str, status_code: u16) {
        let mut state = self.state.lock().await;
        state.failures.insert(operation.to_string(), status_code);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Holds every policy attribute read for `delay` before answering.
    pub async fn delay_policy_reads(&self, delay: Duration) {
        self.state.lock().await.policy_read_delay = Some(delay);
    }

    /// Stores `policy` as the queue's policy attribute without validating it, as a queue
    /// edited outside this service would hold it.
    pub async fn force_queue_policy(&self, name: &str, policy: &str) {
        let mut state = self.state.lock().await;
        if let Some(queue) = state.queues.get_mut(name) {
            queue
                .attributes
                .insert(POLICY_ATTRIBUTE.to_string(), policy.to_string());
        }
    }

    pub async fn queue_policy(&self, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .queues
            .get(name)
            .and_then(|queue| queue.attributes.get(POLICY_ATTRIBUTE).cloned())
    }

    /// Number of policy attribute writes the queue has received.
    pub async fn policy_writes(&self, name: &str) -> usize {
        let state = self.state.lock().await;
        state.queues.get(name).map_or(0, |queue| queue.policy_writes)
    }

    pub async fn queue_depth(&self, name: &str) -> usize {
        let state = self.state.lock().await;
        state.queues.get(name).map_or(0, |queue| queue.messages.len())
    }

    pub async fn subscriptions_of(&self, topic_arn: &str) -> Vec<Subscription> {
        let state = self.state.lock().await;
        state
            .subscriptions
            .iter()
            .filter(|(_, subscription)| subscription.topic_arn == topic_arn)
            .map(|(handle, subscription)| Subscription {
                topic_arn: subscription.topic_arn.clone(),
                endpoint: subscription.endpoint.clone(),
                protocol: subscription.protocol.clone(),
                handle: handle.clone(),
            })
            .collect()
    }

    pub async fn subscription_attribute(&self, handle: &str, key: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .subscriptions
            .get(handle)
            .and_then(|subscription| subscription.attributes.get(key).cloned())
    }

    pub async fn topic_attributes(&self, topic_arn: &str) -> Option<HashMap<String, String>> {
        let state = self.state.lock().await;
        state
            .topics
            .get(topic_arn)
            .map(|topic| topic.attributes.clone())
    }

    pub async fn queue_exists(&self, name: &str) -> bool {
        self.state.lock().await.queues.contains_key(name)
    }

    pub async fn topic_exists(&self, topic_arn: &str) -> bool {
        self.state.lock().await.topics.contains_key(topic_arn)
    }

    /// Deliveries dropped because the queue was missing or its policy refused them.
    pub async fn dropped_deliveries(&self) -> usize {
        self.state.lock().await.dropped_deliveries
    }
}

#[async_trait]
impl QueueService for InMemoryCloud {
    async fn create_queue(&self, name: &str) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        state.check("create_queue")?;
        state
            .queues
            .entry(name.to_string())
            .or_insert_with(|| QueueState {
                arn: queue_arn(name),
                attributes: HashMap::new(),
                messages: VecDeque::new(),
                policy_writes: 0,
            });
        Ok(queue_url(name))
    }

    async fn get_queue_identity(&self, name: &str) -> Result<Option<QueueIdentity>, ServiceError> {
        let state = self.state.lock().await;
        state.check("get_queue_identity")?;
        Ok(state.queues.get(name).map(|queue| QueueIdentity {
            url: queue_url(name),
            arn: queue.arn.clone(),
        }))
    }

    async fn send(&self, queue_url: &str, body: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("send")?;
        let queue = state.queue_by_url(queue_url)?;
        queue
            .messages
            .push_back((Uuid::new_v4().to_string(), body.to_string()));
        Ok(())
    }

    async fn receive(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, ServiceError> {
        let mut state = self.state.lock().await;
        state.check("receive")?;
        let queue = state.queue_by_url(queue_url)?;
        Ok(queue
            .messages
            .front()
            .map(|(receipt_handle, body)| ReceivedMessage {
                body: body.clone(),
                receipt_handle: receipt_handle.clone(),
            }))
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("delete_message")?;
        let queue = state.queue_by_url(queue_url)?;
        queue
            .messages
            .retain(|(handle, _)| handle != receipt_handle);
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("delete_queue")?;
        state.queue_by_url(queue_url)?;
        let name = queue_url.rsplit('/').next().unwrap_or_default().to_string();
        state.queues.remove(&name);
        Ok(())
    }

    async fn get_policy_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, ServiceError> {
        let delay = self.state.lock().await.policy_read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().await;
        state.check("get_policy_attributes")?;
        Ok(state.queue_by_url(queue_url)?.attributes.clone())
    }

    async fn set_policy_attributes(
        &self,
        queue_url: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("set_policy_attributes")?;
        if let Some(policy) = attributes.get(POLICY_ATTRIBUTE) {
            PolicyDocument::from_json(policy)
                .map_err(|err| error(400, &format!("invalid policy document: {err}")))?;
        }
        let queue = state.queue_by_url(queue_url)?;
        queue.attributes.extend(attributes);
        queue.policy_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl TopicService for InMemoryCloud {
    async fn create_topic(
        &self,
        name: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        state.check("create_topic")?;
        let arn = topic_arn(name);
        state
            .topics
            .entry(arn.clone())
            .or_insert_with(|| TopicState {
                attributes: attributes.clone(),
            });
        Ok(arn)
    }

    async fn list_topics(&self, next_token: Option<&str>) -> Result<Page<String>, ServiceError> {
        let state = self.state.lock().await;
        state.check("list_topics")?;
        page_of(
            state.topics.keys().cloned().collect(),
            next_token,
            self.page_size,
        )
    }

    async fn publish(&self, topic_arn: &str, payload: &str) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        state.check("publish")?;
        if !state.topics.contains_key(topic_arn) {
            return Err(error(404, &format!("NotFound: topic does not exist: {topic_arn}")));
        }
        let message_id = Uuid::new_v4().to_string();
        state.deliver(topic_arn, &message_id, payload);
        Ok(message_id)
    }

    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
        next_token: Option<&str>,
    ) -> Result<Page<Subscription>, ServiceError> {
        let state = self.state.lock().await;
        state.check("list_subscriptions_by_topic")?;
        if !state.topics.contains_key(topic_arn) {
            return Err(error(404, &format!("NotFound: topic does not exist: {topic_arn}")));
        }
        let subscriptions = state
            .subscriptions
            .iter()
            .filter(|(_, subscription)| subscription.topic_arn == topic_arn)
            .map(|(handle, subscription)| Subscription {
                topic_arn: subscription.topic_arn.clone(),
                endpoint: subscription.endpoint.clone(),
                protocol: subscription.protocol.clone(),
                handle: handle.clone(),
            })
            .collect();
        page_of(subscriptions, next_token, self.page_size)
    }

    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        state.check("subscribe")?;
        if !state.topics.contains_key(topic_arn) {
            return Err(error(404, &format!("NotFound: topic does not exist: {topic_arn}")));
        }

        if let Some(handle) = state
            .subscriptions
            .iter()
            .find(|(_, subscription)| {
                subscription.topic_arn == topic_arn
                    && subscription.protocol == protocol
                    && subscription.endpoint == endpoint
            })
            .map(|(handle, _)| handle.clone())
        {
            return Ok(handle);
        }

        let handle = format!("{topic_arn}:{}", Uuid::new_v4());
        state.subscriptions.insert(
            handle.clone(),
            SubscriptionState {
                topic_arn: topic_arn.to_string(),
                endpoint: endpoint.to_string(),
                protocol: protocol.to_string(),
                attributes: HashMap::new(),
            },
        );
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("unsubscribe")?;
        state
            .subscriptions
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| error(404, &format!("NotFound: no subscription {handle}")))
    }

    async fn set_subscription_attribute(
        &self,
        handle: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("set_subscription_attribute")?;
        let subscription = state
            .subscriptions
            .get_mut(handle)
            .ok_or_else(|| error(404, &format!("NotFound: no subscription {handle}")))?;
        subscription
            .attributes
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.check("delete_topic")?;
        state.topics.remove(topic_arn);
        state
            .subscriptions
            .retain(|_, subscription| subscription.topic_arn != topic_arn);
        Ok(())
    }
}
