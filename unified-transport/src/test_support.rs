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

//! Hand-written service doubles shared by unit tests.

use crate::services::{
    Page, QueueIdentity, QueueService, ReceivedMessage, ServiceError, Subscription, TopicService,
    POLICY_ATTRIBUTE,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const REGION: &str = "us-east-1";
const ACCOUNT: &str = "000000000000";

pub(crate) fn queue_arn(name: &str) -> String {
    format!("arn:aws:sqs:{REGION}:{ACCOUNT}:{name}")
}

pub(crate) fn queue_url(name: &str) -> String {
    format!("https://sqs.{REGION}.amazonaws.com/{ACCOUNT}/{name}")
}

pub(crate) fn topic_arn(name: &str) -> String {
    format!("arn:aws:sns:{REGION}:{ACCOUNT}:{name}")
}

fn name_from_url(queue_url: &str) -> &str {
    queue_url.rsplit('/').next().unwrap_or(queue_url)
}

#[derive(Default)]
struct FakeQueue {
    attributes: HashMap<String, String>,
    messages: VecDeque<String>,
}

#[derive(Default)]
pub(crate) struct FakeQueues {
    queues: Mutex<HashMap<String, FakeQueue>>,
    pub(crate) lookups: AtomicUsize,
    pub(crate) creates: AtomicUsize,
    pub(crate) policy_writes: AtomicUsize,
    policy_read_delay: Mutex<Option<Duration>>,
}

impl FakeQueues {
    pub(crate) fn with_queues(names: &[&str]) -> Self {
        let fake = Self::default();
        {
            let mut queues = fake.queues.lock().unwrap();
            for name in names {
                queues.insert(name.to_string(), FakeQueue::default());
            }
        }
        fake
    }

    pub(crate) fn set_policy(&self, name: &str, policy: &str) {
        let mut queues = self.queues.lock().unwrap();
        queues
            .entry(name.to_string())
            .or_default()
            .attributes
            .insert(POLICY_ATTRIBUTE.to_string(), policy.to_string());
    }

    pub(crate) fn delay_policy_reads(&self, delay: Duration) {
        *self.policy_read_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn policy(&self, name: &str) -> Option<String> {
        let queues = self.queues.lock().unwrap();
        queues
            .get(name)
            .and_then(|queue| queue.attributes.get(POLICY_ATTRIBUTE).cloned())
    }

    pub(crate) fn push_body(&self, name: &str, body: &str) {
        let mut queues = self.queues.lock().unwrap();
        queues
            .entry(name.to_string())
            .or_default()
            .messages
            .push_back(body.to_string());
    }

    pub(crate) fn depth(&self, name: &str) -> usize {
        let queues = self.queues.lock().unwrap();
        queues.get(name).map_or(0, |queue| queue.messages.len())
    }

    fn missing(queue_url: &str) -> ServiceError {
        ServiceError::new(400, format!("queue does not exist: {queue_url}"))
    }
}

#[async_trait]
impl QueueService for FakeQueues {
    async fn create_queue(&self, name: &str) -> Result<String, ServiceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.queues
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(queue_url(name))
    }

    async fn get_queue_identity(&self, name: &str) -> Result<Option<QueueIdentity>, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let exists = self.queues.lock().unwrap().contains_key(name);
        Ok(exists.then(|| QueueIdentity {
            url: queue_url(name),
            arn: queue_arn(name),
        }))
    }

    async fn send(&self, queue_url: &str, body: &str) -> Result<(), ServiceError> {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues
            .get_mut(name_from_url(queue_url))
            .ok_or_else(|| Self::missing(queue_url))?;
        queue.messages.push_back(body.to_string());
        Ok(())
    }

    async fn receive(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, ServiceError> {
        let queues = self.queues.lock().unwrap();
        let queue = queues
            .get(name_from_url(queue_url))
            .ok_or_else(|| Self::missing(queue_url))?;
        Ok(queue.messages.front().map(|body| ReceivedMessage {
            body: body.clone(),
            receipt_handle: body.clone(),
        }))
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), ServiceError> {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues
            .get_mut(name_from_url(queue_url))
            .ok_or_else(|| Self::missing(queue_url))?;
        queue.messages.retain(|body| body != receipt_handle);
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<(), ServiceError> {
        self.queues.lock().unwrap().remove(name_from_url(queue_url));
        Ok(())
    }

    async fn get_policy_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, ServiceError> {
        let delay = *self.policy_read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let queues = self.queues.lock().unwrap();
        queues
            .get(name_from_url(queue_url))
            .map(|queue| queue.attributes.clone())
            .ok_or_else(|| Self::missing(queue_url))
    }

    async fn set_policy_attributes(
        &self,
        queue_url: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        self.policy_writes.fetch_add(1, Ordering::SeqCst);
        let mut queues = self.queues.lock().unwrap();
        let queue = queues
            .get_mut(name_from_url(queue_url))
            .ok_or_else(|| Self::missing(queue_url))?;
        queue.attributes.extend(attributes);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeTopics {
    topics: Mutex<Vec<String>>,
    subscriptions: Mutex<Vec<Subscription>>,
    subscription_attributes: Mutex<HashMap<String, HashMap<String, String>>>,
    published: Mutex<Vec<(String, String)>>,
    pub(crate) listings: AtomicUsize,
    pub(crate) creates: AtomicUsize,
    pub(crate) subscribes: AtomicUsize,
    pub(crate) failing_status: Mutex<Option<u16>>,
}

impl FakeTopics {
    pub(crate) fn with_topics(names: &[&str]) -> Self {
        let fake = Self::default();
        fake.topics
            .lock()
            .unwrap()
            .extend(names.iter().map(|name| topic_arn(name)));
        fake
    }

    pub(crate) fn add_subscription(&self, topic: &str, protocol: &str, endpoint: &str) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let handle = format!("{}:{}", topic_arn(topic), subscriptions.len());
        subscriptions.push(Subscription {
            topic_arn: topic_arn(topic),
            endpoint: endpoint.to_string(),
            protocol: protocol.to_string(),
            handle,
        });
    }

    pub(crate) fn subscriptions_of(&self, topic: &str) -> Vec<Subscription> {
        let arn = topic_arn(topic);
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|subscription| subscription.topic_arn == arn)
            .cloned()
            .collect()
    }

    pub(crate) fn subscription_attribute(&self, handle: &str, key: &str) -> Option<String> {
        self.subscription_attributes
            .lock()
            .unwrap()
            .get(handle)
            .and_then(|attributes| attributes.get(key).cloned())
    }

    pub(crate) fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub(crate) fn fail_with(&self, status_code: u16) {
        *self.failing_status.lock().unwrap() = Some(status_code);
    }

    fn check_failure(&self) -> Result<(), ServiceError> {
        match *self.failing_status.lock().unwrap() {
            Some(status_code) => {
                Err(ServiceError::new(status_code, "injected").with_request_id("req-1"))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TopicService for FakeTopics {
    async fn create_topic(
        &self,
        name: &str,
        _attributes: &HashMap<String, String>,
    ) -> Result<String, ServiceError> {
        self.check_failure()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let arn = topic_arn(name);
        let mut topics = self.topics.lock().unwrap();
        if !topics.contains(&arn) {
            topics.push(arn.clone());
        }
        Ok(arn)
    }

    async fn list_topics(&self, _next_token: Option<&str>) -> Result<Page<String>, ServiceError> {
        self.check_failure()?;
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(Page {
            items: self.topics.lock().unwrap().clone(),
            next_token: None,
        })
    }

    async fn publish(&self, topic_arn: &str, payload: &str) -> Result<String, ServiceError> {
        self.check_failure()?;
        let mut published = self.published.lock().unwrap();
        published.push((topic_arn.to_string(), payload.to_string()));
        Ok(format!("msg-{}", published.len()))
    }

    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
        _next_token: Option<&str>,
    ) -> Result<Page<Subscription>, ServiceError> {
        self.check_failure()?;
        let items = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|subscription| subscription.topic_arn == topic_arn)
            .cloned()
            .collect();
        Ok(Page {
            items,
            next_token: None,
        })
    }

    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, ServiceError> {
        self.check_failure()?;
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions.iter().find(|subscription| {
            subscription.topic_arn == topic_arn
                && subscription.protocol == protocol
                && subscription.endpoint == endpoint
        }) {
            return Ok(existing.handle.clone());
        }
        let handle = format!("{topic_arn}:{}", subscriptions.len());
        subscriptions.push(Subscription {
            topic_arn: topic_arn.to_string(),
            endpoint: endpoint.to_string(),
            protocol: protocol.to_string(),
            handle: handle.clone(),
        });
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: &str) -> Result<(), ServiceError> {
        self.check_failure()?;
        self.subscriptions
            .lock()
            .unwrap()
            .retain(|subscription| subscription.handle != handle);
        Ok(())
    }

    async fn set_subscription_attribute(
        &self,
        handle: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ServiceError> {
        self.check_failure()?;
        self.subscription_attributes
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ServiceError> {
        self.check_failure()?;
        self.topics.lock().unwrap().retain(|arn| arn != topic_arn);
        Ok(())
    }
}
