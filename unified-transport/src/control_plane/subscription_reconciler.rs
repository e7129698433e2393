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

//! Idempotent registration of queues as topic subscribers.
//!
//! Registration relies on the topic service treating identical `(topic, protocol, endpoint)`
//! subscribe calls as one subscription; no local locking is added on top. For concurrent
//! register/unregister calls on one pair, whichever effect lands last at the service wins.

use crate::addressing::address::{Address, ServiceKind};
use crate::error::TransportError;
use crate::identity::queue_directory::QueueDirectory;
use crate::identity::topic_directory::TopicDirectory;
use crate::observability::events;
use crate::services::{
    QueueIdentity, ServiceError, Subscription, TopicService, QUEUE_PROTOCOL,
    RAW_MESSAGE_DELIVERY_ATTRIBUTE,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "subscription_reconciler";

/// Result of a successful registration.
#[derive(Clone, Debug)]
pub(crate) struct Registration {
    pub(crate) topic_arn: String,
    pub(crate) subscriber: QueueIdentity,
    pub(crate) handle: String,
}

pub(crate) struct SubscriptionReconciler {
    queues: Arc<QueueDirectory>,
    topics: Arc<TopicDirectory>,
    create_topics: bool,
    raw_message_delivery: bool,
    page_limit: usize,
}

impl SubscriptionReconciler {
    pub(crate) fn new(
        queues: Arc<QueueDirectory>,
        topics: Arc<TopicDirectory>,
        create_topics: bool,
        raw_message_delivery: bool,
        page_limit: usize,
    ) -> Self {
        Self {
            queues,
            topics,
            create_topics,
            raw_message_delivery,
            page_limit,
        }
    }

    /// Subscribes the `subscriber` queue to `topic`.
    ///
    /// The queue must already exist; the topic is created on a miss when configured to.
    pub(crate) async fn register(
        &self,
        topic: &Address,
        subscriber: &Address,
    ) -> Result<Registration, TransportError> {
        let result = self.try_register(topic, subscriber).await;
        if let Err(err) = &result {
            warn!(
                event = events::SUBSCRIPTION_REGISTER_FAILED,
                component = COMPONENT,
                topic = %topic,
                endpoint = %subscriber,
                err = %err,
                "subscription registration failed"
            );
        }
        result
    }

    async fn try_register(
        &self,
        topic: &Address,
        subscriber: &Address,
    ) -> Result<Registration, TransportError> {
        if subscriber.service() == ServiceKind::Topic {
            return Err(TransportError::UnsupportedDestination {
                address: subscriber.to_string(),
                service: ServiceKind::Topic,
            });
        }

        let queue = self
            .queues
            .resolve(subscriber, false)
            .await?
            .ok_or_else(|| TransportError::UnresolvableSubscriber(subscriber.to_string()))?;

        let topic_arn = self
            .topics
            .resolve(topic, self.create_topics)
            .await?
            .ok_or_else(|| TransportError::UnresolvableTopic(topic.to_string()))?;

        let handle = self
            .topics
            .service()
            .subscribe(&topic_arn, QUEUE_PROTOCOL, &queue.arn)
            .await
            .map_err(|err| TransportError::remote("subscribe", err))?;

        // The attribute belongs to the handle, so it is set again on every re-subscribe.
        if self.raw_message_delivery {
            self.topics
                .service()
                .set_subscription_attribute(&handle, RAW_MESSAGE_DELIVERY_ATTRIBUTE, "true")
                .await
                .map_err(|err| TransportError::remote("set subscription attribute", err))?;
            debug!(
                event = events::SUBSCRIPTION_RAW_DELIVERY_SET,
                component = COMPONENT,
                handle = handle.as_str(),
                "raw message delivery enabled"
            );
        }

        info!(
            event = events::SUBSCRIPTION_REGISTERED,
            component = COMPONENT,
            topic = topic_arn.as_str(),
            endpoint = queue.arn.as_str(),
            "queue subscribed to topic"
        );

        Ok(Registration {
            topic_arn,
            subscriber: queue,
            handle,
        })
    }

    /// Removes the subscription of `subscriber` to `topic`.
    ///
    /// Succeeds without a remote write when either side does not resolve or no such
    /// subscription exists.
    pub(crate) async fn unregister(
        &self,
        topic: &Address,
        subscriber: &Address,
    ) -> Result<(), TransportError> {
        let queue = match subscriber.service() {
            ServiceKind::Topic => None,
            _ => self.queues.resolve(subscriber, false).await?,
        };
        let Some(queue) = queue else {
            Self::nothing_to_remove(topic, subscriber, "subscriber does not resolve");
            return Ok(());
        };

        let Some(topic_arn) = self.topics.resolve(topic, false).await? else {
            Self::nothing_to_remove(topic, subscriber, "topic does not resolve");
            return Ok(());
        };

        let subscriptions =
            list_all_subscriptions(self.topics.service().as_ref(), &topic_arn, self.page_limit)
                .await?;
        let Some(subscription) = subscriptions
            .into_iter()
            .find(|subscription| subscription.endpoint == queue.arn)
        else {
            Self::nothing_to_remove(topic, subscriber, "no such subscription");
            return Ok(());
        };

        self.topics
            .service()
            .unsubscribe(&subscription.handle)
            .await
            .map_err(|err| TransportError::remote("unsubscribe", err))?;

        info!(
            event = events::SUBSCRIPTION_UNREGISTER_OK,
            component = COMPONENT,
            topic = topic_arn.as_str(),
            endpoint = queue.arn.as_str(),
            "queue unsubscribed from topic"
        );
        Ok(())
    }

    fn nothing_to_remove(topic: &Address, subscriber: &Address, reason: &str) {
        debug!(
            event = events::SUBSCRIPTION_UNREGISTER_NOOP,
            component = COMPONENT,
            topic = %topic,
            endpoint = %subscriber,
            reason,
            "nothing to unsubscribe"
        );
    }

    /// The addresses the host bus sends to in order to reach every subscriber of `topic`.
    ///
    /// That is the topic itself; the topic service fans the message out.
    pub(crate) async fn subscriber_addresses(
        &self,
        topic: &Address,
    ) -> Result<Vec<String>, TransportError> {
        let topic_arn = self
            .topics
            .resolve(topic, self.create_topics)
            .await?
            .ok_or_else(|| TransportError::UnresolvableTopic(topic.to_string()))?;
        Ok(vec![topic_arn])
    }

    pub(crate) async fn list_subscriptions(
        &self,
        topic: &Address,
    ) -> Result<Vec<Subscription>, TransportError> {
        let topic_arn = self
            .topics
            .resolve(topic, false)
            .await?
            .ok_or_else(|| TransportError::UnresolvableTopic(topic.to_string()))?;
        list_all_subscriptions(self.topics.service().as_ref(), &topic_arn, self.page_limit).await
    }
}

/// Follows every page of a topic's subscription listing.
///
/// Fails rather than returning a partial list when the listing repeats a continuation token or
/// exceeds `page_limit` pages.
pub(crate) async fn list_all_subscriptions(
    topics: &dyn TopicService,
    topic_arn: &str,
    page_limit: usize,
) -> Result<Vec<Subscription>, TransportError> {
    let mut subscriptions = Vec::new();
    let mut next_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    for _ in 0..page_limit {
        let page = topics
            .list_subscriptions_by_topic(topic_arn, next_token.as_deref())
            .await
            .map_err(|err| TransportError::remote("list subscriptions", err))?;
        subscriptions.extend(page.items);

        match page.next_token {
            None => return Ok(subscriptions),
            Some(token) if !seen_tokens.insert(token.clone()) => {
                return Err(unterminated_listing(
                    topic_arn,
                    &format!("continuation token '{token}' repeated"),
                ));
            }
            Some(token) => next_token = Some(token),
        }
    }

    Err(unterminated_listing(
        topic_arn,
        &format!("more than {page_limit} pages"),
    ))
}

fn unterminated_listing(topic_arn: &str, reason: &str) -> TransportError {
    TransportError::remote(
        "list subscriptions",
        ServiceError::new(
            0,
            format!("subscription listing of '{topic_arn}' did not terminate: {reason}"),
        ),
    )
}
